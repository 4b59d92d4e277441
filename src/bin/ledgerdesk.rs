//! Operational CLI for the LedgerDesk API.

use clap::{Parser, Subcommand};

use ledgerdesk_api::database::manager::DatabaseManager;
use ledgerdesk_api::database::schema::ensure_schema;
use ledgerdesk_api::domain::Role;
use ledgerdesk_api::server;
use ledgerdesk_api::services::user_service::{NewUser, UserService};

#[derive(Parser)]
#[command(name = "ledgerdesk", about = "LedgerDesk API operational tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (same as the `ledgerdesk-api` binary).
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply the schema to the configured database.
    Migrate,
    /// Check database connectivity.
    Health,
    /// Create an admin account.
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Administrator")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerdesk_api=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            ledgerdesk_api::jobs::queue();
            server::serve(port.unwrap_or_else(server::port_from_env)).await?;
        }
        Command::Migrate => {
            let pool = DatabaseManager::pool().await?;
            ensure_schema(&pool).await?;
            println!("Schema is up to date");
        }
        Command::Health => match DatabaseManager::health_check().await {
            Ok(_) => println!("Database: ok"),
            Err(e) => {
                eprintln!("Database: unreachable ({})", e);
                std::process::exit(1);
            }
        },
        Command::CreateAdmin {
            email,
            password,
            name,
        } => {
            let pool = DatabaseManager::pool().await?;
            ensure_schema(&pool).await?;
            let user = UserService::new(pool)
                .create(NewUser {
                    email,
                    password,
                    full_name: name,
                    role: Role::Admin,
                })
                .await
                .map_err(|e| anyhow::anyhow!("{}", e.message()))?;
            println!("Created admin {} ({})", user.email, user.id);
        }
    }

    Ok(())
}
