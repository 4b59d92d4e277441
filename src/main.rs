use ledgerdesk_api::{config::config, jobs, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerdesk_api=info,tower_http=info".into()),
        )
        .init();

    let cfg = config();
    tracing::info!("Starting LedgerDesk API ({:?})", cfg.environment);

    jobs::queue();

    server::serve(server::port_from_env()).await
}
