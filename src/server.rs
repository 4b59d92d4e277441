use axum::{middleware::from_fn, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::manager::DatabaseManager;
use crate::handlers;
use crate::middleware::{jwt_auth_middleware, validate_user_middleware};

pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth + intake routes
        .merge(public_routes())
        // Inbound webhook callbacks (see handlers::webhooks for the
        // optional shared-secret check)
        .merge(webhook_routes())
        // Protected API
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    use axum::routing::post;

    Router::new()
        .route("/auth/signup", post(handlers::users::signup))
        .route("/auth/login", post(handlers::users::login))
        .route("/questionnaire", post(handlers::questionnaire::submit))
}

fn webhook_routes() -> Router {
    use axum::routing::post;

    Router::new()
        .route("/webhooks/zapier/status", post(handlers::webhooks::zapier_status))
        .route(
            "/webhooks/ignition/proposal",
            post(handlers::webhooks::ignition_proposal_status),
        )
}

fn protected_routes() -> Router {
    use axum::routing::{delete, post, put};
    use handlers::{assignments, billing, integrations, questionnaire, tasks, templates, users};

    Router::new()
        // Identity
        .route("/api/auth/whoami", get(users::whoami))
        // User management (admin)
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", get(users::get).delete(users::deactivate))
        .route("/api/users/:id/activate", post(users::activate))
        // Staff-client assignment
        .route("/api/assignments", post(assignments::create))
        .route(
            "/api/assignments/:staff_id/:client_id",
            delete(assignments::delete),
        )
        .route("/api/assignments/staff/:staff_id", get(assignments::list_for_staff))
        .route(
            "/api/assignments/client/:client_id",
            get(assignments::list_for_client),
        )
        // Task lifecycle
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route("/api/tasks/:id", get(tasks::get).put(tasks::update))
        .route("/api/tasks/:id/status", post(tasks::change_status))
        .route("/api/tasks/:id/approve", post(tasks::approve))
        .route("/api/tasks/:id/reject", post(tasks::reject))
        .route("/api/tasks/:id/cancel", post(tasks::cancel))
        .route("/api/tasks/:id/documents", post(tasks::attach_document))
        .route("/api/tasks/:id/help-requests", post(tasks::add_help_request))
        .route(
            "/api/tasks/:id/help-requests/:help_id/resolve",
            post(tasks::resolve_help_request),
        )
        .route("/api/tasks/:id/reassign", post(tasks::reassign))
        // Task templates
        .route("/api/templates", get(templates::list).post(templates::create))
        .route(
            "/api/templates/:id",
            get(templates::get).delete(templates::deactivate),
        )
        .route("/api/templates/:id/instantiate", post(templates::instantiate))
        // Questionnaire + onboarding pipeline
        .route("/api/questionnaire/:email", get(questionnaire::get))
        .route(
            "/api/onboarding/ignition",
            post(questionnaire::create_client_in_ignition),
        )
        .route("/api/onboarding/onboard/:email", post(questionnaire::onboard))
        // Engagement letters
        .route(
            "/api/engagement-letters",
            post(questionnaire::create_engagement_letter),
        )
        .route(
            "/api/engagement-letters/:id/status",
            put(questionnaire::update_engagement_status),
        )
        .route(
            "/api/engagement-letters/by-email/:email",
            get(questionnaire::get_engagement_letter),
        )
        // Billing (Stripe)
        .route("/api/billing/customer", post(billing::ensure_customer))
        .route("/api/billing/subscriptions", post(billing::create_subscription))
        .route(
            "/api/billing/subscriptions/:subscription_id",
            get(billing::get_subscription).delete(billing::cancel_subscription),
        )
        .route("/api/billing/invoices", get(billing::list_invoices))
        // Integration connectors
        .route("/api/integrations", get(integrations::list))
        .route(
            "/api/integrations/:provider",
            get(integrations::status).delete(integrations::disconnect),
        )
        .route(
            "/api/integrations/:provider/connect",
            post(integrations::connect),
        )
        // Auth stack: JWT first, then a fresh user/role load per request
        .layer(from_fn(validate_user_middleware))
        .layer(from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "LedgerDesk API",
            "version": version,
            "description": "Bookkeeping/CPA service backend",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/signup, /auth/login (public)",
                "questionnaire": "/questionnaire (public intake)",
                "webhooks": "/webhooks/zapier/status, /webhooks/ignition/proposal",
                "users": "/api/users (protected)",
                "assignments": "/api/assignments (protected)",
                "tasks": "/api/tasks (protected)",
                "templates": "/api/templates (protected)",
                "onboarding": "/api/onboarding/* (protected)",
                "billing": "/api/billing/* (protected)",
                "integrations": "/api/integrations/* (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

/// Bind and serve until the process exits.
pub async fn serve(port: u16) -> anyhow::Result<()> {
    // Best-effort schema pass; a cold database only degrades /health.
    match DatabaseManager::pool().await {
        Ok(pool) => {
            if let Err(e) = crate::database::schema::ensure_schema(&pool).await {
                tracing::warn!("Schema ensure failed: {}", e);
            }
        }
        Err(e) => tracing::warn!("Database not reachable at startup: {}", e),
    }

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("LedgerDesk API listening on http://{}", bind_addr);

    axum::serve(listener, app()).await?;
    Ok(())
}

/// Resolve the port from env, defaulting to 3000.
pub fn port_from_env() -> u16 {
    std::env::var("LEDGERDESK_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000)
}
