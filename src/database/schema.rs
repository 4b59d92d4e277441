use sqlx::PgPool;
use tracing::info;

use super::manager::DatabaseError;

/// Startup DDL pass. Every statement is idempotent so the server can run
/// it unconditionally on boot.
const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        password_salt TEXT NOT NULL,
        full_name TEXT NOT NULL DEFAULT '',
        role SMALLINT NOT NULL DEFAULT 3,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        stripe_customer_id TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (lower(email))",
    r#"
    CREATE TABLE IF NOT EXISTS client_assignments (
        id UUID PRIMARY KEY,
        staff_id UUID NOT NULL REFERENCES users(id),
        client_id UUID NOT NULL REFERENCES users(id),
        assigned_by UUID REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS client_assignments_pair_key ON client_assignments (staff_id, client_id)",
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        task_type TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'NOT_STARTED',
        priority TEXT NOT NULL DEFAULT 'medium',
        assigned_to UUID REFERENCES users(id),
        assigned_by UUID REFERENCES users(id),
        client_id UUID REFERENCES users(id),
        staff_id UUID REFERENCES users(id),
        due_date TIMESTAMPTZ,
        completed_at TIMESTAMPTZ,
        reviewed_by UUID REFERENCES users(id),
        review_notes TEXT,
        rejection_reason TEXT,
        documents JSONB NOT NULL DEFAULT '[]',
        help_requests JSONB NOT NULL DEFAULT '[]',
        status_history JSONB NOT NULL DEFAULT '[]',
        assignment_history JSONB NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS tasks_client_idx ON tasks (client_id)",
    "CREATE INDEX IF NOT EXISTS tasks_assigned_to_idx ON tasks (assigned_to)",
    r#"
    CREATE TABLE IF NOT EXISTS task_templates (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        task_type TEXT NOT NULL,
        priority TEXT NOT NULL DEFAULT 'medium',
        checklist JSONB NOT NULL DEFAULT '[]',
        usage_count BIGINT NOT NULL DEFAULT 0,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_by UUID REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS questionnaire_responses (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        answers JSONB NOT NULL DEFAULT '{}',
        recommended_plan TEXT NOT NULL DEFAULT 'startup',
        status TEXT NOT NULL DEFAULT 'pending',
        metadata JSONB NOT NULL DEFAULT '{}',
        user_id UUID REFERENCES users(id),
        expires_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS questionnaire_responses_email_key ON questionnaire_responses (lower(email))",
    r#"
    CREATE TABLE IF NOT EXISTS zapier_jobs (
        id UUID PRIMARY KEY,
        request_id UUID NOT NULL,
        email TEXT NOT NULL,
        payload JSONB NOT NULL DEFAULT '{}',
        status TEXT NOT NULL DEFAULT 'PENDING',
        dispatched_at TIMESTAMPTZ,
        dispatch_error TEXT,
        zapier JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS zapier_jobs_request_id_key ON zapier_jobs (request_id)",
    "CREATE INDEX IF NOT EXISTS zapier_jobs_email_idx ON zapier_jobs (lower(email))",
    // At most one in-flight (PENDING or SUCCESS) job per email. As with
    // engagement letters, concurrent writers race on this index.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS zapier_jobs_in_flight_email_key
        ON zapier_jobs (lower(email)) WHERE status IN ('PENDING', 'SUCCESS')
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS engagement_letters (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'PROCESSING',
        proposal_id TEXT,
        metadata JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    // At most one non-failed engagement letter per email. The application
    // relies on this index losing a concurrent race, not on locks.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS engagement_letters_active_email_key
        ON engagement_letters (lower(email)) WHERE status <> 'FAILED'
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS integration_accounts (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id),
        provider TEXT NOT NULL,
        access_token TEXT NOT NULL,
        refresh_token TEXT,
        token_expires_at TIMESTAMPTZ,
        external_id TEXT,
        metadata JSONB NOT NULL DEFAULT '{}',
        connected_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS integration_accounts_user_provider_key ON integration_accounts (user_id, provider)",
];

/// Ensure all tables and indexes exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ensured ({} statements)", DDL.len());
    Ok(())
}

/// True when a unique-index violation lost the race for a constrained
/// write (duplicate assignment pair, in-flight job, active letter).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
