use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::models::User;
use crate::database::schema::is_unique_violation;
use crate::domain::Role;
use crate::error::ApiError;

pub struct UserService {
    pool: PgPool,
}

pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an account. Duplicate emails surface as 409 via the unique
    /// index, not an application-level pre-check.
    pub async fn create(&self, new_user: NewUser) -> Result<User, ApiError> {
        let email = new_user.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::validation_error("A valid email is required", None));
        }
        if new_user.password.len() < 8 {
            return Err(ApiError::validation_error(
                "Password must be at least 8 characters",
                None,
            ));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let password_hash = hash_password(&new_user.password, &salt);

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, password_hash, password_salt, full_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&password_hash)
        .bind(&salt)
        .bind(new_user.full_name.trim())
        .bind(new_user.role.as_i16())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict(format!("An account already exists for {}", email))
            } else {
                e.into()
            }
        })?;

        Ok(user)
    }

    /// Validate credentials and mint a JWT.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), ApiError> {
        let email = email.trim().to_lowercase();

        let user: Option<User> =
            sqlx::query_as("SELECT * FROM users WHERE lower(email) = $1 AND active = TRUE")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;

        // Same message for unknown account and bad password.
        let user = user.ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;
        if !verify_password(password, &user.password_salt, &user.password_hash) {
            return Err(ApiError::unauthorized("Invalid email or password"));
        }

        let token = generate_jwt(Claims::new(user.id, user.email.clone())).map_err(|e| {
            tracing::error!("JWT generation failed: {}", e);
            ApiError::internal_server_error("Failed to issue session token")
        })?;

        Ok((token, user))
    }

    pub async fn get(&self, id: Uuid) -> Result<User, ApiError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE lower(email) = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self, role: Option<Role>) -> Result<Vec<User>, ApiError> {
        let users: Vec<User> = match role {
            Some(role) => {
                sqlx::query_as("SELECT * FROM users WHERE role = $1 ORDER BY created_at DESC")
                    .bind(role.as_i16())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(users)
    }

    /// Soft-deactivate. Accounts are never hard-deleted.
    pub async fn deactivate(&self, id: Uuid) -> Result<User, ApiError> {
        let user: Option<User> = sqlx::query_as(
            "UPDATE users SET active = FALSE, updated_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
    }

    pub async fn reactivate(&self, id: Uuid) -> Result<User, ApiError> {
        let user: Option<User> = sqlx::query_as(
            "UPDATE users SET active = TRUE, updated_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
    }
}
