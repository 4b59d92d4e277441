use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::ClientAssignment;
use crate::database::schema::is_unique_violation;
use crate::domain::Role;
use crate::error::ApiError;

pub struct AssignmentService {
    pool: PgPool,
}

impl AssignmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pair a staff member with a client. The compound unique index turns
    /// a duplicate pair into 409.
    pub async fn assign(
        &self,
        staff_id: Uuid,
        client_id: Uuid,
        assigned_by: Uuid,
    ) -> Result<ClientAssignment, ApiError> {
        let staff_role: Option<(i16,)> =
            sqlx::query_as("SELECT role FROM users WHERE id = $1 AND active = TRUE")
                .bind(staff_id)
                .fetch_optional(&self.pool)
                .await?;
        match staff_role.map(|(r,)| Role::from_i16(r)) {
            Some(Some(Role::Staff)) | Some(Some(Role::Admin)) => {}
            Some(_) => return Err(ApiError::bad_request("staff_id must refer to a staff account")),
            None => return Err(ApiError::not_found(format!("Staff {} not found", staff_id))),
        }

        let client_role: Option<(i16,)> =
            sqlx::query_as("SELECT role FROM users WHERE id = $1 AND active = TRUE")
                .bind(client_id)
                .fetch_optional(&self.pool)
                .await?;
        match client_role.map(|(r,)| Role::from_i16(r)) {
            Some(Some(Role::Client)) => {}
            Some(_) => {
                return Err(ApiError::bad_request("client_id must refer to a client account"))
            }
            None => return Err(ApiError::not_found(format!("Client {} not found", client_id))),
        }

        let assignment: ClientAssignment = sqlx::query_as(
            r#"
            INSERT INTO client_assignments (id, staff_id, client_id, assigned_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(staff_id)
        .bind(client_id)
        .bind(assigned_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("Staff member is already assigned to this client")
            } else {
                e.into()
            }
        })?;

        Ok(assignment)
    }

    pub async fn unassign(&self, staff_id: Uuid, client_id: Uuid) -> Result<(), ApiError> {
        let result =
            sqlx::query("DELETE FROM client_assignments WHERE staff_id = $1 AND client_id = $2")
                .bind(staff_id)
                .bind(client_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Assignment not found"));
        }
        Ok(())
    }

    pub async fn list_for_staff(&self, staff_id: Uuid) -> Result<Vec<ClientAssignment>, ApiError> {
        let rows: Vec<ClientAssignment> = sqlx::query_as(
            "SELECT * FROM client_assignments WHERE staff_id = $1 ORDER BY created_at DESC",
        )
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<ClientAssignment>, ApiError> {
        let rows: Vec<ClientAssignment> = sqlx::query_as(
            "SELECT * FROM client_assignments WHERE client_id = $1 ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
