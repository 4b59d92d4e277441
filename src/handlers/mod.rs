pub mod assignments;
pub mod billing;
pub mod integrations;
pub mod questionnaire;
pub mod tasks;
pub mod templates;
pub mod users;
pub mod webhooks;

use crate::domain::Role;
use crate::error::ApiError;
use crate::middleware::RequestUser;

/// Guard for admin-only routes.
pub fn require_admin(user: &RequestUser) -> Result<(), ApiError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("This action requires an admin account"))
    }
}

/// Guard for routes open to back-office roles only.
pub fn require_staff_or_admin(user: &RequestUser) -> Result<(), ApiError> {
    match user.role {
        Role::Admin | Role::Staff => Ok(()),
        Role::Client => Err(ApiError::forbidden("This action requires a staff account")),
    }
}
