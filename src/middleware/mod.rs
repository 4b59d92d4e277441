pub mod auth;
pub mod authorize;
pub mod response;
pub mod validate_user;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use authorize::{authorize, Action, Resource};
pub use response::{ApiResponse, ApiResult};
pub use validate_user::{validate_user_middleware, RequestUser};
