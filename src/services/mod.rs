pub mod assignment_service;
pub mod billing_service;
pub mod email;
pub mod engagement_service;
pub mod integration_service;
pub mod onboarding_service;
pub mod task_service;
pub mod template_service;
pub mod user_service;
pub mod zapier_client;
