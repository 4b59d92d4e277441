pub mod assignment;
pub mod engagement_letter;
pub mod integration;
pub mod questionnaire;
pub mod task;
pub mod template;
pub mod user;
pub mod zapier_job;

pub use assignment::ClientAssignment;
pub use engagement_letter::{EngagementLetter, EngagementStatus};
pub use integration::{IntegrationAccount, Provider};
pub use questionnaire::{QuestionnaireResponse, QuestionnaireStatus};
pub use task::{
    AssignmentEntry, HelpRequest, StatusHistoryEntry, Task, TaskDocument, TaskPriority,
};
pub use template::TaskTemplate;
pub use user::User;
pub use zapier_job::{ZapierCallbackInfo, ZapierJob, ZapierJobStatus};
