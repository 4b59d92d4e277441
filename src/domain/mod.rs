pub mod plan;
pub mod role;
pub mod task_status;

pub use plan::{recommend_plan, Plan};
pub use role::Role;
pub use task_status::{check_transition, TaskStatus, TransitionError};
