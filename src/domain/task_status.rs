use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Role;

/// Task lifecycle states. COMPLETED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    PendingReview,
    NeedsRevision,
    Completed,
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid status transition: {from} \u{2192} {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("Role {role} may not set status {to}")]
    RoleNotPermitted { role: Role, to: TaskStatus },
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "NOT_STARTED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::PendingReview => "PENDING_REVIEW",
            TaskStatus::NeedsRevision => "NEEDS_REVISION",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<TaskStatus> {
        match value {
            "NOT_STARTED" => Some(TaskStatus::NotStarted),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "PENDING_REVIEW" => Some(TaskStatus::PendingReview),
            "NEEDS_REVISION" => Some(TaskStatus::NeedsRevision),
            "COMPLETED" => Some(TaskStatus::Completed),
            "CANCELLED" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// The fixed adjacency table. Only these edges are legal.
    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (NotStarted, InProgress)
                | (InProgress, PendingReview)
                | (InProgress, Completed)
                | (PendingReview, NeedsRevision)
                | (PendingReview, Completed)
                | (NeedsRevision, InProgress)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses a client may set on their own tasks. Everything else
/// (completion, revision verdicts) is reserved for staff review.
const CLIENT_SETTABLE: [TaskStatus; 3] = [
    TaskStatus::NotStarted,
    TaskStatus::InProgress,
    TaskStatus::PendingReview,
];

/// Validate a status change for a given role. Admin bypasses the
/// adjacency table entirely; staff and client are bound by it, and client
/// is further restricted to the self-service subset.
pub fn check_transition(role: Role, from: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
    match role {
        Role::Admin => Ok(()),
        Role::Staff => {
            if from.can_transition_to(to) {
                Ok(())
            } else {
                Err(TransitionError::InvalidTransition { from, to })
            }
        }
        Role::Client => {
            if !CLIENT_SETTABLE.contains(&to) {
                return Err(TransitionError::RoleNotPermitted { role, to });
            }
            if from.can_transition_to(to) {
                Ok(())
            } else {
                Err(TransitionError::InvalidTransition { from, to })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskStatus::*;

    const ALL: [TaskStatus; 6] = [
        NotStarted,
        InProgress,
        PendingReview,
        NeedsRevision,
        Completed,
        Cancelled,
    ];

    #[test]
    fn adjacency_table_matches_fixed_edges() {
        let legal = [
            (NotStarted, InProgress),
            (InProgress, PendingReview),
            (InProgress, Completed),
            (PendingReview, NeedsRevision),
            (PendingReview, Completed),
            (NeedsRevision, InProgress),
        ];
        for from in ALL {
            for to in ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "edge {} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in [Completed, Cancelled] {
            for to in ALL {
                assert!(!from.can_transition_to(to));
                assert_eq!(
                    check_transition(Role::Staff, from, to),
                    Err(TransitionError::InvalidTransition { from, to })
                );
            }
        }
    }

    #[test]
    fn admin_bypasses_the_table() {
        assert_eq!(check_transition(Role::Admin, Completed, InProgress), Ok(()));
        assert_eq!(check_transition(Role::Admin, Cancelled, NotStarted), Ok(()));
    }

    #[test]
    fn client_cannot_set_completed_even_on_a_legal_edge() {
        // IN_PROGRESS -> COMPLETED is a legal edge, but not for clients.
        assert_eq!(
            check_transition(Role::Client, InProgress, Completed),
            Err(TransitionError::RoleNotPermitted {
                role: Role::Client,
                to: Completed
            })
        );
    }

    #[test]
    fn client_may_use_the_self_service_subset() {
        assert_eq!(check_transition(Role::Client, NotStarted, InProgress), Ok(()));
        assert_eq!(
            check_transition(Role::Client, InProgress, PendingReview),
            Ok(())
        );
        // Still bound by the table within the subset.
        assert_eq!(
            check_transition(Role::Client, NotStarted, PendingReview),
            Err(TransitionError::InvalidTransition {
                from: NotStarted,
                to: PendingReview
            })
        );
    }

    #[test]
    fn status_strings_round_trip() {
        for status in ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("DONE"), None);
    }
}
