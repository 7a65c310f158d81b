use crate::persistence::PersistenceError;
use crate::step::StepStatus;
use crate::timeline::Direction;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("invalid configuration: {field} = {value} {reason}")]
    InvalidConfiguration {
        field: &'static str,
        value: i64,
        reason: &'static str,
    },
    #[error("project {0} not found")]
    ProjectNotFound(i32),
    #[error("workflow step {0} not found")]
    StepNotFound(i32),
    #[error("user {0} not found")]
    UserNotFound(i32),
    #[error(
        "project {project_id} already has {existing} workflow steps; re-initialization must be confirmed"
    )]
    ReplaceNotConfirmed { project_id: i32, existing: usize },
    #[error("cannot move a step from {from} to {to}")]
    InvalidStatusTransition { from: StepStatus, to: StepStatus },
    #[error("progress {0} is outside 0..=100")]
    InvalidProgress(i32),
    #[error("stage graph error: {0}")]
    StageGraph(String),
    #[error(transparent)]
    Storage(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("{field} must be zero or more days (got {value})")]
    InvalidDuration { field: &'static str, value: i64 },
    #[error("{0} calculation requires an anchor date")]
    MissingAnchorDate(Direction),
    #[error("timeline date falls outside the supported calendar range")]
    DateOutOfRange,
}
