use crate::project::{Project, TalentRole, User};
use crate::step::{NewWorkflowStep, WorkflowStep};
use crate::step_validation;
use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait ProjectStore {
    fn get_project(&self, id: i32) -> PersistenceResult<Option<Project>>;
    fn update_project(&self, project: &Project) -> PersistenceResult<()>;
}

pub trait WorkflowStepStore {
    /// Steps of a project ordered by `sort_order`.
    fn steps_for_project(&self, project_id: i32) -> PersistenceResult<Vec<WorkflowStep>>;
    fn get_step(&self, id: i32) -> PersistenceResult<Option<WorkflowStep>>;
    fn create_step(&self, step: NewWorkflowStep) -> PersistenceResult<WorkflowStep>;
    fn update_step(&self, step: &WorkflowStep) -> PersistenceResult<()>;
    /// Swap every step of a project for `steps` in one atomic write.
    fn replace_steps_for_project(
        &self,
        project_id: i32,
        steps: Vec<NewWorkflowStep>,
    ) -> PersistenceResult<Vec<WorkflowStep>>;
}

pub trait UserStore {
    fn get_user(&self, id: i32) -> PersistenceResult<Option<User>>;
    fn users_by_role(&self, role: TalentRole) -> PersistenceResult<Vec<User>>;
}

/// Everything the workflow service needs from storage.
pub trait Storage: ProjectStore + WorkflowStepStore + UserStore + Send + Sync {}

impl<T> Storage for T where T: ProjectStore + WorkflowStepStore + UserStore + Send + Sync {}

pub fn validate_steps(steps: &[NewWorkflowStep]) -> PersistenceResult<()> {
    step_validation::validate_step_collection(steps)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub fn validate_stored_steps(steps: &[WorkflowStep]) -> PersistenceResult<()> {
    let unsaved: Vec<NewWorkflowStep> = steps.iter().cloned().map(Into::into).collect();
    validate_steps(&unsaved)
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{load_steps_from_csv, load_steps_from_json, save_steps_to_csv, save_steps_to_json};
pub use memory::MemoryStore;
