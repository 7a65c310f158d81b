pub mod assignment;
pub mod calculations;
pub mod calendar;
pub mod config;
pub mod error;
pub mod feasibility;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod initializer;
pub mod logging;
pub mod persistence;
pub mod progress;
pub mod project;
pub mod service;
pub mod step;
pub(crate) mod step_validation;
pub mod timeline;

pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::{AppConfig, ConfigError};
pub use error::{TimelineError, WorkflowError};
pub use feasibility::{FeasibilityReport, Milestone, MilestoneCheck, days_between, days_late};
pub use initializer::{PlannedStage, ScheduleAnchor, WorkflowInitializer, WorkflowPlan};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteStore;
pub use persistence::{
    MemoryStore, PersistenceError, ProjectStore, Storage, UserStore, WorkflowStepStore,
    load_steps_from_csv, load_steps_from_json, save_steps_to_csv, save_steps_to_json,
};
pub use progress::{ProgressClassifier, StageProgress, TalentProgressStatus, progress_percent};
pub use project::{
    ActorId, Project, ProjectConfig, SchedulingMode, StageDurations, StageWork,
    TalentAssignments, TalentRole, User,
};
pub use service::{InitializeRequest, RetentionPolicy, WorkflowRun, WorkflowService};
pub use step::{NewWorkflowStep, StepDates, StepStatus, StepType, StepUpdate, WorkflowStep};
pub use timeline::{
    Direction, DistributionMethod, TimelineFormData, TimelineResult, calculate_timeline,
};
