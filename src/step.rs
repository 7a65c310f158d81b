use crate::error::WorkflowError;
use crate::project::TalentRole;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Production stages. Declaration order is presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Plot,
    Script,
    Covers,
    Pencils,
    Inks,
    Colors,
    Letters,
    Production,
    Print,
}

impl StepType {
    pub const ALL: [StepType; 9] = [
        StepType::Plot,
        StepType::Script,
        StepType::Covers,
        StepType::Pencils,
        StepType::Inks,
        StepType::Colors,
        StepType::Letters,
        StepType::Production,
        StepType::Print,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Plot => "plot",
            StepType::Script => "script",
            StepType::Covers => "covers",
            StepType::Pencils => "pencils",
            StepType::Inks => "inks",
            StepType::Colors => "colors",
            StepType::Letters => "letters",
            StepType::Production => "production",
            StepType::Print => "print",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StepType::Plot => "Plot",
            StepType::Script => "Script",
            StepType::Covers => "Covers",
            StepType::Pencils => "Pencils",
            StepType::Inks => "Inks",
            StepType::Colors => "Colors",
            StepType::Letters => "Letters",
            StepType::Production => "Production",
            StepType::Print => "Print",
        }
    }

    pub fn sort_order(&self) -> i32 {
        match self {
            StepType::Plot => 1,
            StepType::Script => 2,
            StepType::Covers => 3,
            StepType::Pencils => 4,
            StepType::Inks => 5,
            StepType::Colors => 6,
            StepType::Letters => 7,
            StepType::Production => 8,
            StepType::Print => 9,
        }
    }

    /// Stages that must deliver before this one can start.
    pub fn upstream(&self) -> &'static [StepType] {
        match self {
            StepType::Plot => &[],
            StepType::Script => &[StepType::Plot],
            StepType::Covers => &[StepType::Script],
            StepType::Pencils => &[StepType::Script],
            StepType::Inks => &[StepType::Pencils],
            StepType::Colors => &[StepType::Inks],
            StepType::Letters => &[StepType::Colors],
            StepType::Production => &[StepType::Letters, StepType::Covers],
            StepType::Print => &[StepType::Production],
        }
    }

    pub fn responsible_role(&self) -> TalentRole {
        match self {
            StepType::Plot | StepType::Script => TalentRole::Writer,
            StepType::Covers => TalentRole::CoverArtist,
            StepType::Pencils => TalentRole::Penciler,
            StepType::Inks => TalentRole::Inker,
            StepType::Colors => TalentRole::Colorist,
            StepType::Letters => TalentRole::Letterer,
            StepType::Production | StepType::Print => TalentRole::Production,
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepType::ALL
            .into_iter()
            .find(|step_type| step_type.as_str() == s)
            .ok_or_else(|| format!("unknown step type '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    NotStarted,
    InProgress,
    Review,
    Revision,
    Approved,
    Completed,
    Blocked,
}

impl StepStatus {
    pub const ALL: [StepStatus; 7] = [
        StepStatus::NotStarted,
        StepStatus::InProgress,
        StepStatus::Review,
        StepStatus::Revision,
        StepStatus::Approved,
        StepStatus::Completed,
        StepStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "not_started",
            StepStatus::InProgress => "in_progress",
            StepStatus::Review => "review",
            StepStatus::Revision => "revision",
            StepStatus::Approved => "approved",
            StepStatus::Completed => "completed",
            StepStatus::Blocked => "blocked",
        }
    }

    pub fn can_transition_to(&self, next: StepStatus) -> bool {
        use StepStatus::*;
        if *self == next {
            return true;
        }
        match self {
            NotStarted => matches!(next, InProgress | Blocked),
            InProgress => matches!(next, Review | Completed | Blocked),
            Review => matches!(next, Revision | Approved),
            Revision => matches!(next, InProgress | Review),
            Approved => matches!(next, Completed | Revision),
            Completed => matches!(next, Revision),
            Blocked => matches!(next, NotStarted | InProgress),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown step status '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: i32,
    pub project_id: i32,
    pub step_type: StepType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sort_order: i32,
    pub status: StepStatus,
    pub progress: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i32>,
}

/// A step that has not been stored yet; the store hands out the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkflowStep {
    pub project_id: i32,
    pub step_type: StepType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sort_order: i32,
    pub status: StepStatus,
    pub progress: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i32>,
}

impl NewWorkflowStep {
    pub fn new(project_id: i32, step_type: StepType) -> Self {
        Self {
            project_id,
            step_type,
            title: step_type.title().to_string(),
            description: None,
            sort_order: step_type.sort_order(),
            status: StepStatus::NotStarted,
            progress: 0,
            start_date: None,
            due_date: None,
            assigned_to: None,
        }
    }

    pub fn with_id(self, id: i32) -> WorkflowStep {
        WorkflowStep {
            id,
            project_id: self.project_id,
            step_type: self.step_type,
            title: self.title,
            description: self.description,
            sort_order: self.sort_order,
            status: self.status,
            progress: self.progress,
            start_date: self.start_date,
            due_date: self.due_date,
            assigned_to: self.assigned_to,
        }
    }
}

impl From<WorkflowStep> for NewWorkflowStep {
    fn from(step: WorkflowStep) -> Self {
        Self {
            project_id: step.project_id,
            step_type: step.step_type,
            title: step.title,
            description: step.description,
            sort_order: step.sort_order,
            status: step.status,
            progress: step.progress,
            start_date: step.start_date,
            due_date: step.due_date,
            assigned_to: step.assigned_to,
        }
    }
}

/// Dates of one stage, borrowed from either a stored or an unsaved step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDates {
    pub step_type: StepType,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl WorkflowStep {
    pub fn dates(&self) -> StepDates {
        StepDates {
            step_type: self.step_type,
            start_date: self.start_date,
            due_date: self.due_date,
        }
    }

    pub fn apply_update(&mut self, update: &StepUpdate) -> Result<(), WorkflowError> {
        if let Some(progress) = update.progress {
            if !(0..=100).contains(&progress) {
                return Err(WorkflowError::InvalidProgress(progress));
            }
        }
        if let Some(next) = update.status {
            if !self.status.can_transition_to(next) {
                return Err(WorkflowError::InvalidStatusTransition {
                    from: self.status,
                    to: next,
                });
            }
            self.status = next;
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if self.status == StepStatus::Completed {
            self.progress = 100;
        }
        if update.clear_assignment {
            self.assigned_to = None;
        } else if let Some(user_id) = update.assigned_to {
            self.assigned_to = Some(user_id);
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        Ok(())
    }
}

impl NewWorkflowStep {
    pub fn dates(&self) -> StepDates {
        StepDates {
            step_type: self.step_type,
            start_date: self.start_date,
            due_date: self.due_date,
        }
    }
}

/// Partial edit of a stored step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepUpdate {
    #[serde(default)]
    pub status: Option<StepStatus>,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default)]
    pub assigned_to: Option<i32>,
    #[serde(default)]
    pub clear_assignment: bool,
    #[serde(default)]
    pub description: Option<String>,
}
