use crate::error::WorkflowError;
use crate::step::StepType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of whoever triggered a mutating call. Recorded on workflow runs and in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalentRole {
    Writer,
    Penciler,
    Inker,
    Colorist,
    Letterer,
    CoverArtist,
    Production,
}

impl TalentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TalentRole::Writer => "writer",
            TalentRole::Penciler => "penciler",
            TalentRole::Inker => "inker",
            TalentRole::Colorist => "colorist",
            TalentRole::Letterer => "letterer",
            TalentRole::CoverArtist => "cover_artist",
            TalentRole::Production => "production",
        }
    }
}

impl fmt::Display for TalentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub role: TalentRole,
}

impl User {
    pub fn new(id: i32, name: impl Into<String>, role: TalentRole) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }
}

/// Explicit talent picked for a project, one optional user per role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentAssignments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penciler: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inker: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorist: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letterer: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_artist: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<i32>,
}

impl TalentAssignments {
    pub fn for_role(&self, role: TalentRole) -> Option<i32> {
        match role {
            TalentRole::Writer => self.writer,
            TalentRole::Penciler => self.penciler,
            TalentRole::Inker => self.inker,
            TalentRole::Colorist => self.colorist,
            TalentRole::Letterer => self.letterer,
            TalentRole::CoverArtist => self.cover_artist,
            TalentRole::Production => self.production,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Lay stages out from the project's start date.
    Forward,
    /// Work back from `due_date` when one is set, otherwise behave like `Forward`.
    #[default]
    DeadlineDriven,
}

/// Lengths of the stages that are not driven by page throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDurations {
    pub plot_days: i64,
    pub script_days: i64,
    pub days_per_cover: i64,
    pub production_days: i64,
    pub print_days: i64,
}

impl Default for StageDurations {
    fn default() -> Self {
        Self {
            plot_days: 7,
            script_days: 14,
            days_per_cover: 5,
            production_days: 7,
            print_days: 21,
        }
    }
}

/// Upper bound on a generated schedule. Anything longer is a data-entry mistake.
pub const MAX_SCHEDULE_DAYS: i64 = 20 * 366;

/// Scheduling inputs carried by a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub interior_page_count: i32,
    pub cover_count: i32,
    pub filler_page_count: i32,
    pub penciler_pages_per_week: i32,
    pub inker_pages_per_week: i32,
    pub colorist_pages_per_week: i32,
    pub letterer_pages_per_week: i32,
    pub pencil_batch_size: i32,
    pub ink_batch_size: i32,
    pub letter_batch_size: i32,
    pub approval_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub scheduling_mode: SchedulingMode,
    #[serde(default)]
    pub stage_durations: StageDurations,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            interior_page_count: 22,
            cover_count: 1,
            filler_page_count: 0,
            penciler_pages_per_week: 5,
            inker_pages_per_week: 7,
            colorist_pages_per_week: 10,
            letterer_pages_per_week: 20,
            pencil_batch_size: 5,
            ink_batch_size: 5,
            letter_batch_size: 11,
            approval_days: 2,
            due_date: None,
            plot_deadline: None,
            cover_deadline: None,
            start_date: None,
            scheduling_mode: SchedulingMode::default(),
            stage_durations: StageDurations::default(),
        }
    }
}

/// How much work a stage represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageWork {
    /// Pages moving through a role at a weekly rate.
    Pages { pages: i64, pages_per_week: i64 },
    /// A fixed number of days regardless of page count.
    Fixed { days: i64 },
}

impl StageWork {
    /// Days needed for `pages` of this stage. Rounded up to whole days.
    pub fn days_for(&self, pages: i64) -> i64 {
        match *self {
            StageWork::Pages { pages_per_week, .. } => {
                crate::calculations::durations::days_for_pages(pages, pages_per_week)
            }
            StageWork::Fixed { days } => days,
        }
    }

    pub fn duration_days(&self) -> i64 {
        match *self {
            StageWork::Pages { pages, .. } => self.days_for(pages),
            StageWork::Fixed { days } => days,
        }
    }

    pub fn pages(&self) -> Option<i64> {
        match *self {
            StageWork::Pages { pages, .. } => Some(pages),
            StageWork::Fixed { .. } => None,
        }
    }
}

fn require_at_least(field: &'static str, value: i64, min: i64) -> Result<(), WorkflowError> {
    if value < min {
        let reason = if min == 0 {
            "must not be negative"
        } else {
            "must be at least 1"
        };
        return Err(WorkflowError::InvalidConfiguration {
            field,
            value,
            reason,
        });
    }
    Ok(())
}

fn require_at_most(field: &'static str, value: i64, max: i64) -> Result<(), WorkflowError> {
    if value > max {
        return Err(WorkflowError::InvalidConfiguration {
            field,
            value,
            reason: "exceeds the longest supported schedule",
        });
    }
    Ok(())
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        require_at_least("interior_page_count", self.interior_page_count.into(), 1)?;
        require_at_least("cover_count", self.cover_count.into(), 1)?;
        require_at_least("filler_page_count", self.filler_page_count.into(), 0)?;
        require_at_least(
            "penciler_pages_per_week",
            self.penciler_pages_per_week.into(),
            1,
        )?;
        require_at_least("inker_pages_per_week", self.inker_pages_per_week.into(), 1)?;
        require_at_least(
            "colorist_pages_per_week",
            self.colorist_pages_per_week.into(),
            1,
        )?;
        require_at_least(
            "letterer_pages_per_week",
            self.letterer_pages_per_week.into(),
            1,
        )?;
        require_at_least("pencil_batch_size", self.pencil_batch_size.into(), 1)?;
        require_at_least("ink_batch_size", self.ink_batch_size.into(), 1)?;
        require_at_least("letter_batch_size", self.letter_batch_size.into(), 1)?;
        require_at_least("approval_days", self.approval_days, 1)?;

        let durations = &self.stage_durations;
        require_at_least("plot_days", durations.plot_days, 1)?;
        require_at_least("script_days", durations.script_days, 1)?;
        require_at_least("days_per_cover", durations.days_per_cover, 1)?;
        require_at_least("production_days", durations.production_days, 1)?;
        require_at_least("print_days", durations.print_days, 1)?;

        // Keeps offset arithmetic in the pipeline pass far away from i64 limits.
        require_at_most("approval_days", self.approval_days, MAX_SCHEDULE_DAYS)?;
        require_at_most("plot_days", durations.plot_days, MAX_SCHEDULE_DAYS)?;
        require_at_most("script_days", durations.script_days, MAX_SCHEDULE_DAYS)?;
        require_at_most("days_per_cover", durations.days_per_cover, MAX_SCHEDULE_DAYS)?;
        require_at_most("production_days", durations.production_days, MAX_SCHEDULE_DAYS)?;
        require_at_most("print_days", durations.print_days, MAX_SCHEDULE_DAYS)?;
        Ok(())
    }

    /// Workload of a stage. Interior art stages work the interior pages, lettering also
    /// covers filler pages, covers take a fixed number of days each.
    pub fn stage_work(&self, step_type: StepType) -> StageWork {
        let interior = i64::from(self.interior_page_count);
        let durations = &self.stage_durations;
        match step_type {
            StepType::Plot => StageWork::Fixed {
                days: durations.plot_days,
            },
            StepType::Script => StageWork::Fixed {
                days: durations.script_days,
            },
            StepType::Covers => StageWork::Fixed {
                days: i64::from(self.cover_count) * durations.days_per_cover,
            },
            StepType::Pencils => StageWork::Pages {
                pages: interior,
                pages_per_week: self.penciler_pages_per_week.into(),
            },
            StepType::Inks => StageWork::Pages {
                pages: interior,
                pages_per_week: self.inker_pages_per_week.into(),
            },
            StepType::Colors => StageWork::Pages {
                pages: interior,
                pages_per_week: self.colorist_pages_per_week.into(),
            },
            StepType::Letters => StageWork::Pages {
                pages: interior + i64::from(self.filler_page_count),
                pages_per_week: self.letterer_pages_per_week.into(),
            },
            StepType::Production => StageWork::Fixed {
                days: durations.production_days,
            },
            StepType::Print => StageWork::Fixed {
                days: durations.print_days,
            },
        }
    }

    /// Pages a stage accumulates before handing them downstream, if it hands off in batches.
    pub fn handoff_batch(&self, step_type: StepType) -> Option<i64> {
        match step_type {
            StepType::Pencils => Some(self.pencil_batch_size.into()),
            StepType::Inks => Some(self.ink_batch_size.into()),
            StepType::Colors => Some(self.letter_batch_size.into()),
            StepType::Plot
            | StepType::Script
            | StepType::Covers
            | StepType::Letters
            | StepType::Production
            | StepType::Print => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub created_on: NaiveDate,
    pub config: ProjectConfig,
    #[serde(default)]
    pub talent: TalentAssignments,
}

impl Project {
    pub fn new(id: i32, title: impl Into<String>, created_on: NaiveDate) -> Self {
        Self {
            id,
            title: title.into(),
            created_on,
            config: ProjectConfig::default(),
            talent: TalentAssignments::default(),
        }
    }

    pub fn with_config(mut self, config: ProjectConfig) -> Self {
        self.config = config;
        self
    }
}
