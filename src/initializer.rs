use crate::calculations::{PipelinePass, StageWindow};
use crate::calendar::WorkCalendar;
use crate::error::WorkflowError;
use crate::feasibility::FeasibilityReport;
use crate::graph::StageDag;
use crate::project::{MAX_SCHEDULE_DAYS, Project, ProjectConfig, SchedulingMode};
use crate::step::{NewWorkflowStep, StepDates, StepType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a schedule is pinned to the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "date")]
pub enum ScheduleAnchor {
    /// First stage starts on this date.
    StartOn(NaiveDate),
    /// Last stage is due on this date.
    FinishBy(NaiveDate),
}

impl ScheduleAnchor {
    pub fn for_project(project: &Project) -> Self {
        let config = &project.config;
        match (config.scheduling_mode, config.due_date) {
            (SchedulingMode::DeadlineDriven, Some(due)) => ScheduleAnchor::FinishBy(due),
            _ => ScheduleAnchor::StartOn(config.start_date.unwrap_or(project.created_on)),
        }
    }

    pub fn is_deadline_driven(&self) -> bool {
        matches!(self, ScheduleAnchor::FinishBy(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStage {
    pub step_type: StepType,
    pub sort_order: i32,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    pub anchor: ScheduleAnchor,
    /// Sorted by `sort_order`.
    pub stages: Vec<PlannedStage>,
    pub feasibility: FeasibilityReport,
}

impl WorkflowPlan {
    pub fn stage(&self, step_type: StepType) -> Option<&PlannedStage> {
        self.stages.iter().find(|s| s.step_type == step_type)
    }

    pub fn into_new_steps(self, project_id: i32) -> Vec<NewWorkflowStep> {
        self.stages
            .into_iter()
            .map(|stage| {
                let mut step = NewWorkflowStep::new(project_id, stage.step_type);
                step.sort_order = stage.sort_order;
                step.start_date = Some(stage.start_date);
                step.due_date = Some(stage.due_date);
                step
            })
            .collect()
    }
}

/// Turns a project configuration into dated production stages.
pub struct WorkflowInitializer<'a> {
    calendar: &'a WorkCalendar,
}

impl<'a> WorkflowInitializer<'a> {
    pub fn new(calendar: &'a WorkCalendar) -> Self {
        Self { calendar }
    }

    pub fn plan(
        &self,
        config: &ProjectConfig,
        anchor: ScheduleAnchor,
        today: NaiveDate,
    ) -> Result<WorkflowPlan, WorkflowError> {
        config.validate()?;

        let dag = StageDag::build(config);
        let windows = PipelinePass::new(&dag, config).execute()?;

        let span = windows.values().map(|w| w.finish).max().unwrap_or(0);
        if span > MAX_SCHEDULE_DAYS {
            return Err(WorkflowError::InvalidConfiguration {
                field: "schedule span",
                value: span,
                reason: "exceeds the longest supported schedule",
            });
        }

        let origin = match anchor {
            ScheduleAnchor::StartOn(start) => self.calendar.snap_forward(start),
            ScheduleAnchor::FinishBy(due) => {
                let end = self.calendar.snap_back(due);
                self.calendar.find_prev_available(end, span)
            }
        };

        let mut ordered: Vec<StageWindow> = windows.into_values().collect();
        ordered.sort_by_key(|w| w.step_type.sort_order());

        let stages: Vec<PlannedStage> = ordered
            .into_iter()
            .map(|window| PlannedStage {
                step_type: window.step_type,
                sort_order: window.step_type.sort_order(),
                start_date: self.calendar.find_next_available(origin, window.start),
                due_date: self.calendar.find_next_available(origin, window.finish),
            })
            .collect();

        let dates: Vec<StepDates> = stages
            .iter()
            .map(|stage| StepDates {
                step_type: stage.step_type,
                start_date: Some(stage.start_date),
                due_date: Some(stage.due_date),
            })
            .collect();
        let feasibility =
            FeasibilityReport::assess(config, &dates, anchor.is_deadline_driven(), today);

        Ok(WorkflowPlan {
            anchor,
            stages,
            feasibility,
        })
    }
}
