//! Feasibility checks of a computed schedule against the project's declared dates.

use crate::project::ProjectConfig;
use crate::step::{StepDates, StepType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed day difference `to - from`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Positive overage when `computed` falls after `deadline`.
pub fn days_late(computed: NaiveDate, deadline: NaiveDate) -> Option<i64> {
    let diff = days_between(deadline, computed);
    (diff > 0).then_some(diff)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Plot,
    Covers,
    Completion,
}

impl Milestone {
    pub fn step_type(&self) -> StepType {
        match self {
            Milestone::Plot => StepType::Plot,
            Milestone::Covers => StepType::Covers,
            Milestone::Completion => StepType::Print,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Milestone::Plot => "plot",
            Milestone::Covers => "covers",
            Milestone::Completion => "completion",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneCheck {
    pub milestone: Milestone,
    pub deadline: NaiveDate,
    pub scheduled: NaiveDate,
    pub days_late: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub projected_start: Option<NaiveDate>,
    pub projected_completion: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    /// Days the final stage lands after `due_date`; zero when on time or no due date.
    pub days_late: i64,
    /// Deadline-driven schedules only: how far before today the first stage would have to start.
    pub start_in_past_days: i64,
    pub milestones: Vec<MilestoneCheck>,
}

impl FeasibilityReport {
    pub fn assess(
        config: &ProjectConfig,
        schedule: &[StepDates],
        deadline_driven: bool,
        today: NaiveDate,
    ) -> Self {
        let projected_start = schedule.iter().filter_map(|s| s.start_date).min();
        let projected_completion = schedule.iter().filter_map(|s| s.due_date).max();
        let due_of = |step_type: StepType| {
            schedule
                .iter()
                .filter(|s| s.step_type == step_type)
                .find_map(|s| s.due_date)
        };

        let mut milestones = Vec::new();
        let declared = [
            (Milestone::Plot, config.plot_deadline, due_of(StepType::Plot)),
            (
                Milestone::Covers,
                config.cover_deadline,
                due_of(StepType::Covers),
            ),
            (Milestone::Completion, config.due_date, projected_completion),
        ];
        for (milestone, deadline, scheduled) in declared {
            if let (Some(deadline), Some(scheduled)) = (deadline, scheduled) {
                milestones.push(MilestoneCheck {
                    milestone,
                    deadline,
                    scheduled,
                    days_late: days_late(scheduled, deadline).unwrap_or(0),
                });
            }
        }

        let days_late = milestones
            .iter()
            .find(|check| check.milestone == Milestone::Completion)
            .map(|check| check.days_late)
            .unwrap_or(0);

        let start_in_past_days = match projected_start {
            Some(start) if deadline_driven => days_between(start, today).max(0),
            _ => 0,
        };

        Self {
            projected_start,
            projected_completion,
            due_date: config.due_date,
            days_late,
            start_in_past_days,
            milestones,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.start_in_past_days == 0 && self.milestones.iter().all(|check| check.days_late == 0)
    }

    /// Human readable warnings, one per problem.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for check in &self.milestones {
            if check.days_late > 0 {
                warnings.push(format!(
                    "{} scheduled {} days late ({} vs deadline {})",
                    check.milestone, check.days_late, check.scheduled, check.deadline
                ));
            }
        }
        if self.start_in_past_days > 0 {
            warnings.push(format!(
                "work would have had to start {} days ago",
                self.start_in_past_days
            ));
        }
        warnings
    }
}
