use crate::step::{NewWorkflowStep, StepStatus};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct StepValidationError {
    message: String,
}

impl StepValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StepValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StepValidationError {}

pub fn validate_step(step: &NewWorkflowStep) -> Result<(), StepValidationError> {
    if !(0..=100).contains(&step.progress) {
        return Err(StepValidationError::new(format!(
            "{} step has progress {} (must be between 0 and 100)",
            step.step_type, step.progress
        )));
    }

    if step.status == StepStatus::Completed && step.progress != 100 {
        return Err(StepValidationError::new(format!(
            "{} step is completed but progress is {}",
            step.step_type, step.progress
        )));
    }

    if let (Some(start), Some(due)) = (step.start_date, step.due_date) {
        if start > due {
            return Err(StepValidationError::new(format!(
                "{} step starts {} after its due date {}",
                step.step_type, start, due
            )));
        }
    }

    if step.title.trim().is_empty() {
        return Err(StepValidationError::new(format!(
            "{} step requires a non-empty title",
            step.step_type
        )));
    }

    Ok(())
}

/// Steps of one project: one per stage, unique sort orders, all owned by the same project.
pub fn validate_step_collection(steps: &[NewWorkflowStep]) -> Result<(), StepValidationError> {
    let mut sort_orders = HashSet::with_capacity(steps.len());
    let mut step_types = HashSet::with_capacity(steps.len());
    let project_id = steps.first().map(|step| step.project_id);
    for step in steps {
        if Some(step.project_id) != project_id {
            return Err(StepValidationError::new(format!(
                "{} step belongs to project {} but the set is for project {}",
                step.step_type,
                step.project_id,
                project_id.unwrap_or_default()
            )));
        }
        if !sort_orders.insert(step.sort_order) {
            return Err(StepValidationError::new(format!(
                "duplicate sort order {}",
                step.sort_order
            )));
        }
        if !step_types.insert(step.step_type) {
            return Err(StepValidationError::new(format!(
                "duplicate {} step",
                step.step_type
            )));
        }
        validate_step(step)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepType;
    use chrono::NaiveDate;

    #[test]
    fn completed_step_must_be_fully_done() {
        let mut step = NewWorkflowStep::new(1, StepType::Inks);
        step.status = StepStatus::Completed;
        step.progress = 80;
        assert!(validate_step(&step).is_err());
        step.progress = 100;
        assert!(validate_step(&step).is_ok());
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let mut step = NewWorkflowStep::new(1, StepType::Colors);
        step.start_date = NaiveDate::from_ymd_opt(2025, 2, 1);
        step.due_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        let err = validate_step(&step).unwrap_err();
        assert!(err.to_string().contains("after its due date"));
    }

    #[test]
    fn collection_rejects_mixed_projects() {
        let steps = vec![
            NewWorkflowStep::new(1, StepType::Plot),
            NewWorkflowStep::new(2, StepType::Script),
        ];
        assert!(validate_step_collection(&steps).is_err());
    }
}
