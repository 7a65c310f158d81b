use super::{PersistenceError, PersistenceResult, validate_stored_steps};
use crate::step::{StepStatus, StepType, WorkflowStep};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

#[derive(Serialize, Deserialize)]
struct WorkflowSnapshot {
    project_id: i32,
    steps: Vec<WorkflowStep>,
}

pub fn save_steps_to_json<P: AsRef<Path>>(
    project_id: i32,
    steps: &[WorkflowStep],
    path: P,
) -> PersistenceResult<()> {
    validate_stored_steps(steps)?;
    let snapshot = WorkflowSnapshot {
        project_id,
        steps: steps.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_steps_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<(i32, Vec<WorkflowStep>)> {
    let file = File::open(path)?;
    let snapshot: WorkflowSnapshot = serde_json::from_reader(file)?;
    if let Some(step) = snapshot
        .steps
        .iter()
        .find(|step| step.project_id != snapshot.project_id)
    {
        return Err(PersistenceError::InvalidData(format!(
            "step {} belongs to project {}, snapshot is for project {}",
            step.id, step.project_id, snapshot.project_id
        )));
    }
    validate_stored_steps(&snapshot.steps)?;
    Ok((snapshot.project_id, snapshot.steps))
}

#[derive(Default, Serialize, Deserialize)]
struct StepCsvRecord {
    id: i32,
    project_id: i32,
    step_type: String,
    title: String,
    description: String,
    sort_order: i32,
    status: String,
    progress: i32,
    start_date: String,
    due_date: String,
    assigned_to: String,
}

impl From<&WorkflowStep> for StepCsvRecord {
    fn from(step: &WorkflowStep) -> Self {
        Self {
            id: step.id,
            project_id: step.project_id,
            step_type: step.step_type.as_str().to_string(),
            title: step.title.clone(),
            description: step.description.clone().unwrap_or_default(),
            sort_order: step.sort_order,
            status: step.status.as_str().to_string(),
            progress: step.progress,
            start_date: format_date(step.start_date),
            due_date: format_date(step.due_date),
            assigned_to: step.assigned_to.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

impl StepCsvRecord {
    fn into_step(self) -> PersistenceResult<WorkflowStep> {
        let step_type = StepType::from_str(self.step_type.trim())
            .map_err(PersistenceError::InvalidData)?;
        let status =
            StepStatus::from_str(self.status.trim()).map_err(PersistenceError::InvalidData)?;
        Ok(WorkflowStep {
            id: self.id,
            project_id: self.project_id,
            step_type,
            title: self.title,
            description: parse_string_option(self.description),
            sort_order: self.sort_order,
            status,
            progress: self.progress,
            start_date: parse_date(&self.start_date)?,
            due_date: parse_date(&self.due_date)?,
            assigned_to: parse_i32(&self.assigned_to)?,
        })
    }
}

pub fn save_steps_to_csv<P: AsRef<Path>>(steps: &[WorkflowStep], path: P) -> PersistenceResult<()> {
    validate_stored_steps(steps)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for step in steps {
        writer.serialize(StepCsvRecord::from(step))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_steps_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<WorkflowStep>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut steps = Vec::new();
    for record in reader.deserialize::<StepCsvRecord>() {
        steps.push(record?.into_step()?);
    }

    if steps.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no workflow steps".into(),
        ));
    }

    validate_stored_steps(&steps)?;
    steps.sort_by_key(|step| step.sort_order);
    Ok(steps)
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(value: &str) -> PersistenceResult<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|err| PersistenceError::InvalidData(format!("invalid date '{trimmed}': {err}")))
}

fn parse_i32(value: &str) -> PersistenceResult<Option<i32>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i32>()
        .map(Some)
        .map_err(|err| PersistenceError::InvalidData(format!("invalid integer '{trimmed}': {err}")))
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
