use crate::assignment::resolve_assignee;
use crate::calendar::WorkCalendar;
use crate::config::{AppConfig, ConfigError};
use crate::error::{TimelineError, WorkflowError};
use crate::feasibility::FeasibilityReport;
use crate::initializer::{ScheduleAnchor, WorkflowInitializer};
use crate::persistence::Storage;
use crate::progress::{ProgressClassifier, StageProgress, TalentProgressStatus};
use crate::project::{ActorId, Project};
use crate::step::{NewWorkflowStep, StepDates, StepUpdate, WorkflowStep};
use crate::timeline::{TimelineFormData, TimelineResult, calculate_timeline};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// What happens to hand-edited step state when a workflow is rebuilt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Fresh steps; assignments, status and progress start over.
    Replace,
    /// Dates are recomputed, but `assigned_to`, `status`, `progress` and `description`
    /// carry over for step types that existed before.
    #[default]
    KeepStepState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeRequest {
    pub actor: ActorId,
    /// Must be set when the project already has steps.
    #[serde(default)]
    pub confirm_replace: bool,
    /// Falls back to the service default.
    #[serde(default)]
    pub retention: Option<RetentionPolicy>,
}

impl InitializeRequest {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            confirm_replace: false,
            retention: None,
        }
    }

    pub fn confirmed(mut self) -> Self {
        self.confirm_replace = true;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = Some(retention);
        self
    }
}

/// Outcome of one (re)initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub project_id: i32,
    pub actor: ActorId,
    pub anchor: ScheduleAnchor,
    /// Number of steps the run replaced.
    pub replaced: usize,
    pub steps: Vec<WorkflowStep>,
    pub feasibility: FeasibilityReport,
}

struct PreparedWorkflow {
    anchor: ScheduleAnchor,
    steps: Vec<NewWorkflowStep>,
    feasibility: FeasibilityReport,
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Entry point for the rest of the application: builds workflows, keeps them in step with
/// due-date edits and exposes the stateless calculators.
pub struct WorkflowService {
    store: Arc<dyn Storage>,
    calendar: WorkCalendar,
    classifier: ProgressClassifier,
    retention: RetentionPolicy,
    clock: Clock,
    project_locks: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            store,
            calendar: WorkCalendar::default(),
            classifier: ProgressClassifier::default(),
            retention: RetentionPolicy::default(),
            clock: Arc::new(|| chrono::Local::now().date_naive()),
            project_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(store: Arc<dyn Storage>, config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(store)
            .with_calendar(config.work_calendar()?)
            .with_progress_tolerance(config.progress_tolerance)
            .with_retention(config.retention))
    }

    pub fn with_calendar(mut self, calendar: WorkCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn with_progress_tolerance(mut self, tolerance: f64) -> Self {
        self.classifier = ProgressClassifier::new(tolerance);
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &Arc<dyn Storage> {
        &self.store
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Per-project write lock. Entries nobody holds are dropped on the way in, so the
    /// map only tracks projects with work in flight.
    fn project_lock(&self, project_id: i32) -> Arc<Mutex<()>> {
        let mut locks = self.project_locks.lock();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(project_id).or_default().clone()
    }

    fn load_project(&self, project_id: i32) -> Result<Project, WorkflowError> {
        self.store
            .get_project(project_id)?
            .ok_or(WorkflowError::ProjectNotFound(project_id))
    }

    pub fn steps(&self, project_id: i32) -> Result<Vec<WorkflowStep>, WorkflowError> {
        self.load_project(project_id)?;
        Ok(self.store.steps_for_project(project_id)?)
    }

    /// Compute and store the full step list for a project.
    ///
    /// A project that already has steps is only rebuilt when the request confirms the
    /// replace; otherwise nothing is written.
    pub fn initialize_workflow(
        &self,
        project_id: i32,
        request: &InitializeRequest,
    ) -> Result<WorkflowRun, WorkflowError> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock();

        let project = self.load_project(project_id)?;
        let existing = self.store.steps_for_project(project_id)?;
        if !existing.is_empty() && !request.confirm_replace {
            warn!(
                project_id,
                actor = %request.actor,
                existing = existing.len(),
                "refusing to replace workflow without confirmation"
            );
            return Err(WorkflowError::ReplaceNotConfirmed {
                project_id,
                existing: existing.len(),
            });
        }

        let retention = request.retention.unwrap_or(self.retention);
        let prepared = self.prepare(&project, &existing, retention)?;
        self.commit(&project, existing.len(), prepared, &request.actor)
    }

    /// Record a new due date and, when the project already has a workflow, rebuild it.
    /// The due-date edit itself is the confirmation for the replace.
    pub fn recompute_on_due_date_change(
        &self,
        project_id: i32,
        new_due_date: NaiveDate,
        actor: &ActorId,
    ) -> Result<Option<WorkflowRun>, WorkflowError> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock();

        let mut project = self.load_project(project_id)?;
        let previous = project.config.due_date.replace(new_due_date);
        let existing = self.store.steps_for_project(project_id)?;

        if existing.is_empty() {
            if previous != Some(new_due_date) {
                self.store.update_project(&project)?;
            }
            info!(project_id, actor = %actor, due = %new_due_date, "due date updated; no workflow to rebuild");
            return Ok(None);
        }

        let prepared = self.prepare(&project, &existing, self.retention)?;
        if previous != Some(new_due_date) {
            self.store.update_project(&project)?;
        }
        self.commit(&project, existing.len(), prepared, actor).map(Some)
    }

    fn prepare(
        &self,
        project: &Project,
        existing: &[WorkflowStep],
        retention: RetentionPolicy,
    ) -> Result<PreparedWorkflow, WorkflowError> {
        let anchor = ScheduleAnchor::for_project(project);
        let plan = WorkflowInitializer::new(&self.calendar).plan(
            &project.config,
            anchor,
            self.today(),
        )?;
        let feasibility = plan.feasibility.clone();

        let mut steps = plan.into_new_steps(project.id);
        for step in &mut steps {
            let role = step.step_type.responsible_role();
            step.assigned_to = resolve_assignee(&*self.store, &project.talent, role)?;
        }
        if retention == RetentionPolicy::KeepStepState {
            carry_over_state(&mut steps, existing);
        }

        Ok(PreparedWorkflow {
            anchor,
            steps,
            feasibility,
        })
    }

    fn commit(
        &self,
        project: &Project,
        replaced: usize,
        prepared: PreparedWorkflow,
        actor: &ActorId,
    ) -> Result<WorkflowRun, WorkflowError> {
        let steps = self
            .store
            .replace_steps_for_project(project.id, prepared.steps)?;

        info!(
            project_id = project.id,
            actor = %actor,
            steps = steps.len(),
            replaced,
            days_late = prepared.feasibility.days_late,
            "workflow initialized"
        );
        for warning in prepared.feasibility.warnings() {
            warn!(project_id = project.id, "{warning}");
        }

        Ok(WorkflowRun {
            project_id: project.id,
            actor: actor.clone(),
            anchor: prepared.anchor,
            replaced,
            steps,
            feasibility: prepared.feasibility,
        })
    }

    pub fn update_step(
        &self,
        step_id: i32,
        update: &StepUpdate,
        actor: &ActorId,
    ) -> Result<WorkflowStep, WorkflowError> {
        let project_id = self
            .store
            .get_step(step_id)?
            .ok_or(WorkflowError::StepNotFound(step_id))?
            .project_id;
        let lock = self.project_lock(project_id);
        let _guard = lock.lock();

        // Re-read under the lock; a rebuild may have replaced the step meanwhile.
        let mut step = self
            .store
            .get_step(step_id)?
            .ok_or(WorkflowError::StepNotFound(step_id))?;
        if let Some(user_id) = update.assigned_to {
            if self.store.get_user(user_id)?.is_none() {
                return Err(WorkflowError::UserNotFound(user_id));
            }
        }
        let from = step.status;
        step.apply_update(update)?;
        self.store.update_step(&step)?;

        info!(
            step_id,
            project_id,
            actor = %actor,
            from = %from,
            to = %step.status,
            progress = step.progress,
            "workflow step updated"
        );
        Ok(step)
    }

    /// Feasibility of the stored workflow against the project's current dates.
    pub fn feasibility(&self, project_id: i32) -> Result<FeasibilityReport, WorkflowError> {
        let project = self.load_project(project_id)?;
        let steps = self.store.steps_for_project(project_id)?;
        let dates: Vec<StepDates> = steps.iter().map(WorkflowStep::dates).collect();
        let deadline_driven = ScheduleAnchor::for_project(&project).is_deadline_driven();
        Ok(FeasibilityReport::assess(
            &project.config,
            &dates,
            deadline_driven,
            self.today(),
        ))
    }

    pub fn calculate_timeline(
        &self,
        form: &TimelineFormData,
    ) -> Result<TimelineResult, TimelineError> {
        calculate_timeline(form)
    }

    pub fn classify_progress(
        &self,
        progress: &StageProgress,
        today: Option<NaiveDate>,
    ) -> TalentProgressStatus {
        self.classifier
            .classify(progress, today.unwrap_or_else(|| self.today()))
    }
}

fn carry_over_state(steps: &mut [NewWorkflowStep], existing: &[WorkflowStep]) {
    for step in steps {
        let Some(previous) = existing.iter().find(|old| old.step_type == step.step_type) else {
            continue;
        };
        if previous.assigned_to.is_some() {
            step.assigned_to = previous.assigned_to;
        }
        step.status = previous.status;
        step.progress = previous.progress;
        if previous.description.is_some() {
            step.description = previous.description.clone();
        }
    }
}
