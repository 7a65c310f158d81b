use super::{
    PersistenceError, PersistenceResult, ProjectStore, UserStore, WorkflowStepStore,
    validate_steps,
};
use crate::project::{Project, TalentRole, User};
use crate::step::{NewWorkflowStep, WorkflowStep};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemoryState {
    projects: BTreeMap<i32, Project>,
    users: BTreeMap<i32, User>,
    steps: BTreeMap<i32, WorkflowStep>,
    next_step_id: i32,
}

impl MemoryState {
    fn allocate_step_id(&mut self) -> i32 {
        self.next_step_id += 1;
        self.next_step_id
    }
}

/// Map-backed store with incrementing step ids. Every call takes the one lock, so a
/// replace is never observed half done.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_project(&self, project: Project) {
        self.state.write().projects.insert(project.id, project);
    }

    pub fn insert_user(&self, user: User) {
        self.state.write().users.insert(user.id, user);
    }

    pub fn projects(&self) -> Vec<Project> {
        self.state.read().projects.values().cloned().collect()
    }
}

impl ProjectStore for MemoryStore {
    fn get_project(&self, id: i32) -> PersistenceResult<Option<Project>> {
        Ok(self.state.read().projects.get(&id).cloned())
    }

    fn update_project(&self, project: &Project) -> PersistenceResult<()> {
        let mut state = self.state.write();
        match state.projects.get_mut(&project.id) {
            Some(slot) => {
                *slot = project.clone();
                Ok(())
            }
            None => Err(PersistenceError::NotFound {
                entity: "project",
                id: project.id,
            }),
        }
    }
}

impl WorkflowStepStore for MemoryStore {
    fn steps_for_project(&self, project_id: i32) -> PersistenceResult<Vec<WorkflowStep>> {
        let state = self.state.read();
        let mut steps: Vec<WorkflowStep> = state
            .steps
            .values()
            .filter(|step| step.project_id == project_id)
            .cloned()
            .collect();
        steps.sort_by_key(|step| step.sort_order);
        Ok(steps)
    }

    fn get_step(&self, id: i32) -> PersistenceResult<Option<WorkflowStep>> {
        Ok(self.state.read().steps.get(&id).cloned())
    }

    fn create_step(&self, step: NewWorkflowStep) -> PersistenceResult<WorkflowStep> {
        let mut state = self.state.write();
        let id = state.allocate_step_id();
        let stored = step.with_id(id);
        state.steps.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_step(&self, step: &WorkflowStep) -> PersistenceResult<()> {
        let mut state = self.state.write();
        match state.steps.get_mut(&step.id) {
            Some(slot) => {
                *slot = step.clone();
                Ok(())
            }
            None => Err(PersistenceError::NotFound {
                entity: "workflow step",
                id: step.id,
            }),
        }
    }

    fn replace_steps_for_project(
        &self,
        project_id: i32,
        steps: Vec<NewWorkflowStep>,
    ) -> PersistenceResult<Vec<WorkflowStep>> {
        validate_steps(&steps)?;
        if let Some(foreign) = steps.iter().find(|step| step.project_id != project_id) {
            return Err(PersistenceError::InvalidData(format!(
                "{} step belongs to project {}, not {}",
                foreign.step_type, foreign.project_id, project_id
            )));
        }

        let mut state = self.state.write();
        state.steps.retain(|_, step| step.project_id != project_id);
        let mut stored = Vec::with_capacity(steps.len());
        for step in steps {
            let id = state.allocate_step_id();
            let step = step.with_id(id);
            state.steps.insert(id, step.clone());
            stored.push(step);
        }
        stored.sort_by_key(|step| step.sort_order);
        Ok(stored)
    }
}

impl UserStore for MemoryStore {
    fn get_user(&self, id: i32) -> PersistenceResult<Option<User>> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    fn users_by_role(&self, role: TalentRole) -> PersistenceResult<Vec<User>> {
        Ok(self
            .state
            .read()
            .users
            .values()
            .filter(|user| user.role == role)
            .cloned()
            .collect())
    }
}
