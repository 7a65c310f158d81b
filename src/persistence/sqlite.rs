use super::{
    PersistenceError, PersistenceResult, ProjectStore, UserStore, WorkflowStepStore,
    validate_steps,
};
use crate::project::{Project, TalentRole, User};
use crate::step::{NewWorkflowStep, WorkflowStep};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                project_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                role TEXT NOT NULL,
                user_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS workflow_steps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                sort_order INTEGER NOT NULL,
                step_json TEXT NOT NULL,
                UNIQUE (project_id, sort_order)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    /// Insert or update a project row in place. Its workflow steps are left alone.
    pub fn insert_project(&self, project: &Project) -> PersistenceResult<()> {
        let json = serde_json::to_string(project)?;
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO projects (id, project_json) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET project_json = excluded.project_json",
            params![project.id, json],
        )?;
        Ok(())
    }

    pub fn insert_user(&self, user: &User) -> PersistenceResult<()> {
        let json = serde_json::to_string(user)?;
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO users (id, role, user_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET role = excluded.role, user_json = excluded.user_json",
            params![user.id, user.role.as_str(), json],
        )?;
        Ok(())
    }

    fn insert_step(tx: &Transaction, step: &NewWorkflowStep) -> PersistenceResult<WorkflowStep> {
        let json = serde_json::to_string(step)?;
        tx.execute(
            "INSERT INTO workflow_steps (project_id, sort_order, step_json) VALUES (?1, ?2, ?3)",
            params![step.project_id, step.sort_order, json],
        )?;
        let id = i32::try_from(tx.last_insert_rowid())
            .map_err(|_| PersistenceError::InvalidData("step id overflowed i32".into()))?;
        Ok(step.clone().with_id(id))
    }

    fn step_from_row(id: i32, json: &str) -> PersistenceResult<WorkflowStep> {
        let step: NewWorkflowStep = serde_json::from_str(json)?;
        Ok(step.with_id(id))
    }
}

impl ProjectStore for SqliteStore {
    fn get_project(&self, id: i32) -> PersistenceResult<Option<Project>> {
        let conn = self.connection.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT project_json FROM projects WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(json) = json else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn update_project(&self, project: &Project) -> PersistenceResult<()> {
        let json = serde_json::to_string(project)?;
        let conn = self.connection.lock();
        let changed = conn.execute(
            "UPDATE projects SET project_json = ?2 WHERE id = ?1",
            params![project.id, json],
        )?;
        if changed == 0 {
            return Err(PersistenceError::NotFound {
                entity: "project",
                id: project.id,
            });
        }
        Ok(())
    }
}

impl WorkflowStepStore for SqliteStore {
    fn steps_for_project(&self, project_id: i32) -> PersistenceResult<Vec<WorkflowStep>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT id, step_json FROM workflow_steps WHERE project_id = ?1 ORDER BY sort_order ASC",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((row.get::<_, i32>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut steps = Vec::new();
        for row in rows {
            let (id, json) = row?;
            steps.push(Self::step_from_row(id, &json)?);
        }
        Ok(steps)
    }

    fn get_step(&self, id: i32) -> PersistenceResult<Option<WorkflowStep>> {
        let conn = self.connection.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT step_json FROM workflow_steps WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|json| Self::step_from_row(id, &json)).transpose()
    }

    fn create_step(&self, step: NewWorkflowStep) -> PersistenceResult<WorkflowStep> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        let stored = Self::insert_step(&tx, &step)?;
        tx.commit()?;
        Ok(stored)
    }

    fn update_step(&self, step: &WorkflowStep) -> PersistenceResult<()> {
        let unsaved = NewWorkflowStep::from(step.clone());
        let json = serde_json::to_string(&unsaved)?;
        let conn = self.connection.lock();
        let changed = conn.execute(
            "UPDATE workflow_steps SET sort_order = ?2, step_json = ?3 WHERE id = ?1",
            params![step.id, step.sort_order, json],
        )?;
        if changed == 0 {
            return Err(PersistenceError::NotFound {
                entity: "workflow step",
                id: step.id,
            });
        }
        Ok(())
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

        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM workflow_steps WHERE project_id = ?1",
            params![project_id],
        )?;
        let mut stored = Vec::with_capacity(steps.len());
        for step in &steps {
            stored.push(Self::insert_step(&tx, step)?);
        }
        tx.commit()?;
        stored.sort_by_key(|step| step.sort_order);
        Ok(stored)
    }
}

impl UserStore for SqliteStore {
    fn get_user(&self, id: i32) -> PersistenceResult<Option<User>> {
        let conn = self.connection.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT user_json FROM users WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|json| serde_json::from_str(&json).map_err(PersistenceError::from))
            .transpose()
    }

    fn users_by_role(&self, role: TalentRole) -> PersistenceResult<Vec<User>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare("SELECT user_json FROM users WHERE role = ?1 ORDER BY id ASC")?;
        let rows = stmt.query_map(params![role.as_str()], |row| row.get::<_, String>(0))?;
        let mut users = Vec::new();
        for json in rows {
            users.push(serde_json::from_str(&json?)?);
        }
        Ok(users)
    }
}
