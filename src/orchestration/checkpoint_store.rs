use crate::orchestration::checklist::{StepKind, TaskType};
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::state::{RunState, TaskState};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
}

impl AttemptOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One executor invocation, kept alongside the checkpoint it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepAttemptRecord {
    pub task_id: String,
    pub step: StepKind,
    pub attempt: u32,
    pub started_at: i64,
    pub ended_at: i64,
    pub outcome: AttemptOutcome,
    pub error: Option<String>,
}

impl StepAttemptRecord {
    pub fn duration_seconds(&self) -> i64 {
        (self.ended_at - self.started_at).max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSummary {
    pub task_id: String,
    pub task_type: TaskType,
    pub status: RunState,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Sqlite checkpoint store keyed by task id. Each save replaces the whole
/// state snapshot for that task.
pub struct CheckpointStore {
    db_path: PathBuf,
}

impl CheckpointStore {
    pub fn open(db_path: &Path) -> Result<Self, OrchestratorError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|source| OrchestratorError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn ensure_schema(&self) -> Result<(), OrchestratorError> {
        let connection = self.connect()?;
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS checkpoints (
                    task_id TEXT PRIMARY KEY,
                    task_type TEXT NOT NULL,
                    status TEXT NOT NULL,
                    state_json TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS step_attempts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    task_id TEXT NOT NULL,
                    step TEXT NOT NULL,
                    attempt INTEGER NOT NULL,
                    started_at INTEGER NOT NULL,
                    ended_at INTEGER NOT NULL,
                    outcome TEXT NOT NULL,
                    error TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_step_attempts_task
                    ON step_attempts(task_id, started_at);

                CREATE INDEX IF NOT EXISTS idx_checkpoints_updated
                    ON checkpoints(updated_at DESC);
                ",
            )
            .map_err(|source| self.sql_error(source))
    }

    pub fn save(&self, state: &TaskState) -> Result<(), OrchestratorError> {
        let state_json =
            serde_json::to_string(state).map_err(|source| OrchestratorError::CheckpointJson {
                task_id: state.task_id.to_string(),
                source,
            })?;
        let connection = self.connect()?;
        connection
            .execute(
                "
                INSERT INTO checkpoints (task_id, task_type, status, state_json, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(task_id) DO UPDATE SET
                    status = excluded.status,
                    state_json = excluded.state_json,
                    updated_at = excluded.updated_at
                ",
                params![
                    state.task_id.as_str(),
                    state.task_type.as_str(),
                    state.status.to_string(),
                    state_json,
                    state.created_at,
                    state.updated_at,
                ],
            )
            .map_err(|source| self.sql_error(source))?;
        Ok(())
    }

    pub fn load(&self, task_id: &str) -> Result<TaskState, OrchestratorError> {
        let connection = self.connect()?;
        let raw: Option<String> = connection
            .query_row(
                "SELECT state_json FROM checkpoints WHERE task_id = ?1",
                params![task_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|source| self.sql_error(source))?;
        let raw = raw.ok_or_else(|| OrchestratorError::UnknownTaskId {
            task_id: task_id.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|source| OrchestratorError::CheckpointJson {
            task_id: task_id.to_string(),
            source,
        })
    }

    /// Appends one attempt row. Rows are never replaced, so attempt numbers
    /// restarting on resume keep both records.
    pub fn record_attempt(&self, record: &StepAttemptRecord) -> Result<(), OrchestratorError> {
        let connection = self.connect()?;
        connection
            .execute(
                "
                INSERT INTO step_attempts
                    (task_id, step, attempt, started_at, ended_at, outcome, error)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
                params![
                    record.task_id,
                    record.step.as_str(),
                    record.attempt,
                    record.started_at,
                    record.ended_at,
                    record.outcome.as_str(),
                    record.error,
                ],
            )
            .map_err(|source| self.sql_error(source))?;
        Ok(())
    }

    pub fn list_attempts(&self, task_id: &str) -> Result<Vec<StepAttemptRecord>, OrchestratorError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare(
                "
                SELECT task_id, step, attempt, started_at, ended_at, outcome, error
                FROM step_attempts
                WHERE task_id = ?1
                ORDER BY started_at ASC, id ASC
                ",
            )
            .map_err(|source| self.sql_error(source))?;
        let rows = statement
            .query_map(params![task_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })
            .map_err(|source| self.sql_error(source))?;

        let mut out = Vec::new();
        for row in rows {
            let (task_id, step_raw, attempt, started_at, ended_at, outcome_raw, error) =
                row.map_err(|source| self.sql_error(source))?;
            let step = StepKind::parse(&step_raw).map_err(|reason| {
                OrchestratorError::CorruptCheckpoint {
                    task_id: task_id.clone(),
                    reason,
                }
            })?;
            let outcome = AttemptOutcome::parse(&outcome_raw).ok_or_else(|| {
                OrchestratorError::CorruptCheckpoint {
                    task_id: task_id.clone(),
                    reason: format!("unknown attempt outcome `{outcome_raw}`"),
                }
            })?;
            out.push(StepAttemptRecord {
                task_id,
                step,
                attempt,
                started_at,
                ended_at,
                outcome,
                error,
            });
        }
        Ok(out)
    }

    /// Most recently updated tasks first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<CheckpointSummary>, OrchestratorError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare(
                "
                SELECT task_id, task_type, status, created_at, updated_at
                FROM checkpoints
                ORDER BY updated_at DESC, task_id ASC
                LIMIT ?1
                ",
            )
            .map_err(|source| self.sql_error(source))?;
        let rows = statement
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .map_err(|source| self.sql_error(source))?;

        let mut out = Vec::new();
        for row in rows {
            let (task_id, task_type_raw, status_raw, created_at, updated_at) =
                row.map_err(|source| self.sql_error(source))?;
            let task_type = TaskType::parse(&task_type_raw).map_err(|reason| {
                OrchestratorError::CorruptCheckpoint {
                    task_id: task_id.clone(),
                    reason,
                }
            })?;
            let status = run_state_from_db(&status_raw).ok_or_else(|| {
                OrchestratorError::CorruptCheckpoint {
                    task_id: task_id.clone(),
                    reason: format!("unknown status `{status_raw}`"),
                }
            })?;
            out.push(CheckpointSummary {
                task_id,
                task_type,
                status,
                created_at,
                updated_at,
            });
        }
        Ok(out)
    }

    fn connect(&self) -> Result<Connection, OrchestratorError> {
        let connection = Connection::open(&self.db_path).map_err(|source| self.sql_error(source))?;
        connection
            .execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|source| self.sql_error(source))?;
        Ok(connection)
    }

    fn sql_error(&self, source: rusqlite::Error) -> OrchestratorError {
        OrchestratorError::Checkpoint {
            path: self.db_path.display().to_string(),
            source,
        }
    }
}

fn run_state_from_db(value: &str) -> Option<RunState> {
    match value {
        "queued" => Some(RunState::Queued),
        "running" => Some(RunState::Running),
        "succeeded" => Some(RunState::Succeeded),
        "failed" => Some(RunState::Failed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::TaskId;

    #[test]
    fn run_state_round_trips_through_display() {
        for state in [
            RunState::Queued,
            RunState::Running,
            RunState::Succeeded,
            RunState::Failed,
        ] {
            assert_eq!(run_state_from_db(&state.to_string()), Some(state));
        }
        assert_eq!(run_state_from_db("paused"), None);
    }

    #[test]
    fn save_overwrites_snapshot_for_same_task() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CheckpointStore::open(&dir.path().join("db/checkpoints.db")).expect("open");
        let mut state = TaskState::new(
            TaskId::parse("citation_only_5_zz00").expect("id"),
            TaskType::CitationOnly,
            "input",
            5,
        );
        store.save(&state).expect("first save");
        state.transition(RunState::Running, 6).expect("running");
        store.save(&state).expect("second save");

        let loaded = store.load("citation_only_5_zz00").expect("load");
        assert_eq!(loaded.status, RunState::Running);
        let recent = store.list_recent(10).expect("recent");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].created_at, 5);
        assert_eq!(recent[0].updated_at, 6);
    }

    #[test]
    fn identical_attempt_records_are_both_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CheckpointStore::open(&dir.path().join("checkpoints.db")).expect("open");
        let record = StepAttemptRecord {
            task_id: "citation_only_5_zz00".to_string(),
            step: StepKind::Research,
            attempt: 1,
            started_at: 5,
            ended_at: 7,
            outcome: AttemptOutcome::Failed,
            error: Some("rejected".to_string()),
        };
        store.record_attempt(&record).expect("first");
        store.record_attempt(&record).expect("second");

        let attempts = store.list_attempts("citation_only_5_zz00").expect("list");
        assert_eq!(attempts, vec![record.clone(), record]);
        assert_eq!(attempts[0].duration_seconds(), 2);
    }
}
