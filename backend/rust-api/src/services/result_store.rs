use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, params};
use thiserror::Error;

use crate::models::result::{AnswerRecord, ResultRecord};
use crate::models::{Label, SessionState};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("store task failed: {0}")]
    Task(String),
}

/// Хранилище завершённых попыток. Для движка викторины оно append-only:
/// наружу торчат только вставка и чтение.
#[derive(Clone)]
pub struct ResultStore {
    conn: Arc<Mutex<Connection>>,
}

impl ResultStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn = Connection::open(path)?;
            init_schema(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))??;

        Ok(ResultStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(ResultStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Inserts the result row plus all answer rows in one transaction and
    /// returns the generated result id. All-or-nothing: a failure on any row
    /// leaves the database without the attempt.
    pub async fn persist(&self, state: &SessionState) -> Result<i64, StoreError> {
        let conn = Arc::clone(&self.conn);
        let state = state.clone();
        tokio::task::spawn_blocking(move || -> Result<i64, StoreError> {
            let mut conn = lock(&conn);
            let tx = conn.transaction()?;
            let created_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
            tx.execute(
                "INSERT INTO results (name, phone, correct_answers, total_questions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    state.visitor_name,
                    state.visitor_phone,
                    state.correct_count as i64,
                    state.total as i64,
                    created_at,
                ],
            )?;
            let result_id = tx.last_insert_rowid();
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO answers (result_id, image_name, user_answer, is_correct)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for answer in &state.answers {
                    stmt.execute(params![
                        result_id,
                        answer.image,
                        answer.chosen.as_str(),
                        answer.was_correct,
                    ])?;
                }
            }
            tx.commit()?;
            tracing::debug!(result_id, "attempt persisted");
            Ok(result_id)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }

    /// All persisted attempts, newest first. `created_at` has second
    /// resolution, so the id is the tiebreak for same-second inserts.
    pub async fn list_all(&self) -> Result<Vec<ResultRecord>, StoreError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<Vec<ResultRecord>, StoreError> {
            let conn = lock(&conn);
            let mut stmt = conn.prepare(
                "SELECT id, name, phone, correct_answers, total_questions, created_at
                 FROM results
                 ORDER BY datetime(created_at) DESC, id DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ResultRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    correct_answers: row.get(3)?,
                    total_questions: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }

    /// Per-question breakdown of one persisted attempt, in answer order.
    pub async fn answers_for(&self, result_id: i64) -> Result<Vec<AnswerRecord>, StoreError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<Vec<AnswerRecord>, StoreError> {
            let conn = lock(&conn);
            let mut stmt = conn.prepare(
                "SELECT id, result_id, image_name, user_answer, is_correct
                 FROM answers
                 WHERE result_id = ?1
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![result_id], |row| {
                Ok(AnswerRecord {
                    id: row.get(0)?,
                    result_id: row.get(1)?,
                    image_name: row.get(2)?,
                    user_answer: Label::parse_lenient(&row.get::<_, String>(3)?),
                    is_correct: row.get(4)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }

    /// Trivial round-trip used by the health endpoint.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = lock(&conn);
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

fn lock<'a>(conn: &'a Arc<Mutex<Connection>>) -> MutexGuard<'a, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS results (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             name TEXT NOT NULL,
             phone TEXT NOT NULL,
             correct_answers INTEGER NOT NULL,
             total_questions INTEGER NOT NULL,
             created_at TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS answers (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             result_id INTEGER NOT NULL,
             image_name TEXT NOT NULL,
             user_answer TEXT NOT NULL,
             is_correct INTEGER NOT NULL,
             FOREIGN KEY (result_id) REFERENCES results (id) ON DELETE CASCADE
         );",
    )
}
