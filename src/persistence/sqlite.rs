use super::{
    PersistenceError, PersistenceResult, ScheduleStore, TaskRecord, records_from_schedule,
    schedule_from_records,
};
use crate::Schedule;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

pub struct SqliteScheduleStore {
    connection: Mutex<Connection>,
}

impl SqliteScheduleStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS schedule_snapshot (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                saved_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                task_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection lock poisoned".into()))
    }

    fn save_tasks(&self, tx: &rusqlite::Transaction, schedule: &Schedule) -> PersistenceResult<usize> {
        tx.execute("DELETE FROM tasks", [])?;
        let records = records_from_schedule(schedule);
        let mut stmt = tx.prepare("INSERT INTO tasks (id, task_json) VALUES (?1, ?2)")?;
        for (idx, record) in records.iter().enumerate() {
            let json = serde_json::to_string(record)?;
            stmt.execute(params![idx as i64, json])?;
        }
        Ok(records.len())
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM schedule_snapshot", [])?;
        tx.execute(
            "INSERT INTO schedule_snapshot (id, saved_at) VALUES (1, ?1)",
            params![chrono::Utc::now().to_rfc3339()],
        )?;
        let count = self.save_tasks(&tx, schedule)?;
        tx.commit()?;
        info!(tasks = count, "schedule saved to sqlite");
        Ok(())
    }

    fn load_schedule(&self) -> PersistenceResult<Option<Schedule>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT saved_at FROM schedule_snapshot WHERE id = 1")?;
        let saved_at: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
        let Some(saved_at) = saved_at else {
            return Ok(None);
        };

        let mut stmt = conn.prepare("SELECT task_json FROM tasks ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for json in rows {
            let json = json?;
            let record: TaskRecord = serde_json::from_str(&json)?;
            records.push(record);
        }

        let schedule = schedule_from_records(records)?;
        info!(tasks = schedule.len(), %saved_at, "schedule loaded from sqlite");
        Ok(Some(schedule))
    }
}
