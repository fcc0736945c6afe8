//! SQLite-backed reminder store.
//!
//! The mutation surface is deliberately small: insert, delete, and two
//! ordered queries. There is no update-in-place; recurrence is always
//! delete-then-insert, so every row is immutable for its whole life.
//!
//! Timestamps are stored as RFC 3339 text carrying the system's fixed UTC
//! offset. With one offset and whole-second formatting, lexicographic
//! comparison in SQL equals chronological comparison, so `due_at <= ?` and
//! `ORDER BY due_at` work directly on the text column.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use sqlite::{ConnectionWithFullMutex, State};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::features::reminders::{Reminder, Repeat};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    message TEXT NOT NULL,
    due_at TEXT NOT NULL,
    repeat TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reminders_due_at ON reminders (due_at);
CREATE INDEX IF NOT EXISTS idx_reminders_owner ON reminders (owner_id);
";

/// Cloneable async handle to the reminder store.
///
/// All operations are atomic with respect to each other: the connection is
/// behind one async mutex, so concurrent inserts from user flows and from
/// scheduler recurrence, deletes from either side, and the polling reads
/// serialize without corrupting the record set.
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<ConnectionWithFullMutex>>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub async fn new(path: &str) -> Result<Self> {
        let connection = sqlite::Connection::open_with_full_mutex(path)
            .with_context(|| format!("failed to open database at {path}"))?;
        connection
            .execute(SCHEMA)
            .context("failed to create reminders schema")?;
        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// An in-memory store for tests.
    pub async fn open_in_memory() -> Result<Self> {
        Self::new(":memory:").await
    }

    /// Insert a reminder and return its store-assigned id.
    pub async fn add_reminder(
        &self,
        owner_id: i64,
        text: &str,
        due_at: DateTime<FixedOffset>,
        repeat: Repeat,
    ) -> Result<i64> {
        let connection = self.connection.lock().await;
        let mut statement = connection
            .prepare("INSERT INTO reminders (owner_id, message, due_at, repeat) VALUES (?, ?, ?, ?)")
            .context("failed to prepare reminder insert")?;
        statement.bind((1, owner_id))?;
        statement.bind((2, text))?;
        statement.bind((3, db_time(due_at).as_str()))?;
        statement.bind((4, repeat.as_str()))?;
        statement.next().context("failed to insert reminder")?;
        drop(statement);

        // Still under the same lock, so this is our insert's rowid.
        let mut statement = connection.prepare("SELECT last_insert_rowid()")?;
        match statement.next()? {
            State::Row => Ok(statement.read::<i64, _>(0)?),
            State::Done => bail!("no rowid after reminder insert"),
        }
    }

    /// Delete a reminder by id. Idempotent: deleting an id that is already
    /// gone is a success, mirroring concurrent scheduler/user deletion.
    pub async fn delete_reminder(&self, id: i64) -> Result<()> {
        let connection = self.connection.lock().await;
        let mut statement = connection
            .prepare("DELETE FROM reminders WHERE id = ?")
            .context("failed to prepare reminder delete")?;
        statement.bind((1, id))?;
        statement.next().context("failed to delete reminder")?;
        Ok(())
    }

    /// Delete a reminder only if it belongs to `owner_id`. Returns whether
    /// a row was actually removed.
    pub async fn delete_owned(&self, id: i64, owner_id: i64) -> Result<bool> {
        let connection = self.connection.lock().await;
        let mut statement = connection
            .prepare("DELETE FROM reminders WHERE id = ? AND owner_id = ?")
            .context("failed to prepare owned reminder delete")?;
        statement.bind((1, id))?;
        statement.bind((2, owner_id))?;
        statement.next().context("failed to delete reminder")?;
        drop(statement);
        Ok(connection.change_count() > 0)
    }

    /// All reminders with `due_at <= as_of`, earliest first, so several
    /// simultaneously due reminders are delivered in a deterministic order.
    pub async fn due_reminders(&self, as_of: DateTime<FixedOffset>) -> Result<Vec<Reminder>> {
        let connection = self.connection.lock().await;
        let mut statement = connection
            .prepare(
                "SELECT id, owner_id, message, due_at, repeat FROM reminders \
                 WHERE due_at <= ? ORDER BY due_at ASC",
            )
            .context("failed to prepare due query")?;
        statement.bind((1, db_time(as_of).as_str()))?;
        read_reminders(&mut statement)
    }

    /// A user's reminders, earliest first.
    pub async fn reminders_for(&self, owner_id: i64) -> Result<Vec<Reminder>> {
        let connection = self.connection.lock().await;
        let mut statement = connection
            .prepare(
                "SELECT id, owner_id, message, due_at, repeat FROM reminders \
                 WHERE owner_id = ? ORDER BY due_at ASC",
            )
            .context("failed to prepare owner query")?;
        statement.bind((1, owner_id))?;
        read_reminders(&mut statement)
    }
}

fn read_reminders(statement: &mut sqlite::Statement<'_>) -> Result<Vec<Reminder>> {
    let mut reminders = Vec::new();
    while let State::Row = statement.next()? {
        let due_at_text = statement.read::<String, _>("due_at")?;
        let repeat_text = statement.read::<String, _>("repeat")?;
        reminders.push(Reminder {
            id: statement.read::<i64, _>("id")?,
            owner_id: statement.read::<i64, _>("owner_id")?,
            text: statement.read::<String, _>("message")?,
            due_at: DateTime::parse_from_rfc3339(&due_at_text)
                .with_context(|| format!("bad stored timestamp: {due_at_text}"))?,
            repeat: repeat_text
                .parse::<Repeat>()
                .with_context(|| format!("bad stored repeat kind: {repeat_text}"))?,
        });
    }
    Ok(reminders)
}

/// Whole-second RFC 3339 with the explicit offset. Sub-minute precision is
/// out of scope, and a uniform width keeps text ordering chronological.
fn db_time(instant: DateTime<FixedOffset>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}
