//! Chat Store - SQLite-backed users and messages
//!
//! Timestamps are stored as milliseconds since the epoch so conversations
//! order by an integer column. The connection sits behind a mutex; every
//! call holds it only for the duration of one statement or transaction.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::error::{StorageError, StorageResult};
use crate::chat::{HistoryMessage, User, UserId, UserStatus};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        avatar TEXT NOT NULL,
        status TEXT NOT NULL,
        last_seen INTEGER
    );

    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sender_id INTEGER NOT NULL REFERENCES users(id),
        receiver_id INTEGER NOT NULL REFERENCES users(id),
        content TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        read INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages(sender_id, receiver_id);
    CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp);
";

/// Demo accounts created on first start: (name, email, status)
const DEFAULT_USERS: [(&str, &str, UserStatus); 4] = [
    ("Sarah Johnson", "sarah@example.com", UserStatus::Online),
    ("Michael Chen", "michael@example.com", UserStatus::Offline),
    ("Emily Wilson", "emily@example.com", UserStatus::Online),
    ("John Doe", "john@example.com", UserStatus::Online),
];

const DEFAULT_AVATAR: &str = "https://placehold.co/100";

/// Users and messages for the chat server
pub struct ChatStore {
    conn: Mutex<Connection>,
}

impl ChatStore {
    /// Create or open the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::init(open_connection(path)?)
    }

    /// A throwaway in-memory database
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Insert the demo users if the table is empty
    ///
    /// Returns how many users were created.
    pub fn seed_default_users(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let mut conn = self.conn()?;

        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO users (name, email, avatar, status, last_seen)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            for (name, email, status) in DEFAULT_USERS.iter() {
                stmt.execute(params![
                    name,
                    email,
                    DEFAULT_AVATAR,
                    status.as_str(),
                    now.timestamp_millis()
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!(count = DEFAULT_USERS.len(), "Seeded demo users");
        Ok(DEFAULT_USERS.len())
    }

    /// Create a user and return its id
    pub fn create_user(&self, name: &str, email: &str, avatar: &str) -> StorageResult<UserId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (name, email, avatar, status, last_seen) VALUES (?, ?, ?, ?, NULL)",
            params![name, email, avatar, UserStatus::Offline.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All users ordered by id
    pub fn list_users(&self) -> StorageResult<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, email, avatar, status, last_seen FROM users ORDER BY id",
        )?;
        let rows = stmt.query_map([], user_from_row)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    pub fn get_user(&self, user_id: UserId) -> StorageResult<User> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, email, avatar, status, last_seen FROM users WHERE id = ?",
            params![user_id],
            user_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::UserNotFound(user_id),
            other => other.into(),
        })
    }

    /// Update presence and last-seen time
    ///
    /// Unknown users are ignored; returns whether a row changed.
    pub fn set_status(
        &self,
        user_id: UserId,
        status: UserStatus,
        now: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE users SET status = ?, last_seen = ? WHERE id = ?",
            params![status.as_str(), now.timestamp_millis(), user_id],
        )?;
        Ok(changed > 0)
    }

    /// Persist a message
    pub fn insert_message(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<HistoryMessage> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO messages (sender_id, receiver_id, content, timestamp, read)
             VALUES (?, ?, ?, ?, 0)",
            params![sender_id, receiver_id, content, timestamp.timestamp_millis()],
        )?;

        Ok(HistoryMessage {
            id: conn.last_insert_rowid(),
            sender_id,
            receiver_id,
            content: content.to_string(),
            timestamp: from_millis(timestamp.timestamp_millis())?,
            read: false,
        })
    }

    /// Messages between two users in either direction, oldest first
    pub fn conversation(&self, user_id: UserId, other_id: UserId) -> StorageResult<Vec<HistoryMessage>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, sender_id, receiver_id, content, timestamp, read FROM messages
             WHERE (sender_id = ?1 AND receiver_id = ?2)
                OR (sender_id = ?2 AND receiver_id = ?1)
             ORDER BY timestamp, id",
        )?;

        let rows = stmt.query_map(params![user_id, other_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, sender_id, receiver_id, content, millis, read) = row?;
            messages.push(HistoryMessage {
                id,
                sender_id,
                receiver_id,
                content,
                timestamp: from_millis(millis)?,
                read,
            });
        }
        Ok(messages)
    }

    /// Mark unread messages from `sender_id` to `user_id` as read
    ///
    /// Returns the number of messages updated.
    pub fn mark_read(&self, user_id: UserId, sender_id: UserId) -> StorageResult<usize> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE messages SET read = 1
             WHERE sender_id = ? AND receiver_id = ? AND read = 0",
            params![sender_id, user_id],
        )?;
        Ok(updated)
    }

    /// Count of unread messages addressed to `user_id`
    pub fn unread_count(&self, user_id: UserId) -> StorageResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = ? AND read = 0",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let status: String = row.get(4)?;
    let last_seen: Option<i64> = row.get(5)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        avatar: row.get(3)?,
        status: UserStatus::parse(&status),
        last_seen: last_seen.and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
    })
}

/// Open a file database in WAL mode with foreign keys enforced
pub(super) fn open_connection(path: &Path) -> StorageResult<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;

    Ok(conn)
}

pub(super) fn from_millis(millis: i64) -> StorageResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StorageError::Corruption(format!("Invalid timestamp: {}", millis)))
}
