//! Project Store - SQLite-backed projects board
//!
//! A project owns its team members, tasks and comments. Child rows reference
//! the project with `ON DELETE CASCADE`, so deleting a project removes
//! everything it owns. Updates replace the child lists wholesale.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::chat_store::{from_millis, open_connection};
use super::error::{StorageError, StorageResult};

pub type ProjectId = i64;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        category TEXT NOT NULL,
        description TEXT NOT NULL,
        deadline TEXT NOT NULL,
        progress INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS team_members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        avatar TEXT NOT NULL,
        role TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        due_date TEXT NOT NULL,
        completed INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        author TEXT NOT NULL,
        avatar TEXT NOT NULL,
        text TEXT NOT NULL,
        date TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_team_members_project ON team_members(project_id);
    CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
    CREATE INDEX IF NOT EXISTS idx_comments_project ON comments(project_id);
";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Assigned by the store; ignored on input
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub avatar: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub due_date: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: Option<i64>,
    pub author: String,
    pub avatar: String,
    pub text: String,
    /// Free-form display date
    pub date: String,
}

/// Body of a create or update; child lists default to empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub title: String,
    pub category: String,
    pub description: String,
    pub deadline: String,
    /// Percent complete
    pub progress: i64,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A stored project with everything it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub category: String,
    pub description: String,
    pub deadline: String,
    pub progress: i64,
    pub created_at: DateTime<Utc>,
    pub team_members: Vec<TeamMember>,
    pub tasks: Vec<Task>,
    pub comments: Vec<Comment>,
}

/// Projects board persistence
pub struct ProjectStore {
    conn: Mutex<Connection>,
}

impl ProjectStore {
    /// Create or open the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::init(open_connection(path)?)
    }

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

    /// Every project with its children, ordered by id
    pub fn list_projects(&self) -> StorageResult<Vec<Project>> {
        let conn = self.conn()?;
        let ids: Vec<ProjectId> = {
            let mut stmt = conn.prepare_cached("SELECT id FROM projects ORDER BY id")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        ids.into_iter().map(|id| load_project(&conn, id)).collect()
    }

    pub fn get_project(&self, id: ProjectId) -> StorageResult<Project> {
        let conn = self.conn()?;
        load_project(&conn, id)
    }

    /// Insert a project and its children in one transaction
    pub fn create_project(&self, input: &ProjectInput, now: DateTime<Utc>) -> StorageResult<Project> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO projects (title, category, description, deadline, progress, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                input.title,
                input.category,
                input.description,
                input.deadline,
                input.progress,
                now.timestamp_millis()
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_children(&tx, id, input)?;
        tx.commit()?;

        tracing::debug!(project_id = id, "Project created");
        load_project(&conn, id)
    }

    /// Overwrite the scalar fields and replace every child list
    ///
    /// `created_at` is kept. Children get fresh ids.
    pub fn update_project(&self, id: ProjectId, input: &ProjectInput) -> StorageResult<Project> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE projects SET title = ?, category = ?, description = ?, deadline = ?, progress = ?
             WHERE id = ?",
            params![
                input.title,
                input.category,
                input.description,
                input.deadline,
                input.progress,
                id
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::ProjectNotFound(id));
        }

        for table in ["team_members", "tasks", "comments"] {
            tx.execute(
                &format!("DELETE FROM {} WHERE project_id = ?", table),
                params![id],
            )?;
        }
        insert_children(&tx, id, input)?;
        tx.commit()?;

        load_project(&conn, id)
    }

    /// Remove a project; its children go with it
    pub fn delete_project(&self, id: ProjectId) -> StorageResult<()> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM projects WHERE id = ?", params![id])?;
        if removed == 0 {
            return Err(StorageError::ProjectNotFound(id));
        }

        tracing::debug!(project_id = id, "Project deleted");
        Ok(())
    }
}

fn insert_children(conn: &Connection, id: ProjectId, input: &ProjectInput) -> StorageResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO team_members (project_id, name, avatar, role) VALUES (?, ?, ?, ?)",
    )?;
    for member in &input.team_members {
        stmt.execute(params![id, member.name, member.avatar, member.role])?;
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO tasks (project_id, title, description, due_date, completed)
         VALUES (?, ?, ?, ?, ?)",
    )?;
    for task in &input.tasks {
        stmt.execute(params![
            id,
            task.title,
            task.description,
            task.due_date,
            task.completed
        ])?;
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO comments (project_id, author, avatar, text, date) VALUES (?, ?, ?, ?, ?)",
    )?;
    for comment in &input.comments {
        stmt.execute(params![
            id,
            comment.author,
            comment.avatar,
            comment.text,
            comment.date
        ])?;
    }

    Ok(())
}

fn load_project(conn: &Connection, id: ProjectId) -> StorageResult<Project> {
    let (title, category, description, deadline, progress, created_at) = conn
        .query_row(
            "SELECT title, category, description, deadline, progress, created_at
             FROM projects WHERE id = ?",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::ProjectNotFound(id),
            other => other.into(),
        })?;

    Ok(Project {
        id,
        title,
        category,
        description,
        deadline,
        progress,
        created_at: from_millis(created_at)?,
        team_members: load_rows(
            conn,
            "SELECT id, name, avatar, role FROM team_members WHERE project_id = ? ORDER BY id",
            id,
            member_from_row,
        )?,
        tasks: load_rows(
            conn,
            "SELECT id, title, description, due_date, completed FROM tasks
             WHERE project_id = ? ORDER BY id",
            id,
            task_from_row,
        )?,
        comments: load_rows(
            conn,
            "SELECT id, author, avatar, text, date FROM comments WHERE project_id = ? ORDER BY id",
            id,
            comment_from_row,
        )?,
    })
}

fn load_rows<T>(
    conn: &Connection,
    sql: &str,
    id: ProjectId,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> StorageResult<Vec<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params![id], map)?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<TeamMember> {
    Ok(TeamMember {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        avatar: row.get(2)?,
        role: row.get(3)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        due_date: row.get(3)?,
        completed: row.get(4)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: Some(row.get(0)?),
        author: row.get(1)?,
        avatar: row.get(2)?,
        text: row.get(3)?,
        date: row.get(4)?,
    })
}
