//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `tasks`, joined with the category name.
//! - Commit a new task and its category usage bump in one transaction.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Default list order is `priority_score DESC, created_at DESC, uuid ASC`.
//! - Updates never touch category usage counts.

use crate::model::category::CategoryId;
use crate::model::task::{CategorySelector, Task, TaskId, TaskStatus, PRIORITY_MAX};
use crate::repo::category_repo::attach_category_for_new_task;
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use serde::Serialize;

const TASK_SELECT_SQL: &str = "SELECT
    t.uuid,
    t.title,
    t.description,
    t.category_id,
    c.name AS category_name,
    t.priority_score,
    t.deadline,
    t.status,
    t.created_at,
    t.updated_at
FROM tasks t
LEFT JOIN categories c ON c.id = t.category_id";

/// Threshold at or above which a task counts as high priority in stats.
pub const HIGH_PRIORITY_THRESHOLD: u8 = 7;

/// Query options for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring match over title and description.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Aggregate counters over the task table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total_tasks: u32,
    pub pending_tasks: u32,
    pub in_progress_tasks: u32,
    pub completed_tasks: u32,
    pub high_priority_tasks: u32,
    pub overdue_tasks: u32,
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    /// Inserts a new task, associating and counting `category` atomically.
    ///
    /// `task.category_id` is ignored; the selector decides the association.
    fn insert_task(&self, task: &Task, category: Option<&CategorySelector>) -> RepoResult<Task>;
    /// Replaces mutable fields of an existing task, including `category_id`
    /// and `updated_at`.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Number of tasks in `Pending` or `InProgress`.
    fn count_open_tasks(&self) -> RepoResult<u32>;
    /// Counts by status, high priority, and open tasks past their deadline.
    fn task_counts(&self, now_ms: i64) -> RepoResult<TaskCounts>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["tasks", "categories"])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert_task(&self, task: &Task, category: Option<&CategorySelector>) -> RepoResult<Task> {
        task.validate()?;

        // Immediate: take the write lock up front so concurrent creators of
        // the same category name serialize on the upsert.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let category_id = match category {
            Some(selector) => Some(attach_category_for_new_task(&tx, selector)?),
            None => None,
        };

        tx.execute(
            "INSERT INTO tasks (
                uuid,
                title,
                description,
                category_id,
                priority_score,
                deadline,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                task.uuid.to_string(),
                task.title.as_str(),
                task.description.as_str(),
                category_id,
                task.priority_score,
                task.deadline,
                task.status.as_str(),
                task.created_at,
                task.updated_at,
            ],
        )?;
        tx.commit()?;

        self.get_task(task.uuid)?.ok_or_else(|| {
            RepoError::InvalidData(format!("task {} missing after insert", task.uuid))
        })
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                category_id = ?3,
                priority_score = ?4,
                deadline = ?5,
                status = ?6,
                updated_at = ?7
             WHERE uuid = ?8;",
            params![
                task.title.as_str(),
                task.description.as_str(),
                task.category_id,
                task.priority_score,
                task.deadline,
                task.status.as_str(),
                task.updated_at,
                task.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(task.uuid));
        }
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE t.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND t.status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        if let Some(category_id) = query.category_id {
            sql.push_str(" AND t.category_id = ?");
            bind_values.push(Value::Integer(category_id));
        }

        if let Some(search) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sql.push_str(
                " AND (instr(lower(t.title), lower(?)) > 0 OR instr(lower(t.description), lower(?)) > 0)",
            );
            bind_values.push(Value::Text(search.to_string()));
            bind_values.push(Value::Text(search.to_string()));
        }

        sql.push_str(" ORDER BY t.priority_score DESC, t.created_at DESC, t.uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn count_open_tasks(&self) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE status IN ('pending', 'in_progress');",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn task_counts(&self, now_ms: i64) -> RepoResult<TaskCounts> {
        let counts = self
            .conn
            .query_row(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(status = 'pending'), 0),
                    COALESCE(SUM(status = 'in_progress'), 0),
                    COALESCE(SUM(status = 'done'), 0),
                    COALESCE(SUM(priority_score >= ?1), 0),
                    COALESCE(SUM(
                        deadline IS NOT NULL
                        AND deadline < ?2
                        AND status IN ('pending', 'in_progress')
                    ), 0)
                 FROM tasks;",
                params![HIGH_PRIORITY_THRESHOLD, now_ms],
                |row| {
                    Ok(TaskCounts {
                        total_tasks: row.get(0)?,
                        pending_tasks: row.get(1)?,
                        in_progress_tasks: row.get(2)?,
                        completed_tasks: row.get(3)?,
                        high_priority_tasks: row.get(4)?,
                        overdue_tasks: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(counts.unwrap_or_default())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "tasks.uuid")?;

    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let raw_priority: i64 = row.get("priority_score")?;
    let priority_score = u8::try_from(raw_priority)
        .ok()
        .filter(|value| *value <= PRIORITY_MAX)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid priority `{raw_priority}` in tasks.priority_score"
            ))
        })?;

    let task = Task {
        uuid,
        title: row.get("title")?,
        description: row.get("description")?,
        category_id: row.get("category_id")?,
        category_name: row.get("category_name")?,
        priority_score,
        deadline: row.get("deadline")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    task.validate()?;
    Ok(task)
}
