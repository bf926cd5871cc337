//! Category repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Get-or-create categories by unique name without read-then-write races.
//! - Provide popularity ordering by usage.
//!
//! # Invariants
//! - Exactly one row exists per name; concurrent get-or-create resolves to it.
//! - Nothing in this module increments `usage_count`; see
//!   `attach_category_for_new_task`, which only runs inside task creation.

use crate::model::category::{normalize_category_name, Category, CategoryId};
use crate::model::task::CategorySelector;
use crate::repo::{ensure_tables, is_unique_violation, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT id, name, usage_count FROM categories";
const POPULAR_DEFAULT_LIMIT: u32 = 10;

/// Repository interface for categories.
pub trait CategoryRepository {
    /// Returns the category with `name`, creating it when missing.
    fn get_or_create(&self, name: &str) -> RepoResult<Category>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    /// All categories, most used first, then by name.
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    /// Most used categories; `None` or `0` means the default of 10.
    fn popular_categories(&self, limit: Option<u32>) -> RepoResult<Vec<Category>>;
    fn rename_category(&self, id: CategoryId, name: &str) -> RepoResult<()>;
    /// Deletes a category; referencing tasks keep existing with no category.
    fn delete_category(&self, id: CategoryId) -> RepoResult<()>;
    fn count_categories(&self) -> RepoResult<u32>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["categories"])?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn get_or_create(&self, name: &str) -> RepoResult<Category> {
        let name = normalize_category_name(name)?;
        let id = upsert_category_id(self.conn, &name)?;
        self.get_category(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("category {id} vanished after upsert")))
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_category_row,
            )
            .optional()?;
        Ok(category)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE name = ?1;"),
                [name.trim()],
                parse_category_row,
            )
            .optional()?;
        Ok(category)
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL} ORDER BY usage_count DESC, name ASC;"
        ))?;
        let rows = stmt.query_map([], parse_category_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn popular_categories(&self, limit: Option<u32>) -> RepoResult<Vec<Category>> {
        let limit = match limit {
            None | Some(0) => POPULAR_DEFAULT_LIMIT,
            Some(value) => value,
        };
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL} ORDER BY usage_count DESC, name ASC LIMIT ?1;"
        ))?;
        let rows = stmt.query_map([i64::from(limit)], parse_category_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn rename_category(&self, id: CategoryId, name: &str) -> RepoResult<()> {
        let name = normalize_category_name(name)?;
        let changed = match self.conn.execute(
            "UPDATE categories SET name = ?1 WHERE id = ?2;",
            params![name.as_str(), id],
        ) {
            Ok(changed) => changed,
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::CategoryNameConflict(name));
            }
            Err(err) => return Err(err.into()),
        };
        if changed == 0 {
            return Err(RepoError::CategoryNotFound(id));
        }
        Ok(())
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::CategoryNotFound(id));
        }
        Ok(())
    }

    fn count_categories(&self) -> RepoResult<u32> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories;", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Resolves `selector` and records one new usage of it.
///
/// Must run inside the transaction that inserts the new task so the usage
/// bump and the task row commit together.
pub(crate) fn attach_category_for_new_task(
    conn: &Connection,
    selector: &CategorySelector,
) -> RepoResult<CategoryId> {
    match selector {
        CategorySelector::Id(id) => {
            let changed = conn.execute(
                "UPDATE categories SET usage_count = usage_count + 1 WHERE id = ?1;",
                [id],
            )?;
            if changed == 0 {
                return Err(RepoError::CategoryNotFound(*id));
            }
            Ok(*id)
        }
        CategorySelector::Name(name) => {
            let name = normalize_category_name(name)?;
            conn.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?1);",
                [name.as_str()],
            )?;
            let id = conn.query_row(
                "UPDATE categories
                 SET usage_count = usage_count + 1
                 WHERE name = ?1
                 RETURNING id;",
                [name.as_str()],
                |row| row.get(0),
            )?;
            Ok(id)
        }
    }
}

fn upsert_category_id(conn: &Connection, name: &str) -> RepoResult<CategoryId> {
    conn.execute(
        "INSERT OR IGNORE INTO categories (name) VALUES (?1);",
        [name],
    )?;
    let id = conn.query_row(
        "SELECT id FROM categories WHERE name = ?1;",
        [name],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        usage_count: row.get("usage_count")?,
    })
}
