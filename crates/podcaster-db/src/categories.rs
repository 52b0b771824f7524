//! Category repository implementation.
//!
//! `parent_id` is a nullable weak self-reference; NULL marks a root.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use podcaster_core::{Category, CategoryPatch, EntityRepository, Error, ParentUpdate, Result};

/// PostgreSQL implementation of `EntityRepository<Category>`.
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: Pool<Postgres>,
}

impl PgCategoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row(r: PgRow) -> Category {
    Category {
        id: r.get("id"),
        name: r.get("name"),
        description: r.get("description"),
        parent_id: r.get("parent_id"),
    }
}

/// Encode a parent update as (mode, value) for the UPDATE statement.
///
/// Mode 0 keeps the column, 1 sets it to the value, 2 clears it.
fn parent_binding(parent: ParentUpdate) -> (i16, Option<Uuid>) {
    match parent {
        ParentUpdate::Keep => (0, None),
        ParentUpdate::Set(id) => (1, Some(id)),
        ParentUpdate::Clear => (2, None),
    }
}

#[async_trait]
impl EntityRepository<Category> for PgCategoryRepository {
    async fn create(&self, category: Category) -> Result<()> {
        sqlx::query(
            "INSERT INTO category (id, name, description, parent_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.parent_id)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("insert", format!("category {}", category.id)))?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: CategoryPatch) -> Result<()> {
        let (parent_mode, parent_id) = parent_binding(patch.parent);

        let result = sqlx::query(
            r#"
            UPDATE category
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                parent_id = CASE $4
                    WHEN 1 THEN $5
                    WHEN 2 THEN NULL
                    ELSE parent_id
                END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(parent_mode)
        .bind(parent_id)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("update", format!("category {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("category", id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Category> {
        sqlx::query("SELECT id, name, description, parent_id FROM category WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(map_row)
            .ok_or_else(|| Error::not_found("category", id))
    }

    async fn find_all(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, name, description, parent_id FROM category ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("delete", format!("category {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("category", id));
        }
        Ok(())
    }
}
