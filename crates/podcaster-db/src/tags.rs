//! Tag repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use podcaster_core::{EntityRepository, Error, Result, Tag, TagPatch};

/// PostgreSQL implementation of `EntityRepository<Tag>`.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row(r: PgRow) -> Tag {
    Tag {
        id: r.get("id"),
        name: r.get("name"),
        description: r.get("description"),
    }
}

#[async_trait]
impl EntityRepository<Tag> for PgTagRepository {
    async fn create(&self, tag: Tag) -> Result<()> {
        sqlx::query("INSERT INTO tag (id, name, description) VALUES ($1, $2, $3)")
            .bind(tag.id)
            .bind(&tag.name)
            .bind(&tag.description)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("insert", format!("tag {}", tag.id)))?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: TagPatch) -> Result<()> {
        let result = sqlx::query(
            "UPDATE tag
             SET name = COALESCE($2, name), description = COALESCE($3, description)
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("update", format!("tag {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("tag", id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Tag> {
        sqlx::query("SELECT id, name, description FROM tag WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(map_row)
            .ok_or_else(|| Error::not_found("tag", id))
    }

    async fn find_all(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, description FROM tag ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("delete", format!("tag {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("tag", id));
        }
        Ok(())
    }
}
