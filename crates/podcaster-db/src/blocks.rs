//! Block repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use podcaster_core::{Block, BlockPatch, EntityRepository, Error, Result};

/// PostgreSQL implementation of `EntityRepository<Block>`.
#[derive(Clone)]
pub struct PgBlockRepository {
    pool: Pool<Postgres>,
}

impl PgBlockRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row(r: PgRow) -> Block {
    Block {
        id: r.get("id"),
        name: r.get("name"),
        description: r.get("description"),
        kind: r.get("kind"),
    }
}

#[async_trait]
impl EntityRepository<Block> for PgBlockRepository {
    async fn create(&self, block: Block) -> Result<()> {
        sqlx::query("INSERT INTO block (id, name, description, kind) VALUES ($1, $2, $3, $4)")
            .bind(block.id)
            .bind(&block.name)
            .bind(&block.description)
            .bind(&block.kind)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("insert", format!("block {}", block.id)))?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: BlockPatch) -> Result<()> {
        let result = sqlx::query(
            "UPDATE block
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 kind = COALESCE($4, kind)
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.kind)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("update", format!("block {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("block", id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Block> {
        sqlx::query("SELECT id, name, description, kind FROM block WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(map_row)
            .ok_or_else(|| Error::not_found("block", id))
    }

    async fn find_all(&self) -> Result<Vec<Block>> {
        let rows = sqlx::query("SELECT id, name, description, kind FROM block ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM block WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("delete", format!("block {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("block", id));
        }
        Ok(())
    }
}
