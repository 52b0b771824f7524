//! Wall repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use podcaster_core::{EntityRepository, Error, Result, Wall, WallPatch};

/// PostgreSQL implementation of `EntityRepository<Wall>`.
#[derive(Clone)]
pub struct PgWallRepository {
    pool: Pool<Postgres>,
}

impl PgWallRepository {
    /// Create a new PgWallRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row(r: PgRow) -> Wall {
    Wall {
        id: r.get("id"),
        name: r.get("name"),
        description: r.get("description"),
    }
}

#[async_trait]
impl EntityRepository<Wall> for PgWallRepository {
    async fn create(&self, wall: Wall) -> Result<()> {
        sqlx::query("INSERT INTO wall (id, name, description) VALUES ($1, $2, $3)")
            .bind(wall.id)
            .bind(&wall.name)
            .bind(&wall.description)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("insert", format!("wall {}", wall.id)))?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: WallPatch) -> Result<()> {
        let result = sqlx::query(
            "UPDATE wall
             SET name = COALESCE($2, name), description = COALESCE($3, description)
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("update", format!("wall {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("wall", id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Wall> {
        sqlx::query("SELECT id, name, description FROM wall WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(map_row)
            .ok_or_else(|| Error::not_found("wall", id))
    }

    async fn find_all(&self) -> Result<Vec<Wall>> {
        let rows = sqlx::query("SELECT id, name, description FROM wall ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM wall WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("delete", format!("wall {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("wall", id));
        }
        Ok(())
    }
}
