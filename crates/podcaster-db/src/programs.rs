//! Program repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use podcaster_core::{EntityRepository, Error, Program, ProgramPatch, Result};

/// PostgreSQL implementation of `EntityRepository<Program>`.
#[derive(Clone)]
pub struct PgProgramRepository {
    pool: Pool<Postgres>,
}

impl PgProgramRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row(r: PgRow) -> Program {
    Program {
        id: r.get("id"),
        name: r.get("name"),
        description: r.get("description"),
    }
}

#[async_trait]
impl EntityRepository<Program> for PgProgramRepository {
    async fn create(&self, program: Program) -> Result<()> {
        sqlx::query("INSERT INTO program (id, name, description) VALUES ($1, $2, $3)")
            .bind(program.id)
            .bind(&program.name)
            .bind(&program.description)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("insert", format!("program {}", program.id)))?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: ProgramPatch) -> Result<()> {
        let result = sqlx::query(
            "UPDATE program
             SET name = COALESCE($2, name), description = COALESCE($3, description)
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("update", format!("program {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("program", id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Program> {
        sqlx::query("SELECT id, name, description FROM program WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(map_row)
            .ok_or_else(|| Error::not_found("program", id))
    }

    async fn find_all(&self) -> Result<Vec<Program>> {
        let rows = sqlx::query("SELECT id, name, description FROM program ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM program WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("delete", format!("program {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("program", id));
        }
        Ok(())
    }
}
