//! Episode repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use podcaster_core::{EntityRepository, EpisodeRepository, Episode, EpisodePatch, Error, Result};

/// PostgreSQL implementation of `EpisodeRepository`.
#[derive(Clone)]
pub struct PgEpisodeRepository {
    pool: Pool<Postgres>,
}

impl PgEpisodeRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, name, description, program_id, position";

fn map_row(r: PgRow) -> Episode {
    Episode {
        id: r.get("id"),
        name: r.get("name"),
        description: r.get("description"),
        program_id: r.get("program_id"),
        position: r.get("position"),
    }
}

#[async_trait]
impl EntityRepository<Episode> for PgEpisodeRepository {
    async fn create(&self, episode: Episode) -> Result<()> {
        sqlx::query(
            "INSERT INTO episode (id, name, description, program_id, position)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(episode.id)
        .bind(&episode.name)
        .bind(&episode.description)
        .bind(episode.program_id)
        .bind(episode.position)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("insert", format!("episode {}", episode.id)))?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: EpisodePatch) -> Result<()> {
        let result = sqlx::query(
            "UPDATE episode
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 program_id = COALESCE($4, program_id),
                 position = COALESCE($5, position)
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.program_id)
        .bind(patch.position)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("update", format!("episode {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("episode", id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Episode> {
        sqlx::query(&format!("SELECT {} FROM episode WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(map_row)
            .ok_or_else(|| Error::not_found("episode", id))
    }

    async fn find_all(&self) -> Result<Vec<Episode>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM episode ORDER BY program_id, position, id",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM episode WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("delete", format!("episode {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("episode", id));
        }
        Ok(())
    }
}

#[async_trait]
impl EpisodeRepository for PgEpisodeRepository {
    async fn find_by_program(&self, program_id: Uuid) -> Result<Vec<Episode>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM episode WHERE program_id = $1 ORDER BY position, id",
            COLUMNS
        ))
        .bind(program_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::persistence(
            "select",
            format!("episodes of program {}", program_id),
        ))?;
        Ok(rows.into_iter().map(map_row).collect())
    }
}
