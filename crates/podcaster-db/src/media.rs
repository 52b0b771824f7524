//! Media repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use podcaster_core::{EntityRepository, Error, Media, MediaPatch, Result};

/// PostgreSQL implementation of `EntityRepository<Media>`.
#[derive(Clone)]
pub struct PgMediaRepository {
    pool: Pool<Postgres>,
}

impl PgMediaRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row(r: PgRow) -> Media {
    Media {
        id: r.get("id"),
        direct_link: r.get("direct_link"),
        kind: r.get("kind"),
        episode_id: r.get("episode_id"),
    }
}

#[async_trait]
impl EntityRepository<Media> for PgMediaRepository {
    async fn create(&self, media: Media) -> Result<()> {
        sqlx::query(
            "INSERT INTO media (id, direct_link, kind, episode_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(media.id)
        .bind(&media.direct_link)
        .bind(&media.kind)
        .bind(media.episode_id)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("insert", format!("media {}", media.id)))?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: MediaPatch) -> Result<()> {
        let result = sqlx::query(
            "UPDATE media
             SET direct_link = COALESCE($2, direct_link),
                 kind = COALESCE($3, kind),
                 episode_id = COALESCE($4, episode_id)
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.direct_link)
        .bind(patch.kind)
        .bind(patch.episode_id)
        .execute(&self.pool)
        .await
        .map_err(Error::persistence("update", format!("media {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("media", id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Media> {
        sqlx::query("SELECT id, direct_link, kind, episode_id FROM media WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(map_row)
            .ok_or_else(|| Error::not_found("media", id))
    }

    async fn find_all(&self) -> Result<Vec<Media>> {
        let rows = sqlx::query(
            "SELECT id, direct_link, kind, episode_id FROM media ORDER BY episode_id, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("delete", format!("media {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("media", id));
        }
        Ok(())
    }
}
