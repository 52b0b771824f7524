use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use podcaster_core::validation::non_empty;
use podcaster_core::{
    new_v7, CreateEpisodeRequest, Episode, EpisodePatch, EpisodeRepository, Error, Result,
    ResultExt, UpdateEpisodeRequest, ValidationErrors, Validator,
};

use super::require_id;
use crate::stores::Stores;

#[derive(Clone)]
pub struct EpisodeService {
    episodes: Arc<dyn EpisodeRepository>,
}

pub(crate) fn validate_create<R: CreateEpisodeRequest + ?Sized>(
    req: &R,
) -> std::result::Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.require("name", req.name())
        .require("description", req.description())
        .require_some_id("program_id", req.program_id())
        .check(req.position() > 0, "position", "should be greater than 0");
    v.finish()
}

/// Empty fields and position 0 mean "unchanged"; supplied ids must not be nil.
pub(crate) fn validate_update<R: UpdateEpisodeRequest + ?Sized>(
    id: Uuid,
    req: &R,
) -> std::result::Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.require_id("id", id)
        .optional_id("program_id", req.program_id());
    if let Some(position) = req.position() {
        v.check(position > 0, "position", "should be greater than 0");
    }
    v.finish()
}

impl EpisodeService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            episodes: stores.episodes.clone(),
        }
    }

    pub async fn create<R: CreateEpisodeRequest + ?Sized>(&self, req: &R) -> Result<Episode> {
        validate_create(req)
            .map_err(Error::from)
            .context("creating episode")?;

        let episode = Episode {
            id: new_v7(),
            name: req.name().to_string(),
            description: req.description().to_string(),
            program_id: req.program_id().unwrap_or_default(),
            position: req.position(),
        };
        self.episodes
            .create(episode.clone())
            .await
            .context("creating episode")?;

        info!(
            subsystem = "api",
            component = "episode_service",
            op = "create",
            entity_id = %episode.id,
            program_id = %episode.program_id,
            position = episode.position,
            "Episode created"
        );
        Ok(episode)
    }

    pub async fn update<R: UpdateEpisodeRequest + ?Sized>(&self, id: Uuid, req: &R) -> Result<()> {
        validate_update(id, req)
            .map_err(Error::from)
            .with_context(|| format!("updating episode {}", id))?;

        let patch = EpisodePatch {
            name: non_empty(req.name()),
            description: non_empty(req.description()),
            program_id: req.program_id(),
            position: req.position(),
        };
        self.episodes
            .update(id, patch)
            .await
            .with_context(|| format!("updating episode {}", id))?;

        info!(
            subsystem = "api",
            component = "episode_service",
            op = "update",
            entity_id = %id,
            "Episode updated"
        );
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Episode> {
        require_id("id", id).with_context(|| format!("finding episode {}", id))?;
        self.episodes
            .find(id)
            .await
            .with_context(|| format!("finding episode {}", id))
    }

    pub async fn find_all(&self) -> Result<Vec<Episode>> {
        self.episodes.find_all().await.context("listing episodes")
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        require_id("id", id).with_context(|| format!("deleting episode {}", id))?;
        self.episodes
            .delete(id)
            .await
            .with_context(|| format!("deleting episode {}", id))?;

        info!(
            subsystem = "api",
            component = "episode_service",
            op = "delete",
            entity_id = %id,
            "Episode deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::EpisodePayload;

    #[test]
    fn test_create_requires_positive_position() {
        let payload = EpisodePayload {
            name: "Pilot".to_string(),
            description: "First episode".to_string(),
            program_id: Some(new_v7()),
            position: 0,
        };
        let errors = validate_create(&payload).unwrap_err();
        assert_eq!(errors.to_string(), "position : should be greater than 0");
    }

    #[test]
    fn test_create_requires_program() {
        let payload = EpisodePayload {
            name: "Pilot".to_string(),
            description: "First episode".to_string(),
            program_id: None,
            position: 1,
        };
        let errors = validate_create(&payload).unwrap_err();
        assert!(errors.contains_field("program_id"));
    }

    #[test]
    fn test_update_allows_empty_fields() {
        assert!(validate_update(new_v7(), &EpisodePayload::default()).is_ok());

        let errors = validate_update(Uuid::nil(), &EpisodePayload::default()).unwrap_err();
        assert!(errors.contains_field("id"));
    }

    #[test]
    fn test_update_rejects_negative_position() {
        let payload = EpisodePayload {
            position: -2,
            ..Default::default()
        };
        let errors = validate_update(new_v7(), &payload).unwrap_err();
        assert!(errors.contains_field("position"));
    }
}
