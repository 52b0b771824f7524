use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use podcaster_core::validation::non_empty;
use podcaster_core::{
    new_v7, CreateMediaRequest, EntityRepository, Error, Media, MediaPatch, Result, ResultExt,
    UpdateMediaRequest, ValidationErrors, Validator,
};

use super::require_id;
use crate::stores::Stores;

#[derive(Clone)]
pub struct MediaService {
    media: Arc<dyn EntityRepository<Media>>,
}

pub(crate) fn validate_create<R: CreateMediaRequest + ?Sized>(
    req: &R,
) -> std::result::Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.require("direct_link", req.direct_link())
        .require("kind", req.kind())
        .require_some_id("episode_id", req.episode_id());
    v.finish()
}

impl MediaService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            media: stores.media.clone(),
        }
    }

    pub async fn create<R: CreateMediaRequest + ?Sized>(&self, req: &R) -> Result<Media> {
        validate_create(req)
            .map_err(Error::from)
            .context("creating media")?;

        let media = Media {
            id: new_v7(),
            direct_link: req.direct_link().to_string(),
            kind: req.kind().to_string(),
            episode_id: req.episode_id().unwrap_or_default(),
        };
        self.media
            .create(media.clone())
            .await
            .context("creating media")?;

        info!(
            subsystem = "api",
            component = "media_service",
            op = "create",
            entity_id = %media.id,
            episode_id = %media.episode_id,
            "Media created"
        );
        Ok(media)
    }

    pub async fn update<R: UpdateMediaRequest + ?Sized>(&self, id: Uuid, req: &R) -> Result<()> {
        let mut v = Validator::new();
        v.require_id("id", id)
            .optional_id("episode_id", req.episode_id());
        v.finish()
            .map_err(Error::from)
            .with_context(|| format!("updating media {}", id))?;

        let patch = MediaPatch {
            direct_link: non_empty(req.direct_link()),
            kind: non_empty(req.kind()),
            episode_id: req.episode_id(),
        };
        self.media
            .update(id, patch)
            .await
            .with_context(|| format!("updating media {}", id))?;

        info!(
            subsystem = "api",
            component = "media_service",
            op = "update",
            entity_id = %id,
            "Media updated"
        );
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Media> {
        require_id("id", id).with_context(|| format!("finding media {}", id))?;
        self.media
            .find(id)
            .await
            .with_context(|| format!("finding media {}", id))
    }

    pub async fn find_all(&self) -> Result<Vec<Media>> {
        self.media.find_all().await.context("listing media")
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        require_id("id", id).with_context(|| format!("deleting media {}", id))?;
        self.media
            .delete(id)
            .await
            .with_context(|| format!("deleting media {}", id))?;

        info!(
            subsystem = "api",
            component = "media_service",
            op = "delete",
            entity_id = %id,
            "Media deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::MediaPayload;

    #[test]
    fn test_validate_create_collects_all_fields() {
        let errors = validate_create(&MediaPayload::default()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains_field("direct_link"));
        assert!(errors.contains_field("kind"));
        assert!(errors.contains_field("episode_id"));
    }
}
