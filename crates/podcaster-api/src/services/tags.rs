use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use podcaster_core::validation::non_empty;
use podcaster_core::{
    new_v7, AssociationRepository, CreateTagRequest, EntityRepository, Error, Program,
    ProgramTag, Result, ResultExt, Tag, TagPatch, UpdateTagRequest, Validator,
};

use super::{find_parents, require_id};
use crate::stores::Stores;

/// Tag CRUD and the programs carrying a tag.
#[derive(Clone)]
pub struct TagService {
    tags: Arc<dyn EntityRepository<Tag>>,
    programs: Arc<dyn EntityRepository<Program>>,
    program_tags: Arc<dyn AssociationRepository<ProgramTag>>,
}

impl TagService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            tags: stores.tags.clone(),
            programs: stores.programs.clone(),
            program_tags: stores.program_tags.clone(),
        }
    }

    pub async fn create<R: CreateTagRequest + ?Sized>(&self, req: &R) -> Result<Tag> {
        let mut v = Validator::new();
        v.require("name", req.name())
            .require("description", req.description());
        v.finish().map_err(Error::from).context("creating tag")?;

        let tag = Tag {
            id: new_v7(),
            name: req.name().to_string(),
            description: req.description().to_string(),
        };
        self.tags.create(tag.clone()).await.context("creating tag")?;

        info!(
            subsystem = "api",
            component = "tag_service",
            op = "create",
            entity_id = %tag.id,
            "Tag created"
        );
        Ok(tag)
    }

    pub async fn update<R: UpdateTagRequest + ?Sized>(&self, id: Uuid, req: &R) -> Result<()> {
        require_id("id", id).with_context(|| format!("updating tag {}", id))?;

        let patch = TagPatch {
            name: non_empty(req.name()),
            description: non_empty(req.description()),
        };
        self.tags
            .update(id, patch)
            .await
            .with_context(|| format!("updating tag {}", id))?;

        info!(
            subsystem = "api",
            component = "tag_service",
            op = "update",
            entity_id = %id,
            "Tag updated"
        );
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Tag> {
        require_id("id", id).with_context(|| format!("finding tag {}", id))?;
        self.tags
            .find(id)
            .await
            .with_context(|| format!("finding tag {}", id))
    }

    pub async fn find_all(&self) -> Result<Vec<Tag>> {
        self.tags.find_all().await.context("listing tags")
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        require_id("id", id).with_context(|| format!("deleting tag {}", id))?;
        self.tags
            .delete(id)
            .await
            .with_context(|| format!("deleting tag {}", id))?;

        info!(
            subsystem = "api",
            component = "tag_service",
            op = "delete",
            entity_id = %id,
            "Tag deleted"
        );
        Ok(())
    }

    /// Programs carrying the tag, ordered by program id.
    pub async fn find_programs(&self, tag_id: Uuid) -> Result<Vec<Program>> {
        find_parents(self.program_tags.as_ref(), self.programs.as_ref(), tag_id)
            .await
            .with_context(|| format!("finding programs of tag {}", tag_id))
    }
}
