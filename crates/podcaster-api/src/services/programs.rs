use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use podcaster_core::validation::non_empty;
use podcaster_core::{
    new_v7, AssociationRepository, Category, CreateProgramRequest, DesiredSet, EntityRepository,
    Episode, EpisodeRepository, Error, OverwriteEngine, OverwriteReport, Program,
    ProgramCategory, ProgramPatch, ProgramTag, Result, ResultExt, Tag, UpdateProgramRequest,
    ValidationErrors, Validator,
};

use super::{find_members, require_id};
use crate::stores::Stores;

/// Program CRUD, its episodes, and its tag and category sets.
#[derive(Clone)]
pub struct ProgramService {
    programs: Arc<dyn EntityRepository<Program>>,
    episodes: Arc<dyn EpisodeRepository>,
    tags: Arc<dyn EntityRepository<Tag>>,
    categories: Arc<dyn EntityRepository<Category>>,
    program_tags: Arc<dyn AssociationRepository<ProgramTag>>,
    program_categories: Arc<dyn AssociationRepository<ProgramCategory>>,
    engine: OverwriteEngine,
}

pub(crate) fn validate_create<R: CreateProgramRequest + ?Sized>(
    req: &R,
) -> std::result::Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.require("name", req.name())
        .require("description", req.description());
    v.finish()
}

impl ProgramService {
    pub fn new(stores: &Stores, engine: OverwriteEngine) -> Self {
        Self {
            programs: stores.programs.clone(),
            episodes: stores.episodes.clone(),
            tags: stores.tags.clone(),
            categories: stores.categories.clone(),
            program_tags: stores.program_tags.clone(),
            program_categories: stores.program_categories.clone(),
            engine,
        }
    }

    pub async fn create<R: CreateProgramRequest + ?Sized>(&self, req: &R) -> Result<Program> {
        validate_create(req)
            .map_err(Error::from)
            .context("creating program")?;

        let program = Program {
            id: new_v7(),
            name: req.name().to_string(),
            description: req.description().to_string(),
        };
        self.programs
            .create(program.clone())
            .await
            .context("creating program")?;

        info!(
            subsystem = "api",
            component = "program_service",
            op = "create",
            entity_id = %program.id,
            "Program created"
        );
        Ok(program)
    }

    pub async fn update<R: UpdateProgramRequest + ?Sized>(&self, id: Uuid, req: &R) -> Result<()> {
        require_id("id", id).with_context(|| format!("updating program {}", id))?;

        let patch = ProgramPatch {
            name: non_empty(req.name()),
            description: non_empty(req.description()),
        };
        self.programs
            .update(id, patch)
            .await
            .with_context(|| format!("updating program {}", id))?;

        info!(
            subsystem = "api",
            component = "program_service",
            op = "update",
            entity_id = %id,
            "Program updated"
        );
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Program> {
        require_id("id", id).with_context(|| format!("finding program {}", id))?;
        self.programs
            .find(id)
            .await
            .with_context(|| format!("finding program {}", id))
    }

    pub async fn find_all(&self) -> Result<Vec<Program>> {
        self.programs.find_all().await.context("listing programs")
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        require_id("id", id).with_context(|| format!("deleting program {}", id))?;
        self.programs
            .delete(id)
            .await
            .with_context(|| format!("deleting program {}", id))?;

        info!(
            subsystem = "api",
            component = "program_service",
            op = "delete",
            entity_id = %id,
            "Program deleted"
        );
        Ok(())
    }

    /// Episodes of the program, ordered by position then id.
    pub async fn find_episodes(&self, program_id: Uuid) -> Result<Vec<Episode>> {
        require_id("program_id", program_id)
            .with_context(|| format!("finding episodes of program {}", program_id))?;

        let mut episodes = self
            .episodes
            .find_by_program(program_id)
            .await
            .with_context(|| format!("finding episodes of program {}", program_id))?;
        episodes.sort_by_key(|e| (e.position, e.id));

        debug!(
            subsystem = "api",
            component = "program_service",
            op = "find_episodes",
            entity_id = %program_id,
            result_count = episodes.len(),
            "Episodes listed"
        );
        Ok(episodes)
    }

    /// Tags of the program, ordered by tag id.
    pub async fn find_tags(&self, program_id: Uuid) -> Result<Vec<Tag>> {
        find_members(self.program_tags.as_ref(), self.tags.as_ref(), program_id)
            .await
            .with_context(|| format!("finding tags of program {}", program_id))
    }

    /// Categories of the program, ordered by category id.
    pub async fn find_categories(&self, program_id: Uuid) -> Result<Vec<Category>> {
        find_members(
            self.program_categories.as_ref(),
            self.categories.as_ref(),
            program_id,
        )
        .await
        .with_context(|| format!("finding categories of program {}", program_id))
    }

    /// Make the program's tags exactly `tag_ids`. Repeated ids count once.
    pub async fn overwrite_tags(
        &self,
        program_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<OverwriteReport> {
        let desired = DesiredSet::unordered(tag_ids.iter().copied());
        self.engine
            .overwrite::<ProgramTag, _>(self.program_tags.as_ref(), program_id, desired)
            .await
            .with_context(|| format!("overwriting tags of program {}", program_id))
    }

    /// Make the program's categories exactly `category_ids`.
    pub async fn overwrite_categories(
        &self,
        program_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<OverwriteReport> {
        let desired = DesiredSet::unordered(category_ids.iter().copied());
        self.engine
            .overwrite::<ProgramCategory, _>(
                self.program_categories.as_ref(),
                program_id,
                desired,
            )
            .await
            .with_context(|| format!("overwriting categories of program {}", program_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::ProgramPayload;

    #[test]
    fn test_validate_create() {
        let payload = ProgramPayload {
            name: "Morning show".to_string(),
            description: String::new(),
        };
        let errors = validate_create(&payload).unwrap_err();
        assert_eq!(errors.to_string(), "description : is required");
    }
}
