use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use podcaster_core::validation::non_empty;
use podcaster_core::{
    new_v7, AssociationRepository, Block, BlockPatch, BlockProgram, CreateBlockRequest,
    DesiredSet, EntityRepository, Error, OverwriteEngine, OverwriteProgramsRequest,
    OverwriteReport, Positioned, Program, Result, ResultExt, UpdateBlockRequest,
    ValidationErrors, Validator, Wall, WallBlock,
};

use super::{find_parents, find_positioned, require_id};
use crate::stores::Stores;

/// Block CRUD, the ordered programs of a block, and the walls showing it.
#[derive(Clone)]
pub struct BlockService {
    blocks: Arc<dyn EntityRepository<Block>>,
    programs: Arc<dyn EntityRepository<Program>>,
    walls: Arc<dyn EntityRepository<Wall>>,
    block_programs: Arc<dyn AssociationRepository<BlockProgram>>,
    wall_blocks: Arc<dyn AssociationRepository<WallBlock>>,
    engine: OverwriteEngine,
}

/// `kind` is optional on create; an empty kind is stored as is.
pub(crate) fn validate_create<R: CreateBlockRequest + ?Sized>(
    req: &R,
) -> std::result::Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.require("name", req.name())
        .require("description", req.description());
    v.finish()
}

impl BlockService {
    pub fn new(stores: &Stores, engine: OverwriteEngine) -> Self {
        Self {
            blocks: stores.blocks.clone(),
            programs: stores.programs.clone(),
            walls: stores.walls.clone(),
            block_programs: stores.block_programs.clone(),
            wall_blocks: stores.wall_blocks.clone(),
            engine,
        }
    }

    pub async fn create<R: CreateBlockRequest + ?Sized>(&self, req: &R) -> Result<Block> {
        validate_create(req)
            .map_err(Error::from)
            .context("creating block")?;

        let block = Block {
            id: new_v7(),
            name: req.name().to_string(),
            description: req.description().to_string(),
            kind: req.kind().to_string(),
        };
        self.blocks
            .create(block.clone())
            .await
            .context("creating block")?;

        info!(
            subsystem = "api",
            component = "block_service",
            op = "create",
            entity_id = %block.id,
            kind = %block.kind,
            "Block created"
        );
        Ok(block)
    }

    pub async fn update<R: UpdateBlockRequest + ?Sized>(&self, id: Uuid, req: &R) -> Result<()> {
        require_id("id", id).with_context(|| format!("updating block {}", id))?;

        let patch = BlockPatch {
            name: non_empty(req.name()),
            description: non_empty(req.description()),
            kind: non_empty(req.kind()),
        };
        self.blocks
            .update(id, patch)
            .await
            .with_context(|| format!("updating block {}", id))?;

        info!(
            subsystem = "api",
            component = "block_service",
            op = "update",
            entity_id = %id,
            "Block updated"
        );
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Block> {
        require_id("id", id).with_context(|| format!("finding block {}", id))?;
        self.blocks
            .find(id)
            .await
            .with_context(|| format!("finding block {}", id))
    }

    pub async fn find_all(&self) -> Result<Vec<Block>> {
        self.blocks.find_all().await.context("listing blocks")
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        require_id("id", id).with_context(|| format!("deleting block {}", id))?;
        self.blocks
            .delete(id)
            .await
            .with_context(|| format!("deleting block {}", id))?;

        info!(
            subsystem = "api",
            component = "block_service",
            op = "delete",
            entity_id = %id,
            "Block deleted"
        );
        Ok(())
    }

    /// Programs placed in the block, ordered by position.
    pub async fn find_programs(&self, block_id: Uuid) -> Result<Vec<Positioned<Program>>> {
        find_positioned(
            self.block_programs.as_ref(),
            self.programs.as_ref(),
            block_id,
        )
        .await
        .with_context(|| format!("finding programs of block {}", block_id))
    }

    pub async fn overwrite_programs<R: OverwriteProgramsRequest + ?Sized>(
        &self,
        block_id: Uuid,
        req: &R,
    ) -> Result<OverwriteReport> {
        let desired = DesiredSet::ordered(req.ordered_programs());
        self.engine
            .overwrite::<BlockProgram, _>(self.block_programs.as_ref(), block_id, desired)
            .await
            .with_context(|| format!("overwriting programs of block {}", block_id))
    }

    /// Walls the block is placed on.
    pub async fn find_walls(&self, block_id: Uuid) -> Result<Vec<Wall>> {
        find_parents(self.wall_blocks.as_ref(), self.walls.as_ref(), block_id)
            .await
            .with_context(|| format!("finding walls of block {}", block_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::BlockPayload;

    #[test]
    fn test_kind_is_not_required() {
        let payload = BlockPayload {
            name: "Top picks".to_string(),
            description: "Editorial selection".to_string(),
            kind: String::new(),
        };
        assert!(validate_create(&payload).is_ok());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let payload = BlockPayload {
            name: "  ".to_string(),
            description: "Editorial selection".to_string(),
            kind: "carousel".to_string(),
        };
        let errors = validate_create(&payload).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_field("name"));
    }
}
