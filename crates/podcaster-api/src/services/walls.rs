use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use podcaster_core::validation::non_empty;
use podcaster_core::{
    new_v7, AssociationRepository, Block, CreateWallRequest, DesiredSet, EntityRepository,
    Error, OverwriteBlocksRequest, OverwriteEngine, OverwriteReport, Positioned, Result, ResultExt,
    UpdateWallRequest, ValidationErrors, Validator, Wall, WallBlock, WallPatch,
};

use super::{find_positioned, require_id};
use crate::stores::Stores;

/// Wall CRUD plus the ordered blocks of each wall.
#[derive(Clone)]
pub struct WallService {
    walls: Arc<dyn EntityRepository<Wall>>,
    blocks: Arc<dyn EntityRepository<Block>>,
    wall_blocks: Arc<dyn AssociationRepository<WallBlock>>,
    engine: OverwriteEngine,
}

pub(crate) fn validate_create<R: CreateWallRequest + ?Sized>(
    req: &R,
) -> std::result::Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.require("name", req.name())
        .require("description", req.description());
    v.finish()
}

impl WallService {
    pub fn new(stores: &Stores, engine: OverwriteEngine) -> Self {
        Self {
            walls: stores.walls.clone(),
            blocks: stores.blocks.clone(),
            wall_blocks: stores.wall_blocks.clone(),
            engine,
        }
    }

    pub async fn create<R: CreateWallRequest + ?Sized>(&self, req: &R) -> Result<Wall> {
        validate_create(req)
            .map_err(Error::from)
            .context("creating wall")?;

        let wall = Wall {
            id: new_v7(),
            name: req.name().to_string(),
            description: req.description().to_string(),
        };
        self.walls
            .create(wall.clone())
            .await
            .context("creating wall")?;

        info!(
            subsystem = "api",
            component = "wall_service",
            op = "create",
            entity_id = %wall.id,
            "Wall created"
        );
        Ok(wall)
    }

    /// Empty fields in `req` leave the stored value untouched.
    pub async fn update<R: UpdateWallRequest + ?Sized>(&self, id: Uuid, req: &R) -> Result<()> {
        require_id("id", id).with_context(|| format!("updating wall {}", id))?;

        let patch = WallPatch {
            name: non_empty(req.name()),
            description: non_empty(req.description()),
        };
        self.walls
            .update(id, patch)
            .await
            .with_context(|| format!("updating wall {}", id))?;

        info!(
            subsystem = "api",
            component = "wall_service",
            op = "update",
            entity_id = %id,
            "Wall updated"
        );
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Wall> {
        require_id("id", id).with_context(|| format!("finding wall {}", id))?;
        self.walls
            .find(id)
            .await
            .with_context(|| format!("finding wall {}", id))
    }

    pub async fn find_all(&self) -> Result<Vec<Wall>> {
        self.walls.find_all().await.context("listing walls")
    }

    /// Delete the wall. Its block placements are left for the caller.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        require_id("id", id).with_context(|| format!("deleting wall {}", id))?;
        self.walls
            .delete(id)
            .await
            .with_context(|| format!("deleting wall {}", id))?;

        info!(
            subsystem = "api",
            component = "wall_service",
            op = "delete",
            entity_id = %id,
            "Wall deleted"
        );
        Ok(())
    }

    /// Blocks placed on the wall, ordered by position.
    pub async fn find_blocks(&self, wall_id: Uuid) -> Result<Vec<Positioned<Block>>> {
        find_positioned(self.wall_blocks.as_ref(), self.blocks.as_ref(), wall_id)
            .await
            .with_context(|| format!("finding blocks of wall {}", wall_id))
    }

    /// Make the wall's blocks exactly the requested block-to-position map.
    pub async fn overwrite_blocks<R: OverwriteBlocksRequest + ?Sized>(
        &self,
        wall_id: Uuid,
        req: &R,
    ) -> Result<OverwriteReport> {
        let desired = DesiredSet::ordered(req.ordered_blocks());
        self.engine
            .overwrite::<WallBlock, _>(self.wall_blocks.as_ref(), wall_id, desired)
            .await
            .with_context(|| format!("overwriting blocks of wall {}", wall_id))
    }
}
