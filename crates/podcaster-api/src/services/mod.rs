//! Application services.
//!
//! Each service validates its request through the aggregator, calls the
//! stores, and wraps any failure with the operation that produced it.
//! Association reads resolve every child through its entity store and fail
//! as a whole if one child cannot be resolved.

mod blocks;
mod categories;
mod episodes;
mod media;
mod programs;
mod tags;
mod walls;

pub use blocks::BlockService;
pub use categories::CategoryService;
pub use episodes::EpisodeService;
pub use media::MediaService;
pub use programs::ProgramService;
pub use tags::TagService;
pub use walls::WallService;

use podcaster_core::{
    AppConfig, Association, AssociationRepository, CategoryHierarchy, Entity, EntityRepository,
    Error, ErrorKind, HierarchyConfig, OverwriteEngine, Positioned, Result, Validator,
};
use podcaster_db::Database;
use tracing::debug;
use uuid::Uuid;

use crate::stores::Stores;

/// Every service, sharing one overwrite engine.
#[derive(Clone)]
pub struct AppServices {
    pub walls: WallService,
    pub blocks: BlockService,
    pub programs: ProgramService,
    pub episodes: EpisodeService,
    pub media: MediaService,
    pub tags: TagService,
    pub categories: CategoryService,
}

impl AppServices {
    pub fn new(stores: Stores, hierarchy: HierarchyConfig) -> Self {
        let engine = OverwriteEngine::new();
        let hierarchy = CategoryHierarchy::new(stores.categories.clone(), hierarchy);
        Self {
            walls: WallService::new(&stores, engine.clone()),
            blocks: BlockService::new(&stores, engine.clone()),
            programs: ProgramService::new(&stores, engine),
            episodes: EpisodeService::new(&stores),
            media: MediaService::new(&stores),
            tags: TagService::new(&stores),
            categories: CategoryService::new(&stores, hierarchy),
        }
    }

    /// Services over empty in-memory stores with default configuration.
    pub fn in_memory() -> Self {
        Self::new(Stores::in_memory(), HierarchyConfig::default())
    }

    /// Services over Postgres.
    pub fn from_database(db: &Database, config: &AppConfig) -> Self {
        Self::new(Stores::from_database(db), config.hierarchy)
    }
}

/// Reject the nil id before touching a store.
pub(crate) fn require_id(field: &str, id: Uuid) -> Result<()> {
    let mut v = Validator::new();
    v.require_id(field, id);
    v.finish()?;
    Ok(())
}

/// Resolve one child id, reporting a dangling reference as inconsistent.
async fn resolve<A, E>(entities: &dyn EntityRepository<E>, row: &A) -> Result<E>
where
    A: Association,
    E: Entity,
{
    match entities.find(row.child_id()).await {
        Ok(entity) => Ok(entity),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::Inconsistent {
            relation: A::RELATION,
            parent_id: row.parent_id(),
            child_id: row.child_id(),
        }),
        Err(e) => Err(e),
    }
}

async fn children_of<A, E>(
    associations: &dyn AssociationRepository<A>,
    entities: &dyn EntityRepository<E>,
    parent_id: Uuid,
) -> Result<Vec<(E, Option<i32>)>>
where
    A: Association,
    E: Entity,
{
    let mut rows = associations.find_by_parent(parent_id).await?;
    rows.sort_by_key(|row| (row.position(), row.child_id()));

    let mut resolved = Vec::with_capacity(rows.len());
    for row in &rows {
        resolved.push((resolve(entities, row).await?, row.position()));
    }

    debug!(
        subsystem = "api",
        component = "resolver",
        op = "find_children",
        relation = %A::RELATION,
        %parent_id,
        result_count = resolved.len(),
        "Children resolved"
    );
    Ok(resolved)
}

/// Children of a positioned relation, ordered by position then child id.
pub(crate) async fn find_positioned<A, E>(
    associations: &dyn AssociationRepository<A>,
    entities: &dyn EntityRepository<E>,
    parent_id: Uuid,
) -> Result<Vec<Positioned<E>>>
where
    A: Association,
    E: Entity,
{
    require_id(A::RELATION.parent_column(), parent_id)?;
    Ok(children_of(associations, entities, parent_id)
        .await?
        .into_iter()
        .map(|(item, position)| Positioned {
            item,
            position: position.unwrap_or_default(),
        })
        .collect())
}

/// Children of an unpositioned relation, ordered by child id.
pub(crate) async fn find_members<A, E>(
    associations: &dyn AssociationRepository<A>,
    entities: &dyn EntityRepository<E>,
    parent_id: Uuid,
) -> Result<Vec<E>>
where
    A: Association,
    E: Entity,
{
    require_id(A::RELATION.parent_column(), parent_id)?;
    Ok(children_of(associations, entities, parent_id)
        .await?
        .into_iter()
        .map(|(item, _)| item)
        .collect())
}

/// Parents linked to `child_id`, ordered by parent id.
///
/// A parent id that no longer resolves is reported as inconsistent.
pub(crate) async fn find_parents<A, E>(
    associations: &dyn AssociationRepository<A>,
    entities: &dyn EntityRepository<E>,
    child_id: Uuid,
) -> Result<Vec<E>>
where
    A: Association,
    E: Entity,
{
    require_id(A::RELATION.child_column(), child_id)?;

    let mut rows = associations.find_by_child(child_id).await?;
    rows.sort_by_key(|row| row.parent_id());

    let mut parents = Vec::with_capacity(rows.len());
    for row in &rows {
        match entities.find(row.parent_id()).await {
            Ok(parent) => parents.push(parent),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::Inconsistent {
                    relation: A::RELATION,
                    parent_id: row.parent_id(),
                    child_id,
                })
            }
            Err(e) => return Err(e),
        }
    }
    Ok(parents)
}
