//! Repository ports.
//!
//! These traits define the interfaces that storage backends must satisfy,
//! enabling the Postgres implementation in production and the in-memory one
//! in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::overwrite::{self, ReplaceOutcome};

// =============================================================================
// ENTITY REPOSITORY TRAITS
// =============================================================================

/// CRUD storage for one entity type.
#[async_trait]
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// Insert a new entity. The caller supplies the id.
    async fn create(&self, entity: E) -> Result<()>;

    /// Apply a partial update. Fails with `NotFound` if the id is unknown.
    async fn update(&self, id: Uuid, patch: E::Patch) -> Result<()>;

    /// Fetch one entity. Fails with `NotFound` if the id is unknown.
    async fn find(&self, id: Uuid) -> Result<E>;

    /// Fetch every entity.
    async fn find_all(&self) -> Result<Vec<E>>;

    /// Delete one entity. Fails with `NotFound` if the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Episode storage with lookup by owning program.
#[async_trait]
pub trait EpisodeRepository: EntityRepository<Episode> {
    /// All episodes whose `program_id` equals `program_id`.
    async fn find_by_program(&self, program_id: Uuid) -> Result<Vec<Episode>>;
}

// =============================================================================
// ASSOCIATION REPOSITORY TRAITS
// =============================================================================

/// Storage for one link table.
#[async_trait]
pub trait AssociationRepository<A: Association>: Send + Sync {
    /// Insert one row. The caller guarantees a fresh association id.
    async fn create(&self, association: A) -> Result<()>;

    /// Delete one row by its own id. Deleting an unknown id is not an error.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Fetch one row. Fails with `NotFound` if the id is unknown.
    async fn find(&self, id: Uuid) -> Result<A>;

    /// Rows owned by `parent_id`, in unspecified order.
    async fn find_by_parent(&self, parent_id: Uuid) -> Result<Vec<A>>;

    /// Rows pointing at `child_id`, in unspecified order.
    async fn find_by_child(&self, child_id: Uuid) -> Result<Vec<A>>;

    /// Rows linking `parent_id` to `child_id`.
    async fn find_by_parent_and_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<Vec<A>>;

    /// Make `rows` the complete set of associations of `parent_id`.
    ///
    /// The default runs fetch, delete and create as independent calls and
    /// can leave a partial set behind on failure (reported through
    /// `Error::Overwrite { partial: true, .. }`). Backends that can do better
    /// override this with an atomic replacement.
    async fn replace_for_parent(&self, parent_id: Uuid, rows: Vec<A>) -> Result<ReplaceOutcome> {
        overwrite::replace_stepwise(self, parent_id, rows).await
    }
}
