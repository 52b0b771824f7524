//! In-memory repository implementations.
//!
//! Used by unit tests and by services wired without a database. Both stores
//! keep their rows behind a single `RwLock`, and the lock is never held
//! across an await point.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::trace;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Association, Entity, Episode};
use crate::overwrite::ReplaceOutcome;
use crate::traits::{AssociationRepository, EntityRepository, EpisodeRepository};

fn poisoned(what: &str) -> Error {
    Error::Storage(format!("{} lock poisoned", what))
}

// =============================================================================
// ENTITY STORE
// =============================================================================

/// Entity store backed by an ordered map keyed by id.
#[derive(Debug)]
pub struct InMemoryEntityStore<E: Entity> {
    rows: RwLock<BTreeMap<Uuid, E>>,
}

impl<E: Entity> Default for InMemoryEntityStore<E> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<E: Entity> InMemoryEntityStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Uuid, E>>> {
        self.rows.read().map_err(|_| poisoned(E::NAME))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<Uuid, E>>> {
        self.rows.write().map_err(|_| poisoned(E::NAME))
    }
}

#[async_trait]
impl<E: Entity> EntityRepository<E> for InMemoryEntityStore<E> {
    async fn create(&self, entity: E) -> Result<()> {
        let id = entity.id();
        let mut rows = self.write()?;
        if rows.contains_key(&id) {
            return Err(Error::Storage(format!("duplicate {} id {}", E::NAME, id)));
        }
        rows.insert(id, entity);
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: E::Patch) -> Result<()> {
        let mut rows = self.write()?;
        let entity = rows.get_mut(&id).ok_or_else(|| Error::not_found(E::NAME, id))?;
        entity.apply(&patch);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<E> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(E::NAME, id))
    }

    async fn find_all(&self) -> Result<Vec<E>> {
        Ok(self.read()?.values().cloned().collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.write()?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(E::NAME, id))
    }
}

#[async_trait]
impl EpisodeRepository for InMemoryEntityStore<Episode> {
    async fn find_by_program(&self, program_id: Uuid) -> Result<Vec<Episode>> {
        Ok(self
            .read()?
            .values()
            .filter(|episode| episode.program_id == program_id)
            .cloned()
            .collect())
    }
}

// =============================================================================
// ASSOCIATION STORE
// =============================================================================

/// Link-table store. A (parent, child) pair is stored at most once.
#[derive(Debug)]
pub struct InMemoryAssociationStore<A: Association> {
    rows: RwLock<HashMap<Uuid, A>>,
}

impl<A: Association> Default for InMemoryAssociationStore<A> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<A: Association> InMemoryAssociationStore<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows across every parent.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, A>>> {
        self.rows.read().map_err(|_| poisoned(A::RELATION.table()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, A>>> {
        self.rows.write().map_err(|_| poisoned(A::RELATION.table()))
    }

    fn select(&self, pred: impl Fn(&A) -> bool) -> Result<Vec<A>> {
        Ok(self.read()?.values().filter(|row| pred(row)).cloned().collect())
    }
}

fn check_insert<A: Association>(rows: &HashMap<Uuid, A>, row: &A) -> Result<()> {
    if rows.contains_key(&row.id()) {
        return Err(Error::Storage(format!(
            "duplicate {} id {}",
            A::RELATION,
            row.id()
        )));
    }
    if rows
        .values()
        .any(|r| r.parent_id() == row.parent_id() && r.child_id() == row.child_id())
    {
        return Err(Error::Storage(format!(
            "{} already links {} to {}",
            A::RELATION,
            row.parent_id(),
            row.child_id()
        )));
    }
    Ok(())
}

#[async_trait]
impl<A: Association> AssociationRepository<A> for InMemoryAssociationStore<A> {
    async fn create(&self, association: A) -> Result<()> {
        let mut rows = self.write()?;
        check_insert(&rows, &association)?;
        rows.insert(association.id(), association);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.write()?.remove(&id);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<A> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(A::RELATION.table(), id))
    }

    async fn find_by_parent(&self, parent_id: Uuid) -> Result<Vec<A>> {
        self.select(|row| row.parent_id() == parent_id)
    }

    async fn find_by_child(&self, child_id: Uuid) -> Result<Vec<A>> {
        self.select(|row| row.child_id() == child_id)
    }

    async fn find_by_parent_and_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<Vec<A>> {
        self.select(|row| row.parent_id() == parent_id && row.child_id() == child_id)
    }

    /// Swap the parent's rows under one write lock; nothing is visible halfway.
    async fn replace_for_parent(&self, parent_id: Uuid, rows: Vec<A>) -> Result<ReplaceOutcome> {
        let mut table = self.write()?;

        let mut staged: HashMap<Uuid, A> = table
            .iter()
            .filter(|(_, row)| row.parent_id() != parent_id)
            .map(|(id, row)| (*id, row.clone()))
            .collect();
        let removed = table.len() - staged.len();

        let created = rows.len();
        for row in rows {
            check_insert(&staged, &row)?;
            staged.insert(row.id(), row);
        }

        *table = staged;
        trace!(relation = %A::RELATION, %parent_id, removed, created, "Replaced in memory");
        Ok(ReplaceOutcome { removed, created })
    }
}
