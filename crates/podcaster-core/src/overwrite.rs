//! Overwrite engine: replace every association of a parent with a desired set.
//!
//! After a successful overwrite, `find_by_parent(parent)` returns exactly the
//! desired children with the requested positions. Rows present both before
//! and after are still deleted and recreated under new association ids.
//!
//! ## Failure and concurrency
//!
//! Overwrites of the same (relation, parent) pair are serialized in-process
//! through [`ParentLocks`]. Atomicity is the store's business: the default
//! [`replace_stepwise`] runs fetch, delete and create as separate calls and
//! reports which step failed and whether the persisted set is now partial,
//! while the in-memory and Postgres stores replace the set in one step.
//! Retrying a failed overwrite is safe only after inspecting `partial`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Instant;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::error::{Error, OverwriteStep, Result};
use crate::models::{Association, Relation};
use crate::traits::AssociationRepository;
use crate::uuid_utils::new_v7;
use crate::validation::{ValidationErrors, Validator};

// =============================================================================
// DESIRED SET
// =============================================================================

/// One desired child of a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub child_id: Uuid,
    /// Required for positioned relations, absent otherwise.
    pub position: Option<i32>,
}

/// The complete set of children a parent should end up with.
///
/// Each child id appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredSet {
    entries: Vec<Placement>,
}

impl DesiredSet {
    /// The empty set; overwriting with it clears the parent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Children with positions. A repeated child keeps its last position.
    ///
    /// Entries are kept sorted by position, then child id.
    pub fn ordered<I>(children: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, i32)>,
    {
        let mut by_child: HashMap<Uuid, i32> = HashMap::new();
        for (child_id, position) in children {
            by_child.insert(child_id, position);
        }
        let mut entries: Vec<Placement> = by_child
            .into_iter()
            .map(|(child_id, position)| Placement {
                child_id,
                position: Some(position),
            })
            .collect();
        entries.sort_by_key(|p| (p.position, p.child_id));
        Self { entries }
    }

    /// Children without positions. Duplicates collapse to the first occurrence.
    pub fn unordered<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Uuid>,
    {
        let mut entries: Vec<Placement> = Vec::new();
        for child_id in children {
            if !entries.iter().any(|p| p.child_id == child_id) {
                entries.push(Placement {
                    child_id,
                    position: None,
                });
            }
        }
        Self { entries }
    }

    /// Build directly from placements. A repeated child keeps its last entry.
    pub fn from_placements<I>(placements: I) -> Self
    where
        I: IntoIterator<Item = Placement>,
    {
        let mut entries: Vec<Placement> = Vec::new();
        for placement in placements {
            match entries.iter_mut().find(|p| p.child_id == placement.child_id) {
                Some(existing) => *existing = placement,
                None => entries.push(placement),
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[Placement] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the set against the relation's shape.
    pub fn validate(&self, relation: Relation) -> std::result::Result<(), ValidationErrors> {
        let mut v = Validator::new();
        self.check_into(relation, &mut v);
        v.finish()
    }

    fn check_into(&self, relation: Relation, v: &mut Validator) {
        for placement in &self.entries {
            let field = format!("{}[{}]", relation.child_column(), placement.child_id);
            v.check(!placement.child_id.is_nil(), field.clone(), "cannot be empty");
            if relation.is_positioned() {
                v.check(placement.position.is_some(), field, "position is required");
            } else {
                v.check(
                    placement.position.is_none(),
                    field,
                    "position is not supported",
                );
            }
        }
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Row counts reported by a store after replacing a parent's associations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub removed: usize,
    pub created: usize,
}

/// Result of a successful overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverwriteReport {
    pub relation: Relation,
    pub parent_id: Uuid,
    pub removed: usize,
    pub created: usize,
}

fn overwrite_error(
    relation: Relation,
    parent_id: Uuid,
    step: OverwriteStep,
    partial: bool,
    source: Error,
) -> Error {
    Error::Overwrite {
        relation,
        parent_id,
        step,
        partial,
        source: Box::new(source),
    }
}

/// Replace a parent's associations with three independent kinds of calls:
/// fetch the current rows, delete each one, create each new one.
///
/// Nothing is rolled back on failure. The error names the failing step and
/// sets `partial` once any delete or create has gone through.
pub async fn replace_stepwise<A, R>(
    repo: &R,
    parent_id: Uuid,
    rows: Vec<A>,
) -> Result<ReplaceOutcome>
where
    A: Association,
    R: AssociationRepository<A> + ?Sized,
{
    let relation = A::RELATION;

    let current = repo
        .find_by_parent(parent_id)
        .await
        .map_err(|e| overwrite_error(relation, parent_id, OverwriteStep::Fetch, false, e))?;

    let mut outcome = ReplaceOutcome::default();

    for row in &current {
        let association_id = row.id();
        repo.delete(association_id).await.map_err(|e| {
            overwrite_error(
                relation,
                parent_id,
                OverwriteStep::Delete(association_id),
                outcome.removed > 0,
                e,
            )
        })?;
        outcome.removed += 1;
        trace!(relation = %relation, %parent_id, %association_id, "Association deleted");
    }

    for row in rows {
        let child_id = row.child_id();
        repo.create(row).await.map_err(|e| {
            overwrite_error(
                relation,
                parent_id,
                OverwriteStep::Create(child_id),
                outcome.removed > 0 || outcome.created > 0,
                e,
            )
        })?;
        outcome.created += 1;
        trace!(relation = %relation, %parent_id, %child_id, "Association created");
    }

    Ok(outcome)
}

// =============================================================================
// PER-PARENT LOCKS
// =============================================================================

type LockKey = (Relation, Uuid);

/// In-process mutual exclusion for overwrites of one (relation, parent).
///
/// Entries are held weakly and pruned once no overwrite holds them.
#[derive(Clone, Default)]
pub struct ParentLocks {
    inner: Arc<Mutex<HashMap<LockKey, Weak<AsyncMutex<()>>>>>,
}

impl ParentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other overwrite of this parent is running.
    pub async fn acquire(&self, relation: Relation, parent_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, weak| weak.strong_count() > 0);
            let key = (relation, parent_id);
            match map.get(&key).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    map.insert(key, Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }

    /// Number of parents currently tracked.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.values().filter(|weak| weak.strong_count() > 0).count()
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Orchestrates "replace all associations for a parent".
#[derive(Clone, Default)]
pub struct OverwriteEngine {
    locks: ParentLocks,
}

impl OverwriteEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the associations of `parent_id` exactly `desired`.
    ///
    /// Child ids are not checked for existence; a dangling child surfaces
    /// later as `Error::Inconsistent` when the association is resolved.
    pub async fn overwrite<A, R>(
        &self,
        repo: &R,
        parent_id: Uuid,
        desired: DesiredSet,
    ) -> Result<OverwriteReport>
    where
        A: Association,
        R: AssociationRepository<A> + ?Sized,
    {
        let relation = A::RELATION;

        let mut v = Validator::new();
        v.require_id(relation.parent_column(), parent_id);
        desired.check_into(relation, &mut v);
        v.finish()?;

        let _guard = self.locks.acquire(relation, parent_id).await;
        let start = Instant::now();

        let rows: Vec<A> = desired
            .entries()
            .iter()
            .map(|p| A::bind(new_v7(), parent_id, p.child_id, p.position))
            .collect();

        debug!(
            subsystem = "core",
            component = "overwrite",
            op = "replace",
            relation = %relation,
            %parent_id,
            desired_count = rows.len(),
            "Replacing associations"
        );

        match repo.replace_for_parent(parent_id, rows).await {
            Ok(outcome) => {
                info!(
                    subsystem = "core",
                    component = "overwrite",
                    op = "replace",
                    relation = %relation,
                    %parent_id,
                    removed = outcome.removed,
                    created = outcome.created,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Associations overwritten"
                );
                Ok(OverwriteReport {
                    relation,
                    parent_id,
                    removed: outcome.removed,
                    created: outcome.created,
                })
            }
            Err(e) => {
                let partial = matches!(e, Error::Overwrite { partial: true, .. });
                if partial {
                    error!(
                        subsystem = "core",
                        component = "overwrite",
                        relation = %relation,
                        %parent_id,
                        error = %e,
                        "Overwrite failed with a partial association set"
                    );
                } else {
                    warn!(
                        subsystem = "core",
                        component = "overwrite",
                        relation = %relation,
                        %parent_id,
                        error = %e,
                        "Overwrite failed; associations unchanged"
                    );
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::InMemoryAssociationStore;
    use crate::models::{ProgramTag, WallBlock};
    use std::collections::BTreeSet;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    async fn pairs(store: &InMemoryAssociationStore<WallBlock>, wall: Uuid) -> BTreeSet<(Uuid, i32)> {
        store
            .find_by_parent(wall)
            .await
            .unwrap()
            .into_iter()
            .map(|wb| (wb.block_id, wb.position))
            .collect()
    }

    #[test]
    fn test_ordered_keeps_last_position_for_repeated_child() {
        let child = Uuid::new_v4();
        let set = DesiredSet::ordered(vec![(child, 0), (child, 5)]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.entries()[0].position, Some(5));
    }

    #[test]
    fn test_unordered_collapses_duplicates() {
        let child = Uuid::new_v4();
        let set = DesiredSet::unordered(vec![child, child]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_validate_shape() {
        let positioned = DesiredSet::unordered(ids(2));
        let errors = positioned.validate(Relation::WallBlock).unwrap_err();
        assert_eq!(errors.len(), 2);

        let unpositioned = DesiredSet::ordered(vec![(Uuid::new_v4(), 1)]);
        assert!(unpositioned.validate(Relation::ProgramTag).is_err());

        let nil_child = DesiredSet::unordered(vec![Uuid::nil()]);
        assert!(nil_child.validate(Relation::ProgramTag).is_err());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_previous_set() {
        let store = InMemoryAssociationStore::<WallBlock>::new();
        let engine = OverwriteEngine::new();
        let wall = Uuid::new_v4();
        let b = ids(3);

        engine
            .overwrite(&store, wall, DesiredSet::ordered(vec![(b[0], 0), (b[1], 1)]))
            .await
            .unwrap();
        let report = engine
            .overwrite(&store, wall, DesiredSet::ordered(vec![(b[1], 0), (b[2], 1)]))
            .await
            .unwrap();

        assert_eq!(report.removed, 2);
        assert_eq!(report.created, 2);
        let expected: BTreeSet<_> = [(b[1], 0), (b[2], 1)].into_iter().collect();
        assert_eq!(pairs(&store, wall).await, expected);
    }

    #[tokio::test]
    async fn test_overwrite_is_idempotent_with_fresh_ids() {
        let store = InMemoryAssociationStore::<WallBlock>::new();
        let engine = OverwriteEngine::new();
        let wall = Uuid::new_v4();
        let b = ids(2);
        let desired = DesiredSet::ordered(vec![(b[0], 0), (b[1], 1)]);

        engine.overwrite(&store, wall, desired.clone()).await.unwrap();
        let first_ids: BTreeSet<Uuid> = store
            .find_by_parent(wall)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        let first = pairs(&store, wall).await;

        engine.overwrite(&store, wall, desired).await.unwrap();
        let second_ids: BTreeSet<Uuid> = store
            .find_by_parent(wall)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(first, pairs(&store, wall).await);
        assert!(first_ids.is_disjoint(&second_ids));
    }

    #[tokio::test]
    async fn test_empty_set_clears() {
        let store = InMemoryAssociationStore::<ProgramTag>::new();
        let engine = OverwriteEngine::new();
        let program = Uuid::new_v4();

        engine
            .overwrite(&store, program, DesiredSet::unordered(ids(3)))
            .await
            .unwrap();
        engine
            .overwrite(&store, program, DesiredSet::empty())
            .await
            .unwrap();

        assert!(store.find_by_parent(program).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_leaves_other_parents_alone() {
        let store = InMemoryAssociationStore::<ProgramTag>::new();
        let engine = OverwriteEngine::new();
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let tag = Uuid::new_v4();

        engine
            .overwrite(&store, p1, DesiredSet::unordered(vec![tag]))
            .await
            .unwrap();
        engine
            .overwrite(&store, p2, DesiredSet::unordered(vec![tag]))
            .await
            .unwrap();
        engine
            .overwrite(&store, p1, DesiredSet::empty())
            .await
            .unwrap();

        assert_eq!(store.find_by_parent(p2).await.unwrap().len(), 1);
        assert_eq!(store.find_by_child(tag).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_nil_parent_is_rejected() {
        let store = InMemoryAssociationStore::<WallBlock>::new();
        let engine = OverwriteEngine::new();

        let err = engine
            .overwrite(&store, Uuid::nil(), DesiredSet::empty())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.validation_errors().unwrap().contains_field("wall_id"));
    }

    #[tokio::test]
    async fn test_parent_locks_are_pruned() {
        let locks = ParentLocks::new();
        let parent = Uuid::new_v4();
        {
            let _guard = locks.acquire(Relation::WallBlock, parent).await;
            assert_eq!(locks.tracked(), 1);
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overwrites_end_in_one_desired_set() {
        let store = Arc::new(InMemoryAssociationStore::<WallBlock>::new());
        let engine = OverwriteEngine::new();
        let wall = Uuid::new_v4();

        let sets: Vec<Vec<(Uuid, i32)>> = (0..8)
            .map(|_| ids(4).into_iter().zip(0..).collect())
            .collect();

        let tasks = sets.iter().cloned().map(|set| {
            let store = store.clone();
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .overwrite(store.as_ref(), wall, DesiredSet::ordered(set))
                    .await
            })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let final_state = pairs(&store, wall).await;
        assert_eq!(final_state.len(), 4);
        assert!(sets
            .iter()
            .any(|set| set.iter().copied().collect::<BTreeSet<_>>() == final_state));
    }
}
