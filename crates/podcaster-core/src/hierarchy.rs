//! Self-referential category tree.
//!
//! A category points at its parent by id only. Parent ids are never checked
//! for existence, so a chain can end at a parent that was deleted. Cycles are
//! not prevented unless [`HierarchyConfig::reject_cycles`] is set; every walk
//! is bounded by a visited set and by `max_depth`.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::HierarchyConfig;
use crate::error::{Error, Result};
use crate::models::{Category, CategoryPatch, ParentUpdate};
use crate::traits::EntityRepository;
use crate::validation::Validator;

/// Parent/child management on top of a category store.
#[derive(Clone)]
pub struct CategoryHierarchy {
    categories: Arc<dyn EntityRepository<Category>>,
    config: HierarchyConfig,
    /// Held from cycle check to write when `reject_cycles` is set.
    reparent: Arc<Mutex<()>>,
}

impl CategoryHierarchy {
    pub fn new(categories: Arc<dyn EntityRepository<Category>>, config: HierarchyConfig) -> Self {
        Self {
            categories,
            config,
            reparent: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> HierarchyConfig {
        self.config
    }

    /// Store a category. A parent of `None` makes it a root.
    pub async fn create(&self, category: Category) -> Result<()> {
        let mut v = Validator::new();
        v.require_id("id", category.id);
        v.optional_id("parent_id", category.parent_id);
        v.finish()?;

        self.categories.create(category).await
    }

    /// The category with its immediate parent id.
    pub async fn find(&self, id: Uuid) -> Result<Category> {
        self.categories.find(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Category>> {
        self.categories.find_all().await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.categories.delete(id).await
    }

    /// Apply a partial update, including the parent pointer.
    pub async fn update(&self, id: Uuid, patch: CategoryPatch) -> Result<()> {
        let mut v = Validator::new();
        v.require_id("id", id);
        if let ParentUpdate::Set(parent_id) = patch.parent {
            v.require_id("parent_id", parent_id);
        }
        v.finish()?;

        // A loop can span several categories, so every checked re-parent
        // goes through one lock rather than a per-category one.
        let _guard = match patch.parent {
            ParentUpdate::Set(parent_id) if self.config.reject_cycles => {
                let guard = self.reparent.lock().await;
                self.check_acyclic(id, parent_id).await?;
                Some(guard)
            }
            _ => None,
        };

        self.categories.update(id, patch).await
    }

    /// Ancestors of `id`, nearest first.
    ///
    /// Stops at a root, at a parent that no longer exists, at a node already
    /// visited, or after `max_depth` steps. Fails with `NotFound` only when
    /// `id` itself is missing.
    pub async fn ancestors(&self, id: Uuid) -> Result<Vec<Category>> {
        let start = self.categories.find(id).await?;
        self.walk_up(start).await
    }

    /// Direct children of `id`, ordered by name.
    pub async fn children(&self, id: Uuid) -> Result<Vec<Category>> {
        let mut children: Vec<Category> = self
            .categories
            .find_all()
            .await?
            .into_iter()
            .filter(|c| c.parent_id == Some(id))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    /// Categories without a parent, ordered by name.
    pub async fn roots(&self) -> Result<Vec<Category>> {
        let mut roots: Vec<Category> = self
            .categories
            .find_all()
            .await?
            .into_iter()
            .filter(|c| c.parent_id.is_none())
            .collect();
        roots.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(roots)
    }

    async fn walk_up(&self, start: Category) -> Result<Vec<Category>> {
        let mut visited = HashSet::from([start.id]);
        let mut chain = Vec::new();
        let mut next = start.parent_id;

        while let Some(parent_id) = next {
            if chain.len() >= self.config.max_depth {
                warn!(
                    subsystem = "core",
                    component = "hierarchy",
                    category_id = %start.id,
                    max_depth = self.config.max_depth,
                    "Category chain exceeds max depth; truncating"
                );
                break;
            }
            if !visited.insert(parent_id) {
                debug!(
                    subsystem = "core",
                    component = "hierarchy",
                    category_id = %start.id,
                    %parent_id,
                    "Category cycle detected"
                );
                break;
            }
            let parent = match self.categories.find(parent_id).await {
                Ok(parent) => parent,
                Err(Error::NotFound { .. }) => {
                    debug!(
                        subsystem = "core",
                        component = "hierarchy",
                        category_id = %start.id,
                        %parent_id,
                        "Dangling category parent"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            next = parent.parent_id;
            chain.push(parent);
        }

        Ok(chain)
    }

    /// Fail if pointing `id` at `parent_id` would close a loop.
    async fn check_acyclic(&self, id: Uuid, parent_id: Uuid) -> Result<()> {
        let closes_loop = if parent_id == id {
            true
        } else {
            match self.categories.find(parent_id).await {
                Ok(parent) => self
                    .walk_up(parent)
                    .await?
                    .iter()
                    .any(|ancestor| ancestor.id == id),
                Err(Error::NotFound { .. }) => false,
                Err(e) => return Err(e),
            }
        };

        if closes_loop {
            let mut v = Validator::new();
            v.fail("parent_id", "would create a cycle");
            v.finish()?;
        }
        Ok(())
    }
}
