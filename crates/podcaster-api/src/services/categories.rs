use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use podcaster_core::validation::non_empty;
use podcaster_core::{
    new_v7, AssociationRepository, Category, CategoryHierarchy, CategoryPatch,
    CreateCategoryRequest, EntityRepository, Error, FieldError, ParentUpdate, Program,
    ProgramCategory, Result, ResultExt, UpdateCategoryRequest, ValidationErrors, Validator,
};

use super::{find_parents, require_id};
use crate::stores::Stores;

/// Category CRUD through the hierarchy, plus tree navigation.
#[derive(Clone)]
pub struct CategoryService {
    hierarchy: CategoryHierarchy,
    programs: Arc<dyn EntityRepository<Program>>,
    program_categories: Arc<dyn AssociationRepository<ProgramCategory>>,
}

/// Read the parent change out of an update request.
pub(crate) fn parent_update<R: UpdateCategoryRequest + ?Sized>(
    req: &R,
) -> std::result::Result<ParentUpdate, ValidationErrors> {
    match (req.parent_id(), req.clear_parent()) {
        (Some(_), true) => Err(ValidationErrors::from(vec![
            FieldError::new("parent_id", "cannot be combined with clear_parent"),
            FieldError::new("clear_parent", "cannot be combined with parent_id"),
        ])),
        (Some(parent_id), false) => Ok(ParentUpdate::Set(parent_id)),
        (None, true) => Ok(ParentUpdate::Clear),
        (None, false) => Ok(ParentUpdate::Keep),
    }
}

impl CategoryService {
    pub fn new(stores: &Stores, hierarchy: CategoryHierarchy) -> Self {
        Self {
            hierarchy,
            programs: stores.programs.clone(),
            program_categories: stores.program_categories.clone(),
        }
    }

    pub fn hierarchy(&self) -> &CategoryHierarchy {
        &self.hierarchy
    }

    /// Create a category. Without a parent id it becomes a root.
    pub async fn create<R: CreateCategoryRequest + ?Sized>(&self, req: &R) -> Result<Category> {
        let mut v = Validator::new();
        v.require("name", req.name())
            .require("description", req.description())
            .optional_id("parent_id", req.parent_id());
        v.finish().map_err(Error::from).context("creating category")?;

        let category = Category {
            id: new_v7(),
            name: req.name().to_string(),
            description: req.description().to_string(),
            parent_id: req.parent_id(),
        };
        self.hierarchy
            .create(category.clone())
            .await
            .context("creating category")?;

        info!(
            subsystem = "api",
            component = "category_service",
            op = "create",
            entity_id = %category.id,
            parent_id = ?category.parent_id,
            "Category created"
        );
        Ok(category)
    }

    pub async fn update<R: UpdateCategoryRequest + ?Sized>(
        &self,
        id: Uuid,
        req: &R,
    ) -> Result<()> {
        let parent = parent_update(req)
            .map_err(Error::from)
            .with_context(|| format!("updating category {}", id))?;
        let patch = CategoryPatch {
            name: non_empty(req.name()),
            description: non_empty(req.description()),
            parent,
        };
        self.hierarchy
            .update(id, patch)
            .await
            .with_context(|| format!("updating category {}", id))?;

        info!(
            subsystem = "api",
            component = "category_service",
            op = "update",
            entity_id = %id,
            "Category updated"
        );
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Category> {
        require_id("id", id).with_context(|| format!("finding category {}", id))?;
        self.hierarchy
            .find(id)
            .await
            .with_context(|| format!("finding category {}", id))
    }

    pub async fn find_all(&self) -> Result<Vec<Category>> {
        self.hierarchy.find_all().await.context("listing categories")
    }

    /// Delete one category. Children keep pointing at it.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        require_id("id", id).with_context(|| format!("deleting category {}", id))?;
        self.hierarchy
            .delete(id)
            .await
            .with_context(|| format!("deleting category {}", id))?;

        info!(
            subsystem = "api",
            component = "category_service",
            op = "delete",
            entity_id = %id,
            "Category deleted"
        );
        Ok(())
    }

    /// Programs filed under the category, ordered by program id.
    pub async fn find_programs(&self, category_id: Uuid) -> Result<Vec<Program>> {
        find_parents(
            self.program_categories.as_ref(),
            self.programs.as_ref(),
            category_id,
        )
        .await
        .with_context(|| format!("finding programs of category {}", category_id))
    }

    /// Parent chain of the category, nearest first.
    pub async fn ancestors(&self, id: Uuid) -> Result<Vec<Category>> {
        require_id("id", id).with_context(|| format!("finding ancestors of category {}", id))?;
        self.hierarchy
            .ancestors(id)
            .await
            .with_context(|| format!("finding ancestors of category {}", id))
    }

    pub async fn children(&self, id: Uuid) -> Result<Vec<Category>> {
        require_id("id", id).with_context(|| format!("finding children of category {}", id))?;
        self.hierarchy
            .children(id)
            .await
            .with_context(|| format!("finding children of category {}", id))
    }

    pub async fn roots(&self) -> Result<Vec<Category>> {
        self.hierarchy.roots().await.context("listing root categories")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::CategoryPayload;

    #[test]
    fn test_parent_update_modes() {
        let parent = new_v7();
        let set = CategoryPayload {
            parent_id: Some(parent),
            ..Default::default()
        };
        assert_eq!(parent_update(&set).unwrap(), ParentUpdate::Set(parent));

        let clear = CategoryPayload {
            clear_parent: true,
            ..Default::default()
        };
        assert_eq!(parent_update(&clear).unwrap(), ParentUpdate::Clear);
        assert_eq!(
            parent_update(&CategoryPayload::default()).unwrap(),
            ParentUpdate::Keep
        );
    }

    #[test]
    fn test_set_and_clear_together_is_rejected() {
        let both = CategoryPayload {
            parent_id: Some(new_v7()),
            clear_parent: true,
            ..Default::default()
        };
        let errors = parent_update(&both).unwrap_err();
        assert!(errors.contains_field("parent_id"));
        assert!(errors.contains_field("clear_parent"));
    }
}
