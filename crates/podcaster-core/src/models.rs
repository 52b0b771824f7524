//! Domain models for walls, blocks, programs and their associations.
//!
//! Relationships between records are weak references: plain identifier
//! fields that are resolved through a repository when needed, never embedded
//! child objects.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ENTITY TRAIT
// =============================================================================

/// A standalone record owned by an entity store.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Partial update applied by `EntityRepository::update`.
    type Patch: Clone + fmt::Debug + Default + Send + Sync + 'static;

    /// Entity name used in errors and logs ("wall", "block", ...).
    const NAME: &'static str;

    fn id(&self) -> Uuid;

    /// Apply every field present in `patch`, leaving the others untouched.
    fn apply(&mut self, patch: &Self::Patch);
}

fn apply_field(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// Top-level presentation container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WallPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Entity for Wall {
    type Patch = WallPatch;
    const NAME: &'static str = "wall";

    fn id(&self) -> Uuid {
        self.id
    }

    fn apply(&mut self, patch: &WallPatch) {
        apply_field(&mut self.name, &patch.name);
        apply_field(&mut self.description, &patch.description);
    }
}

/// Middle-level container; `kind` is a display tag such as "carousel".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
}

impl Entity for Block {
    type Patch = BlockPatch;
    const NAME: &'static str = "block";

    fn id(&self) -> Uuid {
        self.id
    }

    fn apply(&mut self, patch: &BlockPatch) {
        apply_field(&mut self.name, &patch.name);
        apply_field(&mut self.description, &patch.description);
        apply_field(&mut self.kind, &patch.kind);
    }
}

/// Leaf content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Entity for Program {
    type Patch = ProgramPatch;
    const NAME: &'static str = "program";

    fn id(&self) -> Uuid {
        self.id
    }

    fn apply(&mut self, patch: &ProgramPatch) {
        apply_field(&mut self.name, &patch.name);
        apply_field(&mut self.description, &patch.description);
    }
}

/// An episode of exactly one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub program_id: Uuid,
    pub position: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub program_id: Option<Uuid>,
    pub position: Option<i32>,
}

impl Entity for Episode {
    type Patch = EpisodePatch;
    const NAME: &'static str = "episode";

    fn id(&self) -> Uuid {
        self.id
    }

    fn apply(&mut self, patch: &EpisodePatch) {
        apply_field(&mut self.name, &patch.name);
        apply_field(&mut self.description, &patch.description);
        if let Some(program_id) = patch.program_id {
            self.program_id = program_id;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
    }
}

/// A playable asset attached to an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub direct_link: String,
    pub kind: String,
    pub episode_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaPatch {
    pub direct_link: Option<String>,
    pub kind: Option<String>,
    pub episode_id: Option<Uuid>,
}

impl Entity for Media {
    type Patch = MediaPatch;
    const NAME: &'static str = "media";

    fn id(&self) -> Uuid {
        self.id
    }

    fn apply(&mut self, patch: &MediaPatch) {
        apply_field(&mut self.direct_link, &patch.direct_link);
        apply_field(&mut self.kind, &patch.kind);
        if let Some(episode_id) = patch.episode_id {
            self.episode_id = episode_id;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Entity for Tag {
    type Patch = TagPatch;
    const NAME: &'static str = "tag";

    fn id(&self) -> Uuid {
        self.id
    }

    fn apply(&mut self, patch: &TagPatch) {
        apply_field(&mut self.name, &patch.name);
        apply_field(&mut self.description, &patch.description);
    }
}

/// A category; `parent_id` is a weak self-reference (None = root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

/// How an update treats the category parent pointer.
///
/// "No parent" is `Clear`, never a nil UUID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParentUpdate {
    /// Leave the current parent as is.
    #[default]
    Keep,
    /// Point at a new parent.
    Set(Uuid),
    /// Make the category a root.
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent: ParentUpdate,
}

impl Entity for Category {
    type Patch = CategoryPatch;
    const NAME: &'static str = "category";

    fn id(&self) -> Uuid {
        self.id
    }

    fn apply(&mut self, patch: &CategoryPatch) {
        apply_field(&mut self.name, &patch.name);
        apply_field(&mut self.description, &patch.description);
        match patch.parent {
            ParentUpdate::Keep => {}
            ParentUpdate::Set(parent_id) => self.parent_id = Some(parent_id),
            ParentUpdate::Clear => self.parent_id = None,
        }
    }
}

// =============================================================================
// ASSOCIATIONS
// =============================================================================

/// The four link tables between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    WallBlock,
    BlockProgram,
    ProgramTag,
    ProgramCategory,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::WallBlock,
        Relation::BlockProgram,
        Relation::ProgramTag,
        Relation::ProgramCategory,
    ];

    /// Link table name, also used as the relation's display name.
    pub fn table(&self) -> &'static str {
        match self {
            Self::WallBlock => "wall_block",
            Self::BlockProgram => "block_program",
            Self::ProgramTag => "program_tag",
            Self::ProgramCategory => "program_category",
        }
    }

    /// Column holding the owning side.
    pub fn parent_column(&self) -> &'static str {
        match self {
            Self::WallBlock => "wall_id",
            Self::BlockProgram => "block_id",
            Self::ProgramTag | Self::ProgramCategory => "program_id",
        }
    }

    /// Column holding the child side.
    pub fn child_column(&self) -> &'static str {
        match self {
            Self::WallBlock => "block_id",
            Self::BlockProgram => "program_id",
            Self::ProgramTag => "tag_id",
            Self::ProgramCategory => "category_id",
        }
    }

    pub fn parent_entity(&self) -> &'static str {
        match self {
            Self::WallBlock => Wall::NAME,
            Self::BlockProgram => Block::NAME,
            Self::ProgramTag | Self::ProgramCategory => Program::NAME,
        }
    }

    pub fn child_entity(&self) -> &'static str {
        match self {
            Self::WallBlock => Block::NAME,
            Self::BlockProgram => Program::NAME,
            Self::ProgramTag => Tag::NAME,
            Self::ProgramCategory => Category::NAME,
        }
    }

    /// Whether rows carry a display position.
    pub fn is_positioned(&self) -> bool {
        matches!(self, Self::WallBlock | Self::BlockProgram)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// One row of a link table.
pub trait Association: Clone + fmt::Debug + Send + Sync + 'static {
    const RELATION: Relation;

    /// Build a row. `position` is ignored by unpositioned relations.
    fn bind(id: Uuid, parent_id: Uuid, child_id: Uuid, position: Option<i32>) -> Self;

    fn id(&self) -> Uuid;
    fn parent_id(&self) -> Uuid;
    fn child_id(&self) -> Uuid;

    /// Display position; always `None` for unpositioned relations.
    fn position(&self) -> Option<i32>;
}

/// A block placed on a wall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallBlock {
    pub id: Uuid,
    pub wall_id: Uuid,
    pub block_id: Uuid,
    pub position: i32,
}

impl Association for WallBlock {
    const RELATION: Relation = Relation::WallBlock;

    fn bind(id: Uuid, parent_id: Uuid, child_id: Uuid, position: Option<i32>) -> Self {
        Self {
            id,
            wall_id: parent_id,
            block_id: child_id,
            position: position.unwrap_or_default(),
        }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Uuid {
        self.wall_id
    }

    fn child_id(&self) -> Uuid {
        self.block_id
    }

    fn position(&self) -> Option<i32> {
        Some(self.position)
    }
}

/// A program placed in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockProgram {
    pub id: Uuid,
    pub block_id: Uuid,
    pub program_id: Uuid,
    pub position: i32,
}

impl Association for BlockProgram {
    const RELATION: Relation = Relation::BlockProgram;

    fn bind(id: Uuid, parent_id: Uuid, child_id: Uuid, position: Option<i32>) -> Self {
        Self {
            id,
            block_id: parent_id,
            program_id: child_id,
            position: position.unwrap_or_default(),
        }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Uuid {
        self.block_id
    }

    fn child_id(&self) -> Uuid {
        self.program_id
    }

    fn position(&self) -> Option<i32> {
        Some(self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramTag {
    pub id: Uuid,
    pub program_id: Uuid,
    pub tag_id: Uuid,
}

impl Association for ProgramTag {
    const RELATION: Relation = Relation::ProgramTag;

    fn bind(id: Uuid, parent_id: Uuid, child_id: Uuid, _position: Option<i32>) -> Self {
        Self {
            id,
            program_id: parent_id,
            tag_id: child_id,
        }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Uuid {
        self.program_id
    }

    fn child_id(&self) -> Uuid {
        self.tag_id
    }

    fn position(&self) -> Option<i32> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCategory {
    pub id: Uuid,
    pub program_id: Uuid,
    pub category_id: Uuid,
}

impl Association for ProgramCategory {
    const RELATION: Relation = Relation::ProgramCategory;

    fn bind(id: Uuid, parent_id: Uuid, child_id: Uuid, _position: Option<i32>) -> Self {
        Self {
            id,
            program_id: parent_id,
            category_id: child_id,
        }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Uuid {
        self.program_id
    }

    fn child_id(&self) -> Uuid {
        self.category_id
    }

    fn position(&self) -> Option<i32> {
        None
    }
}

/// A resolved child together with its display position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Positioned<T> {
    #[serde(flatten)]
    pub item: T,
    pub position: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_leaves_absent_fields() {
        let mut wall = Wall {
            id: Uuid::new_v4(),
            name: "X".to_string(),
            description: "old".to_string(),
        };
        wall.apply(&WallPatch {
            name: None,
            description: Some("new desc".to_string()),
        });
        assert_eq!(wall.name, "X");
        assert_eq!(wall.description, "new desc");
    }

    #[test]
    fn test_category_parent_update() {
        let parent = Uuid::new_v4();
        let mut category = Category {
            id: Uuid::new_v4(),
            name: "Jazz".to_string(),
            description: "Jazz shows".to_string(),
            parent_id: None,
        };

        category.apply(&CategoryPatch {
            parent: ParentUpdate::Set(parent),
            ..Default::default()
        });
        assert_eq!(category.parent_id, Some(parent));

        category.apply(&CategoryPatch::default());
        assert_eq!(category.parent_id, Some(parent));

        category.apply(&CategoryPatch {
            parent: ParentUpdate::Clear,
            ..Default::default()
        });
        assert_eq!(category.parent_id, None);
    }

    #[test]
    fn test_relation_columns() {
        assert_eq!(Relation::WallBlock.parent_column(), "wall_id");
        assert_eq!(Relation::WallBlock.child_column(), "block_id");
        assert_eq!(Relation::ProgramCategory.child_entity(), "category");
        assert!(Relation::BlockProgram.is_positioned());
        assert!(!Relation::ProgramTag.is_positioned());
    }

    #[test]
    fn test_unpositioned_bind_drops_position() {
        let row = ProgramTag::bind(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Some(3));
        assert_eq!(row.position(), None);
    }

    #[test]
    fn test_positioned_serializes_flat() {
        let block = Block {
            id: Uuid::nil(),
            name: "Top picks".to_string(),
            description: "Editorial".to_string(),
            kind: "carousel".to_string(),
        };
        let json = serde_json::to_value(Positioned {
            item: block,
            position: 2,
        })
        .unwrap();
        assert_eq!(json["kind"], "carousel");
        assert_eq!(json["position"], 2);
    }
}
