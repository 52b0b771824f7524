//! Backend wiring for the services.

use std::sync::Arc;

use podcaster_core::{
    AssociationRepository, Block, BlockProgram, Category, EntityRepository, Episode,
    EpisodeRepository, InMemoryAssociationStore, InMemoryEntityStore, Media, Program,
    ProgramCategory, ProgramTag, Tag, Wall, WallBlock,
};
use podcaster_db::Database;

/// Every store the services read from and write to.
#[derive(Clone)]
pub struct Stores {
    pub walls: Arc<dyn EntityRepository<Wall>>,
    pub blocks: Arc<dyn EntityRepository<Block>>,
    pub programs: Arc<dyn EntityRepository<Program>>,
    pub episodes: Arc<dyn EpisodeRepository>,
    pub media: Arc<dyn EntityRepository<Media>>,
    pub tags: Arc<dyn EntityRepository<Tag>>,
    pub categories: Arc<dyn EntityRepository<Category>>,
    pub wall_blocks: Arc<dyn AssociationRepository<WallBlock>>,
    pub block_programs: Arc<dyn AssociationRepository<BlockProgram>>,
    pub program_tags: Arc<dyn AssociationRepository<ProgramTag>>,
    pub program_categories: Arc<dyn AssociationRepository<ProgramCategory>>,
}

impl Stores {
    /// Fresh, empty in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            walls: Arc::new(InMemoryEntityStore::<Wall>::new()),
            blocks: Arc::new(InMemoryEntityStore::<Block>::new()),
            programs: Arc::new(InMemoryEntityStore::<Program>::new()),
            episodes: Arc::new(InMemoryEntityStore::<Episode>::new()),
            media: Arc::new(InMemoryEntityStore::<Media>::new()),
            tags: Arc::new(InMemoryEntityStore::<Tag>::new()),
            categories: Arc::new(InMemoryEntityStore::<Category>::new()),
            wall_blocks: Arc::new(InMemoryAssociationStore::<WallBlock>::new()),
            block_programs: Arc::new(InMemoryAssociationStore::<BlockProgram>::new()),
            program_tags: Arc::new(InMemoryAssociationStore::<ProgramTag>::new()),
            program_categories: Arc::new(InMemoryAssociationStore::<ProgramCategory>::new()),
        }
    }

    /// Postgres-backed stores sharing the database pool.
    pub fn from_database(db: &Database) -> Self {
        Self {
            walls: Arc::new(db.walls.clone()),
            blocks: Arc::new(db.blocks.clone()),
            programs: Arc::new(db.programs.clone()),
            episodes: Arc::new(db.episodes.clone()),
            media: Arc::new(db.media.clone()),
            tags: Arc::new(db.tags.clone()),
            categories: Arc::new(db.categories.clone()),
            wall_blocks: Arc::new(db.wall_blocks.clone()),
            block_programs: Arc::new(db.block_programs.clone()),
            program_tags: Arc::new(db.program_tags.clone()),
            program_categories: Arc::new(db.program_categories.clone()),
        }
    }
}
