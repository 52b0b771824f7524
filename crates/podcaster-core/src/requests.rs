//! Capability traits for service requests.
//!
//! The service layer only sees these getters, so any wire format (JSON body,
//! form, gRPC message) can back a request by implementing the trait.
//! Update requests use an empty string (or `None`) for "do not change".

use std::collections::HashMap;

use uuid::Uuid;

pub trait CreateWallRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
}

pub trait UpdateWallRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
}

pub trait CreateBlockRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn kind(&self) -> &str;
}

pub trait UpdateBlockRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn kind(&self) -> &str;
}

pub trait CreateProgramRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
}

pub trait UpdateProgramRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
}

pub trait CreateEpisodeRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn program_id(&self) -> Option<Uuid>;
    fn position(&self) -> i32;
}

pub trait UpdateEpisodeRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn program_id(&self) -> Option<Uuid>;
    fn position(&self) -> Option<i32>;
}

pub trait CreateMediaRequest {
    fn direct_link(&self) -> &str;
    fn kind(&self) -> &str;
    fn episode_id(&self) -> Option<Uuid>;
}

pub trait UpdateMediaRequest {
    fn direct_link(&self) -> &str;
    fn kind(&self) -> &str;
    fn episode_id(&self) -> Option<Uuid>;
}

pub trait CreateTagRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
}

pub trait UpdateTagRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
}

pub trait CreateCategoryRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// `None` creates a root category.
    fn parent_id(&self) -> Option<Uuid>;
}

/// The parent is moved when `parent_id` is given and cleared when
/// `clear_parent` holds; with neither it is kept. Both at once is rejected.
pub trait UpdateCategoryRequest {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parent_id(&self) -> Option<Uuid> {
        None
    }
    fn clear_parent(&self) -> bool {
        false
    }
}

/// Desired blocks of a wall, keyed by block id.
pub trait OverwriteBlocksRequest {
    fn ordered_blocks(&self) -> HashMap<Uuid, i32>;
}

/// Desired programs of a block, keyed by program id.
pub trait OverwriteProgramsRequest {
    fn ordered_programs(&self) -> HashMap<Uuid, i32>;
}
