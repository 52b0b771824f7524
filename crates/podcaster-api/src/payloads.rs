//! JSON request payloads.
//!
//! Each payload implements the matching capability traits from
//! `podcaster_core::requests`. Missing string fields deserialize as empty,
//! and identifier fields accept the empty string as "not supplied". The
//! camelCase names used by older clients are accepted as aliases.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use podcaster_core::uuid_utils::parse_optional;
use podcaster_core::{
    CreateBlockRequest, CreateCategoryRequest, CreateEpisodeRequest, CreateMediaRequest,
    CreateProgramRequest, CreateTagRequest, CreateWallRequest, OverwriteBlocksRequest,
    OverwriteProgramsRequest, UpdateBlockRequest, UpdateCategoryRequest,
    UpdateEpisodeRequest, UpdateMediaRequest, UpdateProgramRequest, UpdateTagRequest,
    UpdateWallRequest,
};

fn optional_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) => parse_optional(&value).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Name and description, shared by walls, programs and tags.
macro_rules! named_payload {
    ($(#[$meta:meta])* $payload:ident: $create:ident, $update:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
        #[serde(default)]
        pub struct $payload {
            pub name: String,
            pub description: String,
        }

        impl $create for $payload {
            fn name(&self) -> &str {
                &self.name
            }

            fn description(&self) -> &str {
                &self.description
            }
        }

        impl $update for $payload {
            fn name(&self) -> &str {
                &self.name
            }

            fn description(&self) -> &str {
                &self.description
            }
        }
    };
}

named_payload!(
    /// Wall create/update body.
    WallPayload: CreateWallRequest, UpdateWallRequest
);
named_payload!(
    /// Program create/update body.
    ProgramPayload: CreateProgramRequest, UpdateProgramRequest
);
named_payload!(
    /// Tag create/update body.
    TagPayload: CreateTagRequest, UpdateTagRequest
);

/// Block create/update body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BlockPayload {
    pub name: String,
    pub description: String,
    pub kind: String,
}

impl CreateBlockRequest for BlockPayload {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn kind(&self) -> &str {
        &self.kind
    }
}

impl UpdateBlockRequest for BlockPayload {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn kind(&self) -> &str {
        &self.kind
    }
}

/// Episode create/update body. On update, position 0 leaves it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EpisodePayload {
    pub name: String,
    pub description: String,
    #[serde(alias = "programID", deserialize_with = "optional_id")]
    pub program_id: Option<Uuid>,
    pub position: i32,
}

impl CreateEpisodeRequest for EpisodePayload {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn program_id(&self) -> Option<Uuid> {
        self.program_id
    }

    fn position(&self) -> i32 {
        self.position
    }
}

impl UpdateEpisodeRequest for EpisodePayload {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn program_id(&self) -> Option<Uuid> {
        self.program_id
    }

    fn position(&self) -> Option<i32> {
        (self.position != 0).then_some(self.position)
    }
}

/// Media create/update body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaPayload {
    #[serde(alias = "directLink")]
    pub direct_link: String,
    pub kind: String,
    #[serde(alias = "episodeID", deserialize_with = "optional_id")]
    pub episode_id: Option<Uuid>,
}

impl CreateMediaRequest for MediaPayload {
    fn direct_link(&self) -> &str {
        &self.direct_link
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn episode_id(&self) -> Option<Uuid> {
        self.episode_id
    }
}

impl UpdateMediaRequest for MediaPayload {
    fn direct_link(&self) -> &str {
        &self.direct_link
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn episode_id(&self) -> Option<Uuid> {
        self.episode_id
    }
}

/// Category create/update body.
///
/// On update, a `parent_id` moves the category and `clear_parent` makes it a
/// root; with neither the parent is left alone. Sending both is rejected by
/// the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryPayload {
    pub name: String,
    pub description: String,
    #[serde(alias = "parentID", deserialize_with = "optional_id")]
    pub parent_id: Option<Uuid>,
    #[serde(alias = "clearParent")]
    pub clear_parent: bool,
}

impl CreateCategoryRequest for CategoryPayload {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }
}

impl UpdateCategoryRequest for CategoryPayload {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    fn clear_parent(&self) -> bool {
        self.clear_parent
    }
}

/// Desired blocks of a wall: block id to position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OverwriteBlocksPayload {
    #[serde(alias = "orderedBlocks")]
    pub ordered_blocks: HashMap<Uuid, i32>,
}

impl OverwriteBlocksRequest for OverwriteBlocksPayload {
    fn ordered_blocks(&self) -> HashMap<Uuid, i32> {
        self.ordered_blocks.clone()
    }
}

/// Desired programs of a block: program id to position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OverwriteProgramsPayload {
    #[serde(alias = "orderedPrograms")]
    pub ordered_programs: HashMap<Uuid, i32>,
}

impl OverwriteProgramsRequest for OverwriteProgramsPayload {
    fn ordered_programs(&self) -> HashMap<Uuid, i32> {
        self.ordered_programs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_strings_default_to_empty() {
        let payload: WallPayload = serde_json::from_value(json!({ "name": "Home" })).unwrap();
        assert_eq!(CreateWallRequest::name(&payload), "Home");
        assert_eq!(CreateWallRequest::description(&payload), "");
    }

    #[test]
    fn test_media_accepts_camel_case_aliases() {
        let episode = Uuid::now_v7();
        let payload: MediaPayload = serde_json::from_value(json!({
            "directLink": "https://cdn.example.com/ep1.mp3",
            "kind": "audio",
            "episodeID": episode.to_string(),
        }))
        .unwrap();
        assert_eq!(payload.direct_link, "https://cdn.example.com/ep1.mp3");
        assert_eq!(CreateMediaRequest::episode_id(&payload), Some(episode));
    }

    #[test]
    fn test_empty_id_is_not_supplied() {
        let payload: EpisodePayload =
            serde_json::from_value(json!({ "name": "Pilot", "program_id": "" })).unwrap();
        assert_eq!(payload.program_id, None);

        let err = serde_json::from_value::<EpisodePayload>(json!({ "program_id": "nope" }));
        assert!(err.is_err());
    }

    #[test]
    fn test_episode_update_position_zero_is_unchanged() {
        let payload = EpisodePayload {
            position: 0,
            ..Default::default()
        };
        assert_eq!(UpdateEpisodeRequest::position(&payload), None);

        let payload = EpisodePayload {
            position: 4,
            ..Default::default()
        };
        assert_eq!(UpdateEpisodeRequest::position(&payload), Some(4));
    }

    #[test]
    fn test_category_parent_fields() {
        let parent = Uuid::now_v7();
        let keep = CategoryPayload::default();
        assert_eq!(UpdateCategoryRequest::parent_id(&keep), None);
        assert!(!keep.clear_parent());

        let set: CategoryPayload =
            serde_json::from_value(json!({ "parentID": parent.to_string() })).unwrap();
        assert_eq!(UpdateCategoryRequest::parent_id(&set), Some(parent));

        let clear: CategoryPayload =
            serde_json::from_value(json!({ "clearParent": true })).unwrap();
        assert!(clear.clear_parent());
        assert_eq!(UpdateCategoryRequest::parent_id(&clear), None);
    }

    #[test]
    fn test_ordered_blocks_from_object() {
        let (b1, b2) = (Uuid::now_v7(), Uuid::now_v7());
        let payload: OverwriteBlocksPayload = serde_json::from_value(json!({
            "orderedBlocks": { b1.to_string(): 0, b2.to_string(): 1 },
        }))
        .unwrap();
        let blocks = payload.ordered_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[&b2], 1);
    }
}
