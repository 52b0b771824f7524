//! # podcaster-core
//!
//! Core types, traits, and the ordered-association engine for the podcaster
//! backoffice.
//!
//! This crate provides the domain records (walls, blocks, programs and their
//! link tables), the repository ports the storage crates implement, the
//! overwrite engine that replaces a parent's associations, the category
//! hierarchy, and the aggregated request validation shared by every
//! mutation path.

pub mod config;
pub mod defaults;
pub mod error;
pub mod hierarchy;
pub mod logging;
pub mod memory;
pub mod models;
pub mod overwrite;
pub mod requests;
pub mod traits;
pub mod uuid_utils;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::{AppConfig, ConfigError, DatabaseConfig, HierarchyConfig};
pub use error::{Error, ErrorKind, OverwriteStep, Result, ResultExt};
pub use hierarchy::CategoryHierarchy;
pub use memory::{InMemoryAssociationStore, InMemoryEntityStore};
pub use models::*;
pub use overwrite::{DesiredSet, OverwriteEngine, OverwriteReport, ParentLocks, Placement, ReplaceOutcome};
pub use requests::*;
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
pub use validation::{FieldError, ValidationErrors, Validator};
