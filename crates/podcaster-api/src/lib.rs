//! # podcaster-api
//!
//! Application services for the podcaster backoffice.
//!
//! Services validate requests, call the entity and association stores, and
//! resolve association rows into the records they point at. Requests are
//! anything implementing the capability traits in
//! `podcaster_core::requests`; [`payloads`] holds the JSON bodies.
//!
//! ```rust,ignore
//! use podcaster_api::{payloads::WallPayload, AppServices};
//!
//! let services = AppServices::in_memory();
//! let wall = services
//!     .walls
//!     .create(&WallPayload {
//!         name: "Home".to_string(),
//!         description: "Landing page".to_string(),
//!     })
//!     .await?;
//! ```

pub mod payloads;
pub mod services;
pub mod stores;

pub use services::{
    AppServices, BlockService, CategoryService, EpisodeService, MediaService, ProgramService,
    TagService, WallService,
};
pub use stores::Stores;
