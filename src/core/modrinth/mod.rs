pub mod client;
pub mod model;
pub mod search;

pub use client::ModrinthClient;
pub use model::{Hashes, Project, SearchResponse, Version, VersionFile};
pub use search::{parse_slug, SearchGroups, SearchParams, PROJECT_TYPES};
