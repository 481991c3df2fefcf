pub mod client;
pub mod source;

pub use client::{backup_if_exists, ArtifactFetcher, TempArtifact, PART_PREFIX};
pub use source::{ArtifactSource, ByteStream, HttpSource};
