// ─── modsync Core ───
// Reconciles a declarative manifest of Modrinth projects with the files in a
// Minecraft game directory.
//
// Architecture:
//   core/
//     manifest/   — Manifest model + JSON store
//     modrinth/   — Modrinth v2 client, payloads, search
//     registry    — Registry trait the engine depends on
//     resolver    — Newest compatible version selection
//     downloader/ — Streaming SHA-1 validated downloads + backups
//     checksum    — Hashing + content-addressed lookup
//     toggle      — Enable / disable by renaming
//     reconcile/  — Install pool, update planner, consistency checker
//     config      — Per-invocation settings

pub mod checksum;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod manifest;
pub mod modrinth;
pub mod reconcile;
pub mod registry;
pub mod resolver;
pub mod toggle;

#[cfg(test)]
pub mod testing;
