//! # Storage Layer
//!
//! Two concerns live here:
//! 1. **Entity Store** ([`entities::EntityStore`]): the in-memory canonical
//!    records, identity and monotonic timestamps.
//! 2. **Persistence collaborator** ([`backend::StorageBackend`]): loads and saves
//!    an [`InventorySnapshot`]. The core never blocks on I/O while a mutation is
//!    being validated; the API layer saves only after the mutation has been
//!    applied to a staged copy.
//!
//! ## Snapshot Format
//!
//! Only source-of-truth fields are persisted. The cell map, the children index
//! and the tag index are derived and rebuilt on load:
//!
//! ```text
//! {
//!   "version": 1,
//!   "plants": [ { "id": ..., "parent_id": ..., "position": {...}, "tags": [...] } ],
//!   "shelves": [ { "id": ..., "rows": 2, "columns": 3, "order": 0 } ]
//! }
//! ```
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: one JSON file, written atomically (tmp + rename).
//! - [`mem_backend::MemBackend`]: for tests, with write-error simulation.

use crate::model::{Plant, Shelf};
use serde::{Deserialize, Serialize};

pub mod backend;
pub mod entities;
pub mod fs_backend;
pub mod mem_backend;

pub const SNAPSHOT_VERSION: u32 = 1;

/// The persisted form of an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub version: u32,
    #[serde(default)]
    pub plants: Vec<Plant>,
    #[serde(default)]
    pub shelves: Vec<Shelf>,
}

impl Default for InventorySnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            plants: Vec::new(),
            shelves: Vec::new(),
        }
    }
}
