//! # Plantshelf Architecture
//!
//! Plantshelf is a **UI-agnostic plant inventory library**. It tracks plant
//! specimens, where each one sits on a set of grid shelves, which plant was
//! propagated from which, and lets callers find plants by text and tags. The
//! `plantshelf` binary is one client of it; nothing here assumes a terminal.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - RwLock sharing, stage → save → publish                   │
//! │  - Caller identity, id prefix resolution                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Inventory (inventory.rs)                                   │
//! │  - Routes each mutation through the component that owns     │
//! │    the invariant, records change events                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//!   grid.rs (cells)    lineage.rs (forest)   search/ (tags, queries)
//!          └───────────────────┼───────────────────┘
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - EntityStore: canonical records, monotonic timestamps     │
//! │  - StorageBackend: FsBackend (JSON), MemBackend (tests)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! After every operation, successful or not:
//! 1. A plant has a position iff exactly one cell references it.
//! 2. A cell holds at most one plant, and that plant exists.
//! 3. A parent pointer references an existing, different plant.
//! 4. Following parent pointers always terminates (the lineage is a forest).
//! 5. The tag index matches the live tag sets.
//!
//! [`inventory::Inventory::check_integrity`] verifies all five and is run at
//! the end of most tests.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr, never exits the
//! process, and only touches the disk through a [`store::backend::StorageBackend`].
//! Logging goes through the `log` facade; installing a logger is the client's job.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, entry point for all operations
//! - [`inventory`]: The aggregate that coordinates the components
//! - [`grid`]: Placement Grid Manager
//! - [`lineage`]: Lineage Graph
//! - [`search`]: Tag index and filter/sort queries
//! - [`store`]: Entity store and storage backends
//! - [`model`]: Core data types (`Plant`, `Shelf`, `Position`)
//! - [`tags`]: Tag normalization
//! - [`events`]: Change events for the notification layer
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod inventory;
pub mod lineage;
pub mod model;
pub mod search;
pub mod store;
pub mod tags;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
