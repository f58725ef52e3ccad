//! # CLI Behavior
//!
//! This is **one possible UI client** for the plantshelf library, not the
//! application itself. It is the only place that knows about terminal I/O,
//! exit codes and output formatting.
//!
//! ## Ids
//!
//! Every command that takes a plant or shelf accepts either the full UUID or
//! a unique prefix of at least four characters, the same as shown in listings.
//!
//! ## Output
//!
//! Text by default. `--json` prints the affected record(s) as pretty JSON,
//! which is what the end-to-end tests read.
//!
//! ## Module Structure
//!
//! - `commands`: `run`, logging, data directory and dispatch
//! - `handlers`: One function per command, calling the API
//! - `render`: Text formatting (lists, grids, lineage trees)
//! - `setup`: Argument parsing via clap

mod commands;
mod handlers;
mod render;
pub mod setup;

pub use commands::run;
