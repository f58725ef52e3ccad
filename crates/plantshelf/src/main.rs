//! # Plantshelf CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this
//! file only invokes `cli::run()` and handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/plantshelfapp/`: Core library, UI-agnostic inventory logic
//! - `crates/plantshelf/`: This CLI tool, depends on the library
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/plantshelf/src/cli/)                     │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Context wiring + dispatch (commands.rs)                  │
//! │  - Handlers and text rendering (handlers.rs, render.rs)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/plantshelfapp/src/api.rs)                │
//! │  - Resolves id prefixes, stages and persists mutations      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Testing Approach
//!
//! - **Library**: unit tests next to each component plus scenario tests in
//!   `crates/plantshelfapp/tests/`.
//! - **CLI**: parsing and rendering are unit tested in place; `tests/cli_e2e.rs`
//!   runs the real binary against a temporary data directory.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
