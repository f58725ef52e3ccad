//! # CLI Layer
//!
//! The CLI is the only place that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs a logger
//! - Decides where the data directory lives
//!
//! `run` parses arguments, opens the inventory and hands the command to a
//! handler in [`super::handlers`]. Errors bubble up to `main`, which prints
//! them and exits non-zero.

use super::handlers::{self, AppState};
use super::setup::{Cli, Commands};
use anyhow::{anyhow, Result};
use clap::Parser;
use directories::ProjectDirs;
use log::{debug, LevelFilter};
use plantshelfapp::api::PlantShelf;
use plantshelfapp::config::PlantShelfConfig;
use plantshelfapp::search::SearchFilters;
use plantshelfapp::store::fs_backend::FsBackend;
use std::path::PathBuf;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let state = create_app_state(&cli)?;
    let output = dispatch(&state, &cli.command)?;
    if !output.is_empty() {
        println!("{}", output);
    }

    let events = state.api.drain_events();
    debug!("{} change event(s) emitted", events.len());
    Ok(())
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.format_timestamp(None).try_init();
}

fn data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    ProjectDirs::from("com", "plantshelf", "plantshelf")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory; pass --data-dir"))
}

fn create_app_state(cli: &Cli) -> Result<AppState> {
    let dir = data_dir(cli)?;
    let config = PlantShelfConfig::load(&dir)?;
    debug!("data directory {}, config {:?}", dir.display(), config);

    let backend = FsBackend::new(&dir).with_file_name(config.data_file.as_str());
    let mut api = PlantShelf::open(backend, (&config).into())?;
    if let Some(user) = &cli.user {
        api = api.with_caller(user.as_str());
    }
    Ok(AppState::new(api, cli.json))
}

fn dispatch(state: &AppState, command: &Commands) -> Result<String> {
    match command {
        Commands::Plant(cmd) => handlers::plant(state, cmd),
        Commands::Shelf(cmd) => handlers::shelf(state, cmd),
        Commands::Place(args) => handlers::place(state, args),
        Commands::Move(args) => handlers::move_plant(state, args),
        Commands::Unplace { plant } => handlers::unplace(state, plant),
        Commands::Parent { child, parent } => handlers::parent(state, child, parent.as_deref()),
        Commands::Lineage { plant } => handlers::lineage(state, plant),
        Commands::Search {
            query,
            tags,
            visibility,
            sort,
            order,
        } => {
            let mut filters = SearchFilters::new()
                .tags(tags.iter().cloned())
                .visibility((*visibility).into())
                .sort((*sort).into(), (*order).into());
            if let Some(query) = query {
                filters = filters.query(query.as_str());
            }
            handlers::search(state, &filters)
        }
        Commands::Tags => handlers::tags(state),
        Commands::Due => handlers::due(state),
    }
}
