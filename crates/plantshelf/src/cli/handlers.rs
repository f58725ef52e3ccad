//! Command handlers for the plantshelf CLI.
//!
//! Each handler resolves user-typed ids through the API, performs one
//! operation and returns the text to print. With `--json` the handler returns
//! the affected record(s) serialized instead of the rendered text.

use anyhow::Result;
use chrono::Utc;
use log::debug;
use plantshelfapp::api::PlantShelf;
use plantshelfapp::grid::PlacementChange;
use plantshelfapp::lineage::ParentChange;
use plantshelfapp::model::{NewPlant, NewShelf, PlantId, PlantUpdate, ShelfId, Visibility};
use plantshelfapp::search::SearchFilters;
use plantshelfapp::store::fs_backend::FsBackend;
use serde::Serialize;
use std::collections::HashMap;

use super::render;
use super::setup::{CellArgs, PlantCommands, ShelfCommands};

/// Everything a handler needs: the opened inventory and the output mode.
pub struct AppState {
    pub api: PlantShelf<FsBackend>,
    pub json: bool,
}

impl AppState {
    pub fn new(api: PlantShelf<FsBackend>, json: bool) -> Self {
        Self { api, json }
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<String> {
        if self.json {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(text())
        }
    }

    fn shelf_names(&self) -> HashMap<ShelfId, String> {
        self.api
            .list_shelves()
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect()
    }

    fn plant_names(&self) -> HashMap<PlantId, String> {
        self.api
            .list_plants()
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect()
    }
}

pub fn plant(state: &AppState, command: &PlantCommands) -> Result<String> {
    let api = &state.api;
    match command {
        PlantCommands::Add {
            name,
            description,
            tags,
            public,
        } => {
            let mut new = NewPlant::new(name.as_str()).with_tags(tags.iter().cloned());
            if let Some(description) = description {
                new = new.with_description(description.as_str());
            }
            if *public {
                new = new.with_visibility(Visibility::Public);
            }
            let plant = api.create_plant(new)?;
            state.emit(&plant, || {
                render::success(&format!("Added {} {}", render::short_id(&plant.id), plant.name))
            })
        }
        PlantCommands::List => {
            let plants = api.list_plants();
            state.emit(&plants, || render::plant_list(&plants, &state.shelf_names()))
        }
        PlantCommands::Show { plant } => {
            let plant = api.get_plant(api.resolve_plant(plant)?)?;
            state.emit(&plant, || {
                render::plant_detail(&plant, &state.shelf_names(), &state.plant_names())
            })
        }
        PlantCommands::Edit {
            plant,
            name,
            description,
            public,
            private,
        } => {
            let id = api.resolve_plant(plant)?;
            let mut update = PlantUpdate::new();
            if let Some(name) = name {
                update = update.name(name.as_str());
            }
            if let Some(description) = description {
                update = update.description(description.as_str());
            }
            if *public {
                update = update.visibility(Visibility::Public);
            } else if *private {
                update = update.visibility(Visibility::Private);
            }
            let plant = api.update_plant(id, update)?;
            state.emit(&plant, || render::success(&format!("Updated {}", plant.name)))
        }
        PlantCommands::Rm { plant } => {
            let plant = api.delete_plant(api.resolve_plant(plant)?)?;
            state.emit(&plant, || render::success(&format!("Deleted {}", plant.name)))
        }
        PlantCommands::Tag { plant, tags } => {
            let plant = api.add_tags(api.resolve_plant(plant)?, tags.as_slice())?;
            state.emit(&plant, || {
                render::plant_detail(&plant, &state.shelf_names(), &state.plant_names())
            })
        }
        PlantCommands::Untag { plant, tags } => {
            let plant = api.remove_tags(api.resolve_plant(plant)?, tags.as_slice())?;
            state.emit(&plant, || {
                render::plant_detail(&plant, &state.shelf_names(), &state.plant_names())
            })
        }
        PlantCommands::Water { plant } => {
            let plant = api.record_watering(api.resolve_plant(plant)?, Utc::now())?;
            state.emit(&plant, || {
                let due = plant
                    .care
                    .next_watering_due
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                render::success(&format!("Watered {}, next due {}", plant.name, due))
            })
        }
    }
}

pub fn shelf(state: &AppState, command: &ShelfCommands) -> Result<String> {
    let api = &state.api;
    match command {
        ShelfCommands::Add {
            name,
            rows,
            columns,
        } => {
            let shelf = api.create_shelf(NewShelf::new(name.as_str(), *rows, *columns))?;
            state.emit(&shelf, || {
                render::success(&format!(
                    "Added {} {} ({}x{})",
                    render::short_id(&shelf.id),
                    shelf.name,
                    shelf.rows,
                    shelf.columns
                ))
            })
        }
        ShelfCommands::List => {
            let mut listed = Vec::new();
            for shelf in api.list_shelves() {
                let occupancy = api.occupancy(shelf.id)?;
                listed.push((shelf, occupancy));
            }
            let shelves: Vec<_> = listed.iter().map(|(s, _)| s).collect();
            state.emit(&shelves, || render::shelf_list(&listed))
        }
        ShelfCommands::Show { shelf } => {
            let view = api.shelf_view(api.resolve_shelf(shelf)?)?;
            state.emit(&view, || render::shelf_grid(&view, &state.plant_names()))
        }
        ShelfCommands::Resize {
            shelf,
            rows,
            columns,
        } => {
            let shelf = api.resize_shelf(api.resolve_shelf(shelf)?, *rows, *columns)?;
            state.emit(&shelf, || {
                render::success(&format!(
                    "Resized {} to {}x{}",
                    shelf.name, shelf.rows, shelf.columns
                ))
            })
        }
        ShelfCommands::Rm { shelf } => {
            let shelf = api.delete_shelf(api.resolve_shelf(shelf)?)?;
            state.emit(&shelf, || render::success(&format!("Deleted {}", shelf.name)))
        }
    }
}

fn resolve_cell(state: &AppState, args: &CellArgs) -> Result<(PlantId, ShelfId)> {
    Ok((
        state.api.resolve_plant(&args.plant)?,
        state.api.resolve_shelf(&args.shelf)?,
    ))
}

fn placement_message(change: PlacementChange, name: &str, shelves: &HashMap<ShelfId, String>) -> String {
    let cell = |shelf: &ShelfId, row: u32, column: u32| {
        format!(
            "{} [{},{}]",
            shelves.get(shelf).map(String::as_str).unwrap_or("?"),
            row,
            column
        )
    };
    match change {
        PlacementChange::Unchanged => format!("{} stays where it is", name),
        PlacementChange::Placed(to) => {
            render::success(&format!("Placed {} at {}", name, cell(&to.shelf_id, to.row, to.column)))
        }
        PlacementChange::Moved { from, to } => render::success(&format!(
            "Moved {} from {} to {}",
            name,
            cell(&from.shelf_id, from.row, from.column),
            cell(&to.shelf_id, to.row, to.column)
        )),
        PlacementChange::Unplaced(from) => render::success(&format!(
            "Took {} off {}",
            name,
            cell(&from.shelf_id, from.row, from.column)
        )),
    }
}

pub fn place(state: &AppState, args: &CellArgs) -> Result<String> {
    let (plant, shelf) = resolve_cell(state, args)?;
    let change = state.api.assign(plant, shelf, args.row, args.column)?;
    debug!("place {}: {:?}", plant, change);
    let plant = state.api.get_plant(plant)?;
    state.emit(&plant, || placement_message(change, &plant.name, &state.shelf_names()))
}

pub fn move_plant(state: &AppState, args: &CellArgs) -> Result<String> {
    let (plant, shelf) = resolve_cell(state, args)?;
    let change = state.api.move_plant(plant, shelf, args.row, args.column)?;
    debug!("move {}: {:?}", plant, change);
    let plant = state.api.get_plant(plant)?;
    state.emit(&plant, || placement_message(change, &plant.name, &state.shelf_names()))
}

pub fn unplace(state: &AppState, plant: &str) -> Result<String> {
    let id = state.api.resolve_plant(plant)?;
    let shelves = state.shelf_names();
    let change = state.api.unassign(id)?;
    let plant = state.api.get_plant(id)?;
    state.emit(&plant, || placement_message(change, &plant.name, &shelves))
}

pub fn parent(state: &AppState, child: &str, parent: Option<&str>) -> Result<String> {
    let api = &state.api;
    let child = api.resolve_plant(child)?;
    let parent = parent.map(|p| api.resolve_plant(p)).transpose()?;
    let change = api.set_parent(child, parent)?;
    let plant = api.get_plant(child)?;
    state.emit(&plant, || match change {
        ParentChange::Unchanged => format!("{} keeps its parent", plant.name),
        ParentChange::Changed { new: Some(new), .. } => {
            let names = state.plant_names();
            render::success(&format!(
                "{} is now a child of {}",
                plant.name,
                names.get(&new).map(String::as_str).unwrap_or("?")
            ))
        }
        ParentChange::Changed { new: None, .. } => {
            render::success(&format!("{} is now a root", plant.name))
        }
    })
}

pub fn lineage(state: &AppState, plant: &str) -> Result<String> {
    let view = state.api.lineage(state.api.resolve_plant(plant)?)?;
    state.emit(&view, || render::lineage_tree(&view, &state.plant_names()))
}

pub fn search(state: &AppState, filters: &SearchFilters) -> Result<String> {
    let plants = state.api.search_plants(filters)?;
    state.emit(&plants, || render::plant_list(&plants, &state.shelf_names()))
}

pub fn tags(state: &AppState) -> Result<String> {
    let counts = state.api.tag_counts();
    state.emit(&counts, || render::tag_counts(&counts))
}

pub fn due(state: &AppState) -> Result<String> {
    let plants = state.api.watering_due(Utc::now());
    state.emit(&plants, || render::watering_due(&plants))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantshelfapp::inventory::InventorySettings;
    use tempfile::TempDir;

    fn state(dir: &TempDir, json: bool) -> AppState {
        console::set_colors_enabled(false);
        let api = PlantShelf::open(FsBackend::new(dir.path()), InventorySettings::default()).unwrap();
        AppState::new(api, json)
    }

    fn cell(plant: &PlantId, shelf: &ShelfId, row: u32, column: u32) -> CellArgs {
        CellArgs {
            plant: plant.to_string()[..8].to_string(),
            shelf: shelf.to_string()[..8].to_string(),
            row,
            column,
        }
    }

    #[test]
    fn test_place_then_move_reports_cells() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, false);
        let shelf = state.api.create_shelf(NewShelf::new("温室棚A", 2, 3)).unwrap().id;
        let plant = state.api.create_plant(NewPlant::new("白鯨")).unwrap().id;

        let out = place(&state, &cell(&plant, &shelf, 0, 0)).unwrap();
        assert_eq!(out, "Placed 白鯨 at 温室棚A [0,0]");

        let out = move_plant(&state, &cell(&plant, &shelf, 1, 2)).unwrap();
        assert_eq!(out, "Moved 白鯨 from 温室棚A [0,0] to 温室棚A [1,2]");

        let out = unplace(&state, &plant.to_string()).unwrap();
        assert_eq!(out, "Took 白鯨 off 温室棚A [1,2]");
    }

    #[test]
    fn test_json_output_is_the_record() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, true);
        let out = plant(
            &state,
            &PlantCommands::Add {
                name: "アガベ".into(),
                description: None,
                tags: vec!["Agave".into()],
                public: true,
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["name"], "アガベ");
        assert_eq!(value["visibility"], "public");
        assert_eq!(value["tags"][0], "agave");
    }

    #[test]
    fn test_parent_cycle_is_an_error() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, false);
        let a = state.api.create_plant(NewPlant::new("a")).unwrap().id.to_string();
        let b = state.api.create_plant(NewPlant::new("b")).unwrap().id.to_string();

        let out = parent(&state, &a, Some(b.as_str())).unwrap();
        assert_eq!(out, "a is now a child of b");
        assert!(parent(&state, &b, Some(a.as_str())).is_err());
        assert_eq!(parent(&state, &a, None).unwrap(), "a is now a root");
    }

    #[test]
    fn test_unknown_prefix_is_an_error() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, false);
        let err = lineage(&state, "ffffffff").unwrap_err();
        assert!(err.to_string().contains("ffffffff"));
    }
}
