//! # API Facade
//!
//! [`PlantShelf`] is the single entry point for every inventory operation,
//! regardless of the UI being used. It adds three things on top of
//! [`Inventory`]:
//!
//! - **Sharing**: the inventory sits behind a `parking_lot::RwLock`. Reads share
//!   the lock; writers are serialized.
//! - **Persistence**: every mutation is applied to a staged copy, saved through
//!   the [`StorageBackend`], and only then published. If validation or the save
//!   fails, readers keep seeing the previous state.
//! - **Input normalization**: short id prefixes typed by a user are resolved to
//!   full ids (see [`PlantShelf::resolve_plant`]).
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: that belongs in `inventory.rs` and the components.
//! - **Presentation**: returns records and views, never strings for a terminal.
//!
//! ## Caller Identity
//!
//! The identity supplied by the auth collaborator is an opaque string set with
//! [`PlantShelf::with_caller`]. It becomes `owner_id` on created records and
//! backs the `my` visibility filter.
//!
//! ## Generic Over StorageBackend
//!
//! - Production: `PlantShelf<FsBackend>`
//! - Testing: `PlantShelf<MemBackend>`

use crate::error::{InventoryError, Result};
use crate::events::InventoryEvent;
use crate::grid::{Occupancy, PlacementChange};
use crate::inventory::{IntegrityReport, Inventory, InventorySettings};
use crate::lineage::ParentChange;
use crate::model::{
    NewPlant, NewShelf, Plant, PlantId, PlantUpdate, Shelf, ShelfId, ShelfUpdate,
};
use crate::search::{SearchFilters, TagCount};
use crate::store::backend::StorageBackend;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::VecDeque;

/// Shortest id prefix accepted by the `resolve_*` helpers.
pub const MIN_ID_PREFIX: usize = 4;

/// Undrained events kept before the oldest are dropped.
pub const MAX_PENDING_EVENTS: usize = 10_000;

/// A shelf with its occupancy and dense cell layout.
#[derive(Debug, Clone, Serialize)]
pub struct ShelfView {
    pub shelf: Shelf,
    pub occupancy: Occupancy,
    pub layout: Vec<Vec<Option<PlantId>>>,
}

/// A plant's place in its lineage tree.
#[derive(Debug, Clone, Serialize)]
pub struct LineageView {
    pub plant: Plant,
    /// Nearest first, ending at the root.
    pub ancestors: Vec<PlantId>,
    pub children: Vec<PlantId>,
    pub descendants: Vec<PlantId>,
    pub root: PlantId,
}

pub struct PlantShelf<B: StorageBackend> {
    backend: B,
    state: RwLock<Inventory>,
    // Events of published mutations, kept out of the staged copies.
    outbox: Mutex<VecDeque<InventoryEvent>>,
    caller: Option<String>,
}

fn resolve_prefix<I>(what: &'static str, prefix: &str, ids: I) -> Result<I::Item>
where
    I: Iterator,
    I::Item: ToString + Copy,
{
    let needle = prefix.trim().to_lowercase();
    if needle.chars().count() < MIN_ID_PREFIX {
        return Err(InventoryError::invalid(format!(
            "{} id '{}' is too short (need at least {} characters)",
            what, prefix, MIN_ID_PREFIX
        )));
    }
    let matches: Vec<I::Item> = ids.filter(|id| id.to_string().starts_with(&needle)).collect();
    match matches.as_slice() {
        [one] => Ok(*one),
        [] => Err(InventoryError::NoMatch {
            what,
            prefix: prefix.to_string(),
        }),
        many => Err(InventoryError::invalid(format!(
            "{} id '{}' is ambiguous ({} matches)",
            what,
            prefix,
            many.len()
        ))),
    }
}

impl<B: StorageBackend> PlantShelf<B> {
    /// Loads the inventory from `backend`, or starts empty if nothing was saved.
    pub fn open(backend: B, settings: InventorySettings) -> Result<Self> {
        let inventory = match backend.load()? {
            Some(snapshot) => Inventory::from_snapshot(snapshot, settings).inspect_err(|e| {
                warn!("Refusing to load inventory: {}", e);
            })?,
            None => Inventory::new(settings),
        };
        Ok(Self {
            backend,
            state: RwLock::new(inventory),
            outbox: Mutex::new(VecDeque::new()),
            caller: None,
        })
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        let caller = caller.into();
        self.caller = (!caller.trim().is_empty()).then_some(caller);
        self
    }

    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stages `op` on a copy, persists it, then publishes it.
    fn mutate<T>(&self, name: &str, op: impl FnOnce(&mut Inventory) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        let mut staged = state.clone();

        let out = op(&mut staged).inspect_err(|e| debug!("{} rejected: {}", name, e))?;
        self.backend
            .save(&staged.snapshot())
            .inspect_err(|e| warn!("{} not saved: {}", name, e))?;

        let events = staged.drain_events();
        *state = staged;
        self.publish(events);
        debug!("{} applied", name);
        Ok(out)
    }

    fn publish(&self, events: Vec<InventoryEvent>) {
        let mut outbox = self.outbox.lock();
        outbox.extend(events);
        let overflow = outbox.len().saturating_sub(MAX_PENDING_EVENTS);
        if overflow > 0 {
            warn!("Dropping {} undrained event(s)", overflow);
            outbox.drain(..overflow);
        }
    }

    // --- Id resolution ---

    pub fn resolve_plant(&self, prefix: &str) -> Result<PlantId> {
        if let Ok(id) = prefix.trim().parse::<PlantId>() {
            return Ok(id);
        }
        let state = self.state.read();
        resolve_prefix("plant", prefix, state.entities().plants().map(|p| p.id))
    }

    pub fn resolve_shelf(&self, prefix: &str) -> Result<ShelfId> {
        if let Ok(id) = prefix.trim().parse::<ShelfId>() {
            return Ok(id);
        }
        let state = self.state.read();
        resolve_prefix("shelf", prefix, state.entities().shelves().map(|s| s.id))
    }

    // --- Plants ---

    pub fn create_plant(&self, new: NewPlant) -> Result<Plant> {
        let caller = self.caller.as_deref();
        self.mutate("create_plant", |inv| inv.create_plant(new, caller))
    }

    pub fn get_plant(&self, id: PlantId) -> Result<Plant> {
        self.state.read().get_plant(&id).cloned()
    }

    pub fn list_plants(&self) -> Vec<Plant> {
        self.state.read().list_plants().into_iter().cloned().collect()
    }

    pub fn update_plant(&self, id: PlantId, update: PlantUpdate) -> Result<Plant> {
        self.mutate("update_plant", |inv| inv.update_plant(&id, update))
    }

    pub fn add_tags<S: AsRef<str>>(&self, id: PlantId, tags: &[S]) -> Result<Plant> {
        self.mutate("add_tags", |inv| inv.add_tags(&id, tags))
    }

    pub fn remove_tags<S: AsRef<str>>(&self, id: PlantId, tags: &[S]) -> Result<Plant> {
        self.mutate("remove_tags", |inv| inv.remove_tags(&id, tags))
    }

    pub fn delete_plant(&self, id: PlantId) -> Result<Plant> {
        self.mutate("delete_plant", |inv| inv.delete_plant(&id))
    }

    // --- Shelves ---

    pub fn create_shelf(&self, new: NewShelf) -> Result<Shelf> {
        let caller = self.caller.as_deref();
        self.mutate("create_shelf", |inv| inv.create_shelf(new, caller))
    }

    pub fn get_shelf(&self, id: ShelfId) -> Result<Shelf> {
        self.state.read().get_shelf(&id).cloned()
    }

    pub fn list_shelves(&self) -> Vec<Shelf> {
        self.state.read().list_shelves().into_iter().cloned().collect()
    }

    pub fn update_shelf(&self, id: ShelfId, update: ShelfUpdate) -> Result<Shelf> {
        self.mutate("update_shelf", |inv| inv.update_shelf(&id, update))
    }

    pub fn reorder_shelves(&self, ids: &[ShelfId]) -> Result<()> {
        self.mutate("reorder_shelves", |inv| inv.reorder_shelves(ids))
    }

    pub fn delete_shelf(&self, id: ShelfId) -> Result<Shelf> {
        self.mutate("delete_shelf", |inv| inv.delete_shelf(&id))
    }

    pub fn shelf_view(&self, id: ShelfId) -> Result<ShelfView> {
        let state = self.state.read();
        Ok(ShelfView {
            shelf: state.get_shelf(&id)?.clone(),
            occupancy: state.occupancy(id)?,
            layout: state.shelf_layout(id)?,
        })
    }

    // --- Placement ---

    pub fn assign(&self, plant: PlantId, shelf: ShelfId, row: u32, column: u32) -> Result<PlacementChange> {
        self.mutate("assign", |inv| inv.assign(plant, shelf, row, column))
    }

    pub fn move_plant(&self, plant: PlantId, shelf: ShelfId, row: u32, column: u32) -> Result<PlacementChange> {
        self.mutate("move", |inv| inv.move_plant(plant, shelf, row, column))
    }

    pub fn unassign(&self, plant: PlantId) -> Result<PlacementChange> {
        self.mutate("unassign", |inv| inv.unassign(plant))
    }

    pub fn resize_shelf(&self, shelf: ShelfId, rows: u32, columns: u32) -> Result<Shelf> {
        self.mutate("resize", |inv| inv.resize_shelf(shelf, rows, columns))
    }

    pub fn occupancy(&self, shelf: ShelfId) -> Result<Occupancy> {
        self.state.read().occupancy(shelf)
    }

    pub fn shelf_layout(&self, shelf: ShelfId) -> Result<Vec<Vec<Option<PlantId>>>> {
        self.state.read().shelf_layout(shelf)
    }

    pub fn plants_on_shelf(&self, shelf: ShelfId) -> Result<Vec<Plant>> {
        let state = self.state.read();
        state
            .plants_on_shelf(shelf)?
            .into_iter()
            .map(|(_, id)| state.get_plant(&id).cloned())
            .collect()
    }

    // --- Lineage ---

    pub fn set_parent(&self, child: PlantId, parent: Option<PlantId>) -> Result<ParentChange> {
        self.mutate("set_parent", |inv| inv.set_parent(child, parent))
    }

    pub fn children(&self, id: PlantId) -> Result<Vec<PlantId>> {
        self.state.read().children(id)
    }

    /// Ancestors nearest first, collected under one read lock.
    pub fn ancestors(&self, id: PlantId) -> Result<Vec<PlantId>> {
        Ok(self.state.read().ancestors(id)?.collect())
    }

    pub fn descendants(&self, id: PlantId) -> Result<Vec<PlantId>> {
        self.state.read().descendants(id)
    }

    pub fn lineage(&self, id: PlantId) -> Result<LineageView> {
        let state = self.state.read();
        let plant = state.get_plant(&id)?.clone();
        let ancestors: Vec<PlantId> = state.ancestors(id)?.collect();
        Ok(LineageView {
            root: ancestors.last().copied().unwrap_or(id),
            children: state.children(id)?,
            descendants: state.descendants(id)?,
            ancestors,
            plant,
        })
    }

    // --- Search ---

    pub fn search(&self, filters: &SearchFilters) -> Result<Vec<PlantId>> {
        self.state.read().search(filters, self.caller.as_deref())
    }

    /// Like [`search`](Self::search), returning the records in result order.
    pub fn search_plants(&self, filters: &SearchFilters) -> Result<Vec<Plant>> {
        let state = self.state.read();
        state
            .search(filters, self.caller.as_deref())?
            .iter()
            .map(|id| state.get_plant(id).cloned())
            .collect()
    }

    pub fn tag_counts(&self) -> Vec<TagCount> {
        self.state.read().tag_counts()
    }

    // --- Care ---

    pub fn record_watering(&self, id: PlantId, watered_at: DateTime<Utc>) -> Result<Plant> {
        self.mutate("record_watering", |inv| inv.record_watering(&id, watered_at))
    }

    pub fn watering_due(&self, as_of: DateTime<Utc>) -> Vec<Plant> {
        self.state
            .read()
            .watering_due(as_of)
            .into_iter()
            .cloned()
            .collect()
    }

    // --- Events & integrity ---

    /// Takes the change events of every mutation published so far, oldest first.
    /// At most [`MAX_PENDING_EVENTS`] are kept between drains.
    pub fn drain_events(&self) -> Vec<InventoryEvent> {
        self.outbox.lock().drain(..).collect()
    }

    pub fn check_integrity(&self) -> IntegrityReport {
        let report = self.state.read().check_integrity();
        for issue in &report.issues {
            warn!("integrity: {}", issue);
        }
        report
    }
}
