//! Canonical plant and shelf records.
//!
//! The entity store owns identity and timestamps. It does not know about the grid,
//! lineage or tag index; those components validate a change and then write the
//! result through the `*_mut` accessors here.

use crate::error::{InventoryError, Result};
use crate::model::{Plant, PlantId, Shelf, ShelfId};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    plants: BTreeMap<PlantId, Plant>,
    shelves: BTreeMap<ShelfId, Shelf>,
    last_stamp: Option<DateTime<Utc>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a timestamp strictly greater than every previously issued one.
    pub fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    /// Raises the stamp floor so that stamps issued after loading persisted
    /// records still sort after them.
    pub(crate) fn observe_stamp(&mut self, at: DateTime<Utc>) {
        match self.last_stamp {
            Some(last) if last >= at => {}
            _ => self.last_stamp = Some(at),
        }
    }

    // --- Plants ---

    pub fn plant(&self, id: &PlantId) -> Result<&Plant> {
        self.plants.get(id).ok_or(InventoryError::PlantNotFound(*id))
    }

    pub(crate) fn plant_mut(&mut self, id: &PlantId) -> Result<&mut Plant> {
        self.plants
            .get_mut(id)
            .ok_or(InventoryError::PlantNotFound(*id))
    }

    pub fn contains_plant(&self, id: &PlantId) -> bool {
        self.plants.contains_key(id)
    }

    pub fn plants(&self) -> impl Iterator<Item = &Plant> {
        self.plants.values()
    }

    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }

    pub(crate) fn insert_plant(&mut self, plant: Plant) {
        self.observe_stamp(plant.updated_at);
        self.plants.insert(plant.id, plant);
    }

    pub(crate) fn remove_plant(&mut self, id: &PlantId) -> Result<Plant> {
        self.plants
            .remove(id)
            .ok_or(InventoryError::PlantNotFound(*id))
    }

    /// Bumps `updated_at` on a plant.
    pub(crate) fn touch_plant(&mut self, id: &PlantId) -> Result<()> {
        let stamp = self.stamp();
        self.plant_mut(id)?.updated_at = stamp;
        Ok(())
    }

    // --- Shelves ---

    pub fn shelf(&self, id: &ShelfId) -> Result<&Shelf> {
        self.shelves.get(id).ok_or(InventoryError::ShelfNotFound(*id))
    }

    pub(crate) fn shelf_mut(&mut self, id: &ShelfId) -> Result<&mut Shelf> {
        self.shelves
            .get_mut(id)
            .ok_or(InventoryError::ShelfNotFound(*id))
    }

    pub fn contains_shelf(&self, id: &ShelfId) -> bool {
        self.shelves.contains_key(id)
    }

    pub fn shelves(&self) -> impl Iterator<Item = &Shelf> {
        self.shelves.values()
    }

    pub fn shelf_count(&self) -> usize {
        self.shelves.len()
    }

    pub(crate) fn insert_shelf(&mut self, shelf: Shelf) {
        self.observe_stamp(shelf.updated_at);
        self.shelves.insert(shelf.id, shelf);
    }

    pub(crate) fn remove_shelf(&mut self, id: &ShelfId) -> Result<Shelf> {
        self.shelves
            .remove(id)
            .ok_or(InventoryError::ShelfNotFound(*id))
    }

    pub(crate) fn touch_shelf(&mut self, id: &ShelfId) -> Result<()> {
        let stamp = self.stamp();
        self.shelf_mut(id)?.updated_at = stamp;
        Ok(())
    }
}
