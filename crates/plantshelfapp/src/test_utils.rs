//! Builders for tests.
//!
//! Record builders (`plant_record`, `shelf_record`) produce bare records for
//! exercising components directly. [`InventoryFixture`] goes through the real
//! [`Inventory`] operations so invariants hold from the start.

use crate::inventory::{Inventory, InventorySettings};
use crate::model::{NewPlant, NewShelf, Plant, PlantId, Shelf, ShelfId, Visibility};
use chrono::Utc;

/// An unplaced, unparented, untagged plant.
pub fn plant_record(name: &str) -> Plant {
    let now = Utc::now();
    Plant {
        id: PlantId::generate(),
        owner_id: None,
        name: name.to_string(),
        description: String::new(),
        tags: Default::default(),
        visibility: Visibility::Private,
        parent_id: None,
        position: None,
        images: Vec::new(),
        care: Default::default(),
        created_at: now,
        updated_at: now,
    }
}

pub fn shelf_record(name: &str, rows: u32, columns: u32) -> Shelf {
    let now = Utc::now();
    Shelf {
        id: ShelfId::generate(),
        owner_id: None,
        name: name.to_string(),
        rows,
        columns,
        order: 0,
        created_at: now,
        updated_at: now,
    }
}

/// An inventory populated through its public operations.
///
/// Plants and shelves are remembered in creation order and looked up by index.
pub struct InventoryFixture {
    pub inventory: Inventory,
    plants: Vec<PlantId>,
    shelves: Vec<ShelfId>,
}

impl Default for InventoryFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryFixture {
    pub fn new() -> Self {
        Self::with_settings(InventorySettings::default())
    }

    pub fn with_settings(settings: InventorySettings) -> Self {
        Self {
            inventory: Inventory::new(settings),
            plants: Vec::new(),
            shelves: Vec::new(),
        }
    }

    pub fn with_shelf(mut self, name: &str, rows: u32, columns: u32) -> Self {
        let shelf = self
            .inventory
            .create_shelf(NewShelf::new(name, rows, columns), None)
            .expect("fixture shelf");
        self.shelves.push(shelf.id);
        self
    }

    pub fn with_plants(mut self, names: &[&str]) -> Self {
        for name in names {
            let plant = self
                .inventory
                .create_plant(NewPlant::new(*name), None)
                .expect("fixture plant");
            self.plants.push(plant.id);
        }
        self
    }

    pub fn with_tagged_plant(mut self, name: &str, tags: &[&str]) -> Self {
        let plant = self
            .inventory
            .create_plant(NewPlant::new(name).with_tags(tags.iter().copied()), None)
            .expect("fixture plant");
        self.plants.push(plant.id);
        self
    }

    pub fn plant(&self, index: usize) -> PlantId {
        self.plants[index]
    }

    pub fn shelf(&self, index: usize) -> ShelfId {
        self.shelves[index]
    }

    pub fn into_inventory(self) -> Inventory {
        self.inventory
    }
}
