//! # Placement Grid Manager
//!
//! Tracks which plant sits in which shelf cell.
//!
//! ## Two Halves, One Mapping
//!
//! The placement mapping is stored twice:
//! - **Forward**: `cells: (shelf, row, column) → plant` (sparse, only occupied cells)
//! - **Inverse**: `Plant::position` on the entity record
//!
//! Every mutating method validates first and then updates both halves before
//! returning, so no caller ever observes a cell pointing at a plant whose
//! recorded position differs. Conflicts are rejected, never overwritten.
//!
//! ## Rules
//!
//! | Operation | Rejects with |
//! |-----------|--------------|
//! | `assign`  | `OutOfBounds`, `PlantAlreadyPlaced`, `CellOccupied` |
//! | `move_to` | `OutOfBounds`, `NotPlaced`, `CellOccupied` |
//! | `unassign`| never (idempotent) |
//! | `resize`  | `InvalidArgument` (see [`check_dimensions`]), `WouldOrphanPlants` |
//!
//! Assigning a plant to the cell it already occupies, or moving it onto its own
//! cell, succeeds as [`PlacementChange::Unchanged`].

use crate::error::{InventoryError, Result};
use crate::model::{PlantId, Position, ShelfId};
use crate::store::entities::EntityStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// What a placement operation actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementChange {
    Unchanged,
    Placed(Position),
    Moved { from: Position, to: Position },
    Unplaced(Position),
}

/// Occupied vs. total cell count for one shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub shelf_id: ShelfId,
    pub occupied: u64,
    pub total: u64,
}

impl Occupancy {
    pub fn vacant(&self) -> u64 {
        self.total - self.occupied
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlacementGrid {
    cells: BTreeMap<Position, PlantId>,
}

/// Largest shelf accepted, counted in cells. Layouts are materialized densely.
pub const MAX_SHELF_CELLS: u64 = 10_000;

/// Rejects zero dimensions and shelves with more than [`MAX_SHELF_CELLS`] cells.
pub fn check_dimensions(rows: u32, columns: u32) -> Result<()> {
    if rows == 0 || columns == 0 {
        return Err(InventoryError::invalid(format!(
            "shelf dimensions must be positive, got {}x{}",
            rows, columns
        )));
    }
    if u64::from(rows) * u64::from(columns) > MAX_SHELF_CELLS {
        return Err(InventoryError::invalid(format!(
            "shelf {}x{} exceeds the limit of {} cells",
            rows, columns, MAX_SHELF_CELLS
        )));
    }
    Ok(())
}

fn shelf_range(shelf_id: ShelfId) -> RangeInclusive<Position> {
    Position::new(shelf_id, 0, 0)..=Position::new(shelf_id, u32::MAX, u32::MAX)
}

fn checked_cell(entities: &EntityStore, shelf_id: ShelfId, row: u32, column: u32) -> Result<Position> {
    let shelf = entities.shelf(&shelf_id)?;
    if !shelf.contains(row, column) {
        return Err(InventoryError::OutOfBounds {
            shelf_id,
            row,
            column,
            rows: shelf.rows,
            columns: shelf.columns,
        });
    }
    Ok(Position::new(shelf_id, row, column))
}

impl PlacementGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the forward map from the positions recorded on plants.
    ///
    /// Fails if a recorded position points at a missing shelf, lies outside the
    /// shelf, or collides with another plant.
    pub fn rebuild(entities: &EntityStore) -> Result<Self> {
        let mut grid = Self::new();
        for plant in entities.plants() {
            let Some(pos) = plant.position else {
                continue;
            };
            checked_cell(entities, pos.shelf_id, pos.row, pos.column).map_err(|e| {
                InventoryError::Integrity(format!("plant {} has invalid position: {}", plant.id, e))
            })?;
            if let Some(other) = grid.cells.insert(pos, plant.id) {
                return Err(InventoryError::Integrity(format!(
                    "plants {} and {} both claim cell {}",
                    other, plant.id, pos
                )));
            }
        }
        Ok(grid)
    }

    pub fn occupant(&self, position: &Position) -> Option<PlantId> {
        self.cells.get(position).copied()
    }

    /// Places an unpositioned plant into an empty cell.
    pub fn assign(
        &mut self,
        entities: &mut EntityStore,
        plant_id: PlantId,
        shelf_id: ShelfId,
        row: u32,
        column: u32,
    ) -> Result<PlacementChange> {
        let current = entities.plant(&plant_id)?.position;
        let target = checked_cell(entities, shelf_id, row, column)?;

        if let Some(current) = current {
            if current == target {
                return Ok(PlacementChange::Unchanged);
            }
            return Err(InventoryError::PlantAlreadyPlaced {
                plant_id,
                position: current,
            });
        }
        if let Some(occupant) = self.occupant(&target) {
            return Err(InventoryError::CellOccupied {
                position: target,
                occupant,
            });
        }

        entities.plant_mut(&plant_id)?.position = Some(target);
        entities.touch_plant(&plant_id)?;
        self.cells.insert(target, plant_id);
        Ok(PlacementChange::Placed(target))
    }

    /// Relocates a placed plant: vacate and assign as one step.
    pub fn move_to(
        &mut self,
        entities: &mut EntityStore,
        plant_id: PlantId,
        shelf_id: ShelfId,
        row: u32,
        column: u32,
    ) -> Result<PlacementChange> {
        let current = entities.plant(&plant_id)?.position;
        let target = checked_cell(entities, shelf_id, row, column)?;
        let from = current.ok_or(InventoryError::NotPlaced(plant_id))?;

        if from == target {
            return Ok(PlacementChange::Unchanged);
        }
        if let Some(occupant) = self.occupant(&target) {
            return Err(InventoryError::CellOccupied {
                position: target,
                occupant,
            });
        }

        entities.plant_mut(&plant_id)?.position = Some(target);
        entities.touch_plant(&plant_id)?;
        self.cells.remove(&from);
        self.cells.insert(target, plant_id);
        Ok(PlacementChange::Moved { from, to: target })
    }

    /// Clears a plant's position. Succeeds as `Unchanged` when it has none.
    pub fn unassign(&mut self, entities: &mut EntityStore, plant_id: PlantId) -> Result<PlacementChange> {
        let Some(from) = entities.plant(&plant_id)?.position else {
            return Ok(PlacementChange::Unchanged);
        };

        entities.plant_mut(&plant_id)?.position = None;
        entities.touch_plant(&plant_id)?;
        self.cells.remove(&from);
        Ok(PlacementChange::Unplaced(from))
    }

    /// Plants on `shelf_id` whose cell would fall outside `rows × columns`.
    pub fn outside_bounds(&self, shelf_id: ShelfId, rows: u32, columns: u32) -> Vec<PlantId> {
        self.cells
            .range(shelf_range(shelf_id))
            .filter(|(pos, _)| pos.row >= rows || pos.column >= columns)
            .map(|(_, plant_id)| *plant_id)
            .collect()
    }

    /// Changes a shelf's dimensions. Returns the previous `(rows, columns)`.
    pub fn resize(
        &self,
        entities: &mut EntityStore,
        shelf_id: ShelfId,
        rows: u32,
        columns: u32,
    ) -> Result<(u32, u32)> {
        check_dimensions(rows, columns)?;
        let shelf = entities.shelf(&shelf_id)?;
        let previous = (shelf.rows, shelf.columns);
        if previous == (rows, columns) {
            return Ok(previous);
        }

        let orphans = self.outside_bounds(shelf_id, rows, columns);
        if !orphans.is_empty() {
            return Err(InventoryError::WouldOrphanPlants {
                shelf_id,
                plants: orphans,
            });
        }

        let shelf = entities.shelf_mut(&shelf_id)?;
        shelf.rows = rows;
        shelf.columns = columns;
        entities.touch_shelf(&shelf_id)?;
        Ok(previous)
    }

    pub fn occupancy(&self, entities: &EntityStore, shelf_id: ShelfId) -> Result<Occupancy> {
        let shelf = entities.shelf(&shelf_id)?;
        let occupied = self.cells.range(shelf_range(shelf_id)).count() as u64;
        Ok(Occupancy {
            shelf_id,
            occupied,
            total: shelf.cell_count(),
        })
    }

    /// Occupied cells of a shelf in row-major order.
    pub fn plants_on_shelf(&self, entities: &EntityStore, shelf_id: ShelfId) -> Result<Vec<(Position, PlantId)>> {
        entities.shelf(&shelf_id)?;
        Ok(self
            .cells
            .range(shelf_range(shelf_id))
            .map(|(pos, id)| (*pos, *id))
            .collect())
    }

    /// Dense `rows × columns` view of a shelf, for presentation.
    pub fn layout(&self, entities: &EntityStore, shelf_id: ShelfId) -> Result<Vec<Vec<Option<PlantId>>>> {
        let shelf = entities.shelf(&shelf_id)?;
        let mut rows = vec![vec![None; shelf.columns as usize]; shelf.rows as usize];
        for (pos, plant_id) in self.cells.range(shelf_range(shelf_id)) {
            rows[pos.row as usize][pos.column as usize] = Some(*plant_id);
        }
        Ok(rows)
    }

    /// Lists every disagreement between the forward map and the plant records.
    pub fn integrity_issues(&self, entities: &EntityStore) -> Vec<String> {
        let mut issues = Vec::new();

        for (pos, plant_id) in &self.cells {
            match entities.plant(plant_id) {
                Err(_) => issues.push(format!("cell {} references missing plant {}", pos, plant_id)),
                Ok(plant) if plant.position != Some(*pos) => issues.push(format!(
                    "cell {} holds plant {} but the plant records {:?}",
                    pos, plant_id, plant.position
                )),
                Ok(_) => {}
            }
            match entities.shelf(&pos.shelf_id) {
                Err(_) => issues.push(format!("cell {} belongs to a missing shelf", pos)),
                Ok(shelf) if !shelf.contains(pos.row, pos.column) => {
                    issues.push(format!("cell {} is outside its shelf", pos))
                }
                Ok(_) => {}
            }
        }

        for plant in entities.plants() {
            if let Some(pos) = plant.position {
                if self.occupant(&pos) != Some(plant.id) {
                    issues.push(format!(
                        "plant {} records position {} but the cell does not reference it",
                        plant.id, pos
                    ));
                }
            }
        }

        issues
    }
}
