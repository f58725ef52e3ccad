//! # Inventory Aggregate
//!
//! [`Inventory`] owns the entity store and the three derived structures built on
//! top of it (grid cell map, lineage children index, tag index) and routes every
//! mutation through the component that guards the relevant invariant:
//!
//! | Mutation touches | Routed through |
//! |------------------|----------------|
//! | position | [`PlacementGrid`] |
//! | parent pointer | [`LineageGraph`] |
//! | tags | [`TagIndex`] (same step as the record change) |
//!
//! Each operation validates before writing anything, so a rejected call leaves
//! the inventory exactly as it was. Applied changes append [`InventoryEvent`]s to
//! an outbox (see [`Inventory::drain_events`]).
//!
//! The aggregate is synchronous and single-owner. Sharing, locking and
//! persistence are the job of [`crate::api::PlantShelf`].

use crate::config::PlantShelfConfig;
use crate::error::{InventoryError, Result};
use crate::events::{EventKind, InventoryEvent};
use crate::grid::{self, Occupancy, PlacementChange, PlacementGrid};
use crate::lineage::{self, Ancestors, LineageGraph, ParentChange};
use crate::model::{
    NewPlant, NewShelf, Plant, PlantId, PlantUpdate, Position, Shelf, ShelfId, ShelfUpdate,
    Visibility,
};
use crate::search::{self, SearchFilters, TagCount, TagIndex};
use crate::store::entities::EntityStore;
use crate::store::{InventorySnapshot, SNAPSHOT_VERSION};
use crate::tags::{normalize_tags, DEFAULT_MAX_TAG_LENGTH};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeSet, HashSet};

/// Behavioural knobs taken from [`PlantShelfConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventorySettings {
    pub default_visibility: Visibility,
    pub watering_interval_days: u32,
    pub max_tag_length: usize,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            default_visibility: Visibility::Private,
            watering_interval_days: 7,
            max_tag_length: DEFAULT_MAX_TAG_LENGTH,
        }
    }
}

impl From<&PlantShelfConfig> for InventorySettings {
    fn from(config: &PlantShelfConfig) -> Self {
        Self {
            default_visibility: config.default_visibility,
            watering_interval_days: config.watering_interval_days,
            max_tag_length: config.max_tag_length,
        }
    }
}

/// Result of [`Inventory::check_integrity`]. Empty on a healthy inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    entities: EntityStore,
    grid: PlacementGrid,
    lineage: LineageGraph,
    tags: TagIndex,
    settings: InventorySettings,
    events: Vec<InventoryEvent>,
}

fn required_name(raw: &str, what: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(InventoryError::invalid(format!("{} name cannot be empty", what)));
    }
    Ok(name.to_string())
}

fn owner(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|o| !o.is_empty()).map(str::to_string)
}

impl Inventory {
    pub fn new(settings: InventorySettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Rebuilds an inventory from persisted records.
    ///
    /// The cell map, children index and tag index are derived here. Snapshots
    /// that break any placement, lineage or tag rule are rejected with an
    /// `Integrity` error instead of being repaired.
    pub fn from_snapshot(snapshot: InventorySnapshot, settings: InventorySettings) -> Result<Self> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(InventoryError::Integrity(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let mut entities = EntityStore::new();
        for shelf in snapshot.shelves {
            grid::check_dimensions(shelf.rows, shelf.columns)
                .map_err(|e| InventoryError::Integrity(format!("shelf {}: {}", shelf.id, e)))?;
            if entities.contains_shelf(&shelf.id) {
                return Err(InventoryError::Integrity(format!("duplicate shelf {}", shelf.id)));
            }
            entities.insert_shelf(shelf);
        }
        for plant in snapshot.plants {
            if entities.contains_plant(&plant.id) {
                return Err(InventoryError::Integrity(format!("duplicate plant {}", plant.id)));
            }
            // Length limits apply to writes only.
            let normalized = normalize_tags(&plant.tags, usize::MAX)
                .map_err(|e| InventoryError::Integrity(format!("plant {}: {}", plant.id, e)))?;
            if normalized != plant.tags {
                return Err(InventoryError::Integrity(format!(
                    "plant {} has tags that are not normalized",
                    plant.id
                )));
            }
            entities.insert_plant(plant);
        }

        let grid = PlacementGrid::rebuild(&entities)?;
        let lineage = LineageGraph::rebuild(&entities)?;
        let tags = TagIndex::rebuild(&entities);
        debug!(
            "Loaded inventory: {} plants, {} shelves",
            entities.plant_count(),
            entities.shelf_count()
        );

        Ok(Self {
            entities,
            grid,
            lineage,
            tags,
            settings,
            events: Vec::new(),
        })
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            version: SNAPSHOT_VERSION,
            plants: self.entities.plants().cloned().collect(),
            shelves: self.entities.shelves().cloned().collect(),
        }
    }

    pub fn settings(&self) -> &InventorySettings {
        &self.settings
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Takes every event recorded since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<InventoryEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: InventoryEvent) {
        debug!("{} {:?}", event.kind.as_str(), event.subject);
        self.events.push(event);
    }

    fn updated_at(&self, id: &PlantId) -> Result<DateTime<Utc>> {
        Ok(self.entities.plant(id)?.updated_at)
    }

    // --- Plants ---

    pub fn create_plant(&mut self, new: NewPlant, owner_id: Option<&str>) -> Result<Plant> {
        let name = required_name(&new.name, "plant")?;
        let tags = normalize_tags(&new.tags, self.settings.max_tag_length)?;

        let now = self.entities.stamp();
        let plant = Plant {
            id: PlantId::generate(),
            owner_id: owner(owner_id),
            name,
            description: new.description,
            tags,
            visibility: new.visibility.unwrap_or(self.settings.default_visibility),
            parent_id: None,
            position: None,
            images: new.images,
            care: new.care,
            created_at: now,
            updated_at: now,
        };

        self.tags.insert(plant.id, &plant.tags);
        self.entities.insert_plant(plant.clone());
        self.emit(InventoryEvent::plant(
            EventKind::PlantCreated,
            plant.id,
            now,
            json!({ "name": plant.name }),
        ));
        Ok(plant)
    }

    pub fn get_plant(&self, id: &PlantId) -> Result<&Plant> {
        self.entities.plant(id)
    }

    /// All plants in id order.
    pub fn list_plants(&self) -> Vec<&Plant> {
        self.entities.plants().collect()
    }

    pub fn update_plant(&mut self, id: &PlantId, update: PlantUpdate) -> Result<Plant> {
        let current = self.entities.plant(id)?;
        if update.is_empty() {
            return Ok(current.clone());
        }

        let name = update
            .name
            .as_deref()
            .map(|n| required_name(n, "plant"))
            .transpose()?;
        let new_tags = update
            .tags
            .as_ref()
            .map(|t| normalize_tags(t, self.settings.max_tag_length))
            .transpose()?;

        let mut changed = Vec::new();
        if let Some(tags) = &new_tags {
            self.tags.replace(*id, &current.tags, tags);
            changed.push("tags");
        }

        let plant = self.entities.plant_mut(id)?;
        if let Some(name) = name {
            plant.name = name;
            changed.push("name");
        }
        if let Some(description) = update.description {
            plant.description = description;
            changed.push("description");
        }
        if let Some(tags) = new_tags {
            plant.tags = tags;
        }
        if let Some(visibility) = update.visibility {
            plant.visibility = visibility;
            changed.push("visibility");
        }
        if let Some(images) = update.images {
            plant.images = images;
            changed.push("images");
        }
        if let Some(care) = update.care {
            plant.care = care;
            changed.push("care");
        }

        self.entities.touch_plant(id)?;
        let at = self.updated_at(id)?;
        self.emit(InventoryEvent::plant(
            EventKind::PlantUpdated,
            *id,
            at,
            json!({ "fields": changed }),
        ));
        Ok(self.entities.plant(id)?.clone())
    }

    /// Adds tags to a plant. Tags it already carries are ignored.
    pub fn add_tags<S: AsRef<str>>(&mut self, id: &PlantId, tags: &[S]) -> Result<Plant> {
        let incoming = normalize_tags(tags, self.settings.max_tag_length)?;
        let current = &self.entities.plant(id)?.tags;
        let merged: BTreeSet<String> = current.union(&incoming).cloned().collect();
        self.apply_tags(id, merged)
    }

    /// Removes tags from a plant. Tags it does not carry are ignored.
    pub fn remove_tags<S: AsRef<str>>(&mut self, id: &PlantId, tags: &[S]) -> Result<Plant> {
        let outgoing = normalize_tags(tags, self.settings.max_tag_length)?;
        let current = &self.entities.plant(id)?.tags;
        let kept: BTreeSet<String> = current.difference(&outgoing).cloned().collect();
        self.apply_tags(id, kept)
    }

    fn apply_tags(&mut self, id: &PlantId, tags: BTreeSet<String>) -> Result<Plant> {
        let current = self.entities.plant(id)?;
        if current.tags == tags {
            return Ok(current.clone());
        }
        self.tags.replace(*id, &current.tags, &tags);
        self.entities.plant_mut(id)?.tags = tags;
        self.entities.touch_plant(id)?;
        let at = self.updated_at(id)?;
        self.emit(InventoryEvent::plant(
            EventKind::PlantUpdated,
            *id,
            at,
            json!({ "fields": ["tags"] }),
        ));
        Ok(self.entities.plant(id)?.clone())
    }

    /// Deletes a plant without cascading.
    ///
    /// The plant is vacated from its cell, its children become roots, it is
    /// detached from its own parent and dropped from the tag index before the
    /// record is removed. Returns the removed record.
    pub fn delete_plant(&mut self, id: &PlantId) -> Result<Plant> {
        self.entities.plant(id)?;

        let change = self.grid.unassign(&mut self.entities, *id)?;
        if let Some(event) = InventoryEvent::from_placement(*id, change, self.updated_at(id)?) {
            self.emit(event);
        }

        for child in self.lineage.detach_children(&mut self.entities, *id)? {
            let at = self.updated_at(&child)?;
            self.emit(InventoryEvent::plant(
                EventKind::PlantParentChanged,
                child,
                at,
                json!({ "old": id, "new": null }),
            ));
        }
        let change = self.lineage.set_parent(&mut self.entities, *id, None)?;
        if let Some(event) = InventoryEvent::from_parent_change(*id, change, self.updated_at(id)?) {
            self.emit(event);
        }

        let removed = self.entities.remove_plant(id)?;
        self.tags.remove(*id, &removed.tags);
        let at = self.entities.stamp();
        self.emit(InventoryEvent::plant(
            EventKind::PlantDeleted,
            *id,
            at,
            json!({ "name": removed.name }),
        ));
        Ok(removed)
    }

    // --- Shelves ---

    pub fn create_shelf(&mut self, new: NewShelf, owner_id: Option<&str>) -> Result<Shelf> {
        let name = required_name(&new.name, "shelf")?;
        grid::check_dimensions(new.rows, new.columns)?;
        let order = match new.order {
            Some(order) => order,
            None => self
                .entities
                .shelves()
                .map(|s| s.order.saturating_add(1))
                .max()
                .unwrap_or(0),
        };

        let now = self.entities.stamp();
        let shelf = Shelf {
            id: ShelfId::generate(),
            owner_id: owner(owner_id),
            name,
            rows: new.rows,
            columns: new.columns,
            order,
            created_at: now,
            updated_at: now,
        };
        self.entities.insert_shelf(shelf.clone());
        self.emit(InventoryEvent::shelf(
            EventKind::ShelfCreated,
            shelf.id,
            now,
            json!({ "name": shelf.name, "rows": shelf.rows, "columns": shelf.columns }),
        ));
        Ok(shelf)
    }

    pub fn get_shelf(&self, id: &ShelfId) -> Result<&Shelf> {
        self.entities.shelf(id)
    }

    /// All shelves by display order, then id.
    pub fn list_shelves(&self) -> Vec<&Shelf> {
        let mut shelves: Vec<&Shelf> = self.entities.shelves().collect();
        shelves.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        shelves
    }

    pub fn update_shelf(&mut self, id: &ShelfId, update: ShelfUpdate) -> Result<Shelf> {
        self.entities.shelf(id)?;
        if update.name.is_none() && update.order.is_none() {
            return Ok(self.entities.shelf(id)?.clone());
        }
        let name = update
            .name
            .as_deref()
            .map(|n| required_name(n, "shelf"))
            .transpose()?;

        let shelf = self.entities.shelf_mut(id)?;
        if let Some(name) = name {
            shelf.name = name;
        }
        if let Some(order) = update.order {
            shelf.order = order;
        }
        self.entities.touch_shelf(id)?;

        let shelf = self.entities.shelf(id)?.clone();
        self.emit(InventoryEvent::shelf(
            EventKind::ShelfUpdated,
            *id,
            shelf.updated_at,
            json!({ "name": shelf.name, "order": shelf.order }),
        ));
        Ok(shelf)
    }

    /// Sets display order to the position of each id in `ids`, which must list
    /// every shelf exactly once.
    pub fn reorder_shelves(&mut self, ids: &[ShelfId]) -> Result<()> {
        let unique: HashSet<&ShelfId> = ids.iter().collect();
        if unique.len() != ids.len() {
            return Err(InventoryError::invalid("shelf order lists a shelf twice"));
        }
        if ids.len() != self.entities.shelf_count() {
            return Err(InventoryError::invalid(format!(
                "shelf order must list all {} shelves, got {}",
                self.entities.shelf_count(),
                ids.len()
            )));
        }
        if let Some(unknown) = ids.iter().find(|id| !self.entities.contains_shelf(id)) {
            return Err(InventoryError::invalid(format!(
                "shelf order references unknown shelf {}",
                unknown
            )));
        }

        for (order, id) in ids.iter().enumerate() {
            let order = u32::try_from(order)
                .map_err(|_| InventoryError::invalid("too many shelves to order"))?;
            if self.entities.shelf(id)?.order == order {
                continue;
            }
            self.entities.shelf_mut(id)?.order = order;
            self.entities.touch_shelf(id)?;
            let at = self.entities.shelf(id)?.updated_at;
            self.emit(InventoryEvent::shelf(
                EventKind::ShelfUpdated,
                *id,
                at,
                json!({ "order": order }),
            ));
        }
        Ok(())
    }

    /// Deletes an empty shelf. Occupied shelves are rejected with
    /// `WouldOrphanPlants`; vacate them first.
    pub fn delete_shelf(&mut self, id: &ShelfId) -> Result<Shelf> {
        self.entities.shelf(id)?;
        let occupants = self.grid.outside_bounds(*id, 0, 0);
        if !occupants.is_empty() {
            return Err(InventoryError::WouldOrphanPlants {
                shelf_id: *id,
                plants: occupants,
            });
        }
        let removed = self.entities.remove_shelf(id)?;
        let at = self.entities.stamp();
        self.emit(InventoryEvent::shelf(
            EventKind::ShelfDeleted,
            *id,
            at,
            json!({ "name": removed.name }),
        ));
        Ok(removed)
    }

    // --- Placement ---

    fn placed(&mut self, plant_id: PlantId, change: PlacementChange) -> Result<PlacementChange> {
        if let Some(event) = InventoryEvent::from_placement(plant_id, change, self.updated_at(&plant_id)?) {
            self.emit(event);
        }
        Ok(change)
    }

    pub fn assign(&mut self, plant_id: PlantId, shelf_id: ShelfId, row: u32, column: u32) -> Result<PlacementChange> {
        let change = self.grid.assign(&mut self.entities, plant_id, shelf_id, row, column)?;
        self.placed(plant_id, change)
    }

    pub fn move_plant(&mut self, plant_id: PlantId, shelf_id: ShelfId, row: u32, column: u32) -> Result<PlacementChange> {
        let change = self.grid.move_to(&mut self.entities, plant_id, shelf_id, row, column)?;
        self.placed(plant_id, change)
    }

    pub fn unassign(&mut self, plant_id: PlantId) -> Result<PlacementChange> {
        let change = self.grid.unassign(&mut self.entities, plant_id)?;
        self.placed(plant_id, change)
    }

    pub fn resize_shelf(&mut self, shelf_id: ShelfId, rows: u32, columns: u32) -> Result<Shelf> {
        let previous = self.grid.resize(&mut self.entities, shelf_id, rows, columns)?;
        let shelf = self.entities.shelf(&shelf_id)?.clone();
        if previous != (rows, columns) {
            self.emit(InventoryEvent::shelf(
                EventKind::ShelfResized,
                shelf_id,
                shelf.updated_at,
                json!({
                    "from": { "rows": previous.0, "columns": previous.1 },
                    "to": { "rows": rows, "columns": columns },
                }),
            ));
        }
        Ok(shelf)
    }

    pub fn occupancy(&self, shelf_id: ShelfId) -> Result<Occupancy> {
        self.grid.occupancy(&self.entities, shelf_id)
    }

    pub fn occupant(&self, position: &Position) -> Option<PlantId> {
        self.grid.occupant(position)
    }

    pub fn shelf_layout(&self, shelf_id: ShelfId) -> Result<Vec<Vec<Option<PlantId>>>> {
        self.grid.layout(&self.entities, shelf_id)
    }

    pub fn plants_on_shelf(&self, shelf_id: ShelfId) -> Result<Vec<(Position, PlantId)>> {
        self.grid.plants_on_shelf(&self.entities, shelf_id)
    }

    // --- Lineage ---

    pub fn set_parent(&mut self, child: PlantId, parent: Option<PlantId>) -> Result<ParentChange> {
        let change = self.lineage.set_parent(&mut self.entities, child, parent)?;
        if let Some(event) = InventoryEvent::from_parent_change(child, change, self.updated_at(&child)?) {
            self.emit(event);
        }
        Ok(change)
    }

    pub fn children(&self, id: PlantId) -> Result<Vec<PlantId>> {
        self.lineage.children(&self.entities, id)
    }

    pub fn ancestors(&self, id: PlantId) -> Result<Ancestors<'_>> {
        lineage::ancestors(&self.entities, id)
    }

    pub fn descendants(&self, id: PlantId) -> Result<Vec<PlantId>> {
        self.lineage.descendants(&self.entities, id)
    }

    pub fn root_of(&self, id: PlantId) -> Result<PlantId> {
        self.lineage.root_of(&self.entities, id)
    }

    // --- Search ---

    pub fn search(&self, filters: &SearchFilters, caller: Option<&str>) -> Result<Vec<PlantId>> {
        search::search(
            &self.entities,
            &self.tags,
            filters,
            caller,
            self.settings.max_tag_length,
        )
    }

    pub fn tag_counts(&self) -> Vec<TagCount> {
        self.tags.tag_counts()
    }

    // --- Care ---

    /// Records a watering and schedules the next one `watering_interval_days` later.
    pub fn record_watering(&mut self, id: &PlantId, watered_at: DateTime<Utc>) -> Result<Plant> {
        self.entities.plant(id)?;
        let interval = Duration::days(i64::from(self.settings.watering_interval_days));
        let next_due = watered_at.checked_add_signed(interval).ok_or_else(|| {
            InventoryError::invalid(format!(
                "next watering after {} is out of the representable date range",
                watered_at
            ))
        })?;

        let plant = self.entities.plant_mut(id)?;
        plant.care.last_watered = Some(watered_at);
        plant.care.next_watering_due = Some(next_due);
        self.entities.touch_plant(id)?;

        let at = self.updated_at(id)?;
        self.emit(InventoryEvent::plant(
            EventKind::PlantWatered,
            *id,
            at,
            json!({ "watered_at": watered_at, "next_due": next_due }),
        ));
        Ok(self.entities.plant(id)?.clone())
    }

    /// Plants whose next watering is due at or before `as_of`, soonest first.
    pub fn watering_due(&self, as_of: DateTime<Utc>) -> Vec<&Plant> {
        let mut due: Vec<&Plant> = self
            .entities
            .plants()
            .filter(|p| p.care.next_watering_due.is_some_and(|d| d <= as_of))
            .collect();
        due.sort_by(|a, b| {
            a.care
                .next_watering_due
                .cmp(&b.care.next_watering_due)
                .then_with(|| a.id.cmp(&b.id))
        });
        due
    }

    // --- Integrity ---

    /// Checks every placement, lineage and tag-index invariant against the records.
    pub fn check_integrity(&self) -> IntegrityReport {
        let mut issues = self.grid.integrity_issues(&self.entities);
        issues.extend(self.lineage.integrity_issues(&self.entities));
        issues.extend(self.tags.integrity_issues(&self.entities));
        IntegrityReport { issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{CareMetadata, PlantImage};
    use crate::search::{SortBy, SortOrder, VisibilityFilter};
    use crate::test_utils::InventoryFixture;

    fn kinds(events: &[InventoryEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.kind.as_str()).collect()
    }

    #[test]
    fn test_create_plant_normalizes_and_indexes() {
        let mut inv = Inventory::new(InventorySettings::default());
        let plant = inv
            .create_plant(
                NewPlant::new("  アガベ 白鯨 ").with_tags([" 白鯨", "Titanota", "titanota"]),
                Some("alice"),
            )
            .unwrap();

        assert_eq!(plant.name, "アガベ 白鯨");
        assert_eq!(plant.owner_id.as_deref(), Some("alice"));
        assert_eq!(plant.visibility, Visibility::Private);
        assert!(plant.position.is_none() && plant.parent_id.is_none());
        assert_eq!(plant.tags.len(), 2);
        assert_eq!(inv.tag_counts().len(), 2);
        assert!(inv.check_integrity().is_clean());
    }

    #[test]
    fn test_create_plant_rejects_blank_name_and_bad_tags() {
        let mut inv = Inventory::new(InventorySettings::default());
        let err = inv.create_plant(NewPlant::new("  "), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = inv
            .create_plant(NewPlant::new("a").with_tags(["ok", "\tbad"]), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(inv.list_plants().is_empty());
        assert!(inv.drain_events().is_empty());
    }

    #[test]
    fn test_default_visibility_comes_from_settings() {
        let mut inv = Inventory::new(InventorySettings {
            default_visibility: Visibility::Public,
            ..Default::default()
        });
        let plant = inv.create_plant(NewPlant::new("a"), None).unwrap();
        assert_eq!(plant.visibility, Visibility::Public);
        let plant = inv
            .create_plant(NewPlant::new("b").with_visibility(Visibility::Private), None)
            .unwrap();
        assert_eq!(plant.visibility, Visibility::Private);
    }

    #[test]
    fn test_update_plant_replaces_fields_and_reindexes_tags() {
        let mut fx = InventoryFixture::new().with_tagged_plant("白鯨", &["白鯨", "チタノタ"]);
        let id = fx.plant(0);
        let before = fx.inventory.get_plant(&id).unwrap().updated_at;

        let care = CareMetadata {
            acquisition_source: Some("Tokyo plant fair".into()),
            ..Default::default()
        };
        let updated = fx
            .inventory
            .update_plant(
                &id,
                PlantUpdate::new()
                    .name("白鯨 (親株)")
                    .tags(["親株"])
                    .images(vec![PlantImage::new("https://img.example/1.jpg")])
                    .care(care.clone()),
            )
            .unwrap();

        assert_eq!(updated.name, "白鯨 (親株)");
        assert!(updated.updated_at > before);
        assert_eq!(updated.care, care);
        assert_eq!(updated.images.len(), 1);
        let hits = fx.inventory.search(&SearchFilters::new().tags(["白鯨"]), None).unwrap();
        assert!(hits.is_empty());
        let hits = fx.inventory.search(&SearchFilters::new().tags(["親株"]), None).unwrap();
        assert_eq!(hits, vec![id]);
        assert!(fx.inventory.check_integrity().is_clean());
    }

    #[test]
    fn test_failed_update_changes_nothing() {
        let mut fx = InventoryFixture::new().with_tagged_plant("a", &["x"]);
        let id = fx.plant(0);
        fx.inventory.drain_events();
        let before = fx.inventory.get_plant(&id).unwrap().clone();

        let err = fx
            .inventory
            .update_plant(&id, PlantUpdate::new().name("renamed").tags([""]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(fx.inventory.get_plant(&id).unwrap(), &before);
        assert!(fx.inventory.drain_events().is_empty());
    }

    #[test]
    fn test_add_and_remove_tags_are_idempotent() {
        let mut fx = InventoryFixture::new().with_tagged_plant("a", &["x"]);
        let id = fx.plant(0);

        let plant = fx.inventory.add_tags(&id, &["Y", "x"]).unwrap();
        assert_eq!(plant.tags, BTreeSet::from(["x".to_string(), "y".to_string()]));
        fx.inventory.drain_events();
        fx.inventory.add_tags(&id, &["y"]).unwrap();
        assert!(fx.inventory.drain_events().is_empty());

        let plant = fx.inventory.remove_tags(&id, &["x", "missing"]).unwrap();
        assert_eq!(plant.tags, BTreeSet::from(["y".to_string()]));
        assert!(fx.inventory.tags.plants_with("x").is_none());
        assert!(fx.inventory.check_integrity().is_clean());
    }

    #[test]
    fn test_delete_plant_does_not_cascade() {
        let mut fx = InventoryFixture::new()
            .with_shelf("温室棚A", 2, 3)
            .with_plants(&["grandparent", "parent", "pup1", "pup2"]);
        let (gp, parent, pup1, pup2) = (fx.plant(0), fx.plant(1), fx.plant(2), fx.plant(3));
        fx.inventory.set_parent(parent, Some(gp)).unwrap();
        fx.inventory.set_parent(pup1, Some(parent)).unwrap();
        fx.inventory.set_parent(pup2, Some(parent)).unwrap();
        fx.inventory.assign(parent, fx.shelf(0), 1, 1).unwrap();
        fx.inventory.drain_events();

        let removed = fx.inventory.delete_plant(&parent).unwrap();
        assert_eq!(removed.id, parent);

        assert!(fx.inventory.get_plant(&parent).is_err());
        assert!(fx.inventory.get_plant(&pup1).unwrap().is_root());
        assert!(fx.inventory.get_plant(&pup2).unwrap().is_root());
        assert!(fx.inventory.children(gp).unwrap().is_empty());
        assert_eq!(fx.inventory.occupancy(fx.shelf(0)).unwrap().occupied, 0);
        assert!(fx.inventory.check_integrity().is_clean());

        let events = fx.inventory.drain_events();
        assert_eq!(events.first().map(|e| e.kind), Some(EventKind::PlantUnplaced));
        assert_eq!(events.last().map(|e| e.kind), Some(EventKind::PlantDeleted));
        assert_eq!(
            events.iter().filter(|e| e.kind == EventKind::PlantParentChanged).count(),
            3
        );
    }

    #[test]
    fn test_delete_unknown_plant() {
        let mut inv = Inventory::new(InventorySettings::default());
        let err = inv.delete_plant(&PlantId::generate()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_create_shelf_validates_and_orders() {
        let mut inv = Inventory::new(InventorySettings::default());
        let a = inv.create_shelf(NewShelf::new("A", 2, 3), None).unwrap();
        let b = inv.create_shelf(NewShelf::new("B", 1, 1), None).unwrap();
        assert_eq!((a.order, b.order), (0, 1));

        for bad in [NewShelf::new("", 1, 1), NewShelf::new("x", 0, 1), NewShelf::new("x", 1, 0)] {
            let err = inv.create_shelf(bad, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(inv.list_shelves().len(), 2);
    }

    #[test]
    fn test_reorder_shelves_requires_permutation() {
        let mut fx = InventoryFixture::new()
            .with_shelf("A", 1, 1)
            .with_shelf("B", 1, 1)
            .with_shelf("C", 1, 1);
        let (a, b, c) = (fx.shelf(0), fx.shelf(1), fx.shelf(2));

        fx.inventory.reorder_shelves(&[c, a, b]).unwrap();
        let names: Vec<&str> = fx.inventory.list_shelves().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);

        for bad in [vec![a, b], vec![a, a, b], vec![a, b, ShelfId::generate()]] {
            let err = fx.inventory.reorder_shelves(&bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        let names: Vec<&str> = fx.inventory.list_shelves().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_update_shelf_renames_and_reorders() {
        let mut fx = InventoryFixture::new().with_shelf("A", 1, 1);
        let id = fx.shelf(0);
        let shelf = fx
            .inventory
            .update_shelf(&id, ShelfUpdate::default().name("温室棚A").order(5))
            .unwrap();
        assert_eq!(shelf.name, "温室棚A");
        assert_eq!(shelf.order, 5);
        let err = fx
            .inventory
            .update_shelf(&id, ShelfUpdate::default().name(" "))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_delete_shelf_requires_empty_shelf() {
        let mut fx = InventoryFixture::new().with_shelf("A", 2, 2).with_plants(&["p"]);
        let (shelf, plant) = (fx.shelf(0), fx.plant(0));
        fx.inventory.assign(plant, shelf, 1, 0).unwrap();

        let err = fx.inventory.delete_shelf(&shelf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WouldOrphanPlants);
        assert!(fx.inventory.get_shelf(&shelf).is_ok());

        fx.inventory.unassign(plant).unwrap();
        fx.inventory.delete_shelf(&shelf).unwrap();
        assert!(fx.inventory.get_shelf(&shelf).is_err());
        assert!(fx.inventory.check_integrity().is_clean());
    }

    #[test]
    fn test_placement_events() {
        let mut fx = InventoryFixture::new().with_shelf("A", 2, 3).with_plants(&["p"]);
        let (shelf, plant) = (fx.shelf(0), fx.plant(0));
        fx.inventory.drain_events();

        fx.inventory.assign(plant, shelf, 0, 0).unwrap();
        fx.inventory.assign(plant, shelf, 0, 0).unwrap();
        fx.inventory.move_plant(plant, shelf, 1, 2).unwrap();
        fx.inventory.unassign(plant).unwrap();
        fx.inventory.unassign(plant).unwrap();
        let _ = fx.inventory.assign(plant, shelf, 9, 9);

        assert_eq!(
            kinds(&fx.inventory.drain_events()),
            vec!["plant.placed", "plant.moved", "plant.unplaced"]
        );
    }

    #[test]
    fn test_resize_emits_only_on_change() {
        let mut fx = InventoryFixture::new().with_shelf("A", 2, 3);
        let shelf = fx.shelf(0);
        fx.inventory.drain_events();

        fx.inventory.resize_shelf(shelf, 2, 3).unwrap();
        let resized = fx.inventory.resize_shelf(shelf, 4, 4).unwrap();
        assert_eq!((resized.rows, resized.columns), (4, 4));
        assert_eq!(kinds(&fx.inventory.drain_events()), vec!["shelf.resized"]);
    }

    #[test]
    fn test_set_parent_to_current_parent_is_silent() {
        let mut fx = InventoryFixture::new().with_plants(&["parent", "child"]);
        let (parent, child) = (fx.plant(0), fx.plant(1));
        fx.inventory.set_parent(child, Some(parent)).unwrap();
        let stamp = fx.inventory.get_plant(&child).unwrap().updated_at;
        fx.inventory.drain_events();

        let change = fx.inventory.set_parent(child, Some(parent)).unwrap();
        assert_eq!(change, ParentChange::Unchanged);
        assert_eq!(fx.inventory.get_plant(&child).unwrap().updated_at, stamp);
        assert!(fx.inventory.drain_events().is_empty());
        assert_eq!(fx.inventory.root_of(child).unwrap(), parent);
        assert_eq!(fx.inventory.ancestors(child).unwrap().collect::<Vec<_>>(), vec![parent]);
    }

    #[test]
    fn test_search_through_inventory() {
        let mut fx = InventoryFixture::new();
        let a = fx
            .inventory
            .create_plant(
                NewPlant::new("Agave titanota").with_visibility(Visibility::Public),
                Some("alice"),
            )
            .unwrap();
        let b = fx.inventory.create_plant(NewPlant::new("Agave ferox"), Some("bob")).unwrap();

        let filters = SearchFilters::new()
            .query("agave")
            .sort(SortBy::Created, SortOrder::Asc);
        assert_eq!(fx.inventory.search(&filters, None).unwrap(), vec![a.id, b.id]);

        let mine = filters.clone().visibility(VisibilityFilter::Mine);
        assert_eq!(fx.inventory.search(&mine, Some("bob")).unwrap(), vec![b.id]);
        let public = filters.visibility(VisibilityFilter::Public);
        assert_eq!(fx.inventory.search(&public, None).unwrap(), vec![a.id]);
    }

    #[test]
    fn test_watering_schedule() {
        let mut fx = InventoryFixture::new().with_plants(&["a", "b", "c"]);
        let (a, b) = (fx.plant(0), fx.plant(1));
        let t0 = Utc::now();

        let watered = fx.inventory.record_watering(&a, t0).unwrap();
        assert_eq!(watered.care.last_watered, Some(t0));
        assert_eq!(watered.care.next_watering_due, Some(t0 + Duration::days(7)));
        fx.inventory.record_watering(&b, t0 - Duration::days(3)).unwrap();

        let due: Vec<PlantId> = fx
            .inventory
            .watering_due(t0 + Duration::days(7))
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(due, vec![b, a]);
        assert!(fx.inventory.watering_due(t0).is_empty());
        assert!(fx
            .inventory
            .drain_events()
            .iter()
            .any(|e| e.kind == EventKind::PlantWatered));
    }

    #[test]
    fn test_watering_out_of_date_range_is_an_error() {
        let settings = InventorySettings {
            watering_interval_days: 200_000_000,
            ..Default::default()
        };
        let mut fx = InventoryFixture::with_settings(settings).with_plants(&["a"]);
        let a = fx.plant(0);
        let err = fx.inventory.record_watering(&a, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let mut fx = InventoryFixture::new().with_plants(&["b"]);
        let b = fx.plant(0);
        let err = fx
            .inventory
            .record_watering(&b, DateTime::<Utc>::MAX_UTC)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(fx.inventory.get_plant(&b).unwrap().care.last_watered.is_none());
        assert!(fx
            .inventory
            .drain_events()
            .iter()
            .all(|e| e.kind != EventKind::PlantWatered));
    }

    #[test]
    fn test_create_shelf_rejects_oversized_grid() {
        let mut inv = Inventory::new(InventorySettings::default());
        let err = inv
            .create_shelf(NewShelf::new("wide", 1, u32::MAX), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(inv.list_shelves().is_empty());

        let shelf = inv.create_shelf(NewShelf::new("温室棚A", 2, 3), None).unwrap();
        let mut snapshot = inv.snapshot();
        snapshot.shelves[0].columns = u32::MAX;
        let err = Inventory::from_snapshot(snapshot, InventorySettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(inv.shelf_layout(shelf.id).unwrap().len(), 2);
    }

    #[test]
    fn test_lowered_tag_limit_still_loads_stored_tags() {
        let mut fx = InventoryFixture::new().with_tagged_plant("錦", &["ハオルチア・オブツーサ錦"]);
        let plant = fx.plant(0);
        let settings = InventorySettings {
            max_tag_length: 5,
            ..Default::default()
        };

        let mut restored = Inventory::from_snapshot(fx.inventory.snapshot(), settings).unwrap();
        assert!(restored
            .get_plant(&plant)
            .unwrap()
            .has_tag("ハオルチア・オブツーサ錦"));
        assert!(restored.check_integrity().is_clean());

        let err = restored.add_tags(&plant, &["アガベチタノタ"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        restored.add_tags(&plant, &["白鯨"]).unwrap();
    }

    #[test]
    fn test_snapshot_round_trip_rebuilds_indexes() {
        let mut fx = InventoryFixture::new()
            .with_shelf("温室棚A", 2, 3)
            .with_tagged_plant("白鯨", &["白鯨", "チタノタ"])
            .with_tagged_plant("子株", &["白鯨"]);
        let (shelf, parent, pup) = (fx.shelf(0), fx.plant(0), fx.plant(1));
        fx.inventory.assign(parent, shelf, 1, 2).unwrap();
        fx.inventory.set_parent(pup, Some(parent)).unwrap();

        let restored =
            Inventory::from_snapshot(fx.inventory.snapshot(), InventorySettings::default()).unwrap();
        assert_eq!(restored.occupant(&Position::new(shelf, 1, 2)), Some(parent));
        assert_eq!(restored.children(parent).unwrap(), vec![pup]);
        assert_eq!(restored.tag_counts(), fx.inventory.tag_counts());
        assert!(restored.check_integrity().is_clean());
    }

    #[test]
    fn test_from_snapshot_rejects_broken_records() {
        let mut fx = InventoryFixture::new().with_shelf("A", 1, 1).with_plants(&["a", "b"]);
        let shelf = fx.shelf(0);
        let mut snapshot = fx.inventory.snapshot();
        for plant in &mut snapshot.plants {
            plant.position = Some(Position::new(shelf, 0, 0));
        }
        let err = Inventory::from_snapshot(snapshot, InventorySettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        let mut snapshot = fx.inventory.snapshot();
        snapshot.plants[0].tags.insert("Upper".into());
        assert!(Inventory::from_snapshot(snapshot, InventorySettings::default()).is_err());

        let mut snapshot = fx.inventory.snapshot();
        snapshot.shelves[0].rows = 0;
        assert!(Inventory::from_snapshot(snapshot, InventorySettings::default()).is_err());

        let p0 = fx.plant(0);
        fx.inventory.entities.plant_mut(&p0).unwrap().parent_id = Some(p0);
        assert!(Inventory::from_snapshot(fx.inventory.snapshot(), InventorySettings::default()).is_err());
    }

    #[test]
    fn test_check_integrity_reports_drift() {
        let mut fx = InventoryFixture::new().with_shelf("A", 1, 1).with_plants(&["a"]);
        let (shelf, plant) = (fx.shelf(0), fx.plant(0));
        fx.inventory.entities.plant_mut(&plant).unwrap().position = Some(Position::new(shelf, 0, 0));
        let report = fx.inventory.check_integrity();
        assert!(!report.is_clean());
        assert!(report.issues[0].contains(&plant.to_string()));
    }
}
