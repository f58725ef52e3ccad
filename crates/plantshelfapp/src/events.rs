//! Change events for the notification layer.
//!
//! Every applied mutation appends one or more [`InventoryEvent`]s to the
//! inventory's outbox. Consumers drain the outbox after the mutation has been
//! published. Rejected operations and no-op successes emit nothing. Events are
//! not persisted.

use crate::grid::PlacementChange;
use crate::lineage::ParentChange;
use crate::model::{PlantId, ShelfId};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlantCreated,
    PlantUpdated,
    PlantDeleted,
    ShelfCreated,
    ShelfUpdated,
    ShelfResized,
    ShelfDeleted,
    PlantPlaced,
    PlantMoved,
    PlantUnplaced,
    PlantParentChanged,
    PlantWatered,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PlantCreated => "plant.created",
            EventKind::PlantUpdated => "plant.updated",
            EventKind::PlantDeleted => "plant.deleted",
            EventKind::ShelfCreated => "shelf.created",
            EventKind::ShelfUpdated => "shelf.updated",
            EventKind::ShelfResized => "shelf.resized",
            EventKind::ShelfDeleted => "shelf.deleted",
            EventKind::PlantPlaced => "plant.placed",
            EventKind::PlantMoved => "plant.moved",
            EventKind::PlantUnplaced => "plant.unplaced",
            EventKind::PlantParentChanged => "plant.parent_changed",
            EventKind::PlantWatered => "plant.watered",
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The record an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum EventSubject {
    Plant(PlantId),
    Shelf(ShelfId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub subject: EventSubject,
    pub occurred_at: DateTime<Utc>,
    pub data: Value,
}

impl InventoryEvent {
    pub fn plant(kind: EventKind, id: PlantId, occurred_at: DateTime<Utc>, data: Value) -> Self {
        Self {
            kind,
            subject: EventSubject::Plant(id),
            occurred_at,
            data,
        }
    }

    pub fn shelf(kind: EventKind, id: ShelfId, occurred_at: DateTime<Utc>, data: Value) -> Self {
        Self {
            kind,
            subject: EventSubject::Shelf(id),
            occurred_at,
            data,
        }
    }

    /// The event for an applied placement change, if it changed anything.
    pub fn from_placement(
        plant_id: PlantId,
        change: PlacementChange,
        occurred_at: DateTime<Utc>,
    ) -> Option<Self> {
        let (kind, data) = match change {
            PlacementChange::Unchanged => return None,
            PlacementChange::Placed(to) => (EventKind::PlantPlaced, json!({ "to": to })),
            PlacementChange::Moved { from, to } => {
                (EventKind::PlantMoved, json!({ "from": from, "to": to }))
            }
            PlacementChange::Unplaced(from) => (EventKind::PlantUnplaced, json!({ "from": from })),
        };
        Some(Self::plant(kind, plant_id, occurred_at, data))
    }

    pub fn from_parent_change(
        child: PlantId,
        change: ParentChange,
        occurred_at: DateTime<Utc>,
    ) -> Option<Self> {
        match change {
            ParentChange::Unchanged => None,
            ParentChange::Changed { old, new } => Some(Self::plant(
                EventKind::PlantParentChanged,
                child,
                occurred_at,
                json!({ "old": old, "new": new }),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    #[test]
    fn test_kind_names_are_dotted() {
        assert_eq!(EventKind::PlantParentChanged.as_str(), "plant.parent_changed");
        assert_eq!(EventKind::ShelfResized.as_str(), "shelf.resized");
    }

    #[test]
    fn test_unchanged_placement_emits_nothing() {
        let event = InventoryEvent::from_placement(PlantId::generate(), PlacementChange::Unchanged, Utc::now());
        assert!(event.is_none());
    }

    #[test]
    fn test_move_event_carries_both_cells() {
        let shelf = ShelfId::generate();
        let change = PlacementChange::Moved {
            from: Position::new(shelf, 0, 0),
            to: Position::new(shelf, 1, 2),
        };
        let event = InventoryEvent::from_placement(PlantId::generate(), change, Utc::now()).unwrap();
        assert_eq!(event.kind, EventKind::PlantMoved);
        assert_eq!(event.data["from"]["row"], 0);
        assert_eq!(event.data["to"]["column"], 2);
    }

    #[test]
    fn test_event_serializes_with_type_name() {
        let id = PlantId::generate();
        let event = InventoryEvent::plant(EventKind::PlantCreated, id, Utc::now(), Value::Null);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "plant.created");
        assert_eq!(json["subject"]["type"], "plant");
        assert_eq!(json["subject"]["id"], id.to_string());
    }
}
