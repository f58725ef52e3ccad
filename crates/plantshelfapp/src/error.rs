use crate::model::{PlantId, Position, ShelfId};
use thiserror::Error;

/// Coarse classification of an [`InventoryError`], for callers that branch on the
/// kind of failure rather than on its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    OutOfBounds,
    CellOccupied,
    PlantAlreadyPlaced,
    SelfParent,
    CycleDetected,
    WouldOrphanPlants,
    InvalidArgument,
    Storage,
}

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Plant not found: {0}")]
    PlantNotFound(PlantId),

    #[error("Shelf not found: {0}")]
    ShelfNotFound(ShelfId),

    #[error("No {what} matches '{prefix}'")]
    NoMatch { what: &'static str, prefix: String },

    #[error("Plant {0} is not placed on any shelf")]
    NotPlaced(PlantId),

    #[error("Cell ({row}, {column}) is outside shelf {shelf_id} ({rows}x{columns})")]
    OutOfBounds {
        shelf_id: ShelfId,
        row: u32,
        column: u32,
        rows: u32,
        columns: u32,
    },

    #[error("Cell {position} is already occupied by plant {occupant}")]
    CellOccupied {
        position: Position,
        occupant: PlantId,
    },

    #[error("Plant {plant_id} is already placed at {position}; move it instead")]
    PlantAlreadyPlaced {
        plant_id: PlantId,
        position: Position,
    },

    #[error("Plant {0} cannot be its own parent")]
    SelfParent(PlantId),

    #[error("Making {parent} the parent of {child} would create a cycle")]
    CycleDetected { child: PlantId, parent: PlantId },

    #[error("Shelf {shelf_id} still holds {} plant(s) outside the requested bounds", plants.len())]
    WouldOrphanPlants {
        shelf_id: ShelfId,
        plants: Vec<PlantId>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl InventoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::PlantNotFound(_)
            | InventoryError::ShelfNotFound(_)
            | InventoryError::NoMatch { .. }
            | InventoryError::NotPlaced(_) => ErrorKind::NotFound,
            InventoryError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            InventoryError::CellOccupied { .. } => ErrorKind::CellOccupied,
            InventoryError::PlantAlreadyPlaced { .. } => ErrorKind::PlantAlreadyPlaced,
            InventoryError::SelfParent(_) => ErrorKind::SelfParent,
            InventoryError::CycleDetected { .. } => ErrorKind::CycleDetected,
            InventoryError::WouldOrphanPlants { .. } => ErrorKind::WouldOrphanPlants,
            InventoryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            InventoryError::Integrity(_)
            | InventoryError::Io(_)
            | InventoryError::Serialization(_)
            | InventoryError::Store(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        InventoryError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;
