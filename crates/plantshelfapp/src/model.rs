//! # Domain Model
//!
//! This module defines the records tracked by the inventory: [`Plant`] and [`Shelf`],
//! the [`Position`] that ties one to the other, and the input types used to create
//! and update them.
//!
//! ## Relationships
//!
//! ```text
//! Shelf (rows × columns grid)
//!   └── cell (row, column) ──► at most one Plant
//!
//! Plant ──parent_id──► Plant   (vegetative propagation, forest)
//! ```
//!
//! - `Plant::position` is the plant → cell half of the placement mapping. The
//!   cell → plant half lives in [`crate::grid::PlacementGrid`]; both are only ever
//!   changed together by the grid manager.
//! - `Plant::parent_id` is the single source of truth for lineage. There is no
//!   stored `children` list: children are a reverse index kept by
//!   [`crate::lineage::LineageGraph`].
//! - `Plant::tags` is always a normalized set (see [`crate::tags`]).
//!
//! Callers never build `Plant` or `Shelf` directly; they pass [`NewPlant`] /
//! [`NewShelf`] to the inventory, which assigns ids and timestamps.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

entity_id!(
    /// Stable identifier of a [`Plant`].
    PlantId
);
entity_id!(
    /// Stable identifier of a [`Shelf`].
    ShelfId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visibility '{0}' (expected 'public' or 'private')")]
pub struct UnknownVisibility(pub String);

impl FromStr for Visibility {
    type Err = UnknownVisibility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(UnknownVisibility(s.to_string())),
        }
    }
}

/// One cell address: `(shelf, row, column)`, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub shelf_id: ShelfId,
    pub row: u32,
    pub column: u32,
}

impl Position {
    pub fn new(shelf_id: ShelfId, row: u32, column: u32) -> Self {
        Self {
            shelf_id,
            row,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{},{}]", self.shelf_id, self.row, self.column)
    }
}

/// An image reference. The URI is owned by the media collaborator and stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantImage {
    pub uri: String,
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub memo: Option<String>,
}

impl PlantImage {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            captured_at: None,
            memo: None,
        }
    }
}

/// Care and provenance data. Opaque to placement and lineage; consumed by the
/// notification layer through [`crate::inventory::Inventory::watering_due`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareMetadata {
    #[serde(default)]
    pub acquisition_date: Option<NaiveDate>,
    #[serde(default)]
    pub acquisition_source: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub last_watered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_watering_due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: PlantId,
    /// Identity handed in by the auth collaborator when the plant was created.
    #[serde(default)]
    pub owner_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub parent_id: Option<PlantId>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub images: Vec<PlantImage>,
    #[serde(default)]
    pub care: CareMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plant {
    pub fn is_placed(&self) -> bool {
        self.position.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    pub id: ShelfId,
    #[serde(default)]
    pub owner_id: Option<String>,
    pub name: String,
    pub rows: u32,
    pub columns: u32,
    /// Display ordering only.
    #[serde(default)]
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shelf {
    /// Whether `(row, column)` addresses a cell of this shelf.
    pub fn contains(&self, row: u32, column: u32) -> bool {
        row < self.rows && column < self.columns
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.columns)
    }
}

/// Input for creating a plant.
#[derive(Debug, Clone, Default)]
pub struct NewPlant {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// `None` falls back to the configured default visibility.
    pub visibility: Option<Visibility>,
    pub images: Vec<PlantImage>,
    pub care: CareMetadata,
}

impl NewPlant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_image(mut self, image: PlantImage) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_care(mut self, care: CareMetadata) -> Self {
        self.care = care;
        self
    }
}

/// Partial update of a plant. `None` fields are left untouched; `Some` fields replace.
#[derive(Debug, Clone, Default)]
pub struct PlantUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
    pub images: Option<Vec<PlantImage>>,
    pub care: Option<CareMetadata>,
}

impl PlantUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn images(mut self, images: Vec<PlantImage>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn care(mut self, care: CareMetadata) -> Self {
        self.care = Some(care);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.visibility.is_none()
            && self.images.is_none()
            && self.care.is_none()
    }
}

/// Input for creating a shelf. Dimensions are fixed here; change them later with `resize`.
#[derive(Debug, Clone)]
pub struct NewShelf {
    pub name: String,
    pub rows: u32,
    pub columns: u32,
    /// `None` appends the shelf after the current last one.
    pub order: Option<u32>,
}

impl NewShelf {
    pub fn new(name: impl Into<String>, rows: u32, columns: u32) -> Self {
        Self {
            name: name.into(),
            rows,
            columns,
            order: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShelfUpdate {
    pub name: Option<String>,
    pub order: Option<u32>,
}

impl ShelfUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }
}
