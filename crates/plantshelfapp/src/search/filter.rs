//! Search filters.
//!
//! [`SearchFilters`] expresses one query over the collection. All active filters
//! must match (AND logic). The result is an ordered list of plant ids; an empty
//! list is a normal answer, not an error.
//!
//! | Filter | Semantics |
//! |--------|-----------|
//! | `query` | case-insensitive substring of `name` or `description`; blank matches all |
//! | `tags` | plant must carry **every** listed tag (intersection) |
//! | `visibility` | `all`, `public`, or `my` (owned by the caller) |
//! | `sort_by` / `sort_order` | `updated`, `created`, `name`; ties by plant id ascending |

use super::index::TagIndex;
use crate::error::{InventoryError, Result};
use crate::model::{Plant, PlantId, Visibility};
use crate::store::entities::EntityStore;
use crate::tags::normalize_tags;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityFilter {
    #[default]
    All,
    Public,
    /// Plants owned by the caller. Requires a caller identity.
    #[serde(rename = "my")]
    Mine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Updated,
    Created,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub tags: Vec<String>,
    pub visibility: VisibilityFilter,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn visibility(mut self, visibility: VisibilityFilter) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }
}

/// Filters after validation and normalization.
struct PreparedFilters<'a> {
    needle: Option<String>,
    tags: BTreeSet<String>,
    visibility: VisibilityFilter,
    caller: Option<&'a str>,
}

impl<'a> PreparedFilters<'a> {
    fn new(filters: &SearchFilters, caller: Option<&'a str>, max_tag_len: usize) -> Result<Self> {
        let tags = normalize_tags(&filters.tags, max_tag_len)?;
        let caller = caller.map(str::trim).filter(|c| !c.is_empty());
        if filters.visibility == VisibilityFilter::Mine && caller.is_none() {
            return Err(InventoryError::invalid(
                "visibility 'my' requires a caller identity",
            ));
        }
        let needle = filters
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        Ok(Self {
            needle,
            tags,
            visibility: filters.visibility,
            caller,
        })
    }

    fn matches(&self, plant: &Plant) -> bool {
        let visible = match self.visibility {
            VisibilityFilter::All => true,
            VisibilityFilter::Public => plant.visibility == Visibility::Public,
            VisibilityFilter::Mine => plant.owner_id.as_deref() == self.caller,
        };
        if !visible {
            return false;
        }

        match &self.needle {
            None => true,
            Some(needle) => {
                plant.name.to_lowercase().contains(needle.as_str())
                    || plant.description.to_lowercase().contains(needle.as_str())
            }
        }
    }
}

fn compare(a: &Plant, b: &Plant, sort_by: SortBy, sort_order: SortOrder) -> Ordering {
    let primary = match sort_by {
        SortBy::Updated => a.updated_at.cmp(&b.updated_at),
        SortBy::Created => a.created_at.cmp(&b.created_at),
        SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    };
    let primary = match sort_order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Evaluates `filters` against the collection.
///
/// Fails with `InvalidArgument` when a filter tag is malformed or when
/// `visibility = my` is requested without a caller identity.
pub fn search(
    entities: &EntityStore,
    index: &TagIndex,
    filters: &SearchFilters,
    caller: Option<&str>,
    max_tag_len: usize,
) -> Result<Vec<PlantId>> {
    let prepared = PreparedFilters::new(filters, caller, max_tag_len)?;

    let mut hits: Vec<&Plant> = match index.matching_all(&prepared.tags) {
        Some(ids) => ids
            .iter()
            .filter_map(|id| entities.plant(id).ok())
            .filter(|plant| prepared.matches(plant))
            .collect(),
        None => entities.plants().filter(|plant| prepared.matches(plant)).collect(),
    };

    hits.sort_by(|a, b| compare(a, b, filters.sort_by, filters.sort_order));
    Ok(hits.into_iter().map(|plant| plant.id).collect())
}
