//! # Search/Filter Index
//!
//! Discovery over the plant collection.
//!
//! - [`index::TagIndex`]: inverted index `tag → {plant ids}`, updated incrementally
//!   on every create, tag change and delete.
//! - [`filter::SearchFilters`]: the query contract (free text, required tags,
//!   visibility, sort) and [`filter::search`], which evaluates it.
//!
//! Tags are normalized at write time (see [`crate::tags`]) and the tags inside a
//! query are normalized the same way, so comparisons are exact matches.

pub mod filter;
pub mod index;

pub use filter::{search, SearchFilters, SortBy, SortOrder, VisibilityFilter};
pub use index::{TagCount, TagIndex};
