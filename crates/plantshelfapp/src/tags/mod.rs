//! Tag support.
//!
//! Tags label plants for filtering. They are free-form (Japanese cultivar names
//! such as `白鯨` are the common case) but always stored in normalized form, so
//! the search index can compare them by exact match.
//!
//! ## Normalization
//!
//! See [`normalize`] for the full rules. In summary:
//! - Surrounding whitespace is trimmed
//! - Letters are lowercased (Unicode-aware)
//! - Empty, overlong, or control-character tags are rejected
//! - Duplicates collapse into one (a plant's tags are a set)

pub mod normalize;

use crate::error::InventoryError;

pub use normalize::{normalize_tag, normalize_tags, TagError, DEFAULT_MAX_TAG_LENGTH};

impl From<TagError> for InventoryError {
    fn from(err: TagError) -> Self {
        InventoryError::InvalidArgument(format!("invalid tag: {}", err))
    }
}
