//! Tag normalization.
//!
//! A normalized tag:
//! - Has no leading or trailing whitespace
//! - Is lowercase
//! - Is non-empty and at most `max_len` characters
//! - Contains no control characters

use std::collections::BTreeSet;

pub const DEFAULT_MAX_TAG_LENGTH: usize = 64;

/// Normalizes a single tag.
///
/// # Examples
/// ```
/// use plantshelfapp::tags::normalize::normalize_tag;
///
/// assert_eq!(normalize_tag("  Titanota ", 64).unwrap(), "titanota");
/// assert_eq!(normalize_tag("白鯨", 64).unwrap(), "白鯨");
///
/// assert!(normalize_tag("   ", 64).is_err());
/// assert!(normalize_tag("a\tb", 64).is_err());
/// ```
pub fn normalize_tag(raw: &str, max_len: usize) -> Result<String, TagError> {
    let tag = raw.trim().to_lowercase();
    if tag.is_empty() {
        return Err(TagError::Empty);
    }

    if let Some(ch) = tag.chars().find(|c| c.is_control()) {
        return Err(TagError::ControlCharacter(ch));
    }

    let len = tag.chars().count();
    if len > max_len {
        return Err(TagError::TooLong { len, max: max_len });
    }

    Ok(tag)
}

/// Normalizes a batch of tags into a set. Fails on the first invalid tag.
pub fn normalize_tags<I, S>(raw: I, max_len: usize) -> Result<BTreeSet<String>, TagError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|t| normalize_tag(t.as_ref(), max_len))
        .collect()
}

/// Error type for tag normalization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// Tag is empty after trimming
    #[error("tag cannot be empty")]
    Empty,
    /// Tag is longer than the configured maximum
    #[error("tag is {len} characters long, the maximum is {max}")]
    TooLong { len: usize, max: usize },
    /// Tag contains a control character (tab, newline, ...)
    #[error("tag contains control character {0:?}")]
    ControlCharacter(char),
}
