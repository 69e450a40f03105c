//! Segment slug value type.
//!
//! Slugs are non-empty identifiers of at most [`SLUG_MAX`] characters made
//! only of word characters (ASCII letters, digits, and underscores).

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum allowed length for a segment slug.
pub const SLUG_MAX: usize = 32;

/// Validation errors returned by [`SegmentSlug::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugValidationError {
    #[error("segment slug must not be empty")]
    Empty,
    #[error("segment slug must be at most {max} characters long")]
    TooLong { max: usize },
    #[error("segment slug may only contain letters, digits, or underscores")]
    InvalidCharacters,
}

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_regex() -> &'static Regex {
    SLUG_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        Regex::new("^[A-Za-z0-9_]+$")
            .unwrap_or_else(|error| panic!("slug regex failed to compile: {error}"))
    })
}

/// Human-readable unique segment name.
///
/// # Examples
/// ```
/// use segments::domain::SegmentSlug;
///
/// let slug = SegmentSlug::new("AVITO_VOICE_MESSAGES").expect("valid slug");
/// assert_eq!(slug.as_ref(), "AVITO_VOICE_MESSAGES");
/// assert!(SegmentSlug::new("voice messages").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SegmentSlug(String);

impl SegmentSlug {
    /// Validate and construct a [`SegmentSlug`].
    pub fn new(slug: impl Into<String>) -> Result<Self, SlugValidationError> {
        Self::from_owned(slug.into())
    }

    fn from_owned(slug: String) -> Result<Self, SlugValidationError> {
        if slug.is_empty() {
            return Err(SlugValidationError::Empty);
        }
        if slug.chars().count() > SLUG_MAX {
            return Err(SlugValidationError::TooLong { max: SLUG_MAX });
        }
        if !slug_regex().is_match(&slug) {
            return Err(SlugValidationError::InvalidCharacters);
        }
        Ok(Self(slug))
    }
}

impl AsRef<str> for SegmentSlug {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SegmentSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<SegmentSlug> for String {
    fn from(value: SegmentSlug) -> Self {
        value.0
    }
}

impl TryFrom<String> for SegmentSlug {
    type Error = SlugValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

impl TryFrom<&str> for SegmentSlug {
    type Error = SlugValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_owned(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a")]
    #[case("AVITO_DISCOUNT_50")]
    #[case("x".repeat(SLUG_MAX))]
    fn accepts_word_tokens(#[case] raw: String) {
        let slug = SegmentSlug::new(raw.clone()).expect("valid slug");
        assert_eq!(slug.as_ref(), raw);
    }

    #[rstest]
    #[case(String::new(), SlugValidationError::Empty)]
    #[case("x".repeat(SLUG_MAX + 1), SlugValidationError::TooLong { max: SLUG_MAX })]
    #[case("has-hyphen".to_owned(), SlugValidationError::InvalidCharacters)]
    #[case("has space".to_owned(), SlugValidationError::InvalidCharacters)]
    #[case("ünicode".to_owned(), SlugValidationError::InvalidCharacters)]
    fn rejects_invalid_slugs(#[case] raw: String, #[case] expected: SlugValidationError) {
        assert_eq!(SegmentSlug::new(raw), Err(expected));
    }
}
