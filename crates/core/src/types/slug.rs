//! Public creator handles.

use core::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Error returned when a slug cannot be produced or parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("slug would be empty (name has no ASCII letters or digits)")]
    Empty,
    #[error("slug may only contain lowercase ASCII letters and digits")]
    InvalidCharacter,
}

/// URL handle of a creator's public page (`/podcast/{slug}`).
///
/// Derived from the display name: decomposed to NFD, accents dropped,
/// lowercased, and everything outside `[a-z0-9]` removed. "José Núñez"
/// becomes `josenunez`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Build a slug from a display name.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] when nothing usable is left.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let slug: String = name
            .nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .filter(char::is_ascii_alphanumeric)
            .collect();

        if slug.is_empty() {
            return Err(SlugError::Empty);
        }
        Ok(Self(slug))
    }

    /// Accept an already-derived slug (from a URL or the database).
    ///
    /// # Errors
    ///
    /// Returns an error when the value is empty or not in canonical form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}
