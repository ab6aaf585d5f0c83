//! Hierarchical category codes attached to catalog items and slots.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest code accepted at the catalog boundary.
pub const MAX_CODE_LEN: usize = 8;

/// Codes reserved for neutral filler items.
pub const JOKER_CODES: [&str; 2] = ["js", "z"];

/// Errors raised when a raw string is not a usable category code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CategoryCodeError {
    #[error("category code is empty")]
    Empty,
    #[error("category code '{code}' exceeds 8 characters")]
    TooLong { code: String },
    #[error("category code '{code}' contains '{ch}' (only lowercase letters and digits)")]
    InvalidChar { code: String, ch: char },
}

/// Short lowercase classifier forming an implicit prefix hierarchy.
///
/// `A` is an ancestor of `B` when `B` starts with `A` and the two differ.
/// The hierarchy is purely textual, so `s` (birds) also prefixes `sa`
/// (aviation) even though the catalog treats them as siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryCode(String);

impl CategoryCode {
    /// Validate and wrap a raw code. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty, too long, or has characters
    /// outside `[a-z0-9]`.
    pub fn new(raw: &str) -> Result<Self, CategoryCodeError> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(CategoryCodeError::Empty);
        }
        if code.len() > MAX_CODE_LEN {
            return Err(CategoryCodeError::TooLong {
                code: code.to_string(),
            });
        }
        if let Some(ch) = code
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        {
            return Err(CategoryCodeError::InvalidChar {
                code: code.to_string(),
                ch,
            });
        }
        Ok(Self(code.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the code.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Validated codes are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Single-character codes sit at the top of the hierarchy.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Filler codes are never matched by category rules.
    #[must_use]
    pub fn is_joker(&self) -> bool {
        JOKER_CODES.contains(&self.0.as_str())
    }

    /// True when `self` equals `other` or narrows it by prefix.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.0.starts_with(other.as_str())
    }

    /// Strict ancestry: `self` is a proper prefix of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self != other && other.starts_with(self)
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CategoryCode {
    type Error = CategoryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl TryFrom<&str> for CategoryCode {
    type Error = CategoryCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CategoryCode> for String {
    fn from(value: CategoryCode) -> Self {
        value.0
    }
}

impl std::str::FromStr for CategoryCode {
    type Err = CategoryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> CategoryCode {
        CategoryCode::new(raw).unwrap()
    }

    #[test]
    fn rejects_malformed_codes() {
        assert_eq!(CategoryCode::new("  "), Err(CategoryCodeError::Empty));
        assert!(matches!(
            CategoryCode::new("Sa"),
            Err(CategoryCodeError::InvalidChar { ch: 'S', .. })
        ));
        assert!(matches!(
            CategoryCode::new("abcdefghi"),
            Err(CategoryCodeError::TooLong { .. })
        ));
        assert_eq!(code(" rp ").as_str(), "rp");
    }

    #[test]
    fn ancestry_is_strict_prefix() {
        assert!(code("r").is_ancestor_of(&code("rp")));
        assert!(!code("rp").is_ancestor_of(&code("r")));
        assert!(!code("r").is_ancestor_of(&code("r")));
        // birds prefix aviation by coincidence of spelling
        assert!(code("s").is_ancestor_of(&code("sa")));
    }

    #[test]
    fn joker_and_root_flags() {
        assert!(code("js").is_joker());
        assert!(code("z").is_joker());
        assert!(!code("j").is_joker());
        assert!(code("h").is_root());
        assert!(!code("sa").is_root());
    }

    #[test]
    fn serde_validates_on_the_way_in() {
        let parsed: CategoryCode = serde_json::from_str("\"sa\"").unwrap();
        assert_eq!(parsed, code("sa"));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"sa\"");
        assert!(serde_json::from_str::<CategoryCode>("\"S!\"").is_err());
    }
}
