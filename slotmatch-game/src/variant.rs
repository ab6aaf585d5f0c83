//! Named game variants and the matching policy each one selects.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Variant served to the youngest audience; reserves compound codes for
/// their dedicated choice slots.
pub const CHOICE_RESERVING_VARIANT: &str = "k1";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VariantIdError {
    #[error("variant id is empty")]
    Empty,
    #[error("variant id '{0}' must be lowercase letters, digits, '-' or '_'")]
    Malformed(String),
}

/// Identifier of a game variant such as `k1` or `t1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantId(String);

impl VariantId {
    /// # Errors
    ///
    /// Returns an error if the id is blank or carries unexpected characters.
    pub fn new(raw: &str) -> Result<Self, VariantIdError> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(VariantIdError::Empty);
        }
        let valid = id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid {
            return Err(VariantIdError::Malformed(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VariantId {
    type Error = VariantIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<VariantId> for String {
    fn from(value: VariantId) -> Self {
        value.0
    }
}

/// Matching rule family applied by the compatibility checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Prefix widening: a narrow item may fill a broader slot.
    #[default]
    Hierarchical,
    /// `k1` rules: root items match exactly, compound items defer to
    /// dedicated choice slots elsewhere on the board.
    ChoiceReserving,
}

impl MatchPolicy {
    /// Policy for an optional variant; unknown variants keep the default rule.
    #[must_use]
    pub fn for_variant(variant: Option<&VariantId>) -> Self {
        match variant {
            Some(id) if id.as_str() == CHOICE_RESERVING_VARIANT => Self::ChoiceReserving,
            _ => Self::Hierarchical,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hierarchical => "hierarchical",
            Self::ChoiceReserving => "choice_reserving",
        }
    }
}
