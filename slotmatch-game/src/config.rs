//! Per-portal session configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::SelectionStrategy;
use crate::variant::VariantId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortalConfigError {
    #[error("portal '{portal}' cell range inverted (min {min} > max {max})")]
    RangeInverted { portal: String, min: u32, max: u32 },
    #[error("portal '{portal}' allows zero cells")]
    ZeroCells { portal: String },
}

/// Settings a portal contributes to every session it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    pub id: String,
    #[serde(default = "PortalConfig::default_min_cells")]
    pub min_cells: u32,
    #[serde(default = "PortalConfig::default_max_cells")]
    pub max_cells: u32,
    /// Whether unfilled slots may be padded with filler items.
    #[serde(default)]
    pub allow_jokers: bool,
    /// Variant applied when a request does not name one.
    #[serde(default)]
    pub default_variant: Option<VariantId>,
    #[serde(default)]
    pub strategy: SelectionStrategy,
}

impl PortalConfig {
    const fn default_min_cells() -> u32 {
        5
    }

    const fn default_max_cells() -> u32 {
        5
    }

    /// Portal with the default exact five-cell range and no jokers.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            min_cells: Self::default_min_cells(),
            max_cells: Self::default_max_cells(),
            allow_jokers: false,
            default_variant: None,
            strategy: SelectionStrategy::default(),
        }
    }

    #[must_use]
    pub const fn with_cells(mut self, min: u32, max: u32) -> Self {
        self.min_cells = min;
        self.max_cells = max;
        self
    }

    #[must_use]
    pub const fn with_jokers(mut self, allow: bool) -> Self {
        self.allow_jokers = allow;
        self
    }

    /// Configured `[min, max]` cell range.
    #[must_use]
    pub const fn cell_range(&self) -> (u32, u32) {
        (self.min_cells, self.max_cells)
    }

    /// # Errors
    ///
    /// Returns an error if the cell range is inverted or allows zero cells.
    pub fn validate(&self) -> Result<(), PortalConfigError> {
        if self.min_cells > self.max_cells {
            return Err(PortalConfigError::RangeInverted {
                portal: self.id.clone(),
                min: self.min_cells,
                max: self.max_cells,
            });
        }
        if self.max_cells == 0 {
            return Err(PortalConfigError::ZeroCells {
                portal: self.id.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: PortalConfig = serde_json::from_str(r#"{"id": "zoo"}"#).unwrap();
        assert_eq!(cfg.cell_range(), (5, 5));
        assert!(!cfg.allow_jokers);
        assert_eq!(cfg.strategy, SelectionStrategy::MaximumMatching);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_ranges() {
        let inverted = PortalConfig::new("farm").with_cells(6, 4);
        assert!(matches!(
            inverted.validate(),
            Err(PortalConfigError::RangeInverted { min: 6, max: 4, .. })
        ));
        let empty = PortalConfig::new("farm").with_cells(0, 0);
        assert!(matches!(
            empty.validate(),
            Err(PortalConfigError::ZeroCells { .. })
        ));
    }

    #[test]
    fn parses_variant_and_strategy() {
        let cfg: PortalConfig = serde_json::from_str(
            r#"{"id": "tots", "min_cells": 3, "max_cells": 6, "allow_jokers": true,
                "default_variant": "k1", "strategy": "greedy"}"#,
        )
        .unwrap();
        assert_eq!(cfg.default_variant.as_ref().map(VariantId::as_str), Some("k1"));
        assert_eq!(cfg.strategy, SelectionStrategy::Greedy);
        assert!(cfg.allow_jokers);
    }
}
