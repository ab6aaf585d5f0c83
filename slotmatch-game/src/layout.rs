//! Board layouts: ordered slots with accepted category codes.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

use crate::category::CategoryCode;

/// Accepted codes stored inline; choice slots rarely list more than two.
pub type AcceptedCodes = SmallVec<[CategoryCode; 2]>;

/// Client device class a layout is authored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Desktop,
    Mobile,
}

/// Board mode a layout is authored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Simple,
    Advanced,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desktop => write!(f, "desktop"),
            Self::Mobile => write!(f, "mobile"),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout has no slots")]
    Empty,
    #[error("slot {index} accepts no category codes")]
    EmptySlot { index: usize },
    #[error("slot {index} lists joker code '{code}'")]
    JokerCode { index: usize, code: CategoryCode },
    #[error("slot {index} lists code '{code}' twice")]
    DuplicateCode { index: usize, code: CategoryCode },
}

/// A board position and the codes it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(rename = "codes")]
    pub accepted_codes: AcceptedCodes,
    /// Exact matches only, whatever the variant.
    #[serde(default)]
    pub strict: bool,
}

impl Slot {
    #[must_use]
    pub fn new(codes: impl IntoIterator<Item = CategoryCode>) -> Self {
        Self {
            accepted_codes: codes.into_iter().collect(),
            strict: false,
        }
    }

    #[must_use]
    pub fn strict(codes: impl IntoIterator<Item = CategoryCode>) -> Self {
        Self {
            strict: true,
            ..Self::new(codes)
        }
    }

    #[must_use]
    pub fn accepts_exactly(&self, code: &CategoryCode) -> bool {
        self.accepted_codes.contains(code)
    }

    /// Slots offering more than one accepted code.
    #[must_use]
    pub fn is_choice(&self) -> bool {
        self.accepted_codes.len() > 1
    }

    /// The accepted code when the slot lists exactly one.
    #[must_use]
    pub fn single_code(&self) -> Option<&CategoryCode> {
        match self.accepted_codes.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    fn validate(&self, index: usize) -> Result<(), LayoutError> {
        if self.accepted_codes.is_empty() {
            return Err(LayoutError::EmptySlot { index });
        }
        for (pos, code) in self.accepted_codes.iter().enumerate() {
            if code.is_joker() {
                return Err(LayoutError::JokerCode {
                    index,
                    code: code.clone(),
                });
            }
            if self.accepted_codes[..pos].contains(code) {
                return Err(LayoutError::DuplicateCode {
                    index,
                    code: code.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Ordered slots for one portal/device/mode combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Layout {
    slots: Vec<Slot>,
}

impl Layout {
    /// Validate every slot and wrap them in layout order.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout is empty or any slot is malformed.
    pub fn new(slots: Vec<Slot>) -> Result<Self, LayoutError> {
        if slots.is_empty() {
            return Err(LayoutError::Empty);
        }
        for (index, slot) in slots.iter().enumerate() {
            slot.validate(index)?;
        }
        Ok(Self { slots })
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Keep the first `count` slots; a count past the end keeps everything.
    #[must_use]
    pub fn truncated(&self, count: usize) -> Self {
        let keep = count.clamp(1, self.slots.len());
        Self {
            slots: self.slots[..keep].to_vec(),
        }
    }

    /// Indices of choice slots listing `code` among their accepted codes.
    pub fn choice_slots_for<'a>(
        &'a self,
        code: &'a CategoryCode,
    ) -> impl Iterator<Item = usize> + 'a {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, slot)| slot.is_choice() && slot.accepts_exactly(code))
            .map(|(index, _)| index)
    }
}

impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let slots = Vec::<Slot>::deserialize(deserializer)?;
        Self::new(slots).map_err(serde::de::Error::custom)
    }
}
