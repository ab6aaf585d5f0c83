//! Catalog items and the candidate pool handed to the resolver.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::category::CategoryCode;

/// Stable catalog identifier.
pub type ItemId = u32;

/// A picture/audio tile that can occupy a board slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "code")]
    pub category_code: CategoryCode,
    #[serde(default)]
    pub display_asset: String,
    #[serde(default)]
    pub audio_asset: String,
}

impl Item {
    /// Build an item with empty asset references.
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>, category_code: CategoryCode) -> Self {
        Self {
            id,
            name: name.into(),
            category_code,
            display_asset: String::new(),
            audio_asset: String::new(),
        }
    }

    #[must_use]
    pub fn with_assets(mut self, display: impl Into<String>, audio: impl Into<String>) -> Self {
        self.display_asset = display.into();
        self.audio_asset = audio.into();
        self
    }

    #[must_use]
    pub fn is_joker(&self) -> bool {
        self.category_code.is_joker()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("item id {id} appears more than once in the pool")]
    DuplicateId { id: ItemId },
}

/// Candidate items for one request, already filtered by portal and variant.
///
/// Ids are unique; pool order is preserved and is the resolver's tie-breaker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ItemPool {
    items: Vec<Item>,
}

impl ItemPool {
    /// Validate id uniqueness and wrap the items.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first repeated id.
    pub fn new(items: Vec<Item>) -> Result<Self, PoolError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id) {
                return Err(PoolError::DuplicateId { id: item.id });
            }
        }
        Ok(Self { items })
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// Items that take part in category matching, in pool order.
    pub fn real_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| !item.is_joker())
    }

    /// Filler items, in pool order.
    pub fn jokers(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.is_joker())
    }
}

impl<'a> IntoIterator for &'a ItemPool {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'de> Deserialize<'de> for ItemPool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let items = Vec::<Item>::deserialize(deserializer)?;
        Self::new(items).map_err(serde::de::Error::custom)
    }
}
