//! JSON-backed catalog implementing the session collaborators.
//!
//! Production deployments read portals, layouts and items from their own
//! storage; this catalog serves fixtures, tests and the diagnostics tester.
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;
use thiserror::Error;

use crate::CatalogSource;
use crate::config::{PortalConfig, PortalConfigError};
use crate::item::{Item, ItemPool, PoolError};
use crate::layout::{Device, Layout, Mode};
use crate::variant::VariantId;

/// Catalog shipped with the crate for smoke runs and tests.
pub const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Portal(#[from] PortalConfigError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("portal '{0}' defined twice")]
    DuplicatePortal(String),
    #[error("layout for '{portal}' on {device}/{mode} defined twice")]
    DuplicateLayout {
        portal: String,
        device: Device,
        mode: Mode,
    },
    #[error("layout references unknown portal '{0}'")]
    UnknownPortal(String),
}

/// `(portal, device, mode)` lookup key for layouts.
pub type LayoutKey = (String, Device, Mode);

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    portals: Vec<PortalConfig>,
    #[serde(default)]
    layouts: Vec<LayoutRecord>,
    #[serde(default)]
    items: Vec<ItemRecord>,
}

#[derive(Debug, Deserialize)]
struct LayoutRecord {
    portal: String,
    device: Device,
    mode: Mode,
    slots: Layout,
}

#[derive(Debug, Clone, Deserialize)]
struct ItemRecord {
    #[serde(flatten)]
    item: Item,
    /// Portals serving this item; empty means all.
    #[serde(default)]
    portals: Vec<String>,
    /// Variants serving this item; empty means all.
    #[serde(default)]
    variants: Vec<VariantId>,
}

impl ItemRecord {
    fn serves_portal(&self, portal_id: &str) -> bool {
        self.portals.is_empty() || self.portals.iter().any(|p| p == portal_id)
    }

    fn serves(&self, portal_id: &str, variant: Option<&VariantId>) -> bool {
        let variant_ok = self.variants.is_empty()
            || variant.is_some_and(|wanted| self.variants.contains(wanted));
        self.serves_portal(portal_id) && variant_ok
    }
}

/// In-memory catalog of portals, layouts and items.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    portals: Vec<PortalConfig>,
    layouts: HashMap<LayoutKey, Layout>,
    items: Vec<ItemRecord>,
}

impl StaticCatalog {
    /// Parse and validate a catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a portal range is invalid,
    /// item ids repeat, or portals/layouts are duplicated or dangling.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(json)?;

        let mut portals: Vec<PortalConfig> = Vec::with_capacity(doc.portals.len());
        for portal in doc.portals {
            portal.validate()?;
            if portals.iter().any(|known| known.id == portal.id) {
                return Err(CatalogError::DuplicatePortal(portal.id));
            }
            portals.push(portal);
        }

        let mut layouts = HashMap::with_capacity(doc.layouts.len());
        for record in doc.layouts {
            if !portals.iter().any(|p| p.id == record.portal) {
                return Err(CatalogError::UnknownPortal(record.portal));
            }
            let key = (record.portal, record.device, record.mode);
            if layouts.contains_key(&key) {
                let (portal, device, mode) = key;
                return Err(CatalogError::DuplicateLayout {
                    portal,
                    device,
                    mode,
                });
            }
            layouts.insert(key, record.slots);
        }

        // ids are unique across the whole catalog, not just per pool
        ItemPool::new(doc.items.iter().map(|record| record.item.clone()).collect())?;

        Ok(Self {
            portals,
            layouts,
            items: doc.items,
        })
    }

    /// The catalog compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled document fails validation.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    #[must_use]
    pub fn portals(&self) -> &[PortalConfig] {
        &self.portals
    }

    #[must_use]
    pub fn portal(&self, portal_id: &str) -> Option<&PortalConfig> {
        self.portals.iter().find(|p| p.id == portal_id)
    }

    #[must_use]
    pub fn layout(&self, portal_id: &str, device: Device, mode: Mode) -> Option<&Layout> {
        self.layouts.get(&(portal_id.to_string(), device, mode))
    }

    /// Every layout key, sorted by portal then device then mode.
    #[must_use]
    pub fn layout_keys(&self) -> Vec<LayoutKey> {
        let mut keys: Vec<LayoutKey> = self.layouts.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Variants a portal can be asked for: its default plus every variant
    /// an item serving the portal is restricted to.
    #[must_use]
    pub fn variants_for(&self, portal_id: &str) -> Vec<VariantId> {
        let mut ids: BTreeSet<String> = BTreeSet::new();
        if let Some(default) = self.portal(portal_id).and_then(|p| p.default_variant.as_ref()) {
            ids.insert(default.to_string());
        }
        for record in self.items.iter().filter(|r| r.serves_portal(portal_id)) {
            ids.extend(record.variants.iter().map(ToString::to_string));
        }
        ids.into_iter()
            .filter_map(|id| VariantId::new(&id).ok())
            .collect()
    }

    /// Items serving the portal and variant, in catalog order.
    #[must_use]
    pub fn candidate_pool(&self, portal_id: &str, variant: Option<&VariantId>) -> ItemPool {
        let items: Vec<Item> = self
            .items
            .iter()
            .filter(|record| record.serves(portal_id, variant))
            .map(|record| record.item.clone())
            .collect();
        // catalog ids were checked unique in `from_json`
        ItemPool::new(items).unwrap_or_default()
    }
}

impl CatalogSource for StaticCatalog {
    type Error = Infallible;

    fn load_portal(&self, portal_id: &str) -> Result<Option<PortalConfig>, Self::Error> {
        Ok(self.portal(portal_id).cloned())
    }

    fn load_layout(
        &self,
        portal_id: &str,
        device: Device,
        mode: Mode,
    ) -> Result<Option<Layout>, Self::Error> {
        Ok(self.layout(portal_id, device, mode).cloned())
    }

    fn load_candidate_pool(
        &self,
        portal_id: &str,
        variant: Option<&VariantId>,
    ) -> Result<ItemPool, Self::Error> {
        Ok(self.candidate_pool(portal_id, variant))
    }
}
