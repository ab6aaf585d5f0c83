//! Slotmatch Session Resolver
//!
//! Platform-agnostic core for the Slotmatch board game: assigns catalog
//! items to board slots under per-variant matching rules. Layout, pool and
//! portal data come from collaborators implementing [`CatalogSource`]; the
//! resolver itself is pure and keeps no state between calls.

pub mod catalog;
pub mod category;
pub mod compat;
pub mod config;
pub mod item;
pub mod layout;
pub mod matching;
pub mod resolver;
pub mod seed;
pub mod variant;

// Re-export commonly used types
pub use catalog::{BUNDLED_CATALOG, CatalogError, LayoutKey, StaticCatalog};
pub use category::{CategoryCode, CategoryCodeError, JOKER_CODES};
pub use compat::{compatibility_matrix, is_compatible, is_compatible_under};
pub use config::{PortalConfig, PortalConfigError};
pub use item::{Item, ItemId, ItemPool, PoolError};
pub use layout::{AcceptedCodes, Device, Layout, LayoutError, Mode, Slot};
pub use matching::{Assignment, SelectionStrategy, assign, preference_lists};
pub use resolver::{
    ErrorKind, InvariantViolation, ItemCountRange, LevelType, ResolutionError, ResolverCfg,
    SessionRequest, SessionResult, resolve, verify_session,
};
pub use variant::{CHOICE_RESERVING_VARIANT, MatchPolicy, VariantId, VariantIdError};

/// Trait for abstracting catalog loading operations
/// Storage-specific implementations should provide this
pub trait CatalogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a portal's session configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_portal(&self, portal_id: &str) -> Result<Option<PortalConfig>, Self::Error>;

    /// Load the slot layout for a portal on a device and mode
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_layout(
        &self,
        portal_id: &str,
        device: Device,
        mode: Mode,
    ) -> Result<Option<Layout>, Self::Error>;

    /// Load the candidate items for a portal, filtered by variant
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_candidate_pool(
        &self,
        portal_id: &str,
        variant: Option<&VariantId>,
    ) -> Result<ItemPool, Self::Error>;
}

/// Failure while building a session through a [`SessionEngine`].
#[derive(Debug, thiserror::Error)]
pub enum SessionEngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("catalog source failed: {0}")]
    Source(#[source] E),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl<E> SessionEngineError<E>
where
    E: std::error::Error + 'static,
{
    /// Resolver error class; source failures count as infeasible.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Source(_) => ErrorKind::Infeasible,
            Self::Resolution(err) => err.kind(),
        }
    }
}

/// Session builder binding the resolver to a catalog source.
pub struct SessionEngine<S>
where
    S: CatalogSource,
{
    source: S,
}

impl<S> SessionEngine<S>
where
    S: CatalogSource,
{
    /// Create a new engine over the provided catalog source
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Borrow the underlying catalog source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Build a request from the portal's configuration.
    ///
    /// An explicit `variant` overrides the portal default.
    ///
    /// # Errors
    ///
    /// Returns an error if the portal is unknown or cannot be loaded.
    pub fn request_for(
        &self,
        portal_id: &str,
        device: Device,
        mode: Mode,
        variant: Option<VariantId>,
    ) -> Result<SessionRequest, SessionEngineError<S::Error>> {
        let portal = self.portal(portal_id)?;
        Ok(SessionRequest::for_portal(&portal, device, mode).with_variant(variant))
    }

    /// Resolve a request against the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read, the portal or layout
    /// is unknown, or the resolver rejects the request.
    pub fn resolve(
        &self,
        request: &SessionRequest,
    ) -> Result<SessionResult, SessionEngineError<S::Error>> {
        let portal = self.portal(&request.portal_id)?;
        let mut effective = request.clone();
        if effective.variant_id.is_none() {
            effective.variant_id.clone_from(&portal.default_variant);
        }

        let layout = self
            .source
            .load_layout(&request.portal_id, request.device, request.mode)
            .map_err(SessionEngineError::Source)?
            .ok_or_else(|| ResolutionError::UnknownLayout {
                portal: request.portal_id.clone(),
                device: request.device,
                mode: request.mode,
            })?;
        let pool = self
            .source
            .load_candidate_pool(&request.portal_id, effective.variant_id.as_ref())
            .map_err(SessionEngineError::Source)?;

        Ok(resolve(&effective, &layout, &pool, ResolverCfg::from(&portal))?)
    }

    fn portal(&self, portal_id: &str) -> Result<PortalConfig, SessionEngineError<S::Error>> {
        self.source
            .load_portal(portal_id)
            .map_err(SessionEngineError::Source)?
            .ok_or_else(|| ResolutionError::UnknownPortal(portal_id.to_string()).into())
    }
}
