//! Session resolver: turns a layout and a candidate pool into a board.
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::config::PortalConfig;
use crate::item::{Item, ItemId, ItemPool};
use crate::layout::{Device, Layout, Mode, Slot};
use crate::matching::{SelectionStrategy, assign};
use crate::seed::shuffle_candidates;
use crate::variant::{MatchPolicy, VariantId};

/// Requested `[min, max]` number of real items.
///
/// Written as `{"min", "max"}`; read from that or a `[min, max]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RangeRepr")]
pub struct ItemCountRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RangeRepr {
    Pair(u32, u32),
    Bounds { min: u32, max: u32 },
}

impl From<RangeRepr> for ItemCountRange {
    fn from(repr: RangeRepr) -> Self {
        match repr {
            RangeRepr::Pair(min, max) | RangeRepr::Bounds { min, max } => Self::new(min, max),
        }
    }
}

impl ItemCountRange {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn exact(count: u32) -> Self {
        Self::new(count, count)
    }

    /// An exact range forbids filler items.
    #[must_use]
    pub const fn is_exact(self) -> bool {
        self.min == self.max
    }

    fn validate(self) -> Result<(), ResolutionError> {
        if self.min > self.max || self.max == 0 {
            return Err(ResolutionError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Inputs identifying one board to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub portal_id: String,
    pub device: Device,
    pub mode: Mode,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub item_count_range: ItemCountRange,
    /// Candidate order is shuffled with this seed when present.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SessionRequest {
    /// Request carrying the portal's configured range and default variant.
    #[must_use]
    pub fn for_portal(portal: &PortalConfig, device: Device, mode: Mode) -> Self {
        Self {
            portal_id: portal.id.clone(),
            device,
            mode,
            variant_id: portal.default_variant.clone(),
            item_count_range: ItemCountRange::new(portal.min_cells, portal.max_cells),
            seed: None,
        }
    }

    #[must_use]
    pub fn with_variant(mut self, variant: Option<VariantId>) -> Self {
        if variant.is_some() {
            self.variant_id = variant;
        }
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Which rule branch produced a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelType {
    /// Hierarchical matching, every slot holds a real item.
    Standard,
    /// `k1` matching, every slot holds a real item.
    ChoiceReserving,
    /// At least one slot holds a filler item.
    Padded,
}

impl LevelType {
    #[must_use]
    pub const fn for_session(policy: MatchPolicy, jokers: usize) -> Self {
        if jokers > 0 {
            return Self::Padded;
        }
        match policy {
            MatchPolicy::Hierarchical => Self::Standard,
            MatchPolicy::ChoiceReserving => Self::ChoiceReserving,
        }
    }
}

/// A resolved board: `items[i]` occupies `slots[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    #[serde(rename = "cells", alias = "slots")]
    pub slots: Vec<Slot>,
    pub items: Vec<Item>,
    pub level_type: LevelType,
    pub joker_count: usize,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SessionResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// Number of non-filler items placed.
    #[must_use]
    pub fn real_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_joker()).count()
    }
}

/// Error classes surfaced at the resolver boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing parameters; a client error.
    InvalidRequest,
    /// Catalog and layout cannot produce a valid board.
    Infeasible,
    /// The resolver built a corrupt result; a defect.
    InternalInvariant,
}

/// Post-condition failures caught before a result leaves the resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("{items} items for {slots} slots")]
    CountMismatch { slots: usize, items: usize },
    #[error("item id {id} placed more than once")]
    DuplicateId { id: ItemId },
    #[error("joker count recorded as {recorded} but {placed} placed")]
    JokerCount { recorded: usize, placed: usize },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("item count range invalid (min {min}, max {max})")]
    InvalidRange { min: u32, max: u32 },
    #[error("layout has {slots} slots but at least {min} items were requested")]
    LayoutTooSmall { slots: usize, min: u32 },
    #[error("unknown portal '{0}'")]
    UnknownPortal(String),
    #[error("no layout for portal '{portal}' on {device}/{mode}")]
    UnknownLayout {
        portal: String,
        device: Device,
        mode: Mode,
    },
    #[error("no compatible item for slots {unfilled:?} ({filled} of {required} filled)")]
    Infeasible {
        unfilled: Vec<usize>,
        filled: usize,
        required: usize,
    },
    #[error("{needed} filler items needed but only {available} in the pool")]
    JokersExhausted { needed: usize, available: usize },
    #[error("session invariant violated: {0}")]
    InternalInvariant(#[from] InvariantViolation),
}

impl ResolutionError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRange { .. }
            | Self::LayoutTooSmall { .. }
            | Self::UnknownPortal(_)
            | Self::UnknownLayout { .. } => ErrorKind::InvalidRequest,
            Self::Infeasible { .. } | Self::JokersExhausted { .. } => ErrorKind::Infeasible,
            Self::InternalInvariant(_) => ErrorKind::InternalInvariant,
        }
    }

    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidRequest)
    }

    #[must_use]
    pub const fn is_defect(&self) -> bool {
        matches!(self.kind(), ErrorKind::InternalInvariant)
    }
}

/// Resolver knobs taken from the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverCfg {
    pub allow_jokers: bool,
    pub strategy: SelectionStrategy,
}

impl From<&PortalConfig> for ResolverCfg {
    fn from(portal: &PortalConfig) -> Self {
        Self {
            allow_jokers: portal.allow_jokers,
            strategy: portal.strategy,
        }
    }
}

/// Assign distinct pool items to the layout's slots.
///
/// The slot count is `min(layout length, range max)`; extra slots are
/// dropped from the end of the layout. Slots no real item can fill are
/// padded with filler items only when the portal allows it, the range is
/// not exact, and at least `min` real items were placed.
///
/// # Errors
///
/// `InvalidRequest` kinds for bad ranges or a layout shorter than the
/// minimum, `Infeasible` kinds when the board cannot be filled, and
/// `InternalInvariant` if the post-condition check fails.
pub fn resolve(
    request: &SessionRequest,
    layout: &Layout,
    pool: &ItemPool,
    cfg: ResolverCfg,
) -> Result<SessionResult, ResolutionError> {
    let range = request.item_count_range;
    range.validate()?;
    let target = layout.len().min(range.max as usize);
    if target < range.min as usize {
        return Err(ResolutionError::LayoutTooSmall {
            slots: layout.len(),
            min: range.min,
        });
    }
    let board = layout.truncated(target);
    let policy = MatchPolicy::for_variant(request.variant_id.as_ref());

    let mut candidates: Vec<&Item> = pool.real_items().collect();
    if let Some(seed) = request.seed {
        shuffle_candidates(&mut candidates, seed);
    }

    let assignment = assign(board.slots(), &candidates, policy, cfg.strategy);
    let unfilled = assignment.unfilled_slots();
    let filled = assignment.filled();
    if !unfilled.is_empty() {
        let may_pad = cfg.allow_jokers && !range.is_exact() && filled >= range.min as usize;
        if !may_pad {
            warn!(
                "portal {} {}/{}: slots {:?} unfilled ({} of {} placed, policy {})",
                request.portal_id,
                request.device,
                request.mode,
                unfilled,
                filled,
                target,
                policy.label()
            );
            return Err(ResolutionError::Infeasible {
                unfilled,
                filled,
                required: target,
            });
        }
    }

    let mut jokers = pool.jokers();
    let mut items = Vec::with_capacity(target);
    for (index, entry) in assignment.slot_items.iter().enumerate() {
        if let Some(candidate) = entry {
            let item = candidates[*candidate];
            debug!("slot {index} <- item {} ({})", item.id, item.category_code);
            items.push(item.clone());
            continue;
        }
        let Some(joker) = jokers.next() else {
            return Err(ResolutionError::JokersExhausted {
                needed: unfilled.len(),
                available: pool.jokers().count(),
            });
        };
        debug!("slot {index} <- joker {}", joker.id);
        items.push(joker.clone());
    }

    let result = SessionResult {
        slots: board.slots().to_vec(),
        items,
        level_type: LevelType::for_session(policy, unfilled.len()),
        joker_count: unfilled.len(),
        variant_id: request.variant_id.clone(),
        seed: request.seed,
    };

    let verdict = verify_session(&result);
    debug_assert!(verdict.is_ok(), "resolver produced a corrupt session: {verdict:?}");
    if let Err(violation) = verdict {
        error!(
            "portal {} {}/{}: discarding corrupt session: {violation}",
            request.portal_id, request.device, request.mode
        );
        return Err(violation.into());
    }
    Ok(result)
}

/// Check the count, distinctness and filler invariants of a session.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn verify_session(result: &SessionResult) -> Result<(), InvariantViolation> {
    if result.items.len() != result.slots.len() {
        return Err(InvariantViolation::CountMismatch {
            slots: result.slots.len(),
            items: result.items.len(),
        });
    }
    let mut seen = HashSet::with_capacity(result.items.len());
    for item in &result.items {
        if !seen.insert(item.id) {
            return Err(InvariantViolation::DuplicateId { id: item.id });
        }
    }
    let placed = result.items.len() - result.real_count();
    if placed != result.joker_count {
        return Err(InvariantViolation::JokerCount {
            recorded: result.joker_count,
            placed,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryCode;

    fn code(raw: &str) -> CategoryCode {
        CategoryCode::new(raw).unwrap()
    }

    fn slot(codes: &[&str]) -> Slot {
        Slot::new(codes.iter().map(|c| code(c)))
    }

    fn layout(slots: &[&[&str]]) -> Layout {
        Layout::new(slots.iter().map(|codes| slot(codes)).collect()).unwrap()
    }

    fn pool(codes: &[&str]) -> ItemPool {
        ItemPool::new(
            codes
                .iter()
                .zip(1u32..)
                .map(|(raw, id)| Item::new(id, *raw, code(raw)))
                .collect(),
        )
        .unwrap()
    }

    fn request(min: u32, max: u32) -> SessionRequest {
        SessionRequest {
            portal_id: "zoo".to_string(),
            device: Device::Desktop,
            mode: Mode::Simple,
            variant_id: None,
            item_count_range: ItemCountRange::new(min, max),
            seed: None,
        }
    }

    fn padding() -> ResolverCfg {
        ResolverCfg {
            allow_jokers: true,
            strategy: SelectionStrategy::MaximumMatching,
        }
    }

    #[test]
    fn five_slot_board_is_a_bijection() {
        let board = layout(&[&["g"], &["r"], &["s"], &["sa"], &["h", "p"]]);
        let items = pool(&["g", "r", "s", "sa", "h"]);
        let result = resolve(&request(5, 5), &board, &items, ResolverCfg::default()).unwrap();
        let codes: Vec<&str> = result
            .items
            .iter()
            .map(|item| item.category_code.as_str())
            .collect();
        assert_eq!(codes, vec!["g", "r", "s", "sa", "h"]);
        assert_eq!(result.joker_count, 0);
        assert_eq!(result.level_type, LevelType::Standard);
    }

    #[test]
    fn exact_range_never_pads() {
        let board = layout(&[&["s"], &["s"], &["r"]]);
        let items = pool(&["s", "r", "js", "z"]);
        let err = resolve(&request(3, 3), &board, &items, padding()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infeasible);
        assert!(matches!(
            err,
            ResolutionError::Infeasible { ref unfilled, filled: 2, required: 3 } if unfilled == &vec![1]
        ));
    }

    #[test]
    fn open_range_pads_with_distinct_jokers() {
        let board = layout(&[&["s"], &["s"], &["s"], &["r"]]);
        let items = pool(&["s", "r", "js", "z"]);
        let result = resolve(&request(2, 4), &board, &items, padding()).unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result.joker_count, 2);
        assert_eq!(result.real_count(), 2);
        assert_eq!(result.level_type, LevelType::Padded);
        assert_eq!(result.item_ids(), vec![1, 3, 4, 2]);
    }

    #[test]
    fn padding_requires_portal_permission_and_minimum() {
        let board = layout(&[&["s"], &["s"], &["r"]]);
        let items = pool(&["s", "r", "js"]);
        let denied = resolve(&request(1, 3), &board, &items, ResolverCfg::default());
        assert!(matches!(denied, Err(ResolutionError::Infeasible { .. })));

        let short = resolve(&request(3, 4), &board, &items, padding());
        assert!(matches!(short, Err(ResolutionError::Infeasible { .. })));
    }

    #[test]
    fn running_out_of_jokers_is_infeasible() {
        let board = layout(&[&["s"], &["h"], &["p"]]);
        let items = pool(&["s", "js"]);
        let err = resolve(&request(1, 3), &board, &items, padding()).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::JokersExhausted {
                needed: 2,
                available: 1
            }
        );
        assert_eq!(err.kind(), ErrorKind::Infeasible);
    }

    #[test]
    fn invalid_ranges_are_client_errors() {
        let board = layout(&[&["s"]]);
        let items = pool(&["s"]);
        let inverted = resolve(&request(4, 2), &board, &items, ResolverCfg::default()).unwrap_err();
        assert!(inverted.is_client_error());
        let zero = resolve(&request(0, 0), &board, &items, ResolverCfg::default()).unwrap_err();
        assert!(matches!(zero, ResolutionError::InvalidRange { .. }));
        let too_small =
            resolve(&request(3, 5), &board, &items, ResolverCfg::default()).unwrap_err();
        assert_eq!(
            too_small,
            ResolutionError::LayoutTooSmall { slots: 1, min: 3 }
        );
    }

    #[test]
    fn long_layouts_are_cut_to_range_max() {
        let board = layout(&[&["g"], &["r"], &["s"], &["h"]]);
        let items = pool(&["g", "r", "s", "h"]);
        let result = resolve(&request(2, 3), &board, &items, ResolverCfg::default()).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.slots[2].accepted_codes[0], code("s"));
    }

    #[test]
    fn k1_variant_is_reported_in_level_type() {
        let board = layout(&[&["s"], &["sa", "r"]]);
        let items = pool(&["sa", "s"]);
        let mut req = request(2, 2);
        req.variant_id = Some(VariantId::new("k1").unwrap());
        let result = resolve(&req, &board, &items, ResolverCfg::default()).unwrap();
        assert_eq!(result.level_type, LevelType::ChoiceReserving);
        assert_eq!(result.items[0].category_code, code("s"));
        assert_eq!(result.items[1].category_code, code("sa"));
    }

    #[test]
    fn seeded_requests_are_reproducible() {
        let board = layout(&[&["s"], &["s"], &["r"]]);
        let items = pool(&["s", "sb", "sc", "sd", "r", "rp"]);
        let req = request(3, 3).with_seed(7);
        let first = resolve(&req, &board, &items, ResolverCfg::default()).unwrap();
        let second = resolve(&req, &board, &items, ResolverCfg::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.seed, Some(7));
    }

    #[test]
    fn verifier_flags_each_violation() {
        let board = layout(&[&["s"], &["r"]]);
        let items = pool(&["s", "r"]);
        let good = resolve(&request(2, 2), &board, &items, ResolverCfg::default()).unwrap();
        assert!(verify_session(&good).is_ok());

        let mut short = good.clone();
        short.items.pop();
        assert_eq!(
            verify_session(&short),
            Err(InvariantViolation::CountMismatch { slots: 2, items: 1 })
        );

        let mut duplicated = good.clone();
        duplicated.items[1] = duplicated.items[0].clone();
        assert_eq!(
            verify_session(&duplicated),
            Err(InvariantViolation::DuplicateId { id: 1 })
        );

        let mut miscounted = good;
        miscounted.joker_count = 1;
        assert!(matches!(
            verify_session(&miscounted),
            Err(InvariantViolation::JokerCount { recorded: 1, placed: 0 })
        ));
        let err = ResolutionError::from(InvariantViolation::DuplicateId { id: 9 });
        assert!(err.is_defect());
    }

    #[test]
    fn ranges_read_pairs_and_bounds() {
        let pair: ItemCountRange = serde_json::from_str("[2, 4]").unwrap();
        let bounds: ItemCountRange = serde_json::from_str(r#"{"min": 2, "max": 4}"#).unwrap();
        assert_eq!(pair, ItemCountRange::new(2, 4));
        assert_eq!(pair, bounds);
        assert_eq!(
            serde_json::to_value(pair).unwrap(),
            serde_json::json!({"min": 2, "max": 4})
        );
        assert!(serde_json::from_str::<ItemCountRange>("[2]").is_err());

        let req: SessionRequest = serde_json::from_str(
            r#"{"portal_id": "zoo", "device": "mobile", "mode": "simple",
                "item_count_range": [5, 5]}"#,
        )
        .unwrap();
        assert!(req.item_count_range.is_exact());
        assert_eq!(req.seed, None);
    }

    #[test]
    fn result_serializes_cells_for_the_client() {
        let board = layout(&[&["s"]]);
        let items = pool(&["s"]);
        let result = resolve(&request(1, 1), &board, &items, ResolverCfg::default()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["cells"][0]["codes"][0], "s");
        assert_eq!(json["level_type"], "standard");
        assert_eq!(json["items"][0]["code"], "s");
    }
}
