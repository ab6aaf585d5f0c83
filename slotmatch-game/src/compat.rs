//! Slot compatibility rules.
//!
//! Pure functions deciding whether an item may occupy a slot under a
//! variant's matching policy, given every slot on the board.
use crate::item::Item;
use crate::layout::Slot;
use crate::variant::{MatchPolicy, VariantId};

/// Whether `item` may legally occupy `slot` for the given variant.
#[must_use]
pub fn is_compatible(
    slot: &Slot,
    item: &Item,
    variant: Option<&VariantId>,
    all_slots: &[Slot],
) -> bool {
    is_compatible_under(slot, item, MatchPolicy::for_variant(variant), all_slots)
}

/// Policy-level form of [`is_compatible`].
#[must_use]
pub fn is_compatible_under(
    slot: &Slot,
    item: &Item,
    policy: MatchPolicy,
    all_slots: &[Slot],
) -> bool {
    let code = &item.category_code;
    if code.is_joker() {
        return false;
    }
    if slot.accepts_exactly(code) {
        return true;
    }
    if slot.strict {
        return false;
    }
    let widens = slot
        .accepted_codes
        .iter()
        .any(|accepted| code.starts_with(accepted));

    match policy {
        MatchPolicy::Hierarchical => widens,
        MatchPolicy::ChoiceReserving => {
            // Choice slots and root items get exact matches only, and those
            // were handled above.
            if slot.single_code().is_none() || code.is_root() || !widens {
                return false;
            }
            let reserved = all_slots
                .iter()
                .any(|other| other.is_choice() && other.accepts_exactly(code));
            !reserved
        }
    }
}

/// Per slot, the indices into `items` that the slot may hold.
#[must_use]
pub fn compatibility_matrix(
    slots: &[Slot],
    items: &[&Item],
    policy: MatchPolicy,
) -> Vec<Vec<usize>> {
    slots
        .iter()
        .map(|slot| {
            items
                .iter()
                .enumerate()
                .filter(|(_, item)| is_compatible_under(slot, item, policy, slots))
                .map(|(index, _)| index)
                .collect()
        })
        .collect()
}
