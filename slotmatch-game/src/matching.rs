//! Slot-to-item assignment over a compatibility graph.
//!
//! Slots are visited in layout order and each slot tries its candidates
//! most-specific first. The default strategy runs augmenting-path bipartite
//! matching so a full assignment is found whenever one exists; the greedy
//! strategy is the single-pass heuristic kept for comparison.
use serde::{Deserialize, Serialize};

use crate::compat::compatibility_matrix;
use crate::item::Item;
use crate::layout::Slot;
use crate::variant::MatchPolicy;

/// How slots are paired with candidate items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Augmenting-path maximum matching.
    #[default]
    MaximumMatching,
    /// One deterministic most-specific-first pass, no reassignment.
    Greedy,
}

/// Candidate index chosen for each slot, `None` where nothing fits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub slot_items: Vec<Option<usize>>,
}

impl Assignment {
    #[must_use]
    pub fn filled(&self) -> usize {
        self.slot_items.iter().filter(|entry| entry.is_some()).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slot_items.iter().all(Option::is_some)
    }

    /// Indices of slots left without an item.
    #[must_use]
    pub fn unfilled_slots(&self) -> Vec<usize> {
        self.slot_items
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.is_none().then_some(index))
            .collect()
    }
}

/// Sort key ranking how closely `item` fits `slot`: exact matches first,
/// then the smallest gap between the item code and the accepted prefix.
fn specificity_gap(slot: &Slot, item: &Item) -> usize {
    let code = &item.category_code;
    if slot.accepts_exactly(code) {
        return 0;
    }
    slot.accepted_codes
        .iter()
        .filter(|accepted| code.starts_with(accepted))
        .map(|accepted| code.len().saturating_sub(accepted.len()))
        .min()
        .unwrap_or(usize::MAX)
}

/// Compatible candidates per slot, most specific first, ties by pool order.
#[must_use]
pub fn preference_lists(
    slots: &[Slot],
    candidates: &[&Item],
    policy: MatchPolicy,
) -> Vec<Vec<usize>> {
    let mut lists = compatibility_matrix(slots, candidates, policy);
    for (slot, list) in slots.iter().zip(lists.iter_mut()) {
        list.sort_by_key(|&index| (specificity_gap(slot, candidates[index]), index));
    }
    lists
}

/// Pair slots with distinct candidates.
#[must_use]
pub fn assign(
    slots: &[Slot],
    candidates: &[&Item],
    policy: MatchPolicy,
    strategy: SelectionStrategy,
) -> Assignment {
    let prefs = preference_lists(slots, candidates, policy);
    let slot_items = match strategy {
        SelectionStrategy::Greedy => greedy(&prefs, candidates.len()),
        SelectionStrategy::MaximumMatching => maximum_matching(&prefs, candidates.len()),
    };
    Assignment { slot_items }
}

fn greedy(prefs: &[Vec<usize>], candidate_count: usize) -> Vec<Option<usize>> {
    let mut consumed = vec![false; candidate_count];
    prefs
        .iter()
        .map(|list| {
            let pick = list.iter().copied().find(|&index| !consumed[index]);
            if let Some(index) = pick {
                consumed[index] = true;
            }
            pick
        })
        .collect()
}

fn maximum_matching(prefs: &[Vec<usize>], candidate_count: usize) -> Vec<Option<usize>> {
    let mut owner: Vec<Option<usize>> = vec![None; candidate_count];
    let mut slot_items: Vec<Option<usize>> = vec![None; prefs.len()];
    for slot in 0..prefs.len() {
        let mut visited = vec![false; candidate_count];
        augment(slot, prefs, &mut visited, &mut owner, &mut slot_items);
    }
    slot_items
}

fn augment(
    slot: usize,
    prefs: &[Vec<usize>],
    visited: &mut [bool],
    owner: &mut [Option<usize>],
    slot_items: &mut [Option<usize>],
) -> bool {
    for &candidate in &prefs[slot] {
        if visited[candidate] {
            continue;
        }
        visited[candidate] = true;
        let free = match owner[candidate] {
            None => true,
            Some(holder) => augment(holder, prefs, visited, owner, slot_items),
        };
        if free {
            owner[candidate] = Some(slot);
            slot_items[slot] = Some(candidate);
            return true;
        }
    }
    false
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

    fn items(codes: &[&str]) -> Vec<Item> {
        codes
            .iter()
            .zip(1u32..)
            .map(|(raw, id)| Item::new(id, *raw, code(raw)))
            .collect()
    }

    #[test]
    fn exact_candidates_rank_ahead_of_descendants() {
        let slots = vec![slot(&["r"])];
        let pool = items(&["rpx", "rp", "r"]);
        let refs: Vec<&Item> = pool.iter().collect();
        let prefs = preference_lists(&slots, &refs, MatchPolicy::Hierarchical);
        assert_eq!(prefs, vec![vec![2, 1, 0]]);
    }

    #[test]
    fn matching_recovers_where_greedy_strands_a_slot() {
        // The broad slot comes first and greedily takes the only item the
        // narrow slot could use.
        let slots = vec![slot(&["r"]), slot(&["rp"])];
        let pool = items(&["rp", "rx"]);
        let refs: Vec<&Item> = pool.iter().collect();

        let greedy = assign(&slots, &refs, MatchPolicy::Hierarchical, SelectionStrategy::Greedy);
        assert_eq!(greedy.slot_items, vec![Some(0), None]);
        assert_eq!(greedy.unfilled_slots(), vec![1]);

        let full = assign(
            &slots,
            &refs,
            MatchPolicy::Hierarchical,
            SelectionStrategy::MaximumMatching,
        );
        assert!(full.is_complete());
        assert_eq!(full.slot_items, vec![Some(1), Some(0)]);
    }

    #[test]
    fn matching_reports_partial_fill_when_pool_is_short() {
        let slots = vec![slot(&["h"]), slot(&["h"]), slot(&["s"])];
        let pool = items(&["h", "s"]);
        let refs: Vec<&Item> = pool.iter().collect();
        let result = assign(
            &slots,
            &refs,
            MatchPolicy::Hierarchical,
            SelectionStrategy::MaximumMatching,
        );
        assert_eq!(result.filled(), 2);
        assert_eq!(result.unfilled_slots(), vec![1]);
    }

    #[test]
    fn matched_candidates_are_distinct() {
        let slots = vec![slot(&["s"]), slot(&["s"]), slot(&["s", "sa"])];
        let pool = items(&["sa", "s", "sb"]);
        let refs: Vec<&Item> = pool.iter().collect();
        let result = assign(
            &slots,
            &refs,
            MatchPolicy::Hierarchical,
            SelectionStrategy::MaximumMatching,
        );
        let mut chosen: Vec<usize> = result.slot_items.iter().flatten().copied().collect();
        chosen.sort_unstable();
        chosen.dedup();
        assert_eq!(chosen.len(), 3);
    }
}
