use anyhow::{Context, Result, bail};
use log::debug;
use slotmatch_game::{
    CHOICE_RESERVING_VARIANT, ErrorKind, MatchPolicy, SessionEngineError, SessionRequest,
    SessionResult, VariantId, is_compatible_under,
};
use std::collections::HashSet;
use std::convert::Infallible;

use super::{Combo, DiagnosticScenario, Notes, ScenarioCtx};

pub fn catalog_scenarios() -> Vec<DiagnosticScenario> {
    vec![
        DiagnosticScenario::new(
            "smoke",
            "Smoke Test",
            "Every portal resolves at least one session",
            smoke_check,
        ),
        DiagnosticScenario::new(
            "duplicates",
            "Distinct Items",
            "No session places the same item id twice",
            duplicates_check,
        ),
        DiagnosticScenario::new(
            "cell-count",
            "Cell Count Agreement",
            "Item count equals slot count; exact ranges place no fillers",
            cell_count_check,
        ),
        DiagnosticScenario::new(
            "variant-disagreement",
            "Variant Disagreement",
            "Slot/item pairs where k1 and the default rules differ",
            variant_disagreement_check,
        )
        .unseeded(),
        DiagnosticScenario::new(
            "determinism",
            "Seeded Determinism",
            "The same request and seed resolve identically twice",
            determinism_check,
        ),
    ]
}

fn request(ctx: &ScenarioCtx<'_>, combo: &Combo, seed: u64) -> Result<SessionRequest> {
    let request = ctx
        .engine
        .request_for(&combo.portal, combo.device, combo.mode, combo.variant.clone())
        .with_context(|| format!("{combo}: building request"))?;
    Ok(request.with_seed(seed))
}

/// Resolve a combo; infeasible boards come back as `None` so the
/// caller can note them, every other error fails the scenario.
fn resolve(ctx: &ScenarioCtx<'_>, combo: &Combo, seed: u64) -> Result<Option<SessionResult>> {
    let request = request(ctx, combo, seed)?;
    match ctx.engine.resolve(&request) {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.kind() == ErrorKind::Infeasible => {
            debug!("{combo} seed {seed}: {err}");
            Ok(None)
        }
        Err(err) => Err(describe(combo, seed, &err)),
    }
}

fn describe(combo: &Combo, seed: u64, err: &SessionEngineError<Infallible>) -> anyhow::Error {
    anyhow::anyhow!("{combo} seed {seed}: {:?} error: {err}", err.kind())
}

fn smoke_check(ctx: &ScenarioCtx<'_>, seed: u64) -> Result<Notes> {
    let combos = ctx.combos();
    let mut resolved: HashSet<&str> = HashSet::new();
    for combo in &combos {
        if resolve(ctx, combo, seed)?.is_some() {
            resolved.insert(combo.portal.as_str());
        }
    }
    let portals: HashSet<&str> = combos.iter().map(|combo| combo.portal.as_str()).collect();
    anyhow::ensure!(!portals.is_empty(), "catalog has no layouts to resolve");
    let mut missing: Vec<&str> = portals.difference(&resolved).copied().collect();
    missing.sort_unstable();
    anyhow::ensure!(
        missing.is_empty(),
        "portals without any resolvable session: {}",
        missing.join(", ")
    );
    Ok(Vec::new())
}

fn duplicates_check(ctx: &ScenarioCtx<'_>, seed: u64) -> Result<Notes> {
    let mut notes = Vec::new();
    for combo in ctx.combos() {
        let Some(result) = resolve(ctx, &combo, seed)? else {
            notes.push(format!("{combo}: infeasible, skipped"));
            continue;
        };
        let mut seen = HashSet::with_capacity(result.items.len());
        for item in &result.items {
            if !seen.insert(item.id) {
                bail!("{combo} seed {seed}: item id {} placed twice", item.id);
            }
        }
    }
    Ok(notes)
}

fn cell_count_check(ctx: &ScenarioCtx<'_>, seed: u64) -> Result<Notes> {
    let mut notes = Vec::new();
    for combo in ctx.combos() {
        let exact = ctx
            .catalog()
            .portal(&combo.portal)
            .is_some_and(|portal| portal.min_cells == portal.max_cells);
        let Some(result) = resolve(ctx, &combo, seed)? else {
            notes.push(format!("{combo}: infeasible, skipped"));
            continue;
        };
        anyhow::ensure!(
            result.items.len() == result.slots.len(),
            "{combo} seed {seed}: {} items for {} cells",
            result.items.len(),
            result.slots.len()
        );
        if exact {
            anyhow::ensure!(
                result.joker_count == 0 && result.real_count() == result.len(),
                "{combo} seed {seed}: exact range padded with {} fillers",
                result.joker_count
            );
        }
    }
    Ok(notes)
}

fn variant_disagreement_check(ctx: &ScenarioCtx<'_>, _seed: u64) -> Result<Notes> {
    let catalog = ctx.catalog();
    let k1 = VariantId::new(CHOICE_RESERVING_VARIANT)?;
    let mut notes = Vec::new();
    for combo in ctx.combos() {
        // pairs only depend on the layout and pool, so one variant is enough
        if combo.variant.is_some() {
            continue;
        }
        let Some(layout) = catalog.layout(&combo.portal, combo.device, combo.mode) else {
            continue;
        };
        let pool = catalog.candidate_pool(&combo.portal, Some(&k1));
        let slots = layout.slots();
        for (index, slot) in slots.iter().enumerate() {
            for item in pool.real_items() {
                let default = is_compatible_under(slot, item, MatchPolicy::Hierarchical, slots);
                let reserved =
                    is_compatible_under(slot, item, MatchPolicy::ChoiceReserving, slots);
                if slot.accepts_exactly(&item.category_code) && !(default && reserved) {
                    bail!(
                        "{combo}: slot {index} rejects exact item {} ({})",
                        item.id,
                        item.category_code
                    );
                }
                if default != reserved {
                    let codes: Vec<&str> =
                        slot.accepted_codes.iter().map(|code| code.as_str()).collect();
                    let holders: Vec<usize> =
                        layout.choice_slots_for(&item.category_code).collect();
                    notes.push(format!(
                        "{}:{}:{} slot {index} [{}] item {} ({}): default={default} k1={reserved} reserved_by={holders:?}",
                        combo.portal,
                        combo.device,
                        combo.mode,
                        codes.join(","),
                        item.id,
                        item.category_code
                    ));
                }
            }
        }
    }
    Ok(notes)
}

fn determinism_check(ctx: &ScenarioCtx<'_>, seed: u64) -> Result<Notes> {
    for combo in ctx.combos() {
        let first = resolve(ctx, &combo, seed)?;
        let second = resolve(ctx, &combo, seed)?;
        let first_json = serde_json::to_string(&first)?;
        let second_json = serde_json::to_string(&second)?;
        anyhow::ensure!(
            first == second && first_json == second_json,
            "{combo} seed {seed}: repeated resolution differs"
        );
    }
    Ok(Vec::new())
}
