use anyhow::Result;
use regex::Regex;
use slotmatch_game::{Device, Mode, SessionEngine, StaticCatalog, VariantId};
use std::fmt;

pub mod catalog;

/// Shared inputs for one diagnostic run.
pub struct ScenarioCtx<'a> {
    pub engine: &'a SessionEngine<StaticCatalog>,
    /// Restricts combinations to labels matching this pattern.
    pub filter: Option<&'a Regex>,
}

impl ScenarioCtx<'_> {
    pub const fn catalog(&self) -> &StaticCatalog {
        self.engine.source()
    }

    /// Every portal/device/mode/variant combination the catalog can serve,
    /// the portal default (`None`) first.
    pub fn combos(&self) -> Vec<Combo> {
        let catalog = self.catalog();
        let mut combos = Vec::new();
        for (portal, device, mode) in catalog.layout_keys() {
            let variants =
                std::iter::once(None).chain(catalog.variants_for(&portal).into_iter().map(Some));
            for variant in variants {
                let combo = Combo {
                    portal: portal.clone(),
                    device,
                    mode,
                    variant,
                };
                if self.filter.is_none_or(|re| re.is_match(&combo.to_string())) {
                    combos.push(combo);
                }
            }
        }
        combos
    }
}

/// One resolvable request shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combo {
    pub portal: String,
    pub device: Device,
    pub mode: Mode,
    pub variant: Option<VariantId>,
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = self.variant.as_ref().map_or("default", VariantId::as_str);
        write!(f, "{}:{}:{}:{}", self.portal, self.device, self.mode, variant)
    }
}

/// Findings that do not fail a scenario.
pub type Notes = Vec<String>;

pub type ScenarioCheck = fn(&ScenarioCtx<'_>, u64) -> Result<Notes>;

#[derive(Clone, Copy)]
pub struct DiagnosticScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Seed-independent scenarios run once per seed list.
    pub seeded: bool,
    check: ScenarioCheck,
}

impl DiagnosticScenario {
    pub const fn new(
        key: &'static str,
        name: &'static str,
        description: &'static str,
        check: ScenarioCheck,
    ) -> Self {
        Self {
            key,
            name,
            description,
            seeded: true,
            check,
        }
    }

    #[must_use]
    pub const fn unseeded(self) -> Self {
        Self {
            seeded: false,
            ..self
        }
    }

    pub fn run(&self, ctx: &ScenarioCtx<'_>, seed: u64) -> Result<Notes> {
        (self.check)(ctx, seed)
    }
}

impl fmt::Debug for DiagnosticScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticScenario")
            .field("key", &self.key)
            .field("seeded", &self.seeded)
            .finish_non_exhaustive()
    }
}

pub fn get_scenario(name: &str) -> Option<DiagnosticScenario> {
    let key = match name.to_lowercase().as_str() {
        "smoke" => "smoke",
        "duplicates" | "distinct" => "duplicates",
        "cell-count" | "cells" => "cell-count",
        "variant-disagreement" | "variants" => "variant-disagreement",
        "determinism" | "deterministic" => "determinism",
        _ => return None,
    };
    catalog::catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog::catalog_scenarios()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}
