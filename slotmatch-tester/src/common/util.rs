use chrono::Utc;
use num_traits::cast::cast;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a comma-separated seed list; hex seeds take a `0x` prefix.
pub fn parse_seeds(s: &str) -> anyhow::Result<Vec<u64>> {
    let tokens = split_csv(s);
    if tokens.is_empty() {
        anyhow::bail!("no seeds given in '{s}'");
    }
    tokens
        .iter()
        .map(|token| {
            let parsed = token.strip_prefix("0x").map_or_else(
                || token.parse::<u64>(),
                |hex| u64::from_str_radix(hex, 16),
            );
            parsed.map_err(|err| anyhow::anyhow!("invalid seed '{token}': {err}"))
        })
        .collect()
}

/// Share of `part` in `whole` as a percentage; zero when `whole` is zero.
#[must_use]
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let part = cast::<usize, f64>(part).unwrap_or(0.0);
    let whole = cast::<usize, f64>(whole).unwrap_or(1.0);
    part / whole * 100.0
}

/// UTC timestamp stamped onto written reports.
#[must_use]
pub fn report_stamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
