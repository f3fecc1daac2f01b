// Pareto/ABC concentration analysis over a ranked aggregation.
use std::fmt;

/// Cumulative-share cutoffs, in percent. Inherited from the source model
/// (80/95) and kept as named constants; no alternate values are inferred.
pub const ABC_A_CUTOFF_PCT: f64 = 80.0;
pub const ABC_B_CUTOFF_PCT: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AbcClass::A => "A",
            AbcClass::B => "B",
            AbcClass::C => "C",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParetoEntry {
    pub entity_key: String,
    pub value: f64,
    /// Running share of the grand total; `None` when the total is zero so
    /// the table shows an explicit n/a instead of a propagated NaN.
    pub cumulative_share_pct: Option<f64>,
    pub abc_class: Option<AbcClass>,
}

/// Classify a ranked aggregation (already sorted descending by value, as
/// produced by the aggregation layer) into concentration classes.
pub fn classify(ranked: &[(String, f64)]) -> Vec<ParetoEntry> {
    let total: f64 = ranked.iter().map(|(_, v)| v).sum();
    let mut running = 0.0;
    ranked
        .iter()
        .map(|(key, value)| {
            running += value;
            let (share, class) = if total > 0.0 {
                let pct = 100.0 * running / total;
                let class = if pct <= ABC_A_CUTOFF_PCT {
                    AbcClass::A
                } else if pct <= ABC_B_CUTOFF_PCT {
                    AbcClass::B
                } else {
                    AbcClass::C
                };
                (Some(pct), Some(class))
            } else {
                (None, None)
            };
            ParetoEntry {
                entity_key: key.clone(),
                value: *value,
                cumulative_share_pct: share,
                abc_class: class,
            }
        })
        .collect()
}
