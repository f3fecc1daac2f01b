// Profitability metrics over an arbitrary subset. Per-line cost, profit and
// margin are derived once at load time; this module only aggregates them.
use crate::types::OrderLine;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfitSummary {
    /// Σ order_value over lines where it is present.
    pub total_revenue: f64,
    /// Σ gross_profit; `None` when no line carries a profit figure (cost
    /// column absent), which is distinct from a profit of zero.
    pub total_profit: Option<f64>,
    /// `100 * total_profit / total_revenue`; `None` when revenue <= 0 or
    /// profit is unknown.
    pub weighted_margin_pct: Option<f64>,
    /// Share of lines with positive gross profit; `None` for an empty
    /// subset — an explicit no-data marker, not 0%.
    pub pct_profitable_lines: Option<f64>,
}

pub fn summarize(lines: &[OrderLine]) -> ProfitSummary {
    let total_revenue: f64 = lines.iter().filter_map(|l| l.order_value).sum();
    let profits: Vec<f64> = lines.iter().filter_map(|l| l.gross_profit).collect();
    let total_profit = if profits.is_empty() {
        None
    } else {
        Some(profits.iter().sum())
    };
    let weighted_margin_pct = match total_profit {
        Some(p) if total_revenue > 0.0 => Some(100.0 * p / total_revenue),
        _ => None,
    };
    let pct_profitable_lines = if lines.is_empty() {
        None
    } else {
        let profitable = lines
            .iter()
            .filter(|l| matches!(l.gross_profit, Some(p) if p > 0.0))
            .count();
        Some(100.0 * profitable as f64 / lines.len() as f64)
    };
    ProfitSummary {
        total_revenue,
        total_profit,
        weighted_margin_pct,
        pct_profitable_lines,
    }
}

/// Lines sold below cost, exposed for inspection. They stay inside every
/// aggregate unless the caller excludes them with an explicit filter.
pub fn negative_margin_lines(lines: &[OrderLine]) -> Vec<OrderLine> {
    lines
        .iter()
        .filter(|l| matches!(l.gross_profit, Some(p) if p < 0.0))
        .cloned()
        .collect()
}
