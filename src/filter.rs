// Filter engine: a conjunction of user-selected predicates applied to the
// loaded ledger. Pure — the source slice is never mutated and the result is
// always a fresh vector.
use crate::types::OrderLine;
use chrono::NaiveDate;

/// Explicit filter state threaded into [`apply`] as a value, replacing the
/// ambient sidebar state of the original dashboard. An unset member is a
/// no-op that matches every line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    /// Inclusive range compared against the month anchor (`month_key`).
    pub period: Option<(NaiveDate, NaiveDate)>,
    pub regions: Vec<String>,
    pub representatives: Vec<String>,
    pub states: Vec<String>,
    pub statuses: Vec<String>,
    /// Case-insensitive substring match on the customer name.
    pub customer_contains: String,
    /// Case-insensitive substring match on the SKU/item.
    pub item_contains: String,
    /// Keep only lines with a present, negative gross profit.
    pub negative_margin_only: bool,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        *self == FilterSet::default()
    }
}

/// Apply every set predicate (logical AND) and return the matching subset.
pub fn apply(lines: &[OrderLine], filters: &FilterSet) -> Vec<OrderLine> {
    lines
        .iter()
        .filter(|line| matches(line, filters))
        .cloned()
        .collect()
}

fn matches(line: &OrderLine, filters: &FilterSet) -> bool {
    if let Some((start, end)) = filters.period {
        // A line without a month anchor never matches a period filter.
        match line.month_key {
            Some(month) if month >= start && month <= end => {}
            _ => return false,
        }
    }
    if !member_of(&line.region, &filters.regions) {
        return false;
    }
    if !member_of(&line.representative, &filters.representatives) {
        return false;
    }
    if !member_of(&line.state, &filters.states) {
        return false;
    }
    if !member_of(&line.fulfillment_status, &filters.statuses) {
        return false;
    }
    if !contains_ci(&line.customer_name, &filters.customer_contains) {
        return false;
    }
    if !contains_ci(&line.item_sku, &filters.item_contains) {
        return false;
    }
    if filters.negative_margin_only && !matches!(line.gross_profit, Some(p) if p < 0.0) {
        return false;
    }
    true
}

fn member_of(value: &str, selection: &[String]) -> bool {
    selection.is_empty() || selection.iter().any(|s| s == value)
}

fn contains_ci(value: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    // An absent value never matches a non-empty query.
    if value.is_empty() {
        return false;
    }
    value.to_lowercase().contains(&query.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(customer: &str, region: &str, month: Option<NaiveDate>, profit: Option<f64>) -> OrderLine {
        OrderLine {
            customer_name: customer.to_string(),
            region: region.to_string(),
            month_key: month,
            gross_profit: profit,
            ..Default::default()
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<OrderLine> {
        vec![
            line("ACME Ltda", "Sul", Some(ymd(2024, 1, 1)), Some(10.0)),
            line("Beta Corp", "Norte", Some(ymd(2024, 2, 1)), Some(-5.0)),
            line("Gamma SA", "Sul", None, None),
        ]
    }

    #[test]
    fn empty_filter_set_matches_everything() {
        let data = sample();
        assert_eq!(apply(&data, &FilterSet::default()), data);
    }

    #[test]
    fn period_filter_is_inclusive_and_excludes_missing_months() {
        let data = sample();
        let filters = FilterSet {
            period: Some((ymd(2024, 1, 1), ymd(2024, 2, 1))),
            ..Default::default()
        };
        let subset = apply(&data, &filters);
        assert_eq!(subset.len(), 2);
        assert!(subset.iter().all(|l| l.month_key.is_some()));
    }

    #[test]
    fn categorical_and_text_filters_compose_with_and() {
        let data = sample();
        let filters = FilterSet {
            regions: vec!["Sul".to_string()],
            customer_contains: "acme".to_string(),
            ..Default::default()
        };
        let subset = apply(&data, &filters);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].customer_name, "ACME Ltda");
    }

    #[test]
    fn absent_value_never_matches_nonempty_query() {
        let data = vec![line("", "Sul", None, None)];
        let filters = FilterSet {
            customer_contains: "acme".to_string(),
            ..Default::default()
        };
        assert!(apply(&data, &filters).is_empty());
    }

    #[test]
    fn negative_margin_filter_requires_present_profit() {
        let data = sample();
        let filters = FilterSet {
            negative_margin_only: true,
            ..Default::default()
        };
        let subset = apply(&data, &filters);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].customer_name, "Beta Corp");
    }

    #[test]
    fn filtering_is_idempotent() {
        let data = sample();
        let filters = FilterSet {
            regions: vec!["Sul".to_string()],
            ..Default::default()
        };
        let once = apply(&data, &filters);
        let twice = apply(&once, &filters);
        assert_eq!(once, twice);
    }

    #[test]
    fn filtering_never_mutates_the_source() {
        let data = sample();
        let copy = data.clone();
        let filters = FilterSet {
            negative_margin_only: true,
            ..Default::default()
        };
        let _ = apply(&data, &filters);
        assert_eq!(data, copy);
    }
}
