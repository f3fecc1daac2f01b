// Groupby/aggregate pipelines behind every ranked table and the
// period-over-period KPIs.
use crate::types::OrderLine;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Group lines by `key` and sum `value` per group, sorted descending by sum.
///
/// Lines with an absent key are skipped; lines with an absent value still
/// count as members of their group but contribute nothing to the sum (absent
/// is excluded, never treated as zero). Ties keep first-encountered order,
/// which the stable sort preserves because groups are accumulated in
/// encounter order.
pub fn group_and_sum<K, V>(lines: &[OrderLine], key: K, value: V) -> Vec<(String, f64)>
where
    K: Fn(&OrderLine) -> Option<String>,
    V: Fn(&OrderLine) -> Option<f64>,
{
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, f64> = HashMap::new();
    for line in lines {
        let Some(k) = key(line) else { continue };
        if k.is_empty() {
            continue;
        }
        if !sums.contains_key(&k) {
            order.push(k.clone());
        }
        let entry = sums.entry(k).or_insert(0.0);
        if let Some(v) = value(line) {
            *entry += v;
        }
    }
    let mut result: Vec<(String, f64)> = order
        .into_iter()
        .map(|k| {
            let v = sums[&k];
            (k, v)
        })
        .collect();
    result.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    result
}

/// Revenue per `"YYYY-MM"` month key, ascending chronologically. The string
/// key sorts lexicographically the same as it sorts in time.
pub fn monthly_revenue(lines: &[OrderLine]) -> Vec<(String, f64)> {
    let mut series = group_and_sum(
        lines,
        |l| l.month_key.map(|d| d.format("%Y-%m").to_string()),
        |l| l.order_value,
    );
    series.sort_by(|a, b| a.0.cmp(&b.0));
    series
}

/// Month-over-month revenue delta in percent, using the two most recent
/// distinct months. `None` with fewer than two months or a zero previous
/// month — an undefined delta is reported as such, never as 0%.
pub fn month_over_month(series: &[(String, f64)]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let prev = series[series.len() - 2].1;
    let curr = series[series.len() - 1].1;
    if prev == 0.0 {
        return None;
    }
    Some((curr - prev) / prev * 100.0)
}

/// Year-over-year delta: latest month against the same calendar month one
/// year earlier. `None` when that month is absent or zero.
pub fn year_over_year(series: &[(String, f64)]) -> Option<f64> {
    let (latest_key, latest_value) = series.last()?;
    let (year, month) = latest_key.split_once('-')?;
    let prior_key = format!("{}-{}", year.parse::<i32>().ok()? - 1, month);
    let prior = series.iter().find(|(k, _)| *k == prior_key)?.1;
    if prior == 0.0 {
        return None;
    }
    Some((latest_value - prior) / prior * 100.0)
}

/// Count of distinct non-empty values of `key` in the subset.
pub fn distinct_count<K>(lines: &[OrderLine], key: K) -> usize
where
    K: Fn(&OrderLine) -> &str,
{
    let set: HashSet<&str> = lines
        .iter()
        .map(|l| key(l))
        .filter(|s| !s.is_empty())
        .collect();
    set.len()
}

/// Distinct order count: unique non-empty order ids, falling back to the
/// line count when the sheet has no order-id column.
pub fn distinct_orders(lines: &[OrderLine], has_order_id: bool) -> usize {
    if has_order_id {
        distinct_count(lines, |l| l.order_id.as_str())
    } else {
        lines.len()
    }
}
