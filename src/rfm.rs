// Customer RFM scoring: recency/frequency/monetary per customer, rank-based
// tertile scores and a rule-ordered segment label.
use crate::types::OrderLine;
use chrono::{Local, NaiveDate};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Number of equal-population rank buckets per dimension. The source model
/// fixes this at 3 (tertiles) with no documented business justification, so
/// it is kept as a named constant rather than an inferred alternative.
pub const RFM_BUCKETS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Champions,
    Loyal,
    AtRisk,
    Lost,
    Opportunities,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Segment::Champions => "Champions",
            Segment::Loyal => "Loyal",
            Segment::AtRisk => "At risk",
            Segment::Lost => "Lost",
            Segment::Opportunities => "Opportunities",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRfm {
    pub customer: String,
    pub last_order_date: Option<NaiveDate>,
    /// Distinct order identifiers; line count when the sheet has no order-id
    /// column.
    pub order_count: usize,
    pub total_value: f64,
    /// Reference date minus last order date; `None` when the customer has no
    /// parseable order date (scored as worst recency).
    pub recency_days: Option<i64>,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    pub total_score: u8,
    pub segment: Segment,
}

/// Score every distinct customer in the subset.
///
/// The reference date defaults to the maximum observed order date, or today
/// when the subset carries no dates at all. Output is sorted descending by
/// `(total_score, monetary, frequency)`.
pub fn score_customers(lines: &[OrderLine], reference_date: Option<NaiveDate>) -> Vec<CustomerRfm> {
    let reference = reference_date
        .or_else(|| lines.iter().filter_map(|l| l.order_date).max())
        .unwrap_or_else(|| Local::now().date_naive());

    struct Acc {
        last_date: Option<NaiveDate>,
        order_ids: HashSet<String>,
        line_count: usize,
        total_value: f64,
    }

    // Accumulate in first-encounter order so rank tie-breaking is stable.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Acc> = HashMap::new();
    for line in lines {
        if line.customer_name.is_empty() {
            continue;
        }
        if !groups.contains_key(&line.customer_name) {
            order.push(line.customer_name.clone());
        }
        let acc = groups.entry(line.customer_name.clone()).or_insert(Acc {
            last_date: None,
            order_ids: HashSet::new(),
            line_count: 0,
            total_value: 0.0,
        });
        acc.line_count += 1;
        if let Some(d) = line.order_date {
            acc.last_date = Some(acc.last_date.map_or(d, |prev| prev.max(d)));
        }
        if !line.order_id.is_empty() {
            acc.order_ids.insert(line.order_id.clone());
        }
        if let Some(v) = line.order_value {
            acc.total_value += v;
        }
    }

    let mut customers: Vec<CustomerRfm> = Vec::with_capacity(order.len());
    for name in &order {
        let acc = &groups[name];
        let recency_days = acc.last_date.map(|d| (reference - d).num_days());
        let order_count = if acc.order_ids.is_empty() {
            acc.line_count
        } else {
            acc.order_ids.len()
        };
        customers.push(CustomerRfm {
            customer: name.clone(),
            last_order_date: acc.last_date,
            order_count,
            total_value: acc.total_value,
            recency_days,
            r_score: 0,
            f_score: 0,
            m_score: 0,
            total_score: 0,
            segment: Segment::Opportunities,
        });
    }

    // Higher is better in every dimension, so recency enters negated.
    // A customer without dates gets the worst possible recency rank.
    let recency_values: Vec<f64> = customers
        .iter()
        .map(|c| c.recency_days.map_or(f64::NEG_INFINITY, |d| -(d as f64)))
        .collect();
    let frequency_values: Vec<f64> = customers.iter().map(|c| c.order_count as f64).collect();
    let monetary_values: Vec<f64> = customers.iter().map(|c| c.total_value).collect();

    let r_scores = tertile_scores(&recency_values);
    let f_scores = tertile_scores(&frequency_values);
    let m_scores = tertile_scores(&monetary_values);

    for (i, c) in customers.iter_mut().enumerate() {
        c.r_score = r_scores[i];
        c.f_score = f_scores[i];
        c.m_score = m_scores[i];
        c.total_score = c.r_score + c.f_score + c.m_score;
        c.segment = segment_for(c.r_score, c.f_score, c.m_score);
    }

    customers.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then(
                b.total_value
                    .partial_cmp(&a.total_value)
                    .unwrap_or(Ordering::Equal),
            )
            .then(b.order_count.cmp(&a.order_count))
    });
    customers
}

/// Rank-based equal-population bucketing into [`RFM_BUCKETS`] scores.
///
/// Values are rank-transformed with "first" ranking (ties broken by input
/// order) and cut at interpolated rank quantiles, right-closed. Score 1 is
/// worst, [`RFM_BUCKETS`] is best. When there are too few customers to form
/// buckets, everyone receives the middle score.
fn tertile_scores(values: &[f64]) -> Vec<u8> {
    let n = values.len();
    let middle = (RFM_BUCKETS as u8 + 1) / 2;
    if n < 2 {
        return vec![middle; n];
    }
    let mut idx: Vec<usize> = (0..n).collect();
    idx.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut ranks = vec![0usize; n];
    for (r, &i) in idx.iter().enumerate() {
        ranks[i] = r + 1;
    }
    let span = (n - 1) as f64;
    let edges: Vec<f64> = (1..RFM_BUCKETS)
        .map(|k| 1.0 + span * k as f64 / RFM_BUCKETS as f64)
        .collect();
    ranks
        .into_iter()
        .map(|rank| {
            let mut score = 1u8;
            for edge in &edges {
                if rank as f64 > *edge {
                    score += 1;
                }
            }
            score
        })
        .collect()
}

/// First matching rule wins, evaluated top to bottom.
fn segment_for(r: u8, f: u8, m: u8) -> Segment {
    if r >= 3 && f >= 3 && m >= 3 {
        Segment::Champions
    } else if f >= 3 && r >= 2 {
        Segment::Loyal
    } else if r == 1 && m >= 2 {
        Segment::AtRisk
    } else if r == 1 && f == 1 {
        Segment::Lost
    } else {
        Segment::Opportunities
    }
}
