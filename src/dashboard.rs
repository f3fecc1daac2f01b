// Dashboard assembly: one pure function from (ledger, capabilities,
// filters) to every KPI and table the presentation layer renders. Nothing
// here touches widgets or I/O, so the whole pipeline is testable and the
// front-end choice stays decoupled.
use crate::aggregate::{
    distinct_count, distinct_orders, group_and_sum, month_over_month, monthly_revenue,
    year_over_year,
};
use crate::filter::{apply, FilterSet};
use crate::pareto::{classify, ParetoEntry};
use crate::profit::{negative_margin_lines, summarize, ProfitSummary};
use crate::rfm::{score_customers, CustomerRfm};
use crate::types::{ColumnCapabilities, Kpi, KpiFormat, OrderLine};
use crate::util::{average, median};
use chrono::NaiveDate;

pub const TOP_CUSTOMERS: usize = 15;
pub const TOP_SKUS: usize = 15;
pub const TOP_REPRESENTATIVES: usize = 20;

/// Lead-time distribution over lines where both dates parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadTimeSummary {
    pub count: usize,
    pub mean_days: f64,
    pub median_days: f64,
    pub min_days: i64,
    pub max_days: i64,
}

/// Delivery-SLA view: late vs on-time distinct orders plus the line-level
/// late share.
#[derive(Debug, Clone, PartialEq)]
pub struct SlaSummary {
    pub late_orders: usize,
    pub on_time_orders: usize,
    pub pct_late: Option<f64>,
}

/// Everything a render pass needs, computed fresh from the filtered subset.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub kpis: Vec<Kpi>,
    pub profit: ProfitSummary,
    pub monthly_revenue: Vec<(String, f64)>,
    pub top_customers: Vec<(String, f64)>,
    pub top_skus: Vec<(String, f64)>,
    pub revenue_by_representative: Vec<(String, f64)>,
    pub revenue_by_state: Vec<(String, f64)>,
    pub lead_time: Option<LeadTimeSummary>,
    pub sla: Option<SlaSummary>,
    pub rfm: Vec<CustomerRfm>,
    pub customer_pareto: Vec<ParetoEntry>,
    pub sku_pareto: Vec<ParetoEntry>,
    pub negative_margin: Vec<OrderLine>,
    pub subset_rows: usize,
}

/// Run the full pipeline: filter, aggregate, score. Features whose columns
/// are absent produce `None` KPIs or empty tables; they never fail.
pub fn compute_dashboard(
    lines: &[OrderLine],
    caps: &ColumnCapabilities,
    filters: &FilterSet,
    reference_date: Option<NaiveDate>,
) -> Dashboard {
    let subset = apply(lines, filters);
    let profit = summarize(&subset);

    let revenue = |l: &OrderLine| l.order_value;
    let customer_revenue = if caps.has_customer && caps.has_order_value {
        group_and_sum(&subset, |l| Some(l.customer_name.clone()), revenue)
    } else {
        Vec::new()
    };
    let sku_revenue = if caps.has_item && caps.has_order_value {
        group_and_sum(&subset, |l| Some(l.item_sku.clone()), revenue)
    } else {
        Vec::new()
    };
    let representative_revenue = if caps.has_representative && caps.has_order_value {
        group_and_sum(&subset, |l| Some(l.representative.clone()), revenue)
    } else {
        Vec::new()
    };
    let state_revenue = if caps.has_state && caps.has_order_value {
        group_and_sum(&subset, |l| Some(l.state.clone()), revenue)
    } else {
        Vec::new()
    };
    let monthly = if caps.has_month && caps.has_order_value {
        monthly_revenue(&subset)
    } else {
        Vec::new()
    };

    let order_count = distinct_orders(&subset, caps.has_order_id);
    let avg_ticket = if caps.has_order_value && order_count > 0 {
        Some(profit.total_revenue / order_count as f64)
    } else {
        None
    };

    let total_cost = if caps.has_cost {
        Some(subset.iter().filter_map(|l| l.total_cost).sum())
    } else {
        None
    };

    let sla = sla_summary(&subset, caps);
    let lead_time = lead_time_summary(&subset);

    let kpis = vec![
        Kpi {
            label: "Faturamento",
            format: KpiFormat::Currency,
            value: caps.has_order_value.then_some(profit.total_revenue),
        },
        Kpi {
            label: "Pedidos",
            format: KpiFormat::Integer,
            value: Some(order_count as f64),
        },
        Kpi {
            label: "Clientes",
            format: KpiFormat::Integer,
            value: caps
                .has_customer
                .then(|| distinct_count(&subset, |l| l.customer_name.as_str()) as f64),
        },
        Kpi {
            label: "Ticket Médio",
            format: KpiFormat::Currency,
            value: avg_ticket,
        },
        Kpi {
            label: "SKUs Vendidos",
            format: KpiFormat::Integer,
            value: caps
                .has_item
                .then(|| distinct_count(&subset, |l| l.item_sku.as_str()) as f64),
        },
        Kpi {
            label: "% Pedidos Atrasados",
            format: KpiFormat::Percent,
            value: sla.as_ref().and_then(|s| s.pct_late),
        },
        Kpi {
            label: "Custo Total",
            format: KpiFormat::Currency,
            value: total_cost,
        },
        Kpi {
            label: "Lucro Bruto",
            format: KpiFormat::Currency,
            value: profit.total_profit,
        },
        Kpi {
            label: "Margem Média %",
            format: KpiFormat::Percent,
            value: profit.weighted_margin_pct,
        },
        Kpi {
            label: "% Linhas Lucrativas",
            format: KpiFormat::Percent,
            value: profit.pct_profitable_lines,
        },
        Kpi {
            label: "Variação M/M %",
            format: KpiFormat::Percent,
            value: month_over_month(&monthly),
        },
        Kpi {
            label: "Variação A/A %",
            format: KpiFormat::Percent,
            value: year_over_year(&monthly),
        },
    ];

    let rfm = if caps.has_customer {
        score_customers(&subset, reference_date)
    } else {
        Vec::new()
    };

    Dashboard {
        kpis,
        profit,
        monthly_revenue: monthly,
        top_customers: customer_revenue.iter().take(TOP_CUSTOMERS).cloned().collect(),
        top_skus: sku_revenue.iter().take(TOP_SKUS).cloned().collect(),
        revenue_by_representative: representative_revenue
            .iter()
            .take(TOP_REPRESENTATIVES)
            .cloned()
            .collect(),
        revenue_by_state: state_revenue,
        lead_time,
        sla,
        rfm,
        customer_pareto: classify(&customer_revenue),
        sku_pareto: classify(&sku_revenue),
        negative_margin: negative_margin_lines(&subset),
        subset_rows: subset.len(),
    }
}

fn lead_time_summary(subset: &[OrderLine]) -> Option<LeadTimeSummary> {
    let days: Vec<i64> = subset.iter().filter_map(|l| l.lead_time_days).collect();
    if days.is_empty() {
        return None;
    }
    let as_f64: Vec<f64> = days.iter().map(|d| *d as f64).collect();
    Some(LeadTimeSummary {
        count: days.len(),
        mean_days: average(&as_f64)?,
        median_days: median(as_f64.clone())?,
        min_days: *days.iter().min()?,
        max_days: *days.iter().max()?,
    })
}

fn sla_summary(subset: &[OrderLine], caps: &ColumnCapabilities) -> Option<SlaSummary> {
    if !caps.has_late_flag {
        return None;
    }
    let flagged: Vec<&OrderLine> = subset.iter().filter(|l| l.is_late.is_some()).collect();
    if flagged.is_empty() {
        return Some(SlaSummary {
            late_orders: 0,
            on_time_orders: 0,
            pct_late: None,
        });
    }
    let late: Vec<OrderLine> = flagged
        .iter()
        .filter(|l| l.is_late == Some(true))
        .map(|l| (*l).clone())
        .collect();
    let on_time: Vec<OrderLine> = flagged
        .iter()
        .filter(|l| l.is_late == Some(false))
        .map(|l| (*l).clone())
        .collect();
    let pct_late = Some(100.0 * late.len() as f64 / flagged.len() as f64);
    Some(SlaSummary {
        late_orders: distinct_orders(&late, caps.has_order_id),
        on_time_orders: distinct_orders(&on_time, caps.has_order_id),
        pct_late,
    })
}
