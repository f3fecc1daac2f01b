// Presentation-facing edges: table previews, report files and the filtered
// subset export. Formatting happens here so the pipeline stays numeric.
use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::pareto::ParetoEntry;
use crate::rfm::CustomerRfm;
use crate::types::{
    Kpi, KpiFormat, KpiRow, MonthlyRow, NegativeMarginRow, OrderLine, ParetoRow, RankedRow, RfmRow,
};
use crate::util::{format_count, format_money, format_number_br, format_pct, NA};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Export the filtered subset as UTF-8 with BOM, comma-separated, so the
/// file opens correctly in spreadsheet tools with the original headers.
pub fn export_filtered_csv(path: &str, lines: &[OrderLine]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(b"\xEF\xBB\xBF")?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record([
        "Pedido",
        "ITEM",
        "Nome Cliente",
        "Representante",
        "Regional",
        "UF",
        "Status de Produção / Faturamento",
        "Data / Mês",
        "Data do Pedido",
        "Data da Entrega",
        "Valor Pedido R$",
        "Custo Total",
        "Lucro Bruto",
        "Margem %",
        "LeadTime (dias)",
        "Atrasado",
    ])?;
    for l in lines {
        wtr.write_record([
            l.order_id.clone(),
            l.item_sku.clone(),
            l.customer_name.clone(),
            l.representative.clone(),
            l.region.clone(),
            l.state.clone(),
            l.fulfillment_status.clone(),
            opt_date(l.month_key),
            opt_date(l.order_date),
            opt_date(l.delivery_date),
            opt_num(l.order_value),
            opt_num(l.total_cost),
            opt_num(l.gross_profit),
            opt_num(l.margin_pct),
            l.lead_time_days.map(|d| d.to_string()).unwrap_or_default(),
            match l.is_late {
                Some(true) => "Atrasado".to_string(),
                Some(false) => "No prazo".to_string(),
                None => String::new(),
            },
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn opt_date(d: Option<chrono::NaiveDate>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|v| format!("{}", v)).unwrap_or_default()
}

pub fn preview_table<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Render a KPI value according to its formatting hint. An absent value is
/// always the explicit n/a marker.
pub fn format_kpi(kpi: &Kpi) -> String {
    match kpi.format {
        KpiFormat::Currency => format_money(kpi.value),
        KpiFormat::Integer => format_count(kpi.value),
        KpiFormat::Percent => format_pct(kpi.value),
    }
}

pub fn kpi_rows(dashboard: &Dashboard) -> Vec<KpiRow> {
    dashboard
        .kpis
        .iter()
        .map(|kpi| KpiRow {
            indicator: kpi.label.to_string(),
            value: format_kpi(kpi),
        })
        .collect()
}

pub fn ranked_rows(series: &[(String, f64)]) -> Vec<RankedRow> {
    series
        .iter()
        .enumerate()
        .map(|(i, (key, value))| RankedRow {
            rank: i + 1,
            key: key.clone(),
            revenue: format_money(Some(*value)),
        })
        .collect()
}

pub fn monthly_rows(series: &[(String, f64)]) -> Vec<MonthlyRow> {
    series
        .iter()
        .map(|(month, value)| MonthlyRow {
            month: month.clone(),
            revenue: format_money(Some(*value)),
        })
        .collect()
}

pub fn rfm_rows(customers: &[CustomerRfm]) -> Vec<RfmRow> {
    customers
        .iter()
        .map(|c| RfmRow {
            customer: c.customer.clone(),
            recency_days: c
                .recency_days
                .map(|d| d.to_string())
                .unwrap_or_else(|| NA.to_string()),
            orders: c.order_count,
            monetary: format_money(Some(c.total_value)),
            r_score: c.r_score,
            f_score: c.f_score,
            m_score: c.m_score,
            segment: c.segment.to_string(),
        })
        .collect()
}

pub fn pareto_rows(entries: &[ParetoEntry]) -> Vec<ParetoRow> {
    entries
        .iter()
        .map(|e| ParetoRow {
            entity: e.entity_key.clone(),
            value: format_money(Some(e.value)),
            cumulative_pct: e
                .cumulative_share_pct
                .map(|p| format!("{}%", format_number_br(p, 1)))
                .unwrap_or_else(|| NA.to_string()),
            class: e
                .abc_class
                .map(|c| c.to_string())
                .unwrap_or_else(|| NA.to_string()),
        })
        .collect()
}

pub fn negative_margin_rows(lines: &[OrderLine]) -> Vec<NegativeMarginRow> {
    lines
        .iter()
        .map(|l| NegativeMarginRow {
            order_id: l.order_id.clone(),
            customer: l.customer_name.clone(),
            item: l.item_sku.clone(),
            order_value: format_money(l.order_value),
            gross_profit: format_money(l.gross_profit),
            margin_pct: format_pct(l.margin_pct),
        })
        .collect()
}
