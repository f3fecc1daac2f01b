use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

/// One normalized row of the sales ledger ("Carteira de Vendas").
///
/// String fields are empty when their column is absent from the source.
/// Every numeric/date field is `Option`-typed: a missing column or an
/// unparseable cell yields `None` for that row only — never a default zero
/// and never a load failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderLine {
    pub order_id: String,
    pub item_sku: String,
    pub customer_name: String,
    pub representative: String,
    pub region: String,
    pub state: String,
    pub fulfillment_status: String,
    pub order_value: Option<f64>,
    pub unit_cost: Option<f64>,
    pub quantity: Option<f64>,
    pub order_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    /// Reporting month anchor ("Data / Mês" in the workbook).
    pub month_key: Option<NaiveDate>,
    /// Derived from the "Atrasado / No prazo" column; `None` when absent.
    pub is_late: Option<bool>,
    /// `delivery_date - order_date` in days.
    pub lead_time_days: Option<i64>,
    /// `unit_cost * quantity`, or `unit_cost` alone when no quantity column
    /// was resolved (cost taken as already-total).
    pub total_cost: Option<f64>,
    /// `order_value - total_cost`.
    pub gross_profit: Option<f64>,
    /// `100 * gross_profit / order_value`; `None` when `order_value <= 0`.
    pub margin_pct: Option<f64>,
}

/// Which logical columns the loaded sheet actually carries.
///
/// Emitted once by the loader; downstream components check capabilities up
/// front instead of probing column presence per row. A feature whose column
/// is missing disables itself, it never crashes.
#[derive(Debug, Clone, Default)]
pub struct ColumnCapabilities {
    pub has_order_id: bool,
    pub has_item: bool,
    pub has_customer: bool,
    pub has_representative: bool,
    pub has_region: bool,
    pub has_state: bool,
    pub has_status: bool,
    pub has_late_flag: bool,
    pub has_order_value: bool,
    pub has_cost: bool,
    pub has_month: bool,
    pub has_order_date: bool,
    pub has_delivery_date: bool,
    /// Resolved header of the quantity column, if any.
    pub quantity_column: Option<String>,
}

/// Rendering hint for a KPI scalar; the presentation layer decides the
/// final string but the hint travels with the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiFormat {
    Currency,
    Integer,
    Percent,
}

/// A single headline metric. `value: None` means "no data" and must render
/// as an explicit n/a marker, not as zero.
#[derive(Debug, Clone)]
pub struct Kpi {
    pub label: &'static str,
    pub format: KpiFormat,
    pub value: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiRow {
    #[serde(rename = "Indicador")]
    #[tabled(rename = "Indicador")]
    pub indicator: String,
    #[serde(rename = "Valor")]
    #[tabled(rename = "Valor")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankedRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Chave")]
    #[tabled(rename = "Chave")]
    pub key: String,
    #[serde(rename = "Faturamento")]
    #[tabled(rename = "Faturamento")]
    pub revenue: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyRow {
    #[serde(rename = "AnoMes")]
    #[tabled(rename = "Ano-Mês")]
    pub month: String,
    #[serde(rename = "Faturamento")]
    #[tabled(rename = "Faturamento")]
    pub revenue: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RfmRow {
    #[serde(rename = "Cliente")]
    #[tabled(rename = "Cliente")]
    pub customer: String,
    #[serde(rename = "RecenciaDias")]
    #[tabled(rename = "Recência (dias)")]
    pub recency_days: String,
    #[serde(rename = "Pedidos")]
    #[tabled(rename = "Pedidos")]
    pub orders: usize,
    #[serde(rename = "Monetario")]
    #[tabled(rename = "Monetário")]
    pub monetary: String,
    #[serde(rename = "R")]
    #[tabled(rename = "R")]
    pub r_score: u8,
    #[serde(rename = "F")]
    #[tabled(rename = "F")]
    pub f_score: u8,
    #[serde(rename = "M")]
    #[tabled(rename = "M")]
    pub m_score: u8,
    #[serde(rename = "Segmento")]
    #[tabled(rename = "Segmento")]
    pub segment: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ParetoRow {
    #[serde(rename = "Entidade")]
    #[tabled(rename = "Entidade")]
    pub entity: String,
    #[serde(rename = "Valor")]
    #[tabled(rename = "Valor")]
    pub value: String,
    #[serde(rename = "AcumuladoPct")]
    #[tabled(rename = "% Acumulado")]
    pub cumulative_pct: String,
    #[serde(rename = "Classe")]
    #[tabled(rename = "Classe")]
    pub class: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct NegativeMarginRow {
    #[serde(rename = "Pedido")]
    #[tabled(rename = "Pedido")]
    pub order_id: String,
    #[serde(rename = "Cliente")]
    #[tabled(rename = "Cliente")]
    pub customer: String,
    #[serde(rename = "Item")]
    #[tabled(rename = "Item")]
    pub item: String,
    #[serde(rename = "Valor")]
    #[tabled(rename = "Valor")]
    pub order_value: String,
    #[serde(rename = "Lucro")]
    #[tabled(rename = "Lucro")]
    pub gross_profit: String,
    #[serde(rename = "MargemPct")]
    #[tabled(rename = "Margem %")]
    pub margin_pct: String,
}
