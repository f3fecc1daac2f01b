// Ledger ingestion: reads the "Carteira de Vendas" sheet (xlsx) or an
// equivalent CSV export, normalizes headers, coerces locale-formatted cells
// and derives the calendar/cost fields used by every report.
//
// Only an unreadable source or a missing sheet is fatal. Every field-level
// problem degrades to an absent value for that row and is tallied in the
// [`LoadReport`] instead of failing the load.
use crate::error::{LoadError, Result};
use crate::types::{ColumnCapabilities, OrderLine};
use crate::util::{parse_date_safe, parse_decimal_br};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use log::{debug, warn};
use std::path::Path;

pub const DEFAULT_SHEET: &str = "Carteira de Vendas";

// Exact workbook headers (post-trim). All columns are optional; a missing
// column only clears the matching capability.
pub const COL_ORDER_ID: &str = "Pedido";
pub const COL_ITEM: &str = "ITEM";
pub const COL_CUSTOMER: &str = "Nome Cliente";
pub const COL_REPRESENTATIVE: &str = "Representante";
pub const COL_REGION: &str = "Regional";
pub const COL_STATE: &str = "UF";
pub const COL_STATUS: &str = "Status de Produção / Faturamento";
pub const COL_LATE_FLAG: &str = "Atrasado / No prazo";
pub const COL_ORDER_VALUE: &str = "Valor Pedido R$";
pub const COL_UNIT_COST: &str = "Custo";
pub const COL_MONTH: &str = "Data / Mês";
pub const COL_ORDER_DATE: &str = "Data do Pedido";
pub const COL_DELIVERY_DATE: &str = "Data da Entrega";

/// Known spellings of the quantity header, checked in order with a
/// case-sensitive exact match.
pub const QUANTITY_HEADERS: [&str; 4] = ["Quant. Pedidos", "Quantidade", "Qtde", "Qtd."];

/// Positional fallback when no quantity header matches. Inherited from the
/// source workbook layout; it depends on a fixed column order, which is why
/// it is exposed in [`LoaderConfig`] rather than buried as a literal.
pub const QUANTITY_FALLBACK_INDEX: usize = 12;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub sheet_name: String,
    pub quantity_headers: Vec<String>,
    pub quantity_fallback_index: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            sheet_name: DEFAULT_SHEET.to_string(),
            quantity_headers: QUANTITY_HEADERS.iter().map(|s| s.to_string()).collect(),
            quantity_fallback_index: Some(QUANTITY_FALLBACK_INDEX),
        }
    }
}

/// Diagnostics from one load pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Non-empty cells that failed numeric/date coercion and became absent.
    pub coerced_cells: usize,
}

/// A parsed ledger: normalized lines plus the capability set the sheet
/// actually supports.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub lines: Vec<OrderLine>,
    pub caps: ColumnCapabilities,
    pub report: LoadReport,
}

/// Intermediate cell value shared by the xlsx and CSV paths.
#[derive(Debug, Clone)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

/// Load a ledger from `path`. `.xlsx`/`.xlsm`/`.xls` go through calamine
/// using the configured sheet name; anything else is read as CSV with the
/// same headers.
pub fn load_ledger(path: &str, config: &LoaderConfig) -> Result<Ledger> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let (headers, rows) = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" => read_workbook(path, &config.sheet_name)?,
        _ => read_csv(path)?,
    };
    Ok(normalize(headers, rows, config))
}

fn read_workbook(path: &str, sheet: &str) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut workbook = open_workbook_auto(path).map_err(|source| LoadError::OpenWorkbook {
        path: path.to_string(),
        source,
    })?;
    if !workbook.sheet_names().iter().any(|s| s == sheet) {
        return Err(LoadError::SheetNotFound(sheet.to_string()));
    }
    let range = workbook.worksheet_range(sheet)?;
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| cell_to_text(&convert(c)).trim().to_string()).collect(),
        None => Vec::new(),
    };
    let data: Vec<Vec<Cell>> = rows.map(|r| r.iter().map(convert).collect()).collect();
    Ok((headers, data))
}

fn convert(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(if *b { "true".into() } else { "false".into() }),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::Date(ndt.date()),
            None => Cell::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn read_csv(path: &str) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok((headers, rows))
}

const EMPTY_CELL: Cell = Cell::Empty;

fn cell_at<'a>(row: &'a [Cell], idx: Option<usize>) -> &'a Cell {
    idx.and_then(|i| row.get(i)).unwrap_or(&EMPTY_CELL)
}

fn cell_to_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
    }
}

fn cell_to_number(cell: &Cell, coerced: &mut usize) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => {
            let parsed = parse_decimal_br(s);
            if parsed.is_none() && !s.trim().is_empty() {
                *coerced += 1;
            }
            parsed
        }
        _ => None,
    }
}

fn cell_to_date(cell: &Cell, coerced: &mut usize) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => {
            let parsed = parse_date_safe(s);
            if parsed.is_none() && !s.trim().is_empty() {
                *coerced += 1;
            }
            parsed
        }
        _ => None,
    }
}

fn normalize(headers: Vec<String>, rows: Vec<Vec<Cell>>, config: &LoaderConfig) -> Ledger {
    let col = |name: &str| headers.iter().position(|h| h.as_str() == name);

    let idx_order_id = col(COL_ORDER_ID);
    let idx_item = col(COL_ITEM);
    let idx_customer = col(COL_CUSTOMER);
    let idx_representative = col(COL_REPRESENTATIVE);
    let idx_region = col(COL_REGION);
    let idx_state = col(COL_STATE);
    let idx_status = col(COL_STATUS);
    let idx_late = col(COL_LATE_FLAG);
    let idx_value = col(COL_ORDER_VALUE);
    let idx_cost = col(COL_UNIT_COST);
    let idx_month = col(COL_MONTH);
    let idx_order_date = col(COL_ORDER_DATE);
    let idx_delivery = col(COL_DELIVERY_DATE);

    let idx_quantity = resolve_quantity_column(&headers, config);
    let quantity_column = idx_quantity.map(|i| headers[i].clone());

    let caps = ColumnCapabilities {
        has_order_id: idx_order_id.is_some(),
        has_item: idx_item.is_some(),
        has_customer: idx_customer.is_some(),
        has_representative: idx_representative.is_some(),
        has_region: idx_region.is_some(),
        has_state: idx_state.is_some(),
        has_status: idx_status.is_some(),
        has_late_flag: idx_late.is_some(),
        has_order_value: idx_value.is_some(),
        has_cost: idx_cost.is_some(),
        has_month: idx_month.is_some(),
        has_order_date: idx_order_date.is_some(),
        has_delivery_date: idx_delivery.is_some(),
        quantity_column,
    };
    debug!("resolved capabilities: {:?}", caps);

    let mut report = LoadReport::default();
    let mut lines = Vec::with_capacity(rows.len());

    for row in &rows {
        report.total_rows += 1;
        if row.iter().all(|c| cell_to_text(c).is_empty()) {
            continue;
        }
        let order_value = cell_to_number(cell_at(row, idx_value), &mut report.coerced_cells);
        let unit_cost = cell_to_number(cell_at(row, idx_cost), &mut report.coerced_cells);
        let quantity = cell_to_number(cell_at(row, idx_quantity), &mut report.coerced_cells);
        let order_date = cell_to_date(cell_at(row, idx_order_date), &mut report.coerced_cells);
        let delivery_date = cell_to_date(cell_at(row, idx_delivery), &mut report.coerced_cells);
        let month_key = cell_to_date(cell_at(row, idx_month), &mut report.coerced_cells);

        let is_late = if idx_late.is_some() {
            Some(
                cell_to_text(cell_at(row, idx_late))
                    .to_lowercase()
                    .contains("atras"),
            )
        } else {
            None
        };

        let lead_time_days = match (order_date, delivery_date) {
            (Some(start), Some(end)) => Some((end - start).num_days()),
            _ => None,
        };
        // With a resolved quantity column the cost cell is per-unit;
        // without one it is taken as the line total.
        let total_cost = if idx_quantity.is_some() {
            match (unit_cost, quantity) {
                (Some(c), Some(q)) => Some(c * q),
                _ => None,
            }
        } else {
            unit_cost
        };
        let gross_profit = match (order_value, total_cost) {
            (Some(v), Some(c)) => Some(v - c),
            _ => None,
        };
        let margin_pct = match (order_value, gross_profit) {
            (Some(v), Some(p)) if v > 0.0 => Some(100.0 * p / v),
            _ => None,
        };

        lines.push(OrderLine {
            order_id: cell_to_text(cell_at(row, idx_order_id)),
            item_sku: cell_to_text(cell_at(row, idx_item)),
            customer_name: cell_to_text(cell_at(row, idx_customer)),
            representative: cell_to_text(cell_at(row, idx_representative)),
            region: cell_to_text(cell_at(row, idx_region)),
            state: cell_to_text(cell_at(row, idx_state)),
            fulfillment_status: cell_to_text(cell_at(row, idx_status)),
            order_value,
            unit_cost,
            quantity,
            order_date,
            delivery_date,
            month_key,
            is_late,
            lead_time_days,
            total_cost,
            gross_profit,
            margin_pct,
        });
    }

    report.kept_rows = lines.len();
    if report.coerced_cells > 0 {
        warn!(
            "{} cells failed coercion and were loaded as absent",
            report.coerced_cells
        );
    }
    Ledger { lines, caps, report }
}

/// Resolve the quantity column: first exact header match from the configured
/// candidate list, then the positional fallback when the sheet is wide
/// enough, else none (cost is treated as already-total).
fn resolve_quantity_column(headers: &[String], config: &LoaderConfig) -> Option<usize> {
    for candidate in &config.quantity_headers {
        if let Some(i) = headers.iter().position(|h| h == candidate) {
            debug!("quantity column matched header \"{}\"", candidate);
            return Some(i);
        }
    }
    match config.quantity_fallback_index {
        Some(i) if i < headers.len() => {
            debug!(
                "quantity column fell back to position {} (\"{}\")",
                i, headers[i]
            );
            Some(i)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_and_normalizes_portuguese_headers() {
        let file = write_csv(
            " Pedido ,Nome Cliente,ITEM,Valor Pedido R$,Custo,Quantidade,Data / Mês,Data do Pedido,Data da Entrega,Atrasado / No prazo\n\
             P-1,ACME,SKU-1,\"1.234,56\",\"100,00\",2,2024-01-01,2024-01-05,2024-01-12,No prazo\n",
        );
        let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
        assert_eq!(ledger.lines.len(), 1);
        let line = &ledger.lines[0];
        assert_eq!(line.order_id, "P-1");
        assert_eq!(line.order_value, Some(1234.56));
        assert_eq!(line.total_cost, Some(200.0));
        assert!((line.gross_profit.unwrap() - 1034.56).abs() < 1e-9);
        assert_eq!(line.lead_time_days, Some(7));
        assert_eq!(line.is_late, Some(false));
        assert!(ledger.caps.has_order_id);
        assert_eq!(ledger.caps.quantity_column.as_deref(), Some("Quantidade"));
    }

    #[test]
    fn unparseable_cells_become_absent_not_errors() {
        let file = write_csv(
            "Pedido,Valor Pedido R$,Data / Mês\n\
             P-1,abc,garbage\n\
             P-2,\"2.000,00\",2024-02-01\n",
        );
        let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
        assert_eq!(ledger.lines.len(), 2);
        assert_eq!(ledger.lines[0].order_value, None);
        assert_eq!(ledger.lines[0].month_key, None);
        assert_eq!(ledger.lines[1].order_value, Some(2000.0));
        assert_eq!(ledger.report.coerced_cells, 2);
    }

    #[test]
    fn missing_columns_only_clear_capabilities() {
        let file = write_csv("Pedido,Valor Pedido R$\nP-1,\"100,00\"\n");
        let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
        assert!(!ledger.caps.has_customer);
        assert!(!ledger.caps.has_cost);
        assert!(ledger.caps.quantity_column.is_none());
        assert_eq!(ledger.lines[0].customer_name, "");
        assert_eq!(ledger.lines[0].total_cost, None);
        assert_eq!(ledger.lines[0].is_late, None);
    }

    #[test]
    fn quantity_falls_back_to_thirteenth_column() {
        let mut headers: Vec<String> = (1..=13).map(|i| format!("C{}", i)).collect();
        headers[12] = "Volume".to_string();
        let file = write_csv(&format!(
            "{}\n{}\n",
            headers.join(","),
            (1..=13).map(|i| i.to_string()).collect::<Vec<_>>().join(",")
        ));
        let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
        assert_eq!(ledger.caps.quantity_column.as_deref(), Some("Volume"));
        assert_eq!(ledger.lines[0].quantity, Some(13.0));
    }

    #[test]
    fn cost_without_quantity_column_is_taken_as_total() {
        let file = write_csv(
            "Valor Pedido R$,Custo\n\"1.000,00\",\"400,00\"\n",
        );
        let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
        let line = &ledger.lines[0];
        assert_eq!(line.total_cost, Some(400.0));
        assert_eq!(line.gross_profit, Some(600.0));
        assert_eq!(line.margin_pct, Some(60.0));
    }

    #[test]
    fn zero_order_value_yields_absent_margin() {
        let file = write_csv("Valor Pedido R$,Custo\n\"0,00\",\"10,00\"\n");
        let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
        assert_eq!(ledger.lines[0].margin_pct, None);
        assert_eq!(ledger.lines[0].gross_profit, Some(-10.0));
    }

    #[test]
    fn missing_file_is_fatal() {
        let result = load_ledger("/nonexistent/ledger.csv", &LoaderConfig::default());
        assert!(result.is_err());
    }
}
