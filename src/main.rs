// Console front-end: a small menu loop over the reporting pipeline.
//
// - Option [1] loads (or reuses) a ledger file, printing load diagnostics.
// - Option [2] computes the dashboard for the current filters and previews
//   every table, writing the report files alongside.
// - Option [3] edits the filter set.
// - Option [4] exports the filtered subset as CSV (UTF-8 with BOM).
//
// Parsed ledgers are cached by path for the lifetime of the process; the
// dashboard itself is recomputed on every interaction.
use carteira_report::dashboard::compute_dashboard;
use carteira_report::filter::{apply, FilterSet};
use carteira_report::loader::{load_ledger, Ledger, LoaderConfig};
use carteira_report::output::{
    export_filtered_csv, kpi_rows, monthly_rows, negative_margin_rows, pareto_rows, preview_table,
    ranked_rows, rfm_rows, write_csv, write_json,
};
use carteira_report::util::{format_int_br, format_number_br, parse_date_safe};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Mutex;

static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        ledgers: HashMap::new(),
        current: None,
        filters: FilterSet::default(),
    })
});

struct AppState {
    /// Parsed ledgers memoized by path.
    ledgers: HashMap<String, Ledger>,
    current: Option<String>,
    filters: FilterSet,
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn prompt_list(label: &str) -> Vec<String> {
    let raw = prompt(label);
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Handle option [1]: load the ledger file, reusing the cached parse when
/// the same path was loaded before.
fn handle_load() {
    let mut path = prompt("Ledger file (.xlsx or .csv) [carteira_vendas.xlsx]: ");
    if path.is_empty() {
        path = "carteira_vendas.xlsx".to_string();
    }
    let mut state = APP_STATE.lock().unwrap();
    if state.ledgers.contains_key(&path) {
        println!("Using cached ledger for {}\n", path);
        state.current = Some(path);
        return;
    }
    match load_ledger(&path, &LoaderConfig::default()) {
        Ok(ledger) => {
            println!(
                "Loaded {} rows ({} kept, {} cells coerced to absent).",
                format_int_br(ledger.report.total_rows as i64),
                format_int_br(ledger.report.kept_rows as i64),
                format_int_br(ledger.report.coerced_cells as i64)
            );
            if let Some(q) = &ledger.caps.quantity_column {
                println!("Quantity column: \"{}\"", q);
            } else {
                println!("No quantity column resolved; cost is taken as line total.");
            }
            println!();
            state.ledgers.insert(path.clone(), ledger);
            state.current = Some(path);
        }
        Err(e) => {
            // Fatal load surface: message only, no partial dashboard.
            eprintln!("Failed to load ledger: {}\n", e);
        }
    }
}

fn current_ledger() -> Option<(Ledger, FilterSet)> {
    let state = APP_STATE.lock().unwrap();
    let path = state.current.clone()?;
    let ledger = state.ledgers.get(&path)?.clone();
    Some((ledger, state.filters.clone()))
}

/// Handle option [2]: compute and preview the full dashboard, writing the
/// report files next to the binary.
fn handle_dashboard() {
    let Some((ledger, filters)) = current_ledger() else {
        println!("Error: no ledger loaded. Use option 1 first.\n");
        return;
    };

    println!("Computing dashboard ({} rows loaded)...\n", ledger.lines.len());
    let dash = compute_dashboard(&ledger.lines, &ledger.caps, &filters, None);
    println!(
        "Filtered subset: {} rows\n",
        format_int_br(dash.subset_rows as i64)
    );

    let kpis = kpi_rows(&dash);
    println!("KPIs");
    preview_table(&kpis, kpis.len());
    if let Err(e) = write_csv("report_kpis.csv", &kpis) {
        eprintln!("Write error: {}", e);
    }
    if let Err(e) = write_json("summary.json", &kpis) {
        eprintln!("Write error: {}", e);
    }

    println!("Faturamento por Mês");
    preview_table(&monthly_rows(&dash.monthly_revenue), 12);

    println!("Top Clientes (Faturamento)");
    let top_customers = ranked_rows(&dash.top_customers);
    preview_table(&top_customers, 5);
    if let Err(e) = write_csv("report_top_clientes.csv", &top_customers) {
        eprintln!("Write error: {}", e);
    }

    println!("Top SKUs (Faturamento)");
    let top_skus = ranked_rows(&dash.top_skus);
    preview_table(&top_skus, 5);
    if let Err(e) = write_csv("report_top_skus.csv", &top_skus) {
        eprintln!("Write error: {}", e);
    }

    println!("Faturamento por Representante");
    preview_table(&ranked_rows(&dash.revenue_by_representative), 5);
    println!("Faturamento por UF");
    preview_table(&ranked_rows(&dash.revenue_by_state), 5);

    if let Some(lt) = &dash.lead_time {
        println!(
            "Lead time (dias): n={} média={} mediana={} min={} max={}",
            format_int_br(lt.count as i64),
            format_number_br(lt.mean_days, 1),
            format_number_br(lt.median_days, 1),
            lt.min_days,
            lt.max_days
        );
    }
    if let Some(sla) = &dash.sla {
        println!(
            "Pedidos atrasados: {} | no prazo: {}\n",
            format_int_br(sla.late_orders as i64),
            format_int_br(sla.on_time_orders as i64)
        );
    }

    println!("Segmentação RFM");
    let rfm = rfm_rows(&dash.rfm);
    preview_table(&rfm, 10);
    if let Err(e) = write_csv("report_rfm.csv", &rfm) {
        eprintln!("Write error: {}", e);
    }

    println!("Curva ABC — Clientes");
    let customer_pareto = pareto_rows(&dash.customer_pareto);
    preview_table(&customer_pareto, 10);
    if let Err(e) = write_csv("report_abc_clientes.csv", &customer_pareto) {
        eprintln!("Write error: {}", e);
    }

    println!("Curva ABC — SKUs");
    let sku_pareto = pareto_rows(&dash.sku_pareto);
    preview_table(&sku_pareto, 10);
    if let Err(e) = write_csv("report_abc_skus.csv", &sku_pareto) {
        eprintln!("Write error: {}", e);
    }

    if !dash.negative_margin.is_empty() {
        println!("Linhas com margem negativa");
        preview_table(&negative_margin_rows(&dash.negative_margin), 10);
    }
}

/// Handle option [3]: rebuild the filter set from prompts. Blank answers
/// leave a filter unset (match everything).
fn handle_filters() {
    let mut filters = FilterSet::default();
    let start = parse_date_safe(&prompt("Período início (YYYY-MM-DD, vazio = sem filtro): "));
    if let Some(start) = start {
        if let Some(end) = parse_date_safe(&prompt("Período fim (YYYY-MM-DD): ")) {
            filters.period = Some((start, end));
        } else {
            println!("Data final inválida; filtro de período ignorado.");
        }
    }
    filters.regions = prompt_list("Regional (separado por vírgula, vazio = todas): ");
    filters.representatives = prompt_list("Representante (vírgula, vazio = todos): ");
    filters.states = prompt_list("UF (vírgula, vazio = todas): ");
    filters.statuses = prompt_list("Status (vírgula, vazio = todos): ");
    filters.customer_contains = prompt("Cliente (contém): ");
    filters.item_contains = prompt("SKU/Item (contém): ");
    filters.negative_margin_only = prompt("Somente margem negativa? (Y/N): ").eq_ignore_ascii_case("y");

    let mut state = APP_STATE.lock().unwrap();
    state.filters = filters;
    println!("Filtros atualizados.\n");
}

/// Handle option [4]: export the current filtered subset.
fn handle_export() {
    let Some((ledger, filters)) = current_ledger() else {
        println!("Error: no ledger loaded. Use option 1 first.\n");
        return;
    };
    let subset = apply(&ledger.lines, &filters);
    let path = "carteira_filtrada.csv";
    match export_filtered_csv(path, &subset) {
        Ok(()) => println!(
            "Exported {} rows to {}\n",
            format_int_br(subset.len() as i64),
            path
        ),
        Err(e) => eprintln!("Export error: {}\n", e),
    }
}

fn main() {
    env_logger::init();
    loop {
        println!("Carteira de Vendas — Relatórios");
        println!("[1] Load ledger file");
        println!("[2] Dashboard reports");
        println!("[3] Edit filters");
        println!("[4] Export filtered subset");
        println!("[0] Exit\n");
        match prompt("Enter choice: ").as_str() {
            "1" => handle_load(),
            "2" => {
                println!();
                handle_dashboard();
            }
            "3" => handle_filters(),
            "4" => handle_export(),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-4.\n"),
        }
    }
}
