//! End-to-end pipeline tests: temp CSV ledger -> loader -> filters ->
//! dashboard -> export.

use carteira_report::dashboard::compute_dashboard;
use carteira_report::filter::{apply, FilterSet};
use carteira_report::loader::{load_ledger, LoaderConfig};
use carteira_report::output::export_filtered_csv;
use chrono::NaiveDate;
use std::io::Write;
use tempfile::NamedTempFile;

fn create_test_ledger() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Pedido,ITEM,Nome Cliente,Representante,Regional,UF,Status de Produção / Faturamento,Atrasado / No prazo,Valor Pedido R$,Custo,Quantidade,Data / Mês,Data do Pedido,Data da Entrega"
    )
    .unwrap();
    // Customer A: two orders a month apart.
    writeln!(file, "P-1,SKU-10,Alfa Metais,Silva,Sul,RS,Faturado,No prazo,\"1.000,00\",\"300,00\",2,2024-03-01,2024-03-02,2024-03-09").unwrap();
    writeln!(file, "P-2,SKU-10,Alfa Metais,Silva,Sul,RS,Faturado,No prazo,\"1.000,00\",\"300,00\",2,2024-04-01,2024-04-02,2024-04-12").unwrap();
    // Customer B: single old order, sold below cost.
    writeln!(file, "P-3,SKU-20,Beta Ferragens,Souza,Norte,AM,Em produção,Atrasado,\"500,00\",\"400,00\",2,2023-10-01,2023-10-05,2023-11-20").unwrap();
    // Customer C: four small recent orders.
    writeln!(file, "P-4,SKU-30,Casa Gama,Silva,Sul,SC,Faturado,No prazo,\"100,00\",\"20,00\",1,2024-04-01,2024-04-10,2024-04-15").unwrap();
    writeln!(file, "P-5,SKU-30,Casa Gama,Silva,Sul,SC,Faturado,No prazo,\"100,00\",\"20,00\",1,2024-04-01,2024-04-11,2024-04-16").unwrap();
    writeln!(file, "P-6,SKU-30,Casa Gama,Silva,Sul,SC,Faturado,No prazo,\"100,00\",\"20,00\",1,2024-04-01,2024-04-12,2024-04-17").unwrap();
    writeln!(file, "P-7,SKU-30,Casa Gama,Silva,Sul,SC,Faturado,Atrasado,\"100,00\",\"20,00\",1,2024-04-01,2024-04-13,2024-04-25").unwrap();
    // A row with broken cells: stays in the table, fields become absent.
    writeln!(file, "P-8,SKU-40,Delta Tubos,Souza,Norte,PA,Faturado,No prazo,abc,xyz,1,not-a-date,,").unwrap();
    file.flush().unwrap();
    file
}

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 13).unwrap()
}

#[test]
fn full_pipeline_produces_consistent_dashboard() {
    let file = create_test_ledger();
    let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
    assert_eq!(ledger.lines.len(), 8);
    assert!(ledger.caps.has_order_value);
    assert_eq!(ledger.caps.quantity_column.as_deref(), Some("Quantidade"));

    let dash = compute_dashboard(
        &ledger.lines,
        &ledger.caps,
        &FilterSet::default(),
        Some(reference()),
    );

    // Revenue KPI equals the sum over parseable values (P-8 excluded).
    let revenue = dash.kpis.iter().find(|k| k.label == "Faturamento").unwrap();
    assert!((revenue.value.unwrap() - 2900.0).abs() < 1e-9);

    // Group sums conserve the subset total.
    let grouped: f64 = dash.top_customers.iter().map(|(_, v)| v).sum();
    assert!((grouped - 2900.0).abs() < 1e-9);

    // Ranked descending: Alfa (2000) > Beta (500) > Casa Gama (400).
    let names: Vec<&str> = dash.top_customers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        names,
        vec!["Alfa Metais", "Beta Ferragens", "Casa Gama", "Delta Tubos"]
    );

    // ABC classes over the customer ranking.
    let classes: Vec<String> = dash
        .customer_pareto
        .iter()
        .map(|e| e.abc_class.map(|c| c.to_string()).unwrap_or_default())
        .collect();
    assert_eq!(classes[0], "A");
    let last = dash.customer_pareto.last().unwrap();
    assert!((last.cumulative_share_pct.unwrap() - 100.0).abs() < 1e-9);

    // RFM: Casa Gama has the best recency and frequency.
    let gama = dash.rfm.iter().find(|c| c.customer == "Casa Gama").unwrap();
    assert_eq!(gama.r_score, 3);
    assert_eq!(gama.f_score, 3);
    assert_eq!(gama.order_count, 4);

    // Beta sold below cost shows up in the audit.
    assert_eq!(dash.negative_margin.len(), 1);
    assert_eq!(dash.negative_margin[0].customer_name, "Beta Ferragens");

    // SLA and lead time are present and coherent.
    let sla = dash.sla.unwrap();
    assert_eq!(sla.late_orders, 2);
    let lt = dash.lead_time.unwrap();
    assert_eq!(lt.count, 7);
    assert_eq!(lt.min_days, 5);
    assert_eq!(lt.max_days, 46);
}

#[test]
fn filters_are_order_independent_and_idempotent() {
    let file = create_test_ledger();
    let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();

    let combined = FilterSet {
        regions: vec!["Sul".to_string()],
        customer_contains: "gama".to_string(),
        ..Default::default()
    };
    let region_only = FilterSet {
        regions: vec!["Sul".to_string()],
        ..Default::default()
    };
    let customer_only = FilterSet {
        customer_contains: "gama".to_string(),
        ..Default::default()
    };

    let direct = apply(&ledger.lines, &combined);
    let region_then_customer = apply(&apply(&ledger.lines, &region_only), &customer_only);
    let customer_then_region = apply(&apply(&ledger.lines, &customer_only), &region_only);
    assert_eq!(direct, region_then_customer);
    assert_eq!(direct, customer_then_region);
    assert_eq!(direct, apply(&direct, &combined));
    assert_eq!(direct.len(), 4);
}

#[test]
fn period_filter_narrows_the_dashboard() {
    let file = create_test_ledger();
    let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
    let filters = FilterSet {
        period: Some((
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
        )),
        ..Default::default()
    };
    let dash = compute_dashboard(&ledger.lines, &ledger.caps, &filters, Some(reference()));
    assert_eq!(dash.subset_rows, 5);
    // One distinct month in range: the MoM delta is undefined, not 0%.
    let mom = dash.kpis.iter().find(|k| k.label == "Variação M/M %").unwrap();
    assert_eq!(mom.value, None);
}

#[test]
fn mom_delta_reflects_two_most_recent_months() {
    let file = create_test_ledger();
    let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
    let dash = compute_dashboard(
        &ledger.lines,
        &ledger.caps,
        &FilterSet::default(),
        Some(reference()),
    );
    // 2024-03 = 1000, 2024-04 = 1400 -> +40%.
    let mom = dash.kpis.iter().find(|k| k.label == "Variação M/M %").unwrap();
    assert!((mom.value.unwrap() - 40.0).abs() < 1e-9);
}

#[test]
fn export_round_trips_through_the_filter_engine() {
    let file = create_test_ledger();
    let ledger = load_ledger(file.path().to_str().unwrap(), &LoaderConfig::default()).unwrap();
    let filters = FilterSet {
        negative_margin_only: true,
        ..Default::default()
    };
    let subset = apply(&ledger.lines, &filters);
    assert_eq!(subset.len(), 1);

    let out = NamedTempFile::new().unwrap();
    let out_path = out.path().to_str().unwrap().to_string();
    export_filtered_csv(&out_path, &subset).unwrap();
    let bytes = std::fs::read(&out_path).unwrap();
    assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert!(text.contains("Beta Ferragens"));
    assert!(!text.contains("Casa Gama"));
}
