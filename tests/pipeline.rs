use chrono::{Month, NaiveDate, NaiveDateTime};
use inventory_insights::aggregate::GateFlow;
use inventory_insights::filter::known_years;
use inventory_insights::{
    load_dataset, run_pipeline, CostBasis, FilterSelection, Metric, SchemaError,
};
use pretty_assertions::assert_eq;

const INVENTORY_CSV: &str = "\
Unit #,Location,Depot,Size,Condition,Customer,Status,Gate In,Gate Out,Value,Sale Price,Repair Cost,Storage Cost,Purchase Cost
U1,Houston,HOU,20FT,CW,Acme,SOLD,2022-03-01,2022-04-01,$2000,\"$1,000\",$50,$10,$1500
U2,Houston,HOU,20FT,CW,Acme,SOLD,2023-03-05,2023-03-25,$2100,\"$1,500\",$0,$12,$1600
U3,Houston,HOU,40FT,IICL,,SELL,2023-05-10,,\"$3,000\",,$200,$30,$2800
U4,Dallas,DAL,40FT,CW,,PKUP,2023-07-01,2023-07-11,$2500,,,,
U5,Dallas,DAL,20FT,CW,,SELL,,,$900,,$100,,
";

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn kpis_compare_against_previous_known_year() {
    let dash = run_pipeline(
        INVENTORY_CSV.as_bytes(),
        now(),
        &FilterSelection::for_year(2023),
        CostBasis::Value,
    )
    .unwrap();

    assert_eq!(dash.subsets.previous_year, Some(2022));
    assert_eq!(dash.subsets.current.len(), 3);
    assert_eq!(dash.subsets.previous.len(), 1);

    let sold = dash.kpi(Metric::InventorySold).unwrap();
    assert_eq!(sold.value, 1500.0);
    assert_eq!(sold.percent_change, 50.0);

    let cost = dash.kpi(Metric::CostOfInventory(CostBasis::Value)).unwrap();
    assert_eq!(cost.value, 5500.0);
    assert_eq!(cost.percent_change, 0.0);

    let repair = dash.kpi(Metric::InventoryUnderRepair).unwrap();
    assert_eq!(repair.value, 200.0);
    assert_eq!(repair.percent_change, 300.0);

    let picked = dash.kpi(Metric::InventoryPickedUp).unwrap();
    assert_eq!(picked.value, 1.0);
    assert_eq!(picked.percent_change, 0.0);

    let aging = dash.kpi(Metric::GateInAging).unwrap();
    assert!(close(aging.value, 1265.0 / 3.0));
    assert!(close(aging.percent_change, (1265.0 / 3.0 - 852.0) / 852.0 * 100.0));

    let dwell = dash.kpi(Metric::DwellTime).unwrap();
    assert_eq!(dwell.value, 15.0);
    assert!(close(dwell.percent_change, (15.0 - 31.0) / 31.0 * 100.0));
}

#[test]
fn purchase_cost_basis_changes_only_cost_of_inventory() {
    let dash = run_pipeline(
        INVENTORY_CSV.as_bytes(),
        now(),
        &FilterSelection::for_year(2023),
        CostBasis::PurchaseCost,
    )
    .unwrap();
    let cost = dash
        .kpi(Metric::CostOfInventory(CostBasis::PurchaseCost))
        .unwrap();
    assert_eq!(cost.value, 2800.0);
    assert_eq!(dash.kpi(Metric::InventorySold).unwrap().value, 1500.0);
}

#[test]
fn earliest_year_has_no_baseline() {
    let dash = run_pipeline(
        INVENTORY_CSV.as_bytes(),
        now(),
        &FilterSelection::for_year(2022),
        CostBasis::Value,
    )
    .unwrap();
    assert_eq!(dash.subsets.previous_year, None);
    assert!(dash.subsets.previous.is_empty());
    assert!(dash.kpis.iter().all(|(_, k)| k.percent_change == 0.0));
    assert_eq!(dash.kpi(Metric::InventorySold).unwrap().value, 1000.0);
}

#[test]
fn location_filter_narrows_both_periods() {
    let selection = FilterSelection {
        locations: ["Dallas".to_string()].into_iter().collect(),
        year: 2023,
        ..Default::default()
    };
    let dash = run_pipeline(INVENTORY_CSV.as_bytes(), now(), &selection, CostBasis::Value).unwrap();
    assert_eq!(dash.subsets.current.len(), 1);
    assert!(dash.subsets.previous.is_empty());
    assert_eq!(dash.kpi(Metric::InventoryPickedUp).unwrap().value, 1.0);
}

#[test]
fn charts_cover_the_whole_year() {
    let dash = run_pipeline(
        INVENTORY_CSV.as_bytes(),
        now(),
        &FilterSelection::for_year(2023),
        CostBasis::Value,
    )
    .unwrap();

    let (size, sales) = &dash.monthly_sales[0];
    assert_eq!(size, "20FT");
    assert_eq!(sales.points.len(), 12);
    assert_eq!(sales.get(Month::March), 1500.0);
    assert_eq!(sales.total(), 1500.0);

    assert_eq!(dash.gate_flow_by_month.len(), 12);
    assert_eq!(
        dash.gate_flow_by_month[2],
        GateFlow {
            category: "March".to_string(),
            gate_in: 1,
            gate_out: 1
        }
    );
    assert_eq!(dash.gate_flow_by_month[4].gate_out, 0);

    assert_eq!(dash.available_for_sale.get("HOU", "40FT"), Some(1.0));
    assert_eq!(dash.sold_distribution.get("HOU", "20FT"), Some(1.0));
    assert_eq!(dash.kpi_rows().len(), 6);

    let customers: Vec<(&str, usize)> = dash
        .top_customers
        .iter()
        .map(|c| (c.customer.as_str(), c.units))
        .collect();
    assert_eq!(customers, vec![("Acme", 1)]);
}

#[test]
fn rerunning_the_pipeline_is_idempotent() {
    let selection = FilterSelection::for_year(2023);
    let a = run_pipeline(INVENTORY_CSV.as_bytes(), now(), &selection, CostBasis::Value).unwrap();
    let b = run_pipeline(INVENTORY_CSV.as_bytes(), now(), &selection, CostBasis::Value).unwrap();
    assert_eq!(a, b);
    let bits = |d: &inventory_insights::Dashboard| {
        d.kpis
            .iter()
            .map(|(_, k)| (k.value.to_bits(), k.percent_change.to_bits()))
            .collect::<Vec<_>>()
    };
    assert_eq!(bits(&a), bits(&b));
}

#[test]
fn previous_period_skips_missing_years() {
    let csv = "\
Status,Gate In,Gate Out,Value,Sale Price,Repair Cost,Storage Cost,Purchase Cost
SOLD,2019-01-05,,,100,,,
SOLD,2021-01-05,,,200,,,
SOLD,2023-01-05,,,300,,,
";
    let (data, _) = load_dataset(csv.as_bytes(), now()).unwrap();
    assert_eq!(known_years(&data), vec![2019, 2021, 2023]);

    let dash = run_pipeline(
        csv.as_bytes(),
        now(),
        &FilterSelection::for_year(2023),
        CostBasis::Value,
    )
    .unwrap();
    assert_eq!(dash.subsets.previous_year, Some(2021));
    assert_eq!(dash.kpi(Metric::InventorySold).unwrap().percent_change, 50.0);
}

#[test]
fn empty_sheet_is_not_an_error() {
    let csv = "Status,Gate In,Gate Out,Value,Sale Price,Repair Cost,Storage Cost,Purchase Cost\n";
    let dash = run_pipeline(
        csv.as_bytes(),
        now(),
        &FilterSelection::for_year(2024),
        CostBasis::Value,
    )
    .unwrap();
    assert!(!dash.has_data());
    let dwell = dash.kpi(Metric::DwellTime).unwrap();
    assert!(dwell.value.is_nan());
    assert_eq!(dash.summary().kpis[5].value, 0.0);
    assert!(dash.monthly_costs.iter().all(|(_, s)| s.points.len() == 12));
}

#[test]
fn missing_column_aborts_normalization() {
    let csv = "Status,Gate In\nSOLD,2023-01-01\n";
    let err = run_pipeline(
        csv.as_bytes(),
        now(),
        &FilterSelection::for_year(2023),
        CostBasis::Value,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::MissingColumns(ref cols) if cols.contains(&"Gate Out".to_string())));
}

#[test]
fn empty_sums_render_as_plain_zero() {
    let csv = "\
Status,Gate In,Gate Out,Value,Sale Price,Repair Cost,Storage Cost,Purchase Cost
SELL,2023-02-01,,,,,,
";
    let dash = run_pipeline(
        csv.as_bytes(),
        now(),
        &FilterSelection::for_year(2023),
        CostBasis::Value,
    )
    .unwrap();
    let rows = dash.kpi_rows();
    let values: Vec<&str> = rows.iter().take(3).map(|r| r.value.as_str()).collect();
    assert_eq!(values, vec!["$0.00", "$0.00", "$0.00"]);

    let json = serde_json::to_string(&dash.summary()).unwrap();
    assert!(!json.contains("-0.0"), "{json}");
}
