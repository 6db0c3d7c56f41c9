// Console front-end for the inventory dashboard.
//
// - Option [1] loads and normalizes the inventory sheet.
// - Option [2] picks the location/depot/year filters.
// - Option [3] recomputes the KPI tiles and chart series, prints previews
//   and exports them.
// - Options [4] and [5] report on the trading market and port cost sheets,
//   whose loads are memoised for the configured TTL.
use inventory_insights::aggregate::monthly_rows;
use inventory_insights::cache::TtlCache;
use inventory_insights::config::Config;
use inventory_insights::derived::derive;
use inventory_insights::error::Result;
use inventory_insights::filter::{dimension_options, FilterSelection};
use inventory_insights::loader::{normalize_file, normalize_port_costs_file, normalize_trading_file};
use inventory_insights::market::{
    biggest_moves, city_price_rows, market_price_map, month_label, monthly_container_count,
    monthly_price_by_city, price_by_city, weekly_price_moves, RangePreset, TradingFilter,
};
use inventory_insights::output::{preview_table, write_csv, write_json};
use inventory_insights::ports::{port_cost_rows, ports_in_tier, ExportTier};
use inventory_insights::types::{
    CityMonthRow, CityPriceRow, CrossTabRow, GateFlowRow, NormalizedRecord, PortCost, PriceMapRow,
    PriceMoveRow, RecordRow, TradingRecord,
};
use inventory_insights::util::{format_int, format_number};
use inventory_insights::Dashboard;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const BIGGEST_MOVES_SHOWN: usize = 5;

struct AppState {
    cfg: Config,
    data: Option<Vec<NormalizedRecord>>,
    selection: Option<FilterSelection>,
    trading_cache: TtlCache<PathBuf, Vec<TradingRecord>>,
    port_cache: TtlCache<PathBuf, Vec<PortCost>>,
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice: ")
}

/// Comma-separated multi-select; blank means "all".
fn prompt_set(label: &str, options: &[String]) -> BTreeSet<String> {
    println!("{} options: {}", label, options.join(", "));
    prompt(&format!("{} (comma-separated, blank = All): ", label))
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn prompt_optional(label: &str) -> Option<String> {
    let v = prompt(&format!("{} (blank = All): ", label));
    (!v.is_empty()).then_some(v)
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn handle_load(state: &mut AppState) {
    match normalize_file(&state.cfg.inventory_csv) {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} loaded)",
                format_int(report.total_rows),
                format_int(report.loaded_rows)
            );
            if report.malformed_rows > 0 {
                println!(
                    "Note: {} rows skipped because they could not be read.",
                    format_int(report.malformed_rows)
                );
            }
            if report.unparsed_dates > 0 || report.unparsed_amounts > 0 {
                println!(
                    "Note: {} dates and {} amounts could not be parsed and were left empty.",
                    format_int(report.unparsed_dates),
                    format_int(report.unparsed_amounts)
                );
            }
            println!();
            state.data = Some(data);
            state.selection = None;
        }
        Err(e) => {
            error!("failed to load {}: {}", state.cfg.inventory_csv.display(), e);
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn handle_filters(state: &mut AppState) {
    let Some(data) = &state.data else {
        println!("Error: No data loaded. Please load the inventory file first (option 1).\n");
        return;
    };
    let records = derive(data.clone(), now());
    let options = dimension_options(&records);
    let Some(default_year) = FilterSelection::default_year(&options.years) else {
        println!("No gate-in years found in the data.\n");
        return;
    };

    let locations = prompt_set("Location", &options.locations);
    let depots = prompt_set("Depot", &options.depots);
    let years: Vec<String> = options.years.iter().map(|y| y.to_string()).collect();
    println!("Year options: {}", years.join(", "));
    let year = match prompt(&format!("Year [{}]: ", default_year)).as_str() {
        "" => default_year,
        s => match s.parse::<i32>() {
            Ok(y) if options.years.contains(&y) => y,
            _ => {
                println!("Unknown year, using {}.", default_year);
                default_year
            }
        },
    };
    state.selection = Some(FilterSelection {
        locations,
        depots,
        year,
    });
    println!();
}

fn export_dashboard(state: &AppState, dash: &Dashboard) -> Result<()> {
    let out = &state.cfg.output_dir;
    std::fs::create_dir_all(out)?;

    let kpis = dash.kpi_rows();
    write_csv(out.join("kpis.csv"), &kpis)?;
    preview_table("Key Performance Indicators", None, &kpis, kpis.len());

    let available = dash.available_for_sale.to_rows();
    write_csv(out.join("depot_availability.csv"), &available)?;
    preview_table(
        "Inventory Available for Sale",
        Some("Distinct units by Depot and Size"),
        &available,
        5,
    );

    let sold = dash.sold_distribution.to_rows();
    write_csv(out.join("sold_distribution.csv"), &sold)?;
    preview_table("Sold Inventory Distribution", None, &sold, 5);

    let breakdown = dash.availability_breakdown.to_rows();
    write_csv(out.join("availability_breakdown.csv"), &breakdown)?;

    let sales = monthly_rows(&dash.monthly_sales);
    write_csv(out.join("monthly_sales.csv"), &sales)?;
    preview_table("Sales by Month", Some("Per container size"), &sales, 12);

    let costs: Vec<(String, _)> = dash
        .monthly_costs
        .iter()
        .map(|(name, s)| (name.to_string(), s.clone()))
        .collect();
    let costs: Vec<CrossTabRow> = monthly_rows(&costs);
    write_csv(out.join("monthly_costs.csv"), &costs)?;

    let by_month: Vec<GateFlowRow> = dash.gate_flow_by_month.iter().map(|g| g.to_row()).collect();
    write_csv(out.join("gate_flow_month.csv"), &by_month)?;
    preview_table("Gate In vs. Gate Out over time", None, &by_month, 12);

    let by_depot: Vec<GateFlowRow> = dash.gate_flow_by_depot.iter().map(|g| g.to_row()).collect();
    write_csv(out.join("gate_flow_depot.csv"), &by_depot)?;

    write_csv(out.join("top_customers.csv"), &dash.top_customers)?;
    preview_table("Top Customers", None, &dash.top_customers, 10);

    let records: Vec<RecordRow> = dash.subsets.current.iter().map(RecordRow::from).collect();
    write_csv(out.join("current_records.csv"), &records)?;

    write_json(out.join("dashboard.json"), &dash.summary())?;
    println!("(Full tables exported to {})\n", out.display());
    Ok(())
}

fn handle_dashboard(state: &mut AppState) {
    let Some(data) = &state.data else {
        println!("Error: No data loaded. Please load the inventory file first (option 1).\n");
        return;
    };
    let records = derive(data.clone(), now());
    let selection = match &state.selection {
        Some(s) => s.clone(),
        None => {
            let years = dimension_options(&records).years;
            match FilterSelection::default_year(&years) {
                Some(y) => FilterSelection::for_year(y),
                None => {
                    println!("No gate-in years found in the data.\n");
                    return;
                }
            }
        }
    };

    let dash = Dashboard::build(&records, &selection, state.cfg.cost_basis);
    if !dash.has_data() {
        println!("No Data Record found.\n");
    }
    if let Err(e) = export_dashboard(state, &dash) {
        error!("dashboard export failed: {}", e);
        eprintln!("Write error: {}", e);
    }
}

fn load_trading(state: &mut AppState) -> Option<Vec<TradingRecord>> {
    let path = state.cfg.trading_csv.clone();
    let now = Instant::now();
    state.trading_cache.purge_expired(now);
    let result = state
        .trading_cache
        .get_or_try_insert_with(path.clone(), now, || {
            normalize_trading_file(&path).map(|(records, _)| records)
        });
    match result {
        Ok(records) => Some(records),
        Err(e) => {
            warn!("trading prices unavailable: {}", e);
            println!("Error retrieving trading prices: {}\n", e);
            None
        }
    }
}

fn handle_trading(state: &mut AppState) {
    let Some(records) = load_trading(state) else {
        return;
    };
    let range = prompt("Range [All/YTD/6m/1y/2y]: ")
        .parse::<RangePreset>()
        .unwrap_or(RangePreset::All);
    let filter = TradingFilter {
        container_type: prompt_optional("Container Type"),
        container_condition: prompt_optional("Container Condition"),
        start: range.start(now().date()),
        ..Default::default()
    };
    let filtered = filter.apply(&records);
    info!("trading report over {} of {} rows", filtered.len(), records.len());

    let by_city = city_price_rows(&price_by_city(&filtered));
    preview_table("Container Prices w.r.t Location", None, &by_city, 10);

    println!("Listed Container Count");
    for p in monthly_container_count(&filtered) {
        println!(
            "  {}: {} ({:+.2}%)",
            month_label(p.month),
            format_number(p.container_count, 0),
            p.change_pct
        );
    }
    println!();

    let moves = weekly_price_moves(&filtered);
    let (growth, drop) = biggest_moves(&moves, BIGGEST_MOVES_SHOWN);
    let growth: Vec<PriceMoveRow> = growth.iter().map(|m| m.to_row()).collect();
    let drop: Vec<PriceMoveRow> = drop.iter().map(|m| m.to_row()).collect();
    preview_table("Locations with biggest Week-on-Week growth", None, &growth, BIGGEST_MOVES_SHOWN);
    preview_table("Locations with biggest Week-on-Week drop", None, &drop, BIGGEST_MOVES_SHOWN);

    let cities: Vec<&str> = filtered
        .iter()
        .map(|r| r.city.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    println!("City options: {}", cities.join(", "));
    let city_filter = TradingFilter {
        city: prompt_optional("City"),
        ..Default::default()
    };
    let city_data = city_filter.apply(&filtered);

    let monthly: Vec<CityMonthRow> = monthly_price_by_city(&city_data)
        .iter()
        .map(|p| p.to_row())
        .collect();
    preview_table("Container Prices & Count over time", None, &monthly, 12);
    let price_map = market_price_map(&city_data).to_rows();
    preview_table("Market Price Map", Some("Summed price by month and year"), &price_map, 12);

    let all_moves: Vec<PriceMoveRow> = moves.iter().map(|m| m.to_row()).collect();
    let exports = TradingExports {
        by_city: &by_city,
        moves: &all_moves,
        monthly: &monthly,
        price_map: &price_map,
    };
    if let Err(e) = exports.write(&state.cfg.output_dir) {
        error!("trading export failed: {}", e);
        eprintln!("Write error: {}", e);
    }
}

struct TradingExports<'a> {
    by_city: &'a [CityPriceRow],
    moves: &'a [PriceMoveRow],
    monthly: &'a [CityMonthRow],
    price_map: &'a [PriceMapRow],
}

impl TradingExports<'_> {
    fn write(&self, out: &Path) -> Result<()> {
        std::fs::create_dir_all(out)?;
        write_csv(out.join("trading_city_prices.csv"), self.by_city)?;
        write_csv(out.join("trading_weekly_moves.csv"), self.moves)?;
        write_csv(out.join("trading_city_monthly.csv"), self.monthly)?;
        write_csv(out.join("trading_price_map.csv"), self.price_map)?;
        Ok(())
    }
}

fn handle_ports(state: &mut AppState) {
    let path = state.cfg.port_costs_csv.clone();
    let now = Instant::now();
    state.port_cache.purge_expired(now);
    let ports = match state
        .port_cache
        .get_or_try_insert_with(path.clone(), now, || {
            normalize_port_costs_file(&path)
        }) {
        Ok(p) => p,
        Err(e) => {
            println!("Error retrieving port costs: {}\n", e);
            return;
        }
    };
    let size = match prompt("Size [20FT/40FT]: ").to_uppercase().as_str() {
        "" => "20FT".to_string(),
        s => s.to_string(),
    };
    let tier = prompt("Export Size [Large/Medium/Small]: ")
        .parse::<ExportTier>()
        .unwrap_or(ExportTier::Large);
    let rows = port_cost_rows(&ports_in_tier(&ports, &size, tier));
    preview_table(
        "Shipping Container Costs From Western US",
        Some(format!("{} containers, {:?} exports", size, tier).as_str()),
        &rows,
        rows.len(),
    );
}

fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    let mut state = AppState {
        trading_cache: TtlCache::new(cfg.market_cache_ttl),
        port_cache: TtlCache::new(cfg.market_cache_ttl),
        cfg,
        data: None,
        selection: None,
    };
    info!(
        "market data loads are cached for {}s",
        state.trading_cache.ttl().as_secs()
    );

    loop {
        println!("Inventory Insights");
        println!("[1] Load the inventory file");
        println!("[2] Choose filters");
        println!("[3] Generate dashboard");
        println!("[4] Trading prices");
        println!("[5] Port shipping costs");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&mut state),
            "2" => handle_filters(&mut state),
            "3" => {
                println!();
                handle_dashboard(&mut state);
            }
            "4" => handle_trading(&mut state),
            "5" => handle_ports(&mut state),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-5.\n"),
        }
    }
}
