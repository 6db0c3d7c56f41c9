use chrono::{Month, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

pub const STATUS_SELL: &str = "SELL";
pub const STATUS_SOLD: &str = "SOLD";
pub const STATUS_PKUP: &str = "PKUP";

/// One spreadsheet row as exported, before any cleaning. Every cell is
/// optional so that a blank or missing optional column never aborts a load.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Unit #")]
    pub unit_id: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "Depot")]
    pub depot: Option<String>,
    #[serde(rename = "Size")]
    pub size: Option<String>,
    #[serde(rename = "Condition")]
    pub condition: Option<String>,
    #[serde(rename = "Customer")]
    pub customer: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "Gate In")]
    pub gate_in: Option<String>,
    #[serde(rename = "Gate Out")]
    pub gate_out: Option<String>,
    #[serde(rename = "Value")]
    pub value: Option<String>,
    #[serde(rename = "Sale Price")]
    pub sale_price: Option<String>,
    #[serde(rename = "Repair Cost")]
    pub repair_cost: Option<String>,
    #[serde(rename = "Storage Cost")]
    pub storage_cost: Option<String>,
    #[serde(rename = "Purchase Cost")]
    pub purchase_cost: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    pub unit_id: Option<String>,
    pub location: Option<String>,
    pub depot: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub customer: Option<String>,
    pub status: String,
    pub gate_in: Option<NaiveDateTime>,
    pub gate_out: Option<NaiveDateTime>,
    pub value: Option<f64>,
    pub sale_price: Option<f64>,
    pub repair_cost: Option<f64>,
    pub storage_cost: Option<f64>,
    pub purchase_cost: Option<f64>,
}

/// A normalized record together with the fields derived from its gate
/// timestamps. The derived fields are only ever written by `derive`.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRecord {
    pub unit_id: Option<String>,
    pub location: Option<String>,
    pub depot: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub customer: Option<String>,
    pub status: String,
    pub gate_in: Option<NaiveDateTime>,
    pub gate_out: Option<NaiveDateTime>,
    pub value: Option<f64>,
    pub sale_price: Option<f64>,
    pub repair_cost: Option<f64>,
    pub storage_cost: Option<f64>,
    pub purchase_cost: Option<f64>,
    pub inventory_aging_days: i64,
    pub dwell_time_days: Option<i64>,
    pub month: Option<Month>,
    /// Calendar year of `gate_in`, `0` when there is no gate-in date.
    pub year: i32,
}

impl InventoryRecord {
    pub fn has_status(&self, status: &str) -> bool {
        self.status == status
    }
}

#[derive(Debug, Deserialize)]
pub struct RawTradingRow {
    #[serde(rename = "DATE")]
    pub date: Option<String>,
    #[serde(rename = "CITY")]
    pub city: Option<String>,
    #[serde(rename = "CONTAINER_TYPE")]
    pub container_type: Option<String>,
    #[serde(rename = "CONTAINER_CONDITION")]
    pub container_condition: Option<String>,
    #[serde(rename = "MARKET_PRICE_USD")]
    pub market_price_usd: Option<String>,
    #[serde(rename = "CONTAINER_COUNT")]
    pub container_count: Option<String>,
}

/// One listing snapshot from the container trading market sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingRecord {
    pub date: NaiveDate,
    pub city: String,
    pub container_type: String,
    pub container_condition: String,
    pub market_price_usd: f64,
    pub container_count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortCost {
    pub origin: String,
    pub port: String,
    /// `(column, amount)` for every size column such as `20FT` or `40FT`.
    pub costs: Vec<(String, Option<f64>)>,
}

impl PortCost {
    pub fn cost(&self, size: &str) -> Option<f64> {
        self.costs
            .iter()
            .find(|(col, _)| col == size)
            .and_then(|(_, v)| *v)
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Change")]
    #[tabled(rename = "Change")]
    pub change: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CrossTabRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Amount")]
    #[tabled(rename = "Amount")]
    pub amount: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GateFlowRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "GateIn")]
    #[tabled(rename = "GateIn")]
    pub gate_in: i64,
    #[serde(rename = "GateOut")]
    #[tabled(rename = "GateOut")]
    pub gate_out: i64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct CustomerRow {
    #[serde(rename = "Customer")]
    #[tabled(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Units")]
    #[tabled(rename = "Units")]
    pub units: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CityPriceRow {
    #[serde(rename = "City")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "MarketPrice")]
    #[tabled(rename = "MarketPrice")]
    pub market_price: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PriceMoveRow {
    #[serde(rename = "CityArea")]
    #[tabled(rename = "City Area")]
    pub city: String,
    #[serde(rename = "WeekEnding")]
    #[tabled(rename = "Week Ending")]
    pub week_ending: String,
    #[serde(rename = "MarketPrice")]
    #[tabled(rename = "Market Price")]
    pub market_price: String,
    #[serde(rename = "WeekOnWeekChange")]
    #[tabled(rename = "Week-on-Week Change")]
    pub change: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CityMonthRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "City")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "MarketPrice")]
    #[tabled(rename = "Market Price")]
    pub market_price: String,
    #[serde(rename = "ContainerCount")]
    #[tabled(rename = "Container Count")]
    pub container_count: String,
}

/// One filled cell of the year by month price map.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PriceMapRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "MarketPrice")]
    #[tabled(rename = "Market Price")]
    pub market_price: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PortCostRow {
    #[serde(rename = "Port")]
    #[tabled(rename = "Port")]
    pub port: String,
    #[serde(rename = "Amount")]
    #[tabled(rename = "Amount($)")]
    pub amount: String,
}

/// Display rendition of a filtered record for the tabular view.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RecordRow {
    #[serde(rename = "Unit")]
    #[tabled(rename = "Unit")]
    pub unit_id: String,
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: String,
    #[serde(rename = "Depot")]
    #[tabled(rename = "Depot")]
    pub depot: String,
    #[serde(rename = "Size")]
    #[tabled(rename = "Size")]
    pub size: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "GateIn")]
    #[tabled(rename = "GateIn")]
    pub gate_in: String,
    #[serde(rename = "GateOut")]
    #[tabled(rename = "GateOut")]
    pub gate_out: String,
    #[serde(rename = "AgingDays")]
    #[tabled(rename = "AgingDays")]
    pub aging_days: i64,
    #[serde(rename = "DwellDays")]
    #[tabled(rename = "DwellDays")]
    pub dwell_days: String,
}

impl From<&InventoryRecord> for RecordRow {
    fn from(r: &InventoryRecord) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let date = |d: &Option<NaiveDateTime>| {
            d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
        };
        RecordRow {
            unit_id: text(&r.unit_id),
            location: text(&r.location),
            depot: text(&r.depot),
            size: text(&r.size),
            status: r.status.clone(),
            gate_in: date(&r.gate_in),
            gate_out: date(&r.gate_out),
            aging_days: r.inventory_aging_days,
            dwell_days: r.dwell_time_days.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

/// Everything the dashboard shows for one filter selection, in a form that
/// serialises cleanly to JSON.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub selected_year: i32,
    pub previous_year: Option<i32>,
    pub current_rows: usize,
    pub previous_rows: usize,
    pub kpis: Vec<KpiSummary>,
}

#[derive(Debug, Serialize)]
pub struct KpiSummary {
    pub metric: String,
    pub value: f64,
    pub percent_change: f64,
}
