//! Schema normalization for the three tabular inputs: the inventory sheet,
//! the trading market price sheet and the per-port shipping cost table.
//!
//! Column names are trimmed before they are matched. A required column that
//! is absent fails the whole load with [`SchemaError::MissingColumns`]; a bad
//! cell only ever turns into `None`.
use crate::error::SchemaError;
use crate::types::{NormalizedRecord, PortCost, RawRow, RawTradingRow, TradingRecord};
use crate::util::{parse_currency, parse_date_safe, parse_datetime_safe};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

pub const REQUIRED_INVENTORY_COLUMNS: &[&str] = &[
    "Status",
    "Gate In",
    "Gate Out",
    "Value",
    "Sale Price",
    "Repair Cost",
    "Storage Cost",
    "Purchase Cost",
];

pub const REQUIRED_TRADING_COLUMNS: &[&str] = &[
    "DATE",
    "CITY",
    "CONTAINER_TYPE",
    "CONTAINER_CONDITION",
    "MARKET_PRICE_USD",
    "CONTAINER_COUNT",
];

pub const PORT_ORIGIN_COLUMN: &str = "Origin Country (Port/City)";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    /// Rows the CSV reader could not map onto the schema at all.
    pub malformed_rows: usize,
    /// Non-blank date cells that did not parse.
    pub unparsed_dates: usize,
    /// Non-blank amount cells that did not parse.
    pub unparsed_amounts: usize,
}

fn reader_for<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader)
}

fn check_columns(headers: &StringRecord, required: &[&str]) -> Result<(), SchemaError> {
    let missing: Vec<String> = required
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns(missing))
    }
}

/// Decode a raw row, replacing invalid UTF-8 with U+FFFD so one badly
/// encoded text cell does not cost the rest of the row.
fn decode_row<T: DeserializeOwned>(
    bytes: ByteRecord,
    headers: &StringRecord,
) -> Result<T, csv::Error> {
    StringRecord::from_byte_record_lossy(bytes).deserialize(Some(headers))
}

fn clean_text(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Counts cells that had content but did not survive parsing.
#[derive(Default)]
struct ParseTally {
    dates: usize,
    amounts: usize,
}

impl ParseTally {
    fn date(&mut self, raw: Option<&str>) -> Option<chrono::NaiveDateTime> {
        let parsed = parse_datetime_safe(raw);
        if parsed.is_none() && raw.is_some_and(|s| !s.trim().is_empty()) {
            self.dates += 1;
        }
        parsed
    }

    fn amount(&mut self, raw: Option<&str>) -> Option<f64> {
        let parsed = parse_currency(raw);
        if parsed.is_none() && raw.is_some_and(|s| !s.trim().is_empty()) {
            self.amounts += 1;
        }
        parsed
    }
}

/// Normalize the inventory sheet into canonical records.
pub fn normalize<R: Read>(reader: R) -> Result<(Vec<NormalizedRecord>, LoadReport), SchemaError> {
    let mut rdr = reader_for(reader);
    let headers = rdr.headers()?.clone();
    check_columns(&headers, REQUIRED_INVENTORY_COLUMNS)?;

    let mut report = LoadReport::default();
    let mut tally = ParseTally::default();
    let mut records = Vec::new();

    for result in rdr.byte_records() {
        report.total_rows += 1;
        let row = match result.and_then(|b| decode_row::<RawRow>(b, &headers)) {
            Ok(r) => r,
            Err(e) => {
                debug!("skipping row {}: {}", report.total_rows, e);
                report.malformed_rows += 1;
                continue;
            }
        };

        records.push(NormalizedRecord {
            gate_in: tally.date(row.gate_in.as_deref()),
            gate_out: tally.date(row.gate_out.as_deref()),
            value: tally.amount(row.value.as_deref()),
            sale_price: tally.amount(row.sale_price.as_deref()),
            repair_cost: tally.amount(row.repair_cost.as_deref()),
            storage_cost: tally.amount(row.storage_cost.as_deref()),
            purchase_cost: tally.amount(row.purchase_cost.as_deref()),
            unit_id: clean_text(row.unit_id),
            location: clean_text(row.location),
            depot: clean_text(row.depot),
            size: clean_text(row.size),
            condition: clean_text(row.condition),
            customer: clean_text(row.customer),
            status: row.status.map(|s| s.trim().to_string()).unwrap_or_default(),
        });
    }

    report.loaded_rows = records.len();
    report.unparsed_dates = tally.dates;
    report.unparsed_amounts = tally.amounts;
    info!(
        "normalized inventory: {} of {} rows loaded",
        report.loaded_rows, report.total_rows
    );
    if report.unparsed_dates > 0 || report.unparsed_amounts > 0 {
        warn!(
            "{} date cells and {} amount cells could not be parsed and were left empty",
            report.unparsed_dates, report.unparsed_amounts
        );
    }
    Ok((records, report))
}

pub fn normalize_file<P: AsRef<Path>>(
    path: P,
) -> Result<(Vec<NormalizedRecord>, LoadReport), SchemaError> {
    let file = std::fs::File::open(path)?;
    normalize(file)
}

/// Normalize the trading market sheet. Rows without a usable date are
/// dropped, since every trading series is keyed by time; missing prices and
/// counts contribute zero.
pub fn normalize_trading<R: Read>(
    reader: R,
) -> Result<(Vec<TradingRecord>, LoadReport), SchemaError> {
    let mut rdr = reader_for(reader);
    let headers = rdr.headers()?.clone();
    check_columns(&headers, REQUIRED_TRADING_COLUMNS)?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for result in rdr.byte_records() {
        report.total_rows += 1;
        let Ok(row) = result.and_then(|b| decode_row::<RawTradingRow>(b, &headers)) else {
            report.malformed_rows += 1;
            continue;
        };
        let Some(date) = parse_date_safe(row.date.as_deref()) else {
            report.unparsed_dates += 1;
            continue;
        };
        let price = parse_currency(row.market_price_usd.as_deref());
        let count = parse_currency(row.container_count.as_deref());
        if price.is_none() || count.is_none() {
            report.unparsed_amounts += 1;
        }
        records.push(TradingRecord {
            date,
            city: clean_text(row.city).unwrap_or_else(|| "Unknown".to_string()),
            container_type: clean_text(row.container_type).unwrap_or_default(),
            container_condition: clean_text(row.container_condition).unwrap_or_default(),
            market_price_usd: price.unwrap_or(0.0),
            container_count: count.unwrap_or(0.0),
        });
    }

    report.loaded_rows = records.len();
    info!(
        "normalized trading prices: {} of {} rows loaded",
        report.loaded_rows, report.total_rows
    );
    Ok((records, report))
}

pub fn normalize_trading_file<P: AsRef<Path>>(
    path: P,
) -> Result<(Vec<TradingRecord>, LoadReport), SchemaError> {
    let file = std::fs::File::open(path)?;
    normalize_trading(file)
}

/// Normalize a shipping-cost table. Every column whose name contains `FT`
/// (`20FT`, `40FT`, ...) is a container-size price column.
pub fn normalize_port_costs<R: Read>(reader: R) -> Result<Vec<PortCost>, SchemaError> {
    let mut rdr = reader_for(reader);
    let headers = rdr.headers()?.clone();
    check_columns(&headers, &[PORT_ORIGIN_COLUMN])?;

    let origin_idx = headers.iter().position(|h| h == PORT_ORIGIN_COLUMN);
    let size_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.contains("FT"))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut ports = Vec::new();
    for result in rdr.byte_records() {
        let Ok(record) = result.map(StringRecord::from_byte_record_lossy) else {
            continue;
        };
        let origin = origin_idx
            .and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string();
        if origin.is_empty() {
            continue;
        }
        let port = origin
            .split(" (")
            .next()
            .unwrap_or(origin.as_str())
            .to_string();
        let costs = size_cols
            .iter()
            .map(|(i, col)| (col.clone(), parse_currency(record.get(*i))))
            .collect();
        ports.push(PortCost {
            origin,
            port,
            costs,
        });
    }
    info!("normalized {} port cost rows", ports.len());
    Ok(ports)
}

pub fn normalize_port_costs_file<P: AsRef<Path>>(path: P) -> Result<Vec<PortCost>, SchemaError> {
    let file = std::fs::File::open(path)?;
    normalize_port_costs(file)
}
