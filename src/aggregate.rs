//! Grouped series behind the inventory charts.
//!
//! Every function here is a deterministic group-by over an already filtered
//! subset. Month-indexed output always covers the whole calendar year so the
//! charts keep a fixed x-axis.
use crate::types::{CrossTabRow, CustomerRow, GateFlowRow, InventoryRecord, STATUS_SELL};
use crate::util::format_number;
use chrono::Month;
use std::collections::{BTreeMap, BTreeSet};

pub const TOP_CUSTOMERS: usize = 10;

pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Exactly twelve `(month, amount)` points, January first.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    pub points: Vec<(Month, f64)>,
}

impl MonthlySeries {
    fn from_totals(totals: &[f64; 12]) -> Self {
        Self {
            points: MONTHS.iter().copied().zip(totals.iter().copied()).collect(),
        }
    }

    pub fn get(&self, month: Month) -> f64 {
        self.points[month.number_from_month() as usize - 1].1
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|(_, v)| v).sum()
    }
}

/// Two-dimensional count/sum table, missing combinations filled with zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrossTab {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `cells[row][column]`
    pub cells: Vec<Vec<f64>>,
}

impl CrossTab {
    fn from_map(map: BTreeMap<(String, String), f64>) -> Self {
        let row_labels: Vec<String> = map
            .keys()
            .map(|(r, _)| r.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let column_labels: Vec<String> = map
            .keys()
            .map(|(_, c)| c.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let cells = row_labels
            .iter()
            .map(|r| {
                column_labels
                    .iter()
                    .map(|c| map.get(&(r.clone(), c.clone())).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();
        Self {
            row_labels,
            column_labels,
            cells,
        }
    }

    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.column_labels.iter().position(|l| l == column)?;
        Some(self.cells[r][c])
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }

    /// Long format, one row per cell.
    pub fn to_rows(&self) -> Vec<CrossTabRow> {
        let mut out = Vec::new();
        for (r, row) in self.row_labels.iter().zip(&self.cells) {
            for (c, v) in self.column_labels.iter().zip(row) {
                out.push(CrossTabRow {
                    group: r.clone(),
                    category: c.clone(),
                    amount: format_number(*v, 0),
                });
            }
        }
        out
    }
}

/// Gate-in and gate-out counts for one category. Counts are always
/// non-negative; `diverging` is the chart-only view with gate-outs below
/// the axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateFlow {
    pub category: String,
    pub gate_in: i64,
    pub gate_out: i64,
}

impl GateFlow {
    pub fn diverging(&self) -> (i64, i64) {
        (self.gate_in, -self.gate_out)
    }

    pub fn to_row(&self) -> GateFlowRow {
        let (gate_in, gate_out) = self.diverging();
        GateFlowRow {
            category: self.category.clone(),
            gate_in,
            gate_out,
        }
    }
}

fn month_index(r: &InventoryRecord) -> Option<usize> {
    r.month.map(|m| m.number_from_month() as usize - 1)
}

/// Sum `value` per gate-in month. Records without a gate-in month are left
/// out; missing amounts count as zero.
pub fn aggregate_by_month<F>(records: &[InventoryRecord], value: F) -> MonthlySeries
where
    F: Fn(&InventoryRecord) -> Option<f64>,
{
    let mut totals = [0.0; 12];
    for r in records {
        if let Some(i) = month_index(r) {
            totals[i] += value(r).unwrap_or(0.0);
        }
    }
    MonthlySeries::from_totals(&totals)
}

/// Distinct units per depot and size for one status. `SELL` gives the
/// inventory available for sale, `SOLD` the sold distribution.
pub fn units_by_depot_and_size(records: &[InventoryRecord], status: &str) -> CrossTab {
    let mut units: BTreeMap<(String, String), BTreeSet<&str>> = BTreeMap::new();
    for r in records.iter().filter(|r| r.has_status(status)) {
        let (Some(depot), Some(size)) = (&r.depot, &r.size) else {
            continue;
        };
        let entry = units.entry((depot.clone(), size.clone())).or_default();
        if let Some(unit) = &r.unit_id {
            entry.insert(unit.as_str());
        }
    }
    CrossTab::from_map(
        units
            .into_iter()
            .map(|(k, set)| (k, set.len() as f64))
            .collect(),
    )
}

/// Row counts of the units available for sale by size and condition.
pub fn availability_breakdown(records: &[InventoryRecord]) -> CrossTab {
    let mut counts: BTreeMap<(String, String), f64> = BTreeMap::new();
    for r in records.iter().filter(|r| r.has_status(STATUS_SELL)) {
        if let (Some(size), Some(condition)) = (&r.size, &r.condition) {
            *counts.entry((size.clone(), condition.clone())).or_default() += 1.0;
        }
    }
    CrossTab::from_map(counts)
}

/// Sale price per month, one series per container size.
pub fn monthly_sales_by_size(records: &[InventoryRecord]) -> Vec<(String, MonthlySeries)> {
    let sizes: BTreeSet<&String> = records.iter().filter_map(|r| r.size.as_ref()).collect();
    sizes
        .into_iter()
        .map(|size| {
            let series = aggregate_by_month(records, |r| {
                if r.size.as_ref() == Some(size) {
                    r.sale_price
                } else {
                    None
                }
            });
            (size.clone(), series)
        })
        .collect()
}

/// Storage, repair and purchase cost per month.
pub fn monthly_cost_breakdown(records: &[InventoryRecord]) -> Vec<(&'static str, MonthlySeries)> {
    vec![
        ("Storage Cost", aggregate_by_month(records, |r| r.storage_cost)),
        ("Repair Cost", aggregate_by_month(records, |r| r.repair_cost)),
        ("Purchase Cost", aggregate_by_month(records, |r| r.purchase_cost)),
    ]
}

/// Gate-in and gate-out counts per gate-in month, all twelve months present.
pub fn gate_flow_by_month(records: &[InventoryRecord]) -> Vec<GateFlow> {
    let mut counts = [(0i64, 0i64); 12];
    for r in records {
        if let Some(i) = month_index(r) {
            counts[i].0 += r.gate_in.is_some() as i64;
            counts[i].1 += r.gate_out.is_some() as i64;
        }
    }
    MONTHS
        .iter()
        .zip(counts)
        .map(|(m, (gate_in, gate_out))| GateFlow {
            category: m.name().to_string(),
            gate_in,
            gate_out,
        })
        .collect()
}

pub fn gate_flow_by_depot(records: &[InventoryRecord]) -> Vec<GateFlow> {
    let mut counts: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for r in records {
        if let Some(depot) = &r.depot {
            let e = counts.entry(depot.as_str()).or_default();
            e.0 += r.gate_in.is_some() as i64;
            e.1 += r.gate_out.is_some() as i64;
        }
    }
    counts
        .into_iter()
        .map(|(depot, (gate_in, gate_out))| GateFlow {
            category: depot.to_string(),
            gate_in,
            gate_out,
        })
        .collect()
}

/// Customers with the most records in the subset, largest first. Ties are
/// broken by name; rows without a customer are ignored.
pub fn top_customers(records: &[InventoryRecord], n: usize) -> Vec<CustomerRow> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        if let Some(customer) = &r.customer {
            *counts.entry(customer.as_str()).or_default() += 1;
        }
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(n)
        .map(|(customer, units)| CustomerRow {
            customer: customer.to_string(),
            units,
        })
        .collect()
}

/// Flatten named monthly series into long rows for export.
pub fn monthly_rows(series: &[(String, MonthlySeries)]) -> Vec<CrossTabRow> {
    series
        .iter()
        .flat_map(|(name, s)| {
            s.points.iter().map(move |(m, v)| CrossTabRow {
                group: name.clone(),
                category: m.name().to_string(),
                amount: format_number(*v, 2),
            })
        })
        .collect()
}
