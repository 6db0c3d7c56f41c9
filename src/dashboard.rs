//! One full recomputation of the dashboard for a filter selection.
//!
//! normalize → derive → filter → KPIs and chart series. Nothing is kept
//! between runs except the raw input the caller owns.
use crate::aggregate::{
    availability_breakdown, gate_flow_by_depot, gate_flow_by_month, monthly_cost_breakdown,
    monthly_sales_by_size, top_customers, units_by_depot_and_size, CrossTab, GateFlow,
    MonthlySeries, TOP_CUSTOMERS,
};
use crate::derived::derive;
use crate::error::SchemaError;
use crate::filter::{apply, FilterSelection, PeriodSubsets};
use crate::kpi::{compute_all, CostBasis, KpiResult, Metric};
use crate::loader::{normalize, LoadReport};
use crate::types::{
    CustomerRow, DashboardSummary, InventoryRecord, KpiRow, KpiSummary, STATUS_SELL, STATUS_SOLD,
};
use crate::util::nan_to_zero;
use chrono::NaiveDateTime;
use std::io::Read;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub selection: FilterSelection,
    pub subsets: PeriodSubsets,
    pub kpis: Vec<(Metric, KpiResult)>,
    pub available_for_sale: CrossTab,
    pub sold_distribution: CrossTab,
    pub availability_breakdown: CrossTab,
    pub monthly_sales: Vec<(String, MonthlySeries)>,
    pub monthly_costs: Vec<(&'static str, MonthlySeries)>,
    pub gate_flow_by_month: Vec<GateFlow>,
    pub gate_flow_by_depot: Vec<GateFlow>,
    pub top_customers: Vec<CustomerRow>,
}

impl Dashboard {
    pub fn build(data: &[InventoryRecord], selection: &FilterSelection, basis: CostBasis) -> Self {
        let subsets = apply(data, selection);
        let current = &subsets.current;
        let kpis = compute_all(current, &subsets.previous, basis);
        info!(
            "dashboard for {}: {} rows (previous period {:?}: {} rows)",
            selection.year,
            current.len(),
            subsets.previous_year,
            subsets.previous.len()
        );
        Self {
            available_for_sale: units_by_depot_and_size(current, STATUS_SELL),
            sold_distribution: units_by_depot_and_size(current, STATUS_SOLD),
            availability_breakdown: availability_breakdown(current),
            monthly_sales: monthly_sales_by_size(current),
            monthly_costs: monthly_cost_breakdown(current),
            gate_flow_by_month: gate_flow_by_month(current),
            gate_flow_by_depot: gate_flow_by_depot(current),
            top_customers: top_customers(current, TOP_CUSTOMERS),
            selection: selection.clone(),
            kpis,
            subsets,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.subsets.current.is_empty()
    }

    pub fn kpi(&self, metric: Metric) -> Option<KpiResult> {
        self.kpis
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, k)| *k)
    }

    pub fn kpi_rows(&self) -> Vec<KpiRow> {
        self.kpis
            .iter()
            .map(|(m, k)| KpiRow {
                metric: m.label().to_string(),
                value: m.render_value(k),
                change: Metric::render_change(k),
            })
            .collect()
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            selected_year: self.selection.year,
            previous_year: self.subsets.previous_year,
            current_rows: self.subsets.current.len(),
            previous_rows: self.subsets.previous.len(),
            kpis: self
                .kpis
                .iter()
                .map(|(m, k)| KpiSummary {
                    metric: m.label().to_string(),
                    value: k.display_value(),
                    percent_change: nan_to_zero(k.percent_change),
                })
                .collect(),
        }
    }
}

/// Normalize and derive a raw inventory sheet against a single `now`.
pub fn load_dataset<R: Read>(
    reader: R,
    now: NaiveDateTime,
) -> Result<(Vec<InventoryRecord>, LoadReport), SchemaError> {
    let (records, report) = normalize(reader)?;
    Ok((derive(records, now), report))
}

/// The whole pipeline from raw CSV to a dashboard.
pub fn run_pipeline<R: Read>(
    reader: R,
    now: NaiveDateTime,
    selection: &FilterSelection,
    basis: CostBasis,
) -> Result<Dashboard, SchemaError> {
    let (data, _) = load_dataset(reader, now)?;
    Ok(Dashboard::build(&data, selection, basis))
}
