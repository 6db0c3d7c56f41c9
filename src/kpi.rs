//! Business metrics with their period-over-period change.
//!
//! Every metric is a reduction over a subset of records; the change compares
//! the reduction over the selected period with the one over the previous
//! known period.
use crate::types::{InventoryRecord, STATUS_PKUP, STATUS_SOLD};
use crate::util::{format_kpi_value, mean_present, nan_to_zero, percent_change, sum_present};
use serde::Serialize;

/// Which amount the Cost of Inventory tile sums. Sheets from different
/// periods disagree, so this is configuration rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CostBasis {
    #[default]
    Value,
    PurchaseCost,
}

impl CostBasis {
    fn amount(self, r: &InventoryRecord) -> Option<f64> {
        match self {
            CostBasis::Value => r.value,
            CostBasis::PurchaseCost => r.purchase_cost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    CostOfInventory(CostBasis),
    InventorySold,
    InventoryUnderRepair,
    InventoryPickedUp,
    GateInAging,
    DwellTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiResult {
    pub value: f64,
    pub percent_change: f64,
}

impl KpiResult {
    /// The value as shown on a tile: a mean over nothing displays as 0.
    pub fn display_value(&self) -> f64 {
        nan_to_zero(self.value)
    }
}

impl Metric {
    pub fn all(basis: CostBasis) -> [Metric; 6] {
        [
            Metric::CostOfInventory(basis),
            Metric::InventorySold,
            Metric::InventoryUnderRepair,
            Metric::InventoryPickedUp,
            Metric::GateInAging,
            Metric::DwellTime,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::CostOfInventory(_) => "Cost of Inventory",
            Metric::InventorySold => "Inventory Sold",
            Metric::InventoryUnderRepair => "Inventory Undergoing Repairs",
            Metric::InventoryPickedUp => "Inventory Picked Up",
            Metric::GateInAging => "Inv Aging",
            Metric::DwellTime => "Dwell Time",
        }
    }

    pub fn reduce(&self, subset: &[InventoryRecord]) -> f64 {
        match self {
            Metric::CostOfInventory(basis) => sum_present(
                subset
                    .iter()
                    .filter(|r| !r.has_status(STATUS_SOLD))
                    .map(|r| basis.amount(r)),
            ),
            Metric::InventorySold => sum_present(
                subset
                    .iter()
                    .filter(|r| r.has_status(STATUS_SOLD))
                    .map(|r| r.sale_price),
            ),
            Metric::InventoryUnderRepair => sum_present(subset.iter().map(|r| r.repair_cost)),
            Metric::InventoryPickedUp => {
                subset.iter().filter(|r| r.has_status(STATUS_PKUP)).count() as f64
            }
            Metric::GateInAging => {
                mean_present(subset.iter().map(|r| Some(r.inventory_aging_days as f64)))
            }
            Metric::DwellTime => {
                mean_present(subset.iter().map(|r| r.dwell_time_days.map(|d| d as f64)))
            }
        }
    }

    pub fn compute(&self, current: &[InventoryRecord], previous: &[InventoryRecord]) -> KpiResult {
        let value = self.reduce(current);
        let baseline = if previous.is_empty() {
            0.0
        } else {
            self.reduce(previous)
        };
        KpiResult {
            value,
            percent_change: percent_change(value, baseline),
        }
    }

    /// Tile text for the value, in the unit the metric is measured in.
    pub fn render_value(&self, result: &KpiResult) -> String {
        let v = result.display_value();
        match self {
            Metric::CostOfInventory(_) | Metric::InventorySold | Metric::InventoryUnderRepair => {
                format_kpi_value(v)
            }
            Metric::InventoryPickedUp => format!("{} items", v as i64),
            Metric::GateInAging => format!("{:.1} days", v),
            Metric::DwellTime => format!("{} days", v.trunc() as i64),
        }
    }

    pub fn render_change(result: &KpiResult) -> String {
        format!("{:.1}%", nan_to_zero(result.percent_change))
    }
}

pub fn compute_all(
    current: &[InventoryRecord],
    previous: &[InventoryRecord],
    basis: CostBasis,
) -> Vec<(Metric, KpiResult)> {
    Metric::all(basis)
        .into_iter()
        .map(|m| (m, m.compute(current, previous)))
        .collect()
}
