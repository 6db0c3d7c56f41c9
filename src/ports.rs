//! Shipping cost per origin port, bucketed into export tiers.
use crate::types::{PortCost, PortCostRow};
use crate::util::format_number;

pub const HIGH_COST_MIN: f64 = 9000.0;
pub const MID_COST_MIN: f64 = 5000.0;

/// Export volume tiers. Cheap lanes carry the large exports, so the tier
/// runs opposite to the cost: `Large` is the lowest cost band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTier {
    Large,
    Medium,
    Small,
}

impl ExportTier {
    pub fn contains(self, cost: f64) -> bool {
        match self {
            ExportTier::Large => cost < MID_COST_MIN,
            ExportTier::Medium => (MID_COST_MIN..HIGH_COST_MIN).contains(&cost),
            ExportTier::Small => cost >= HIGH_COST_MIN,
        }
    }
}

impl std::str::FromStr for ExportTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "large" => Ok(ExportTier::Large),
            "medium" => Ok(ExportTier::Medium),
            "small" => Ok(ExportTier::Small),
            other => Err(format!("unknown export tier `{}`", other)),
        }
    }
}

/// `(port, cost)` for every port whose `size` cost falls in `tier`, in
/// source order. Ports without a price for that size are left out.
pub fn ports_in_tier(ports: &[PortCost], size: &str, tier: ExportTier) -> Vec<(String, f64)> {
    ports
        .iter()
        .filter_map(|p| p.cost(size).map(|c| (p.port.clone(), c)))
        .filter(|(_, c)| tier.contains(*c))
        .collect()
}

pub fn port_cost_rows(ports: &[(String, f64)]) -> Vec<PortCostRow> {
    ports
        .iter()
        .map(|(port, amount)| PortCostRow {
            port: port.clone(),
            amount: format!("${}", format_number(*amount, 0)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(name: &str, twenty: Option<f64>) -> PortCost {
        PortCost {
            origin: format!("{} (Somewhere)", name),
            port: name.to_string(),
            costs: vec![("20FT".to_string(), twenty)],
        }
    }

    #[test]
    fn tiers_partition_costs() {
        let ports = vec![
            port("A", Some(2000.0)),
            port("B", Some(5000.0)),
            port("C", Some(8999.0)),
            port("D", Some(9000.0)),
            port("E", None),
        ];
        let names = |tier| {
            ports_in_tier(&ports, "20FT", tier)
                .into_iter()
                .map(|(p, _)| p)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(ExportTier::Large), vec!["A"]);
        assert_eq!(names(ExportTier::Medium), vec!["B", "C"]);
        assert_eq!(names(ExportTier::Small), vec!["D"]);
        assert!(ports_in_tier(&ports, "40FT", ExportTier::Large).is_empty());
    }

    #[test]
    fn rows_format_amounts() {
        let rows = port_cost_rows(&[("China".to_string(), 2150.0)]);
        assert_eq!(rows[0].amount, "$2,150");
        assert_eq!("Medium".parse::<ExportTier>(), Ok(ExportTier::Medium));
    }
}
