use crate::error::{AppError, Result};
use crate::kpi::CostBasis;
use std::path::PathBuf;
use std::time::Duration;

pub const INVENTORY_CSV: &str = "inventory.csv";
pub const TRADING_CSV: &str = "trading_prices.csv";
pub const PORT_COSTS_CSV: &str = "port_costs.csv";

/// Default lifetime of a memoised trading or port-cost load.
pub const MARKET_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    /// Gate-in/gate-out sheet export (INVENTORY_CSV)
    pub inventory_csv: PathBuf,
    /// Trading market price sheet export (TRADING_CSV)
    pub trading_csv: PathBuf,
    /// Shipping cost table per origin port (PORT_COSTS_CSV)
    pub port_costs_csv: PathBuf,
    /// Directory report files are written into (OUTPUT_DIR)
    pub output_dir: PathBuf,
    pub log_level: String,
    /// Column the Cost of Inventory tile sums (COST_BASIS: value | purchase_cost)
    pub cost_basis: CostBasis,
    /// Lifetime of memoised market-data loads (MARKET_CACHE_TTL_SECS)
    pub market_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            inventory_csv: std::env::var("INVENTORY_CSV")
                .unwrap_or_else(|_| INVENTORY_CSV.to_string())
                .into(),
            trading_csv: std::env::var("TRADING_CSV")
                .unwrap_or_else(|_| TRADING_CSV.to_string())
                .into(),
            port_costs_csv: std::env::var("PORT_COSTS_CSV")
                .unwrap_or_else(|_| PORT_COSTS_CSV.to_string())
                .into(),
            output_dir: std::env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| ".".to_string())
                .into(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            cost_basis: parse_cost_basis(
                &std::env::var("COST_BASIS").unwrap_or_else(|_| "value".to_string()),
            )?,
            market_cache_ttl: Duration::from_secs(
                std::env::var("MARKET_CACHE_TTL_SECS")
                    .unwrap_or_else(|_| MARKET_CACHE_TTL_SECS.to_string())
                    .parse::<u64>()
                    .map_err(|_| {
                        AppError::Config(
                            "MARKET_CACHE_TTL_SECS must be a whole number of seconds".to_string(),
                        )
                    })?,
            ),
        })
    }
}

fn parse_cost_basis(s: &str) -> Result<CostBasis> {
    match s.trim().to_ascii_lowercase().as_str() {
        "value" => Ok(CostBasis::Value),
        "purchase_cost" | "purchase cost" => Ok(CostBasis::PurchaseCost),
        other => Err(AppError::Config(format!(
            "COST_BASIS must be `value` or `purchase_cost`, got `{}`",
            other
        ))),
    }
}
