//! KPI and chart-series engine for container leasing inventory.
//!
//! Raw spreadsheet exports go through [`loader`] into canonical records,
//! [`derived`] adds the per-unit aging fields, [`filter`] splits the data into
//! the selected and previous period, and [`kpi`] / [`aggregate`] reduce those
//! subsets into metric tiles and chart series. [`dashboard`] runs the whole
//! chain in one call.
pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod derived;
pub mod error;
pub mod filter;
pub mod kpi;
pub mod loader;
pub mod market;
pub mod output;
pub mod ports;
pub mod types;
pub mod util;

pub use dashboard::{load_dataset, run_pipeline, Dashboard};
pub use error::{AppError, SchemaError};
pub use filter::FilterSelection;
pub use kpi::{CostBasis, KpiResult, Metric};
