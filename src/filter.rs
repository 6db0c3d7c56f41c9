//! Dimension filters and the current/previous period split.
use crate::types::InventoryRecord;
use std::collections::BTreeSet;
use tracing::debug;

/// The dashboard opens on the third known year when there is one.
const DEFAULT_YEAR_INDEX: usize = 2;

/// User-selected filters. An empty set means "no restriction" for that
/// dimension, never "match nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub locations: BTreeSet<String>,
    pub depots: BTreeSet<String>,
    pub year: i32,
}

impl FilterSelection {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }

    pub fn default_year(years: &[i32]) -> Option<i32> {
        years
            .get(DEFAULT_YEAR_INDEX)
            .or_else(|| years.last())
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSubsets {
    pub current: Vec<InventoryRecord>,
    pub previous: Vec<InventoryRecord>,
    pub previous_year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionOptions {
    pub locations: Vec<String>,
    pub depots: Vec<String>,
    pub years: Vec<i32>,
}

fn passes(selected: &BTreeSet<String>, value: Option<&String>) -> bool {
    selected.is_empty() || value.is_some_and(|v| selected.contains(v))
}

/// Sorted distinct years present in the data, excluding the `0` sentinel.
pub fn known_years(data: &[InventoryRecord]) -> Vec<i32> {
    data.iter()
        .map(|r| r.year)
        .filter(|y| *y != 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The year immediately before `year` in `years` by position, not by
/// arithmetic: with `[2019, 2021, 2023]` the predecessor of 2023 is 2021.
pub fn previous_known_year(years: &[i32], year: i32) -> Option<i32> {
    let idx = years.iter().position(|y| *y == year)?;
    idx.checked_sub(1).map(|i| years[i])
}

fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: Iterator<Item = Option<&'a String>>,
{
    values
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn dimension_options(data: &[InventoryRecord]) -> DimensionOptions {
    DimensionOptions {
        locations: distinct(data.iter().map(|r| r.location.as_ref())),
        depots: distinct(data.iter().map(|r| r.depot.as_ref())),
        years: known_years(data),
    }
}

/// Location and depot filters only; the year is left alone.
pub fn filter_dimensions(
    data: &[InventoryRecord],
    selection: &FilterSelection,
) -> Vec<InventoryRecord> {
    data.iter()
        .filter(|r| passes(&selection.locations, r.location.as_ref()))
        .filter(|r| passes(&selection.depots, r.depot.as_ref()))
        .cloned()
        .collect()
}

pub fn filter_year(data: &[InventoryRecord], year: i32) -> Vec<InventoryRecord> {
    data.iter().filter(|r| r.year == year).cloned().collect()
}

/// Split the data into the selected period and the previous known period,
/// both restricted by the location/depot filters.
pub fn apply(data: &[InventoryRecord], selection: &FilterSelection) -> PeriodSubsets {
    let years = known_years(data);
    let previous_year = previous_known_year(&years, selection.year);
    let dims = filter_dimensions(data, selection);

    let current = filter_year(&dims, selection.year);
    let previous = previous_year
        .map(|y| filter_year(&dims, y))
        .unwrap_or_default();

    debug!(
        "filter year={} previous={:?}: {} current rows, {} previous rows",
        selection.year,
        previous_year,
        current.len(),
        previous.len()
    );
    PeriodSubsets {
        current,
        previous,
        previous_year,
    }
}
