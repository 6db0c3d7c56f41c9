//! Time-bucketed series over the container trading market sheet.
//!
//! Dates are truncated to their bucket (first day of the month, or the
//! Monday that closes the week) and series are sorted on the bucket date
//! itself. Labels such as `Mar 2024` are only produced for display.
use crate::types::{CityMonthRow, CityPriceRow, PriceMapRow, PriceMoveRow, TradingRecord};
use crate::util::{format_number, percent_change};
use chrono::{Datelike, Duration, Month, Months, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Restricts the trading sheet the way the price tab's selectors do.
/// `None` leaves a dimension unrestricted; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradingFilter {
    pub container_type: Option<String>,
    pub container_condition: Option<String>,
    pub city: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TradingFilter {
    pub fn matches(&self, r: &TradingRecord) -> bool {
        let eq = |want: &Option<String>, have: &str| want.as_deref().map_or(true, |w| w == have);
        eq(&self.container_type, &r.container_type)
            && eq(&self.container_condition, &r.container_condition)
            && eq(&self.city, &r.city)
            && self.start.map_or(true, |s| r.date >= s)
            && self.end.map_or(true, |e| r.date <= e)
    }

    pub fn apply(&self, records: &[TradingRecord]) -> Vec<TradingRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Look-back windows offered next to the price chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    All,
    YearToDate,
    SixMonths,
    OneYear,
    TwoYears,
}

impl RangePreset {
    pub fn start(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            RangePreset::All => None,
            RangePreset::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            RangePreset::SixMonths => today.checked_sub_months(Months::new(6)),
            RangePreset::OneYear => today.checked_sub_months(Months::new(12)),
            RangePreset::TwoYears => today.checked_sub_months(Months::new(24)),
        }
    }
}

impl std::str::FromStr for RangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(RangePreset::All),
            "ytd" => Ok(RangePreset::YearToDate),
            "6m" => Ok(RangePreset::SixMonths),
            "1y" => Ok(RangePreset::OneYear),
            "2y" => Ok(RangePreset::TwoYears),
            other => Err(format!("unknown range `{}`", other)),
        }
    }
}

pub fn month_start(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

/// End of the Monday-anchored week containing `d`: a Monday maps to itself,
/// every other day to the following Monday.
pub fn week_ending_monday(d: NaiveDate) -> NaiveDate {
    let ahead = (7 - d.weekday().num_days_from_monday()) % 7;
    d + Duration::days(ahead as i64)
}

pub fn month_label(d: NaiveDate) -> String {
    d.format("%b %Y").to_string()
}

/// Total listed price per city, cheapest first.
pub fn price_by_city(records: &[TradingRecord]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records {
        *totals.entry(r.city.as_str()).or_default() += r.market_price_usd;
    }
    let mut out: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(c, v)| (c.to_string(), v))
        .collect();
    out.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCityPoint {
    pub month: NaiveDate,
    pub city: String,
    pub market_price: f64,
    pub container_count: f64,
}

impl MonthlyCityPoint {
    pub fn to_row(&self) -> CityMonthRow {
        CityMonthRow {
            month: month_label(self.month),
            city: self.city.clone(),
            market_price: format!("${}", format_number(self.market_price, 0)),
            container_count: format_number(self.container_count, 0),
        }
    }
}

/// Summed price and listing count per calendar month and city, oldest first.
pub fn monthly_price_by_city(records: &[TradingRecord]) -> Vec<MonthlyCityPoint> {
    let mut buckets: BTreeMap<(NaiveDate, &str), (f64, f64)> = BTreeMap::new();
    for r in records {
        let e = buckets
            .entry((month_start(r.date), r.city.as_str()))
            .or_default();
        e.0 += r.market_price_usd;
        e.1 += r.container_count;
    }
    buckets
        .into_iter()
        .map(|((month, city), (price, count))| MonthlyCityPoint {
            month,
            city: city.to_string(),
            market_price: price,
            container_count: count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountPoint {
    pub month: NaiveDate,
    pub container_count: f64,
    /// Month-to-month change in percent; the first month is 0.
    pub change_pct: f64,
}

pub fn monthly_container_count(records: &[TradingRecord]) -> Vec<CountPoint> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in records {
        *buckets.entry(month_start(r.date)).or_default() += r.container_count;
    }
    let mut prev: Option<f64> = None;
    buckets
        .into_iter()
        .map(|(month, count)| {
            let change_pct = prev.map_or(0.0, |p| percent_change(count, p));
            prev = Some(count);
            CountPoint {
                month,
                container_count: count,
                change_pct,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceMove {
    pub city: String,
    pub week_ending: NaiveDate,
    pub market_price: f64,
    pub change_pct: f64,
}

impl PriceMove {
    pub fn to_row(&self) -> PriceMoveRow {
        PriceMoveRow {
            city: self.city.clone(),
            week_ending: self.week_ending.format("%Y-%m-%d").to_string(),
            market_price: format!("${}", format_number(self.market_price.trunc(), 0)),
            change: format!("{:.2}%", self.change_pct),
        }
    }
}

/// Week-on-week price change per city. A city's first observed week has no
/// predecessor and is omitted.
pub fn weekly_price_moves(records: &[TradingRecord]) -> Vec<PriceMove> {
    let mut buckets: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for r in records {
        *buckets
            .entry(r.city.as_str())
            .or_default()
            .entry(week_ending_monday(r.date))
            .or_default() += r.market_price_usd;
    }
    let mut moves = Vec::new();
    for (city, weeks) in buckets {
        let mut prev: Option<f64> = None;
        for (week_ending, price) in weeks {
            if let Some(p) = prev {
                moves.push(PriceMove {
                    city: city.to_string(),
                    week_ending,
                    market_price: price,
                    change_pct: percent_change(price, p),
                });
            }
            prev = Some(price);
        }
    }
    moves
}

/// Top `n` cities by their single largest weekly rise and by their largest
/// weekly fall, one row per city in each list.
pub fn biggest_moves(moves: &[PriceMove], n: usize) -> (Vec<PriceMove>, Vec<PriceMove>) {
    let pick = |descending: bool| {
        let mut sorted: Vec<&PriceMove> = moves.iter().collect();
        sorted.sort_by(|a, b| {
            let ord = a.change_pct.total_cmp(&b.change_pct);
            let ord = if descending { ord.reverse() } else { ord };
            ord.then_with(|| a.city.cmp(&b.city))
                .then_with(|| a.week_ending.cmp(&b.week_ending))
        });
        let mut seen = BTreeSet::new();
        sorted
            .into_iter()
            .filter(|m| seen.insert(m.city.as_str()))
            .take(n)
            .cloned()
            .collect::<Vec<PriceMove>>()
    };
    (pick(true), pick(false))
}

/// Year by month pivot of summed price. Only months that occur in the data
/// are listed, in calendar order; empty cells are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceMap {
    pub months: Vec<Month>,
    pub years: Vec<i32>,
    /// `cells[month][year]`
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PriceMap {
    /// Long format, filled cells only, month-major.
    pub fn to_rows(&self) -> Vec<PriceMapRow> {
        let mut out = Vec::new();
        for (month, row) in self.months.iter().zip(&self.cells) {
            for (year, cell) in self.years.iter().zip(row) {
                if let Some(price) = cell {
                    out.push(PriceMapRow {
                        month: month.name().to_string(),
                        year: *year,
                        market_price: format!("${}", format_number(*price, 0)),
                    });
                }
            }
        }
        out
    }
}

pub fn market_price_map(records: &[TradingRecord]) -> PriceMap {
    let mut sums: BTreeMap<(u32, i32), f64> = BTreeMap::new();
    for r in records {
        *sums.entry((r.date.month(), r.date.year())).or_default() += r.market_price_usd;
    }
    let month_numbers: BTreeSet<u32> = sums.keys().map(|(m, _)| *m).collect();
    let years: Vec<i32> = sums
        .keys()
        .map(|(_, y)| *y)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let cells = month_numbers
        .iter()
        .map(|m| years.iter().map(|y| sums.get(&(*m, *y)).copied()).collect())
        .collect();
    PriceMap {
        months: month_numbers
            .into_iter()
            .filter_map(|m| Month::try_from(m as u8).ok())
            .collect(),
        years,
        cells,
    }
}

pub fn city_price_rows(prices: &[(String, f64)]) -> Vec<CityPriceRow> {
    prices
        .iter()
        .map(|(city, price)| CityPriceRow {
            city: city.clone(),
            market_price: format!("${}", format_number(*price, 0)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn trade(date: NaiveDate, city: &str, price: f64, count: f64) -> TradingRecord {
        TradingRecord {
            date,
            city: city.to_string(),
            container_type: "40HC".to_string(),
            container_condition: "CW".to_string(),
            market_price_usd: price,
            container_count: count,
        }
    }

    #[test]
    fn weeks_close_on_monday() {
        // 2024-03-04 is a Monday.
        assert_eq!(week_ending_monday(d(2024, 3, 4)), d(2024, 3, 4));
        assert_eq!(week_ending_monday(d(2024, 3, 5)), d(2024, 3, 11));
        assert_eq!(week_ending_monday(d(2024, 3, 10)), d(2024, 3, 11));
    }

    #[test]
    fn months_sort_chronologically_not_by_label() {
        let rows = vec![
            trade(d(2024, 4, 3), "Chicago", 10.0, 1.0),
            trade(d(2023, 12, 9), "Chicago", 20.0, 2.0),
            trade(d(2024, 2, 1), "Chicago", 30.0, 3.0),
            trade(d(2024, 2, 15), "Chicago", 5.0, 1.0),
        ];
        let points = monthly_price_by_city(&rows);
        let labels: Vec<String> = points.iter().map(|p| month_label(p.month)).collect();
        // "Apr 2024" would sort first lexicographically.
        assert_eq!(labels, vec!["Dec 2023", "Feb 2024", "Apr 2024"]);
        assert_eq!(points[1].market_price, 35.0);
        assert_eq!(points[1].container_count, 4.0);
        let row = points[1].to_row();
        assert_eq!(row.month, "Feb 2024");
        assert_eq!(row.market_price, "$35");
    }

    #[test]
    fn container_count_change_starts_at_zero() {
        let rows = vec![
            trade(d(2024, 1, 3), "A", 0.0, 10.0),
            trade(d(2024, 2, 3), "A", 0.0, 15.0),
            trade(d(2024, 3, 3), "B", 0.0, 12.0),
        ];
        let points = monthly_container_count(&rows);
        let changes: Vec<f64> = points.iter().map(|p| p.change_pct).collect();
        assert_eq!(changes, vec![0.0, 50.0, -20.0]);
    }

    #[test]
    fn weekly_moves_drop_first_week_and_rank_per_city() {
        let rows = vec![
            trade(d(2024, 3, 4), "Chicago", 100.0, 1.0),
            trade(d(2024, 3, 11), "Chicago", 150.0, 1.0),
            trade(d(2024, 3, 18), "Chicago", 120.0, 1.0),
            trade(d(2024, 3, 4), "Denver", 200.0, 1.0),
            trade(d(2024, 3, 3), "Denver", 200.0, 1.0),
            trade(d(2024, 3, 11), "Denver", 200.0, 1.0),
        ];
        let moves = weekly_price_moves(&rows);
        assert_eq!(moves.len(), 3);
        assert_eq!(moves[0].change_pct, 50.0);
        assert_eq!(moves[1].change_pct, -20.0);
        assert_eq!(moves[2].city, "Denver");
        assert_eq!(moves[2].week_ending, d(2024, 3, 11));
        assert_eq!(moves[2].change_pct, -50.0);

        let (growth, drop) = biggest_moves(&moves, 5);
        assert_eq!(growth.len(), 2);
        assert_eq!(growth[0].city, "Chicago");
        assert_eq!(growth[0].change_pct, 50.0);
        assert_eq!(drop[0].city, "Denver");
        assert_eq!(drop[1].change_pct, -20.0);
        assert_eq!(drop[0].to_row().change, "-50.00%");
    }

    #[test]
    fn cities_rank_cheapest_first() {
        let rows = vec![
            trade(d(2024, 1, 1), "B", 300.0, 1.0),
            trade(d(2024, 1, 1), "A", 100.0, 1.0),
            trade(d(2024, 1, 2), "A", 50.0, 1.0),
        ];
        assert_eq!(
            price_by_city(&rows),
            vec![("A".to_string(), 150.0), ("B".to_string(), 300.0)]
        );
    }

    #[test]
    fn price_map_lists_present_months_in_order() {
        let rows = vec![
            trade(d(2024, 5, 1), "A", 10.0, 1.0),
            trade(d(2023, 1, 1), "A", 20.0, 1.0),
            trade(d(2024, 1, 9), "A", 5.0, 1.0),
        ];
        let map = market_price_map(&rows);
        assert_eq!(map.months, vec![Month::January, Month::May]);
        assert_eq!(map.years, vec![2023, 2024]);
        assert_eq!(map.cells[0], vec![Some(20.0), Some(5.0)]);
        assert_eq!(map.cells[1], vec![None, Some(10.0)]);

        let rows = map.to_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].month.as_str(), rows[0].year), ("January", 2023));
        assert_eq!((rows[2].month.as_str(), rows[2].year), ("May", 2024));
        assert_eq!(rows[2].market_price, "$10");
    }

    #[test]
    fn filter_and_presets() {
        let rows = vec![
            trade(d(2024, 1, 1), "A", 1.0, 1.0),
            trade(d(2024, 6, 1), "B", 1.0, 1.0),
        ];
        let f = TradingFilter {
            start: RangePreset::SixMonths.start(d(2024, 9, 1)),
            ..Default::default()
        };
        assert_eq!(f.apply(&rows).len(), 1);
        assert_eq!(RangePreset::YearToDate.start(d(2024, 9, 1)), Some(d(2024, 1, 1)));
        assert_eq!("2y".parse::<RangePreset>(), Ok(RangePreset::TwoYears));
        let by_city = TradingFilter {
            city: Some("A".to_string()),
            ..Default::default()
        };
        assert_eq!(by_city.apply(&rows)[0].city, "A");
    }
}
