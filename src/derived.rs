//! Per-record fields computed from the gate timestamps.
//!
//! `now` is captured once by the caller for a whole pipeline run so that every
//! record in a run ages against the same instant.
use crate::types::{InventoryRecord, NormalizedRecord};
use crate::util::floor_days;
use chrono::{Datelike, Month, NaiveDateTime};

pub fn inventory_aging_days(gate_in: Option<NaiveDateTime>, now: NaiveDateTime) -> i64 {
    gate_in.map_or(0, |g| floor_days(g, now))
}

/// Negative spans (gate-out recorded before gate-in) are passed through.
pub fn dwell_time_days(
    gate_in: Option<NaiveDateTime>,
    gate_out: Option<NaiveDateTime>,
) -> Option<i64> {
    Some(floor_days(gate_in?, gate_out?))
}

pub fn month_of(gate_in: Option<NaiveDateTime>) -> Option<Month> {
    gate_in.and_then(|g| Month::try_from(g.month() as u8).ok())
}

/// `0` stands in for "no gate-in date", which no year filter ever selects.
pub fn year_of(gate_in: Option<NaiveDateTime>) -> i32 {
    gate_in.map_or(0, |g| g.year())
}

pub fn derive_record(r: NormalizedRecord, now: NaiveDateTime) -> InventoryRecord {
    InventoryRecord {
        inventory_aging_days: inventory_aging_days(r.gate_in, now),
        dwell_time_days: dwell_time_days(r.gate_in, r.gate_out),
        month: month_of(r.gate_in),
        year: year_of(r.gate_in),
        unit_id: r.unit_id,
        location: r.location,
        depot: r.depot,
        size: r.size,
        condition: r.condition,
        customer: r.customer,
        status: r.status,
        gate_in: r.gate_in,
        gate_out: r.gate_out,
        value: r.value,
        sale_price: r.sale_price,
        repair_cost: r.repair_cost,
        storage_cost: r.storage_cost,
        purchase_cost: r.purchase_cost,
    }
}

pub fn derive(records: Vec<NormalizedRecord>, now: NaiveDateTime) -> Vec<InventoryRecord> {
    records.into_iter().map(|r| derive_record(r, now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn open_unit_has_aging_but_no_dwell() {
        let now = at(2024, 3, 1);
        let r = derive_record(
            NormalizedRecord {
                gate_in: Some(at(2024, 1, 10)),
                ..Default::default()
            },
            now,
        );
        assert_eq!(r.dwell_time_days, None);
        assert_eq!(r.inventory_aging_days, (now - at(2024, 1, 10)).num_days());
        assert_eq!(r.inventory_aging_days, 51);
        assert_eq!(r.month, Some(Month::January));
        assert_eq!(r.year, 2024);
    }

    #[test]
    fn missing_gate_in_uses_sentinels() {
        let r = derive_record(
            NormalizedRecord {
                gate_out: Some(at(2024, 1, 10)),
                ..Default::default()
            },
            at(2024, 3, 1),
        );
        assert_eq!(r.inventory_aging_days, 0);
        assert_eq!(r.dwell_time_days, None);
        assert_eq!(r.month, None);
        assert_eq!(r.year, 0);
    }

    #[test]
    fn inconsistent_gates_give_negative_dwell() {
        assert_eq!(
            dwell_time_days(Some(at(2024, 5, 10)), Some(at(2024, 5, 1))),
            Some(-9)
        );
        assert_eq!(
            dwell_time_days(Some(at(2024, 5, 1)), Some(at(2024, 5, 10))),
            Some(9)
        );
    }

    #[test]
    fn aging_floors_partial_days() {
        let gate_in = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(18, 0, 0);
        assert_eq!(inventory_aging_days(gate_in, at(2024, 1, 3)), 1);
    }
}
