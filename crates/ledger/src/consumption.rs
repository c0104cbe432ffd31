use crate::SupplyEvent;
use crate::snapshot::StockSnapshot;

/// The §4.2 accounting identity for a single period `s1 -> s2`:
///
///     consumption = weight(s1) + Σ weight(supplies) − weight(s2)
///
/// `supplies` must already be restricted to `s1.product_id` and the inclusive
/// window `[s1.date, s2.date]` — the start-boundary double-count guard is
/// applied here, not by the caller.
///
/// Returns `None` when the period must be discarded: a zero endpoint,
/// negative derived consumption, or a zero-length period.
pub fn period_consumption(
    s1: &StockSnapshot,
    s2: &StockSnapshot,
    supplies: &[SupplyEvent],
) -> Option<(f64, i64)> {
    if s1.weight == 0.0 || s2.weight == 0.0 {
        return None;
    }

    let supply_weight: f64 = supplies
        .iter()
        .filter(|s| s.date >= s1.date && s.date <= s2.date)
        .filter(|s| {
            // Discard a supply dated exactly at s1 if the opening snapshot
            // plausibly already reflects it (spec.md §4.2, §9).
            !(s.date == s1.date && s1.weight >= s.weight * 0.9)
        })
        .map(|s| s.weight)
        .sum();

    let consumption = s1.weight + supply_weight - s2.weight;
    if consumption < 0.0 {
        return None;
    }

    let days = (s2.date - s1.date).num_days();
    if days <= 0 {
        return None;
    }

    Some((consumption, days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use kiosk_core::{CompanyId, ProductId};

    fn snapshot(date: NaiveDate, weight: f64) -> StockSnapshot {
        StockSnapshot {
            company_id: CompanyId::from_raw(1),
            product_id: ProductId::from_raw(1),
            date,
            quantity: weight,
            weight,
            created_at: Utc::now(),
        }
    }

    fn supply(date: NaiveDate, weight: f64) -> SupplyEvent {
        SupplyEvent {
            company_id: CompanyId::from_raw(1),
            product_id: ProductId::from_raw(1),
            date,
            boxes: 1.0,
            weight,
            cost: 0.0,
            order_id: None,
        }
    }

    #[test]
    fn straddling_supply_is_counted() {
        let s1 = snapshot(NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(), 30.0);
        let s2 = snapshot(NaiveDate::from_ymd_opt(2025, 11, 28).unwrap(), 12.0);
        let sup = supply(NaiveDate::from_ymd_opt(2025, 11, 26).unwrap(), 24.0);
        let (consumption, days) = period_consumption(&s1, &s2, &[sup]).unwrap();
        assert_eq!(consumption, 42.0);
        assert_eq!(days, 3);
    }

    #[test]
    fn supply_at_start_boundary_is_discarded_when_plausibly_already_counted() {
        let s1 = snapshot(NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(), 30.0);
        let s2 = snapshot(NaiveDate::from_ymd_opt(2025, 11, 28).unwrap(), 12.0);
        // weight(s1)=30 >= 0.9 * 30 (supply weight 30) -> discarded.
        let sup = supply(NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(), 30.0);
        let (consumption, _) = period_consumption(&s1, &s2, &[sup]).unwrap();
        assert_eq!(consumption, 18.0);
    }

    #[test]
    fn zero_endpoint_is_skipped() {
        let s1 = snapshot(NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(), 0.0);
        let s2 = snapshot(NaiveDate::from_ymd_opt(2025, 11, 28).unwrap(), 12.0);
        assert!(period_consumption(&s1, &s2, &[]).is_none());
    }

    #[test]
    fn negative_consumption_is_discarded() {
        let s1 = snapshot(NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(), 10.0);
        let s2 = snapshot(NaiveDate::from_ymd_opt(2025, 11, 28).unwrap(), 12.0);
        assert!(period_consumption(&s1, &s2, &[]).is_none());
    }

    #[test]
    fn zero_length_period_is_discarded() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 25).unwrap();
        let s1 = snapshot(date, 10.0);
        let s2 = snapshot(date, 8.0);
        assert!(period_consumption(&s1, &s2, &[]).is_none());
    }
}
