use kiosk_ledger::{SupplyEvent, StockSnapshot, period_consumption};

/// Daily rate above `5 * preliminary_mean` is treated as an anomaly
/// (`spec.md` §4.3).
pub const ANOMALY_THRESHOLD: f64 = 5.0;

/// A deficit below `0.3 * box_weight` is not worth ordering.
pub const MIN_ORDER_THRESHOLD: f64 = 0.3;

/// Returned by `days_until_stockout` when consumption is zero or unknown.
pub const STOCKOUT_SENTINEL_DAYS: f64 = 999.0;

/// Default notification threshold for `summary`, in the local currency unit.
pub const DEFAULT_NOTIFY_THRESHOLD: f64 = 500_000.0;

struct Period {
    consumption: f64,
    days: i64,
    daily_rate: f64,
}

/// The second-pass trim, parameterized over the anomaly cap so its
/// monotonicity can be property-tested independent of snapshot derivation.
/// Returns `(avg_daily, days_with_data, anomalies_excluded)`.
fn trimmed_mean(periods: &[Period], cap: f64) -> (f64, i64, usize) {
    let prelim_consumption: f64 = periods.iter().map(|p| p.consumption).sum();
    let prelim_days: i64 = periods.iter().map(|p| p.days).sum();
    let prelim_mean = prelim_consumption / prelim_days as f64;

    let mut anomalies = 0usize;
    let retained: Vec<&Period> = periods
        .iter()
        .filter(|p| {
            if p.daily_rate > prelim_mean * cap {
                anomalies += 1;
                false
            } else {
                true
            }
        })
        .collect();

    if retained.is_empty() {
        return (prelim_mean, prelim_days, anomalies);
    }

    let total_consumption: f64 = retained.iter().map(|p| p.consumption).sum();
    let total_days: i64 = retained.iter().map(|p| p.days).sum();
    (total_consumption / total_days as f64, total_days, anomalies)
}

/// Two-pass trimmed mean over a product's snapshot history and the supplies
/// that fall within it (`spec.md` §4.3). Returns `(avg_daily, days_with_data,
/// warning)`. `avg_daily` is `0.0` when `history` has fewer than 2 snapshots.
pub fn average_daily_consumption(history: &[StockSnapshot], supplies: &[SupplyEvent]) -> (f64, i64, String) {
    if history.len() < 2 {
        return (0.0, 0, "insufficient data".to_string());
    }

    let mut sorted: Vec<&StockSnapshot> = history.iter().collect();
    sorted.sort_by_key(|s| s.date);

    let mut periods = Vec::new();
    for pair in sorted.windows(2) {
        let (s1, s2) = (pair[0], pair[1]);
        if let Some((consumption, days)) = period_consumption(s1, s2, supplies) {
            periods.push(Period {
                consumption,
                days,
                daily_rate: consumption / days as f64,
            });
        }
    }

    if periods.is_empty() {
        return (0.0, 0, "insufficient data".to_string());
    }

    let retained_count_before_trim = periods.len();
    let (avg, total_days, anomalies) = trimmed_mean(&periods, ANOMALY_THRESHOLD);
    let retained = retained_count_before_trim - anomalies;

    if retained == 0 {
        return (avg, total_days, "all data anomalous".to_string());
    }

    let warning = if retained < 3 {
        "insufficient data".to_string()
    } else if anomalies > 0 {
        format!("{anomalies} anomalous days excluded")
    } else {
        String::new()
    };

    (avg, total_days, warning)
}

/// `current_stock / avg_daily` when `avg_daily > 0`, else the sentinel 999.
pub fn days_until_stockout(current_stock: f64, avg_daily: f64) -> f64 {
    if avg_daily > 0.0 {
        current_stock / avg_daily
    } else {
        STOCKOUT_SENTINEL_DAYS
    }
}

/// Floor when the fractional part is `<= 0.2`, otherwise round up. A
/// business preference to avoid over-ordering for a marginal fraction.
pub fn round_boxes_02_rule(boxes_fractional: f64) -> i64 {
    let whole = boxes_fractional.floor();
    let frac = boxes_fractional - whole;
    if frac <= 0.2 {
        whole as i64
    } else {
        whole as i64 + 1
    }
}

/// Returns `(deficit_weight, boxes)`. Zero in both fields when the deficit
/// falls under the minimum-economical-order threshold, or rounds to zero
/// boxes (`spec.md` §4.3).
pub fn order_quantity(
    avg_daily: f64,
    horizon_days: f64,
    current_stock: f64,
    box_weight: f64,
    pending_weight: f64,
    use_02_rule: bool,
) -> (f64, i64) {
    let required = avg_daily * horizon_days;
    let deficit = (required - (current_stock + pending_weight)).max(0.0);
    if deficit < MIN_ORDER_THRESHOLD * box_weight {
        return (0.0, 0);
    }

    let boxes_fractional = deficit / box_weight;
    let boxes = if use_02_rule {
        round_boxes_02_rule(boxes_fractional)
    } else {
        boxes_fractional.ceil() as i64
    };

    if boxes == 0 {
        return (0.0, 0);
    }

    (deficit, boxes)
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

    #[test]
    fn straddling_supply_yields_fourteen_per_day() {
        let history = vec![
            snapshot(NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(), 30.0),
            snapshot(NaiveDate::from_ymd_opt(2025, 11, 28).unwrap(), 12.0),
        ];
        let supplies = vec![SupplyEvent {
            company_id: CompanyId::from_raw(1),
            product_id: ProductId::from_raw(1),
            date: NaiveDate::from_ymd_opt(2025, 11, 26).unwrap(),
            boxes: 1.0,
            weight: 24.0,
            cost: 0.0,
            order_id: None,
        }];
        let (avg, days, warning) = average_daily_consumption(&history, &supplies);
        assert_eq!(avg, 14.0);
        assert_eq!(days, 3);
        assert_eq!(warning, "insufficient data"); // only one retained period
    }

    #[test]
    fn fewer_than_two_snapshots_yields_zero() {
        let history = vec![snapshot(NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(), 30.0)];
        let (avg, days, warning) = average_daily_consumption(&history, &[]);
        assert_eq!(avg, 0.0);
        assert_eq!(days, 0);
        assert_eq!(warning, "insufficient data");
    }

    #[test]
    fn stockout_sentinel_when_not_consumed() {
        assert_eq!(days_until_stockout(10.0, 0.0), STOCKOUT_SENTINEL_DAYS);
    }

    #[test]
    fn anomalous_period_is_trimmed() {
        // Ten 1.0 кг/day periods, one 20.0 кг/day period; the 20.0 period is
        // more than 5x the ~2.7 preliminary mean and gets excluded.
        let mut history = Vec::new();
        let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut weight = 1000.0;
        history.push(snapshot(base, weight));
        for day in 1..=11 {
            weight -= if day == 6 { 20.0 } else { 1.0 };
            history.push(snapshot(base + chrono::Duration::days(day), weight));
        }

        let (avg, days, warning) = average_daily_consumption(&history, &[]);
        assert_eq!(avg, 1.0);
        assert_eq!(days, 10);
        assert_eq!(warning, "1 anomalous days excluded");
    }

    #[test]
    fn rounding_02_rule_examples() {
        assert_eq!(round_boxes_02_rule(1.2), 1);
        assert_eq!(round_boxes_02_rule(1.201), 2);
        assert_eq!(round_boxes_02_rule(1.19), 1);
        assert_eq!(round_boxes_02_rule(1.5), 2);
    }

    #[test]
    fn order_quantity_below_threshold_is_zero() {
        let (weight, boxes) = order_quantity(1.0, 7.0, 6.8, 24.0, 0.0, false);
        assert_eq!(weight, 0.0);
        assert_eq!(boxes, 0);
    }

    #[test]
    fn order_quantity_ceils_without_02_rule() {
        let (weight, boxes) = order_quantity(5.0, 14.0, 0.0, 24.0, 0.0, false);
        assert_eq!(weight, 70.0);
        assert_eq!(boxes, 3); // 70/24 = 2.92 -> ceil 3
    }

    #[test]
    fn pending_weight_reduces_deficit() {
        let (weight, boxes) = order_quantity(5.0, 14.0, 0.0, 24.0, 70.0, false);
        assert_eq!(weight, 0.0);
        assert_eq!(boxes, 0);
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    fn period_strategy() -> impl Strategy<Value = Period> {
        (0.1f64..500.0, 1i64..30).prop_map(|(consumption, days)| Period {
            consumption,
            days,
            daily_rate: consumption / days as f64,
        })
    }

    proptest! {
        /// spec.md §8 item 6: average_daily_consumption is monotone
        /// non-increasing as the anomaly cap is lowered (a tighter cap can
        /// only discard more/equal high-rate periods, never fewer).
        #[test]
        fn trimmed_mean_is_monotone_as_cap_lowers(periods in proptest::collection::vec(period_strategy(), 2..12), cap_hi in 1.0f64..10.0, cap_delta in 0.0f64..5.0) {
            let cap_lo = cap_hi - cap_delta;
            let (mean_hi, _, _) = trimmed_mean(&periods, cap_hi);
            let (mean_lo, _, _) = trimmed_mean(&periods, cap_lo);
            prop_assert!(mean_lo <= mean_hi + 1e-9);
        }

        /// spec.md §8 item 7: order_quantity is pure, non-negative, and
        /// (under the ceiling rule) boxes*box_weight >= deficit_weight.
        #[test]
        fn order_quantity_is_pure_and_never_negative(
            avg_daily in 0.0f64..50.0,
            horizon_days in 1.0f64..30.0,
            current_stock in 0.0f64..500.0,
            box_weight in 1.0f64..100.0,
            pending_weight in 0.0f64..500.0,
        ) {
            let a = order_quantity(avg_daily, horizon_days, current_stock, box_weight, pending_weight, false);
            let b = order_quantity(avg_daily, horizon_days, current_stock, box_weight, pending_weight, false);
            prop_assert_eq!(a, b);
            prop_assert!(a.0 >= 0.0);
            prop_assert!(a.1 >= 0);
            if a.1 > 0 {
                prop_assert!(a.1 as f64 * box_weight >= a.0 - 1e-9);
            }
        }
    }
}
