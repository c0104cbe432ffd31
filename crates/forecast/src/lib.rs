//! `Forecaster` (`spec.md` §4.3): consumption averaging, stockout
//! projection, and order-quantity sizing. Depends on `Ledger` and `Catalog`.

mod math;
mod selection;

pub use math::{
    ANOMALY_THRESHOLD, DEFAULT_NOTIFY_THRESHOLD, MIN_ORDER_THRESHOLD, STOCKOUT_SENTINEL_DAYS,
    average_daily_consumption, days_until_stockout, order_quantity, round_boxes_02_rule,
};
pub use selection::{ForecastService, OrderSuggestion};
