//! Wires a pool and constructs the facade so the `spec.md` §6 operation
//! surface is callable code, not a prose list. No server loop: whatever
//! presentation layer gets built next (a bot, an HTTP gateway) links this
//! binary's library crate and drives `kiosk_api::KioskFacade` directly.

use kiosk_core::SystemClock;
use kiosk_infra::Config;

#[tokio::main]
async fn main() {
    kiosk_observability::init();

    let config = Config::from_env().expect("invalid configuration");
    let pool = kiosk_infra::pool::connect(&config)
        .await
        .expect("failed to connect to database");

    let clock = SystemClock::new(config.platform_tz);
    let _facade = kiosk_api::KioskFacade::new(pool, clock);

    tracing::info!("kiosk facade constructed; no presentation layer is wired up yet");
}
