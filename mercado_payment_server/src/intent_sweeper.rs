use log::*;
use mercado_payment_engine::{CheckoutIntentStore, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the checkout-intent sweeper. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Reads already treat expired intents as absent; this job only reclaims the rows.
pub fn start_intent_sweeper(db: SqliteDatabase) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        info!("🕰️ Checkout intent sweeper started");
        loop {
            timer.tick().await;
            match db.purge_expired_intents().await {
                Ok(0) => trace!("🕰️ No expired checkout intents to purge"),
                Ok(n) => info!("🕰️ {n} expired checkout intents purged"),
                Err(e) => error!("🕰️ Error purging expired checkout intents: {e}"),
            }
        }
    })
}
