use std::time::Duration;

use anyhow::{bail, Result};
use log::warn;
use mercado_payment_engine::polling::{PollVerdict, PollerPolicy, StatusPoller};
use reqwest::Client;

use crate::{orders::fetch_order, WatchParams};

/// Drives the order-status polling state machine over HTTP, mirroring what the checkout waiting page does in the
/// buyer's browser. Exits 0 on confirmed payment, non-zero on failure or an unresolved timeout.
pub async fn watch_order(server: &str, params: WatchParams) -> Result<()> {
    let defaults = PollerPolicy::default();
    let policy = PollerPolicy {
        interval: params.interval.map(Duration::from_secs).unwrap_or(defaults.interval),
        max_attempts: params.attempts.unwrap_or(defaults.max_attempts),
        not_found_limit: params.not_found_limit.unwrap_or(defaults.not_found_limit),
    };
    let order_id = params.order_id;
    let client = Client::new();
    let mut poller = StatusPoller::new(policy);
    println!(
        "Watching order {order_id} (every {:?}, up to {} attempts)",
        policy.interval, policy.max_attempts
    );
    loop {
        let verdict = match fetch_order(&client, server, &order_id).await {
            Ok(Some(order)) => {
                let status = order["status"].as_str().unwrap_or("").to_string();
                println!("  [{}/{}] status: {status}", poller.attempts() + 1, policy.max_attempts);
                poller.observe_status(&status)
            },
            Ok(None) => {
                println!("  [{}/{}] order not found yet", poller.attempts() + 1, policy.max_attempts);
                poller.observe_not_found()
            },
            Err(e) => {
                // Transport errors burn an attempt but say nothing about the payment.
                warn!("Error polling order {order_id}: {e}");
                poller.observe_status("")
            },
        };
        match verdict {
            PollVerdict::Continue => tokio::time::sleep(policy.interval).await,
            PollVerdict::Success => {
                println!("✅️ Payment confirmed for order {order_id}.");
                return Ok(());
            },
            PollVerdict::Failure => {
                bail!("Payment for order {order_id} was rejected or failed.");
            },
            PollVerdict::Unresolved => {
                bail!(
                    "Payment for order {order_id} is still unresolved after {} attempts. Check back later.",
                    poller.attempts()
                );
            },
        }
    }
}
