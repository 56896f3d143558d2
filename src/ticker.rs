//! Periodic recompute driver.
//!
//! Polls the bike well inside the 1 s update period; the interval tracker
//! decides when an update is actually due, so timer jitter never skips a
//! second. Each effective recompute is published on the metrics channel.

use std::sync::Arc;

use log::debug;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::bike::{BikeEvent, BikeOutput, IndoorBike};
use crate::clock::Clock;
use crate::metrics::Metrics;

pub const POLL_PERIOD: Duration = Duration::from_millis(100);

/// Drive recomputes until every metrics receiver is gone. The first poll
/// fires immediately and seeds the first reading.
pub async fn run(
    bike: Arc<Mutex<IndoorBike>>,
    clock: Arc<dyn Clock>,
    metrics_tx: watch::Sender<Metrics>,
) {
    let mut poll = interval(POLL_PERIOD);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        poll.tick().await;
        if metrics_tx.is_closed() {
            debug!("No metrics receivers left, ticker stopping");
            return;
        }

        let now = clock.now_us();
        let output = bike.lock().await.dispatch(BikeEvent::RecomputeTick(now));
        if let BikeOutput::MetricsUpdated(metrics) = output {
            metrics_tx.send_replace(metrics);
        }
    }
}
