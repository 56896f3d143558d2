use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use stepbit_ftms::bike::IndoorBike;
use stepbit_ftms::clock::{Clock, MonotonicClock};
use stepbit_ftms::debug_server::{self, DebugContext};
use stepbit_ftms::metrics::Metrics;
use stepbit_ftms::resistance::ResistanceLevel;
use stepbit_ftms::{config, pulse_source, ticker};

#[tokio::main]
async fn main() {
    env_logger::init();

    let cfg = config::from_args(std::env::args().skip(1));
    log::info!(
        "Step bike daemon starting, edge socket: {}, debug port: {}, resistance: {}",
        cfg.pulse_socket,
        cfg.debug_port,
        cfg.initial_resistance
    );

    let bike = Arc::new(Mutex::new(IndoorBike::new(ResistanceLevel::new(
        cfg.initial_resistance,
    ))));
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let (metrics_tx, metrics_rx) = watch::channel(Metrics::default());

    let debug_ctx = DebugContext {
        bike: bike.clone(),
        clock: clock.clone(),
        metrics_rx,
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Received shutdown signal");
        }
        _ = ticker::run(bike.clone(), clock.clone(), metrics_tx) => {
            log::error!("Recompute ticker exited");
        }
        result = pulse_source::run(bike.clone(), clock.clone(), &cfg.pulse_socket) => {
            if let Err(e) = result {
                log::error!("Edge source task exited with error: {}", e);
            }
        }
        result = debug_server::run(debug_ctx, cfg.debug_port) => {
            if let Err(e) = result {
                log::error!("Debug server exited with error: {}", e);
            }
        }
    }

    log::info!("Step bike daemon shutting down");
}
