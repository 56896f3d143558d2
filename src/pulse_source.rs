//! Async Unix socket client for the crank edge source.
//!
//! The edge helper (GPIO watcher, or a simulator) writes one JSON line per
//! falling edge of the step sensor:
//!
//!   {"type":"edge"}
//!
//! Each edge is timestamped on receipt with the daemon's monotonic clock and
//! fed to the bike. Reconnects with exponential backoff.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tokio::time::Duration;

use crate::bike::{BikeEvent, IndoorBike};
use crate::clock::Clock;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Run the edge source client until cancelled.
pub async fn run(
    bike: Arc<Mutex<IndoorBike>>,
    clock: Arc<dyn Clock>,
    socket_path: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match connect_and_run(&bike, clock.as_ref(), socket_path, &mut backoff).await {
            Ok(()) => info!("Edge source connection closed"),
            Err(e) => warn!("Edge source connection error: {}", e),
        }

        info!("Reconnecting to edge source in {:?}...", backoff);
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

async fn connect_and_run(
    bike: &Arc<Mutex<IndoorBike>>,
    clock: &dyn Clock,
    socket_path: &str,
    backoff: &mut Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let stream = UnixStream::connect(socket_path).await?;
    let mut lines = BufReader::new(stream).lines();

    info!("Connected to edge source at {}", socket_path);
    *backoff = INITIAL_BACKOFF;

    while let Some(line) = lines.next_line().await? {
        if is_edge(&line) {
            let ts = clock.now_us();
            bike.lock().await.dispatch(BikeEvent::PulseDetected(ts));
        }
    }

    info!("Edge source EOF");
    Ok(())
}

/// Whether a line from the edge source reports a crank edge.
pub fn is_edge(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(msg) => {
            let msg_type = msg.get("type").and_then(|v| v.as_str()).unwrap_or("");
            if msg_type != "edge" {
                debug!("Ignoring edge source message type '{}'", msg_type);
            }
            msg_type == "edge"
        }
        Err(e) => {
            debug!("Ignoring malformed edge source line {:?}: {}", line, e);
            false
        }
    }
}
