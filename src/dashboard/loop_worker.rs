use tokio::{
    sync::watch,
    time::{Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::db::PageStorage;

use super::snapshot::{Dashboard, DashboardSnapshot};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Re-reads the page store every `period` and publishes a full snapshot.
/// The first refresh happens immediately.
pub async fn poll_loop<S: PageStorage>(
    dashboard: Dashboard<S>,
    period: Duration,
    publisher: watch::Sender<DashboardSnapshot>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!("dashboard poll loop started ({} ms period)", period.as_millis());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let started = Instant::now();
                let snapshot = dashboard.snapshot().await;
                let elapsed = started.elapsed();
                if elapsed > period {
                    log_warn!(
                        "dashboard refresh took {} ms, longer than the {} ms period",
                        elapsed.as_millis(),
                        period.as_millis()
                    );
                }
                log_debug!(
                    "dashboard refresh: sos={} queued={}",
                    snapshot.sos.is_some(),
                    snapshot.queue.entries().len()
                );
                publisher.send_replace(snapshot);
            }
            _ = cancel_token.cancelled() => {
                log_info!("dashboard poll loop shutting down");
                break;
            }
        }
    }
}
