use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{db::PageStorage, error::CareResult};

use super::{
    loop_worker::poll_loop,
    snapshot::{Dashboard, DashboardSnapshot},
};

struct PollTask {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Owns the staff dashboard refresh loop and publishes each snapshot to
/// subscribers. Resolve actions publish a fresh snapshot right away instead
/// of waiting for the next tick.
pub struct DashboardController<S> {
    dashboard: Dashboard<S>,
    poll_interval: Duration,
    snapshots: watch::Sender<DashboardSnapshot>,
    task: Mutex<Option<PollTask>>,
}

impl<S: PageStorage> DashboardController<S> {
    pub fn new(storage: S, poll_interval: Duration) -> Self {
        let (snapshots, _) = watch::channel(DashboardSnapshot::empty());
        Self {
            dashboard: Dashboard::new(storage),
            poll_interval,
            snapshots,
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn latest(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }

    pub async fn start(&self) -> Result<()> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            bail!("dashboard polling already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.dashboard.clone(),
            self.poll_interval,
            self.snapshots.clone(),
            cancel_token.clone(),
        ));

        *task = Some(PollTask {
            handle,
            cancel_token,
        });
        info!("Dashboard polling every {} ms", self.poll_interval.as_millis());
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        let Some(task) = self.task.lock().await.take() else {
            return Ok(());
        };
        task.cancel_token.cancel();
        task.handle
            .await
            .context("dashboard poll loop task failed to join")
    }

    /// Reads both stores now and publishes the result.
    pub async fn refresh(&self) -> DashboardSnapshot {
        let snapshot = self.dashboard.snapshot().await;
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    pub async fn resolve_request(&self, id: i64) -> CareResult<bool> {
        let removed = self.dashboard.resolve_request(id).await?;
        self.refresh().await;
        Ok(removed)
    }

    pub async fn resolve_sos(&self) -> CareResult<()> {
        self.dashboard.resolve_sos().await?;
        self.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alerts::AlertStore, db::MemoryStorage, queue::RequestQueue};
    use chrono::Utc;
    use tokio::time::timeout;

    const FAST: Duration = Duration::from_millis(20);

    async fn wait_for<F>(rx: &mut watch::Receiver<DashboardSnapshot>, mut done: F) -> DashboardSnapshot
    where
        F: FnMut(&DashboardSnapshot) -> bool,
    {
        timeout(Duration::from_secs(5), async {
            loop {
                {
                    let current = rx.borrow_and_update();
                    if done(&*current) {
                        return current.clone();
                    }
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("snapshot condition not reached in time")
    }

    #[tokio::test]
    async fn loop_picks_up_changes_made_by_other_writers() {
        let storage = MemoryStorage::new();
        let controller = DashboardController::new(storage.clone(), FAST);
        let mut rx = controller.subscribe();
        controller.start().await.unwrap();
        assert!(controller.is_running().await);

        AlertStore::new(storage.clone())
            .raise_sos("Karan S.", Utc::now())
            .await
            .unwrap();
        RequestQueue::new(storage.clone())
            .submit("Ria V.", "Fever", "medium")
            .await
            .unwrap();

        let snapshot = wait_for(&mut rx, |s| s.sos.is_some() && !s.queue.is_clear()).await;
        assert_eq!(snapshot.queue.entries().len(), 1);

        controller.stop().await.unwrap();
        assert!(!controller.is_running().await);
    }

    #[tokio::test]
    async fn resolve_publishes_without_waiting_for_a_tick() {
        let storage = MemoryStorage::new();
        let request = RequestQueue::new(storage.clone())
            .submit("Karan S.", "Chest pain", "HIGH")
            .await
            .unwrap();

        let controller = DashboardController::new(storage, Duration::from_secs(3600));
        controller.refresh().await;
        assert_eq!(controller.latest().queue.entries().len(), 1);

        assert!(controller.resolve_request(request.id).await.unwrap());
        assert!(controller.latest().queue.is_clear());

        // A stale resolve from an old render is harmless.
        assert!(!controller.resolve_request(request.id).await.unwrap());
        controller.resolve_sos().await.unwrap();
        assert_eq!(controller.latest().sos, None);
    }

    #[tokio::test]
    async fn start_twice_is_rejected_and_stop_is_idempotent() {
        let controller = DashboardController::new(MemoryStorage::new(), FAST);
        controller.start().await.unwrap();
        assert!(controller.start().await.is_err());

        controller.stop().await.unwrap();
        controller.stop().await.unwrap();
        assert_eq!(controller.poll_interval(), FAST);
    }
}
