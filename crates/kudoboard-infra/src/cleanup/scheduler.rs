use super::OrphanReclaimer;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Next occurrence of `run_at` (UTC) strictly after `now`.
pub fn next_run_after(now: DateTime<Utc>, run_at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(run_at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Daily trigger for the orphan reclaimer.
///
/// Owned by the process: started once at startup, stopped with [`ReclaimScheduler::shutdown`].
pub struct ReclaimScheduler {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

impl ReclaimScheduler {
    /// Spawn the scheduling loop. Cancelling `token` stops it and interrupts
    /// a run in progress between pages.
    pub fn start(reclaimer: Arc<OrphanReclaimer>, run_at: NaiveTime, token: CancellationToken) -> Self {
        let loop_token = token.clone();
        let handle = tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next = next_run_after(now, run_at);
                let wait = (next - now).to_std().unwrap_or_default();

                tracing::info!(next_run = %next, "Next orphaned object reclaim scheduled");

                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {}
                }

                match reclaimer.try_run(&loop_token).await {
                    Some(report) if report.total_errors > 0 => {
                        tracing::warn!(
                            total_errors = report.total_errors,
                            aborted_prefixes = report.aborted_prefixes,
                            total_deleted = report.total_deleted,
                            "Scheduled reclaim finished with errors"
                        );
                    }
                    Some(_) => tracing::info!("Scheduled reclaim finished"),
                    None => tracing::warn!("Scheduled reclaim skipped, previous run still active"),
                }
            }

            tracing::info!("Reclaim scheduler stopped");
        });

        Self { handle, token }
    }

    /// Stop the scheduler and wait for it to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Reclaim scheduler task failed");
        }
    }
}
