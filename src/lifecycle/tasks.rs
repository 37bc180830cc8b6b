//! Periodic background tasks owned by the server lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::cache::ResponseCache;
use crate::relay::RelayDispatcher;

/// Run `job` every `period` until a shutdown signal arrives.
///
/// The first run happens one full period after spawning.
pub fn spawn_periodic<F>(
    name: &'static str,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(task = name, period_secs = period.as_secs(), "Periodic task starting");
        loop {
            tokio::select! {
                _ = ticker.tick() => job(),
                _ = shutdown.recv() => {
                    tracing::debug!(task = name, "Periodic task received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    })
}

/// Expire cache entries past their TTL.
pub fn spawn_cache_sweeper(
    cache: Arc<ResponseCache>,
    period: Duration,
    shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    spawn_periodic("cache-sweep", period, shutdown, move || {
        let removed = cache.sweep();
        if removed > 0 {
            tracing::debug!(removed, remaining = cache.len(), "Cache sweep");
        }
    })
}

/// Close sessions past their lifetime.
pub fn spawn_session_sweeper(
    relay: Arc<RelayDispatcher>,
    period: Duration,
    shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    spawn_periodic("session-sweep", period, shutdown, move || {
        relay.sweep();
    })
}
