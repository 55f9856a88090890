use std::sync::Arc;

use crate::conntrack::{ConnectionTracker, Filter};
use crate::dispatch::{Backend, Dispatcher};
use crate::gauge::ConnectionGauge;

/// Monitors one tracker filter for the lifetime of the process.
///
/// Seeds the shared gauge with the filter's baseline count and dispatches
/// once, then folds every live event into the gauge and hands the updated
/// value to the dispatcher each time. Dispatching on every event rather than
/// only on zero crossings keeps the loop trivial; it is safe because backend
/// actions are idempotent.
///
/// Returns when the subscription ends. A watcher that stops merely stops
/// contributing updates (data loss, not a fatal condition); it is never
/// restarted and never takes the process down with it.
pub async fn watch<T, B>(
    tracker: Arc<T>,
    filter: Filter,
    gauge: Arc<ConnectionGauge>,
    dispatcher: Arc<Dispatcher<B>>,
) where
    T: ConnectionTracker,
    B: Backend,
{
    let baseline = match tracker.baseline(&filter).await {
        Ok(count) => count,
        Err(err) => {
            log::error!("[{filter}] baseline query failed, not watching: {err}");
            return;
        }
    };
    let active = gauge.add(baseline);
    log::info!("[{filter}] baseline {baseline}, {active} active overall");
    dispatcher.dispatch(active);

    let mut events = match tracker.subscribe(&filter).await {
        Ok(rx) => rx,
        Err(err) => {
            log::error!("[{filter}] event subscription failed, not watching: {err}");
            return;
        }
    };
    while let Some(kind) = events.recv().await {
        let active = gauge.add(kind.delta());
        log::debug!("[{filter}] {kind:?}, {active} active");
        dispatcher.dispatch(active);
    }
    log::warn!("[{filter}] event stream ended, this socket stops contributing updates");
}
