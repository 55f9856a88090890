use std::sync::atomic::{AtomicI64, Ordering};

/// Net count of active connections across every monitored socket.
///
/// This is the only state shared between watcher tasks. Updates are plain
/// atomic adds, so no update is ever lost regardless of how many watchers
/// write concurrently. Signed on purpose: the tracker may report a close for
/// a connection whose open predates the baseline dump, so the value can
/// transiently dip below zero. No clamping is applied.
#[derive(Debug, Default)]
pub struct ConnectionGauge(AtomicI64);

impl ConnectionGauge {
    /// Atomically applies `delta` and returns the counter with this caller's
    /// own update applied.
    ///
    /// Two watchers updating concurrently may each observe a value missing
    /// the other's in-flight update. That is fine: dispatch is idempotent and
    /// re-triggered on every subsequent event, so any stale read is corrected
    /// by the next update from any watcher.
    pub fn add(&self, delta: i64) -> i64 {
        self.0.fetch_add(delta, Ordering::SeqCst) + delta
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_returns_own_update() {
        let gauge = ConnectionGauge::default();
        assert_eq!(gauge.add(3), 3);
        assert_eq!(gauge.add(1), 4);
        assert_eq!(gauge.add(-1), 3);
        assert_eq!(gauge.get(), 3);
    }

    #[test]
    fn test_may_go_negative() {
        let gauge = ConnectionGauge::default();
        assert_eq!(gauge.add(-1), -1);
        assert_eq!(gauge.add(1), 0);
    }

    #[test]
    fn test_no_lost_updates_under_contention() {
        const WATCHERS: usize = 50;
        const INCREMENTS: usize = 1000;

        let gauge = ConnectionGauge::default();
        std::thread::scope(|scope| {
            for _ in 0..WATCHERS {
                scope.spawn(|| {
                    for _ in 0..INCREMENTS {
                        gauge.add(1);
                    }
                });
            }
        });

        assert_eq!(gauge.get(), (WATCHERS * INCREMENTS) as i64);
    }

    #[test]
    fn test_mixed_deltas_sum_regardless_of_interleaving() {
        let gauge = ConnectionGauge::default();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        gauge.add(1);
                        gauge.add(-1);
                        gauge.add(1);
                    }
                });
            }
        });

        // Per thread: 500 * (+1 - 1 + 1) = 500.
        assert_eq!(gauge.get(), 8 * 500);
    }
}
