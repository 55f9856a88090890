use std::sync::Arc;

/// The one capability every suspend/resume mechanism implements.
///
/// Actions must be idempotent: resuming an already-running target or
/// suspending an already-suspended one is a harmless repeat, because the
/// dispatcher fires after every event rather than only on a zero crossing.
/// Sync by design, so the termination path can force a resume without an
/// executor.
pub trait Backend: Send + Sync {
    fn set_running(&self, running: bool) -> crate::target::Result<()>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn set_running(&self, running: bool) -> crate::target::Result<()> {
        (**self).set_running(running)
    }
}

/// Maps the current connection count onto the one active backend.
#[derive(Debug)]
pub struct Dispatcher<B> {
    backend: B,
}

impl<B: Backend> Dispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Resumes the target when any connections are active, suspends it when
    /// none are.
    ///
    /// Called after every single event. A failing backend action (target
    /// vanished, control path missing, manager unreachable) is logged and
    /// otherwise ignored; the watchers keep running and no retry is made.
    pub fn dispatch(&self, active: i64) {
        self.apply(active != 0);
    }

    /// Unconditional resume, independent of the gauge value.
    ///
    /// Used when refusing a target with no monitorable sockets and on every
    /// termination path: the target must never be left suspended because this
    /// process stopped.
    pub fn force_resume(&self) {
        self.apply(true);
    }

    fn apply(&self, running: bool) {
        if let Err(err) = self.backend.set_running(running) {
            log::error!("backend action failed (running={running}): {err}");
        }
    }
}
