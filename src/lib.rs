use std::sync::Arc;

/// connfreeze: suspends an idle target and resumes it when network activity
/// reappears, using kernel connection tracking instead of application-level
/// health signals.
///
/// One watcher task per monitored socket feeds a shared connection gauge; a
/// dispatcher maps the gauge onto idempotent suspend/resume actions against
/// exactly one backend (process signals, the cgroup freezer, systemd, or
/// docker). All state is in-memory and lost on exit.
pub mod cli;
pub mod conntrack;
pub mod discovery;
pub mod dispatch;
pub mod gauge;
pub mod socket;
pub mod target;
pub mod watcher;

use cli::{Cli, TargetSelector};
use conntrack::{ConntrackCli, Filter};
use dispatch::{Backend, Dispatcher};
use gauge::ConnectionGauge;
use target::Target;

/// Runs the connfreeze lifecycle.
///
/// Resolves the target backend, discovers its sockets (or takes the raw
/// conntrack override), launches one watcher per filter, and blocks until a
/// termination request arrives. The target is resumed before every exit
/// path: empty discovery, discovery failure, and SIGINT/SIGTERM all funnel
/// through a forced resume so the target is never left suspended by this
/// process stopping.
///
/// # Errors
///
/// Returns an error if socket discovery fails or the signal handlers cannot
/// be installed; in both cases a forced resume has already been issued.
pub async fn run(args: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Arc::new(Dispatcher::new(resolve_target(&args.target)));

    let filters = match resolve_filters(&args) {
        Ok(filters) => filters,
        Err(err) => {
            log::error!("socket discovery failed: {err}");
            dispatcher.force_resume();
            return Err(err.into());
        }
    };
    log::info!("found {} sockets", filters.len());
    if refuse_if_unmonitorable(&filters, &dispatcher) {
        return Ok(());
    }

    let gauge = Arc::new(ConnectionGauge::default());
    let tracker = Arc::new(ConntrackCli);
    for filter in filters {
        // Fire-and-forget: watchers run until their event stream ends or the
        // process exits, and are never joined.
        tokio::spawn(watcher::watch(
            Arc::clone(&tracker),
            filter,
            Arc::clone(&gauge),
            Arc::clone(&dispatcher),
        ));
    }

    resume_on_termination(&dispatcher).await.map_err(Into::into)
}

/// Blocks until a termination request, then resumes the target
/// unconditionally. The resume also fires when the signal handlers cannot be
/// installed, since the process is about to exit either way.
async fn resume_on_termination<B: Backend>(dispatcher: &Dispatcher<B>) -> std::io::Result<()> {
    let result = wait_for_termination().await;
    dispatcher.force_resume();
    log::info!("target resumed, exiting");
    result
}

fn resolve_target(selector: &TargetSelector) -> Target {
    if let Some(pid) = selector.pid {
        Target::Process { pid }
    } else if let Some(path) = &selector.cgroup {
        Target::cgroup(path)
    } else if let Some(unit) = &selector.service {
        Target::Service { unit: unit.clone() }
    } else if let Some(name) = &selector.docker {
        Target::Docker { name: name.clone() }
    } else {
        unreachable!("clap enforces exactly one target selector")
    }
}

fn resolve_filters(args: &Cli) -> discovery::Result<Vec<Filter>> {
    if !args.conntrack.is_empty() {
        return Ok(args
            .conntrack
            .iter()
            .map(|raw| Filter::Raw(raw.split_whitespace().map(str::to_owned).collect()))
            .collect());
    }

    let selector = &args.target;
    let sockets = if let Some(pid) = selector.pid {
        discovery::pid_sockets(pid)?
    } else if let Some(path) = &selector.cgroup {
        discovery::cgroup_sockets(&target::cgroup_dir(target::CGROUP_ROOT, path))?
    } else if let Some(unit) = &selector.service {
        discovery::service_sockets(unit)?
    } else if let Some(name) = &selector.docker {
        discovery::container_sockets(name)?
    } else {
        unreachable!("clap enforces exactly one target selector")
    };
    Ok(sockets.into_iter().map(Filter::Socket).collect())
}

/// A target that exposes nothing to watch can never be safely suspended, so
/// it is resumed and left unmanaged.
fn refuse_if_unmonitorable<B: Backend>(filters: &[Filter], dispatcher: &Dispatcher<B>) -> bool {
    if filters.is_empty() {
        log::warn!("target has no monitorable sockets, refusing to manage it");
        dispatcher.force_resume();
        return true;
    }
    false
}

async fn wait_for_termination() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => log::info!("received SIGTERM"),
        _ = sigint.recv() => log::info!("received SIGINT"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use crate::socket::{Family, Proto, Socket};

    fn selector() -> TargetSelector {
        TargetSelector {
            pid: None,
            docker: None,
            service: None,
            cgroup: None,
        }
    }

    #[derive(Debug, Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<bool>>,
    }

    impl Backend for RecordingBackend {
        fn set_running(&self, running: bool) -> target::Result<()> {
            self.calls.lock().unwrap().push(running);
            Ok(())
        }
    }

    #[test]
    fn test_resolve_target_variants() {
        let mut sel = selector();
        sel.pid = Some(42);
        assert_eq!(resolve_target(&sel), Target::Process { pid: 42 });

        let mut sel = selector();
        sel.cgroup = Some(PathBuf::from("/machine.slice"));
        assert_eq!(
            resolve_target(&sel),
            Target::Cgroup {
                dir: PathBuf::from("/sys/fs/cgroup/machine.slice")
            }
        );

        let mut sel = selector();
        sel.service = Some("nginx".to_owned());
        assert_eq!(
            resolve_target(&sel),
            Target::Service {
                unit: "nginx".to_owned()
            }
        );

        let mut sel = selector();
        sel.docker = Some("web".to_owned());
        assert_eq!(
            resolve_target(&sel),
            Target::Docker {
                name: "web".to_owned()
            }
        );
    }

    #[test]
    fn test_conntrack_override_skips_discovery() {
        let mut sel = selector();
        sel.pid = Some(42);
        let args = Cli {
            target: sel,
            conntrack: vec!["--proto tcp --dport 80".to_owned()],
        };

        // Must not touch any discovery tool; pid 42's sockets are irrelevant.
        let filters = resolve_filters(&args).unwrap();
        assert_eq!(
            filters,
            vec![Filter::Raw(vec![
                "--proto".to_owned(),
                "tcp".to_owned(),
                "--dport".to_owned(),
                "80".to_owned(),
            ])]
        );
    }

    #[test]
    fn test_empty_filter_set_is_refused_with_a_resume() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = Dispatcher::new(Arc::clone(&backend));

        assert!(refuse_if_unmonitorable(&[], &dispatcher));

        // Exactly one resume and never a suspend.
        assert_eq!(*backend.calls.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_termination_signal_forces_a_resume() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&backend)));

        let waiter = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { resume_on_termination(&*dispatcher).await })
        };
        // Let the waiter reach its signal handlers before raising.
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        nix::sys::signal::raise(nix::sys::signal::Signal::SIGTERM).unwrap();
        waiter.await.unwrap().unwrap();

        // The gauge never saw a connection and the resume still fires.
        assert_eq!(*backend.calls.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_nonempty_filter_set_is_managed() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = Dispatcher::new(Arc::clone(&backend));
        let filters = [Filter::Socket(Socket::new(Family::Ipv4, Proto::Tcp, 80))];

        assert!(!refuse_if_unmonitorable(&filters, &dispatcher));
        assert!(backend.calls.lock().unwrap().is_empty());
    }
}
