//! The four suspend/resume mechanisms a run can control.
//!
//! Exactly one [`Target`] variant is selected at startup and stays read-only
//! for the lifetime of the process. All variants expose the single
//! [`Backend`] capability; nothing else in the system branches on the target
//! kind.

use std::path::{Path, PathBuf};
use std::process::Command;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::dispatch::Backend;

mod error;

pub use error::{Error, Result};

/// Default cgroup v2 mount point.
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Resolves a user-supplied cgroup path against the cgroup v2 mount point,
/// tolerating the leading `/` shells tend to add.
pub fn cgroup_dir(root: impl AsRef<Path>, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    root.as_ref()
        .join(path.strip_prefix("/").unwrap_or(path))
}

/// The entity being paused and resumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Deliver SIGCONT/SIGSTOP directly to one process.
    Process { pid: i32 },
    /// Write to the freezer control of a cgroup. `dir` is the absolute cgroup
    /// directory; all member processes freeze and thaw atomically.
    Cgroup { dir: PathBuf },
    /// Ask systemd to kill the unit with a continue/stop signal.
    Service { unit: String },
    /// Pause/unpause a container by name through the docker CLI.
    Docker { name: String },
}

impl Target {
    /// Builds a cgroup target relative to [`CGROUP_ROOT`].
    pub fn cgroup(path: impl AsRef<Path>) -> Self {
        Self::Cgroup {
            dir: cgroup_dir(CGROUP_ROOT, path),
        }
    }
}

impl Backend for Target {
    fn set_running(&self, running: bool) -> Result<()> {
        match self {
            Self::Process { pid } => signal_process(*pid, running),
            Self::Cgroup { dir } => freeze_cgroup(dir, running),
            Self::Service { unit } => {
                let flag = if running {
                    "--signal=CONT"
                } else {
                    "--signal=STOP"
                };
                run_checked("systemctl", &["kill", flag, unit])
            }
            Self::Docker { name } => {
                let verb = if running { "unpause" } else { "pause" };
                run_checked("docker", &[verb, name])
            }
        }
    }
}

fn signal_process(pid: i32, running: bool) -> Result<()> {
    let sig = if running {
        Signal::SIGCONT
    } else {
        Signal::SIGSTOP
    };
    log::info!("{} > pid {}", sig, pid);
    signal::kill(Pid::from_raw(pid), sig).map_err(|source| Error::Signal {
        pid,
        signal: sig,
        source,
    })
}

fn freeze_cgroup(dir: &Path, running: bool) -> Result<()> {
    let control = dir.join("cgroup.freeze");
    // "1" freezes every process in the group, "0" thaws them.
    let value = if running { "0" } else { "1" };
    log::info!("{} > {}", value, control.display());
    std::fs::write(&control, value).map_err(|source| Error::Freeze {
        path: control,
        source,
    })
}

fn run_checked(program: &'static str, args: &[&str]) -> Result<()> {
    log::info!("{} {}", program, args.join(" "));
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| Error::CommandSpawn { program, source })?;
    if !status.success() {
        return Err(Error::CommandStatus { program, status });
    }
    Ok(())
}
