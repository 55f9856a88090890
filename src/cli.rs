use std::path::PathBuf;

use clap::Parser;

/// Pause a process, container, or service based on firewall connection state
/// tracking.
///
/// Must be run with privileges sufficient to signal the target, read the
/// cgroup filesystem, or drive the service/container managers, and should
/// only be started once the target is ready to accept connections.
#[derive(Debug, Parser)]
#[command(name = "connfreeze", version)]
pub struct Cli {
    #[command(flatten)]
    pub target: TargetSelector,

    /// Override automatic socket detection in favor of these conntrack args.
    /// Quote the value so spaces survive the shell; each occurrence becomes
    /// one independent watcher.
    #[arg(short = 'c', long = "conntrack", value_name = "ARGS", allow_hyphen_values = true)]
    pub conntrack: Vec<String>,
}

/// Exactly one way of naming the target must be given.
#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
pub struct TargetSelector {
    /// PID of a process with listening sockets.
    #[arg(short, long)]
    pub pid: Option<i32>,

    /// Name of a docker container with published ports.
    #[arg(short, long, value_name = "CONTAINER")]
    pub docker: Option<String>,

    /// Name of a systemd service with listening sockets.
    #[arg(short, long)]
    pub service: Option<String>,

    /// Path of a cgroup with listening sockets, relative to the cgroup2 root.
    #[arg(short = 'g', long, value_name = "CGROUP")]
    pub cgroup: Option<PathBuf>,
}
