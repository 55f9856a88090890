//! Socket discovery for every process in a cgroup.

use std::path::Path;

use crate::socket::Socket;

use super::{Error, Result, ss};

/// Unions pid-based discovery over every member of the cgroup at `dir`.
///
/// # Errors
///
/// Fails if `cgroup.procs` cannot be read or any member pid's sockets cannot
/// be discovered.
pub fn cgroup_sockets(dir: &Path) -> Result<Vec<Socket>> {
    let procs = dir.join("cgroup.procs");
    let contents = std::fs::read_to_string(&procs).map_err(|source| Error::FileRead {
        path: procs.clone(),
        source,
    })?;
    let pids = parse_member_pids(&contents, &procs)?;
    log::debug!("cgroup `{}` has {} member processes", dir.display(), pids.len());

    let mut sockets = Vec::new();
    for pid in pids {
        sockets.extend(ss::pid_sockets(pid)?);
    }
    Ok(sockets)
}

/// Parses the pid-per-line contents of a `cgroup.procs` file.
pub(crate) fn parse_member_pids(contents: &str, origin: &Path) -> Result<Vec<i32>> {
    contents
        .split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| Error::InvalidPid {
                pid: token.to_owned(),
                path: origin.to_path_buf(),
            })
        })
        .collect()
}
