//! Socket discovery for a systemd unit, by way of its control group.

use crate::socket::Socket;
use crate::target;

use super::{Error, Result, capture, cgroup};

/// Resolves the unit's control group and discovers the sockets of its member
/// processes.
///
/// # Errors
///
/// Fails if `systemctl` cannot be run, the unit has no control group (not
/// loaded or not running), or the cgroup discovery itself fails.
pub fn service_sockets(unit: &str) -> Result<Vec<Socket>> {
    let output = capture(
        "systemctl",
        &["show", "-p", "ControlGroup", "--value", unit],
    )?;
    let control_group = parse_control_group(&output, unit)?;
    cgroup::cgroup_sockets(&target::cgroup_dir(target::CGROUP_ROOT, control_group))
}

/// Parses the `systemctl show --value` output into a control group path.
pub(crate) fn parse_control_group<'a>(output: &'a str, unit: &str) -> Result<&'a str> {
    let control_group = output.trim();
    if control_group.is_empty() {
        return Err(Error::NoControlGroup {
            unit: unit.to_owned(),
        });
    }
    Ok(control_group)
}
