//! Socket discovery per target variant.
//!
//! Each mechanism returns the finite set of `{family, proto, port}` tuples
//! the target listens on; the rest of the system only depends on that shape.
//! Every parser takes the tool's output as text, so the external tools are
//! only needed at the thin command wrappers. An empty result is a valid
//! return value; the lifecycle refuses to manage such a target.

mod cgroup;
mod docker;
mod error;
mod ss;
mod systemd;

pub use cgroup::cgroup_sockets;
pub use docker::container_sockets;
pub use error::{Error, Result};
pub use ss::pid_sockets;
pub use systemd::service_sockets;

/// Runs an external discovery tool and captures its stdout.
pub(crate) fn capture(program: &'static str, args: &[&str]) -> Result<String> {
    log::info!("{} {}", program, args.join(" "));
    let output = std::process::Command::new(program)
        .args(args)
        .output()
        .map_err(|source| Error::CommandSpawn { program, source })?;
    if !output.status.success() {
        return Err(Error::CommandStatus {
            program,
            status: output.status,
        });
    }
    String::from_utf8(output.stdout).map_err(|source| Error::CommandEncoding { program, source })
}
