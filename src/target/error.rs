use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to send {signal} to pid {pid}: {source}")]
    Signal {
        pid: i32,
        signal: nix::sys::signal::Signal,
        #[source]
        source: nix::Error,
    },
    #[error("failed to write freezer control `{}`: {source}", path.display())]
    Freeze {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to run `{program}`: {source}")]
    CommandSpawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    CommandStatus {
        program: &'static str,
        status: std::process::ExitStatus,
    },
}
pub type Result<T> = std::result::Result<T, Error>;
