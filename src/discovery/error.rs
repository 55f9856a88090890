use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
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
    #[error("`{program}` produced non-UTF-8 output: {source}")]
    CommandEncoding {
        program: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("missing {field} in listing line `{line}`")]
    MissingField {
        field: &'static str,
        line: String,
    },
    #[error("invalid socket in listing line `{line}`: {source}")]
    InvalidSocket {
        line: String,
        #[source]
        source: crate::socket::Error,
    },
    #[error("failed to read `{}`: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid pid `{pid}` in `{}`", path.display())]
    InvalidPid { pid: String, path: PathBuf },
    #[error("service `{unit}` has no control group")]
    NoControlGroup { unit: String },
}
pub type Result<T> = std::result::Result<T, Error>;
