#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to spawn `conntrack`: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("`conntrack` dump exited with {0}")]
    DumpStatus(std::process::ExitStatus),
    #[error("`conntrack` dump produced non-UTF-8 output: {0}")]
    DumpEncoding(#[source] std::string::FromUtf8Error),
}
pub type Result<T> = std::result::Result<T, Error>;
