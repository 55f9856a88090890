#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid address family: `{0}`")]
    InvalidFamily(String),
    #[error("invalid transport protocol: `{0}`")]
    InvalidProto(String),
    #[error("invalid port: `{0}`")]
    InvalidPort(String),
}
pub type Result<T> = std::result::Result<T, Error>;
