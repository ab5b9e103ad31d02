use thiserror::Error;

pub type CrypterResult<T> = Result<T, CrypterError>;

#[derive(Debug, Error)]
pub enum CrypterError {
    #[error("config error: {0}")]
    Config(String),

    #[error("path error: {0}")]
    Path(String),

    #[error("refusing to overwrite existing key file: {0}")]
    KeyFileExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
