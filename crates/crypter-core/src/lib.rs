pub mod config;
pub mod error;
pub mod keyfile;
pub mod paths;

pub use config::CrypterConfig;
pub use error::{CrypterError, CrypterResult};
