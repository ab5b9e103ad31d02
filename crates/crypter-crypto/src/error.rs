use thiserror::Error;

pub type CryptResult<T> = Result<T, CryptError>;

/// Failure kinds of the authenticated cipher.
///
/// `Format` and `Authentication` are kept apart for logging and tests, but
/// neither message reveals which check inside `open` rejected the token.
#[derive(Debug, Error)]
pub enum CryptError {
    #[error("invalid key: {0}")]
    KeyFormat(String),

    #[error("malformed token: {0}")]
    Format(String),

    #[error("token authentication failed")]
    Authentication,

    #[error("token expired: {age_secs}s old, limit is {ttl_secs}s")]
    Expired { age_secs: u64, ttl_secs: u64 },

    #[error("token timestamp is {ahead_secs}s in the future")]
    ClockSkew { ahead_secs: u64 },

    #[error("secure random source unavailable: {0}")]
    RandomSourceUnavailable(String),

    #[error("plaintext cannot be sealed: {0}")]
    Seal(String),
}

impl CryptError {
    /// True for the errors a user should see as "wrong key or corrupted file".
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, CryptError::Format(_) | CryptError::Authentication)
    }
}
