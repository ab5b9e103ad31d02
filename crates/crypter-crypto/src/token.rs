//! Token framing
//!
//! Binary layout, before the text encoding:
//! ```text
//! [1 byte: version][8 bytes: timestamp, BE][24 bytes: nonce][N bytes: ciphertext][16 bytes: tag]
//! AAD = version || timestamp
//! ```
//!
//! The stored form is the URL-safe base64 encoding of those bytes, so a
//! token can be written to a text file or pasted into a terminal.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

use crate::error::{CryptError, CryptResult};
use crate::{NONCE_SIZE, TAG_SIZE};

/// Current token format version.
pub const TOKEN_VERSION: u8 = 0x01;

/// Size of the authenticated header: version + timestamp.
pub const AAD_SIZE: usize = 1 + 8;

/// Bytes preceding the ciphertext: version + timestamp + nonce.
pub const HEADER_SIZE: usize = AAD_SIZE + NONCE_SIZE;

/// Fixed overhead of a token over its plaintext (before text encoding).
pub const TOKEN_OVERHEAD: usize = HEADER_SIZE + TAG_SIZE;

/// The fields in front of the ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenHeader {
    pub version: u8,
    pub timestamp: u64,
    pub nonce: [u8; NONCE_SIZE],
}

impl TokenHeader {
    pub fn new(timestamp: u64, nonce: [u8; NONCE_SIZE]) -> Self {
        Self {
            version: TOKEN_VERSION,
            timestamp,
            nonce,
        }
    }

    /// Additional authenticated data: the header minus the nonce, which the
    /// AEAD already binds.
    pub fn aad(&self) -> [u8; AAD_SIZE] {
        let mut aad = [0u8; AAD_SIZE];
        aad[0] = self.version;
        aad[1..].copy_from_slice(&self.timestamp.to_be_bytes());
        aad
    }

    /// Assemble the full binary token from this header and the AEAD output
    /// (`ciphertext || tag`).
    pub fn assemble(&self, sealed: &[u8]) -> Vec<u8> {
        let mut token = Vec::with_capacity(HEADER_SIZE + sealed.len());
        token.extend_from_slice(&self.aad());
        token.extend_from_slice(&self.nonce);
        token.extend_from_slice(sealed);
        token
    }
}

/// A structurally valid, not yet authenticated token.
#[derive(Debug)]
pub struct RawToken<'a> {
    pub header: TokenHeader,
    /// `ciphertext || tag`
    pub sealed: &'a [u8],
}

impl<'a> RawToken<'a> {
    /// Split decoded token bytes into header and sealed payload.
    ///
    /// Only checks structure. Nothing in the result may be trusted until
    /// the tag has verified.
    pub fn parse(bytes: &'a [u8]) -> CryptResult<Self> {
        if bytes.len() < TOKEN_OVERHEAD {
            return Err(CryptError::Format(format!(
                "token too short: {} bytes (minimum {})",
                bytes.len(),
                TOKEN_OVERHEAD
            )));
        }

        let version = bytes[0];
        if version != TOKEN_VERSION {
            return Err(CryptError::Format(format!(
                "unsupported token version 0x{version:02x}"
            )));
        }

        let (header_bytes, sealed) = bytes.split_at(HEADER_SIZE);
        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&header_bytes[1..AAD_SIZE]);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&header_bytes[AAD_SIZE..]);

        Ok(Self {
            header: TokenHeader {
                version,
                timestamp: u64::from_be_bytes(timestamp),
                nonce,
            },
            sealed,
        })
    }
}

/// Encode binary token bytes into their stored text form.
pub fn encode_text(token: &[u8]) -> Vec<u8> {
    URL_SAFE.encode(token).into_bytes()
}

/// Decode the stored text form back into binary token bytes.
///
/// The input must be exactly the canonical padded encoding; no surrounding
/// whitespace is accepted.
pub fn decode_text(text: &[u8]) -> CryptResult<Vec<u8>> {
    URL_SAFE
        .decode(text)
        .map_err(|e| CryptError::Format(format!("token is not URL-safe base64: {e}")))
}
