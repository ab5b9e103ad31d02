//! Secret key: generation, storage encoding, and subkey derivation

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{CryptError, CryptResult};
use crate::KEY_SIZE;

/// HKDF info string for the token encryption subkey.
const TOKEN_KEY_INFO: &[u8] = b"crypter-token-enc-v1";

/// Length of a key in its URL-safe base64 storage form.
pub const ENCODED_KEY_LEN: usize = 44;

/// A 256-bit secret key. Zeroized on drop.
#[derive(Clone)]
pub struct Key {
    bytes: [u8; KEY_SIZE],
}

impl Key {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Generate a fresh key from the operating system CSPRNG.
    pub fn generate() -> CryptResult<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        fill_random(&mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    /// Encode as URL-safe base64 (with padding) for storage in a text file.
    pub fn encode(&self) -> String {
        URL_SAFE.encode(self.bytes)
    }

    /// Parse a key from its storage encoding.
    ///
    /// Surrounding ASCII whitespace is ignored so a key file ending in a
    /// newline still loads. Anything else that is not exactly 32 bytes of
    /// URL-safe base64 is a `KeyFormat` error.
    pub fn decode(encoded: &[u8]) -> CryptResult<Self> {
        let trimmed = encoded.trim_ascii();
        if trimmed.len() != ENCODED_KEY_LEN {
            return Err(CryptError::KeyFormat(format!(
                "expected {} base64 characters, got {}",
                ENCODED_KEY_LEN,
                trimmed.len()
            )));
        }

        let mut decoded = URL_SAFE
            .decode(trimmed)
            .map_err(|e| CryptError::KeyFormat(format!("not URL-safe base64: {e}")))?;

        if decoded.len() != KEY_SIZE {
            let len = decoded.len();
            decoded.zeroize();
            return Err(CryptError::KeyFormat(format!(
                "decoded key is {len} bytes (expected {KEY_SIZE})"
            )));
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self::from_bytes(bytes))
    }

    /// Derive the subkey used to encrypt and authenticate tokens.
    pub(crate) fn token_key(&self) -> [u8; KEY_SIZE] {
        hkdf_derive(&self.bytes, TOKEN_KEY_INFO)
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a new key and return it in storage encoding.
pub fn generate() -> CryptResult<String> {
    let key = Key::generate()?;
    tracing::debug!("generated new key");
    Ok(key.encode())
}

/// Fill `buf` from the OS random source, surfacing failure instead of panicking.
pub(crate) fn fill_random(buf: &mut [u8]) -> CryptResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptError::RandomSourceUnavailable(e.to_string()))
}

/// HKDF-SHA256 key derivation with a domain-specific info string.
fn hkdf_derive(ikm: &[u8; KEY_SIZE], info: &[u8]) -> [u8; KEY_SIZE] {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = [0u8; KEY_SIZE];
    let Ok(()) = hkdf.expand(info, &mut okm) else {
        unreachable!("HKDF-SHA256 can expand to 32 bytes");
    };
    okm
}
