//! Authenticated token encryption with XChaCha20-Poly1305
//!
//! `seal` produces a self-describing token (see [`crate::token`]); `open`
//! verifies the Poly1305 tag over header, nonce and ciphertext before any
//! plaintext leaves this module. The cipher key is an HKDF subkey of the
//! user's secret, never the secret itself.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroize;

use crate::error::{CryptError, CryptResult};
use crate::key::{fill_random, Key};
use crate::token::{self, RawToken, TokenHeader};
use crate::NONCE_SIZE;

/// Tokens stamped up to this far in the future are still accepted by the
/// TTL-checking entry points.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Seals and opens tokens under one key.
///
/// Holds only the derived cipher state; cheap to build per call and safe to
/// share between threads.
pub struct AuthenticatedCipher {
    aead: XChaCha20Poly1305,
}

impl AuthenticatedCipher {
    pub fn new(key: &Key) -> Self {
        let mut token_key = key.token_key();
        let aead = XChaCha20Poly1305::new((&token_key).into());
        token_key.zeroize();
        Self { aead }
    }

    /// Encrypt `plaintext` into a text-encoded token stamped with the
    /// current time.
    pub fn seal(&self, plaintext: &[u8]) -> CryptResult<Vec<u8>> {
        self.seal_at(plaintext, unix_now())
    }

    /// Encrypt `plaintext` into a text-encoded token with an explicit
    /// creation timestamp (unix seconds).
    pub fn seal_at(&self, plaintext: &[u8], timestamp: u64) -> CryptResult<Vec<u8>> {
        let mut nonce = [0u8; NONCE_SIZE];
        fill_random(&mut nonce)?;

        let header = TokenHeader::new(timestamp, nonce);
        let aad = header.aad();

        let sealed = self
            .aead
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            // XChaCha20-Poly1305 only refuses inputs beyond ~256 GiB
            .map_err(|e| CryptError::Seal(e.to_string()))?;

        let bytes = header.assemble(&sealed);
        tracing::debug!(
            plaintext_len = plaintext.len(),
            token_len = bytes.len(),
            timestamp,
            "sealed token"
        );
        Ok(token::encode_text(&bytes))
    }

    /// Verify and decrypt a text-encoded token.
    ///
    /// Returns `Format` for input that is not a token at all and
    /// `Authentication` for anything whose tag does not verify.
    pub fn open(&self, token: &[u8]) -> CryptResult<Vec<u8>> {
        self.verify(token).map(|(_, plaintext)| plaintext)
    }

    /// Like [`open`](Self::open), but also rejects tokens older than `ttl`
    /// or stamped more than [`MAX_CLOCK_SKEW`] in the future.
    pub fn open_with_ttl(&self, token: &[u8], ttl: Duration) -> CryptResult<Vec<u8>> {
        self.open_at_time(token, ttl, unix_now())
    }

    /// TTL-checked open against an explicit clock (`now` in unix seconds).
    ///
    /// Age is only checked after the tag verifies, so an unauthenticated
    /// timestamp never influences the error returned.
    pub fn open_at_time(&self, token: &[u8], ttl: Duration, now: u64) -> CryptResult<Vec<u8>> {
        let (header, mut plaintext) = self.verify(token)?;

        if let Err(e) = check_age(header.timestamp, ttl, now) {
            plaintext.zeroize();
            return Err(e);
        }
        Ok(plaintext)
    }

    /// Return the creation timestamp of an authentic token.
    pub fn extract_timestamp(&self, token: &[u8]) -> CryptResult<u64> {
        let (header, mut plaintext) = self.verify(token)?;
        plaintext.zeroize();
        Ok(header.timestamp)
    }

    fn verify(&self, token: &[u8]) -> CryptResult<(TokenHeader, Vec<u8>)> {
        let bytes = token::decode_text(token)?;
        let raw = RawToken::parse(&bytes)?;
        let aad = raw.header.aad();

        let plaintext = self
            .aead
            .decrypt(
                XNonce::from_slice(&raw.header.nonce),
                Payload {
                    msg: raw.sealed,
                    aad: &aad,
                },
            )
            .map_err(|_| CryptError::Authentication)?;

        tracing::debug!(
            token_len = bytes.len(),
            plaintext_len = plaintext.len(),
            "opened token"
        );
        Ok((raw.header, plaintext))
    }
}

fn check_age(timestamp: u64, ttl: Duration, now: u64) -> CryptResult<()> {
    let skew = MAX_CLOCK_SKEW.as_secs();
    if timestamp > now.saturating_add(skew) {
        return Err(CryptError::ClockSkew {
            ahead_secs: timestamp - now,
        });
    }

    let age_secs = now.saturating_sub(timestamp);
    if age_secs > ttl.as_secs() {
        return Err(CryptError::Expired {
            age_secs,
            ttl_secs: ttl.as_secs(),
        });
    }
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Seal `plaintext` under an encoded key.
pub fn seal(plaintext: &[u8], key: &[u8]) -> CryptResult<Vec<u8>> {
    let key = Key::decode(key)?;
    AuthenticatedCipher::new(&key).seal(plaintext)
}

/// Open a token under an encoded key.
pub fn open(token: &[u8], key: &[u8]) -> CryptResult<Vec<u8>> {
    let key = Key::decode(key)?;
    AuthenticatedCipher::new(&key).open(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{TOKEN_OVERHEAD, TOKEN_VERSION};
    use crate::KEY_SIZE;

    fn test_cipher() -> AuthenticatedCipher {
        AuthenticatedCipher::new(&Key::from_bytes([42u8; KEY_SIZE]))
    }

    fn decoded(token: &[u8]) -> Vec<u8> {
        token::decode_text(token).unwrap()
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let cipher = test_cipher();
        let plaintext = b"hello, encrypted world!";

        let token = cipher.seal(plaintext).unwrap();
        let opened = cipher.open(&token).unwrap();

        assert_eq!(&opened, plaintext);
    }

    #[test]
    fn test_seal_open_empty() {
        let cipher = test_cipher();
        let token = cipher.seal(b"").unwrap();
        assert_eq!(decoded(&token).len(), TOKEN_OVERHEAD);
        assert_eq!(cipher.open(&token).unwrap(), b"");
    }

    #[test]
    fn test_token_size() {
        let cipher = test_cipher();
        let plaintext = vec![0u8; 1000];

        let token = cipher.seal(&plaintext).unwrap();

        // version (1) + timestamp (8) + nonce (24) + plaintext (1000) + tag (16)
        assert_eq!(decoded(&token).len(), 1 + 8 + 24 + 1000 + 16);
    }

    #[test]
    fn test_seal_is_not_deterministic() {
        let cipher = test_cipher();
        let t1 = cipher.seal_at(b"same input", 100).unwrap();
        let t2 = cipher.seal_at(b"same input", 100).unwrap();
        assert_ne!(t1, t2, "fresh nonce must make tokens differ");
    }

    #[test]
    fn test_token_carries_version_and_timestamp() {
        let cipher = test_cipher();
        let bytes = decoded(&cipher.seal_at(b"x", 1_234_567).unwrap());
        assert_eq!(bytes[0], TOKEN_VERSION);
        assert_eq!(&bytes[1..9], &1_234_567u64.to_be_bytes());
    }

    #[test]
    fn test_open_wrong_key() {
        let c1 = AuthenticatedCipher::new(&Key::from_bytes([1u8; KEY_SIZE]));
        let c2 = AuthenticatedCipher::new(&Key::from_bytes([2u8; KEY_SIZE]));

        let token = c1.seal(b"secret data").unwrap();
        assert!(matches!(c2.open(&token), Err(CryptError::Authentication)));
    }

    #[test]
    fn test_tampered_timestamp() {
        let cipher = test_cipher();
        let mut bytes = decoded(&cipher.seal_at(b"secret data", 500).unwrap());
        bytes[8] ^= 0x01;

        let result = cipher.open(&token::encode_text(&bytes));
        assert!(
            matches!(result, Err(CryptError::Authentication)),
            "timestamp is authenticated data"
        );
    }

    #[test]
    fn test_tampered_nonce() {
        let cipher = test_cipher();
        let mut bytes = decoded(&cipher.seal(b"secret data").unwrap());
        bytes[10] ^= 0xFF;

        let result = cipher.open(&token::encode_text(&bytes));
        assert!(matches!(result, Err(CryptError::Authentication)));
    }

    #[test]
    fn test_tampered_ciphertext() {
        let cipher = test_cipher();
        let mut bytes = decoded(&cipher.seal(b"secret data").unwrap());
        // first ciphertext byte, right after the header
        bytes[33] ^= 0xFF;

        let result = cipher.open(&token::encode_text(&bytes));
        assert!(matches!(result, Err(CryptError::Authentication)));
    }

    #[test]
    fn test_tampered_tag() {
        let cipher = test_cipher();
        let mut bytes = decoded(&cipher.seal(b"secret data").unwrap());
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let result = cipher.open(&token::encode_text(&bytes));
        assert!(matches!(result, Err(CryptError::Authentication)));
    }

    #[test]
    fn test_open_future_version_is_format_error() {
        let cipher = test_cipher();
        let mut bytes = decoded(&cipher.seal(b"secret data").unwrap());
        bytes[0] = 0x02;

        let result = cipher.open(&token::encode_text(&bytes));
        assert!(matches!(result, Err(CryptError::Format(_))));
    }

    #[test]
    fn test_open_rejects_raw_binary() {
        let cipher = test_cipher();
        let bytes = decoded(&cipher.seal(b"secret data").unwrap());
        assert!(cipher.open(&bytes).is_err());
    }

    #[test]
    fn test_ttl_accepts_fresh_token() {
        let cipher = test_cipher();
        let token = cipher.seal_at(b"fresh", 1_000).unwrap();
        let opened = cipher
            .open_at_time(&token, Duration::from_secs(60), 1_030)
            .unwrap();
        assert_eq!(opened, b"fresh");
    }

    #[test]
    fn test_ttl_boundary_is_inclusive() {
        let cipher = test_cipher();
        let token = cipher.seal_at(b"edge", 1_000).unwrap();
        assert!(cipher
            .open_at_time(&token, Duration::from_secs(60), 1_060)
            .is_ok());
    }

    #[test]
    fn test_ttl_rejects_old_token() {
        let cipher = test_cipher();
        let token = cipher.seal_at(b"stale", 1_000).unwrap();
        let err = cipher
            .open_at_time(&token, Duration::from_secs(60), 1_061)
            .unwrap_err();
        assert!(matches!(
            err,
            CryptError::Expired {
                age_secs: 61,
                ttl_secs: 60
            }
        ));
    }

    #[test]
    fn test_ttl_rejects_future_token() {
        let cipher = test_cipher();
        let token = cipher.seal_at(b"from the future", 10_000).unwrap();

        // within skew allowance
        assert!(cipher
            .open_at_time(&token, Duration::from_secs(5), 10_000 - 60)
            .is_ok());

        let err = cipher
            .open_at_time(&token, Duration::from_secs(5), 10_000 - 61)
            .unwrap_err();
        assert!(matches!(err, CryptError::ClockSkew { ahead_secs: 61 }));
    }

    #[test]
    fn test_ttl_checks_authentication_first() {
        let c1 = AuthenticatedCipher::new(&Key::from_bytes([1u8; KEY_SIZE]));
        let c2 = AuthenticatedCipher::new(&Key::from_bytes([2u8; KEY_SIZE]));
        let token = c1.seal_at(b"old and foreign", 0).unwrap();

        let err = c2
            .open_at_time(&token, Duration::from_secs(1), 1_000_000)
            .unwrap_err();
        assert!(matches!(err, CryptError::Authentication));
    }

    #[test]
    fn test_open_with_ttl_uses_current_time() {
        let cipher = test_cipher();
        let token = cipher.seal(b"now").unwrap();
        assert_eq!(
            cipher.open_with_ttl(&token, Duration::from_secs(3600)).unwrap(),
            b"now"
        );
    }

    #[test]
    fn test_extract_timestamp() {
        let cipher = test_cipher();
        let token = cipher.seal_at(b"stamped", 1_700_000_000).unwrap();
        assert_eq!(cipher.extract_timestamp(&token).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_extract_timestamp_wrong_key() {
        let c1 = AuthenticatedCipher::new(&Key::from_bytes([1u8; KEY_SIZE]));
        let c2 = AuthenticatedCipher::new(&Key::from_bytes([2u8; KEY_SIZE]));
        let token = c1.seal_at(b"stamped", 77).unwrap();
        assert!(matches!(
            c2.extract_timestamp(&token),
            Err(CryptError::Authentication)
        ));
    }

    #[test]
    fn test_free_functions_reject_bad_key() {
        assert!(matches!(
            seal(b"data", b"not-a-key"),
            Err(CryptError::KeyFormat(_))
        ));
        assert!(matches!(
            open(b"data", b"not-a-key"),
            Err(CryptError::KeyFormat(_))
        ));
    }

    #[test]
    fn test_cipher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AuthenticatedCipher>();
        assert_send_sync::<Key>();
    }
}
