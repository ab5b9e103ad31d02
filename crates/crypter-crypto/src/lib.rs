//! crypter-crypto: authenticated symmetric encryption for crypter
//!
//! A single secret key seals arbitrary bytes into a versioned, timestamped,
//! nonced token and opens it again, failing closed on any tampering.
//!
//! Key hierarchy:
//! ```text
//! Secret Key (256-bit random, URL-safe base64 on disk)
//!   └── Token Key (HKDF-SHA256, info="crypter-token-enc-v1")
//!       └── Token AEAD: XChaCha20-Poly1305 (nonce=random_192bit, AAD=version||timestamp)
//! ```

pub mod cipher;
pub mod error;
pub mod key;
pub mod token;

pub use cipher::{open, seal, AuthenticatedCipher, MAX_CLOCK_SKEW};
pub use error::{CryptError, CryptResult};
pub use key::{generate, Key};

/// Size of a secret key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;
