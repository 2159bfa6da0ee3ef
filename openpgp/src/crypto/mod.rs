//! Cryptographic primitives.
//!
//! The codec itself never hashes or encrypts anything.  This module
//! defines the engine interfaces through which callers, and the
//! [`S2K`] key derivation, reach the primitives: one trait per
//! capability, bundled by [`Engine`].  The [`backend`] module
//! provides an implementation on top of the RustCrypto crates.
//!
//!   [`S2K`]: s2k::S2K

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::Result;
use crate::types::{HashAlgorithm, SymmetricAlgorithm};

pub mod backend;
pub mod hash;
pub use self::hash::Digest;
pub mod mem;
pub mod s2k;
pub mod symmetric;
pub use self::symmetric::Mode;

/// Holds a session key.
///
/// The session key is cleared when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey(mem::Protected);

impl SessionKey {
    /// Creates a zeroed session key of `size` octets.
    pub fn zeroed(size: usize) -> Self {
        SessionKey(mem::Protected::zeroed(size))
    }
}

impl Deref for SessionKey {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SessionKey {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl AsRef<[u8]> for SessionKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<mem::Protected> for SessionKey {
    fn from(v: mem::Protected) -> Self {
        SessionKey(v)
    }
}

impl From<Vec<u8>> for SessionKey {
    fn from(v: Vec<u8>) -> Self {
        SessionKey(v.into())
    }
}

impl From<&[u8]> for SessionKey {
    fn from(v: &[u8]) -> Self {
        SessionKey(v.into())
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SessionKey ({:?})", self.0)
    }
}

/// Creates hash contexts.
pub trait HashEngine {
    /// Returns a fresh hasher for `algo`.
    ///
    /// Fails with [`Error::UnsupportedHashAlgorithm`] if the engine
    /// does not implement it.
    ///
    ///   [`Error::UnsupportedHashAlgorithm`]: crate::Error::UnsupportedHashAlgorithm
    fn hasher(&self, algo: HashAlgorithm) -> Result<Box<dyn Digest>>;
}

/// Creates CFB mode encryption and decryption streams.
pub trait CipherEngine {
    /// Returns an encrypting stream.
    fn encryptor(&self, algo: SymmetricAlgorithm, key: &[u8], iv: &[u8])
                 -> Result<Box<dyn Mode>>;

    /// Returns a decrypting stream.
    fn decryptor(&self, algo: SymmetricAlgorithm, key: &[u8], iv: &[u8])
                 -> Result<Box<dyn Mode>>;
}

/// Produces random octets.
pub trait RandomEngine {
    /// Fills `buf` with cryptographically strong random data,
    /// suitable for key material.
    fn random(&self, buf: &mut [u8]) -> Result<()>;

    /// Fills `buf` with unpredictable data, suitable for salts and
    /// IVs.
    fn nonce(&self, buf: &mut [u8]) -> Result<()>;
}

/// Generates keys and key derivation parameters.
pub trait KeyGenerator {
    /// Returns a random session key for `algo`.
    fn session_key(&self, algo: SymmetricAlgorithm) -> Result<SessionKey>;

    /// Returns a random salt for an S2K specifier.
    fn s2k_salt(&self) -> Result<[u8; 8]>;
}

/// All engine capabilities.
pub trait Engine: HashEngine + CipherEngine + RandomEngine + KeyGenerator {}

impl<T> Engine for T
    where T: HashEngine + CipherEngine + RandomEngine + KeyGenerator
{}

/// Returns the default engine.
pub fn default_engine() -> backend::RustCrypto {
    backend::RustCrypto::default()
}
