//! Implementation of the engine traits using pure Rust cryptographic
//! libraries.

use rand_core::{OsRng, RngCore};

use crate::{Error, Result};
use crate::crypto::{KeyGenerator, RandomEngine, SessionKey};
use crate::types::SymmetricAlgorithm;

mod hash;
mod symmetric;

/// The RustCrypto engine.
///
/// Hashing uses the `sha-1`, `sha2`, `md-5` and `ripemd160` crates,
/// encryption the block ciphers of the `cipher` family, and
/// randomness comes from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct RustCrypto {
    _private: (),
}

impl RandomEngine for RustCrypto {
    fn random(&self, buf: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(buf)
            .map_err(|e| Error::InvalidArgument(
                format!("Random number generator failed: {}", e)).into())
    }

    fn nonce(&self, buf: &mut [u8]) -> Result<()> {
        // The OS generator is strong enough for both.
        self.random(buf)
    }
}

impl KeyGenerator for RustCrypto {
    fn session_key(&self, algo: SymmetricAlgorithm) -> Result<SessionKey> {
        let mut sk = SessionKey::zeroed(algo.key_size()?);
        self.random(&mut sk)?;
        Ok(sk)
    }

    fn s2k_salt(&self) -> Result<[u8; 8]> {
        let mut salt = [0; 8];
        self.nonce(&mut salt)?;
        Ok(salt)
    }
}
