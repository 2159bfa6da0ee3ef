//! Symmetric encryption.
//!
//! OpenPGP encrypts secret key material and session keys in cipher
//! feedback mode.  [`Mode`] is the backend independent interface to
//! such a stream; [`Cfb`] implements it for any block cipher of the
//! RustCrypto `cipher` family.

use cipher::{BlockCipher, NewBlockCipher};
use generic_array::GenericArray;
use generic_array::typenum::Unsigned;

use crate::{Error, Result};
use crate::utils::Lifecycle;

/// A block cipher in a streaming mode.
///
/// Created with the key and IV, fed with [`Mode::push`] and
/// finalized with [`Mode::done`].  Input may be split at arbitrary
/// boundaries.
pub trait Mode: Send + Sync {
    /// Block size of the underlying cipher.
    fn block_size(&self) -> usize;

    /// Transforms `src` into `dst`.
    ///
    /// `dst` and `src` must have the same length.
    fn push(&mut self, dst: &mut [u8], src: &[u8]) -> Result<()>;

    /// Finalizes the stream.
    fn done(&mut self) -> Result<()>;
}

/// Whether a [`Cfb`] instance encrypts or decrypts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

/// Full-block cipher feedback mode.
pub struct Cfb<C: BlockCipher> {
    cipher: C,
    direction: Direction,
    /// The feedback register; collects the current ciphertext block.
    register: GenericArray<u8, C::BlockSize>,
    keystream: GenericArray<u8, C::BlockSize>,
    /// Position in `keystream`.
    pos: usize,
    lifecycle: Lifecycle,
}

impl<C> Cfb<C>
    where C: BlockCipher + NewBlockCipher
{
    /// Creates a CFB stream.
    ///
    /// Fails if the key length does not suit the cipher or the IV is
    /// not one block long.
    pub fn new(direction: Direction, key: &[u8], iv: &[u8]) -> Result<Self> {
        let bs = C::BlockSize::to_usize();
        if iv.len() != bs {
            return Err(Error::InvalidArgument(
                format!("IV must be {} bytes, got {}", bs, iv.len())).into());
        }
        let cipher = C::new_varkey(key).map_err(
            |_| Error::InvalidArgument(
                format!("Bad key length {}", key.len())))?;

        Ok(Cfb {
            cipher,
            direction,
            register: GenericArray::clone_from_slice(iv),
            keystream: Default::default(),
            pos: bs,
            lifecycle: Lifecycle::default(),
        })
    }
}

impl<C> Mode for Cfb<C>
    where C: BlockCipher + Send + Sync
{
    fn block_size(&self) -> usize {
        C::BlockSize::to_usize()
    }

    fn push(&mut self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        self.lifecycle.check()?;
        if dst.len() != src.len() {
            return self.lifecycle.guard(Err(Error::InvalidArgument(
                "dst and src must have the same length".into()).into()));
        }

        let bs = self.block_size();
        for (d, s) in dst.iter_mut().zip(src.iter()) {
            if self.pos == bs {
                self.keystream = self.register.clone();
                self.cipher.encrypt_block(&mut self.keystream);
                self.pos = 0;
            }
            *d = *s ^ self.keystream[self.pos];
            self.register[self.pos] = match self.direction {
                Direction::Encrypt => *d,
                Direction::Decrypt => *s,
            };
            self.pos += 1;
        }
        Ok(())
    }

    fn done(&mut self) -> Result<()> {
        self.lifecycle.check()?;
        self.lifecycle.finish(Ok(()))
    }
}
