//! Hash functions.
//!
//! [`Digest`] is the backend independent interface to a running hash
//! computation.  Contexts are created by a [`HashEngine`].
//!
//!   [`HashEngine`]: super::HashEngine

use std::io;

use dyn_clone::DynClone;

/// Hasher capable of calculating a digest for the input byte stream.
///
/// Creating the hasher initializes it, [`Digest::update`] pushes
/// data, and [`Digest::digest`] finalizes it and reads the result.
pub trait Digest: DynClone + Send + Sync {
    /// Size of the digest in bytes
    fn digest_size(&self) -> usize;

    /// Writes data into the hash function.
    fn update(&mut self, data: &[u8]);

    /// Finalizes the hash function and writes the digest into the
    /// provided slice.
    ///
    /// Resets the hash function contexts.
    ///
    /// `digest` must be at least `self.digest_size()` bytes large,
    /// otherwise the digest will be truncated.
    fn digest(&mut self, digest: &mut [u8]);

    /// Finalizes the hash function and returns the digest.
    fn into_digest(mut self: Box<Self>) -> Vec<u8> {
        let mut d = vec![0; self.digest_size()];
        self.digest(&mut d);
        d
    }
}

dyn_clone::clone_trait_object!(Digest);

impl io::Write for dyn Digest {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
