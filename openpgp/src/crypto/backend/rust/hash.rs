use std::cmp;

use crate::crypto::hash::Digest;
use crate::crypto::HashEngine;
use crate::{Error, Result};
use crate::types::HashAlgorithm;

use super::RustCrypto;

impl<T> Digest for T
    where T: digest::Digest + Clone + Send + Sync
{
    fn digest_size(&self) -> usize {
        <T as digest::Digest>::output_size()
    }

    fn update(&mut self, data: &[u8]) {
        digest::Digest::update(self, data);
    }

    fn digest(&mut self, digest: &mut [u8]) {
        let result = digest::Digest::finalize_reset(self);
        let n = cmp::min(digest.len(), result.len());
        digest[..n].copy_from_slice(&result[..n]);
    }
}

impl HashEngine for RustCrypto {
    fn hasher(&self, algo: HashAlgorithm) -> Result<Box<dyn Digest>> {
        match algo {
            HashAlgorithm::SHA1 => Ok(Box::new(sha1::Sha1::default())),
            HashAlgorithm::SHA224 => Ok(Box::new(sha2::Sha224::default())),
            HashAlgorithm::SHA256 => Ok(Box::new(sha2::Sha256::default())),
            HashAlgorithm::SHA384 => Ok(Box::new(sha2::Sha384::default())),
            HashAlgorithm::SHA512 => Ok(Box::new(sha2::Sha512::default())),
            HashAlgorithm::MD5 => Ok(Box::new(md5::Md5::default())),
            HashAlgorithm::RipeMD =>
                Ok(Box::new(ripemd160::Ripemd160::default())),
            HashAlgorithm::Private(_) | HashAlgorithm::Unknown(_) =>
                Err(Error::UnsupportedHashAlgorithm(algo).into()),
        }
    }
}
