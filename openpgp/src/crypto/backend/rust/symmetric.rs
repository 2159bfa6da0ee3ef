use crate::crypto::symmetric::{Cfb, Direction, Mode};
use crate::crypto::CipherEngine;
use crate::{Error, Result};
use crate::types::SymmetricAlgorithm;

use super::RustCrypto;

fn cfb(direction: Direction, algo: SymmetricAlgorithm, key: &[u8], iv: &[u8])
       -> Result<Box<dyn Mode>> {
    match algo {
        SymmetricAlgorithm::IDEA =>
            Ok(Box::new(Cfb::<idea::Idea>::new(direction, key, iv)?)),
        SymmetricAlgorithm::TripleDES =>
            Ok(Box::new(Cfb::<des::TdesEde3>::new(direction, key, iv)?)),
        SymmetricAlgorithm::CAST5 =>
            Ok(Box::new(Cfb::<cast5::Cast5>::new(direction, key, iv)?)),
        SymmetricAlgorithm::Blowfish =>
            Ok(Box::new(Cfb::<blowfish::Blowfish>::new(direction, key, iv)?)),
        SymmetricAlgorithm::AES128 =>
            Ok(Box::new(Cfb::<aes::Aes128>::new(direction, key, iv)?)),
        SymmetricAlgorithm::AES192 =>
            Ok(Box::new(Cfb::<aes::Aes192>::new(direction, key, iv)?)),
        SymmetricAlgorithm::AES256 =>
            Ok(Box::new(Cfb::<aes::Aes256>::new(direction, key, iv)?)),
        SymmetricAlgorithm::Twofish =>
            Ok(Box::new(Cfb::<twofish::Twofish>::new(direction, key, iv)?)),
        _ => Err(Error::UnsupportedSymmetricAlgorithm(algo).into()),
    }
}

impl CipherEngine for RustCrypto {
    fn encryptor(&self, algo: SymmetricAlgorithm, key: &[u8], iv: &[u8])
                 -> Result<Box<dyn Mode>> {
        cfb(Direction::Encrypt, algo, key, iv)
    }

    fn decryptor(&self, algo: SymmetricAlgorithm, key: &[u8], iv: &[u8])
                 -> Result<Box<dyn Mode>> {
        cfb(Direction::Decrypt, algo, key, iv)
    }
}
