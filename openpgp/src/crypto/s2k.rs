//! String-to-Key (S2K) specifiers.
//!
//! String-to-key (S2K) specifiers are used to convert password
//! strings into symmetric-key encryption/decryption keys.  See
//! [Section 3.7 of RFC 4880].
//!
//!   [Section 3.7 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-3.7

use std::fmt;

#[cfg(test)]
use quickcheck::{Arbitrary, Gen};

use crate::{Error, Result};
use crate::crypto::{mem, HashEngine, SessionKey};
use crate::types::HashAlgorithm;

/// String-to-Key (S2K) specifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum S2K {
    /// Simply hashes the password.
    Simple {
        /// Hash used for key derivation.
        hash: HashAlgorithm
    },
    /// Hashes the password with a public `salt` value.
    Salted {
        /// Hash used for key derivation.
        hash: HashAlgorithm,
        /// Public salt value mixed into the password.
        salt: [u8; 8],
    },
    /// Repeatedly hashes the password with a public `salt` value.
    Iterated {
        /// Hash used for key derivation.
        hash: HashAlgorithm,
        /// Public salt value mixed into the password.
        salt: [u8; 8],
        /// Number of bytes to hash, decoded from the count octet.
        hash_bytes: u32,
    },
    /// Private S2K algorithm
    Private(u8),
    /// Unknown S2K algorithm
    Unknown(u8),
}

impl S2K {
    /// Returns the length of a specifier on the wire, given its type
    /// octet.
    ///
    /// Type 2 is reserved.  Types other than 0, 1 and 3 have no
    /// known layout.  Both fail with [`Error::BadS2KType`].
    pub fn wire_len(typ: u8) -> Result<usize> {
        match typ {
            0 => Ok(2),
            1 => Ok(10),
            3 => Ok(11),
            _ => Err(Error::BadS2KType(typ).into()),
        }
    }

    /// Decodes a specifier from the front of `buf`.
    ///
    /// Returns the specifier and the number of octets it occupies.
    /// `buf` must hold the complete specifier.
    pub fn parse(buf: &[u8]) -> Result<(S2K, usize)> {
        let typ = *buf.first().ok_or_else(
            || Error::MalformedPacket("Truncated S2K specifier".into()))?;
        let len = Self::wire_len(typ)?;
        if buf.len() < len {
            return Err(Error::MalformedPacket(
                format!("S2K specifier needs {} bytes, got {}",
                        len, buf.len())).into());
        }

        let hash = HashAlgorithm::from(buf[1]);
        let salt = || {
            let mut s = [0; 8];
            s.copy_from_slice(&buf[2..10]);
            s
        };
        let s2k = match typ {
            0 => S2K::Simple { hash },
            1 => S2K::Salted { hash, salt: salt() },
            _ => S2K::Iterated {
                hash,
                salt: salt(),
                hash_bytes: Self::decode_count(buf[10]),
            },
        };
        Ok((s2k, len))
    }

    /// Appends the wire representation to `out`.
    pub fn serialize(&self, out: &mut Vec<u8>) -> Result<()> {
        match *self {
            S2K::Simple { hash } => {
                out.push(0);
                out.push(hash.into());
            }
            S2K::Salted { hash, ref salt } => {
                out.push(1);
                out.push(hash.into());
                out.extend_from_slice(salt);
            }
            S2K::Iterated { hash, ref salt, hash_bytes } => {
                let coded = Self::encode_count(hash_bytes)?;
                out.push(3);
                out.push(hash.into());
                out.extend_from_slice(salt);
                out.push(coded);
            }
            S2K::Private(u) | S2K::Unknown(u) =>
                return Err(Error::BadS2KType(u).into()),
        }
        Ok(())
    }

    /// Converts the password to a key of `key_size` octets.
    ///
    /// The hash contexts are obtained from `engine`.  If the key is
    /// longer than the digest, further contexts preloaded with one,
    /// two, ... zero octets supply the remaining key octets.
    pub fn derive_key<E>(&self, engine: &E, password: &[u8], key_size: usize)
                         -> Result<SessionKey>
        where E: HashEngine + ?Sized
    {
        let hash = match self {
            S2K::Simple { hash } | S2K::Salted { hash, .. }
                | S2K::Iterated { hash, .. } => *hash,
            S2K::Unknown(u) | S2K::Private(u) =>
                return Err(Error::BadS2KType(*u).into()),
        };

        let mut ctx = engine.hasher(hash)?;
        let hash_sz = ctx.digest_size();
        let mut zeros = Vec::new();
        let mut ret = SessionKey::zeroed(key_size);

        for chunk in ret.chunks_mut(hash_sz) {
            ctx.update(&zeros);

            match self {
                S2K::Simple { .. } => {
                    ctx.update(password);
                }
                S2K::Salted { salt, .. } => {
                    ctx.update(salt);
                    ctx.update(password);
                }
                S2K::Iterated { salt, hash_bytes, .. }
                    if (*hash_bytes as usize) < salt.len() + password.len() =>
                {
                    // The whole salt and password are always hashed
                    // at least once.
                    ctx.update(salt);
                    ctx.update(password);
                }
                S2K::Iterated { salt, hash_bytes, .. } => {
                    let data: mem::Protected =
                        [&salt[..], password].concat().into();
                    let mut left = *hash_bytes as usize;
                    while left > 0 {
                        let n = left.min(data.len());
                        ctx.update(&data[..n]);
                        left -= n;
                    }
                }
                S2K::Unknown(_) | S2K::Private(_) =>
                    unreachable!("rejected above"),
            }

            ctx.digest(chunk);
            zeros.push(0);
        }

        Ok(ret)
    }

    /// Returns an encodable iteration count larger or equal to
    /// `hash_bytes`.
    ///
    /// The largest encodable count is `0x3e00000`.
    pub fn nearest_hash_count(hash_bytes: usize) -> u32 {
        match hash_bytes {
            0..=1024 => 1024,
            1025..=2048 => hash_bytes as u32,
            0x3e00001..=usize::MAX => 0x3e00000,
            hash_bytes => {
                let hash_bytes = hash_bytes as u32;
                let msb = 32 - hash_bytes.leading_zeros();
                let mantissa_mask = 0b1111_000000 << (msb - 11);
                let tail_mask = (1 << (msb - 11)) - 1;
                let mantissa = (hash_bytes & mantissa_mask) >> (msb - 5);
                let exp = msb - 11;

                if hash_bytes & tail_mask != 0 {
                    if mantissa < 0b1111 {
                        Self::decode_count((mantissa as u8 + 1) | (exp as u8) << 4)
                    } else {
                        Self::decode_count((exp as u8 + 1) << 4)
                    }
                } else {
                    hash_bytes
                }
            }
        }
    }

    /// Decodes the OpenPGP encoding of the number of bytes to hash.
    ///
    /// The count is `(16 + (c & 15)) << ((c >> 4) + 6)`.
    pub fn decode_count(coded: u8) -> u32 {
        let mantissa = 16 + (coded as u32 & 15);
        let exp = (coded as u32 >> 4) + 6;

        mantissa << exp
    }

    /// Converts `hash_bytes` into coded count representation.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] if `hash_bytes` cannot
    /// be encoded.  See also [`S2K::nearest_hash_count`].
    pub fn encode_count(hash_bytes: u32) -> Result<u8> {
        // eeee.mmmm -> (16 + mmmm) * 2^(6 + e)
        let msb = 32 - hash_bytes.leading_zeros();
        if msb < 11 || msb > 26 {
            return Err(Error::InvalidArgument(
                format!("S2K: cannot encode iteration count of {}",
                        hash_bytes)).into());
        }

        let mantissa_mask = 0b1111_000000 << (msb - 11);
        let tail_mask = (1 << (msb - 11)) - 1;
        let exp = msb - 11;
        let mantissa = (hash_bytes & mantissa_mask) >> (msb - 5);

        if tail_mask & hash_bytes != 0 {
            return Err(Error::InvalidArgument(
                format!("S2K: cannot encode iteration count of {}",
                        hash_bytes)).into());
        }

        Ok(mantissa as u8 | (exp as u8) << 4)
    }
}

fn hex(salt: &[u8]) -> String {
    salt.iter().map(|b| format!("{:02X}", b)).collect()
}

impl fmt::Display for S2K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            S2K::Simple { hash } =>
                write!(f, "Simple S2K with {}", hash),
            S2K::Salted { hash, salt } =>
                write!(f, "Salted S2K with {} and salt {}", hash, hex(&salt)),
            S2K::Iterated { hash, salt, hash_bytes } =>
                write!(f, "Iterated and Salted S2K with {}, salt {} and \
                           {} bytes to hash",
                       hash, hex(&salt), hash_bytes),
            S2K::Private(u) =>
                write!(f, "Private/Experimental S2K {}", u),
            S2K::Unknown(u) =>
                write!(f, "Unknown S2K {}", u),
        }
    }
}

#[cfg(test)]
impl Arbitrary for S2K {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut salt = [0u8; 8];
        for b in salt.iter_mut() {
            *b = u8::arbitrary(g);
        }
        match u8::arbitrary(g) % 3 {
            0 => S2K::Simple { hash: HashAlgorithm::arbitrary(g) },
            1 => S2K::Salted { hash: HashAlgorithm::arbitrary(g), salt },
            _ => S2K::Iterated {
                hash: HashAlgorithm::arbitrary(g),
                salt,
                hash_bytes: S2K::decode_count(u8::arbitrary(g)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::backend::RustCrypto;
    use crate::types::SymmetricAlgorithm;

    fn to_hex(d: &[u8]) -> String {
        hex(d)
    }

    #[test]
    fn derive_known_keys() {
        struct Test<'a> {
            s2k: S2K,
            cipher_algo: SymmetricAlgorithm,
            password: &'a str,
            key_hex: &'a str,
        }

        let tests = [
            Test {
                cipher_algo: SymmetricAlgorithm::AES256,
                s2k: S2K::Simple { hash: HashAlgorithm::SHA1, },
                password: "1234",
                key_hex: "7110EDA4D09E062AA5E4A390B0A572AC0D2C0220F352B0D292B65164C2A67301",
            },
            Test {
                cipher_algo: SymmetricAlgorithm::AES256,
                s2k: S2K::Salted {
                    hash: HashAlgorithm::SHA1,
                    salt: [0xa8, 0x42, 0xa7, 0xa9, 0x59, 0xfa, 0x42, 0x2a],
                },
                password: "123456",
                key_hex: "8B79077CA448F6FB3D3AD2A264D3B938D357C9FB3E41219FD962DF960A9AFA08",
            },
            Test {
                cipher_algo: SymmetricAlgorithm::AES256,
                s2k: S2K::Iterated {
                    hash: HashAlgorithm::SHA1,
                    salt: [0x78, 0x45, 0xf0, 0x5b, 0x55, 0xf7, 0xb4, 0x9e],
                    hash_bytes: S2K::decode_count(241),
                },
                password: "qwerty",
                key_hex: "575AD156187A3F8CEC11108309236EB499F1E682F0D1AFADFAC4ECF97613108A",
            },
            Test {
                cipher_algo: SymmetricAlgorithm::AES192,
                s2k: S2K::Iterated {
                    hash: HashAlgorithm::SHA1,
                    salt: [0x8f, 0x81, 0x74, 0xc5, 0xd9, 0x61, 0xc7, 0x79],
                    hash_bytes: S2K::decode_count(238),
                },
                password: "123",
                key_hex: "915E96FC694E7F90A6850B740125EA005199C725F3BD27E3",
            },
        ];

        let engine = RustCrypto::default();
        for test in tests.iter() {
            let key = test.s2k.derive_key(
                &engine, test.password.as_bytes(),
                test.cipher_algo.key_size().unwrap()).unwrap();
            assert_eq!(to_hex(&key), test.key_hex, "{}", test.s2k);
        }
    }

    #[test]
    fn parse_specifiers() {
        let (s, n) = S2K::parse(&[0, 2, 0xff]).unwrap();
        assert_eq!((s, n), (S2K::Simple { hash: HashAlgorithm::SHA1 }, 2));

        let buf = [3, 8, 1, 2, 3, 4, 5, 6, 7, 8, 96];
        let (s, n) = S2K::parse(&buf).unwrap();
        assert_eq!(n, 11);
        assert_eq!(s, S2K::Iterated {
            hash: HashAlgorithm::SHA256,
            salt: [1, 2, 3, 4, 5, 6, 7, 8],
            hash_bytes: 65536,
        });

        for &typ in &[2u8, 4, 100] {
            let e = S2K::parse(&[typ, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0])
                .unwrap_err();
            assert_eq!(e.downcast_ref::<Error>(), Some(&Error::BadS2KType(typ)));
        }
        assert!(S2K::parse(&[1, 2, 0]).is_err());
        assert!(S2K::parse(&[]).is_err());
    }

    quickcheck! {
        fn s2k_roundtrip(s2k: S2K) -> bool {
            let mut buf = Vec::new();
            s2k.serialize(&mut buf).unwrap();
            let (s, n) = S2K::parse(&buf).unwrap();
            n == buf.len() && s == s2k
        }
    }

    quickcheck! {
        fn s2k_display(s2k: S2K) -> bool {
            let s = format!("{}", s2k);
            !s.is_empty()
        }
    }

    #[test]
    fn s2k_coded_count_roundtrip() {
        for cc in 0..0x100usize {
            let hash_bytes = S2K::decode_count(cc as u8);
            assert!(hash_bytes >= 1024
                    && S2K::encode_count(hash_bytes).unwrap() == cc as u8);
        }
        assert_eq!(S2K::decode_count(96), 65536);
        assert_eq!(S2K::decode_count(255), 65_011_712);
    }

    quickcheck! {
        fn s2k_coded_count_approx(i: usize) -> bool {
            let approx = S2K::nearest_hash_count(i);
            let cc = S2K::encode_count(approx).unwrap();

            (approx as usize >= i || i > 0x3e00000) && S2K::decode_count(cc) == approx
        }
    }
}
