//! Algorithm metadata.
//!
//! Static tables describing the algorithm identifiers of [Section 9
//! of RFC 4880]: a human readable name, the requirement levels the
//! RFC places on implementations, and the numeric parameters the
//! packet parser needs to lay out key material.
//!
//!   [Section 9 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-9

use std::fmt;

use crate::{Error, Result};
use crate::types::{
    HashAlgorithm,
    PublicKeyAlgorithm,
    SymmetricAlgorithm,
};

/// The algorithm identifier namespaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Public key algorithms (section 9.1).
    PublicKey,
    /// Symmetric key algorithms (section 9.2).
    Symmetric,
    /// Compression algorithms (section 9.3).
    Compression,
    /// Hash algorithms (section 9.4).
    Hash,
}

/// RFC 2119 requirement levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// MUST
    Must,
    /// MUST NOT
    MustNot,
    /// SHOULD
    Should,
    /// SHOULD NOT
    ShouldNot,
    /// MAY
    May,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Requirement::Must => "MUST",
            Requirement::MustNot => "MUST NOT",
            Requirement::Should => "SHOULD",
            Requirement::ShouldNot => "SHOULD NOT",
            Requirement::May => "MAY",
        })
    }
}

/// Describes one algorithm identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlgorithmInfo {
    /// The namespace.
    pub category: Category,
    /// The identifier.
    pub id: u8,
    /// Human readable name.
    pub name: &'static str,
    /// Requirement level for interpreting the algorithm.
    pub interpret: Requirement,
    /// Requirement level for generating the algorithm.
    pub generate: Requirement,
    /// Block size in octets, for symmetric algorithms.
    pub block_size: Option<usize>,
    /// Number of MPIs in a public key, for public key algorithms.
    pub public_mpis: Option<usize>,
    /// Number of MPIs in a secret key, for public key algorithms.
    pub secret_mpis: Option<usize>,
}

const fn info(category: Category, id: u8, name: &'static str,
              interpret: Requirement, generate: Requirement)
              -> AlgorithmInfo {
    AlgorithmInfo {
        category, id, name, interpret, generate,
        block_size: None,
        public_mpis: None,
        secret_mpis: None,
    }
}

const fn pk(id: u8, name: &'static str,
            interpret: Requirement, generate: Requirement,
            public: usize, secret: usize) -> AlgorithmInfo {
    AlgorithmInfo {
        public_mpis: Some(public),
        secret_mpis: Some(secret),
        ..info(Category::PublicKey, id, name, interpret, generate)
    }
}

const fn sym(id: u8, name: &'static str,
             interpret: Requirement, generate: Requirement,
             block_size: usize) -> AlgorithmInfo {
    AlgorithmInfo {
        block_size: Some(block_size),
        ..info(Category::Symmetric, id, name, interpret, generate)
    }
}

use self::Category::*;
use self::Requirement::*;

static TABLE: &[AlgorithmInfo] = &[
    info(PublicKey, 0, "Reserved", MustNot, MustNot),
    pk(1, "RSA", Should, Should, 2, 4),
    pk(2, "RSA (Encrypt-Only)", May, ShouldNot, 2, 4),
    pk(3, "RSA (Sign-Only)", May, ShouldNot, 2, 4),
    pk(16, "Elgamal (Encrypt-Only)", Must, Must, 3, 1),
    pk(17, "DSA", Must, Must, 4, 1),
    info(PublicKey, 18, "ECDH", MustNot, MustNot),
    info(PublicKey, 19, "ECDSA", MustNot, MustNot),
    pk(20, "Elgamal (Deprecated)", May, MustNot, 3, 1),
    info(PublicKey, 21, "Diffie-Hellman", MustNot, MustNot),
    info(PublicKey, 22, "EdDSA", MustNot, MustNot),

    info(Symmetric, 0, "Plaintext", Must, Must),
    sym(1, "IDEA", Should, ShouldNot, 8),
    sym(2, "TripleDES (DES-EDE)", Must, Must, 8),
    sym(3, "CAST5 (128-bit)", Should, Should, 8),
    sym(4, "Blowfish (128-bit)", May, May, 8),
    info(Symmetric, 5, "Reserved", MustNot, MustNot),
    info(Symmetric, 6, "Reserved", MustNot, MustNot),
    sym(7, "AES (128-bit)", Should, Should, 16),
    sym(8, "AES (192-bit)", May, May, 16),
    sym(9, "AES (256-bit)", May, May, 16),
    sym(10, "Twofish (256-bit)", May, May, 16),
    sym(11, "Camellia (128-bit)", May, May, 16),
    sym(12, "Camellia (192-bit)", May, May, 16),
    sym(13, "Camellia (256-bit)", May, May, 16),

    info(Compression, 0, "Uncompressed", Must, Must),
    info(Compression, 1, "ZIP (RFC1951)", Should, Should),
    info(Compression, 2, "ZLIB (RFC1950)", May, May),
    info(Compression, 3, "BZip2", May, May),

    info(Hash, 0, "Reserved", MustNot, MustNot),
    info(Hash, 1, "MD5 (Deprecated)", Should, ShouldNot),
    info(Hash, 2, "SHA-1", Must, Must),
    info(Hash, 3, "RIPE-MD/160", May, May),
    info(Hash, 4, "Reserved", MustNot, MustNot),
    info(Hash, 5, "Reserved", MustNot, MustNot),
    info(Hash, 6, "Reserved", MustNot, MustNot),
    info(Hash, 7, "Reserved", MustNot, MustNot),
    info(Hash, 8, "SHA-256", May, May),
    info(Hash, 9, "SHA-384", May, May),
    info(Hash, 10, "SHA-512", May, May),
    info(Hash, 11, "SHA-224", May, May),
];

// The private/experimental range 100..=110 shares one entry per
// category.
static PRIVATE: [AlgorithmInfo; 4] = [
    info(PublicKey, 100, "Private/Experimental", MustNot, MustNot),
    info(Symmetric, 100, "Private/Experimental", MustNot, MustNot),
    info(Compression, 100, "Private/Experimental", MustNot, MustNot),
    info(Hash, 100, "Private/Experimental", MustNot, MustNot),
];

/// Looks up an algorithm identifier.
///
/// Identifiers in the private range 100 to 110 share a generic
/// entry; its `id` field is 100.
///
/// # Errors
///
/// Unknown identifiers fail with the category's unsupported
/// algorithm error, e.g. [`Error::UnsupportedPublicKeyAlgorithm`].
pub fn describe(category: Category, id: u8) -> Result<&'static AlgorithmInfo> {
    if let 100..=110 = id {
        if let Some(i) = PRIVATE.iter().find(|i| i.category == category) {
            return Ok(i);
        }
    }

    TABLE.iter()
        .find(|i| i.category == category && i.id == id)
        .ok_or_else(|| match category {
            PublicKey =>
                Error::UnsupportedPublicKeyAlgorithm(
                    PublicKeyAlgorithm::from(id)).into(),
            Symmetric =>
                Error::UnsupportedSymmetricAlgorithm(
                    SymmetricAlgorithm::from(id)).into(),
            Hash =>
                Error::UnsupportedHashAlgorithm(HashAlgorithm::from(id)).into(),
            Compression =>
                Error::InvalidArgument(
                    format!("Unknown compression algorithm {}", id)).into(),
        })
}
