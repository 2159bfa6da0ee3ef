//! Push-driven OpenPGP codec.
//!
//! This crate decodes and encodes the OpenPGP message format as
//! defined by [RFC 4880]: the packet framing (old and new format
//! headers, including partial body lengths), the per-packet content
//! layouts, signature subpackets, and the ASCII armor encapsulation
//! together with its radix-64 and CRC-24 sub-codecs.
//!
//! Every component is a state machine that is created once, fed zero
//! or more chunks of input via `push`, and finalized exactly once via
//! `done`.  The input may be split at arbitrary byte boundaries; the
//! components buffer only what they need to decode fixed-size fields
//! and stream everything else (literal data, compressed data,
//! encrypted data, MPI bodies) to the caller as fragments.  Callers
//! own the I/O loop.
//!
//! After `done`, or after any error, an instance is dead and rejects
//! all further operations.
//!
//! This crate does not verify signatures, does not decrypt anything,
//! and does not enforce policy.  The cryptographic primitives needed
//! to act on the decoded structures are available through the
//! [`crypto`] module's engine traits.
//!
//! # Examples
//!
//! ```rust
//! # fn main() -> openpgp_stream::Result<()> {
//! use openpgp_stream::parse::{Frame, FrameSink, Framer};
//!
//! #[derive(Default)]
//! struct Count { packets: usize, bytes: usize }
//!
//! impl FrameSink for Count {
//!     fn frame(&mut self, frame: Frame) -> openpgp_stream::Result<()> {
//!         match frame {
//!             Frame::Start(_) => self.packets += 1,
//!             Frame::Body(b) => self.bytes += b.len(),
//!             Frame::End => (),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! // A user id packet, split in the middle of its body.
//! let mut framer = Framer::new();
//! let mut count = Count::default();
//! framer.push(b"\xcd\x05Al", &mut count)?;
//! framer.push(b"ice", &mut count)?;
//! framer.done(&mut count)?;
//! assert_eq!(count.packets, 1);
//! assert_eq!(count.bytes, 5);
//! # Ok(()) }
//! ```
//!
//! [RFC 4880]: https://tools.ietf.org/html/rfc4880

#![warn(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

#[macro_use]
extern crate lazy_static;

#[macro_use]
mod macros;

pub(crate) mod utils;

pub mod armor;
pub mod crypto;
pub mod packet;
pub mod parse;
pub mod types;

mod tag;
pub use tag::Tag;

pub use crate::crypto::s2k::S2K;

use crate::types::{
    HashAlgorithm,
    PublicKeyAlgorithm,
    SymmetricAlgorithm,
};

/// Crate result specialization.
pub type Result<T> = ::std::result::Result<T, anyhow::Error>;

/// Errors returned by this crate.
///
/// Functions return [`Result`], which wraps an `anyhow::Error`.  Use
/// `downcast_ref::<Error>()` to recover the kind.  Errors raised by a
/// caller-supplied sink are passed through untouched.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The instance has already been finalized.
    #[error("Already finalized")]
    Finalized,

    /// The instance failed earlier and can no longer be used.
    #[error("Instance failed earlier: {0}")]
    Poisoned(String),

    /// Bit 7 of a packet tag octet is clear.
    #[error("Bad packet tag octet: {0:#04x}")]
    BadPacketTag(u8),

    /// The content tag is outside of the valid ranges.
    #[error("Invalid content tag: {0}")]
    InvalidContentTag(u8),

    /// A length field is malformed.
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// A packet carries a version this crate does not understand.
    #[error("Bad {0} packet version: {1}")]
    BadVersion(Tag, u8),

    /// A malformed packet.
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// Unknown or reserved string-to-key specifier.
    #[error("Bad S2K type: {0}")]
    BadS2KType(u8),

    /// A modification detection code packet is not 20 octets long.
    #[error("Bad MDC size: {0}")]
    BadMdcSize(usize),

    /// The checksum over plaintext secret key material does not match.
    #[error("Bad secret key checksum: expected {expected:#06x}, got {got:#06x}")]
    BadSecretKeyChecksum {
        /// Checksum stored in the packet.
        expected: u16,
        /// Checksum computed over the key material.
        got: u16,
    },

    /// Malformed ASCII armor.
    #[error("Malformed armor: {0}")]
    MalformedArmor(String),

    /// A malformed armor header line.
    #[error("Bad armor header line: {0:?}")]
    BadHeaderLine(String),

    /// Radix-64 input is corrupt.
    #[error("Corrupt base64 input: {0}")]
    CorruptBase64(String),

    /// The armor checksum does not match the decoded data.
    #[error("CRC24 mismatch: expected {expected:06X}, computed {computed:06X}")]
    ChecksumMismatch {
        /// Checksum carried by the armor trailer.
        expected: u32,
        /// Checksum computed over the decoded data.
        computed: u32,
    },

    /// Unsupported public key algorithm identifier.
    #[error("Unsupported public key algorithm: {0}")]
    UnsupportedPublicKeyAlgorithm(PublicKeyAlgorithm),

    /// Unsupported symmetric key algorithm.
    #[error("Unsupported symmetric algorithm: {0}")]
    UnsupportedSymmetricAlgorithm(SymmetricAlgorithm),

    /// Unsupported hash algorithm identifier.
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(HashAlgorithm),

    /// A fixed bound was exceeded.
    #[error("{what} exceeds limit of {limit} bytes")]
    LimitExceeded {
        /// What overflowed.
        what: &'static str,
        /// The bound.
        limit: usize,
    },

    /// The parser state stack is full.
    #[error("State stack overflow (limit {0})")]
    StackOverflow(usize),

    /// Popped the parser state stack past its base.
    #[error("State stack underflow")]
    StackUnderflow,

    /// The input ended in the middle of a packet.
    #[error("Incomplete packet")]
    IncompletePacket,

    /// The input ended in the middle of an armored message.
    #[error("Incomplete armored message")]
    IncompleteMessage,
}
