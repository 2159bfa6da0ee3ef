//! Packet-related types.
//!
//! This module holds the pieces of the [packet header grammar]: the
//! cipher type byte ([`CTB`]), the [`BodyLength`] and the [`Header`]
//! combining the two.  The framing itself is done by
//! [`parse::Framer`].
//!
//!   [packet header grammar]: https://tools.ietf.org/html/rfc4880#section-4.2
//!   [`parse::Framer`]: ../parse/struct.Framer.html

pub mod ctb;
pub use self::ctb::{CTB, CTBNew, CTBOld, PacketLengthType};
pub mod header;
pub use self::header::Header;

pub use crate::Tag;

/// The size of a packet.
///
/// A packet's size can be expressed in three different ways.  Either
/// the size of the packet is fully known (Full), the packet is
/// chunked using OpenPGP's partial body encoding (Partial), or the
/// packet extends to the end of the enclosing stream (Indeterminate).
/// See [Section 4.2 of RFC 4880] for more details.
///
///   [Section 4.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-4.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLength {
    /// The packet's size is known.
    Full(u32),
    /// The parameter is the number of bytes in the current chunk.
    /// This type is only used with new format packets.
    Partial(u32),
    /// The packet extends until an EOF is encountered.  This type is
    /// only used with old format packets.
    Indeterminate,
}
