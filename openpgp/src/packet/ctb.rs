//! Cipher Type Byte.
//!
//! See [Section 4.2 of RFC 4880] for more details.
//!
//!   [Section 4.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-4.2

use std::convert::TryFrom;

use crate::{Error, Result, Tag};

/// The new CTB format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CTBNew {
    tag: Tag,
}

impl CTBNew {
    /// Constructs a new-style CTB.
    pub fn new(tag: Tag) -> Self {
        CTBNew { tag }
    }

    /// Returns the packet's tag.
    pub fn tag(&self) -> Tag {
        self.tag
    }
}

/// The PacketLengthType is used as part of the [old CTB], and is
/// partially used to determine the packet's size.
///
/// See [Section 4.2.1 of RFC 4880] for more details.
///
///   [Section 4.2.1 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-4.2.1
///   [old CTB]: struct.CTBOld.html
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketLengthType {
    /// A one-octet body length.
    OneOctet,
    /// A two-octet body length, big endian.
    TwoOctets,
    /// A four-octet body length, big endian.
    FourOctets,
    /// The body runs to the end of the enclosing stream.
    Indeterminate,
}

impl From<u8> for PacketLengthType {
    /// Uses the low two bits of `u`.
    fn from(u: u8) -> Self {
        match u & 3 {
            0 => PacketLengthType::OneOctet,
            1 => PacketLengthType::TwoOctets,
            2 => PacketLengthType::FourOctets,
            _ => PacketLengthType::Indeterminate,
        }
    }
}

impl From<PacketLengthType> for u8 {
    fn from(l: PacketLengthType) -> Self {
        match l {
            PacketLengthType::OneOctet => 0,
            PacketLengthType::TwoOctets => 1,
            PacketLengthType::FourOctets => 2,
            PacketLengthType::Indeterminate => 3,
        }
    }
}

impl PacketLengthType {
    /// Number of length octets following the CTB.
    pub fn octets(self) -> usize {
        match self {
            PacketLengthType::OneOctet => 1,
            PacketLengthType::TwoOctets => 2,
            PacketLengthType::FourOctets => 4,
            PacketLengthType::Indeterminate => 0,
        }
    }
}

/// The old CTB format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CTBOld {
    tag: Tag,
    length_type: PacketLengthType,
}

impl CTBOld {
    /// Constructs an old-style CTB.
    ///
    /// Fails with [`Error::InvalidArgument`] if the tag does not fit
    /// into the four bits an old-style CTB has room for.
    pub fn new(tag: Tag, length_type: PacketLengthType) -> Result<Self> {
        let n: u8 = tag.into();
        if n > 15 {
            return Err(Error::InvalidArgument(
                format!("Only tags 0-15 are supported, got: {:?} ({})",
                        tag, n)).into());
        }
        Ok(CTBOld { tag, length_type })
    }

    /// Returns the packet's tag.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns how the packet's length is encoded.
    pub fn length_type(&self) -> PacketLengthType {
        self.length_type
    }
}

/// A sum type for the different CTB variants.
///
/// Note: CTB stands for Cipher Type Byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CTB {
    /// New (current) packet header format.
    New(CTBNew),
    /// Old PGP 2.6 header format.
    Old(CTBOld),
}

impl CTB {
    /// Constructs a new-style CTB.
    pub fn new(tag: Tag) -> Self {
        CTB::New(CTBNew::new(tag))
    }

    /// Returns the packet's tag.
    pub fn tag(&self) -> Tag {
        match self {
            CTB::New(c) => c.tag(),
            CTB::Old(c) => c.tag(),
        }
    }
}

impl TryFrom<u8> for CTB {
    type Error = anyhow::Error;

    /// Parses a CTB as described in [Section 4.2 of RFC 4880].
    ///
    ///   [Section 4.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-4.2
    fn try_from(ptag: u8) -> Result<CTB> {
        // The top bit of the ptag must be set.
        if ptag & 0b1000_0000 == 0 {
            return Err(Error::BadPacketTag(ptag).into());
        }

        if ptag & 0b0100_0000 != 0 {
            Ok(CTB::New(CTBNew::new(Tag::from_wire(ptag & 0b0011_1111)?)))
        } else {
            let tag = Tag::from_wire((ptag & 0b0011_1100) >> 2)?;
            Ok(CTB::Old(CTBOld {
                tag,
                length_type: PacketLengthType::from(ptag),
            }))
        }
    }
}

impl From<CTB> for u8 {
    fn from(ctb: CTB) -> u8 {
        match ctb {
            CTB::New(c) => 0b1100_0000 | u8::from(c.tag),
            CTB::Old(c) => 0b1000_0000 | (u8::from(c.tag) << 2)
                | u8::from(c.length_type),
        }
    }
}
