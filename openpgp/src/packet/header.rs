//! OpenPGP Header.

use crate::Tag;
use crate::packet::{BodyLength, CTB};

/// An OpenPGP packet's header.
///
/// For partial body lengths, `length` describes the first chunk only;
/// the packet's total size is unknown until the last chunk is seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// The packet's CTB.
    ctb: CTB,
    /// The packet's length.
    length: BodyLength,
}

impl Header {
    /// Creates a new header.
    pub fn new(ctb: CTB, length: BodyLength) -> Self {
        Header { ctb, length }
    }

    /// Returns the packet's CTB.
    pub fn ctb(&self) -> &CTB {
        &self.ctb
    }

    /// Returns the packet's content tag.
    pub fn tag(&self) -> Tag {
        self.ctb.tag()
    }

    /// Returns the packet's length.
    pub fn length(&self) -> &BodyLength {
        &self.length
    }

    /// Whether the header uses the new format.
    pub fn is_new_format(&self) -> bool {
        match self.ctb {
            CTB::New(_) => true,
            CTB::Old(_) => false,
        }
    }

    /// Whether the body uses partial body lengths.
    pub fn is_partial(&self) -> bool {
        match self.length {
            BodyLength::Partial(_) => true,
            _ => false,
        }
    }

    /// Whether the body runs to the end of the enclosing stream.
    pub fn is_indeterminate(&self) -> bool {
        self.length == BodyLength::Indeterminate
    }
}
