//! Packet parsing infrastructure.
//!
//! An OpenPGP stream is a sequence of packets.  Parsing happens in
//! layers, each of which is a push-driven state machine: the caller
//! feeds arbitrarily sized chunks of input to `push` and finishes the
//! stream with `done`.  A layer never blocks and never asks for more
//! input; if it needs more octets to make progress, it keeps what it
//! has and returns.  Results are handed to a caller supplied sink as
//! soon as they are available, in stream order.
//!
//!   - The [`Framer`] splits the stream into packets.  It decodes
//!     packet headers, including old format headers, partial body
//!     lengths and indeterminate lengths, and reports each packet as a
//!     [`Frame::Start`], a sequence of [`Frame::Body`] fragments and a
//!     [`Frame::End`].
//!
//!   - The [`PacketParser`] decodes the body of a single packet
//!     according to its tag and reports [`PacketEvent`]s.  Large
//!     fields, like MPIs, literal data or encrypted data, are streamed
//!     as fragments.
//!
//!   - The [`SubpacketParser`] decodes the body of a single signature
//!     subpacket and reports [`SubpacketEvent`]s.  The packet parser
//!     drives one for each subpacket it finds.
//!
//!   - The [`MessageParser`] combines the framer with a packet parser
//!     per packet.
//!
//! Any error, including an error returned by a sink, is fatal.  The
//! failing instance rejects all further input.
//!
//! # Examples
//!
//! ```rust
//! # fn main() -> openpgp_stream::Result<()> {
//! use openpgp_stream::parse::{MessageParser, PacketEvent, PacketSink};
//!
//! #[derive(Default)]
//! struct UserIDs(Vec<Vec<u8>>);
//!
//! impl PacketSink for UserIDs {
//!     fn packet(&mut self, event: PacketEvent) -> openpgp_stream::Result<()> {
//!         match event {
//!             PacketEvent::Start(h) if h.tag() == openpgp_stream::Tag::UserID =>
//!                 self.0.push(Vec::new()),
//!             PacketEvent::Data(d) =>
//!                 if let Some(u) = self.0.last_mut() {
//!                     u.extend_from_slice(d);
//!                 },
//!             _ => (),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut ids = UserIDs::default();
//! let mut p = MessageParser::new();
//! // Two user id packets, one old and one new format.
//! p.push(b"\xb4\x03Bob\xcd\x05Alice", &mut ids)?;
//! p.done(&mut ids)?;
//! assert_eq!(ids.0, vec![b"Bob".to_vec(), b"Alice".to_vec()]);
//! # Ok(()) }
//! ```

use crate::{Error, Result};
use crate::packet::{BodyLength, PacketLengthType};
use crate::utils;

mod framer;
pub use self::framer::{
    DEFAULT_MAX_DEPTH, Frame, FrameSink, Framer, FramerBuilder,
};
mod mpis;
mod packet_parser;
pub use self::packet_parser::{PacketEvent, PacketParser, PacketSink};
mod subpacket;
pub use self::subpacket::{
    SubpacketEvent,
    SubpacketHeader,
    SubpacketParser,
    SubpacketSink,
};
mod message_parser;
pub use self::message_parser::MessageParser;

impl BodyLength {
    /// Decodes a new format body length as described in [Section
    /// 4.2.2 of RFC 4880].
    ///
    /// Returns the length and the number of octets it occupies.
    /// Fails with [`Error::InvalidLength`] if `buf` is too short.
    ///
    ///   [Section 4.2.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-4.2.2
    pub fn parse_new_format(buf: &[u8]) -> Result<(BodyLength, usize)> {
        let octet1 = *buf.first().ok_or_else(
            || Error::InvalidLength("empty length".into()))?;
        let need = new_format_len(octet1);
        if buf.len() < need {
            return Err(Error::InvalidLength(
                format!("length needs {} octets, got {}", need, buf.len()))
                       .into());
        }

        let len = match octet1 {
            0..=191 => // One octet.
                BodyLength::Full(octet1 as u32),
            192..=223 => // Two octets length.
                BodyLength::Full(((octet1 as u32 - 192) << 8)
                                 + buf[1] as u32 + 192),
            224..=254 => // Partial body length.
                BodyLength::Partial(1 << (octet1 & 0x1F)),
            255 => // Five octets.
                BodyLength::Full(utils::read_be_u32(&buf[1..5])),
        };
        Ok((len, need))
    }

    /// Decodes an old format body length as described in [Section
    /// 4.2.1 of RFC 4880].
    ///
    /// Returns the length and the number of octets it occupies.
    ///
    ///   [Section 4.2.1 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-4.2.1
    pub fn parse_old_format(buf: &[u8], length_type: PacketLengthType)
                            -> Result<(BodyLength, usize)>
    {
        let need = length_type.octets();
        if buf.len() < need {
            return Err(Error::InvalidLength(
                format!("length needs {} octets, got {}", need, buf.len()))
                       .into());
        }

        let len = match length_type {
            PacketLengthType::OneOctet =>
                BodyLength::Full(buf[0] as u32),
            PacketLengthType::TwoOctets =>
                BodyLength::Full(utils::read_be_u16(&buf[..2]) as u32),
            PacketLengthType::FourOctets =>
                BodyLength::Full(utils::read_be_u32(&buf[..4])),
            PacketLengthType::Indeterminate =>
                BodyLength::Indeterminate,
        };
        Ok((len, need))
    }
}

/// Number of octets of a new format length starting with `octet1`.
fn new_format_len(octet1: u8) -> usize {
    match octet1 {
        0..=191 | 224..=254 => 1,
        192..=223 => 2,
        255 => 5,
    }
}

/// The length encodings a [`LengthReader`] understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LengthFormat {
    /// New format packet length, partial lengths allowed.
    New,
    /// Subpacket length.  Like the new format, but octets 192 to 254
    /// always start a two octet length.
    Subpacket,
    /// Old format packet length.
    Old(PacketLengthType),
}

/// Decodes a length incrementally.
///
/// Octets are taken from the front of the input one push at a time,
/// so a length split across chunks is reassembled.
#[derive(Clone, Debug)]
pub(crate) struct LengthReader {
    format: LengthFormat,
    buf: Vec<u8>,
}

impl LengthReader {
    pub(crate) fn new(format: LengthFormat) -> Self {
        LengthReader {
            format,
            buf: Vec::with_capacity(5),
        }
    }

    /// Octets needed, or `None` if the first octet is still missing.
    fn need(&self) -> Option<usize> {
        match self.format {
            LengthFormat::Old(t) => Some(t.octets()),
            LengthFormat::New =>
                self.buf.first().map(|&o| new_format_len(o)),
            LengthFormat::Subpacket => self.buf.first().map(|&o| match o {
                0..=191 => 1,
                192..=254 => 2,
                255 => 5,
            }),
        }
    }

    /// Consumes length octets from the front of `input`.
    ///
    /// Returns the length once it is complete.  An old format
    /// indeterminate length completes without consuming anything.
    pub(crate) fn push(&mut self, input: &mut &[u8])
                       -> Result<Option<BodyLength>>
    {
        let need = match self.need() {
            Some(n) => n,
            None => {
                if ! utils::fill(&mut self.buf, 1, input) {
                    return Ok(None);
                }
                self.need().unwrap_or(1)
            }
        };
        if ! utils::fill(&mut self.buf, need, input) {
            return Ok(None);
        }

        let len = match self.format {
            LengthFormat::Old(t) => BodyLength::parse_old_format(&self.buf, t)?.0,
            LengthFormat::New => BodyLength::parse_new_format(&self.buf)?.0,
            LengthFormat::Subpacket => match need {
                1 => BodyLength::Full(self.buf[0] as u32),
                2 => BodyLength::Full(((self.buf[0] as u32 - 192) << 8)
                                      + self.buf[1] as u32 + 192),
                _ => BodyLength::Full(utils::read_be_u32(&self.buf[1..5])),
            },
        };
        Ok(Some(len))
    }

    /// Whether some, but not all, length octets were seen.
    pub(crate) fn is_started(&self) -> bool {
        ! self.buf.is_empty()
    }
}
