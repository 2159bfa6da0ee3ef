//! Streams multiprecision integers.
//!
//! See [Section 3.2 of RFC 4880] for details.
//!
//!   [Section 3.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-3.2

use crate::{Error, Result};
use crate::utils;
use super::packet_parser::{PacketEvent, PacketSink};

/// Reads a sequence of MPIs, reporting each as an
/// [`PacketEvent::MpiStart`], body fragments, and
/// [`PacketEvent::MpiEnd`].
#[derive(Debug, Clone)]
pub(crate) struct MpiReader {
    /// MPIs still to read, `None` if they run to the end of the body.
    count: Option<usize>,
    header: Vec<u8>,
    /// Octets left in the current MPI's body, if inside one.
    body: Option<usize>,
    /// Whether the current MPI's first octet is still to come.
    first: bool,
    bits: usize,
    /// Sum of all octets read, headers included.
    sum: u16,
}

impl MpiReader {
    /// Reads `count` MPIs.
    pub(crate) fn new(count: usize) -> Self {
        MpiReader {
            count: Some(count),
            header: Vec::with_capacity(2),
            body: None,
            first: false,
            bits: 0,
            sum: 0,
        }
    }

    /// Reads MPIs until the end of the body.
    pub(crate) fn unbounded() -> Self {
        MpiReader {
            count: None,
            .. Self::new(0)
        }
    }

    /// The checksum used for unencrypted secret key material.
    pub(crate) fn checksum(&self) -> u16 {
        self.sum
    }

    /// Whether the reader is between two MPIs.
    pub(crate) fn at_boundary(&self) -> bool {
        self.header.is_empty() && self.body.is_none()
    }

    /// Whether the reader stopped at the end of the body.
    ///
    /// Only an unbounded reader between two MPIs may end with the
    /// body.
    pub(crate) fn may_end(&self) -> bool {
        self.count.is_none() && self.at_boundary()
    }

    fn add(&mut self, data: &[u8]) {
        self.sum = data.iter().fold(self.sum, |s, &b| s.wrapping_add(b as u16));
    }

    /// Checks the first octet of an MPI against its bit count.
    fn check_first(&self, octet: u8) -> Result<()> {
        let unused_bits = (8 - self.bits % 8) % 8;

        // Make sure the unused bits are zeroed.
        if unused_bits > 0 {
            let mask = !((1u16 << (8 - unused_bits)) - 1) as u8;
            if octet & mask != 0 {
                return Err(Error::MalformedPacket(
                    format!("MPI: {} unused bits not zeroed: ({:x})",
                            unused_bits, octet & mask)).into());
            }
        }

        let first_used_bit = 8 - unused_bits;
        if octet & (1 << (first_used_bit - 1)) == 0 {
            return Err(Error::MalformedPacket(
                format!("MPI: leading bit is not set: \
                         expected bit {} to be set in {:8b} ({:x})",
                        first_used_bit, octet, octet)).into());
        }
        Ok(())
    }

    /// Consumes MPI octets from the front of `input`.
    ///
    /// Returns `true` once all MPIs were read.  An unbounded reader
    /// never finishes; it takes all of the input.
    pub(crate) fn push<S>(&mut self, input: &mut &[u8], sink: &mut S)
                          -> Result<bool>
        where S: PacketSink + ?Sized
    {
        loop {
            match self.body {
                Some(0) => {
                    self.body = None;
                    if let Some(ref mut c) = self.count {
                        *c -= 1;
                    }
                    sink.packet(PacketEvent::MpiEnd)?;
                }

                Some(left) => {
                    if input.is_empty() {
                        return Ok(false);
                    }
                    if self.first {
                        self.check_first(input[0])?;
                        self.first = false;
                    }
                    let n = left.min(input.len());
                    let (chunk, rest) = input.split_at(n);
                    *input = rest;
                    self.body = Some(left - n);
                    self.add(chunk);
                    sink.packet(PacketEvent::MpiData(chunk))?;
                }

                None => {
                    if self.count == Some(0) {
                        return Ok(true);
                    }
                    if ! utils::fill(&mut self.header, 2, input) {
                        return Ok(false);
                    }
                    let header = std::mem::take(&mut self.header);
                    self.add(&header);
                    self.bits = utils::read_be_u16(&header) as usize;
                    self.first = self.bits > 0;
                    self.body = Some((self.bits + 7) / 8);
                    sink.packet(PacketEvent::MpiStart { bits: self.bits as u16 })?;
                }
            }
        }
    }
}
