//! Computes the CRC-24, (see [RFC 4880, section 6.1]).
//!
//! [RFC 4880, section 6.1]: https://tools.ietf.org/html/rfc4880#section-6.1

use crate::Result;
use crate::utils::Lifecycle;

const CRC24_INIT: u32 = 0xB704CE;
const CRC24_POLY: u32 = 0x1864CFB;
const CRC24_MASK: u32 = 0xFFFFFF;

lazy_static! {
    /// The register update for every possible top octet.
    static ref TABLE: [u32; 256] = {
        let mut t = [0u32; 256];
        for (i, e) in t.iter_mut().enumerate() {
            *e = step(0, i as u8);
        }
        t
    };
}

/// Feeds one octet through the bitwise definition.
fn step(mut n: u32, octet: u8) -> u32 {
    n ^= (octet as u32) << 16;
    for _ in 0..8 {
        n <<= 1;
        if n & 0x1000000 != 0 {
            n ^= CRC24_POLY;
        }
    }
    n & CRC24_MASK
}

/// A running CRC-24 accumulator.
///
/// The register is kept masked to 24 bits after every octet, so
/// [`Crc24::value`] is valid at any point.  After [`Crc24::done`],
/// the accumulator rejects further input.
#[derive(Debug, Clone)]
pub struct Crc24 {
    n: u32,
    lifecycle: Lifecycle,
}

impl Default for Crc24 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc24 {
    /// Returns an accumulator holding the initial register value.
    pub fn new() -> Self {
        Crc24 { n: CRC24_INIT, lifecycle: Lifecycle::default() }
    }

    /// Adds `buf` to the checksum.
    pub fn push(&mut self, buf: &[u8]) -> Result<()> {
        self.lifecycle.check()?;
        for &octet in buf {
            let i = ((self.n >> 16) as u8) ^ octet;
            self.n = ((self.n << 8) ^ TABLE[i as usize]) & CRC24_MASK;
        }
        Ok(())
    }

    /// Returns the checksum over the data pushed so far.
    pub fn value(&self) -> u32 {
        self.n
    }

    /// Finalizes the accumulator and returns the checksum.
    pub fn done(&mut self) -> Result<u32> {
        self.lifecycle.check()?;
        self.lifecycle.finish(Ok(self.n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn foobarbaz() {
        let b = b"foobarbaz";
        let crcs = [
            0xb704ce,
            0x6d2804,
            0xa2d10d,
            0x4fc255,
            0x7aafca,
            0xc79c46,
            0x7334de,
            0x77dc72,
            0x000f65,
            0xf40d86,
        ];

        for len in 0..b.len() + 1 {
            let mut c = Crc24::new();
            c.push(&b[..len]).unwrap();
            assert_eq!(c.done().unwrap(), crcs[len]);
        }
    }

    #[test]
    fn empty() {
        assert_eq!(Crc24::new().done().unwrap(), 0xB704CE);
    }

    #[test]
    fn finalized() {
        let mut c = Crc24::new();
        c.push(b"abc").unwrap();
        c.done().unwrap();
        let e = c.push(b"d").unwrap_err();
        assert_eq!(e.downcast_ref::<Error>(), Some(&Error::Finalized));
        let e = c.done().unwrap_err();
        assert_eq!(e.downcast_ref::<Error>(), Some(&Error::Finalized));
    }

    /// Reference implementation of the iterative CRC24 computation.
    fn iterative(buf: &[u8]) -> u32 {
        buf.iter().fold(CRC24_INIT, |n, &o| step(n, o))
    }

    quickcheck! {
        fn compare(b: Vec<u8>) -> bool {
            let mut c = Crc24::new();
            c.push(&b).unwrap();
            c.value() == iterative(&b)
        }
    }

    quickcheck! {
        fn chunked(b: Vec<u8>, at: usize) -> bool {
            let at = if b.is_empty() { 0 } else { at % b.len() };
            let mut c = Crc24::new();
            c.push(&b[..at]).unwrap();
            c.push(&b[at..]).unwrap();
            c.done().unwrap() == iterative(&b)
        }
    }
}
