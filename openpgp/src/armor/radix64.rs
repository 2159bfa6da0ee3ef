//! Streaming radix-64 (base64) codec.
//!
//! An [`Encoder`] turns arbitrary runs of octets into base64 text
//! wrapped at [`LINE_LENGTH`] characters.  A [`Decoder`] does the
//! reverse, skipping anything that is not part of the base64
//! alphabet.  Both write their output to an `io::Write`.
//!
//! The per-group transformation is done by the `base64` crate; this
//! module adds the buffering needed to accept input split at
//! arbitrary boundaries.

use std::io::{self, Write};

use crate::{Error, Result};
use crate::utils::Lifecycle;

/// Characters per line emitted by an [`Encoder`].
pub const LINE_LENGTH: usize = 60;

/// Whether `c` belongs to the standard alphabet (padding included).
pub(crate) fn is_base64_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'+' || c == b'/' || c == b'='
}

/// Encodes octets to base64 text.
pub struct Encoder<W: Write> {
    inner: W,
    /// Up to two octets not yet forming a complete triplet.
    stash: Vec<u8>,
    /// Characters on the current output line.
    column: usize,
    eol: &'static str,
    lifecycle: Lifecycle,
}

impl<W: Write> Encoder<W> {
    /// Returns an encoder using `\n` line endings.
    pub fn new(inner: W) -> Self {
        Self::with_line_ending(inner, "\n")
    }

    /// Returns an encoder terminating lines with `eol`.
    pub fn with_line_ending(inner: W, eol: &'static str) -> Self {
        Encoder {
            inner,
            stash: Vec::with_capacity(3),
            column: 0,
            eol,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Gets a reference to the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Gets a mutable reference to the wrapped writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwraps the encoder.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Encodes `buf`.
    pub fn push(&mut self, buf: &[u8]) -> Result<()> {
        self.lifecycle.check()?;
        let r = self.push_inner(buf);
        self.lifecycle.guard(r)
    }

    fn push_inner(&mut self, mut buf: &[u8]) -> Result<()> {
        // Complete a stashed triplet first.
        if ! self.stash.is_empty() {
            let n = (3 - self.stash.len()).min(buf.len());
            self.stash.extend_from_slice(&buf[..n]);
            buf = &buf[n..];
            if self.stash.len() < 3 {
                return Ok(());
            }
            let triplet = std::mem::replace(&mut self.stash, Vec::with_capacity(3));
            let text = base64::encode_config(&triplet, base64::STANDARD);
            self.emit(&text)?;
        }

        let whole = buf.len() - buf.len() % 3;
        if whole > 0 {
            let text = base64::encode_config(&buf[..whole], base64::STANDARD);
            self.emit(&text)?;
        }
        self.stash.extend_from_slice(&buf[whole..]);
        Ok(())
    }

    /// Writes `text`, breaking lines every `LINE_LENGTH` characters.
    ///
    /// `text` is always a sequence of complete four character groups,
    /// and `LINE_LENGTH` is a multiple of four, so padding never
    /// straddles a line break.
    fn emit(&mut self, text: &str) -> Result<()> {
        let mut out = String::with_capacity(
            text.len() + (text.len() / LINE_LENGTH + 1) * self.eol.len());
        let mut text = text;
        while ! text.is_empty() {
            let n = (LINE_LENGTH - self.column).min(text.len());
            out.push_str(&text[..n]);
            text = &text[n..];
            self.column += n;
            if self.column == LINE_LENGTH {
                out.push_str(self.eol);
                self.column = 0;
            }
        }
        self.inner.write_all(out.as_bytes())?;
        Ok(())
    }

    /// Flushes the final, padded group and terminates the last line.
    pub fn done(&mut self) -> Result<()> {
        self.lifecycle.check()?;
        let r = self.done_inner();
        self.lifecycle.finish(r)
    }

    fn done_inner(&mut self) -> Result<()> {
        if ! self.stash.is_empty() {
            let text = base64::encode_config(&self.stash, base64::STANDARD);
            self.stash.clear();
            self.emit(&text)?;
        }
        if self.column > 0 {
            self.inner.write_all(self.eol.as_bytes())?;
            self.column = 0;
        }
        Ok(())
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decodes base64 text to octets.
pub struct Decoder<W: Write> {
    inner: W,
    group: [u8; 4],
    len: usize,
    lifecycle: Lifecycle,
}

impl<W: Write> Decoder<W> {
    /// Returns a decoder writing to `inner`.
    pub fn new(inner: W) -> Self {
        Decoder {
            inner,
            group: [0; 4],
            len: 0,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Gets a reference to the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Gets a mutable reference to the wrapped writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwraps the decoder.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Decodes `buf`, ignoring characters outside the alphabet.
    pub fn push(&mut self, buf: &[u8]) -> Result<()> {
        self.lifecycle.check()?;
        let r = self.push_inner(buf);
        self.lifecycle.guard(r)
    }

    fn push_inner(&mut self, buf: &[u8]) -> Result<()> {
        let mut out = Vec::with_capacity(buf.len() / 4 * 3 + 3);
        for &c in buf.iter().filter(|&&c| is_base64_char(c)) {
            self.group[self.len] = c;
            self.len += 1;
            if self.len == 4 {
                decode_group(&self.group, &mut out)?;
                self.len = 0;
            }
        }
        if ! out.is_empty() {
            self.inner.write_all(&out)?;
        }
        Ok(())
    }

    /// Finalizes the decoder.
    ///
    /// Fails if the input ended with an incomplete group.
    pub fn done(&mut self) -> Result<()> {
        self.lifecycle.check()?;
        let r = if self.len == 0 {
            Ok(())
        } else {
            Err(Error::CorruptBase64(
                format!("{} trailing characters do not form a group",
                        self.len)).into())
        };
        self.lifecycle.finish(r)
    }
}

/// Decodes one four character group, appending to `out`.
fn decode_group(group: &[u8; 4], out: &mut Vec<u8>) -> Result<()> {
    let pad = group.iter().rev().take_while(|&&c| c == b'=').count();
    let significant = 4 - pad;
    if significant < 2 || group[..significant].contains(&b'=') {
        return Err(Error::CorruptBase64(
            format!("bad group {:?}", String::from_utf8_lossy(group))).into());
    }

    let config = base64::STANDARD.decode_allow_trailing_bits(true);
    let mut octets = [0u8; 6];
    let n = base64::decode_config_slice(&group[..], config, &mut octets[..])
        .map_err(|e| Error::CorruptBase64(e.to_string()))?;
    out.extend_from_slice(&octets[..n]);
    Ok(())
}

impl<W: Write> Write for Decoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
