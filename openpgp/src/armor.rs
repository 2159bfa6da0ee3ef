//! ASCII Armor.
//!
//! This module deals with ASCII Armored data (see [RFC 4880, section 6]).
//!
//! [RFC 4880, section 6]: https://tools.ietf.org/html/rfc4880#section-6
//!
//! Decoding happens in two layers.  The [`Scanner`] is a line
//! oriented state machine that finds the armor envelope in a text
//! stream and splits it into [`Token`]s: the envelope name, header
//! names and values, body text, the checksum line and the footer.
//! The [`Decoder`] sits on top of it, runs the body text through a
//! [`radix64::Decoder`] and a [`Crc24`] accumulator, verifies the
//! checksum, and reports decoded [`Event`]s.
//!
//! The [`Encoder`] is the inverse: it writes the envelope, the
//! headers, the base64 body and the checksum trailer to an
//! `io::Write`.
//!
//! # Example
//!
//! ```rust
//! # fn main() -> openpgp_stream::Result<()> {
//! use openpgp_stream::armor::{Decoder, Encoder, Event, EventSink, Kind};
//!
//! let mut w = Encoder::with_headers(Vec::new(), Kind::Message.name(),
//!                                   vec![("Comment", "hello")])?;
//! w.push(b"Hello world!")?;
//! let text = w.finalize()?;
//!
//! #[derive(Default)]
//! struct Payload(Vec<u8>);
//! impl EventSink for Payload {
//!     fn event(&mut self, event: Event) -> openpgp_stream::Result<()> {
//!         if let Event::Data(d) = event {
//!             self.0.extend_from_slice(d);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut payload = Payload::default();
//! let mut r = Decoder::new();
//! r.push(&text, &mut payload)?;
//! r.done()?;
//! assert_eq!(payload.0, b"Hello world!");
//! # Ok(()) }
//! ```

use std::io::{self, Write};
use std::str;

use crate::{Error, Result};
use crate::utils::Lifecycle;

pub mod crc;
pub use self::crc::Crc24;
pub mod radix64;

const TRACE: bool = false;

/// Line ending used by the [`Encoder`].
const CRLF: &str = "\r\n";

/// Maximum length of the envelope name and of header names and
/// values accepted by the [`Encoder`].
pub const MAX_FIELD_LEN: usize = 70;

/// Default bound on a header or body line in the [`Scanner`].
pub const DEFAULT_LINE_LIMIT: usize = 1024;

/// Default bound on a candidate envelope line in the [`Scanner`].
pub const DEFAULT_ENVELOPE_LIMIT: usize = 80;

/// Specifies the type of data (see [RFC 4880, section 6.2]).
///
/// [RFC 4880, section 6.2]: https://tools.ietf.org/html/rfc4880#section-6.2
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// A generic OpenPGP message.
    Message,
    /// A transferable public key.
    PublicKey,
    /// A transferable secret key.
    SecretKey,
    /// A detached signature.
    Signature,
    /// A generic file.  This is a GnuPG extension.
    File,
}

impl Kind {
    /// Returns the envelope name, e.g. `PGP MESSAGE`.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Message => "PGP MESSAGE",
            Kind::PublicKey => "PGP PUBLIC KEY BLOCK",
            Kind::SecretKey => "PGP PRIVATE KEY BLOCK",
            Kind::Signature => "PGP SIGNATURE",
            Kind::File => "PGP ARMORED FILE",
        }
    }

    /// Maps an envelope name back to the kind.
    pub fn from_name(name: &str) -> Option<Self> {
        [Kind::Message, Kind::PublicKey, Kind::SecretKey,
         Kind::Signature, Kind::File]
            .iter()
            .find(|k| k.name() == name)
            .cloned()
    }
}

/// A syntactic element of an armored text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `-----BEGIN <name>-----`; carries the name.
    Begin(&'a str),
    /// The name of an armor header.
    HeaderName(&'a str),
    /// The value of the armor header named just before.
    HeaderValue(&'a str),
    /// Body text, dash-unescaped, without line terminator.
    ///
    /// Lines longer than the line limit arrive in several pieces.
    Text(&'a [u8]),
    /// The four characters following the `=` of the checksum line.
    Checksum(&'a [u8]),
    /// `-----END <name>-----`; carries the name.
    End(&'a str),
}

/// Receives the [`Token`]s found by a [`Scanner`].
pub trait TokenSink {
    /// Handles one token.  Returning an error aborts the scan.
    fn token(&mut self, token: Token) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At the start of a line, looking for five dashes.
    Scan,
    /// Skipping the rest of an uninteresting line.
    SkipLine,
    /// Reading a line that started with five dashes.
    Envelope,
    /// Reading armor headers.
    Headers,
    /// Reading the body.
    Body,
}

/// Configures a [`Scanner`].
#[derive(Debug, Clone)]
pub struct ScannerBuilder {
    line_limit: usize,
    envelope_limit: usize,
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        ScannerBuilder {
            line_limit: DEFAULT_LINE_LIMIT,
            envelope_limit: DEFAULT_ENVELOPE_LIMIT,
        }
    }
}

impl ScannerBuilder {
    /// Returns a builder with the default limits.
    pub fn new() -> Self {
        Default::default()
    }

    /// Bounds header and body lines.
    ///
    /// A longer header line is an error; a longer body line is
    /// delivered in pieces.
    pub fn line_limit(mut self, limit: usize) -> Self {
        self.line_limit = limit;
        self
    }

    /// Bounds lines that start like an envelope.
    ///
    /// Longer candidates are not considered envelopes.
    pub fn envelope_limit(mut self, limit: usize) -> Self {
        self.envelope_limit = limit;
        self
    }

    /// Builds the scanner.
    pub fn build(self) -> Result<Scanner> {
        if self.line_limit < 16 {
            return Err(Error::InvalidArgument(
                format!("line limit {} is too small", self.line_limit)).into());
        }
        if self.envelope_limit < 16 {
            return Err(Error::InvalidArgument(
                format!("envelope limit {} is too small",
                        self.envelope_limit)).into());
        }
        Ok(Scanner {
            state: State::Scan,
            line: Vec::with_capacity(self.line_limit),
            continued: false,
            name: String::new(),
            line_limit: self.line_limit,
            envelope_limit: self.envelope_limit,
            lifecycle: Lifecycle::default(),
        })
    }
}

/// Splits an armored text stream into [`Token`]s.
///
/// Text outside of an armor block is skipped.  Several armor blocks
/// may follow each other.
#[derive(Debug)]
pub struct Scanner {
    state: State,
    line: Vec<u8>,
    /// A body line overflowed the buffer and is being flushed in
    /// pieces.
    continued: bool,
    /// Envelope name of the current block.
    name: String,
    line_limit: usize,
    envelope_limit: usize,
    lifecycle: Lifecycle,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops a trailing carriage return.
fn strip_cr(line: &[u8]) -> &[u8] {
    match line.split_last() {
        Some((b'\r', rest)) => rest,
        _ => line,
    }
}

/// Drops trailing spaces and tabs.
fn trim_blanks(line: &[u8]) -> &[u8] {
    let n = line.iter().rev().take_while(|&&c| c == b' ' || c == b'\t').count();
    &line[..line.len() - n]
}

/// Whether `line` has the form `=XXXX`.
fn is_checksum_line(line: &[u8]) -> bool {
    line.len() == 5 && line[0] == b'='
        && line[1..].iter().all(|&c| c != b'=' && radix64::is_base64_char(c))
}

impl Scanner {
    /// Returns a scanner with the default limits.
    pub fn new() -> Self {
        Scanner {
            state: State::Scan,
            line: Vec::with_capacity(DEFAULT_LINE_LIMIT),
            continued: false,
            name: String::new(),
            line_limit: DEFAULT_LINE_LIMIT,
            envelope_limit: DEFAULT_ENVELOPE_LIMIT,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Scans `buf`, handing tokens to `sink`.
    pub fn push<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: TokenSink + ?Sized
    {
        self.lifecycle.check()?;
        let r = self.push_inner(buf, sink);
        self.lifecycle.guard(r)
    }

    fn push_inner<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: TokenSink + ?Sized
    {
        tracer!(TRACE, "Scanner::push");
        t!("{} bytes in state {:?}", buf.len(), self.state);

        for &c in buf {
            match self.state {
                State::Scan => {
                    if c == b'-' {
                        self.line.push(c);
                        if self.line.len() == 5 {
                            self.state = State::Envelope;
                        }
                    } else {
                        self.line.clear();
                        if c != b'\n' {
                            self.state = State::SkipLine;
                        }
                    }
                }

                State::SkipLine => if c == b'\n' {
                    self.state = State::Scan;
                },

                State::Envelope => {
                    if c == b'\n' {
                        self.envelope_line(sink)?;
                    } else if self.line.len() >= self.envelope_limit {
                        t!("envelope candidate too long, skipping");
                        self.line.clear();
                        self.state = State::SkipLine;
                    } else {
                        self.line.push(c);
                    }
                }

                State::Headers => {
                    if c == b'\n' {
                        self.header_line(sink)?;
                    } else if self.line.len() >= self.line_limit {
                        return Err(Error::LimitExceeded {
                            what: "Armor header line",
                            limit: self.line_limit,
                        }.into());
                    } else {
                        self.line.push(c);
                    }
                }

                State::Body => {
                    if c == b'\n' {
                        self.body_line(sink)?;
                    } else {
                        self.line.push(c);
                        if self.line.len() < self.line_limit {
                            continue;
                        }
                        // A footer candidate is held back until it
                        // can be matched as a whole.
                        if ! self.continued && self.line.starts_with(b"-----") {
                            if self.line.len() >= self.line_limit.max(self.envelope_limit) {
                                return Err(Error::MalformedArmor(
                                    "overlong footer line".into()).into());
                            }
                        } else {
                            self.flush_body(sink)?;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn envelope_line<S>(&mut self, sink: &mut S) -> Result<()>
        where S: TokenSink + ?Sized
    {
        tracer!(TRACE, "Scanner::envelope_line");

        let name = {
            let line = strip_cr(&self.line);
            if line.len() > 10 && line.ends_with(b"-----") {
                line[5..line.len() - 5].strip_prefix(b"BEGIN ")
                    .filter(|n| ! n.is_empty())
                    .and_then(|n| str::from_utf8(n).ok())
                    .map(|n| n.to_string())
            } else {
                None
            }
        };
        self.line.clear();

        match name {
            Some(name) => {
                t!("found envelope {:?}", name);
                self.name = name;
                self.state = State::Headers;
                sink.token(Token::Begin(&self.name))
            }
            None => {
                self.state = State::Scan;
                Ok(())
            }
        }
    }

    fn header_line<S>(&mut self, sink: &mut S) -> Result<()>
        where S: TokenSink + ?Sized
    {
        let r = {
            let line = strip_cr(&self.line);
            if line.iter().all(|c| c.is_ascii_whitespace()) {
                self.state = State::Body;
                Ok(())
            } else {
                let bad = || Error::BadHeaderLine(
                    String::from_utf8_lossy(line).into());
                let j = line.windows(2).position(|w| w == b": ")
                    .filter(|&j| j > 0)
                    .ok_or_else(bad)?;
                let name = str::from_utf8(&line[..j]).map_err(|_| bad())?;
                let value = str::from_utf8(&line[j + 2..]).map_err(|_| bad())?;
                sink.token(Token::HeaderName(name))
                    .and_then(|()| sink.token(Token::HeaderValue(value)))
            }
        };
        self.line.clear();
        r
    }

    fn body_line<S>(&mut self, sink: &mut S) -> Result<()>
        where S: TokenSink + ?Sized
    {
        tracer!(TRACE, "Scanner::body_line");

        let continued = std::mem::replace(&mut self.continued, false);
        let r = {
            let line = strip_cr(&self.line);
            if continued {
                if line.is_empty() {
                    Ok(())
                } else {
                    sink.token(Token::Text(line))
                }
            } else if line.starts_with(b"- ") {
                sink.token(Token::Text(&line[2..]))
            } else if is_checksum_line(trim_blanks(line)) {
                sink.token(Token::Checksum(&trim_blanks(line)[1..]))
            } else if line.starts_with(b"-----") {
                let footer = format!("-----END {}-----", self.name);
                if trim_blanks(line) == footer.as_bytes() {
                    t!("end of {:?}", self.name);
                    self.state = State::Scan;
                    sink.token(Token::End(&self.name))
                } else {
                    Err(Error::MalformedArmor(
                        format!("expected {:?}, got {:?}", footer,
                                String::from_utf8_lossy(line))).into())
                }
            } else if line.is_empty() {
                Ok(())
            } else {
                sink.token(Token::Text(line))
            }
        };
        self.line.clear();
        r
    }

    /// Delivers the buffered part of an overlong body line.
    fn flush_body<S>(&mut self, sink: &mut S) -> Result<()>
        where S: TokenSink + ?Sized
    {
        let first = ! self.continued;
        self.continued = true;
        let r = {
            let text = if first && self.line.starts_with(b"- ") {
                &self.line[2..]
            } else {
                &self.line[..]
            };
            sink.token(Token::Text(text))
        };
        self.line.clear();
        r
    }

    /// Finalizes the scanner.
    ///
    /// Fails with [`Error::IncompleteMessage`] if the input ended
    /// inside an armor block.
    pub fn done(&mut self) -> Result<()> {
        self.lifecycle.check()?;
        let r = match self.state {
            State::Scan | State::SkipLine => Ok(()),
            _ => Err(Error::IncompleteMessage.into()),
        };
        self.lifecycle.finish(r)
    }
}

/// A decoded element of an armored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// An armor block starts.
    Begin(&'a str),
    /// An armor header.
    Header {
        /// The header's name.
        name: &'a str,
        /// The header's value.
        value: &'a str,
    },
    /// Decoded body data.
    Data(&'a [u8]),
    /// The armor block ended.
    End {
        /// The envelope name.
        name: &'a str,
        /// CRC-24 over the decoded body.
        ///
        /// If the block carried a checksum line, it matched.
        checksum: u32,
    },
}

/// Receives the [`Event`]s produced by a [`Decoder`].
pub trait EventSink {
    /// Handles one event.  Returning an error aborts decoding.
    fn event(&mut self, event: Event) -> Result<()>;
}

/// Per-block decoding state.
struct Body {
    radix: radix64::Decoder<Vec<u8>>,
    crc: Crc24,
    header: Option<String>,
    checksum: Option<u32>,
}

impl Body {
    fn new() -> Self {
        Body {
            radix: radix64::Decoder::new(Vec::new()),
            crc: Crc24::new(),
            header: None,
            checksum: None,
        }
    }

    /// Hands decoded octets to the checksum and the sink.
    fn drain<S>(&mut self, sink: &mut S) -> Result<()>
        where S: EventSink + ?Sized
    {
        let mut data = std::mem::take(self.radix.get_mut());
        if ! data.is_empty() {
            self.crc.push(&data)?;
            sink.event(Event::Data(&data))?;
            data.clear();
        }
        *self.radix.get_mut() = data;
        Ok(())
    }
}

/// Connects a [`Scanner`] to the decoding state and the caller's
/// sink.
struct Bridge<'a, S: ?Sized> {
    body: &'a mut Body,
    sink: &'a mut S,
}

impl<'a, S> TokenSink for Bridge<'a, S>
    where S: EventSink + ?Sized
{
    fn token(&mut self, token: Token) -> Result<()> {
        match token {
            Token::Begin(name) => {
                *self.body = Body::new();
                self.sink.event(Event::Begin(name))
            }
            Token::HeaderName(name) => {
                self.body.header = Some(name.into());
                Ok(())
            }
            Token::HeaderValue(value) => {
                let name = self.body.header.take().ok_or_else(
                    || Error::MalformedArmor("header value without name".into()))?;
                self.sink.event(Event::Header { name: &name, value })
            }
            Token::Text(text) => {
                if self.body.checksum.is_some() {
                    return Err(Error::MalformedArmor(
                        "data after checksum".into()).into());
                }
                self.body.radix.push(text)?;
                self.body.drain(&mut *self.sink)
            }
            Token::Checksum(text) => {
                if self.body.checksum.is_some() {
                    return Err(Error::MalformedArmor(
                        "duplicate checksum".into()).into());
                }
                let crc = base64::decode_config(text, base64::STANDARD)
                    .ok()
                    .filter(|c| c.len() == 3)
                    .ok_or_else(|| Error::MalformedArmor(
                        format!("bad checksum {:?}",
                                String::from_utf8_lossy(text))))?;
                self.body.checksum = Some(
                    (crc[0] as u32) << 16 | (crc[1] as u32) << 8 | crc[2] as u32);
                Ok(())
            }
            Token::End(name) => {
                self.body.radix.done()?;
                self.body.drain(&mut *self.sink)?;
                let computed = self.body.crc.done()?;
                if let Some(expected) = self.body.checksum {
                    if expected != computed {
                        return Err(Error::ChecksumMismatch {
                            expected, computed,
                        }.into());
                    }
                }
                self.sink.event(Event::End { name, checksum: computed })
            }
        }
    }
}

/// Decodes ASCII armored data.
///
/// Feeds the input through a [`Scanner`], decodes the body, and
/// checks the CRC-24 trailer when present.
pub struct Decoder {
    scanner: Scanner,
    body: Body,
    lifecycle: Lifecycle,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Returns a decoder with the default limits.
    pub fn new() -> Self {
        Self::from_scanner(Scanner::new())
    }

    /// Returns a decoder using the given scanner.
    pub fn from_scanner(scanner: Scanner) -> Self {
        Decoder {
            scanner,
            body: Body::new(),
            lifecycle: Lifecycle::default(),
        }
    }

    /// Decodes `buf`, handing events to `sink`.
    pub fn push<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: EventSink + ?Sized
    {
        self.lifecycle.check()?;
        let mut bridge = Bridge { body: &mut self.body, sink };
        let r = self.scanner.push(buf, &mut bridge);
        self.lifecycle.guard(r)
    }

    /// Finalizes the decoder.
    pub fn done(&mut self) -> Result<()> {
        self.lifecycle.check()?;
        let r = self.scanner.done();
        self.lifecycle.finish(r)
    }
}

/// Checks a field written by the [`Encoder`].
fn check_field(what: &'static str, value: &str, may_be_empty: bool)
               -> Result<()> {
    if value.len() > MAX_FIELD_LEN {
        return Err(Error::LimitExceeded { what, limit: MAX_FIELD_LEN }.into());
    }
    if ! may_be_empty && value.is_empty() {
        return Err(Error::InvalidArgument(format!("{} is empty", what)).into());
    }
    if value.contains(|c| c == '\r' || c == '\n') {
        return Err(Error::InvalidArgument(
            format!("{} contains a line break", what)).into());
    }
    Ok(())
}

/// Writes ASCII armored data.
///
/// Construction writes the envelope and the headers.  Data pushed
/// afterwards is base64 encoded into the body; [`Encoder::done`]
/// writes the checksum and the footer.
pub struct Encoder<W: Write> {
    radix: radix64::Encoder<W>,
    crc: Crc24,
    name: String,
    lifecycle: Lifecycle,
}

impl<W: Write> Encoder<W> {
    /// Writes the envelope of an armor block without headers.
    pub fn new(inner: W, name: &str) -> Result<Self> {
        Self::with_headers(inner, name, Vec::<(&str, &str)>::new())
    }

    /// Writes the envelope of an armor block and the given headers.
    ///
    /// # Errors
    ///
    /// The name, and every header name and value, must fit in
    /// [`MAX_FIELD_LEN`] octets and must not contain line breaks.
    /// Header names must not be empty or contain a colon.
    pub fn with_headers<I, K, V>(mut inner: W, name: &str, headers: I)
                                 -> Result<Self>
        where I: IntoIterator<Item = (K, V)>,
              K: AsRef<str>,
              V: AsRef<str>,
    {
        check_field("Envelope name", name, false)?;

        let mut head = format!("-----BEGIN {}-----{}", name, CRLF);
        for (k, v) in headers {
            let (k, v) = (k.as_ref(), v.as_ref());
            check_field("Header name", k, false)?;
            check_field("Header value", v, true)?;
            if k.contains(':') {
                return Err(Error::InvalidArgument(
                    format!("Header name {:?} contains a colon", k)).into());
            }
            head.push_str(&format!("{}: {}{}", k, v, CRLF));
        }
        head.push_str(CRLF);
        inner.write_all(head.as_bytes())?;

        Ok(Encoder {
            radix: radix64::Encoder::with_line_ending(inner, CRLF),
            crc: Crc24::new(),
            name: name.into(),
            lifecycle: Lifecycle::default(),
        })
    }

    /// Gets a reference to the wrapped writer.
    pub fn get_ref(&self) -> &W {
        self.radix.get_ref()
    }

    /// Gets a mutable reference to the wrapped writer.
    pub fn get_mut(&mut self) -> &mut W {
        self.radix.get_mut()
    }

    /// Unwraps the encoder without finalizing it.
    pub fn into_inner(self) -> W {
        self.radix.into_inner()
    }

    /// Adds `buf` to the body.
    pub fn push(&mut self, buf: &[u8]) -> Result<()> {
        self.lifecycle.check()?;
        let r = self.crc.push(buf).and_then(|()| self.radix.push(buf));
        self.lifecycle.guard(r)
    }

    /// Writes the checksum and the footer.
    pub fn done(&mut self) -> Result<()> {
        self.lifecycle.check()?;
        let r = self.done_inner();
        self.lifecycle.finish(r)
    }

    fn done_inner(&mut self) -> Result<()> {
        self.radix.done()?;
        let crc = self.crc.done()?;
        let bytes = [(crc >> 16) as u8, (crc >> 8) as u8, crc as u8];
        let tail = format!("={}{}-----END {}-----{}",
                           base64::encode_config(&bytes, base64::STANDARD),
                           CRLF, self.name, CRLF);
        self.radix.get_mut().write_all(tail.as_bytes())?;
        Ok(())
    }

    /// Writes the checksum and the footer, and returns the writer.
    pub fn finalize(mut self) -> Result<W> {
        self.done()?;
        Ok(self.radix.into_inner())
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.radix.flush()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Records everything a `Decoder` reports.
    #[derive(Debug, Default, PartialEq)]
    struct Collect {
        begins: Vec<String>,
        headers: Vec<(String, String)>,
        data: Vec<u8>,
        ends: Vec<(String, u32)>,
    }

    impl EventSink for Collect {
        fn event(&mut self, event: Event) -> Result<()> {
            match event {
                Event::Begin(n) => self.begins.push(n.into()),
                Event::Header { name, value } =>
                    self.headers.push((name.into(), value.into())),
                Event::Data(d) => self.data.extend_from_slice(d),
                Event::End { name, checksum } =>
                    self.ends.push((name.into(), checksum)),
            }
            Ok(())
        }
    }

    /// Records the raw tokens of a `Scanner`.
    #[derive(Debug, Default)]
    struct Tokens(Vec<String>);

    impl TokenSink for Tokens {
        fn token(&mut self, token: Token) -> Result<()> {
            self.0.push(match token {
                Token::Begin(n) => format!("begin {}", n),
                Token::HeaderName(n) => format!("name {}", n),
                Token::HeaderValue(v) => format!("value {}", v),
                Token::Text(t) =>
                    format!("text {}", String::from_utf8_lossy(t)),
                Token::Checksum(c) =>
                    format!("crc {}", String::from_utf8_lossy(c)),
                Token::End(n) => format!("end {}", n),
            });
            Ok(())
        }
    }

    fn dearmor(text: &[u8]) -> Result<Collect> {
        let mut c = Collect::default();
        let mut d = Decoder::new();
        d.push(text, &mut c)?;
        d.done()?;
        Ok(c)
    }

    fn crc(data: &[u8]) -> u32 {
        let mut c = Crc24::new();
        c.push(data).unwrap();
        c.value()
    }

    fn error_of(r: Result<Collect>) -> Error {
        r.unwrap_err().downcast::<Error>().unwrap()
    }

    const HELLO: &[u8] = b"-----BEGIN PGP MESSAGE-----\r\n\
                           Comment: x\r\n\
                           \r\n\
                           Zm9v\r\n\
                           =T8JV\r\n\
                           -----END PGP MESSAGE-----\r\n";

    #[test]
    fn enarmor() {
        let mut w = Encoder::with_headers(Vec::new(), "PGP MESSAGE",
                                          vec![("Comment", "x")]).unwrap();
        w.push(b"foo").unwrap();
        assert_eq!(w.finalize().unwrap(), HELLO);
    }

    #[test]
    fn enarmor_empty() {
        let w = Encoder::new(Vec::new(), "PGP SIGNATURE").unwrap();
        let text = w.finalize().unwrap();
        assert_eq!(&text[..],
                   &b"-----BEGIN PGP SIGNATURE-----\r\n\r\n\
                      =twTO\r\n-----END PGP SIGNATURE-----\r\n"[..]);
    }

    #[test]
    fn enarmor_limits() {
        let long = "X".repeat(MAX_FIELD_LEN + 1);
        assert!(Encoder::new(Vec::new(), &long).is_err());
        assert!(Encoder::new(Vec::new(), "").is_err());
        assert!(Encoder::with_headers(Vec::new(), "PGP MESSAGE",
                                      vec![("Comment", long.as_str())])
                .is_err());
        assert!(Encoder::with_headers(Vec::new(), "PGP MESSAGE",
                                      vec![(long.as_str(), "x")])
                .is_err());
        assert!(Encoder::with_headers(Vec::new(), "PGP MESSAGE",
                                      vec![("A:B", "x")])
                .is_err());
        assert!(Encoder::with_headers(Vec::new(), "PGP MESSAGE",
                                      vec![("Comment", "a\nb")])
                .is_err());
        let ok = "X".repeat(MAX_FIELD_LEN);
        assert!(Encoder::with_headers(Vec::new(), &ok,
                                      vec![(ok.as_str(), ok.as_str())])
                .is_ok());
    }

    #[test]
    fn enarmor_finalized() {
        let mut w = Encoder::new(Vec::new(), "PGP MESSAGE").unwrap();
        w.done().unwrap();
        let e = w.push(b"x").unwrap_err();
        assert_eq!(e.downcast_ref::<Error>(), Some(&Error::Finalized));
        let e = w.done().unwrap_err();
        assert_eq!(e.downcast_ref::<Error>(), Some(&Error::Finalized));
    }

    #[test]
    fn dearmor_hello() {
        let c = dearmor(HELLO).unwrap();
        assert_eq!(c.begins, vec!["PGP MESSAGE".to_string()]);
        assert_eq!(c.headers, vec![("Comment".into(), "x".into())]);
        assert_eq!(c.data, b"foo");
        assert_eq!(c.ends, vec![("PGP MESSAGE".into(), 0x4fc255)]);
    }

    #[test]
    fn dearmor_bytewise() {
        let mut c = Collect::default();
        let mut d = Decoder::new();
        for b in HELLO.chunks(1) {
            d.push(b, &mut c).unwrap();
        }
        d.done().unwrap();
        assert_eq!(c, dearmor(HELLO).unwrap());
    }

    #[test]
    fn dearmor_lf_only() {
        let text = String::from_utf8(HELLO.to_vec()).unwrap()
            .replace("\r\n", "\n");
        assert_eq!(dearmor(text.as_bytes()).unwrap().data, b"foo");
    }

    #[test]
    fn dearmor_with_garbage() {
        let mut text = b"Hello there.\n---- not an envelope\n\
                         -----BEGIN nothing\n".to_vec();
        text.extend_from_slice(HELLO);
        text.extend_from_slice(b"trailing text\n");
        let c = dearmor(&text).unwrap();
        assert_eq!(c.data, b"foo");
        assert_eq!(c.ends.len(), 1);
    }

    #[test]
    fn dearmor_two_blocks() {
        let mut text = HELLO.to_vec();
        text.extend_from_slice(HELLO);
        let c = dearmor(&text).unwrap();
        assert_eq!(c.begins.len(), 2);
        assert_eq!(c.data, b"foofoo");
        assert_eq!(c.ends[1].1, 0x4fc255);
    }

    #[test]
    fn dearmor_no_crc() {
        let text = b"-----BEGIN PGP MESSAGE-----\n\nZm9v\n\
                     -----END PGP MESSAGE-----\n";
        let c = dearmor(text).unwrap();
        assert_eq!(c.data, b"foo");
        assert_eq!(c.ends[0].1, crc(b"foo"));
    }

    #[test]
    fn dearmor_wrong_crc() {
        let text = b"-----BEGIN PGP MESSAGE-----\n\nZm9v\n=AAAA\n\
                     -----END PGP MESSAGE-----\n";
        assert_eq!(error_of(dearmor(text)),
                   Error::ChecksumMismatch {
                       expected: 0, computed: 0x4fc255,
                   });
    }

    #[test]
    fn dearmor_wrong_footer() {
        let text = b"-----BEGIN PGP MESSAGE-----\n\nZm9v\n\
                     -----END PGP SIGNATURE-----\n";
        match error_of(dearmor(text)) {
            Error::MalformedArmor(_) => (),
            e => panic!("unexpected {:?}", e),
        }
    }

    #[test]
    fn dearmor_incomplete() {
        let text = b"-----BEGIN PGP MESSAGE-----\n\nZm9v\n";
        assert_eq!(error_of(dearmor(text)), Error::IncompleteMessage);

        let text = b"-----BEGIN PGP MESSAGE-----\nVersion: 1\n";
        assert_eq!(error_of(dearmor(text)), Error::IncompleteMessage);

        // A truncated envelope line is incomplete too.
        let text = b"-----BEGIN PGP MES";
        assert_eq!(error_of(dearmor(text)), Error::IncompleteMessage);
    }

    #[test]
    fn dearmor_bad_header() {
        for line in &["Comment x", ": x", "Comment:x", "abc"] {
            let text = format!("-----BEGIN PGP MESSAGE-----\n{}\n\nZm9v\n\
                                -----END PGP MESSAGE-----\n", line);
            match error_of(dearmor(text.as_bytes())) {
                Error::BadHeaderLine(l) => assert_eq!(&l, line),
                e => panic!("unexpected {:?}", e),
            }
        }
    }

    #[test]
    fn dearmor_header_empty_value_and_duplicates() {
        let text = b"-----BEGIN PGP MESSAGE-----\n\
                     Comment: \n\
                     Comment: a: b\n\
                     \n\
                     Zm9v\n\
                     -----END PGP MESSAGE-----\n";
        let c = dearmor(text).unwrap();
        assert_eq!(c.headers, vec![
            ("Comment".into(), "".into()),
            ("Comment".into(), "a: b".into()),
        ]);
    }

    #[test]
    fn dearmor_header_too_long() {
        let mut c = Collect::default();
        let mut d = Decoder::from_scanner(
            ScannerBuilder::new().line_limit(32).build().unwrap());
        let text = format!("-----BEGIN PGP MESSAGE-----\nComment: {}\n",
                           "x".repeat(40));
        let e = d.push(text.as_bytes(), &mut c).unwrap_err();
        assert_eq!(e.downcast_ref::<Error>(),
                   Some(&Error::LimitExceeded {
                       what: "Armor header line", limit: 32,
                   }));
        match d.done().unwrap_err().downcast_ref::<Error>() {
            Some(Error::Poisoned(_)) => (),
            e => panic!("unexpected {:?}", e),
        }
    }

    #[test]
    fn footer_longer_than_line_limit() {
        let mut c = Collect::default();
        let mut d = Decoder::from_scanner(
            ScannerBuilder::new().line_limit(16).build().unwrap());
        d.push(HELLO, &mut c).unwrap();
        d.done().unwrap();
        assert_eq!(c.data, b"foo");
        assert_eq!(c.ends, vec![("PGP MESSAGE".into(), 0x4fc255)]);

        // But not without bound.
        let mut d = Decoder::from_scanner(
            ScannerBuilder::new().line_limit(16).envelope_limit(20)
                .build().unwrap());
        let text = format!("-----BEGIN X-----\n\n{}\n-----END X-----\n",
                           "-".repeat(30));
        let e = d.push(text.as_bytes(), &mut Collect::default()).unwrap_err();
        assert!(matches!(e.downcast_ref::<Error>(),
                         Some(Error::MalformedArmor(_))));
    }

    #[test]
    fn checksum_and_footer_with_trailing_blanks() {
        let text = b"-----BEGIN PGP MESSAGE-----\n\nZm9v\n=T8JV \t\n\
                     -----END PGP MESSAGE----- \n";
        let c = dearmor(text).unwrap();
        assert_eq!(c.data, b"foo");
        assert_eq!(c.ends, vec![("PGP MESSAGE".into(), 0x4fc255)]);

        let text = b"-----BEGIN PGP MESSAGE-----\n\nZm9v\n=AAAA \n\
                     -----END PGP MESSAGE-----\n";
        assert_eq!(error_of(dearmor(text)),
                   Error::ChecksumMismatch {
                       expected: 0, computed: 0x4fc255,
                   });
    }

    #[test]
    fn dash_escape() {
        let text = b"-----BEGIN PGP MESSAGE-----\n\n- Zm9v\n\
                     -----END PGP MESSAGE-----\n";
        let mut t = Tokens::default();
        let mut s = Scanner::new();
        s.push(text, &mut t).unwrap();
        s.done().unwrap();
        assert_eq!(t.0, vec!["begin PGP MESSAGE", "text Zm9v",
                             "end PGP MESSAGE"]);
    }

    #[test]
    fn long_body_lines_are_split() {
        let scanner = || ScannerBuilder::new().line_limit(16).build().unwrap();
        let body = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghij";

        let text = format!("-----BEGIN X-----\n\n- {}\n-----END X-----\n",
                           body);
        let mut t = Tokens::default();
        let mut s = scanner();
        s.push(text.as_bytes(), &mut t).unwrap();
        s.done().unwrap();
        let joined: String = t.0.iter()
            .filter_map(|l| l.strip_prefix("text "))
            .collect();
        assert_eq!(joined, body);
        assert!(t.0.len() > 3);

        // A "- " in a continuation is data.
        let text = format!("-----BEGIN X-----\n\n{}- xyz\n-----END X-----\n",
                           &body[..16]);
        let mut t = Tokens::default();
        let mut s = scanner();
        s.push(text.as_bytes(), &mut t).unwrap();
        s.done().unwrap();
        let joined: String = t.0.iter()
            .filter_map(|l| l.strip_prefix("text "))
            .collect();
        assert_eq!(joined, format!("{}- xyz", &body[..16]));
    }

    #[test]
    fn scanner_tokens() {
        let mut t = Tokens::default();
        let mut s = Scanner::new();
        s.push(HELLO, &mut t).unwrap();
        s.done().unwrap();
        assert_eq!(t.0, vec![
            "begin PGP MESSAGE",
            "name Comment",
            "value x",
            "text Zm9v",
            "crc T8JV",
            "end PGP MESSAGE",
        ]);
        assert!(s.push(b"x", &mut t).is_err());
    }

    #[test]
    fn sink_errors_abort() {
        struct Fail;
        impl EventSink for Fail {
            fn event(&mut self, event: Event) -> Result<()> {
                match event {
                    Event::Data(_) => Err(anyhow::anyhow!("no thanks")),
                    _ => Ok(()),
                }
            }
        }

        let mut d = Decoder::new();
        let e = d.push(HELLO, &mut Fail).unwrap_err();
        assert_eq!(e.to_string(), "no thanks");
        assert!(d.push(b"", &mut Fail).is_err());
    }

    #[test]
    fn kind_names() {
        for k in &[Kind::Message, Kind::PublicKey, Kind::SecretKey,
                   Kind::Signature, Kind::File] {
            assert_eq!(Kind::from_name(k.name()), Some(*k));
        }
        assert_eq!(Kind::from_name("PGP SOMETHING"), None);
    }

    quickcheck! {
        fn roundtrip(payload: Vec<u8>) -> bool {
            let mut w = Encoder::new(Vec::new(), "PGP MESSAGE").unwrap();
            w.push(&payload).unwrap();
            let text = w.finalize().unwrap();
            let c = dearmor(&text).unwrap();
            c.data == payload
                && c.ends == vec![("PGP MESSAGE".to_string(), crc(&payload))]
        }
    }

    quickcheck! {
        fn chunking_does_not_matter(payload: Vec<u8>, cuts: Vec<usize>)
                                    -> bool {
            let mut w = Encoder::with_headers(
                Vec::new(), "PGP ARMORED FILE",
                vec![("Comment", "chunked")]).unwrap();
            w.push(&payload).unwrap();
            let text = w.finalize().unwrap();

            let mut c = Collect::default();
            let mut d = Decoder::new();
            let mut rest = &text[..];
            for cut in cuts {
                let n = cut % (rest.len() + 1);
                d.push(&rest[..n], &mut c).unwrap();
                rest = &rest[n..];
            }
            d.push(rest, &mut c).unwrap();
            d.done().unwrap();
            c == dearmor(&text).unwrap()
        }
    }
}
