//! Splits an OpenPGP stream into packets.

use std::convert::TryFrom;

use crate::{Error, Result};
use crate::packet::{BodyLength, CTB, Header};
use crate::utils::Lifecycle;
use super::{LengthFormat, LengthReader};

const TRACE: bool = false;

/// The default bound on the framer's state stack.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// What the [`Framer`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A packet starts.
    ///
    /// For partial body lengths, the header's length is the size of
    /// the first chunk.
    Start(Header),
    /// A fragment of the current packet's body.
    ///
    /// Fragments never include length octets of later chunks.
    Body(&'a [u8]),
    /// The current packet ended.
    End,
}

/// Receives the [`Frame`]s produced by a [`Framer`].
pub trait FrameSink {
    /// Handles one frame.  Returning an error aborts parsing.
    fn frame(&mut self, frame: Frame) -> Result<()>;
}

/// Framer states.
#[derive(Debug)]
enum State {
    /// Expecting a packet tag octet.
    Header,
    /// Reading the length following the CTB.
    Length(CTB, LengthReader),
    /// Streaming a body, or the last chunk of a partial body.
    Body(u32),
    /// Streaming a partial chunk; another length follows it.
    Partial(u32),
    /// Reading the length of the next chunk of a partial body.
    Chunk(LengthReader),
    /// Streaming a body that extends to the end of the input.
    Indeterminate,
}

/// Configures a [`Framer`].
#[derive(Debug, Clone)]
pub struct FramerBuilder {
    max_depth: usize,
}

impl Default for FramerBuilder {
    fn default() -> Self {
        FramerBuilder {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl FramerBuilder {
    /// Returns a builder with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bound on the state stack.
    ///
    /// The default is [`DEFAULT_MAX_DEPTH`].  A packet needs up to
    /// three entries.
    pub fn max_depth(mut self, value: usize) -> Self {
        self.max_depth = value;
        self
    }

    /// Builds the framer.
    pub fn build(self) -> Result<Framer> {
        if self.max_depth < 1 {
            return Err(Error::InvalidArgument(
                "max_depth must be positive".into()).into());
        }
        Ok(Framer {
            stack: vec![State::Header],
            max_depth: self.max_depth,
            lifecycle: Lifecycle::default(),
        })
    }
}

/// Splits an OpenPGP stream into packets.
///
/// The framer decodes the packet headers (see [Section 4.2 of RFC
/// 4880]) and streams each packet's body, with the chunk lengths of
/// partial bodies removed.  It does not look into the bodies.
///
/// The current position in the grammar is kept on an explicit stack:
/// the bottom entry waits for the next packet, and the entries above
/// it track the current packet's length and body.
///
///   [Section 4.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-4.2
#[derive(Debug)]
pub struct Framer {
    stack: Vec<State>,
    max_depth: usize,
    lifecycle: Lifecycle,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    /// Returns a framer with the default settings.
    pub fn new() -> Self {
        Framer {
            stack: vec![State::Header],
            max_depth: DEFAULT_MAX_DEPTH,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Returns whether the framer is between packets.
    pub fn at_packet_boundary(&self) -> bool {
        self.stack.len() == 1
    }

    fn enter(&mut self, state: State) -> Result<()> {
        if self.stack.len() >= self.max_depth {
            return Err(Error::StackOverflow(self.max_depth).into());
        }
        self.stack.push(state);
        Ok(())
    }

    fn leave(&mut self) -> Result<State> {
        // The bottom entry is never popped.
        if self.stack.len() <= 1 {
            return Err(Error::StackUnderflow.into());
        }
        self.stack.pop().ok_or_else(|| Error::StackUnderflow.into())
    }

    fn replace(&mut self, state: State) -> Result<()> {
        self.leave()?;
        self.enter(state)
    }

    /// Enters the state for a body whose length just became known.
    fn body<S>(&mut self, len: BodyLength, sink: &mut S) -> Result<()>
        where S: FrameSink + ?Sized
    {
        match len {
            BodyLength::Full(0) => sink.frame(Frame::End),
            BodyLength::Full(n) => self.enter(State::Body(n)),
            BodyLength::Partial(n) => self.enter(State::Partial(n)),
            BodyLength::Indeterminate => self.enter(State::Indeterminate),
        }
    }

    /// Feeds `buf` to the framer.
    pub fn push<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: FrameSink + ?Sized
    {
        self.lifecycle.check()?;
        let r = self.push_(buf, sink);
        self.lifecycle.guard(r)
    }

    fn push_<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: FrameSink + ?Sized
    {
        tracer!(TRACE, "Framer::push");
        let mut input = buf;

        loop {
            let top = self.stack.last_mut().ok_or(Error::StackUnderflow)?;
            t!("{} bytes left in {:?}", input.len(), top);

            match top {
                State::Header => {
                    let ptag = match input.first() {
                        Some(&b) => b,
                        None => break,
                    };
                    input = &input[1..];
                    let ctb = CTB::try_from(ptag)?;
                    let format = match ctb {
                        CTB::New(_) => LengthFormat::New,
                        CTB::Old(ref c) => LengthFormat::Old(c.length_type()),
                    };
                    self.enter(State::Length(ctb, LengthReader::new(format)))?;
                }

                State::Length(ctb, reader) => {
                    let ctb = *ctb;
                    let len = match reader.push(&mut input)? {
                        Some(len) => len,
                        None => break,
                    };
                    self.leave()?;
                    t!("packet {:?} of length {:?}", ctb.tag(), len);
                    sink.frame(Frame::Start(Header::new(ctb, len)))?;
                    self.body(len, sink)?;
                }

                State::Body(left) | State::Partial(left) if *left > 0 => {
                    if input.is_empty() {
                        break;
                    }
                    let n = input.len().min(*left as usize);
                    *left -= n as u32;
                    let (chunk, rest) = input.split_at(n);
                    input = rest;
                    sink.frame(Frame::Body(chunk))?;
                }

                State::Body(_) => {
                    self.leave()?;
                    sink.frame(Frame::End)?;
                }

                State::Partial(_) => {
                    self.replace(State::Chunk(LengthReader::new(LengthFormat::New)))?;
                }

                State::Chunk(reader) => {
                    let len = match reader.push(&mut input)? {
                        Some(len) => len,
                        None => break,
                    };
                    t!("next chunk: {:?}", len);
                    self.leave()?;
                    self.body(len, sink)?;
                }

                State::Indeterminate => {
                    if input.is_empty() {
                        break;
                    }
                    sink.frame(Frame::Body(input))?;
                    input = &[];
                }
            }
        }

        Ok(())
    }

    /// Signals the end of the input.
    ///
    /// An indeterminate length packet ends here.  Any other
    /// unfinished packet is an [`Error::IncompletePacket`].
    pub fn done<S>(&mut self, sink: &mut S) -> Result<()>
        where S: FrameSink + ?Sized
    {
        self.lifecycle.check()?;
        let r = self.done_(sink);
        self.lifecycle.finish(r)
    }

    fn done_<S>(&mut self, sink: &mut S) -> Result<()>
        where S: FrameSink + ?Sized
    {
        match self.stack.last() {
            Some(State::Header) => Ok(()),
            Some(State::Indeterminate) => {
                self.leave()?;
                sink.frame(Frame::End)
            }
            Some(_) => Err(Error::IncompletePacket.into()),
            None => Err(Error::StackUnderflow.into()),
        }
    }
}
