use crate::{Error, Result};
use crate::utils::Lifecycle;
use super::{Frame, FrameSink, Framer, PacketEvent, PacketParser, PacketSink};

const TRACE: bool = false;

/// Parses a sequence of OpenPGP packets.
///
/// A `MessageParser` feeds the output of a [`Framer`] into a fresh
/// [`PacketParser`] for each packet.  Each packet is reported as a
/// [`PacketEvent::Start`] carrying the packet's header, the events of
/// the packet's body, and a [`PacketEvent::End`].
///
/// The parser does not descend into containers: the contents of
/// compressed and encrypted packets are reported as opaque
/// fragments.
#[derive(Debug, Default)]
pub struct MessageParser {
    framer: Framer,
    /// Parser for the packet currently being framed.
    current: Option<PacketParser>,
    packets: usize,
    lifecycle: Lifecycle,
}

/// Routes frames to the current packet parser.
struct Route<'a, S: ?Sized> {
    current: &'a mut Option<PacketParser>,
    packets: &'a mut usize,
    sink: &'a mut S,
}

impl<'a, S> FrameSink for Route<'a, S>
    where S: PacketSink + ?Sized
{
    fn frame(&mut self, frame: Frame) -> Result<()> {
        tracer!(TRACE, "MessageParser::frame");

        match frame {
            Frame::Start(header) => {
                t!("packet {}: {:?}", self.packets, header);
                self.sink.packet(PacketEvent::Start(header))?;
                *self.current = Some(PacketParser::new(header.tag()));
            }
            Frame::Body(data) => {
                let parser = self.current.as_mut().ok_or_else(
                    || Error::MalformedPacket("Body outside of a packet".into()))?;
                parser.push(data, &mut *self.sink)?;
            }
            Frame::End => {
                let mut parser = self.current.take().ok_or_else(
                    || Error::MalformedPacket("End outside of a packet".into()))?;
                parser.done(&mut *self.sink)?;
                *self.packets += 1;
                self.sink.packet(PacketEvent::End)?;
            }
        }
        Ok(())
    }
}

impl MessageParser {
    /// Returns a parser using a default [`Framer`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a parser using the given framer.
    ///
    /// Use this with a [`FramerBuilder`] to change the framer's
    /// settings.
    ///
    ///   [`FramerBuilder`]: super::FramerBuilder
    pub fn from_framer(framer: Framer) -> Self {
        MessageParser {
            framer,
            .. Self::default()
        }
    }

    /// Returns the number of packets parsed completely.
    pub fn packets(&self) -> usize {
        self.packets
    }

    /// Feeds a chunk of the message.
    pub fn push<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: PacketSink + ?Sized
    {
        self.lifecycle.check()?;
        let r = self.framer.push(buf, &mut Route {
            current: &mut self.current,
            packets: &mut self.packets,
            sink,
        });
        self.lifecycle.guard(r)
    }

    /// Signals the end of the message.
    ///
    /// Fails if the message ends inside a packet.
    pub fn done<S>(&mut self, sink: &mut S) -> Result<()>
        where S: PacketSink + ?Sized
    {
        self.lifecycle.check()?;
        let r = self.framer.done(&mut Route {
            current: &mut self.current,
            packets: &mut self.packets,
            sink,
        });
        self.lifecycle.finish(r)
    }
}
