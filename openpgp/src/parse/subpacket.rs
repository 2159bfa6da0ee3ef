//! Signature subpackets.
//!
//! See [Section 5.2.3.1 of RFC 4880] for the list of subpackets.
//!
//!   [Section 5.2.3.1 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2.3.1

use crate::{Error, Result};
use crate::types::{
    HashAlgorithm,
    PublicKeyAlgorithm,
    ReasonForRevocation,
    SubpacketTag,
};
use crate::utils::{self, Lifecycle};

const TRACE: bool = false;

/// A subpacket's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpacketHeader {
    /// The subpacket's type, with the critical bit cleared.
    pub tag: SubpacketTag,
    /// Whether the critical bit was set.
    pub critical: bool,
    /// Size of the body.
    ///
    /// The type octet is not included.
    pub size: usize,
}

impl SubpacketHeader {
    /// Decodes a header from the raw type octet and the body size.
    pub fn new(type_octet: u8, size: usize) -> Self {
        SubpacketHeader {
            tag: (type_octet & 0x7f).into(),
            critical: type_octet & 0x80 != 0,
            size,
        }
    }
}

/// What the [`SubpacketParser`] reports.
///
/// Fields with a fixed size are reported once they are complete.
/// Variable fields are streamed as fragments; a field may be split
/// into any number of fragments, including none if it is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpacketEvent<'a> {
    /// A subpacket starts.
    ///
    /// Not produced by the [`SubpacketParser`] itself; the packet
    /// parser brackets each subpacket with `Start` and [`End`].
    ///
    ///   [`End`]: SubpacketEvent::End
    Start(SubpacketHeader),
    /// Signature creation time.
    SignatureCreationTime(u32),
    /// Signature expiration time, relative to the creation time.
    SignatureExpirationTime(u32),
    /// Key expiration time, relative to the key's creation time.
    KeyExpirationTime(u32),
    /// Exportable certification.
    ExportableCertification(bool),
    /// Trust signature.
    TrustSignature {
        /// Trust level, or depth.
        level: u8,
        /// Trust amount.
        amount: u8,
    },
    /// Revocable.
    Revocable(bool),
    /// Revocation key.
    RevocationKey {
        /// Class octet.
        class: u8,
        /// Public key algorithm of the authorized key.
        pk_algo: PublicKeyAlgorithm,
        /// Fingerprint of the authorized key.
        fingerprint: [u8; 20],
    },
    /// Issuer key id.
    Issuer([u8; 8]),
    /// Notation flags.  Followed by the name and the value.
    NotationFlags(u32),
    /// A fragment of a notation's name.
    NotationName(&'a [u8]),
    /// A fragment of a notation's value.
    NotationValue(&'a [u8]),
    /// Primary user id.
    PrimaryUserID(bool),
    /// Reason for revocation.  Followed by the reason text.
    ReasonForRevocation(ReasonForRevocation),
    /// A fragment of the human-readable revocation reason.
    ReasonText(&'a [u8]),
    /// Signature target.  Followed by the hash.
    SignatureTarget {
        /// Public key algorithm of the target signature.
        pk_algo: PublicKeyAlgorithm,
        /// Hash algorithm of the target signature.
        hash_algo: HashAlgorithm,
    },
    /// A fragment of the target signature's hash.
    SignatureTargetHash(&'a [u8]),
    /// A fragment of any other known subpacket's body.
    ///
    /// Used for the regular expression, the preferred key server, the
    /// policy URI, the signer's user id, the embedded signature, and
    /// the octet lists: preferences, key flags, features, issuer
    /// fingerprint and intended recipient.
    Data(&'a [u8]),
    /// The subpacket ended.
    End,
}

/// Receives the [`SubpacketEvent`]s produced by a
/// [`SubpacketParser`].
pub trait SubpacketSink {
    /// Handles one event.  Returning an error aborts parsing.
    fn subpacket(&mut self, event: SubpacketEvent) -> Result<()>;
}

/// Which event a streamed field produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    NotationName,
    NotationValue,
    ReasonText,
    TargetHash,
    Data,
}

impl Part {
    fn event(self, data: &[u8]) -> SubpacketEvent {
        match self {
            Part::NotationName => SubpacketEvent::NotationName(data),
            Part::NotationValue => SubpacketEvent::NotationValue(data),
            Part::ReasonText => SubpacketEvent::ReasonText(data),
            Part::TargetHash => SubpacketEvent::SignatureTargetHash(data),
            Part::Data => SubpacketEvent::Data(data),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Buffering a fixed-size field of the given size.
    Fixed(usize),
    /// Streaming a variable field.
    Stream {
        part: Part,
        left: usize,
    },
    /// Unknown subpacket; the body is dropped.
    Ignore,
    /// The body is complete.
    Done,
}

/// Decodes the body of one signature subpacket.
///
/// The parser is created from the subpacket's header, fed exactly
/// `header.size` octets, and finalized with `done`.  Pushing more
/// than `size` octets, or finishing with a fixed-size field
/// incomplete, is an [`Error::MalformedPacket`].
///
/// Unknown subpackets are consumed without producing events; acting
/// on the critical bit is up to the caller.
#[derive(Debug)]
pub struct SubpacketParser {
    header: SubpacketHeader,
    state: State,
    buf: Vec<u8>,
    /// Octets pushed so far.
    seen: usize,
    /// Length of a notation value, once its name is being streamed.
    value_len: usize,
    lifecycle: Lifecycle,
}

impl SubpacketParser {
    /// Returns a parser for the subpacket described by `header`.
    pub fn new(header: SubpacketHeader) -> Self {
        use SubpacketTag::*;

        let state = match header.tag {
            SignatureCreationTime | SignatureExpirationTime
                | KeyExpirationTime => State::Fixed(4),
            ExportableCertification | Revocable | PrimaryUserID =>
                State::Fixed(1),
            TrustSignature => State::Fixed(2),
            RevocationKey => State::Fixed(22),
            Issuer => State::Fixed(8),
            NotationData => State::Fixed(8),
            SubpacketTag::ReasonForRevocation => State::Fixed(1),
            SignatureTarget => State::Fixed(2),
            RegularExpression | PreferredKeyServer | PolicyURI
                | SignersUserID | EmbeddedSignature
                | PreferredSymmetricAlgorithms | PreferredHashAlgorithms
                | PreferredCompressionAlgorithms | KeyServerPreferences
                | KeyFlags | Features | IssuerFingerprint
                | PreferredAEADAlgorithms | IntendedRecipient =>
                State::Stream { part: Part::Data, left: header.size },
            PlaceholderForBackwardCompatibility | Reserved(_)
                | Private(_) | Unknown(_) => State::Ignore,
        };

        SubpacketParser {
            header,
            state,
            buf: Vec::new(),
            seen: 0,
            value_len: 0,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Returns the subpacket's header.
    pub fn header(&self) -> &SubpacketHeader {
        &self.header
    }

    /// Feeds octets of the subpacket's body.
    pub fn push<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: SubpacketSink + ?Sized
    {
        self.lifecycle.check()?;
        let r = self.push_(buf, sink);
        self.lifecycle.guard(r)
    }

    fn push_<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: SubpacketSink + ?Sized
    {
        tracer!(TRACE, "SubpacketParser::push");

        if self.seen + buf.len() > self.header.size {
            return Err(Error::MalformedPacket(
                format!("{:?} subpacket overflows its size of {}",
                        self.header.tag, self.header.size)).into());
        }
        self.seen += buf.len();

        let mut input = buf;
        loop {
            t!("{:?}: {} bytes in {:?}", self.header.tag, input.len(),
               self.state);
            match self.state {
                State::Fixed(want) => {
                    if ! utils::fill(&mut self.buf, want, &mut input) {
                        break;
                    }
                    let field = std::mem::take(&mut self.buf);
                    self.state = self.fixed(&field, sink)?;
                }

                State::Stream { part, left: 0 } => {
                    self.state = if part == Part::NotationName {
                        State::Stream {
                            part: Part::NotationValue,
                            left: self.value_len,
                        }
                    } else {
                        State::Done
                    };
                }

                State::Stream { part, left } => {
                    if input.is_empty() {
                        break;
                    }
                    let n = left.min(input.len());
                    let (chunk, rest) = input.split_at(n);
                    input = rest;
                    self.state = State::Stream { part, left: left - n };
                    sink.subpacket(part.event(chunk))?;
                }

                State::Ignore => break,

                State::Done => {
                    if ! input.is_empty() {
                        return Err(Error::MalformedPacket(
                            format!("{} trailing octets in {:?} subpacket",
                                    input.len(), self.header.tag)).into());
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    /// Decodes a complete fixed-size field.
    fn fixed<S>(&mut self, field: &[u8], sink: &mut S) -> Result<State>
        where S: SubpacketSink + ?Sized
    {
        use SubpacketTag::*;

        // The rest of the body after the fixed field.
        let rest = self.header.size.saturating_sub(field.len());

        let event = match self.header.tag {
            SignatureCreationTime =>
                SubpacketEvent::SignatureCreationTime(utils::read_be_u32(field)),
            SignatureExpirationTime =>
                SubpacketEvent::SignatureExpirationTime(utils::read_be_u32(field)),
            KeyExpirationTime =>
                SubpacketEvent::KeyExpirationTime(utils::read_be_u32(field)),
            ExportableCertification =>
                SubpacketEvent::ExportableCertification(field[0] != 0),
            Revocable =>
                SubpacketEvent::Revocable(field[0] != 0),
            PrimaryUserID =>
                SubpacketEvent::PrimaryUserID(field[0] != 0),
            TrustSignature =>
                SubpacketEvent::TrustSignature {
                    level: field[0],
                    amount: field[1],
                },
            RevocationKey => {
                let mut fingerprint = [0; 20];
                fingerprint.copy_from_slice(&field[2..22]);
                SubpacketEvent::RevocationKey {
                    class: field[0],
                    pk_algo: field[1].into(),
                    fingerprint,
                }
            }
            Issuer => {
                let mut keyid = [0; 8];
                keyid.copy_from_slice(field);
                SubpacketEvent::Issuer(keyid)
            }
            NotationData => {
                let name_len = utils::read_be_u16(&field[4..6]) as usize;
                let value_len = utils::read_be_u16(&field[6..8]) as usize;
                if name_len + value_len != rest {
                    return Err(Error::MalformedPacket(
                        format!("Notation lengths {} + {} don't match \
                                 the remaining {} octets",
                                name_len, value_len, rest)).into());
                }
                sink.subpacket(SubpacketEvent::NotationFlags(
                    utils::read_be_u32(&field[..4])))?;
                self.value_len = value_len;
                return Ok(State::Stream {
                    part: Part::NotationName,
                    left: name_len,
                });
            }
            SubpacketTag::ReasonForRevocation => {
                sink.subpacket(SubpacketEvent::ReasonForRevocation(
                    field[0].into()))?;
                return Ok(State::Stream { part: Part::ReasonText, left: rest });
            }
            SignatureTarget => {
                sink.subpacket(SubpacketEvent::SignatureTarget {
                    pk_algo: field[0].into(),
                    hash_algo: field[1].into(),
                })?;
                return Ok(State::Stream { part: Part::TargetHash, left: rest });
            }
            tag =>
                return Err(Error::InvalidArgument(
                    format!("{:?} has no fixed field", tag)).into()),
        };

        sink.subpacket(event)?;
        Ok(State::Done)
    }

    /// Finalizes the parser.
    ///
    /// Fails if fewer than `size` octets were pushed.
    pub fn done<S>(&mut self, sink: &mut S) -> Result<()>
        where S: SubpacketSink + ?Sized
    {
        self.lifecycle.check()?;
        let r = self.done_(sink);
        self.lifecycle.finish(r)
    }

    fn done_<S>(&mut self, sink: &mut S) -> Result<()>
        where S: SubpacketSink + ?Sized
    {
        if self.seen < self.header.size {
            return Err(Error::MalformedPacket(
                format!("{:?} subpacket truncated: got {} of {} octets",
                        self.header.tag, self.seen, self.header.size)).into());
        }

        // Zero-length fields still need their transitions.
        self.push_(&[], sink)?;

        match self.state {
            State::Done | State::Ignore => Ok(()),
            State::Fixed(want) => Err(Error::MalformedPacket(
                format!("{:?} subpacket needs {} octets, got {}",
                        self.header.tag, want, self.header.size)).into()),
            State::Stream { .. } => Err(Error::MalformedPacket(
                format!("{:?} subpacket truncated", self.header.tag)).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Owned copy of an event.  Adjacent fragments of the same field
    /// are merged, so the result does not depend on chunking.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Owned {
        Fixed(String),
        NotationName(Vec<u8>),
        NotationValue(Vec<u8>),
        ReasonText(Vec<u8>),
        TargetHash(Vec<u8>),
        Data(Vec<u8>),
    }

    #[derive(Default, Debug)]
    struct Recorder(Vec<Owned>);

    impl SubpacketSink for Recorder {
        fn subpacket(&mut self, event: SubpacketEvent) -> Result<()> {
            let (new, data): (fn(Vec<u8>) -> Owned, &[u8]) = match event {
                SubpacketEvent::NotationName(d) => (Owned::NotationName, d),
                SubpacketEvent::NotationValue(d) => (Owned::NotationValue, d),
                SubpacketEvent::ReasonText(d) => (Owned::ReasonText, d),
                SubpacketEvent::SignatureTargetHash(d) => (Owned::TargetHash, d),
                SubpacketEvent::Data(d) => (Owned::Data, d),
                e => {
                    self.0.push(Owned::Fixed(format!("{:?}", e)));
                    return Ok(());
                }
            };
            let fresh = new(data.to_vec());
            if let Some(last) = self.0.last_mut() {
                if std::mem::discriminant(last) == std::mem::discriminant(&fresh) {
                    match last {
                        Owned::NotationName(v) | Owned::NotationValue(v)
                            | Owned::ReasonText(v) | Owned::TargetHash(v)
                            | Owned::Data(v) => v.extend_from_slice(data),
                        Owned::Fixed(_) => unreachable!(),
                    }
                    return Ok(());
                }
            }
            self.0.push(fresh);
            Ok(())
        }
    }

    fn fixed(e: SubpacketEvent) -> Owned {
        Owned::Fixed(format!("{:?}", e))
    }

    fn parse(typ: u8, body: &[u8]) -> Result<Vec<Owned>> {
        let mut p = SubpacketParser::new(SubpacketHeader::new(typ, body.len()));
        let mut r = Recorder::default();
        p.push(body, &mut r)?;
        p.done(&mut r)?;
        Ok(r.0)
    }

    fn parse_bytewise(typ: u8, body: &[u8]) -> Result<Vec<Owned>> {
        let mut p = SubpacketParser::new(SubpacketHeader::new(typ, body.len()));
        let mut r = Recorder::default();
        for b in body {
            p.push(&[*b], &mut r)?;
        }
        p.done(&mut r)?;
        Ok(r.0)
    }

    #[test]
    fn header() {
        let h = SubpacketHeader::new(0x82, 4);
        assert_eq!(h.tag, SubpacketTag::SignatureCreationTime);
        assert!(h.critical);
        assert_eq!(h.size, 4);

        let h = SubpacketHeader::new(0x10, 8);
        assert_eq!(h.tag, SubpacketTag::Issuer);
        assert!(! h.critical);
    }

    #[test]
    fn issuer() {
        let keyid = [0xAC, 0xC0, 0xE9, 0xC9, 0x67, 0x5A, 0x76, 0xB1];
        let mut p = SubpacketParser::new(SubpacketHeader::new(16, 8));
        struct Issuer(Option<[u8; 8]>);
        impl SubpacketSink for Issuer {
            fn subpacket(&mut self, event: SubpacketEvent) -> Result<()> {
                if let SubpacketEvent::Issuer(id) = event {
                    self.0 = Some(id);
                }
                Ok(())
            }
        }
        let mut s = Issuer(None);
        p.push(&keyid[..3], &mut s).unwrap();
        assert_eq!(s.0, None);
        p.push(&keyid[3..], &mut s).unwrap();
        p.done(&mut s).unwrap();
        assert_eq!(s.0, Some(keyid));
    }

    #[test]
    fn fixed_fields() {
        assert_eq!(parse(2, &[0x5a, 0x00, 0x00, 0x01]).unwrap(),
                   vec![fixed(SubpacketEvent::SignatureCreationTime(0x5a000001))]);
        assert_eq!(parse(3, &[0, 0, 0, 60]).unwrap(),
                   vec![fixed(SubpacketEvent::SignatureExpirationTime(60))]);
        assert_eq!(parse(9, &[0, 0, 1, 0]).unwrap(),
                   vec![fixed(SubpacketEvent::KeyExpirationTime(256))]);
        assert_eq!(parse(4, &[1]).unwrap(),
                   vec![fixed(SubpacketEvent::ExportableCertification(true))]);
        assert_eq!(parse(7, &[0]).unwrap(),
                   vec![fixed(SubpacketEvent::Revocable(false))]);
        assert_eq!(parse(25, &[1]).unwrap(),
                   vec![fixed(SubpacketEvent::PrimaryUserID(true))]);
        assert_eq!(parse(5, &[1, 120]).unwrap(),
                   vec![fixed(SubpacketEvent::TrustSignature {
                       level: 1, amount: 120,
                   })]);

        let mut body = vec![0x80, 1];
        body.extend_from_slice(&[0x11; 20]);
        assert_eq!(parse_bytewise(12, &body).unwrap(),
                   vec![fixed(SubpacketEvent::RevocationKey {
                       class: 0x80,
                       pk_algo: PublicKeyAlgorithm::RSAEncryptSign,
                       fingerprint: [0x11; 20],
                   })]);
    }

    #[test]
    fn fixed_field_size_mismatch() {
        // Too short.
        let e = parse(2, &[0, 0, 1]).unwrap_err();
        assert!(matches!(e.downcast_ref::<Error>(),
                         Some(Error::MalformedPacket(_))));
        // Too long.
        let e = parse(16, &[0; 9]).unwrap_err();
        assert!(matches!(e.downcast_ref::<Error>(),
                         Some(Error::MalformedPacket(_))));
    }

    #[test]
    fn overflow() {
        let mut p = SubpacketParser::new(SubpacketHeader::new(26, 3));
        let mut r = Recorder::default();
        p.push(b"ab", &mut r).unwrap();
        assert!(p.push(b"cd", &mut r).is_err());
        // Sticky.
        assert!(p.done(&mut r).is_err());
    }

    #[test]
    fn truncated() {
        let mut p = SubpacketParser::new(SubpacketHeader::new(26, 3));
        let mut r = Recorder::default();
        p.push(b"ab", &mut r).unwrap();
        let e = p.done(&mut r).unwrap_err();
        assert!(matches!(e.downcast_ref::<Error>(),
                         Some(Error::MalformedPacket(_))));
    }

    #[test]
    fn notation() {
        let mut body = vec![0x80, 0, 0, 0, 0, 4, 0, 5];
        body.extend_from_slice(b"name");
        body.extend_from_slice(b"value");

        let expected = vec![
            fixed(SubpacketEvent::NotationFlags(0x80000000)),
            Owned::NotationName(b"name".to_vec()),
            Owned::NotationValue(b"value".to_vec()),
        ];
        assert_eq!(parse(20, &body).unwrap(), expected);
        assert_eq!(parse_bytewise(20, &body).unwrap(), expected);

        // Lengths must match the body.
        let mut bad = vec![0, 0, 0, 0, 0, 4, 0, 6];
        bad.extend_from_slice(b"namevalue");
        assert!(parse(20, &bad).is_err());
    }

    #[test]
    fn empty_notation() {
        let r = parse(20, &[0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(r, vec![fixed(SubpacketEvent::NotationFlags(0))]);
    }

    #[test]
    fn reason_for_revocation() {
        let r = parse(29, b"\x02stolen").unwrap();
        assert_eq!(r, vec![
            fixed(SubpacketEvent::ReasonForRevocation(
                ReasonForRevocation::KeyCompromised)),
            Owned::ReasonText(b"stolen".to_vec()),
        ]);

        let r = parse(29, b"\x00").unwrap();
        assert_eq!(r, vec![
            fixed(SubpacketEvent::ReasonForRevocation(
                ReasonForRevocation::Unspecified)),
        ]);
    }

    #[test]
    fn signature_target() {
        let r = parse_bytewise(31, &[1, 8, 0xde, 0xad]).unwrap();
        assert_eq!(r, vec![
            fixed(SubpacketEvent::SignatureTarget {
                pk_algo: PublicKeyAlgorithm::RSAEncryptSign,
                hash_algo: HashAlgorithm::SHA256,
            }),
            Owned::TargetHash(vec![0xde, 0xad]),
        ]);
    }

    #[test]
    fn streamed() {
        for &typ in &[6u8, 11, 21, 22, 23, 24, 26, 27, 28, 30, 32, 33, 34, 35] {
            let e = parse_bytewise(typ, b"some data").unwrap();
            assert_eq!(e, vec![Owned::Data(b"some data".to_vec())], "{}", typ);
        }
        assert!(parse(26, b"").unwrap().is_empty());
    }

    #[test]
    fn unknown_is_ignored() {
        for &typ in &[0u8, 1, 10, 17, 50, 100, 0x80 | 50] {
            assert!(parse(typ, b"whatever").unwrap().is_empty(), "{}", typ);
        }
    }

    quickcheck! {
        fn chunking_does_not_matter(body: Vec<u8>, split: usize) -> bool {
            let mut body = body;
            // Make it a valid notation.
            let name = body.len() / 2;
            let value = body.len() - name;
            let mut wire = vec![0, 0, 0, 0,
                                (name >> 8) as u8, name as u8,
                                (value >> 8) as u8, value as u8];
            wire.append(&mut body);

            let whole = parse(20, &wire).unwrap();

            let split = split % (wire.len() + 1);
            let mut p = SubpacketParser::new(SubpacketHeader::new(20, wire.len()));
            let mut r = Recorder::default();
            p.push(&wire[..split], &mut r).unwrap();
            p.push(&wire[split..], &mut r).unwrap();
            p.done(&mut r).unwrap();

            r.0 == whole
        }
    }
}
