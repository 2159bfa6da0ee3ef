//! Decodes the body of a single packet.

use crate::{Error, Result, Tag, S2K};
use crate::packet::{BodyLength, Header};
use crate::types::{
    CompressionAlgorithm,
    DataFormat,
    HashAlgorithm,
    PublicKeyAlgorithm,
    SignatureType,
    SubpacketTag,
    SymmetricAlgorithm,
};
use crate::utils::{self, Lifecycle};
use super::{LengthFormat, LengthReader};
use super::mpis::MpiReader;
use super::subpacket::{
    SubpacketEvent,
    SubpacketHeader,
    SubpacketParser,
    SubpacketSink,
};

const TRACE: bool = false;

/// Length of a modification detection code.
const MDC_LEN: usize = 20;

/// What the [`PacketParser`] reports.
///
/// Large fields are streamed as fragments.  A field may be split
/// into any number of fragments, including none if it is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketEvent<'a> {
    /// A packet starts.
    ///
    /// Only produced by the [`MessageParser`], which knows the
    /// headers.
    ///
    ///   [`MessageParser`]: super::MessageParser
    Start(Header),

    /// Public-key encrypted session key.  Followed by the encrypted
    /// session key as MPIs.
    PKESK {
        /// Packet version.
        version: u8,
        /// Key id of the recipient.
        recipient: [u8; 8],
        /// Public key algorithm used to encrypt the session key.
        pk_algo: PublicKeyAlgorithm,
    },

    /// Version 3 signature.  Followed by the signature MPIs.
    SignatureV3 {
        /// Signature type.
        typ: SignatureType,
        /// Creation time.
        creation_time: u32,
        /// Key id of the signer.
        issuer: [u8; 8],
        /// Public key algorithm.
        pk_algo: PublicKeyAlgorithm,
        /// Hash algorithm.
        hash_algo: HashAlgorithm,
        /// First two octets of the hash.
        digest_prefix: [u8; 2],
    },

    /// Version 4 signature.  Followed by the subpacket areas, the
    /// digest prefix, and the signature MPIs.
    SignatureV4 {
        /// Signature type.
        typ: SignatureType,
        /// Public key algorithm.
        pk_algo: PublicKeyAlgorithm,
        /// Hash algorithm.
        hash_algo: HashAlgorithm,
    },

    /// A subpacket area starts.
    SubpacketArea {
        /// Whether the area is covered by the signature.
        hashed: bool,
        /// Size of the area.
        len: u16,
    },

    /// An event from a subpacket.
    Subpacket(SubpacketEvent<'a>),

    /// First two octets of the hash of a version 4 signature.
    DigestPrefix([u8; 2]),

    /// An MPI starts.
    MpiStart {
        /// Size in bits.
        bits: u16,
    },
    /// A fragment of an MPI.
    MpiData(&'a [u8]),
    /// The MPI ended.
    MpiEnd,

    /// Symmetric-key encrypted session key.  Followed by the
    /// encrypted session key, if any.
    SKESK {
        /// Packet version.
        version: u8,
        /// Symmetric algorithm used to encrypt the session key.
        sym_algo: SymmetricAlgorithm,
        /// How to derive the key from the password.
        s2k: S2K,
    },
    /// A fragment of an encrypted session key.
    EncryptedSessionKey(&'a [u8]),

    /// One-pass signature.
    OnePassSig {
        /// Packet version.
        version: u8,
        /// Signature type.
        typ: SignatureType,
        /// Hash algorithm.
        hash_algo: HashAlgorithm,
        /// Public key algorithm.
        pk_algo: PublicKeyAlgorithm,
        /// Key id of the signer.
        issuer: [u8; 8],
        /// Whether this is the last one-pass signature before the
        /// signed data.
        last: bool,
    },

    /// Public or secret key or subkey.  Followed by the public MPIs
    /// and, for secret keys, the secret key material.
    Key {
        /// Packet version.
        version: u8,
        /// Creation time.
        creation_time: u32,
        /// Validity period in days.  Only version 2 and 3 keys carry
        /// one.
        days_valid: Option<u16>,
        /// Public key algorithm.
        pk_algo: PublicKeyAlgorithm,
    },

    /// How the secret key material is protected.
    ///
    /// With `usage` 0 the secret MPIs follow in the clear.
    /// Otherwise the encrypted material follows as
    /// [`EncryptedSecret`] fragments.
    ///
    ///   [`EncryptedSecret`]: PacketEvent::EncryptedSecret
    SecretKeyProtection {
        /// The S2K usage octet.
        usage: u8,
        /// Symmetric algorithm protecting the material.
        sym_algo: Option<SymmetricAlgorithm>,
        /// How to derive the key from the password.
        s2k: Option<S2K>,
        /// Initialization vector.
        iv: &'a [u8],
    },
    /// A fragment of encrypted secret key material.
    EncryptedSecret(&'a [u8]),
    /// The checksum or SHA-1 hash over the secret key material.
    ///
    /// For unencrypted material, the checksum has been verified.
    SecretKeyChecksum(&'a [u8]),

    /// Compressed data.  Followed by the compressed octets.
    Compressed {
        /// Compression algorithm.
        algo: CompressionAlgorithm,
    },
    /// A fragment of compressed data.
    CompressedData(&'a [u8]),

    /// Symmetrically encrypted and integrity protected data.
    /// Followed by the encrypted octets.
    SEIP {
        /// Packet version.
        version: u8,
    },
    /// A fragment of encrypted data (SED or SEIP).
    EncryptedData(&'a [u8]),

    /// Literal data.  Followed by the content.
    Literal {
        /// Format of the content.
        format: DataFormat,
        /// File name, possibly empty.
        filename: &'a [u8],
        /// Modification date.
        date: u32,
    },
    /// A fragment of literal data.
    LiteralData(&'a [u8]),

    /// Modification detection code.
    MDC([u8; MDC_LEN]),

    /// A fragment of a packet whose body is not structured any
    /// further: user ids, user attributes, trust packets and unknown
    /// packets.
    Data(&'a [u8]),

    /// The packet ended.
    ///
    /// Only produced by the [`MessageParser`].
    ///
    ///   [`MessageParser`]: super::MessageParser
    End,
}

/// Receives the [`PacketEvent`]s produced by a [`PacketParser`].
pub trait PacketSink {
    /// Handles one event.  Returning an error aborts parsing.
    fn packet(&mut self, event: PacketEvent) -> Result<()>;
}

/// Forwards subpacket events to a packet sink.
struct Relay<'a, S: ?Sized>(&'a mut S);

impl<'a, S> SubpacketSink for Relay<'a, S>
    where S: PacketSink + ?Sized
{
    fn subpacket(&mut self, event: SubpacketEvent) -> Result<()> {
        self.0.packet(PacketEvent::Subpacket(event))
    }
}

/// Fixed-size fields and what to do once they are complete.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Pkesk,
    SigVersion,
    SigV3,
    SigV4,
    UnhashedLen,
    DigestPrefix,
    Skesk,
    /// The S2K type octet; the rest of the specifier follows.
    S2kType(S2kFor),
    /// The complete S2K specifier.
    S2k(S2kFor),
    OnePassSig,
    KeyVersion,
    Key {
        version: u8,
    },
    Usage {
        pk_algo: PublicKeyAlgorithm,
    },
    /// Symmetric algorithm of S2K protected material.
    SymAlgo {
        usage: u8,
    },
    Iv {
        usage: u8,
        sym_algo: SymmetricAlgorithm,
        s2k: Option<S2K>,
    },
    /// Checksum over plaintext secret material.
    Checksum {
        computed: u16,
    },
    Compressed,
    SeipVersion,
    LiteralHeader,
    LiteralName {
        format: DataFormat,
    },
    LiteralDate {
        format: DataFormat,
        filename: Vec<u8>,
    },
}

/// Which packet an S2K specifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum S2kFor {
    Skesk {
        sym_algo: SymmetricAlgorithm,
    },
    SecretKey {
        usage: u8,
        sym_algo: SymmetricAlgorithm,
    },
}

/// What comes after a run of MPIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterMpis {
    /// The end of the body.
    End,
    /// The secret part of a secret key.
    Secret(PublicKeyAlgorithm),
    /// The checksum over plaintext secret material.
    Checksum,
}

/// Which event the rest of the body produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rest {
    EncryptedSessionKey,
    CompressedData,
    EncryptedData,
    LiteralData,
    Data,
}

impl Rest {
    fn event(self, data: &[u8]) -> PacketEvent {
        match self {
            Rest::EncryptedSessionKey => PacketEvent::EncryptedSessionKey(data),
            Rest::CompressedData => PacketEvent::CompressedData(data),
            Rest::EncryptedData => PacketEvent::EncryptedData(data),
            Rest::LiteralData => PacketEvent::LiteralData(data),
            Rest::Data => PacketEvent::Data(data),
        }
    }
}

/// Position inside a subpacket area.
#[derive(Debug)]
enum Subpackets {
    Length(LengthReader),
    /// Reading the type octet of a subpacket of the given length.
    Type(usize),
    /// Streaming the body into a subpacket parser.
    Body(SubpacketParser, usize),
}

#[derive(Debug)]
struct Area {
    hashed: bool,
    /// Octets of the area not yet consumed.
    left: usize,
    at: Subpackets,
}

#[derive(Debug)]
enum State {
    /// Buffering a fixed-size field.
    Fixed(usize, Field),
    Mpis(MpiReader, AfterMpis),
    Area(Area),
    /// Streaming encrypted secret key material, holding back the
    /// trailing checksum of the given size.
    Secret(usize),
    /// Streaming the rest of the body.
    Rest(Rest),
    /// Buffering a modification detection code.
    Mdc,
    /// The body carries no information.
    Ignore,
    /// The body is complete.
    Done,
}

/// Decodes the body of a single packet.
///
/// The parser is created for a packet's tag, fed the packet's body
/// (as produced by the [`Framer`]), and finalized with `done` at the
/// end of the body.  See [Section 5 of RFC 4880] for the layouts.
///
/// Packets of unknown type, and keys using algorithms with an
/// unknown key layout, are streamed as [`PacketEvent::Data`].
///
///   [`Framer`]: super::Framer
///   [Section 5 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5
#[derive(Debug)]
pub struct PacketParser {
    tag: Tag,
    state: State,
    buf: Vec<u8>,
    lifecycle: Lifecycle,
}

impl PacketParser {
    /// Returns a parser for a packet with the given tag.
    pub fn new(tag: Tag) -> Self {
        let state = match tag {
            Tag::PKESK => State::Fixed(10, Field::Pkesk),
            Tag::Signature => State::Fixed(1, Field::SigVersion),
            Tag::SKESK => State::Fixed(2, Field::Skesk),
            Tag::OnePassSig => State::Fixed(13, Field::OnePassSig),
            Tag::PublicKey | Tag::PublicSubkey
                | Tag::SecretKey | Tag::SecretSubkey =>
                State::Fixed(1, Field::KeyVersion),
            Tag::CompressedData => State::Fixed(1, Field::Compressed),
            Tag::SED => State::Rest(Rest::EncryptedData),
            Tag::SEIP => State::Fixed(1, Field::SeipVersion),
            Tag::Marker => State::Ignore,
            Tag::Literal => State::Fixed(2, Field::LiteralHeader),
            Tag::Trust | Tag::UserID | Tag::UserAttribute =>
                State::Rest(Rest::Data),
            Tag::MDC => State::Mdc,
            Tag::Reserved | Tag::Private(_) | Tag::Unknown(_) => {
                log::warn!("Unsupported packet type: {}", tag);
                State::Rest(Rest::Data)
            }
        };

        PacketParser {
            tag,
            state,
            buf: Vec::new(),
            lifecycle: Lifecycle::default(),
        }
    }

    /// Returns the tag of the packet being parsed.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Feeds octets of the packet's body.
    pub fn push<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: PacketSink + ?Sized
    {
        self.lifecycle.check()?;
        let r = self.push_(buf, sink);
        self.lifecycle.guard(r)
    }

    fn push_<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<()>
        where S: PacketSink + ?Sized
    {
        tracer!(TRACE, "PacketParser::push");
        let mut input = buf;

        loop {
            t!("{:?}: {} bytes in {:?}", self.tag, input.len(), self.state);
            match &mut self.state {
                State::Fixed(want, _) => {
                    if ! utils::fill(&mut self.buf, *want, &mut input) {
                        break;
                    }
                    let field =
                        match std::mem::replace(&mut self.state, State::Done) {
                            State::Fixed(_, field) => field,
                            _ => unreachable!(),
                        };
                    let data = std::mem::take(&mut self.buf);
                    self.state = self.field(field, data, sink)?;
                }

                State::Mpis(reader, after) => {
                    let after = *after;
                    if ! reader.push(&mut input, sink)? {
                        break;
                    }
                    self.state = match after {
                        AfterMpis::End => State::Done,
                        AfterMpis::Secret(pk_algo) =>
                            State::Fixed(1, Field::Usage { pk_algo }),
                        AfterMpis::Checksum =>
                            State::Fixed(2, Field::Checksum {
                                computed: reader.checksum(),
                            }),
                    };
                }

                State::Area(area) => {
                    if ! Self::area(area, &mut input, sink)? {
                        break;
                    }
                    self.state = if area.hashed {
                        State::Fixed(2, Field::UnhashedLen)
                    } else {
                        State::Fixed(2, Field::DigestPrefix)
                    };
                }

                State::Secret(trailer) => {
                    if input.is_empty() {
                        break;
                    }
                    let trailer = *trailer;
                    let total = self.buf.len() + input.len();
                    if total > trailer {
                        // Emit everything but the last `trailer` octets.
                        let emit = total - trailer;
                        let from_buf = emit.min(self.buf.len());
                        if from_buf > 0 {
                            sink.packet(PacketEvent::EncryptedSecret(
                                &self.buf[..from_buf]))?;
                            self.buf.drain(..from_buf);
                        }
                        let from_input = emit - from_buf;
                        if from_input > 0 {
                            sink.packet(PacketEvent::EncryptedSecret(
                                &input[..from_input]))?;
                        }
                        input = &input[from_input..];
                    }
                    self.buf.extend_from_slice(input);
                    input = &[];
                }

                State::Rest(rest) => {
                    if input.is_empty() {
                        break;
                    }
                    sink.packet(rest.event(input))?;
                    input = &[];
                }

                State::Mdc => {
                    if self.buf.len() + input.len() > MDC_LEN {
                        return Err(Error::BadMdcSize(
                            self.buf.len() + input.len()).into());
                    }
                    self.buf.extend_from_slice(input);
                    break;
                }

                State::Ignore => break,

                State::Done => {
                    if ! input.is_empty() {
                        return Err(Error::MalformedPacket(
                            format!("{} trailing octets in {}",
                                    input.len(), self.tag)).into());
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    /// Streams a subpacket area.  Returns `true` once it is complete.
    fn area<S>(area: &mut Area, input: &mut &[u8], sink: &mut S)
               -> Result<bool>
        where S: PacketSink + ?Sized
    {
        tracer!(TRACE, "PacketParser::area", 1);

        loop {
            match &mut area.at {
                Subpackets::Length(reader) => {
                    if area.left == 0 && ! reader.is_started() {
                        return Ok(true);
                    }

                    // A length never extends past the area.
                    let avail = area.left.min(input.len());
                    let mut window = &input[..avail];
                    let len = reader.push(&mut window)?;
                    let used = avail - window.len();
                    area.left -= used;
                    *input = &input[used..];

                    match len {
                        Some(BodyLength::Full(0)) =>
                            return Err(Error::MalformedPacket(
                                "Zero length subpacket".into()).into()),
                        Some(BodyLength::Full(n)) if n as usize <= area.left =>
                            area.at = Subpackets::Type(n as usize),
                        Some(BodyLength::Full(n)) =>
                            return Err(Error::MalformedPacket(
                                format!("Subpacket of {} octets exceeds the \
                                         remaining {} octets of the area",
                                        n, area.left)).into()),
                        Some(l) =>
                            return Err(Error::InvalidLength(
                                format!("Bad subpacket length {:?}", l)).into()),
                        None if area.left == 0 =>
                            return Err(Error::MalformedPacket(
                                "Truncated subpacket length".into()).into()),
                        None => return Ok(false),
                    }
                }

                Subpackets::Type(len) => {
                    let len = *len;
                    let octet = match input.first() {
                        Some(&o) => o,
                        None => return Ok(false),
                    };
                    *input = &input[1..];
                    area.left -= 1;

                    let header = SubpacketHeader::new(octet, len - 1);
                    t!("subpacket {:?}", header);
                    if header.critical {
                        match header.tag {
                            SubpacketTag::Reserved(_) | SubpacketTag::Private(_)
                                | SubpacketTag::Unknown(_) =>
                                log::warn!("Unknown critical subpacket {:?}",
                                           header.tag),
                            _ => (),
                        }
                    }
                    sink.packet(PacketEvent::Subpacket(
                        SubpacketEvent::Start(header)))?;
                    area.at = Subpackets::Body(
                        SubpacketParser::new(header), header.size);
                }

                Subpackets::Body(parser, 0) => {
                    parser.done(&mut Relay(&mut *sink))?;
                    sink.packet(PacketEvent::Subpacket(SubpacketEvent::End))?;
                    area.at = Subpackets::Length(
                        LengthReader::new(LengthFormat::Subpacket));
                }

                Subpackets::Body(parser, left) => {
                    if input.is_empty() {
                        return Ok(false);
                    }
                    let n = (*left).min(input.len());
                    parser.push(&input[..n], &mut Relay(&mut *sink))?;
                    *left -= n;
                    area.left -= n;
                    *input = &input[n..];
                }
            }
        }
    }

    /// Decodes a complete fixed-size field and returns the next
    /// state.
    fn field<S>(&mut self, field: Field, data: Vec<u8>, sink: &mut S)
                -> Result<State>
        where S: PacketSink + ?Sized
    {
        let keyid = |b: &[u8]| {
            let mut id = [0; 8];
            id.copy_from_slice(b);
            id
        };

        match field {
            Field::Pkesk => {
                if data[0] != 3 {
                    return Err(Error::BadVersion(self.tag, data[0]).into());
                }
                sink.packet(PacketEvent::PKESK {
                    version: data[0],
                    recipient: keyid(&data[1..9]),
                    pk_algo: data[9].into(),
                })?;
                Ok(State::Mpis(MpiReader::unbounded(), AfterMpis::End))
            }

            Field::SigVersion => match data[0] {
                3 => Ok(State::Fixed(18, Field::SigV3)),
                4 => Ok(State::Fixed(5, Field::SigV4)),
                v => Err(Error::BadVersion(self.tag, v).into()),
            },

            Field::SigV3 => {
                if data[0] != 5 {
                    return Err(Error::MalformedPacket(
                        format!("Bad hashed length in v3 signature: {}",
                                data[0])).into());
                }
                sink.packet(PacketEvent::SignatureV3 {
                    typ: data[1].into(),
                    creation_time: utils::read_be_u32(&data[2..6]),
                    issuer: keyid(&data[6..14]),
                    pk_algo: data[14].into(),
                    hash_algo: data[15].into(),
                    digest_prefix: [data[16], data[17]],
                })?;
                Ok(State::Mpis(MpiReader::unbounded(), AfterMpis::End))
            }

            Field::SigV4 => {
                sink.packet(PacketEvent::SignatureV4 {
                    typ: data[0].into(),
                    pk_algo: data[1].into(),
                    hash_algo: data[2].into(),
                })?;
                self.enter_area(true, utils::read_be_u16(&data[3..5]), sink)
            }

            Field::UnhashedLen =>
                self.enter_area(false, utils::read_be_u16(&data), sink),

            Field::DigestPrefix => {
                sink.packet(PacketEvent::DigestPrefix([data[0], data[1]]))?;
                Ok(State::Mpis(MpiReader::unbounded(), AfterMpis::End))
            }

            Field::Skesk => {
                if data[0] != 4 {
                    return Err(Error::BadVersion(self.tag, data[0]).into());
                }
                Ok(State::Fixed(1, Field::S2kType(S2kFor::Skesk {
                    sym_algo: data[1].into(),
                })))
            }

            Field::S2kType(what) => {
                let len = S2K::wire_len(data[0])?;
                // Keep the type octet, the specifier is parsed whole.
                self.buf = data;
                Ok(State::Fixed(len, Field::S2k(what)))
            }

            Field::S2k(what) => {
                let (s2k, _) = S2K::parse(&data)?;
                match what {
                    S2kFor::Skesk { sym_algo } => {
                        sink.packet(PacketEvent::SKESK {
                            version: 4,
                            sym_algo,
                            s2k,
                        })?;
                        Ok(State::Rest(Rest::EncryptedSessionKey))
                    }
                    S2kFor::SecretKey { usage, sym_algo } =>
                        Ok(State::Fixed(sym_algo.block_size()?, Field::Iv {
                            usage,
                            sym_algo,
                            s2k: Some(s2k),
                        })),
                }
            }

            Field::OnePassSig => {
                if data[0] != 3 {
                    return Err(Error::BadVersion(self.tag, data[0]).into());
                }
                sink.packet(PacketEvent::OnePassSig {
                    version: data[0],
                    typ: data[1].into(),
                    hash_algo: data[2].into(),
                    pk_algo: data[3].into(),
                    issuer: keyid(&data[4..12]),
                    last: data[12] != 0,
                })?;
                Ok(State::Done)
            }

            Field::KeyVersion => match data[0] {
                2 | 3 => Ok(State::Fixed(7, Field::Key { version: data[0] })),
                4 => Ok(State::Fixed(5, Field::Key { version: 4 })),
                v => Err(Error::BadVersion(self.tag, v).into()),
            },

            Field::Key { version } => {
                let (days_valid, pk_algo) = if version == 4 {
                    (None, PublicKeyAlgorithm::from(data[4]))
                } else {
                    (Some(utils::read_be_u16(&data[4..6])),
                     PublicKeyAlgorithm::from(data[6]))
                };
                sink.packet(PacketEvent::Key {
                    version,
                    creation_time: utils::read_be_u32(&data[..4]),
                    days_valid,
                    pk_algo,
                })?;

                match pk_algo.public_mpis() {
                    Ok(n) => {
                        let after = if self.tag.is_secret_key() {
                            AfterMpis::Secret(pk_algo)
                        } else {
                            AfterMpis::End
                        };
                        Ok(State::Mpis(MpiReader::new(n), after))
                    }
                    Err(e) => {
                        log::warn!("{}: streaming the key material unparsed", e);
                        Ok(State::Rest(Rest::Data))
                    }
                }
            }

            Field::Usage { pk_algo } => match data[0] {
                0 => {
                    sink.packet(PacketEvent::SecretKeyProtection {
                        usage: 0,
                        sym_algo: None,
                        s2k: None,
                        iv: &[],
                    })?;
                    Ok(State::Mpis(MpiReader::new(pk_algo.secret_mpis()?),
                                   AfterMpis::Checksum))
                }
                usage @ 254 | usage @ 255 =>
                    Ok(State::Fixed(1, Field::SymAlgo { usage })),
                usage => {
                    let sym_algo = SymmetricAlgorithm::from(usage);
                    Ok(State::Fixed(sym_algo.block_size()?, Field::Iv {
                        usage,
                        sym_algo,
                        s2k: None,
                    }))
                }
            },

            Field::SymAlgo { usage } =>
                Ok(State::Fixed(1, Field::S2kType(S2kFor::SecretKey {
                    usage,
                    sym_algo: data[0].into(),
                }))),

            Field::Iv { usage, sym_algo, s2k } => {
                sink.packet(PacketEvent::SecretKeyProtection {
                    usage,
                    sym_algo: Some(sym_algo),
                    s2k,
                    iv: &data,
                })?;
                Ok(State::Secret(if usage == 254 { 20 } else { 2 }))
            }

            Field::Checksum { computed } => {
                let expected = utils::read_be_u16(&data);
                if expected != computed {
                    return Err(Error::BadSecretKeyChecksum {
                        expected,
                        got: computed,
                    }.into());
                }
                sink.packet(PacketEvent::SecretKeyChecksum(&data))?;
                Ok(State::Done)
            }

            Field::Compressed => {
                sink.packet(PacketEvent::Compressed { algo: data[0].into() })?;
                Ok(State::Rest(Rest::CompressedData))
            }

            Field::SeipVersion => {
                if data[0] != 1 {
                    return Err(Error::BadVersion(self.tag, data[0]).into());
                }
                sink.packet(PacketEvent::SEIP { version: 1 })?;
                Ok(State::Rest(Rest::EncryptedData))
            }

            Field::LiteralHeader => {
                let format = DataFormat::from(data[0]);
                match data[1] {
                    0 => Ok(State::Fixed(4, Field::LiteralDate {
                        format,
                        filename: Vec::new(),
                    })),
                    n => Ok(State::Fixed(n as usize,
                                         Field::LiteralName { format })),
                }
            }

            Field::LiteralName { format } =>
                Ok(State::Fixed(4, Field::LiteralDate {
                    format,
                    filename: data,
                })),

            Field::LiteralDate { format, filename } => {
                sink.packet(PacketEvent::Literal {
                    format,
                    filename: &filename,
                    date: utils::read_be_u32(&data),
                })?;
                Ok(State::Rest(Rest::LiteralData))
            }
        }
    }

    /// Starts a subpacket area of `len` octets.
    fn enter_area<S>(&mut self, hashed: bool, len: u16, sink: &mut S)
                     -> Result<State>
        where S: PacketSink + ?Sized
    {
        sink.packet(PacketEvent::SubpacketArea { hashed, len })?;
        Ok(State::Area(Area {
            hashed,
            left: len as usize,
            at: Subpackets::Length(LengthReader::new(LengthFormat::Subpacket)),
        }))
    }

    /// Signals the end of the packet's body.
    pub fn done<S>(&mut self, sink: &mut S) -> Result<()>
        where S: PacketSink + ?Sized
    {
        self.lifecycle.check()?;
        let r = self.done_(sink);
        self.lifecycle.finish(r)
    }

    fn done_<S>(&mut self, sink: &mut S) -> Result<()>
        where S: PacketSink + ?Sized
    {
        // Settle transitions that need no input.
        self.push_(&[], sink)?;

        match &self.state {
            State::Done | State::Ignore | State::Rest(_) => Ok(()),
            State::Mpis(reader, AfterMpis::End) if reader.may_end() => Ok(()),
            State::Secret(trailer) => {
                if self.buf.len() < *trailer {
                    return Err(Error::MalformedPacket(
                        format!("Secret key material shorter than its \
                                 {} octet checksum", trailer)).into());
                }
                sink.packet(PacketEvent::SecretKeyChecksum(&self.buf))
            }
            State::Mdc => {
                if self.buf.len() != MDC_LEN {
                    return Err(Error::BadMdcSize(self.buf.len()).into());
                }
                let mut mdc = [0; MDC_LEN];
                mdc.copy_from_slice(&self.buf);
                sink.packet(PacketEvent::MDC(mdc))
            }
            State::Fixed(..) | State::Mpis(..) | State::Area(_) =>
                Err(Error::MalformedPacket(
                    format!("{} truncated", self.tag)).into()),
        }
    }
}
