//! Drives the whole decoding pipeline: armor, packet framing, packet
//! bodies and subpackets.

use rand::Rng;

use openpgp_stream as openpgp;
use openpgp::{Error, Result, Tag, S2K};
use openpgp::armor::{self, Event, EventSink, Kind};
use openpgp::crypto::backend::RustCrypto;
use openpgp::parse::{MessageParser, PacketEvent, PacketSink, SubpacketEvent};
use openpgp::types::{SubpacketTag, SymmetricAlgorithm};

/// Frames `body` as a new format packet.
fn packet(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut p = vec![0xc0 | tag];
    let l = body.len();
    if l < 192 {
        p.push(l as u8);
    } else if l < 8384 {
        let l = l - 192;
        p.push((l >> 8) as u8 + 192);
        p.push(l as u8);
    } else {
        p.push(0xff);
        p.extend_from_slice(&(l as u32).to_be_bytes());
    }
    p.extend_from_slice(body);
    p
}

/// A transferable public key: a tiny RSA key, a user id, and a
/// self-signature.
fn public_key_block() -> Vec<u8> {
    let mut msg = packet(6, &[4, 0x5a, 0, 0, 1, 1,
                              0x00, 0x08, 0xc5,
                              0x00, 0x02, 0x03]);
    msg.extend(packet(13, b"Alice <alice@example.org>"));

    let mut sig = vec![4, 0x13, 1, 8, 0, 37];
    sig.extend_from_slice(&[5, 2, 0x5a, 0, 0, 1]);
    sig.extend_from_slice(&[2, 27, 0x03]);
    sig.extend_from_slice(&[4, 11, 9, 8, 7]);
    sig.extend_from_slice(&[22, 33, 4]);
    sig.extend_from_slice(&[0xab; 20]);
    sig.extend_from_slice(&[0, 10, 9, 16]);
    sig.extend_from_slice(&[0x11; 8]);
    sig.extend_from_slice(&[0xbe, 0xef, 0x00, 0x03, 0x05]);
    msg.extend(packet(2, &sig));
    msg
}

/// A signed message whose literal data packet uses partial body
/// lengths.
fn signed_message() -> Vec<u8> {
    let mut ops = vec![3, 0, 8, 1];
    ops.extend_from_slice(&[0x11; 8]);
    ops.push(1);
    let mut msg = packet(4, &ops);

    let mut literal = b"b\x00\x00\x00\x00\x00".to_vec();
    literal.extend((0..600u32).map(|i| (i % 251) as u8));
    msg.push(0xcb);
    msg.push(0xe9);
    msg.extend_from_slice(&literal[..512]);
    msg.push((literal.len() - 512) as u8);
    msg.extend_from_slice(&literal[512..]);

    msg.extend(packet(2, &[4, 0, 1, 8, 0, 0, 0, 0, 0xbe, 0xef,
                           0x00, 0x01, 0x01]));
    msg
}

/// A password encrypted message.
fn encrypted_message() -> Vec<u8> {
    let mut msg = packet(3, &[4, 7, 3, 8, 1, 2, 3, 4, 5, 6, 7, 8, 96]);
    let mut seip = vec![1];
    seip.extend_from_slice(&[0x42; 300]);
    msg.extend(packet(18, &seip));
    msg
}

fn armored(kind: Kind, msg: &[u8]) -> Vec<u8> {
    let mut w = armor::Encoder::new(Vec::new(), kind.name()).unwrap();
    w.push(msg).unwrap();
    w.finalize().unwrap()
}

/// Records packet events.  Adjacent fragments of the same kind are
/// merged, so the record does not depend on chunking.
#[derive(Default, Debug)]
struct Record {
    events: Vec<String>,
    tags: Vec<Tag>,
    subpackets: Vec<SubpacketTag>,
    literal: Vec<u8>,
    encrypted: Vec<u8>,
    skesk: Option<(SymmetricAlgorithm, S2K)>,
    last_fragment: Option<&'static str>,
}

impl PacketSink for Record {
    fn packet(&mut self, event: PacketEvent) -> Result<()> {
        let fragment = match event {
            PacketEvent::Start(h) => {
                self.tags.push(h.tag());
                None
            }
            PacketEvent::Subpacket(SubpacketEvent::Start(h)) => {
                self.subpackets.push(h.tag);
                None
            }
            PacketEvent::SKESK { sym_algo, s2k, .. } => {
                self.skesk = Some((sym_algo, s2k));
                None
            }
            PacketEvent::LiteralData(d) => {
                self.literal.extend_from_slice(d);
                Some("literal")
            }
            PacketEvent::EncryptedData(d) => {
                self.encrypted.extend_from_slice(d);
                Some("encrypted")
            }
            PacketEvent::MpiData(_) => Some("mpi"),
            PacketEvent::Data(_) => Some("data"),
            PacketEvent::Subpacket(SubpacketEvent::Data(_)) => Some("subpacket"),
            _ => None,
        };

        match fragment {
            Some(kind) if self.last_fragment == Some(kind) => (),
            Some(kind) => self.events.push(kind.into()),
            None => self.events.push(format!("{:?}", event)),
        }
        self.last_fragment = fragment;
        Ok(())
    }
}

/// Feeds decoded armor data to a message parser.
#[derive(Default)]
struct Pipeline {
    names: Vec<String>,
    checksums: Vec<u32>,
    parser: MessageParser,
    record: Record,
}

impl EventSink for Pipeline {
    fn event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Begin(name) => self.names.push(name.into()),
            Event::Header { .. } => (),
            Event::Data(d) => self.parser.push(d, &mut self.record)?,
            Event::End { checksum, .. } => {
                self.checksums.push(checksum);
                self.parser.done(&mut self.record)?;
            }
        }
        Ok(())
    }
}

/// Decodes `text`, splitting it into chunks of the given sizes.  The
/// last chunk takes what is left.
fn decode(text: &[u8], sizes: &[usize]) -> Result<Pipeline> {
    let mut d = armor::Decoder::new();
    let mut p = Pipeline::default();
    let mut rest = text;
    for &n in sizes {
        let n = n.min(rest.len());
        d.push(&rest[..n], &mut p)?;
        rest = &rest[n..];
    }
    d.push(rest, &mut p)?;
    d.done()?;
    Ok(p)
}

fn random_sizes(len: usize) -> Vec<usize> {
    let mut rng = rand::thread_rng();
    let mut sizes = Vec::new();
    let mut total = 0;
    while total < len {
        let n = rng.gen_range(0..=17);
        sizes.push(n);
        total += n;
    }
    sizes
}

#[test]
fn public_key_block_decodes() {
    let text = armored(Kind::PublicKey, &public_key_block());
    assert!(text.starts_with(b"-----BEGIN PGP PUBLIC KEY BLOCK-----\r\n"));

    let p = decode(&text, &[]).unwrap();
    assert_eq!(p.names, vec!["PGP PUBLIC KEY BLOCK"]);
    assert_eq!(p.parser.packets(), 3);
    assert_eq!(p.record.tags, vec![Tag::PublicKey, Tag::UserID, Tag::Signature]);
    assert_eq!(p.record.subpackets, vec![
        SubpacketTag::SignatureCreationTime,
        SubpacketTag::KeyFlags,
        SubpacketTag::PreferredSymmetricAlgorithms,
        SubpacketTag::IssuerFingerprint,
        SubpacketTag::Issuer,
    ]);
    assert!(p.record.events.iter().any(
        |e| e == "Subpacket(Issuer([17, 17, 17, 17, 17, 17, 17, 17]))"));
    assert!(p.record.events.iter().any(
        |e| e == "DigestPrefix([190, 239])"));
}

#[test]
fn signed_message_decodes() {
    let msg = signed_message();
    let text = armored(Kind::Message, &msg);
    let p = decode(&text, &[]).unwrap();

    assert_eq!(p.record.tags, vec![Tag::OnePassSig, Tag::Literal, Tag::Signature]);
    let expected: Vec<u8> = (0..600u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(p.record.literal, expected);
    assert!(p.record.events.iter().any(
        |e| e.starts_with("Literal { format: Binary, filename: [], date: 0")));
}

#[test]
fn encrypted_message_decodes() {
    let text = armored(Kind::Message, &encrypted_message());
    let p = decode(&text, &[]).unwrap();

    assert_eq!(p.record.tags, vec![Tag::SKESK, Tag::SEIP]);
    assert_eq!(p.record.encrypted, vec![0x42; 300]);

    // The S2K specifier is enough to derive the key.
    let (sym_algo, s2k) = p.record.skesk.unwrap();
    assert_eq!(sym_algo, SymmetricAlgorithm::AES128);
    let engine = RustCrypto::default();
    let a = s2k.derive_key(&engine, b"password", sym_algo.key_size().unwrap())
        .unwrap();
    let b = s2k.derive_key(&engine, b"password", 16).unwrap();
    assert_eq!(a.len(), 16);
    assert_eq!(a, b);
    assert!(s2k.derive_key(&engine, b"passw0rd", 16).unwrap() != a);
}

#[test]
fn chunking_does_not_matter() {
    for msg in [public_key_block(), signed_message(), encrypted_message()].iter() {
        let text = armored(Kind::Message, msg);
        let whole = decode(&text, &[]).unwrap();
        for _ in 0..32 {
            let sizes = random_sizes(text.len());
            let chunked = decode(&text, &sizes).unwrap();
            assert_eq!(whole.record.events, chunked.record.events,
                       "chunk sizes: {:?}", sizes);
            assert_eq!(whole.checksums, chunked.checksums);
        }
    }
}

#[test]
fn unarmored_chunking() {
    let msg = signed_message();
    let mut whole = Record::default();
    let mut p = MessageParser::new();
    p.push(&msg, &mut whole).unwrap();
    p.done(&mut whole).unwrap();

    let mut chunked = Record::default();
    let mut p = MessageParser::new();
    for b in msg.iter() {
        p.push(&[*b], &mut chunked).unwrap();
    }
    p.done(&mut chunked).unwrap();
    assert_eq!(whole.events, chunked.events);
    assert_eq!(whole.literal, chunked.literal);
}

#[test]
fn corrupt_checksum() {
    let mut text = armored(Kind::Message, &signed_message());
    let at = text.windows(3).position(|w| w == b"\r\n=").unwrap() + 3;
    text[at] = if text[at] == b'A' { b'B' } else { b'A' };

    let e = decode(&text, &[]).err().unwrap();
    assert!(matches!(e.downcast_ref::<Error>(),
                     Some(Error::ChecksumMismatch { .. })));
}

#[test]
fn truncated_armor() {
    let text = armored(Kind::Message, &signed_message());
    let end = text.windows(8).position(|w| w == b"-----END").unwrap();
    let e = decode(&text[..end], &[]).err().unwrap();
    assert_eq!(e.downcast_ref::<Error>(), Some(&Error::IncompleteMessage));
}

#[test]
fn bad_packet_in_armor() {
    // A packet tag octet without the high bit.
    let text = armored(Kind::Message, b"\x3fjunk");
    let e = decode(&text, &[]).err().unwrap();
    assert_eq!(e.downcast_ref::<Error>(), Some(&Error::BadPacketTag(0x3f)));
}
