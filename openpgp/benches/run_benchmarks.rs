use criterion::{
    black_box, criterion_group, criterion_main, Criterion, Throughput,
};

use openpgp_stream::Result;
use openpgp_stream::armor::{self, Event, EventSink, Kind};
use openpgp_stream::parse::{MessageParser, PacketEvent, PacketSink};

/// Counts the octets of literal data.
#[derive(Default)]
struct Count(usize);

impl PacketSink for Count {
    fn packet(&mut self, event: PacketEvent) -> Result<()> {
        if let PacketEvent::LiteralData(d) = event {
            self.0 += d.len();
        }
        Ok(())
    }
}

impl EventSink for Count {
    fn event(&mut self, event: Event) -> Result<()> {
        if let Event::Data(d) = event {
            self.0 += d.len();
        }
        Ok(())
    }
}

/// A literal data packet of `len` octets, using partial body lengths
/// of 8 KiB.
fn literal_message(len: usize) -> Vec<u8> {
    let mut body = b"b\x00\x00\x00\x00\x00".to_vec();
    body.extend((0..len).map(|i| i as u8));

    let mut msg = vec![0xcb];
    let mut rest = &body[..];
    while rest.len() > 8192 {
        msg.push(0xe0 + 13);
        msg.extend_from_slice(&rest[..8192]);
        rest = &rest[8192..];
    }
    msg.push(0xff);
    msg.extend_from_slice(&(rest.len() as u32).to_be_bytes());
    msg.extend_from_slice(rest);
    msg
}

fn bench_parse(c: &mut Criterion) {
    let mut g = c.benchmark_group("parse");

    for &size in &[1024 * 1024, 10 * 1024 * 1024] {
        let msg = literal_message(size);
        g.throughput(Throughput::Bytes(msg.len() as u64));
        g.bench_function(format!("literal_{}k", size / 1024), |b| {
            b.iter(|| {
                let mut count = Count::default();
                let mut p = MessageParser::new();
                for chunk in msg.chunks(4096) {
                    p.push(chunk, &mut count).unwrap();
                }
                p.done(&mut count).unwrap();
                black_box(count.0)
            });
        });
    }

    g.finish();
}

fn bench_armor(c: &mut Criterion) {
    let mut g = c.benchmark_group("armor");
    let data = literal_message(1024 * 1024);

    g.throughput(Throughput::Bytes(data.len() as u64));
    g.bench_function("encode_1024k", |b| {
        b.iter(|| {
            let mut w = armor::Encoder::new(Vec::new(), Kind::Message.name())
                .unwrap();
            w.push(&data).unwrap();
            black_box(w.finalize().unwrap())
        });
    });

    let mut w = armor::Encoder::new(Vec::new(), Kind::Message.name()).unwrap();
    w.push(&data).unwrap();
    let text = w.finalize().unwrap();

    g.throughput(Throughput::Bytes(text.len() as u64));
    g.bench_function("decode_1024k", |b| {
        b.iter(|| {
            let mut count = Count::default();
            let mut d = armor::Decoder::new();
            for chunk in text.chunks(4096) {
                d.push(chunk, &mut count).unwrap();
            }
            d.done().unwrap();
            black_box(count.0)
        });
    });

    g.finish();
}

criterion_group!(benches, bench_parse, bench_armor);
criterion_main!(benches);
