use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use transmission_remove::services::{parse_torrent_info, should_remove};

fn info_block() -> Vec<String> {
    [
        "NAME",
        "  Id: 149",
        "  Name: Some.Linux.Distro.x86_64.iso",
        "  Hash: fc298a353253232532541e3ba5adbec712f",
        "  Magnet: magnet:?xt=urn:btih:fc298a353253232532541e3ba5adbec712f",
        "",
        "TRANSFER",
        "  State: Seeding",
        "  Location: /downloads/complete",
        "  Percent Done: 100%",
        "  ETA: 0 seconds (0 seconds)",
        "  Download Speed: 0 kB/s",
        "  Upload Speed: 12 kB/s",
        "  Have: 4.38 GB (4.38 GB verified)",
        "  Availability: 100%",
        "  Total size: 4.38 GB (4.38 GB wanted)",
        "  Downloaded: 4.40 GB",
        "  Uploaded: 9.12 GB",
        "  Ratio: 2.07",
        "  Corrupt DL: None",
        "  Peers: connected to 3, uploading to 1, downloading from 0",
        "",
        "LIMITS & BANDWIDTH",
        "  Download Limit: Unlimited",
        "  Upload Limit: Unlimited",
        "  Ratio Limit: Default",
        "  Honors Session Limits: Yes",
        "  Peer limit: 50",
        "  Bandwidth Priority: Normal",
    ]
    .iter()
    .map(|line| line.to_string())
    .collect()
}

fn bench_parse_info(c: &mut Criterion) {
    let lines = info_block();
    c.bench_function("parse_torrent_info", |b| {
        b.iter(|| parse_torrent_info(black_box(&lines)))
    });
}

fn bench_parse_and_decide(c: &mut Criterion) {
    let lines = info_block();
    c.bench_function("parse_and_decide", |b| {
        b.iter(|| {
            let record = parse_torrent_info(black_box(&lines))
                .ok()
                .flatten();
            record.map(|r| should_remove(&r, black_box(2.0)))
        })
    });
}

criterion_group!(benches, bench_parse_info, bench_parse_and_decide);
criterion_main!(benches);
