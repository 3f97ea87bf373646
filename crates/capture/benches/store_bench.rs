//! 집계 스토어 벤치마크
//!
//! 레코드 집계, 스냅샷 생성, 보고서 뷰 변환 성능을 측정합니다.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use packetlens_capture::{AggregateStore, SnapshotContext, SnapshotExporter};
use packetlens_core::types::{PacketRecord, Protocol};
use std::time::{Duration, SystemTime};

fn make_record(sequence: u64) -> PacketRecord {
    let protocol = match sequence % 5 {
        0 => Protocol::Tcp,
        1 => Protocol::Udp,
        2 => Protocol::Icmp,
        3 => Protocol::Other,
        _ => Protocol::Unknown,
    };
    let src = if protocol == Protocol::Unknown {
        None
    } else {
        Some(format!("10.0.{}.{}", sequence % 4, sequence % 16).parse().unwrap())
    };
    PacketRecord {
        sequence,
        captured_at: SystemTime::UNIX_EPOCH
            + Duration::from_secs(1_700_000_000)
            + Duration::from_millis(sequence * 137),
        src_addr: src,
        dst_addr: src.map(|_| "8.8.8.8".parse().unwrap()),
        protocol,
        size_bytes: 40 + (sequence * 97) % 1460,
    }
}

fn filled_store(count: u64) -> AggregateStore {
    let mut store = AggregateStore::new();
    for sequence in 1..=count {
        store.update(make_record(sequence));
    }
    store
}

fn ctx() -> SnapshotContext {
    SnapshotContext {
        session_id: "bench-session".to_owned(),
        session_end: None,
        reason: None,
        failure: None,
        histogram_bins: 15,
    }
}

fn bench_store_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_update");

    group.throughput(Throughput::Elements(100));
    group.bench_function("update_100_records", |b| {
        b.iter(|| {
            let mut store = AggregateStore::new();
            for sequence in 1..=100 {
                store.update(black_box(make_record(sequence)));
            }
            store
        })
    });

    group.throughput(Throughput::Elements(1000));
    group.bench_function("update_1000_records", |b| {
        b.iter(|| {
            let mut store = AggregateStore::new();
            for sequence in 1..=1000 {
                store.update(black_box(make_record(sequence)));
            }
            store
        })
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let small = filled_store(100);
    let large = filled_store(1000);
    let context = ctx();

    let mut group = c.benchmark_group("store_snapshot");
    group.throughput(Throughput::Elements(1));

    group.bench_function("snapshot_100_records", |b| {
        b.iter(|| black_box(&small).snapshot(black_box(&context)))
    });

    group.bench_function("snapshot_1000_records", |b| {
        b.iter(|| black_box(&large).snapshot(black_box(&context)))
    });

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let snapshot = filled_store(1000).snapshot(&ctx());
    let exporter = SnapshotExporter::default();

    let mut group = c.benchmark_group("snapshot_export");
    group.throughput(Throughput::Elements(1));

    group.bench_function("export_1000_records", |b| {
        b.iter(|| exporter.export(black_box(&snapshot)))
    });

    group.bench_function("export_to_json", |b| {
        let view = exporter.export(&snapshot);
        b.iter(|| serde_json::to_string(black_box(&view)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_store_update, bench_snapshot, bench_export);
criterion_main!(benches);
