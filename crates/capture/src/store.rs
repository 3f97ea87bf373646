//! 집계 스토어 — 단일 소유자 증분 집계
//!
//! [`AggregateStore`]는 잠금 없이 세션이 단독 소유합니다.
//! 레코드가 들어올 때마다 총계/프로토콜별/출발지별/초당 카운트를
//! 증분 갱신하며, 크기 히스토그램만 스냅샷 시점에 계산합니다.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::time::SystemTime;

use metrics::{counter, gauge};
use packetlens_core::metrics as m;
use packetlens_core::types::{PacketRecord, Protocol};
use tracing::trace;

use crate::snapshot::{SizeBucket, Snapshot, SnapshotContext};

/// 세션 단위 집계 스토어
///
/// 시계열 키는 세션 시작(첫 레코드의 `captured_at`) 이후 경과한
/// 정수 초입니다. 시작 시각은 한 번 설정되면 바뀌지 않습니다.
#[derive(Debug, Default)]
pub struct AggregateStore {
    session_start: Option<SystemTime>,
    total_count: u64,
    total_bytes: u64,
    protocol_counts: HashMap<Protocol, u64>,
    source_counts: HashMap<IpAddr, u64>,
    time_series: BTreeMap<u64, u64>,
    records: Vec<PacketRecord>,
}

impl AggregateStore {
    /// 빈 스토어를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 레코드 하나를 집계에 반영합니다.
    ///
    /// 출발지 주소가 없는 레코드(`Unknown`)는 출발지 카운트에
    /// 포함되지 않습니다. 상위 출발지 목록은 실제 주소만 다룹니다.
    pub fn update(&mut self, record: PacketRecord) {
        let start = *self.session_start.get_or_insert(record.captured_at);

        self.total_count += 1;
        self.total_bytes += record.size_bytes;
        *self.protocol_counts.entry(record.protocol).or_default() += 1;
        if let Some(src) = record.src_addr {
            *self.source_counts.entry(src).or_default() += 1;
        }

        let offset_secs = record
            .captured_at
            .duration_since(start)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        *self.time_series.entry(offset_secs).or_default() += 1;

        counter!(m::CAPTURE_PACKETS_TOTAL).increment(1);
        counter!(m::CAPTURE_BYTES_TOTAL).increment(record.size_bytes);
        counter!(m::CAPTURE_PROTOCOL_PACKETS_TOTAL, m::LABEL_PROTOCOL => record.protocol.as_str())
            .increment(1);

        trace!(sequence = record.sequence, total = self.total_count, "record aggregated");

        self.records.push(record);
        gauge!(m::CAPTURE_RECORDS_IN_STORE).set(self.records.len() as f64);
    }

    /// 현재 상태를 동결한 스냅샷을 생성합니다.
    ///
    /// 스토어는 변경되지 않으며, 같은 상태에서 두 번 호출하면
    /// 동일한 스냅샷이 나옵니다.
    pub fn snapshot(&self, ctx: &SnapshotContext) -> Snapshot {
        counter!(m::CAPTURE_SNAPSHOTS_TOTAL).increment(1);

        Snapshot {
            session_id: ctx.session_id.clone(),
            session_start: self.session_start,
            session_end: ctx.session_end,
            reason: ctx.reason,
            failure: ctx.failure.clone(),
            total_count: self.total_count,
            total_bytes: self.total_bytes,
            protocol_counts: self.protocol_counts.clone(),
            source_counts: self.source_counts.clone(),
            time_series: self.time_series.clone(),
            histogram: build_histogram(&self.records, ctx.histogram_bins),
            records: self.records.clone(),
        }
    }

    /// 지금까지 집계된 레코드 수를 반환합니다.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// 지금까지 관측된 전체 바이트를 반환합니다.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// 세션 시작 시각(첫 레코드의 `captured_at`)을 반환합니다.
    pub fn session_start(&self) -> Option<SystemTime> {
        self.session_start
    }

    /// 집계된 레코드 목록을 반환합니다.
    pub fn records(&self) -> &[PacketRecord] {
        &self.records
    }
}

/// 레코드 크기 분포 히스토그램을 계산합니다.
///
/// 버킷은 `[min, max]` 범위를 동일 너비로 나누며, 너비는
/// 올림으로 계산되어 마지막 버킷이 `max`를 포함합니다.
/// 버킷 수는 최대 `bins`개이며, 관측 범위가 `bins`보다 좁으면
/// 그보다 적어집니다. 레코드가 없으면 빈 벡터를 반환합니다.
fn build_histogram(records: &[PacketRecord], bins: usize) -> Vec<SizeBucket> {
    if records.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = records.iter().map(|r| r.size_bytes).min().unwrap_or(0);
    let max = records.iter().map(|r| r.size_bytes).max().unwrap_or(0);
    let span = max - min + 1;
    let width = span.div_ceil(bins as u64);
    let bucket_count = span.div_ceil(width) as usize;

    let mut buckets: Vec<SizeBucket> = (0..bucket_count)
        .map(|i| {
            let lower = min + i as u64 * width;
            SizeBucket {
                lower,
                upper: lower + width - 1,
                count: 0,
            }
        })
        .collect();

    for record in records {
        let index = ((record.size_bytes - min) / width) as usize;
        buckets[index].count += 1;
    }

    buckets
}
