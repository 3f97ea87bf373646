//! 스냅샷과 보고서 뷰
//!
//! [`Snapshot`]은 스토어 상태를 동결한 불변 사본이고,
//! [`SnapshotExporter`]는 그것을 보고서용 [`ExportView`]로
//! 변환합니다. 정렬과 백분율 계산은 모두 여기서 일어나며,
//! 같은 스냅샷에서는 항상 같은 뷰가 나옵니다.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::time::SystemTime;

use packetlens_core::types::{CaptureReason, PacketRecord, Protocol};
use serde::{Deserialize, Serialize};

/// 스냅샷 생성에 필요한 세션 측 컨텍스트
///
/// 스토어는 집계값만 알고 있으므로, 세션 식별자와 종료 사유 같은
/// 메타데이터는 세션이 이 구조체로 전달합니다.
#[derive(Debug, Clone)]
pub struct SnapshotContext {
    /// 세션 식별자
    pub session_id: String,
    /// 세션 종료 시각 (진행 중 스냅샷이면 None)
    pub session_end: Option<SystemTime>,
    /// 종료 사유 (진행 중 스냅샷이면 None)
    pub reason: Option<CaptureReason>,
    /// 소스 실패 사유 (`reason`이 `Error`일 때만 Some)
    pub failure: Option<String>,
    /// 히스토그램 버킷 수
    pub histogram_bins: usize,
}

/// 크기 히스토그램 버킷 (양끝 포함 범위)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBucket {
    /// 하한 (바이트, 포함)
    pub lower: u64,
    /// 상한 (바이트, 포함)
    pub upper: u64,
    /// 버킷에 속한 레코드 수
    pub count: u64,
}

/// 동결된 세션 집계 스냅샷
///
/// 생성 이후 스토어에 레코드가 더 들어와도 변하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// 세션 식별자
    pub session_id: String,
    /// 세션 시작 시각 (첫 레코드 기준, 레코드가 없으면 None)
    pub session_start: Option<SystemTime>,
    /// 세션 종료 시각
    pub session_end: Option<SystemTime>,
    /// 종료 사유
    pub reason: Option<CaptureReason>,
    /// 소스 실패 사유
    pub failure: Option<String>,
    /// 전체 패킷 수
    pub total_count: u64,
    /// 전체 바이트
    pub total_bytes: u64,
    /// 프로토콜별 패킷 수
    pub protocol_counts: HashMap<Protocol, u64>,
    /// 출발지 주소별 패킷 수 (주소 없는 레코드 제외)
    pub source_counts: HashMap<IpAddr, u64>,
    /// 초당 패킷 수 (세션 시작 이후 경과 초 기준)
    pub time_series: BTreeMap<u64, u64>,
    /// 크기 분포 히스토그램
    pub histogram: Vec<SizeBucket>,
    /// 집계된 레코드 전체
    pub records: Vec<PacketRecord>,
}

impl Snapshot {
    /// 세션 경과 시간(초)을 반환합니다. 시작/종료 시각이 없으면 None입니다.
    pub fn duration_secs(&self) -> Option<f64> {
        let start = self.session_start?;
        let end = self.session_end?;
        Some(end.duration_since(start).unwrap_or_default().as_secs_f64())
    }
}

/// 프로토콜 비중 한 줄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolShare {
    /// 프로토콜
    pub protocol: Protocol,
    /// 패킷 수
    pub count: u64,
    /// 전체 대비 백분율 (전체가 0이면 0.0)
    pub percent: f64,
}

/// 상위 출발지 한 줄
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkerEntry {
    /// 출발지 주소 표기
    pub address: String,
    /// 패킷 수
    pub count: u64,
}

/// 시계열 한 점
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    /// 세션 시작 이후 경과 초
    pub second: u64,
    /// 해당 초의 패킷 수
    pub count: u64,
}

/// 보고서용 파생 뷰
///
/// 스냅샷의 맵들을 결정적으로 정렬된 목록으로 펼친 형태입니다.
/// 텍스트 보고서와 JSON 출력 모두 이 뷰에서 렌더링됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportView {
    /// 세션 식별자
    pub session_id: String,
    /// 종료 사유
    pub reason: Option<CaptureReason>,
    /// 소스 실패 사유
    pub failure: Option<String>,
    /// 전체 패킷 수
    pub total_count: u64,
    /// 전체 바이트
    pub total_bytes: u64,
    /// 세션 경과 시간 (초)
    pub duration_secs: Option<f64>,
    /// 프로토콜 비중 (count 내림차순, 동률이면 표기 오름차순)
    pub protocols: Vec<ProtocolShare>,
    /// 상위 출발지 (count 내림차순, 동률이면 주소 표기 오름차순)
    pub top_sources: Vec<TalkerEntry>,
    /// 크기 분포 히스토그램
    pub histogram: Vec<SizeBucket>,
    /// 초당 패킷 수 (경과 초 오름차순)
    pub time_series: Vec<TimePoint>,
}

/// 스냅샷을 [`ExportView`]로 변환하는 내보내기 도구
#[derive(Debug, Clone)]
pub struct SnapshotExporter {
    top_sources: usize,
}

impl SnapshotExporter {
    /// 상위 출발지 개수를 지정하여 생성합니다.
    pub fn new(top_sources: usize) -> Self {
        Self { top_sources }
    }

    /// 스냅샷을 보고서 뷰로 변환합니다.
    ///
    /// 정렬 규칙이 완전 순서이므로 결과는 결정적입니다.
    pub fn export(&self, snapshot: &Snapshot) -> ExportView {
        let total = snapshot.total_count;

        let mut protocols: Vec<ProtocolShare> = snapshot
            .protocol_counts
            .iter()
            .map(|(protocol, count)| ProtocolShare {
                protocol: *protocol,
                count: *count,
                percent: if total == 0 {
                    0.0
                } else {
                    *count as f64 / total as f64 * 100.0
                },
            })
            .collect();
        protocols.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.protocol.as_str().cmp(b.protocol.as_str()))
        });

        let mut top_sources: Vec<TalkerEntry> = snapshot
            .source_counts
            .iter()
            .map(|(addr, count)| TalkerEntry {
                address: addr.to_string(),
                count: *count,
            })
            .collect();
        top_sources.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.address.cmp(&b.address)));
        top_sources.truncate(self.top_sources);

        let time_series = snapshot
            .time_series
            .iter()
            .map(|(second, count)| TimePoint {
                second: *second,
                count: *count,
            })
            .collect();

        ExportView {
            session_id: snapshot.session_id.clone(),
            reason: snapshot.reason,
            failure: snapshot.failure.clone(),
            total_count: total,
            total_bytes: snapshot.total_bytes,
            duration_secs: snapshot.duration_secs(),
            protocols,
            top_sources,
            histogram: snapshot.histogram.clone(),
            time_series,
        }
    }
}

impl Default for SnapshotExporter {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot_with(
        protocol_counts: &[(Protocol, u64)],
        source_counts: &[(&str, u64)],
    ) -> Snapshot {
        let total: u64 = protocol_counts.iter().map(|(_, c)| c).sum();
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        Snapshot {
            session_id: "test-session".to_owned(),
            session_start: Some(start),
            session_end: Some(start + Duration::from_secs(12)),
            reason: Some(CaptureReason::CountReached),
            failure: None,
            total_count: total,
            total_bytes: total * 100,
            protocol_counts: protocol_counts.iter().copied().collect(),
            source_counts: source_counts
                .iter()
                .map(|(addr, count)| (addr.parse().unwrap(), *count))
                .collect(),
            time_series: BTreeMap::from([(0, 2), (3, 1)]),
            histogram: vec![SizeBucket { lower: 40, upper: 139, count: total }],
            records: Vec::new(),
        }
    }

    #[test]
    fn export_sorts_protocols_by_count_then_name() {
        let snapshot = snapshot_with(
            &[(Protocol::Udp, 3), (Protocol::Tcp, 5), (Protocol::Icmp, 3)],
            &[],
        );
        let view = SnapshotExporter::default().export(&snapshot);

        let order: Vec<Protocol> = view.protocols.iter().map(|p| p.protocol).collect();
        // 동률인 UDP/ICMP는 표기 오름차순 (ICMP < UDP)
        assert_eq!(order, vec![Protocol::Tcp, Protocol::Icmp, Protocol::Udp]);
    }

    #[test]
    fn export_percentages_sum_to_one_hundred() {
        let snapshot = snapshot_with(&[(Protocol::Tcp, 2), (Protocol::Udp, 1)], &[]);
        let view = SnapshotExporter::default().export(&snapshot);

        let sum: f64 = view.protocols.iter().map(|p| p.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((view.protocols[0].percent - 66.666_666_666_666_67).abs() < 1e-9);
        assert!((view.protocols[1].percent - 33.333_333_333_333_33).abs() < 1e-9);
    }

    #[test]
    fn export_empty_snapshot_has_zero_percentages() {
        let snapshot = snapshot_with(&[], &[]);
        let view = SnapshotExporter::default().export(&snapshot);
        assert_eq!(view.total_count, 0);
        assert!(view.protocols.is_empty());
        assert!(view.top_sources.is_empty());
    }

    #[test]
    fn export_top_sources_truncated_and_ordered() {
        let snapshot = snapshot_with(
            &[(Protocol::Tcp, 10)],
            &[
                ("10.0.0.1", 4),
                ("10.0.0.2", 4),
                ("10.0.0.3", 1),
                ("10.0.0.4", 7),
            ],
        );
        let view = SnapshotExporter::new(3).export(&snapshot);

        let order: Vec<&str> = view.top_sources.iter().map(|t| t.address.as_str()).collect();
        // 동률인 .1/.2는 주소 표기 오름차순
        assert_eq!(order, vec!["10.0.0.4", "10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn export_is_deterministic() {
        let snapshot = snapshot_with(
            &[(Protocol::Tcp, 5), (Protocol::Udp, 5), (Protocol::Icmp, 5)],
            &[("10.0.0.1", 5), ("10.0.0.2", 5), ("10.0.0.3", 5)],
        );
        let exporter = SnapshotExporter::default();

        let first = serde_json::to_string(&exporter.export(&snapshot)).unwrap();
        let second = serde_json::to_string(&exporter.export(&snapshot)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn export_carries_time_series_in_order() {
        let snapshot = snapshot_with(&[(Protocol::Tcp, 3)], &[]);
        let view = SnapshotExporter::default().export(&snapshot);
        assert_eq!(
            view.time_series,
            vec![TimePoint { second: 0, count: 2 }, TimePoint { second: 3, count: 1 }]
        );
    }

    #[test]
    fn duration_from_session_bounds() {
        let snapshot = snapshot_with(&[(Protocol::Tcp, 1)], &[]);
        assert_eq!(snapshot.duration_secs(), Some(12.0));

        let mut open = snapshot;
        open.session_end = None;
        assert!(open.duration_secs().is_none());
    }
}
