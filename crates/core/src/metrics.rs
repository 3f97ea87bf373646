//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `packetlens_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use packetlens_core::metrics as m;
//! use metrics::counter;
//!
//! counter!(m::CAPTURE_PACKETS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 프로토콜 레이블 키 (TCP, UDP, ICMP, Other, Unknown)
pub const LABEL_PROTOCOL: &str = "protocol";

/// 세션 종료 사유 레이블 키 (count_reached, timeout, ...)
pub const LABEL_REASON: &str = "reason";

// ─── Capture 메트릭 ────────────────────────────────────────────────

/// Capture: 인제스트된 전체 패킷 수 (counter)
pub const CAPTURE_PACKETS_TOTAL: &str = "packetlens_capture_packets_total";

/// Capture: 관측된 전체 바이트 수 (counter)
pub const CAPTURE_BYTES_TOTAL: &str = "packetlens_capture_bytes_total";

/// Capture: 프로토콜별 패킷 수 (counter, label: protocol)
pub const CAPTURE_PROTOCOL_PACKETS_TOTAL: &str = "packetlens_capture_protocol_packets_total";

/// Capture: 종료된 세션 수 (counter, label: reason)
pub const CAPTURE_SESSIONS_TOTAL: &str = "packetlens_capture_sessions_total";

/// Capture: 드롭된 진행 알림 수 (counter)
pub const CAPTURE_PROGRESS_DROPPED_TOTAL: &str = "packetlens_capture_progress_dropped_total";

/// Capture: 생성된 스냅샷 수 (counter)
pub const CAPTURE_SNAPSHOTS_TOTAL: &str = "packetlens_capture_snapshots_total";

/// Capture: 현재 스토어에 누적된 레코드 수 (gauge)
pub const CAPTURE_RECORDS_IN_STORE: &str = "packetlens_capture_records_in_store";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`를 호출하여
/// Prometheus HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        CAPTURE_PACKETS_TOTAL,
        "Total number of packets ingested across all capture sessions"
    );
    describe_counter!(
        CAPTURE_BYTES_TOTAL,
        "Total observed packet bytes across all capture sessions"
    );
    describe_counter!(
        CAPTURE_PROTOCOL_PACKETS_TOTAL,
        "Packets ingested per protocol (TCP, UDP, ICMP, Other, Unknown)"
    );
    describe_counter!(
        CAPTURE_SESSIONS_TOTAL,
        "Capture sessions finished, labeled by stop reason"
    );
    describe_counter!(
        CAPTURE_PROGRESS_DROPPED_TOTAL,
        "Progress notifications dropped because the channel was full"
    );
    describe_counter!(
        CAPTURE_SNAPSHOTS_TOTAL,
        "Snapshots built from the aggregate store"
    );
    describe_gauge!(
        CAPTURE_RECORDS_IN_STORE,
        "Number of packet records currently held by the aggregate store"
    );
}
