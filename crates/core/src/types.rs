//! 도메인 타입 — 캡처 세션 전역에서 사용되는 공통 타입
//!
//! 분류기가 생성하는 [`PacketRecord`]와 그 구성 요소인 [`Protocol`],
//! 세션 종료 사유인 [`CaptureReason`]을 정의합니다.

use std::fmt;
use std::net::IpAddr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// 전송 계층 프로토콜 분류
///
/// 닫힌 열거형입니다. 네트워크 계층 헤더가 없으면 `Unknown`,
/// 네트워크 계층은 있으나 인식 가능한 전송 계층 헤더가 없으면 `Other`로
/// 분류됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// TCP
    Tcp,
    /// UDP
    Udp,
    /// ICMP
    Icmp,
    /// 네트워크 계층은 있으나 인식되지 않은 전송 계층
    Other,
    /// 네트워크 계층 헤더 없음
    #[default]
    Unknown,
}

impl Protocol {
    /// 모든 변형의 고정 목록 (보고서 정렬 테스트 등에 사용)
    pub const ALL: [Protocol; 5] = [
        Protocol::Tcp,
        Protocol::Udp,
        Protocol::Icmp,
        Protocol::Other,
        Protocol::Unknown,
    ];

    /// 보고서/CSV에 사용되는 표기 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Icmp => "ICMP",
            Self::Other => "Other",
            Self::Unknown => "Unknown",
        }
    }

    /// 문자열에서 프로토콜을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tcp" => Some(Self::Tcp),
            "udp" => Some(Self::Udp),
            "icmp" => Some(Self::Icmp),
            "other" => Some(Self::Other),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 정규화된 패킷 레코드
///
/// 분류기가 원시 패킷 디스크립터에서 생성하는 불변 레코드입니다.
/// `sequence`는 인제스트 시점에 부여되며 한 세션 내에서 1부터
/// 빈틈없이 증가합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// 세션 내 일련번호 (1부터 시작, 단조 증가)
    pub sequence: u64,
    /// 레코드 생성 시각
    pub captured_at: SystemTime,
    /// 출발지 주소 (네트워크 계층 헤더가 없으면 None)
    pub src_addr: Option<IpAddr>,
    /// 목적지 주소 (네트워크 계층 헤더가 없으면 None)
    pub dst_addr: Option<IpAddr>,
    /// 프로토콜 분류
    pub protocol: Protocol,
    /// 관측된 패킷 전체 길이 (바이트)
    pub size_bytes: u64,
}

impl PacketRecord {
    /// 출발지 주소 표기를 반환합니다. 주소가 없으면 `"Unknown"`입니다.
    pub fn src_label(&self) -> String {
        addr_label(self.src_addr)
    }

    /// 목적지 주소 표기를 반환합니다. 주소가 없으면 `"Unknown"`입니다.
    pub fn dst_label(&self) -> String {
        addr_label(self.dst_addr)
    }
}

impl fmt::Display for PacketRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} -> {} | {} | {} bytes",
            self.sequence,
            self.src_label(),
            self.dst_label(),
            self.protocol,
            self.size_bytes,
        )
    }
}

/// 주소 Option을 보고서 표기로 변환합니다.
fn addr_label(addr: Option<IpAddr>) -> String {
    match addr {
        Some(ip) => ip.to_string(),
        None => "Unknown".to_owned(),
    }
}

/// 캡처 세션 종료 사유
///
/// 스냅샷에 기록되어 세션이 어떤 조건으로 끝났는지 나타냅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureReason {
    /// 설정된 최대 패킷 수 도달
    CountReached,
    /// 최대 경과 시간 초과
    Timeout,
    /// 소스가 스트림 종료를 알림
    EndOfStream,
    /// 소스 에러로 세션 종료 (부분 결과는 보존됨)
    Error,
    /// 패킷 사이에서 수동 중단 요청 감지
    ManualStop,
}

impl CaptureReason {
    /// 메트릭 레이블 등에 쓰이는 snake_case 표기를 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CountReached => "count_reached",
            Self::Timeout => "timeout",
            Self::EndOfStream => "end_of_stream",
            Self::Error => "error",
            Self::ManualStop => "manual_stop",
        }
    }
}

impl fmt::Display for CaptureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
