//! 패킷 소스 추상화 — 원시 디스크립터와 `PacketSource` trait
//!
//! 캡처 기반(libpcap, eBPF 등)은 이 크레이트의 범위 밖입니다.
//! 대신 [`RawPacket`]이라는 불투명한 디스크립터와 [`PacketSource`]
//! trait을 경계로 두어, 어떤 캡처 어댑터든 디스크립터만 생산하면
//! 엔진에 연결할 수 있습니다.
//!
//! [`ReplaySource`]는 준비된 디스크립터 목록을 재생하는 기본 구현으로,
//! 테스트와 CLI의 트레이스 재생 모드에서 사용됩니다.

use std::collections::VecDeque;
use std::net::IpAddr;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

/// 네트워크 계층 헤더 (출발지/목적지 주소)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHeader {
    /// 출발지 주소
    pub src: IpAddr,
    /// 목적지 주소
    pub dst: IpAddr,
}

/// 전송 계층 헤더 존재 플래그
///
/// 정상적인 패킷은 최대 하나만 참이지만, 변조된 입력은 둘 이상을
/// 표시할 수 있습니다. 그 경우의 해석(우선순위)은 분류기가 정의합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportFlags {
    /// TCP 헤더 존재
    pub tcp: bool,
    /// UDP 헤더 존재
    pub udp: bool,
    /// ICMP 헤더 존재
    pub icmp: bool,
}

impl TransportFlags {
    /// 인식된 전송 계층 헤더가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        !(self.tcp || self.udp || self.icmp)
    }
}

/// 원시 패킷 디스크립터
///
/// 캡처 기반이 전달하는 패킷 하나의 불투명한 표현입니다.
/// `len`은 관측된 전체 길이로, 저장된 페이로드 길이와 무관하게
/// 항상 이 값이 레코드의 `size_bytes`가 됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPacket {
    /// 관측된 패킷 전체 길이 (바이트)
    pub len: u64,
    /// 네트워크 계층 헤더 (없을 수 있음)
    #[serde(default)]
    pub network: Option<NetworkHeader>,
    /// 전송 계층 헤더 플래그
    #[serde(default)]
    pub transport: TransportFlags,
    /// 원시 페이로드 (직렬화 제외, 분류에는 사용되지 않음)
    #[serde(skip)]
    pub payload: Bytes,
}

impl RawPacket {
    /// 헤더 없는 디스크립터를 생성합니다.
    pub fn new(len: u64) -> Self {
        Self {
            len,
            network: None,
            transport: TransportFlags::default(),
            payload: Bytes::new(),
        }
    }

    /// 네트워크 계층 헤더를 부여합니다.
    pub fn with_network(mut self, src: IpAddr, dst: IpAddr) -> Self {
        self.network = Some(NetworkHeader { src, dst });
        self
    }

    /// TCP 헤더 플래그를 설정합니다.
    pub fn with_tcp(mut self) -> Self {
        self.transport.tcp = true;
        self
    }

    /// UDP 헤더 플래그를 설정합니다.
    pub fn with_udp(mut self) -> Self {
        self.transport.udp = true;
        self
    }

    /// ICMP 헤더 플래그를 설정합니다.
    pub fn with_icmp(mut self) -> Self {
        self.transport.icmp = true;
        self
    }

    /// 원시 페이로드를 첨부합니다.
    pub fn with_payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    /// 네트워크 계층 헤더 존재 여부를 확인합니다.
    pub fn has_network_layer(&self) -> bool {
        self.network.is_some()
    }
}

/// 패킷 소스 trait
///
/// 캡처 기반 어댑터가 구현합니다. `next_packet`은 엔진의 유일한
/// 중단 지점이며, `Ok(None)`은 스트림 종료를 의미합니다.
pub trait PacketSource: Send {
    /// 소스 이름 (로깅에 사용)
    fn name(&self) -> &str;

    /// 다음 패킷을 가져옵니다.
    ///
    /// - `Ok(Some(raw))`: 패킷 하나
    /// - `Ok(None)`: 스트림 종료
    /// - `Err(_)`: 치명적 소스 실패 — 세션이 종료됩니다
    fn next_packet(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<RawPacket>, CaptureError>> + Send;
}

/// 준비된 디스크립터 목록을 재생하는 소스
///
/// 테스트와 트레이스 재생 모드에서 사용합니다. 패킷 간 지연과
/// 특정 시점의 실패 주입을 지원합니다.
#[derive(Debug)]
pub struct ReplaySource {
    queue: VecDeque<RawPacket>,
    delay: Option<Duration>,
    /// `(n, reason)`: n개 방출 후 다음 pull에서 실패
    fail_after: Option<(usize, String)>,
    emitted: usize,
}

impl ReplaySource {
    /// 디스크립터 목록으로 소스를 생성합니다.
    pub fn new(packets: impl IntoIterator<Item = RawPacket>) -> Self {
        Self {
            queue: packets.into_iter().collect(),
            delay: None,
            fail_after: None,
            emitted: 0,
        }
    }

    /// 패킷 간 지연을 설정합니다.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `emitted`개 방출 후 다음 pull이 실패하도록 주입합니다.
    pub fn fail_after(mut self, emitted: usize, reason: impl Into<String>) -> Self {
        self.fail_after = Some((emitted, reason.into()));
        self
    }

    /// 남은 디스크립터 수를 반환합니다.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl PacketSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn next_packet(&mut self) -> Result<Option<RawPacket>, CaptureError> {
        if let Some((after, reason)) = &self.fail_after
            && self.emitted >= *after
        {
            return Err(CaptureError::Source {
                source_name: "replay".to_owned(),
                reason: reason.clone(),
            });
        }

        let Some(packet) = self.queue.pop_front() else {
            return Ok(None);
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.emitted += 1;
        Ok(Some(packet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp_packet(len: u64) -> RawPacket {
        RawPacket::new(len)
            .with_network("10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap())
            .with_tcp()
    }

    #[test]
    fn raw_packet_without_headers() {
        let raw = RawPacket::new(64);
        assert!(!raw.has_network_layer());
        assert!(raw.transport.is_empty());
        assert_eq!(raw.len, 64);
    }

    #[test]
    fn raw_packet_builder_sets_flags() {
        let raw = tcp_packet(100);
        assert!(raw.has_network_layer());
        assert!(raw.transport.tcp);
        assert!(!raw.transport.udp);
    }

    #[test]
    fn raw_packet_len_independent_of_payload() {
        let raw = RawPacket::new(1500).with_payload(Bytes::from_static(b"truncated"));
        assert_eq!(raw.len, 1500);
        assert_eq!(raw.payload.len(), 9);
    }

    #[test]
    fn raw_packet_deserializes_from_trace_json() {
        // JSONL 트레이스 한 줄의 형태
        let line = r#"{"len":64,"network":{"src":"10.0.0.1","dst":"8.8.8.8"},"transport":{"tcp":true}}"#;
        let raw: RawPacket = serde_json::from_str(line).unwrap();
        assert_eq!(raw.len, 64);
        assert!(raw.transport.tcp);
        assert!(!raw.transport.icmp);
        assert!(raw.has_network_layer());
    }

    #[test]
    fn raw_packet_deserializes_without_optional_fields() {
        let raw: RawPacket = serde_json::from_str(r#"{"len":42}"#).unwrap();
        assert_eq!(raw.len, 42);
        assert!(!raw.has_network_layer());
        assert!(raw.transport.is_empty());
    }

    #[tokio::test]
    async fn replay_source_yields_in_order_then_ends() {
        let mut source = ReplaySource::new([tcp_packet(10), tcp_packet(20)]);
        assert_eq!(source.remaining(), 2);

        let first = source.next_packet().await.unwrap().unwrap();
        assert_eq!(first.len, 10);
        let second = source.next_packet().await.unwrap().unwrap();
        assert_eq!(second.len, 20);
        assert!(source.next_packet().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replay_source_injected_failure() {
        let mut source =
            ReplaySource::new([tcp_packet(10), tcp_packet(20), tcp_packet(30)]).fail_after(2, "interface down");

        assert!(source.next_packet().await.is_ok());
        assert!(source.next_packet().await.is_ok());
        let err = source.next_packet().await.unwrap_err();
        assert!(err.to_string().contains("interface down"));
    }

    #[tokio::test]
    async fn replay_source_empty_is_end_of_stream() {
        let mut source = ReplaySource::new([]);
        assert!(source.next_packet().await.unwrap().is_none());
    }
}
