//! 분류기 — 원시 디스크립터를 정규화된 레코드로 변환
//!
//! [`classify`]는 순수 전함수입니다. 어떤 입력이든 레코드를 만들며
//! 실패하지 않습니다. 변조된 패킷 하나가 인제스트 루프를 멈추게
//! 해서는 안 되기 때문입니다.

use std::time::SystemTime;

use packetlens_core::types::{PacketRecord, Protocol};

use crate::source::RawPacket;

/// 디스크립터를 분류하여 레코드를 생성합니다.
///
/// - 네트워크 계층 헤더 없음: 주소 `None`, 프로토콜 `Unknown`
/// - 네트워크 계층은 있으나 인식된 전송 계층 없음: `Other`
/// - 전송 계층 우선순위는 TCP > UDP > ICMP로 고정되어 있습니다.
///   정상 패킷은 하나만 표시하므로 이 순서는 변조된 디스크립터가
///   둘 이상을 표시한 경우의 tie-break 정의입니다.
///
/// `size_bytes`는 헤더 존재 여부와 무관하게 항상 디스크립터가
/// 보고한 전체 길이입니다.
pub fn classify(raw: &RawPacket, sequence: u64, captured_at: SystemTime) -> PacketRecord {
    let (src_addr, dst_addr, protocol) = match raw.network {
        None => (None, None, Protocol::Unknown),
        Some(net) => {
            let protocol = if raw.transport.tcp {
                Protocol::Tcp
            } else if raw.transport.udp {
                Protocol::Udp
            } else if raw.transport.icmp {
                Protocol::Icmp
            } else {
                Protocol::Other
            };
            (Some(net.src), Some(net.dst), protocol)
        }
    };

    PacketRecord {
        sequence,
        captured_at,
        src_addr,
        dst_addr,
        protocol,
        size_bytes: raw.len,
    }
}
