//! 캡처 엔진 에러 타입
//!
//! [`CaptureError`]는 캡처 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<CaptureError> for PacketlensError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use packetlens_core::error::{ConfigError, PacketlensError, SessionError};

/// 캡처 엔진 도메인 에러
///
/// 패킷 하나의 분류 실패는 에러가 아니라는 점에 주의하세요.
/// 분류기는 전함수(total function)이며, 여기 정의된 에러는 모두
/// 캡처 기반(소스/설정) 수준의 실패입니다.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// 패킷 소스 실패 (인터페이스 불가, 권한 거부 등)
    #[error("source error: {source_name}: {reason}")]
    Source {
        /// 소스 이름
        source_name: String,
        /// 실패 사유
        reason: String,
    },

    /// 세션 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<CaptureError> for PacketlensError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Config { field, reason } => {
                PacketlensError::Config(ConfigError::InvalidValue { field, reason })
            }
            source @ CaptureError::Source { .. } => {
                PacketlensError::Session(SessionError::Source {
                    reason: source.to_string(),
                })
            }
        }
    }
}
