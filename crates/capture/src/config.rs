//! 세션 설정 — 정지 조건과 파생 통계 파라미터
//!
//! 원본 동작의 세 가지 참조 프로파일(simple/advanced/visual)을
//! 명명된 생성자로 제공합니다. 값은 모두 설정이며 상수가 아닙니다.

use std::time::Duration;

use packetlens_core::config::CaptureConfig;

use crate::error::CaptureError;

/// 캡처 세션 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// 세션당 최대 패킷 수
    pub max_packets: u64,
    /// 첫 pull 이후 최대 경과 시간
    pub max_duration: Duration,
    /// 크기 히스토그램 버킷 수
    pub histogram_bins: usize,
    /// 상위 출발지 표시 개수
    pub top_sources: usize,
    /// 진행 알림 채널 용량
    pub progress_channel_capacity: usize,
}

impl SessionConfig {
    /// simple 프로파일: 10 패킷 / 20초
    pub fn simple() -> Self {
        Self {
            max_packets: 10,
            max_duration: Duration::from_secs(20),
            ..Self::default()
        }
    }

    /// advanced 프로파일: 20 패킷 / 30초 (기본값)
    pub fn advanced() -> Self {
        Self::default()
    }

    /// visual 프로파일: 30 패킷 / 40초
    pub fn visual() -> Self {
        Self {
            max_packets: 30,
            max_duration: Duration::from_secs(40),
            ..Self::default()
        }
    }

    /// 공용 설정의 `[capture]` 섹션에서 세션 설정을 만듭니다.
    pub fn from_core(config: &CaptureConfig) -> Self {
        Self {
            max_packets: config.max_packets,
            max_duration: Duration::from_secs(config.max_duration_secs),
            histogram_bins: config.histogram_bins,
            top_sources: config.top_sources,
            progress_channel_capacity: config.progress_channel_capacity,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.max_packets == 0 {
            return Err(CaptureError::Config {
                field: "max_packets".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }
        if self.max_duration.is_zero() {
            return Err(CaptureError::Config {
                field: "max_duration".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }
        if self.histogram_bins == 0 {
            return Err(CaptureError::Config {
                field: "histogram_bins".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }
        if self.top_sources == 0 {
            return Err(CaptureError::Config {
                field: "top_sources".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }
        if self.progress_channel_capacity == 0 {
            return Err(CaptureError::Config {
                field: "progress_channel_capacity".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_packets: 20,
            max_duration: Duration::from_secs(30),
            histogram_bins: 15,
            top_sources: 6,
            progress_channel_capacity: 256,
        }
    }
}
