//! 설정 관리 — packetlens.toml 파싱 및 런타임 설정
//!
//! [`PacketlensConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`PACKETLENS_CAPTURE_MAX_PACKETS=50` 형식)
//! 3. 설정 파일 (`packetlens.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), packetlens_core::error::PacketlensError> {
//! use packetlens_core::config::PacketlensConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = PacketlensConfig::load("packetlens.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = PacketlensConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, PacketlensError};

/// Packetlens 통합 설정
///
/// `packetlens.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacketlensConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 캡처 세션 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 내보내기 설정
    #[serde(default)]
    pub export: ExportConfig,
}

impl PacketlensConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PacketlensError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, PacketlensError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PacketlensError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                PacketlensError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, PacketlensError> {
        toml::from_str(toml_str).map_err(|e| {
            PacketlensError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `PACKETLENS_{SECTION}_{FIELD}`
    /// 예: `PACKETLENS_CAPTURE_MAX_PACKETS=50`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "PACKETLENS_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "PACKETLENS_GENERAL_LOG_FORMAT",
        );

        // Capture
        override_u64(
            &mut self.capture.max_packets,
            "PACKETLENS_CAPTURE_MAX_PACKETS",
        );
        override_u64(
            &mut self.capture.max_duration_secs,
            "PACKETLENS_CAPTURE_MAX_DURATION_SECS",
        );
        override_usize(
            &mut self.capture.histogram_bins,
            "PACKETLENS_CAPTURE_HISTOGRAM_BINS",
        );
        override_usize(
            &mut self.capture.top_sources,
            "PACKETLENS_CAPTURE_TOP_SOURCES",
        );
        override_usize(
            &mut self.capture.progress_channel_capacity,
            "PACKETLENS_CAPTURE_PROGRESS_CHANNEL_CAPACITY",
        );

        // Export
        override_string(&mut self.export.csv_path, "PACKETLENS_EXPORT_CSV_PATH");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PacketlensError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 정지 조건 검증
        if self.capture.max_packets == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.max_packets".to_owned(),
                reason: "must be positive".to_owned(),
            }
            .into());
        }
        if self.capture.max_duration_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.max_duration_secs".to_owned(),
                reason: "must be positive".to_owned(),
            }
            .into());
        }

        // 파생 통계 설정 검증
        if self.capture.histogram_bins == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.histogram_bins".to_owned(),
                reason: "must be positive".to_owned(),
            }
            .into());
        }
        if self.capture.top_sources == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.top_sources".to_owned(),
                reason: "must be positive".to_owned(),
            }
            .into());
        }
        if self.capture.progress_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.progress_channel_capacity".to_owned(),
                reason: "must be positive".to_owned(),
            }
            .into());
        }

        if self.export.csv_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export.csv_path".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 캡처 세션 설정
///
/// 정지 조건과 파생 통계 파라미터는 모두 설정값이며 코드에
/// 하드코딩되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 세션당 최대 패킷 수
    pub max_packets: u64,
    /// 첫 패킷 수집 시도 이후 최대 경과 시간 (초)
    pub max_duration_secs: u64,
    /// 크기 히스토그램 버킷 수
    pub histogram_bins: usize,
    /// 상위 출발지(top talkers) 표시 개수
    pub top_sources: usize,
    /// 진행 알림 채널 용량 (가득 차면 알림이 드롭됩니다)
    pub progress_channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_packets: 20,
            max_duration_secs: 30,
            histogram_bins: 15,
            top_sources: 6,
            progress_channel_capacity: 256,
        }
    }
}

/// 내보내기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// CSV 데이터셋 출력 경로
    pub csv_path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_path: "network_traffic.csv".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = PacketlensConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.capture.max_packets, 20);
        assert_eq!(config.capture.max_duration_secs, 30);
        assert_eq!(config.capture.histogram_bins, 15);
        assert_eq!(config.capture.top_sources, 6);
        assert_eq!(config.export.csv_path, "network_traffic.csv");
    }

    #[test]
    fn default_config_passes_validation() {
        let config = PacketlensConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = PacketlensConfig::parse("").unwrap();
        assert_eq!(config.capture.max_packets, 20);
        assert_eq!(config.capture.histogram_bins, 15);
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[capture]
max_packets = 30
max_duration_secs = 40
"#;
        let config = PacketlensConfig::parse(toml).unwrap();
        assert_eq!(config.capture.max_packets, 30);
        assert_eq!(config.capture.max_duration_secs, 40);
        // 나머지는 기본값 유지
        assert_eq!(config.capture.top_sources, 6);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"

[capture]
max_packets = 100
max_duration_secs = 120
histogram_bins = 20
top_sources = 10
progress_channel_capacity = 64

[export]
csv_path = "/tmp/traffic.csv"
"#;
        let config = PacketlensConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.capture.max_packets, 100);
        assert_eq!(config.capture.histogram_bins, 20);
        assert_eq!(config.capture.progress_channel_capacity, 64);
        assert_eq!(config.export.csv_path, "/tmp/traffic.csv");
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let result = PacketlensConfig::parse("invalid = [[[toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            PacketlensError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = PacketlensConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_zero_max_packets() {
        let mut config = PacketlensConfig::default();
        config.capture.max_packets = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_packets"));
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let mut config = PacketlensConfig::default();
        config.capture.max_duration_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_duration_secs"));
    }

    #[test]
    fn validate_rejects_zero_histogram_bins() {
        let mut config = PacketlensConfig::default();
        config.capture.histogram_bins = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("histogram_bins"));
    }

    #[test]
    fn validate_rejects_empty_csv_path() {
        let mut config = PacketlensConfig::default();
        config.export.csv_path = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("csv_path"));
    }

    #[test]
    #[serial]
    fn env_override_u64_applies() {
        let mut config = PacketlensConfig::default();
        // SAFETY: #[serial] 테스트에서만 환경변수를 조작합니다.
        unsafe { std::env::set_var("PACKETLENS_CAPTURE_MAX_PACKETS", "77") };
        config.apply_env_overrides();
        assert_eq!(config.capture.max_packets, 77);
        unsafe { std::env::remove_var("PACKETLENS_CAPTURE_MAX_PACKETS") };
    }

    #[test]
    #[serial]
    fn env_override_invalid_value_keeps_original() {
        let mut config = PacketlensConfig::default();
        // SAFETY: #[serial] 테스트에서만 환경변수를 조작합니다.
        unsafe { std::env::set_var("PACKETLENS_CAPTURE_MAX_PACKETS", "not-a-number") };
        config.apply_env_overrides();
        assert_eq!(config.capture.max_packets, 20); // 원래 값 유지
        unsafe { std::env::remove_var("PACKETLENS_CAPTURE_MAX_PACKETS") };
    }

    #[test]
    #[serial]
    fn env_override_missing_var_keeps_original() {
        let mut config = PacketlensConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.capture.top_sources, 6);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = PacketlensConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = PacketlensConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.capture.max_packets, parsed.capture.max_packets);
        assert_eq!(config.export.csv_path, parsed.export.csv_path);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = PacketlensConfig::from_file("/nonexistent/path/packetlens.toml").await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            PacketlensError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
