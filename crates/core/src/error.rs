//! 에러 타입 — 도메인별 에러 정의

/// Packetlens 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum PacketlensError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 캡처 세션 에러
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 캡처 세션 에러
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// 패킷 소스 실패 — 세션은 종료되지만 부분 결과는 보존됩니다
    #[error("packet source failed: {reason}")]
    Source { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_names_field() {
        let err = ConfigError::InvalidValue {
            field: "capture.histogram_bins".to_owned(),
            reason: "must be positive".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("capture.histogram_bins"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn session_error_converts_to_top_level() {
        let err = SessionError::Source {
            reason: "interface unavailable".to_owned(),
        };
        let top: PacketlensError = err.into();
        assert!(matches!(top, PacketlensError::Session(_)));
        assert!(top.to_string().contains("interface unavailable"));
    }

    #[test]
    fn io_error_converts_to_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let top: PacketlensError = io.into();
        assert!(matches!(top, PacketlensError::Io(_)));
    }
}
