//! 설정 에러 타입.
//!
//! 프로세스 시작 시 설정 검증에서 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 설정 로드/검증 에러.
///
/// 이 에러가 발생하면 서버는 시작하지 않아야 합니다.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 필수 비밀 키 누락 또는 빈 값
    #[error("필수 비밀 키가 설정되지 않았습니다: {0}")]
    MissingSecret(&'static str),

    /// 토큰 수명 형식 오류
    #[error("잘못된 토큰 수명 값 {key}={value:?}")]
    InvalidTtl { key: &'static str, value: String },

    /// 알 수 없는 실행 환경
    #[error("알 수 없는 실행 환경: {0}")]
    InvalidEnvironment(String),

    /// 설정 소스 읽기 실패
    #[error("설정 소스 에러: {0}")]
    Source(#[from] config::ConfigError),
}

/// 설정 작업을 위한 Result 타입.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_names_variable() {
        let err = ConfigError::MissingSecret("JWT_SECRET");
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_invalid_ttl_message() {
        let err = ConfigError::InvalidTtl {
            key: "JWT_EXPIRES_IN",
            value: "soon".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_EXPIRES_IN"));
        assert!(msg.contains("soon"));
    }
}
