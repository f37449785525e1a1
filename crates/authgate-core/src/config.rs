//! 설정 관리.
//!
//! 프로세스 시작 시 환경 변수에서 한 번 로드되어 이후 변경되지 않는 설정을 정의합니다.
//! 토큰 서명용 비밀 키가 없으면 로드 단계에서 실패합니다.
//!
//! # 환경변수
//!
//! - `NODE_ENV`: 실행 환경 ("development" | "production" | "test", 기본값: development)
//! - `HOST`, `PORT`: 바인딩 주소 (기본값: 127.0.0.1:3000)
//! - `JWT_SECRET`: Access Token 서명 키 (필수)
//! - `JWT_EXPIRES_IN`: Access Token 수명 (기본값: "1h")
//! - `REFRESH_TOKEN_SECRET`: Refresh Token 서명 키 (필수)
//! - `REFRESH_TOKEN_EXPIRES_IN`: Refresh Token 수명 (기본값: "7d")
//! - `ALLOWED_ORIGINS`: CORS 허용 origin 목록 (쉼표 구분, 기본값: 없음)

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use chrono::Duration;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// 실행 환경.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    /// 로컬 개발
    #[default]
    Development,
    /// 운영 환경 - 진단 정보를 응답에 노출하지 않음
    Production,
    /// 테스트
    Test,
}

impl AppEnv {
    /// 운영 환경 여부.
    pub fn is_production(self) -> bool {
        matches!(self, AppEnv::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
            AppEnv::Test => "test",
        }
    }
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" => Ok(AppEnv::Development),
            "production" => Ok(AppEnv::Production),
            "test" => Ok(AppEnv::Test),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 서버 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// 토큰 서명 설정.
///
/// Access/Refresh 토큰은 서로 독립된 비밀 키와 수명을 사용합니다.
/// 비밀 키는 `Debug` 출력에 노출되지 않습니다.
#[derive(Debug)]
pub struct AuthConfig {
    access_secret: SecretString,
    access_ttl: Duration,
    refresh_secret: SecretString,
    refresh_ttl: Duration,
}

impl AuthConfig {
    /// 기본 Access Token 수명 (1시간).
    pub fn default_access_ttl() -> Duration {
        Duration::hours(1)
    }

    /// 기본 Refresh Token 수명 (7일).
    pub fn default_refresh_ttl() -> Duration {
        Duration::days(7)
    }

    /// 기본 수명으로 설정 생성.
    ///
    /// # Errors
    /// 비밀 키 중 하나라도 비어 있으면 `ConfigError::MissingSecret`.
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
    ) -> ConfigResult<Self> {
        let access_secret = require_secret("JWT_SECRET", Some(access_secret.into()))?;
        let refresh_secret = require_secret("REFRESH_TOKEN_SECRET", Some(refresh_secret.into()))?;

        Ok(Self {
            access_secret,
            access_ttl: Self::default_access_ttl(),
            refresh_secret,
            refresh_ttl: Self::default_refresh_ttl(),
        })
    }

    /// Access Token 수명 변경.
    #[must_use]
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Refresh Token 수명 변경.
    #[must_use]
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn access_secret(&self) -> &SecretString {
        &self.access_secret
    }

    pub fn refresh_secret(&self) -> &SecretString {
        &self.refresh_secret
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

/// CORS 설정.
///
/// 목록이 비어 있으면 cross-origin 요청은 모두 거부됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// 쉼표 구분 목록 파싱. 빈 항목은 무시합니다.
    pub fn from_list(list: &str) -> Self {
        Self {
            allowed_origins: list
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// 애플리케이션 설정.
#[derive(Debug)]
pub struct AppConfig {
    /// 실행 환경
    pub env: AppEnv,
    /// 서버 설정
    pub server: ServerConfig,
    /// 토큰 서명 설정
    pub auth: AuthConfig,
    /// CORS 설정
    pub cors: CorsConfig,
}

/// 환경 변수 원본 값.
///
/// `config::Environment`는 키를 소문자로 변환합니다.
#[derive(Debug, Default, Deserialize)]
struct RawEnv {
    node_env: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    jwt_secret: Option<String>,
    jwt_expires_in: Option<String>,
    refresh_token_secret: Option<String>,
    refresh_token_expires_in: Option<String>,
    allowed_origins: Option<String>,
}

impl AppConfig {
    /// 프로세스 환경 변수에서 설정을 로드합니다.
    ///
    /// `.env` 파일은 호출 전에 바이너리에서 로드해야 합니다.
    pub fn load() -> ConfigResult<Self> {
        let source = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;
        Self::from_source(source)
    }

    /// 임의의 설정 소스에서 설정을 로드하고 검증합니다.
    ///
    /// # Errors
    /// - 비밀 키 누락/빈 값: `MissingSecret`
    /// - 수명 형식 오류: `InvalidTtl`
    /// - 알 수 없는 `NODE_ENV`: `InvalidEnvironment`
    pub fn from_source(source: config::Config) -> ConfigResult<Self> {
        let raw: RawEnv = source.try_deserialize()?;

        let env = match raw.node_env.as_deref() {
            Some(value) => value.parse()?,
            None => AppEnv::default(),
        };

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: raw.host.unwrap_or(defaults.host),
            port: raw.port.unwrap_or(defaults.port),
        };

        let auth = AuthConfig {
            access_secret: require_secret("JWT_SECRET", raw.jwt_secret)?,
            access_ttl: ttl_or_default(
                "JWT_EXPIRES_IN",
                raw.jwt_expires_in,
                AuthConfig::default_access_ttl(),
            )?,
            refresh_secret: require_secret("REFRESH_TOKEN_SECRET", raw.refresh_token_secret)?,
            refresh_ttl: ttl_or_default(
                "REFRESH_TOKEN_EXPIRES_IN",
                raw.refresh_token_expires_in,
                AuthConfig::default_refresh_ttl(),
            )?,
        };

        let cors = raw
            .allowed_origins
            .as_deref()
            .map(CorsConfig::from_list)
            .unwrap_or_default();

        Ok(Self {
            env,
            server,
            auth,
            cors,
        })
    }
}

fn require_secret(key: &'static str, value: Option<String>) -> ConfigResult<SecretString> {
    match value {
        Some(secret) if !secret.trim().is_empty() => Ok(SecretString::from(secret)),
        _ => Err(ConfigError::MissingSecret(key)),
    }
}

fn ttl_or_default(
    key: &'static str,
    value: Option<String>,
    default: Duration,
) -> ConfigResult<Duration> {
    match value {
        None => Ok(default),
        Some(value) => parse_ttl(&value).ok_or(ConfigError::InvalidTtl { key, value }),
    }
}

/// 토큰 수명 상한 (100년, 밀리초).
pub const MAX_TTL_MILLIS: i64 = 100 * 31_557_600_000;

/// 시간 길이 문자열 파싱.
///
/// `"1h"`, `"7d"`, `"90 minutes"`, `"1.5h"` 같은 형식을 지원합니다.
/// 단위가 없으면 밀리초로 해석합니다. 0 이하의 값과 [`MAX_TTL_MILLIS`]를 넘는 값은 `None`.
///
/// | 단위 | 별칭 |
/// |------|------|
/// | 밀리초 | `ms`, `msec`, `millisecond(s)` |
/// | 초 | `s`, `sec(s)`, `second(s)` |
/// | 분 | `m`, `min(s)`, `minute(s)` |
/// | 시간 | `h`, `hr(s)`, `hour(s)` |
/// | 일 | `d`, `day(s)` |
/// | 주 | `w`, `week(s)` |
/// | 년 | `y`, `yr(s)`, `year(s)` (365.25일) |
pub fn parse_ttl(value: &str) -> Option<Duration> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let amount: f64 = number.parse().ok()?;
    let millis_per_unit = match unit.trim().to_lowercase().as_str() {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        "w" | "week" | "weeks" => 604_800_000.0,
        "y" | "yr" | "yrs" | "year" | "years" => 31_557_600_000.0,
        _ => return None,
    };

    let millis = (amount * millis_per_unit).round();
    if !millis.is_finite() || millis < 1.0 || millis > MAX_TTL_MILLIS as f64 {
        return None;
    }

    Duration::try_milliseconds(millis as i64)
}
