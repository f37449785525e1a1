//! 애플리케이션 공유 상태.

use std::sync::Arc;

use authgate_core::{AppConfig, AppEnv};

use crate::auth::TokenCodec;
use crate::middleware::{ErrorFunnel, RateLimitConfig, RateLimitState};

/// 애플리케이션 공유 상태.
///
/// 설정은 시작 시 한 번 로드되어 읽기 전용으로 공유됩니다.
#[derive(Debug, Clone)]
pub struct AppState {
    /// 검증된 설정
    pub config: Arc<AppConfig>,

    /// 토큰 발급/검증기 (서명 키 사전 계산)
    pub codec: TokenCodec,

    /// IP별 요청 제한 상태
    pub rate_limit: RateLimitState,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let codec = TokenCodec::new(&config.auth);
        let rate_limit = RateLimitState::new(RateLimitConfig::for_env(config.env));
        Self {
            config: Arc::new(config),
            codec,
            rate_limit,
        }
    }

    pub fn env(&self) -> AppEnv {
        self.config.env
    }

    /// 실행 환경에 맞춘 에러 렌더러.
    pub fn error_funnel(&self) -> ErrorFunnel {
        ErrorFunnel::new(self.env())
    }
}

/// 테스트용 상태 생성.
#[cfg(test)]
pub fn create_test_state(env: AppEnv) -> AppState {
    use authgate_core::{AuthConfig, CorsConfig, ServerConfig};

    let auth = AuthConfig::new("test-access-secret", "test-refresh-secret")
        .unwrap_or_else(|e| panic!("test auth config: {}", e));

    AppState::new(AppConfig {
        env,
        server: ServerConfig::default(),
        auth,
        cors: CorsConfig::default(),
    })
}
