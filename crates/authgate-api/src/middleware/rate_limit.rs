//! Rate limiting middleware.
//!
//! 클라이언트 IP별 고정 윈도우 방식 요청 제한.
//! 윈도우 안에서 허용량을 넘기면 다음 윈도우가 시작될 때까지 429를 반환합니다.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use authgate_core::AppEnv;

/// 429 응답 메시지.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Rate Limiter 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// 윈도우당 최대 요청 수
    pub max_requests: u32,
    /// 윈도우 길이
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::for_env(AppEnv::Production)
    }
}

impl RateLimitConfig {
    /// 기본 윈도우 (15분).
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// 운영 환경 100회, 그 외 1000회 (15분 윈도우).
    pub fn for_env(env: AppEnv) -> Self {
        let max_requests = if env.is_production() { 100 } else { 1000 };
        Self::new(max_requests, Self::DEFAULT_WINDOW)
    }
}

/// IP별 윈도우 상태.
#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Rate Limit 확인 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// 요청 허용됨
    Allowed {
        /// 윈도우 내 남은 요청 수
        remaining: u32,
        /// 윈도우 재설정까지 남은 시간 (초)
        reset_after: u64,
    },
    /// Rate limit 초과
    Limited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

/// Rate Limiter.
///
/// IP 주소별로 Rate Limiting을 적용합니다.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// 요청 허용 여부 확인.
    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        let window = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.config.window {
            window.started = now;
            window.count = 0;
        }

        let reset_after =
            ceil_secs(self.config.window.saturating_sub(now.duration_since(window.started)));

        if window.count >= self.config.max_requests {
            return RateLimitResult::Limited {
                retry_after: reset_after,
            };
        }

        window.count += 1;
        RateLimitResult::Allowed {
            remaining: self.config.max_requests - window.count,
            reset_after,
        }
    }

    /// 만료된 윈도우 정리.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        windows.retain(|_, window| now.duration_since(window.started) < self.config.window);
    }

    /// 현재 추적 중인 IP 수 반환.
    pub async fn tracked_ips(&self) -> usize {
        self.windows.read().await.len()
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// 429 응답 본문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitBody {
    pub success: bool,
    pub message: String,
    pub status: u16,
}

/// Rate Limit 미들웨어 상태.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    limiter: RateLimiter,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: RateLimiter::new(config),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// 윈도우 길이마다 만료된 항목을 정리하는 백그라운드 태스크 시작.
    pub fn spawn_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let limiter = self.limiter.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.config.window);
            // 첫 tick은 즉시 완료됨
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.cleanup().await;
                let tracked = limiter.tracked_ips().await;
                debug!(tracked = tracked, "Rate limit windows cleaned up");
            }
        })
    }
}

/// Rate Limiting 미들웨어 함수.
///
/// 클라이언트 IP는 `ConnectInfo<SocketAddr>`에서 가져옵니다.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    let limit = state.limiter.config.max_requests;

    match state.limiter.check(ip).await {
        RateLimitResult::Allowed {
            remaining,
            reset_after,
        } => {
            let mut response = next.run(request).await;
            set_rate_limit_headers(&mut response, limit, remaining, reset_after);
            response
        }
        RateLimitResult::Limited { retry_after } => {
            warn!(client_ip = %ip, retry_after, "Rate limit exceeded");

            let body = RateLimitBody {
                success: false,
                message: RATE_LIMIT_MESSAGE.to_string(),
                status: StatusCode::TOO_MANY_REQUESTS.as_u16(),
            };
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            set_rate_limit_headers(&mut response, limit, 0, retry_after);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

/// 연결 정보에서 클라이언트 IP 추출 (없으면 loopback).
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn set_rate_limit_headers(response: &mut Response, limit: u32, remaining: u32, reset: u64) {
    let headers = response.headers_mut();
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(reset));
}
