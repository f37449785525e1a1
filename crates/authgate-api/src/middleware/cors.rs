//! CORS 레이어.
//!
//! `ALLOWED_ORIGINS`에 등록된 origin만 자격 증명(쿠키, Authorization)과 함께 허용합니다.
//! 목록에 없는 origin에는 CORS 헤더를 붙이지 않으므로 브라우저가 응답을 차단합니다.

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// preflight 결과 캐시 시간.
pub const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// 허용 origin 목록으로 CORS 레이어 생성.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    info!(count = origins.len(), "CORS allowed origins configured");

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let allowed = origins.contains(origin);
        if !allowed {
            warn!(origin = ?origin, "CORS: blocked origin");
        }
        allowed
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            X_REQUESTED_WITH,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}
