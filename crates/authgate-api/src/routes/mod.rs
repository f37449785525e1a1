//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/` - 헬스 체크
//! - `/api/me` - 인증된 호출자 정보
//! - `/api/admin/ping` - 관리자 전용 확인
//!
//! 일치하는 라우트가 없으면 `404 Route not found`를 반환합니다.

pub mod account;
pub mod health;

pub use account::{account_router, AdminPingResponse};
pub use health::{health_router, HealthResponse};

use axum::{middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::middleware::{cors_layer, error_funnel, panic_response, rate_limit_middleware};
use crate::state::AppState;

/// 일치하는 라우트가 없을 때.
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// 전체 라우터 생성.
///
/// 레이어 순서 (바깥 → 안): TraceLayer → CORS → rate_limit → error_funnel → CatchPanicLayer → 라우트
pub fn create_router(state: &AppState) -> Router {
    Router::new()
        .merge(health_router())
        .nest("/api", account_router(&state.codec))
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            state.error_funnel(),
            error_funnel,
        ))
        .layer(middleware::from_fn_with_state(
            state.rate_limit.clone(),
            rate_limit_middleware,
        ))
        .layer(cors_layer(&state.config.cors.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use authgate_core::AppEnv;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = create_router(&create_test_state(AppEnv::Test));
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            &body[..],
            br#"{"success":false,"error":{"code":404,"message":"Route not found"}}"#
        );
    }
}
