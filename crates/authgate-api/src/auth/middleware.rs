//! Axum용 게이트 미들웨어.
//!
//! [`Pipeline`]을 라우터에 연결하는 어댑터와 인증 주체 추출기.
//!
//! ```rust,ignore
//! let admin = Arc::new(
//!     Pipeline::new()
//!         .with_gate(IdentityGate::new(codec.clone()))
//!         .with_gate(make_role_gate([Role::Admin])),
//! );
//!
//! Router::new()
//!     .route("/ping", get(ping))
//!     .route_layer(middleware::from_fn_with_state(admin, enforce));
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::gate::{RequestContext, NOT_AUTHENTICATED};
use super::{Identity, Pipeline};
use crate::error::ApiError;

/// 파이프라인을 실행하고 결과 주체를 요청 extensions에 연결합니다.
///
/// 앞선 레이어에서 이미 연결된 주체가 있으면 그 상태에서 시작합니다.
pub async fn enforce(
    State(pipeline): State<Arc<Pipeline>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_identity(request.extensions().get::<Identity>().cloned());

    match pipeline.run(request.headers(), ctx) {
        Ok(ctx) => {
            if let Some(identity) = ctx.into_identity() {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// 인증된 주체 추출기.
///
/// ```rust,ignore
/// async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<Identity> {
///     Json(identity)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or_else(|| ApiError::unauthorized(NOT_AUTHENTICATED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{make_role_gate, IdentityGate, Role, TokenCodec, TokenPayload};
    use authgate_core::AuthConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, StatusCode},
        middleware,
        routing::get,
        Json, Router,
    };
    use tower::ServiceExt;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::new("mw-access", "mw-refresh").unwrap())
    }

    async fn whoami(CurrentIdentity(identity): CurrentIdentity) -> Json<Identity> {
        Json(identity)
    }

    fn app(pipeline: Pipeline) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(Arc::new(pipeline), enforce))
    }

    fn get_request(token: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_identity_reaches_handler() {
        let codec = codec();
        let payload = TokenPayload::new("u-7", "seven@example.com", Role::User);
        let token = codec.issue_access_token(&payload).unwrap();

        let response = app(Pipeline::new().with_gate(IdentityGate::new(codec)))
            .oneshot(get_request(Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let identity: Identity = serde_json::from_slice(&body).unwrap();
        assert_eq!(identity, Identity::from(payload));
    }

    #[tokio::test]
    async fn test_pipeline_failure_skips_handler() {
        let response = app(Pipeline::new().with_gate(IdentityGate::new(codec())))
            .oneshot(get_request(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.extensions().get::<ApiError>().is_some());
    }

    #[tokio::test]
    async fn test_extractor_without_identity() {
        let response = app(Pipeline::new())
            .oneshot(get_request(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let err = response.extensions().get::<ApiError>().unwrap();
        assert_eq!(err.message(), NOT_AUTHENTICATED);
    }

    #[tokio::test]
    async fn test_role_gate_sees_identity_from_earlier_layer() {
        let codec = codec();
        let payload = TokenPayload::new("u-1", "admin@example.com", Role::Admin);
        let token = codec.issue_access_token(&payload).unwrap();

        let identity = Arc::new(Pipeline::new().with_gate(IdentityGate::new(codec)));
        let admin_only = Arc::new(Pipeline::new().with_gate(make_role_gate([Role::Admin])));

        // 바깥 레이어(identity)가 먼저 실행된 뒤 role 게이트가 이어서 실행됨
        let app = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(admin_only, enforce))
            .route_layer(middleware::from_fn_with_state(identity, enforce));

        let response = app.oneshot(get_request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
