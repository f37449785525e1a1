//! 헬스 체크 endpoint.

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// 헬스 체크 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
        }
    }
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

pub fn health_router() -> Router {
    Router::new().route("/", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let response = health_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"status":"OK"}"#);
    }
}
