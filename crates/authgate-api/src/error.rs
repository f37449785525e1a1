//! 통합 API 에러 타입.
//!
//! 모든 게이트 실패와 핸들러 에러는 동일한 형식의 응답으로 변환됩니다.
//!
//! ```json
//! {
//!   "success": false,
//!   "error": {
//!     "code": 403,
//!     "message": "Insufficient permissions",
//!     "details": ["..."]
//!   }
//! }
//! ```
//!
//! `details`는 비어 있으면 생략됩니다. 분류되지 않은 장애([`UnclassifiedFault`])는
//! 운영 환경이 아닐 때만 `stack` 필드에 진단 정보를 포함합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 분류되지 않은 장애에 대한 클라이언트 메시지.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// 구조화된 API 에러.
///
/// HTTP 상태 코드, 클라이언트에 노출 가능한 메시지, 원인 기록 목록을 가집니다.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Vec<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// 401 Unauthorized - 자격 증명 누락/무효/만료.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403 Forbidden - 인증되었으나 역할 부족.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 Not Found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 409 Conflict.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// 500 Internal Server Error - 게이트 내부의 예기치 않은 장애.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 원인 기록 목록 설정.
    #[must_use]
    pub fn with_details(mut self, details: Vec<Value>) -> Self {
        self.details = details;
        self
    }

    /// 원인 하나를 문자열 기록으로 추가.
    #[must_use]
    pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
        self.details.push(Value::String(cause.to_string()));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// 숫자 상태 코드 (응답 본문의 `code`).
    pub fn code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &[Value] {
        &self.details
    }

    /// 응답 본문 생성.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: ErrorDetail {
                code: self.code(),
                message: self.message.clone(),
                details: self.details.clone(),
                stack: None,
            },
        }
    }
}

/// 실패 응답 본문.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// 항상 false
    pub success: bool,
    pub error: ErrorDetail,
}

/// 실패 응답의 `error` 객체.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// HTTP 상태 코드
    pub code: u16,
    /// 클라이언트에 노출 가능한 메시지
    pub message: String,
    /// 원인 기록 (비어 있으면 생략)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Value>,
    /// 진단 정보 (운영 환경이 아닐 때 분류되지 않은 장애에만 포함)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body())).into_response();
        // error_funnel이 로깅에 사용
        response.extensions_mut().insert(self);
        response
    }
}

/// ApiError가 아닌 장애.
///
/// 응답 본문은 항상 일반 메시지만 담고, 진단 정보는 [`ErrorFunnel`]이
/// 실행 환경에 따라 추가합니다.
///
/// [`ErrorFunnel`]: crate::middleware::ErrorFunnel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnclassifiedFault {
    diagnostic: String,
}

impl UnclassifiedFault {
    pub fn new(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: diagnostic.into(),
        }
    }

    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }

    /// 500 응답 생성. `expose_diagnostic`이 true일 때만 `stack`을 포함합니다.
    pub fn render(&self, expose_diagnostic: bool) -> Response {
        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                message: INTERNAL_SERVER_ERROR_MESSAGE.to_string(),
                details: Vec::new(),
                stack: expose_diagnostic.then(|| self.diagnostic.clone()),
            },
        };

        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        response.extensions_mut().insert(self.clone());
        response
    }
}

impl IntoResponse for UnclassifiedFault {
    fn into_response(self) -> Response {
        self.render(false)
    }
}

/// 핸들러 에러.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 분류된 API 에러
    #[error(transparent)]
    Api(#[from] ApiError),
    /// 예기치 않은 장애
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Api(e) => e.into_response(),
            AppError::Unexpected(e) => UnclassifiedFault::new(format!("{:?}", e)).into_response(),
        }
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_factory_status_codes() {
        assert_eq!(ApiError::unauthorized("x").code(), 401);
        assert_eq!(ApiError::forbidden("x").code(), 403);
        assert_eq!(ApiError::bad_request("x").code(), 400);
        assert_eq!(ApiError::not_found("x").code(), 404);
        assert_eq!(ApiError::conflict("x").code(), 409);
        assert_eq!(ApiError::internal_error("x").code(), 500);
    }

    #[test]
    fn test_display_is_message() {
        let error = ApiError::forbidden("Insufficient permissions");
        assert_eq!(error.to_string(), "Insufficient permissions");
    }

    #[test]
    fn test_details_are_ordered() {
        let error = ApiError::unauthorized("Authentication failed")
            .with_cause("first")
            .with_cause("second");
        assert_eq!(
            error.details(),
            &[Value::from("first"), Value::from("second")]
        );

        let replaced = error.with_details(vec![serde_json::json!({"field": "email"})]);
        assert_eq!(replaced.details().len(), 1);
    }

    #[test]
    fn test_body_omits_empty_details() {
        let json = serde_json::to_value(ApiError::not_found("Route not found").body()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": { "code": 404, "message": "Route not found" }
            })
        );
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let response = ApiError::unauthorized("Authentication failed")
            .with_cause("bad header")
            .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.extensions().get::<ApiError>().is_some());

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], 401);
        assert_eq!(json["error"]["details"][0], "bad header");
    }

    #[tokio::test]
    async fn test_unclassified_fault_hides_diagnostic_by_default() {
        let error = AppError::from(anyhow::anyhow!("connection pool exhausted"));
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<UnclassifiedFault>().is_some());

        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], INTERNAL_SERVER_ERROR_MESSAGE);
        assert!(json["error"].get("stack").is_none());
        assert!(!json.to_string().contains("connection pool exhausted"));
    }

    #[tokio::test]
    async fn test_unclassified_fault_exposes_diagnostic_on_request() {
        let fault = UnclassifiedFault::new("boom");
        let json = body_json(fault.render(true)).await;
        assert_eq!(json["error"]["stack"], "boom");
    }
}
