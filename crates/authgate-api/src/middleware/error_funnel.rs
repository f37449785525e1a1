//! 에러 응답 통합 미들웨어.
//!
//! 게이트와 핸들러에서 발생한 모든 에러 응답은 이 레이어를 지나며
//! 로그로 기록되고 하나의 응답 형식으로 정리됩니다.
//!
//! - [`ApiError`] 응답: 그대로 전달, error 레벨 로그
//! - [`UnclassifiedFault`] 응답: 500 + 일반 메시지, 운영 환경이 아니면 `stack` 포함

use std::any::Any;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use authgate_core::AppEnv;

use crate::auth::panic_message;
use crate::error::{ApiError, UnclassifiedFault};

/// 실행 환경에 따라 에러 응답을 정리하는 렌더러.
#[derive(Debug, Clone, Copy)]
pub struct ErrorFunnel {
    env: AppEnv,
}

impl ErrorFunnel {
    pub fn new(env: AppEnv) -> Self {
        Self { env }
    }

    /// 진단 정보(`stack`) 노출 여부.
    pub fn exposes_diagnostics(&self) -> bool {
        !self.env.is_production()
    }

    /// 다운스트림 응답을 검사해 에러를 기록하고 필요하면 다시 렌더링합니다.
    pub fn finish(&self, method: &Method, path: &str, response: Response) -> Response {
        if let Some(err) = response.extensions().get::<ApiError>() {
            error!(
                method = %method,
                path = %path,
                status = err.code(),
                message = %err.message(),
                details = ?err.details(),
                "Request failed"
            );
            return response;
        }

        if let Some(fault) = response.extensions().get::<UnclassifiedFault>().cloned() {
            error!(
                method = %method,
                path = %path,
                error = %fault.diagnostic(),
                "Unexpected error"
            );
            return fault.render(self.exposes_diagnostics());
        }

        response
    }
}

/// [`ErrorFunnel`] 미들웨어.
///
/// ```rust,ignore
/// router.layer(middleware::from_fn_with_state(ErrorFunnel::new(env), error_funnel))
/// ```
pub async fn error_funnel(
    State(funnel): State<ErrorFunnel>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    funnel.finish(&method, &path, response)
}

/// `CatchPanicLayer::custom`용 핸들러. 핸들러 패닉을 분류되지 않은 장애로 변환합니다.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    UnclassifiedFault::new(panic_message(payload.as_ref())).into_response()
}
