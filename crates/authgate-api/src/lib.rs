//! Bearer 토큰 인증 게이트와 통합 에러 응답을 제공하는 HTTP 서버.
//!
//! # 모듈 구성
//!
//! - [`auth`]: 비밀번호 해싱, 토큰 코덱, identity/role 게이트
//! - [`error`]: API 에러 타입과 응답 형식
//! - [`middleware`]: 에러 응답 통합, CORS, 요청 제한 레이어
//! - [`routes`]: REST API 엔드포인트
//! - [`state`]: 애플리케이션 공유 상태

pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::{
    enforce, hash_password, make_role_gate, verify_password, CurrentIdentity, Identity,
    IdentityGate, Pipeline, Role, RoleGate, TokenCodec, TokenPair, TokenPayload,
};
pub use error::{ApiError, ApiResult, AppError, UnclassifiedFault};
pub use middleware::{error_funnel, ErrorFunnel, RateLimitConfig, RateLimitState};
pub use routes::create_router;
pub use state::AppState;
