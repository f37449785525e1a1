//! 인증 및 권한 부여.
//!
//! JWT 기반 인증과 역할 기반 접근 제어를 게이트 파이프라인으로 제공합니다.
//!
//! # 구성 요소
//!
//! - [`password`]: Argon2id 비밀번호 해싱
//! - [`TokenCodec`]: Access/Refresh 토큰 발급 및 검증
//! - [`IdentityGate`], [`RoleGate`]: 요청 게이트
//! - [`Pipeline`], [`enforce`]: 게이트 실행기와 Axum 어댑터
//! - [`CurrentIdentity`]: 핸들러용 인증 주체 추출기

mod gate;
mod identity;
mod jwt;
mod middleware;
pub mod password;
mod pipeline;
mod roles;

pub use gate::{
    make_role_gate, Gate, GateOutcome, IdentityGate, RequestContext, RoleGate,
    AUTHENTICATION_FAILED, BEARER_PREFIX, INSUFFICIENT_PERMISSIONS, INVALID_OR_EXPIRED_TOKEN,
    NOT_AUTHENTICATED, ROLE_GATE_FAULT, TOKEN_REQUIRED,
};
pub use identity::Identity;
pub use jwt::{
    issue_token, verify_token, AccessTokenPayload, Claims, RefreshTokenPayload, TokenCodec,
    TokenError, TokenKind, TokenPair, TokenPayload, TokenRejection,
};
pub use middleware::{enforce, CurrentIdentity};
pub use password::{hash_password, verify_credentials, verify_password, PasswordError};
pub(crate) use pipeline::panic_message;
pub use pipeline::Pipeline;
pub use roles::Role;
