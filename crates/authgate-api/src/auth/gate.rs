//! 요청 게이트.
//!
//! 각 게이트는 (요청 헤더, 컨텍스트)를 받아 다음 단계로 진행하거나
//! [`ApiError`]로 요청을 종료하는 순수 함수입니다.
//!
//! ```text
//! Unauthenticated --IdentityGate--> Authenticated --RoleGate--> Authorized --> handler
//!        \                               \
//!         +---------- Failed(ApiError) ---+
//! ```

use std::collections::BTreeSet;

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::{Identity, Role, TokenCodec};
use crate::error::ApiError;

/// Authorization 헤더의 스킴 접두사 (대소문자 구분).
pub const BEARER_PREFIX: &str = "Bearer ";

pub const TOKEN_REQUIRED: &str = "Authentication token required";
pub const INVALID_OR_EXPIRED_TOKEN: &str = "Invalid or expired token";
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";
pub const NOT_AUTHENTICATED: &str = "User not authenticated";
pub const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";
pub const ROLE_GATE_FAULT: &str = "Unexpected role middleware error";

/// 게이트 사이에 전달되는 요청 단위 컨텍스트.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    identity: Option<Identity>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이미 연결된 주체가 있으면 그것으로 시작.
    pub fn from_identity(identity: Option<Identity>) -> Self {
        Self { identity }
    }

    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn into_identity(self) -> Option<Identity> {
        self.identity
    }
}

/// 게이트 판정 결과.
#[derive(Debug)]
pub enum GateOutcome {
    /// 다음 게이트로 진행
    Continue(RequestContext),
    /// 요청 종료
    ShortCircuit(ApiError),
}

/// 요청 게이트.
pub trait Gate: Send + Sync {
    /// 로그에 쓰이는 이름.
    fn name(&self) -> &'static str;

    fn check(&self, headers: &HeaderMap, ctx: RequestContext) -> GateOutcome;

    /// 게이트 내부의 예기치 않은 장애 분류.
    fn fault(&self, cause: String) -> ApiError {
        ApiError::internal_error("Unexpected gate error").with_cause(cause)
    }
}

/// Bearer 토큰을 검증하고 주체를 컨텍스트에 연결하는 게이트.
#[derive(Debug, Clone)]
pub struct IdentityGate {
    codec: TokenCodec,
}

impl IdentityGate {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }
}

impl Gate for IdentityGate {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn check(&self, headers: &HeaderMap, ctx: RequestContext) -> GateOutcome {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return GateOutcome::ShortCircuit(ApiError::unauthorized(TOKEN_REQUIRED));
        };

        let header = match value.to_str() {
            Ok(header) => header,
            Err(e) => return GateOutcome::ShortCircuit(self.fault(e.to_string())),
        };

        let Some(credentials) = header.strip_prefix(BEARER_PREFIX) else {
            return GateOutcome::ShortCircuit(ApiError::unauthorized(TOKEN_REQUIRED));
        };

        // 스킴 뒤 첫 번째 공백 구분 토큰만 사용
        let token = credentials.split(' ').next().unwrap_or_default();

        match self.codec.verify_access_token(token) {
            Some(payload) => GateOutcome::Continue(ctx.with_identity(Identity::from(payload))),
            None => GateOutcome::ShortCircuit(ApiError::unauthorized(INVALID_OR_EXPIRED_TOKEN)),
        }
    }

    /// 클라이언트 호환을 위해 500이 아닌 401로 분류합니다.
    fn fault(&self, cause: String) -> ApiError {
        ApiError::unauthorized(AUTHENTICATION_FAILED).with_cause(cause)
    }
}

/// 허용된 역할 집합으로 접근을 제한하는 게이트.
///
/// 빈 집합은 모든 주체를 거부합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGate {
    allowed: BTreeSet<Role>,
}

impl RoleGate {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
        }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    pub fn allowed(&self) -> &BTreeSet<Role> {
        &self.allowed
    }
}

/// 역할 게이트 생성.
///
/// ```rust,ignore
/// let admin_only = make_role_gate([Role::Admin]);
/// ```
pub fn make_role_gate(roles: impl IntoIterator<Item = Role>) -> RoleGate {
    RoleGate::new(roles)
}

impl Gate for RoleGate {
    fn name(&self) -> &'static str {
        "role"
    }

    fn check(&self, _headers: &HeaderMap, ctx: RequestContext) -> GateOutcome {
        let Some(identity) = ctx.identity() else {
            return GateOutcome::ShortCircuit(ApiError::unauthorized(NOT_AUTHENTICATED));
        };

        if !self.allows(identity.role) {
            return GateOutcome::ShortCircuit(ApiError::forbidden(INSUFFICIENT_PERMISSIONS));
        }

        GateOutcome::Continue(ctx)
    }

    fn fault(&self, cause: String) -> ApiError {
        ApiError::internal_error(ROLE_GATE_FAULT).with_cause(cause)
    }
}
