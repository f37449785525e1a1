//! 인증이 필요한 계정 endpoint.
//!
//! - `GET /me`: 호출자의 인증 주체 (identity 게이트)
//! - `GET /admin/ping`: 관리자 전용 (identity + role 게이트)

use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{
    enforce, make_role_gate, CurrentIdentity, Identity, IdentityGate, Pipeline, Role, TokenCodec,
};

/// 관리자 ping 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPingResponse {
    pub status: String,
    pub role: Role,
}

/// GET /me
pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<Identity> {
    Json(identity)
}

/// GET /admin/ping
pub async fn admin_ping(CurrentIdentity(identity): CurrentIdentity) -> Json<AdminPingResponse> {
    Json(AdminPingResponse {
        status: "OK".to_string(),
        role: identity.role,
    })
}

/// 계정 라우터.
///
/// 각 라우트 그룹은 자신의 게이트 파이프라인을 `route_layer`로 가집니다.
pub fn account_router(codec: &TokenCodec) -> Router {
    let authenticated = Arc::new(Pipeline::new().with_gate(IdentityGate::new(codec.clone())));
    let admin_only = Arc::new(
        Pipeline::new()
            .with_gate(IdentityGate::new(codec.clone()))
            .with_gate(make_role_gate([Role::Admin])),
    );

    let me_routes = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(authenticated, enforce));

    let admin_routes = Router::new()
        .route("/admin/ping", get(admin_ping))
        .route_layer(middleware::from_fn_with_state(admin_only, enforce));

    Router::new().merge(me_routes).merge(admin_routes)
}
