//! 요청 단위 인증 주체.

use serde::{Deserialize, Serialize};

use super::{Role, TokenPayload};

/// 인증된 주체 정보.
///
/// 검증된 Access Token에서 만들어져 하나의 요청 처리 범위에만 연결됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl From<TokenPayload> for Identity {
    fn from(payload: TokenPayload) -> Self {
        Self {
            id: payload.id,
            email: payload.email,
            role: payload.role,
        }
    }
}

impl From<&Identity> for TokenPayload {
    fn from(identity: &Identity) -> Self {
        TokenPayload::new(identity.id.clone(), identity.email.clone(), identity.role)
    }
}
