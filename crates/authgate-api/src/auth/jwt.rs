//! JWT 토큰 처리.
//!
//! Access Token 및 Refresh Token 발급/검증 로직.
//!
//! 두 토큰은 같은 페이로드 형태를 가지지만 서로 다른 비밀 키와 수명으로 서명됩니다.
//! 검증은 어떤 이유로 실패하든 `None`을 반환하며, 실패 사유는 debug 로그로만 남깁니다.

use std::fmt;
use std::sync::Arc;

use authgate_core::AuthConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Role;

/// 토큰에 담기는 주체 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// 사용자 ID
    pub id: String,
    /// 사용자 이메일
    pub email: String,
    /// 사용자 역할
    pub role: Role,
}

impl TokenPayload {
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
        }
    }
}

/// Access Token 페이로드.
pub type AccessTokenPayload = TokenPayload;

/// Refresh Token 페이로드.
pub type RefreshTokenPayload = TokenPayload;

/// 토큰 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT 클레임.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub role: Role,
    /// 토큰 종류
    pub typ: TokenKind,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 같은 초에 발급된 토큰도 서로 다르게 만듦
    pub jti: String,
}

impl Claims {
    /// 발급 시각 = 현재, 만료 시각 = 발급 시각 + `ttl`.
    ///
    /// # Errors
    /// 만료 시각이 표현 가능한 범위를 넘으면 `TtlOverflow`.
    pub fn new(
        payload: &TokenPayload,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).ok_or(TokenError::TtlOverflow(ttl))?;

        Ok(Self {
            id: payload.id.clone(),
            email: payload.email.clone(),
            role: payload.role,
            typ: kind,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        })
    }

    pub fn payload(&self) -> TokenPayload {
        TokenPayload::new(self.id.clone(), self.email.clone(), self.role)
    }
}

/// Access Token + Refresh Token 페어.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access Token 만료 시간 (초)
    pub expires_in: i64,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
}

/// 토큰 발급 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("토큰 수명이 너무 깁니다: {0}")]
    TtlOverflow(Duration),
}

/// 토큰 검증 실패 사유.
///
/// 외부 계약은 `Option`이며, 이 값은 로깅 용도로만 사용됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenRejection {
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("서명이 일치하지 않습니다")]
    BadSignature,
    #[error("잘못된 토큰 형식")]
    Malformed,
    #[error("토큰 종류가 일치하지 않습니다")]
    WrongKind,
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation
}

fn encode_claims(claims: &Claims, key: &EncodingKey) -> Result<String, TokenError> {
    encode(&Header::new(Algorithm::HS256), claims, key).map_err(TokenError::from)
}

fn decode_claims(
    token: &str,
    kind: TokenKind,
    key: &DecodingKey,
) -> Result<TokenPayload, TokenRejection> {
    let data = decode::<Claims>(token, key, &validation()).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenRejection::Expired,
        ErrorKind::InvalidSignature => TokenRejection::BadSignature,
        _ => TokenRejection::Malformed,
    })?;

    // 만료 시각과 같은 초부터 만료 (now < exp 일 때만 유효)
    if data.claims.exp <= Utc::now().timestamp() {
        return Err(TokenRejection::Expired);
    }

    if data.claims.typ != kind {
        return Err(TokenRejection::WrongKind);
    }

    Ok(data.claims.payload())
}

/// 토큰 발급.
///
/// # Arguments
///
/// * `payload` - 주체 정보
/// * `kind` - 토큰 종류
/// * `secret` - 비밀 키
/// * `ttl` - 수명
pub fn issue_token(
    payload: &TokenPayload,
    kind: TokenKind,
    secret: &str,
    ttl: Duration,
) -> Result<String, TokenError> {
    let claims = Claims::new(payload, kind, ttl)?;
    encode_claims(&claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// 토큰 검증. 서명, 형식, 만료, 종류 중 하나라도 실패하면 `None`.
pub fn verify_token(token: &str, kind: TokenKind, secret: &str) -> Option<TokenPayload> {
    log_rejection(
        kind,
        decode_claims(token, kind, &DecodingKey::from_secret(secret.as_bytes())),
    )
}

fn log_rejection(
    kind: TokenKind,
    result: Result<TokenPayload, TokenRejection>,
) -> Option<TokenPayload> {
    match result {
        Ok(payload) => Some(payload),
        Err(reason) => {
            debug!(%kind, ?reason, "Token rejected");
            None
        }
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// 설정된 비밀 키/수명으로 토큰을 발급하고 검증합니다.
///
/// 키는 생성 시 한 번 계산되며, 복제 비용이 낮습니다.
#[derive(Clone)]
pub struct TokenCodec {
    access: Arc<SigningKeys>,
    refresh: Arc<SigningKeys>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: Arc::new(SigningKeys::new(
                config.access_secret().expose_secret(),
                config.access_ttl(),
            )),
            refresh: Arc::new(SigningKeys::new(
                config.refresh_secret().expose_secret(),
                config.refresh_ttl(),
            )),
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }

    /// Access Token 발급.
    pub fn issue_access_token(&self, payload: &AccessTokenPayload) -> Result<String, TokenError> {
        self.issue(payload, TokenKind::Access)
    }

    /// Refresh Token 발급.
    pub fn issue_refresh_token(
        &self,
        payload: &RefreshTokenPayload,
    ) -> Result<String, TokenError> {
        self.issue(payload, TokenKind::Refresh)
    }

    fn issue(&self, payload: &TokenPayload, kind: TokenKind) -> Result<String, TokenError> {
        let keys = self.keys(kind);
        encode_claims(&Claims::new(payload, kind, keys.ttl)?, &keys.encoding)
    }

    /// 하나의 페이로드로 Access/Refresh Token 쌍 발급.
    ///
    /// 두 토큰은 발급 이후 서로 연결되지 않습니다.
    pub fn issue_token_pair(&self, payload: &TokenPayload) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(payload)?,
            refresh_token: self.issue_refresh_token(payload)?,
            expires_in: self.access.ttl.num_seconds(),
            token_type: "Bearer".to_string(),
        })
    }

    /// Access Token 검증.
    pub fn verify_access_token(&self, token: &str) -> Option<AccessTokenPayload> {
        log_rejection(TokenKind::Access, self.verify_detailed(token, TokenKind::Access))
    }

    /// Refresh Token 검증.
    pub fn verify_refresh_token(&self, token: &str) -> Option<RefreshTokenPayload> {
        log_rejection(
            TokenKind::Refresh,
            self.verify_detailed(token, TokenKind::Refresh),
        )
    }

    /// 실패 사유를 포함한 검증.
    pub fn verify_detailed(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<TokenPayload, TokenRejection> {
        decode_claims(token, kind, &self.keys(kind).decoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ACCESS_SECRET: &str = "test-access-secret-key-minimum-32-chars";
    const REFRESH_SECRET: &str = "test-refresh-secret-key-minimum-32-chars";

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::new(ACCESS_SECRET, REFRESH_SECRET).unwrap())
    }

    fn payload() -> TokenPayload {
        TokenPayload::new("user123", "user@example.com", Role::User)
    }

    #[test]
    fn test_access_token_round_trip() {
        let codec = codec();
        let token = codec.issue_access_token(&payload()).unwrap();
        assert_eq!(codec.verify_access_token(&token), Some(payload()));
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let codec = codec();
        let token = codec.issue_refresh_token(&payload()).unwrap();
        assert_eq!(codec.verify_refresh_token(&token), Some(payload()));
    }

    #[test]
    fn test_same_payload_yields_distinct_tokens() {
        let codec = codec();
        let first = codec.issue_access_token(&payload()).unwrap();
        let second = codec.issue_access_token(&payload()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let codec = codec();
        let pair = codec.issue_token_pair(&payload()).unwrap();

        assert_eq!(codec.verify_refresh_token(&pair.access_token), None);
        assert_eq!(codec.verify_access_token(&pair.refresh_token), None);
        assert_eq!(
            codec.verify_detailed(&pair.access_token, TokenKind::Refresh),
            Err(TokenRejection::BadSignature)
        );
    }

    #[test]
    fn test_kind_checked_even_with_shared_secret() {
        let shared = TokenCodec::new(&AuthConfig::new(ACCESS_SECRET, ACCESS_SECRET).unwrap());
        let refresh = shared.issue_refresh_token(&payload()).unwrap();

        assert_eq!(shared.verify_access_token(&refresh), None);
        assert_eq!(
            shared.verify_detailed(&refresh, TokenKind::Access),
            Err(TokenRejection::WrongKind)
        );
    }

    #[test]
    fn test_expired_token_is_absent() {
        let token = issue_token(
            &payload(),
            TokenKind::Access,
            ACCESS_SECRET,
            Duration::seconds(-10),
        )
        .unwrap();

        assert_eq!(codec().verify_access_token(&token), None);
        assert_eq!(
            codec().verify_detailed(&token, TokenKind::Access),
            Err(TokenRejection::Expired)
        );
    }

    #[test]
    fn test_short_ttl_codec_issues_expired_tokens() {
        let config = AuthConfig::new(ACCESS_SECRET, REFRESH_SECRET)
            .unwrap()
            .with_access_ttl(Duration::seconds(-1));
        let codec = TokenCodec::new(&config);

        let token = codec.issue_access_token(&payload()).unwrap();
        assert_eq!(codec.verify_access_token(&token), None);
    }

    #[test]
    fn test_malformed_token_is_absent() {
        let codec = codec();
        assert_eq!(codec.verify_access_token("invalid.token.here"), None);
        assert_eq!(codec.verify_access_token(""), None);
        assert_eq!(
            codec.verify_detailed("not-a-jwt", TokenKind::Access),
            Err(TokenRejection::Malformed)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_token(
            &payload(),
            TokenKind::Access,
            "some-other-secret-key-minimum-32-chars",
            Duration::minutes(5),
        )
        .unwrap();

        assert_eq!(codec().verify_access_token(&token), None);
        assert_eq!(
            verify_token(&token, TokenKind::Access, "some-other-secret-key-minimum-32-chars"),
            Some(payload())
        );
    }

    #[test]
    fn test_unknown_role_is_malformed() {
        #[derive(Serialize)]
        struct ForeignClaims<'a> {
            id: &'a str,
            email: &'a str,
            role: &'a str,
            typ: &'a str,
            iat: i64,
            exp: i64,
            jti: &'a str,
        }

        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &ForeignClaims {
                id: "u",
                email: "u@example.com",
                role: "superuser",
                typ: "access",
                iat: now,
                exp: now + 60,
                jti: "fixed",
            },
            &EncodingKey::from_secret(ACCESS_SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            codec().verify_detailed(&token, TokenKind::Access),
            Err(TokenRejection::Malformed)
        );
    }

    #[test]
    fn test_token_pair_metadata() {
        let pair = codec().issue_token_pair(&payload()).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 3600);

        let json = serde_json::to_value(&pair).unwrap();
        assert!(json.get("accessToken").is_some());
        assert!(json.get("refreshToken").is_some());
    }

    #[test]
    fn test_claims_expiry_window() {
        let claims = Claims::new(&payload(), TokenKind::Access, Duration::hours(1)).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.typ, TokenKind::Access);
    }

    #[test]
    fn test_zero_ttl_token_is_already_expired() {
        let config = AuthConfig::new(ACCESS_SECRET, REFRESH_SECRET)
            .unwrap()
            .with_access_ttl(Duration::zero());
        let codec = TokenCodec::new(&config);

        let token = codec.issue_access_token(&payload()).unwrap();
        assert_eq!(codec.verify_access_token(&token), None);
        assert_eq!(
            codec.verify_detailed(&token, TokenKind::Access),
            Err(TokenRejection::Expired)
        );
    }

    #[test]
    fn test_overflowing_ttl_is_error_not_panic() {
        let config = AuthConfig::new(ACCESS_SECRET, REFRESH_SECRET)
            .unwrap()
            .with_access_ttl(Duration::MAX);
        let codec = TokenCodec::new(&config);

        assert!(matches!(
            codec.issue_access_token(&payload()),
            Err(TokenError::TtlOverflow(_))
        ));
        assert!(matches!(
            codec.issue_token_pair(&payload()),
            Err(TokenError::TtlOverflow(_))
        ));
        assert!(codec.issue_refresh_token(&payload()).is_ok());
    }

    fn any_role() -> impl Strategy<Value = Role> {
        proptest::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_access_round_trip(id in "\\PC{0,40}", email in "\\PC{0,60}", role in any_role()) {
            let codec = codec();
            let payload = TokenPayload::new(id, email, role);
            let token = codec.issue_access_token(&payload).unwrap();

            prop_assert_eq!(codec.verify_access_token(&token), Some(payload.clone()));
            prop_assert_eq!(codec.verify_refresh_token(&token), None);
        }

        #[test]
        fn prop_refresh_round_trip(id in "\\PC{0,40}", email in "\\PC{0,60}", role in any_role()) {
            let codec = codec();
            let payload = TokenPayload::new(id, email, role);
            let token = codec.issue_refresh_token(&payload).unwrap();

            prop_assert_eq!(codec.verify_refresh_token(&token), Some(payload.clone()));
            prop_assert_eq!(codec.verify_access_token(&token), None);
        }
    }
}
