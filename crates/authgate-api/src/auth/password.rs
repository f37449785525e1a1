//! 비밀번호 해싱 유틸리티.
//!
//! Argon2id 기반 비밀번호 해싱 및 검증.
//!
//! 해싱은 CPU/메모리 집약적이므로 async 컨텍스트에서는
//! [`hash_password_async`], [`verify_password_async`]를 사용해
//! blocking thread pool에서 실행합니다.

use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use tracing::{error, warn};

use crate::error::ApiError;

/// 비밀번호 처리 에러.
///
/// 잘못된 비밀번호는 에러가 아니라 `Ok(false)`입니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패: {0}")]
    HashingFailed(String),
    #[error("잘못된 해시 형식: {0}")]
    InvalidHashFormat(String),
}

/// 비밀번호 해싱.
///
/// 호출마다 새 솔트를 생성하므로 같은 비밀번호라도 매번 다른 해시가 나옵니다.
///
/// # Returns
///
/// PHC 형식의 해시 문자열 (솔트 포함)
///
/// # Example
///
/// ```rust,ignore
/// let hash = hash_password("my_secure_password")?;
/// // "$argon2id$v=19$m=19456,t=2,p=1$..."
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(hash.to_string())
}

/// 비밀번호 검증.
///
/// 저장된 해시를 같은 파라미터로 재계산해 상수 시간 비교합니다.
///
/// # Returns
///
/// - `Ok(true)`: 일치
/// - `Ok(false)`: 불일치
/// - `Err(InvalidHashFormat)`: PHC 형식이 아니거나, 솔트/다이제스트가 없거나,
///   이 방식으로 검증할 수 없는 해시
pub fn verify_password(hash: &str, password: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHashFormat(e.to_string()))?;

    // 솔트나 다이제스트가 빠진 PHC 문자열은 불일치가 아니라 손상된 해시
    if parsed_hash.salt.is_none() || parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHashFormat("salt or digest missing".to_string()));
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::InvalidHashFormat(e.to_string())),
    }
}

/// [`hash_password`]를 blocking thread pool에서 실행.
pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::HashingFailed(format!("해싱 태스크 실행 실패: {}", e)))?
}

/// [`verify_password`]를 blocking thread pool에서 실행.
pub async fn verify_password_async(hash: String, password: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|e| PasswordError::HashingFailed(format!("검증 태스크 실행 실패: {}", e)))?
}

/// 로그인 처리용 자격 증명 검증.
///
/// 해시 장애는 클라이언트에 인증 실패 이상으로 노출하지 않습니다.
///
/// - 불일치: `Unauthorized("Invalid credentials")`
/// - 해시 장애: `Unauthorized("Authentication failed")` (warn 로그)
pub async fn verify_credentials(hash: &str, password: &str) -> Result<(), ApiError> {
    match verify_password_async(hash.to_owned(), password.to_owned()).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ApiError::unauthorized("Invalid credentials")),
        Err(e) => {
            warn!(error = %e, "Stored password hash could not be verified");
            Err(ApiError::unauthorized("Authentication failed"))
        }
    }
}

/// 비밀번호 설정 등 로그인 외 경로의 해시 장애는 500으로 변환합니다.
impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        error!(error = %e, "Password hashing fault");
        ApiError::internal_error("Password processing failed")
    }
}
