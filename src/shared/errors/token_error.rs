use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

/// 토큰 검증/발급 에러 (Token Codec 전용)
/// Token codec errors
///
/// Expiry is benign (re-authenticate); a bad signature is a security event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// 만료된 토큰
    #[error("Token expired")]
    Expired,

    /// 서명 불일치 (위조 또는 다른 키)
    #[error("Token signature mismatch")]
    BadSignature,

    /// 형식 오류 (디코딩 실패, 필수 claim 누락)
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// access 토큰 자리에 refresh 토큰 (또는 반대)
    #[error("Unexpected token kind")]
    WrongKind,

    /// 서명 생성 실패
    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}
