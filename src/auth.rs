use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing authorization token, use: Authorization: Bearer YOUR_TOKEN")]
    MissingHeader,
    #[error("invalid authorization format, use: Authorization: Bearer YOUR_TOKEN")]
    MalformedHeader,
    #[error("empty token")]
    EmptyToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("admin access is not configured on this server")]
    NotConfigured,
}

/// Bearer-token gate for the admin endpoints.
///
/// Holds only the SHA-256 digest of the configured secret; validation hashes
/// the presented token and compares fixed-length digests, so the comparison
/// cost does not depend on how much of a prefix matches.
#[derive(Clone)]
pub struct AdminAuth {
    token_digest: Option<[u8; 32]>,
}

impl AdminAuth {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token_digest: token.map(digest),
        }
    }

    pub fn validate(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let Some(digest_expected) = self.token_digest else {
            return Err(AuthError::NotConfigured);
        };

        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingHeader)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedHeader)?;

        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        if digest(token) != digest_expected {
            return Err(AuthError::InvalidToken);
        }

        Ok(())
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Generate a fresh high-entropy admin secret (64 hex characters).
pub fn generate_secure_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}
