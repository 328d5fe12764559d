use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Deserialize;

use crate::models::user::Claims;

pub const DEFAULT_TTL_MINUTES: i64 = 15;
pub const MIN_SECRET_LEN: usize = 32;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidToken {
    Malformed,
    BadSignature,
    Expired,
    MissingSubject,
}

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            InvalidToken::Malformed => "malformed token",
            InvalidToken::BadSignature => "signature or algorithm mismatch",
            InvalidToken::Expired => "token expired",
            InvalidToken::MissingSubject => "token has no subject",
        };
        f.write_str(reason)
    }
}

impl std::error::Error for InvalidToken {}

#[derive(Debug)]
pub enum IssueError {
    /// `now + ttl` falls outside the representable time range.
    TtlOutOfRange,
    Encode(jsonwebtoken::errors::Error),
}

impl fmt::Display for IssueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueError::TtlOutOfRange => f.write_str("token lifetime out of range"),
            IssueError::Encode(e) => write!(f, "token encoding failed: {}", e),
        }
    }
}

impl std::error::Error for IssueError {}

impl From<jsonwebtoken::errors::Error> for IssueError {
    fn from(inner: jsonwebtoken::errors::Error) -> Self {
        IssueError::Encode(inner)
    }
}

// Decoded before any field is trusted, so absent claims surface as typed
// rejections instead of a generic JSON error.
#[derive(Deserialize)]
struct UncheckedClaims {
    sub: Option<String>,
    exp: Option<i64>,
    #[serde(default)]
    iat: i64,
}

/// Issues and validates HS256 access tokens. The secret is fixed for the
/// lifetime of the service; replacing it invalidates every issued token.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against an explicit clock in `validate_at`.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(
        &self,
        subject: &str,
        ttl: Option<Duration>,
    ) -> Result<String, IssueError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        let ttl = ttl.unwrap_or_else(|| Duration::minutes(DEFAULT_TTL_MINUTES));
        let expires = now
            .checked_add_signed(ttl)
            .ok_or(IssueError::TtlOutOfRange)?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires.timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)?)
    }

    /// Returns the token's subject.
    pub fn validate(&self, token: &str) -> Result<String, InvalidToken> {
        self.validate_at(token, Utc::now()).map(|claims| claims.sub)
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, InvalidToken> {
        let data = decode::<UncheckedClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    InvalidToken::BadSignature
                }
                _ => InvalidToken::Malformed,
            })?;

        let claims = data.claims;
        let exp = claims.exp.ok_or(InvalidToken::Malformed)?;
        if now.timestamp() >= exp {
            return Err(InvalidToken::Expired);
        }

        let sub = claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(InvalidToken::MissingSubject)?;

        Ok(Claims {
            sub,
            exp,
            iat: claims.iat,
        })
    }
}
