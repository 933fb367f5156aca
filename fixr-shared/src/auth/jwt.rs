/// Bearer token validation
///
/// Tokens are HS256-signed by the identity provider with a secret shared
/// with the API. The `sub` claim is the opaque owner id that scopes every
/// repository call.
///
/// # Example
///
/// ```
/// use fixr_shared::auth::jwt::{create_token, validate_access_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-shared-secret-of-at-least-32-bytes";
/// let token = create_token(&Claims::new("user_2abc"), secret)?;
///
/// let claims = validate_access_token(&token, secret)?;
/// assert_eq!(claims.sub, "user_2abc");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const ISSUER: &str = "fixr";

const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("failed to create token: {0}")]
    Create(String),

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Owner id
    pub sub: String,

    pub iss: String,

    pub iat: i64,

    pub exp: i64,

    pub nbf: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    pub fn new(sub: impl Into<String>) -> Self {
        Self::with_expiration(sub, Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn with_expiration(sub: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: sub.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            email: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::Create(e.to_string()))
}

/// Checks signature, issuer, `exp` and `nbf`; rejects an empty subject
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_nbf = true;
    validation.leeway = 0;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })?;

    if data.claims.sub.trim().is_empty() {
        return Err(JwtError::Invalid("empty subject".to_string()));
    }

    Ok(data.claims)
}
