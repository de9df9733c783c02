use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::models::{IssuedToken, UserView};
use crate::utils::{hours_after, now};

/// JWT claims carried by every issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Token error types
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),

    #[error("Invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("Token expired")]
    Expired,

    #[error("Expiry {0} hours from now is out of range")]
    ExpiryOutOfRange(u32),
}

/// Issues and checks bearer tokens
#[cfg_attr(test, mockall::automock)]
pub trait TokenGenerator: Send + Sync {
    fn generate_token(&self, user: &UserView) -> Result<IssuedToken, TokenError>;
    fn validate_token(&self, token: &str) -> Result<Claims, TokenError>;
}

/// HS256 JWT implementation of TokenGenerator
pub struct JwtTokenGenerator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    hours_to_expire: u32,
    issuer: Option<String>,
}

impl JwtTokenGenerator {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            hours_to_expire: config.hours_to_expire,
            issuer: config.issuer.clone(),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

impl TokenGenerator for JwtTokenGenerator {
    fn generate_token(&self, user: &UserView) -> Result<IssuedToken, TokenError> {
        let issued_at = now();
        let expires_at = hours_after(issued_at, self.hours_to_expire)
            .ok_or(TokenError::ExpiryOutOfRange(self.hours_to_expire))?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)?;

        Ok(IssuedToken { token, expires_at })
    }

    fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })
    }
}
