//! HS256 tokens carrying the actor id and its permissions.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mediashelf_core::{Actor, AppError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl JwtClaims {
    pub fn into_actor(self) -> Actor {
        Actor::new(self.sub, self.permissions)
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        let token_data = decode::<JwtClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid or expired token".to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Sign a token for `actor` valid for `ttl`.
    pub fn issue_token(&self, actor: &Actor, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let mut permissions: Vec<String> = actor.permissions.iter().cloned().collect();
        permissions.sort();

        let claims = JwtClaims {
            sub: actor.id,
            permissions,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

    #[test]
    fn test_issue_and_validate() {
        let keys = JwtKeys::new(SECRET);
        let actor = Actor::new(Uuid::new_v4(), ["admin.upload", "vop.view"]);

        let token = keys.issue_token(&actor, Duration::minutes(5)).unwrap();
        let claims = keys.validate_token(&token).unwrap();

        assert_eq!(claims.into_actor(), actor);
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = JwtKeys::new(SECRET);
        let actor = Actor::new(Uuid::new_v4(), Vec::<String>::new());

        let token = keys.issue_token(&actor, Duration::minutes(-5)).unwrap();
        assert!(matches!(
            keys.validate_token(&token),
            Err(AppError::Unauthorized(msg)) if msg == "Token has expired"
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtKeys::new(SECRET)
            .issue_token(&Actor::anonymous(), Duration::minutes(5))
            .unwrap();
        let other = JwtKeys::new("another-secret-that-is-also-32-chars-long");
        assert!(other.validate_token(&token).is_err());
    }
}
