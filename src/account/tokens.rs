/// JWT access and refresh tokens
use crate::error::{InventoryError, InventoryResult};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of JWT, carried in the `token_type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims shared by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub user_id: i64,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies HS256 tokens
#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl JwtIssuer {
    pub fn new(secret: &str, access_ttl: i64, refresh_ttl: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue a token of the given type for a user
    pub fn issue(&self, user_id: i64, token_type: TokenType) -> InventoryResult<String> {
        let now = Utc::now().timestamp();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            token_type,
            user_id,
            jti: Uuid::new_v4().simple().to_string(),
            iat: now,
            exp: now + ttl,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| InventoryError::Jwt(format!("Failed to generate token: {}", e)))
    }

    /// Verify signature, expiry and token type
    pub fn verify(&self, token: &str, expected: TokenType) -> InventoryResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("JWT verification failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    InventoryError::Authentication("Token has expired".to_string())
                }
                _ => InventoryError::Authentication("Token is invalid or expired".to_string()),
            }
        })?;

        if data.claims.token_type != expected {
            return Err(InventoryError::Authentication(
                "Token has wrong type".to_string(),
            ));
        }

        Ok(data.claims)
    }
}
