use actix_web::{HttpMessage, HttpResponse, dev::ServiceRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    access::{Principal, Role},
    env_config::JwtConfig,
    error::{AppError, Res},
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: Uuid,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: usize,
}

impl JwtClaims {
    pub fn principal(&self) -> Principal {
        Principal::new(Role::from_string(&self.role)).with_permissions(self.permissions.clone())
    }
}

pub struct TokenSubject {
    pub subject: Uuid,
    pub role: Role,
    pub permissions: Vec<String>,
}

/// Generates JWT token for the given subject and JWT configuration options
pub fn generate_jwt(subject: TokenSubject, config: &JwtConfig) -> Res<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.expiration_hours))
        .ok_or_else(|| AppError::Internal("Token expiration overflows".to_string()))?
        .timestamp();

    let claims = JwtClaims {
        sub: subject.subject,
        role: subject.role.as_str().to_string(),
        permissions: subject.permissions,
        exp: expiration as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Extracts claims object from JWT token.
/// Requires JWT secret.
pub fn validate_jwt(token: &str, secret: &str) -> Res<JwtClaims> {
    let token_data = jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Reads a `Bearer` token out of the `Authorization` header.
pub fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

pub fn get_jwt_claims_or_error(req: &impl HttpMessage) -> Result<JwtClaims, HttpResponse> {
    if let Some(claims) = req.extensions().get::<JwtClaims>() {
        Ok(claims.clone())
    } else {
        Err(
            AppError::Unauthorized("No authorization token provided".to_string())
                .to_http_response(),
        )
    }
}
