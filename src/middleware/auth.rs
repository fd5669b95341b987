use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::middleware::error_handling::AppError;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    pub fn generate_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as usize;

        // Shorter admin sessions
        let exp = if role.is_admin() {
            now + 2 * 60 * 60
        } else {
            now + 24 * 60 * 60
        };

        let claims = Claims {
            sub: user_id.to_string(),
            user_id,
            email: email.to_string(),
            role,
            exp,
            iat: now,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
    }

    pub fn extract_token_from_header(auth_header: &str) -> Option<&str> {
        auth_header.strip_prefix("Bearer ")
    }
}

/// Requires a valid bearer token and inserts the decoded [`Claims`] as a
/// request extension for downstream handlers. Missing and invalid tokens go
/// through the [`AppError`] taxonomy so 401s carry the same JSON envelope as
/// every other error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let jwt_service = JwtService::new(&state.config.jwt_secret);

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(JwtService::extract_token_from_header)
        .ok_or(AppError::Unauthorized)?;

    let claims = jwt_service.validate_token(token)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_preserves_claims() {
        let service = JwtService::new("test-secret");
        let user_id = Uuid::new_v4();

        let token = service
            .generate_token(user_id, "ann@example.com", UserRole::Customer)
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "ann@example.com");
        assert!(!claims.is_admin());
    }

    #[test]
    fn validation_rejects_wrong_secret() {
        let service = JwtService::new("test-secret");
        let token = service
            .generate_token(Uuid::new_v4(), "ann@example.com", UserRole::Admin)
            .unwrap();

        let other = JwtService::new("different-secret");
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn extract_token_requires_bearer_scheme() {
        assert_eq!(
            JwtService::extract_token_from_header("Bearer abc.def.ghi"),
            Some("abc.def.ghi")
        );
        assert_eq!(JwtService::extract_token_from_header("Basic abc"), None);
    }
}
