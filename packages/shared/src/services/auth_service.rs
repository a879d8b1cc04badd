use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::config::env_var;
use crate::models::auth::responses::{TokenClaims, TokenResponse};
use crate::services::errors::auth_service_errors::AuthServiceError;

#[cfg(test)]
use mockall::automock;

const TOKEN_TTL_HOURS: i64 = 24;

/// Verifies bearer tokens issued by the external identity provider.
#[cfg_attr(test, automock)]
pub trait AuthServiceTrait: Send + Sync {
    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError>;
    fn extract_user_id_from_token(&self, token: &str) -> Result<String, AuthServiceError>;
    /// Issues a token for local tooling and tests; production tokens come
    /// from the identity provider.
    fn generate_token(
        &self,
        user_id: &str,
        email: Option<String>,
    ) -> Result<TokenResponse, AuthServiceError>;
}

pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new() -> Result<Self, AuthServiceError> {
        let jwt_secret = env_var("JWT_SECRET")?;
        Ok(AuthService { jwt_secret })
    }

    pub fn with_jwt_secret(jwt_secret: String) -> Self {
        AuthService { jwt_secret }
    }
}

impl AuthServiceTrait for AuthService {
    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let validation = Validation::default();

        match decode::<TokenClaims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                let now = Utc::now().timestamp() as usize;
                if token_data.claims.exp < now {
                    Err(AuthServiceError::ExpiredToken)
                } else {
                    Ok(token_data.claims)
                }
            }
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(AuthServiceError::ExpiredToken)
                }
                _ => Err(AuthServiceError::InvalidToken),
            },
        }
    }

    fn extract_user_id_from_token(&self, token: &str) -> Result<String, AuthServiceError> {
        let claims = self.verify_token(token)?;
        if claims.sub.is_empty() {
            return Err(AuthServiceError::InvalidToken);
        }
        Ok(claims.sub)
    }

    fn generate_token(
        &self,
        user_id: &str,
        email: Option<String>,
    ) -> Result<TokenResponse, AuthServiceError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            email,
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| AuthServiceError::JwtError(format!("{:#?}", e)))?;

        Ok(TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: TOKEN_TTL_HOURS * 60 * 60,
        })
    }
}
