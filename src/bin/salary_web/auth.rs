use axum::{
    extract::{Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

use crate::AppState;

/// Name of the cookie holding the session JWT
pub const AUTH_COOKIE: &str = "auth_token";

/// User credentials structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role (admin, user, etc.)
    pub role: String,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret for signing/verifying tokens
    pub jwt_secret: Vec<u8>,
    /// Token expiration time in minutes
    pub token_expiration_minutes: i64,
    pub admin_username: String,
    pub admin_password: String,
}

impl AuthConfig {
    /// Read credentials from the environment
    pub fn from_env() -> Self {
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ => {
                // Sessions do not survive a restart without a fixed secret
                warn!("JWT_SECRET is not set, using a random secret");
                random_secret()
            }
        };

        Self {
            jwt_secret,
            token_expiration_minutes: 60 * 12,
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "password".to_string()),
        }
    }
}

fn random_secret() -> Vec<u8> {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.to_vec()
}

/// Authentication error
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    /// Wrong username or password
    Unauthorized,
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => {
                Redirect::to("/login").into_response()
            }
            AuthError::Unauthorized => (StatusCode::FORBIDDEN, "Not authorized").into_response(),
            AuthError::Other(err) => {
                error!("Auth error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Authenticated user, inserted into request extensions by the middleware
#[derive(Debug, Clone)]
pub struct JwtAuth {
    pub claims: Claims,
}

/// Extract the JWT from the auth cookie or the Authorization header
pub fn extract_token(jar: &CookieJar, parts: &Parts) -> Result<String, AuthError> {
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        return Ok(cookie.value().to_string());
    }

    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;
    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidToken)?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .ok_or(AuthError::InvalidToken)
}

/// Auth service for token operations
pub struct AuthService {
    config: Arc<AuthConfig>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> Arc<AuthConfig> {
        self.config.clone()
    }

    /// Check credentials and issue a token
    pub fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if username == self.config.admin_username && password == self.config.admin_password {
            self.generate_token(username, "admin").map_err(AuthError::Other)
        } else {
            Err(AuthError::Unauthorized)
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: &str, role: &str) -> Result<String, String> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.config.token_expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.config.jwt_secret),
        )
        .map_err(|e| format!("Failed to generate token: {}", e))
    }

    /// Validate a JWT token
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.config.jwt_secret),
            &Validation::default(),
        )
        .map(|token_data| token_data.claims)
        .map_err(|e| {
            warn!("JWT validation error: {:?}", e);
            AuthError::InvalidToken
        })
    }
}

fn is_public(path: &str) -> bool {
    matches!(path, "/" | "/login" | "/logout" | "/health")
}

/// Reject requests without a valid JWT. API routes get 401, pages redirect to the login form.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    let is_api = req.uri().path().starts_with("/api/");
    let (parts, body) = req.into_parts();

    let claims = extract_token(&jar, &parts)
        .and_then(|token| state.auth_service.validate_token(&token));

    match claims {
        Ok(claims) => {
            let mut req = Request::from_parts(parts, body);
            req.extensions_mut().insert(JwtAuth { claims });
            next.run(req).await
        }
        Err(_) if is_api => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authentication required" })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: b"test-secret".to_vec(),
            token_expiration_minutes: 5,
            admin_username: "admin".to_string(),
            admin_password: "hunter2".to_string(),
        })
    }

    #[test]
    fn test_authenticate() {
        let service = service();
        let token = service.authenticate("admin", "hunter2").unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role, "admin");

        assert!(matches!(
            service.authenticate("admin", "wrong"),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = service().generate_token("admin", "admin").unwrap();
        let other = AuthService::new(AuthConfig {
            jwt_secret: random_secret(),
            ..(*service().config()).clone()
        });
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        let jar = CookieJar::from_headers(&parts.headers);
        assert_eq!(extract_token(&jar, &parts).unwrap(), "abc.def");

        let request = axum::http::Request::builder()
            .header(header::COOKIE, "theme=dark; auth_token=from-cookie")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        let jar = CookieJar::from_headers(&parts.headers);
        assert_eq!(extract_token(&jar, &parts).unwrap(), "from-cookie");
    }
}
