//! Actix-web extractor for bearer token authentication.
//!
//! The raw token is held as a `SecretString` and never logged.

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use secrecy::{ExposeSecret, SecretString};
use std::future::{Ready, ready};
use tracing::debug;

use super::verify_access_token;
use crate::config::{AUTHORIZATION_HEADER, AuthSettings};
use crate::error::ErrorResponse;
use crate::models::AuthenticatedUser;

/// Bearer token from the authorization header, if well formed.
fn extract_bearer(req: &HttpRequest) -> Option<SecretString> {
    req.headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| SecretString::from(t.to_string()))
}

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED)
            .json(ErrorResponse::new("UNAUTHORIZED", self.message.clone()))
    }
}

/// Extractor that requires a valid access token.
///
/// ```ignore
/// async fn handler(auth: UserAuth) -> impl Responder {
///     // auth.user.user_id is the verified caller
/// }
/// ```
pub struct UserAuth {
    pub user: AuthenticatedUser,
}

impl FromRequest for UserAuth {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(settings) = req.app_data::<web::Data<AuthSettings>>() else {
            return ready(Err(AuthError {
                message: "Internal configuration error".to_string(),
            }));
        };

        let Some(token) = extract_bearer(req) else {
            return ready(Err(AuthError {
                message: "Missing bearer token".to_string(),
            }));
        };

        match verify_access_token(token.expose_secret(), settings.get_ref()) {
            Ok(user) => ready(Ok(UserAuth { user })),
            Err(message) => {
                debug!(path = %req.path(), "Rejected access token");
                ready(Err(AuthError { message }))
            }
        }
    }
}
