//! Bearer token authentication.

mod extractor;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::models::{AccessClaims, AuthenticatedUser};

pub use extractor::{AuthError, UserAuth};

/// Verify an HS256 access token and return the caller.
///
/// Checks signature, expiry and audience; `sub` must be a UUID.
pub fn verify_access_token(token: &str, settings: &AuthSettings) -> Result<AuthenticatedUser, String> {
    let key = DecodingKey::from_secret(settings.jwt_secret.expose_secret().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[settings.audience.as_str()]);

    let data = decode::<AccessClaims>(token, &key, &validation)
        .map_err(|e| format!("Invalid token: {}", e))?;

    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| "Invalid token: subject is not a user id".to_string())?;

    Ok(AuthenticatedUser { user_id })
}
