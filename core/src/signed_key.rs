//! Signed search keys.
//!
//! A signed search key is an HS256 JWT whose claims are search options the
//! service enforces on every search made with it (filters excepted), plus
//! the name of the API key that signed it. The service verifies the
//! signature with that key, so the token can be handed to untrusted
//! clients.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;

use crate::error::ApiError;
use crate::types::Options;

pub const SIGNED_SEARCH_KEY_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claim carrying the signing key's name.
pub const API_KEY_NAME_CLAIM: &str = "api_key_name";

/// Sign `options` with `api_key`, adding the `api_key_name` claim.
///
/// `options` is copied; the caller's map is not modified.
pub fn create_signed_search_key(
    api_key: &str,
    api_key_name: &str,
    options: &Options,
) -> Result<String, ApiError> {
    let mut claims = options.clone();
    claims.insert(
        API_KEY_NAME_CLAIM.to_string(),
        Value::String(api_key_name.to_string()),
    );
    let token = encode(
        &Header::new(SIGNED_SEARCH_KEY_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(api_key.as_bytes()),
    )?;
    Ok(token)
}
