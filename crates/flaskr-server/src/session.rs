//! Signed session cookie carrying the logged-in user id.
//!
//! Cookie value: `<user_id>.<hex HMAC-SHA256(secret_key, user_id)>`.

use axum::http::{header, HeaderMap};
use flaskr_blog::{password::keyed_mac, BlogError};
use hmac::Mac;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Signs `user_id` into a cookie value.
///
/// # Errors
///
/// Returns `BlogError::MacKey` if `secret` cannot key the MAC.
pub fn sign_session(secret: &str, user_id: i64) -> Result<String, BlogError> {
    let id = user_id.to_string();
    let tag = keyed_mac(secret.as_bytes(), id.as_bytes())?
        .finalize()
        .into_bytes();
    Ok(format!("{id}.{}", hex::encode(tag)))
}

/// Returns the user id if `value` carries a valid signature.
pub fn verify_session(secret: &str, value: &str) -> Option<i64> {
    let (id, tag_hex) = value.split_once('.')?;
    let tag = hex::decode(tag_hex).ok()?;
    keyed_mac(secret.as_bytes(), id.as_bytes())
        .ok()?
        .verify_slice(&tag)
        .ok()?;
    id.parse().ok()
}

/// Reads and verifies the session cookie from request headers.
///
/// Missing, malformed, or tampered cookies all read as "no session".
pub fn read_session(headers: &HeaderMap, secret: &str) -> Option<i64> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| verify_session(secret, value))
}

/// `Set-Cookie` value that logs `user_id` in.
///
/// # Errors
///
/// Propagates signing failures from [`sign_session`].
pub fn session_cookie(secret: &str, user_id: i64) -> Result<String, BlogError> {
    Ok(format!(
        "{SESSION_COOKIE}={}; HttpOnly; Path=/; SameSite=Lax",
        sign_session(secret, user_id)?
    ))
}

/// `Set-Cookie` value that clears the session.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Max-Age=0; HttpOnly; Path=/; SameSite=Lax")
}
