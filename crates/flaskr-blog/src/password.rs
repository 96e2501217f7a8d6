//! Salted password hashes.
//!
//! Stored form: `hmac-sha256$<salt hex>$<mac hex>`, where the MAC is
//! HMAC-SHA256 keyed by a random 16-byte salt over the password bytes.

use crate::BlogError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// HMAC-SHA256, shared by password hashes and session signatures.
pub type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "hmac-sha256";
const SALT_LEN: usize = 16;

/// HMAC-SHA256 keyed by `key` with `message` already absorbed.
///
/// # Errors
///
/// Returns `BlogError::MacKey` if the key is rejected.
pub fn keyed_mac(key: &[u8], message: &[u8]) -> Result<HmacSha256, BlogError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| BlogError::MacKey)?;
    mac.update(message);
    Ok(mac)
}

/// Hashes `password` with a fresh random salt.
///
/// # Errors
///
/// Returns `BlogError::MacKey` if the salt cannot key the MAC.
pub fn hash_password(password: &str) -> Result<String, BlogError> {
    let salt: [u8; SALT_LEN] = rand::random();
    let digest = keyed_mac(&salt, password.as_bytes())?.finalize().into_bytes();
    Ok(format!("{SCHEME}${}${}", hex::encode(salt), hex::encode(digest)))
}

/// Checks `password` against a stored hash in constant time.
///
/// Malformed or foreign hashes never match.
pub fn check_password(stored: &str, password: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt_hex), Some(mac_hex)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(mac_hex)) else {
        return false;
    };
    keyed_mac(&salt, password.as_bytes())
        .is_ok_and(|mac| mac.verify_slice(&expected).is_ok())
}
