//! Session handling.
//!
//! Two independent cookies are in play:
//!
//! - `session` carries the signed-in identity. Its value is
//!   `base64url(json) "." hex(hmac_sha256(secret, base64url(json)))`, so the
//!   server can trust it without a lookup. Anything that fails to verify or
//!   parse reads as "no session".
//! - `doro_cart` is the tower-sessions id cookie for the per-browser cart
//!   record, stored in `PostgreSQL` in production.

use axum::http::{HeaderMap, HeaderValue, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use dorodango_core::SessionUser;

/// Identity cookie name.
pub const IDENTITY_COOKIE_NAME: &str = "session";

/// Cart session cookie name.
pub const CART_COOKIE_NAME: &str = "doro_cart";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

type HmacSha256 = Hmac<Sha256>;

/// Error building the identity signer.
#[derive(Debug, thiserror::Error)]
#[error("invalid session signing key")]
pub struct InvalidSigningKey;

/// Signs and verifies the identity cookie.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
    secure: bool,
}

impl SessionSigner {
    /// Create a signer from the configured secret.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSigningKey` if the key is rejected by the MAC.
    pub fn new(secret: &SecretString, secure: bool) -> Result<Self, InvalidSigningKey> {
        let mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|_| InvalidSigningKey)?;
        Ok(Self { mac, secure })
    }

    /// Encode and sign an identity.
    #[must_use]
    pub fn encode(&self, user: &SessionUser) -> String {
        // Serializing a struct of strings cannot fail.
        let json = serde_json::to_vec(user).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.sign(payload.as_bytes());
        format!("{payload}.{signature}")
    }

    /// Verify and decode a cookie value.
    #[must_use]
    pub fn decode(&self, value: &str) -> Option<SessionUser> {
        let (payload, signature) = value.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// Read the identity from request headers.
    #[must_use]
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionUser> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == IDENTITY_COOKIE_NAME)
            .and_then(|cookie| self.decode(cookie.value()))
    }

    /// `Set-Cookie` value that stores `user`.
    #[must_use]
    pub fn set_cookie(&self, user: &SessionUser) -> HeaderValue {
        let cookie = self
            .base_cookie(self.encode(user))
            .max_age(Duration::seconds(SESSION_EXPIRY_SECONDS))
            .build();
        to_header(&cookie)
    }

    /// `Set-Cookie` value that removes the identity.
    #[must_use]
    pub fn clear_cookie(&self) -> HeaderValue {
        let cookie = self
            .base_cookie(String::new())
            .max_age(Duration::ZERO)
            .build();
        to_header(&cookie)
    }

    fn base_cookie(&self, value: String) -> tower_sessions::cookie::CookieBuilder<'static> {
        Cookie::build((IDENTITY_COOKIE_NAME, value))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .secure(self.secure)
    }

    fn sign(&self, payload: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}

fn to_header(cookie: &Cookie<'_>) -> HeaderValue {
    // Names, base64url and hex are all valid header characters.
    HeaderValue::from_str(&cookie.to_string()).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Create the cart session layer on top of `store`.
#[must_use]
pub fn create_session_layer<S>(store: S, secure: bool) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(CART_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer() -> SessionSigner {
        SessionSigner::new(&SecretString::from("k".repeat(32)), false).unwrap()
    }

    fn asha() -> SessionUser {
        SessionUser::new("u-1", "Asha", "asha@example.com")
    }

    #[test]
    fn test_encode_decode() {
        let signer = signer();
        let value = signer.encode(&asha());
        assert_eq!(signer.decode(&value), Some(asha()));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let signer = signer();
        let value = signer.encode(&asha());
        let (_, signature) = value.rsplit_once('.').unwrap();

        let forged = SessionUser::new("u-2", "Mallory", "mallory@example.com");
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        assert_eq!(signer.decode(&format!("{forged_payload}.{signature}")), None);
    }

    #[test]
    fn test_garbage_reads_as_no_session() {
        let signer = signer();
        assert_eq!(signer.decode(""), None);
        assert_eq!(signer.decode("not-a-cookie"), None);
        assert_eq!(signer.decode("{\"name\":\"x\"}"), None);
        assert_eq!(signer.decode("abc.zz"), None);
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let other = SessionSigner::new(&SecretString::from("q".repeat(32)), false).unwrap();
        let value = signer().encode(&asha());
        assert_eq!(other.decode(&value), None);
    }

    #[test]
    fn test_read_from_cookie_header() {
        let signer = signer();
        let mut headers = HeaderMap::new();
        let cookie = format!("doro_cart=abc; session={}", signer.encode(&asha()));
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        assert_eq!(signer.read(&headers), Some(asha()));
        assert_eq!(signer.read(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let set = signer().set_cookie(&asha());
        let set = set.to_str().unwrap();
        assert!(set.starts_with("session="));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("SameSite=Strict"));
        assert!(set.contains("Path=/"));
        assert!(set.contains("Max-Age=604800"));
        assert!(!set.contains("Secure"));

        let secure = SessionSigner::new(&SecretString::from("k".repeat(32)), true).unwrap();
        assert!(secure.set_cookie(&asha()).to_str().unwrap().contains("Secure"));

        let cleared = signer().clear_cookie();
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }
}
