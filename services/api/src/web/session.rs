//! services/api/src/web/session.rs
//!
//! The session issuer and verifier. Sessions are stateless: a signed,
//! time-limited claim set carried in a role-named cookie. The server
//! keeps no session store and offers no revocation; expiry is the only
//! invalidation.

use axum::http::header::{HeaderName, SET_COOKIE};
use axum::http::HeaderMap;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use placement_core::domain::Role;

use crate::error::ApiError;

/// Sessions last one hour.
pub const SESSION_TTL_SECS: i64 = 3600;

/// Generic cookie consulted when no role-named cookie is present.
pub const OAUTH_COOKIE: &str = "oauth_session";

/// The signed claim set carried in the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account row id.
    pub sub: Uuid,
    pub role: Role,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// A verified session, as handlers see it. `id` scopes every query the
/// handler runs; client-supplied identifiers never widen it.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
}

/// Signs and verifies session tokens with an HMAC secret.
#[derive(Clone)]
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionSigner {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issues a token for an authenticated subject.
    pub fn issue(&self, user: &SessionUser) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            email: user.email.clone(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("token encode: {}", e)))
    }

    /// Verifies signature and expiry. Any failure is the same generic
    /// 401; the caller learns nothing about why.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthenticated)
    }

    /// Reads the role-appropriate cookie (falling back to the generic
    /// OAuth cookie), verifies it, and checks the role fits the route.
    pub fn verify_request(
        &self,
        headers: &HeaderMap,
        required: Role,
    ) -> Result<SessionUser, ApiError> {
        let token = cookie_value(headers, required.cookie_name())
            .or_else(|| cookie_value(headers, OAUTH_COOKIE))
            .ok_or(ApiError::Unauthenticated)?;
        let claims = self.verify(token)?;
        if claims.role != required {
            return Err(ApiError::Forbidden);
        }
        Ok(SessionUser {
            id: claims.sub,
            role: claims.role,
            email: claims.email,
        })
    }

    /// Best-effort peek used by the public `/check-session` endpoint:
    /// returns the role of whichever valid cookie is present.
    pub fn peek(&self, headers: &HeaderMap) -> Option<SessionUser> {
        let candidates = [
            Role::SuperAdmin.cookie_name(),
            Role::Staff.cookie_name(),
            Role::Student.cookie_name(),
            OAUTH_COOKIE,
        ];
        for name in candidates {
            if let Some(token) = cookie_value(headers, name) {
                if let Ok(claims) = self.verify(token) {
                    return Some(SessionUser {
                        id: claims.sub,
                        role: claims.role,
                        email: claims.email,
                    });
                }
            }
        }
        None
    }
}

/// Pulls one cookie's value out of the Cookie header.
pub fn cookie_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    let header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|c| {
        let c = c.trim();
        c.strip_prefix(name)?.strip_prefix('=')
    })
}

fn set_cookie(name: &str, token: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, SESSION_TTL_SECS
    )
}

fn clear_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// Set-Cookie headers that install `token` for `role` and clear the
/// other two role cookies plus the generic OAuth cookie, so at most one
/// role cookie is valid per client.
pub fn session_cookies(role: Role, token: &str) -> Vec<(HeaderName, String)> {
    let mut headers = vec![(SET_COOKIE, set_cookie(role.cookie_name(), token))];
    for other in [Role::SuperAdmin, Role::Staff, Role::Student] {
        if other != role {
            headers.push((SET_COOKIE, clear_cookie(other.cookie_name())));
        }
    }
    headers.push((SET_COOKIE, clear_cookie(OAUTH_COOKIE)));
    headers
}

/// Set-Cookie headers clearing every session cookie. Used by logout.
pub fn logout_cookies() -> Vec<(HeaderName, String)> {
    [
        Role::SuperAdmin.cookie_name(),
        Role::Staff.cookie_name(),
        Role::Student.cookie_name(),
        OAUTH_COOKIE,
    ]
    .iter()
    .map(|name| (SET_COOKIE, clear_cookie(name)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn signer() -> SessionSigner {
        SessionSigner::new("a-test-secret-of-adequate-length")
    }

    fn user(role: Role) -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            role,
            email: "2024001@saec.ac.in".to_string(),
        }
    }

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie.parse().unwrap());
        headers
    }

    #[test]
    fn issued_tokens_verify() {
        let s = signer();
        let u = user(Role::Student);
        let token = s.issue(&u).unwrap();
        let claims = s.verify(&token).unwrap();
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_SECS);
    }

    #[test]
    fn expired_tokens_are_rejected_despite_valid_signature() {
        let s = signer();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::Staff,
            email: "jdoe@saec.ac.in".to_string(),
            iat: Utc::now().timestamp() - 2 * SESSION_TTL_SECS,
            exp: Utc::now().timestamp() - SESSION_TTL_SECS,
        };
        let token = encode(&Header::default(), &claims, &s.encoding_key).unwrap();
        assert!(s.verify(&token).is_err());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = signer().issue(&user(Role::Staff)).unwrap();
        let other = SessionSigner::new("a-different-secret-entirely!");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn verify_request_reads_the_role_cookie() {
        let s = signer();
        let token = s.issue(&user(Role::Student)).unwrap();
        let headers = headers_with(&format!("student_session={}", token));
        let verified = s.verify_request(&headers, Role::Student).unwrap();
        assert_eq!(verified.role, Role::Student);
    }

    #[test]
    fn oauth_cookie_is_a_fallback() {
        let s = signer();
        let token = s.issue(&user(Role::Staff)).unwrap();
        let headers = headers_with(&format!("oauth_session={}", token));
        assert!(s.verify_request(&headers, Role::Staff).is_ok());
    }

    #[test]
    fn wrong_role_is_forbidden_not_unauthenticated() {
        let s = signer();
        let token = s.issue(&user(Role::Student)).unwrap();
        let headers = headers_with(&format!("oauth_session={}", token));
        let err = s.verify_request(&headers, Role::Staff).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn missing_cookie_is_unauthenticated() {
        let err = signer()
            .verify_request(&HeaderMap::new(), Role::Student)
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[test]
    fn issuing_a_session_clears_the_other_role_cookies() {
        let cookies = session_cookies(Role::Student, "tok");
        let values: Vec<&str> = cookies.iter().map(|(_, v)| v.as_str()).collect();
        assert!(values[0].starts_with("student_session=tok"));
        assert!(values
            .iter()
            .any(|v| v.starts_with("admin_session=;") && v.contains("Max-Age=0")));
        assert!(values
            .iter()
            .any(|v| v.starts_with("staff_session=;") && v.contains("Max-Age=0")));
        assert!(values
            .iter()
            .any(|v| v.starts_with("oauth_session=;") && v.contains("Max-Age=0")));
    }

    #[test]
    fn cookie_parsing_handles_multiple_cookies() {
        let headers = headers_with("a=1; student_session=tok; b=2");
        assert_eq!(cookie_value(&headers, "student_session"), Some("tok"));
        assert_eq!(cookie_value(&headers, "staff_session"), None);
    }
}
