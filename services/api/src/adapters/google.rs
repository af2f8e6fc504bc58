//! services/api/src/adapters/google.rs
//!
//! This module contains the adapter for the Google OAuth identity
//! provider. It implements the `IdentityProvider` port from the `core`
//! crate: consent URL construction, code-for-token exchange, userinfo
//! lookup, and token revocation for rejected identities.

use async_trait::async_trait;
use serde::Deserialize;

use placement_core::domain::ExternalIdentity;
use placement_core::ports::{AuthorizedIdentity, IdentityProvider, PortError, PortResult};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `IdentityProvider` port against Google.
#[derive(Clone)]
pub struct GoogleIdentityAdapter {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleIdentityAdapter {
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            redirect_url,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfoResponse {
    sub: String,
    email: String,
    name: Option<String>,
}

//=========================================================================================
// `IdentityProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityProvider for GoogleIdentityAdapter {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> PortResult<AuthorizedIdentity> {
        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("token exchange failed: {}", e)))?
            .error_for_status()
            .map_err(|_| PortError::Unauthorized)?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed token response: {}", e)))?;

        let info: UserInfoResponse = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("userinfo failed: {}", e)))?
            .error_for_status()
            .map_err(|_| PortError::Unauthorized)?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed userinfo: {}", e)))?;

        Ok(AuthorizedIdentity {
            identity: ExternalIdentity {
                subject: info.sub,
                email: info.email,
                name: info.name,
            },
            access_token: token.access_token,
        })
    }

    async fn revoke(&self, access_token: &str) -> PortResult<()> {
        self.client
            .post(REVOKE_URL)
            .form(&[("token", access_token)])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("revocation failed: {}", e)))?;
        Ok(())
    }
}
