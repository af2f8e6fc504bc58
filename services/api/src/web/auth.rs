//! services/api/src/web/auth.rs
//!
//! OAuth login endpoints, the role-resolution orchestration they drive,
//! logout, and the argon2 password helpers shared by the three
//! role-scoped login handlers.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Query, State},
    http::{header::LOCATION, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::IntoParams;

use placement_core::domain::{ExternalIdentity, Profile, Role};
use placement_core::ports::{DatabaseService, PortError};
use placement_core::roles::{RoleError, RolePolicy};

use crate::error::ApiError;
use crate::web::session::{logout_cookies, session_cookies, SessionUser};
use crate::web::state::AppState;

//=========================================================================================
// Password Helpers
//=========================================================================================

/// Hashes a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hash: {}", e)))?
        .to_string())
}

/// Verifies a login attempt. Every failure path, including an account
/// that has no password at all, returns the same `Unauthenticated` so
/// the response never reveals which condition failed.
pub fn verify_password(password: &str, stored_hash: Option<&str>) -> Result<(), ApiError> {
    let hash = stored_hash.ok_or(ApiError::Unauthenticated)?;
    let parsed = PasswordHash::new(hash).map_err(|_| ApiError::Unauthenticated)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::Unauthenticated)
}

//=========================================================================================
// Password Login Plumbing (shared by the three role login handlers)
//=========================================================================================

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The 302-plus-cookies response every successful login sends, password
/// and OAuth alike.
pub fn login_redirect(
    state: &AppState,
    user: SessionUser,
) -> Result<impl IntoResponse, ApiError> {
    let token = state.sessions.issue(&user)?;
    let target = format!("{}/{}", state.config.frontend_url, user.role.as_str());
    let mut headers = session_cookies(user.role, &token);
    headers.push((LOCATION, target));
    Ok((StatusCode::FOUND, AppendHeaders(headers)))
}

//=========================================================================================
// Role Resolution Orchestration
//=========================================================================================

/// Classifies a verified external identity, enforces pre-registration for
/// staff and students, and upserts the rows that remember the outcome.
///
/// Super-admins are provisioned on first login; staff and students must
/// already exist in their account table (registered by an administrator),
/// and their absence is an authorization failure, not an auto-create.
/// A repeat login reuses the classification remembered in the identity's
/// profile row instead of re-running the policy.
pub async fn resolve_and_provision(
    db: &dyn DatabaseService,
    policy: &RolePolicy,
    identity: &ExternalIdentity,
    intended: Option<Role>,
) -> Result<SessionUser, ApiError> {
    // Accounts are stored lowercased; the provider's casing is not ours.
    let email = identity.email.to_lowercase();

    let role = match db.get_profile(&identity.subject).await {
        Ok(profile) => match intended {
            Some(expected) if expected != profile.role => return Err(ApiError::Forbidden),
            _ => profile.role,
        },
        Err(PortError::NotFound(_)) => policy.resolve_expecting(&email, intended)?,
        Err(e) => return Err(e.into()),
    };

    let id = match role {
        Role::SuperAdmin => db.upsert_super_admin(&email).await?.id,
        Role::Staff => match db.get_staff_by_email(&email).await {
            Ok(staff) => staff.id,
            Err(PortError::NotFound(_)) => return Err(ApiError::Unauthenticated),
            Err(e) => return Err(e.into()),
        },
        Role::Student => match db.get_student_by_email(&email).await {
            Ok(student) => student.id,
            Err(PortError::NotFound(_)) => return Err(ApiError::Unauthenticated),
            Err(e) => return Err(e.into()),
        },
    };

    db.upsert_profile(Profile {
        provider_subject: identity.subject.clone(),
        email: email.clone(),
        role,
    })
    .await?;

    Ok(SessionUser { id, role, email })
}

//=========================================================================================
// Handlers
//=========================================================================================

#[derive(Deserialize, IntoParams)]
pub struct OAuthStartParams {
    /// The role the caller believes they hold; rejected on mismatch.
    pub role: Option<String>,
}

/// GET /auth/google - Redirect the browser to the provider's consent page.
#[utoipa::path(
    get,
    path = "/auth/google",
    params(OAuthStartParams),
    responses(
        (status = 302, description = "Redirect to the identity provider")
    )
)]
pub async fn oauth_start_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OAuthStartParams>,
) -> impl IntoResponse {
    // The intended role rides along in the OAuth state parameter.
    let oauth_state = params.role.unwrap_or_default();
    Redirect::to(&state.identity.authorize_url(&oauth_state))
}

#[derive(Deserialize, IntoParams)]
pub struct OAuthCallbackParams {
    pub code: String,
    #[serde(default)]
    pub state: String,
}

/// GET /auth/google/callback - Complete the OAuth login.
///
/// Exchanges the code, classifies the email into a role, upserts the
/// profile and account rows, and issues the role session. Identities
/// from outside the institution are deleted at the provider and the
/// request fails 401.
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    params(OAuthCallbackParams),
    responses(
        (status = 302, description = "Login successful, session cookie set"),
        (status = 401, description = "Not part of the institution, or account not pre-registered"),
        (status = 403, description = "Resolved role differs from the intended one")
    )
)]
pub async fn oauth_callback_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<impl IntoResponse, ApiError> {
    let authorized = state
        .identity
        .exchange_code(&params.code)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => ApiError::Unauthenticated,
            other => ApiError::Upstream(other.to_string()),
        })?;
    let intended = Role::parse(&params.state);

    // Foreign-domain identities are removed at the provider before the
    // request fails; nothing about them is retained.
    if let Err(RoleError::OutsideInstitution) = state.policy.resolve(&authorized.identity.email) {
        warn!(email = %authorized.identity.email, "rejecting identity outside the institution");
        if let Err(e) = state.identity.revoke(&authorized.access_token).await {
            warn!("identity revocation failed: {}", e);
        }
        return Err(ApiError::OutsideInstitution);
    }

    let user =
        resolve_and_provision(&*state.db, &state.policy, &authorized.identity, intended).await?;
    info!(role = %user.role, "OAuth login resolved");
    login_redirect(&state, user)
}

/// POST /auth/logout - Clear every session cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "All session cookies cleared")
    )
)]
pub async fn logout_handler() -> impl IntoResponse {
    AppendHeaders(logout_cookies())
}
