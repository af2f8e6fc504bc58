//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use placement_core::domain::Role;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Verifies the role-appropriate session cookie and stashes the
/// `SessionUser` in request extensions for handlers to scope by.
///
/// Missing cookie or bad/expired token is 401; a valid token carrying a
/// different role is 403.
async fn require_role(
    state: Arc<AppState>,
    role: Role,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state.sessions.verify_request(req.headers(), role)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

pub async fn require_staff(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(state, Role::Staff, req, next).await
}

pub async fn require_student(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(state, Role::Student, req, next).await
}

pub async fn require_super_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(state, Role::SuperAdmin, req, next).await
}
