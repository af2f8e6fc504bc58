//! services/api/src/web/superadmin.rs
//!
//! Handlers for the super-admin routes: login, staff management (the
//! pre-registration that OAuth staff logins require), drive and event
//! management, and password change.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use placement_core::domain::{Event, Role, StaffAccount};
use placement_core::ports::{NewDrive, NewEvent, NewStaff};

use crate::error::ApiError;
use crate::web::auth::{hash_password, login_redirect, verify_password, LoginRequest};
use crate::web::session::SessionUser;
use crate::web::staff::{ChangePasswordRequest, CreateDriveRequest, DriveResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateStaffRequest {
    pub email: String,
    pub password: Option<String>,
    pub name: String,
    pub department: String,
    pub phone: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StaffResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub department: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StaffAccount> for StaffResponse {
    fn from(s: StaffAccount) -> Self {
        Self {
            id: s.id,
            email: s.email,
            name: s.name,
            department: s.department,
            phone: s.phone,
            created_at: s.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub image_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PosterResponse {
    pub image_url: String,
}

#[derive(Serialize, ToSchema)]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub image_url: Option<String>,
}

impl From<Event> for EventResponse {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            title: e.title,
            description: e.description,
            date: e.date,
            image_url: e.image_url,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /superadmin/login - Password login for the super-admin.
#[utoipa::path(
    post,
    path = "/superadmin/login",
    request_body = LoginRequest,
    responses(
        (status = 302, description = "Login successful, admin session cookie set"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = state
        .db
        .get_super_admin_by_email(&req.email)
        .await
        .map_err(|_| ApiError::Unauthenticated)?;
    verify_password(&req.password, admin.password_hash.as_deref())?;
    login_redirect(
        &state,
        SessionUser {
            id: admin.id,
            role: Role::SuperAdmin,
            email: admin.email,
        },
    )
}

/// POST /superadmin/staff - Create a staff account.
///
/// This is the pre-registration that a staff OAuth login later checks
/// against. A password is optional; OAuth-only staff never set one.
#[utoipa::path(
    post,
    path = "/superadmin/staff",
    request_body = CreateStaffRequest,
    responses(
        (status = 201, description = "Staff account created", body = StaffResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn create_staff_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStaffRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name", "must not be empty"));
    }
    if !req
        .email
        .to_lowercase()
        .ends_with(&format!("@{}", state.policy.institution_domain()))
    {
        return Err(ApiError::validation(
            "email",
            "staff must use an institutional address",
        ));
    }
    if let Some(password) = &req.password {
        if password.len() < 8 {
            return Err(ApiError::validation(
                "password",
                "must be at least 8 characters",
            ));
        }
    }

    let password_hash = req.password.as_deref().map(hash_password).transpose()?;
    let staff = state
        .db
        .create_staff(NewStaff {
            email: req.email.to_lowercase(),
            password_hash,
            name: req.name,
            department: req.department,
            phone: req.phone,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(StaffResponse::from(staff))))
}

/// GET /superadmin/staff - All staff accounts.
#[utoipa::path(
    get,
    path = "/superadmin/staff",
    responses(
        (status = 200, description = "All staff", body = [StaffResponse]),
        (status = 401, description = "Unauthenticated")
    )
)]
pub async fn list_staff_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let staff = state.db.list_staff().await?;
    let body: Vec<StaffResponse> = staff.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// DELETE /superadmin/staff/{id} - Remove a staff account.
///
/// The staff member's students cascade at the database; their OAuth
/// profile row is cleaned up here explicitly because no foreign key
/// covers it. A staff member who never logged in via OAuth simply has
/// no profile row, which is fine.
#[utoipa::path(
    delete,
    path = "/superadmin/staff/{id}",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 204, description = "Staff deleted"),
        (status = 404, description = "No such staff member")
    )
)]
pub async fn delete_staff_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.db.delete_staff(id).await?;
    state.db.delete_profile_by_email(&deleted.email).await?;
    info!(email = %deleted.email, "staff account deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /superadmin/drives - Post a drive not owned by any staff member.
#[utoipa::path(
    post,
    path = "/superadmin/drives",
    request_body = CreateDriveRequest,
    responses(
        (status = 201, description = "Drive created", body = DriveResponse),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn create_drive_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDriveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.company.trim().is_empty() {
        return Err(ApiError::validation("company", "must not be empty"));
    }
    if req.deadline <= Utc::now() {
        return Err(ApiError::validation("deadline", "must be in the future"));
    }
    let drive = state
        .db
        .create_drive(NewDrive {
            company: req.company,
            description: req.description,
            eligible_departments: req.eligible_departments,
            deadline: req.deadline,
            created_by: None,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(DriveResponse::from(drive))))
}

/// DELETE /superadmin/drives/{id} - Remove one of the super-admin's drives.
///
/// Drives posted by a staff member are deleted by that staff member,
/// not here.
#[utoipa::path(
    delete,
    path = "/superadmin/drives/{id}",
    params(("id" = Uuid, Path, description = "Drive id")),
    responses(
        (status = 204, description = "Drive deleted"),
        (status = 403, description = "Drive is owned by a staff member"),
        (status = 404, description = "No such drive")
    )
)]
pub async fn delete_drive_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let drive = state.db.get_drive_by_id(id).await?;
    if drive.created_by.is_some() {
        return Err(ApiError::Forbidden);
    }
    state.db.delete_drive(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /superadmin/events - Publish an event on the public feed.
#[utoipa::path(
    post,
    path = "/superadmin/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event published", body = EventResponse),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn create_event_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "must not be empty"));
    }
    let event = state
        .db
        .create_event(NewEvent {
            title: req.title,
            description: req.description,
            date: req.date,
            image_url: req.image_url,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// POST /superadmin/events/{id}/poster - Upload a poster for an event.
///
/// Accepts multipart/form-data with a single image part; the poster
/// goes to object storage and the resulting URL is stored on the event.
#[utoipa::path(
    post,
    path = "/superadmin/events/{id}/poster",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body(content_type = "multipart/form-data", description = "The poster image to upload."),
    responses(
        (status = 200, description = "Poster stored", body = PosterResponse),
        (status = 404, description = "No such event"),
        (status = 422, description = "Missing or non-image part")
    )
)]
pub async fn upload_event_poster_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation("poster", &format!("unreadable multipart data: {}", e)))?
        .ok_or_else(|| ApiError::validation("poster", "multipart form must include a file"))?;

    let content_type = field
        .content_type()
        .map(|ct| ct.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    if !content_type.starts_with("image/") {
        return Err(ApiError::validation("poster", "only image uploads are accepted"));
    }
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation("poster", &format!("unreadable file bytes: {}", e)))?;

    let key = format!("events/{}/poster", id);
    let image_url = state.media.store_image(&key, &content_type, &data).await?;
    state.db.set_event_image(id, &image_url).await?;
    Ok(Json(PosterResponse { image_url }))
}

/// DELETE /superadmin/events/{id} - Remove an event.
#[utoipa::path(
    delete,
    path = "/superadmin/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "No such event")
    )
)]
pub async fn delete_event_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_event(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /superadmin/password - Change the super-admin password.
#[utoipa::path(
    post,
    path = "/superadmin/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Old password does not match"),
        (status = 422, description = "New password too short")
    )
)]
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.new_password.len() < 8 {
        return Err(ApiError::validation(
            "new_password",
            "must be at least 8 characters",
        ));
    }
    let admin = state.db.get_super_admin_by_email(&user.email).await?;
    verify_password(&req.old_password, admin.password_hash.as_deref())?;
    let hash = hash_password(&req.new_password)?;
    state.db.update_super_admin_password(admin.id, &hash).await?;
    Ok(StatusCode::NO_CONTENT)
}
