//! services/api/src/web/student.rs
//!
//! Handlers for the student-scoped routes: login, browsing eligible
//! drives, applying and withdrawing, password change, and profile photo
//! upload.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use placement_core::domain::Role;

use crate::error::ApiError;
use crate::web::auth::{hash_password, login_redirect, verify_password, LoginRequest};
use crate::web::session::SessionUser;
use crate::web::staff::{ChangePasswordRequest, DriveResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ApplyRequest {
    pub drive_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct ApplicationResponse {
    pub drive_id: Uuid,
    pub company: String,
    pub deadline: DateTime<Utc>,
    pub applied_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct PhotoResponse {
    pub photo_url: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /student/login - Password login for students.
#[utoipa::path(
    post,
    path = "/student/login",
    request_body = LoginRequest,
    responses(
        (status = 302, description = "Login successful, student session cookie set"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state
        .db
        .get_student_by_email(&req.email)
        .await
        .map_err(|_| ApiError::Unauthenticated)?;
    verify_password(&req.password, student.password_hash.as_deref())?;
    login_redirect(
        &state,
        SessionUser {
            id: student.id,
            role: Role::Student,
            email: student.email,
        },
    )
}

/// GET /student/drives - Open drives the caller's department may apply to.
#[utoipa::path(
    get,
    path = "/student/drives",
    responses(
        (status = 200, description = "Eligible open drives", body = [DriveResponse]),
        (status = 401, description = "Unauthenticated")
    )
)]
pub async fn list_drives_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.db.get_student_by_id(user.id).await?;
    let drives = state.db.list_open_drives(Utc::now()).await?;
    let body: Vec<DriveResponse> = drives
        .into_iter()
        .filter(|d| d.accepts_department(&student.department))
        .map(Into::into)
        .collect();
    Ok(Json(body))
}

/// POST /student/applications - Apply to a drive.
#[utoipa::path(
    post,
    path = "/student/applications",
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application recorded"),
        (status = 404, description = "No such drive"),
        (status = 409, description = "Already applied to this drive"),
        (status = 422, description = "Deadline passed or department not eligible")
    )
)]
pub async fn apply_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<ApplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.db.get_student_by_id(user.id).await?;
    let drive = state.db.get_drive_by_id(req.drive_id).await?;
    if !drive.is_open(Utc::now()) {
        return Err(ApiError::validation("drive_id", "application deadline has passed"));
    }
    if !drive.accepts_department(&student.department) {
        return Err(ApiError::validation(
            "drive_id",
            "department is not eligible for this drive",
        ));
    }
    // The (student, drive) unique constraint is the duplicate arbiter;
    // a concurrent double-submit comes back as Conflict.
    state.db.create_application(user.id, req.drive_id).await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /student/applications/{drive_id} - Withdraw an application.
#[utoipa::path(
    delete,
    path = "/student/applications/{drive_id}",
    params(("drive_id" = Uuid, Path, description = "Drive id")),
    responses(
        (status = 204, description = "Application withdrawn"),
        (status = 404, description = "No application for this drive")
    )
)]
pub async fn withdraw_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(drive_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_application(user.id, drive_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /student/applications - The caller's applications.
#[utoipa::path(
    get,
    path = "/student/applications",
    responses(
        (status = 200, description = "Applications with drive details", body = [ApplicationResponse]),
        (status = 401, description = "Unauthenticated")
    )
)]
pub async fn list_applications_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiError> {
    let applications = state.db.list_applications_for_student(user.id).await?;
    let body: Vec<ApplicationResponse> = applications
        .into_iter()
        .map(|(application, drive)| ApplicationResponse {
            drive_id: drive.id,
            company: drive.company,
            deadline: drive.deadline,
            applied_at: application.applied_at,
        })
        .collect();
    Ok(Json(body))
}

/// POST /student/password - Change the caller's password.
#[utoipa::path(
    post,
    path = "/student/password",
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
    let student = state.db.get_student_by_id(user.id).await?;
    verify_password(&req.old_password, student.password_hash.as_deref())?;
    let hash = hash_password(&req.new_password)?;
    state.db.update_student_password(user.id, &hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /student/photo - Upload a profile photo.
///
/// Accepts multipart/form-data with a single image part; the image goes
/// to object storage and the resulting URL is stored on the student row.
#[utoipa::path(
    post,
    path = "/student/photo",
    request_body(content_type = "multipart/form-data", description = "The image to upload."),
    responses(
        (status = 200, description = "Photo stored", body = PhotoResponse),
        (status = 422, description = "Missing or non-image part")
    )
)]
pub async fn upload_photo_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation("photo", &format!("unreadable multipart data: {}", e)))?
        .ok_or_else(|| ApiError::validation("photo", "multipart form must include a file"))?;

    let content_type = field
        .content_type()
        .map(|ct| ct.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    if !content_type.starts_with("image/") {
        return Err(ApiError::validation("photo", "only image uploads are accepted"));
    }
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation("photo", &format!("unreadable file bytes: {}", e)))?;

    let key = format!("students/{}/photo", user.id);
    let photo_url = state.media.store_image(&key, &content_type, &data).await?;
    state.db.set_student_photo(user.id, &photo_url).await?;
    Ok(Json(PhotoResponse { photo_url }))
}
