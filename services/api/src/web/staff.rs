//! services/api/src/web/staff.rs
//!
//! Handlers for the staff-scoped routes: login, bulk student
//! registration, drive management, placement marking, and password
//! change. Every query is scoped by the staff id in the verified
//! session, never by a client-supplied parameter.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use placement_core::domain::{Drive, Role, StudentAccount};
use placement_core::ports::{NewDrive, NewStudent};
use placement_core::roles::RolePolicy;

use crate::error::ApiError;
use crate::web::auth::{hash_password, login_redirect, verify_password, LoginRequest};
use crate::web::session::SessionUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StudentRow {
    pub email: String,
    pub password: Option<String>,
    pub name: String,
    pub department: String,
    pub batch: i32,
    pub cgpa: Option<f64>,
    pub registration_no: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkRegisterRequest {
    pub students: Vec<StudentRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedRow {
    pub email: String,
    pub field: String,
    pub message: String,
}

/// Partial-success report: inserted + skipped + invalid covers every
/// submitted row.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkRegisterResponse {
    pub inserted: Vec<String>,
    pub skipped: Vec<String>,
    pub invalid: Vec<RejectedRow>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateDriveRequest {
    pub company: String,
    pub description: String,
    #[serde(default)]
    pub eligible_departments: Vec<String>,
    pub deadline: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct DriveResponse {
    pub id: Uuid,
    pub company: String,
    pub description: String,
    pub eligible_departments: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Drive> for DriveResponse {
    fn from(d: Drive) -> Self {
        Self {
            id: d.id,
            company: d.company,
            description: d.description,
            eligible_departments: d.eligible_departments,
            deadline: d.deadline,
            created_at: d.created_at,
        }
    }
}

/// A staff member's view of one of their students. Password hashes
/// never leave the adapter layer.
#[derive(Serialize, ToSchema)]
pub struct StudentResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub department: String,
    pub batch: i32,
    pub cgpa: Option<f64>,
    pub registration_no: Option<String>,
    pub placed_company: Option<String>,
}

impl From<StudentAccount> for StudentResponse {
    fn from(s: StudentAccount) -> Self {
        Self {
            id: s.id,
            email: s.email,
            name: s.name,
            department: s.department,
            batch: s.batch,
            cgpa: s.cgpa,
            registration_no: s.registration_no,
            placed_company: s.placed_company,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct MarkPlacedRequest {
    pub student_id: Uuid,
    pub company: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

//=========================================================================================
// Bulk Registration Planning
//=========================================================================================

/// Row-level validation for bulk registration. The email must be a
/// student address at the institution; everything else is basic shape.
fn validate_row(policy: &RolePolicy, row: &StudentRow) -> Result<(), RejectedRow> {
    let reject = |field: &str, message: &str| RejectedRow {
        email: row.email.clone(),
        field: field.to_string(),
        message: message.to_string(),
    };
    if !policy.is_student_email(&row.email) {
        return Err(reject("email", "not a student address at the institution"));
    }
    if row.name.trim().is_empty() {
        return Err(reject("name", "must not be empty"));
    }
    if row.department.trim().is_empty() {
        return Err(reject("department", "must not be empty"));
    }
    if let Some(password) = &row.password {
        if password.len() < 8 {
            return Err(reject("password", "must be at least 8 characters"));
        }
    }
    Ok(())
}

/// Splits a batch into rows to insert, rows skipped as duplicates
/// (already present, or repeated within the batch), and invalid rows.
/// The three buckets always cover the whole batch.
pub fn plan_bulk_register(
    policy: &RolePolicy,
    existing: &HashSet<String>,
    rows: Vec<StudentRow>,
) -> (Vec<StudentRow>, Vec<String>, Vec<RejectedRow>) {
    let mut to_insert = Vec::new();
    let mut skipped = Vec::new();
    let mut invalid = Vec::new();
    let mut seen = HashSet::new();

    for row in rows {
        if let Err(rejection) = validate_row(policy, &row) {
            invalid.push(rejection);
            continue;
        }
        let email = row.email.to_lowercase();
        if existing.contains(&email) || !seen.insert(email) {
            skipped.push(row.email);
            continue;
        }
        to_insert.push(row);
    }
    (to_insert, skipped, invalid)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /staff/login - Password login for staff.
#[utoipa::path(
    post,
    path = "/staff/login",
    request_body = LoginRequest,
    responses(
        (status = 302, description = "Login successful, staff session cookie set"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Unknown email and wrong password take the same exit.
    let staff = state
        .db
        .get_staff_by_email(&req.email)
        .await
        .map_err(|_| ApiError::Unauthenticated)?;
    verify_password(&req.password, staff.password_hash.as_deref())?;
    login_redirect(
        &state,
        SessionUser {
            id: staff.id,
            role: Role::Staff,
            email: staff.email,
        },
    )
}

/// POST /staff/students - Register a batch of students under the caller.
///
/// Partial success by design: invalid rows and already-registered
/// emails are reported, never abort the batch. A duplicate that only
/// appears at insert time (a concurrent upload won the race) surfaces
/// as 409.
#[utoipa::path(
    post,
    path = "/staff/students",
    request_body = BulkRegisterRequest,
    responses(
        (status = 200, description = "Batch processed", body = BulkRegisterResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 409, description = "Concurrent duplicate registration")
    )
)]
pub async fn register_students_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<BulkRegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let emails: Vec<String> = req
        .students
        .iter()
        .map(|r| r.email.to_lowercase())
        .collect();
    let existing: HashSet<String> = state
        .db
        .student_emails_present(&emails)
        .await?
        .into_iter()
        .map(|e| e.to_lowercase())
        .collect();

    let (to_insert, skipped, invalid) = plan_bulk_register(&state.policy, &existing, req.students);

    let mut inserted = Vec::with_capacity(to_insert.len());
    for row in to_insert {
        let password_hash = row.password.as_deref().map(hash_password).transpose()?;
        let student = state
            .db
            .create_student(NewStudent {
                email: row.email.to_lowercase(),
                password_hash,
                name: row.name,
                department: row.department,
                batch: row.batch,
                cgpa: row.cgpa,
                registration_no: row.registration_no,
                staff_id: user.id,
            })
            .await?;
        inserted.push(student.email);
    }

    info!(
        inserted = inserted.len(),
        skipped = skipped.len(),
        invalid = invalid.len(),
        "bulk student registration processed"
    );
    Ok(Json(BulkRegisterResponse {
        inserted,
        skipped,
        invalid,
    }))
}

/// GET /staff/students - The caller's own students.
#[utoipa::path(
    get,
    path = "/staff/students",
    responses(
        (status = 200, description = "Students registered under the caller", body = [StudentResponse]),
        (status = 401, description = "Unauthenticated")
    )
)]
pub async fn list_students_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiError> {
    let students = state.db.list_students_by_staff(user.id).await?;
    let body: Vec<StudentResponse> = students.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// DELETE /staff/students/{id} - Remove one of the caller's students.
#[utoipa::path(
    delete,
    path = "/staff/students/{id}",
    params(("id" = Uuid, Path, description = "Student id")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 403, description = "Student belongs to another staff member"),
        (status = 404, description = "No such student")
    )
)]
pub async fn delete_student_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.db.get_student_by_id(id).await?;
    if student.staff_id != user.id {
        return Err(ApiError::Forbidden);
    }
    // Applications cascade at the database.
    state.db.delete_student(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /staff/drives - Post a drive and notify eligible students.
#[utoipa::path(
    post,
    path = "/staff/drives",
    request_body = CreateDriveRequest,
    responses(
        (status = 201, description = "Drive created", body = DriveResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn create_drive_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
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
            created_by: Some(user.id),
        })
        .await?;

    // Best-effort notification to the caller's eligible students; a mail
    // failure is logged and never fails the posting.
    match state.db.list_students_by_staff(user.id).await {
        Ok(students) => {
            let recipients: Vec<String> = students
                .iter()
                .filter(|s| drive.accepts_department(&s.department))
                .map(|s| s.email.clone())
                .collect();
            if !recipients.is_empty() {
                let subject = format!("New placement drive: {}", drive.company);
                let body = format!(
                    "{}\n\nApply before {}.",
                    drive.description,
                    drive.deadline.to_rfc3339()
                );
                if let Err(e) = state.mailer.send(&recipients, &subject, &body).await {
                    warn!("drive notification mail failed: {}", e);
                }
            }
        }
        Err(e) => warn!("could not list students for drive notification: {}", e),
    }

    Ok((StatusCode::CREATED, Json(DriveResponse::from(drive))))
}

/// GET /staff/drives - The caller's own drives.
#[utoipa::path(
    get,
    path = "/staff/drives",
    responses(
        (status = 200, description = "Drives posted by the caller", body = [DriveResponse]),
        (status = 401, description = "Unauthenticated")
    )
)]
pub async fn list_drives_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiError> {
    let drives = state.db.list_drives_by_staff(user.id).await?;
    let body: Vec<DriveResponse> = drives.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// DELETE /staff/drives/{id} - Remove one of the caller's drives.
#[utoipa::path(
    delete,
    path = "/staff/drives/{id}",
    params(("id" = Uuid, Path, description = "Drive id")),
    responses(
        (status = 204, description = "Drive deleted"),
        (status = 403, description = "Drive was posted by someone else"),
        (status = 404, description = "No such drive")
    )
)]
pub async fn delete_drive_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let drive = state.db.get_drive_by_id(id).await?;
    if drive.created_by != Some(user.id) {
        return Err(ApiError::Forbidden);
    }
    state.db.delete_drive(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /staff/mark-placed - Record a student's placement.
#[utoipa::path(
    post,
    path = "/staff/mark-placed",
    request_body = MarkPlacedRequest,
    responses(
        (status = 204, description = "Placement recorded"),
        (status = 403, description = "Student belongs to another staff member"),
        (status = 404, description = "No such student")
    )
)]
pub async fn mark_placed_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<MarkPlacedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.company.trim().is_empty() {
        return Err(ApiError::validation("company", "must not be empty"));
    }
    let student = state.db.get_student_by_id(req.student_id).await?;
    if student.staff_id != user.id {
        return Err(ApiError::Forbidden);
    }
    state
        .db
        .set_student_placement(req.student_id, &req.company)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /staff/password - Change the caller's password.
#[utoipa::path(
    post,
    path = "/staff/password",
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
    let staff = state.db.get_staff_by_id(user.id).await?;
    verify_password(&req.old_password, staff.password_hash.as_deref())?;
    let hash = hash_password(&req.new_password)?;
    state.db.update_staff_password(user.id, &hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RolePolicy {
        RolePolicy::new(
            ["principal@saec.ac.in".to_string()],
            [],
            "saec.ac.in",
        )
    }

    fn row(email: &str) -> StudentRow {
        StudentRow {
            email: email.to_string(),
            password: Some("secret-pass".to_string()),
            name: "A Student".to_string(),
            department: "CSE".to_string(),
            batch: 2024,
            cgpa: Some(8.1),
            registration_no: None,
        }
    }

    #[test]
    fn buckets_cover_the_whole_batch() {
        let existing: HashSet<String> = ["2024002@saec.ac.in".to_string()].into();
        let rows = vec![
            row("2024001@saec.ac.in"),
            row("2024002@saec.ac.in"),
            row("someone@gmail.com"),
        ];
        let n = rows.len();
        let (insert, skipped, invalid) = plan_bulk_register(&policy(), &existing, rows);
        assert_eq!(insert.len() + skipped.len() + invalid.len(), n);
        assert_eq!(insert.len(), 1);
        assert_eq!(skipped, vec!["2024002@saec.ac.in"]);
        assert_eq!(invalid[0].field, "email");
    }

    #[test]
    fn duplicates_within_one_batch_are_skipped() {
        let rows = vec![row("2024003@saec.ac.in"), row("2024003@saec.ac.in")];
        let (insert, skipped, invalid) = plan_bulk_register(&policy(), &HashSet::new(), rows);
        assert_eq!(insert.len(), 1);
        assert_eq!(skipped.len(), 1);
        assert!(invalid.is_empty());
    }

    #[test]
    fn short_passwords_are_invalid_rows() {
        let mut r = row("2024004@saec.ac.in");
        r.password = Some("short".to_string());
        let (insert, _, invalid) = plan_bulk_register(&policy(), &HashSet::new(), vec![r]);
        assert!(insert.is_empty());
        assert_eq!(invalid[0].field, "password");
    }

    #[test]
    fn rows_without_passwords_are_fine() {
        let mut r = row("2024005@saec.ac.in");
        r.password = None;
        let (insert, skipped, invalid) = plan_bulk_register(&policy(), &HashSet::new(), vec![r]);
        assert_eq!(insert.len(), 1);
        assert!(skipped.is_empty() && invalid.is_empty());
    }

    #[test]
    fn existing_email_check_ignores_case() {
        let existing: HashSet<String> = ["2024006@saec.ac.in".to_string()].into();
        let (insert, skipped, _) =
            plan_bulk_register(&policy(), &existing, vec![row("2024006@SAEC.AC.IN")]);
        assert!(insert.is_empty());
        assert_eq!(skipped.len(), 1);
    }
}
