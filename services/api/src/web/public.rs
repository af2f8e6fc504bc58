//! services/api/src/web/public.rs
//!
//! Unauthenticated endpoints: the public jobs/events/placements feeds
//! and the session probe used by the frontend.

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::staff::DriveResponse;
use crate::web::state::AppState;
use crate::web::superadmin::EventResponse;

#[derive(Serialize, ToSchema)]
pub struct PlacedStudentResponse {
    pub name: String,
    pub department: String,
    pub company: String,
}

#[derive(Serialize, ToSchema)]
pub struct CheckSessionResponse {
    pub authenticated: bool,
    pub role: Option<String>,
}

/// GET /get-jobs - All open drives.
#[utoipa::path(
    get,
    path = "/get-jobs",
    responses(
        (status = 200, description = "Open drives", body = [DriveResponse])
    )
)]
pub async fn get_jobs_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let drives = state.db.list_open_drives(Utc::now()).await?;
    let body: Vec<DriveResponse> = drives.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// GET /get-events - The public events feed, newest first.
#[utoipa::path(
    get,
    path = "/get-events",
    responses(
        (status = 200, description = "Events", body = [EventResponse])
    )
)]
pub async fn get_events_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let events = state.db.list_events().await?;
    let body: Vec<EventResponse> = events.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// GET /get-placed-students - Placed students, name/department/company only.
#[utoipa::path(
    get,
    path = "/get-placed-students",
    responses(
        (status = 200, description = "Placed students", body = [PlacedStudentResponse])
    )
)]
pub async fn get_placed_students_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let placed = state.db.list_placed_students().await?;
    let body: Vec<PlacedStudentResponse> = placed
        .into_iter()
        .map(|p| PlacedStudentResponse {
            name: p.name,
            department: p.department,
            company: p.company,
        })
        .collect();
    Ok(Json(body))
}

/// GET /check-session - Report which role session, if any, is live.
///
/// Never errors; an absent or invalid cookie is just `authenticated:
/// false`.
#[utoipa::path(
    get,
    path = "/check-session",
    responses(
        (status = 200, description = "Session status", body = CheckSessionResponse)
    )
)]
pub async fn check_session_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let body = match state.sessions.peek(&headers) {
        Some(user) => CheckSessionResponse {
            authenticated: true,
            role: Some(user.role.as_str().to_string()),
        },
        None => CheckSessionResponse {
            authenticated: false,
            role: None,
        },
    };
    Json(body)
}
