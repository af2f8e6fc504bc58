//! services/api/src/web/mod.rs
//!
//! The HTTP layer: session plumbing, auth middleware, the role-scoped
//! handler modules, and the master OpenAPI definition.

pub mod auth;
pub mod middleware;
pub mod public;
pub mod session;
pub mod staff;
pub mod state;
pub mod student;
pub mod superadmin;

pub use middleware::{require_staff, require_student, require_super_admin};

use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::oauth_start_handler,
        auth::oauth_callback_handler,
        auth::logout_handler,
        staff::login_handler,
        staff::register_students_handler,
        staff::list_students_handler,
        staff::delete_student_handler,
        staff::create_drive_handler,
        staff::list_drives_handler,
        staff::delete_drive_handler,
        staff::mark_placed_handler,
        staff::change_password_handler,
        student::login_handler,
        student::list_drives_handler,
        student::apply_handler,
        student::withdraw_handler,
        student::list_applications_handler,
        student::change_password_handler,
        student::upload_photo_handler,
        superadmin::login_handler,
        superadmin::create_staff_handler,
        superadmin::list_staff_handler,
        superadmin::delete_staff_handler,
        superadmin::create_drive_handler,
        superadmin::delete_drive_handler,
        superadmin::create_event_handler,
        superadmin::delete_event_handler,
        superadmin::upload_event_poster_handler,
        superadmin::change_password_handler,
        public::get_jobs_handler,
        public::get_events_handler,
        public::get_placed_students_handler,
        public::check_session_handler,
    ),
    components(
        schemas(
            auth::LoginRequest,
            staff::BulkRegisterRequest,
            staff::BulkRegisterResponse,
            staff::StudentRow,
            staff::RejectedRow,
            staff::CreateDriveRequest,
            staff::DriveResponse,
            staff::StudentResponse,
            staff::MarkPlacedRequest,
            staff::ChangePasswordRequest,
            student::ApplyRequest,
            student::ApplicationResponse,
            student::PhotoResponse,
            superadmin::CreateStaffRequest,
            superadmin::StaffResponse,
            superadmin::CreateEventRequest,
            superadmin::EventResponse,
            superadmin::PosterResponse,
            public::PlacedStudentResponse,
            public::CheckSessionResponse,
        )
    ),
    tags(
        (name = "Placement Portal API", description = "API endpoints for the college placement-cell portal.")
    )
)]
pub struct ApiDoc;
