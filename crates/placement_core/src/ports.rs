//! crates/placement_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the
//! database, the identity provider, SMTP, or object storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Application, Drive, Event, ExternalIdentity, Profile, StaffAccount, StudentAccount,
    SuperAdminAccount,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Write Payloads
//=========================================================================================

/// Input for creating a staff account. Password hashing happens before
/// this struct is built; the port only ever sees the PHC string.
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub department: String,
    pub phone: Option<String>,
}

/// Input for registering a student under a staff member.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub department: String,
    pub batch: i32,
    pub cgpa: Option<f64>,
    pub registration_no: Option<String>,
    pub staff_id: Uuid,
}

/// Input for posting a drive.
#[derive(Debug, Clone)]
pub struct NewDrive {
    pub company: String,
    pub description: String,
    pub eligible_departments: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Input for publishing an event on the public feed.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub image_url: Option<String>,
}

/// A placed student as shown on the public feed. Only non-sensitive
/// columns are projected.
#[derive(Debug, Clone)]
pub struct PlacedStudent {
    pub name: String,
    pub department: String,
    pub company: String,
}

/// An identity verified at the provider, together with the access token
/// needed for follow-up calls (revocation on rejection).
#[derive(Debug, Clone)]
pub struct AuthorizedIdentity {
    pub identity: ExternalIdentity,
    pub access_token: String,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The relational store behind every orchestrator. All race prevention is
/// delegated to the database's unique constraints and cascades; writes
/// that lose such a race come back as `PortError::Conflict`.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Super-admin accounts ---
    async fn get_super_admin_by_email(&self, email: &str) -> PortResult<SuperAdminAccount>;
    /// Creates the row if absent; used on OAuth first-login.
    async fn upsert_super_admin(&self, email: &str) -> PortResult<SuperAdminAccount>;
    async fn update_super_admin_password(&self, id: Uuid, password_hash: &str) -> PortResult<()>;

    // --- Staff accounts ---
    async fn create_staff(&self, staff: NewStaff) -> PortResult<StaffAccount>;
    async fn get_staff_by_email(&self, email: &str) -> PortResult<StaffAccount>;
    async fn get_staff_by_id(&self, id: Uuid) -> PortResult<StaffAccount>;
    async fn list_staff(&self) -> PortResult<Vec<StaffAccount>>;
    /// Students cascade at the database; returns the deleted row so the
    /// caller can clean up the matching profile by email.
    async fn delete_staff(&self, id: Uuid) -> PortResult<StaffAccount>;
    async fn update_staff_password(&self, id: Uuid, password_hash: &str) -> PortResult<()>;

    // --- Student accounts ---
    async fn create_student(&self, student: NewStudent) -> PortResult<StudentAccount>;
    async fn get_student_by_email(&self, email: &str) -> PortResult<StudentAccount>;
    async fn get_student_by_id(&self, id: Uuid) -> PortResult<StudentAccount>;
    async fn list_students_by_staff(&self, staff_id: Uuid) -> PortResult<Vec<StudentAccount>>;
    /// Which of `emails` already have a student row. Feeds the bulk
    /// registration duplicate-skip.
    async fn student_emails_present(&self, emails: &[String]) -> PortResult<Vec<String>>;
    async fn delete_student(&self, id: Uuid) -> PortResult<()>;
    async fn update_student_password(&self, id: Uuid, password_hash: &str) -> PortResult<()>;
    async fn set_student_placement(&self, id: Uuid, company: &str) -> PortResult<()>;
    async fn set_student_photo(&self, id: Uuid, photo_url: &str) -> PortResult<()>;
    async fn list_placed_students(&self) -> PortResult<Vec<PlacedStudent>>;

    // --- Drives ---
    async fn create_drive(&self, drive: NewDrive) -> PortResult<Drive>;
    async fn get_drive_by_id(&self, id: Uuid) -> PortResult<Drive>;
    /// Drives posted by one staff member.
    async fn list_drives_by_staff(&self, staff_id: Uuid) -> PortResult<Vec<Drive>>;
    /// Drives whose deadline is after `now`, newest first.
    async fn list_open_drives(&self, now: DateTime<Utc>) -> PortResult<Vec<Drive>>;
    /// Applications cascade at the database.
    async fn delete_drive(&self, id: Uuid) -> PortResult<()>;

    // --- Applications ---
    async fn create_application(&self, student_id: Uuid, drive_id: Uuid)
        -> PortResult<Application>;
    async fn delete_application(&self, student_id: Uuid, drive_id: Uuid) -> PortResult<()>;
    async fn list_applications_for_student(
        &self,
        student_id: Uuid,
    ) -> PortResult<Vec<(Application, Drive)>>;

    // --- Events ---
    async fn create_event(&self, event: NewEvent) -> PortResult<Event>;
    async fn list_events(&self) -> PortResult<Vec<Event>>;
    async fn delete_event(&self, id: Uuid) -> PortResult<()>;
    /// Records the stored poster URL after an upload.
    async fn set_event_image(&self, id: Uuid, image_url: &str) -> PortResult<()>;

    // --- Profiles ---
    async fn upsert_profile(&self, profile: Profile) -> PortResult<()>;
    async fn get_profile(&self, provider_subject: &str) -> PortResult<Profile>;
    /// No foreign key ties profiles to staff rows, so staff deletion
    /// calls this explicitly. Absence is not an error.
    async fn delete_profile_by_email(&self, email: &str) -> PortResult<()>;
}

/// The external identity provider (OAuth). Its protocol internals are an
/// external collaborator; the portal only consumes the verified result.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The consent URL the browser is sent to. `state` round-trips the
    /// caller's intended role.
    fn authorize_url(&self, state: &str) -> String;
    /// Exchanges an authorization code for the verified identity.
    async fn exchange_code(&self, code: &str) -> PortResult<AuthorizedIdentity>;
    /// Deletes/revokes the identity at the provider. Called when an
    /// email from outside the institution is rejected.
    async fn revoke(&self, access_token: &str) -> PortResult<()>;
}

/// Outbound email. Failures are logged by callers, never surfaced to the
/// HTTP client.
#[async_trait]
pub trait MailService: Send + Sync {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> PortResult<()>;
}

/// Object storage for uploaded images (profile photos, event posters).
/// Transcoding and storage internals live behind this boundary.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the image and returns its public URL.
    async fn store_image(&self, key: &str, content_type: &str, data: &[u8]) -> PortResult<String>;
}
