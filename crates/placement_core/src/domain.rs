//! crates/placement_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three roles a portal user can hold. Every session and every
/// protected route is scoped to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Staff,
    Student,
}

impl Role {
    /// The stable string form used in profiles and session claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Staff => "staff",
            Role::Student => "student",
        }
    }

    /// The session cookie that carries this role's token.
    pub fn cookie_name(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "admin_session",
            Role::Staff => "staff_session",
            Role::Student => "student_session",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "super_admin" => Some(Role::SuperAdmin),
            "staff" => Some(Role::Staff),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placement-cell staff member. Students are registered under a staff
/// member and are removed with them (delete cascade at the database).
#[derive(Debug, Clone)]
pub struct StaffAccount {
    pub id: Uuid,
    pub email: String,
    /// Absent when the account was provisioned purely via OAuth.
    pub password_hash: Option<String>,
    pub name: String,
    pub department: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A student registered by a staff member.
#[derive(Debug, Clone)]
pub struct StudentAccount {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub department: String,
    pub batch: i32,
    pub cgpa: Option<f64>,
    pub registration_no: Option<String>,
    /// Owning staff member. The database cascades student deletion when
    /// this staff row is removed.
    pub staff_id: Uuid,
    /// Company name once the student is placed.
    pub placed_company: Option<String>,
    /// Public URL of the uploaded profile photo.
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The super-admin account. Provisioned from the allow-list on first
/// OAuth login, or seeded with a password.
#[derive(Debug, Clone)]
pub struct SuperAdminAccount {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
}

/// A job posting tied to a company.
#[derive(Debug, Clone)]
pub struct Drive {
    pub id: Uuid,
    pub company: String,
    pub description: String,
    /// Departments eligible to apply. Empty means open to all.
    pub eligible_departments: Vec<String>,
    pub deadline: DateTime<Utc>,
    /// The staff member who posted the drive; None for super-admin posts.
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Drive {
    /// Whether a student from `department` may apply.
    pub fn accepts_department(&self, department: &str) -> bool {
        self.eligible_departments.is_empty()
            || self
                .eligible_departments
                .iter()
                .any(|d| d.eq_ignore_ascii_case(department))
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.deadline > now
    }
}

/// A student's request to be considered for a drive.
/// (student_id, drive_id) is unique at the database.
#[derive(Debug, Clone)]
pub struct Application {
    pub id: Uuid,
    pub student_id: Uuid,
    pub drive_id: Uuid,
    pub applied_at: DateTime<Utc>,
}

/// A campus event shown on the public feed.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Remembers how an external identity was classified, keyed by the
/// provider's subject id. One-to-one with an external identity.
#[derive(Debug, Clone)]
pub struct Profile {
    pub provider_subject: String,
    pub email: String,
    pub role: Role,
}

/// What the identity provider tells us about a verified user.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn drive(depts: &[&str], deadline_offset_h: i64) -> Drive {
        Drive {
            id: Uuid::new_v4(),
            company: "Acme".into(),
            description: "".into(),
            eligible_departments: depts.iter().map(|s| s.to_string()).collect(),
            deadline: Utc::now() + Duration::hours(deadline_offset_h),
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_department_set_is_open_to_all() {
        assert!(drive(&[], 1).accepts_department("CSE"));
    }

    #[test]
    fn department_match_is_case_insensitive() {
        let d = drive(&["CSE", "ECE"], 1);
        assert!(d.accepts_department("cse"));
        assert!(!d.accepts_department("MECH"));
    }

    #[test]
    fn past_deadline_closes_the_drive() {
        assert!(!drive(&[], -1).is_open(Utc::now()));
        assert!(drive(&[], 1).is_open(Utc::now()));
    }

    #[test]
    fn role_string_round_trip() {
        for role in [Role::SuperAdmin, Role::Staff, Role::Student] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("root"), None);
    }
}
