//! crates/placement_core/src/roles.rs
//!
//! Role classification for verified external identities. Maps an email
//! address to exactly one of {super_admin, staff, student}, or rejects
//! identities from outside the institution.

use std::collections::HashSet;

use regex::Regex;

use crate::domain::Role;

/// Classification failure for an external identity.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoleError {
    /// The email's domain does not belong to the institution. The caller
    /// is expected to delete the identity at the provider and answer 401.
    #[error("unauthorized - not part of the institution")]
    OutsideInstitution,
    /// The caller declared an intended role that differs from the
    /// resolved one.
    #[error("role mismatch: expected {expected}, resolved {resolved}")]
    RoleMismatch { expected: Role, resolved: Role },
}

/// The allow-lists and domain pattern driving classification.
///
/// Injected from configuration at startup so tests can build fixtures
/// instead of patching globals.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    super_admins: HashSet<String>,
    approved_staff: HashSet<String>,
    institution_domain: String,
    student_pattern: Regex,
}

impl RolePolicy {
    pub fn new(
        super_admins: impl IntoIterator<Item = String>,
        approved_staff: impl IntoIterator<Item = String>,
        institution_domain: &str,
    ) -> Self {
        let domain = institution_domain.trim_start_matches('@').to_lowercase();
        // Student addresses are seven digits at the institutional domain.
        let student_pattern = Regex::new(&format!(r"^\d{{7}}@{}$", regex::escape(&domain)))
            .expect("student pattern is built from an escaped literal");
        Self {
            super_admins: super_admins.into_iter().map(|e| e.to_lowercase()).collect(),
            approved_staff: approved_staff.into_iter().map(|e| e.to_lowercase()).collect(),
            institution_domain: domain,
            student_pattern,
        }
    }

    pub fn institution_domain(&self) -> &str {
        &self.institution_domain
    }

    /// Whether an email is a valid student address for this institution.
    /// Bulk student registration uses this as its row-level invariant.
    pub fn is_student_email(&self, email: &str) -> bool {
        self.student_pattern.is_match(&email.to_lowercase())
    }

    /// Classifies `email`. Ordered, first match wins:
    /// super-admin allow-list, staff allow-list, the seven-digit student
    /// pattern, any other institutional address (staff), then rejection.
    pub fn resolve(&self, email: &str) -> Result<Role, RoleError> {
        let email = email.to_lowercase();
        if self.super_admins.contains(&email) {
            return Ok(Role::SuperAdmin);
        }
        if self.approved_staff.contains(&email) {
            return Ok(Role::Staff);
        }
        if self.student_pattern.is_match(&email) {
            return Ok(Role::Student);
        }
        if email.ends_with(&format!("@{}", self.institution_domain)) {
            return Ok(Role::Staff);
        }
        Err(RoleError::OutsideInstitution)
    }

    /// `resolve`, then check the caller's declared role. A mismatch is
    /// rejected regardless of how classification went.
    pub fn resolve_expecting(
        &self,
        email: &str,
        intended: Option<Role>,
    ) -> Result<Role, RoleError> {
        let resolved = self.resolve(email)?;
        match intended {
            Some(expected) if expected != resolved => {
                Err(RoleError::RoleMismatch { expected, resolved })
            }
            _ => Ok(resolved),
        }
    }
}
