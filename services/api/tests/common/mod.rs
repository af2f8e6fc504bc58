//! Shared test fixtures: in-memory fakes for every port, and an
//! `AppState` builder wired to them. The fakes enforce the same
//! uniqueness rules the real database does, so conflict paths can be
//! exercised without Postgres.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use api_lib::config::Config;
use api_lib::web::session::SessionSigner;
use api_lib::web::state::AppState;
use placement_core::domain::{
    Application, Drive, Event, ExternalIdentity, Profile, StaffAccount, StudentAccount,
    SuperAdminAccount,
};
use placement_core::ports::{
    AuthorizedIdentity, DatabaseService, IdentityProvider, MailService, MediaStore, NewDrive,
    NewEvent, NewStaff, NewStudent, PlacedStudent, PortError, PortResult,
};
use placement_core::roles::RolePolicy;

pub const DOMAIN: &str = "saec.ac.in";
pub const ADMIN_EMAIL: &str = "principal@saec.ac.in";

//=========================================================================================
// Fake Database
//=========================================================================================

#[derive(Default)]
pub struct FakeDb {
    pub super_admins: Mutex<Vec<SuperAdminAccount>>,
    pub staff: Mutex<Vec<StaffAccount>>,
    pub students: Mutex<Vec<StudentAccount>>,
    pub drives: Mutex<Vec<Drive>>,
    pub applications: Mutex<Vec<Application>>,
    pub events: Mutex<Vec<Event>>,
    pub profiles: Mutex<Vec<Profile>>,
}

impl FakeDb {
    pub fn seed_staff(&self, email: &str, password_hash: Option<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.staff.lock().unwrap().push(StaffAccount {
            id,
            email: email.to_string(),
            password_hash,
            name: "Seed Staff".to_string(),
            department: "CSE".to_string(),
            phone: None,
            created_at: Utc::now(),
        });
        id
    }

    pub fn seed_student(
        &self,
        email: &str,
        password_hash: Option<String>,
        department: &str,
        staff_id: Uuid,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.students.lock().unwrap().push(StudentAccount {
            id,
            email: email.to_string(),
            password_hash,
            name: "Seed Student".to_string(),
            department: department.to_string(),
            batch: 2024,
            cgpa: Some(8.0),
            registration_no: None,
            staff_id,
            placed_company: None,
            photo_url: None,
            created_at: Utc::now(),
        });
        id
    }

    pub fn seed_drive(
        &self,
        company: &str,
        departments: &[&str],
        deadline: DateTime<Utc>,
        created_by: Option<Uuid>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.drives.lock().unwrap().push(Drive {
            id,
            company: company.to_string(),
            description: "A drive".to_string(),
            eligible_departments: departments.iter().map(|s| s.to_string()).collect(),
            deadline,
            created_by,
            created_at: Utc::now(),
        });
        id
    }
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn get_super_admin_by_email(&self, email: &str) -> PortResult<SuperAdminAccount> {
        self.super_admins
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound("super admin".to_string()))
    }

    async fn upsert_super_admin(&self, email: &str) -> PortResult<SuperAdminAccount> {
        let mut admins = self.super_admins.lock().unwrap();
        if let Some(existing) = admins.iter().find(|a| a.email == email) {
            return Ok(existing.clone());
        }
        let admin = SuperAdminAccount {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: None,
        };
        admins.push(admin.clone());
        Ok(admin)
    }

    async fn update_super_admin_password(&self, id: Uuid, password_hash: &str) -> PortResult<()> {
        let mut admins = self.super_admins.lock().unwrap();
        let admin = admins
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| PortError::NotFound("super admin".to_string()))?;
        admin.password_hash = Some(password_hash.to_string());
        Ok(())
    }

    async fn create_staff(&self, staff: NewStaff) -> PortResult<StaffAccount> {
        let mut rows = self.staff.lock().unwrap();
        if rows.iter().any(|s| s.email == staff.email) {
            return Err(PortError::Conflict(format!("staff email {}", staff.email)));
        }
        let account = StaffAccount {
            id: Uuid::new_v4(),
            email: staff.email,
            password_hash: staff.password_hash,
            name: staff.name,
            department: staff.department,
            phone: staff.phone,
            created_at: Utc::now(),
        };
        rows.push(account.clone());
        Ok(account)
    }

    async fn get_staff_by_email(&self, email: &str) -> PortResult<StaffAccount> {
        self.staff
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound("staff".to_string()))
    }

    async fn get_staff_by_id(&self, id: Uuid) -> PortResult<StaffAccount> {
        self.staff
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("staff".to_string()))
    }

    async fn list_staff(&self) -> PortResult<Vec<StaffAccount>> {
        Ok(self.staff.lock().unwrap().clone())
    }

    async fn delete_staff(&self, id: Uuid) -> PortResult<StaffAccount> {
        let mut rows = self.staff.lock().unwrap();
        let index = rows
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| PortError::NotFound("staff".to_string()))?;
        let removed = rows.remove(index);
        // Cascade, as the real schema does.
        self.students
            .lock()
            .unwrap()
            .retain(|s| s.staff_id != id);
        Ok(removed)
    }

    async fn update_staff_password(&self, id: Uuid, password_hash: &str) -> PortResult<()> {
        let mut rows = self.staff.lock().unwrap();
        let staff = rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PortError::NotFound("staff".to_string()))?;
        staff.password_hash = Some(password_hash.to_string());
        Ok(())
    }

    async fn create_student(&self, student: NewStudent) -> PortResult<StudentAccount> {
        let mut rows = self.students.lock().unwrap();
        if rows.iter().any(|s| s.email == student.email) {
            return Err(PortError::Conflict(format!(
                "student email {}",
                student.email
            )));
        }
        let account = StudentAccount {
            id: Uuid::new_v4(),
            email: student.email,
            password_hash: student.password_hash,
            name: student.name,
            department: student.department,
            batch: student.batch,
            cgpa: student.cgpa,
            registration_no: student.registration_no,
            staff_id: student.staff_id,
            placed_company: None,
            photo_url: None,
            created_at: Utc::now(),
        };
        rows.push(account.clone());
        Ok(account)
    }

    async fn get_student_by_email(&self, email: &str) -> PortResult<StudentAccount> {
        self.students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound("student".to_string()))
    }

    async fn get_student_by_id(&self, id: Uuid) -> PortResult<StudentAccount> {
        self.students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("student".to_string()))
    }

    async fn list_students_by_staff(&self, staff_id: Uuid) -> PortResult<Vec<StudentAccount>> {
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.staff_id == staff_id)
            .cloned()
            .collect())
    }

    async fn student_emails_present(&self, emails: &[String]) -> PortResult<Vec<String>> {
        let rows = self.students.lock().unwrap();
        Ok(emails
            .iter()
            .filter(|email| rows.iter().any(|s| &s.email == *email))
            .cloned()
            .collect())
    }

    async fn delete_student(&self, id: Uuid) -> PortResult<()> {
        let mut rows = self.students.lock().unwrap();
        let before = rows.len();
        rows.retain(|s| s.id != id);
        if rows.len() == before {
            return Err(PortError::NotFound("student".to_string()));
        }
        self.applications
            .lock()
            .unwrap()
            .retain(|a| a.student_id != id);
        Ok(())
    }

    async fn update_student_password(&self, id: Uuid, password_hash: &str) -> PortResult<()> {
        let mut rows = self.students.lock().unwrap();
        let student = rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PortError::NotFound("student".to_string()))?;
        student.password_hash = Some(password_hash.to_string());
        Ok(())
    }

    async fn set_student_placement(&self, id: Uuid, company: &str) -> PortResult<()> {
        let mut rows = self.students.lock().unwrap();
        let student = rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PortError::NotFound("student".to_string()))?;
        student.placed_company = Some(company.to_string());
        Ok(())
    }

    async fn set_student_photo(&self, id: Uuid, photo_url: &str) -> PortResult<()> {
        let mut rows = self.students.lock().unwrap();
        let student = rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PortError::NotFound("student".to_string()))?;
        student.photo_url = Some(photo_url.to_string());
        Ok(())
    }

    async fn list_placed_students(&self) -> PortResult<Vec<PlacedStudent>> {
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| {
                s.placed_company.as_ref().map(|company| PlacedStudent {
                    name: s.name.clone(),
                    department: s.department.clone(),
                    company: company.clone(),
                })
            })
            .collect())
    }

    async fn create_drive(&self, drive: NewDrive) -> PortResult<Drive> {
        let created = Drive {
            id: Uuid::new_v4(),
            company: drive.company,
            description: drive.description,
            eligible_departments: drive.eligible_departments,
            deadline: drive.deadline,
            created_by: drive.created_by,
            created_at: Utc::now(),
        };
        self.drives.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn get_drive_by_id(&self, id: Uuid) -> PortResult<Drive> {
        self.drives
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("drive".to_string()))
    }

    async fn list_drives_by_staff(&self, staff_id: Uuid) -> PortResult<Vec<Drive>> {
        Ok(self
            .drives
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.created_by == Some(staff_id))
            .cloned()
            .collect())
    }

    async fn list_open_drives(&self, now: DateTime<Utc>) -> PortResult<Vec<Drive>> {
        Ok(self
            .drives
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.deadline > now)
            .cloned()
            .collect())
    }

    async fn delete_drive(&self, id: Uuid) -> PortResult<()> {
        let mut rows = self.drives.lock().unwrap();
        let before = rows.len();
        rows.retain(|d| d.id != id);
        if rows.len() == before {
            return Err(PortError::NotFound("drive".to_string()));
        }
        self.applications
            .lock()
            .unwrap()
            .retain(|a| a.drive_id != id);
        Ok(())
    }

    async fn create_application(
        &self,
        student_id: Uuid,
        drive_id: Uuid,
    ) -> PortResult<Application> {
        let mut rows = self.applications.lock().unwrap();
        if rows
            .iter()
            .any(|a| a.student_id == student_id && a.drive_id == drive_id)
        {
            return Err(PortError::Conflict(
                "application for this drive already exists".to_string(),
            ));
        }
        let application = Application {
            id: Uuid::new_v4(),
            student_id,
            drive_id,
            applied_at: Utc::now(),
        };
        rows.push(application.clone());
        Ok(application)
    }

    async fn delete_application(&self, student_id: Uuid, drive_id: Uuid) -> PortResult<()> {
        let mut rows = self.applications.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| !(a.student_id == student_id && a.drive_id == drive_id));
        if rows.len() == before {
            return Err(PortError::NotFound("application".to_string()));
        }
        Ok(())
    }

    async fn list_applications_for_student(
        &self,
        student_id: Uuid,
    ) -> PortResult<Vec<(Application, Drive)>> {
        let drives = self.drives.lock().unwrap();
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.student_id == student_id)
            .filter_map(|a| {
                drives
                    .iter()
                    .find(|d| d.id == a.drive_id)
                    .map(|d| (a.clone(), d.clone()))
            })
            .collect())
    }

    async fn create_event(&self, event: NewEvent) -> PortResult<Event> {
        let created = Event {
            id: Uuid::new_v4(),
            title: event.title,
            description: event.description,
            date: event.date,
            image_url: event.image_url,
            created_at: Utc::now(),
        };
        self.events.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_events(&self) -> PortResult<Vec<Event>> {
        Ok(self.events.lock().unwrap().clone())
    }

    async fn delete_event(&self, id: Uuid) -> PortResult<()> {
        let mut rows = self.events.lock().unwrap();
        let before = rows.len();
        rows.retain(|e| e.id != id);
        if rows.len() == before {
            return Err(PortError::NotFound("event".to_string()));
        }
        Ok(())
    }

    async fn set_event_image(&self, id: Uuid, image_url: &str) -> PortResult<()> {
        let mut rows = self.events.lock().unwrap();
        let event = rows
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| PortError::NotFound("event".to_string()))?;
        event.image_url = Some(image_url.to_string());
        Ok(())
    }

    async fn upsert_profile(&self, profile: Profile) -> PortResult<()> {
        let mut rows = self.profiles.lock().unwrap();
        rows.retain(|p| p.provider_subject != profile.provider_subject);
        rows.push(profile);
        Ok(())
    }

    async fn get_profile(&self, provider_subject: &str) -> PortResult<Profile> {
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.provider_subject == provider_subject)
            .cloned()
            .ok_or_else(|| PortError::NotFound("profile".to_string()))
    }

    async fn delete_profile_by_email(&self, email: &str) -> PortResult<()> {
        self.profiles.lock().unwrap().retain(|p| p.email != email);
        Ok(())
    }
}

//=========================================================================================
// Fake Collaborators
//=========================================================================================

/// Identity provider that hands back a canned identity and records
/// revocations. `unavailable()` simulates a provider outage.
pub struct FakeIdentity {
    pub identity: Mutex<Option<ExternalIdentity>>,
    pub revoked: Mutex<Vec<String>>,
    pub exchange_fails: bool,
}

impl FakeIdentity {
    pub fn returning(email: &str) -> Self {
        Self {
            identity: Mutex::new(Some(ExternalIdentity {
                subject: format!("sub-{}", email),
                email: email.to_string(),
                name: Some("Someone".to_string()),
            })),
            revoked: Mutex::new(Vec::new()),
            exchange_fails: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            identity: Mutex::new(None),
            revoked: Mutex::new(Vec::new()),
            exchange_fails: true,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://provider.test/auth?state={}", state)
    }

    async fn exchange_code(&self, _code: &str) -> PortResult<AuthorizedIdentity> {
        if self.exchange_fails {
            return Err(PortError::Unexpected("provider unavailable".to_string()));
        }
        let identity = self
            .identity
            .lock()
            .unwrap()
            .clone()
            .ok_or(PortError::Unauthorized)?;
        Ok(AuthorizedIdentity {
            identity,
            access_token: "fake-access-token".to_string(),
        })
    }

    async fn revoke(&self, access_token: &str) -> PortResult<()> {
        self.revoked.lock().unwrap().push(access_token.to_string());
        Ok(())
    }
}

/// Mailer that records every send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(Vec<String>, String)>>,
}

#[async_trait]
impl MailService for RecordingMailer {
    async fn send(&self, to: &[String], subject: &str, _body: &str) -> PortResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_vec(), subject.to_string()));
        Ok(())
    }
}

/// Media store that "uploads" to a fixed URL.
#[derive(Default)]
pub struct FakeMedia {
    pub stored: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn store_image(&self, key: &str, _content_type: &str, _data: &[u8]) -> PortResult<String> {
        let url = format!("https://media.test/{}", key);
        self.stored.lock().unwrap().push(url.clone());
        Ok(url)
    }
}

//=========================================================================================
// State Builder
//=========================================================================================

pub fn test_policy() -> RolePolicy {
    RolePolicy::new(
        [ADMIN_EMAIL.to_string()],
        ["hod.cse@saec.ac.in".to_string()],
        DOMAIN,
    )
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::WARN,
        session_secret: "a-test-secret-of-adequate-length".to_string(),
        institution_domain: DOMAIN.to_string(),
        super_admin_emails: vec![ADMIN_EMAIL.to_string()],
        approved_staff_emails: vec!["hod.cse@saec.ac.in".to_string()],
        oauth_client_id: "client".to_string(),
        oauth_client_secret: "secret".to_string(),
        oauth_redirect_url: "http://localhost/callback".to_string(),
        frontend_url: "http://localhost:5173".to_string(),
        media_bucket_url: "https://media.test/bucket".to_string(),
        smtp_host: None,
        smtp_username: None,
        smtp_password: None,
        mail_from: None,
    }
}

/// Everything a handler test needs, with handles onto the fakes.
pub struct TestHarness {
    pub state: Arc<AppState>,
    pub db: Arc<FakeDb>,
    pub identity: Arc<FakeIdentity>,
    pub mailer: Arc<RecordingMailer>,
    pub media: Arc<FakeMedia>,
}

pub fn harness_with_identity(identity: FakeIdentity) -> TestHarness {
    let db = Arc::new(FakeDb::default());
    let identity = Arc::new(identity);
    let mailer = Arc::new(RecordingMailer::default());
    let media = Arc::new(FakeMedia::default());
    let state = Arc::new(AppState {
        db: db.clone(),
        identity: identity.clone(),
        mailer: mailer.clone(),
        media: media.clone(),
        sessions: SessionSigner::new("a-test-secret-of-adequate-length"),
        policy: Arc::new(test_policy()),
        config: Arc::new(test_config()),
    });
    TestHarness {
        state,
        db,
        identity,
        mailer,
        media,
    }
}

pub fn harness() -> TestHarness {
    harness_with_identity(FakeIdentity::returning("nobody@saec.ac.in"))
}
