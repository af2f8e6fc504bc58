//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use placement_core::domain::{
    Application, Drive, Event, Profile, Role, StaffAccount, StudentAccount, SuperAdminAccount,
};
use placement_core::ports::{
    DatabaseService, NewDrive, NewEvent, NewStaff, NewStudent, PlacedStudent, PortError,
    PortResult,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a sqlx error onto the port taxonomy. Unique-constraint
/// violations (Postgres 23505) become `Conflict` so a lost
/// check-then-act race surfaces as 409, not 500.
fn map_db_err(context: &str, e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(context.to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            PortError::Conflict(context.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SuperAdminRecord {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
}
impl SuperAdminRecord {
    fn to_domain(self) -> SuperAdminAccount {
        SuperAdminAccount {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct StaffRecord {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    name: String,
    department: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}
impl StaffRecord {
    fn to_domain(self) -> StaffAccount {
        StaffAccount {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            department: self.department,
            phone: self.phone,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct StudentRecord {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    name: String,
    department: String,
    batch: i32,
    cgpa: Option<f64>,
    registration_no: Option<String>,
    staff_id: Uuid,
    placed_company: Option<String>,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
}
impl StudentRecord {
    fn to_domain(self) -> StudentAccount {
        StudentAccount {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            department: self.department,
            batch: self.batch,
            cgpa: self.cgpa,
            registration_no: self.registration_no,
            staff_id: self.staff_id,
            placed_company: self.placed_company,
            photo_url: self.photo_url,
            created_at: self.created_at,
        }
    }
}

const STUDENT_COLUMNS: &str = "id, email, password_hash, name, department, batch, cgpa, \
     registration_no, staff_id, placed_company, photo_url, created_at";

#[derive(FromRow)]
struct DriveRecord {
    id: Uuid,
    company: String,
    description: String,
    eligible_departments: Vec<String>,
    deadline: DateTime<Utc>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}
impl DriveRecord {
    fn to_domain(self) -> Drive {
        Drive {
            id: self.id,
            company: self.company,
            description: self.description,
            eligible_departments: self.eligible_departments,
            deadline: self.deadline,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

const DRIVE_COLUMNS: &str =
    "id, company, description, eligible_departments, deadline, created_by, created_at";

#[derive(FromRow)]
struct ApplicationRecord {
    id: Uuid,
    student_id: Uuid,
    drive_id: Uuid,
    applied_at: DateTime<Utc>,
}
impl ApplicationRecord {
    fn to_domain(self) -> Application {
        Application {
            id: self.id,
            student_id: self.student_id,
            drive_id: self.drive_id,
            applied_at: self.applied_at,
        }
    }
}

/// One joined row for the student's application list.
#[derive(FromRow)]
struct ApplicationDriveRecord {
    id: Uuid,
    student_id: Uuid,
    drive_id: Uuid,
    applied_at: DateTime<Utc>,
    company: String,
    description: String,
    eligible_departments: Vec<String>,
    deadline: DateTime<Utc>,
    created_by: Option<Uuid>,
    drive_created_at: DateTime<Utc>,
}
impl ApplicationDriveRecord {
    fn to_domain(self) -> (Application, Drive) {
        (
            Application {
                id: self.id,
                student_id: self.student_id,
                drive_id: self.drive_id,
                applied_at: self.applied_at,
            },
            Drive {
                id: self.drive_id,
                company: self.company,
                description: self.description,
                eligible_departments: self.eligible_departments,
                deadline: self.deadline,
                created_by: self.created_by,
                created_at: self.drive_created_at,
            },
        )
    }
}

#[derive(FromRow)]
struct EventRecord {
    id: Uuid,
    title: String,
    description: String,
    date: DateTime<Utc>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}
impl EventRecord {
    fn to_domain(self) -> Event {
        Event {
            id: self.id,
            title: self.title,
            description: self.description,
            date: self.date,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    provider_subject: String,
    email: String,
    role: String,
}
impl ProfileRecord {
    fn to_domain(self) -> PortResult<Profile> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| PortError::Unexpected(format!("unknown role '{}'", self.role)))?;
        Ok(Profile {
            provider_subject: self.provider_subject,
            email: self.email,
            role,
        })
    }
}

#[derive(FromRow)]
struct PlacedStudentRecord {
    name: String,
    department: String,
    placed_company: String,
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_super_admin_by_email(&self, email: &str) -> PortResult<SuperAdminAccount> {
        let record = sqlx::query_as::<_, SuperAdminRecord>(
            "SELECT id, email, password_hash FROM super_admins WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("super admin", e))?;
        Ok(record.to_domain())
    }

    async fn upsert_super_admin(&self, email: &str) -> PortResult<SuperAdminAccount> {
        let record = sqlx::query_as::<_, SuperAdminRecord>(
            "INSERT INTO super_admins (id, email) VALUES ($1, $2) \
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email \
             RETURNING id, email, password_hash",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("super admin", e))?;
        Ok(record.to_domain())
    }

    async fn update_super_admin_password(&self, id: Uuid, password_hash: &str) -> PortResult<()> {
        sqlx::query("UPDATE super_admins SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("super admin", e))?;
        Ok(())
    }

    async fn create_staff(&self, staff: NewStaff) -> PortResult<StaffAccount> {
        let record = sqlx::query_as::<_, StaffRecord>(
            "INSERT INTO staff (id, email, password_hash, name, department, phone) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, email, password_hash, name, department, phone, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&staff.email)
        .bind(&staff.password_hash)
        .bind(&staff.name)
        .bind(&staff.department)
        .bind(&staff.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(&format!("staff email {}", staff.email), e))?;
        Ok(record.to_domain())
    }

    async fn get_staff_by_email(&self, email: &str) -> PortResult<StaffAccount> {
        let record = sqlx::query_as::<_, StaffRecord>(
            "SELECT id, email, password_hash, name, department, phone, created_at \
             FROM staff WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("staff", e))?;
        Ok(record.to_domain())
    }

    async fn get_staff_by_id(&self, id: Uuid) -> PortResult<StaffAccount> {
        let record = sqlx::query_as::<_, StaffRecord>(
            "SELECT id, email, password_hash, name, department, phone, created_at \
             FROM staff WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("staff", e))?;
        Ok(record.to_domain())
    }

    async fn list_staff(&self) -> PortResult<Vec<StaffAccount>> {
        let records = sqlx::query_as::<_, StaffRecord>(
            "SELECT id, email, password_hash, name, department, phone, created_at \
             FROM staff ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("staff", e))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_staff(&self, id: Uuid) -> PortResult<StaffAccount> {
        // Students under this staff member cascade at the database.
        let record = sqlx::query_as::<_, StaffRecord>(
            "DELETE FROM staff WHERE id = $1 \
             RETURNING id, email, password_hash, name, department, phone, created_at",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("staff", e))?;
        Ok(record.to_domain())
    }

    async fn update_staff_password(&self, id: Uuid, password_hash: &str) -> PortResult<()> {
        sqlx::query("UPDATE staff SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("staff", e))?;
        Ok(())
    }

    async fn create_student(&self, student: NewStudent) -> PortResult<StudentAccount> {
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            "INSERT INTO students \
             (id, email, password_hash, name, department, batch, cgpa, registration_no, staff_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&student.email)
        .bind(&student.password_hash)
        .bind(&student.name)
        .bind(&student.department)
        .bind(student.batch)
        .bind(student.cgpa)
        .bind(&student.registration_no)
        .bind(student.staff_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(&format!("student email {}", student.email), e))?;
        Ok(record.to_domain())
    }

    async fn get_student_by_email(&self, email: &str) -> PortResult<StudentAccount> {
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("student", e))?;
        Ok(record.to_domain())
    }

    async fn get_student_by_id(&self, id: Uuid) -> PortResult<StudentAccount> {
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("student", e))?;
        Ok(record.to_domain())
    }

    async fn list_students_by_staff(&self, staff_id: Uuid) -> PortResult<Vec<StudentAccount>> {
        let records = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE staff_id = $1 ORDER BY created_at DESC"
        ))
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("students", e))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn student_emails_present(&self, emails: &[String]) -> PortResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT email FROM students WHERE email = ANY($1)")
                .bind(emails)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_db_err("students", e))?;
        Ok(rows.into_iter().map(|(email,)| email).collect())
    }

    async fn delete_student(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("student", e))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("student {}", id)));
        }
        Ok(())
    }

    async fn update_student_password(&self, id: Uuid, password_hash: &str) -> PortResult<()> {
        sqlx::query("UPDATE students SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("student", e))?;
        Ok(())
    }

    async fn set_student_placement(&self, id: Uuid, company: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE students SET placed_company = $1 WHERE id = $2")
            .bind(company)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("student", e))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("student {}", id)));
        }
        Ok(())
    }

    async fn set_student_photo(&self, id: Uuid, photo_url: &str) -> PortResult<()> {
        sqlx::query("UPDATE students SET photo_url = $1 WHERE id = $2")
            .bind(photo_url)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("student", e))?;
        Ok(())
    }

    async fn list_placed_students(&self) -> PortResult<Vec<PlacedStudent>> {
        let records = sqlx::query_as::<_, PlacedStudentRecord>(
            "SELECT name, department, placed_company FROM students \
             WHERE placed_company IS NOT NULL ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("students", e))?;
        Ok(records
            .into_iter()
            .map(|r| PlacedStudent {
                name: r.name,
                department: r.department,
                company: r.placed_company,
            })
            .collect())
    }

    async fn create_drive(&self, drive: NewDrive) -> PortResult<Drive> {
        let record = sqlx::query_as::<_, DriveRecord>(&format!(
            "INSERT INTO drives (id, company, description, eligible_departments, deadline, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {DRIVE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&drive.company)
        .bind(&drive.description)
        .bind(&drive.eligible_departments)
        .bind(drive.deadline)
        .bind(drive.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("drive", e))?;
        Ok(record.to_domain())
    }

    async fn get_drive_by_id(&self, id: Uuid) -> PortResult<Drive> {
        let record = sqlx::query_as::<_, DriveRecord>(&format!(
            "SELECT {DRIVE_COLUMNS} FROM drives WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("drive", e))?;
        Ok(record.to_domain())
    }

    async fn list_drives_by_staff(&self, staff_id: Uuid) -> PortResult<Vec<Drive>> {
        let records = sqlx::query_as::<_, DriveRecord>(&format!(
            "SELECT {DRIVE_COLUMNS} FROM drives WHERE created_by = $1 ORDER BY created_at DESC"
        ))
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("drives", e))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_open_drives(&self, now: DateTime<Utc>) -> PortResult<Vec<Drive>> {
        let records = sqlx::query_as::<_, DriveRecord>(&format!(
            "SELECT {DRIVE_COLUMNS} FROM drives WHERE deadline > $1 ORDER BY created_at DESC"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("drives", e))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_drive(&self, id: Uuid) -> PortResult<()> {
        // Applications cascade at the database.
        let result = sqlx::query("DELETE FROM drives WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("drive", e))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("drive {}", id)));
        }
        Ok(())
    }

    async fn create_application(
        &self,
        student_id: Uuid,
        drive_id: Uuid,
    ) -> PortResult<Application> {
        let record = sqlx::query_as::<_, ApplicationRecord>(
            "INSERT INTO applications (id, student_id, drive_id) VALUES ($1, $2, $3) \
             RETURNING id, student_id, drive_id, applied_at",
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(drive_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("application for this drive already exists", e))?;
        Ok(record.to_domain())
    }

    async fn delete_application(&self, student_id: Uuid, drive_id: Uuid) -> PortResult<()> {
        let result =
            sqlx::query("DELETE FROM applications WHERE student_id = $1 AND drive_id = $2")
                .bind(student_id)
                .bind(drive_id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_db_err("application", e))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("application".to_string()));
        }
        Ok(())
    }

    async fn list_applications_for_student(
        &self,
        student_id: Uuid,
    ) -> PortResult<Vec<(Application, Drive)>> {
        let records = sqlx::query_as::<_, ApplicationDriveRecord>(
            "SELECT a.id, a.student_id, a.drive_id, a.applied_at, \
                    d.company, d.description, d.eligible_departments, d.deadline, \
                    d.created_by, d.created_at AS drive_created_at \
             FROM applications a JOIN drives d ON d.id = a.drive_id \
             WHERE a.student_id = $1 ORDER BY a.applied_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("applications", e))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_event(&self, event: NewEvent) -> PortResult<Event> {
        let record = sqlx::query_as::<_, EventRecord>(
            "INSERT INTO events (id, title, description, date, image_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, title, description, date, image_url, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("event", e))?;
        Ok(record.to_domain())
    }

    async fn list_events(&self) -> PortResult<Vec<Event>> {
        let records = sqlx::query_as::<_, EventRecord>(
            "SELECT id, title, description, date, image_url, created_at \
             FROM events ORDER BY date DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("events", e))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_event(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("event", e))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("event {}", id)));
        }
        Ok(())
    }

    async fn set_event_image(&self, id: Uuid, image_url: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE events SET image_url = $1 WHERE id = $2")
            .bind(image_url)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("event", e))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("event {}", id)));
        }
        Ok(())
    }

    async fn upsert_profile(&self, profile: Profile) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO profiles (provider_subject, email, role) VALUES ($1, $2, $3) \
             ON CONFLICT (provider_subject) \
             DO UPDATE SET email = EXCLUDED.email, role = EXCLUDED.role",
        )
        .bind(&profile.provider_subject)
        .bind(&profile.email)
        .bind(profile.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err("profile", e))?;
        Ok(())
    }

    async fn get_profile(&self, provider_subject: &str) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT provider_subject, email, role FROM profiles WHERE provider_subject = $1",
        )
        .bind(provider_subject)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("profile", e))?;
        record.to_domain()
    }

    async fn delete_profile_by_email(&self, email: &str) -> PortResult<()> {
        // Zero rows deleted is fine: not every staff member logged in
        // via OAuth, so a profile may never have existed.
        sqlx::query("DELETE FROM profiles WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("profile", e))?;
        Ok(())
    }
}
