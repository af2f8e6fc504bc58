pub mod domain;
pub mod ports;
pub mod roles;

pub use domain::{
    Application, Drive, Event, ExternalIdentity, Profile, Role, StaffAccount, StudentAccount,
    SuperAdminAccount,
};
pub use ports::{
    DatabaseService, IdentityProvider, MailService, MediaStore, PortError, PortResult,
};
pub use roles::{RoleError, RolePolicy};
