//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use placement_core::ports::{DatabaseService, IdentityProvider, MailService, MediaStore};
use placement_core::roles::RolePolicy;

use crate::config::Config;
use crate::web::session::SessionSigner;

/// The shared application state, created once at startup and passed to all
/// handlers. Every collaborator sits behind a port trait so tests can
/// substitute in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn MailService>,
    pub media: Arc<dyn MediaStore>,
    pub sessions: SessionSigner,
    pub policy: Arc<RolePolicy>,
    pub config: Arc<Config>,
}
