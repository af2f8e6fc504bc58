pub mod db;
pub mod google;
pub mod mailer;
pub mod media;

pub use db::DbAdapter;
pub use google::GoogleIdentityAdapter;
pub use mailer::{NoopMailer, SmtpMailer};
pub use media::BucketMediaStore;
