//! Accounts and authentication
//!
//! The identity directory, the audit trail, and the
//! [`AuthenticationService`] that ties credentials, lockout, sessions, and
//! secret auto-loading together.

mod audit;
mod directory;
mod errors;
mod service;
mod types;

pub use audit::AuditEvent;
pub use directory::{DirectoryKeySource, IdentityDirectory};
pub use errors::AuthError;
pub use service::{AccountOverview, AuthenticationService, LoginOutcome};
pub use types::{Identity, IdentityProfile, Role};
