//! Security audit trail
//!
//! Every security-relevant transition emits one structured event on the
//! `audit` tracing target, so deployments can route the trail separately
//! from application logs. Events never carry passwords or secret values;
//! the password-reset token is the one deliberate exception, since the
//! audit sink doubles as the delivery channel for it.

use uuid::Uuid;

/// A security-relevant event.
#[derive(Debug)]
pub enum AuditEvent<'a> {
    Registered {
        identity: Uuid,
        email: &'a str,
    },
    LoginSucceeded {
        identity: Uuid,
        source: &'a str,
    },
    LoginFailed {
        email: &'a str,
        source: &'a str,
    },
    /// A login refused before or after credential verification for a reason
    /// other than the credentials themselves.
    LoginRejected {
        email: &'a str,
        source: &'a str,
        reason: &'a str,
    },
    LoggedOut {
        identity: Uuid,
    },
    PasswordChanged {
        identity: Uuid,
    },
    PasswordResetRequested {
        identity: Uuid,
        token: &'a str,
    },
    PasswordResetCompleted {
        identity: Uuid,
    },
    SessionsRevoked {
        identity: Uuid,
        count: usize,
    },
}

/// Emit an event onto the audit target.
pub fn emit(event: &AuditEvent<'_>) {
    match event {
        AuditEvent::Registered { identity, email } => {
            tracing::info!(target: "audit", %identity, email, "identity registered");
        }
        AuditEvent::LoginSucceeded { identity, source } => {
            tracing::info!(target: "audit", %identity, source, "login succeeded");
        }
        AuditEvent::LoginFailed { email, source } => {
            tracing::warn!(target: "audit", email, source, "login failed");
        }
        AuditEvent::LoginRejected { email, source, reason } => {
            tracing::warn!(target: "audit", email, source, reason, "login rejected");
        }
        AuditEvent::LoggedOut { identity } => {
            tracing::info!(target: "audit", %identity, "logged out");
        }
        AuditEvent::PasswordChanged { identity } => {
            tracing::info!(target: "audit", %identity, "password changed");
        }
        AuditEvent::PasswordResetRequested { identity, token } => {
            tracing::info!(target: "audit", %identity, token, "password reset requested");
        }
        AuditEvent::PasswordResetCompleted { identity } => {
            tracing::info!(target: "audit", %identity, "password reset completed");
        }
        AuditEvent::SessionsRevoked { identity, count } => {
            tracing::info!(target: "audit", %identity, count, "sessions revoked");
        }
    }
}
