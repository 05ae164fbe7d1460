//! Authentication flows
//!
//! [`AuthenticationService`] is the front door: registration, login, logout,
//! session introspection, password change, and password reset. It composes
//! the lockout guard, the session manager, the identity directory, and the
//! secret auto-loader; nothing below this layer knows about credentials.
//!
//! Error surfaces are deliberately flat. Login cannot distinguish "no such
//! email" from "wrong password" (including by timing), registration cannot
//! confirm an email is taken, and reset requests always report success.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{
    audit::{self, AuditEvent},
    directory::IdentityDirectory,
    errors::AuthError,
    types::{Identity, IdentityProfile, Role},
};
use crate::{
    Result,
    clock::Clock,
    crypto::{self, CryptoVault, VaultKey},
    lockout::LockoutGuard,
    registry::{LoadReport, SecretAutoLoader},
    secrets::{SecretStats, UserSecretRegistry},
    session::{Session, SessionManager, SourceInfo},
    settings::SecuritySettings,
};

/// Maximum accepted email length, in bytes.
const MAX_EMAIL_LENGTH: usize = 254;

/// Byte length of the random password-reset token.
const RESET_TOKEN_LENGTH: usize = 32;

/// Result of a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub session: Session,
    pub profile: IdentityProfile,
    /// How the automatic secret load went; failures here never fail login.
    pub secrets: LoadReport,
}

/// Snapshot of the authenticated account behind a session token.
#[derive(Debug)]
pub struct AccountOverview {
    pub profile: IdentityProfile,
    pub session: Session,
    pub secrets: SecretStats,
}

struct ResetToken {
    identity: Uuid,
    expires_at: i64,
}

/// Registration, login, and account lifecycle.
pub struct AuthenticationService {
    directory: Arc<IdentityDirectory>,
    master: Arc<CryptoVault>,
    secrets: Arc<UserSecretRegistry>,
    sessions: SessionManager,
    lockout: LockoutGuard,
    loader: Arc<SecretAutoLoader>,
    settings: SecuritySettings,
    clock: Arc<dyn Clock>,
    /// SHA-256 digests of outstanding reset tokens; the tokens themselves
    /// are never stored.
    reset_tokens: Mutex<HashMap<String, ResetToken>>,
}

impl AuthenticationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        directory: Arc<IdentityDirectory>,
        master: Arc<CryptoVault>,
        secrets: Arc<UserSecretRegistry>,
        sessions: SessionManager,
        lockout: LockoutGuard,
        loader: Arc<SecretAutoLoader>,
        settings: SecuritySettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            master,
            secrets,
            sessions,
            lockout,
            loader,
            settings,
            clock,
            reset_tokens: Mutex::new(HashMap::new()),
        }
    }

    /// The secret registry this service authenticates access to.
    pub fn secrets(&self) -> &Arc<UserSecretRegistry> {
        &self.secrets
    }

    /// The session-scoped secret loader.
    pub fn loader(&self) -> &Arc<SecretAutoLoader> {
        &self.loader
    }

    /// Register a new account.
    ///
    /// The first identity ever registered becomes an admin; everyone after
    /// is a regular user. A fresh data key is provisioned and stored wrapped
    /// under the master key. A taken email reads as the same generic
    /// [`AuthError::RegistrationFailed`] as any other refusal.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<IdentityProfile> {
        let email = normalize_email(email)?;
        if password.len() < self.settings.min_password_length {
            return Err(AuthError::WeakPassword {
                min: self.settings.min_password_length,
            }
            .into());
        }

        let data_key = VaultKey::generate();
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: crypto::password::hash_password(password)?,
            display_name: display_name.map(str::to_string),
            role: if self.directory.is_empty() {
                Role::Admin
            } else {
                Role::User
            },
            active: true,
            created_at: self.clock.now_secs(),
            last_login_at: None,
            wrapped_data_key: self.master.wrap_key(&data_key)?,
        };
        let profile = identity.profile();

        if !self.directory.insert(identity) {
            return Err(AuthError::RegistrationFailed.into());
        }

        audit::emit(&AuditEvent::Registered {
            identity: profile.id,
            email: &email,
        });
        Ok(profile)
    }

    /// Authenticate and open a session.
    ///
    /// Runs the lockout gate before touching credentials, burns a dummy
    /// verification when the email is unknown, and rejects disabled accounts
    /// only after the password has been verified. On success the failure
    /// history clears and the identity's secrets are loaded into the
    /// registry; a load failure is logged but never fails the login.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        source: SourceInfo,
        remember_me: bool,
    ) -> Result<LoginOutcome> {
        let email = normalize_email(email)?;
        if let Err(e) = self.lockout.gate(&email, &source.address) {
            audit::emit(&AuditEvent::LoginRejected {
                email: &email,
                source: &source.address,
                reason: "rate limited",
            });
            return Err(e);
        }

        let Some(mut identity) = self.directory.by_email(&email) else {
            crypto::password::dummy_verify(password);
            self.lockout.record_failure(&email, &source.address)?;
            audit::emit(&AuditEvent::LoginFailed {
                email: &email,
                source: &source.address,
            });
            return Err(AuthError::InvalidCredentials.into());
        };

        if crypto::password::verify_password(password, &identity.password_hash).is_err() {
            self.lockout.record_failure(&email, &source.address)?;
            audit::emit(&AuditEvent::LoginFailed {
                email: &email,
                source: &source.address,
            });
            return Err(AuthError::InvalidCredentials.into());
        }

        if !identity.active {
            audit::emit(&AuditEvent::LoginRejected {
                email: &email,
                source: &source.address,
                reason: "account disabled",
            });
            return Err(AuthError::AccountDisabled.into());
        }

        let session = match self.sessions.create(identity.id, source.clone(), remember_me) {
            Ok(session) => session,
            Err(e) => {
                audit::emit(&AuditEvent::LoginRejected {
                    email: &email,
                    source: &source.address,
                    reason: "session limit reached",
                });
                return Err(e);
            }
        };

        identity.last_login_at = Some(self.clock.now_secs());
        self.directory.update(identity.clone())?;
        self.lockout.clear(&email)?;

        let secrets = match self.loader.load_for_session(&session.token, identity.id) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(identity = %identity.id, error = %e, "secret auto-load failed");
                LoadReport::default()
            }
        };

        audit::emit(&AuditEvent::LoginSucceeded {
            identity: identity.id,
            source: &source.address,
        });
        Ok(LoginOutcome {
            session,
            profile: identity.profile(),
            secrets,
        })
    }

    /// End a session: withdraw its loaded secrets, then revoke the token.
    ///
    /// Succeeds for unknown tokens too, so a client retrying logout never
    /// sees an error.
    pub fn logout(&self, token: &str) -> Result<()> {
        let identity = self.sessions.validate(token)?.map(|s| s.identity);
        self.loader.unload_for_session(token);
        self.sessions.revoke(token)?;
        if let Some(identity) = identity {
            audit::emit(&AuditEvent::LoggedOut { identity });
        }
        Ok(())
    }

    /// Resolve a session token to the account behind it.
    pub fn current(&self, token: &str) -> Result<AccountOverview> {
        let Some(session) = self.sessions.validate(token)? else {
            return Err(AuthError::NotAuthenticated.into());
        };
        let identity = self
            .directory
            .get(session.identity)
            .ok_or(AuthError::UnknownIdentity {
                id: session.identity,
            })?;
        let secrets = self.secrets.stats(identity.id)?;
        Ok(AccountOverview {
            profile: identity.profile(),
            session,
            secrets,
        })
    }

    /// Change the authenticated account's password.
    ///
    /// Requires the current password, rewraps the data key, and revokes
    /// every other session. Stored secrets survive untouched: only the
    /// wrapping envelope changes, never the data key itself.
    pub fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let Some(session) = self.sessions.validate(token)? else {
            return Err(AuthError::NotAuthenticated.into());
        };
        let mut identity = self
            .directory
            .get(session.identity)
            .ok_or(AuthError::UnknownIdentity {
                id: session.identity,
            })?;

        if crypto::password::verify_password(current_password, &identity.password_hash).is_err() {
            return Err(AuthError::InvalidCredentials.into());
        }
        if new_password.len() < self.settings.min_password_length {
            return Err(AuthError::WeakPassword {
                min: self.settings.min_password_length,
            }
            .into());
        }

        identity.password_hash = crypto::password::hash_password(new_password)?;
        identity.wrapped_data_key = self.master.rewrap_key(&identity.wrapped_data_key)?;
        self.directory.update(identity.clone())?;

        let revoked = self.sessions.revoke_others(identity.id, token)?;
        audit::emit(&AuditEvent::PasswordChanged {
            identity: identity.id,
        });
        if revoked > 0 {
            audit::emit(&AuditEvent::SessionsRevoked {
                identity: identity.id,
                count: revoked,
            });
        }
        Ok(())
    }

    /// Enable or disable an account. Admin-only.
    ///
    /// Disabling revokes the target's sessions immediately; their secrets
    /// stay intact for when the account is re-enabled.
    pub fn set_active(&self, token: &str, target: Uuid, active: bool) -> Result<()> {
        let overview = self.current(token)?;
        if overview.profile.role != Role::Admin {
            return Err(AuthError::NotAuthenticated.into());
        }

        let mut identity = self
            .directory
            .get(target)
            .ok_or(AuthError::UnknownIdentity { id: target })?;
        identity.active = active;
        self.directory.update(identity)?;

        if !active {
            let revoked = self.sessions.revoke_all(target)?;
            if revoked > 0 {
                audit::emit(&AuditEvent::SessionsRevoked {
                    identity: target,
                    count: revoked,
                });
            }
        }
        Ok(())
    }

    /// Begin a password reset.
    ///
    /// Always reports success so the endpoint cannot confirm which emails
    /// hold accounts. When the identity exists, a single-use token is minted,
    /// its digest stored with a TTL, and the token itself handed to the audit
    /// sink for delivery.
    pub fn begin_password_reset(&self, email: &str) -> Result<()> {
        let Ok(email) = normalize_email(email) else {
            return Ok(());
        };
        let Some(identity) = self.directory.by_email(&email) else {
            return Ok(());
        };

        let token = generate_reset_token();
        let entry = ResetToken {
            identity: identity.id,
            expires_at: self.clock.now_secs() + self.settings.reset_token_ttl_secs,
        };
        self.reset_tokens
            .lock()
            .expect("reset token lock poisoned")
            .insert(digest(&token), entry);

        audit::emit(&AuditEvent::PasswordResetRequested {
            identity: identity.id,
            token: &token,
        });
        Ok(())
    }

    /// Complete a password reset with a token from
    /// [`begin_password_reset`](Self::begin_password_reset).
    ///
    /// The token is single-use. Password validation runs first, so a weak
    /// new password does not burn the token. All sessions are revoked and
    /// the lockout history clears, so the owner can log straight back in
    /// even if an attacker had locked the account.
    pub fn complete_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
        if new_password.len() < self.settings.min_password_length {
            return Err(AuthError::WeakPassword {
                min: self.settings.min_password_length,
            }
            .into());
        }

        let entry = self
            .reset_tokens
            .lock()
            .expect("reset token lock poisoned")
            .remove(&digest(token))
            .ok_or(AuthError::ResetTokenInvalid)?;
        if self.clock.now_secs() > entry.expires_at {
            return Err(AuthError::ResetTokenInvalid.into());
        }

        let mut identity =
            self.directory
                .get(entry.identity)
                .ok_or(AuthError::UnknownIdentity {
                    id: entry.identity,
                })?;
        identity.password_hash = crypto::password::hash_password(new_password)?;
        identity.wrapped_data_key = self.master.rewrap_key(&identity.wrapped_data_key)?;
        self.directory.update(identity.clone())?;

        let revoked = self.sessions.revoke_all(identity.id)?;
        self.lockout.clear(&identity.email)?;

        audit::emit(&AuditEvent::PasswordResetCompleted {
            identity: identity.id,
        });
        if revoked > 0 {
            audit::emit(&AuditEvent::SessionsRevoked {
                identity: identity.id,
                count: revoked,
            });
        }
        Ok(())
    }
}

/// Trim, lowercase, and validate an email address.
fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(AuthError::InvalidEmail {
            reason: "email is empty or too long".to_string(),
        }
        .into());
    }
    let mut parts = email.split('@');
    let (local, domain) = (parts.next(), parts.next());
    let ok = matches!((local, domain, parts.next()), (Some(l), Some(d), None) if !l.is_empty() && !d.is_empty())
        && !email.chars().any(char::is_whitespace);
    if !ok {
        return Err(AuthError::InvalidEmail {
            reason: "not a valid address".to_string(),
        }
        .into());
    }
    Ok(email)
}

fn generate_reset_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; RESET_TOKEN_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
