use std::sync::Arc;

use strongroom::{
    FixedClock,
    account::{AuthenticationService, DirectoryKeySource, IdentityDirectory},
    crypto::CryptoVault,
    lockout::{InMemoryAttemptStore, LockoutGuard},
    registry::{SecretAutoLoader, SecretRegistry},
    secrets::UserSecretRegistry,
    session::{InMemorySessionStore, SessionManager, SourceInfo},
    settings::SecuritySettings,
    storage::{FileStore, InMemoryStore, SecretStore},
};

// ==========================
// CORE TEST FACTORIES
// ==========================

/// Fully wired service plus the handles tests poke at directly.
pub struct TestEnv {
    pub service: AuthenticationService,
    pub registry: Arc<SecretRegistry>,
    pub clock: Arc<FixedClock>,
    pub settings: SecuritySettings,
    // Keeps the secret directory alive for file-backed environments
    _dir: Option<tempfile::TempDir>,
}

/// Builds a [`TestEnv`] over the in-memory secret store.
pub fn test_env() -> TestEnv {
    build_env(Arc::new(InMemoryStore::new()), None)
}

/// Builds a [`TestEnv`] over a file-backed secret store in a temp dir.
pub fn test_env_on_disk() -> TestEnv {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = Arc::new(FileStore::open(dir.path()).expect("Failed to open file store"));
    build_env(store, Some(dir))
}

fn build_env(store: Arc<dyn SecretStore>, dir: Option<tempfile::TempDir>) -> TestEnv {
    let clock: Arc<FixedClock> = Arc::new(FixedClock::default());
    let settings = SecuritySettings::default();

    let directory = Arc::new(IdentityDirectory::new());
    let master = Arc::new(CryptoVault::generate());
    let secrets = Arc::new(UserSecretRegistry::new(
        store,
        Arc::new(DirectoryKeySource::new(directory.clone(), master.clone())),
        clock.clone(),
    ));
    let registry = Arc::new(SecretRegistry::new());
    let loader = Arc::new(SecretAutoLoader::new(secrets.clone(), registry.clone()));
    let sessions = SessionManager::new(
        Arc::new(InMemorySessionStore::new()),
        settings.clone(),
        clock.clone(),
    );
    let lockout = LockoutGuard::new(
        Arc::new(InMemoryAttemptStore::new()),
        settings.clone(),
        clock.clone(),
    );

    let service = AuthenticationService::new(
        directory,
        master,
        secrets,
        sessions,
        lockout,
        loader,
        settings.clone(),
        clock.clone(),
    );
    TestEnv {
        service,
        registry,
        clock,
        settings,
        _dir: dir,
    }
}

// ==========================
// SCENARIO HELPERS
// ==========================

pub fn source() -> SourceInfo {
    SourceInfo::new("203.0.113.7")
}

/// Registers an account and logs it in, returning (identity id, token).
pub fn register_and_login(env: &TestEnv, email: &str, password: &str) -> (uuid::Uuid, String) {
    let profile = env
        .service
        .register(email, password, None)
        .expect("Failed to register");
    let outcome = env
        .service
        .login(email, password, source(), false)
        .expect("Failed to login");
    (profile.id, outcome.session.token)
}
