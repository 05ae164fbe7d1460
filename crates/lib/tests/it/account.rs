//! Authentication flows: lockout, session limits, password lifecycle.

use strongroom::session::{SourceInfo, extract_token};

use crate::helpers::{register_and_login, source, test_env};

#[test]
fn test_lockout_window_and_release() {
    let env = test_env();
    env.service
        .register("alice@example.com", "correct horse", None)
        .unwrap();

    for _ in 0..env.settings.max_login_attempts {
        let _ = env
            .service
            .login("alice@example.com", "wrong", source(), false);
    }

    // Locked: even the correct password bounces
    let err = env
        .service
        .login("alice@example.com", "correct horse", source(), false)
        .unwrap_err();
    assert!(err.is_rate_limited());

    // After the lockout duration the account opens again
    env.clock.advance(env.settings.lockout_duration_secs + 1);
    assert!(
        env.service
            .login("alice@example.com", "correct horse", source(), false)
            .is_ok()
    );
}

#[test]
fn test_lockout_follows_identity_across_sources() {
    let env = test_env();
    env.service
        .register("bob@example.com", "battery staple", None)
        .unwrap();

    for _ in 0..env.settings.max_login_attempts {
        let _ = env
            .service
            .login("bob@example.com", "wrong", SourceInfo::new("198.51.100.1"), false);
    }

    // Locked by failures from one source; a brand new source is rejected too
    let err = env
        .service
        .login("bob@example.com", "battery staple", SourceInfo::new("198.51.100.2"), false)
        .unwrap_err();
    assert!(err.is_rate_limited());
}

#[test]
fn test_source_throttle_across_identities() {
    let env = test_env();
    env.service
        .register("alice@example.com", "correct horse", None)
        .unwrap();

    let bad_source = SourceInfo::new("192.0.2.66");
    for i in 0..env.settings.ip_attempt_threshold {
        let _ = env
            .service
            .login(&format!("probe{i}@example.com"), "x-guess-pw", bad_source.clone(), false);
    }

    let err = env
        .service
        .login("alice@example.com", "correct horse", bad_source, false)
        .unwrap_err();
    assert!(err.is_rate_limited());

    // The legitimate source is unaffected
    assert!(
        env.service
            .login("alice@example.com", "correct horse", source(), false)
            .is_ok()
    );
}

#[test]
fn test_session_cap_and_expiry() {
    let env = test_env();
    env.service
        .register("alice@example.com", "correct horse", None)
        .unwrap();

    let mut tokens = Vec::new();
    for _ in 0..env.settings.max_concurrent_sessions {
        let outcome = env
            .service
            .login("alice@example.com", "correct horse", source(), false)
            .unwrap();
        tokens.push(outcome.session.token);
    }

    let err = env
        .service
        .login("alice@example.com", "correct horse", source(), false)
        .unwrap_err();
    assert!(err.is_conflict());

    // Logging out frees a slot
    env.service.logout(&tokens[0]).unwrap();
    assert!(
        env.service
            .login("alice@example.com", "correct horse", source(), false)
            .is_ok()
    );

    // Idle sessions expire and stop resolving
    env.clock.advance(env.settings.session_ttl_secs + 1);
    for token in &tokens[1..] {
        assert!(env.service.current(token).is_err());
    }
}

#[test]
fn test_sliding_expiry_keeps_active_session_alive() {
    let env = test_env();
    let (_, token) = register_and_login(&env, "alice@example.com", "correct horse");

    // Touch the session every half TTL, well past the original deadline
    for _ in 0..4 {
        env.clock.advance(env.settings.session_ttl_secs / 2);
        assert!(env.service.current(&token).is_ok());
    }
}

#[test]
fn test_remember_me_outlives_default_ttl() {
    let env = test_env();
    env.service
        .register("alice@example.com", "correct horse", None)
        .unwrap();
    let outcome = env
        .service
        .login("alice@example.com", "correct horse", source(), true)
        .unwrap();

    env.clock.advance(env.settings.session_ttl_secs + 1);
    assert!(env.service.current(&outcome.session.token).is_ok());
}

#[test]
fn test_password_change_preserves_secrets() {
    let env = test_env();
    let (alice, token) = register_and_login(&env, "alice@example.com", "correct horse");
    env.service
        .secrets()
        .store(alice, "survives", "the change", None, None, None)
        .unwrap();

    env.service
        .change_password(&token, "correct horse", "new passphrase")
        .unwrap();

    // Old ciphertexts still decrypt under the rewrapped data key
    let revealed = env.service.secrets().get(alice, "survives").unwrap().unwrap();
    assert_eq!(revealed.value.expose(), "the change");

    // And a fresh login with the new password sees them too
    let outcome = env
        .service
        .login("alice@example.com", "new passphrase", source(), false)
        .unwrap();
    assert_eq!(outcome.secrets.loaded, 1);
}

#[test]
fn test_token_transport_forms_are_equivalent() {
    let env = test_env();
    let (_, token) = register_and_login(&env, "alice@example.com", "correct horse");

    let bearer = format!("Bearer {token}");
    let cookie = format!("theme=dark; strongroom_session={token}");

    let from_header = extract_token(Some(&bearer), None).unwrap();
    let from_cookie = extract_token(None, Some(&cookie)).unwrap();
    assert_eq!(from_header, from_cookie);
    assert!(env.service.current(from_header).is_ok());
    assert!(env.service.current(from_cookie).is_ok());
}
