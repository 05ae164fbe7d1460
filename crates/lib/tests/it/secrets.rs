//! Ownership, sharing, and expiry scenarios over durable storage.

use strongroom::secrets::{AccessRole, ExpirationFilter, SecretFilter};

use crate::helpers::{register_and_login, test_env, test_env_on_disk};

#[test]
fn test_two_accounts_are_isolated_on_disk() {
    let env = test_env_on_disk();
    let (alice, _) = register_and_login(&env, "alice@example.com", "correct horse");
    let (bob, _) = register_and_login(&env, "bob@example.com", "battery staple");

    let secrets = env.service.secrets();
    secrets
        .store(alice, "db.password", "alice-pw", Some("prod db"), Some("database"), None)
        .unwrap();
    secrets
        .store(bob, "db.password", "bob-pw", None, Some("database"), None)
        .unwrap();

    // Same key, different owners, different values, different ciphertexts
    assert_eq!(
        secrets.get(alice, "db.password").unwrap().unwrap().value.expose(),
        "alice-pw"
    );
    assert_eq!(
        secrets.get(bob, "db.password").unwrap().unwrap().value.expose(),
        "bob-pw"
    );

    // Neither can see the other's record in a listing
    let listed = secrets.list_accessible(alice, &SecretFilter::new()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].owner, alice);
}

#[test]
fn test_share_revoke_lifecycle() {
    let env = test_env();
    let (alice, _) = register_and_login(&env, "alice@example.com", "correct horse");
    let (bob, _) = register_and_login(&env, "bob@example.com", "battery staple");

    let secrets = env.service.secrets();
    secrets
        .store(alice, "api.token", "tok-123", None, None, None)
        .unwrap();

    // Before sharing: invisible to bob
    assert!(secrets.get(bob, "api.token").unwrap().is_none());

    secrets.share(alice, "api.token", bob).unwrap();
    let revealed = secrets.get(bob, "api.token").unwrap().unwrap();
    assert_eq!(revealed.value.expose(), "tok-123");
    assert_eq!(revealed.role, AccessRole::Shared);

    // Bob cannot share it onward or delete it
    let carol = register_and_login(&env, "carol@example.com", "tertiary pw").0;
    assert!(secrets.share(bob, "api.token", carol).is_err());
    assert!(secrets.delete(bob, "api.token").is_err());

    // Revocation takes effect immediately
    secrets.revoke(alice, "api.token", bob).unwrap();
    assert!(secrets.get(bob, "api.token").unwrap().is_none());
}

#[test]
fn test_update_reencrypts_for_shared_readers() {
    let env = test_env();
    let (alice, _) = register_and_login(&env, "alice@example.com", "correct horse");
    let (bob, _) = register_and_login(&env, "bob@example.com", "battery staple");

    let secrets = env.service.secrets();
    secrets.store(alice, "k", "v1", None, None, None).unwrap();
    secrets.share(alice, "k", bob).unwrap();

    secrets.update(alice, "k", "v2", None, None).unwrap();
    assert_eq!(secrets.get(bob, "k").unwrap().unwrap().value.expose(), "v2");
}

#[test]
fn test_expiry_applies_to_shared_readers_too() {
    let env = test_env();
    let (alice, _) = register_and_login(&env, "alice@example.com", "correct horse");
    let (bob, _) = register_and_login(&env, "bob@example.com", "battery staple");

    let secrets = env.service.secrets();
    let expiry = env.clock.get() + 100;
    secrets
        .store(alice, "ephemeral", "v", None, None, Some(expiry))
        .unwrap();
    secrets.share(alice, "ephemeral", bob).unwrap();

    assert!(secrets.get(bob, "ephemeral").unwrap().is_some());
    env.clock.advance(101);
    assert!(secrets.get(bob, "ephemeral").unwrap().is_none());
    assert!(secrets.get(alice, "ephemeral").unwrap().is_none());

    // The owner's expired view still lists it for cleanup
    let expired = secrets
        .list_accessible(
            alice,
            &SecretFilter::new().expiration(ExpirationFilter::Expired),
        )
        .unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].key, "ephemeral");
}

#[test]
fn test_records_survive_store_reopen() {
    let env = test_env_on_disk();
    let (alice, _) = register_and_login(&env, "alice@example.com", "correct horse");

    let secrets = env.service.secrets();
    secrets
        .store(alice, "persistent", "still here", None, None, None)
        .unwrap();
    // A fresh read after the write-then-rename cycle sees the full record
    let revealed = secrets.get(alice, "persistent").unwrap().unwrap();
    assert_eq!(revealed.value.expose(), "still here");
    assert_eq!(revealed.role, AccessRole::Owned);
}

#[test]
fn test_search_and_role_filters() {
    let env = test_env();
    let (alice, _) = register_and_login(&env, "alice@example.com", "correct horse");
    let (bob, _) = register_and_login(&env, "bob@example.com", "battery staple");

    let secrets = env.service.secrets();
    secrets
        .store(alice, "stripe.key", "sk-1", Some("payments"), Some("api"), None)
        .unwrap();
    secrets.store(bob, "github.token", "ghp", None, None, None).unwrap();
    secrets.share(bob, "github.token", alice).unwrap();

    let hits = secrets
        .list_accessible(alice, &SecretFilter::new().search("payments"))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].key, "stripe.key");

    let shared_only = secrets
        .list_accessible(alice, &SecretFilter::new().role(AccessRole::Shared))
        .unwrap();
    assert_eq!(shared_only.len(), 1);
    assert_eq!(shared_only[0].key, "github.token");
}
