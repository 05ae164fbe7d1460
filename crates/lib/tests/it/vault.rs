//! End-to-end crypto: key files on disk, envelopes through the file store.

use strongroom::{crypto::CryptoVault, storage::FileStore, storage::SecretStore};

#[test]
fn test_master_key_persists_across_open() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("keys").join("master.key");

    let vault = CryptoVault::open(&key_path).unwrap();
    let envelope = vault.encrypt(b"payload").unwrap();

    // A second open loads the same key and can decrypt
    let reopened = CryptoVault::open(&key_path).unwrap();
    assert_eq!(reopened.decrypt(&envelope).unwrap(), b"payload");
}

#[test]
fn test_distinct_key_files_are_incompatible() {
    let dir = tempfile::tempdir().unwrap();
    let a = CryptoVault::open(dir.path().join("a.key")).unwrap();
    let b = CryptoVault::open(dir.path().join("b.key")).unwrap();

    let envelope = a.encrypt(b"payload").unwrap();
    assert!(b.decrypt(&envelope).is_err());
}

#[test]
fn test_envelopes_survive_the_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let vault = CryptoVault::generate();

    let envelope = vault.encrypt(b"stored secret").unwrap();
    {
        let store = FileStore::open(dir.path().join("secrets")).unwrap();
        store.put("record-1", &envelope).unwrap();
    }

    // Reopen the store, read the blob back, decrypt
    let store = FileStore::open(dir.path().join("secrets")).unwrap();
    let blob = store.get("record-1").unwrap().unwrap();
    assert_eq!(vault.decrypt(&blob).unwrap(), b"stored secret");
}

#[test]
fn test_wrapped_data_keys_round_trip_through_storage() {
    let dir = tempfile::tempdir().unwrap();
    let master = CryptoVault::open(dir.path().join("master.key")).unwrap();

    let data_key = strongroom::crypto::VaultKey::generate();
    let envelope = CryptoVault::new(data_key.clone()).encrypt(b"user data").unwrap();

    // Persist only the wrapped form, then recover through the master
    let wrapped = {
        let store = FileStore::open(dir.path().join("keys")).unwrap();
        store.put("wrapped", &master.wrap_key(&data_key).unwrap()).unwrap();
        drop(data_key);
        store.get("wrapped").unwrap().unwrap()
    };

    let recovered = master.unwrap_key(&wrapped).unwrap();
    let vault = CryptoVault::new(recovered);
    assert_eq!(vault.decrypt(&envelope).unwrap(), b"user data");
}
