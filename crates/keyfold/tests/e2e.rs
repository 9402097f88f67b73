// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the vault lifecycle against real and fault-injecting
//! stores. Each test builds its own isolated store.

use std::time::Duration;

use keyfold::{
    EncryptedEnvelope, EntryDraft, FolderColor, KeyValueStore, KeyfoldError, Operation,
    SessionStatus,
};
use keyfold_test_utils::{DEFAULT_PASSWORD, SessionHarness, TempSqlite, secret};

// ---- SQLite persistence ----

#[tokio::test]
async fn sqlite_vault_survives_reopen() {
    let tmp = TempSqlite::new().unwrap();

    let session = keyfold::open_session(&tmp.config).await.unwrap();
    assert!(!session.vault_exists().await.unwrap());
    session
        .create_vault(&secret(DEFAULT_PASSWORD), &secret(DEFAULT_PASSWORD))
        .await
        .unwrap();
    let alice = session
        .mutate(|v| v.add_person("Alice", FolderColor::Purple))
        .await
        .unwrap();
    session
        .mutate(|v| {
            v.save_entry(EntryDraft {
                person_id: Some(alice.id.clone()),
                title: "Email".to_string(),
                username: "alice@example.com".to_string(),
                password: "x".to_string(),
                ..Default::default()
            })
        })
        .await
        .unwrap();
    let before = session.snapshot().await.unwrap();
    session.lock().await.unwrap();
    drop(session);

    let reopened = keyfold::open_session(&tmp.config).await.unwrap();
    assert_eq!(reopened.status().await, SessionStatus::Locked);
    assert!(reopened.vault_exists().await.unwrap());
    reopened.unlock(&secret(DEFAULT_PASSWORD)).await.unwrap();
    assert_eq!(reopened.snapshot().await.unwrap(), before);
}

#[tokio::test]
async fn sqlite_never_stores_plaintext() {
    let tmp = TempSqlite::new().unwrap();
    let session = keyfold::open_session(&tmp.config).await.unwrap();
    session
        .create_vault(&secret(DEFAULT_PASSWORD), &secret(DEFAULT_PASSWORD))
        .await
        .unwrap();
    let folder = session
        .mutate(|v| v.add_person("Plaintext Folder Name", FolderColor::Blue))
        .await
        .unwrap();
    session
        .mutate(|v| {
            v.save_entry(EntryDraft {
                person_id: Some(folder.id.clone()),
                password: "plaintext-entry-password".to_string(),
                ..Default::default()
            })
        })
        .await
        .unwrap();
    session.persist().await.unwrap();

    let raw = session
        .vault_store()
        .inner()
        .get(&tmp.config.vault.storage_key)
        .await
        .unwrap()
        .unwrap();
    let raw = String::from_utf8(raw).unwrap();
    assert!(!raw.contains("Plaintext Folder Name"));
    assert!(!raw.contains("plaintext-entry-password"));
    assert!(!raw.contains(DEFAULT_PASSWORD));
}

#[tokio::test]
async fn garbage_in_slot_reads_as_no_vault() {
    let tmp = TempSqlite::new().unwrap();
    let session = keyfold::open_session(&tmp.config).await.unwrap();
    session
        .vault_store()
        .inner()
        .put(&tmp.config.vault.storage_key, b"{not json".to_vec())
        .await
        .unwrap();

    assert!(!session.vault_exists().await.unwrap());
    assert!(matches!(
        session.unlock(&secret(DEFAULT_PASSWORD)).await,
        Err(KeyfoldError::NoVault)
    ));
}

// ---- Export / import ----

#[tokio::test]
async fn export_import_moves_vault_between_installations() {
    let source_db = TempSqlite::new().unwrap();
    let target_db = TempSqlite::new().unwrap();

    let source = keyfold::open_session(&source_db.config).await.unwrap();
    source
        .create_vault(&secret(DEFAULT_PASSWORD), &secret(DEFAULT_PASSWORD))
        .await
        .unwrap();
    source
        .mutate(|v| v.add_person("Alice", FolderColor::Blue))
        .await
        .unwrap();
    let blob = source.export_blob().await.unwrap();
    assert_eq!(source.vault_store().export_blob().await.unwrap(), blob);

    let target = keyfold::open_session(&target_db.config).await.unwrap();
    target.import_blob(&blob).await.unwrap();
    assert_eq!(target.status().await, SessionStatus::Locked);
    assert_eq!(target.vault_store().export_blob().await.unwrap(), blob);

    target.unlock(&secret(DEFAULT_PASSWORD)).await.unwrap();
    assert_eq!(
        target.snapshot().await.unwrap(),
        source.snapshot().await.unwrap()
    );
}

#[tokio::test]
async fn import_without_ciphertext_is_rejected() {
    let harness = SessionHarness::builder().build().await.unwrap();
    let stored = harness.session.vault_store().export_blob().await.unwrap();

    let blob = br#"{"version":1,"salt":"AAAAAAAAAAAAAAAAAAAAAA==","iv":"AAAAAAAAAAAAAAAA","iterations":1000}"#;
    let result = harness.session.import_blob(blob).await;

    assert!(matches!(result, Err(KeyfoldError::ImportFormat(_))));
    assert!(harness.session.is_unlocked().await);
    assert_eq!(
        harness.session.vault_store().export_blob().await.unwrap(),
        stored
    );
}

#[tokio::test]
async fn tampered_import_fails_authentication() {
    let harness = SessionHarness::builder().build().await.unwrap();
    let blob = harness.session.export_blob().await.unwrap();

    let mut envelope = EncryptedEnvelope::from_bytes(&blob).unwrap();
    envelope.ciphertext[0] ^= 0x01;
    let tampered = envelope.to_bytes().unwrap();

    harness.session.import_blob(&tampered).await.unwrap();
    assert!(matches!(
        harness.session.unlock(&harness.password()).await,
        Err(KeyfoldError::Authentication)
    ));
    assert_eq!(harness.session.status().await, SessionStatus::Locked);
}

// ---- Single flight ----

#[tokio::test]
async fn operations_are_rejected_while_a_write_is_in_flight() {
    let harness = SessionHarness::builder().build().await.unwrap();
    let blob = harness.session.export_blob().await.unwrap();

    harness.store.hold_puts();
    let in_flight = tokio::spawn({
        let session = harness.session.clone();
        async move { session.persist().await }
    });
    harness.store.put_stalled().await;

    let session = &harness.session;
    let password = harness.password();
    assert!(matches!(
        session.persist().await,
        Err(KeyfoldError::Busy { operation: Operation::Persist })
    ));
    assert!(matches!(
        session.unlock(&password).await,
        Err(KeyfoldError::Busy { operation: Operation::Unlock })
    ));
    assert!(matches!(
        session.create_vault(&password, &password).await,
        Err(KeyfoldError::Busy { operation: Operation::CreateVault })
    ));
    assert!(matches!(
        session.import_blob(&blob).await,
        Err(KeyfoldError::Busy { operation: Operation::Import })
    ));

    harness.store.release_puts();
    in_flight.await.unwrap().unwrap();
    session.persist().await.unwrap();
}

#[tokio::test]
async fn edits_proceed_while_a_write_is_stalled() {
    let harness = SessionHarness::builder()
        .with_debounce(Duration::from_secs(60))
        .build()
        .await
        .unwrap();
    let session = &harness.session;
    session
        .mutate(|v| v.add_person("Alice", FolderColor::Blue))
        .await
        .unwrap();

    harness.store.hold_puts();
    let in_flight = tokio::spawn({
        let session = session.clone();
        async move { session.persist().await }
    });
    harness.store.put_stalled().await;

    assert_eq!(session.status().await, SessionStatus::Unlocked);
    session
        .mutate(|v| v.add_person("Bob", FolderColor::Green))
        .await
        .unwrap();
    assert_eq!(session.read(|v| v.people.len()).await.unwrap(), 2);

    harness.store.release_puts();
    in_flight.await.unwrap().unwrap();
    // Bob was added after the envelope was sealed.
    assert!(session.has_unsaved_changes().await);

    let restarted = harness.reopen();
    restarted.unlock(&harness.password()).await.unwrap();
    assert_eq!(restarted.read(|v| v.people.len()).await.unwrap(), 1);

    session.persist().await.unwrap();
    assert!(!session.has_unsaved_changes().await);
    let restarted = harness.reopen();
    restarted.unlock(&harness.password()).await.unwrap();
    assert_eq!(restarted.read(|v| v.people.len()).await.unwrap(), 2);
}

// ---- Write failures ----

#[tokio::test]
async fn failed_persist_keeps_previous_envelope() {
    let harness = SessionHarness::builder()
        .with_debounce(Duration::from_secs(60))
        .build()
        .await
        .unwrap();
    let session = &harness.session;
    session
        .mutate(|v| v.add_person("Alice", FolderColor::Blue))
        .await
        .unwrap();
    let before = session.vault_store().export_blob().await.unwrap();

    harness.store.fail_puts(true);
    assert!(matches!(
        session.persist().await,
        Err(KeyfoldError::Storage { .. })
    ));
    assert_eq!(session.vault_store().export_blob().await.unwrap(), before);
    assert!(session.has_unsaved_changes().await);

    harness.store.fail_puts(false);
    session.persist().await.unwrap();
    assert!(!session.has_unsaved_changes().await);

    let restarted = harness.reopen();
    restarted.unlock(&harness.password()).await.unwrap();
    assert_eq!(restarted.read(|v| v.people.len()).await.unwrap(), 1);
}

#[tokio::test]
async fn lock_reports_lost_edits_but_still_locks() {
    let harness = SessionHarness::builder()
        .with_debounce(Duration::from_secs(60))
        .build()
        .await
        .unwrap();
    let session = &harness.session;
    session
        .mutate(|v| v.add_person("Alice", FolderColor::Blue))
        .await
        .unwrap();

    harness.store.fail_puts(true);
    assert!(matches!(
        session.lock().await,
        Err(KeyfoldError::Storage { .. })
    ));
    assert_eq!(session.status().await, SessionStatus::Locked);
    assert!(matches!(session.snapshot().await, Err(KeyfoldError::Locked)));

    harness.store.fail_puts(false);
    session.unlock(&harness.password()).await.unwrap();
    assert!(session.read(|v| v.people.is_empty()).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn failed_autosave_leaves_changes_pending() {
    let harness = SessionHarness::builder()
        .with_debounce(Duration::from_millis(100))
        .build()
        .await
        .unwrap();
    let session = &harness.session;
    let writes = harness.store.put_count();

    harness.store.fail_puts(true);
    session
        .mutate(|v| v.add_person("Alice", FolderColor::Blue))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!session.save_pending());
    assert!(session.has_unsaved_changes().await);
    assert_eq!(harness.store.put_count(), writes);

    harness.store.fail_puts(false);
    session
        .mutate(|v| v.add_person("Bob", FolderColor::Green))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!session.has_unsaved_changes().await);
    assert_eq!(harness.store.put_count(), writes + 1);

    let restarted = harness.reopen();
    restarted.unlock(&harness.password()).await.unwrap();
    assert_eq!(restarted.read(|v| v.people.len()).await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn edit_burst_coalesces_into_one_write() {
    let harness = SessionHarness::builder()
        .with_debounce(Duration::from_millis(800))
        .build()
        .await
        .unwrap();
    let writes = harness.store.put_count();

    for name in ["Alice", "Bob", "Carol", "Dave"] {
        harness
            .session
            .mutate(|v| v.add_person(name, FolderColor::Blue))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(harness.store.put_count(), writes);

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(harness.store.put_count(), writes + 1);
}
