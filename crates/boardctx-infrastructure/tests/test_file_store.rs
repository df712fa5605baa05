use boardctx_core::context::{PersistedContextRecord, SessionContext};
use boardctx_core::store::{ContextSlot, PersistedContextStore};
use boardctx_infrastructure::FileContextSlot;
use std::sync::Arc;
use tempfile::TempDir;

fn store_at(dir: &TempDir) -> (PersistedContextStore, FileContextSlot) {
    let slot = FileContextSlot::new(dir.path().join("context.json"));
    (PersistedContextStore::new(Arc::new(slot.clone())), slot)
}

#[tokio::test]
async fn test_record_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let context = SessionContext::team_project("u1", "p1", Some("t1".to_string()));
    {
        let (store, _) = store_at(&temp_dir);
        store.save(&context).await.unwrap();
    }

    let (store, _) = store_at(&temp_dir);
    let record = store.load_for("u1").await.unwrap().unwrap();
    assert_eq!(record.project_id.as_deref(), Some("p1"));
    assert_eq!(record.team_id.as_deref(), Some("t1"));
    assert!(record.updated_at.is_some());
}

#[tokio::test]
async fn test_other_user_never_sees_record() {
    let temp_dir = TempDir::new().unwrap();
    let (store, slot) = store_at(&temp_dir);
    store
        .save(&SessionContext::team_project("u1", "p9", Some("t3".to_string())))
        .await
        .unwrap();

    assert!(store.load_for("u2").await.unwrap().is_none());
    assert!(slot.read().await.unwrap().is_none());
    assert!(store.load_for("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_corrupt_file_heals() {
    let temp_dir = TempDir::new().unwrap();
    let (store, slot) = store_at(&temp_dir);
    std::fs::write(slot.path(), "{\"userId\": 42").unwrap();

    assert!(store.load_for("u1").await.unwrap().is_none());
    assert!(!slot.path().exists());
}

#[tokio::test]
async fn test_legacy_sentinels_are_sanitized() {
    let temp_dir = TempDir::new().unwrap();
    let (store, slot) = store_at(&temp_dir);
    slot.write(PersistedContextRecord {
        user_id: "u1".to_string(),
        team_id: Some("null".to_string()),
        project_id: Some("undefined".to_string()),
        workspace: None,
        updated_at: None,
    })
    .await
    .unwrap();

    let record = store.load_for("u1").await.unwrap().unwrap();
    assert_eq!(record.project_id, None);
    assert_eq!(record.team_id, None);
}
