use std::sync::Arc;

use ul_domain::records::Provider;
use ul_store::{JsonRecordStore, ModelFilter, ModelManager, ModelRepository, ProviderRepository};

#[tokio::test]
async fn overrides_and_soft_deletes_survive_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (kept, dropped) = {
        let store = Arc::new(JsonRecordStore::open(dir.path()).unwrap());
        store
            .upsert_provider(Provider::new("p1", "OpenAI", "https://api.example.com", "sk"))
            .await
            .unwrap();
        let mgr = ModelManager::new(store.clone());
        let (kept, _) = mgr
            .record_discovered("p1", "gpt-4o-2024-05-13", "gpt-4o")
            .await
            .unwrap();
        let (dropped, _) = mgr
            .record_discovered("p1", "gpt-3.5-turbo", "gpt-3.5-turbo")
            .await
            .unwrap();
        mgr.rename(&kept.id, "omni").await.unwrap();
        mgr.delete(&dropped.id).await.unwrap();
        (kept.id, dropped.id)
    };

    let store = JsonRecordStore::open(dir.path()).unwrap();
    let enabled = store.list_models(&ModelFilter::enabled()).await.unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].id, kept);
    assert_eq!(enabled[0].unified_name(), "omni");

    let deleted = store.get_model(&dropped).await.unwrap().unwrap();
    assert!(!deleted.enabled);

    let providers = store.list_providers(true).await.unwrap();
    assert_eq!(providers[0].name, "OpenAI");
}

#[tokio::test]
async fn store_files_are_pretty_json_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonRecordStore::open(dir.path()).unwrap();
    store
        .upsert_provider(Provider::new("p1", "One", "http://one", "k"))
        .await
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("providers.json")).unwrap();
    assert!(raw.starts_with("[\n"));
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed[0]["id"], "p1");
    assert!(!dir.path().join("providers.json.tmp").exists());
}
