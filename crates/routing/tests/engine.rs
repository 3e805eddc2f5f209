use std::collections::HashMap;
use std::sync::Arc;

use ul_domain::config::OutputConfig;
use ul_domain::records::{ModelRecord, Provider};
use ul_domain::Error;
use ul_routing::{RoutingDocument, RoutingEngine, UnifiedDocument};
use ul_store::{JsonRecordStore, ModelFilter, ModelManager, ModelRepository, ProviderRepository};

async fn seeded_store() -> Arc<JsonRecordStore> {
    let store = Arc::new(JsonRecordStore::in_memory());
    for (id, name) in [("p1", "OpenAI"), ("p2", "Azure"), ("p3", "Mirror")] {
        store
            .upsert_provider(Provider::new(id, name, format!("https://{id}.example.com"), format!("sk-{id}")))
            .await
            .unwrap();
    }
    let models = [
        ("p1", "gpt-4o-2024-08-06", "gpt-4o"),
        ("p1", "gpt-3.5-turbo", "gpt-3.5-turbo"),
        ("p2", "gpt-4o", "gpt-4o"),
        ("p2", "o1-preview", "o1"),
        ("p3", "openai/gpt-4o-latest", "gpt-4o"),
        ("p3", "text-embedding-3-small", "text-embedding-3-small"),
    ];
    for (p, original, canonical) in models {
        store
            .upsert_model(ModelRecord::new(p, original, canonical))
            .await
            .unwrap();
    }
    store
}

fn engine(store: &Arc<JsonRecordStore>, dir: &std::path::Path) -> RoutingEngine {
    let output = OutputConfig {
        config_dir: dir.to_path_buf(),
        ..Default::default()
    };
    RoutingEngine::new(store.clone(), store.clone(), output)
}

#[tokio::test]
async fn every_unified_name_has_exactly_one_resolving_redirect() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    let plan = engine(&store, dir.path()).build().await.unwrap();

    let models = store.list_models(&ModelFilter::enabled()).await.unwrap();
    let mut expected: HashMap<String, Vec<String>> = HashMap::new();
    for u in &plan.units {
        expected.entry(u.unified_name.clone()).or_default().push(u.id.clone());
    }
    assert_eq!(expected.len(), plan.redirects.len());

    for m in &models {
        let name = m.unified_name();
        let hits: Vec<_> = plan.redirects.iter().filter(|r| r.unified_name == name).collect();
        assert_eq!(hits.len(), 1, "redirect count for {name}");
        let target = &hits[0].target;
        let members = &expected[name];
        if members.len() == 1 {
            assert_eq!(target, &members[0]);
        } else {
            let agg = plan.aggregates.iter().find(|a| &a.name == target).unwrap();
            assert!(agg.members.len() >= 2);
            assert_eq!(&agg.members, members);
        }
    }

    let agg = plan.aggregates.iter().find(|a| a.unified_name == "gpt-4o").unwrap();
    assert_eq!(agg.members, vec!["OpenAI-0", "Azure-0", "Mirror-0"]);
}

#[tokio::test]
async fn repeated_builds_are_identical() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    let e = engine(&store, dir.path());
    let first = e.build().await.unwrap();
    let second = e.build().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_yaml::to_string(&ul_routing::render::render_routing(&first)).unwrap(),
        serde_yaml::to_string(&ul_routing::render::render_routing(&second)).unwrap()
    );
}

#[tokio::test]
async fn soft_deleted_model_drops_out_but_is_kept() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    let e = engine(&store, dir.path());

    let target = store
        .find_model("p2", "o1-preview")
        .await
        .unwrap()
        .unwrap();
    ModelManager::new(store.clone()).delete(&target.id).await.unwrap();

    let plan = e.build().await.unwrap();
    assert!(plan.units.iter().all(|u| u.original_name != "o1-preview"));
    assert!(plan.target_of("o1").is_none());
    assert!(store.get_model(&target.id).await.unwrap().is_some());
}

#[tokio::test]
async fn disabling_a_provider_shrinks_the_aggregate() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    store.soft_delete_provider("p2").await.unwrap();

    let plan = engine(&store, dir.path()).build().await.unwrap();
    let agg = plan.aggregates.iter().find(|a| a.unified_name == "gpt-4o").unwrap();
    assert_eq!(agg.members, vec!["OpenAI-0", "Mirror-0"]);
}

#[tokio::test]
async fn generate_backs_up_then_overwrites() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    let e = engine(&store, dir.path());

    let first = e.generate().await.unwrap();
    assert!(first.saved.routing.backup.is_none());
    let first_bytes = std::fs::read(dir.path().join("gpt-load.yaml")).unwrap();

    // Rename a model so the second document differs.
    let m = store.find_model("p1", "gpt-3.5-turbo").await.unwrap().unwrap();
    ModelManager::new(store.clone()).rename(&m.id, "turbo").await.unwrap();

    let second = e.generate().await.unwrap();
    let backup = second.saved.routing.backup.clone().unwrap();
    assert_eq!(std::fs::read(&backup).unwrap(), first_bytes);
    assert!(backup.starts_with(dir.path().join("backups")));

    let live = std::fs::read_to_string(dir.path().join("gpt-load.yaml")).unwrap();
    assert_ne!(live.as_bytes(), first_bytes.as_slice());
    let doc: RoutingDocument = serde_yaml::from_str(&live).unwrap();
    assert!(doc.model_redirects.contains_key("turbo"));

    let unified: UnifiedDocument =
        serde_yaml::from_str(&std::fs::read_to_string(dir.path().join("api.yaml")).unwrap())
            .unwrap();
    assert!(unified.providers.iter().any(|p| p.provider == "gptload-turbo"));
    assert_eq!(unified.providers.len(), doc.model_redirects.len());
}

#[tokio::test]
async fn invalid_plan_writes_nothing() {
    let store = Arc::new(JsonRecordStore::in_memory());
    // Empty credential fails unit validation.
    store
        .upsert_provider(Provider::new("p1", "NoKey", "https://x", ""))
        .await
        .unwrap();
    store
        .upsert_model(ModelRecord::new("p1", "m", "m"))
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = engine(&store, dir.path()).generate().await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(!dir.path().join("gpt-load.yaml").exists());
    assert!(!dir.path().join("api.yaml").exists());
}

#[tokio::test]
async fn unified_write_failure_keeps_previous_routing_document() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    let e = engine(&store, dir.path());
    e.generate().await.unwrap();
    let routing_before = std::fs::read(dir.path().join("gpt-load.yaml")).unwrap();
    let unified_before = std::fs::read(dir.path().join("api.yaml")).unwrap();

    let m = store.find_model("p1", "gpt-3.5-turbo").await.unwrap().unwrap();
    ModelManager::new(store.clone()).rename(&m.id, "turbo").await.unwrap();
    // Staging the unified document fails.
    std::fs::create_dir(dir.path().join("api.yaml.tmp")).unwrap();

    assert!(e.generate().await.is_err());
    assert_eq!(std::fs::read(dir.path().join("gpt-load.yaml")).unwrap(), routing_before);
    assert_eq!(std::fs::read(dir.path().join("api.yaml")).unwrap(), unified_before);
    assert!(!dir.path().join("gpt-load.yaml.tmp").exists());

    std::fs::remove_dir(dir.path().join("api.yaml.tmp")).unwrap();
    let saved = e.generate().await.unwrap().saved;
    assert!(saved.routing.backup.is_some());
    assert!(saved.unified.backup.is_some());
}

#[tokio::test]
async fn preview_does_not_write() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    let preview = engine(&store, dir.path()).preview().await.unwrap();
    assert_eq!(preview.stats.units, 6);
    assert!(preview.routing_yaml.contains("Aggr-gpt-4o"));
    assert!(preview.unified_yaml.contains("/proxy/gpt-4o"));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn no_enabled_providers_gives_empty_documents() {
    let store = Arc::new(JsonRecordStore::in_memory());
    let dir = tempfile::tempdir().unwrap();
    let generated = engine(&store, dir.path()).generate().await.unwrap();
    assert_eq!(generated.stats.units, 0);
    assert!(generated.routing.providers.is_empty());
    assert!(dir.path().join("gpt-load.yaml").exists());
}
