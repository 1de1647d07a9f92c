//! File watching and holder reload.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;
use url_mappings::config::load_config;
use url_mappings::config::watcher::ConfigWatcher;
use url_mappings::lifecycle::{run_reload_loop, MappingsRegistry};

const BEFORE: &str = r#"
[[mappings]]
pattern = "/books"
controller = "book"
action = "list"
"#;

const AFTER: &str = r#"
[[mappings]]
pattern = "/books"
controller = "book"
action = "list"

[[mappings]]
pattern = "/authors"
controller = "author"
action = "list"
"#;

#[tokio::test]
async fn test_watcher_delivers_compiled_holder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mappings.toml");
    fs::write(&path, BEFORE).unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.run().unwrap();

    fs::write(&path, AFTER).unwrap();

    let received = timeout(Duration::from_secs(10), updates.recv())
        .await
        .expect("holder update within timeout")
        .expect("watcher channel open");
    assert_eq!(received.mappings().len(), 2);
    assert!(received.match_path("/authors").is_some());
}

#[tokio::test]
async fn test_registry_follows_watcher() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mappings.toml");
    fs::write(&path, BEFORE).unwrap();

    let config = load_config(&path).unwrap();
    let registry = Arc::new(MappingsRegistry::from_config(&config).unwrap());
    assert!(registry.current().match_path("/authors").is_none());

    let (watcher, updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.run().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(run_reload_loop(Arc::clone(&registry), updates, async move {
        let _ = stop_rx.await;
    }));

    fs::write(&path, AFTER).unwrap();

    let reloaded = timeout(Duration::from_secs(10), async {
        loop {
            if registry.current().match_path("/authors").is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(reloaded.is_ok(), "registry did not pick up the new mappings");

    stop_tx.send(()).unwrap();
    assert!(task.await.unwrap() >= 1);
}
