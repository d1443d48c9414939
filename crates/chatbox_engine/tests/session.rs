use std::sync::Arc;

use chatbox_engine::{
    ClientConfig, KeyValueStore, MemoryStore, ReqwestAgentClient, SessionError, SessionManager,
    SessionSnapshot, ACTIVE_THREAD_KEY, THREAD_REGISTRY_KEY,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

/// Hands out `thread-1`, `thread-2`, ... on successive creation calls.
struct SequentialThreads {
    next: std::sync::atomic::AtomicUsize,
}

impl Respond for SequentialThreads {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let n = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        ResponseTemplate::new(200).set_body_json(json!({ "thread_id": format!("thread-{n}") }))
    }
}

async fn mount_threads(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(SequentialThreads {
            next: Default::default(),
        })
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn manager(server: &MockServer, store: MemoryStore) -> SessionManager {
    let api = ReqwestAgentClient::new(ClientConfig::new(server.uri()).unwrap()).unwrap();
    SessionManager::new(Box::new(store), Arc::new(api))
}

/// Store that keeps a shared view so tests can inspect what was persisted.
#[derive(Clone, Default)]
struct SharedStore(Arc<std::sync::Mutex<MemoryStore>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>, chatbox_engine::StoreError> {
        self.0.lock().unwrap().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), chatbox_engine::StoreError> {
        self.0.lock().unwrap().set(key, value)
    }

    fn list(&self) -> Result<Vec<String>, chatbox_engine::StoreError> {
        self.0.lock().unwrap().list()
    }
}

impl SharedStore {
    fn value(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).unwrap()
    }
}

#[tokio::test]
async fn first_start_creates_and_persists_exactly_one_thread() {
    let server = MockServer::start().await;
    mount_threads(&server, 1).await;

    let store = SharedStore::default();
    let api = ReqwestAgentClient::new(ClientConfig::new(server.uri()).unwrap()).unwrap();
    let mut session = SessionManager::new(Box::new(store.clone()), Arc::new(api));

    let snapshot = session.initialize().await.unwrap();
    assert_eq!(
        snapshot,
        SessionSnapshot {
            active: "thread-1".into(),
            threads: vec!["thread-1".into()],
        }
    );
    assert_eq!(store.value(ACTIVE_THREAD_KEY).as_deref(), Some("thread-1"));
    assert_eq!(store.value(THREAD_REGISTRY_KEY).as_deref(), Some("thread-1"));
}

#[tokio::test]
async fn persisted_thread_is_resumed_without_remote_calls() {
    let server = MockServer::start().await;
    mount_threads(&server, 0).await;

    let store = MemoryStore::with_entries([
        (ACTIVE_THREAD_KEY, "b"),
        (THREAD_REGISTRY_KEY, "b,a"),
    ]);
    let snapshot = manager(&server, store).initialize().await.unwrap();
    assert_eq!(snapshot.active, "b");
    assert_eq!(snapshot.threads, vec!["b".to_string(), "a".to_string()]);
}

#[tokio::test]
async fn blank_persisted_id_counts_as_missing() {
    let server = MockServer::start().await;
    mount_threads(&server, 1).await;

    let store = MemoryStore::with_entries([(ACTIVE_THREAD_KEY, "  ")]);
    let snapshot = manager(&server, store).initialize().await.unwrap();
    assert_eq!(snapshot.active, "thread-1");
}

#[tokio::test]
async fn new_threads_are_prepended_keeping_order() {
    let server = MockServer::start().await;
    mount_threads(&server, 3).await;

    let store = SharedStore::default();
    let api = ReqwestAgentClient::new(ClientConfig::new(server.uri()).unwrap()).unwrap();
    let mut session = SessionManager::new(Box::new(store.clone()), Arc::new(api));

    session.initialize().await.unwrap();
    session.create_new_thread().await.unwrap();
    let snapshot = session.create_new_thread().await.unwrap();

    assert_eq!(snapshot.active, "thread-3");
    assert_eq!(
        snapshot.threads,
        vec!["thread-3".to_string(), "thread-2".into(), "thread-1".into()]
    );
    assert_eq!(
        store.value(THREAD_REGISTRY_KEY).as_deref(),
        Some("thread-3,thread-2,thread-1")
    );
    assert_eq!(store.value(ACTIVE_THREAD_KEY).as_deref(), Some("thread-3"));
}

#[tokio::test]
async fn failed_creation_leaves_storage_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = SharedStore::default();
    store.0.lock().unwrap().set(ACTIVE_THREAD_KEY, "a").unwrap();
    store.0.lock().unwrap().set(THREAD_REGISTRY_KEY, "a").unwrap();
    let api = ReqwestAgentClient::new(ClientConfig::new(server.uri()).unwrap()).unwrap();
    let mut session = SessionManager::new(Box::new(store.clone()), Arc::new(api));

    let err = session.create_new_thread().await.unwrap_err();
    assert!(matches!(err, SessionError::Api(_)));
    assert_eq!(store.value(ACTIVE_THREAD_KEY).as_deref(), Some("a"));
    assert_eq!(store.value(THREAD_REGISTRY_KEY).as_deref(), Some("a"));
}

#[tokio::test]
async fn switching_to_known_thread_needs_no_remote_call() {
    let server = MockServer::start().await;
    mount_threads(&server, 0).await;

    let store = SharedStore::default();
    store.0.lock().unwrap().set(ACTIVE_THREAD_KEY, "b").unwrap();
    store.0.lock().unwrap().set(THREAD_REGISTRY_KEY, "b,a").unwrap();
    let api = ReqwestAgentClient::new(ClientConfig::new(server.uri()).unwrap()).unwrap();
    let mut session = SessionManager::new(Box::new(store.clone()), Arc::new(api));

    let snapshot = session.switch_thread("a").unwrap();
    assert_eq!(snapshot.active, "a");
    assert_eq!(snapshot.threads, vec!["b".to_string(), "a".to_string()]);
    assert_eq!(store.value(ACTIVE_THREAD_KEY).as_deref(), Some("a"));
    assert_eq!(store.value(THREAD_REGISTRY_KEY).as_deref(), Some("b,a"));

    let err = session.switch_thread("zzz").unwrap_err();
    assert!(matches!(err, SessionError::UnknownThread(id) if id == "zzz"));
    assert_eq!(store.value(ACTIVE_THREAD_KEY).as_deref(), Some("a"));
}

#[tokio::test]
async fn active_id_missing_from_registry_is_still_listed() {
    let server = MockServer::start().await;
    mount_threads(&server, 0).await;

    let store = MemoryStore::with_entries([(ACTIVE_THREAD_KEY, "solo")]);
    let session = manager(&server, store);
    let snapshot = session.snapshot().expect("snapshot");
    assert_eq!(snapshot.threads, vec!["solo".to_string()]);
}

#[tokio::test]
async fn new_thread_keeps_active_id_missing_from_registry() {
    let server = MockServer::start().await;
    mount_threads(&server, 1).await;

    let store = SharedStore::default();
    store.0.lock().unwrap().set(ACTIVE_THREAD_KEY, "solo").unwrap();
    store.0.lock().unwrap().set(THREAD_REGISTRY_KEY, "older").unwrap();
    let api = ReqwestAgentClient::new(ClientConfig::new(server.uri()).unwrap()).unwrap();
    let mut session = SessionManager::new(Box::new(store.clone()), Arc::new(api));

    let snapshot = session.create_new_thread().await.unwrap();
    assert_eq!(
        snapshot.threads,
        vec!["thread-1".to_string(), "solo".into(), "older".into()]
    );
    assert_eq!(
        store.value(THREAD_REGISTRY_KEY).as_deref(),
        Some("thread-1,solo,older")
    );
}
