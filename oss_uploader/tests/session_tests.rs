mod common;

use std::path::Path;
use std::sync::{Arc, Mutex};

use common::{session, settings, StubConnector};
use oss_uploader::{SessionState, UploadSession};
use progress_tracking::{NoOpProgressListener, TransferProgressListener};
use tempfile::tempdir;

#[tokio::test]
async fn test_failed_initialize_leaves_session_disconnected() {
    let settings = settings("dev1");
    let connector = StubConnector::unreachable();
    let mut session = session(connector.clone(), &settings);

    assert!(session.initialize().await.is_err());
    assert!(matches!(session.state(), SessionState::Disconnected));
    assert!(!session.upload("dev1/a.txt", Path::new("a.txt")).await);
    assert_eq!(connector.state.uploads(), 0);
}

#[tokio::test]
async fn test_initialize_connects_each_time() {
    let settings = settings("dev1");
    let connector = StubConnector::always_succeeds();
    let mut session = session(connector.clone(), &settings);
    assert!(!session.state().is_connected());

    session.initialize().await.unwrap();
    assert!(session.state().is_connected());

    session.initialize().await.unwrap();
    assert!(session.state().is_connected());
    assert_eq!(connector.state.connects(), 2);
}

#[tokio::test]
async fn test_progress_is_named_by_local_path() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("a.txt");
    std::fs::write(&local, b"a").unwrap();

    let names = Arc::new(Mutex::new(Vec::new()));
    let seen = names.clone();
    let settings = settings("dev1");
    let mut session = UploadSession::new(StubConnector::always_succeeds(), settings.oss_target()).with_progress(
        Box::new(move |name: &str| -> Arc<dyn TransferProgressListener> {
            seen.lock().unwrap().push(name.to_owned());
            NoOpProgressListener::new()
        }),
    );

    session.initialize().await.unwrap();
    assert!(session.upload("dev1/a.txt", &local).await);
    assert_eq!(*names.lock().unwrap(), vec![local.display().to_string()]);
}
