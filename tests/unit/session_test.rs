use prodreport::session::{Session, SessionId, SessionStore};
use std::time::Duration;

#[test]
fn test_session_id_round_trips_through_text() {
    let id = SessionId::new();
    let parsed: SessionId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
    assert!("not-a-session".parse::<SessionId>().is_err());
}

#[test]
fn test_new_session_is_disconnected() {
    let session: Session<String> = Session::new(SessionId::new());
    assert!(!session.is_connected());
    assert!(session.handle().is_none());
    assert!(session.connection_inputs.is_none());
}

#[test]
fn test_attach_and_release() {
    let mut session: Session<String> = Session::new(SessionId::new());
    session.attach("handle".to_string());
    assert!(session.is_connected());
    assert_eq!(session.handle().map(String::as_str), Some("handle"));

    assert!(session.release());
    assert!(!session.is_connected());
    assert!(!session.release(), "second release has nothing to drop");
}

#[tokio::test]
async fn test_known_id_returns_same_session() {
    let store: SessionStore<String> = SessionStore::new(Duration::from_secs(60));
    let (first, created) = store.get_or_create(None).await;
    assert!(created);
    let id = first.lock().await.id();

    let (again, created) = store.get_or_create(Some(id)).await;
    assert!(!created);
    assert_eq!(again.lock().await.id(), id);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_unknown_id_creates_fresh_session() {
    let store: SessionStore<String> = SessionStore::new(Duration::from_secs(60));
    let stale = SessionId::new();

    let (session, created) = store.get_or_create(Some(stale)).await;
    assert!(created);
    assert_ne!(session.lock().await.id(), stale);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let store: SessionStore<String> = SessionStore::new(Duration::from_secs(60));
    let (alice, _) = store.get_or_create(None).await;
    let (bob, _) = store.get_or_create(None).await;

    alice.lock().await.attach("alice-handle".to_string());

    assert!(alice.lock().await.is_connected());
    assert!(!bob.lock().await.is_connected());
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_remove_tears_down_session() {
    let store: SessionStore<String> = SessionStore::new(Duration::from_secs(60));
    let (session, _) = store.get_or_create(None).await;
    session.lock().await.attach("handle".to_string());
    let id = session.lock().await.id();

    assert!(store.remove(id).await);
    assert!(!session.lock().await.is_connected());
    assert!(store.is_empty().await);
    assert!(!store.remove(id).await);
}

#[tokio::test]
async fn test_idle_sessions_expire() {
    let store: SessionStore<String> = SessionStore::new(Duration::ZERO);
    let (session, _) = store.get_or_create(None).await;
    let id = session.lock().await.id();
    drop(session);

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(store.sweep().await, 1);

    let (fresh, created) = store.get_or_create(Some(id)).await;
    assert!(created);
    assert_ne!(fresh.lock().await.id(), id);
}
