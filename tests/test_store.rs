mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::{make_box, solid_image};
use spotter::models::InferenceRecord;
use spotter::store::InferenceStore;
use spotter::tasks::{AnnotationJob, AnnotationQueue};
use tokio::sync::oneshot;

fn record(id: &str) -> InferenceRecord {
    InferenceRecord {
        id: id.to_string(),
        name: format!("job-{id}"),
        size: 123,
    }
}

#[test]
fn append_and_list_records() {
    let store = InferenceStore::new(None);
    store.append(record("a"));
    store.append(record("b"));
    let records = store.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "a");
    assert_eq!(records[1].id, "b");
}

#[test]
fn history_limit_evicts_oldest() {
    let store = InferenceStore::new(Some(2));
    store.append(record("a"));
    store.append(record("b"));
    store.append(record("c"));
    let ids: Vec<_> = store.records().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[test]
fn index_is_absent_until_annotation_publishes() {
    // A job's artifact path legitimately does not exist yet while the box
    // list is already out; callers must tolerate the miss.
    let store = InferenceStore::new(None);
    store.append(record("a"));
    assert_eq!(store.get("a"), None);

    store.set("a", PathBuf::from("/tmp/a.jpg"));
    assert_eq!(store.get("a"), Some(PathBuf::from("/tmp/a.jpg")));
}

#[tokio::test]
async fn queue_publishes_artifact_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(InferenceStore::new(None));
    let queue = AnnotationQueue::start(Arc::clone(&store), 1, 4);

    let path = dir.path().join("a.jpg");
    let (done_tx, done_rx) = oneshot::channel();
    queue
        .sender()
        .send(AnnotationJob {
            id: "a".to_string(),
            image: solid_image(64, 64, [0, 0, 0]),
            boxes: vec![make_box("person", 32, 32, 20, 20, 0.9)],
            path: path.clone(),
            done: Some(done_tx),
        })
        .await
        .unwrap();

    let published = done_rx.await.unwrap().unwrap();
    assert_eq!(published, path);
    assert_eq!(store.get("a"), Some(path.clone()));
    assert!(path.exists());

    queue.close().await;
}

#[tokio::test]
async fn failed_annotation_leaves_index_absent() {
    let dir = tempfile::TempDir::new().unwrap();
    // A plain file where a directory is needed makes persistence fail.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();

    let store = Arc::new(InferenceStore::new(None));
    let queue = AnnotationQueue::start(Arc::clone(&store), 1, 4);

    let (done_tx, done_rx) = oneshot::channel();
    queue
        .sender()
        .send(AnnotationJob {
            id: "a".to_string(),
            image: solid_image(64, 64, [0, 0, 0]),
            boxes: vec![],
            path: blocker.join("a.jpg"),
            done: Some(done_tx),
        })
        .await
        .unwrap();

    assert!(done_rx.await.unwrap().is_err());
    assert_eq!(store.get("a"), None);

    queue.close().await;
}

#[tokio::test]
async fn close_drains_pending_jobs() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(InferenceStore::new(None));
    let queue = AnnotationQueue::start(Arc::clone(&store), 2, 8);

    let paths: Vec<_> = (0..3).map(|i| dir.path().join(format!("{i}.jpg"))).collect();
    for (i, path) in paths.iter().enumerate() {
        queue
            .sender()
            .send(AnnotationJob {
                id: i.to_string(),
                image: solid_image(32, 32, [0, 0, 0]),
                boxes: vec![],
                path: path.clone(),
                done: None,
            })
            .await
            .unwrap();
    }

    queue.close().await;
    for path in paths {
        assert!(path.exists(), "close must drain queued jobs first");
    }
}
