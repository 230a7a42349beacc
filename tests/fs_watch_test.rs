//! End-to-end tests against the platform notify backend.
//!
//! These exercise real OS watches on a temp directory. Waits are generous;
//! the asserts only care that the right notifications arrive, not how fast.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use dirwatch::{DirWatcher, EventKinds, Notification, Settings};

fn channel_listener() -> (
    impl Fn(Notification) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<Notification>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |notification| {
            let _ = tx.send(notification);
        },
        rx,
    )
}

async fn recv_notification(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Notification {
    timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("listener channel closed")
}

async fn assert_silent(rx: &mut mpsc::UnboundedReceiver<Notification>, window_ms: u64) {
    match timeout(Duration::from_millis(window_ms), rx.recv()).await {
        Ok(Some(notification)) => panic!("unexpected notification: {notification:?}"),
        Ok(None) | Err(_) => {}
    }
}

/// Canonicalized temp root, so delivered absolute paths compare cleanly on
/// platforms where the temp dir sits behind a symlink.
fn temp_root() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::TempDir::new().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    (dir, canonical)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_create_then_delete_in_watched_dir() {
    let (_guard, root) = temp_root();
    let watcher = DirWatcher::new(&Settings::default());
    let (listener, mut rx) = channel_listener();

    // {Create, Delete} requested, Modify deliberately not
    watcher
        .watch(
            &root,
            EventKinds::CREATE | EventKinds::DELETE,
            listener,
            false,
        )
        .unwrap();

    let file = root.join("a.txt");
    std::fs::write(&file, b"hello").unwrap();
    assert_eq!(
        recv_notification(&mut rx).await,
        Notification::Created { path: file.clone() }
    );

    // Modification of an existing file is not watched and stays silent
    std::fs::write(&file, b"hello again").unwrap();
    assert_silent(&mut rx, 400).await;

    std::fs::remove_file(&file).unwrap();
    assert_eq!(
        recv_notification(&mut rx).await,
        Notification::Deleted { path: file }
    );

    watcher.close_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_subdirectory_activity_invisible_without_recurse() {
    let (_guard, root) = temp_root();
    std::fs::create_dir(root.join("sub")).unwrap();

    let watcher = DirWatcher::new(&Settings::default());
    let (listener, mut rx) = channel_listener();

    watcher
        .watch(&root, EventKinds::CREATE, listener, false)
        .unwrap();

    // Only the root directory itself is registered; entries one level down
    // are out of scope.
    std::fs::write(root.join("sub/hidden.txt"), b"x").unwrap();
    assert_silent(&mut rx, 800).await;

    // The watch itself still works
    std::fs::write(root.join("visible.txt"), b"x").unwrap();
    assert_eq!(
        recv_notification(&mut rx).await,
        Notification::Created {
            path: root.join("visible.txt")
        }
    );

    watcher.close_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recursive_watch_covers_preexisting_subdirs() {
    let (_guard, root) = temp_root();
    std::fs::create_dir_all(root.join("a/deep")).unwrap();

    let watcher = DirWatcher::new(&Settings::default());
    let (listener, mut rx) = channel_listener();

    watcher
        .watch(&root, EventKinds::CREATE, listener, true)
        .unwrap();

    // Root + a + a/deep, one handle per directory
    assert_eq!(watcher.registry().len(), 3);

    std::fs::write(root.join("a/deep/c.txt"), b"x").unwrap();
    assert_eq!(
        recv_notification(&mut rx).await,
        Notification::Created {
            path: root.join("a/deep/c.txt")
        }
    );

    watcher.close_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_all_stops_real_delivery() {
    let (_guard, root) = temp_root();
    let watcher = DirWatcher::new(&Settings::default());
    let (listener, mut rx) = channel_listener();

    watcher
        .watch(&root, EventKinds::CREATE, listener, false)
        .unwrap();
    assert_eq!(watcher.registry().len(), 1);

    watcher.close_all().await;
    assert!(watcher.registry().is_empty());

    std::fs::write(root.join("late.txt"), b"x").unwrap();
    assert_silent(&mut rx, 500).await;
}
