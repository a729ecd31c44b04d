/*!
 * Control Socket Tests
 * One request per connection over a real Unix socket
 */

use crate::common::{three_block_scavenger, ScriptedClaimer};
use memscav::control::{serve, ControlSurface};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    _dir: TempDir,
    path: PathBuf,
    stop: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

async fn start(claimer: Arc<ScriptedClaimer>) -> Running {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memscav.sock");
    let surface = ControlSurface::new(Arc::new(three_block_scavenger(claimer)), 4096);
    let (stop, stopped) = oneshot::channel::<()>();

    let socket = path.clone();
    let task = tokio::spawn(async move {
        serve(surface, &socket, async move {
            let _ = stopped.await;
        })
        .await
    });

    for _ in 0..100 {
        if path.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    Running {
        _dir: dir,
        path,
        stop,
        task,
    }
}

async fn request(path: &Path, line: &str) -> String {
    let mut stream = UnixStream::connect(path).await.unwrap();
    stream.write_all(line.as_bytes()).await.unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    reply
}

#[tokio::test]
async fn test_read_and_write_over_socket() {
    let claimer = ScriptedClaimer::succeeding();
    let server = start(claimer.clone()).await;

    assert_eq!(
        request(&server.path, "read hidden_blocks\n").await,
        "0x10000-0x2ffff (0x20000)\n0x40000-0x4ffff (0x10000)\n"
    );
    assert_eq!(request(&server.path, "write scavenge 0x20000\n").await, "ok 7\n");
    assert_eq!(
        request(&server.path, "read hidden_blocks\n").await,
        "0x40000-0x4ffff (0x10000)\n"
    );
    assert_eq!(claimer.claimed_addrs(), vec![0x10000, 0x20000]);

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_errors_reported_to_client() {
    let server = start(ScriptedClaimer::succeeding()).await;

    assert!(request(&server.path, "write ranges 1\n").await.starts_with("error: "));
    assert!(request(&server.path, "hello\n").await.starts_with("error: Malformed request"));
    assert!(request(&server.path, "write scavenge 0x8000\n").await.starts_with("error: "));

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_socket_removed_on_shutdown() {
    let server = start(ScriptedClaimer::succeeding()).await;
    assert!(server.path.exists());

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();

    assert!(!server.path.exists());
}

#[tokio::test]
async fn test_stale_socket_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memscav.sock");
    std::fs::write(&path, b"stale").unwrap();

    let surface = ControlSurface::new(
        Arc::new(three_block_scavenger(ScriptedClaimer::succeeding())),
        4096,
    );
    // Already-resolved shutdown: bind, then withdraw immediately.
    serve(surface, &path, async {}).await.unwrap();

    assert!(!path.exists());
}
