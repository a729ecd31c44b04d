/*!
 * Control Socket Server
 *
 * Serves a [`ControlSurface`] on a Unix domain socket, one request per
 * connection:
 *
 * - `read <entry>` replies with the entry text
 * - `write <entry> <value>` replies `ok <n>` with the bytes consumed
 * - anything rejected replies `error: <message>`
 */

use super::surface::ControlSurface;
use super::types::{ControlError, ControlResult};
use crate::core::limits::MAX_REQUEST_BYTES;
use std::future::Future;
use std::io;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

/// Outcome of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Written(usize),
}

/// Parse and execute one request line
pub fn handle_request(surface: &ControlSurface, request: &str) -> ControlResult<Reply> {
    let request = request.trim_end_matches(&['\r', '\n'][..]);
    let mut parts = request.splitn(3, ' ');

    match (parts.next(), parts.next(), parts.next()) {
        (Some("read"), Some(entry), None) => surface.read_named(entry).map(Reply::Text),
        (Some("write"), Some(entry), Some(value)) => {
            surface.write_named(entry, value).map(Reply::Written)
        }
        _ => Err(ControlError::MalformedRequest(request.to_string())),
    }
}

/// Render the wire reply for one request line
pub fn respond(surface: &ControlSurface, request: &str) -> String {
    match handle_request(surface, request) {
        Ok(Reply::Text(text)) => text,
        Ok(Reply::Written(n)) => format!("ok {n}\n"),
        Err(e) => {
            debug!(error = %e, "Control request rejected");
            format!("error: {e}\n")
        }
    }
}

/// Accept connections on `path` until `shutdown` resolves
///
/// A stale socket file left at `path` is replaced. The socket file is
/// removed again on return.
pub async fn serve<F>(surface: ControlSurface, path: &Path, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()>,
{
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed stale control socket"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let listener = UnixListener::bind(path)?;
    info!(path = %path.display(), "Control surface published");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let surface = surface.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(surface, stream).await {
                            warn!(error = %e, "Control connection failed");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "Failed to accept control connection"),
            },
        }
    }

    if let Err(e) = std::fs::remove_file(path) {
        warn!(error = %e, path = %path.display(), "Failed to remove control socket");
    }
    info!("Control surface withdrawn");
    Ok(())
}

async fn handle_connection(surface: ControlSurface, stream: UnixStream) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();

    let mut line = String::new();
    BufReader::new(reader)
        .take(MAX_REQUEST_BYTES)
        .read_line(&mut line)
        .await?;

    // Claims may block on the owning system; keep them off the reactor.
    let reply = tokio::task::spawn_blocking(move || respond(&surface, &line))
        .await
        .unwrap_or_else(|e| format!("error: {e}\n"));

    writer.write_all(reply.as_bytes()).await?;
    writer.shutdown().await
}
