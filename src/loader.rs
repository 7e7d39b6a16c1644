use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not an absolute file path", .0.display())]
    InvalidPath(PathBuf),
}

/// One page load. The ticket ties the completion back to its request.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub ticket: u64,
    pub path: PathBuf,
}

/// Completion notification for a [`LoadRequest`].
#[derive(Debug)]
pub struct LoadEvent {
    pub ticket: u64,
    pub path: PathBuf,
    pub result: Result<String, LoadError>,
}

/// Something that can fetch a page and report back asynchronously.
///
/// Implementations must deliver exactly one [`LoadEvent`] per request on
/// `events`, carrying the request's ticket.
pub trait PageLoader {
    fn load(&mut self, request: LoadRequest, events: UnboundedSender<LoadEvent>);
}

/// Reads pages from the local file system on the tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl PageLoader for FsLoader {
    fn load(&mut self, request: LoadRequest, events: UnboundedSender<LoadEvent>) {
        tokio::spawn(async move {
            let result = read_page(&request.path).await;
            debug!(ticket = request.ticket, path = %request.path.display(), ok = result.is_ok(), "page loaded");
            // Receiver gone means the crawl was abandoned
            let _ = events.send(LoadEvent {
                ticket: request.ticket,
                path: request.path,
                result,
            });
        });
    }
}

async fn read_page(path: &Path) -> Result<String, LoadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
