//! File sink: the sole subscriber of the `createFile` port.
//!
//! Every request is written by its own task. Writes are create-or-truncate,
//! never create parent directories, and carry no ordering guarantee relative
//! to each other. The first failed write stops the sink.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::core::path::{escapes_base_dir, target_path};
use crate::core::request::FileRequest;
use crate::io::config::ShimConfig;

/// Printed on stdout after every successful write.
pub const SAVED_MESSAGE: &str = "The file has been saved!";

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to write {name:?} outside {}", .base_dir.display())]
    OutsideBaseDir { name: String, base_dir: PathBuf },
}

/// Writes file requests under a base directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    base_dir: PathBuf,
    confine: bool,
}

impl FileSink {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            confine: false,
        }
    }

    pub fn from_config(cfg: &ShimConfig) -> Self {
        Self::new(cfg.base_dir.clone()).confined(cfg.confine_to_base_dir)
    }

    /// Reject names that climb above the base directory.
    pub fn confined(mut self, confine: bool) -> Self {
        self.confine = confine;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn target_path(&self, name: &str) -> PathBuf {
        target_path(&self.base_dir, name)
    }

    /// Persist one request, replacing any existing file at the target path.
    #[instrument(skip(self, request), fields(name = %request.name, bytes = request.content.len()))]
    pub async fn write(&self, request: &FileRequest) -> Result<PathBuf, WriteError> {
        if escapes_base_dir(&request.name) {
            if self.confine {
                return Err(WriteError::OutsideBaseDir {
                    name: request.name.clone(),
                    base_dir: self.base_dir.clone(),
                });
            }
            warn!(base_dir = %self.base_dir.display(), "name escapes base directory");
        }
        let path = self.target_path(&request.name);
        tokio::fs::write(&path, request.content.as_bytes())
            .await
            .map_err(|source| WriteError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Summary of a run that drained the `createFile` channel without a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinkReport {
    pub written: usize,
}

/// Consume `requests` until the channel closes and every write has finished.
///
/// Returns the first [`WriteError`] (wrapped in `anyhow`) as soon as it
/// happens; writes still in flight at that point are aborted.
pub async fn run_sink(
    sink: Arc<FileSink>,
    mut requests: mpsc::Receiver<FileRequest>,
) -> Result<SinkReport> {
    let mut in_flight: JoinSet<Result<PathBuf, WriteError>> = JoinSet::new();
    let mut report = SinkReport::default();
    let mut open = true;

    while open || !in_flight.is_empty() {
        tokio::select! {
            received = requests.recv(), if open => {
                match received {
                    Some(request) => {
                        let sink = Arc::clone(&sink);
                        in_flight.spawn(async move { sink.write(&request).await });
                    }
                    None => {
                        debug!(in_flight = in_flight.len(), "createFile channel closed");
                        open = false;
                    }
                }
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                let path = joined.map_err(|err| anyhow!("write task failed: {err}"))??;
                report.written += 1;
                saved(&path);
            }
        }
    }

    Ok(report)
}

fn saved(path: &Path) {
    info!(path = %path.display(), "file saved");
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = writeln!(stdout, "{SAVED_MESSAGE}") {
        warn!(error = %err, "failed to print saved message");
    }
}
