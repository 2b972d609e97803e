//! Wires the application host to the file sink and supervises both.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::io::config::ShimConfig;
use crate::io::host::{Application, ApplicationHandle, initialize};
use crate::io::sink::{FileSink, SinkReport, run_sink};

/// Run `app` to completion, persisting every `createFile` message it emits.
///
/// A write failure stops the run immediately and aborts the application. An
/// application failure is reported only after the requests it already emitted
/// have been written.
pub async fn run_shim<A: Application>(app: A, cfg: &ShimConfig) -> Result<SinkReport> {
    let ApplicationHandle { create_file, task } = initialize(app, cfg.channel_capacity);
    let sink = Arc::new(FileSink::from_config(cfg));
    info!(
        base_dir = %sink.base_dir().display(),
        confine = cfg.confine_to_base_dir,
        "subscribed to createFile"
    );

    let report = match run_sink(sink, create_file).await {
        Ok(report) => report,
        Err(err) => {
            task.abort();
            return Err(err);
        }
    };

    task.await
        .context("join application task")?
        .context("application failed")?;

    info!(written = report.written, "application finished");
    Ok(report)
}
