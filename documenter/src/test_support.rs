//! Test-only helpers: a scripted application and a scratch workspace.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::core::request::{FileRequest, PortMessage};
use crate::io::config::ShimConfig;
use crate::io::host::{Application, Ports};

/// Application that emits a fixed list of messages, then optionally fails.
#[derive(Debug, Clone)]
pub struct ScriptedApplication {
    messages: Vec<PortMessage>,
    failure: Option<String>,
}

impl ScriptedApplication {
    pub fn new(messages: Vec<PortMessage>) -> Self {
        Self {
            messages,
            failure: None,
        }
    }

    /// Emit one `createFile` message per `(name, content)` pair.
    pub fn files(files: &[(&str, &str)]) -> Self {
        Self::new(
            files
                .iter()
                .map(|(name, content)| {
                    PortMessage::create_file(&FileRequest::new(*name, *content))
                        .expect("encode createFile message")
                })
                .collect(),
        )
    }

    /// Fail with `message` after every scripted message was emitted.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }
}

impl Application for ScriptedApplication {
    async fn run(self, ports: Ports) -> Result<()> {
        for message in self.messages {
            ports.emit(message).await?;
        }
        if let Some(message) = self.failure {
            bail!(message);
        }
        Ok(())
    }
}

/// Temporary directory with an existing `src/` base directory.
pub struct TestWorkspace {
    temp: tempfile::TempDir,
    base_dir: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let base_dir = temp.path().join("src");
        fs::create_dir(&base_dir)
            .with_context(|| format!("create {}", base_dir.display()))?;
        Ok(Self { temp, base_dir })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Default config pointed at this workspace's base directory.
    pub fn config(&self) -> ShimConfig {
        ShimConfig {
            base_dir: self.base_dir.clone(),
            ..ShimConfig::default()
        }
    }

    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.base_dir.join(name);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }
}
