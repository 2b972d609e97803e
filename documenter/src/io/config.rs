//! Shim configuration stored in `documenter.toml`.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "documenter.toml";

/// Shim configuration (TOML).
///
/// Missing fields default to the values the shim has always used, so an
/// absent file behaves exactly like the bare shim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShimConfig {
    /// Directory every `createFile` name is appended to.
    pub base_dir: PathBuf,

    /// Reject names that climb above `base_dir` instead of writing them.
    pub confine_to_base_dir: bool,

    /// Capacity of the host -> sink channel.
    pub channel_capacity: usize,

    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Program emitting port messages on stdout (e.g. `["node","worker.js"]`).
    /// Empty means port messages are read from stdin.
    pub command: Vec<String>,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./src/"),
            confine_to_base_dir: false,
            channel_capacity: 64,
            app: AppConfig::default(),
        }
    }
}

impl ShimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(anyhow!("base_dir must not be empty"));
        }
        if self.channel_capacity == 0 {
            return Err(anyhow!("channel_capacity must be > 0"));
        }
        if self.app.command.iter().any(|arg| arg.trim().is_empty()) {
            return Err(anyhow!("app.command must not contain empty elements"));
        }
        Ok(())
    }
}

/// Comment block written above the settings by `documenter init`.
const CONFIG_HEADER: &str = "\
# documenter settings. Command-line flags override these values.
# base_dir: prefix every createFile name is appended to (not normalized).
# app.command: program printing port messages on stdout; empty reads stdin.
";

/// Load the shim config.
///
/// A missing file is not an error: the shim then runs with
/// `ShimConfig::default()`, i.e. writes under `./src/` and reads stdin.
pub fn load_config(path: &Path) -> Result<ShimConfig> {
    let cfg = match fs::read_to_string(path) {
        Ok(contents) => toml::from_str::<ShimConfig>(&contents)
            .with_context(|| format!("parse {}", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => ShimConfig::default(),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Write `cfg` with an explanatory header, replacing `path` in one rename.
pub fn write_config(path: &Path, cfg: &ShimConfig) -> Result<()> {
    cfg.validate()?;
    let body = toml::to_string_pretty(cfg).context("serialize config toml")?;
    let mut buf = String::with_capacity(CONFIG_HEADER.len() + body.len() + 2);
    buf.push_str(CONFIG_HEADER);
    buf.push('\n');
    buf.push_str(&body);
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    replace_file(path, &buf)
}

/// Stage `contents` next to `path` as a hidden file, then rename over it.
fn replace_file(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("config path has no file name {}", path.display()))?;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;
    }
    let mut staged_name = OsString::from(".");
    staged_name.push(file_name);
    staged_name.push(".tmp");
    let staged = match dir {
        Some(dir) => dir.join(&staged_name),
        None => PathBuf::from(&staged_name),
    };
    fs::write(&staged, contents).with_context(|| format!("write {}", staged.display()))?;
    fs::rename(&staged, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
