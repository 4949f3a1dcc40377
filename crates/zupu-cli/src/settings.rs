//! Client settings: the optional TOML config file and the saved session token.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Shape of the optional TOML config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
  #[serde(default)]
  pub url:          String,
  /// Where the session token is kept between invocations.
  #[serde(default)]
  pub session_file: Option<PathBuf>,
}

impl ConfigFile {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }
}

/// `$XDG_CONFIG_HOME/zupu/session`, falling back to `~/.config/zupu/session`.
pub fn default_session_file() -> PathBuf {
  let base = std::env::var_os("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
    .unwrap_or_else(|| PathBuf::from("."));
  base.join("zupu").join("session")
}

/// The saved bearer token, on disk between invocations.
#[derive(Debug, Clone)]
pub struct SessionFile {
  path: PathBuf,
}

impl SessionFile {
  pub fn new(path: PathBuf) -> Self { Self { path } }

  pub fn path(&self) -> &Path { &self.path }

  /// `None` if no token has been saved.
  pub fn load(&self) -> Result<Option<String>> {
    match std::fs::read_to_string(&self.path) {
      Ok(raw) => {
        let token = raw.trim();
        Ok((!token.is_empty()).then(|| token.to_owned()))
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
    }
  }

  pub fn save(&self, token: &str) -> Result<()> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&self.path, token)
      .with_context(|| format!("writing {}", self.path.display()))?;
    restrict_permissions(&self.path)
  }

  pub fn clear(&self) -> Result<()> {
    match std::fs::remove_file(&self.path) {
      Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
        Err(e).with_context(|| format!("removing {}", self.path.display()))
      }
      _ => Ok(()),
    }
  }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
  use std::os::unix::fs::PermissionsExt as _;
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
    .with_context(|| format!("restricting permissions of {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> { Ok(()) }
