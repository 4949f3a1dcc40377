//! Server configuration, deserialised from `config.toml` and `ZUPU_*`
//! environment variables.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;
use zupu_api::ApiSettings;
use zupu_core::describe::Locale;

/// Ten years.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366 * 10;

/// Runtime server configuration. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub locale:               Locale,
  pub auto_confirm_signups: bool,
  pub session_ttl_hours:    i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 8080,
      store_path:           PathBuf::from("~/.local/share/zupu/zupu.db"),
      locale:               Locale::En,
      auto_confirm_signups: true,
      session_ttl_hours:    24 * 7,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings { locale: self.locale, auto_confirm_signups: self.auto_confirm_signups }
  }

  /// `None` when the configured hours are not positive or exceed
  /// [`MAX_SESSION_TTL_HOURS`].
  pub fn session_ttl(&self) -> Option<Duration> {
    (1..=MAX_SESSION_TTL_HOURS)
      .contains(&self.session_ttl_hours)
      .then(|| Duration::try_hours(self.session_ttl_hours))
      .flatten()
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn load(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = load("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert!(cfg.auto_confirm_signups);
    assert_eq!(cfg.session_ttl(), Some(Duration::hours(168)));
  }

  #[test]
  fn keys_override_defaults() {
    let cfg = load(
      r#"
        port = 9000
        locale = "zh"
        auto_confirm_signups = false
        session_ttl_hours = 0
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.api_settings().locale, Locale::Zh);
    assert!(!cfg.api_settings().auto_confirm_signups);
    assert_eq!(cfg.session_ttl(), None);
  }

  #[test]
  fn oversized_session_ttl_is_rejected() {
    assert_eq!(load("session_ttl_hours = 1000000000").session_ttl(), None);
    let ten_years = load(&format!("session_ttl_hours = {MAX_SESSION_TTL_HOURS}"));
    assert_eq!(ten_years.session_ttl(), Some(Duration::hours(MAX_SESSION_TTL_HOURS)));
  }

  #[test]
  fn tilde_expansion_only_touches_home_prefix() {
    assert_eq!(expand_tilde(Path::new("/var/zupu.db")), PathBuf::from("/var/zupu.db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/zupu.db")), PathBuf::from(home).join("zupu.db"));
    }
  }
}
