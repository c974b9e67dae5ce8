use crate::providers::ipapi;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "geolens";
const FILE_NAME: Option<&str> = None;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UserConfig {
  /// Address `geolens serve` listens on.
  pub bind: String,
  /// Base URL `geolens lookup` sends requests to.
  pub server_url: String,
  pub provider_url: String,
  pub user_agent: String,
}

impl Default for UserConfig {
  fn default() -> Self {
    Self {
      bind: "127.0.0.1:3000".to_string(),
      server_url: "http://127.0.0.1:3000".to_string(),
      provider_url: ipapi::DEFAULT_BASE_URL.to_string(),
      user_agent: ipapi::DEFAULT_USER_AGENT.to_string(),
    }
  }
}

/// Overrides coming from the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
  pub bind: Option<String>,
  pub server_url: Option<String>,
  pub provider_url: Option<String>,
  pub user_agent: Option<String>,
}

impl UserConfig {
  #[must_use]
  pub fn merged(mut self, overrides: Overrides) -> Self {
    if let Some(bind) = overrides.bind {
      self.bind = bind;
    }
    if let Some(url) = overrides.server_url {
      self.server_url = url;
    }
    if let Some(url) = overrides.provider_url {
      self.provider_url = url;
    }
    if let Some(agent) = overrides.user_agent {
      self.user_agent = agent;
    }
    self
  }
}

/// Read ~/.config/geolens/default-config.toml (or OS equivalent).
pub fn load() -> UserConfig {
  confy::load(APP_NAME, FILE_NAME).unwrap_or_default()
}

pub fn store(cfg: &UserConfig) -> anyhow::Result<()> {
  confy::store(APP_NAME, FILE_NAME, cfg).map_err(Into::into)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let cfg = UserConfig::default();
    assert_eq!(cfg.bind, "127.0.0.1:3000");
    assert_eq!(cfg.server_url, "http://127.0.0.1:3000");
    assert_eq!(cfg.provider_url, "https://ipapi.co");
    assert_eq!(cfg.user_agent, "Mozilla/5.0");
  }

  #[test]
  fn test_overrides_win() {
    let cfg = UserConfig::default().merged(Overrides {
      bind: Some("0.0.0.0:8080".to_string()),
      provider_url: Some("http://localhost:9000".to_string()),
      ..Overrides::default()
    });
    assert_eq!(cfg.bind, "0.0.0.0:8080");
    assert_eq!(cfg.provider_url, "http://localhost:9000");
    assert_eq!(cfg.server_url, "http://127.0.0.1:3000");
    assert_eq!(cfg.user_agent, "Mozilla/5.0");
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let cfg: UserConfig =
      serde_json::from_str(r#"{"server_url": "http://lookup.internal"}"#)
        .expect("partial config parses");
    assert_eq!(cfg.server_url, "http://lookup.internal");
    assert_eq!(cfg.bind, "127.0.0.1:3000");
  }
}
