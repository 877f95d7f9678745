use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enums::Verbosity;

/// Process-wide editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  /// Save automatically after a short idle period.
  pub auto_save: bool,
  /// Upper bound for a whole simulated run, in seconds.
  pub execution_timeout: u64,
  pub log_level: Verbosity,
  /// Simulate all nodes concurrently instead of in document order.
  pub parallel_execution: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      auto_save: true,
      execution_timeout: 300,
      log_level: Verbosity::Info,
      parallel_execution: false,
    }
  }
}

impl Settings {
  /// Parse settings JSON. Missing fields take their defaults.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }

  pub fn execution_timeout(&self) -> Duration {
    Duration::from_secs(self.execution_timeout)
  }

  pub fn apply(&mut self, patch: SettingsPatch) {
    if let Some(auto_save) = patch.auto_save {
      self.auto_save = auto_save;
    }
    if let Some(timeout) = patch.execution_timeout {
      self.execution_timeout = timeout;
    }
    if let Some(level) = patch.log_level {
      self.log_level = level;
    }
    if let Some(parallel) = patch.parallel_execution {
      self.parallel_execution = parallel;
    }
  }
}

/// Partial settings update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub auto_save: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub execution_timeout: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub log_level: Option<Verbosity>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parallel_execution: Option<bool>,
}
