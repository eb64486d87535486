use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::engine::LatencyWindow;

pub const CONFIG_PATH_ENV: &str = "VERIDAI_CONFIG";
pub const FAST_ENGINE_ENV: &str = "VERIDAI_FAST_ENGINE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub daily_free: u32,
    pub history_limit: usize,
    pub auth_prompt_delay_ms: u64,
    pub engine_latency_min_ms: u64,
    pub engine_latency_max_ms: u64,
    pub recent_count: usize,
    pub top_issues_count: usize,
    /// Run the anonymous placeholder through the engine once the user logs in.
    pub resume_deferred_on_login: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            daily_free: 15,
            history_limit: 200,
            auth_prompt_delay_ms: 600,
            engine_latency_min_ms: 800,
            engine_latency_max_ms: 2400,
            recent_count: 5,
            top_issues_count: 5,
            resume_deferred_on_login: true,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: SessionConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults unless `VERIDAI_CONFIG` names a file.
    pub fn from_env() -> Result<Self> {
        let config_path = std::env::var(CONFIG_PATH_ENV).ok();
        let fast_engine = std::env::var(FAST_ENGINE_ENV).ok();
        Self::from_vars(config_path.as_deref(), fast_engine.as_deref())
    }

    /// Resolve the config from raw `VERIDAI_CONFIG` / `VERIDAI_FAST_ENGINE`
    /// values. A fast engine (`1` or `true`) settles without latency.
    pub fn from_vars(config_path: Option<&str>, fast_engine: Option<&str>) -> Result<Self> {
        let mut config = match config_path.map(str::trim) {
            Some(path) if !path.is_empty() => Self::load(Path::new(path))?,
            _ => Self::default(),
        };

        let fast_engine = fast_engine
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if fast_engine {
            config.engine_latency_min_ms = 0;
            config.engine_latency_max_ms = 0;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            bail!("historyLimit must be greater than zero");
        }
        if self.engine_latency_min_ms > self.engine_latency_max_ms {
            bail!(
                "engineLatencyMinMs ({}) exceeds engineLatencyMaxMs ({})",
                self.engine_latency_min_ms,
                self.engine_latency_max_ms
            );
        }
        Ok(())
    }

    pub fn engine_latency(&self) -> LatencyWindow {
        LatencyWindow {
            min_ms: self.engine_latency_min_ms,
            max_ms: self.engine_latency_max_ms,
        }
    }
}
