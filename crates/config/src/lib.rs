#![forbid(unsafe_code)]

mod cache_mode;
mod engine;
mod error;
mod executor;
mod grid;
mod netlog;

pub use cache_mode::HttpCacheMode;
pub use engine::{EngineConfig, QuicHint};
pub use error::Error;
pub use executor::ExecutorConfig;
pub use grid::GridConfig;
pub use netlog::NetLogConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Environment variables with this prefix override file values.
/// Nested keys are separated by `__`, e.g. `GRIDLOAD_EXECUTOR__WORKERS=8`.
pub const ENV_PREFIX: &str = "GRIDLOAD_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub executor: ExecutorConfig,
    pub grid: GridConfig,
    pub netlog: NetLogConfig,
}

impl Config {
    /// Defaults layered with environment overrides.
    ///
    /// A variable that does not parse is an error rather than being dropped
    /// together with the valid ones.
    pub fn new() -> Result<Self, Error> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config.normalized())
    }

    /// Load defaults, then `path`, then environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_owned()));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config.normalized())
    }

    /// Write the configuration as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let doc = toml_edit::ser::to_string_pretty(self)?;
        fs::write(path, doc)?;
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.executor = self.executor.clamp();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::time::Duration;

    #[test]
    fn defaults_match_sample_engine() {
        let config = Config::default();
        assert_eq!(config.executor.workers, 4);
        assert_eq!(config.engine.cache, HttpCacheMode::DiskNoHttp);
        assert_eq!(config.engine.cache_max_size, 100 * 1024);
        assert!(config.engine.http2);
        assert!(config.engine.quic);
        assert!(config.engine.brotli);
        assert!(config.grid.resources.is_empty());
        assert!(!config.netlog.enabled);
    }

    #[test]
    fn load_merges_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "gridload.toml",
                r#"
                [engine]
                http2 = false
                cache = "in-memory"
                timeout = 5

                [executor]
                workers = 0

                [grid]
                resources = ["https://example.org/a.jpg", "https://example.org/b.jpg"]
                reload_interval = 3
                max_cycles = 2
                "#,
            )?;
            jail.set_env("GRIDLOAD_ENGINE__USER_AGENT", "from-env");

            let config = Config::load("gridload.toml").map_err(|err| err.to_string())?;
            assert!(!config.engine.http2);
            assert_eq!(config.engine.cache, HttpCacheMode::InMemory);
            assert_eq!(config.engine.timeout, Duration::from_secs(5));
            assert_eq!(config.engine.user_agent, "from-env");
            // clamped
            assert_eq!(config.executor.workers, 1);
            assert_eq!(config.grid.resources.len(), 2);
            assert_eq!(config.grid.reload_interval, Duration::from_secs(3));
            assert_eq!(config.grid.max_cycles, Some(2));
            Ok(())
        });
    }

    #[test]
    fn new_applies_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("GRIDLOAD_ENGINE__USER_AGENT", "from-env");
            jail.set_env("GRIDLOAD_EXECUTOR__WORKERS", "8");

            let config = Config::new().map_err(|err| err.to_string())?;
            assert_eq!(config.engine.user_agent, "from-env");
            assert_eq!(config.executor.workers, 8);
            Ok(())
        });
    }

    #[test]
    fn new_reports_malformed_env_value() {
        Jail::expect_with(|jail| {
            jail.set_env("GRIDLOAD_ENGINE__USER_AGENT", "from-env");
            jail.set_env("GRIDLOAD_EXECUTOR__WORKERS", "lots");

            let err = Config::new().unwrap_err();
            assert!(matches!(err, Error::Figment(_)));
            assert!(err.to_string().contains("workers"));
            Ok(())
        });
    }

    #[test]
    fn load_rejects_missing_file() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridload.toml");

        let mut config = Config::default();
        config.grid.resources = vec!["https://example.org/a.jpg".into()];
        config.engine.quic_hints.push(QuicHint {
            host: "example.org".into(),
            port: 443,
            alternate_port: 443,
        });
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.grid.resources, config.grid.resources);
        assert_eq!(loaded.engine.quic_hints, config.engine.quic_hints);
    }
}
