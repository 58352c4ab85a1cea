//! Server configuration: an optional JSON file, then command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Everything the server needs to start. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API listens on.
    pub bind: String,
    /// Directory holding the world save.
    pub world_dir: PathBuf,
    /// Seconds between autosaves. 0 disables autosave.
    pub autosave_secs: u64,
    /// Terrain seed for a new world. An existing save keeps its own seed.
    pub seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
            world_dir: "world".into(),
            autosave_secs: 300,
            seed: 0,
        }
    }
}

impl ServerConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Build the config from process arguments: `--config <file>` first,
    /// then `--bind`, `--world`, `--seed` and `--autosave-secs` on top.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut config = match flag(args, "--config") {
            Some(path) => Self::load(Path::new(path))?,
            None => Self::default(),
        };

        if let Some(bind) = flag(args, "--bind") {
            config.bind = bind.to_string();
        }
        if let Some(dir) = flag(args, "--world") {
            config.world_dir = dir.into();
        }
        if let Some(seed) = flag(args, "--seed") {
            config.seed = seed.parse().with_context(|| format!("invalid --seed {seed:?}"))?;
        }
        if let Some(secs) = flag(args, "--autosave-secs") {
            config.autosave_secs = secs
                .parse()
                .with_context(|| format!("invalid --autosave-secs {secs:?}"))?;
        }

        Ok(config)
    }

    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_secs > 0).then(|| Duration::from_secs(self.autosave_secs))
    }
}

/// The value following `name` in `args`, if any.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .skip_while(|a| *a != name)
        .nth(1)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let config = ServerConfig::from_args(&args(&["terraforge-server"])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.autosave_interval(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::from_args(&args(&[
            "terraforge-server",
            "--bind",
            "127.0.0.1:9000",
            "--world",
            "/tmp/w",
            "--seed",
            "42",
            "--autosave-secs",
            "0",
        ]))
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.world_dir, PathBuf::from("/tmp/w"));
        assert_eq!(config.seed, 42);
        assert_eq!(config.autosave_interval(), None);
    }

    #[test]
    fn bad_seed_is_an_error() {
        let err = ServerConfig::from_args(&args(&["x", "--seed", "north"])).unwrap_err();
        assert!(err.to_string().contains("--seed"));
    }

    #[test]
    fn file_then_flags() {
        let dir = std::env::temp_dir().join("terraforge_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("server.json");
        std::fs::write(&path, r#"{ "seed": 7, "world_dir": "saves/a" }"#).unwrap();

        let config = ServerConfig::from_args(&args(&[
            "x",
            "--config",
            path.to_str().unwrap(),
            "--seed",
            "8",
        ]))
        .unwrap();
        assert_eq!(config.seed, 8);
        assert_eq!(config.world_dir, PathBuf::from("saves/a"));
        assert_eq!(config.bind, ServerConfig::default().bind);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
