//! Configuration file handling

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default tracing directive when neither RUST_LOG nor the file sets one
const DEFAULT_LOG_FILTER: &str = "warn";

/// Settings read from the optional TOML file
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Kubeconfig to read contexts and credentials from
    pub kubeconfig: Option<PathBuf>,

    /// Pretty-print JSON output
    pub pretty: bool,

    /// Tracing filter directive, e.g. `podview_core=debug`
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            pretty: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load the config file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Command-line flags take precedence over the file
    pub fn with_overrides(mut self, kubeconfig: Option<PathBuf>, pretty: bool) -> Self {
        if kubeconfig.is_some() {
            self.kubeconfig = kubeconfig;
        }
        self.pretty |= pretty;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_all_keys() {
        let config = Config::parse(
            r#"
kubeconfig = "/etc/podview/kubeconfig"
pretty = true
log_filter = "podview_core=debug"
"#,
        )
        .unwrap();

        assert_eq!(config.kubeconfig, Some(PathBuf::from("/etc/podview/kubeconfig")));
        assert!(config.pretty);
        assert_eq!(config.log_filter, "podview_core=debug");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse("colour = true").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let config = Config::parse(r#"kubeconfig = "/a""#)
            .unwrap()
            .with_overrides(Some(PathBuf::from("/b")), true);
        assert_eq!(config.kubeconfig, Some(PathBuf::from("/b")));
        assert!(config.pretty);

        let config = Config::parse(r#"kubeconfig = "/a""#)
            .unwrap()
            .with_overrides(None, false);
        assert_eq!(config.kubeconfig, Some(PathBuf::from("/a")));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/podview.toml"))).is_err());
    }
}
