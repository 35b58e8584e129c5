//! CLI configuration utilities

use anyhow::{Context, Result};
use hrdesk_core::ValidateConfig;
use hrdesk_http::SessionConfig;
use std::path::{Path, PathBuf};

/// Resolve the session configuration; command-line flags win over the file
/// and `HRDESK_*` environment variables.
pub fn load_session_config(
    path: Option<&Path>,
    state_dir: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<SessionConfig> {
    let mut config = SessionConfig::load(path).with_context(|| match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    if let Some(state_dir) = state_dir {
        config = config.with_state_dir(state_dir);
    }
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Write the default configuration as TOML
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    save_config(&SessionConfig::default(), path)
}

/// Save a configuration as TOML
pub fn save_config<P: AsRef<Path>>(config: &SessionConfig, path: P) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hrdesk.toml");
        std::fs::write(&path, "base_url = \"https://file.example.com\"\n").unwrap();

        let config = load_session_config(
            Some(&path),
            Some(dir.path().join("state")),
            Some("https://flag.example.com".to_string()),
        )
        .unwrap();

        assert_eq!(config.base_url, "https://flag.example.com");
        assert_eq!(config.state_dir, dir.path().join("state"));
    }

    #[test]
    fn generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hrdesk.toml");
        generate_default_config(&path).unwrap();

        let config = load_session_config(Some(&path), None, None).unwrap();
        assert_eq!(config.timeout_secs, SessionConfig::default().timeout_secs);
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let result = load_session_config(None, None, Some("not a url".to_string()));
        assert!(result.is_err());
    }
}
