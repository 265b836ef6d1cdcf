use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    /// Spool directory for transient upload files.
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    /// Upload size ceiling in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_bytes() -> u64 {
    5 * 1024 * 1024
}

/// Static bearer tokens accepted by the API, keyed by the caller identity
/// they authenticate. Token issuance itself is out of scope; operators
/// provision these out of band.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.uploads.max_bytes == 0 {
        anyhow::bail!("uploads.max_bytes must be > 0");
    }

    let mut seen_tokens = std::collections::HashSet::new();
    for (caller, token) in &config.auth.tokens {
        if token.trim().is_empty() {
            anyhow::bail!("auth.tokens.{} must not be empty", caller);
        }
        // A token shared by two identities would make the attributed
        // caller ambiguous.
        if !seen_tokens.insert(token.as_str()) {
            anyhow::bail!("auth.tokens.{} reuses another identity's token", caller);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let file = write_config(
            r#"
[db]
path = "data/leadsplit.sqlite"

[server]
bind = "127.0.0.1:8080"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.uploads.dir, PathBuf::from("uploads"));
        assert_eq!(config.uploads.max_bytes, 5 * 1024 * 1024);
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn zero_size_ceiling_is_rejected() {
        let file = write_config(
            r#"
[db]
path = "x.sqlite"

[server]
bind = "127.0.0.1:8080"

[uploads]
max_bytes = 0
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn duplicate_token_values_are_rejected() {
        let file = write_config(
            r#"
[db]
path = "x.sqlite"

[server]
bind = "127.0.0.1:8080"

[auth.tokens]
admin = "shared-secret"
portal = "shared-secret"
"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("reuses"));
    }

    #[test]
    fn blank_token_is_rejected() {
        let file = write_config(
            r#"
[db]
path = "x.sqlite"

[server]
bind = "127.0.0.1:8080"

[auth.tokens]
admin = "  "
"#,
        );
        assert!(load_config(file.path()).is_err());
    }
}
