use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub allocation: AllocationPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AllocationPolicy {
    #[serde(default = "default_percentage")]
    pub default_percentage: f64,
    #[serde(default = "default_min_percentage")]
    pub min_percentage: f64,
    #[serde(default = "default_max_percentage")]
    pub max_percentage: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub session_db_path: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/airas/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        parsed.allocation.validate()?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.api.base_url = base_url;
        }
        if let Some(db_path) = overrides.session_db_path {
            self.session.db_path = db_path;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_session_path(&self) -> PathBuf {
        expand_tilde(&self.session.db_path)
    }

    pub fn default_template() -> String {
        let template = r#"[api]
base_url = "http://localhost:8000"
timeout_secs = 12
connect_timeout_secs = 6

[session]
db_path = "~/.local/share/airas/session.db"

[allocation]
default_percentage = 20.0
min_percentage = 10.0
max_percentage = 100.0
"#;
        template.to_string()
    }
}

impl AllocationPolicy {
    pub fn validate(&self) -> Result<()> {
        let ordered = self.min_percentage > 0.0
            && self.min_percentage <= self.max_percentage
            && self.max_percentage <= 100.0;
        if !ordered {
            anyhow::bail!(
                "allocation percentages must satisfy 0 < min ({}) <= max ({}) <= 100",
                self.min_percentage,
                self.max_percentage
            );
        }
        if !(self.min_percentage..=self.max_percentage).contains(&self.default_percentage) {
            anyhow::bail!(
                "default allocation percentage {} is outside [{}, {}]",
                self.default_percentage,
                self.min_percentage,
                self.max_percentage
            );
        }
        Ok(())
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_percentage, self.max_percentage)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_path: default_session_db_path(),
        }
    }
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            default_percentage: default_percentage(),
            min_percentage: default_min_percentage(),
            max_percentage: default_max_percentage(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    12
}

fn default_connect_timeout_secs() -> u64 {
    6
}

fn default_session_db_path() -> String {
    "~/.local/share/airas/session.db".to_string()
}

fn default_percentage() -> f64 {
    20.0
}

fn default_min_percentage() -> f64 {
    10.0
}

fn default_max_percentage() -> f64 {
    100.0
}

#[cfg(test)]
mod tests {
    use super::{AllocationPolicy, Config, ConfigOverrides};

    #[test]
    fn template_parses_to_defaults() {
        let parsed: Config = toml::from_str(&Config::default_template()).expect("template parses");
        let defaults = Config::default();
        assert_eq!(parsed.api.base_url, defaults.api.base_url);
        assert_eq!(parsed.api.timeout_secs, 12);
        assert_eq!(parsed.allocation, AllocationPolicy::default());
        assert_eq!(parsed.session.db_path, defaults.session.db_path);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let parsed: Config = toml::from_str("[api]\nbase_url = \"https://airas.internal\"\n")
            .expect("partial config parses");
        assert_eq!(parsed.api.base_url, "https://airas.internal");
        assert_eq!(parsed.api.connect_timeout_secs, 6);
        assert_eq!(parsed.allocation.default_percentage, 20.0);
    }

    #[test]
    fn overrides_replace_base_url() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            base_url: Some("http://127.0.0.1:9000".to_string()),
            session_db_path: None,
        });
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn rejects_inverted_policy() {
        let policy = AllocationPolicy {
            default_percentage: 20.0,
            min_percentage: 50.0,
            max_percentage: 40.0,
        };
        assert!(policy.validate().is_err());
        assert!(AllocationPolicy::default().validate().is_ok());
    }

    #[test]
    fn load_writes_and_reads_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/config.toml");
        Config::write_template(&path).expect("template written");
        let loaded = Config::load(Some(&path)).expect("config loads");
        assert_eq!(loaded.api.base_url, "http://localhost:8000");
    }
}
