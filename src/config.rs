use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

/// Environment variable that points at an alternate config file.
pub const CONFIG_PATH_ENV: &str = "FACTCHECK_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub scraper: ScraperConfig,
    pub enrichment: EnrichmentConfig,
    pub storage: StorageConfig,
    pub analysis: AnalysisConfig,
    pub prototype: PrototypeConfig,
    pub rate_limit: RateLimitConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Project root; relative paths below are resolved against it.
    /// Empty means the current working directory.
    #[serde(default)]
    pub root: String,
    pub datasets_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    pub base_url: String,
    pub max_cards: usize,
    pub page_timeout_seconds: u64,
    pub verdict_timeout_seconds: u64,
    pub page_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    pub wiki_base_url: String,
    pub request_timeout_seconds: u64,
    /// Fixed name → image URL table consulted before any lookup.
    #[serde(default)]
    pub image_overrides: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub database_path: String,
    /// Also push the full statement table into `fact_checking`.
    #[serde(default)]
    pub sync_statements: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartTheme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub output_dir: String,
    pub theme: ChartTheme,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrototypeConfig {
    pub wikipedia_base_url: String,
    pub news_api_url: String,
    pub fact_check_api_url: String,
    pub similarity_threshold: f64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Calls allowed inside the sliding 60-second window.
    pub requests_per_minute: u32,
    /// Fixed sleep before the single retry when the window is saturated.
    pub saturation_sleep_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    /// Append logs here instead of writing to stderr.
    #[serde(default)]
    pub log_file: Option<String>,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub news_api_key: Option<SecretString>,
    pub fact_check_api_key: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            news_api_key: std::env::var("NEWS_API_KEY").ok().map(SecretString::from),
            fact_check_api_key: std::env::var("FACT_CHECK_API_KEY")
                .ok()
                .map(SecretString::from),
        }
    }
}

impl AppConfig {
    /// Load configuration from `$FACTCHECK_CONFIG` or config/default.toml,
    /// overlaying environment variables for secrets.
    pub fn load() -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let config_path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = Self::from_file(&config_path)?;
        let secrets = Secrets::from_env();

        Ok((config, secrets))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let contents = std::fs::read_to_string("config/default.toml")
            .expect("config/default.toml should exist");
        let config: AppConfig = toml::from_str(&contents).expect("should parse");
        assert_eq!(config.scraper.max_cards, 50);
        assert_eq!(config.paths.datasets_dir, "datasets");
        assert_eq!(config.analysis.theme, ChartTheme::Light);
        assert_eq!(config.rate_limit.requests_per_minute, 60);
        assert!(config.enrichment.wiki_base_url.starts_with("https://"));
        assert!(config.monitoring.log_file.is_none());
    }

    #[test]
    fn test_image_overrides_default_to_empty() {
        let toml_str = r#"
            wiki_base_url = "https://it.wikipedia.org"
            request_timeout_seconds = 5
        "#;
        let enrichment: EnrichmentConfig = toml::from_str(toml_str).expect("should parse");
        assert!(enrichment.image_overrides.is_empty());
    }

    #[test]
    fn test_dark_theme_parses() {
        let analysis: AnalysisConfig =
            toml::from_str("output_dir = \"charts\"\ntheme = \"dark\"").expect("should parse");
        assert_eq!(analysis.theme, ChartTheme::Dark);
    }
}
