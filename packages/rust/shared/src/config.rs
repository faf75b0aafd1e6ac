//! Application configuration for circex.
//!
//! User config lives at `~/.circex/circex.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CircexError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "circex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".circex";

// ---------------------------------------------------------------------------
// Config structs (matching circex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target site settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Scrape behavior.
    #[serde(default)]
    pub scrape: ScrapeDefaultsConfig,

    /// Cache persistence.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Departments to process.
    #[serde(default = "default_departments")]
    pub departments: Vec<DepartmentEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            scrape: ScrapeDefaultsConfig::default(),
            cache: CacheConfig::default(),
            departments: default_departments(),
        }
    }
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL circular URLs are constructed under.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.sbp.org.pk".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeDefaultsConfig {
    /// Fixed delay in ms between successive document fetches.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Limit how many years of a department archive to process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_years: Option<u32>,

    /// Only keep documents whose title matches one of these keywords
    /// (word-boundary match). Empty = keep everything.
    #[serde(default)]
    pub title_keywords: Vec<String>,

    /// Recursively resolve detected citations.
    #[serde(default)]
    pub follow_references: bool,
}

impl Default for ScrapeDefaultsConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: default_rate_limit(),
            max_years: None,
            title_keywords: Vec::new(),
            follow_references: false,
        }
    }
}

fn default_rate_limit() -> u64 {
    500
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path of the JSON cache file mapping citation text to content.
    #[serde(default = "default_cache_file")]
    pub file: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file: default_cache_file(),
        }
    }
}

fn default_cache_file() -> String {
    "circular_content_cache.json".into()
}

/// `[[departments]]` entry — one department archive to process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentEntry {
    /// Short uppercase department name ("BPRD").
    pub name: String,
    /// Department index page URL.
    pub url: String,
}

fn default_departments() -> Vec<DepartmentEntry> {
    let base = default_base_url();
    [
        ("ACD", "acd"),
        ("BPD", "bpd"),
        ("BSRVD", "bsrvd"),
        ("BSD", "bsd"),
        ("MFD", "MFD"),
        ("BPRD", "bprd"),
    ]
    .into_iter()
    .map(|(name, path)| DepartmentEntry {
        name: name.into(),
        url: format!("{base}/{path}/index.htm"),
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Scrape config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scrape configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Base URL for constructed document URLs.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Delay in ms between successive document fetches.
    pub rate_limit_ms: u64,
    /// Optional cap on years processed per department.
    pub max_years: Option<u32>,
    /// Title keyword whitelist (empty = no filter).
    pub title_keywords: Vec<String>,
    /// Recursively resolve detected citations.
    pub follow_references: bool,
    /// Extract PDF attachment content via the PDF collaborator.
    pub extract_pdf: bool,
}

impl From<&AppConfig> for ScrapeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.site.base_url.clone(),
            request_timeout_secs: config.site.request_timeout_secs,
            rate_limit_ms: config.scrape.rate_limit_ms,
            max_years: config.scrape.max_years,
            title_keywords: config.scrape.title_keywords.clone(),
            follow_references: config.scrape.follow_references,
            extract_pdf: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.circex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CircexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.circex/circex.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CircexError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CircexError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CircexError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CircexError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CircexError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("circular_content_cache.json"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.scrape.rate_limit_ms, 500);
        assert_eq!(parsed.site.request_timeout_secs, 10);
        assert_eq!(parsed.departments.len(), 6);
    }

    #[test]
    fn config_with_departments() {
        let toml_str = r#"
[site]
base_url = "https://mirror.example.org"

[[departments]]
name = "BPRD"
url = "https://mirror.example.org/bprd/index.htm"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.departments.len(), 1);
        assert_eq!(config.departments[0].name, "BPRD");
        assert_eq!(config.site.base_url, "https://mirror.example.org");
    }

    #[test]
    fn scrape_config_from_app_config() {
        let app = AppConfig::default();
        let scrape = ScrapeConfig::from(&app);
        assert_eq!(scrape.rate_limit_ms, 500);
        assert!(!scrape.follow_references);
        assert!(scrape.title_keywords.is_empty());
    }
}
