//! Application configuration for towermap.
//!
//! User config lives at `~/.towermap/towermap.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TowerMapError};
use crate::types::Operator;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "towermap.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".towermap";

// ---------------------------------------------------------------------------
// Config structs (matching towermap.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Lookup service settings.
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Map page settings.
    #[serde(default)]
    pub map: MapConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Operator used when none is given on the command line.
    #[serde(default)]
    pub operator: Operator,

    /// Path the map document is written to.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            operator: Operator::default(),
            output: default_output(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("mymap.html")
}

/// `[lookup]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Cell search endpoint; query parameters are appended per request.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://cellphonetrackers.org/gsm/classes/Cell.Search.php".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[map]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Public browser (`web.`) key embedded in the page.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Env var that overrides `api_key` when set (for private keys kept out of the file).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Map style name.
    #[serde(default = "default_maptype")]
    pub maptype: String,

    /// Show points of interest.
    #[serde(default = "default_true")]
    pub poi: bool,

    /// Show the traffic layer.
    #[serde(default)]
    pub traffic: bool,

    /// Initial map center as `[lat, lon]`.
    #[serde(default = "default_center")]
    pub center: [f64; 2],

    /// Initial zoom level.
    #[serde(default = "default_zoom")]
    pub zoom: f64,

    /// Map element width in pixels.
    #[serde(default = "default_width")]
    pub width_px: u32,

    /// Map element height in pixels.
    #[serde(default = "default_height")]
    pub height_px: u32,

    /// Leaflet stylesheet.
    #[serde(default = "default_stylesheet_url")]
    pub stylesheet_url: String,

    /// Leaflet script.
    #[serde(default = "default_script_url")]
    pub script_url: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            api_key_env: default_api_key_env(),
            maptype: default_maptype(),
            poi: true,
            traffic: false,
            center: default_center(),
            zoom: default_zoom(),
            width_px: default_width(),
            height_px: default_height(),
            stylesheet_url: default_stylesheet_url(),
            script_url: default_script_url(),
        }
    }
}

fn default_api_key() -> String {
    "web.36brwPxDnkFUqnfEXYWIbDM9gKN96y39FfBb48Pr".into()
}
fn default_api_key_env() -> String {
    "NESHAN_API_KEY".into()
}
fn default_maptype() -> String {
    "dreamy".into()
}
fn default_true() -> bool {
    true
}
fn default_center() -> [f64; 2] {
    [32.4971364, 54.0498515]
}
fn default_zoom() -> f64 {
    5.75
}
fn default_width() -> u32 {
    1340
}
fn default_height() -> u32 {
    700
}
fn default_stylesheet_url() -> String {
    "https://static.neshan.org/sdk/leaflet/1.4.0/leaflet.css".into()
}
fn default_script_url() -> String {
    "https://static.neshan.org/sdk/leaflet/1.4.0/leaflet.js".into()
}

// ---------------------------------------------------------------------------
// Runtime settings (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime lookup settings for the tower resolver.
#[derive(Debug, Clone)]
pub struct LookupSettings {
    /// Validated endpoint URL.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl LookupSettings {
    /// Build lookup settings from the app config, validating the endpoint URL.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let base_url = Url::parse(&config.lookup.base_url).map_err(|e| {
            TowerMapError::config(format!(
                "invalid lookup.base_url '{}': {e}",
                config.lookup.base_url
            ))
        })?;

        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(TowerMapError::config(format!(
                "lookup.base_url must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(config.lookup.timeout_secs),
        })
    }
}

/// Runtime map settings for the document builder, with the API key resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub api_key: String,
    pub maptype: String,
    pub poi: bool,
    pub traffic: bool,
    pub center: [f64; 2],
    pub zoom: f64,
    pub width_px: u32,
    pub height_px: u32,
    pub stylesheet_url: String,
    pub script_url: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        let map = MapConfig::default();
        Self::with_api_key(&map, map.api_key.clone())
    }
}

impl MapSettings {
    /// Build map settings from a `[map]` section and an explicit API key.
    pub fn with_api_key(map: &MapConfig, api_key: String) -> Self {
        Self {
            api_key,
            maptype: map.maptype.clone(),
            poi: map.poi,
            traffic: map.traffic,
            center: map.center,
            zoom: map.zoom,
            width_px: map.width_px,
            height_px: map.height_px,
            stylesheet_url: map.stylesheet_url.clone(),
            script_url: map.script_url.clone(),
        }
    }
}

impl From<&AppConfig> for MapSettings {
    /// The configured env var wins over `[map] api_key`; with neither set the
    /// key is empty and a warning is logged (the page still renders, tiles may not).
    fn from(config: &AppConfig) -> Self {
        let var_name = &config.map.api_key_env;
        let api_key = match std::env::var(var_name) {
            Ok(val) if !val.is_empty() => val,
            _ => config.map.api_key.clone(),
        };
        if api_key.is_empty() {
            tracing::warn!(env = %var_name, "map API key not set, map tiles may not load");
        }
        Self::with_api_key(&config.map, api_key)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.towermap/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TowerMapError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.towermap/towermap.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| TowerMapError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TowerMapError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TowerMapError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TowerMapError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TowerMapError::io(&path, e))?;
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
        assert!(toml_str.contains("operator = \"IR-MCI\""));
        assert!(toml_str.contains("NESHAN_API_KEY"));
        assert!(toml_str.contains("cellphonetrackers.org"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.lookup.timeout_secs, 30);
        assert_eq!(parsed.defaults.output, PathBuf::from("mymap.html"));
        assert_eq!(parsed.map.zoom, 5.75);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
operator = "Irancell"

[map]
maptype = "standard-night"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.operator, Operator::Irancell);
        assert_eq!(config.map.maptype, "standard-night");
        assert_eq!(config.map.width_px, 1340);
        assert_eq!(config.lookup.timeout_secs, 30);
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let toml_str = "[defaults]\noperator = \"Nope\"\n";
        let result: std::result::Result<AppConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn lookup_settings_validate_url() {
        let mut config = AppConfig::default();
        let settings = LookupSettings::from_config(&config).expect("default url is valid");
        assert_eq!(settings.timeout, Duration::from_secs(30));

        config.lookup.base_url = "not a url".into();
        assert!(LookupSettings::from_config(&config).is_err());

        config.lookup.base_url = "ftp://example.com/search".into();
        let err = LookupSettings::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn map_settings_fall_back_to_configured_key() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.map.api_key_env = "TOWERMAP_TEST_NONEXISTENT_KEY_12345".into();
        let settings = MapSettings::from(&config);
        assert_eq!(settings.api_key, default_api_key());
        assert!(settings.api_key.starts_with("web."));
        assert_eq!(settings.center, [32.4971364, 54.0498515]);

        config.map.api_key = String::new();
        assert!(MapSettings::from(&config).api_key.is_empty());
    }

    #[test]
    fn env_var_overrides_configured_key() {
        let mut config = AppConfig::default();
        // PATH is always set in the test environment.
        config.map.api_key_env = "PATH".into();
        let expected = std::env::var("PATH").expect("PATH is set");
        assert_eq!(MapSettings::from(&config).api_key, expected);
    }

    #[test]
    fn default_map_settings_carry_browser_key() {
        assert_eq!(MapSettings::default().api_key, default_api_key());
    }
}
