use serde::Deserialize;

use crate::model::SourceKind;

/// Main configuration structure for Agora-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub regions: Vec<RegionEntry>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the collector
    #[serde(rename = "collector-name")]
    pub collector_name: String,

    /// Version of the collector
    #[serde(rename = "collector-version")]
    pub collector_version: String,

    /// URL with information about the collector
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for collector-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// A region whose sources are swept
#[derive(Debug, Clone, Deserialize)]
pub struct RegionEntry {
    pub name: String,

    /// Stable region code used to reference the region from sources
    pub code: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A source seeded into the catalog at startup
///
/// Kind-specific settings are written as an inline TOML table and carried to
/// the descriptor as opaque JSON text.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub name: String,
    pub kind: SourceKind,
    pub url: String,

    /// Code of the owning region
    pub region: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub settings: Option<toml::Value>,
}

impl SourceEntry {
    /// The settings table serialized as the descriptor's opaque JSON text
    pub fn settings_json(&self) -> String {
        self.settings
            .as_ref()
            .and_then(|value| serde_json::to_string(value).ok())
            .unwrap_or_else(|| "{}".to_string())
    }
}

fn default_true() -> bool {
    true
}
