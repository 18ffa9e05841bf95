use crate::config::types::AppConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Used to detect configuration changes between collection runs.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(AppConfig, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[store]
database-path = "./events.db"

[user-agent]
collector-name = "AgoraHarvest"
collector-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[[regions]]
name = "Riverdale"
code = "riverdale"

[[sources]]
name = "Riverdale Event Board"
kind = "page"
url = "https://riverdale.example.com/events/list.do"
region = "riverdale"
settings = { listSelector = "table.list tbody tr", titleSelector = "td:nth-child(2) a" }
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.store.database_path, "./events.db");
        assert_eq!(config.user_agent.collector_name, "AgoraHarvest");
        assert_eq!(config.regions.len(), 1);
        assert_eq!(config.sources.len(), 1);
        assert!(config.sources[0].enabled);
    }

    #[test]
    fn test_settings_carried_as_json() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        let json = config.sources[0].settings_json();
        assert!(json.contains("\"listSelector\""));
        assert!(json.contains("table.list tbody tr"));
    }

    #[test]
    fn test_missing_settings_default_to_empty_object() {
        let config_content = VALID_CONFIG.replace(
            "settings = { listSelector = \"table.list tbody tr\", titleSelector = \"td:nth-child(2) a\" }",
            "",
        );
        let file = create_temp_config(&config_content);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sources[0].settings_json(), "{}");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = VALID_CONFIG.replace("region = \"riverdale\"", "region = \"unknown\"");
        let file = create_temp_config(&config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
