use std::collections::HashSet;

use url::Url;

use crate::config::types::{AppConfig, RegionEntry, SourceEntry, UserAgentConfig};
use crate::model::SourceSettings;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    validate_store(&config.store.database_path)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_regions(&config.regions)?;
    validate_sources(&config.sources, &config.regions)?;
    Ok(())
}

fn validate_store(database_path: &str) -> Result<(), ConfigError> {
    if database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.collector_name.is_empty() {
        return Err(ConfigError::Validation(
            "collector-name cannot be empty".to_string(),
        ));
    }

    if !config
        .collector_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "collector-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.collector_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_regions(regions: &[RegionEntry]) -> Result<(), ConfigError> {
    let mut codes = HashSet::new();
    for region in regions {
        if region.name.is_empty() {
            return Err(ConfigError::Validation(
                "region name cannot be empty".to_string(),
            ));
        }
        if region.code.is_empty() {
            return Err(ConfigError::Validation(format!(
                "region '{}' must have a code",
                region.name
            )));
        }
        if !codes.insert(region.code.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate region code '{}'",
                region.code
            )));
        }
    }
    Ok(())
}

fn validate_sources(sources: &[SourceEntry], regions: &[RegionEntry]) -> Result<(), ConfigError> {
    let region_codes: HashSet<&str> = regions.iter().map(|r| r.code.as_str()).collect();
    let mut names = HashSet::new();

    for source in sources {
        if source.name.is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }
        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }

        let url = Url::parse(&source.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid URL for source '{}': {}", source.name, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Source '{}' must use an http(s) URL",
                source.name
            )));
        }

        if !region_codes.contains(source.region.as_str()) {
            return Err(ConfigError::Validation(format!(
                "source '{}' references unknown region '{}'",
                source.name, source.region
            )));
        }

        // Parse the settings under the source's kind so cross-kind payloads
        // and malformed selectors surface at load time, not mid-run.
        let settings = SourceSettings::parse(source.kind, &source.settings_json()).map_err(|e| {
            ConfigError::Validation(format!("source '{}' settings: {}", source.name, e))
        })?;

        if let SourceSettings::Page(page) = &settings {
            if page.calendar_mode && !source.url.contains("{yyyymm}") {
                return Err(ConfigError::Validation(format!(
                    "source '{}' uses calendarMode but its URL has no {{yyyymm}} token",
                    source.name
                )));
            }
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact-email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceKind;

    fn region(code: &str) -> RegionEntry {
        RegionEntry {
            name: code.to_string(),
            code: code.to_string(),
            enabled: true,
        }
    }

    fn source(name: &str, url: &str, region: &str) -> SourceEntry {
        SourceEntry {
            name: name.to_string(),
            kind: SourceKind::Page,
            url: url.to_string(),
            region: region.to_string(),
            enabled: true,
            settings: None,
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_duplicate_region_code_rejected() {
        let regions = vec![region("riverdale"), region("riverdale")];
        assert!(validate_regions(&regions).is_err());
    }

    #[test]
    fn test_source_requires_absolute_http_url() {
        let regions = vec![region("riverdale")];

        let relative = vec![source("a", "/events/list.do", "riverdale")];
        assert!(validate_sources(&relative, &regions).is_err());

        let ftp = vec![source("a", "ftp://riverdale.example.com/events", "riverdale")];
        assert!(validate_sources(&ftp, &regions).is_err());

        let ok = vec![source("a", "https://riverdale.example.com/events", "riverdale")];
        assert!(validate_sources(&ok, &regions).is_ok());
    }

    #[test]
    fn test_source_unknown_region_rejected() {
        let regions = vec![region("riverdale")];
        let sources = vec![source("a", "https://x.example.com/", "elsewhere")];
        assert!(validate_sources(&sources, &regions).is_err());
    }

    #[test]
    fn test_source_bad_settings_rejected() {
        let regions = vec![region("riverdale")];
        let mut bad = source("a", "https://x.example.com/", "riverdale");
        // paginationEnabled without a pattern fails settings validation
        bad.settings = Some(toml::Value::Table({
            let mut table = toml::map::Map::new();
            table.insert("paginationEnabled".to_string(), toml::Value::Boolean(true));
            table
        }));
        assert!(validate_sources(&[bad], &regions).is_err());
    }
}
