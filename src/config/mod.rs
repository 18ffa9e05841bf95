//! Configuration module for Agora-Harvest
//!
//! Handles loading, parsing, and validating TOML configuration files. The
//! config carries the store location, collector identification, and the
//! region/source catalog seeded into storage at startup.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AppConfig, RegionEntry, SourceEntry, StoreConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
