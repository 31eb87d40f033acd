//! Configuration and route file loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routex::{self, Route};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("route file error: {0}")]
    Routes(#[from] routex::ParseError),

    #[error("validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate gateway configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and parse a route expression file.
pub fn load_routes(path: &Path) -> Result<Vec<Route>, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(routex::parse(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("routegate-test-{name}-{}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_config() {
        let path = write_temp("minimal.toml", "");
        let config = load_config(&path).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_config_with_routes_file() {
        let path = write_temp(
            "full.toml",
            "[routes]\nfile = \"routes.rx\"\nwatch = false\n\n[admin]\nenabled = true\napi_key = \"k\"\n",
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.routes.file, "routes.rx");
        assert!(!config.routes.watch);
        assert!(config.admin.enabled);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_routes_file() {
        let path = write_temp("routes.rx", "a: Path(\"/a\") -> <shunt>;\nb: * -> \"http://e.org\"");
        let routes = load_routes(&path).unwrap();
        assert_eq!(routes.len(), 2);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_bad_route_file_is_positional_error() {
        let path = write_temp("bad.rx", "a: Path(\"/a\" -> <shunt>");
        let err = load_routes(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Routes(_)));
        fs::remove_file(path).ok();
    }
}
