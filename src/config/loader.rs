//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::WalletConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::error::WalletError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ConfigError> for WalletError {
    fn from(err: ConfigError) -> Self {
        WalletError::ConfigurationInvalid(err.to_string())
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<WalletConfig, ConfigError> {
    let config: WalletConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<WalletConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config = parse_config(&content)?;

    tracing::debug!(path = %path.display(), adapters = config.adapters.len(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            [[adapters]]
            id = "browser"
            adapter_type = "extension"
            priority = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.adapters[0].id, "browser");
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_config("adapters = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_becomes_invalid_config() {
        let err = parse_config("").unwrap_err();
        assert!(err.to_string().contains("no adapters configured"));

        let wallet_err: WalletError = err.into();
        assert_eq!(wallet_err.code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_out_of_range_ss58_prefix_is_rejected() {
        let err = parse_config(
            r#"
            [[adapters]]
            id = "browser"
            adapter_type = "extension"
            priority = 1

            [extension.address_format]
            kind = "ss58"
            prefix = 60000
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => assert!(matches!(
                errors.as_slice(),
                [ValidationError::InvalidAddressFormat { section: "extension", .. }]
            )),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let err = ConfigError::Validation(vec![
            ValidationError::NoAdapters,
            ValidationError::MissingProjectId,
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: no adapters configured, relay.project_id is required for relay adapters"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/wallet-bridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
