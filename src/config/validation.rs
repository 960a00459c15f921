//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the adapter priority list is usable (non-empty, unique ids and priorities, known types)
//! - Validate value ranges (timeouts > 0, message length > 0)
//! - Check provider-specific parameters for the families that are configured
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WalletConfig → Result<(), Vec<ValidationError>>
//! - Runs before any adapter is constructed

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::adapters::AdapterType;
use crate::config::schema::WalletConfig;
use crate::validation::address::{AddressFormat, MAX_SS58_FORMAT};

const RELAY_URL_SCHEMES: [&str; 4] = ["wss", "ws", "https", "http"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no adapters configured")]
    NoAdapters,

    #[error("adapter id must not be empty")]
    EmptyAdapterId,

    #[error("duplicate adapter id '{0}'")]
    DuplicateId(String),

    #[error("duplicate adapter priority {0}")]
    DuplicatePriority(u32),

    #[error("adapter '{id}' has unknown type '{adapter_type}'")]
    UnknownAdapterType { id: String, adapter_type: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(String),

    #[error("relay.project_id is required for relay adapters")]
    MissingProjectId,

    #[error("relay.relay_url '{0}' is not a valid relay endpoint")]
    InvalidRelayUrl(String),

    #[error("relay.chain_id '{0}' is not a CAIP-2 identifier")]
    InvalidChainId(String),

    #[error("{0}.providers must list at least one provider")]
    NoProviders(&'static str),

    #[error("{section}.address_format {format} is outside the ss58 range 0..={max}", max = MAX_SS58_FORMAT)]
    InvalidAddressFormat {
        section: &'static str,
        format: AddressFormat,
    },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &WalletConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.adapters.is_empty() {
        errors.push(ValidationError::NoAdapters);
    }

    if config.timeouts.operation_ms == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.operation_ms".to_string()));
    }
    if config.signing.max_message_length == 0 {
        errors.push(ValidationError::ZeroValue("signing.max_message_length".to_string()));
    }

    let mut ids = HashSet::new();
    let mut priorities = HashSet::new();
    let mut kinds = HashSet::new();

    for adapter in &config.adapters {
        if adapter.id.trim().is_empty() {
            errors.push(ValidationError::EmptyAdapterId);
        } else if !ids.insert(adapter.id.as_str()) {
            errors.push(ValidationError::DuplicateId(adapter.id.clone()));
        }

        if !priorities.insert(adapter.priority) {
            errors.push(ValidationError::DuplicatePriority(adapter.priority));
        }

        match adapter.kind() {
            Ok(kind) => {
                kinds.insert(kind);
            }
            Err(_) => errors.push(ValidationError::UnknownAdapterType {
                id: adapter.id.clone(),
                adapter_type: adapter.adapter_type.clone(),
            }),
        }

        if adapter.timeout_ms == Some(0) {
            errors.push(ValidationError::ZeroValue(format!("adapters.{}.timeout_ms", adapter.id)));
        }
    }

    if kinds.contains(&AdapterType::Extension) && config.extension.providers.is_empty() {
        errors.push(ValidationError::NoProviders("extension"));
    }
    if kinds.contains(&AdapterType::Injected) && config.injected.providers.is_empty() {
        errors.push(ValidationError::NoProviders("injected"));
    }
    if kinds.contains(&AdapterType::Relay) {
        validate_relay(config, &mut errors);
    }

    for (section, format) in [
        ("extension", config.extension.address_format),
        ("relay", config.relay.address_format),
        ("injected", config.injected.address_format),
    ] {
        if !format.is_encodable() {
            errors.push(ValidationError::InvalidAddressFormat { section, format });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_relay(config: &WalletConfig, errors: &mut Vec<ValidationError>) {
    let relay = &config.relay;

    if relay.project_id.trim().is_empty() {
        errors.push(ValidationError::MissingProjectId);
    }

    let url_ok = Url::parse(&relay.relay_url)
        .map(|url| RELAY_URL_SCHEMES.contains(&url.scheme()) && url.host().is_some())
        .unwrap_or(false);
    if !url_ok {
        errors.push(ValidationError::InvalidRelayUrl(relay.relay_url.clone()));
    }

    let caip2_ok = matches!(
        relay.chain_id.split_once(':'),
        Some((namespace, reference)) if !namespace.is_empty() && !reference.is_empty()
    );
    if !caip2_ok {
        errors.push(ValidationError::InvalidChainId(relay.chain_id.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AdapterDescriptor;

    fn descriptor(id: &str, kind: &str, priority: u32) -> AdapterDescriptor {
        AdapterDescriptor {
            id: id.to_string(),
            adapter_type: kind.to_string(),
            priority,
            timeout_ms: None,
            max_reconnect_attempts: None,
        }
    }

    fn valid_config() -> WalletConfig {
        let mut config = WalletConfig::default();
        config.adapters = vec![
            descriptor("browser", "extension", 1),
            descriptor("mobile", "relay", 2),
        ];
        config.relay.project_id = "project".to_string();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_adapter_list() {
        let errors = validate_config(&WalletConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoAdapters]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.adapters.push(descriptor("browser", "extension", 1));
        config.adapters.push(descriptor("ledger", "usb", 3));
        config.relay.project_id.clear();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateId("browser".into())));
        assert!(errors.contains(&ValidationError::DuplicatePriority(1)));
        assert!(errors.contains(&ValidationError::UnknownAdapterType {
            id: "ledger".into(),
            adapter_type: "usb".into()
        }));
        assert!(errors.contains(&ValidationError::MissingProjectId));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_relay_parameters() {
        let mut config = valid_config();
        config.relay.relay_url = "not a url".to_string();
        config.relay.chain_id = "polkadot".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidRelayUrl("not a url".into())));
        assert!(errors.contains(&ValidationError::InvalidChainId("polkadot".into())));
    }

    #[test]
    fn test_relay_settings_ignored_without_relay_adapter() {
        let mut config = WalletConfig::default();
        config.adapters = vec![descriptor("browser", "extension", 1)];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_address_format_out_of_range() {
        let mut config = valid_config();
        config.extension.address_format = AddressFormat::Ss58 { prefix: 60_000 };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidAddressFormat {
                section: "extension",
                format: AddressFormat::Ss58 { prefix: 60_000 },
            }]
        );
        assert!(errors[0].to_string().contains("ss58:60000"));
    }

    #[test]
    fn test_zero_values() {
        let mut config = valid_config();
        config.timeouts.operation_ms = 0;
        config.adapters[0].timeout_ms = Some(0);
        config.extension.providers.clear();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroValue("timeouts.operation_ms".into())));
        assert!(errors.contains(&ValidationError::ZeroValue("adapters.browser.timeout_ms".into())));
        assert!(errors.contains(&ValidationError::NoProviders("extension")));
    }
}
