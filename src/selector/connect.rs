//! Priority-ordered adapter selection.
//!
//! # Responsibilities
//! - Reject an unusable configuration before any provider is contacted
//! - Enable candidates in ascending priority, first success wins
//!
//! # Design Decisions
//! - Candidate failures are logged at debug and never surfaced individually
//! - All candidates failing is reported as `WalletNotFound`

use std::sync::Arc;

use crate::adapters::WalletAdapter;
use crate::config::{validate_config, AdapterDescriptor, WalletConfig};
use crate::error::{WalletError, WalletResult};
use crate::selector::registry::AdapterRegistry;

#[derive(Debug)]
pub struct AdapterSelector {
    config: WalletConfig,
    registry: AdapterRegistry,
    plan: Vec<AdapterDescriptor>,
}

impl AdapterSelector {
    /// Validate `config` against the registry and fix the try order.
    pub fn new(config: WalletConfig, registry: AdapterRegistry) -> WalletResult<Self> {
        let mut problems: Vec<String> = match validate_config(&config) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        };

        for descriptor in &config.adapters {
            if let Ok(kind) = descriptor.kind() {
                if !registry.contains(kind) {
                    problems.push(format!(
                        "adapter '{}': no constructor registered for type '{}'",
                        descriptor.id, kind
                    ));
                }
            }
        }

        if !problems.is_empty() {
            tracing::error!(problems = ?problems, "Rejecting adapter configuration");
            return Err(WalletError::ConfigurationInvalid(problems.join("; ")));
        }

        let mut plan = config.adapters.clone();
        plan.sort_by_key(|d| d.priority);

        Ok(Self {
            config,
            registry,
            plan,
        })
    }

    /// Descriptors in the order they will be tried.
    pub fn plan(&self) -> &[AdapterDescriptor] {
        &self.plan
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Enable the first adapter that can be enabled.
    pub async fn connect(&self) -> WalletResult<Arc<dyn WalletAdapter>> {
        for descriptor in &self.plan {
            let adapter = match self.registry.build(descriptor, &self.config) {
                Ok(adapter) => adapter,
                Err(e) => {
                    tracing::debug!(adapter = %descriptor.id, error = %e, "Adapter construction failed");
                    continue;
                }
            };

            match adapter.enable().await {
                Ok(()) => {
                    tracing::info!(
                        adapter = %descriptor.id,
                        priority = descriptor.priority,
                        provider = ?adapter.get_provider(),
                        "Wallet connected"
                    );
                    return Ok(adapter);
                }
                Err(e) => {
                    tracing::debug!(
                        adapter = %descriptor.id,
                        priority = descriptor.priority,
                        code = %e.code(),
                        error = %e,
                        "Adapter failed to enable, trying next"
                    );
                }
            }
        }

        tracing::warn!(candidates = self.plan.len(), "No wallet adapter could be enabled");
        Err(WalletError::WalletNotFound)
    }
}
