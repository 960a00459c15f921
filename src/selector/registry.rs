//! Closed registry mapping adapter types to constructors.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::adapters::{AdapterType, ExtensionAdapter, InjectedAdapter, RelayAdapter, WalletAdapter};
use crate::clients::{ExtensionClient, InjectedProvider, RelayClient};
use crate::config::{AdapterDescriptor, AdapterSettings, WalletConfig};
use crate::error::{WalletError, WalletResult};

/// Builds one adapter instance from its descriptor.
pub type AdapterFactory = Box<
    dyn Fn(&AdapterDescriptor, &WalletConfig) -> WalletResult<Arc<dyn WalletAdapter>> + Send + Sync,
>;

/// External clients available to the built-in adapter families.
#[derive(Clone, Default)]
pub struct ProviderClients {
    pub extensions: Vec<Arc<dyn ExtensionClient>>,
    pub relay: Option<Arc<dyn RelayClient>>,
    pub injected: Vec<Arc<dyn InjectedProvider>>,
}

#[derive(Default)]
pub struct AdapterRegistry {
    factories: HashMap<AdapterType, AdapterFactory>,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("types", &self.registered())
            .finish()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in families for whichever clients are present.
    pub fn with_clients(clients: ProviderClients) -> Self {
        let mut registry = Self::new();

        if !clients.extensions.is_empty() {
            let extensions = clients.extensions;
            registry.register(AdapterType::Extension, move |descriptor, config| {
                Ok(Arc::new(ExtensionAdapter::new(
                    descriptor.id.clone(),
                    extensions.clone(),
                    &config.extension,
                    AdapterSettings::resolve(Some(descriptor), config),
                )) as Arc<dyn WalletAdapter>)
            });
        }

        if let Some(relay) = clients.relay {
            registry.register(AdapterType::Relay, move |descriptor, config| {
                Ok(Arc::new(RelayAdapter::new(
                    descriptor.id.clone(),
                    relay.clone(),
                    &config.relay,
                    AdapterSettings::resolve(Some(descriptor), config),
                )) as Arc<dyn WalletAdapter>)
            });
        }

        if !clients.injected.is_empty() {
            let injected = clients.injected;
            registry.register(AdapterType::Injected, move |descriptor, config| {
                Ok(Arc::new(InjectedAdapter::new(
                    descriptor.id.clone(),
                    injected.clone(),
                    &config.injected,
                    AdapterSettings::resolve(Some(descriptor), config),
                )) as Arc<dyn WalletAdapter>)
            });
        }

        registry
    }

    /// Install or replace the constructor for `adapter_type`.
    pub fn register<F>(&mut self, adapter_type: AdapterType, factory: F)
    where
        F: Fn(&AdapterDescriptor, &WalletConfig) -> WalletResult<Arc<dyn WalletAdapter>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(adapter_type, Box::new(factory));
    }

    pub fn contains(&self, adapter_type: AdapterType) -> bool {
        self.factories.contains_key(&adapter_type)
    }

    pub fn registered(&self) -> Vec<AdapterType> {
        AdapterType::ALL
            .into_iter()
            .filter(|t| self.contains(*t))
            .collect()
    }

    pub fn build(
        &self,
        descriptor: &AdapterDescriptor,
        config: &WalletConfig,
    ) -> WalletResult<Arc<dyn WalletAdapter>> {
        let kind = descriptor
            .kind()
            .map_err(WalletError::ConfigurationInvalid)?;
        let factory = self.factories.get(&kind).ok_or_else(|| {
            WalletError::ConfigurationInvalid(format!(
                "no constructor registered for adapter type '{}'",
                kind
            ))
        })?;
        factory(descriptor, config)
    }
}
