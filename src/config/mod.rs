//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → WalletConfig (validated, immutable)
//!     → AdapterSettings::resolve per adapter (apply overrides)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Adapter types stay strings until validation so an unknown type is a
//!   validation error, not a parse error

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdapterDescriptor, AdapterSettings, ClientMetadata, ExtensionConfig, InjectedConfig,
    ObservabilityConfig, RelayConfig, WalletConfig,
};
pub use validation::{validate_config, ValidationError};
