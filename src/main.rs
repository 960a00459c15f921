//! wallet-bridge command line.
//!
//! # Commands
//! - `check-config`: load and validate a config, print the adapter try order
//! - `validate-address`, `sanitize`, `validate-signature`: run one validator
//! - `demo`: connect through the selector over simulated providers and sign
//!
//! Every command prints one JSON document on stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use wallet_bridge::clients::simulated::{Behavior, SimulatedExtension, SimulatedInjected, SimulatedRelay};
use wallet_bridge::clients::{ExtensionClient, InjectedProvider};
use wallet_bridge::config::{load_config, AdapterDescriptor, ConfigError};
use wallet_bridge::observability::{logging, metrics};
use wallet_bridge::validation::{
    sanitize_message, validate_account_address, validate_signature, AddressFormat,
    DEFAULT_MAX_MESSAGE_LENGTH,
};
use wallet_bridge::{
    AdapterRegistry, AdapterSelector, AdapterType, ProviderClients, WalletConfig, WalletError,
};

const DEMO_SS58_ACCOUNT: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
const DEMO_EVM_ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

#[derive(Parser)]
#[command(name = "wallet-bridge")]
#[command(about = "Wallet adapter bridge: config checks, validators and a simulated demo", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the adapter plan
    CheckConfig,
    /// Check an account address against a network format
    ValidateAddress {
        address: String,
        /// `ss58:<prefix>` or `evm`
        #[arg(long, default_value = "ss58:42")]
        format: AddressFormat,
    },
    /// Sanitize a message the way adapters do before signing
    Sanitize {
        message: String,
        #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_LENGTH)]
        max_length: usize,
    },
    /// Check the shape of a signature
    ValidateSignature { signature: String },
    /// Connect to simulated providers through the selector and sign a message
    Demo {
        /// Make the highest-priority adapter decline
        #[arg(long)]
        fail_first: bool,

        #[arg(long, default_value = "  Hello World  \n")]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => load_config(path).map(Some),
        None => Ok(None),
    };

    let observability = match &loaded {
        Ok(Some(config)) => config.observability.clone(),
        _ => Default::default(),
    };
    logging::init_logging(&observability);
    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (ok, output) = match cli.command {
        Commands::CheckConfig => check_config(loaded),
        Commands::ValidateAddress { address, format } => {
            match validate_account_address(&address, format) {
                Ok(()) => (true, json!({ "valid": true, "format": format.to_string() })),
                Err(e) => (
                    false,
                    json!({ "valid": false, "format": format.to_string(), "reason": e.to_string() }),
                ),
            }
        }
        Commands::Sanitize {
            message,
            max_length,
        } => match sanitize_message(&message, max_length) {
            Ok(clean) => (true, json!({ "message": clean })),
            Err(e) => (false, failure(&WalletError::from(e))),
        },
        Commands::ValidateSignature { signature } => match validate_signature(&signature) {
            Ok(()) => (true, json!({ "valid": true })),
            Err(e) => (false, failure(&WalletError::from(e))),
        },
        Commands::Demo {
            fail_first,
            message,
        } => {
            let config = match loaded {
                Ok(Some(config)) => config,
                Ok(None) => demo_config(),
                Err(e) => return Err(e.into()),
            };
            match run_demo(config, fail_first, &message).await {
                Ok(report) => (true, report),
                Err(e) => (false, failure(&e)),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn failure(err: &WalletError) -> Value {
    json!({
        "code": err.code(),
        "error": err.to_string(),
        "context": err.context(),
    })
}

fn check_config(loaded: Result<Option<WalletConfig>, ConfigError>) -> (bool, Value) {
    let config = match loaded {
        Ok(Some(config)) => config,
        Ok(None) => return (false, json!({ "error": "no --config given" })),
        Err(e) => return (false, failure(&WalletError::from(e))),
    };

    let mut plan: Vec<&AdapterDescriptor> = config.adapters.iter().collect();
    plan.sort_by_key(|d| d.priority);

    (
        true,
        json!({
            "valid": true,
            "timeout_ms": config.timeouts.operation_ms,
            "max_reconnect_attempts": config.reconnect.max_attempts,
            "plan": plan,
        }),
    )
}

fn demo_config() -> WalletConfig {
    let mut config = WalletConfig::default();
    config.adapters = vec![
        AdapterDescriptor::new("browser", AdapterType::Extension, 1),
        AdapterDescriptor::new("mobile", AdapterType::Relay, 2),
        AdapterDescriptor::new("evm", AdapterType::Injected, 3),
    ];
    config.relay.project_id = "demo".to_string();
    config.relay.address_format = AddressFormat::Ss58 { prefix: 42 };
    config
}

async fn run_demo(config: WalletConfig, fail_first: bool, message: &str) -> Result<Value, WalletError> {
    let extension = SimulatedExtension::new("polkadot-js", &[DEMO_SS58_ACCOUNT]);
    let extension = if fail_first {
        extension.with_enable(Behavior::Reject)
    } else {
        extension
    };
    let relay_account = format!("{}:{}", config.relay.chain_id, DEMO_SS58_ACCOUNT);
    let relay = SimulatedRelay::new(&[relay_account.as_str()]);
    let injected = SimulatedInjected::new("metamask", &[DEMO_EVM_ACCOUNT]);

    let registry = AdapterRegistry::with_clients(ProviderClients {
        extensions: vec![Arc::new(extension) as Arc<dyn ExtensionClient>],
        relay: Some(Arc::new(relay)),
        injected: vec![Arc::new(injected) as Arc<dyn InjectedProvider>],
    });

    let selector = AdapterSelector::new(config, registry)?;
    let adapter = selector.connect().await?;
    let provider = adapter.get_provider();
    let accounts = adapter.get_accounts().await?;
    let signature = adapter.sign_message(message).await?;
    adapter.disconnect().await;

    Ok(json!({
        "adapter": adapter.id(),
        "provider": provider,
        "accounts": accounts,
        "signature": signature,
    }))
}
