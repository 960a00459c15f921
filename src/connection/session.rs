//! Session and account value types.

use serde::{Deserialize, Serialize};

/// An account exposed by a connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: String,
    pub display_name: Option<String>,
    /// Provider identifier the account was listed by.
    pub source_provider: String,
}

/// Provider-issued authorization held by exactly one adapter.
///
/// Account addresses keep the order the provider reported them in and
/// never contain duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    topic: String,
    chain_identifier: String,
    account_addresses: Vec<String>,
    expiry: Option<u64>,
}

impl Session {
    pub fn new(
        topic: impl Into<String>,
        chain_identifier: impl Into<String>,
        accounts: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            chain_identifier: chain_identifier.into(),
            account_addresses: dedup(accounts),
            expiry: None,
        }
    }

    /// Set the expiry as seconds since the Unix epoch.
    pub fn with_expiry(mut self, expiry: Option<u64>) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn chain_identifier(&self) -> &str {
        &self.chain_identifier
    }

    pub fn account_addresses(&self) -> &[String] {
        &self.account_addresses
    }

    pub fn expiry(&self) -> Option<u64> {
        self.expiry
    }

    pub fn contains_account(&self, address: &str) -> bool {
        self.account_addresses.iter().any(|a| a == address)
    }

    pub(crate) fn replace_accounts(&mut self, accounts: impl IntoIterator<Item = String>) {
        self.account_addresses = dedup(accounts);
    }

    pub(crate) fn set_chain(&mut self, chain: impl Into<String>) {
        self.chain_identifier = chain.into();
    }
}

fn dedup(accounts: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for account in accounts {
        if !out.contains(&account) {
            out.push(account);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_deduplicates_in_order() {
        let session = Session::new(
            "topic",
            "polkadot:91b171bb158e2d3848fa23a9f1c25182",
            vec!["b".to_string(), "a".to_string(), "b".to_string()],
        );
        assert_eq!(session.account_addresses(), ["b".to_string(), "a".to_string()]);
        assert!(session.contains_account("a"));
        assert!(!session.contains_account("c"));
    }

    #[test]
    fn test_session_updates() {
        let mut session = Session::new("t", "chain-a", Vec::new()).with_expiry(Some(42));
        session.replace_accounts(vec!["x".to_string(), "x".to_string()]);
        session.set_chain("chain-b");
        assert_eq!(session.account_addresses().len(), 1);
        assert_eq!(session.chain_identifier(), "chain-b");
        assert_eq!(session.expiry(), Some(42));
    }
}
