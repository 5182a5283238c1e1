use f5api_core::{ApiError, Config};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::client::{LtmClient, LtmError};
use crate::session::BigIpSession;

/// Host alias → appliance client.
///
/// Built once before the server starts listening and shared read-only
/// afterwards, so lookups need no locking.
pub struct HostRegistry {
    clients: HashMap<String, Arc<dyn LtmClient>>,
}

impl HostRegistry {
    /// Create one [`BigIpSession`] per configured account.
    pub fn from_config(config: &Config) -> Result<Self, LtmError> {
        let mut clients: HashMap<String, Arc<dyn LtmClient>> = HashMap::new();
        for (alias, account) in &config.accounts {
            let session = BigIpSession::new(account)?;
            clients.insert(alias.clone(), Arc::new(session));
        }
        info!(hosts = clients.len(), org = %config.org, "Host registry built");
        Ok(Self { clients })
    }

    pub fn from_clients<I>(clients: I) -> Self
    where
        I: IntoIterator<Item = (String, Arc<dyn LtmClient>)>,
    {
        Self {
            clients: clients.into_iter().collect(),
        }
    }

    /// Resolve an alias; unknown aliases are a caller error.
    pub fn get(&self, alias: &str) -> Result<&Arc<dyn LtmClient>, ApiError> {
        self.clients
            .get(alias)
            .ok_or_else(|| ApiError::HostNotFound(alias.to_string()))
    }

    /// Configured aliases, sorted.
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use f5api_core::Account;

    fn account(host: &str) -> Account {
        Account {
            ltm_host: host.into(),
            username: "admin".into(),
            password: "admin".into(),
            upload_path: "/var/config/rest/downloads".into(),
            verify_tls: true,
        }
    }

    #[test]
    fn builds_one_client_per_account() {
        let mut config = Config::default();
        config.accounts.insert("lab".into(), account("lb1.example.org"));
        config.accounts.insert("prod".into(), account("lb2.example.org"));

        let registry = HostRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.aliases(), vec!["lab", "prod"]);
        assert_eq!(registry.get("prod").unwrap().host(), "lb2.example.org");
    }

    #[test]
    fn unknown_alias_is_host_not_found() {
        let registry = HostRegistry::from_config(&Config::default()).unwrap();
        assert!(registry.is_empty());
        let err = registry.get("nope").err().unwrap();
        assert!(matches!(err, ApiError::HostNotFound(ref h) if h == "nope"));
    }
}
