//! Stored MOCO credentials

use anyhow::Result;
use serde_json::Value;

use crate::storage::KeyValueStore;

const DOMAIN_KEY: &str = "domain";
const API_KEY_KEY: &str = "apiKey";

/// Account subdomain and API token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub domain: Option<String>,
    pub api_key: Option<String>,
}

impl Credentials {
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self> {
        Ok(Self {
            domain: non_empty(store.get(DOMAIN_KEY).await?),
            api_key: non_empty(store.get(API_KEY_KEY).await?),
        })
    }

    pub async fn save(store: &dyn KeyValueStore, domain: &str, api_key: &str) -> Result<()> {
        store.set(DOMAIN_KEY, Value::from(domain.trim())).await?;
        store.set(API_KEY_KEY, Value::from(api_key.trim())).await
    }

    pub async fn clear(store: &dyn KeyValueStore) -> Result<()> {
        store.remove(&[DOMAIN_KEY, API_KEY_KEY]).await
    }

    /// Fill gaps in `self` from `stored`
    pub fn or(self, stored: Credentials) -> Self {
        Self {
            domain: self.domain.or(stored.domain),
            api_key: self.api_key.or(stored.api_key),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.complete().is_some()
    }

    /// Both values, if both are present
    pub fn complete(&self) -> Option<(&str, &str)> {
        match (self.domain.as_deref(), self.api_key.as_deref()) {
            (Some(domain), Some(api_key)) => Some((domain, api_key)),
            _ => None,
        }
    }
}

fn non_empty(value: Option<Value>) -> Option<String> {
    value
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
