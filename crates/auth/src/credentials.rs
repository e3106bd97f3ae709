//! Fixed client credential table, parsed once at startup.

use std::collections::HashMap;

use sb_domain::{Error, Result};

/// The `{client_id: client_secret}` table. Immutable for the process
/// lifetime; secrets never leave this struct except to the HMAC layer.
#[derive(Debug, Clone)]
pub struct ClientRegistry {
    clients: HashMap<String, String>,
}

impl ClientRegistry {
    /// Parse the credential table from its JSON-object form.
    pub fn from_json(raw: &str) -> Result<Self> {
        let clients: HashMap<String, String> = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("credential table is not a JSON object: {e}")))?;
        if clients.is_empty() {
            return Err(Error::Config("credential table is empty".into()));
        }
        Ok(Self { clients })
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }

    pub fn secret_for(&self, client_id: &str) -> Option<&str> {
        self.clients.get(client_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
