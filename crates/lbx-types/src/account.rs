use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RawError;
use crate::storable::{self, RawObject, Storable};

/// A user account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Ids of the vaults this account can access.
    #[serde(default)]
    pub vaults: Vec<String>,
    #[serde(default)]
    pub locked: bool,
}

impl Account {
    pub const KIND: &'static str = "account";

    /// Create a fresh account with a new UUID v7 id.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            email: email.into(),
            name: name.into(),
            created: now,
            updated: now,
            vaults: Vec::new(),
            locked: false,
        }
    }

    /// Grant access to a vault. Duplicate grants are ignored.
    pub fn add_vault(&mut self, vault_id: impl Into<String>) {
        let vault_id = vault_id.into();
        if !self.vaults.contains(&vault_id) {
            self.vaults.push(vault_id);
            self.updated = Utc::now();
        }
    }
}

impl Storable for Account {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn to_raw(&self) -> Result<RawObject, RawError> {
        storable::to_raw(self)
    }

    fn from_raw(&mut self, raw: RawObject) -> Result<(), RawError> {
        *self = storable::from_raw(Self::KIND, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_unique_id() {
        let a = Account::new("a@example.com", "A");
        let b = Account::new("a@example.com", "A");
        assert_ne!(a.id, b.id);
        assert_eq!(a.created, a.updated);
    }

    #[test]
    fn add_vault_is_deduplicated() {
        let mut account = Account::new("a@example.com", "A");
        account.add_vault("v1");
        account.add_vault("v1");
        account.add_vault("v2");
        assert_eq!(account.vaults, vec!["v1".to_string(), "v2".to_string()]);
    }

    #[test]
    fn raw_uses_camel_case_keys() {
        let account = Account::new("a@example.com", "A");
        let raw = account.to_raw().unwrap();
        assert!(raw.contains_key("email"));
        assert!(raw.contains_key("created"));
        assert_eq!(raw.len(), 7);
    }
}
