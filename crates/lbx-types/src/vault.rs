use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RawError;
use crate::storable::{self, RawObject, Storable};

/// How a field value should be presented and validated by clients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Password,
    Username,
    Email,
    Url,
    Totp,
    Note,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemField {
    pub name: String,
    pub value: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

/// A single entry in a vault.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<ItemField>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl VaultItem {
    pub fn new(name: impl Into<String>, fields: Vec<ItemField>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into(),
            fields,
            tags: Vec::new(),
        }
    }
}

/// A named, owned collection of items.
///
/// `revision` increases on every mutation so clients can detect stale copies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub revision: u64,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<VaultItem>,
}

impl Vault {
    pub const KIND: &'static str = "vault";

    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into(),
            owner: owner.into(),
            revision: 0,
            updated: Utc::now(),
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: VaultItem) {
        self.items.push(item);
        self.touch();
    }

    /// Remove an item by id. Returns the removed item, if any.
    pub fn remove_item(&mut self, item_id: &str) -> Option<VaultItem> {
        let pos = self.items.iter().position(|item| item.id == item_id)?;
        let item = self.items.remove(pos);
        self.touch();
        Some(item)
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.updated = Utc::now();
    }
}

impl Storable for Vault {
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

    fn login_item() -> VaultItem {
        VaultItem::new(
            "Email",
            vec![
                ItemField {
                    name: "username".into(),
                    value: "alice".into(),
                    field_type: FieldType::Username,
                },
                ItemField {
                    name: "password".into(),
                    value: "hunter2".into(),
                    field_type: FieldType::Password,
                },
            ],
        )
    }

    #[test]
    fn mutations_bump_revision() {
        let mut vault = Vault::new("Personal", "acc-1");
        let item = login_item();
        let item_id = item.id.clone();

        vault.add_item(item);
        assert_eq!(vault.revision, 1);

        assert!(vault.remove_item(&item_id).is_some());
        assert_eq!(vault.revision, 2);
        assert!(vault.remove_item(&item_id).is_none());
        assert_eq!(vault.revision, 2);
    }

    #[test]
    fn field_type_serializes_as_type_tag() {
        let mut vault = Vault::new("Personal", "acc-1");
        vault.add_item(login_item());
        let raw = vault.to_raw().unwrap();
        let field = &raw["items"][0]["fields"][1];
        assert_eq!(field["type"], "password");
    }

    #[test]
    fn from_raw_restores_nested_items() {
        let mut vault = Vault::new("Work", "acc-2");
        vault.add_item(login_item());

        let mut restored = Vault::default();
        restored.from_raw(vault.to_raw().unwrap()).unwrap();
        assert_eq!(restored, vault);
    }
}
