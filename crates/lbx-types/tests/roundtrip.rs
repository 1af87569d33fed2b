use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use lbx_types::{Account, FieldType, ItemField, LogEvent, Storable, Vault, VaultItem};
use proptest::prelude::*;

fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).single().unwrap_or_default())
}

fn field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Text),
        Just(FieldType::Password),
        Just(FieldType::Username),
        Just(FieldType::Email),
        Just(FieldType::Url),
        Just(FieldType::Totp),
        Just(FieldType::Note),
    ]
}

fn item() -> impl Strategy<Value = VaultItem> {
    (
        "[a-z0-9-]{1,12}",
        ".{0,16}",
        prop::collection::vec((".{0,8}", ".{0,24}", field_type()), 0..4),
        prop::collection::vec("[a-z]{1,6}", 0..3),
    )
        .prop_map(|(id, name, fields, tags)| VaultItem {
            id,
            name,
            fields: fields
                .into_iter()
                .map(|(name, value, field_type)| ItemField {
                    name,
                    value,
                    field_type,
                })
                .collect(),
            tags,
        })
}

fn account() -> impl Strategy<Value = Account> {
    (
        "[a-z0-9-]{1,20}",
        ".{0,20}",
        ".{0,20}",
        timestamp(),
        timestamp(),
        prop::collection::vec("[a-z0-9]{1,8}", 0..5),
        any::<bool>(),
    )
        .prop_map(|(id, email, name, created, updated, vaults, locked)| Account {
            id,
            email,
            name,
            created,
            updated,
            vaults,
            locked,
        })
}

fn vault() -> impl Strategy<Value = Vault> {
    (
        "[a-z0-9-]{1,20}",
        ".{0,20}",
        "[a-z0-9-]{1,20}",
        any::<u64>(),
        timestamp(),
        prop::collection::vec(item(), 0..4),
    )
        .prop_map(|(id, name, owner, revision, updated, items)| Vault {
            id,
            name,
            owner,
            revision,
            updated,
            items,
        })
}

fn log_event() -> impl Strategy<Value = LogEvent> {
    (
        "[a-z0-9-]{1,20}",
        "[a-z.]{1,16}",
        timestamp(),
        prop::collection::btree_map("[a-z]{1,8}", ".{0,12}", 0..4),
    )
        .prop_map(|(id, event_type, time, context): (_, _, _, BTreeMap<_, _>)| LogEvent {
            id,
            event_type,
            time,
            context,
        })
}

fn rebuilt<T: Storable + Default>(value: &T) -> T {
    let mut fresh = T::default();
    fresh.from_raw(value.to_raw().unwrap()).unwrap();
    fresh
}

proptest! {
    #[test]
    fn account_survives_raw_conversion(account in account()) {
        prop_assert_eq!(rebuilt(&account), account);
    }

    #[test]
    fn vault_survives_raw_conversion(vault in vault()) {
        prop_assert_eq!(rebuilt(&vault), vault);
    }

    #[test]
    fn log_event_survives_raw_conversion(event in log_event()) {
        prop_assert_eq!(rebuilt(&event), event);
    }
}
