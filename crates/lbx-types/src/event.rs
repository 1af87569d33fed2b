use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::RawError;
use crate::storable::{self, RawObject, Storable};

/// An audit event recorded in the logging storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Stored as RFC 3339 with all nine fractional digits, so raw values
    /// order chronologically when compared as strings.
    #[serde(with = "fixed_width_time")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl LogEvent {
    pub const KIND: &'static str = "log-event";

    pub fn new(event_type: impl Into<String>, context: BTreeMap<String, String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            event_type: event_type.into(),
            time: Utc::now(),
            context,
        }
    }
}

impl Storable for LogEvent {
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

mod fixed_width_time {
    use super::*;

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}
