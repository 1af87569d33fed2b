//! Backend-neutral list options.
//!
//! Every backend interprets [`ListOptions`] the same way: keep records whose
//! top-level fields equal every filter, order them, then skip `offset` and
//! take at most `limit`. Backends without native query support call
//! [`ListOptions::apply`] on the records of one kind.

use std::cmp::Ordering;

use lbx_types::RawObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Equality constraint on a top-level raw field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Filtering, ordering and pagination for `list`.
///
/// Without `order_by`, records are ordered by id. With it, records lacking
/// the field sort first and ties are broken by id, so results are stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOptions {
    pub offset: usize,
    pub limit: Option<usize>,
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<String>,
    pub direction: SortDirection,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(field.into());
        self.direction = direction;
        self
    }

    /// Returns `true` if `raw` satisfies every filter.
    pub fn matches(&self, raw: &RawObject) -> bool {
        self.filters
            .iter()
            .all(|f| raw.get(&f.field) == Some(&f.value))
    }

    /// Filter, order and paginate `(id, record)` pairs of a single kind.
    pub fn apply<I>(&self, records: I) -> Vec<RawObject>
    where
        I: IntoIterator<Item = (String, RawObject)>,
    {
        let mut selected: Vec<(String, RawObject)> = records
            .into_iter()
            .filter(|(_, raw)| self.matches(raw))
            .collect();

        selected.sort_by(|(a_id, a), (b_id, b)| {
            let by_field = match &self.order_by {
                Some(field) => compare_values(a.get(field), b.get(field)),
                None => Ordering::Equal,
            };
            let by_field = match self.direction {
                SortDirection::Ascending => by_field,
                SortDirection::Descending => by_field.reverse(),
            };
            by_field.then_with(|| a_id.cmp(b_id))
        });

        selected
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .map(|(_, raw)| raw)
            .collect()
    }
}

/// Total order over optional JSON values:
/// missing < null < bool < number < string < array < object.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_)) => 5,
            Some(Value::Object(_)) => 6,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => {
                    let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
                    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                }
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x @ Value::Array(_)), Some(y @ Value::Array(_)))
        | (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
