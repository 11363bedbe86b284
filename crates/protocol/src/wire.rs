//! Serde helpers for quirks of the stored representation.
//!
//! The realtime database does not keep arrays as arrays: removing an
//! element can leave `null` holes, and sparse arrays come back as objects
//! keyed by index. Dates written by form inputs may be empty strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::board::TaskMap;
use crate::error::{ProtocolError, Result};
use crate::task::{Subtask, Task, TaskId};

/// `Option<NaiveDate>` as `"YYYY-MM-DD"`, reading `""` as `None`.
pub(crate) mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub(crate) fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(&date.format(FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Sparse<T> {
    List(Vec<Option<T>>),
    Keyed(BTreeMap<String, Option<T>>),
}

/// Reads an array that may contain `null` holes or arrive as an
/// index-keyed object, keeping element order and dropping holes.
pub(crate) fn sparse_seq<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = match Option::<Sparse<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Sparse::List(items)) => items.into_iter().flatten().collect(),
        Some(Sparse::Keyed(items)) => {
            let mut indexed: Vec<(usize, T)> = items
                .into_iter()
                .filter_map(|(key, item)| Some((key.parse().ok()?, item?)))
                .collect();
            indexed.sort_by_key(|(index, _)| *index);
            indexed.into_iter().map(|(_, item)| item).collect()
        }
    };
    Ok(items)
}

/// Reads a subtask list like [`sparse_seq`], also dropping entries whose
/// text is blank. Older forms stored those; they are never shown and must
/// not be written back.
pub(crate) fn subtask_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<Subtask>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut subtasks: Vec<Subtask> = sparse_seq(deserializer)?;
    subtasks.retain(|s| !s.text.trim().is_empty());
    Ok(subtasks)
}

/// The result of decoding a whole task collection.
#[derive(Debug, Default)]
pub struct DecodedCollection {
    /// Tasks that decoded successfully, keyed by store id.
    pub tasks: TaskMap,
    /// Records that were skipped, one error each.
    pub rejected: Vec<ProtocolError>,
}

/// Decodes the value returned for the task collection.
///
/// `null` is an empty collection. Records that fail to decode are reported
/// in [`DecodedCollection::rejected`] instead of failing the whole load.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidCollection`] if the value is neither
/// `null` nor an object.
///
/// # Examples
///
/// ```
/// use join_protocol::decode_collection;
/// use serde_json::json;
///
/// let decoded = decode_collection(json!({
///     "-Na": { "title": "ok", "category": "User Story" },
///     "-Nb": { "category": "User Story" }
/// })).unwrap();
/// assert_eq!(decoded.tasks.len(), 1);
/// assert_eq!(decoded.rejected.len(), 1);
///
/// assert!(decode_collection(serde_json::Value::Null).unwrap().tasks.is_empty());
/// ```
pub fn decode_collection(value: Value) -> Result<DecodedCollection> {
    let records = match value {
        Value::Null => return Ok(DecodedCollection::default()),
        Value::Object(records) => records,
        Value::Array(_) => return Err(ProtocolError::InvalidCollection("array")),
        Value::Bool(_) => return Err(ProtocolError::InvalidCollection("boolean")),
        Value::Number(_) => return Err(ProtocolError::InvalidCollection("number")),
        Value::String(_) => return Err(ProtocolError::InvalidCollection("string")),
    };

    let mut decoded = DecodedCollection::default();
    for (key, record) in records {
        if record.is_null() {
            continue;
        }
        let id = TaskId::new(key);
        match Task::from_value(&id, record) {
            Ok(task) => {
                decoded.tasks.insert(id, task);
            }
            Err(err) => decoded.rejected.push(err),
        }
    }
    Ok(decoded)
}
