//! Forgiving deserializers for answers coming from HTML forms and older content.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Per-item answers sent as a list or as an object keyed by item index (`{"0": ..}`).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Indexed<T>(pub BTreeMap<usize, T>);

impl<T> Indexed<T> {
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.0.get(&idx)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> FromIterator<T> for Indexed<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().enumerate().collect())
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Indexed<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries: Result<BTreeMap<usize, T>, serde_json::Error> =
            match Value::deserialize(deserializer)? {
                Value::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(idx, item)| Ok((idx, T::deserialize(item)?)))
                    .collect(),
                Value::Object(map) => map
                    .into_iter()
                    .filter_map(|(key, item)| key.trim().parse::<usize>().ok().map(|idx| (idx, item)))
                    .map(|(idx, item)| Ok((idx, T::deserialize(item)?)))
                    .collect(),
                Value::Null => Ok(BTreeMap::new()),
                other => {
                    return Err(D::Error::custom(format!(
                        "expected a list or an object, found {other}"
                    )));
                }
            };

        entries.map(Self).map_err(D::Error::custom)
    }
}

/// Option index that may arrive as a number, a numeric string, an empty string or null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LenientIndex(pub Option<i64>);

impl LenientIndex {
    pub fn get(&self) -> Option<i64> {
        self.0
    }

    /// Index usable against a slice of `len` elements.
    pub fn within(&self, len: usize) -> Option<usize> {
        self.0
            .and_then(|idx| usize::try_from(idx).ok())
            .filter(|idx| *idx < len)
    }
}

impl From<Value> for LenientIndex {
    fn from(value: Value) -> Self {
        let idx = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        Self(idx)
    }
}

impl<'de> Deserialize<'de> for LenientIndex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Value::deserialize(deserializer)?.into())
    }
}

pub fn lenient_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(LenientIndex::deserialize(deserializer)?.get())
}

/// Free-text answer; missing values, null and non-strings become empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LenientText(pub String);

impl LenientText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for LenientText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        };
        Ok(Self(text))
    }
}

/// A list of words sent either as an array or as a comma separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WordList(pub Vec<String>);

impl WordList {
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|w| w.trim()).filter(|w| !w.is_empty())
    }
}

impl<'de> Deserialize<'de> for WordList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let words = match Value::deserialize(deserializer)? {
            Value::String(s) => s.split(',').map(|w| w.trim().to_string()).collect(),
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(Self(words))
    }
}
