use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Values that support lookup of a named field, the capability behind
/// [`Reader::prop`](crate::Reader::prop).
///
/// Maps look their keys up and fail when the key is absent. JSON objects
/// behave like the dynamic records they model: an absent key reads as
/// `null`, while `null` itself and scalars have no fields at all.
pub trait Record {
    type Field;

    fn field(&self, name: &str) -> Result<Self::Field>;
}

fn missing(name: &str) -> Error {
    Error::field_access(name, "a map without that key")
}

impl<K, V, S> Record for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: Clone,
    S: BuildHasher,
{
    type Field = V;

    fn field(&self, name: &str) -> Result<V> {
        self.get(name).cloned().ok_or_else(|| missing(name))
    }
}

impl<K, V> Record for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: Clone,
{
    type Field = V;

    fn field(&self, name: &str) -> Result<V> {
        self.get(name).cloned().ok_or_else(|| missing(name))
    }
}

impl<K, V, S> Record for IndexMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: Clone,
    S: BuildHasher,
{
    type Field = V;

    fn field(&self, name: &str) -> Result<V> {
        self.get(name).cloned().ok_or_else(|| missing(name))
    }
}

impl<R: Record> Record for Option<R> {
    type Field = R::Field;

    fn field(&self, name: &str) -> Result<R::Field> {
        match self {
            Some(record) => record.field(name),
            None => Err(Error::field_access(name, "None")),
        }
    }
}

impl<R: Record + ?Sized> Record for Arc<R> {
    type Field = R::Field;

    fn field(&self, name: &str) -> Result<R::Field> {
        (**self).field(name)
    }
}

#[cfg(feature = "json")]
impl Record for serde_json::Value {
    type Field = serde_json::Value;

    fn field(&self, name: &str) -> Result<serde_json::Value> {
        use serde_json::Value;

        match self {
            Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
            Value::Array(items) => Ok(name
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index).cloned())
                .unwrap_or(Value::Null)),
            Value::Null => Err(Error::field_access(name, "null")),
            Value::Bool(_) => Err(Error::field_access(name, "a boolean")),
            Value::Number(_) => Err(Error::field_access(name, "a number")),
            Value::String(_) => Err(Error::field_access(name, "a string")),
        }
    }
}
