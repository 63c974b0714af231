//! In-memory values handed to serializer adapters.
//!
//! [`Data`] is a JSON-shaped tree with one extra variant: [`Data::Object`], a
//! domain object that decides for itself how it is exposed on the wire. The
//! decision is made through the [`Serializable`] capability probes; an adapter
//! asks for the capability it understands and falls back to an empty object
//! (`{}`) when the probe answers `None`.
use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::ports::serializer::{SerializationError, SerializationResult};

/// Group name implied by a field that declares no groups.
pub const DEFAULT_GROUP: &str = "Default";

/// Value tree walked by the serializer adapters.
#[derive(Clone, Debug, Default)]
pub enum Data {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<Data>),
    /// Keyed container; insertion order is preserved on the wire.
    Map(Vec<(String, Data)>),
    Object(Arc<dyn Serializable>),
}

impl Data {
    /// Wrap a domain object.
    pub fn object<T: Serializable + 'static>(object: T) -> Self {
        Data::Object(Arc::new(object))
    }

    /// Build a keyed container from `(key, value)` pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Data>,
        I: IntoIterator<Item = (K, V)>,
    {
        Data::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an ordered container.
    pub fn list<V, I>(values: I) -> Self
    where
        V: Into<Data>,
        I: IntoIterator<Item = V>,
    {
        Data::List(values.into_iter().map(Into::into).collect())
    }

    /// Convert any `serde::Serialize` value, relying on its own serde contract.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> SerializationResult<Self> {
        serde_json::to_value(value)
            .map(Data::from)
            .map_err(SerializationError::Encode)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    /// Look up a key in a [`Data::Map`].
    pub fn get(&self, key: &str) -> Option<&Data> {
        match self {
            Data::Map(entries) => entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Data {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Data::Null,
            Value::Bool(b) => Data::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Data::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Data::UInt(u)
                } else {
                    Data::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Data::String(s),
            Value::Array(values) => Data::List(values.into_iter().map(Data::from).collect()),
            Value::Object(map) => Data::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<bool> for Data {
    fn from(value: bool) -> Self {
        Data::Bool(value)
    }
}

impl From<i32> for Data {
    fn from(value: i32) -> Self {
        Data::Int(value.into())
    }
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Int(value)
    }
}

impl From<u32> for Data {
    fn from(value: u32) -> Self {
        Data::UInt(value.into())
    }
}

impl From<u64> for Data {
    fn from(value: u64) -> Self {
        Data::UInt(value)
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Float(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::String(value.to_string())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::String(value)
    }
}

impl From<Vec<Data>> for Data {
    fn from(values: Vec<Data>) -> Self {
        Data::List(values)
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    fn from(value: Option<T>) -> Self {
        value.map_or(Data::Null, Into::into)
    }
}

impl From<Arc<dyn Serializable>> for Data {
    fn from(object: Arc<dyn Serializable>) -> Self {
        Data::Object(object)
    }
}

/// Capability probes for domain objects.
///
/// Each probe answers `None` when the object does not offer that capability.
/// Returned values are walked again by the adapter, so they may contain
/// further [`Data::Object`]s.
pub trait Serializable: fmt::Debug + Send + Sync {
    /// Plain serialization; groups do not apply.
    fn json_serialize(&self) -> Option<Data> {
        None
    }

    /// Serialization filtered by the active groups.
    fn json_group_serialize(&self, _groups: &[String]) -> Option<Data> {
        None
    }

    /// Array projection filtered by the active groups.
    fn array_serialize(&self, _groups: &[String]) -> Option<Data> {
        None
    }

    /// Field metadata consumed by an external structured serializer.
    fn exposed_fields(&self) -> Option<Vec<ExposedField>> {
        None
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// One field of a domain object as seen by an external serializer.
#[derive(Clone, Debug)]
pub struct ExposedField {
    pub name: String,
    pub value: Data,
    /// Visibility groups; empty means the [`DEFAULT_GROUP`].
    pub groups: Vec<String>,
}

impl ExposedField {
    pub fn new(name: impl Into<String>, value: impl Into<Data>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            groups: Vec::new(),
        }
    }

    /// Restrict the field to the given groups.
    pub fn in_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the field is visible for the requested groups.
    ///
    /// `None` means no group filter at all.
    pub fn is_visible(&self, requested: Option<&[String]>) -> bool {
        let Some(requested) = requested else {
            return true;
        };

        if self.groups.is_empty() {
            return requested.iter().any(|g| g == DEFAULT_GROUP);
        }

        self.groups.iter().any(|g| requested.contains(g))
    }
}
