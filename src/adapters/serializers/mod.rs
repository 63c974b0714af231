//! Built-in [`SerializerAdapter`](crate::ports::SerializerAdapter) implementations.
//!
//! The three JSON adapters share one recursive walk over [`Data`]; they differ
//! only in which [`Serializable`] capability they ask a domain object for.
//! Whatever the capability returns is walked again, so objects may yield
//! further objects.
pub mod array;
pub mod external;
pub mod group_json;
pub mod json;

pub use array::ArraySerializerAdapter;
pub use external::ExternalSerializerAdapter;
pub use group_json::JsonGroupEncodeSerializerAdapter;
pub use json::JsonEncodeSerializerAdapter;
use serde_json::{Map, Number, Value};

use crate::{
    core::data::{Data, Serializable},
    ports::serializer::{SerializationError, SerializationResult},
};

/// Nesting limit for the walk; guards against objects that yield themselves.
pub const MAX_DEPTH: usize = 512;

/// Walk `data` into a JSON value, resolving objects with `resolve`.
///
/// An object for which `resolve` answers `None` becomes `{}` so that "empty
/// object" stays distinguishable from "absent".
pub(crate) fn walk<F>(data: &Data, resolve: &F) -> SerializationResult<Value>
where
    F: Fn(&dyn Serializable) -> Option<Data>,
{
    walk_at(data, resolve, 0)
}

fn walk_at<F>(data: &Data, resolve: &F, depth: usize) -> SerializationResult<Value>
where
    F: Fn(&dyn Serializable) -> Option<Data>,
{
    if depth > MAX_DEPTH {
        return Err(SerializationError::DepthExceeded(MAX_DEPTH));
    }

    let value = match data {
        Data::Null => Value::Null,
        Data::Bool(b) => Value::Bool(*b),
        Data::Int(i) => Value::from(*i),
        Data::UInt(u) => Value::from(*u),
        Data::Float(f) => encode_float(*f)?,
        Data::String(s) => Value::String(s.clone()),
        Data::List(items) => Value::Array(
            items
                .iter()
                .map(|item| walk_at(item, resolve, depth + 1))
                .collect::<SerializationResult<_>>()?,
        ),
        Data::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, item) in entries {
                map.insert(key.clone(), walk_at(item, resolve, depth + 1)?);
            }
            Value::Object(map)
        }
        Data::Object(object) => match resolve(object.as_ref()) {
            Some(inner) => walk_at(&inner, resolve, depth + 1)?,
            None => Value::Object(Map::new()),
        },
    };

    Ok(value)
}

pub(crate) fn encode_float(f: f64) -> SerializationResult<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or(SerializationError::NonFiniteNumber(f))
}

pub(crate) fn encode(value: &Value) -> SerializationResult<String> {
    serde_json::to_string(value).map_err(SerializationError::Encode)
}
