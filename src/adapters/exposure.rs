//! Built-in [`ExternalSerializer`] driven by per-field exposure metadata.
//!
//! Objects describe their fields through [`Serializable::exposed_fields`];
//! each field carries its visibility groups. Objects without exposure
//! metadata fall back to their plain capability, then to `{}`.
use crate::{
    adapters::serializers::{encode, walk},
    core::data::{Data, Serializable},
    ports::{
        external_serializer::{ExternalSerializer, SerializationContext},
        serializer::SerializationResult,
    },
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExposureSerializer;

impl ExposureSerializer {
    pub fn new() -> Self {
        Self
    }

    fn expose(object: &dyn Serializable, context: &SerializationContext) -> Option<Data> {
        let Some(fields) = object.exposed_fields() else {
            return object.json_serialize();
        };

        let groups = context.groups.as_deref();
        let entries = fields
            .into_iter()
            .filter(|field| field.is_visible(groups))
            .filter(|field| context.serialize_null || !field.value.is_null())
            .map(|field| (field.name, field.value))
            .collect();

        Some(Data::Map(entries))
    }
}

impl ExternalSerializer for ExposureSerializer {
    fn serialize(&self, data: &Data, context: &SerializationContext) -> SerializationResult<String> {
        let value = walk(data, &|object| Self::expose(object, context))?;
        encode(&value)
    }
}
