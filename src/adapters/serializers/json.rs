use super::{encode, walk};
use crate::{
    core::data::Data,
    ports::serializer::{SerializationResult, SerializerAdapter},
};

/// `json_encode`: structural JSON; objects answer through their plain capability.
///
/// Groups are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncodeSerializerAdapter;

impl JsonEncodeSerializerAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SerializerAdapter for JsonEncodeSerializerAdapter {
    fn serialize(&self, data: &Data, _groups: Option<&[String]>) -> SerializationResult<String> {
        let value = walk(data, &|object| object.json_serialize())?;
        encode(&value)
    }
}
