use super::{encode, walk};
use crate::{
    core::data::Data,
    ports::serializer::{SerializationResult, SerializerAdapter},
};

/// `array`: objects answer through their array projection; anything that
/// does not implement one is rendered as `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArraySerializerAdapter;

impl ArraySerializerAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SerializerAdapter for ArraySerializerAdapter {
    fn serialize(&self, data: &Data, groups: Option<&[String]>) -> SerializationResult<String> {
        let groups = groups.unwrap_or_default();
        let value = walk(data, &|object| object.array_serialize(groups))?;
        encode(&value)
    }
}
