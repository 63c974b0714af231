use std::sync::Arc;

use crate::{
    core::data::{DEFAULT_GROUP, Data},
    ports::{
        external_serializer::{ExternalSerializer, SerializationContext},
        serializer::{SerializationResult, SerializerAdapter},
    },
};

/// `external`: delegates to an injected [`ExternalSerializer`].
///
/// Null fields are always kept so the envelope keeps both of its keys. When
/// groups are given, [`DEFAULT_GROUP`] is added to them, which keeps ungrouped
/// fields visible alongside the requested ones.
#[derive(Clone)]
pub struct ExternalSerializerAdapter {
    serializer: Arc<dyn ExternalSerializer>,
}

impl ExternalSerializerAdapter {
    pub fn new(serializer: Arc<dyn ExternalSerializer>) -> Self {
        Self { serializer }
    }

    fn context(groups: Option<&[String]>) -> SerializationContext {
        let context = SerializationContext::new().with_serialize_null(true);

        match groups {
            Some(groups) => {
                let mut groups = groups.to_vec();
                if !groups.iter().any(|g| g == DEFAULT_GROUP) {
                    groups.push(DEFAULT_GROUP.to_string());
                }
                context.with_groups(groups)
            }
            None => context,
        }
    }
}

impl SerializerAdapter for ExternalSerializerAdapter {
    fn serialize(&self, data: &Data, groups: Option<&[String]>) -> SerializationResult<String> {
        self.serializer.serialize(data, &Self::context(groups))
    }
}
