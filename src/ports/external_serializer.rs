use crate::{core::data::Data, ports::serializer::SerializationResult};

/// Options passed to an external structured serializer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializationContext {
    /// Groups to expose; `None` disables group filtering.
    pub groups: Option<Vec<String>>,
    /// Keep fields whose value is null instead of omitting them.
    pub serialize_null: bool,
}

impl SerializationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn with_serialize_null(mut self, serialize_null: bool) -> Self {
        self.serialize_null = serialize_null;
        self
    }
}

/// ExternalSerializer defines the port for a third-party structured serializer
/// with its own grouping mechanism.
pub trait ExternalSerializer: Send + Sync {
    /// Serialize `data` to JSON under the given context
    fn serialize(&self, data: &Data, context: &SerializationContext) -> SerializationResult<String>;
}
