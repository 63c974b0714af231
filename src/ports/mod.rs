pub mod external_serializer;
pub mod serializer;

pub use external_serializer::{ExternalSerializer, SerializationContext};
pub use serializer::{SerializationError, SerializationResult, SerializerAdapter};
