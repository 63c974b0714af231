use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use thiserror::Error;

use crate::{
    adapters::serializers::{
        ArraySerializerAdapter, ExternalSerializerAdapter, JsonEncodeSerializerAdapter,
        JsonGroupEncodeSerializerAdapter,
    },
    config::serializer_names,
    ports::{external_serializer::ExternalSerializer, serializer::SerializerAdapter},
};

/// Registry key under which the `external` adapter looks up its serializer.
pub const EXTERNAL_SERIALIZER_SERVICE: &str = "external_serializer";

/// Error raised when a serializer token cannot be turned into an adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FactoryError {
    #[error("Unknown serializer '{0}'")]
    UnknownSerializer(String),

    #[error("Service '{name}' is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("Serializer '{serializer}' requires service '{service}'")]
    MissingService {
        serializer: String,
        service: &'static str,
    },
}

/// Result type alias for adapter resolution
pub type FactoryResult<T> = Result<T, FactoryError>;

type Service = Arc<dyn Any + Send + Sync>;

/// Named services available to the factory, fixed once the pipeline is built.
///
/// Entries are type-erased; the factory checks their type when it reads them.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Service>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an arbitrary service value under `name`.
    pub fn register<T: Any + Send + Sync>(&mut self, name: impl Into<String>, service: T) {
        self.services.insert(name.into(), Arc::new(service));
    }

    /// Register a custom adapter, selectable by `name` as a serializer token.
    pub fn register_serializer(
        &mut self,
        name: impl Into<String>,
        adapter: Arc<dyn SerializerAdapter>,
    ) {
        self.register(name, adapter);
    }

    /// Register the serializer behind the built-in `external` token.
    pub fn register_external_serializer(&mut self, serializer: Arc<dyn ExternalSerializer>) {
        self.register(EXTERNAL_SERIALIZER_SERVICE, serializer);
    }

    pub fn with_serializer(
        mut self,
        name: impl Into<String>,
        adapter: Arc<dyn SerializerAdapter>,
    ) -> Self {
        self.register_serializer(name, adapter);
        self
    }

    pub fn with_external_serializer(mut self, serializer: Arc<dyn ExternalSerializer>) -> Self {
        self.register_external_serializer(serializer);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ServiceRegistry")
            .field("services", &names)
            .finish()
    }
}

/// Resolves serializer tokens into adapters.
///
/// Built-in tokens win over registry entries of the same name.
#[derive(Debug, Clone)]
pub struct SerializerAdapterFactory {
    default_serializer: String,
    registry: ServiceRegistry,
}

impl SerializerAdapterFactory {
    pub fn new(default_serializer: impl Into<String>, registry: ServiceRegistry) -> Self {
        Self {
            default_serializer: default_serializer.into(),
            registry,
        }
    }

    pub fn default_serializer(&self) -> &str {
        &self.default_serializer
    }

    /// Build the adapter for `name`, or for the default token when `None`.
    pub fn create(&self, name: Option<&str>) -> FactoryResult<Arc<dyn SerializerAdapter>> {
        let name = name.unwrap_or(&self.default_serializer);

        match name {
            serializer_names::JSON_ENCODE => Ok(Arc::new(JsonEncodeSerializerAdapter)),
            serializer_names::JSON_GROUP_ENCODE => Ok(Arc::new(JsonGroupEncodeSerializerAdapter)),
            serializer_names::ARRAY => Ok(Arc::new(ArraySerializerAdapter)),
            serializer_names::EXTERNAL => self.external(name),
            custom => self.custom(custom),
        }
    }

    fn external(&self, name: &str) -> FactoryResult<Arc<dyn SerializerAdapter>> {
        let service = self
            .registry
            .get(EXTERNAL_SERIALIZER_SERVICE)
            .ok_or_else(|| FactoryError::MissingService {
                serializer: name.to_string(),
                service: EXTERNAL_SERIALIZER_SERVICE,
            })?;

        let serializer = service
            .downcast_ref::<Arc<dyn ExternalSerializer>>()
            .ok_or_else(|| FactoryError::TypeMismatch {
                name: EXTERNAL_SERIALIZER_SERVICE.to_string(),
                expected: "ExternalSerializer",
            })?;

        Ok(Arc::new(ExternalSerializerAdapter::new(serializer.clone())))
    }

    fn custom(&self, name: &str) -> FactoryResult<Arc<dyn SerializerAdapter>> {
        let service = self
            .registry
            .get(name)
            .ok_or_else(|| FactoryError::UnknownSerializer(name.to_string()))?;

        service
            .downcast_ref::<Arc<dyn SerializerAdapter>>()
            .cloned()
            .ok_or_else(|| FactoryError::TypeMismatch {
                name: name.to_string(),
                expected: "SerializerAdapter",
            })
    }
}
