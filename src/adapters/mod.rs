pub mod exposure;
pub mod factory;
pub mod middleware;
pub mod security;
pub mod serializers;

/// Re-export commonly used types from adapters
pub use exposure::ExposureSerializer;
pub use factory::{
    EXTERNAL_SERIALIZER_SERVICE, FactoryError, FactoryResult, SerializerAdapterFactory,
    ServiceRegistry,
};
pub use middleware::*;
pub use security::{AccessDeniedHandler, AuthenticationEntryPoint};
