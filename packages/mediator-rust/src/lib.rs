//! Callout mediator: a synchronous outbound-call step for a message pipeline.
//!
//! A [`CalloutMediator`] selects a request payload from the inbound message,
//! resolves the target endpoint, performs a blocking call through a
//! [`Transport`], and either stamps a uniform fault property set or merges the
//! response back into the message.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod fault;
pub mod invoke;
pub mod mediator;
pub mod merge;
pub mod payload;
pub mod sequence;
pub mod settings;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{
    EndpointTarget, MediatorConfig, MediatorConfigBuilder, SecurityPolicy, SourcePolicy,
    TargetPolicy, TransportBootstrap, DEFAULT_CLIENT_REPO, DEFAULT_TRANSPORT_CONFIG,
};
pub use endpoint::{
    Endpoint, EndpointDefinition, EndpointKind, EndpointRegistry, EndpointResolver,
    InMemoryEndpointRegistry,
};
pub use error::{
    CalloutFailure, ConfigError, ExtractionFault, MediationError, ResponseFault, TransportFault,
};
pub use fault::{FaultDetail, FaultNormalizer, CALLOUT_OPERATION_FAILED, DEFAULT_ERROR_MESSAGE};
pub use invoke::{Exchange, Invocation};
pub use mediator::CalloutMediator;
pub use merge::ResponseMerger;
pub use payload::PayloadSelector;
pub use sequence::{Mediator, MediatorEnvironment, Sequence};
pub use settings::{
    resolve_placeholders, EnvSettings, PlaceholderResolution, ProcessSettings, StaticSettings,
    SYSTEM_PROPERTY_PREFIX,
};
pub use telemetry::{init_tracing, LogFormat};
pub use transport::Transport;
