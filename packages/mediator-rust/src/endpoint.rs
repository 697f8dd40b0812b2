//! Endpoints, the endpoint registry and endpoint resolution.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use callout_core::{keys, Message};
use dashmap::DashMap;
use tracing::debug;

use crate::config::{EndpointTarget, MediatorConfig, SecurityPolicy};
use crate::error::ConfigError;
use crate::settings::{resolve_placeholders, PlaceholderResolution, ProcessSettings};

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// How an endpoint came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Synthesized from a fixed address.
    Address,
    /// Synthesized; sends to the message's destination header.
    Default,
    /// Declared elsewhere (embedded in config or held by a registry).
    Declared,
}

/// Call-relevant settings of an endpoint.
#[derive(Debug)]
pub struct EndpointDefinition {
    address: Option<String>,
    security: SecurityPolicy,
    use_mtom: AtomicBool,
}

impl EndpointDefinition {
    fn new(address: Option<String>) -> Self {
        Self {
            address,
            security: SecurityPolicy::Off,
            use_mtom: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    #[must_use]
    pub fn security(&self) -> &SecurityPolicy {
        &self.security
    }

    #[must_use]
    pub fn use_mtom(&self) -> bool {
        self.use_mtom.load(Ordering::Relaxed)
    }

    /// Switches attachment optimization on. Never switched back off.
    pub fn enable_mtom(&self) {
        self.use_mtom.store(true, Ordering::Relaxed);
    }
}

/// A call target. Shared as `Arc<Endpoint>`; the only mutable state is the
/// attachment optimization flag.
#[derive(Debug)]
pub struct Endpoint {
    name: Option<String>,
    kind: EndpointKind,
    definition: EndpointDefinition,
}

impl Endpoint {
    /// A declared endpoint with a name and a fixed address.
    #[must_use]
    pub fn declared(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: EndpointKind::Declared,
            definition: EndpointDefinition::new(Some(address.into())),
        }
    }

    /// An anonymous endpoint for a fixed address.
    #[must_use]
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            name: None,
            kind: EndpointKind::Address,
            definition: EndpointDefinition::new(Some(address.into())),
        }
    }

    /// An anonymous endpoint that follows the message's destination header.
    #[must_use]
    pub fn default_endpoint() -> Self {
        Self {
            name: None,
            kind: EndpointKind::Default,
            definition: EndpointDefinition::new(None),
        }
    }

    /// Builder-style security attachment.
    #[must_use]
    pub fn with_security(mut self, security: SecurityPolicy) -> Self {
        self.definition.security = security;
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    /// `true` for endpoints this crate created from configuration.
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.kind != EndpointKind::Declared
    }

    #[must_use]
    pub fn definition(&self) -> &EndpointDefinition {
        &self.definition
    }

    /// Address a message is sent to: the fixed address, or the message's
    /// destination header for a default endpoint.
    #[must_use]
    pub fn target_address<'a>(&'a self, message: &'a Message) -> Option<&'a str> {
        self.definition.address().or_else(|| message.to())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, self.definition.address()) {
            (Some(name), _) => f.write_str(name),
            (None, Some(address)) => f.write_str(address),
            (None, None) => f.write_str("<destination header>"),
        }
    }
}

// ---------------------------------------------------------------------------
// EndpointRegistry
// ---------------------------------------------------------------------------

/// Keyed lookup of declared endpoints.
pub trait EndpointRegistry: Send + Sync {
    fn endpoint(&self, key: &str) -> Option<Arc<Endpoint>>;
}

/// Concurrent in-memory registry.
#[derive(Debug, Default)]
pub struct InMemoryEndpointRegistry {
    endpoints: DashMap<String, Arc<Endpoint>>,
}

impl InMemoryEndpointRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces the endpoint under `key`.
    pub fn register(&self, key: impl Into<String>, endpoint: Arc<Endpoint>) -> Option<Arc<Endpoint>> {
        self.endpoints.insert(key.into(), endpoint)
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.remove(key).map(|(_, endpoint)| endpoint)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl EndpointRegistry for InMemoryEndpointRegistry {
    fn endpoint(&self, key: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.get(key).map(|entry| entry.value().clone())
    }
}

// ---------------------------------------------------------------------------
// EndpointResolver
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Resolved {
    Fixed(Arc<Endpoint>),
    Lookup(String),
}

/// Picks the endpoint for each call.
///
/// Built once at init: fixed addresses have their placeholders substituted
/// and, like the default endpoint, get the configured security attached.
/// Keyed lookups are deferred to call time.
#[derive(Debug)]
pub struct EndpointResolver {
    resolved: Resolved,
    placeholders: Option<PlaceholderResolution>,
}

impl EndpointResolver {
    #[must_use]
    pub fn new(config: &MediatorConfig, settings: &dyn ProcessSettings) -> Self {
        let mut placeholders = None;
        let resolved = match config.endpoint_target() {
            EndpointTarget::Address(raw) => {
                let resolution = resolve_placeholders(raw, settings);
                let address = resolution.address.clone();
                placeholders = Some(resolution);
                debug!(%address, "using the service URL");
                Resolved::Fixed(Arc::new(
                    Endpoint::address(address).with_security(config.security().clone()),
                ))
            }
            EndpointTarget::Default => {
                debug!("using the destination header as the endpoint reference");
                Resolved::Fixed(Arc::new(
                    Endpoint::default_endpoint().with_security(config.security().clone()),
                ))
            }
            EndpointTarget::Embedded(endpoint) => {
                debug!(endpoint = %endpoint, "using the defined endpoint");
                Resolved::Fixed(Arc::clone(endpoint))
            }
            EndpointTarget::Lookup(key) => Resolved::Lookup(key.clone()),
        };
        Self {
            resolved,
            placeholders,
        }
    }

    /// Outcome of placeholder substitution on a fixed service URL.
    ///
    /// `None` for every other endpoint target.
    #[must_use]
    pub fn placeholders(&self) -> Option<&PlaceholderResolution> {
        self.placeholders.as_ref()
    }

    /// Setting names a fixed service URL referenced but the process did not
    /// provide. Their tokens were left in the address.
    #[must_use]
    pub fn unresolved_placeholders(&self) -> &[String] {
        self.placeholders
            .as_ref()
            .map(|resolution| resolution.unresolved.as_slice())
            .unwrap_or_default()
    }

    /// Endpoint for this call.
    ///
    /// When the inbound message requests attachment optimization and the
    /// endpoint was synthesized, the flag is switched on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEndpoint`] when a lookup key is not in
    /// the registry.
    pub fn resolve(
        &self,
        registry: &dyn EndpointRegistry,
        inbound: &Message,
    ) -> Result<Arc<Endpoint>, ConfigError> {
        let endpoint = match &self.resolved {
            Resolved::Fixed(endpoint) => Arc::clone(endpoint),
            Resolved::Lookup(key) => {
                let endpoint = registry
                    .endpoint(key)
                    .ok_or_else(|| ConfigError::UnknownEndpoint { key: key.clone() })?;
                debug!(key = %key, endpoint = %endpoint, "using the registry endpoint");
                endpoint
            }
        };
        if endpoint.is_synthesized() && inbound.flag(keys::ENABLE_MTOM) {
            endpoint.definition().enable_mtom();
        }
        Ok(endpoint)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
