//! Callout mediator configuration.
//!
//! [`MediatorConfigBuilder`] collects settings and validates them once;
//! the resulting [`MediatorConfig`] is immutable.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use callout_core::XPath;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::endpoint::Endpoint;
use crate::error::ConfigError;

/// Client repository used when none is configured.
pub const DEFAULT_CLIENT_REPO: &str = "./repository/deployment/client";

/// Transport configuration file used when none is configured.
pub const DEFAULT_TRANSPORT_CONFIG: &str = "./repository/conf/axis2/axis2_blocking_client.xml";

// ---------------------------------------------------------------------------
// TransportBootstrap
// ---------------------------------------------------------------------------

/// Parameters handed to the transport at init. Opaque to the mediator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportBootstrap {
    /// Client repository directory.
    pub client_repository: Option<PathBuf>,
    /// Transport configuration file.
    pub config_file: Option<PathBuf>,
    /// Name of a server-side configuration to reuse instead of the files above.
    pub use_server_config: Option<String>,
}

impl TransportBootstrap {
    /// The client repository, or [`DEFAULT_CLIENT_REPO`].
    #[must_use]
    pub fn repository_path(&self) -> &Path {
        self.client_repository
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CLIENT_REPO))
    }

    /// The transport configuration file, or [`DEFAULT_TRANSPORT_CONFIG`].
    #[must_use]
    pub fn config_path(&self) -> &Path {
        self.config_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_TRANSPORT_CONFIG))
    }

    /// Checks explicitly configured paths. Defaults are not checked.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(repo) = &self.client_repository {
            if !repo.is_dir() {
                return Err(ConfigError::InvalidRepository(repo.clone()));
            }
        }
        if let Some(file) = &self.config_file {
            if !file.is_file() {
                return Err(ConfigError::InvalidTransportConfig(file.clone()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Where the call goes.
#[derive(Debug, Clone)]
pub enum EndpointTarget {
    /// Fixed address; may contain `{system.prop.*}` placeholders.
    Address(String),
    /// Registry key, resolved on every call.
    Lookup(String),
    /// Endpoint definition carried by the configuration.
    Embedded(Arc<Endpoint>),
    /// Send to the inbound message's destination header.
    Default,
}

/// How the request body is derived from the inbound message.
#[derive(Debug, Clone)]
pub enum SourcePolicy {
    /// Forward the whole envelope.
    Envelope,
    XPath(XPath),
    /// Property (then static entry) holding an element.
    Key(String),
}

/// How the response is written back.
#[derive(Debug, Clone)]
pub enum TargetPolicy {
    /// Replace the selected node with the response's first body element.
    XPath(XPath),
    /// Store the response's first body element as a property.
    Key(String),
    /// Replace the whole inbound envelope.
    ReplaceEnvelope,
}

/// Message-level security attached to synthesized endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityPolicy {
    #[default]
    Off,
    /// One combined policy for both directions.
    Policy(String),
    /// Independent inbound and outbound policies.
    Split {
        inbound: Option<String>,
        outbound: Option<String>,
    },
}

impl SecurityPolicy {
    #[must_use]
    pub fn is_on(&self) -> bool {
        !matches!(self, SecurityPolicy::Off)
    }
}

// ---------------------------------------------------------------------------
// MediatorConfig
// ---------------------------------------------------------------------------

/// Validated, immutable callout configuration.
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    target: EndpointTarget,
    action: Option<String>,
    source: SourcePolicy,
    merge: TargetPolicy,
    security: SecurityPolicy,
    init_client_options: bool,
    bootstrap: TransportBootstrap,
}

impl MediatorConfig {
    #[must_use]
    pub fn builder() -> MediatorConfigBuilder {
        MediatorConfigBuilder::default()
    }

    #[must_use]
    pub fn endpoint_target(&self) -> &EndpointTarget {
        &self.target
    }

    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    #[must_use]
    pub fn source(&self) -> &SourcePolicy {
        &self.source
    }

    #[must_use]
    pub fn target(&self) -> &TargetPolicy {
        &self.merge
    }

    #[must_use]
    pub fn security(&self) -> &SecurityPolicy {
        &self.security
    }

    /// `false` asks the transport to skip its own client-option setup.
    #[must_use]
    pub fn init_client_options(&self) -> bool {
        self.init_client_options
    }

    #[must_use]
    pub fn bootstrap(&self) -> &TransportBootstrap {
        &self.bootstrap
    }

    /// Structured summary for logs and diagnostics.
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let endpoint = match &self.target {
            EndpointTarget::Address(address) => json!({ "serviceURL": address }),
            EndpointTarget::Lookup(key) => json!({ "endpointKey": key }),
            EndpointTarget::Embedded(endpoint) => json!({ "endpoint": endpoint.to_string() }),
            EndpointTarget::Default => json!("default"),
        };
        let source = match &self.source {
            SourcePolicy::Envelope => json!({ "type": "envelope" }),
            SourcePolicy::XPath(xpath) => json!({ "xpath": xpath.as_str() }),
            SourcePolicy::Key(key) => json!({ "key": key }),
        };
        let target = match &self.merge {
            TargetPolicy::XPath(xpath) => json!({ "xpath": xpath.as_str() }),
            TargetPolicy::Key(key) => json!({ "key": key }),
            TargetPolicy::ReplaceEnvelope => json!("envelope"),
        };
        json!({
            "endpoint": endpoint,
            "action": self.action,
            "source": source,
            "target": target,
            "security": self.security,
            "initClientOptions": self.init_client_options,
            "bootstrap": self.bootstrap,
        })
    }
}

impl fmt::Display for MediatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

// ---------------------------------------------------------------------------
// MediatorConfigBuilder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
enum PendingSource {
    #[default]
    Envelope,
    XPath(String),
    Key(String),
}

#[derive(Debug, Clone, Default)]
enum PendingTarget {
    #[default]
    Envelope,
    XPath(String),
    Key(String),
}

/// Collects callout settings. Within each policy group the last call wins.
#[derive(Debug, Clone)]
pub struct MediatorConfigBuilder {
    service_url: Option<String>,
    endpoint_key: Option<String>,
    endpoint: Option<Arc<Endpoint>>,
    action: Option<String>,
    source: PendingSource,
    target: PendingTarget,
    namespaces: Vec<(String, String)>,
    security: SecurityPolicy,
    init_client_options: bool,
    bootstrap: TransportBootstrap,
}

impl Default for MediatorConfigBuilder {
    fn default() -> Self {
        Self {
            service_url: None,
            endpoint_key: None,
            endpoint: None,
            action: None,
            source: PendingSource::default(),
            target: PendingTarget::default(),
            namespaces: Vec::new(),
            security: SecurityPolicy::Off,
            init_client_options: true,
            bootstrap: TransportBootstrap::default(),
        }
    }
}

impl MediatorConfigBuilder {
    #[must_use]
    pub fn service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn endpoint_key(mut self, key: impl Into<String>) -> Self {
        self.endpoint_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: Arc<Endpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn source_envelope(mut self) -> Self {
        self.source = PendingSource::Envelope;
        self
    }

    #[must_use]
    pub fn source_xpath(mut self, expression: impl Into<String>) -> Self {
        self.source = PendingSource::XPath(expression.into());
        self
    }

    #[must_use]
    pub fn source_key(mut self, key: impl Into<String>) -> Self {
        self.source = PendingSource::Key(key.into());
        self
    }

    #[must_use]
    pub fn target_xpath(mut self, expression: impl Into<String>) -> Self {
        self.target = PendingTarget::XPath(expression.into());
        self
    }

    #[must_use]
    pub fn target_key(mut self, key: impl Into<String>) -> Self {
        self.target = PendingTarget::Key(key.into());
        self
    }

    /// Binds a prefix for the source and target expressions.
    #[must_use]
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }

    #[must_use]
    pub fn security_policy(mut self, key: impl Into<String>) -> Self {
        self.security = SecurityPolicy::Policy(key.into());
        self
    }

    #[must_use]
    pub fn security_split(mut self, inbound: Option<String>, outbound: Option<String>) -> Self {
        self.security = SecurityPolicy::Split { inbound, outbound };
        self
    }

    #[must_use]
    pub fn init_client_options(mut self, enabled: bool) -> Self {
        self.init_client_options = enabled;
        self
    }

    #[must_use]
    pub fn client_repository(mut self, path: impl Into<PathBuf>) -> Self {
        self.bootstrap.client_repository = Some(path.into());
        self
    }

    #[must_use]
    pub fn transport_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.bootstrap.config_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn use_server_config(mut self, name: impl Into<String>) -> Self {
        self.bootstrap.use_server_config = Some(name.into());
        self
    }

    /// Validates and freezes the configuration.
    ///
    /// Endpoint priority is fixed address, then lookup key, then embedded
    /// endpoint, then the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an expression outside the supported
    /// subset, a split security policy with neither key, or a configured
    /// bootstrap path that does not exist with the expected kind.
    pub fn build(self) -> Result<MediatorConfig, ConfigError> {
        let target = if let Some(url) = self.service_url {
            EndpointTarget::Address(url)
        } else if let Some(key) = self.endpoint_key {
            EndpointTarget::Lookup(key)
        } else if let Some(endpoint) = self.endpoint {
            EndpointTarget::Embedded(endpoint)
        } else {
            EndpointTarget::Default
        };

        let source = match self.source {
            PendingSource::Envelope => SourcePolicy::Envelope,
            PendingSource::XPath(expr) => {
                SourcePolicy::XPath(compile(&expr, &self.namespaces, "source")?)
            }
            PendingSource::Key(key) => SourcePolicy::Key(key),
        };
        let merge = match self.target {
            PendingTarget::Envelope => TargetPolicy::ReplaceEnvelope,
            PendingTarget::XPath(expr) => {
                TargetPolicy::XPath(compile(&expr, &self.namespaces, "target")?)
            }
            PendingTarget::Key(key) => TargetPolicy::Key(key),
        };

        if let SecurityPolicy::Split {
            inbound: None,
            outbound: None,
        } = self.security
        {
            return Err(ConfigError::MissingPolicyKey);
        }

        self.bootstrap.validate()?;

        Ok(MediatorConfig {
            target,
            action: self.action,
            source,
            merge,
            security: self.security,
            init_client_options: self.init_client_options,
            bootstrap: self.bootstrap,
        })
    }
}

fn compile(
    expression: &str,
    namespaces: &[(String, String)],
    role: &'static str,
) -> Result<XPath, ConfigError> {
    XPath::compile_with_namespaces(expression, namespaces.iter().cloned())
        .map_err(|source| ConfigError::InvalidXPath { role, source })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
