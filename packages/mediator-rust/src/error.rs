//! Error taxonomy for the callout mediator.
//!
//! Internal steps return the narrow error they can produce
//! ([`ConfigError`], [`ExtractionFault`], [`CalloutFailure`]); the mediator
//! boundary collapses them into [`MediationError`].

use std::path::PathBuf;

use callout_core::{ErrorValue, SoapFault, XPathError};

/// Malformed or missing configuration. Detected at build/init time, except
/// for an unknown lookup key which is only detectable per call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {role} expression")]
    InvalidXPath {
        role: &'static str,
        #[source]
        source: XPathError,
    },
    #[error("a policy key is required to enable security")]
    MissingPolicyKey,
    #[error("invalid repository path: {}", .0.display())]
    InvalidRepository(PathBuf),
    #[error("invalid transport config path: {}", .0.display())]
    InvalidTransportConfig(PathBuf),
    #[error("no endpoint registered under key `{key}`")]
    UnknownEndpoint { key: String },
    #[error("callout mediator used before init")]
    NotInitialized,
}

/// A source or target expression/key failed to yield a usable element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionFault {
    #[error("the property `{key}` is not an XML element")]
    NotAnElement { key: String },
    #[error("evaluation of the source expression `{expression}` did not result in an element")]
    SourceNotAnElement { expression: String },
    #[error("evaluation of the target expression `{expression}` did not yield an element")]
    TargetNotAnElement { expression: String },
    #[error("target expression `{expression}` selects the envelope root, which cannot be replaced")]
    TargetIsRoot { expression: String },
    #[error("response body carries no element to merge")]
    EmptyResponse,
}

/// The transport failed the call.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportFault {
    /// Transport-level description of the failure.
    pub message: String,
    /// Protocol fault decoded by the transport, if any.
    pub fault: Option<SoapFault>,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl TransportFault {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fault: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_fault(mut self, fault: SoapFault) -> Self {
        self.fault = Some(fault);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }
}

/// The response envelope itself carries a protocol fault.
#[derive(Debug, Clone, thiserror::Error)]
#[error("response carried a protocol fault: {}", .fault.reason.as_deref().unwrap_or("no reason given"))]
pub struct ResponseFault {
    pub fault: SoapFault,
}

/// Anything that routes through fault normalization.
#[derive(Debug, thiserror::Error)]
pub enum CalloutFailure {
    #[error(transparent)]
    Transport(#[from] TransportFault),
    #[error(transparent)]
    Response(#[from] ResponseFault),
    /// The transport flagged its response as a sender error and attached the
    /// underlying error value.
    #[error("transport reported a sender error: {0}")]
    Sender(ErrorValue),
}

impl CalloutFailure {
    /// The protocol fault behind this failure, if there is one.
    #[must_use]
    pub fn soap_fault(&self) -> Option<&SoapFault> {
        match self {
            CalloutFailure::Transport(t) => t.fault.as_ref(),
            CalloutFailure::Response(r) => Some(&r.fault),
            CalloutFailure::Sender(_) => None,
        }
    }
}

/// The single failure type surfaced by the mediator.
#[derive(Debug, thiserror::Error)]
pub enum MediationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Extraction(#[from] ExtractionFault),
    #[error("error initializing callout mediator")]
    Init(#[source] TransportFault),
    /// Uniform callout failure. `source` is the same value stamped under
    /// `ERROR_EXCEPTION` on the message.
    #[error("error while performing the callout operation against {endpoint}")]
    CalloutFailed {
        endpoint: String,
        #[source]
        source: ErrorValue,
    },
}

impl MediationError {
    /// The typed failure behind a `CalloutFailed`, when it originated here.
    #[must_use]
    pub fn callout_failure(&self) -> Option<&CalloutFailure> {
        match self {
            MediationError::CalloutFailed { source, .. } => source.error().downcast_ref(),
            _ => None,
        }
    }
}
