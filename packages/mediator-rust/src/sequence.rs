//! The mediator lifecycle trait and ordered sequences of mediators.

use std::fmt;
use std::sync::Arc;

use callout_core::Message;
use tracing::{debug, warn};

use crate::endpoint::{EndpointRegistry, InMemoryEndpointRegistry};
use crate::error::MediationError;
use crate::settings::{EnvSettings, ProcessSettings};

// ---------------------------------------------------------------------------
// MediatorEnvironment
// ---------------------------------------------------------------------------

/// Host services handed to mediators at init.
#[derive(Clone)]
pub struct MediatorEnvironment {
    pub settings: Arc<dyn ProcessSettings>,
    pub registry: Arc<dyn EndpointRegistry>,
}

impl MediatorEnvironment {
    #[must_use]
    pub fn new(settings: Arc<dyn ProcessSettings>, registry: Arc<dyn EndpointRegistry>) -> Self {
        Self { settings, registry }
    }
}

impl Default for MediatorEnvironment {
    /// Process environment settings and an empty registry.
    fn default() -> Self {
        Self::new(Arc::new(EnvSettings), Arc::new(InMemoryEndpointRegistry::new()))
    }
}

impl fmt::Debug for MediatorEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediatorEnvironment").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Mediator trait
// ---------------------------------------------------------------------------

/// One step of a mediation pipeline.
///
/// Mediators are initialized once before the first message, may then be
/// called concurrently from many threads, and are destroyed once at the end.
pub trait Mediator: Send + Sync {
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// A failed init is fatal to the mediator.
    fn init(&mut self, env: &MediatorEnvironment) -> Result<(), MediationError>;

    /// Processes one message. `Ok(false)` stops the enclosing sequence.
    ///
    /// # Errors
    ///
    /// Returns [`MediationError`] when the message cannot be processed.
    fn mediate(&self, message: &mut Message) -> Result<bool, MediationError>;

    fn destroy(&mut self);
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

/// Ordered list of mediators with an optional fault sequence.
///
/// Mediators are initialized in registration order and destroyed in reverse
/// order. When a mediator fails, the fault sequence runs on the same message
/// and the original error is returned.
pub struct Sequence {
    name: String,
    mediators: Vec<Box<dyn Mediator>>,
    fault_sequence: Option<Box<Sequence>>,
}

impl Sequence {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mediators: Vec::new(),
            fault_sequence: None,
        }
    }

    /// Builder-style append.
    #[must_use]
    pub fn with(mut self, mediator: impl Mediator + 'static) -> Self {
        self.push(Box::new(mediator));
        self
    }

    pub fn push(&mut self, mediator: Box<dyn Mediator>) {
        self.mediators.push(mediator);
    }

    #[must_use]
    pub fn with_fault_sequence(mut self, fault: Sequence) -> Self {
        self.fault_sequence = Some(Box::new(fault));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mediators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mediators.is_empty()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.mediators.iter().map(|m| m.name()).collect();
        f.debug_struct("Sequence")
            .field("name", &self.name)
            .field("mediators", &names)
            .field("fault_sequence", &self.fault_sequence)
            .finish()
    }
}

impl Mediator for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, env: &MediatorEnvironment) -> Result<(), MediationError> {
        for mediator in &mut self.mediators {
            debug!(sequence = %self.name, mediator = mediator.name(), "initializing mediator");
            mediator.init(env)?;
        }
        if let Some(fault) = &mut self.fault_sequence {
            fault.init(env)?;
        }
        Ok(())
    }

    fn mediate(&self, message: &mut Message) -> Result<bool, MediationError> {
        for mediator in &self.mediators {
            match mediator.mediate(message) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(sequence = %self.name, mediator = mediator.name(), "sequence stopped");
                    return Ok(false);
                }
                Err(err) => {
                    warn!(sequence = %self.name, mediator = mediator.name(), error = %err, "mediator failed");
                    if let Some(fault) = &self.fault_sequence {
                        if let Err(fault_err) = fault.mediate(message) {
                            warn!(sequence = %fault.name, error = %fault_err, "fault sequence failed");
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(true)
    }

    fn destroy(&mut self) {
        if let Some(fault) = &mut self.fault_sequence {
            fault.destroy();
        }
        for mediator in self.mediators.iter_mut().rev() {
            mediator.destroy();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
