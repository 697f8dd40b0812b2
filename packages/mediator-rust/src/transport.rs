//! The blocking transport collaborator.

use callout_core::Message;

use crate::config::TransportBootstrap;
use crate::endpoint::Endpoint;
use crate::error::TransportFault;

/// Synchronous message sender shared by every mediator that holds it.
///
/// Implementations own timeouts, retries and connection handling. Calls block
/// the current thread for their full duration.
pub trait Transport: Send + Sync {
    /// Prepares the client environment.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault`] when the environment cannot be set up.
    fn init(&self, bootstrap: &TransportBootstrap) -> Result<(), TransportFault>;

    /// Stops the transport from applying its own client options to outgoing
    /// calls.
    fn disable_client_option_init(&self);

    /// Fire-and-forget send.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault`] when the message could not be handed off.
    fn send(&self, endpoint: &Endpoint, message: Message) -> Result<(), TransportFault>;

    /// Request-response call.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault`] when no response could be obtained.
    fn send_receive(&self, endpoint: &Endpoint, message: Message) -> Result<Message, TransportFault>;

    /// Releases transport resources.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault`] if shutdown fails.
    fn terminate(&self) -> Result<(), TransportFault> {
        Ok(())
    }
}
