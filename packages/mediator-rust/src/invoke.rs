//! Blocking invocation through the transport.

use callout_core::{keys, ErrorValue, Message, PropertyValue};
use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::error::{CalloutFailure, ResponseFault};
use crate::transport::Transport;

/// Message exchange pattern of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// Fire-and-forget; no response is awaited.
    OneWay,
    /// Block until the transport returns a response or fails.
    RequestResponse,
}

impl Exchange {
    /// One-way when the inbound message carries a true `OUT_ONLY` flag.
    #[must_use]
    pub fn for_message(inbound: &Message) -> Self {
        if inbound.flag(keys::OUT_ONLY) {
            Exchange::OneWay
        } else {
            Exchange::RequestResponse
        }
    }
}

/// Performs one call and screens the response for failures.
pub struct Invocation<'a> {
    transport: &'a dyn Transport,
}

impl<'a> Invocation<'a> {
    #[must_use]
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Sends `outbound` to `endpoint`.
    ///
    /// Returns `Ok(None)` for a one-way send and `Ok(Some(response))` for a
    /// clean response.
    ///
    /// # Errors
    ///
    /// Returns [`CalloutFailure`] when the transport fails, when the response
    /// is marked as a sender error, or when its body holds a protocol fault.
    pub fn invoke(
        &self,
        endpoint: &Endpoint,
        outbound: Message,
        exchange: Exchange,
    ) -> Result<Option<Message>, CalloutFailure> {
        debug!(endpoint = %endpoint, ?exchange, "about to invoke the service");
        trace!(payload = %outbound.envelope(), "request message payload");

        match exchange {
            Exchange::OneWay => {
                self.transport.send(endpoint, outbound)?;
                Ok(None)
            }
            Exchange::RequestResponse => {
                let response = self.transport.send_receive(endpoint, outbound)?;
                screen(&response)?;
                Ok(Some(response))
            }
        }
    }
}

/// Checks the sender-error marker first, then the body fault.
fn screen(response: &Message) -> Result<(), CalloutFailure> {
    if response.flag(keys::BLOCKING_SENDER_ERROR) {
        let error = response
            .property(keys::ERROR_EXCEPTION)
            .and_then(PropertyValue::as_error)
            .cloned()
            .unwrap_or_else(|| {
                ErrorValue::new(anyhow::anyhow!("sender error reported without an exception"))
            });
        return Err(CalloutFailure::Sender(error));
    }
    if let Some(fault) = response.envelope().soap_fault() {
        return Err(ResponseFault { fault }.into());
    }
    Ok(())
}
