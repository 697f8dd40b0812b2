//! Request payload selection.

use callout_core::{Message, PropertyValue};
use tracing::trace;

use crate::config::SourcePolicy;
use crate::error::ExtractionFault;

/// Derives the outbound request from an inbound message.
#[derive(Debug, Clone, Copy)]
pub struct PayloadSelector<'a> {
    policy: &'a SourcePolicy,
}

impl<'a> PayloadSelector<'a> {
    #[must_use]
    pub fn new(policy: &'a SourcePolicy) -> Self {
        Self { policy }
    }

    /// Builds the outbound message. The inbound message is only read.
    ///
    /// The outbound message starts as an independent copy of the inbound one.
    /// A copy carrying a non-XML payload is forwarded as is; otherwise the
    /// body is replaced by the element the source policy selects.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionFault`] when the source expression or key does not
    /// yield an element.
    pub fn select(&self, inbound: &Message) -> Result<Message, ExtractionFault> {
        let mut outbound = inbound.clone_for_outbound();
        if outbound.has_raw_payload() {
            trace!("forwarding non-XML payload unchanged");
            return Ok(outbound);
        }

        let payload = match self.policy {
            SourcePolicy::Envelope => return Ok(outbound),
            SourcePolicy::XPath(xpath) => {
                let result = xpath.evaluate(inbound.envelope());
                result
                    .first_element()
                    .and_then(|path| inbound.envelope().element_at(path))
                    .cloned()
                    .ok_or_else(|| ExtractionFault::SourceNotAnElement {
                        expression: xpath.to_string(),
                    })?
            }
            SourcePolicy::Key(key) => inbound
                .lookup(key)
                .and_then(PropertyValue::as_element)
                .cloned()
                .ok_or_else(|| ExtractionFault::NotAnElement { key: key.clone() })?,
        };

        let envelope = outbound.envelope_mut();
        envelope.clear_body();
        envelope.add_body_child(payload);
        Ok(outbound)
    }
}
