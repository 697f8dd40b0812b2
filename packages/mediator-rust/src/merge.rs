//! Writing a successful response back into the inbound message.

use callout_core::{Element, Message};
use tracing::trace;

use crate::config::TargetPolicy;
use crate::error::ExtractionFault;

/// Applies a target policy to a response.
#[derive(Debug, Clone, Copy)]
pub struct ResponseMerger<'a> {
    policy: &'a TargetPolicy,
}

impl<'a> ResponseMerger<'a> {
    #[must_use]
    pub fn new(policy: &'a TargetPolicy) -> Self {
        Self { policy }
    }

    /// Merges `response` into `inbound`.
    ///
    /// A non-XML response payload is copied over and nothing else changes.
    /// Otherwise the target policy decides: replace the selected node in
    /// place, store the first body element as a property, or replace the
    /// whole envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionFault`] when the target expression does not select
    /// a replaceable element or the response body holds no element. The
    /// inbound message is unchanged in that case.
    pub fn merge(&self, inbound: &mut Message, response: &Message) -> Result<(), ExtractionFault> {
        if let Some(payload) = response.raw_payload() {
            trace!("copying non-XML response payload");
            inbound.set_raw_payload(Some(payload.clone()));
            return Ok(());
        }

        match self.policy {
            TargetPolicy::XPath(xpath) => {
                let expression = || xpath.to_string();
                let path = xpath
                    .evaluate(inbound.envelope())
                    .first_element()
                    .cloned()
                    .ok_or_else(|| ExtractionFault::TargetNotAnElement {
                        expression: expression(),
                    })?;
                if path.is_root() {
                    return Err(ExtractionFault::TargetIsRoot {
                        expression: expression(),
                    });
                }
                let result = first_body_element(response)?;
                inbound
                    .envelope_mut()
                    .replace_node(&path, result)
                    .map_err(|_| ExtractionFault::TargetNotAnElement {
                        expression: expression(),
                    })?;
            }
            TargetPolicy::Key(key) => {
                let result = first_body_element(response)?;
                inbound.set_property(key.clone(), result);
            }
            TargetPolicy::ReplaceEnvelope => {
                inbound.set_envelope(response.envelope().clone());
            }
        }
        Ok(())
    }
}

fn first_body_element(response: &Message) -> Result<Element, ExtractionFault> {
    response
        .envelope()
        .first_body_element()
        .cloned()
        .ok_or(ExtractionFault::EmptyResponse)
}
