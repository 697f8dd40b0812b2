//! Failure normalization: stamps a uniform property set on the inbound
//! message and produces the single callout error.

use callout_core::{keys, ErrorValue, Message, PropertyValue};
use tracing::warn;

use crate::error::{CalloutFailure, MediationError};

/// Error code stamped when the failure carries no fault code.
pub const CALLOUT_OPERATION_FAILED: &str = "401000";

/// Error message stamped when the failure carries no usable text.
pub const DEFAULT_ERROR_MESSAGE: &str = "Error while performing the callout operation";

/// Code, message and detail extracted from a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultDetail {
    pub code: String,
    pub message: String,
    /// First child element of the fault detail, else its text. `None` when
    /// the failure has no detail.
    pub detail: Option<PropertyValue>,
}

impl FaultDetail {
    #[must_use]
    pub fn from_failure(failure: &CalloutFailure) -> Self {
        let soap = failure.soap_fault();

        let code = soap
            .and_then(|f| f.code.clone())
            .unwrap_or_else(|| CALLOUT_OPERATION_FAILED.to_string());

        let message = soap
            .and_then(|f| f.reason.clone())
            .or_else(|| match failure {
                CalloutFailure::Transport(t) => Some(t.message.clone()),
                CalloutFailure::Sender(e) => Some(e.to_string()),
                CalloutFailure::Response(_) => None,
            })
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());

        let detail = soap.and_then(|f| f.detail.as_ref()).map(|detail| {
            detail
                .first_element()
                .map_or_else(|| PropertyValue::from(detail.text()), |el| PropertyValue::from(el.clone()))
        });

        Self {
            code,
            message,
            detail,
        }
    }
}

/// Routes transport and response failures into the uniform error shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultNormalizer;

impl FaultNormalizer {
    /// Stamps `SENDING_FAULT`, `ERROR_CODE`, `ERROR_MESSAGE`, `ERROR_DETAIL`
    /// (when there is a detail) and `ERROR_EXCEPTION` on `inbound`, and
    /// returns the matching [`MediationError::CalloutFailed`].
    ///
    /// The envelope is left as it was.
    #[must_use]
    pub fn normalize(
        &self,
        inbound: &mut Message,
        endpoint: &str,
        failure: CalloutFailure,
    ) -> MediationError {
        let detail = FaultDetail::from_failure(&failure);
        warn!(
            endpoint,
            code = %detail.code,
            message = %detail.message,
            "callout failed"
        );

        inbound.set_property(keys::SENDING_FAULT, true);
        inbound.set_property(keys::ERROR_CODE, detail.code);
        inbound.set_property(keys::ERROR_MESSAGE, detail.message);
        if let Some(value) = detail.detail {
            inbound.set_property(keys::ERROR_DETAIL, value);
        }

        let error = ErrorValue::new(anyhow::Error::new(failure));
        inbound.set_property(keys::ERROR_EXCEPTION, PropertyValue::Error(error.clone()));

        MediationError::CalloutFailed {
            endpoint: endpoint.to_string(),
            source: error,
        }
    }
}
