//! The callout mediator: select payload, resolve endpoint, call, then either
//! normalize the failure or merge the response.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use callout_core::Message;
use tracing::{debug, trace, warn};

use crate::config::MediatorConfig;
use crate::endpoint::{EndpointRegistry, EndpointResolver};
use crate::error::{ConfigError, MediationError};
use crate::fault::FaultNormalizer;
use crate::invoke::{Exchange, Invocation};
use crate::merge::ResponseMerger;
use crate::payload::PayloadSelector;
use crate::sequence::{Mediator, MediatorEnvironment};
use crate::transport::Transport;

struct Initialized {
    resolver: EndpointResolver,
    registry: Arc<dyn EndpointRegistry>,
}

/// Synchronous outbound call step.
///
/// The configuration is fixed at construction. `init` bootstraps the
/// transport and resolves the endpoint; after that `mediate` may be called
/// from any number of threads.
pub struct CalloutMediator {
    config: MediatorConfig,
    transport: Arc<dyn Transport>,
    state: Option<Initialized>,
    client_options_disabled: AtomicBool,
}

impl CalloutMediator {
    #[must_use]
    pub fn new(config: MediatorConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            state: None,
            client_options_disabled: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Settings named in the service URL that were unset at init.
    ///
    /// Empty before init and for non-URL endpoint targets.
    #[must_use]
    pub fn unresolved_placeholders(&self) -> &[String] {
        self.state
            .as_ref()
            .map(|state| state.resolver.unresolved_placeholders())
            .unwrap_or_default()
    }

    fn apply_client_options(&self) {
        if !self.config.init_client_options()
            && !self.client_options_disabled.swap(true, Ordering::AcqRel)
        {
            self.transport.disable_client_option_init();
        }
    }
}

impl Mediator for CalloutMediator {
    fn name(&self) -> &str {
        "callout"
    }

    fn init(&mut self, env: &MediatorEnvironment) -> Result<(), MediationError> {
        self.transport
            .init(self.config.bootstrap())
            .map_err(MediationError::Init)?;
        let resolver = EndpointResolver::new(&self.config, env.settings.as_ref());
        debug!(config = %self.config, "callout mediator initialized");
        self.state = Some(Initialized {
            resolver,
            registry: Arc::clone(&env.registry),
        });
        Ok(())
    }

    fn mediate(&self, message: &mut Message) -> Result<bool, MediationError> {
        let state = self.state.as_ref().ok_or(ConfigError::NotInitialized)?;
        debug!(message_id = message.id(), "start: callout mediator");
        trace!(envelope = %message.envelope(), "inbound message");

        self.apply_client_options();

        let endpoint = state.resolver.resolve(state.registry.as_ref(), message)?;
        let mut outbound = PayloadSelector::new(self.config.source()).select(message)?;
        if let Some(action) = self.config.action() {
            outbound.set_action(action);
        }

        let exchange = Exchange::for_message(message);
        match Invocation::new(self.transport.as_ref()).invoke(&endpoint, outbound, exchange) {
            Ok(Some(response)) => {
                trace!(envelope = %response.envelope(), "response payload received");
                ResponseMerger::new(self.config.target()).merge(message, &response)?;
            }
            Ok(None) => debug!("service returned no response"),
            Err(failure) => {
                let label = endpoint
                    .target_address(message)
                    .map_or_else(|| endpoint.to_string(), str::to_string);
                return Err(FaultNormalizer.normalize(message, &label, failure));
            }
        }

        debug!(message_id = message.id(), "end: callout mediator");
        Ok(true)
    }

    fn destroy(&mut self) {
        if self.state.take().is_some() {
            if let Err(err) = self.transport.terminate() {
                warn!(error = %err, "transport did not terminate cleanly");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use callout_core::{
        keys, Element, Envelope, PropertyValue, RawPayload, SoapFault, SoapVersion,
    };

    use super::*;
    use crate::config::MediatorConfigBuilder;
    use crate::endpoint::{Endpoint, InMemoryEndpointRegistry};
    use crate::error::{CalloutFailure, ExtractionFault, TransportFault};
    use crate::settings::StaticSettings;
    use crate::test_support::StubTransport;

    fn request() -> Message {
        Message::with_payload(
            SoapVersion::Soap11,
            Element::new("getQuote")
                .child(Element::new("symbol").text_node("IBM"))
                .child(Element::new("price").text_node("?")),
        )
    }

    fn quote() -> Element {
        Element::new("quote").attr("symbol", "IBM").text_node("42.00")
    }

    fn initialized(builder: MediatorConfigBuilder, transport: &Arc<StubTransport>) -> CalloutMediator {
        initialized_in(builder, transport, &MediatorEnvironment::default())
    }

    fn initialized_in(
        builder: MediatorConfigBuilder,
        transport: &Arc<StubTransport>,
        env: &MediatorEnvironment,
    ) -> CalloutMediator {
        let transport: Arc<dyn Transport> = Arc::clone(transport) as Arc<dyn Transport>;
        let mut mediator = CalloutMediator::new(builder.build().unwrap(), transport);
        mediator.init(env).unwrap();
        mediator
    }

    #[test]
    fn mediate_before_init_is_a_config_error() {
        let transport: Arc<dyn Transport> = Arc::new(StubTransport::replying(quote()));
        let mediator = CalloutMediator::new(MediatorConfig::builder().build().unwrap(), transport);
        let err = mediator.mediate(&mut request()).unwrap_err();
        assert!(matches!(err, MediationError::Config(ConfigError::NotInitialized)));
    }

    #[test]
    fn init_passes_bootstrap_and_reports_failure() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let config = MediatorConfig::builder().use_server_config("shared");
        let mediator = initialized(config, &transport);
        assert!(mediator.is_initialized());
        assert_eq!(
            transport.bootstraps()[0].use_server_config.as_deref(),
            Some("shared")
        );

        let failing: Arc<dyn Transport> =
            Arc::new(StubTransport::replying(quote()).failing_init("no repository"));
        let mut mediator = CalloutMediator::new(MediatorConfig::builder().build().unwrap(), failing);
        let err = mediator.init(&MediatorEnvironment::default()).unwrap_err();
        assert!(matches!(err, MediationError::Init(t) if t.message == "no repository"));
        assert!(!mediator.is_initialized());
    }

    #[test]
    fn envelope_source_without_target_replaces_envelope() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(
            MediatorConfig::builder().service_url("http://backend/quote"),
            &transport,
        );
        let mut msg = request();
        let sent = msg.envelope().clone();

        assert!(mediator.mediate(&mut msg).unwrap());

        let response = Envelope::with_body(SoapVersion::Soap11, quote());
        assert_eq!(msg.envelope(), &response);
        assert_eq!(transport.requests()[0].envelope(), &sent);
        assert_eq!(
            transport.addresses(),
            vec![Some("http://backend/quote".to_string())]
        );
    }

    #[test]
    fn key_source_sends_property_element() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(MediatorConfig::builder().source_key("req"), &transport);
        let payload = Element::new("lookup").child(Element::new("id").text_node("7"));
        let mut msg = request();
        msg.set_property("req", payload.clone());

        mediator.mediate(&mut msg).unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.envelope().body().unwrap().child_elements().count(), 1);
        assert_eq!(sent.envelope().first_body_element(), Some(&payload));
    }

    #[test]
    fn missing_source_key_fails_without_touching_message() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(MediatorConfig::builder().source_key("absent"), &transport);
        let mut msg = request();
        let before = msg.envelope().clone();

        let err = mediator.mediate(&mut msg).unwrap_err();

        assert!(matches!(
            err,
            MediationError::Extraction(ExtractionFault::NotAnElement { ref key }) if key == "absent"
        ));
        assert_eq!(msg.envelope(), &before);
        assert!(msg.properties().is_empty());
        assert_eq!(transport.request_responses(), 0);
    }

    #[test]
    fn xpath_target_swaps_node_in_place() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(
            MediatorConfig::builder()
                .source_xpath("$body/getQuote/symbol")
                .target_xpath("$body/getQuote/price"),
            &transport,
        );
        let mut msg = request();

        mediator.mediate(&mut msg).unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.envelope().first_body_element().unwrap().name.local, "symbol");
        let names: Vec<_> = msg
            .envelope()
            .first_body_element()
            .unwrap()
            .child_elements()
            .map(|e| e.name.local.clone())
            .collect();
        assert_eq!(names, vec!["symbol", "quote"]);
    }

    #[test]
    fn key_target_stores_response_element() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(MediatorConfig::builder().target_key("result"), &transport);
        let mut msg = request();
        let before = msg.envelope().clone();

        mediator.mediate(&mut msg).unwrap();

        assert_eq!(msg.property("result").and_then(PropertyValue::as_element), Some(&quote()));
        assert_eq!(msg.envelope(), &before);
    }

    #[test]
    fn response_fault_is_normalized() {
        let fault = SoapFault {
            code: Some("soapenv:Server".into()),
            reason: Some("quote service down".into()),
            detail: Some(Element::new("detail").child(Element::new("retryAfter").text_node("30"))),
        };
        let transport = Arc::new(StubTransport::responding(Message::new(Envelope::fault(
            SoapVersion::Soap11,
            &fault,
        ))));
        let mediator = initialized(
            MediatorConfig::builder().service_url("http://backend/quote"),
            &transport,
        );
        let mut msg = request();
        let before = msg.envelope().clone();

        let err = mediator.mediate(&mut msg).unwrap_err();

        assert!(msg.flag(keys::SENDING_FAULT));
        assert_eq!(msg.property(keys::ERROR_CODE).and_then(PropertyValue::as_str), Some("soapenv:Server"));
        assert_eq!(
            msg.property(keys::ERROR_MESSAGE).and_then(PropertyValue::as_str),
            Some("quote service down")
        );
        assert!(msg.property(keys::ERROR_DETAIL).and_then(PropertyValue::as_element).is_some());
        assert!(msg.property(keys::ERROR_EXCEPTION).and_then(PropertyValue::as_error).is_some());
        assert_eq!(msg.envelope(), &before);
        assert!(matches!(
            &err,
            MediationError::CalloutFailed { endpoint, .. } if endpoint == "http://backend/quote"
        ));
        assert_eq!(err.callout_failure().and_then(CalloutFailure::soap_fault), Some(&fault));
    }

    #[test]
    fn transport_failure_is_normalized() {
        let transport = Arc::new(StubTransport::failing(TransportFault::new("connection refused")));
        let mediator = initialized(MediatorConfig::builder(), &transport);
        let mut msg = request().with_to("http://dest/svc");

        let err = mediator.mediate(&mut msg).unwrap_err();

        assert_eq!(msg.property(keys::ERROR_CODE).and_then(PropertyValue::as_str), Some("401000"));
        assert!(matches!(
            &err,
            MediationError::CalloutFailed { endpoint, .. } if endpoint == "http://dest/svc"
        ));
    }

    #[test]
    fn out_only_sends_one_way_and_leaves_message() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(MediatorConfig::builder(), &transport);
        let mut msg = request();
        msg.set_property(keys::OUT_ONLY, "true");
        let before = msg.envelope().clone();

        assert!(mediator.mediate(&mut msg).unwrap());

        assert_eq!(transport.one_way_sends(), 1);
        assert_eq!(transport.request_responses(), 0);
        assert_eq!(msg.envelope(), &before);
    }

    #[test]
    fn out_only_transport_failure_is_still_normalized() {
        let transport = Arc::new(StubTransport::failing(TransportFault::new("connection refused")));
        let mediator = initialized(MediatorConfig::builder(), &transport);
        let mut msg = request();
        msg.set_property(keys::OUT_ONLY, "true");
        let before = msg.envelope().clone();

        let err = mediator.mediate(&mut msg).unwrap_err();

        assert!(matches!(err, MediationError::CalloutFailed { .. }));
        assert_eq!(transport.one_way_sends(), 1);
        assert_eq!(transport.request_responses(), 0);
        assert!(msg.flag(keys::SENDING_FAULT));
        assert_eq!(msg.property(keys::ERROR_CODE).and_then(PropertyValue::as_str), Some("401000"));
        assert_eq!(msg.envelope(), &before);
    }

    #[test]
    fn action_is_stamped_on_outbound_only() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(MediatorConfig::builder().action("urn:getQuote"), &transport);
        let mut msg = request();

        mediator.mediate(&mut msg).unwrap();

        assert_eq!(transport.requests()[0].action(), Some("urn:getQuote"));
        assert!(msg.action().is_none());
    }

    #[test]
    fn client_options_are_disabled_once() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(MediatorConfig::builder().init_client_options(false), &transport);
        mediator.mediate(&mut request()).unwrap();
        mediator.mediate(&mut request()).unwrap();
        assert_eq!(transport.client_options_disabled(), 1);

        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(MediatorConfig::builder(), &transport);
        mediator.mediate(&mut request()).unwrap();
        assert_eq!(transport.client_options_disabled(), 0);
    }

    #[test]
    fn placeholders_resolve_from_environment_settings() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let env = MediatorEnvironment::new(
            Arc::new(StaticSettings::new().with("env", "prod")),
            Arc::new(InMemoryEndpointRegistry::new()),
        );
        let mediator = initialized_in(
            MediatorConfig::builder().service_url("http://host/{system.prop.env}"),
            &transport,
            &env,
        );
        mediator.mediate(&mut request()).unwrap();
        assert_eq!(transport.addresses(), vec![Some("http://host/prod".to_string())]);
        assert!(mediator.unresolved_placeholders().is_empty());
    }

    #[test]
    fn unset_settings_stay_visible_after_init() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let env = MediatorEnvironment::new(
            Arc::new(StaticSettings::new()),
            Arc::new(InMemoryEndpointRegistry::new()),
        );
        let mediator = initialized_in(
            MediatorConfig::builder().service_url("http://host/{system.prop.env}"),
            &transport,
            &env,
        );
        assert_eq!(mediator.unresolved_placeholders(), ["env"]);

        mediator.mediate(&mut request()).unwrap();
        assert_eq!(
            transport.addresses(),
            vec![Some("http://host/{system.prop.env}".to_string())]
        );
    }

    #[test]
    fn endpoint_key_is_looked_up_per_call() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let registry = Arc::new(InMemoryEndpointRegistry::new());
        let env = MediatorEnvironment::new(
            Arc::new(StaticSettings::new()),
            Arc::clone(&registry) as Arc<dyn EndpointRegistry>,
        );
        let mediator = initialized_in(MediatorConfig::builder().endpoint_key("quotes"), &transport, &env);

        let err = mediator.mediate(&mut request()).unwrap_err();
        assert!(matches!(
            err,
            MediationError::Config(ConfigError::UnknownEndpoint { ref key }) if key == "quotes"
        ));

        registry.register("quotes", Arc::new(Endpoint::declared("quotes", "http://quotes/v1")));
        mediator.mediate(&mut request()).unwrap();
        registry.register("quotes", Arc::new(Endpoint::declared("quotes", "http://quotes/v2")));
        mediator.mediate(&mut request()).unwrap();
        assert_eq!(
            transport.addresses(),
            vec![
                Some("http://quotes/v1".to_string()),
                Some("http://quotes/v2".to_string())
            ]
        );
    }

    #[test]
    fn json_payload_bypasses_source_and_merge() {
        let json = RawPayload::Json(serde_json::json!({ "price": 42 }));
        let mut response = Message::new(Envelope::new(SoapVersion::Soap11));
        response.set_raw_payload(Some(json.clone()));
        let transport = Arc::new(StubTransport::responding(response));
        let mediator = initialized(
            MediatorConfig::builder()
                .source_key("absent")
                .target_xpath("$body/missing"),
            &transport,
        );
        let mut msg = request();
        msg.set_raw_payload(Some(RawPayload::Json(serde_json::json!({ "symbol": "IBM" }))));
        let before = msg.envelope().clone();

        mediator.mediate(&mut msg).unwrap();

        assert_eq!(
            transport.requests()[0].raw_payload(),
            Some(&RawPayload::Json(serde_json::json!({ "symbol": "IBM" })))
        );
        assert_eq!(msg.raw_payload(), Some(&json));
        assert_eq!(msg.envelope(), &before);
    }

    #[test]
    fn identical_inputs_give_identical_envelopes() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(
            MediatorConfig::builder().target_xpath("$body/getQuote/price"),
            &transport,
        );
        let mut first = request();
        let mut second = request();
        mediator.mediate(&mut first).unwrap();
        transport.set_response(Message::with_payload(SoapVersion::Soap11, quote()));
        mediator.mediate(&mut second).unwrap();
        assert_eq!(first.envelope().to_string(), second.envelope().to_string());
    }

    #[test]
    fn concurrent_calls_share_one_mediator() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mediator = initialized(MediatorConfig::builder().target_key("result"), &transport);

        let outcomes: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let mut msg = request();
                        let proceeded = mediator.mediate(&mut msg).is_ok_and(|go_on| go_on);
                        (proceeded, msg.property("result").is_some())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.len(), 8);
        assert!(outcomes.iter().all(|&(proceeded, merged)| proceeded && merged));
        assert_eq!(transport.request_responses(), 8);
        assert_eq!(transport.requests().len(), 8);
    }

    #[test]
    fn destroy_terminates_transport_once() {
        let transport = Arc::new(StubTransport::replying(quote()));
        let mut mediator = initialized(MediatorConfig::builder(), &transport);
        mediator.destroy();
        mediator.destroy();
        assert_eq!(transport.terminations(), 1);
        assert!(!mediator.is_initialized());
    }

    #[test]
    fn mediators_run_inside_a_sequence() {
        use crate::sequence::Sequence;

        let transport = Arc::new(StubTransport::replying(quote()));
        let config = MediatorConfig::builder().target_key("result").build().unwrap();
        let mut seq = Sequence::new("main").with(CalloutMediator::new(
            config,
            Arc::clone(&transport) as Arc<dyn Transport>,
        ));
        seq.init(&MediatorEnvironment::default()).unwrap();
        let mut msg = request();
        assert!(seq.mediate(&mut msg).unwrap());
        assert!(msg.property("result").is_some());
        seq.destroy();
        assert_eq!(transport.terminations(), 1);
    }
}
