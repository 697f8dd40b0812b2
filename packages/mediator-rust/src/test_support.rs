//! Recording transport double shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use callout_core::{Element, Message, SoapFault, SoapVersion};
use parking_lot::Mutex;

use crate::config::TransportBootstrap;
use crate::endpoint::Endpoint;
use crate::error::TransportFault;
use crate::transport::Transport;

enum Reply {
    Respond(Message),
    Fail {
        message: String,
        fault: Option<SoapFault>,
    },
}

/// Transport that answers every call with the same scripted reply and
/// records what it was asked to do.
pub(crate) struct StubTransport {
    reply: Mutex<Reply>,
    init_error: Option<String>,
    requests: Mutex<Vec<Message>>,
    endpoints: Mutex<Vec<Option<String>>>,
    bootstraps: Mutex<Vec<TransportBootstrap>>,
    one_way: AtomicUsize,
    request_response: AtomicUsize,
    client_options_disabled: AtomicUsize,
    terminated: AtomicUsize,
}

impl StubTransport {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            init_error: None,
            requests: Mutex::new(Vec::new()),
            endpoints: Mutex::new(Vec::new()),
            bootstraps: Mutex::new(Vec::new()),
            one_way: AtomicUsize::new(0),
            request_response: AtomicUsize::new(0),
            client_options_disabled: AtomicUsize::new(0),
            terminated: AtomicUsize::new(0),
        }
    }

    /// Responds with a SOAP 1.1 envelope whose body holds `payload`.
    pub(crate) fn replying(payload: Element) -> Self {
        Self::responding(Message::with_payload(SoapVersion::Soap11, payload))
    }

    pub(crate) fn responding(response: Message) -> Self {
        Self::with_reply(Reply::Respond(response))
    }

    /// Fails every call with a copy of `fault`. The source chain is dropped.
    pub(crate) fn failing(fault: TransportFault) -> Self {
        Self::with_reply(Reply::Fail {
            message: fault.message,
            fault: fault.fault,
        })
    }

    pub(crate) fn failing_init(mut self, message: impl Into<String>) -> Self {
        self.init_error = Some(message.into());
        self
    }

    pub(crate) fn set_response(&self, response: Message) {
        *self.reply.lock() = Reply::Respond(response);
    }

    pub(crate) fn requests(&self) -> Vec<Message> {
        self.requests.lock().clone()
    }

    /// Target address of each call, in call order.
    pub(crate) fn addresses(&self) -> Vec<Option<String>> {
        self.endpoints.lock().clone()
    }

    pub(crate) fn bootstraps(&self) -> Vec<TransportBootstrap> {
        self.bootstraps.lock().clone()
    }

    pub(crate) fn one_way_sends(&self) -> usize {
        self.one_way.load(Ordering::SeqCst)
    }

    pub(crate) fn request_responses(&self) -> usize {
        self.request_response.load(Ordering::SeqCst)
    }

    pub(crate) fn client_options_disabled(&self) -> usize {
        self.client_options_disabled.load(Ordering::SeqCst)
    }

    pub(crate) fn terminations(&self) -> usize {
        self.terminated.load(Ordering::SeqCst)
    }

    fn record(&self, endpoint: &Endpoint, message: Message) {
        self.endpoints
            .lock()
            .push(endpoint.target_address(&message).map(str::to_string));
        self.requests.lock().push(message);
    }

    fn answer(&self) -> Result<Message, TransportFault> {
        match &*self.reply.lock() {
            Reply::Respond(response) => Ok(response.clone_for_outbound()),
            Reply::Fail { message, fault } => {
                let mut err = TransportFault::new(message.clone());
                err.fault = fault.clone();
                Err(err)
            }
        }
    }
}

impl Transport for StubTransport {
    fn init(&self, bootstrap: &TransportBootstrap) -> Result<(), TransportFault> {
        self.bootstraps.lock().push(bootstrap.clone());
        match &self.init_error {
            Some(message) => Err(TransportFault::new(message.clone())),
            None => Ok(()),
        }
    }

    fn disable_client_option_init(&self) {
        self.client_options_disabled.fetch_add(1, Ordering::SeqCst);
    }

    fn send(&self, endpoint: &Endpoint, message: Message) -> Result<(), TransportFault> {
        self.one_way.fetch_add(1, Ordering::SeqCst);
        self.record(endpoint, message);
        self.answer().map(|_| ())
    }

    fn send_receive(&self, endpoint: &Endpoint, message: Message) -> Result<Message, TransportFault> {
        self.request_response.fetch_add(1, Ordering::SeqCst);
        self.record(endpoint, message);
        self.answer()
    }

    fn terminate(&self) -> Result<(), TransportFault> {
        self.terminated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
