//! Scripted transport and virtual clock used by the engine's unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, LOCATION};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;
use vro_api::{Method, StatusCode, Transport, TransportError, TransportResponse};

use crate::poll::PollClock;

/// Virtual clock: sleeping advances time instantly.
#[derive(Clone)]
pub(crate) struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
    sleeps: Rc<Cell<u32>>,
    /// Cancel this token once the given number of sleeps has started.
    cancel_on_sleep: Rc<RefCell<Option<(u32, CancellationToken)>>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
            sleeps: Rc::new(Cell::new(0)),
            cancel_on_sleep: Rc::new(RefCell::new(None)),
        }
    }

    pub(crate) fn advance(&self, duration: Duration) {
        self.offset.set(self.offset.get() + duration);
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    pub(crate) fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }

    pub(crate) fn cancel_during_sleep(&self, sleep_number: u32, token: CancellationToken) {
        *self.cancel_on_sleep.borrow_mut() = Some((sleep_number, token));
    }
}

impl PollClock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }

    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        self.sleeps.set(self.sleeps.get() + 1);
        if let Some((sleep_number, token)) = self.cancel_on_sleep.borrow().as_ref()
            && *sleep_number == self.sleeps.get()
        {
            token.cancel();
        }
        if cancel.is_cancelled() {
            return false;
        }
        self.advance(duration);
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Transport that replays queued responses in order and records every request.
pub(crate) struct ScriptedTransport {
    script: RefCell<VecDeque<Result<TransportResponse, TransportError>>>,
    fallback: Option<TransportResponse>,
    requests: RefCell<Vec<RecordedRequest>>,
    latency: Option<(ManualClock, Duration)>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<TransportResponse, TransportError>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            fallback: None,
            requests: RefCell::new(Vec::new()),
            latency: None,
        }
    }

    /// Answer every request with the same response.
    pub(crate) fn repeating(response: TransportResponse) -> Self {
        Self::new(Vec::new()).with_fallback(response)
    }

    /// Response served once the script runs out.
    pub(crate) fn with_fallback(mut self, response: TransportResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Advance `clock` by `latency` on every request.
    pub(crate) fn with_latency(mut self, clock: &ManualClock, latency: Duration) -> Self {
        self.latency = Some((clock.clone(), latency));
        self
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<TransportResponse, TransportError> {
        self.requests.borrow_mut().push(RecordedRequest {
            method: method.clone(),
            path: path.to_string(),
            body: body.cloned(),
        });
        if let Some((clock, latency)) = &self.latency {
            clock.advance(*latency);
        }
        if let Some(next) = self.script.borrow_mut().pop_front() {
            return next;
        }
        match &self.fallback {
            Some(response) => Ok(response.clone()),
            None => panic!("unexpected request: {method} {path}"),
        }
    }
}

pub(crate) fn response(status: StatusCode, body: Option<Value>) -> TransportResponse {
    TransportResponse {
        status,
        url: Url::parse("https://vro.local:8281/vco/api/").expect("static url"),
        headers: HeaderMap::new(),
        body,
    }
}

pub(crate) fn ok_json(body: Value) -> Result<TransportResponse, TransportError> {
    Ok(response(StatusCode::OK, Some(body)))
}

pub(crate) fn state_response(state: &str) -> TransportResponse {
    response(StatusCode::OK, Some(json!({ "value": state })))
}

pub(crate) fn accepted_with_location(location: &str) -> Result<TransportResponse, TransportError> {
    let mut accepted = response(StatusCode::ACCEPTED, None);
    accepted
        .headers
        .insert(LOCATION, HeaderValue::from_str(location).expect("valid header"));
    Ok(accepted)
}

pub(crate) fn workflow_matches(ids: &[&str]) -> Value {
    let link: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "href": format!("https://vro.local:8281/vco/api/workflows/{id}/"),
                "attributes": [
                    { "name": "name", "value": "test-workflow" },
                    { "name": "id", "value": id }
                ]
            })
        })
        .collect();
    json!({ "link": link, "total": ids.len() })
}
