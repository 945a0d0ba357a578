//! In-memory transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::transport::{RawResponse, Transport};

/// Replays queued responses in order and records every request it sees.
///
/// When the queue is empty it answers `404` with a plain-text body, which the
/// client surfaces as [`Error::Transport`].
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<RawResponse>>>,
    requests: RefCell<Vec<(String, Request)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_text(status, &body.to_string());
    }

    pub fn push_text(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(RawResponse {
            status,
            headers: vec![("content-type".into(), "application/json".into())],
            body: body.to_string(),
        }));
    }

    /// Queue a failure that happens before any status is received.
    pub fn push_error(&self, error: Error) {
        self.responses.borrow_mut().push_back(Err(error));
    }

    /// `(url, request)` pairs in the order they were sent.
    pub fn requests(&self) -> Vec<(String, Request)> {
        self.requests.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, url: &str, request: &Request) -> Result<RawResponse> {
        self.requests
            .borrow_mut()
            .push((url.to_string(), request.clone()));
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(RawResponse {
                    status: 404,
                    headers: vec![],
                    body: "no scripted response".into(),
                })
            })
    }
}

/// Client over `transport` with default config.
pub fn client(transport: ScriptedTransport) -> ApiClient<ScriptedTransport> {
    ApiClient::with_transport(transport, ClientConfig::default())
}
