//! Test utilities for code built on [`NetworkClient`](crate::NetworkClient).
//!
//! [`StubTransport`] answers requests from a queue of canned responses and
//! records every request it sees, so tests can assert on both sides of the
//! exchange without a running server.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;

use crate::client::Transport;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Queue-backed `Transport` for tests.
///
/// # Example
///
/// ```
/// use route4me_core::test_support::StubTransport;
/// use route4me_core::{ClientConfig, NetworkClient};
///
/// let client = NetworkClient::new(ClientConfig::new("key"), StubTransport::new());
/// client.transport().push_json(200, serde_json::json!({"status": true}));
///
/// let body = client.delete("/api.v4/optimization_problem.php", "www", None).unwrap();
/// assert_eq!(body["status"], true);
/// assert_eq!(client.transport().requests().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct StubTransport {
    responses: RefCell<VecDeque<Result<HttpResponse, String>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: HttpResponse) {
        self.responses.borrow_mut().push_back(Ok(response));
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_response(HttpResponse::new(status, body.to_string()));
    }

    /// Queue a transport-level failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.responses.borrow_mut().push_back(Err(message.into()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.borrow().last().cloned()
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(request);
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ApiError::Transport(message)),
            None => Err(ApiError::Transport("no stubbed response left".to_string())),
        }
    }
}
