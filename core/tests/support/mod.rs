//! In-memory `Transport` with scripted replies.
//!
//! Replies are consumed in request order. A gated reply parks the request
//! until the test sends its response, which lets tests choose the order in
//! which concurrent calls resolve.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use directory_core::{ApiError, HttpRequest, HttpResponse, Transport};
use tokio::sync::oneshot;

enum Reply {
    Ready(Result<HttpResponse, ApiError>),
    Gated(oneshot::Receiver<HttpResponse>),
}

#[derive(Default)]
pub struct ScriptedTransport {
    requests: Mutex<Vec<HttpRequest>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, status: u16, body: &str) {
        self.push(Reply::Ready(Ok(response(status, body))));
    }

    pub fn fail_connection(&self) {
        self.push(Reply::Ready(Err(ApiError::Connection(
            "connection refused".to_string(),
        ))));
    }

    /// Queues a reply that is held back until the returned sender fires.
    pub fn gate(&self) -> oneshot::Sender<HttpResponse> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("request without a scripted reply");
        match reply {
            Reply::Ready(result) => result,
            Reply::Gated(rx) => rx
                .await
                .map_err(|_| ApiError::Connection("gate dropped".to_string())),
        }
    }
}

pub fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
    }
}

/// Yields until `transport` has seen `count` requests.
pub async fn wait_for_requests(transport: &ScriptedTransport, count: usize) {
    while transport.request_count() < count {
        tokio::task::yield_now().await;
    }
}
