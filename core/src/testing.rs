//! Scripted in-memory `Transport` for exercising the managers without a
//! server. Sequential flows script a response queue; the month-grid fan-out
//! tests route replies by inspecting the request, since worker threads hit
//! the transport in no fixed order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync>;

pub struct FakeTransport {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    /// Replies with the given responses in order; panics when exhausted.
    pub fn sequence(responses: Vec<Result<HttpResponse, ApiError>>) -> Arc<Self> {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::routed(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport script exhausted")
        })
    }

    /// Replies by inspecting each request.
    pub fn routed(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let reply = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        reply
    }
}

pub fn json(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

pub fn no_content() -> HttpResponse {
    json(204, "")
}

pub fn detail(status: u16, message: &str) -> HttpResponse {
    json(status, &format!(r#"{{"detail":"{message}"}}"#))
}
