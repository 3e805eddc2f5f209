#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use ul_providers::{CatalogueTransport, TransportError, TransportResponse};

/// What the mock answers for one request.
#[derive(Clone)]
pub enum Reply {
    Json(u16, serde_json::Value),
    Raw(u16, &'static str),
    Timeout,
    Refused,
}

type Router = dyn Fn(&str, usize) -> Reply + Send + Sync;

/// In-process transport. The router gets the URL and the number of earlier
/// calls to that same URL.
pub struct MockTransport {
    router: Box<Router>,
    latency: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockTransport {
    pub fn new(router: impl Fn(&str, usize) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Self::with_latency(Duration::ZERO, router)
    }

    pub fn with_latency(
        latency: Duration,
        router: impl Fn(&str, usize) -> Reply + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            router: Box::new(router),
            latency,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    pub fn calls_to(&self, needle: &str) -> usize {
        self.calls.lock().iter().filter(|u| u.contains(needle)).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CatalogueTransport for MockTransport {
    async fn get(
        &self,
        url: &str,
        _credential: Option<&str>,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let seen = {
            let mut calls = self.calls.lock();
            let seen = calls.iter().filter(|u| u.as_str() == url).count();
            calls.push(url.to_string());
            seen
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reply = (self.router)(url, seen);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Reply::Json(status, body) => Ok(TransportResponse {
                status,
                body: body.to_string().into_bytes(),
            }),
            Reply::Raw(status, body) => Ok(TransportResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            Reply::Timeout => Err(TransportError::Timeout("deadline elapsed".into())),
            Reply::Refused => Err(TransportError::Connect("connection refused".into())),
        }
    }
}

pub fn catalogue(ids: &[&str]) -> Reply {
    let data: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({"id": id, "object": "model"}))
        .collect();
    Reply::Json(200, serde_json::json!({"object": "list", "data": data}))
}
