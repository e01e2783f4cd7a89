//! Test doubles shared by the unit tests of this crate.

use async_trait::async_trait;
use byteorder::{BigEndian, WriteBytesExt};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tickfetch_types::RawTick;

use crate::transport::{HttpError, HttpExecutor, HttpRequest, HttpResponse};

/// Scripted outcome of one call: `(status, body)` or a transport error message.
pub(crate) type Step = Result<(u16, Vec<u8>), String>;

fn respond(step: Step) -> Result<HttpResponse, HttpError> {
    match step {
        Ok((status, body)) => Ok(HttpResponse {
            status: StatusCode::from_u16(status).expect("valid status"),
            headers: HeaderMap::new(),
            body: body.into(),
        }),
        Err(message) => Err(HttpError::Other(message)),
    }
}

/// Replays a fixed sequence of outcomes, then answers `200` with an empty body.
#[derive(Debug, Default)]
pub(crate) struct ScriptedExecutor {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedExecutor {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::default(),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpExecutor for ScriptedExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(request);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok((200, Vec::new())));
        respond(step)
    }
}

/// Serves fixed outcomes per URL and tracks how many calls overlap.
#[derive(Debug, Default)]
pub(crate) struct FeedExecutor {
    routes: HashMap<String, Step>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FeedExecutor {
    pub(crate) fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub(crate) fn route(mut self, url: impl Into<String>, step: Step) -> Self {
        self.routes.insert(url.into(), step);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpExecutor for FeedExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let step = self
            .routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Ok((200, Vec::new())));
        respond(step)
    }
}

/// Serializes records into the uncompressed 20-byte layout.
pub(crate) fn encode_records(records: &[RawTick]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(records.len() * RawTick::SIZE);
    for record in records {
        raw.write_i32::<BigEndian>(record.ms_offset).unwrap();
        raw.write_i32::<BigEndian>(record.ask_raw).unwrap();
        raw.write_i32::<BigEndian>(record.bid_raw).unwrap();
        raw.write_f32::<BigEndian>(record.ask_volume).unwrap();
        raw.write_f32::<BigEndian>(record.bid_volume).unwrap();
    }
    raw
}

/// LZMA-compresses arbitrary bytes.
pub(crate) fn lzma(data: &[u8]) -> Vec<u8> {
    let mut compressed = Vec::new();
    lzma_rs::lzma_compress(&mut Cursor::new(data), &mut compressed).unwrap();
    compressed
}

/// Builds a bi5 payload from records.
pub(crate) fn bi5_payload(records: &[RawTick]) -> Vec<u8> {
    lzma(&encode_records(records))
}
