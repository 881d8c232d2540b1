//! The seam between track objects and the network.
//!
//! Tracks never talk HTTP themselves. They build a [`Params`] map and hand it to a [`Ws`]
//! dispatcher, which submits it through whatever [`Transport`] the application configured
//! and returns an [`Exchange`] straight away.

pub mod lfm;

// Use 3rd party
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

// Use built-in library
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Flat request parameters, keyed by parameter name.
pub type Params = BTreeMap<String, String>;

// Possible errors returned while talking to the web service.
#[derive(Debug, Error)]
pub enum WsError {
    #[error("last.fm error {code}: {message}")]
    Api { code: u32, message: String },
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("status code: {0}")]
    StatusCode(StatusCode),
    #[error("form encoding error: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
    #[error("xml parse error: {0}")]
    Xml(#[from] xmltree::ParseError),
    #[error("exchange aborted: {0}")]
    Aborted(#[from] JoinError),
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

impl From<StatusCode> for WsError {
    fn from(code: StatusCode) -> Self {
        Self::StatusCode(code)
    }
}

pub type WsResult<T> = Result<T, WsError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Something able to deliver a parameter map to the web service and hand back the response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, method: HttpMethod, params: Params) -> WsResult<String>;
}

/// Dispatches requests through a shared [`Transport`].
///
/// Every submission is spawned on the Tokio runtime immediately, so the caller must be inside one.
#[derive(Clone)]
pub struct Ws {
    transport: Arc<dyn Transport>,
}

impl Ws {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn get(&self, params: Params) -> Exchange {
        self.submit(HttpMethod::Get, params, |_| ())
    }

    pub fn post(&self, params: Params) -> Exchange {
        self.submit(HttpMethod::Post, params, |_| ())
    }

    /// Submits `params` and runs `on_finished` exactly once with the reply, before the
    /// returned [`Exchange`] resolves.
    pub(crate) fn submit<F>(&self, method: HttpMethod, params: Params, on_finished: F) -> Exchange
    where
        F: FnOnce(&WsResult<String>) + Send + 'static,
    {
        debug!("submitting {:?} {:?}", method, params.get("method"));
        let transport = Arc::clone(&self.transport);
        let handle = tokio::spawn(async move {
            let reply = transport.submit(method, params).await;
            debug!("exchange finished, ok: {}", reply.is_ok());
            on_finished(&reply);
            reply
        });
        Exchange { handle }
    }
}

impl fmt::Debug for Ws {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ws").finish()
    }
}

/// A pending request/response cycle. Awaiting it yields the response body.
///
/// Dropping an `Exchange` does not cancel the request.
#[derive(Debug)]
pub struct Exchange {
    handle: JoinHandle<WsResult<String>>,
}

impl Future for Exchange {
    type Output = WsResult<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|joined| joined.map_err(WsError::from).and_then(|reply| reply))
    }
}
