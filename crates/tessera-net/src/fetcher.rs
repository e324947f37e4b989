//! Background HTTP fetching with completion polling.
//!
//! [`HttpContentFetcher`] runs GET requests on a Tokio runtime and hands the
//! results back over a channel, so a single-threaded UI loop can start
//! requests and collect completions without ever awaiting.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tessera_core::logging::targets;
use tokio::runtime::{Handle, Runtime};
use tokio::task::AbortHandle;
use url::Url;

use crate::error::{FetchError, Result};

/// Unique identifier for a fetch request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild an id from its raw value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// A received response. Every status code is a response; interpreting
/// non-success codes is up to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    /// Response body as text.
    pub body: String,
}

/// The outcome of a request.
#[derive(Clone, Debug)]
pub struct HttpCompletion {
    pub id: RequestId,
    pub result: Result<HttpResponse>,
}

/// Configuration for the fetcher.
#[derive(Clone, Debug)]
pub struct FetcherConfig {
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Default user agent.
    pub user_agent: Option<String>,
    /// Base URL relative request URLs are resolved against.
    pub base_url: Option<Url>,
    /// Worker threads of an owned runtime.
    pub worker_threads: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some(format!("Tessera/{} (Rust)", env!("CARGO_PKG_VERSION"))),
            base_url: None,
            worker_threads: 2,
        }
    }
}

impl FetcherConfig {
    /// Set the base URL for relative request URLs.
    pub fn base_url(mut self, base: &str) -> Result<Self> {
        self.base_url = Some(Url::parse(base)?);
        Ok(self)
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        Ok(builder.build()?)
    }
}

enum RuntimeHandle {
    Owned(Runtime),
    Shared(Handle),
}

impl RuntimeHandle {
    fn handle(&self) -> &Handle {
        match self {
            Self::Owned(runtime) => runtime.handle(),
            Self::Shared(handle) => handle,
        }
    }
}

/// In-flight requests. A slot exists from `get` until the request completes
/// or is cancelled; the abort handle is filled in once the task is spawned.
type InFlight = Arc<Mutex<HashMap<RequestId, Option<AbortHandle>>>>;

/// Runs GET requests in the background and queues their completions.
///
/// # Example
///
/// ```no_run
/// use tessera_net::{FetcherConfig, HttpContentFetcher};
///
/// let config = FetcherConfig::default().base_url("https://example.com")?;
/// let fetcher = HttpContentFetcher::with_config(config)?;
/// let id = fetcher.get("/fragments/terms", &[("X-Requested-With".into(), "XMLHttpRequest".into())]);
///
/// // Later, on the UI thread:
/// for completion in fetcher.drain() {
///     assert_eq!(completion.id, id);
/// }
/// # Ok::<(), tessera_net::FetchError>(())
/// ```
pub struct HttpContentFetcher {
    client: reqwest::Client,
    config: FetcherConfig,
    runtime: RuntimeHandle,
    sender: Sender<HttpCompletion>,
    receiver: Receiver<HttpCompletion>,
    in_flight: InFlight,
}

impl std::fmt::Debug for HttpContentFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContentFetcher")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight_count())
            .field("queued", &self.receiver.len())
            .finish()
    }
}

impl HttpContentFetcher {
    /// Create a fetcher with the default configuration and its own runtime.
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    /// Create a fetcher with its own multi-threaded runtime.
    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("tessera-net")
            .enable_all()
            .build()
            .map_err(|e| FetchError::Runtime(e.to_string()))?;
        Self::build(config, RuntimeHandle::Owned(runtime))
    }

    /// Create a fetcher spawning onto an existing runtime.
    pub fn with_handle(handle: Handle, config: FetcherConfig) -> Result<Self> {
        Self::build(config, RuntimeHandle::Shared(handle))
    }

    fn build(config: FetcherConfig, runtime: RuntimeHandle) -> Result<Self> {
        let client = config.build_client()?;
        let (sender, receiver) = crossbeam_channel::unbounded();
        Ok(Self {
            client,
            config,
            runtime,
            sender,
            receiver,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Start a GET request.
    ///
    /// Requests that cannot be built (bad URL or header) complete
    /// immediately with an error.
    pub fn get(&self, url: &str, headers: &[(String, String)]) -> RequestId {
        let id = RequestId::next();
        let request = match self.build_request(url, headers) {
            Ok(request) => request,
            Err(error) => {
                tracing::debug!(target: targets::NET, ?id, url, %error, "request rejected");
                let _ = self.sender.send(HttpCompletion { id, result: Err(error) });
                return id;
            }
        };

        self.in_flight.lock().insert(id, None);
        let sender = self.sender.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let task = self.runtime.handle().spawn(async move {
            let result = execute(request).await;
            if in_flight.lock().remove(&id).is_none() {
                return;
            }
            match &result {
                Ok(response) => tracing::debug!(target: targets::NET, ?id, status = response.status, "request finished"),
                Err(error) => tracing::debug!(target: targets::NET, ?id, %error, "request failed"),
            }
            let _ = sender.send(HttpCompletion { id, result });
        });

        if let Some(slot) = self.in_flight.lock().get_mut(&id) {
            *slot = Some(task.abort_handle());
        }
        tracing::trace!(target: targets::NET, ?id, url, "request started");
        id
    }

    /// Abandon a request. Its completion will not be delivered.
    ///
    /// Returns `false` if the request already completed or is unknown.
    pub fn cancel(&self, id: RequestId) -> bool {
        let Some(slot) = self.in_flight.lock().remove(&id) else {
            return false;
        };
        if let Some(handle) = slot {
            handle.abort();
        }
        tracing::trace!(target: targets::NET, ?id, "request cancelled");
        true
    }

    /// Number of requests started but neither completed nor cancelled.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Take the next queued completion, if any.
    pub fn try_recv(&self) -> Option<HttpCompletion> {
        self.receiver.try_recv().ok()
    }

    /// Take every queued completion.
    pub fn drain(&self) -> Vec<HttpCompletion> {
        self.receiver.try_iter().collect()
    }

    /// Block until a completion arrives or `timeout` elapses.
    ///
    /// Must not be called from inside the fetcher's runtime.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<HttpCompletion> {
        self.receiver.recv_timeout(timeout).ok()
    }

    fn build_request(&self, url: &str, headers: &[(String, String)]) -> Result<reqwest::RequestBuilder> {
        let url = match &self.config.base_url {
            Some(base) => base.join(url)?,
            None => Url::parse(url)?,
        };
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            header_map.insert(HeaderName::from_bytes(name.as_bytes())?, HeaderValue::from_str(value)?);
        }
        Ok(self.client.get(url).headers(header_map))
    }
}

impl Drop for HttpContentFetcher {
    fn drop(&mut self) {
        for (_, slot) in self.in_flight.lock().drain() {
            if let Some(handle) = slot {
                handle.abort();
            }
        }
    }
}

async fn execute(request: reqwest::RequestBuilder) -> Result<HttpResponse> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let body = response.text().await?;
    Ok(HttpResponse { status, url, body })
}
