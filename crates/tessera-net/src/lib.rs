//! Networking module for Tessera.
//!
//! This crate fetches remote page fragments for ajax modals:
//!
//! - **HTTP fetching**: GET requests executed by `reqwest` on a Tokio
//!   runtime
//! - **Completion polling**: results are queued on a channel and collected
//!   by the UI thread, which never awaits
//! - **Cancellation**: abandoned requests are aborted and never reported
//!
//! ```ignore
//! use tessera_net::HttpContentFetcher;
//!
//! let fetcher = HttpContentFetcher::new()?;
//! let id = fetcher.get("https://example.com/fragment", &[]);
//!
//! // In the UI loop:
//! while let Some(completion) = fetcher.try_recv() {
//!     match completion.result {
//!         Ok(response) => println!("{:?}: HTTP {}", completion.id, response.status),
//!         Err(error) => println!("{:?} failed: {error}", completion.id),
//!     }
//! }
//! ```

mod error;
mod fetcher;

pub use error::{FetchError, Result};
pub use fetcher::{FetcherConfig, HttpCompletion, HttpContentFetcher, HttpResponse, RequestId};
