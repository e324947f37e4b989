//! Content sources for modal items.
//!
//! Image and video items are loaded by the host and reported back through
//! `load`/`loadedmetadata`/`error` events. Embedded players are resolved
//! from their page URL. Ajax content goes through a [`ContentFetcher`],
//! which runs the request elsewhere and hands back a [`FetchCompletion`]
//! carrying the ticket of the request it answers.

use std::collections::VecDeque;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use regex::Regex;

// =============================================================================
// Load errors
// =============================================================================

/// Why a modal ended up without content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The host failed to load an image or video.
    #[error("Failed to load media '{url}'")]
    MediaFailed { url: String },

    /// The video id could not be extracted from the source URL.
    #[error("No video id found in '{url}'")]
    UnrecognizedVideoUrl { url: String },

    /// The dialog template selector matched nothing.
    #[error("Dialog template '{selector}' not found")]
    MissingTemplate { selector: String },

    /// The ajax request completed with a status other than 200.
    #[error("Request to '{url}' returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// The ajax request failed before a response arrived.
    #[error("Request to '{url}' failed: {message}")]
    Transport { url: String, message: String },
}

// =============================================================================
// Embedded video players
// =============================================================================

static YOUTUBE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(youtube|youtu)\.(com|be)/(watch\?v=([\w-]+)|([\w-]+))")
        .expect("YouTube regex should compile")
});

static VIMEO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vimeo\.com/([\w-]+)").expect("Vimeo regex should compile"));

/// Extract a YouTube video id from a `youtube.com/watch?v=ID` or
/// `youtu.be/ID` URL.
pub fn youtube_id(url: &str) -> Option<&str> {
    let captures = YOUTUBE_PATTERN.captures(url)?;
    let group = if captures.get(1)?.as_str() == "youtube" { 4 } else { 5 };
    captures.get(group).map(|m| m.as_str())
}

/// Extract a Vimeo video id from a `vimeo.com/ID` URL.
pub fn vimeo_id(url: &str) -> Option<&str> {
    VIMEO_PATTERN.captures(url)?.get(1).map(|m| m.as_str())
}

/// An embedded player iframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedFrame {
    pub src: String,
    pub width: &'static str,
    pub height: &'static str,
}

impl EmbedFrame {
    pub fn youtube(id: &str) -> Self {
        Self {
            src: format!("https://www.youtube.com/embed/{id}?rel=0&autoplay=1&showinfo=0"),
            width: "560px",
            height: "315px",
        }
    }

    pub fn vimeo(id: &str) -> Self {
        Self {
            src: format!("https://player.vimeo.com/video/{id}?autoplay=1&title=0&byline=0&portrait=0"),
            width: "640px",
            height: "272px",
        }
    }
}

// =============================================================================
// Fetching
// =============================================================================

/// Identifies one fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// A GET request for modal content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    /// A request marked as an asynchronous page request.
    pub fn ajax(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: vec![("X-Requested-With".into(), "XMLHttpRequest".into())],
        }
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// The outcome of a fetch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCompletion {
    pub ticket: FetchTicket,
    /// The response, or the transport failure message.
    pub result: Result<FetchResponse, String>,
}

/// Runs ajax requests for the modal layer.
///
/// Completions are collected with [`poll`](Self::poll) on the UI thread.
/// After [`cancel`](Self::cancel) a fetcher should not report the ticket
/// any more; the modal layer ignores unknown tickets either way.
pub trait ContentFetcher: Send {
    /// Start a request.
    fn fetch(&mut self, request: FetchRequest) -> FetchTicket;

    /// Abandon a request.
    fn cancel(&mut self, ticket: FetchTicket);

    /// Drain the completions that arrived since the last poll.
    fn poll(&mut self) -> Vec<FetchCompletion>;
}

/// An in-memory fetcher whose responses are supplied by hand.
///
/// Clones share their state, so a test can keep a handle while the modal
/// layer owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    state: Arc<Mutex<MemoryFetcherState>>,
}

#[derive(Debug, Default)]
struct MemoryFetcherState {
    next_ticket: u64,
    pending: Vec<(FetchTicket, FetchRequest)>,
    completed: VecDeque<FetchCompletion>,
    cancelled: Vec<FetchTicket>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that have not been answered or cancelled.
    pub fn pending(&self) -> Vec<(FetchTicket, FetchRequest)> {
        self.state.lock().pending.clone()
    }

    /// Tickets cancelled so far.
    pub fn cancelled(&self) -> Vec<FetchTicket> {
        self.state.lock().cancelled.clone()
    }

    /// Answer a pending request. Returns `false` for unknown tickets.
    pub fn respond(&self, ticket: FetchTicket, status: u16, body: impl Into<String>) -> bool {
        self.complete(
            ticket,
            Ok(FetchResponse {
                status,
                body: body.into(),
            }),
        )
    }

    /// Fail a pending request with a transport error.
    pub fn fail(&self, ticket: FetchTicket, message: impl Into<String>) -> bool {
        self.complete(ticket, Err(message.into()))
    }

    /// Queue a completion for a ticket regardless of its state, as a slow
    /// transport may do after cancellation.
    pub fn push_completion(&self, completion: FetchCompletion) {
        self.state.lock().completed.push_back(completion);
    }

    fn complete(&self, ticket: FetchTicket, result: Result<FetchResponse, String>) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.pending.iter().position(|(t, _)| *t == ticket) else {
            return false;
        };
        state.pending.remove(index);
        state.completed.push_back(FetchCompletion { ticket, result });
        true
    }
}

impl ContentFetcher for MemoryFetcher {
    fn fetch(&mut self, request: FetchRequest) -> FetchTicket {
        let mut state = self.state.lock();
        state.next_ticket += 1;
        let ticket = FetchTicket(state.next_ticket);
        state.pending.push((ticket, request));
        ticket
    }

    fn cancel(&mut self, ticket: FetchTicket) {
        let mut state = self.state.lock();
        state.pending.retain(|(t, _)| *t != ticket);
        state.completed.retain(|c| c.ticket != ticket);
        state.cancelled.push(ticket);
    }

    fn poll(&mut self) -> Vec<FetchCompletion> {
        self.state.lock().completed.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_ids() {
        assert_eq!(youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(youtube_id("https://youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(youtube_id("https://youtu.be/a-b_c?t=10"), Some("a-b_c"));
        assert_eq!(youtube_id("https://www.youtube.com/embed/xyz"), None);
        assert_eq!(youtube_id("https://example.com/video"), None);
    }

    #[test]
    fn test_vimeo_ids() {
        assert_eq!(vimeo_id("https://vimeo.com/76979871"), Some("76979871"));
        assert_eq!(vimeo_id("https://youtu.be/abc"), None);
    }

    #[test]
    fn test_embed_frames() {
        let frame = EmbedFrame::youtube("abc");
        assert_eq!(frame.src, "https://www.youtube.com/embed/abc?rel=0&autoplay=1&showinfo=0");
        assert_eq!((frame.width, frame.height), ("560px", "315px"));
        assert_eq!(EmbedFrame::vimeo("42").width, "640px");
    }

    #[test]
    fn test_memory_fetcher() {
        let mut fetcher = MemoryFetcher::new();
        let first = fetcher.fetch(FetchRequest::ajax("/a"));
        let second = fetcher.fetch(FetchRequest::ajax("/b"));
        assert_eq!(
            fetcher.pending()[0].1.headers,
            vec![("X-Requested-With".to_string(), "XMLHttpRequest".to_string())]
        );

        fetcher.cancel(first);
        assert!(!fetcher.respond(first, 200, "late"));
        assert!(fetcher.respond(second, 404, "missing"));

        let completions = fetcher.poll();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].ticket, second);
        assert!(fetcher.poll().is_empty());
    }
}
