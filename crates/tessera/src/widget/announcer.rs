//! Assistive live-region announcements.
//!
//! The [`Announcer`] writes short messages into a live region and clears
//! the region again after a timeout. Messages can be queued from signal
//! slots through an [`AnnouncementSender`]; the application drains the
//! queue on its own thread.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tessera_core::logging::targets;
use tessera_core::{Signal, TimerId};

use crate::dom::{Document, ListenerOwner, NodeId};

/// Default time before an announcement is cleared.
pub const DEFAULT_ANNOUNCEMENT_TIMEOUT: Duration = Duration::from_millis(7000);

/// A cloneable handle queueing announcements.
pub type AnnouncementSender = Sender<String>;

/// Writes announcements into a live region.
pub struct Announcer {
    region: NodeId,
    timeout: Duration,
    timer: Option<TimerId>,
    sender: Sender<String>,
    receiver: Receiver<String>,

    /// Emitted with every announced text.
    pub announced: Signal<String>,
    /// Emitted when the region is cleared by the timeout.
    pub cleared: Signal<()>,
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("region", &self.region)
            .field("timeout", &self.timeout)
            .field("timer", &self.timer)
            .field("queued", &self.receiver.len())
            .finish()
    }
}

impl Announcer {
    /// Create an announcer for `region` with the default timeout.
    pub fn new(region: NodeId) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            region,
            timeout: DEFAULT_ANNOUNCEMENT_TIMEOUT,
            timer: None,
            sender,
            receiver,
            announced: Signal::new(),
            cleared: Signal::new(),
        }
    }

    /// Use a different clearing timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn region(&self) -> NodeId {
        self.region
    }

    /// A handle that queues announcements for [`drain`](Self::drain).
    pub fn sender(&self) -> AnnouncementSender {
        self.sender.clone()
    }

    /// Mark the region as an assertive live log.
    pub fn init(&self, doc: &mut dyn Document) {
        doc.set_attribute(self.region, "role", "log");
        doc.set_attribute(self.region, "aria-live", "assertive");
        doc.set_attribute(self.region, "aria-relevant", "additions");
        doc.set_attribute(self.region, "aria-atomic", "true");
    }

    /// Replace the region's text and restart the clearing timer.
    pub fn announce(&mut self, doc: &mut dyn Document, text: &str) {
        doc.set_text_content(self.region, text);
        if let Some(timer) = self.timer.take() {
            doc.cancel_timer(timer);
        }
        self.timer = Some(doc.start_timer(self.timeout, ListenerOwner::Announcer));
        tracing::debug!(target: targets::ANNOUNCER, text, "announced");
        self.announced.emit(text.to_owned());
    }

    /// Announce every queued message in order. Returns how many were
    /// announced.
    pub fn drain(&mut self, doc: &mut dyn Document) -> usize {
        let queued: Vec<String> = self.receiver.try_iter().collect();
        for text in &queued {
            self.announce(doc, text);
        }
        queued.len()
    }

    /// Handle a fired timer owned by the announcer. Stale timers are
    /// ignored.
    pub fn handle_timer(&mut self, doc: &mut dyn Document, timer: TimerId) {
        if self.timer != Some(timer) {
            return;
        }
        self.timer = None;
        doc.set_text_content(self.region, "");
        self.cleared.emit(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    fn setup() -> (MemoryDocument, Announcer) {
        let mut doc = MemoryDocument::from_body_html(r#"<div id="alert"></div>"#);
        let region = doc.query_selector(doc.body(), "#alert").unwrap();
        let announcer = Announcer::new(region);
        announcer.init(&mut doc);
        (doc, announcer)
    }

    fn fire(doc: &mut MemoryDocument, announcer: &mut Announcer, elapsed: Duration) {
        for (timer, owner) in doc.advance_timers(elapsed) {
            assert_eq!(owner, ListenerOwner::Announcer);
            announcer.handle_timer(doc, timer);
        }
    }

    #[test]
    fn test_init_marks_live_region() {
        let (doc, announcer) = setup();
        assert_eq!(doc.attribute(announcer.region(), "role").as_deref(), Some("log"));
        assert_eq!(doc.attribute(announcer.region(), "aria-live").as_deref(), Some("assertive"));
        assert_eq!(doc.attribute(announcer.region(), "aria-atomic").as_deref(), Some("true"));
    }

    #[test]
    fn test_announcement_clears_after_timeout() {
        let (mut doc, mut announcer) = setup();
        announcer.announce(&mut doc, "Slide 2 displayed");
        assert_eq!(doc.text_content(announcer.region()), "Slide 2 displayed");

        fire(&mut doc, &mut announcer, Duration::from_millis(6999));
        assert_eq!(doc.text_content(announcer.region()), "Slide 2 displayed");
        fire(&mut doc, &mut announcer, Duration::from_millis(1));
        assert_eq!(doc.text_content(announcer.region()), "");
    }

    #[test]
    fn test_new_announcement_restarts_timer() {
        let (mut doc, mut announcer) = setup();
        announcer.announce(&mut doc, "first");
        fire(&mut doc, &mut announcer, Duration::from_millis(5000));
        announcer.announce(&mut doc, "second");
        fire(&mut doc, &mut announcer, Duration::from_millis(5000));
        assert_eq!(doc.text_content(announcer.region()), "second");
        assert_eq!(doc.pending_timer_count(), 1);
    }

    #[test]
    fn test_queued_announcements() {
        let (mut doc, mut announcer) = setup();
        let sender = announcer.sender();
        sender.send("one".into()).unwrap();
        sender.send("two".into()).unwrap();

        assert_eq!(announcer.drain(&mut doc), 2);
        assert_eq!(doc.text_content(announcer.region()), "two");
        assert_eq!(announcer.drain(&mut doc), 0);
    }
}
