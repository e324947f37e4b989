//! Focus trapping for overlays.
//!
//! A [`FocusTrap`] keeps keyboard focus inside a container: Tab on the last
//! focusable element wraps to the first, Shift+Tab on the first wraps to the
//! last. The focusable set is a snapshot taken by [`FocusTrap::capture`] and
//! must be refreshed whenever the container's content changes.

use tessera_core::logging::targets;

use crate::dom::{Document, EventFlow, NodeId};

/// Tab/Shift+Tab cycling inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTrap {
    container: NodeId,
    focusables: Vec<NodeId>,
}

impl FocusTrap {
    /// Create an empty trap for `container`.
    pub fn new(container: NodeId) -> Self {
        Self {
            container,
            focusables: Vec::new(),
        }
    }

    /// The trapping container.
    #[inline]
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// The focusable snapshot, in document order.
    #[inline]
    pub fn focusables(&self) -> &[NodeId] {
        &self.focusables
    }

    /// Snapshot the focusable descendants of the container.
    pub fn capture(&mut self, doc: &dyn Document) {
        self.focusables = doc.focusable_descendants(self.container);
    }

    /// Snapshot and move focus to the first focusable element. A container
    /// without focusable content is made focusable and focused itself.
    pub fn capture_and_focus(&mut self, doc: &mut dyn Document) {
        self.capture(doc);
        match self.focusables.first() {
            Some(first) => doc.focus(*first),
            None => {
                doc.set_attribute(self.container, "tabindex", "-1");
                doc.focus(self.container);
            }
        }
        tracing::trace!(
            target: targets::MODAL,
            focusables = self.focusables.len(),
            "focus moved into trap"
        );
    }

    /// Handle a Tab key press. Wrapping prevents the default action.
    pub fn handle_tab(&self, doc: &mut dyn Document, shift: bool, flow: &mut EventFlow) {
        let (Some(first), Some(last)) = (self.focusables.first(), self.focusables.last()) else {
            return;
        };
        let active = doc.active_element();
        if shift {
            if active == Some(*first) {
                flow.prevent_default();
                doc.focus(*last);
            }
        } else if active == Some(*last) {
            flow.prevent_default();
            doc.focus(*first);
        }
    }

    /// Forget the snapshot.
    pub fn clear(&mut self) {
        self.focusables.clear();
    }
}
