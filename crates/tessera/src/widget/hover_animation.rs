//! Replays a CSS animation on a target whenever the pointer enters an
//! element.

use tessera_core::Signal;
use tessera_core::logging::targets;

use crate::dom::{Document, DomEvent, EventKind, ListenerOwner, NodeId, WidgetId};
use crate::error::{Error, Result};

const WIDGET: &str = "HoverAnimation";

/// Builder for [`HoverAnimation`].
#[derive(Debug, Default)]
pub struct HoverAnimationBuilder {
    element: Option<NodeId>,
    target: Option<NodeId>,
    is_animating_class: Option<String>,
}

impl HoverAnimationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hovered element.
    pub fn element(mut self, element: NodeId) -> Self {
        self.element = Some(element);
        self
    }

    /// The animated element.
    pub fn target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn is_animating_class(mut self, class: impl Into<String>) -> Self {
        self.is_animating_class = Some(class.into());
        self
    }

    pub fn build(self) -> Result<HoverAnimation> {
        Ok(HoverAnimation {
            id: WidgetId::new(),
            element: self.element.ok_or(Error::missing(WIDGET, "element"))?,
            target: self.target.ok_or(Error::missing(WIDGET, "target"))?,
            is_animating_class: self.is_animating_class.unwrap_or_else(|| "is-animating".into()),
            is_initialized: false,
            initialized: Signal::new(),
            destroyed: Signal::new(),
        })
    }
}

/// Adds the animating class on `mouseenter`, removes it on the target's
/// `animationend`.
pub struct HoverAnimation {
    id: WidgetId,
    element: NodeId,
    target: NodeId,
    is_animating_class: String,
    is_initialized: bool,

    pub initialized: Signal<()>,
    pub destroyed: Signal<()>,
}

impl std::fmt::Debug for HoverAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoverAnimation")
            .field("id", &self.id)
            .field("element", &self.element)
            .field("target", &self.target)
            .field("is_initialized", &self.is_initialized)
            .finish()
    }
}

impl HoverAnimation {
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.is_initialized {
            return;
        }
        let owner = ListenerOwner::HoverAnimation(self.id);
        doc.add_listener(self.element, EventKind::MouseEnter, owner);
        doc.add_listener(self.target, EventKind::AnimationEnd, owner);
        self.is_initialized = true;
        tracing::trace!(target: targets::HOVER, id = ?self.id, "hover animation initialized");
        self.initialized.emit(());
    }

    pub fn destroy(&mut self, doc: &mut dyn Document) {
        if !self.is_initialized {
            return;
        }
        let owner = ListenerOwner::HoverAnimation(self.id);
        doc.remove_listener(self.element, EventKind::MouseEnter, owner);
        doc.remove_listener(self.target, EventKind::AnimationEnd, owner);
        self.is_initialized = false;
        self.destroyed.emit(());
    }

    pub fn handle_event(&mut self, doc: &mut dyn Document, event: &DomEvent) {
        match event {
            DomEvent::MouseEnter { target } if doc.contains(self.element, *target) => {
                doc.add_class(self.target, &self.is_animating_class);
            }
            DomEvent::AnimationEnd { target, .. } if *target == self.target => {
                doc.remove_class(self.target, &self.is_animating_class);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    #[test]
    fn test_hover_replays_animation() {
        let mut doc = MemoryDocument::from_body_html(r#"<a id="card" href="/"><span id="icon"></span></a>"#);
        let element = doc.query_selector(doc.body(), "#card").unwrap();
        let target = doc.query_selector(doc.body(), "#icon").unwrap();
        let mut hover = HoverAnimationBuilder::new().element(element).target(target).build().unwrap();
        hover.init(&mut doc);

        hover.handle_event(&mut doc, &DomEvent::MouseEnter { target: element });
        assert!(doc.has_class(target, "is-animating"));

        let end = DomEvent::AnimationEnd {
            target,
            animation_name: "wiggle".into(),
        };
        hover.handle_event(&mut doc, &end);
        assert!(!doc.has_class(target, "is-animating"));

        hover.destroy(&mut doc);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_missing_target() {
        let doc = MemoryDocument::new();
        let err = HoverAnimationBuilder::new().element(doc.body()).build().unwrap_err();
        assert!(matches!(err, Error::MissingOption { option: "target", .. }));
    }
}
