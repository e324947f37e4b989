//! Modal overlays.
//!
//! A [`Modal`] describes one piece of content (an image, a video, an
//! embedded player, a dialog template or an ajax fragment) and optionally
//! the trigger that opens it. Modals are owned by the [`ModalLayer`], the
//! document-wide singleton that creates the overlay, loads the content,
//! traps focus and tears everything down again.
//!
//! # Lifecycle
//!
//! ```text
//! no wrapper -> opening -> opened -> closing -> removed
//! ```
//!
//! When both an open and a close animation name are configured the
//! transitions wait for `animationend`; otherwise closing removes the
//! overlay immediately.
//!
//! # Degraded loads
//!
//! A load that fails (media error, unrecognized video URL, missing dialog
//! template, non-200 or failed ajax request) leaves the overlay open
//! without a content item, restores focus to the element that was active
//! when the modal opened and emits `load_failed` with a [`LoadError`].

mod content;
#[cfg(feature = "networking")]
mod http;

use std::str::FromStr;

use serde::Deserialize;
use tessera_core::Signal;
use tessera_core::logging::targets;

pub use content::{
    ContentFetcher, EmbedFrame, FetchCompletion, FetchRequest, FetchResponse, FetchTicket, LoadError,
    MemoryFetcher, vimeo_id, youtube_id,
};

use super::focus::FocusTrap;
use crate::dom::{Document, DomEvent, EventFlow, EventKind, Key, ListenerOwner, NodeId, WidgetId};
use crate::error::{Error, Result};

const WIDGET: &str = "Modal";

// =============================================================================
// Configuration
// =============================================================================

/// The kind of content a modal shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalType {
    Image,
    Video,
    YouTube,
    Vimeo,
    Dialog,
    Ajax,
}

impl ModalType {
    /// Markup name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::YouTube => "youtube",
            Self::Vimeo => "vimeo",
            Self::Dialog => "dialog",
            Self::Ajax => "ajax",
        }
    }
}

impl FromStr for ModalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "youtube" => Ok(Self::YouTube),
            "vimeo" => Ok(Self::Vimeo),
            "dialog" => Ok(Self::Dialog),
            "ajax" => Ok(Self::Ajax),
            other => Err(Error::UnsupportedModalType(other.to_owned())),
        }
    }
}

impl std::fmt::Display for ModalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class names applied by the modal layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModalClasses {
    pub modal: String,
    pub modal_backdrop: String,
    pub modal_close: String,
    pub modal_item: String,
    pub modal_item_ajax: String,
    pub modal_item_dialog: String,
    pub modal_item_image: String,
    pub modal_item_video: String,
    pub modal_item_vimeo: String,
    pub modal_item_youtube: String,
    pub modal_spinner: String,
    pub is_closed: String,
    pub is_closing: String,
    pub is_loaded: String,
    pub is_modal_opened: String,
    pub is_opened: String,
    pub is_opening: String,
}

impl Default for ModalClasses {
    fn default() -> Self {
        Self {
            modal: "modal".into(),
            modal_backdrop: "modal-backdrop".into(),
            modal_close: "modal-close".into(),
            modal_item: "modal-item".into(),
            modal_item_ajax: "modal-item--ajax".into(),
            modal_item_dialog: "modal-item--dialog".into(),
            modal_item_image: "modal-item--image".into(),
            modal_item_video: "modal-item--video".into(),
            modal_item_vimeo: "modal-item--vimeo".into(),
            modal_item_youtube: "modal-item--youtube".into(),
            modal_spinner: "modal-spinner".into(),
            is_closed: "is-closed".into(),
            is_closing: "is-closing".into(),
            is_loaded: "is-loaded".into(),
            is_modal_opened: "is-modal-opened".into(),
            is_opened: "is-opened".into(),
            is_opening: "is-opening".into(),
        }
    }
}

/// Behavioral options of a modal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModalOptions {
    pub close_on_backdrop_click: bool,
    pub close_on_esc: bool,
    /// Create a close button inside the overlay.
    pub close_button: bool,
    pub close_button_label: Option<String>,
    /// `aria-label` of the overlay.
    pub item_label: Option<String>,
    /// Extra classes for the overlay.
    pub custom_classes: Vec<String>,
    /// Extra classes for the content item.
    pub custom_item_classes: Vec<String>,
    /// Elements inside dialog or ajax content that close the modal.
    pub custom_close_trigger_selector: Option<String>,
    /// Elements inside dialog or ajax content that accept the modal.
    pub custom_accept_trigger_selector: Option<String>,
    pub open_animation_name: Option<String>,
    pub close_animation_name: Option<String>,
    pub classes: ModalClasses,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            close_on_backdrop_click: true,
            close_on_esc: true,
            close_button: true,
            close_button_label: Some("Close modal".into()),
            item_label: None,
            custom_classes: Vec::new(),
            custom_item_classes: Vec::new(),
            custom_close_trigger_selector: None,
            custom_accept_trigger_selector: None,
            open_animation_name: None,
            close_animation_name: None,
            classes: ModalClasses::default(),
        }
    }
}

impl ModalOptions {
    /// Transitions wait for `animationend` only when both names are set.
    pub fn has_animation(&self) -> bool {
        self.open_animation_name.is_some() && self.close_animation_name.is_some()
    }
}

// =============================================================================
// Modal
// =============================================================================

/// Builder for [`Modal`].
#[derive(Debug, Default)]
pub struct ModalBuilder {
    modal_type: Option<std::result::Result<ModalType, String>>,
    source: Option<String>,
    trigger: Option<NodeId>,
    options: ModalOptions,
}

impl ModalBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal_type(mut self, modal_type: ModalType) -> Self {
        self.modal_type = Some(Ok(modal_type));
        self
    }

    /// Set the type from its markup name. Unsupported names fail in
    /// [`build`](Self::build).
    pub fn modal_type_str(mut self, name: &str) -> Self {
        self.modal_type = Some(name.parse::<ModalType>().map_err(|_| name.to_owned()));
        self
    }

    /// URL of the media, page or ajax fragment, or the dialog template
    /// selector.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn trigger(mut self, trigger: NodeId) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn options(mut self, options: ModalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Modal> {
        let modal_type = self
            .modal_type
            .ok_or(Error::missing(WIDGET, "type"))?
            .map_err(Error::UnsupportedModalType)?;
        let source = self.source.ok_or(Error::missing(WIDGET, "source"))?;
        Ok(Modal {
            id: WidgetId::new(),
            modal_type,
            source,
            trigger: self.trigger,
            options: self.options,
            is_accepted: false,
            is_trigger_initialized: false,
            trigger_initialized: Signal::new(),
            trigger_removed: Signal::new(),
            opened: Signal::new(),
            loaded: Signal::new(),
            load_failed: Signal::new(),
            closed: Signal::new(),
            accepted: Signal::new(),
            removed: Signal::new(),
        })
    }
}

/// Nodes of the overlay, passed to the `opened` and `closed` signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalParts {
    pub wrapper: NodeId,
    pub backdrop: NodeId,
    pub spinner: NodeId,
    /// The content item, once loaded.
    pub item: Option<NodeId>,
    pub close_button: Option<NodeId>,
}

/// One modal content description.
pub struct Modal {
    id: WidgetId,
    modal_type: ModalType,
    source: String,
    trigger: Option<NodeId>,
    options: ModalOptions,
    is_accepted: bool,
    is_trigger_initialized: bool,

    pub trigger_initialized: Signal<()>,
    pub trigger_removed: Signal<()>,
    /// Emitted when the overlay is created.
    pub opened: Signal<ModalParts>,
    /// Emitted when the content item is in place.
    pub loaded: Signal<()>,
    /// Emitted when the content could not be loaded.
    pub load_failed: Signal<LoadError>,
    /// Emitted when closing starts.
    pub closed: Signal<ModalParts>,
    pub accepted: Signal<()>,
    /// Emitted after the overlay is detached.
    pub removed: Signal<()>,
}

impl std::fmt::Debug for Modal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modal")
            .field("id", &self.id)
            .field("modal_type", &self.modal_type)
            .field("source", &self.source)
            .field("trigger", &self.trigger)
            .field("is_accepted", &self.is_accepted)
            .finish()
    }
}

impl Modal {
    #[inline]
    pub fn id(&self) -> WidgetId {
        self.id
    }

    #[inline]
    pub fn modal_type(&self) -> ModalType {
        self.modal_type
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn trigger(&self) -> Option<NodeId> {
        self.trigger
    }

    /// Whether the modal was accepted. Sticky once set.
    #[inline]
    pub fn is_accepted(&self) -> bool {
        self.is_accepted
    }

    #[inline]
    pub fn is_trigger_initialized(&self) -> bool {
        self.is_trigger_initialized
    }

    #[inline]
    pub fn options(&self) -> &ModalOptions {
        &self.options
    }
}

// =============================================================================
// Layer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    Media(NodeId),
    Fetch(FetchTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CustomAction {
    Close,
    Accept,
}

/// State of the overlay while a wrapper exists.
#[derive(Debug)]
struct Session {
    owner: WidgetId,
    parts: ModalParts,
    is_opened: bool,
    active_element: Option<NodeId>,
    trap: FocusTrap,
    pending: Pending,
    custom_triggers: Vec<(NodeId, CustomAction)>,
    listeners: Vec<(NodeId, EventKind)>,
}

impl Session {
    fn listen(&mut self, doc: &mut dyn Document, node: NodeId, kind: EventKind) {
        doc.add_listener(node, kind, ListenerOwner::ModalLayer);
        self.listeners.push((node, kind));
    }

    fn await_media(&mut self, doc: &mut dyn Document, item: NodeId, ready: EventKind) {
        self.listen(doc, item, ready);
        self.listen(doc, item, EventKind::Error);
        self.pending = Pending::Media(item);
    }

    /// Classify, append and focus a content item.
    fn attach_item(&mut self, doc: &mut dyn Document, modal: &Modal, item: NodeId, type_classes: &[&str]) {
        let classes = &modal.options.classes;
        doc.add_class(item, &classes.modal_item);
        for class in type_classes {
            doc.add_class(item, class);
        }
        for class in &modal.options.custom_item_classes {
            doc.add_class(item, class);
        }
        doc.append_child(self.parts.wrapper, item);
        doc.add_class(self.parts.wrapper, &classes.is_loaded);
        self.parts.item = Some(item);
        self.pending = Pending::None;
        self.trap.capture_and_focus(doc);
        tracing::debug!(target: targets::MODAL, id = ?modal.id, modal_type = %modal.modal_type, "modal content loaded");
    }

    fn wire_custom_triggers(&mut self, doc: &mut dyn Document, modal: &Modal, item: NodeId) {
        let selectors = [
            (&modal.options.custom_close_trigger_selector, CustomAction::Close),
            (&modal.options.custom_accept_trigger_selector, CustomAction::Accept),
        ];
        for (selector, action) in selectors {
            let Some(selector) = selector else {
                continue;
            };
            for node in doc.query_selector_all(item, selector) {
                self.listen(doc, node, EventKind::Click);
                self.custom_triggers.push((node, action));
            }
        }
    }

    fn fail(&mut self, doc: &mut dyn Document, modal: &Modal, error: LoadError) {
        tracing::warn!(target: targets::MODAL, id = ?modal.id, %error, "modal content failed to load");
        self.pending = Pending::None;
        self.trap.capture(doc);
        if let Some(active) = self.active_element {
            doc.focus(active);
        }
        modal.load_failed.emit(error);
    }
}

/// The document-wide modal overlay and the modals that can fill it.
pub struct ModalLayer {
    modals: Vec<Modal>,
    fetcher: Box<dyn ContentFetcher>,
    session: Option<Session>,
}

impl std::fmt::Debug for ModalLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalLayer")
            .field("modals", &self.modals.len())
            .field("session", &self.session)
            .finish()
    }
}

impl Default for ModalLayer {
    fn default() -> Self {
        Self::new(Box::new(MemoryFetcher::new()))
    }
}

impl ModalLayer {
    /// Create a layer loading ajax content through `fetcher`.
    pub fn new(fetcher: Box<dyn ContentFetcher>) -> Self {
        Self {
            modals: Vec::new(),
            fetcher,
            session: None,
        }
    }

    /// Replace the content fetcher.
    pub fn set_fetcher(&mut self, fetcher: Box<dyn ContentFetcher>) {
        self.fetcher = fetcher;
    }

    /// Take ownership of a built modal.
    pub fn insert(&mut self, modal: Modal) -> WidgetId {
        let id = modal.id;
        self.modals.push(modal);
        id
    }

    pub fn get(&self, id: WidgetId) -> Option<&Modal> {
        self.modals.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.modals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modals.is_empty()
    }

    /// Whether the overlay is open (not closing).
    pub fn is_opened(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_opened)
    }

    /// Whether the overlay exists, including while closing.
    pub fn is_wrapper_created(&self) -> bool {
        self.session.is_some()
    }

    /// The modal currently shown.
    pub fn active_modal(&self) -> Option<WidgetId> {
        self.session.as_ref().map(|s| s.owner)
    }

    /// Nodes of the current overlay.
    pub fn parts(&self) -> Option<ModalParts> {
        self.session.as_ref().map(|s| s.parts)
    }

    /// Focusable elements of the overlay captured at the last load.
    pub fn focusable_elements(&self) -> &[NodeId] {
        match &self.session {
            Some(session) => session.trap.focusables(),
            None => &[],
        }
    }

    // =========================================================================
    // Triggers
    // =========================================================================

    /// Listen for clicks on the modal's trigger.
    pub fn init_trigger(&mut self, doc: &mut dyn Document, id: WidgetId) {
        let Some(modal) = self.modals.iter_mut().find(|m| m.id == id) else {
            return;
        };
        let Some(trigger) = modal.trigger else {
            return;
        };
        if modal.is_trigger_initialized {
            return;
        }
        doc.add_listener(trigger, EventKind::Click, ListenerOwner::ModalTrigger(id));
        modal.is_trigger_initialized = true;
        modal.trigger_initialized.emit(());
    }

    /// Stop listening on the modal's trigger.
    pub fn remove_trigger(&mut self, doc: &mut dyn Document, id: WidgetId) {
        let Some(modal) = self.modals.iter_mut().find(|m| m.id == id) else {
            return;
        };
        let Some(trigger) = modal.trigger else {
            return;
        };
        if !modal.is_trigger_initialized {
            return;
        }
        doc.remove_listener(trigger, EventKind::Click, ListenerOwner::ModalTrigger(id));
        modal.is_trigger_initialized = false;
        modal.trigger_removed.emit(());
    }

    /// Handle an event delivered to the trigger of modal `id`.
    pub fn handle_trigger_event(&mut self, doc: &mut dyn Document, id: WidgetId, event: &DomEvent, flow: &mut EventFlow) {
        if let DomEvent::Click { .. } = event {
            flow.prevent_default();
            self.open(doc, id);
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create the overlay for modal `id` and start loading its content.
    /// Ignored while an overlay exists.
    pub fn open(&mut self, doc: &mut dyn Document, id: WidgetId) {
        if self.session.is_some() {
            tracing::debug!(target: targets::MODAL, ?id, "modal layer busy, open ignored");
            return;
        }
        let Some(modal) = self.modals.iter().find(|m| m.id == id) else {
            return;
        };
        let options = &modal.options;
        let classes = &options.classes;
        let active_element = doc.active_element();

        let body = doc.body();
        let wrapper = doc.create_element("div");
        let backdrop = doc.create_element("div");
        let spinner = doc.create_element("div");
        doc.set_attribute(wrapper, "id", "modal");
        doc.add_class(wrapper, &classes.modal);
        doc.set_attribute(wrapper, "role", "dialog");
        doc.add_class(backdrop, &classes.modal_backdrop);
        doc.add_class(spinner, &classes.modal_spinner);
        doc.append_child(body, wrapper);
        doc.append_child(wrapper, backdrop);
        doc.append_child(wrapper, spinner);
        if let Some(label) = &options.item_label {
            doc.set_attribute(wrapper, "aria-label", label);
        }
        for class in &options.custom_classes {
            doc.add_class(wrapper, class);
        }

        let mut session = Session {
            owner: id,
            parts: ModalParts {
                wrapper,
                backdrop,
                spinner,
                item: None,
                close_button: None,
            },
            is_opened: false,
            active_element,
            trap: FocusTrap::new(wrapper),
            pending: Pending::None,
            custom_triggers: Vec::new(),
            listeners: Vec::new(),
        };
        if options.close_button {
            let button = doc.create_element("button");
            doc.add_class(button, &classes.modal_close);
            if let Some(label) = &options.close_button_label {
                doc.set_attribute(button, "aria-label", label);
            }
            doc.append_child(wrapper, button);
            session.listen(doc, button, EventKind::Click);
            session.parts.close_button = Some(button);
        }
        if options.close_on_backdrop_click {
            session.listen(doc, backdrop, EventKind::Click);
        }
        session.listen(doc, wrapper, EventKind::KeyDown);
        if options.has_animation() {
            session.listen(doc, wrapper, EventKind::AnimationEnd);
        }

        session.is_opened = true;
        doc.add_class(body, &classes.is_modal_opened);
        if options.has_animation() {
            doc.add_class(wrapper, &classes.is_opening);
        }
        tracing::debug!(target: targets::MODAL, ?id, modal_type = %modal.modal_type, "modal opened");

        Self::start_loading(doc, modal, &mut session, self.fetcher.as_mut());
        let parts = session.parts;
        self.session = Some(session);
        modal.opened.emit(parts);
    }

    /// Start closing the overlay. Without animation it is removed at once.
    pub fn close(&mut self, doc: &mut dyn Document) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_opened {
            return;
        }
        session.is_opened = false;
        let Some(modal) = self.modals.iter().find(|m| m.id == session.owner) else {
            return;
        };
        let classes = &modal.options.classes;
        let has_animation = modal.options.has_animation();
        let wrapper = session.parts.wrapper;
        if has_animation {
            doc.add_class(wrapper, &classes.is_closing);
            doc.remove_class(wrapper, &classes.is_opening);
        }
        doc.remove_class(wrapper, &classes.is_opened);
        let body = doc.body();
        doc.remove_class(body, &classes.is_modal_opened);
        tracing::debug!(target: targets::MODAL, id = ?modal.id, "modal closed");
        modal.closed.emit(session.parts);

        if !has_animation {
            self.remove(doc);
        }
    }

    /// Mark the shown modal as accepted. Only honored while opened.
    pub fn accept(&mut self) {
        let Some(session) = self.session.as_ref().filter(|s| s.is_opened) else {
            return;
        };
        let owner = session.owner;
        if let Some(modal) = self.modals.iter_mut().find(|m| m.id == owner) {
            modal.is_accepted = true;
            tracing::debug!(target: targets::MODAL, id = ?owner, "modal accepted");
            modal.accepted.emit(());
        }
    }

    /// Detach the overlay, closing it first when open. Idempotent.
    pub fn remove(&mut self, doc: &mut dyn Document) {
        if self.is_opened() {
            self.close(doc);
        }
        let Some(session) = self.session.take() else {
            return;
        };
        for (node, kind) in &session.listeners {
            doc.remove_listener(*node, *kind, ListenerOwner::ModalLayer);
        }
        if let Pending::Fetch(ticket) = session.pending {
            self.fetcher.cancel(ticket);
        }
        doc.remove_node(session.parts.wrapper);
        if let Some(active) = session.active_element {
            doc.focus(active);
        }
        tracing::debug!(target: targets::MODAL, id = ?session.owner, "modal removed");
        if let Some(modal) = self.get(session.owner) {
            modal.removed.emit(());
        }
    }

    // =========================================================================
    // Content
    // =========================================================================

    fn start_loading(
        doc: &mut dyn Document,
        modal: &Modal,
        session: &mut Session,
        fetcher: &mut dyn ContentFetcher,
    ) {
        let classes = &modal.options.classes;
        match modal.modal_type {
            ModalType::Image => {
                let item = doc.create_element("img");
                doc.set_attribute(item, "src", &modal.source);
                session.await_media(doc, item, EventKind::Load);
            }
            ModalType::Video => {
                let item = doc.create_element("video");
                doc.set_attribute(item, "src", &modal.source);
                doc.set_attribute(item, "autoplay", "");
                doc.set_attribute(item, "controls", "");
                session.await_media(doc, item, EventKind::LoadedMetadata);
            }
            ModalType::YouTube | ModalType::Vimeo => {
                let (frame, type_class) = if modal.modal_type == ModalType::YouTube {
                    (youtube_id(&modal.source).map(EmbedFrame::youtube), classes.modal_item_youtube.as_str())
                } else {
                    (vimeo_id(&modal.source).map(EmbedFrame::vimeo), classes.modal_item_vimeo.as_str())
                };
                let Some(frame) = frame else {
                    let url = modal.source.clone();
                    session.fail(doc, modal, LoadError::UnrecognizedVideoUrl { url });
                    return;
                };
                let item = doc.create_element("iframe");
                doc.set_attribute(item, "src", &frame.src);
                doc.set_attribute(item, "allowfullscreen", "");
                doc.set_attribute(item, "frameborder", "0");
                doc.set_attribute(item, "width", frame.width);
                doc.set_attribute(item, "height", frame.height);
                session.attach_item(doc, modal, item, &[type_class]);
                modal.loaded.emit(());
            }
            ModalType::Dialog => Self::load_dialog(doc, modal, session),
            ModalType::Ajax => {
                let ticket = fetcher.fetch(FetchRequest::ajax(modal.source.clone()));
                tracing::debug!(target: targets::MODAL, id = ?modal.id, ?ticket, url = %modal.source, "ajax content requested");
                session.pending = Pending::Fetch(ticket);
            }
        }
    }

    fn load_dialog(doc: &mut dyn Document, modal: &Modal, session: &mut Session) {
        let root = doc.root();
        let Some(template) = doc.query_selector(root, &modal.source) else {
            let selector = modal.source.clone();
            session.fail(doc, modal, LoadError::MissingTemplate { selector });
            return;
        };
        let item = doc.clone_node(template);
        doc.remove_attribute(item, "id");
        doc.set_attribute(item, "tabindex", "-1");
        doc.remove_attribute(item, "hidden");
        session.attach_item(doc, modal, item, &[modal.options.classes.modal_item_dialog.as_str()]);
        session.wire_custom_triggers(doc, modal, item);

        let labelledby = doc.attribute(item, "aria-labelledby").filter(|v| !v.is_empty());
        let describedby = doc.attribute(item, "aria-describedby").filter(|v| !v.is_empty());
        if labelledby.is_none() || describedby.is_none() {
            doc.set_attribute(item, "role", "document");
        }
        let wrapper = session.parts.wrapper;
        for (name, value) in [("aria-labelledby", labelledby), ("aria-describedby", describedby)] {
            if let Some(value) = value {
                doc.set_attribute(wrapper, name, &value);
                doc.remove_attribute(item, name);
            }
        }
        modal.loaded.emit(());
    }

    /// Drain the fetcher and apply its completions. Returns how many
    /// completions were received.
    pub fn pump(&mut self, doc: &mut dyn Document) -> usize {
        let completions = self.fetcher.poll();
        let count = completions.len();
        for completion in completions {
            self.apply_completion(doc, completion);
        }
        count
    }

    /// Apply one fetch completion. Completions for tickets other than the
    /// pending one are ignored.
    pub fn apply_completion(&mut self, doc: &mut dyn Document, completion: FetchCompletion) {
        let Some(session) = self.session.as_mut() else {
            tracing::trace!(target: targets::MODAL, ticket = ?completion.ticket, "stale fetch completion ignored");
            return;
        };
        if session.pending != Pending::Fetch(completion.ticket) {
            tracing::trace!(target: targets::MODAL, ticket = ?completion.ticket, "stale fetch completion ignored");
            return;
        }
        session.pending = Pending::None;
        let Some(modal) = self.modals.iter().find(|m| m.id == session.owner) else {
            return;
        };
        let url = modal.source.clone();
        match completion.result {
            Ok(response) if response.status == 200 => {
                let classes = &modal.options.classes;
                let item = doc.create_element("div");
                doc.set_attribute(item, "tabindex", "-1");
                doc.set_inner_html(item, &response.body);
                session.attach_item(doc, modal, item, &[classes.modal_item_dialog.as_str(), classes.modal_item_ajax.as_str()]);
                session.wire_custom_triggers(doc, modal, item);
                modal.loaded.emit(());
            }
            Ok(response) => {
                let status = response.status;
                session.fail(doc, modal, LoadError::HttpStatus { url, status });
            }
            Err(message) => session.fail(doc, modal, LoadError::Transport { url, message }),
        }
    }

    // =========================================================================
    // Event handling
    // =========================================================================

    /// Handle an event delivered to a listener installed by the layer.
    pub fn handle_event(&mut self, doc: &mut dyn Document, event: &DomEvent, flow: &mut EventFlow) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(index) = self.modals.iter().position(|m| m.id == session.owner) else {
            return;
        };

        match event {
            DomEvent::Click { target } => {
                let target = *target;
                let options = &self.modals[index].options;
                let on_close_button = session.parts.close_button.is_some_and(|b| doc.contains(b, target));
                let on_backdrop = options.close_on_backdrop_click && doc.contains(session.parts.backdrop, target);
                let custom = session
                    .custom_triggers
                    .iter()
                    .find(|(node, _)| doc.contains(*node, target))
                    .map(|(_, action)| *action);
                if on_close_button || on_backdrop {
                    flow.stop_propagation();
                    self.close(doc);
                } else if let Some(action) = custom {
                    flow.stop_propagation();
                    match action {
                        CustomAction::Close => self.close(doc),
                        CustomAction::Accept => self.accept(),
                    }
                }
            }
            DomEvent::KeyDown { key, shift, .. } => match key {
                Key::Escape if self.modals[index].options.close_on_esc => {
                    flow.stop_propagation();
                    self.close(doc);
                }
                Key::Tab => session.trap.handle_tab(doc, *shift, flow),
                _ => {}
            },
            DomEvent::AnimationEnd { animation_name, .. } => {
                let options = &self.modals[index].options;
                let classes = &options.classes;
                let wrapper = session.parts.wrapper;
                if !session.is_opened && options.close_animation_name.as_deref() == Some(animation_name.as_str()) {
                    doc.add_class(wrapper, &classes.is_closed);
                    self.remove(doc);
                } else if options.open_animation_name.as_deref() == Some(animation_name.as_str()) {
                    doc.remove_class(wrapper, &classes.is_opening);
                    doc.add_class(wrapper, &classes.is_opened);
                }
            }
            DomEvent::Load { target } | DomEvent::LoadedMetadata { target } => {
                if session.pending != Pending::Media(*target) {
                    return;
                }
                let modal = &self.modals[index];
                let type_class = match modal.modal_type {
                    ModalType::Video => modal.options.classes.modal_item_video.as_str(),
                    _ => modal.options.classes.modal_item_image.as_str(),
                };
                session.attach_item(doc, modal, *target, &[type_class]);
                modal.loaded.emit(());
            }
            DomEvent::Error { target } => {
                if session.pending != Pending::Media(*target) {
                    return;
                }
                let modal = &self.modals[index];
                let url = modal.source.clone();
                session.fail(doc, modal, LoadError::MediaFailed { url });
            }
            _ => {}
        }
    }
}

static_assertions::assert_impl_all!(ModalLayer: Send);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::dom::{FocusProvider, MemoryDocument};

    struct Fixture {
        doc: MemoryDocument,
        layer: ModalLayer,
        fetcher: MemoryFetcher,
        trigger: NodeId,
    }

    fn setup() -> Fixture {
        let mut doc = MemoryDocument::from_body_html(
            r##"<a id="open" href="#dialog">Open</a>
               <div id="dialog" hidden aria-labelledby="dialog-title">
                   <h2 id="dialog-title">Terms</h2>
                   <button data-close>No</button>
                   <button data-accept>Yes</button>
               </div>
               <main id="page">Page</main>"##,
        );
        let trigger = doc.query_selector(doc.body(), "#open").unwrap();
        doc.focus(trigger);
        let fetcher = MemoryFetcher::new();
        let layer = ModalLayer::new(Box::new(fetcher.clone()));
        Fixture {
            doc,
            layer,
            fetcher,
            trigger,
        }
    }

    fn insert(fx: &mut Fixture, modal_type: ModalType, source: &str, options: ModalOptions) -> WidgetId {
        let modal = ModalBuilder::new()
            .modal_type(modal_type)
            .source(source)
            .trigger(fx.trigger)
            .options(options)
            .build()
            .unwrap();
        fx.layer.insert(modal)
    }

    fn dialog_options() -> ModalOptions {
        ModalOptions {
            custom_close_trigger_selector: Some("[data-close]".into()),
            custom_accept_trigger_selector: Some("[data-accept]".into()),
            ..Default::default()
        }
    }

    fn click(fx: &mut Fixture, target: NodeId) -> EventFlow {
        let mut flow = EventFlow::default();
        fx.layer.handle_event(&mut fx.doc, &DomEvent::Click { target }, &mut flow);
        flow
    }

    #[test]
    fn test_modal_type_parsing() {
        assert_eq!("youtube".parse::<ModalType>().unwrap(), ModalType::YouTube);
        assert!(matches!(
            "flash".parse::<ModalType>(),
            Err(Error::UnsupportedModalType(name)) if name == "flash"
        ));
        assert_eq!(ModalType::Ajax.to_string(), "ajax");
    }

    #[test]
    fn test_build_validation() {
        let err = ModalBuilder::new().source("/a").build().unwrap_err();
        assert!(matches!(err, Error::MissingOption { option: "type", .. }));
        let err = ModalBuilder::new().modal_type(ModalType::Image).build().unwrap_err();
        assert!(matches!(err, Error::MissingOption { option: "source", .. }));
        let err = ModalBuilder::new().modal_type_str("gallery").source("/a").build().unwrap_err();
        assert!(matches!(err, Error::UnsupportedModalType(_)));
    }

    #[test]
    fn test_open_builds_overlay() {
        let mut fx = setup();
        let options = ModalOptions {
            item_label: Some("Video".into()),
            custom_classes: vec!["modal--wide".into()],
            ..Default::default()
        };
        let id = insert(&mut fx, ModalType::YouTube, "https://youtu.be/abc123", options);
        let opened = Arc::new(Mutex::new(None));
        let opened_clone = opened.clone();
        fx.layer.get(id).unwrap().opened.connect(move |parts| {
            *opened_clone.lock() = Some(*parts);
        });

        fx.layer.open(&mut fx.doc, id);
        let parts = fx.layer.parts().unwrap();
        assert_eq!(*opened.lock(), Some(parts));
        assert_eq!(fx.doc.attribute(parts.wrapper, "id").as_deref(), Some("modal"));
        assert_eq!(fx.doc.attribute(parts.wrapper, "role").as_deref(), Some("dialog"));
        assert_eq!(fx.doc.attribute(parts.wrapper, "aria-label").as_deref(), Some("Video"));
        assert!(fx.doc.has_class(parts.wrapper, "modal--wide"));
        assert!(fx.doc.has_class(parts.wrapper, "is-loaded"));
        assert!(fx.doc.has_class(fx.doc.body(), "is-modal-opened"));

        let close_button = parts.close_button.unwrap();
        assert_eq!(fx.doc.attribute(close_button, "aria-label").as_deref(), Some("Close modal"));
        assert_eq!(fx.doc.active_element(), Some(close_button));

        let item = parts.item.unwrap();
        assert_eq!(fx.doc.tag_name(item), "iframe");
        assert_eq!(
            fx.doc.attribute(item, "src").as_deref(),
            Some("https://www.youtube.com/embed/abc123?rel=0&autoplay=1&showinfo=0")
        );
        assert!(fx.doc.has_class(item, "modal-item--youtube"));
    }

    #[test]
    fn test_singleton() {
        let mut fx = setup();
        let first = insert(&mut fx, ModalType::Vimeo, "https://vimeo.com/42", ModalOptions::default());
        let second = insert(&mut fx, ModalType::Dialog, "#dialog", dialog_options());

        fx.layer.open(&mut fx.doc, first);
        let wrapper = fx.layer.parts().unwrap().wrapper;
        fx.layer.open(&mut fx.doc, second);

        assert_eq!(fx.layer.active_modal(), Some(first));
        assert_eq!(fx.layer.parts().unwrap().wrapper, wrapper);
        assert_eq!(fx.doc.query_selector_all(fx.doc.body(), "#modal").len(), 1);
    }

    #[test]
    fn test_unrecognized_video_url_degrades() {
        let mut fx = setup();
        let id = insert(&mut fx, ModalType::YouTube, "https://example.com/video", ModalOptions::default());
        let failure = Arc::new(Mutex::new(None));
        let failure_clone = failure.clone();
        fx.layer.get(id).unwrap().load_failed.connect(move |err| {
            *failure_clone.lock() = Some(err.clone());
        });

        fx.layer.open(&mut fx.doc, id);
        assert!(fx.layer.is_opened());
        assert_eq!(fx.layer.parts().unwrap().item, None);
        assert_eq!(fx.doc.active_element(), Some(fx.trigger));
        assert!(matches!(*failure.lock(), Some(LoadError::UnrecognizedVideoUrl { .. })));
    }

    #[test]
    fn test_image_waits_for_load() {
        let mut fx = setup();
        let id = insert(&mut fx, ModalType::Image, "/photo.jpg", ModalOptions::default());
        fx.layer.open(&mut fx.doc, id);
        assert_eq!(fx.layer.parts().unwrap().item, None);

        let image = fx.doc.query_selector_all(fx.doc.root(), "img");
        assert!(image.is_empty(), "image is attached only after loading");
        let pending = fx
            .doc
            .listener_entries()
            .iter()
            .find(|entry| entry.kind == EventKind::Load)
            .map(|entry| entry.target)
            .unwrap();

        fx.layer.handle_event(&mut fx.doc, &DomEvent::Load { target: pending }, &mut EventFlow::default());
        let item = fx.layer.parts().unwrap().item.unwrap();
        assert_eq!(item, pending);
        assert_eq!(fx.doc.attribute(item, "src").as_deref(), Some("/photo.jpg"));
        assert!(fx.doc.has_class(item, "modal-item"));
        assert!(fx.doc.has_class(item, "modal-item--image"));
    }

    #[test]
    fn test_video_error_degrades() {
        let mut fx = setup();
        let id = insert(&mut fx, ModalType::Video, "/clip.mp4", ModalOptions::default());
        fx.layer.open(&mut fx.doc, id);
        let pending = fx
            .doc
            .listener_entries()
            .iter()
            .find(|entry| entry.kind == EventKind::LoadedMetadata)
            .map(|entry| entry.target)
            .unwrap();

        fx.layer.handle_event(&mut fx.doc, &DomEvent::Error { target: pending }, &mut EventFlow::default());
        assert_eq!(fx.layer.parts().unwrap().item, None);
        assert_eq!(fx.doc.active_element(), Some(fx.trigger));

        // A late metadata event after the failure is ignored.
        let late = DomEvent::LoadedMetadata { target: pending };
        fx.layer.handle_event(&mut fx.doc, &late, &mut EventFlow::default());
        assert_eq!(fx.layer.parts().unwrap().item, None);
    }

    #[test]
    fn test_dialog_clone_and_custom_triggers() {
        let mut fx = setup();
        let id = insert(&mut fx, ModalType::Dialog, "#dialog", dialog_options());
        fx.layer.open(&mut fx.doc, id);

        let parts = fx.layer.parts().unwrap();
        let item = parts.item.unwrap();
        assert_eq!(fx.doc.attribute(item, "id"), None);
        assert!(!fx.doc.has_attribute(item, "hidden"));
        assert_eq!(fx.doc.attribute(item, "tabindex").as_deref(), Some("-1"));
        assert_eq!(fx.doc.attribute(item, "role").as_deref(), Some("document"));
        assert_eq!(fx.doc.attribute(parts.wrapper, "aria-labelledby").as_deref(), Some("dialog-title"));
        assert_eq!(fx.doc.attribute(item, "aria-labelledby"), None);

        let accept = fx.doc.query_selector(item, "[data-accept]").unwrap();
        let flow = click(&mut fx, accept);
        assert!(flow.propagation_stopped);
        assert!(fx.layer.get(id).unwrap().is_accepted());
        assert!(fx.layer.is_opened());

        let close = fx.doc.query_selector(item, "[data-close]").unwrap();
        click(&mut fx, close);
        assert!(!fx.layer.is_wrapper_created());
        assert!(fx.layer.get(id).unwrap().is_accepted());
    }

    #[test]
    fn test_missing_dialog_template() {
        let mut fx = setup();
        let id = insert(&mut fx, ModalType::Dialog, "#nope", ModalOptions::default());
        fx.layer.open(&mut fx.doc, id);
        assert_eq!(fx.layer.parts().unwrap().item, None);
        assert_eq!(fx.doc.active_element(), Some(fx.trigger));
    }

    #[test]
    fn test_ajax_success() {
        let mut fx = setup();
        let id = insert(&mut fx, ModalType::Ajax, "/fragment", dialog_options());
        fx.layer.open(&mut fx.doc, id);

        let (ticket, request) = fx.fetcher.pending()[0].clone();
        assert_eq!(request, FetchRequest::ajax("/fragment"));
        fx.fetcher.respond(ticket, 200, "<p>Hi</p><button data-close>Close</button>");
        assert_eq!(fx.layer.pump(&mut fx.doc), 1);

        let item = fx.layer.parts().unwrap().item.unwrap();
        assert!(fx.doc.has_class(item, "modal-item--dialog"));
        assert!(fx.doc.has_class(item, "modal-item--ajax"));
        assert_eq!(fx.doc.text_content(item), "HiClose");

        let close = fx.doc.query_selector(item, "[data-close]").unwrap();
        click(&mut fx, close);
        assert!(!fx.layer.is_wrapper_created());
    }

    #[test]
    fn test_ajax_non_200_restores_focus() {
        let mut fx = setup();
        let id = insert(&mut fx, ModalType::Ajax, "/fragment", ModalOptions::default());
        fx.layer.open(&mut fx.doc, id);

        let (ticket, _) = fx.fetcher.pending()[0].clone();
        fx.fetcher.respond(ticket, 500, "oops");
        fx.layer.pump(&mut fx.doc);

        let parts = fx.layer.parts().unwrap();
        assert_eq!(parts.item, None);
        assert!(fx.doc.query_selector(parts.wrapper, ".modal-item").is_none());
        assert_eq!(fx.doc.active_element(), Some(fx.trigger));
    }

    #[test]
    fn test_stale_completion_after_remove() {
        let mut fx = setup();
        let id = insert(&mut fx, ModalType::Ajax, "/fragment", ModalOptions::default());
        fx.layer.open(&mut fx.doc, id);
        let (ticket, _) = fx.fetcher.pending()[0].clone();

        fx.layer.remove(&mut fx.doc);
        assert_eq!(fx.fetcher.cancelled(), vec![ticket]);

        fx.fetcher.push_completion(FetchCompletion {
            ticket,
            result: Ok(FetchResponse {
                status: 200,
                body: "<p>late</p>".into(),
            }),
        });
        fx.layer.pump(&mut fx.doc);
        assert!(!fx.layer.is_wrapper_created());
        assert!(fx.doc.query_selector(fx.doc.root(), ".modal-item").is_none());
    }

    #[test]
    fn test_animated_close_waits_for_animation() {
        let mut fx = setup();
        let options = ModalOptions {
            open_animation_name: Some("modal-open".into()),
            close_animation_name: Some("modal-close".into()),
            ..Default::default()
        };
        let id = insert(&mut fx, ModalType::Vimeo, "https://vimeo.com/42", options);
        fx.layer.open(&mut fx.doc, id);
        let wrapper = fx.layer.parts().unwrap().wrapper;
        assert!(fx.doc.has_class(wrapper, "is-opening"));

        let open_end = DomEvent::AnimationEnd {
            target: wrapper,
            animation_name: "modal-open".into(),
        };
        fx.layer.handle_event(&mut fx.doc, &open_end, &mut EventFlow::default());
        assert!(!fx.doc.has_class(wrapper, "is-opening"));
        assert!(fx.doc.has_class(wrapper, "is-opened"));

        fx.layer.close(&mut fx.doc);
        assert!(fx.layer.is_wrapper_created());
        assert!(!fx.layer.is_opened());
        assert!(fx.doc.has_class(wrapper, "is-closing"));
        assert!(!fx.doc.has_class(wrapper, "is-opened"));

        // Accepting is only possible while opened.
        fx.layer.accept();
        assert!(!fx.layer.get(id).unwrap().is_accepted());

        let close_end = DomEvent::AnimationEnd {
            target: wrapper,
            animation_name: "modal-close".into(),
        };
        fx.layer.handle_event(&mut fx.doc, &close_end, &mut EventFlow::default());
        assert!(fx.doc.has_class(wrapper, "is-closed"));
        assert!(!fx.layer.is_wrapper_created());
        assert_eq!(fx.doc.parent(wrapper), None);
    }

    #[test]
    fn test_keyboard_escape_and_focus_trap() {
        let mut fx = setup();
        let id = insert(&mut fx, ModalType::Dialog, "#dialog", dialog_options());
        fx.layer.open(&mut fx.doc, id);
        let wrapper = fx.layer.parts().unwrap().wrapper;
        let focusables = fx.layer.focusable_elements().to_vec();
        assert_eq!(fx.doc.active_element(), focusables.first().copied());

        let shift_tab = DomEvent::KeyDown {
            target: wrapper,
            key: Key::Tab,
            shift: true,
        };
        let mut flow = EventFlow::default();
        fx.layer.handle_event(&mut fx.doc, &shift_tab, &mut flow);
        assert!(flow.default_prevented);
        assert_eq!(fx.doc.active_element(), focusables.last().copied());

        let escape = DomEvent::KeyDown {
            target: wrapper,
            key: Key::Escape,
            shift: false,
        };
        let mut flow = EventFlow::default();
        fx.layer.handle_event(&mut fx.doc, &escape, &mut flow);
        assert!(flow.propagation_stopped);
        assert!(!fx.layer.is_wrapper_created());
        assert_eq!(fx.doc.active_element(), Some(fx.trigger));
    }

    #[test]
    fn test_trigger_and_remove_round_trip() {
        let mut fx = setup();
        let baseline = fx.doc.listener_count();
        let id = insert(&mut fx, ModalType::Dialog, "#dialog", dialog_options());
        fx.layer.init_trigger(&mut fx.doc, id);
        assert!(fx.layer.get(id).unwrap().is_trigger_initialized());

        let mut flow = EventFlow::default();
        fx.layer
            .handle_trigger_event(&mut fx.doc, id, &DomEvent::Click { target: fx.trigger }, &mut flow);
        assert!(flow.default_prevented);
        assert!(fx.layer.is_opened());

        let backdrop = fx.layer.parts().unwrap().backdrop;
        click(&mut fx, backdrop);
        assert!(!fx.layer.is_wrapper_created());
        assert!(!fx.doc.has_class(fx.doc.body(), "is-modal-opened"));

        fx.layer.remove(&mut fx.doc);
        fx.layer.remove_trigger(&mut fx.doc, id);
        assert_eq!(fx.doc.listener_count(), baseline);
    }
}
