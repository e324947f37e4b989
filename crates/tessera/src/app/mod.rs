//! Page bootstrap.
//!
//! [`App`] owns a [`Document`] and every engine discovered in it. It finds
//! widgets by their data attributes, routes host events along the bubbling
//! path to the owners registered on each node, fires host timers and wires
//! the engines together (slider moves are announced through the live
//! region, breakpoint changes recalculate sliders and toggle the offset
//! navigation).
//!
//! # Example
//!
//! ```
//! use tessera::app::{App, AppConfig};
//! use tessera::dom::{Document, DomEvent, MemoryDocument};
//!
//! let doc = MemoryDocument::from_body_html(r#"
//!     <div data-offset-nav>
//!         <button data-offset-nav-trigger>Menu</button>
//!         <nav data-offset-nav-element><a href="/" data-nav-item>Home</a></nav>
//!     </div>
//! "#);
//!
//! let mut app = App::new(doc, AppConfig::default());
//! app.init();
//!
//! let trigger = app.document().query_selector(app.document().body(), "[data-offset-nav-trigger]").unwrap();
//! app.dispatch(&DomEvent::Click { target: trigger });
//! assert!(app.is_offset_nav_opened());
//! ```

mod config;

use std::time::Duration;

use tessera_core::logging::{span_names, targets};

pub use config::{AppConfig, Breakpoints};

use crate::dom::{Document, DomEvent, EventFlow, EventKind, ListenerOwner, NodeId, WidgetId};
use crate::error::Result;
use crate::widget::{
    AnnouncementSender, Announcer, ContentFetcher, DragInput, DragRegistry, Dropdown, DropdownBuilder,
    DropdownOptions, DropdownSet, HoverAnimation, HoverAnimationBuilder, Modal, ModalBuilder, ModalLayer,
    SharedDragRegistry, Slider, SliderBuilder,
};

const BODY_NO_JS: &str = "no-js";
const BODY_NO_TOUCH: &str = "no-touch";
const BODY_LOADING: &str = "is-loading";
const BODY_OFFLINE: &str = "is-offline";

/// The page bootstrap.
pub struct App<D: Document> {
    doc: D,
    config: AppConfig,
    registry: SharedDragRegistry,
    sliders: Vec<Slider>,
    dropdowns: DropdownSet,
    offset_nav: Option<WidgetId>,
    nav_items: Vec<NodeId>,
    modals: ModalLayer,
    hover_animations: Vec<HoverAnimation>,
    announcer: Option<Announcer>,
    is_touch: bool,
    is_initialized: bool,
}

impl<D: Document> std::fmt::Debug for App<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("sliders", &self.sliders.len())
            .field("dropdowns", &self.dropdowns.len())
            .field("modals", &self.modals.len())
            .field("hover_animations", &self.hover_animations.len())
            .field("has_announcer", &self.announcer.is_some())
            .field("is_touch", &self.is_touch)
            .field("is_initialized", &self.is_initialized)
            .finish()
    }
}

impl<D: Document> App<D> {
    /// Create a bootstrap for `doc`. Ajax modals use an in-memory fetcher
    /// until [`set_fetcher`](Self::set_fetcher) installs a real one.
    pub fn new(doc: D, config: AppConfig) -> Self {
        Self {
            doc,
            config,
            registry: DragRegistry::shared(),
            sliders: Vec::new(),
            dropdowns: DropdownSet::new(),
            offset_nav: None,
            nav_items: Vec::new(),
            modals: ModalLayer::default(),
            hover_animations: Vec::new(),
            announcer: None,
            is_touch: false,
            is_initialized: false,
        }
    }

    /// Create a bootstrap whose ajax modals load through `fetcher`.
    pub fn with_fetcher(doc: D, config: AppConfig, fetcher: Box<dyn ContentFetcher>) -> Self {
        let mut app = Self::new(doc, config);
        app.set_fetcher(fetcher);
        app
    }

    pub fn set_fetcher(&mut self, fetcher: Box<dyn ContentFetcher>) {
        self.modals.set_fetcher(fetcher);
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sliders(&self) -> &[Slider] {
        &self.sliders
    }

    pub fn sliders_mut(&mut self) -> &mut [Slider] {
        &mut self.sliders
    }

    pub fn dropdowns(&self) -> &DropdownSet {
        &self.dropdowns
    }

    pub fn modals(&self) -> &ModalLayer {
        &self.modals
    }

    pub fn modals_mut(&mut self) -> &mut ModalLayer {
        &mut self.modals
    }

    pub fn hover_animations(&self) -> &[HoverAnimation] {
        &self.hover_animations
    }

    pub fn announcer(&self) -> Option<&Announcer> {
        self.announcer.as_ref()
    }

    /// Id of the offset navigation dropdown.
    pub fn offset_nav(&self) -> Option<WidgetId> {
        self.offset_nav
    }

    pub fn is_offset_nav_opened(&self) -> bool {
        self.offset_nav
            .and_then(|id| self.dropdowns.get(id))
            .is_some_and(|dropdown| dropdown.is_opened())
    }

    /// Whether a touch interaction has been seen.
    pub fn is_touch(&self) -> bool {
        self.is_touch
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Prepare the body classes and discover every widget on the page.
    ///
    /// An element whose widget cannot be built is logged and skipped.
    pub fn init(&mut self) {
        if self.is_initialized {
            return;
        }
        let _span = tracing::debug_span!(target: targets::APP, span_names::DISCOVER).entered();

        let body = self.doc.body();
        self.doc.remove_class(body, BODY_NO_JS);
        self.doc.add_class(body, BODY_LOADING);
        if !self.doc.is_online() {
            self.doc.add_class(body, BODY_OFFLINE);
        }
        let root = self.doc.root();
        self.doc.add_listener(root, EventKind::TouchStart, ListenerOwner::App);
        self.doc.add_listener(root, EventKind::PointerDown, ListenerOwner::App);

        self.discover_announcer();
        self.discover_offset_nav();
        self.discover_modals();
        self.discover_sliders();
        self.discover_hover_animations();

        self.is_initialized = true;
        tracing::info!(
            target: targets::APP,
            sliders = self.sliders.len(),
            modals = self.modals.len(),
            hover_animations = self.hover_animations.len(),
            offset_nav = self.offset_nav.is_some(),
            announcer = self.announcer.is_some(),
            "page initialized"
        );
    }

    fn discover_announcer(&mut self) {
        let body = self.doc.body();
        let Some(region) = self.doc.query_selector(body, "[data-assistive-alert]") else {
            return;
        };
        let announcer = Announcer::new(region).with_timeout(self.config.announcement_timeout());
        announcer.init(&mut self.doc);
        self.announcer = Some(announcer);
    }

    fn discover_offset_nav(&mut self) {
        let body = self.doc.body();
        if self.doc.query_selector(body, "[data-offset-nav]").is_none() {
            return;
        }
        let dropdown = match self.build_offset_nav(body) {
            Ok(dropdown) => dropdown,
            Err(error) => {
                tracing::warn!(target: targets::APP, %error, "offset navigation skipped");
                return;
            }
        };
        let element = dropdown.element();
        let id = self.dropdowns.insert(dropdown);
        self.dropdowns.init(&mut self.doc, id);
        self.offset_nav = Some(id);

        self.nav_items = self.doc.query_selector_all(body, "[data-nav-item]");
        for item in &self.nav_items {
            self.doc.add_listener(*item, EventKind::Click, ListenerOwner::App);
        }
        if !self.doc.media_matches(&self.config.breakpoints.medium) {
            self.doc.set_attribute(element, "aria-hidden", "false");
        }
    }

    fn build_offset_nav(&self, body: NodeId) -> Result<Dropdown> {
        let mut builder = DropdownBuilder::new().options(DropdownOptions {
            is_independent: true,
            set_height: false,
            ..DropdownOptions::default()
        });
        if let Some(trigger) = self.doc.query_selector(body, "[data-offset-nav-trigger]") {
            builder = builder.trigger(trigger);
        }
        if let Some(element) = self.doc.query_selector(body, "[data-offset-nav-element]") {
            builder = builder.element(element);
        }
        if let Some(close) = self.doc.query_selector(body, "[data-offset-nav-close]") {
            builder = builder.close_button(close);
        }
        builder.build()
    }

    fn discover_modals(&mut self) {
        let body = self.doc.body();
        for trigger in self.doc.query_selector_all(body, "[data-modal-type]") {
            let modal = match self.build_modal(trigger) {
                Ok(modal) => modal,
                Err(error) => {
                    tracing::warn!(target: targets::APP, %error, ?trigger, "modal skipped");
                    continue;
                }
            };
            let id = self.modals.insert(modal);
            self.modals.init_trigger(&mut self.doc, id);
        }
    }

    fn build_modal(&self, trigger: NodeId) -> Result<Modal> {
        let mut options = self.config.modal.clone();
        if let Some(classes) = self.doc.attribute(trigger, "data-modal-custom-classes") {
            options.custom_classes = split_class_list(&classes);
        }
        let mut builder = ModalBuilder::new().trigger(trigger).options(options);
        if let Some(modal_type) = self.doc.attribute(trigger, "data-modal-type") {
            builder = builder.modal_type_str(&modal_type);
        }
        let source = self
            .doc
            .attribute(trigger, "data-modal-source")
            .or_else(|| self.doc.attribute(trigger, "href"));
        if let Some(source) = source {
            builder = builder.source(source);
        }
        builder.build()
    }

    fn discover_sliders(&mut self) {
        let body = self.doc.body();
        for element in self.doc.query_selector_all(body, "[data-slider]") {
            let mut slider = match self.build_slider(element) {
                Ok(slider) => slider,
                Err(error) => {
                    tracing::warn!(target: targets::APP, %error, ?element, "slider skipped");
                    continue;
                }
            };
            self.connect_announcements(&slider);
            slider.init(&mut self.doc);
            self.sliders.push(slider);
        }
    }

    fn build_slider(&self, element: NodeId) -> Result<Slider> {
        let doc = &self.doc;
        let mut builder = SliderBuilder::new()
            .element(element)
            .items(doc.query_selector_all(element, "[data-slider-list-item]"))
            .options(self.config.slider.clone())
            .registry(self.registry.clone());
        if let Some(viewport) = doc.query_selector(element, "[data-slider-viewport]") {
            builder = builder.viewport(viewport);
        }
        if let Some(list) = doc.query_selector(element, "[data-slider-list]") {
            builder = builder.list(list);
        }
        if let Some(prev) = doc.query_selector(element, "[data-slider-prev]") {
            builder = builder.prev_trigger(prev);
        }
        if let Some(next) = doc.query_selector(element, "[data-slider-next]") {
            builder = builder.next_trigger(next);
        }
        for trigger in doc.query_selector_all(element, "[data-slider-slide-to]") {
            let index = doc.attribute(trigger, "data-slider-slide-to").unwrap_or_default();
            builder = builder.slide_to_trigger_str(trigger, &index)?;
        }
        builder.build()
    }

    /// Announce "<trigger label> <suffix>" after every step through a
    /// labelled trigger.
    fn connect_announcements(&self, slider: &Slider) {
        let Some(announcer) = &self.announcer else {
            return;
        };
        let suffix = &self.config.announce_suffix;
        let label = |trigger: Option<NodeId>| trigger.and_then(|t| self.doc.attribute(t, "aria-label"));

        if let Some(label) = label(slider.next_trigger()) {
            let sender = announcer.sender();
            let text = format!("{label} {suffix}");
            slider.moved_next.connect(move |_| {
                forward_announcement(&sender, &text);
            });
        }
        if let Some(label) = label(slider.prev_trigger()) {
            let sender = announcer.sender();
            let text = format!("{label} {suffix}");
            slider.moved_prev.connect(move |_| {
                forward_announcement(&sender, &text);
            });
        }
    }

    fn discover_hover_animations(&mut self) {
        let body = self.doc.body();
        for element in self.doc.query_selector_all(body, "[data-hover-animation]") {
            let mut builder = HoverAnimationBuilder::new().element(element);
            if let Some(target) = self.doc.query_selector(element, "[data-hover-animation-target]") {
                builder = builder.target(target);
            }
            match builder.build() {
                Ok(mut hover) => {
                    hover.init(&mut self.doc);
                    self.hover_animations.push(hover);
                }
                Err(error) => tracing::warn!(target: targets::APP, %error, ?element, "hover animation skipped"),
            }
        }
    }

    // =========================================================================
    // Page state
    // =========================================================================

    /// The page finished loading.
    pub fn page_loaded(&mut self) {
        let body = self.doc.body();
        self.doc.remove_class(body, BODY_LOADING);
    }

    /// The host went online or offline.
    pub fn set_online(&mut self, online: bool) {
        let body = self.doc.body();
        if online {
            self.doc.remove_class(body, BODY_OFFLINE);
        } else {
            self.doc.add_class(body, BODY_OFFLINE);
        }
        tracing::debug!(target: targets::APP, online, "connectivity changed");
    }

    /// A breakpoint started or stopped matching. `name` is a breakpoint
    /// name from the configuration or its media query.
    pub fn breakpoint_changed(&mut self, name: &str, matches: bool) {
        let is_medium = self.config.breakpoints.resolve(name) == self.config.breakpoints.medium;
        tracing::debug!(target: targets::APP, name, matches, "breakpoint changed");

        for slider in &mut self.sliders {
            slider.recalc(&mut self.doc);
        }

        if !is_medium {
            return;
        }
        let Some(id) = self.offset_nav else {
            return;
        };
        let Some(element) = self.dropdowns.get(id).map(|d| d.element()) else {
            return;
        };
        if matches {
            self.doc.set_attribute(element, "aria-hidden", "true");
        } else {
            self.dropdowns.close(&mut self.doc, id);
            self.doc.set_attribute(element, "aria-hidden", "false");
        }
    }

    // =========================================================================
    // Event routing
    // =========================================================================

    /// Deliver a host event.
    ///
    /// Every owner registered for the event's kind is called, starting at
    /// the target and walking up to the document root. Non-bubbling kinds
    /// only reach the target. Once a handler stops propagation, the
    /// remaining owners on the current node still run and the walk ends.
    pub fn dispatch(&mut self, event: &DomEvent) -> EventFlow {
        let kind = event.kind();
        let _span = tracing::trace_span!(target: targets::APP, span_names::DISPATCH, %kind).entered();

        let mut path = vec![event.target()];
        if kind.bubbles() {
            while let Some(parent) = path.last().and_then(|node| self.doc.parent(*node)) {
                path.push(parent);
            }
        }

        let mut flow = EventFlow::default();
        for node in path {
            for owner in self.doc.listeners(node, kind) {
                self.route(owner, node, event, &mut flow);
            }
            if flow.propagation_stopped {
                break;
            }
        }

        self.drain_announcements();
        flow
    }

    fn route(&mut self, owner: ListenerOwner, current: NodeId, event: &DomEvent, flow: &mut EventFlow) {
        tracing::trace!(target: targets::APP, ?owner, ?current, "routing");
        match owner {
            ListenerOwner::Slider(id) => {
                if let Some(slider) = self.sliders.iter_mut().find(|s| s.id() == id) {
                    slider.handle_event(&mut self.doc, event, flow);
                }
            }
            ListenerOwner::SliderDrag(channel) => {
                let Some(input) = DragInput::from_event(event).filter(|input| input.channel() == channel) else {
                    return;
                };
                let active = self.registry.lock().active();
                let Some(session) = active else {
                    return;
                };
                if let Some(slider) = self.sliders.iter_mut().find(|s| s.id() == session.owner) {
                    slider.handle_drag_input(&mut self.doc, input, flow);
                }
            }
            ListenerOwner::Dropdown(id) => self.dropdowns.handle_event(&mut self.doc, id, event, flow),
            ListenerOwner::DropdownPage => self.dropdowns.handle_page_event(&mut self.doc, event),
            ListenerOwner::ModalTrigger(id) => self.modals.handle_trigger_event(&mut self.doc, id, event, flow),
            ListenerOwner::ModalLayer => self.modals.handle_event(&mut self.doc, event, flow),
            ListenerOwner::HoverAnimation(id) => {
                if let Some(hover) = self.hover_animations.iter_mut().find(|h| h.id() == id) {
                    hover.handle_event(&mut self.doc, event);
                }
            }
            ListenerOwner::Announcer => {}
            ListenerOwner::App => self.handle_app_event(current, event),
        }
    }

    fn handle_app_event(&mut self, current: NodeId, event: &DomEvent) {
        match event {
            DomEvent::TouchStart { .. } => self.touch_detected(),
            DomEvent::PointerDown { pointer_type, .. } if pointer_type.is_touch_like() => self.touch_detected(),
            DomEvent::Click { .. } if self.nav_items.contains(&current) => {
                if let Some(id) = self.offset_nav {
                    self.dropdowns.close(&mut self.doc, id);
                }
            }
            _ => {}
        }
    }

    fn touch_detected(&mut self) {
        if self.is_touch {
            return;
        }
        self.is_touch = true;
        let body = self.doc.body();
        self.doc.remove_class(body, BODY_NO_TOUCH);
        let root = self.doc.root();
        self.doc.remove_listener(root, EventKind::TouchStart, ListenerOwner::App);
        self.doc.remove_listener(root, EventKind::PointerDown, ListenerOwner::App);
        tracing::debug!(target: targets::APP, "touch input detected");
    }

    // =========================================================================
    // Time and background work
    // =========================================================================

    /// Advance the host clock and route the timers that fired.
    pub fn advance_time(&mut self, elapsed: Duration) {
        for (timer, owner) in self.doc.advance_timers(elapsed) {
            match owner {
                ListenerOwner::Slider(id) => {
                    if let Some(slider) = self.sliders.iter_mut().find(|s| s.id() == id) {
                        slider.handle_timer(timer);
                    }
                }
                ListenerOwner::Announcer => {
                    if let Some(announcer) = &mut self.announcer {
                        announcer.handle_timer(&mut self.doc, timer);
                    }
                }
                other => tracing::trace!(target: targets::APP, ?other, ?timer, "unrouted timer"),
            }
        }
    }

    /// Apply finished fetches to the modal layer and announce queued
    /// messages. Returns how many items were processed.
    pub fn pump(&mut self) -> usize {
        self.modals.pump(&mut self.doc) + self.drain_announcements()
    }

    fn drain_announcements(&mut self) -> usize {
        match &mut self.announcer {
            Some(announcer) => announcer.drain(&mut self.doc),
            None => 0,
        }
    }
}

/// Split a `data-modal-custom-classes` value on commas.
fn split_class_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Queue an announcement. Returns `false` once the announcer is gone.
fn forward_announcement(sender: &AnnouncementSender, text: &str) -> bool {
    match sender.send(text.to_owned()) {
        Ok(()) => true,
        Err(error) => {
            tracing::trace!(target: targets::APP, %error, text, "announcement dropped");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDocument, PointerType, Point};

    const PAGE: &str = r#"
        <div data-assistive-alert></div>
        <div data-offset-nav>
            <button id="menu" data-offset-nav-trigger>Menu</button>
            <nav id="nav" data-offset-nav-element>
                <button id="nav-close" data-offset-nav-close>Close</button>
                <a id="home" href="/" data-nav-item>Home</a>
            </nav>
        </div>
        <a id="photo" href="/img/a.jpg" data-modal-type="image" data-modal-custom-classes="wide, dark">Photo</a>
        <a id="broken" data-modal-type="carousel" href="/x">Broken</a>
        <div id="card" data-hover-animation><span id="icon" data-hover-animation-target></span></div>
    "#;

    fn setup() -> App<MemoryDocument> {
        let doc = MemoryDocument::from_body_html(PAGE);
        let mut app = App::new(doc, AppConfig::default());
        app.init();
        app
    }

    fn node(app: &App<MemoryDocument>, selector: &str) -> NodeId {
        let doc = app.document();
        doc.query_selector(doc.root(), selector).unwrap()
    }

    #[test]
    fn test_body_classes() {
        let mut doc = MemoryDocument::from_body_html("");
        let body = doc.body();
        doc.add_class(body, "no-js");
        doc.add_class(body, "no-touch");
        doc.set_online(false);
        let mut app = App::new(doc, AppConfig::default());
        app.init();

        let doc = app.document();
        assert!(!doc.has_class(body, "no-js"));
        assert!(doc.has_class(body, "is-loading"));
        assert!(doc.has_class(body, "is-offline"));

        app.page_loaded();
        app.set_online(true);
        assert!(!app.document().has_class(body, "is-loading"));
        assert!(!app.document().has_class(body, "is-offline"));
    }

    #[test]
    fn test_discovery_skips_broken_elements() {
        let app = setup();
        assert_eq!(app.modals().len(), 1);
        assert_eq!(app.hover_animations().len(), 1);
        assert!(app.announcer().is_some());
        assert!(app.offset_nav().is_some());
        assert!(app.sliders().is_empty());
    }

    #[test]
    fn test_modal_custom_classes() {
        let mut app = setup();
        let photo = node(&app, "#photo");
        let flow = app.dispatch(&DomEvent::Click { target: photo });
        assert!(flow.default_prevented);

        let wrapper = app.modals().parts().unwrap().wrapper;
        assert!(app.document().has_class(wrapper, "wide"));
        assert!(app.document().has_class(wrapper, "dark"));
        assert_eq!(app.modals().get(app.modals().active_modal().unwrap()).unwrap().source(), "/img/a.jpg");
    }

    #[test]
    fn test_offset_nav() {
        let mut app = setup();
        let menu = node(&app, "#menu");
        let nav = node(&app, "#nav");
        let home = node(&app, "#home");
        assert_eq!(app.document().attribute(nav, "aria-hidden").as_deref(), Some("false"));

        app.dispatch(&DomEvent::Click { target: menu });
        assert!(app.is_offset_nav_opened());

        // Independent: a click elsewhere on the page keeps it open.
        let body = app.document().body();
        app.dispatch(&DomEvent::Click { target: body });
        assert!(app.is_offset_nav_opened());

        app.dispatch(&DomEvent::Click { target: home });
        assert!(!app.is_offset_nav_opened());
    }

    #[test]
    fn test_medium_breakpoint_toggles_offset_nav() {
        let mut app = setup();
        let menu = node(&app, "#menu");
        let nav = node(&app, "#nav");

        app.breakpoint_changed("medium", true);
        assert_eq!(app.document().attribute(nav, "aria-hidden").as_deref(), Some("true"));

        app.dispatch(&DomEvent::Click { target: menu });
        assert!(app.is_offset_nav_opened());

        app.breakpoint_changed("(max-width: 62em)", false);
        assert!(!app.is_offset_nav_opened());
        assert_eq!(app.document().attribute(nav, "aria-hidden").as_deref(), Some("false"));

        // Other breakpoints leave the navigation alone.
        app.breakpoint_changed("small", true);
        assert_eq!(app.document().attribute(nav, "aria-hidden").as_deref(), Some("false"));
    }

    #[test]
    fn test_first_touch_removes_no_touch() {
        let mut doc = MemoryDocument::from_body_html(r#"<p id="text">Hi</p>"#);
        let body = doc.body();
        doc.add_class(body, "no-touch");
        let mut app = App::new(doc, AppConfig::default());
        app.init();
        let text = node(&app, "#text");

        app.dispatch(&DomEvent::PointerDown {
            target: text,
            point: Point::new(0.0, 0.0),
            pointer_type: PointerType::Mouse,
        });
        assert!(!app.is_touch());
        assert!(app.document().has_class(body, "no-touch"));

        app.dispatch(&DomEvent::PointerDown {
            target: text,
            point: Point::new(0.0, 0.0),
            pointer_type: PointerType::Pen,
        });
        assert!(app.is_touch());
        assert!(!app.document().has_class(body, "no-touch"));
        assert_eq!(app.document().listener_count(), 0);
    }

    #[test]
    fn test_hover_routed_to_target_only() {
        let mut app = setup();
        let card = node(&app, "#card");
        let icon = node(&app, "#icon");

        app.dispatch(&DomEvent::MouseEnter { target: icon });
        assert!(!app.document().has_class(icon, "is-animating"));

        app.dispatch(&DomEvent::MouseEnter { target: card });
        assert!(app.document().has_class(icon, "is-animating"));
    }

    #[test]
    fn test_split_class_list() {
        assert_eq!(split_class_list("a,b,  c"), vec!["a", "b", "c"]);
        assert!(split_class_list("").is_empty());
    }

    #[test]
    fn test_forward_announcement_after_announcer_dropped() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        assert!(forward_announcement(&sender, "Next slide displayed"));
        assert_eq!(receiver.try_recv().ok().as_deref(), Some("Next slide displayed"));

        drop(receiver);
        assert!(!forward_announcement(&sender, "Previous slide displayed"));
    }
}
