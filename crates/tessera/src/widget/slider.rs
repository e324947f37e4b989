//! Carousel slider engine.
//!
//! A slider moves a horizontal list of items inside a viewport. The first
//! visible item is the *active index*; the visible window is every item from
//! the active one onward whose accumulated width still fits the list.
//!
//! # Navigation
//!
//! `next`/`prev` step the active index by one. At either boundary the slider
//! rewinds to the opposite end when `rewind` is enabled and stays put
//! otherwise. `slide_to` jumps to an index no greater than the last valid
//! active index.
//!
//! # Dragging
//!
//! Touch, pointer (touch and pen) and mouse drags translate the list in
//! percent. Dragging past either end is damped by a square root. Releasing
//! snaps to an item: short flicks move towards the drag direction, drags
//! longer than the long-drag interval round to the nearest item.
//!
//! # Example
//!
//! ```
//! use tessera::dom::{Document, MemoryDocument};
//! use tessera::widget::{DragRegistry, SliderBuilder};
//!
//! let mut doc = MemoryDocument::from_body_html(
//!     r#"<div id="s"><div id="v"><ul id="l"><li></li><li></li><li></li></ul></div></div>"#,
//! );
//! let body = doc.body();
//! let element = doc.query_selector(body, "#s").unwrap();
//! let viewport = doc.query_selector(body, "#v").unwrap();
//! let list = doc.query_selector(body, "#l").unwrap();
//! let items = doc.query_selector_all(list, "li");
//! doc.set_size(list, 300.0, 100.0);
//! for item in &items {
//!     doc.set_size(*item, 300.0, 100.0);
//! }
//!
//! let mut slider = SliderBuilder::new()
//!     .element(element)
//!     .viewport(viewport)
//!     .list(list)
//!     .items(items)
//!     .registry(DragRegistry::shared())
//!     .build()
//!     .unwrap();
//!
//! slider.init(&mut doc);
//! slider.next(&mut doc);
//! assert_eq!(slider.active_index(), 1);
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tessera_core::logging::targets;
use tessera_core::{Signal, TimerId};

use super::gesture::{DragChannel, DragInput, DragRegistry, SharedDragRegistry, TouchDirection};
use crate::dom::{Document, DomEvent, EventFlow, EventKind, ListenerOwner, NodeId, Point, WidgetId};
use crate::error::{Error, Result};

const WIDGET: &str = "Slider";

/// Class names applied by the slider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SliderClasses {
    pub has_mouse_drag: String,
    pub has_no_next_item: String,
    pub has_no_prev_item: String,
    pub has_pointer_drag: String,
    pub has_touch_drag: String,
    pub is_active: String,
    pub is_dragging: String,
    pub is_mouse_dragging: String,
    pub is_pointer_dragging: String,
    pub is_rewinding: String,
    pub is_sliding: String,
    pub is_sliding_finished: String,
    pub is_touch_dragging: String,
    pub is_visible: String,
}

impl Default for SliderClasses {
    fn default() -> Self {
        Self {
            has_mouse_drag: "has-mouse-drag".into(),
            has_no_next_item: "has-no-next-item".into(),
            has_no_prev_item: "has-no-prev-item".into(),
            has_pointer_drag: "has-pointer-drag".into(),
            has_touch_drag: "has-touch-drag".into(),
            is_active: "is-active".into(),
            is_dragging: "is-dragging".into(),
            is_mouse_dragging: "is-mouse-dragging".into(),
            is_pointer_dragging: "is-pointer-dragging".into(),
            is_rewinding: "is-rewinding".into(),
            is_sliding: "is-sliding".into(),
            is_sliding_finished: "is-sliding-finished".into(),
            is_touch_dragging: "is-touch-dragging".into(),
            is_visible: "is-visible".into(),
        }
    }
}

impl SliderClasses {
    fn dragging_class(&self, channel: DragChannel) -> &str {
        match channel {
            DragChannel::Touch => &self.is_touch_dragging,
            DragChannel::Pointer => &self.is_pointer_dragging,
            DragChannel::Mouse => &self.is_mouse_dragging,
        }
    }

    fn has_drag_class(&self, channel: DragChannel) -> &str {
        match channel {
            DragChannel::Touch => &self.has_touch_drag,
            DragChannel::Pointer => &self.has_pointer_drag,
            DragChannel::Mouse => &self.has_mouse_drag,
        }
    }
}

/// Behavioral options of a slider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SliderOptions {
    /// Index activated by `init`. An index past the last item resets to 0.
    pub initial_index: usize,
    /// Wrap around at both ends.
    pub rewind: bool,
    /// Accept touch (or touch-like pointer) drags.
    pub touch_drag: bool,
    /// Accept mouse drags.
    pub mouse_drag: bool,
    /// Milliseconds after which a drag counts as a long drag.
    pub long_drag_ms: u64,
    pub classes: SliderClasses,
}

impl Default for SliderOptions {
    fn default() -> Self {
        Self {
            initial_index: 0,
            rewind: true,
            touch_drag: true,
            mouse_drag: true,
            long_drag_ms: 250,
            classes: SliderClasses::default(),
        }
    }
}

/// A trigger that jumps to a fixed index when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideToTrigger {
    pub trigger: NodeId,
    pub index: usize,
}

/// Builder for [`Slider`].
#[derive(Debug, Default)]
pub struct SliderBuilder {
    element: Option<NodeId>,
    viewport: Option<NodeId>,
    list: Option<NodeId>,
    items: Option<Vec<NodeId>>,
    prev_trigger: Option<NodeId>,
    next_trigger: Option<NodeId>,
    slide_to_triggers: Vec<SlideToTrigger>,
    options: SliderOptions,
    registry: Option<SharedDragRegistry>,
}

impl SliderBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// The slider root; receives state classes.
    pub fn element(mut self, element: NodeId) -> Self {
        self.element = Some(element);
        self
    }

    /// The drag surface.
    pub fn viewport(mut self, viewport: NodeId) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// The translated list.
    pub fn list(mut self, list: NodeId) -> Self {
        self.list = Some(list);
        self
    }

    /// The slides, in order.
    pub fn items(mut self, items: Vec<NodeId>) -> Self {
        self.items = Some(items);
        self
    }

    /// Optional previous button.
    pub fn prev_trigger(mut self, trigger: NodeId) -> Self {
        self.prev_trigger = Some(trigger);
        self
    }

    /// Optional next button.
    pub fn next_trigger(mut self, trigger: NodeId) -> Self {
        self.next_trigger = Some(trigger);
        self
    }

    /// Add a slide-to trigger.
    pub fn slide_to_trigger(mut self, trigger: NodeId, index: usize) -> Self {
        self.slide_to_triggers.push(SlideToTrigger { trigger, index });
        self
    }

    /// Add a slide-to trigger whose index is written in markup.
    pub fn slide_to_trigger_str(self, trigger: NodeId, index: &str) -> Result<Self> {
        let index = index
            .trim()
            .parse::<usize>()
            .map_err(|err| Error::invalid(WIDGET, "slide_to_triggers", format!("index '{index}': {err}")))?;
        Ok(self.slide_to_trigger(trigger, index))
    }

    /// Replace the behavioral options.
    pub fn options(mut self, options: SliderOptions) -> Self {
        self.options = options;
        self
    }

    /// Share a drag registry with other sliders of the same document.
    pub fn registry(mut self, registry: SharedDragRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate the references and create the slider.
    pub fn build(self) -> Result<Slider> {
        let element = self.element.ok_or(Error::missing(WIDGET, "element"))?;
        let viewport = self.viewport.ok_or(Error::missing(WIDGET, "viewport"))?;
        let list = self.list.ok_or(Error::missing(WIDGET, "list"))?;
        let items = self.items.ok_or(Error::missing(WIDGET, "items"))?;
        if items.is_empty() {
            return Err(Error::invalid(WIDGET, "items", "at least one item is required"));
        }

        Ok(Slider {
            id: WidgetId::new(),
            element,
            viewport,
            list,
            items,
            prev_trigger: self.prev_trigger,
            next_trigger: self.next_trigger,
            slide_to_triggers: self.slide_to_triggers,
            options: self.options,
            registry: self.registry.unwrap_or_else(DragRegistry::shared),
            is_initialized: false,
            layout: Layout::default(),
            drag: DragState::default(),
            channels: Vec::new(),
            tabindex_overrides: HashMap::new(),
            initialized: Signal::new(),
            moved_next: Signal::new(),
            moved_prev: Signal::new(),
            slid_to: Signal::new(),
            recalculated: Signal::new(),
            drag_started: Signal::new(),
            drag_moved: Signal::new(),
            drag_ended: Signal::new(),
            destroyed: Signal::new(),
        })
    }
}

/// Values derived on every update.
#[derive(Debug, Clone, Default, PartialEq)]
struct Layout {
    active_index: usize,
    visible_items_count: usize,
    visible_items_width: f64,
    item_percent: f64,
    current_percent: f64,
    last_active_index: usize,
    last_active_index_percent: f64,
}

/// Transient drag session state.
#[derive(Debug, Clone, Default)]
struct DragState {
    is_dragging: bool,
    is_long_drag: bool,
    channel: Option<DragChannel>,
    start_position: f64,
    move_position: f64,
    move_percent: f64,
    touch_start: Point,
    touch_direction: Option<TouchDirection>,
    long_drag_timer: Option<TimerId>,
}

/// A carousel slider instance.
pub struct Slider {
    id: WidgetId,
    element: NodeId,
    viewport: NodeId,
    list: NodeId,
    items: Vec<NodeId>,
    prev_trigger: Option<NodeId>,
    next_trigger: Option<NodeId>,
    slide_to_triggers: Vec<SlideToTrigger>,
    options: SliderOptions,
    registry: SharedDragRegistry,
    is_initialized: bool,
    layout: Layout,
    drag: DragState,
    /// Drag channels registered by `init`.
    channels: Vec<DragChannel>,
    /// Focusable descendants of hidden items, with their original tabindex.
    tabindex_overrides: HashMap<NodeId, Option<String>>,

    /// Emitted after `init`.
    pub initialized: Signal<()>,
    /// Emitted after `next`, with the new active index.
    pub moved_next: Signal<usize>,
    /// Emitted after `prev`, with the new active index.
    pub moved_prev: Signal<usize>,
    /// Emitted after an accepted `slide_to`, with the new active index.
    pub slid_to: Signal<usize>,
    /// Emitted after `recalc`, with the resulting active index.
    pub recalculated: Signal<usize>,
    /// Emitted when a drag session starts.
    pub drag_started: Signal<DragChannel>,
    /// Emitted on every applied drag move, with the list offset in percent.
    pub drag_moved: Signal<f64>,
    /// Emitted when a drag session ends, with the resulting active index.
    pub drag_ended: Signal<usize>,
    /// Emitted after `destroy`.
    pub destroyed: Signal<()>,
}

impl std::fmt::Debug for Slider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slider")
            .field("id", &self.id)
            .field("element", &self.element)
            .field("items", &self.items.len())
            .field("is_initialized", &self.is_initialized)
            .field("active_index", &self.layout.active_index)
            .field("is_dragging", &self.drag.is_dragging)
            .finish()
    }
}

impl Slider {
    // =========================================================================
    // Accessors
    // =========================================================================

    /// Identifier used for listener and timer ownership.
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// The slider root element.
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// The optional previous button.
    pub fn prev_trigger(&self) -> Option<NodeId> {
        self.prev_trigger
    }

    /// The optional next button.
    pub fn next_trigger(&self) -> Option<NodeId> {
        self.next_trigger
    }

    /// Whether `init` has run without a later `destroy`.
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Index of the first active item.
    pub fn active_index(&self) -> usize {
        self.layout.active_index
    }

    /// Number of items in the visible window.
    pub fn visible_items_count(&self) -> usize {
        self.layout.visible_items_count
    }

    /// Largest index `slide_to` accepts.
    pub fn last_active_index(&self) -> usize {
        self.layout.last_active_index
    }

    /// List offset of the active index, in percent.
    pub fn current_percent(&self) -> f64 {
        self.layout.current_percent
    }

    /// Whether a drag session of this slider is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging
    }

    /// The options the slider was built with.
    pub fn options(&self) -> &SliderOptions {
        &self.options
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Register listeners, apply the initial layout and emit `initialized`.
    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.is_initialized {
            return;
        }
        let owner = ListenerOwner::Slider(self.id);

        self.layout.active_index = self.options.initial_index;
        if self.layout.active_index > self.items.len() - 1 {
            self.layout.active_index = 0;
        }

        doc.add_listener(self.list, EventKind::TransitionEnd, owner);
        for trigger in self.all_triggers() {
            doc.add_listener(trigger, EventKind::Click, owner);
        }

        let capabilities = doc.capabilities();
        if self.options.touch_drag {
            if capabilities.touch_events {
                self.channels.push(DragChannel::Touch);
            } else if capabilities.pointer_events {
                self.channels.push(DragChannel::Pointer);
                doc.set_style(self.viewport, "touch-action", "pan-y pinch-zoom");
            }
        }
        if self.options.mouse_drag {
            self.channels.push(DragChannel::Mouse);
        }
        {
            let mut registry = self.registry.lock();
            for channel in &self.channels {
                doc.add_class(self.element, self.options.classes.has_drag_class(*channel));
                doc.add_listener(self.viewport, channel.start_kind(), owner);
                registry.register(doc, *channel);
            }
        }

        self.update(doc);
        self.is_initialized = true;
        tracing::debug!(
            target: targets::SLIDER,
            id = ?self.id,
            items = self.items.len(),
            active_index = self.layout.active_index,
            "slider initialized"
        );
        self.initialized.emit(());
    }

    /// Remove every listener and class the slider added and reset its state.
    pub fn destroy(&mut self, doc: &mut dyn Document) {
        if !self.is_initialized {
            return;
        }
        let owner = ListenerOwner::Slider(self.id);

        if self.drag.is_dragging {
            if let Some(channel) = self.drag.channel {
                doc.remove_class(self.element, self.options.classes.dragging_class(channel));
            }
        }
        self.registry.lock().release(self.id);
        if let Some(timer) = self.drag.long_drag_timer.take() {
            doc.cancel_timer(timer);
        }

        doc.remove_listener(self.list, EventKind::TransitionEnd, owner);
        for trigger in self.all_triggers() {
            doc.remove_listener(trigger, EventKind::Click, owner);
        }
        {
            let mut registry = self.registry.lock();
            for channel in self.channels.drain(..) {
                doc.remove_class(self.element, self.options.classes.has_drag_class(channel));
                doc.remove_listener(self.viewport, channel.start_kind(), owner);
                if channel == DragChannel::Pointer {
                    doc.set_style(self.viewport, "touch-action", "");
                }
                registry.unregister(doc, channel);
            }
        }

        for (node, original) in self.tabindex_overrides.drain() {
            match original {
                Some(value) => doc.set_attribute(node, "tabindex", &value),
                None => doc.remove_attribute(node, "tabindex"),
            }
        }

        let classes = &self.options.classes;
        doc.set_style(self.list, "transform", "none");
        for class in [
            &classes.has_no_next_item,
            &classes.has_no_prev_item,
            &classes.is_sliding,
            &classes.is_sliding_finished,
            &classes.is_rewinding,
            &classes.is_dragging,
        ] {
            doc.remove_class(self.element, class);
        }
        for item in &self.items {
            doc.remove_class(*item, &classes.is_active);
            doc.remove_class(*item, &classes.is_visible);
        }
        for slide_to in &self.slide_to_triggers {
            doc.remove_class(slide_to.trigger, &classes.is_active);
        }

        self.is_initialized = false;
        self.layout = Layout::default();
        self.drag = DragState::default();
        tracing::debug!(target: targets::SLIDER, id = ?self.id, "slider destroyed");
        self.destroyed.emit(());
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Step forward by one item, rewinding to the start at the end.
    pub fn next(&mut self, doc: &mut dyn Document) {
        if !self.is_initialized {
            return;
        }
        if self.layout.active_index >= self.rewind_boundary() {
            if !self.options.rewind {
                return;
            }
            self.layout.active_index = 0;
            doc.add_class(self.element, &self.options.classes.is_rewinding);
        } else {
            self.layout.active_index += 1;
        }
        self.slide(doc);
        tracing::debug!(target: targets::SLIDER, id = ?self.id, index = self.layout.active_index, "next");
        self.moved_next.emit(self.layout.active_index);
    }

    /// Step back by one item, rewinding to the end at the start.
    pub fn prev(&mut self, doc: &mut dyn Document) {
        if !self.is_initialized {
            return;
        }
        if self.layout.active_index == 0 {
            if !self.options.rewind {
                return;
            }
            self.layout.active_index = self.rewind_boundary();
            doc.add_class(self.element, &self.options.classes.is_rewinding);
        } else {
            self.layout.active_index -= 1;
        }
        self.slide(doc);
        tracing::debug!(target: targets::SLIDER, id = ?self.id, index = self.layout.active_index, "prev");
        self.moved_prev.emit(self.layout.active_index);
    }

    /// Jump to `index`. Indices past the last valid active index are ignored.
    pub fn slide_to(&mut self, doc: &mut dyn Document, index: usize) {
        if !self.is_initialized || index > self.rewind_boundary() {
            return;
        }
        self.layout.active_index = index;
        self.slide(doc);
        tracing::debug!(target: targets::SLIDER, id = ?self.id, index, "slide to");
        self.slid_to.emit(index);
    }

    /// Reset to the first item when the visible items no longer fill the
    /// list, then update. Call after the viewport is resized.
    pub fn recalc(&mut self, doc: &mut dyn Document) {
        if !self.is_initialized {
            return;
        }
        if self.layout.visible_items_width < doc.offset_width(self.list) {
            self.layout.active_index = 0;
        }
        self.update(doc);
        self.recalculated.emit(self.layout.active_index);
    }

    /// Recompute the visible window and apply classes, focusability and the
    /// list transform for the current active index.
    pub fn update(&mut self, doc: &mut dyn Document) {
        let classes = &self.options.classes;
        let active_index = self.layout.active_index;
        let list_width = doc.offset_width(self.list);
        let mut visible_count = 0usize;
        let mut visible_width = 0.0f64;

        for (i, item) in self.items.iter().enumerate() {
            doc.remove_class(*item, &classes.is_active);
            doc.remove_class(*item, &classes.is_visible);
            let mut is_visible = false;
            if active_index <= i && visible_width < list_width {
                visible_width += doc.bounding_width(*item).ceil();
                visible_count += 1;
                doc.add_class(*item, &classes.is_visible);
                is_visible = true;
            }
            if active_index == i {
                doc.add_class(*item, &classes.is_active);
            }
            for focusable in doc.focusable_descendants(*item) {
                if is_visible {
                    if let Some(original) = self.tabindex_overrides.remove(&focusable) {
                        match original {
                            Some(value) => doc.set_attribute(focusable, "tabindex", &value),
                            None => doc.remove_attribute(focusable, "tabindex"),
                        }
                    }
                } else {
                    self.tabindex_overrides
                        .entry(focusable)
                        .or_insert_with(|| doc.attribute(focusable, "tabindex"));
                    doc.set_attribute(focusable, "tabindex", "-1");
                }
            }
        }

        for slide_to in &self.slide_to_triggers {
            doc.remove_class(slide_to.trigger, &classes.is_active);
            if slide_to.index == active_index {
                doc.add_class(slide_to.trigger, &classes.is_active);
            }
        }

        // A collapsed viewport still needs a finite percent per item.
        let effective_count = visible_count.max(1);
        let item_percent = 100.0 / effective_count as f64;
        let last_active_index = self.items.len().saturating_sub(effective_count);
        self.layout = Layout {
            active_index,
            visible_items_count: visible_count,
            visible_items_width: visible_width,
            item_percent,
            current_percent: -item_percent * active_index as f64,
            last_active_index,
            last_active_index_percent: -item_percent * last_active_index as f64,
        };

        doc.remove_class(self.element, &classes.has_no_next_item);
        doc.remove_class(self.element, &classes.has_no_prev_item);
        if !self.options.rewind {
            if active_index == last_active_index {
                doc.add_class(self.element, &classes.has_no_next_item);
            }
            if active_index == 0 {
                doc.add_class(self.element, &classes.has_no_prev_item);
            }
        }
        doc.set_style(self.list, "transform", &translate_x(self.layout.current_percent));
        tracing::trace!(
            target: targets::SLIDER,
            id = ?self.id,
            active_index,
            visible_count,
            last_active_index,
            "slider updated"
        );
    }

    // =========================================================================
    // Event handling
    // =========================================================================

    /// Handle an event delivered to one of the slider's own listeners.
    pub fn handle_event(&mut self, doc: &mut dyn Document, event: &DomEvent, flow: &mut EventFlow) {
        match event {
            DomEvent::Click { target } => {
                flow.prevent_default();
                let target = *target;
                if self.next_trigger.is_some_and(|t| doc.contains(t, target)) {
                    self.next(doc);
                } else if self.prev_trigger.is_some_and(|t| doc.contains(t, target)) {
                    self.prev(doc);
                } else {
                    let index = self
                        .slide_to_triggers
                        .iter()
                        .find(|s| doc.contains(s.trigger, target))
                        .map(|s| s.index);
                    if let Some(index) = index {
                        self.slide_to(doc, index);
                    }
                }
            }
            DomEvent::TransitionEnd { target } if *target == self.list => self.slide_end(doc),
            _ => {
                if let Some(input @ DragInput::Start { .. }) = DragInput::from_event(event) {
                    self.handle_drag_input(doc, input, flow);
                }
            }
        }
    }

    /// Handle a normalized drag input. Move and end inputs are only honored
    /// while this slider owns the active session on the same channel.
    pub fn handle_drag_input(&mut self, doc: &mut dyn Document, input: DragInput, flow: &mut EventFlow) {
        if !self.is_initialized {
            return;
        }
        match input {
            DragInput::Start { channel, target, point } => {
                if !self.channels.contains(&channel) || !self.is_element_draggable(doc, target) {
                    return;
                }
                if !self.registry.lock().try_begin(self.id, channel) {
                    return;
                }
                self.drag.touch_start = point;
                self.drag.channel = Some(channel);
                self.drag_start(doc, point.x);
                doc.add_class(self.element, self.options.classes.dragging_class(channel));
            }
            DragInput::Move { channel, point } => {
                if !self.owns_session(channel) {
                    return;
                }
                let direction = *self
                    .drag
                    .touch_direction
                    .get_or_insert_with(|| TouchDirection::detect(self.drag.touch_start, point));
                if direction == TouchDirection::Horizontal {
                    if channel == DragChannel::Touch {
                        flow.prevent_default();
                    }
                    self.drag_move(doc, point.x);
                }
            }
            DragInput::End { channel } => {
                if !self.owns_session(channel) {
                    return;
                }
                self.registry.lock().end(channel);
                doc.remove_class(self.element, self.options.classes.dragging_class(channel));
                self.drag_end(doc);
            }
        }
    }

    /// Handle a fired timer owned by this slider.
    pub fn handle_timer(&mut self, timer: TimerId) {
        if self.drag.long_drag_timer == Some(timer) {
            self.drag.long_drag_timer = None;
            if self.drag.is_dragging {
                self.drag.is_long_drag = true;
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Largest index reachable by stepping.
    fn rewind_boundary(&self) -> usize {
        self.layout.last_active_index
    }

    fn all_triggers(&self) -> Vec<NodeId> {
        self.next_trigger
            .into_iter()
            .chain(self.prev_trigger)
            .chain(self.slide_to_triggers.iter().map(|s| s.trigger))
            .collect()
    }

    fn owns_session(&self, channel: DragChannel) -> bool {
        self.drag.is_dragging
            && self.drag.channel == Some(channel)
            && self
                .registry
                .lock()
                .active()
                .is_some_and(|session| session.owner == self.id && session.channel == channel)
    }

    /// A drag may not start on a focusable element inside the viewport.
    fn is_element_draggable(&self, doc: &dyn Document, target: NodeId) -> bool {
        let mut current = Some(target);
        while let Some(node) = current {
            if node == self.viewport {
                return true;
            }
            if doc.is_focusable(node) {
                return false;
            }
            current = doc.parent(node);
        }
        true
    }

    fn slide(&mut self, doc: &mut dyn Document) {
        doc.add_class(self.element, &self.options.classes.is_sliding);
        doc.remove_class(self.element, &self.options.classes.is_sliding_finished);
        self.update(doc);
    }

    fn slide_end(&mut self, doc: &mut dyn Document) {
        let classes = &self.options.classes;
        doc.remove_class(self.element, &classes.is_sliding);
        doc.add_class(self.element, &classes.is_sliding_finished);
        doc.remove_class(self.element, &classes.is_rewinding);
    }

    fn drag_start(&mut self, doc: &mut dyn Document, position: f64) {
        if let Some(timer) = self.drag.long_drag_timer.take() {
            doc.cancel_timer(timer);
        }
        self.drag.long_drag_timer = Some(doc.start_timer(
            Duration::from_millis(self.options.long_drag_ms),
            ListenerOwner::Slider(self.id),
        ));
        self.drag.start_position = position;
        self.drag.move_position = position;
        self.drag.move_percent = self.layout.current_percent;
        self.drag.is_dragging = true;
        self.drag.is_long_drag = false;
        self.drag.touch_direction = None;
        doc.add_class(self.element, &self.options.classes.is_dragging);
        doc.set_style(self.list, "transition-duration", "");
        tracing::trace!(target: targets::SLIDER, id = ?self.id, position, "drag started");
        if let Some(channel) = self.drag.channel {
            self.drag_started.emit(channel);
        }
    }

    fn drag_move(&mut self, doc: &mut dyn Document, position: f64) {
        if self.layout.visible_items_width <= 0.0 {
            return;
        }
        self.drag.move_position = position;
        let start = self.drag.start_position;
        let mut percent =
            self.layout.current_percent + (100.0 / self.layout.visible_items_width) * (position - start);
        let last = self.layout.last_active_index_percent;
        if position < start && percent < last {
            percent = elastic_past_end(percent, last);
        }
        if position > start && percent > 0.0 {
            percent = elastic_past_start(percent);
        }
        self.drag.move_percent = percent;
        doc.set_style(self.list, "transform", &translate_x(percent));
        self.drag_moved.emit(percent);
    }

    fn drag_end(&mut self, doc: &mut dyn Document) {
        let drag = &self.drag;
        if drag.move_position != drag.start_position {
            let position = -drag.move_percent / self.layout.item_percent;
            let index = if drag.is_long_drag {
                round_half_up(position)
            } else if drag.move_position < drag.start_position {
                position.ceil()
            } else {
                position.floor()
            };
            self.layout.active_index = index.clamp(0.0, self.layout.last_active_index as f64) as usize;
            self.slide(doc);
        }

        if let Some(timer) = self.drag.long_drag_timer.take() {
            doc.cancel_timer(timer);
        }
        self.drag = DragState::default();
        doc.remove_class(self.element, &self.options.classes.is_dragging);
        tracing::trace!(target: targets::SLIDER, id = ?self.id, index = self.layout.active_index, "drag ended");
        self.drag_ended.emit(self.layout.active_index);
    }
}

/// Damping past the last active index: `last - sqrt(last - percent)`.
pub fn elastic_past_end(percent: f64, last_percent: f64) -> f64 {
    last_percent - (last_percent - percent).sqrt()
}

/// Damping past the first item: `sqrt(percent)`.
pub fn elastic_past_start(percent: f64) -> f64 {
    percent.sqrt()
}

/// Rounding with halves towards positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn translate_x(percent: f64) -> String {
    // Avoid rendering negative zero.
    let percent = if percent == 0.0 { 0.0 } else { percent };
    format!("translateX({percent}%)")
}

static_assertions::assert_impl_all!(Slider: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dom::{Capabilities, MemoryDocument, PointerType};

    struct Fixture {
        doc: MemoryDocument,
        element: NodeId,
        viewport: NodeId,
        list: NodeId,
        items: Vec<NodeId>,
        prev: NodeId,
        next: NodeId,
        dots: Vec<NodeId>,
    }

    /// Six 100px items in a 300px list: three visible, last active index 3.
    fn setup() -> Fixture {
        let mut doc = MemoryDocument::from_body_html(
            r#"<div id="slider">
                <div id="viewport">
                    <ul id="list">
                        <li><a href="/1">1</a></li>
                        <li><a href="/2">2</a></li>
                        <li><a href="/3">3</a></li>
                        <li><a href="/4">4</a></li>
                        <li><a href="/5" tabindex="0">5</a></li>
                        <li><span class="plain">6</span></li>
                    </ul>
                </div>
                <button id="prev">Prev</button>
                <button id="next">Next</button>
                <button class="dot">0</button>
                <button class="dot">3</button>
            </div>"#,
        );
        let body = doc.body();
        let element = doc.query_selector(body, "#slider").unwrap();
        let viewport = doc.query_selector(body, "#viewport").unwrap();
        let list = doc.query_selector(body, "#list").unwrap();
        let items = doc.query_selector_all(list, "li");
        let prev = doc.query_selector(body, "#prev").unwrap();
        let next = doc.query_selector(body, "#next").unwrap();
        let dots = doc.query_selector_all(body, ".dot");
        doc.set_size(list, 300.0, 100.0);
        for item in &items {
            doc.set_size(*item, 100.0, 100.0);
        }
        Fixture {
            doc,
            element,
            viewport,
            list,
            items,
            prev,
            next,
            dots,
        }
    }

    fn build(fx: &Fixture, options: SliderOptions) -> Slider {
        SliderBuilder::new()
            .element(fx.element)
            .viewport(fx.viewport)
            .list(fx.list)
            .items(fx.items.clone())
            .prev_trigger(fx.prev)
            .next_trigger(fx.next)
            .slide_to_trigger(fx.dots[0], 0)
            .slide_to_trigger(fx.dots[1], 3)
            .options(options)
            .build()
            .unwrap()
    }

    fn no_rewind() -> SliderOptions {
        SliderOptions {
            rewind: false,
            ..Default::default()
        }
    }

    fn mouse_down(target: NodeId, x: f64) -> DomEvent {
        DomEvent::MouseDown {
            target,
            point: Point::new(x, 0.0),
        }
    }

    fn mouse_move(doc: &MemoryDocument, x: f64) -> DragInput {
        DragInput::from_event(&DomEvent::MouseMove {
            target: doc.root(),
            point: Point::new(x, 0.0),
        })
        .unwrap()
    }

    #[test]
    fn test_build_requires_references() {
        let fx = setup();
        let err = SliderBuilder::new()
            .element(fx.element)
            .list(fx.list)
            .items(fx.items.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingOption { option: "viewport", .. }));

        let err = SliderBuilder::new()
            .element(fx.element)
            .viewport(fx.viewport)
            .list(fx.list)
            .items(Vec::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOption { option: "items", .. }));

        assert!(SliderBuilder::new().slide_to_trigger_str(fx.dots[0], "two").is_err());
        assert!(SliderBuilder::new().slide_to_trigger_str(fx.dots[0], " 2 ").is_ok());
    }

    #[test]
    fn test_init_layout() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);

        assert_eq!(slider.active_index(), 0);
        assert_eq!(slider.visible_items_count(), 3);
        assert_eq!(slider.last_active_index(), 3);
        assert!(fx.doc.has_class(fx.items[0], "is-active"));
        assert!(fx.doc.has_class(fx.items[2], "is-visible"));
        assert!(!fx.doc.has_class(fx.items[3], "is-visible"));
        assert!(fx.doc.has_class(fx.dots[0], "is-active"));
        assert!(fx.doc.has_class(fx.element, "has-mouse-drag"));
        assert!(fx.doc.has_class(fx.element, "has-pointer-drag"));
        assert_eq!(fx.doc.style(fx.list, "transform").as_deref(), Some("translateX(0%)"));

        let hidden_link = fx.doc.query_selector(fx.items[3], "a").unwrap();
        let visible_link = fx.doc.query_selector(fx.items[0], "a").unwrap();
        assert_eq!(fx.doc.attribute(hidden_link, "tabindex").as_deref(), Some("-1"));
        assert_eq!(fx.doc.attribute(visible_link, "tabindex"), None);
    }

    #[test]
    fn test_initial_index_past_end_resets() {
        let mut fx = setup();
        let options = SliderOptions {
            initial_index: 6,
            ..Default::default()
        };
        let mut slider = build(&fx, options);
        slider.init(&mut fx.doc);
        assert_eq!(slider.active_index(), 0);
    }

    #[test]
    fn test_navigation_without_rewind_stays_in_bounds() {
        let mut fx = setup();
        let mut slider = build(&fx, no_rewind());
        slider.init(&mut fx.doc);
        assert!(fx.doc.has_class(fx.element, "has-no-prev-item"));

        slider.prev(&mut fx.doc);
        assert_eq!(slider.active_index(), 0);

        for _ in 0..10 {
            slider.next(&mut fx.doc);
            assert!(slider.active_index() <= slider.last_active_index());
        }
        assert_eq!(slider.active_index(), 3);
        assert!(fx.doc.has_class(fx.element, "has-no-next-item"));
        assert!(!fx.doc.has_class(fx.element, "has-no-prev-item"));
        assert!(fx.doc.has_class(fx.dots[1], "is-active"));
    }

    #[test]
    fn test_rewind_at_both_ends() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);

        slider.prev(&mut fx.doc);
        assert_eq!(slider.active_index(), 3);
        assert!(fx.doc.has_class(fx.element, "is-rewinding"));
        assert!(!fx.doc.has_class(fx.element, "has-no-next-item"));

        slider.handle_event(
            &mut fx.doc,
            &DomEvent::TransitionEnd { target: fx.list },
            &mut EventFlow::default(),
        );
        assert!(!fx.doc.has_class(fx.element, "is-rewinding"));
        assert!(fx.doc.has_class(fx.element, "is-sliding-finished"));

        slider.next(&mut fx.doc);
        assert_eq!(slider.active_index(), 0);
        assert!(fx.doc.has_class(fx.element, "is-rewinding"));
        assert!(fx.doc.has_class(fx.element, "is-sliding"));
    }

    #[test]
    fn test_slide_to() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);
        let emitted = Arc::new(AtomicUsize::new(0));
        let emitted_clone = emitted.clone();
        slider.slid_to.connect(move |_| {
            emitted_clone.fetch_add(1, Ordering::SeqCst);
        });

        slider.slide_to(&mut fx.doc, 4);
        assert_eq!(slider.active_index(), 0);
        assert_eq!(emitted.load(Ordering::SeqCst), 0);

        slider.slide_to(&mut fx.doc, 2);
        assert_eq!(slider.active_index(), 2);
        assert_eq!(emitted.load(Ordering::SeqCst), 1);
        assert_eq!(
            fx.doc.style(fx.list, "transform").as_deref(),
            Some("translateX(-66.66666666666667%)")
        );
    }

    #[test]
    fn test_trigger_clicks() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);

        let mut flow = EventFlow::default();
        slider.handle_event(&mut fx.doc, &DomEvent::Click { target: fx.next }, &mut flow);
        assert!(flow.default_prevented);
        assert_eq!(slider.active_index(), 1);

        slider.handle_event(&mut fx.doc, &DomEvent::Click { target: fx.dots[1] }, &mut flow);
        assert_eq!(slider.active_index(), 3);

        slider.handle_event(&mut fx.doc, &DomEvent::Click { target: fx.prev }, &mut flow);
        assert_eq!(slider.active_index(), 2);
    }

    #[test]
    fn test_recalc_resets_when_window_underfilled() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);
        slider.slide_to(&mut fx.doc, 3);

        // Viewport grows to four items: the window from index 3 is underfilled.
        fx.doc.set_size(fx.list, 400.0, 100.0);
        slider.recalc(&mut fx.doc);
        assert_eq!(slider.active_index(), 0);
        assert_eq!(slider.visible_items_count(), 4);
        assert_eq!(slider.last_active_index(), 2);
    }

    #[test]
    fn test_zero_width_viewport() {
        let mut fx = setup();
        fx.doc.set_size(fx.list, 0.0, 0.0);
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);

        assert_eq!(slider.visible_items_count(), 0);
        assert_eq!(slider.last_active_index(), 5);
        slider.next(&mut fx.doc);
        assert!(slider.active_index() <= slider.last_active_index());
        assert!(slider.current_percent().is_finite());
    }

    #[test]
    fn test_elastic_damping_is_sublinear() {
        for overshoot in [4.0, 25.0, 100.0] {
            let damped = elastic_past_start(overshoot);
            assert!(damped < overshoot);
            assert!(damped > 0.0);

            let last = -150.0;
            let damped = elastic_past_end(last - overshoot, last);
            assert!(damped > last - overshoot);
            assert!(damped < last);
        }
        assert_eq!(elastic_past_start(16.0), 4.0);
        assert_eq!(elastic_past_end(-159.0, -150.0), -153.0);
    }

    #[test]
    fn test_short_drag_moves_towards_drag_direction() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);
        let mut flow = EventFlow::default();

        slider.handle_event(&mut fx.doc, &mouse_down(fx.items[1], 200.0), &mut flow);
        assert!(slider.is_dragging());
        assert!(fx.doc.has_class(fx.element, "is-mouse-dragging"));

        // 30px left of 300px visible width is 10%, under a third of an item.
        let input = mouse_move(&fx.doc, 170.0);
        slider.handle_drag_input(&mut fx.doc, input, &mut flow);
        assert_eq!(fx.doc.style(fx.list, "transform").as_deref(), Some("translateX(-10%)"));

        slider.handle_drag_input(&mut fx.doc, DragInput::End { channel: DragChannel::Mouse }, &mut flow);
        assert_eq!(slider.active_index(), 1);
        assert!(!slider.is_dragging());
        assert!(!fx.doc.has_class(fx.element, "is-mouse-dragging"));
        assert!(!fx.doc.has_class(fx.element, "is-dragging"));
        assert_eq!(fx.doc.pending_timer_count(), 0);
    }

    #[test]
    fn test_long_drag_rounds() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);
        let mut flow = EventFlow::default();

        slider.handle_event(&mut fx.doc, &mouse_down(fx.items[1], 200.0), &mut flow);
        for (timer, owner) in fx.doc.advance_timers(Duration::from_millis(250)) {
            assert_eq!(owner, ListenerOwner::Slider(slider.id()));
            slider.handle_timer(timer);
        }
        let input = mouse_move(&fx.doc, 170.0);
        slider.handle_drag_input(&mut fx.doc, input, &mut flow);
        slider.handle_drag_input(&mut fx.doc, DragInput::End { channel: DragChannel::Mouse }, &mut flow);
        assert_eq!(slider.active_index(), 0);
    }

    #[test]
    fn test_drag_past_start_is_clamped() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);
        let mut flow = EventFlow::default();

        slider.handle_event(&mut fx.doc, &mouse_down(fx.items[0], 0.0), &mut flow);
        let input = mouse_move(&fx.doc, 900.0);
        slider.handle_drag_input(&mut fx.doc, input, &mut flow);
        let transform = fx.doc.style(fx.list, "transform").unwrap();
        let percent: f64 = transform
            .trim_start_matches("translateX(")
            .trim_end_matches("%)")
            .parse()
            .unwrap();
        assert!((percent - 300f64.sqrt()).abs() < 1e-9);

        slider.handle_drag_input(&mut fx.doc, DragInput::End { channel: DragChannel::Mouse }, &mut flow);
        assert_eq!(slider.active_index(), 0);
    }

    #[test]
    fn test_vertical_drag_is_ignored() {
        let mut fx = setup();
        fx.doc.set_capabilities(Capabilities {
            touch_events: true,
            pointer_events: true,
        });
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);
        let mut flow = EventFlow::default();

        let start = DomEvent::TouchStart {
            target: fx.items[1],
            point: Point::new(100.0, 100.0),
        };
        slider.handle_event(&mut fx.doc, &start, &mut flow);
        let vertical = DragInput::Move {
            channel: DragChannel::Touch,
            point: Point::new(90.0, 160.0),
        };
        slider.handle_drag_input(&mut fx.doc, vertical, &mut flow);
        assert!(!flow.default_prevented);
        let later = DragInput::Move {
            channel: DragChannel::Touch,
            point: Point::new(0.0, 160.0),
        };
        slider.handle_drag_input(&mut fx.doc, later, &mut flow);
        assert_eq!(fx.doc.style(fx.list, "transform").as_deref(), Some("translateX(0%)"));

        slider.handle_drag_input(&mut fx.doc, DragInput::End { channel: DragChannel::Touch }, &mut flow);
        assert_eq!(slider.active_index(), 0);
    }

    #[test]
    fn test_drag_does_not_start_on_focusable() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);
        let link = fx.doc.query_selector(fx.items[0], "a").unwrap();

        slider.handle_event(&mut fx.doc, &mouse_down(link, 10.0), &mut EventFlow::default());
        assert!(!slider.is_dragging());
    }

    #[test]
    fn test_one_session_across_sliders() {
        let mut fx = setup();
        let registry = DragRegistry::shared();
        let mut first = SliderBuilder::new()
            .element(fx.element)
            .viewport(fx.viewport)
            .list(fx.list)
            .items(fx.items.clone())
            .registry(registry.clone())
            .build()
            .unwrap();
        let mut second = SliderBuilder::new()
            .element(fx.element)
            .viewport(fx.viewport)
            .list(fx.list)
            .items(fx.items.clone())
            .registry(registry.clone())
            .build()
            .unwrap();
        first.init(&mut fx.doc);
        second.init(&mut fx.doc);
        let mut flow = EventFlow::default();

        first.handle_event(&mut fx.doc, &mouse_down(fx.items[0], 0.0), &mut flow);
        second.handle_event(&mut fx.doc, &mouse_down(fx.items[0], 0.0), &mut flow);
        assert!(first.is_dragging());
        assert!(!second.is_dragging());

        // An end on another channel leaves the session alone.
        first.handle_drag_input(&mut fx.doc, DragInput::End { channel: DragChannel::Touch }, &mut flow);
        assert!(first.is_dragging());

        first.destroy(&mut fx.doc);
        assert_eq!(registry.lock().active(), None);
        second.handle_event(&mut fx.doc, &mouse_down(fx.items[0], 0.0), &mut flow);
        assert!(second.is_dragging());
    }

    #[test]
    fn test_pointer_channel_ignores_mouse_pointers() {
        let mut fx = setup();
        let mut slider = build(&fx, SliderOptions::default());
        slider.init(&mut fx.doc);
        let mut flow = EventFlow::default();

        let mouse_pointer = DomEvent::PointerDown {
            target: fx.items[0],
            point: Point::default(),
            pointer_type: PointerType::Mouse,
        };
        slider.handle_event(&mut fx.doc, &mouse_pointer, &mut flow);
        assert!(!slider.is_dragging());

        let touch_pointer = DomEvent::PointerDown {
            target: fx.items[0],
            point: Point::default(),
            pointer_type: PointerType::Touch,
        };
        slider.handle_event(&mut fx.doc, &touch_pointer, &mut flow);
        assert!(fx.doc.has_class(fx.element, "is-pointer-dragging"));
    }

    #[test]
    fn test_destroy_round_trip() {
        let mut fx = setup();
        let baseline = fx.doc.listener_count();
        let mut slider = build(&fx, SliderOptions::default());

        slider.init(&mut fx.doc);
        let registered = fx.doc.listener_count();
        let classes = fx.doc.classes(fx.element);
        let transform = fx.doc.style(fx.list, "transform");

        slider.next(&mut fx.doc);
        slider.handle_event(&mut fx.doc, &mouse_down(fx.items[1], 50.0), &mut EventFlow::default());
        slider.destroy(&mut fx.doc);

        assert!(!slider.is_initialized());
        assert_eq!(fx.doc.listener_count(), baseline);
        assert_eq!(fx.doc.pending_timer_count(), 0);
        assert_eq!(fx.doc.style(fx.list, "transform").as_deref(), Some("none"));
        assert!(fx.doc.classes(fx.element).is_empty());
        assert_eq!(fx.doc.style(fx.viewport, "touch-action"), None);
        let hidden_link = fx.doc.query_selector(fx.items[3], "a").unwrap();
        assert_eq!(fx.doc.attribute(hidden_link, "tabindex"), None);
        let authored = fx.doc.query_selector(fx.items[4], "a").unwrap();
        assert_eq!(fx.doc.attribute(authored, "tabindex").as_deref(), Some("0"));

        slider.init(&mut fx.doc);
        assert_eq!(fx.doc.listener_count(), registered);
        assert_eq!(fx.doc.classes(fx.element), classes);
        assert_eq!(fx.doc.style(fx.list, "transform"), transform);
        assert_eq!(slider.active_index(), 0);
    }
}
