//! Tessera Page Demo
//!
//! Bootstraps an in-memory page and replays a short interaction script:
//! - slider navigation with live-region announcements
//! - a mouse drag through the document-level listeners
//! - the offset navigation across the medium breakpoint
//! - an ajax modal answered by an in-memory fetcher
//!
//! Run with: cargo run -p tessera --example page_demo [config.toml]
//! Set `RUST_LOG=tessera=debug` for engine logs.

use std::time::Duration;

use tessera::dom::Key;
use tessera::prelude::*;
use tracing_subscriber::EnvFilter;

const PAGE: &str = r#"
    <div data-assistive-alert></div>
    <div data-offset-nav>
        <button data-offset-nav-trigger>Menu</button>
        <nav data-offset-nav-element>
            <a href="/" data-nav-item>Home</a>
            <a href="/work" data-nav-item>Work</a>
        </nav>
    </div>
    <div data-slider>
        <div data-slider-viewport>
            <ul data-slider-list>
                <li data-slider-list-item>One</li>
                <li data-slider-list-item>Two</li>
                <li data-slider-list-item>Three</li>
                <li data-slider-list-item>Four</li>
                <li data-slider-list-item>Five</li>
            </ul>
        </div>
        <button data-slider-prev aria-label="Previous project">Prev</button>
        <button data-slider-next aria-label="Next project">Next</button>
    </div>
    <a href="/contact" data-modal-type="ajax" data-modal-custom-classes="modal--form, modal--wide">Contact</a>
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tessera=info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    let mut doc = MemoryDocument::from_body_html(PAGE);
    let body = doc.body();
    if let Some(list) = doc.query_selector(body, "[data-slider-list]") {
        doc.set_size(list, 300.0, 120.0);
        for item in doc.query_selector_all(list, "li") {
            doc.set_size(item, 100.0, 120.0);
        }
    }

    let fetcher = MemoryFetcher::new();
    let mut app = App::with_fetcher(doc, config, Box::new(fetcher.clone()));
    app.init();
    app.page_loaded();

    let find = |app: &App<MemoryDocument>, selector: &str| {
        let doc = app.document();
        doc.query_selector(doc.root(), selector)
    };
    let announcement = |app: &App<MemoryDocument>| {
        find(app, "[data-assistive-alert]")
            .map(|region| app.document().text_content(region))
            .unwrap_or_default()
    };

    println!("== Slider");
    if let Some(next) = find(&app, "[data-slider-next]") {
        for _ in 0..3 {
            app.dispatch(&DomEvent::Click { target: next });
            println!(
                "  next -> active index {} ({:?})",
                app.sliders()[0].active_index(),
                announcement(&app)
            );
        }
    }
    app.advance_time(Duration::from_secs(7));
    println!("  after 7s the live region reads {:?}", announcement(&app));

    if let Some(item) = find(&app, "[data-slider-list-item]") {
        let root = app.document().root();
        app.dispatch(&DomEvent::MouseDown {
            target: item,
            point: Point::new(250.0, 40.0),
        });
        app.dispatch(&DomEvent::MouseMove {
            target: root,
            point: Point::new(120.0, 42.0),
        });
        app.dispatch(&DomEvent::MouseUp { target: root });
        println!("  drag left -> active index {}", app.sliders()[0].active_index());
    }

    println!("== Offset navigation");
    app.breakpoint_changed("medium", true);
    if let Some(trigger) = find(&app, "[data-offset-nav-trigger]") {
        app.dispatch(&DomEvent::Click { target: trigger });
        println!("  menu clicked -> opened: {}", app.is_offset_nav_opened());
    }
    app.breakpoint_changed("medium", false);
    println!("  leaving the medium range -> opened: {}", app.is_offset_nav_opened());

    println!("== Ajax modal");
    if let Some(trigger) = find(&app, "[data-modal-type]") {
        app.dispatch(&DomEvent::Click { target: trigger });
        for (ticket, request) in fetcher.pending() {
            println!("  requested {} ({:?})", request.url, ticket);
            fetcher.respond(ticket, 200, "<form><button data-modal-close-trigger>Cancel</button></form>");
        }
        app.pump();
        println!("  content item attached: {}", app.modals().parts().is_some_and(|p| p.item.is_some()));

        if let Some(parts) = app.modals().parts() {
            app.dispatch(&DomEvent::KeyDown {
                target: parts.wrapper,
                key: Key::Escape,
                shift: false,
            });
            app.dispatch(&DomEvent::AnimationEnd {
                target: parts.wrapper,
                animation_name: "modal-wrapper-close".into(),
            });
        }
        println!("  after Escape the overlay exists: {}", app.modals().is_wrapper_created());
    }

    Ok(())
}
