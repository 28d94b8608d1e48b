//! Search results filter runtime
//!
//! Polls until the first product entry appears, runs one pass, then reruns
//! on debounced scroll and on re-entry to the results route. The control
//! panel is built once after the settle delay and every change on it
//! triggers another pass.

use std::cell::RefCell;

use am_core::panel::{PanelControl, PanelInput, PanelState, PANEL_ID};
use am_core::schedule::{Debouncer, PollStep, Poller};
use am_core::status::{StatusOverlay, STATUS_ID};
use am_core::{FilterSettings, Preferences, Route, RunReport};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use crate::dom::{StyleTarget, WebDocument};
use crate::storage::LocalStore;
use crate::timers::{listen, set_timeout};
use crate::{config, current_route, engine, system_prefers_dark};

#[derive(Default)]
struct SearchState {
    poller: Poller,
    debouncer: Debouncer,
    polling: bool,
    scroll_attached: bool,
}

thread_local! {
    static STATE: RefCell<SearchState> = RefCell::new(SearchState::default());
}

/// Start on entering the results route. Polling happens once per page
/// lifetime; later entries just run a pass over the new results.
pub fn boot() {
    let (done, polling) = STATE.with(|s| {
        let mut state = s.borrow_mut();
        let polling = std::mem::replace(&mut state.polling, true);
        (state.poller.is_done(), polling)
    });
    if done {
        run_pass();
    } else if !polling {
        poll();
    }
}

fn poll() {
    // Left the results route; the next entry restarts polling
    if current_route() != Route::SearchResults {
        STATE.with(|s| s.borrow_mut().polling = false);
        return;
    }
    let (Some(engine), Some(doc)) = (engine(), WebDocument::current()) else {
        return;
    };
    let found = engine.discover(&doc).len();

    match STATE.with(|s| s.borrow_mut().poller.step(found)) {
        PollStep::Run => {
            log::debug!("{} product entries found", found);
            run_pass();
            attach_scroll();
            set_timeout(config().timings.panel_settle(), build_panel);
        }
        PollStep::Retry => set_timeout(config().timings.product_poll(), poll),
        PollStep::Done => {}
    }
}

/// Classify, reconcile visibility, then refresh the overlay.
pub fn run_pass() -> Option<RunReport> {
    let engine = engine()?;
    let doc = WebDocument::current()?;
    let settings = Preferences::load(&LocalStore::new(), system_prefers_dark()).filter_settings();

    let report = engine.run(&doc, &mut StyleTarget, &settings);
    if let Err(err) = render_status(&doc.0, &settings) {
        log::warn!("failed to render status overlay: {:?}", err);
    }
    Some(report)
}

fn attach_scroll() {
    let attach = STATE.with(|s| {
        let mut state = s.borrow_mut();
        !std::mem::replace(&mut state.scroll_attached, true)
    });
    if !attach {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };

    listen(&window, "scroll", |_| {
        let ticket = STATE.with(|s| s.borrow_mut().debouncer.trigger());
        set_timeout(config().timings.scroll_debounce(), move || {
            if STATE.with(|s| s.borrow_mut().debouncer.fire(ticket)) {
                run_pass();
            }
        });
    });
}

// =============================================================================
// Status Overlay
// =============================================================================

fn render_status(doc: &Document, settings: &FilterSettings) -> Result<(), JsValue> {
    let overlay = match doc.get_element_by_id(STATUS_ID) {
        Some(existing) => existing,
        None => {
            let created = doc.create_element("div")?;
            created.set_id(STATUS_ID);
            doc.body().ok_or("document has no body")?.append_child(&created)?;
            created
        }
    };
    let overlay: HtmlElement = overlay
        .dyn_into()
        .map_err(|_| JsValue::from_str("status overlay is not an HTML element"))?;
    let style = overlay.style();

    let Some(status) = StatusOverlay::for_settings(settings) else {
        style.set_property("display", "none")?;
        return Ok(());
    };

    for (name, value) in [
        ("display", "block"),
        ("position", "fixed"),
        ("top", "12px"),
        ("right", "12px"),
        ("z-index", "2147483646"),
        ("padding", "8px 12px"),
        ("border-radius", "6px"),
        ("background", "rgba(0, 0, 0, 0.75)"),
        ("color", "#fff"),
        ("font-size", "12px"),
    ] {
        style.set_property(name, value)?;
    }

    overlay.set_inner_html("");
    let title = doc.create_element("strong")?;
    title.set_text_content(Some(status.title));
    overlay.append_child(&title)?;
    for line in &status.lines {
        let row = doc.create_element("div")?;
        row.set_text_content(Some(line));
        overlay.append_child(&row)?;
    }
    Ok(())
}

// =============================================================================
// Control Panel
// =============================================================================

fn build_panel() {
    let Some(doc) = WebDocument::current() else {
        return;
    };
    if doc.0.get_element_by_id(PANEL_ID).is_some() {
        return;
    }
    let prefs = Preferences::load(&LocalStore::new(), system_prefers_dark());
    if let Err(err) = render_panel(&doc.0, &PanelState::from_prefs(&prefs)) {
        log::warn!("failed to build control panel: {:?}", err);
    }
}

fn render_panel(doc: &Document, state: &PanelState) -> Result<(), JsValue> {
    let panel: HtmlElement = doc
        .create_element("div")?
        .dyn_into()
        .map_err(|_| JsValue::from_str("panel is not an HTML element"))?;
    panel.set_id(PANEL_ID);

    let background = state.theme.background();
    let foreground = if state.theme.is_dark() { "#E6E6E6" } else { "#111111" };
    let style = panel.style();
    for (name, value) in [
        ("position", "fixed"),
        ("bottom", "16px"),
        ("right", "16px"),
        ("z-index", "2147483647"),
        ("padding", "10px 14px"),
        ("border-radius", "8px"),
        ("box-shadow", "0 2px 8px rgba(0, 0, 0, 0.3)"),
        ("font-size", "13px"),
        ("background", background),
        ("color", foreground),
    ] {
        style.set_property(name, value)?;
    }

    for control in PanelControl::ALL {
        let row = render_control(doc, state, control)?;
        panel.append_child(&row)?;
    }

    doc.body().ok_or("document has no body")?.append_child(&panel)?;
    Ok(())
}

fn render_control(doc: &Document, state: &PanelState, control: PanelControl) -> Result<Element, JsValue> {
    let row = doc.create_element("div")?;
    let label = doc.create_element("label")?;
    label.set_attribute("for", control.id())?;
    label.set_text_content(Some(control.label()));

    let input: HtmlInputElement = doc
        .create_element("input")?
        .dyn_into()
        .map_err(|_| JsValue::from_str("input is not an input element"))?;
    input.set_id(control.id());

    match control.number_spec() {
        Some(spec) => {
            input.set_type("number");
            input.set_min(&spec.min.to_string());
            if let Some(max) = spec.max {
                input.set_max(&max.to_string());
            }
            input.set_step(&spec.step.to_string());
            input.set_value(&state.value_text(control).unwrap_or_default());
            let _ = input.style().set_property("width", "64px");
        }
        None => {
            input.set_type("checkbox");
            input.set_checked(state.is_checked(control).unwrap_or(false));
        }
    }
    input.set_disabled(!state.is_interactive(control));

    listen(&input, "change", move |_| on_change(control));

    row.append_child(&label)?;
    row.append_child(&input)?;
    Ok(row)
}

fn control_input(doc: &Document, control: PanelControl) -> Option<HtmlInputElement> {
    doc.get_element_by_id(control.id())?.dyn_into().ok()
}

fn on_change(control: PanelControl) {
    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(input) = control_input(&doc, control) else {
        return;
    };

    let change = match control {
        PanelControl::Master => PanelInput::Master(input.checked()),
        PanelControl::Sponsored => PanelInput::Sponsored(input.checked()),
        PanelControl::MinRating => PanelInput::MinRating(input.value()),
        PanelControl::MinReviews => PanelInput::MinReviews(input.value()),
    };
    change.apply(&mut LocalStore::new());

    if let PanelInput::Master(enabled) = change {
        for dependent in PanelControl::ALL.into_iter().filter(|c| c.is_dependent()) {
            if let Some(other) = control_input(&doc, dependent) {
                other.set_disabled(!enabled);
            }
        }
    }

    if let Some(report) = run_pass() {
        log::debug!("panel change: {} of {} entries hidden", report.hidden, report.discovered);
    }
}
