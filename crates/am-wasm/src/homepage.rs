//! Homepage replacer bindings

use std::cell::RefCell;

use am_core::homepage::{
    ids, lift_stale_suppression, restore_original, HomeLayout, ToggleFace, DARK_BODY_CLASS, DARK_CLASS, QUICK_LINK_CLASS,
    READY_CLASS, SUPPRESSION_CSS,
};
use am_core::prefs::{keys, toggle_theme};
use am_core::{HomePage, HomepageReplacer, Route, Stores, Theme};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use crate::storage::{asset_url, ExtensionStore, LocalStore};
use crate::timers::listen;
use crate::{config, current_route, system_prefers_dark};

const LOGO_ASSET: &str = "amazon_homepage.png";

thread_local! {
    static REPLACER: RefCell<HomepageReplacer> =
        RefCell::new(HomepageReplacer::new(config().marketplace.clone()));
}

/// Entry point on every route change: suppress early on Home, clean up
/// elsewhere.
pub fn boot(route: Route) {
    let Some(mut page) = BrowserPage::current() else {
        return;
    };
    REPLACER.with(|r| r.borrow_mut().arm(route, &mut page));

    if route != Route::Home {
        return;
    }

    let ready_state = page.document.ready_state();
    if ready_state == "loading" {
        listen(&page.document, "DOMContentLoaded", |_| schedule_run());
    } else {
        schedule_run();
    }

    // Fallback; a no-op once the container exists
    if ready_state != "complete" {
        if let Some(window) = web_sys::window() {
            listen(&window, "load", |_| schedule_run());
        }
    }
}

/// Run the pipeline once the extension store has answered.
pub fn schedule_run() {
    spawn_local(async {
        let mut extension = ExtensionStore::load(&[keys::EXTENSION_DISABLED]).await;
        let mut local = LocalStore::new();

        if let Some(mut page) = BrowserPage::current() {
            let route = current_route();
            let system_dark = system_prefers_dark();
            let mut stores = Stores::new(&mut extension, &mut local);
            REPLACER.with(|r| r.borrow_mut().run(route, &mut page, &mut stores, system_dark));
        }

        extension.flush().await;
    });
}

/// Remove the suppression stylesheet if one is armed.
pub fn lift() {
    if let Some(mut page) = BrowserPage::current() {
        lift_stale_suppression(&mut page);
    }
}

// =============================================================================
// Browser Page
// =============================================================================

pub struct BrowserPage {
    document: Document,
}

impl BrowserPage {
    pub fn current() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }

    fn create<T: JsCast>(&self, tag: &str) -> Result<T, JsValue> {
        self.document
            .create_element(tag)?
            .dyn_into::<T>()
            .map_err(|_| JsValue::from_str("unexpected element type"))
    }

    fn render(&self, layout: &HomeLayout) -> Result<(), JsValue> {
        let body = self.document.body().ok_or("document has no body")?;
        let dark = layout.theme.is_dark();

        let container: Element = self.create("div")?;
        container.set_id(ids::CONTAINER);

        // Logo: clicking re-navigates home so the replacer runs again
        let logo_container: Element = self.create("div")?;
        logo_container.set_id(ids::LOGO_CONTAINER);

        let logo_link: web_sys::HtmlAnchorElement = self.create("a")?;
        logo_link.set_href(layout.home_href);
        logo_link.set_id(ids::LOGO_LINK);
        let home = layout.home_href;
        listen(&logo_link, "click", move |event| {
            event.prevent_default();
            if let Some(window) = web_sys::window() {
                let _ = window.location().set_href(home);
            }
        });

        let logo_img: web_sys::HtmlImageElement = self.create("img")?;
        logo_img.set_id(ids::LOGO_IMAGE);
        if let Some(src) = asset_url(LOGO_ASSET) {
            logo_img.set_src(&src);
        }
        logo_img.set_alt(layout.logo_alt);
        let style = logo_img.style();
        style.set_property("cursor", "pointer")?;
        style.set_property("max-height", "120px")?;
        style.set_property("width", "auto")?;

        let logo_bg: Element = self.create("div")?;
        logo_bg.set_id(ids::LOGO_BACKGROUND);
        if dark {
            logo_bg.set_class_name(DARK_CLASS);
        }
        logo_bg.append_child(&logo_img)?;
        logo_link.append_child(&logo_bg)?;
        logo_container.append_child(&logo_link)?;

        // Search: native GET submission, suppression lifted first
        let form: web_sys::HtmlFormElement = self.create("form")?;
        form.set_id(ids::SEARCH_FORM);
        form.set_action(&layout.search.action);
        form.set_method(layout.search.method);
        listen(&form, "submit", |_| lift());

        let input: HtmlInputElement = self.create("input")?;
        input.set_type("text");
        input.set_name(&layout.search.field);
        input.set_id(ids::SEARCH_INPUT);
        input.set_placeholder(&layout.search.placeholder);
        input.set_autocomplete("off");
        input.set_autofocus(true);
        form.append_child(&input)?;

        let links: Element = self.create("div")?;
        links.set_id(ids::QUICK_LINKS);
        for (i, item) in layout.links.iter().enumerate() {
            if i > 0 {
                links.append_child(&self.document.create_text_node(layout.link_separator))?;
            }
            let link: web_sys::HtmlAnchorElement = self.create("a")?;
            link.set_href(&item.url);
            link.set_class_name(QUICK_LINK_CLASS);
            if dark {
                link.class_list().add_1(DARK_CLASS)?;
            }
            link.set_text_content(Some(&item.title));
            links.append_child(&link)?;
        }

        let footer: Element = self.create("div")?;
        footer.set_id(ids::FOOTER);

        let restore: web_sys::HtmlAnchorElement = self.create("a")?;
        restore.set_href("#");
        restore.set_text_content(Some(layout.restore_label));
        listen(&restore, "click", |event| {
            event.prevent_default();
            spawn_local(async {
                let mut extension = ExtensionStore::empty();
                let mut local = LocalStore::new();
                restore_original(&mut Stores::new(&mut extension, &mut local));
                extension.flush().await;
                if let Some(window) = web_sys::window() {
                    let _ = window.location().reload();
                }
            });
        });

        let toggle: HtmlElement = self.create("button")?;
        toggle.set_id(ids::THEME_TOGGLE);
        toggle.set_inner_html(layout.toggle.icon);
        toggle.set_title(layout.toggle.title);
        listen(&toggle, "click", |event| {
            event.prevent_default();
            let theme = toggle_theme(&mut LocalStore::new(), system_prefers_dark());
            if let Some(page) = BrowserPage::current() {
                page.restyle(theme);
            }
        });

        footer.append_child(&restore)?;
        footer.append_child(&self.document.create_text_node(" | "))?;
        footer.append_child(&toggle)?;

        container.append_child(&logo_container)?;
        container.append_child(&form)?;
        container.append_child(&links)?;
        container.append_child(&footer)?;
        body.append_child(&container)?;

        let _ = input.focus();
        Ok(())
    }

    /// Live theme switch after a toggle click.
    fn restyle(&self, theme: Theme) {
        self.paint(theme);
        let dark = theme.is_dark();

        if let Some(toggle) = self.document.get_element_by_id(ids::THEME_TOGGLE) {
            let face = ToggleFace::for_theme(theme);
            toggle.set_inner_html(face.icon);
            let _ = toggle.set_attribute("title", face.title);
        }
        if let Some(logo_bg) = self.document.get_element_by_id(ids::LOGO_BACKGROUND) {
            let _ = logo_bg.class_list().toggle_with_force(DARK_CLASS, dark);
        }
        if let Ok(links) = self.document.query_selector_all(&format!(".{QUICK_LINK_CLASS}")) {
            for i in 0..links.length() {
                if let Some(link) = links.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    let _ = link.class_list().toggle_with_force(DARK_CLASS, dark);
                }
            }
        }
    }
}

impl HomePage for BrowserPage {
    fn has_element(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn inject_suppression(&mut self) {
        if self.has_element(ids::HIDE_STYLE) {
            return;
        }
        let Some(root) = self.document.document_element() else {
            log::debug!("no document element yet, suppression skipped");
            return;
        };
        if let Ok(style) = self.document.create_element("style") {
            style.set_id(ids::HIDE_STYLE);
            style.set_text_content(Some(SUPPRESSION_CSS));
            let _ = root.append_child(&style);
        }
    }

    fn lift_suppression(&mut self) {
        if let Some(style) = self.document.get_element_by_id(ids::HIDE_STYLE) {
            style.remove();
        }
        if let Some(root) = self.document.document_element() {
            let _ = root.class_list().add_1(READY_CLASS);
        }
        if let Some(body) = self.document.body() {
            let _ = body.class_list().add_1(READY_CLASS);
        }
    }

    fn clear_content(&mut self) {
        if let Some(body) = self.document.body() {
            body.set_inner_html("");
        }
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.paint(theme);
    }

    fn mount(&mut self, layout: &HomeLayout) {
        if let Err(err) = self.render(layout) {
            log::warn!("failed to render interface: {:?}", err);
        }
    }
}

impl BrowserPage {
    fn paint(&self, theme: Theme) {
        if let Some(body) = self.document.body() {
            let _ = body.style().set_property("background-color", theme.background());
            let _ = body.class_list().toggle_with_force(DARK_BODY_CLASS, theme.is_dark());
        }
        if let Some(root) = self
            .document
            .document_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            let _ = root.style().set_property("color-scheme", theme.color_scheme());
        }
    }
}
