use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, KeyboardEvent, MouseEvent};

mod command_executors;
mod components;
mod constants;
mod dom_utils;
mod error;
mod geometry;
mod macros;
mod messages;
mod models;
mod network;
mod state;
mod storage;
mod toast;
mod update;

use messages::Message;
use network::ApiClient;
use state::{dispatch_global_message, STATE};

// Main entry point for the WASM application
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Initialize better panic messages
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document on window"))?;

    create_base_ui(&document)?;
    components::canvas_editor::init(&document)?;
    setup_keyboard_shortcuts(&document)?;
    setup_menu_dismiss(&document)?;

    STATE.with(|state| {
        components::canvas_editor::apply_view_transform(&document, &state.borrow())
    });

    #[cfg(target_arch = "wasm32")]
    if let Err(err) = network::event_stream::open_log_stream() {
        console_warn!("log stream unavailable: {:?}", err);
    }

    console_log!("editor initialized");

    // Catalog and project list load in the background; the last open workflow
    // is restored once the project list is in.
    spawn_local(async {
        match ApiClient::fetch_catalog().await {
            Ok(defs) => dispatch_global_message(Message::CatalogLoaded(defs)),
            Err(err) => dispatch_global_message(Message::CatalogFailed(format!("{:?}", err))),
        }
        match ApiClient::fetch_projects().await {
            Ok(projects) => dispatch_global_message(Message::ProjectsLoaded(projects)),
            Err(err) => dispatch_global_message(Message::PersistenceFailed(format!("{:?}", err))),
        }
        if let Some((project, workflow)) = storage::last_workflow() {
            dispatch_global_message(Message::WorkflowSelected { project, workflow });
        }
    });

    Ok(())
}

/// Build the static page skeleton: library sidebar, the canvas with its
/// transformed workflow container, the project browser and the log drawer.
fn create_base_ui(document: &Document) -> Result<(), JsValue> {
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no document body"))?;

    let library = dom_utils::create_in(document, &body, "div", "library")?;
    library.set_id("library");

    let canvas = dom_utils::create_in(document, &body, "div", "canvas")?;
    canvas.set_id("canvas");
    let workflow = dom_utils::create_in(document, &canvas, "div", "workflow")?;
    workflow.set_id("workflow");

    let browser = dom_utils::create_in(document, &body, "div", "project-browser")?;
    browser.set_id("project-browser");

    let log_panel = dom_utils::create_in(document, &body, "div", "log-panel")?;
    log_panel.set_id("log-panel");

    components::wire_view::ensure_overlay(document)?;
    Ok(())
}

/// Delete removes the selection; Ctrl/Cmd+Z and Ctrl/Cmd+Y drive undo/redo.
/// Keys typed into form fields are left alone.
fn setup_keyboard_shortcuts(document: &Document) -> Result<(), JsValue> {
    let on_keydown =
        Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |event: KeyboardEvent| {
            if typing_into_field(&event) {
                return;
            }
            let key = event.key();
            let chord = event.ctrl_key() || event.meta_key();
            match (key.as_str(), chord) {
                ("Delete", _) | ("Backspace", _) => {
                    event.prevent_default();
                    dispatch_global_message(Message::DeleteSelection);
                }
                ("z", true) | ("Z", true) => {
                    event.prevent_default();
                    dispatch_global_message(Message::Undo);
                }
                ("y", true) | ("Y", true) => {
                    event.prevent_default();
                    dispatch_global_message(Message::Redo);
                }
                _ => {}
            }
        }));
    document.add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref())?;
    on_keydown.forget();
    Ok(())
}

fn typing_into_field(event: &KeyboardEvent) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .map(|el| {
            let tag = el.tag_name().to_lowercase();
            tag == "input" || tag == "select" || tag == "textarea"
        })
        .unwrap_or(false)
}

/// Any mousedown that reaches the document dismisses an open context menu
/// (menu items stop propagation before acting).
fn setup_menu_dismiss(document: &Document) -> Result<(), JsValue> {
    let doc = document.clone();
    let on_mousedown =
        Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_event: MouseEvent| {
            components::context_menu::hide(&doc);
        }));
    document
        .add_event_listener_with_callback("mousedown", on_mousedown.as_ref().unchecked_ref())?;
    on_mousedown.forget();
    Ok(())
}
