//! Right-click menus: "Delete Node" on nodes, "Delete Wire" on wired
//! anchors. A single `#context-menu` element is reused and repositioned;
//! any other mousedown dismisses it (installed in lib.rs).

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, MouseEvent};

use crate::dom_utils;
use crate::messages::Message;
use crate::state::dispatch_global_message;

const MENU_ID: &str = "context-menu";

fn ensure_menu(document: &Document) -> Result<Element, JsValue> {
    if let Some(el) = document.get_element_by_id(MENU_ID) {
        return Ok(el);
    }
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no document body"))?;
    let menu = dom_utils::create_in(document, &body, "div", "context-menu")?;
    menu.set_id(MENU_ID);
    Ok(menu)
}

fn open(document: &Document, page_x: f64, page_y: f64) -> Result<Element, JsValue> {
    let menu = ensure_menu(document)?;
    dom_utils::clear_children(&menu);
    dom_utils::set_style(
        &menu,
        &format!("position:absolute;left:{}px;top:{}px;display:block;", page_x, page_y),
    );
    Ok(menu)
}

fn add_item(
    document: &Document,
    menu: &Element,
    label: &str,
    msg: Message,
) -> Result<(), JsValue> {
    let item = dom_utils::create_in(document, menu, "div", "context-menu-item")?;
    item.set_text_content(Some(label));
    let mut pending = Some(msg);
    let on_click = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
        event.stop_propagation();
        if let Some(msg) = pending.take() {
            dispatch_global_message(msg);
        }
    }));
    item.add_event_listener_with_callback("mousedown", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

pub fn show_node_menu(
    document: &Document,
    node_id: &str,
    page_x: f64,
    page_y: f64,
) -> Result<(), JsValue> {
    let menu = open(document, page_x, page_y)?;
    add_item(
        document,
        &menu,
        "Delete Node",
        Message::DeleteNodeViaMenu { node_id: node_id.to_string() },
    )
}

pub fn show_wire_menu(
    document: &Document,
    wire_id: u64,
    page_x: f64,
    page_y: f64,
) -> Result<(), JsValue> {
    let menu = open(document, page_x, page_y)?;
    add_item(document, &menu, "Delete Wire", Message::DeleteWire { wire_id })
}

pub fn hide(document: &Document) {
    if let Some(menu) = document.get_element_by_id(MENU_ID) {
        dom_utils::set_style(&menu, "display:none;");
    }
}
