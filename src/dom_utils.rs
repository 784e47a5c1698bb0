//! Thin helper layer for repetitive DOM operations so the components don't
//! sprinkle `window().document()` chains and manual casts everywhere.

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn get_element(id: &str) -> Result<Element, JsValue> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("#{} not found", id)))
}

/// Create an element, set its class, and append it to `parent`.
pub fn create_in(
    document: &Document,
    parent: &Element,
    tag: &str,
    class: &str,
) -> Result<Element, JsValue> {
    let el = document.create_element(tag)?;
    if !class.is_empty() {
        el.set_class_name(class);
    }
    parent.append_child(&el)?;
    Ok(el)
}

/// Create an SVG-namespaced element (plain `create_element` would yield an
/// HTMLUnknownElement that never renders).
pub fn create_svg_in(
    document: &Document,
    parent: &Element,
    tag: &str,
) -> Result<Element, JsValue> {
    let el = document.create_element_ns(Some(SVG_NS), tag)?;
    parent.append_child(&el)?;
    Ok(el)
}

pub fn set_style(el: &Element, css: &str) {
    let _ = el.set_attribute("style", css);
}

pub fn add_class(el: &Element, class: &str) {
    let _ = el.class_list().add_1(class);
}

pub fn remove_class(el: &Element, class: &str) {
    let _ = el.class_list().remove_1(class);
}

pub fn set_class(el: &Element, class: &str, on: bool) {
    if on {
        add_class(el, class);
    } else {
        remove_class(el, class);
    }
}

pub fn remove_element(el: &Element) {
    if let Some(parent) = el.parent_node() {
        let _ = parent.remove_child(el);
    }
}

/// Remove every child of a container (full rebuild path).
pub fn clear_children(el: &Element) {
    while let Some(child) = el.first_child() {
        let _ = el.remove_child(&child);
    }
}

/// Top-left corner of an element in client coordinates.
pub fn client_origin(el: &Element) -> (f64, f64) {
    let rect = el.get_bounding_client_rect();
    (rect.left(), rect.top())
}

pub fn as_element(target: Option<web_sys::EventTarget>) -> Option<Element> {
    target.and_then(|t| t.dyn_into::<Element>().ok())
}
