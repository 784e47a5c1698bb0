//! Tiny toast / notification helper.
//! Creates a `#toast-root` container once per page and appends toast divs that
//! fade out after a few seconds.

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Document, Element, HtmlElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

pub fn show(message: &str, kind: ToastKind) {
    let window = match web_sys::window() {
        Some(w) => w,
        None => return,
    };
    let document = match window.document() {
        Some(d) => d,
        None => return,
    };

    let root = ensure_root(&document);

    let toast = match document.create_element("div") {
        Ok(el) => el,
        Err(_) => return,
    };
    toast.set_class_name("toast");
    let _ = match kind {
        ToastKind::Success => toast.class_list().add_1("toast-success"),
        ToastKind::Error => toast.class_list().add_1("toast-error"),
        ToastKind::Info => toast.class_list().add_1("toast-info"),
    };
    toast.set_text_content(Some(message));

    // Prepend so newest appears on top.
    let _ = root.prepend_with_node_1(&toast);

    // Auto-remove after 4s.
    let toast_clone: HtmlElement = toast.unchecked_into();
    let cb = Closure::once_into_js(move || {
        let _ = toast_clone.parent_node().map(|p| p.remove_child(&toast_clone));
    });
    let _ = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 4000);
}

fn ensure_root(document: &Document) -> Element {
    if let Some(el) = document.get_element_by_id("toast-root") {
        return el;
    }
    let root = document.create_element("div").unwrap();
    root.set_id("toast-root");
    root.set_class_name("toast-root");
    if let Some(body) = document.body() {
        let _ = body.append_child(&root);
    }
    root
}
