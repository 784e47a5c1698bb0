//! Node library sidebar: catalog definitions grouped by category with
//! collapsible headers; items are HTML5 drag sources carrying the node type
//! title as plain text.

use std::collections::BTreeMap;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, DragEvent, Element, MouseEvent};

use crate::dom_utils;
use crate::state::EditorState;

/// Rebuild the `#library` container from the loaded catalog.
pub fn render(document: &Document, state: &EditorState) -> Result<(), JsValue> {
    let container = dom_utils::get_element("library")?;
    dom_utils::clear_children(&container);

    let mut by_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for def in state.definitions.values() {
        by_category.entry(def.category.as_str()).or_default().push(def.title.as_str());
    }

    for (category, titles) in by_category {
        let section = dom_utils::create_in(document, &container, "div", "library-section")?;
        let header = dom_utils::create_in(document, &section, "div", "library-header")?;
        header.set_text_content(Some(category));
        let items = dom_utils::create_in(document, &section, "div", "library-items")?;
        attach_collapse_toggle(&header, &items)?;

        for title in titles {
            let item = dom_utils::create_in(document, &items, "div", "library-item")?;
            item.set_text_content(Some(title));
            let _ = item.set_attribute("draggable", "true");
            attach_drag_source(&item, title)?;
        }
    }
    Ok(())
}

fn attach_collapse_toggle(header: &Element, items: &Element) -> Result<(), JsValue> {
    let items = items.clone();
    let on_click = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_event: MouseEvent| {
        if items.class_list().contains("collapsed") {
            dom_utils::remove_class(&items, "collapsed");
        } else {
            dom_utils::add_class(&items, "collapsed");
        }
    }));
    header.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

fn attach_drag_source(item: &Element, type_name: &str) -> Result<(), JsValue> {
    let type_name = type_name.to_string();
    let on_dragstart = Closure::<dyn FnMut(DragEvent)>::wrap(Box::new(move |event: DragEvent| {
        if let Some(dt) = event.data_transfer() {
            let _ = dt.set_data("text/plain", &type_name);
        }
    }));
    item.add_event_listener_with_callback("dragstart", on_dragstart.as_ref().unchecked_ref())?;
    on_dragstart.forget();
    Ok(())
}
