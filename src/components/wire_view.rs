//! SVG overlay path management for wires.
//!
//! A single `<svg>` sits inside the `#workflow` container (so it pans and
//! zooms with the nodes) and carries one `<path>` per wire plus an optional
//! provisional path while a wiring gesture is active.

use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::constants::{WORKFLOW_HEIGHT, WORKFLOW_WIDTH};
use crate::dom_utils;
use crate::geometry;
use crate::state::EditorState;

const OVERLAY_ID: &str = "wire-overlay";
const PROVISIONAL_ID: &str = "wire-provisional";

fn wire_dom_id(wire_id: u64) -> String {
    format!("wire-{}", wire_id)
}

/// Get or create the overlay. It spans the whole logical workflow area and
/// never intercepts pointer events.
pub fn ensure_overlay(document: &Document) -> Result<Element, JsValue> {
    if let Some(el) = document.get_element_by_id(OVERLAY_ID) {
        return Ok(el);
    }
    let workflow = document
        .get_element_by_id("workflow")
        .ok_or_else(|| JsValue::from_str("#workflow not found"))?;
    let svg = dom_utils::create_svg_in(document, &workflow, "svg")?;
    svg.set_id(OVERLAY_ID);
    dom_utils::set_style(
        &svg,
        &format!(
            "position:absolute;left:0;top:0;width:{}px;height:{}px;overflow:visible;pointer-events:none;",
            WORKFLOW_WIDTH, WORKFLOW_HEIGHT
        ),
    );
    Ok(svg)
}

/// Create or update the path for one wire from its current endpoints.
pub fn redraw_wire(document: &Document, state: &EditorState, wire_id: u64) -> Result<(), JsValue> {
    let wire = match state.wire(wire_id) {
        Some(w) => w,
        None => return Ok(()),
    };
    let (x1, y1, x2, y2) = match state.wire_endpoints(wire) {
        Some(ends) => ends,
        None => return Ok(()),
    };
    let overlay = ensure_overlay(document)?;
    let dom_id = wire_dom_id(wire_id);
    let path = match document.get_element_by_id(&dom_id) {
        Some(el) => el,
        None => {
            let el = dom_utils::create_svg_in(document, &overlay, "path")?;
            el.set_id(&dom_id);
            el.set_class_name("wire");
            el
        }
    };
    path.set_attribute("d", &geometry::wire_path(x1, y1, x2, y2))?;
    Ok(())
}

pub fn remove_wire(document: &Document, wire_id: u64) {
    if let Some(el) = document.get_element_by_id(&wire_dom_id(wire_id)) {
        dom_utils::remove_element(&el);
    }
}

/// Draw, move or clear the provisional wire that follows the pointer during
/// a wiring gesture.
pub fn redraw_provisional(
    document: &Document,
    ends: Option<(f64, f64, f64, f64)>,
) -> Result<(), JsValue> {
    match ends {
        Some((x1, y1, x2, y2)) => {
            let overlay = ensure_overlay(document)?;
            let path = match document.get_element_by_id(PROVISIONAL_ID) {
                Some(el) => el,
                None => {
                    let el = dom_utils::create_svg_in(document, &overlay, "path")?;
                    el.set_id(PROVISIONAL_ID);
                    el.set_class_name("wire wire-provisional");
                    el
                }
            };
            path.set_attribute("d", &geometry::wire_path(x1, y1, x2, y2))?;
        }
        None => {
            if let Some(el) = document.get_element_by_id(PROVISIONAL_ID) {
                dom_utils::remove_element(&el);
            }
        }
    }
    Ok(())
}

/// Redraw every wire (full rebuild path).
pub fn redraw_all(document: &Document, state: &EditorState) -> Result<(), JsValue> {
    ensure_overlay(document)?;
    for wire in &state.wires {
        redraw_wire(document, state, wire.id)?;
    }
    Ok(())
}
