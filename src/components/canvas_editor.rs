//! Canvas wiring: pointer/wheel/drop listeners, the pan/zoom transform on the
//! `#workflow` container, the lasso marquee, and full view rebuilds.
//!
//! Move and release listeners live on the document for the whole session and
//! route everything through the gesture machine, so a release outside the
//! canvas (or outside the window) still ends the active gesture.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, DragEvent, Element, Event, MouseEvent, WheelEvent};

use crate::dom_utils;
use crate::messages::Message;
use crate::state::{dispatch_global_message, EditorState, STATE};

const LASSO_ID: &str = "lasso";

/// Install all canvas and document level listeners. Called once at startup.
pub fn init(document: &Document) -> Result<(), JsValue> {
    let canvas = dom_utils::get_element("canvas")?;
    refresh_canvas_origin(&canvas);

    // Background press: pan (plain) or lasso (shift). Node and anchor
    // handlers stop propagation, so reaching here means background.
    let on_mousedown = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
        if event.button() != 0 {
            return;
        }
        event.prevent_default();
        dispatch_global_message(Message::BackgroundPressed {
            client_x: event.client_x() as f64,
            client_y: event.client_y() as f64,
            shift: event.shift_key(),
        });
    }));
    canvas.add_event_listener_with_callback("mousedown", on_mousedown.as_ref().unchecked_ref())?;
    on_mousedown.forget();

    // Document-level move/up: active for the whole session, interpreted
    // against the current gesture (no-ops when Idle). A mouseup anywhere is
    // a release, never a cancel.
    let on_mousemove = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
        dispatch_global_message(Message::PointerMoved {
            client_x: event.client_x() as f64,
            client_y: event.client_y() as f64,
        });
    }));
    document
        .add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref())?;
    on_mousemove.forget();

    let on_mouseup = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
        dispatch_global_message(Message::PointerReleased {
            client_x: event.client_x() as f64,
            client_y: event.client_y() as f64,
        });
    }));
    document.add_event_listener_with_callback("mouseup", on_mouseup.as_ref().unchecked_ref())?;
    on_mouseup.forget();

    // Wheel zoom about the cursor.
    let on_wheel = Closure::<dyn FnMut(WheelEvent)>::wrap(Box::new(move |event: WheelEvent| {
        event.prevent_default();
        dispatch_global_message(Message::WheelZoomed {
            client_x: event.client_x() as f64,
            client_y: event.client_y() as f64,
            delta_y: event.delta_y(),
        });
    }));
    canvas.add_event_listener_with_callback("wheel", on_wheel.as_ref().unchecked_ref())?;
    on_wheel.forget();

    // HTML5 drop from the node library.
    let on_dragover = Closure::<dyn FnMut(DragEvent)>::wrap(Box::new(move |event: DragEvent| {
        event.prevent_default();
    }));
    canvas.add_event_listener_with_callback("dragover", on_dragover.as_ref().unchecked_ref())?;
    on_dragover.forget();

    let on_drop = Closure::<dyn FnMut(DragEvent)>::wrap(Box::new(move |event: DragEvent| {
        event.prevent_default();
        let type_name = event
            .data_transfer()
            .and_then(|dt| dt.get_data("text/plain").ok())
            .unwrap_or_default();
        if type_name.is_empty() {
            return;
        }
        dispatch_global_message(Message::DropNode {
            type_name,
            client_x: event.client_x() as f64,
            client_y: event.client_y() as f64,
        });
    }));
    canvas.add_event_listener_with_callback("drop", on_drop.as_ref().unchecked_ref())?;
    on_drop.forget();

    // Keep the cached canvas origin honest across layout changes.
    let on_resize = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_event: Event| {
        if let Ok(canvas) = dom_utils::get_element("canvas") {
            refresh_canvas_origin(&canvas);
        }
    }));
    if let Some(window) = web_sys::window() {
        window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("scroll", on_resize.as_ref().unchecked_ref())?;
    }
    on_resize.forget();

    Ok(())
}

fn refresh_canvas_origin(canvas: &Element) {
    let origin = dom_utils::client_origin(canvas);
    STATE.with(|state| state.borrow_mut().canvas_origin = origin);
}

/// Apply the current pan/zoom to the workflow container.
pub fn apply_view_transform(document: &Document, state: &EditorState) {
    if let Some(workflow) = document.get_element_by_id("workflow") {
        dom_utils::set_style(
            &workflow,
            &format!(
                "position:absolute;left:0;top:0;transform:translate({}px, {}px) scale({});transform-origin:0 0;",
                state.view.pan_x, state.view.pan_y, state.view.zoom
            ),
        );
    }
}

/// Show, move or hide the lasso marquee (canvas-relative screen rect).
pub fn update_lasso(document: &Document, rect: Option<(f64, f64, f64, f64)>) -> Result<(), JsValue> {
    match rect {
        Some((x, y, w, h)) => {
            let canvas = dom_utils::get_element("canvas")?;
            let marquee = match document.get_element_by_id(LASSO_ID) {
                Some(el) => el,
                None => {
                    let el = dom_utils::create_in(document, &canvas, "div", "lasso")?;
                    el.set_id(LASSO_ID);
                    el
                }
            };
            dom_utils::set_style(
                &marquee,
                &format!(
                    "position:absolute;left:{}px;top:{}px;width:{}px;height:{}px;pointer-events:none;",
                    x, y, w, h
                ),
            );
        }
        None => {
            if let Some(el) = document.get_element_by_id(LASSO_ID) {
                dom_utils::remove_element(&el);
            }
        }
    }
    Ok(())
}

/// Tear down and re-render everything below `#workflow` from state (used by
/// undo/redo and workflow loads).
pub fn rebuild(document: &Document, state: &EditorState) -> Result<(), JsValue> {
    let workflow = dom_utils::get_element("workflow")?;
    dom_utils::clear_children(&workflow);
    super::wire_view::ensure_overlay(document)?;
    for node_id in state.nodes.keys() {
        super::node_view::render_node(document, state, node_id)?;
    }
    super::wire_view::redraw_all(document, state)?;
    apply_view_transform(document, state);
    Ok(())
}
