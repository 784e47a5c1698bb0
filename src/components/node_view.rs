//! Node DOM rendering: one absolutely positioned div per node inside the
//! `#workflow` container, carrying the title bar, anchor dots and parameter
//! fields. The div's `left`/`top` are logical coordinates; pan and zoom are
//! applied to the container, never to individual nodes.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlInputElement, HtmlSelectElement, MouseEvent};

use crate::constants::*;
use crate::dom_utils;
use crate::geometry;
use crate::messages::Message;
use crate::models::{Direction, NodeTypeDef, ParamKind, WorkflowNode};
use crate::state::{dispatch_global_message, EditorState};

fn node_dom_id(node_id: &str) -> String {
    format!("nodeview-{}", node_id)
}

fn workflow_container(document: &Document) -> Result<Element, JsValue> {
    document
        .get_element_by_id("workflow")
        .ok_or_else(|| JsValue::from_str("#workflow not found"))
}

/// Build the DOM for one node. Call once per node id; re-renders replace the
/// previous element.
pub fn render_node(document: &Document, state: &EditorState, node_id: &str) -> Result<(), JsValue> {
    let (node, def) = match (state.nodes.get(node_id), state.definition_of(node_id)) {
        (Some(node), Some(def)) => (node.clone(), def.clone()),
        _ => return Ok(()),
    };
    if let Some(old) = document.get_element_by_id(&node_dom_id(node_id)) {
        dom_utils::remove_element(&old);
    }

    let container = workflow_container(document)?;
    let el = dom_utils::create_in(document, &container, "div", "node")?;
    el.set_id(&node_dom_id(node_id));
    let _ = el.set_attribute("data-node-id", node_id);
    position_element(&el, &node, &def);

    let title = dom_utils::create_in(document, &el, "div", "node-title")?;
    title.set_text_content(Some(&def.title));

    render_anchors(document, &el, node_id, &def)?;
    render_fields(document, &el, &node, &def)?;
    attach_node_listeners(&el, node_id)?;

    dom_utils::set_class(&el, "selected", state.selection.contains(node_id));
    dom_utils::set_class(
        &el,
        "processing",
        state.processing_node.as_deref() == Some(node_id),
    );
    Ok(())
}

fn position_element(el: &Element, node: &WorkflowNode, def: &NodeTypeDef) {
    dom_utils::set_style(
        el,
        &format!(
            "position:absolute;left:{}px;top:{}px;width:{}px;height:{}px;",
            node.x,
            node.y,
            NODE_WIDTH,
            geometry::node_height(def)
        ),
    );
}

fn render_anchors(
    document: &Document,
    node_el: &Element,
    node_id: &str,
    def: &NodeTypeDef,
) -> Result<(), JsValue> {
    for (direction, ports) in [(Direction::Input, &def.inputs), (Direction::Output, &def.outputs)]
    {
        for (index, port) in ports.iter().enumerate() {
            let anchor = dom_utils::create_in(document, node_el, "div", "anchor")?;
            let _ = anchor.set_attribute("data-anchor", &port.name);
            let _ = anchor.set_attribute(
                "data-direction",
                match direction {
                    Direction::Input => "input",
                    Direction::Output => "output",
                },
            );
            let side = match direction {
                Direction::Input => format!("left:{}px;", -ANCHOR_SIZE / 2.0),
                Direction::Output => {
                    format!("left:{}px;", NODE_WIDTH - ANCHOR_SIZE / 2.0)
                }
            };
            dom_utils::set_style(
                &anchor,
                &format!(
                    "position:absolute;{}top:{}px;width:{}px;height:{}px;",
                    side,
                    geometry::anchor_row_top(index),
                    ANCHOR_SIZE,
                    ANCHOR_SIZE
                ),
            );
            attach_anchor_listeners(&anchor, node_id, &port.name, direction)?;

            // Port name next to the dot; pointer-events off so the label
            // never intercepts a wiring drag.
            let label = dom_utils::create_in(document, node_el, "span", "anchor-label")?;
            label.set_text_content(Some(&port.name));
            let label_side = match direction {
                Direction::Input => "left:12px;",
                Direction::Output => "right:12px;",
            };
            dom_utils::set_style(
                &label,
                &format!(
                    "position:absolute;{}top:{}px;font-size:10px;pointer-events:none;",
                    label_side,
                    geometry::anchor_row_top(index) + 1.0
                ),
            );
        }
    }
    Ok(())
}

fn render_fields(
    document: &Document,
    node_el: &Element,
    node: &WorkflowNode,
    def: &NodeTypeDef,
) -> Result<(), JsValue> {
    if def.parameters.is_empty() {
        return Ok(());
    }
    let max_anchors = def.inputs.len().max(def.outputs.len());
    let fields = dom_utils::create_in(document, node_el, "div", "node-fields")?;
    dom_utils::set_style(
        &fields,
        &format!(
            "position:absolute;left:4px;right:4px;top:{}px;",
            TITLE_HEIGHT + max_anchors as f64 * ANCHOR_SPACING
        ),
    );

    // The result type's fields are write-only from the execution side.
    let read_only = node.type_name == RESULT_NODE_TYPE;
    for param in &def.parameters {
        let row = dom_utils::create_in(document, &fields, "div", "field-row")?;
        dom_utils::set_style(&row, &format!("height:{}px;", FIELD_ROW_HEIGHT));
        let label = dom_utils::create_in(document, &row, "label", "")?;
        label.set_text_content(Some(&param.name));

        let value = node
            .params
            .get(&param.name)
            .cloned()
            .unwrap_or_else(|| param.default_as_string());
        let field: Element = match param.kind {
            ParamKind::Dropdown => {
                let select: HtmlSelectElement =
                    dom_utils::create_in(document, &row, "select", "")?.unchecked_into();
                for option in &param.options {
                    let opt = document.create_element("option")?;
                    opt.set_text_content(Some(option));
                    let _ = opt.set_attribute("value", option);
                    select.append_child(&opt)?;
                }
                select.set_value(&value);
                select.set_disabled(read_only);
                select.unchecked_into()
            }
            kind => {
                let input: HtmlInputElement =
                    dom_utils::create_in(document, &row, "input", "")?.unchecked_into();
                input.set_type(if kind == ParamKind::Int { "number" } else { "text" });
                input.set_value(&value);
                input.set_read_only(read_only);
                input.unchecked_into()
            }
        };
        let _ = field.set_attribute("data-param", &param.name);
        attach_field_listener(&field, &node.id, &param.name)?;
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Event listeners. Registered once per rendered element and leaked with
// `forget`; the closures die with the page, not with the element, which is
// acceptable for the handful of nodes an editor session creates.
// -----------------------------------------------------------------------

fn attach_node_listeners(el: &Element, node_id: &str) -> Result<(), JsValue> {
    let id = node_id.to_string();
    let on_mousedown = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
        if event.button() != 0 {
            return;
        }
        // Presses on anchors and form fields have their own handlers.
        if let Some(target) = dom_utils::as_element(event.target()) {
            let tag = target.tag_name().to_lowercase();
            if target.class_list().contains("anchor")
                || target.class_list().contains("anchor-label")
                || tag == "input"
                || tag == "select"
            {
                return;
            }
        }
        event.stop_propagation();
        dispatch_global_message(Message::NodePressed {
            node_id: id.clone(),
            shift: event.shift_key(),
            client_x: event.client_x() as f64,
            client_y: event.client_y() as f64,
        });
    }));
    el.add_event_listener_with_callback("mousedown", on_mousedown.as_ref().unchecked_ref())?;
    on_mousedown.forget();

    let id = node_id.to_string();
    let on_contextmenu =
        Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
            event.stop_propagation();
            dispatch_global_message(Message::NodeMenuRequested {
                node_id: id.clone(),
                page_x: event.page_x() as f64,
                page_y: event.page_y() as f64,
            });
        }));
    el.add_event_listener_with_callback("contextmenu", on_contextmenu.as_ref().unchecked_ref())?;
    on_contextmenu.forget();
    Ok(())
}

fn attach_anchor_listeners(
    el: &Element,
    node_id: &str,
    name: &str,
    direction: Direction,
) -> Result<(), JsValue> {
    let (id, anchor_name) = (node_id.to_string(), name.to_string());
    let on_mousedown = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
        if event.button() != 0 {
            return;
        }
        event.stop_propagation();
        event.prevent_default();
        dispatch_global_message(Message::AnchorPressed {
            node_id: id.clone(),
            name: anchor_name.clone(),
            direction,
        });
    }));
    el.add_event_listener_with_callback("mousedown", on_mousedown.as_ref().unchecked_ref())?;
    on_mousedown.forget();

    let (id, anchor_name) = (node_id.to_string(), name.to_string());
    let on_contextmenu =
        Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
            event.stop_propagation();
            dispatch_global_message(Message::AnchorMenuRequested {
                node_id: id.clone(),
                name: anchor_name.clone(),
                page_x: event.page_x() as f64,
                page_y: event.page_y() as f64,
            });
        }));
    el.add_event_listener_with_callback("contextmenu", on_contextmenu.as_ref().unchecked_ref())?;
    on_contextmenu.forget();
    Ok(())
}

fn attach_field_listener(el: &Element, node_id: &str, param: &str) -> Result<(), JsValue> {
    let (id, name) = (node_id.to_string(), param.to_string());
    let on_input = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |event: Event| {
        let value = match dom_utils::as_element(event.target()) {
            Some(el) => {
                if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
                    input.value()
                } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
                    select.value()
                } else {
                    return;
                }
            }
            None => return,
        };
        dispatch_global_message(Message::ParamChanged {
            node_id: id.clone(),
            name: name.clone(),
            value,
        });
    }));
    el.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())?;
    on_input.forget();
    Ok(())
}

// -----------------------------------------------------------------------
// Incremental refreshes.
// -----------------------------------------------------------------------

pub fn remove_node(document: &Document, node_id: &str) {
    if let Some(el) = document.get_element_by_id(&node_dom_id(node_id)) {
        dom_utils::remove_element(&el);
    }
}

pub fn refresh_positions(document: &Document, state: &EditorState, node_ids: &[String]) {
    for node_id in node_ids {
        if let (Some(node), Some(def), Some(el)) = (
            state.nodes.get(node_id),
            state.definition_of(node_id),
            document.get_element_by_id(&node_dom_id(node_id)),
        ) {
            position_element(&el, node, def);
        }
    }
}

/// Re-apply the `selected` class across every rendered node.
pub fn refresh_selection(document: &Document, state: &EditorState) {
    for node_id in state.nodes.keys() {
        if let Some(el) = document.get_element_by_id(&node_dom_id(node_id)) {
            dom_utils::set_class(&el, "selected", state.selection.contains(node_id));
        }
    }
}

/// Move the `processing` highlight to the node named in state (or nowhere).
pub fn refresh_processing(document: &Document, state: &EditorState) {
    for node_id in state.nodes.keys() {
        if let Some(el) = document.get_element_by_id(&node_dom_id(node_id)) {
            dom_utils::set_class(
                &el,
                "processing",
                state.processing_node.as_deref() == Some(node_id.as_str()),
            );
        }
    }
}

/// Push current parameter values into the rendered form fields (used when
/// execution results land in a node).
pub fn refresh_params(document: &Document, state: &EditorState, node_id: &str) {
    let node = match state.nodes.get(node_id) {
        Some(n) => n,
        None => return,
    };
    let el = match document.get_element_by_id(&node_dom_id(node_id)) {
        Some(el) => el,
        None => return,
    };
    for (name, value) in &node.params {
        let selector = format!("[data-param='{}']", name);
        if let Ok(Some(field)) = el.query_selector(&selector) {
            if let Some(input) = field.dyn_ref::<HtmlInputElement>() {
                input.set_value(value);
            } else if let Some(select) = field.dyn_ref::<HtmlSelectElement>() {
                select.set_value(value);
            }
        }
    }
}

/// Re-apply the anchor `selected` marker from state.
pub fn refresh_anchor_selection(document: &Document, state: &EditorState) {
    let selected = state.selected_anchor.as_ref();
    for node_id in state.nodes.keys() {
        let el = match document.get_element_by_id(&node_dom_id(node_id)) {
            Some(el) => el,
            None => continue,
        };
        let anchors = el.query_selector_all(".anchor").ok();
        let list = match anchors {
            Some(list) => list,
            None => continue,
        };
        for i in 0..list.length() {
            if let Some(anchor) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                let name = anchor.get_attribute("data-anchor").unwrap_or_default();
                let dir = anchor.get_attribute("data-direction").unwrap_or_default();
                let on = selected
                    .map(|a| {
                        a.node_id == *node_id
                            && a.name == name
                            && dir
                                == match a.direction {
                                    Direction::Input => "input",
                                    Direction::Output => "output",
                                }
                    })
                    .unwrap_or(false);
                dom_utils::set_class(&anchor, "selected", on);
            }
        }
    }
}
