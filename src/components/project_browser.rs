//! Project/workflow browser: a sidebar tree of projects and their workflows
//! plus the toolbar of persistence actions. Name entry and deletion guards
//! use native prompt/confirm dialogs; everything else routes through the
//! dispatch loop.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, MouseEvent, Window};

use crate::dom_utils;
use crate::messages::Message;
use crate::state::{dispatch_global_message, EditorState, STATE};

/// Rebuild the `#project-browser` contents from state.
pub fn render(document: &Document, state: &EditorState) -> Result<(), JsValue> {
    let container = dom_utils::get_element("project-browser")?;
    dom_utils::clear_children(&container);

    render_toolbar(document, &container)?;

    let tree = dom_utils::create_in(document, &container, "div", "project-tree")?;
    for project in &state.projects {
        let row = dom_utils::create_in(document, &tree, "div", "project-row")?;
        row.set_text_content(Some(&project.name));
        let is_current = state.current_project.as_deref() == Some(project.name.as_str());
        if is_current && state.current_workflow.is_none() {
            dom_utils::add_class(&row, "active");
        }
        attach_dispatch_on_click(&row, Message::ProjectSelected(project.name.clone()))?;

        for workflow in &project.workflows {
            let leaf = dom_utils::create_in(document, &tree, "div", "workflow-row")?;
            leaf.set_text_content(Some(workflow.trim_end_matches(".json")));
            if is_current && state.current_workflow.as_deref() == Some(workflow.as_str()) {
                dom_utils::add_class(&leaf, "active");
            }
            attach_dispatch_on_click(
                &leaf,
                Message::WorkflowSelected {
                    project: project.name.clone(),
                    workflow: workflow.clone(),
                },
            )?;
        }
    }
    Ok(())
}

fn render_toolbar(document: &Document, container: &Element) -> Result<(), JsValue> {
    let toolbar = dom_utils::create_in(document, container, "div", "project-toolbar")?;

    add_button(document, &toolbar, "New Project", || {
        if let Some(name) = prompt("Enter project name:") {
            dispatch_global_message(Message::CreateProject(name));
        }
    })?;
    add_button(document, &toolbar, "New Workflow", || {
        if let Some(name) = prompt("Enter workflow name:") {
            dispatch_global_message(Message::CreateWorkflow(name));
        }
    })?;
    add_button(document, &toolbar, "Save", || {
        let has_name = STATE.with(|state| state.borrow().current_workflow.is_some());
        if has_name {
            dispatch_global_message(Message::SaveWorkflow);
        } else if let Some(name) = prompt("Enter workflow name:") {
            dispatch_global_message(Message::SaveWorkflowAs { name });
        }
    })?;
    add_button(document, &toolbar, "Duplicate", || {
        dispatch_global_message(Message::DuplicateItem);
    })?;
    add_button(document, &toolbar, "Rename", || {
        if let Some(name) = prompt("Enter new name:") {
            dispatch_global_message(Message::RenameItem { new_name: name });
        }
    })?;
    add_button(document, &toolbar, "Delete", || {
        let (project, workflow) = STATE.with(|state| {
            let state = state.borrow();
            (state.current_project.clone(), state.current_workflow.clone())
        });
        let target = match (&project, &workflow) {
            (Some(_), Some(w)) => format!("workflow \"{}\"", w.trim_end_matches(".json")),
            (Some(p), None) => format!("project \"{}\" and ALL its workflows", p),
            _ => return,
        };
        if !confirm(&format!("Delete {}? This cannot be undone.", target)) {
            return;
        }
        // Deleting a whole project takes a typed confirmation on top.
        if workflow.is_none() && prompt("Type DELETE to confirm:").as_deref() != Some("DELETE") {
            return;
        }
        dispatch_global_message(Message::DeleteItem);
    })?;
    add_button(document, &toolbar, "Run", || {
        dispatch_global_message(Message::StartExecution);
    })?;
    Ok(())
}

fn add_button(
    document: &Document,
    toolbar: &Element,
    label: &str,
    action: impl Fn() + 'static,
) -> Result<(), JsValue> {
    let button = dom_utils::create_in(document, toolbar, "button", "toolbar-button")?;
    button.set_text_content(Some(label));
    let on_click = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_event: MouseEvent| {
        action();
    }));
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

fn attach_dispatch_on_click(el: &Element, msg: Message) -> Result<(), JsValue> {
    let on_click = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
        event.stop_propagation();
        dispatch_global_message(msg.clone());
    }));
    el.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

fn window() -> Option<Window> {
    web_sys::window()
}

fn prompt(message: &str) -> Option<String> {
    let raw = window()?.prompt_with_message(message).ok()??;
    let trimmed = raw.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn confirm(message: &str) -> bool {
    window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}
