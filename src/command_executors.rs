//! Executes the side-effect commands queued by the reducer. This is the only
//! place that walks the DOM or talks to the network on behalf of the
//! reducer, which keeps `update()` itself free of browser types.
//!
//! Executors run after the mutable state borrow is released; they re-borrow
//! immutably to read what they need and dispatch follow-up messages from
//! async completions.

use wasm_bindgen_futures::spawn_local;

use crate::components::{canvas_editor, context_menu, library, node_view, project_browser, wire_view};
use crate::console_error;
use crate::dom_utils;
use crate::messages::{Command, Message};
use crate::models::{ExecutionPayload, GraphSnapshot};
use crate::network::ApiClient;
use crate::state::{dispatch_global_message, STATE};
use crate::{storage, toast};

pub fn execute(commands: Vec<Command>) {
    let document = match dom_utils::document() {
        Ok(d) => d,
        Err(_) => return,
    };
    for command in commands {
        let result = run_one(&document, command);
        if let Err(err) = result {
            console_error!("command failed: {:?}", err);
        }
    }
}

fn run_one(document: &web_sys::Document, command: Command) -> Result<(), wasm_bindgen::JsValue> {
    match command {
        // ---------------- view ----------------
        Command::RenderNode(node_id) => STATE.with(|state| {
            node_view::render_node(document, &state.borrow(), &node_id)
        }),
        Command::RemoveNodeView(node_id) => {
            node_view::remove_node(document, &node_id);
            Ok(())
        }
        Command::RefreshNodePositions(node_ids) => {
            STATE.with(|state| {
                node_view::refresh_positions(document, &state.borrow(), &node_ids)
            });
            Ok(())
        }
        Command::RedrawWires(wire_ids) => STATE.with(|state| {
            let state = state.borrow();
            for id in wire_ids {
                wire_view::redraw_wire(document, &state, id)?;
            }
            Ok(())
        }),
        Command::RemoveWireView(wire_id) => {
            wire_view::remove_wire(document, wire_id);
            Ok(())
        }
        Command::RedrawProvisionalWire(ends) => wire_view::redraw_provisional(document, ends),
        Command::UpdateLassoRect(rect) => canvas_editor::update_lasso(document, rect),
        Command::ApplyViewTransform => {
            STATE.with(|state| canvas_editor::apply_view_transform(document, &state.borrow()));
            Ok(())
        }
        Command::RefreshSelectionClasses => {
            STATE.with(|state| node_view::refresh_selection(document, &state.borrow()));
            Ok(())
        }
        Command::RefreshAnchorSelection => {
            STATE.with(|state| node_view::refresh_anchor_selection(document, &state.borrow()));
            Ok(())
        }
        Command::RefreshProcessingHighlight => {
            STATE.with(|state| node_view::refresh_processing(document, &state.borrow()));
            Ok(())
        }
        Command::RefreshParams(node_id) => {
            STATE.with(|state| node_view::refresh_params(document, &state.borrow(), &node_id));
            Ok(())
        }
        Command::RebuildView => {
            STATE.with(|state| canvas_editor::rebuild(document, &state.borrow()))
        }
        Command::RenderLibrary => {
            STATE.with(|state| library::render(document, &state.borrow()))
        }
        Command::RefreshProjectTree => {
            STATE.with(|state| project_browser::render(document, &state.borrow()))
        }
        Command::UpdateDocumentTitle => {
            STATE.with(|state| {
                let state = state.borrow();
                let name = state
                    .current_workflow
                    .as_deref()
                    .unwrap_or("untitled")
                    .trim_end_matches(".json")
                    .to_string();
                let marker = if state.is_dirty() { "*" } else { "" };
                document.set_title(&format!("{}{} - NodeFlow", name, marker));
            });
            Ok(())
        }
        Command::ShowNodeContextMenu { node_id, page_x, page_y } => {
            context_menu::show_node_menu(document, &node_id, page_x, page_y)
        }
        Command::ShowWireContextMenu { wire_id, page_x, page_y } => {
            context_menu::show_wire_menu(document, wire_id, page_x, page_y)
        }
        Command::HideContextMenu => {
            context_menu::hide(document);
            Ok(())
        }

        // ---------------- network ----------------
        Command::SubmitWorkflow(payload) => {
            submit_workflow(payload);
            Ok(())
        }
        Command::OpenProgressStream(token) => {
            #[cfg(target_arch = "wasm32")]
            crate::network::event_stream::open_progress_stream(&token)?;
            #[cfg(not(target_arch = "wasm32"))]
            let _ = token;
            Ok(())
        }
        Command::FetchProjects => {
            fetch_projects();
            Ok(())
        }
        Command::CreateProjectRequest(name) => {
            spawn_local(async move {
                match ApiClient::create_project(&name).await {
                    Ok(()) => dispatch_global_message(Message::ProjectCreated(name)),
                    Err(err) => dispatch_persistence_error(err),
                }
            });
            Ok(())
        }
        Command::CreateWorkflowRequest { project, name } => {
            spawn_local(async move {
                match ApiClient::create_workflow(&project, &name).await {
                    Ok(()) => dispatch_global_message(Message::WorkflowCreated {
                        project,
                        workflow: name,
                    }),
                    Err(err) => dispatch_persistence_error(err),
                }
            });
            Ok(())
        }
        Command::SaveWorkflowRequest { project, workflow, data } => {
            save_workflow(project, workflow, data);
            Ok(())
        }
        Command::LoadWorkflowRequest { project, workflow } => {
            spawn_local(async move {
                match ApiClient::load_workflow(&project, &workflow).await {
                    Ok(data) => dispatch_global_message(Message::WorkflowLoaded {
                        project,
                        workflow,
                        data,
                    }),
                    Err(err) => dispatch_persistence_error(err),
                }
            });
            Ok(())
        }
        Command::DuplicateProjectRequest { source, target } => {
            spawn_local(async move {
                match ApiClient::duplicate_project(&source, &target).await {
                    Ok(()) => refetch_projects().await,
                    Err(err) => dispatch_persistence_error(err),
                }
            });
            Ok(())
        }
        Command::DuplicateWorkflowRequest { project, source, target } => {
            spawn_local(async move {
                match ApiClient::duplicate_workflow(&project, &source, &target).await {
                    Ok(()) => refetch_projects().await,
                    Err(err) => dispatch_persistence_error(err),
                }
            });
            Ok(())
        }
        Command::DeleteProjectRequest { project } => {
            spawn_local(async move {
                match ApiClient::delete_project(&project).await {
                    Ok(()) => {
                        // A remembered last-workflow inside this project is now stale.
                        if storage::last_workflow().map(|(p, _)| p == project).unwrap_or(false) {
                            storage::forget_last_workflow();
                        }
                        refetch_projects().await;
                    }
                    Err(err) => dispatch_persistence_error(err),
                }
            });
            Ok(())
        }
        Command::DeleteWorkflowRequest { project, workflow } => {
            spawn_local(async move {
                match ApiClient::delete_workflow(&project, &workflow).await {
                    Ok(()) => {
                        if storage::last_workflow() == Some((project.clone(), workflow.clone())) {
                            storage::forget_last_workflow();
                        }
                        refetch_projects().await;
                    }
                    Err(err) => dispatch_persistence_error(err),
                }
            });
            Ok(())
        }
        Command::RenameProjectRequest { old_name, new_name } => {
            spawn_local(async move {
                match ApiClient::rename_project(&old_name, &new_name).await {
                    Ok(()) => refetch_projects().await,
                    Err(err) => dispatch_persistence_error(err),
                }
            });
            Ok(())
        }
        Command::RenameWorkflowRequest { project, old_name, new_name } => {
            spawn_local(async move {
                match ApiClient::rename_workflow(&project, &old_name, &new_name).await {
                    Ok(()) => refetch_projects().await,
                    Err(err) => dispatch_persistence_error(err),
                }
            });
            Ok(())
        }
        Command::RememberLastWorkflow { project, workflow } => {
            let _ = storage::remember_last_workflow(&project, &workflow);
            Ok(())
        }

        // ---------------- notifications ----------------
        Command::Toast { kind, text } => {
            toast::show(&text, kind);
            Ok(())
        }
    }
}

fn submit_workflow(payload: ExecutionPayload) {
    spawn_local(async move {
        match ApiClient::execute_workflow(&payload).await {
            Ok(resp) => {
                if let Some(token) = resp.token {
                    dispatch_global_message(Message::ExecutionStarted { token });
                } else if let Some(results) = resp.results {
                    // Legacy non-streaming backend: results arrive inline.
                    dispatch_global_message(Message::ExecutionResults { results });
                } else {
                    dispatch_global_message(Message::ExecutionFailed(
                        "response carried neither token nor results".to_string(),
                    ));
                }
            }
            Err(err) => {
                dispatch_global_message(Message::ExecutionFailed(js_error_text(err)));
            }
        }
    });
}

fn save_workflow(project: String, workflow: String, data: GraphSnapshot) {
    spawn_local(async move {
        match ApiClient::save_workflow(&project, &workflow, &data).await {
            Ok(()) => {
                dispatch_global_message(Message::WorkflowSaved { project, workflow });
            }
            Err(err) => dispatch_persistence_error(err),
        }
    });
}

fn fetch_projects() {
    spawn_local(async move {
        refetch_projects().await;
    });
}

async fn refetch_projects() {
    match ApiClient::fetch_projects().await {
        Ok(projects) => dispatch_global_message(Message::ProjectsLoaded(projects)),
        Err(err) => dispatch_persistence_error(err),
    }
}

fn dispatch_persistence_error(err: wasm_bindgen::JsValue) {
    dispatch_global_message(Message::PersistenceFailed(js_error_text(err)));
}

fn js_error_text(err: wasm_bindgen::JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}
