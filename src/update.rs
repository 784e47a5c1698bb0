//! The reducer: every message lands here, mutates `EditorState`, and returns
//! the side-effect commands to run afterwards.
//!
//! No DOM access. Client coordinates arriving in messages are converted to
//! canvas-relative screen space (via the cached canvas origin) and then to
//! logical space before they touch the graph.

use std::collections::HashSet;

use crate::constants::*;
use crate::geometry::{self, Rect};
use crate::messages::{Command, Message};
use crate::models::AnchorRef;
use crate::state::{EditorState, Gesture};
use crate::{console_error, console_warn};

/// Canvas-relative screen coordinates for a client-space point.
fn canvas_point(state: &EditorState, client_x: f64, client_y: f64) -> (f64, f64) {
    (client_x - state.canvas_origin.0, client_y - state.canvas_origin.1)
}

fn logical_point(state: &EditorState, client_x: f64, client_y: f64) -> (f64, f64) {
    let (sx, sy) = canvas_point(state, client_x, client_y);
    geometry::to_logical(&state.view, sx, sy)
}

/// Workflows are stored as `<name>.json`; user-entered names come in bare.
fn workflow_file_name(name: &str) -> String {
    if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    }
}

pub fn update(state: &mut EditorState, msg: Message) -> Vec<Command> {
    match msg {
        // -- catalog --------------------------------------------------------
        Message::CatalogLoaded(defs) => {
            state.load_catalog(defs);
            vec![Command::RenderLibrary]
        }
        Message::CatalogFailed(msg) => {
            console_error!("failed to load node catalog: {}", msg);
            vec![Command::toast_error("Could not load the node library")]
        }

        // -- node creation --------------------------------------------------
        Message::DropNode { type_name, client_x, client_y } => {
            let (lx, ly) = logical_point(state, client_x, client_y);
            match state.create_node(&type_name, lx - NODE_WIDTH / 2.0, ly - TITLE_HEIGHT / 2.0) {
                Ok(id) => vec![Command::RenderNode(id), Command::UpdateDocumentTitle],
                Err(err) => {
                    console_error!("{}", err);
                    vec![Command::toast_error(format!("Cannot create node: {}", err))]
                }
            }
        }

        // -- pointer input --------------------------------------------------
        Message::NodePressed { node_id, shift, client_x, client_y } => {
            if !state.nodes.contains_key(&node_id) {
                return vec![];
            }
            state.select_on_press(&node_id, shift);
            state.selected_anchor = None;
            let cmds = vec![
                Command::HideContextMenu,
                Command::RefreshSelectionClasses,
                Command::RefreshAnchorSelection,
            ];
            if shift {
                return cmds;
            }
            if state.selection.len() > 1 && state.selection.contains(&node_id) {
                let (lx, ly) = logical_point(state, client_x, client_y);
                let mut origins: Vec<(String, f64, f64)> = state
                    .selection
                    .iter()
                    .filter_map(|id| state.nodes.get(id).map(|n| (id.clone(), n.x, n.y)))
                    .collect();
                origins.sort_by(|a, b| a.0.cmp(&b.0));
                state.gesture = Gesture::DragSelection { start_lx: lx, start_ly: ly, origins };
            } else if let Some(node) = state.nodes.get(&node_id) {
                let (sx, sy) = canvas_point(state, client_x, client_y);
                let (nx, ny) = geometry::to_screen(&state.view, node.x, node.y);
                state.gesture =
                    Gesture::DragNode { node_id, offset_x: sx - nx, offset_y: sy - ny };
            }
            cmds
        }

        Message::AnchorPressed { node_id, name, direction } => {
            let anchor = AnchorRef { node_id, direction, name };
            let mut cmds = vec![Command::HideContextMenu, Command::RefreshAnchorSelection];
            if let Some((ax, ay)) = state.anchor_position(&anchor) {
                state.selected_anchor = Some(anchor.clone());
                state.gesture = Gesture::Wiring { from: anchor, pointer_lx: ax, pointer_ly: ay };
                cmds.push(Command::RedrawProvisionalWire(Some((ax, ay, ax, ay))));
            }
            cmds
        }

        Message::BackgroundPressed { client_x, client_y, shift } => {
            state.selected_anchor = None;
            if shift {
                let (lx, ly) = logical_point(state, client_x, client_y);
                state.gesture =
                    Gesture::Lasso { start_lx: lx, start_ly: ly, cur_lx: lx, cur_ly: ly };
                let (sx, sy) = canvas_point(state, client_x, client_y);
                vec![
                    Command::HideContextMenu,
                    Command::RefreshAnchorSelection,
                    Command::UpdateLassoRect(Some((sx, sy, 0.0, 0.0))),
                ]
            } else {
                state.clear_selection();
                state.gesture = Gesture::Pan { last_x: client_x, last_y: client_y };
                vec![
                    Command::HideContextMenu,
                    Command::RefreshSelectionClasses,
                    Command::RefreshAnchorSelection,
                ]
            }
        }

        Message::PointerMoved { client_x, client_y } => match state.gesture.clone() {
            Gesture::Idle => vec![],
            Gesture::DragNode { node_id, offset_x, offset_y } => {
                let (sx, sy) = canvas_point(state, client_x, client_y);
                let (lx, ly) =
                    geometry::to_logical(&state.view, sx - offset_x, sy - offset_y);
                state.move_node(&node_id, lx, ly);
                let dirty = state.refresh_wires_for(&node_id);
                vec![
                    Command::RefreshNodePositions(vec![node_id]),
                    Command::RedrawWires(dirty),
                ]
            }
            Gesture::DragSelection { start_lx, start_ly, origins } => {
                let (lx, ly) = logical_point(state, client_x, client_y);
                let (dx, dy) =
                    state.clamp_group_delta(&origins, lx - start_lx, ly - start_ly);
                let moved = state.apply_group_delta(&origins, dx, dy);
                let mut dirty = Vec::new();
                for id in &moved {
                    dirty.extend(state.refresh_wires_for(id));
                }
                dirty.sort_unstable();
                dirty.dedup();
                vec![Command::RefreshNodePositions(moved), Command::RedrawWires(dirty)]
            }
            Gesture::Pan { last_x, last_y } => {
                state.view.pan_x += client_x - last_x;
                state.view.pan_y += client_y - last_y;
                state.gesture = Gesture::Pan { last_x: client_x, last_y: client_y };
                vec![Command::ApplyViewTransform]
            }
            Gesture::Lasso { start_lx, start_ly, .. } => {
                let (lx, ly) = logical_point(state, client_x, client_y);
                state.gesture =
                    Gesture::Lasso { start_lx, start_ly, cur_lx: lx, cur_ly: ly };
                let (ax, ay) = geometry::to_screen(&state.view, start_lx, start_ly);
                let (bx, by) = geometry::to_screen(&state.view, lx, ly);
                vec![Command::UpdateLassoRect(Some((
                    ax.min(bx),
                    ay.min(by),
                    (bx - ax).abs(),
                    (by - ay).abs(),
                )))]
            }
            Gesture::Wiring { from, .. } => {
                let (lx, ly) = logical_point(state, client_x, client_y);
                state.gesture =
                    Gesture::Wiring { from: from.clone(), pointer_lx: lx, pointer_ly: ly };
                match state.anchor_position(&from) {
                    Some((ax, ay)) => {
                        vec![Command::RedrawProvisionalWire(Some((ax, ay, lx, ly)))]
                    }
                    None => {
                        // Source anchor vanished mid-gesture; abort.
                        state.gesture = Gesture::Idle;
                        vec![Command::RedrawProvisionalWire(None)]
                    }
                }
            }
        },

        Message::PointerReleased { client_x, client_y } => {
            let gesture = std::mem::replace(&mut state.gesture, Gesture::Idle);
            match gesture {
                Gesture::Idle | Gesture::Pan { .. } => vec![],
                Gesture::DragNode { .. } | Gesture::DragSelection { .. } => {
                    vec![Command::UpdateDocumentTitle]
                }
                Gesture::Lasso { start_lx, start_ly, .. } => {
                    let (lx, ly) = logical_point(state, client_x, client_y);
                    let marquee = Rect::from_corners(start_lx, start_ly, lx, ly);
                    state.lasso_select(&marquee, true);
                    vec![Command::UpdateLassoRect(None), Command::RefreshSelectionClasses]
                }
                Gesture::Wiring { from, .. } => {
                    let (lx, ly) = logical_point(state, client_x, client_y);
                    let mut cmds = vec![Command::RedrawProvisionalWire(None)];
                    let target = match state.anchor_at(lx, ly) {
                        Some(t) if t != from => t,
                        _ => return cmds,
                    };
                    match state.connect(&from, &target) {
                        Ok((id, replaced)) => {
                            state.selected_anchor = None;
                            if let Some(old) = replaced {
                                cmds.push(Command::RemoveWireView(old));
                            }
                            cmds.push(Command::RedrawWires(vec![id]));
                            cmds.push(Command::RefreshAnchorSelection);
                            cmds.push(Command::UpdateDocumentTitle);
                        }
                        // Disallowed pairings abort silently.
                        Err(err) => console_warn!("{}", err),
                    }
                    cmds
                }
            }
        }

        Message::WheelZoomed { client_x, client_y, delta_y } => {
            let (sx, sy) = canvas_point(state, client_x, client_y);
            state.view = geometry::zoom_about(&state.view, sx, sy, delta_y < 0.0);
            vec![Command::ApplyViewTransform]
        }

        // -- parameters -----------------------------------------------------
        Message::ParamChanged { node_id, name, value } => {
            if state.set_param(&node_id, &name, value) {
                vec![Command::UpdateDocumentTitle]
            } else {
                vec![]
            }
        }

        // -- context menus --------------------------------------------------
        Message::NodeMenuRequested { node_id, page_x, page_y } => {
            if state.nodes.contains_key(&node_id) {
                vec![Command::ShowNodeContextMenu { node_id, page_x, page_y }]
            } else {
                vec![Command::HideContextMenu]
            }
        }
        Message::AnchorMenuRequested { node_id, name, page_x, page_y } => {
            let wire = state
                .wires
                .iter()
                .find(|w| {
                    (w.to_node == node_id && w.to_anchor == name)
                        || (w.from_node == node_id && w.from_anchor == name)
                })
                .map(|w| w.id);
            match wire {
                Some(wire_id) => {
                    vec![Command::ShowWireContextMenu { wire_id, page_x, page_y }]
                }
                None => vec![Command::HideContextMenu],
            }
        }
        Message::DeleteNodeViaMenu { node_id } => {
            if !state.nodes.contains_key(&node_id) {
                return vec![Command::HideContextMenu];
            }
            // Deleting a member of the selection deletes the whole selection.
            let ids: HashSet<String> = if state.selection.contains(&node_id) {
                state.selection.iter().cloned().collect()
            } else {
                HashSet::from([node_id])
            };
            state.push_undo();
            let removed = state.delete_nodes(&ids);
            let mut cmds = vec![Command::HideContextMenu];
            cmds.extend(ids.into_iter().map(Command::RemoveNodeView));
            cmds.extend(removed.into_iter().map(Command::RemoveWireView));
            cmds.push(Command::RefreshSelectionClasses);
            cmds.push(Command::UpdateDocumentTitle);
            cmds
        }
        Message::DeleteWire { wire_id } => {
            if state.wire(wire_id).is_none() {
                return vec![Command::HideContextMenu];
            }
            state.push_undo();
            state.delete_wire(wire_id);
            vec![
                Command::HideContextMenu,
                Command::RemoveWireView(wire_id),
                Command::UpdateDocumentTitle,
            ]
        }

        // -- selection commands ---------------------------------------------
        Message::DeleteSelection => {
            if state.selection.is_empty() {
                return vec![];
            }
            state.push_undo();
            let ids: HashSet<String> = state.selection.iter().cloned().collect();
            let removed = state.delete_nodes(&ids);
            let mut cmds: Vec<Command> =
                ids.into_iter().map(Command::RemoveNodeView).collect();
            cmds.extend(removed.into_iter().map(Command::RemoveWireView));
            cmds.push(Command::RefreshSelectionClasses);
            cmds.push(Command::UpdateDocumentTitle);
            cmds
        }
        Message::Undo => {
            if state.undo() {
                vec![Command::RebuildView, Command::UpdateDocumentTitle]
            } else {
                vec![]
            }
        }
        Message::Redo => {
            if state.redo() {
                vec![Command::RebuildView, Command::UpdateDocumentTitle]
            } else {
                vec![]
            }
        }

        // -- execution ------------------------------------------------------
        Message::StartExecution => {
            if state.nodes.is_empty() {
                return vec![Command::toast_error("Nothing to execute")];
            }
            state.set_processing(None);
            vec![
                Command::RefreshProcessingHighlight,
                Command::SubmitWorkflow(state.serialize_submission()),
            ]
        }
        Message::ExecutionStarted { token } => {
            vec![Command::OpenProgressStream(token)]
        }
        Message::ExecutionResults { results } | Message::StreamEnded { results } => {
            state.set_processing(None);
            let mut cmds = vec![Command::RefreshProcessingHighlight];
            cmds.extend(state.apply_results(&results).into_iter().map(Command::RefreshParams));
            cmds.push(Command::toast_success("Workflow finished"));
            cmds
        }
        Message::ExecutionFailed(msg) | Message::StreamFailed(msg) => {
            state.set_processing(None);
            console_error!("execution failed: {}", msg);
            vec![
                Command::RefreshProcessingHighlight,
                Command::toast_error(format!("Execution failed: {}", msg)),
            ]
        }
        Message::StreamProcessing { node_id } => {
            if state.set_processing(Some(node_id)) {
                vec![Command::RefreshProcessingHighlight]
            } else {
                vec![]
            }
        }
        Message::StreamDone => {
            if state.set_processing(None) {
                vec![Command::RefreshProcessingHighlight]
            } else {
                vec![]
            }
        }

        // -- persistence ----------------------------------------------------
        Message::ProjectsLoaded(projects) => {
            state.projects = projects;
            vec![Command::RefreshProjectTree]
        }
        Message::ProjectSelected(name) => {
            state.current_project = Some(name);
            state.current_workflow = None;
            vec![Command::RefreshProjectTree]
        }
        Message::WorkflowSelected { project, workflow } => {
            state.current_project = Some(project.clone());
            state.current_workflow = Some(workflow.clone());
            vec![
                Command::LoadWorkflowRequest { project, workflow },
                Command::RefreshProjectTree,
            ]
        }
        Message::CreateProject(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return vec![Command::toast_error("Project name cannot be empty")];
            }
            vec![Command::CreateProjectRequest(name)]
        }
        Message::ProjectCreated(name) => {
            state.current_project = Some(name);
            state.current_workflow = None;
            vec![Command::FetchProjects, Command::toast_success("Project created")]
        }
        Message::CreateWorkflow(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return vec![Command::toast_error("Workflow name cannot be empty")];
            }
            match &state.current_project {
                Some(project) => {
                    vec![Command::CreateWorkflowRequest { project: project.clone(), name }]
                }
                None => vec![Command::toast_error("Select a project first")],
            }
        }
        Message::WorkflowCreated { project, workflow } => {
            let workflow = workflow_file_name(&workflow);
            state.current_project = Some(project.clone());
            state.current_workflow = Some(workflow.clone());
            state.restore(&Default::default());
            state.clear_history();
            state.mark_saved();
            vec![
                Command::RebuildView,
                Command::FetchProjects,
                Command::RememberLastWorkflow { project, workflow },
                Command::UpdateDocumentTitle,
            ]
        }
        Message::SaveWorkflow => match (&state.current_project, &state.current_workflow) {
            (Some(project), Some(workflow)) => vec![Command::SaveWorkflowRequest {
                project: project.clone(),
                workflow: workflow.clone(),
                data: state.snapshot(),
            }],
            _ => vec![Command::toast_error("No workflow selected")],
        },
        Message::SaveWorkflowAs { name } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return vec![Command::toast_error("Workflow name cannot be empty")];
            }
            let name = workflow_file_name(&name);
            match &state.current_project {
                Some(project) => {
                    state.current_workflow = Some(name.clone());
                    vec![Command::SaveWorkflowRequest {
                        project: project.clone(),
                        workflow: name,
                        data: state.snapshot(),
                    }]
                }
                None => vec![Command::toast_error("Select a project first")],
            }
        }
        Message::WorkflowSaved { project, workflow } => {
            state.current_project = Some(project.clone());
            state.current_workflow = Some(workflow.clone());
            state.mark_saved();
            vec![
                Command::FetchProjects,
                Command::RememberLastWorkflow { project, workflow },
                Command::UpdateDocumentTitle,
                Command::toast_success("Workflow saved"),
            ]
        }
        Message::LoadWorkflow => match (&state.current_project, &state.current_workflow) {
            (Some(project), Some(workflow)) => vec![Command::LoadWorkflowRequest {
                project: project.clone(),
                workflow: workflow.clone(),
            }],
            _ => vec![],
        },
        Message::WorkflowLoaded { project, workflow, data } => {
            state.current_project = Some(project.clone());
            state.current_workflow = Some(workflow.clone());
            state.restore(&data);
            state.clear_history();
            state.mark_saved();
            vec![
                Command::RebuildView,
                Command::RememberLastWorkflow { project, workflow },
                Command::UpdateDocumentTitle,
            ]
        }
        Message::DuplicateItem => {
            match (&state.current_project, &state.current_workflow) {
                (Some(project), Some(workflow)) => vec![Command::DuplicateWorkflowRequest {
                    project: project.clone(),
                    source: workflow.clone(),
                    target: format!("{}_clone.json", workflow.trim_end_matches(".json")),
                }],
                (Some(project), None) => vec![Command::DuplicateProjectRequest {
                    source: project.clone(),
                    target: format!("{}_clone", project),
                }],
                _ => vec![Command::toast_error("Nothing selected to duplicate")],
            }
        }
        Message::DeleteItem => match (&state.current_project, &state.current_workflow) {
            (Some(project), Some(workflow)) => {
                let cmd = Command::DeleteWorkflowRequest {
                    project: project.clone(),
                    workflow: workflow.clone(),
                };
                state.current_workflow = None;
                vec![cmd]
            }
            (Some(project), None) => {
                let cmd = Command::DeleteProjectRequest { project: project.clone() };
                state.current_project = None;
                vec![cmd]
            }
            _ => vec![Command::toast_error("Nothing selected to delete")],
        },
        Message::RenameItem { new_name } => {
            let new_name = new_name.trim().to_string();
            if new_name.is_empty() {
                return vec![Command::toast_error("Name cannot be empty")];
            }
            match (&state.current_project, &state.current_workflow) {
                (Some(project), Some(workflow)) => {
                    let new_name = workflow_file_name(&new_name);
                    let cmd = Command::RenameWorkflowRequest {
                        project: project.clone(),
                        old_name: workflow.clone(),
                        new_name: new_name.clone(),
                    };
                    state.current_workflow = Some(new_name);
                    vec![cmd]
                }
                (Some(project), None) => {
                    let cmd = Command::RenameProjectRequest {
                        old_name: project.clone(),
                        new_name: new_name.clone(),
                    };
                    state.current_project = Some(new_name);
                    vec![cmd]
                }
                _ => vec![Command::toast_error("Nothing selected to rename")],
            }
        }
        Message::PersistenceFailed(msg) => {
            console_error!("persistence error: {}", msg);
            vec![Command::toast_error(format!("Save/load failed: {}", msg))]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ViewTransform;
    use crate::models::{Direction, NodeTypeDef, ParamDef, ParamKind, PortDef};
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn catalog() -> Vec<NodeTypeDef> {
        vec![
            NodeTypeDef {
                title: "Number Node".into(),
                category: "Input".into(),
                parameters: vec![ParamDef {
                    name: "value".into(),
                    kind: ParamKind::Int,
                    default: json!(5),
                    options: vec![],
                }],
                inputs: vec![],
                outputs: vec![PortDef { name: "out".into(), value_type: None }],
            },
            NodeTypeDef {
                title: "Math Node".into(),
                category: "Math".into(),
                parameters: vec![],
                inputs: vec![
                    PortDef { name: "a".into(), value_type: None },
                    PortDef { name: "b".into(), value_type: None },
                ],
                outputs: vec![PortDef { name: "out".into(), value_type: None }],
            },
        ]
    }

    fn editor() -> EditorState {
        let mut state = EditorState::new();
        update(&mut state, Message::CatalogLoaded(catalog()));
        state
    }

    fn drop_node(state: &mut EditorState, type_name: &str, cx: f64, cy: f64) -> String {
        let before: std::collections::HashSet<String> = state.nodes.keys().cloned().collect();
        update(
            state,
            Message::DropNode { type_name: type_name.into(), client_x: cx, client_y: cy },
        );
        state
            .nodes
            .keys()
            .find(|id| !before.contains(*id))
            .cloned()
            .unwrap()
    }

    #[test]
    fn drop_centers_node_on_pointer() {
        let mut state = editor();
        state.canvas_origin = (100.0, 50.0);
        state.view = ViewTransform { zoom: 2.0, pan_x: 30.0, pan_y: -10.0 };
        let id = drop_node(&mut state, "Number Node", 500.0, 250.0);
        let node = &state.nodes[&id];
        // client (500,250) -> canvas (400,200) -> logical (185,105), then
        // shifted so the pointer lands mid-title.
        assert_eq!(node.x, 185.0 - NODE_WIDTH / 2.0);
        assert_eq!(node.y, 105.0 - TITLE_HEIGHT / 2.0);
    }

    #[test]
    fn drop_of_unknown_type_toasts_and_creates_nothing() {
        let mut state = editor();
        let cmds = update(
            &mut state,
            Message::DropNode { type_name: "Bogus".into(), client_x: 0.0, client_y: 0.0 },
        );
        assert!(state.nodes.is_empty());
        assert!(cmds.iter().any(|c| matches!(c, Command::Toast { .. })));
    }

    proptest! {
        /// Dragging keeps the grabbed point under the pointer at any zoom/pan.
        #[test]
        fn drag_tracks_pointer_under_any_view(
            zoom in 0.25f64..4.0,
            pan_x in -500.0f64..500.0,
            pan_y in -500.0f64..500.0,
            grab_dx in 0.0f64..100.0,
            grab_dy in 0.0f64..25.0,
            move_x in -300.0f64..300.0,
            move_y in -300.0f64..300.0,
        ) {
            let mut state = editor();
            state.view = ViewTransform { zoom, pan_x, pan_y };
            let id = drop_node(&mut state, "Number Node", 400.0, 300.0);
            let (nx, ny) = (state.nodes[&id].x, state.nodes[&id].y);

            let (press_x, press_y) = {
                let (sx, sy) = crate::geometry::to_screen(&state.view, nx + grab_dx, ny + grab_dy);
                (sx, sy)
            };
            update(&mut state, Message::NodePressed {
                node_id: id.clone(), shift: false, client_x: press_x, client_y: press_y,
            });
            update(&mut state, Message::PointerMoved {
                client_x: press_x + move_x, client_y: press_y + move_y,
            });
            update(&mut state, Message::PointerReleased {
                client_x: press_x + move_x, client_y: press_y + move_y,
            });

            // The node moved by exactly the screen delta divided by zoom.
            let node = &state.nodes[&id];
            prop_assert!((node.x - (nx + move_x / zoom)).abs() < 1e-6);
            prop_assert!((node.y - (ny + move_y / zoom)).abs() < 1e-6);
        }
    }

    #[test]
    fn only_deletion_is_undo_tracked() {
        let mut state = editor();
        let id = drop_node(&mut state, "Number Node", 200.0, 200.0);
        update(
            &mut state,
            Message::NodePressed { node_id: id.clone(), shift: false, client_x: 210.0, client_y: 210.0 },
        );
        update(&mut state, Message::PointerMoved { client_x: 260.0, client_y: 240.0 });
        update(&mut state, Message::PointerReleased { client_x: 260.0, client_y: 240.0 });
        assert!(!state.can_undo(), "creates and drags push no undo entry");

        state.selection.insert(id.clone());
        update(&mut state, Message::DeleteSelection);
        assert!(state.can_undo());
        update(&mut state, Message::Undo);
        assert!(state.nodes.contains_key(&id));
    }

    #[test]
    fn group_drag_moves_all_selected_rigidly() {
        let mut state = editor();
        let a = drop_node(&mut state, "Number Node", 200.0, 200.0);
        let b = drop_node(&mut state, "Number Node", 500.0, 400.0);
        update(
            &mut state,
            Message::NodePressed { node_id: a.clone(), shift: false, client_x: 200.0, client_y: 200.0 },
        );
        update(&mut state, Message::PointerReleased { client_x: 200.0, client_y: 200.0 });
        update(
            &mut state,
            Message::NodePressed { node_id: b.clone(), shift: true, client_x: 500.0, client_y: 400.0 },
        );
        assert_eq!(state.selection.len(), 2);

        let (ax0, ay0) = (state.nodes[&a].x, state.nodes[&a].y);
        let (bx0, by0) = (state.nodes[&b].x, state.nodes[&b].y);
        update(
            &mut state,
            Message::NodePressed { node_id: a.clone(), shift: false, client_x: 210.0, client_y: 205.0 },
        );
        assert_eq!(state.selection.len(), 2, "plain press on member keeps the group");
        update(&mut state, Message::PointerMoved { client_x: 240.0, client_y: 245.0 });
        update(&mut state, Message::PointerReleased { client_x: 240.0, client_y: 245.0 });
        assert!(matches!(state.gesture, Gesture::Idle));

        assert_eq!(state.nodes[&a].x - ax0, 30.0);
        assert_eq!(state.nodes[&a].y - ay0, 40.0);
        assert_eq!(state.nodes[&b].x - bx0, 30.0);
        assert_eq!(state.nodes[&b].y - by0, 40.0);
    }

    #[test]
    fn wiring_gesture_connects_output_to_input() {
        let mut state = editor();
        let src = drop_node(&mut state, "Number Node", 200.0, 200.0);
        let dst = drop_node(&mut state, "Math Node", 600.0, 200.0);

        update(
            &mut state,
            Message::AnchorPressed {
                node_id: src.clone(),
                name: "out".into(),
                direction: Direction::Output,
            },
        );
        assert!(matches!(state.gesture, Gesture::Wiring { .. }));

        let (tx, ty) = state
            .anchor_position(&AnchorRef {
                node_id: dst.clone(),
                direction: Direction::Input,
                name: "a".into(),
            })
            .unwrap();
        let cmds = update(&mut state, Message::PointerReleased { client_x: tx, client_y: ty });

        assert_eq!(state.wires.len(), 1);
        assert_eq!(state.wires[0].from_node, src);
        assert_eq!(state.wires[0].to_node, dst);
        assert!(matches!(state.gesture, Gesture::Idle));
        // Provisional wire is always cleared on release.
        assert!(cmds
            .iter()
            .any(|c| matches!(c, Command::RedrawProvisionalWire(None))));
    }

    #[test]
    fn wiring_released_on_empty_canvas_is_dropped() {
        let mut state = editor();
        let src = drop_node(&mut state, "Number Node", 200.0, 200.0);
        update(
            &mut state,
            Message::AnchorPressed {
                node_id: src,
                name: "out".into(),
                direction: Direction::Output,
            },
        );
        let cmds = update(
            &mut state,
            Message::PointerReleased { client_x: 900.0, client_y: 900.0 },
        );
        assert!(state.wires.is_empty());
        assert!(cmds
            .iter()
            .any(|c| matches!(c, Command::RedrawProvisionalWire(None))));
    }

    #[test]
    fn wiring_from_input_anchor_aborts_silently() {
        let mut state = editor();
        let src = drop_node(&mut state, "Number Node", 200.0, 200.0);
        let dst = drop_node(&mut state, "Math Node", 600.0, 200.0);
        update(
            &mut state,
            Message::AnchorPressed {
                node_id: dst.clone(),
                name: "a".into(),
                direction: Direction::Input,
            },
        );
        let (tx, ty) = state
            .anchor_position(&AnchorRef {
                node_id: src,
                direction: Direction::Output,
                name: "out".into(),
            })
            .unwrap();
        let cmds = update(&mut state, Message::PointerReleased { client_x: tx, client_y: ty });
        assert!(state.wires.is_empty());
        // No toast: a bad pairing just drops the provisional wire.
        assert!(!cmds.iter().any(|c| matches!(c, Command::Toast { .. })));
    }

    #[test]
    fn pan_applies_raw_screen_delta() {
        let mut state = editor();
        state.view.zoom = 2.0;
        update(
            &mut state,
            Message::BackgroundPressed { client_x: 100.0, client_y: 100.0, shift: false },
        );
        assert!(matches!(state.gesture, Gesture::Pan { .. }));
        update(&mut state, Message::PointerMoved { client_x: 130.0, client_y: 80.0 });
        // Pan is not zoom-scaled.
        assert_eq!(state.view.pan_x, 30.0);
        assert_eq!(state.view.pan_y, -20.0);
        update(&mut state, Message::PointerMoved { client_x: 140.0, client_y: 85.0 });
        assert_eq!(state.view.pan_x, 40.0);
        assert_eq!(state.view.pan_y, -15.0);
        update(&mut state, Message::PointerReleased { client_x: 140.0, client_y: 85.0 });
        assert!(matches!(state.gesture, Gesture::Idle));
    }

    #[test]
    fn background_press_clears_selection() {
        let mut state = editor();
        let id = drop_node(&mut state, "Number Node", 200.0, 200.0);
        update(
            &mut state,
            Message::NodePressed { node_id: id, shift: false, client_x: 200.0, client_y: 200.0 },
        );
        update(&mut state, Message::PointerReleased { client_x: 200.0, client_y: 200.0 });
        assert_eq!(state.selection.len(), 1);
        update(
            &mut state,
            Message::BackgroundPressed { client_x: 50.0, client_y: 50.0, shift: false },
        );
        assert!(state.selection.is_empty());
    }

    #[test]
    fn lasso_adds_fully_contained_nodes() {
        let mut state = editor();
        let a = drop_node(&mut state, "Number Node", 300.0, 300.0);
        let _far = drop_node(&mut state, "Number Node", 1200.0, 900.0);
        update(
            &mut state,
            Message::BackgroundPressed { client_x: 100.0, client_y: 100.0, shift: true },
        );
        assert!(matches!(state.gesture, Gesture::Lasso { .. }));
        update(&mut state, Message::PointerMoved { client_x: 600.0, client_y: 600.0 });
        let cmds =
            update(&mut state, Message::PointerReleased { client_x: 600.0, client_y: 600.0 });
        assert_eq!(state.selection, std::collections::HashSet::from([a]));
        assert!(matches!(state.gesture, Gesture::Idle));
        assert!(cmds.iter().any(|c| matches!(c, Command::UpdateLassoRect(None))));
    }

    #[test]
    fn wheel_zoom_emits_view_transform() {
        let mut state = editor();
        let cmds = update(
            &mut state,
            Message::WheelZoomed { client_x: 400.0, client_y: 300.0, delta_y: -120.0 },
        );
        assert!((state.view.zoom - ZOOM_IN_FACTOR).abs() < 1e-12);
        assert!(cmds.iter().any(|c| matches!(c, Command::ApplyViewTransform)));
    }

    #[test]
    fn delete_selection_removes_nodes_and_wires() {
        let mut state = editor();
        let src = drop_node(&mut state, "Number Node", 200.0, 200.0);
        let dst = drop_node(&mut state, "Math Node", 600.0, 200.0);
        state
            .connect(
                &AnchorRef { node_id: src.clone(), direction: Direction::Output, name: "out".into() },
                &AnchorRef { node_id: dst.clone(), direction: Direction::Input, name: "a".into() },
            )
            .unwrap();
        state.selection.insert(src.clone());

        let cmds = update(&mut state, Message::DeleteSelection);
        assert!(!state.nodes.contains_key(&src));
        assert!(state.nodes.contains_key(&dst));
        assert!(state.wires.is_empty());
        assert!(cmds.iter().any(|c| matches!(c, Command::RemoveWireView(_))));

        // Undo restores both the node and its wire.
        update(&mut state, Message::Undo);
        assert!(state.nodes.contains_key(&src));
        assert_eq!(state.wires.len(), 1);
    }

    #[test]
    fn start_execution_submits_serialized_graph() {
        let mut state = editor();
        let src = drop_node(&mut state, "Number Node", 200.0, 200.0);
        let dst = drop_node(&mut state, "Math Node", 600.0, 200.0);
        state
            .connect(
                &AnchorRef { node_id: src.clone(), direction: Direction::Output, name: "out".into() },
                &AnchorRef { node_id: dst.clone(), direction: Direction::Input, name: "b".into() },
            )
            .unwrap();
        let cmds = update(&mut state, Message::StartExecution);
        let payload = cmds
            .iter()
            .find_map(|c| match c {
                Command::SubmitWorkflow(p) => Some(p),
                _ => None,
            })
            .unwrap();
        let math = payload.nodes.iter().find(|n| n.id == dst).unwrap();
        assert_eq!(math.connections["b"], src);
    }

    #[test]
    fn execution_of_empty_graph_is_refused() {
        let mut state = editor();
        let cmds = update(&mut state, Message::StartExecution);
        assert!(cmds.iter().all(|c| matches!(c, Command::Toast { .. })));
    }

    #[test]
    fn duplicate_stream_events_cause_no_commands() {
        let mut state = editor();
        let id = drop_node(&mut state, "Number Node", 200.0, 200.0);
        let first = update(&mut state, Message::StreamProcessing { node_id: id.clone() });
        assert_eq!(first.len(), 1);
        let second = update(&mut state, Message::StreamProcessing { node_id: id.clone() });
        assert!(second.is_empty());
        assert_eq!(update(&mut state, Message::StreamDone).len(), 1);
        assert!(update(&mut state, Message::StreamDone).is_empty());
    }

    #[test]
    fn stream_end_applies_results_and_stops_run() {
        let mut state = editor();
        let id = drop_node(&mut state, "Number Node", 200.0, 200.0);
        update(&mut state, Message::StartExecution);
        update(&mut state, Message::StreamProcessing { node_id: id.clone() });
        let cmds = update(
            &mut state,
            Message::StreamEnded { results: HashMap::from([(id.clone(), json!(7))]) },
        );
        assert!(state.processing_node.is_none());
        assert!(cmds.iter().any(|c| matches!(c, Command::RefreshParams(n) if *n == id)));
    }

    #[test]
    fn workflow_loaded_resets_history_and_dirty_flag() {
        let mut state = editor();
        drop_node(&mut state, "Number Node", 200.0, 200.0);
        assert!(state.is_dirty());
        let snap = state.snapshot();
        let cmds = update(
            &mut state,
            Message::WorkflowLoaded {
                project: "demo".into(),
                workflow: "main".into(),
                data: snap.clone(),
            },
        );
        assert!(!state.is_dirty());
        assert!(!state.can_undo());
        assert_eq!(state.snapshot(), snap);
        assert!(cmds.iter().any(|c| matches!(
            c,
            Command::RememberLastWorkflow { project, workflow }
                if project == "demo" && workflow == "main"
        )));
    }

    #[test]
    fn save_without_workflow_name_is_refused() {
        let mut state = editor();
        let cmds = update(&mut state, Message::SaveWorkflow);
        assert!(cmds.iter().all(|c| matches!(c, Command::Toast { .. })));
    }

    #[test]
    fn rename_updates_current_selection() {
        let mut state = editor();
        state.current_project = Some("p".into());
        state.current_workflow = Some("old.json".into());
        let cmds = update(&mut state, Message::RenameItem { new_name: "new".into() });
        // User types the bare name; the stored file keeps its .json suffix.
        assert_eq!(state.current_workflow.as_deref(), Some("new.json"));
        assert!(cmds.iter().any(|c| matches!(
            c,
            Command::RenameWorkflowRequest { old_name, new_name, .. }
                if old_name == "old.json" && new_name == "new.json"
        )));
    }
}
