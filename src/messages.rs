//! The events that can occur in the editor, plus the side-effect commands the
//! reducer hands back to the dispatch loop.
//!
//! Messages are plain data produced by DOM event handlers and network
//! callbacks; the reducer in `update.rs` is the only place that mutates
//! `EditorState`. Commands are executed afterwards by `command_executors.rs`
//! once the state borrow has been released.

use crate::models::{Direction, ExecutionPayload, GraphSnapshot, NodeTypeDef, ProjectInfo};
use crate::toast::ToastKind;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum Message {
    // Catalog
    CatalogLoaded(Vec<NodeTypeDef>),
    CatalogFailed(String),

    // Node creation (library item dropped on the canvas, client coords)
    DropNode { type_name: String, client_x: f64, client_y: f64 },

    // Pointer input routing
    NodePressed { node_id: String, shift: bool, client_x: f64, client_y: f64 },
    AnchorPressed { node_id: String, name: String, direction: Direction },
    BackgroundPressed { client_x: f64, client_y: f64, shift: bool },
    PointerMoved { client_x: f64, client_y: f64 },
    PointerReleased { client_x: f64, client_y: f64 },
    WheelZoomed { client_x: f64, client_y: f64, delta_y: f64 },

    // Parameter editing
    ParamChanged { node_id: String, name: String, value: String },

    // Context menus
    NodeMenuRequested { node_id: String, page_x: f64, page_y: f64 },
    AnchorMenuRequested { node_id: String, name: String, page_x: f64, page_y: f64 },
    DeleteNodeViaMenu { node_id: String },
    DeleteWire { wire_id: u64 },

    // Selection commands
    DeleteSelection,
    Undo,
    Redo,

    // Execution bridge
    StartExecution,
    ExecutionStarted { token: String },
    ExecutionResults { results: HashMap<String, serde_json::Value> },
    ExecutionFailed(String),
    StreamProcessing { node_id: String },
    StreamDone,
    StreamEnded { results: HashMap<String, serde_json::Value> },
    StreamFailed(String),

    // Project/workflow persistence
    ProjectsLoaded(Vec<ProjectInfo>),
    ProjectSelected(String),
    WorkflowSelected { project: String, workflow: String },
    CreateProject(String),
    ProjectCreated(String),
    CreateWorkflow(String),
    WorkflowCreated { project: String, workflow: String },
    SaveWorkflow,
    SaveWorkflowAs { name: String },
    WorkflowSaved { project: String, workflow: String },
    LoadWorkflow,
    WorkflowLoaded { project: String, workflow: String, data: GraphSnapshot },
    DuplicateItem,
    DeleteItem,
    RenameItem { new_name: String },
    PersistenceFailed(String),
}

/// Side effects queued by the reducer. Everything that touches the DOM or the
/// network goes through here so the reducer itself stays pure and testable.
pub enum Command {
    // View updates (all read current state when executed)
    RenderNode(String),
    RemoveNodeView(String),
    RefreshNodePositions(Vec<String>),
    RedrawWires(Vec<u64>),
    RemoveWireView(u64),
    RedrawProvisionalWire(Option<(f64, f64, f64, f64)>),
    UpdateLassoRect(Option<(f64, f64, f64, f64)>),
    ApplyViewTransform,
    RefreshSelectionClasses,
    RefreshAnchorSelection,
    RefreshProcessingHighlight,
    RefreshParams(String),
    RebuildView,
    RenderLibrary,
    RefreshProjectTree,
    UpdateDocumentTitle,
    ShowNodeContextMenu { node_id: String, page_x: f64, page_y: f64 },
    ShowWireContextMenu { wire_id: u64, page_x: f64, page_y: f64 },
    HideContextMenu,

    // Network
    SubmitWorkflow(ExecutionPayload),
    OpenProgressStream(String),
    FetchProjects,
    CreateProjectRequest(String),
    CreateWorkflowRequest { project: String, name: String },
    SaveWorkflowRequest { project: String, workflow: String, data: GraphSnapshot },
    LoadWorkflowRequest { project: String, workflow: String },
    DuplicateProjectRequest { source: String, target: String },
    DuplicateWorkflowRequest { project: String, source: String, target: String },
    DeleteProjectRequest { project: String },
    DeleteWorkflowRequest { project: String, workflow: String },
    RenameProjectRequest { old_name: String, new_name: String },
    RenameWorkflowRequest { project: String, old_name: String, new_name: String },
    RememberLastWorkflow { project: String, workflow: String },

    // Notifications
    Toast { kind: ToastKind, text: String },
}

impl Command {
    pub fn toast_error(text: impl Into<String>) -> Self {
        Command::Toast { kind: ToastKind::Error, text: text.into() }
    }

    pub fn toast_success(text: impl Into<String>) -> Self {
        Command::Toast { kind: ToastKind::Success, text: text.into() }
    }
}
