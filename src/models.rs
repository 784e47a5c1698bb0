//! Logical data model for the workflow graph.
//!
//! The rendered DOM is always derived from these plain structures plus the
//! current view transform; nothing in here holds an element handle. That keeps
//! the whole graph testable off-browser and makes snapshots trivially
//! serializable.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Which side of a node an anchor sits on. Wires always flow output -> input.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Int,
    Text,
    Dropdown,
}

/// One editable parameter in a node type definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(default)]
    pub default: serde_json::Value,
    #[serde(default)]
    pub options: Vec<String>,
}

impl ParamDef {
    /// Form fields hold strings; collapse the JSON default into one.
    pub fn default_as_string(&self) -> String {
        match &self.default {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// A named input or output port.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub value_type: Option<String>,
}

/// Immutable node type definition, fetched from the catalog endpoint and
/// looked up by `title`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeTypeDef {
    pub title: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub parameters: Vec<ParamDef>,
    #[serde(default)]
    pub inputs: Vec<PortDef>,
    #[serde(default)]
    pub outputs: Vec<PortDef>,
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

/// A node placed on the canvas. Position is the top-left corner in logical
/// workflow coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowNode {
    pub id: String,
    pub type_name: String,
    pub x: f64,
    pub y: f64,
    pub params: BTreeMap<String, String>,
}

/// A directed connection between two anchors, plus the cached start
/// coordinate used for cheap incremental redraws of incoming wires.
#[derive(Clone, Debug, PartialEq)]
pub struct Wire {
    pub id: u64,
    pub from_node: String,
    pub from_anchor: String,
    pub to_node: String,
    pub to_anchor: String,
    pub start_x: f64,
    pub start_y: f64,
}

impl Wire {
    pub fn touches(&self, node_id: &str) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }
}

/// Identifies one anchor location: `(node, direction, port name)`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorRef {
    pub node_id: String,
    pub direction: Direction,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Snapshot shape - shared by undo/redo and workflow persistence. A workflow
// file must round-trip create -> save -> load without loss.
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub position: Position,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedWire {
    pub from_node: String,
    pub from_anchor: String,
    pub to_node: String,
    pub to_anchor: String,
}

/// Full serializable copy of the graph. Pushed on the undo stack before every
/// deletion and written verbatim to workflow storage.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct GraphSnapshot {
    pub nodes: Vec<SavedNode>,
    pub wires: Vec<SavedWire>,
}

// ---------------------------------------------------------------------------
// Execution submission payload and responses.
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecNode {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub parameters: BTreeMap<String, String>,
    /// input anchor name -> id of the node whose output feeds it
    pub connections: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecutionPayload {
    pub nodes: Vec<ExecNode>,
}

/// `POST /api/execute` answers either with a stream token or, in the legacy
/// non-streaming variant, with the results directly.
#[derive(Clone, Debug, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub results: Option<HashMap<String, serde_json::Value>>,
}

/// Payload of the terminal `END` stream event.
#[derive(Clone, Debug, Deserialize)]
pub struct EndPayload {
    #[serde(default)]
    pub results: HashMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Project/workflow browser types.
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default)]
    pub workflows: Vec<String>,
}
