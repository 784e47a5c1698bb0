//! Central editor state and the pure graph operations on it.
//!
//! `EditorState` holds only plain data (no element handles), so every rule in
//! here - wiring legality, drag clamping, snapshot/restore, submission
//! serialization - runs unchanged in native unit tests. The DOM mirror of this
//! state is maintained by the command executors.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::console_warn;
use crate::constants::*;
use crate::error::EditorError;
use crate::geometry::{self, Rect, ViewTransform};
use crate::models::{
    AnchorRef, Direction, ExecNode, ExecutionPayload, GraphSnapshot, NodeTypeDef, Position,
    ProjectInfo, SavedNode, SavedWire, Wire, WorkflowNode,
};

/// The one in-flight pointer interaction. Pointer moves and the final release
/// are interpreted against whichever variant is active; everything else is
/// `Idle`.
#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    Idle,
    /// Single node drag. `offset` is the screen-space distance from the
    /// pointer to the node's top-left corner, captured at press time.
    DragNode { node_id: String, offset_x: f64, offset_y: f64 },
    /// Group drag of the whole selection. `origins` are the logical positions
    /// of the member nodes at press time; every move applies one shared delta.
    DragSelection {
        start_lx: f64,
        start_ly: f64,
        origins: Vec<(String, f64, f64)>,
    },
    /// Background pan; `last` is the previous pointer position (client px).
    Pan { last_x: f64, last_y: f64 },
    /// Rubber-band selection; both corners in logical coordinates.
    Lasso { start_lx: f64, start_ly: f64, cur_lx: f64, cur_ly: f64 },
    /// A provisional wire follows the pointer from a pressed anchor.
    Wiring { from: AnchorRef, pointer_lx: f64, pointer_ly: f64 },
}

pub struct EditorState {
    /// Node type catalog keyed by title.
    pub definitions: BTreeMap<String, NodeTypeDef>,
    pub catalog_loaded: bool,

    pub nodes: HashMap<String, WorkflowNode>,
    node_seq: u64,
    pub wires: Vec<Wire>,
    wire_seq: u64,

    pub view: ViewTransform,
    /// Canvas top-left in client coordinates, refreshed on layout changes.
    pub canvas_origin: (f64, f64),

    pub selection: HashSet<String>,
    pub selected_anchor: Option<AnchorRef>,
    pub gesture: Gesture,

    undo_stack: Vec<GraphSnapshot>,
    redo_stack: Vec<GraphSnapshot>,

    /// Node currently highlighted by a `PROCESSING` stream event.
    pub processing_node: Option<String>,

    pub projects: Vec<ProjectInfo>,
    pub current_project: Option<String>,
    pub current_workflow: Option<String>,
    last_saved: Option<GraphSnapshot>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            definitions: BTreeMap::new(),
            catalog_loaded: false,
            nodes: HashMap::new(),
            node_seq: 0,
            wires: Vec::new(),
            wire_seq: 0,
            view: ViewTransform::default(),
            canvas_origin: (0.0, 0.0),
            selection: HashSet::new(),
            selected_anchor: None,
            gesture: Gesture::Idle,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            processing_node: None,
            projects: Vec::new(),
            current_project: None,
            current_workflow: None,
            last_saved: None,
        }
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub fn load_catalog(&mut self, defs: Vec<NodeTypeDef>) {
        self.definitions = defs.into_iter().map(|d| (d.title.clone(), d)).collect();
        self.catalog_loaded = true;
    }

    pub fn definition_of(&self, node_id: &str) -> Option<&NodeTypeDef> {
        let node = self.nodes.get(node_id)?;
        self.definitions.get(&node.type_name)
    }

    // -----------------------------------------------------------------------
    // Node lifecycle
    // -----------------------------------------------------------------------

    /// Instantiate a node of `type_name` at a logical position, with every
    /// parameter set to its definition default.
    pub fn create_node(&mut self, type_name: &str, x: f64, y: f64) -> Result<String, EditorError> {
        let def = self
            .definitions
            .get(type_name)
            .ok_or_else(|| EditorError::DefinitionMissing(type_name.to_string()))?;
        let params: BTreeMap<String, String> = def
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.default_as_string()))
            .collect();
        self.node_seq += 1;
        let id = format!("node_{}", self.node_seq);
        self.nodes.insert(
            id.clone(),
            WorkflowNode { id: id.clone(), type_name: type_name.to_string(), x, y, params },
        );
        Ok(id)
    }

    /// Remove nodes and every wire touching them. Returns the removed wire
    /// ids so their views can be torn down.
    pub fn delete_nodes(&mut self, ids: &HashSet<String>) -> Vec<u64> {
        let removed: Vec<u64> = self
            .wires
            .iter()
            .filter(|w| ids.contains(&w.from_node) || ids.contains(&w.to_node))
            .map(|w| w.id)
            .collect();
        self.wires.retain(|w| !removed.contains(&w.id));
        for id in ids {
            self.nodes.remove(id);
            self.selection.remove(id);
        }
        if let Some(anchor) = &self.selected_anchor {
            if ids.contains(&anchor.node_id) {
                self.selected_anchor = None;
            }
        }
        if let Some(p) = &self.processing_node {
            if ids.contains(p) {
                self.processing_node = None;
            }
        }
        removed
    }

    pub fn set_param(&mut self, node_id: &str, name: &str, value: String) -> bool {
        match self.nodes.get_mut(node_id) {
            Some(node) => {
                node.params.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Anchors and wires
    // -----------------------------------------------------------------------

    /// Logical center of a named anchor, or None if the node, its definition
    /// or the port does not exist.
    pub fn anchor_position(&self, anchor: &AnchorRef) -> Option<(f64, f64)> {
        let node = self.nodes.get(&anchor.node_id)?;
        let def = self.definitions.get(&node.type_name)?;
        let ports = match anchor.direction {
            Direction::Input => &def.inputs,
            Direction::Output => &def.outputs,
        };
        let index = ports.iter().position(|p| p.name == anchor.name)?;
        Some(geometry::anchor_center(node, anchor.direction, index))
    }

    /// Hit-test a logical point against every anchor on the canvas.
    pub fn anchor_at(&self, lx: f64, ly: f64) -> Option<AnchorRef> {
        for node in self.nodes.values() {
            let def = match self.definitions.get(&node.type_name) {
                Some(d) => d,
                None => continue,
            };
            for (direction, ports) in
                [(Direction::Input, &def.inputs), (Direction::Output, &def.outputs)]
            {
                for (index, port) in ports.iter().enumerate() {
                    let (ax, ay) = geometry::anchor_center(node, direction, index);
                    if (lx - ax).hypot(ly - ay) <= ANCHOR_HIT_RADIUS {
                        return Some(AnchorRef {
                            node_id: node.id.clone(),
                            direction,
                            name: port.name.clone(),
                        });
                    }
                }
            }
        }
        None
    }

    /// Create a wire from an output anchor to an input anchor on a different
    /// node; any other pairing is an `InvalidConnection`. An input accepts a
    /// single incoming wire, so a wire already feeding the target input is
    /// replaced (its id is returned for view teardown).
    pub fn connect(
        &mut self,
        from: &AnchorRef,
        to: &AnchorRef,
    ) -> Result<(u64, Option<u64>), EditorError> {
        if from.direction != Direction::Output
            || to.direction != Direction::Input
            || from.node_id == to.node_id
        {
            return Err(EditorError::InvalidConnection {
                from: format!("{}:{}", from.node_id, from.name),
                to: format!("{}:{}", to.node_id, to.name),
            });
        }
        let (start_x, start_y) =
            self.anchor_position(from).ok_or_else(|| EditorError::InvalidConnection {
                from: format!("{}:{}", from.node_id, from.name),
                to: format!("{}:{}", to.node_id, to.name),
            })?;

        let replaced = self
            .wires
            .iter()
            .find(|w| w.to_node == to.node_id && w.to_anchor == to.name)
            .map(|w| w.id);
        if let Some(old) = replaced {
            self.wires.retain(|w| w.id != old);
        }

        self.wire_seq += 1;
        let id = self.wire_seq;
        self.wires.push(Wire {
            id,
            from_node: from.node_id.clone(),
            from_anchor: from.name.clone(),
            to_node: to.node_id.clone(),
            to_anchor: to.name.clone(),
            start_x,
            start_y,
        });
        Ok((id, replaced))
    }

    pub fn wire(&self, id: u64) -> Option<&Wire> {
        self.wires.iter().find(|w| w.id == id)
    }

    pub fn delete_wire(&mut self, id: u64) -> bool {
        let before = self.wires.len();
        self.wires.retain(|w| w.id != id);
        self.wires.len() != before
    }

    /// Current endpoints of a wire for rendering: the cached start plus the
    /// live position of the input anchor.
    pub fn wire_endpoints(&self, wire: &Wire) -> Option<(f64, f64, f64, f64)> {
        let (ex, ey) = self.anchor_position(&AnchorRef {
            node_id: wire.to_node.clone(),
            direction: Direction::Input,
            name: wire.to_anchor.clone(),
        })?;
        Some((wire.start_x, wire.start_y, ex, ey))
    }

    /// After `node_id` moved: refresh the cached start of its outgoing wires
    /// and return every wire id that needs a redraw (outgoing and incoming).
    pub fn refresh_wires_for(&mut self, node_id: &str) -> Vec<u64> {
        let mut updates: Vec<(usize, (f64, f64))> = Vec::new();
        for (i, w) in self.wires.iter().enumerate() {
            if w.from_node == node_id {
                let anchor = AnchorRef {
                    node_id: w.from_node.clone(),
                    direction: Direction::Output,
                    name: w.from_anchor.clone(),
                };
                if let Some(pos) = self.anchor_position(&anchor) {
                    updates.push((i, pos));
                }
            }
        }
        for (i, (x, y)) in updates {
            self.wires[i].start_x = x;
            self.wires[i].start_y = y;
        }
        self.wires.iter().filter(|w| w.touches(node_id)).map(|w| w.id).collect()
    }

    // -----------------------------------------------------------------------
    // Dragging
    // -----------------------------------------------------------------------

    /// Move one node to a logical position (single-node drag, unclamped).
    pub fn move_node(&mut self, node_id: &str, x: f64, y: f64) -> bool {
        match self.nodes.get_mut(node_id) {
            Some(node) => {
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    /// Clamp a group-drag delta so every member's bounding box stays inside
    /// the workflow bounds. One shared delta keeps relative offsets rigid.
    pub fn clamp_group_delta(
        &self,
        origins: &[(String, f64, f64)],
        mut dx: f64,
        mut dy: f64,
    ) -> (f64, f64) {
        for (id, ox, oy) in origins {
            let height = match self.definition_of(id) {
                Some(def) => geometry::node_height(def),
                None => continue,
            };
            dx = dx.max(-ox).min(WORKFLOW_WIDTH - NODE_WIDTH - ox);
            dy = dy.max(-oy).min(WORKFLOW_HEIGHT - height - oy);
        }
        (dx, dy)
    }

    /// Apply a (pre-clamped) group delta to every origin. Returns the moved
    /// node ids.
    pub fn apply_group_delta(
        &mut self,
        origins: &[(String, f64, f64)],
        dx: f64,
        dy: f64,
    ) -> Vec<String> {
        let mut moved = Vec::with_capacity(origins.len());
        for (id, ox, oy) in origins {
            if let Some(node) = self.nodes.get_mut(id) {
                node.x = ox + dx;
                node.y = oy + dy;
                moved.push(id.clone());
            }
        }
        moved
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Press on a node: shift toggles membership; a plain press on an
    /// unselected node replaces the selection, while a plain press on an
    /// already-selected node keeps the group (so group drags can start).
    pub fn select_on_press(&mut self, node_id: &str, shift: bool) {
        if shift {
            if !self.selection.remove(node_id) {
                self.selection.insert(node_id.to_string());
            }
        } else if !self.selection.contains(node_id) {
            self.selection.clear();
            self.selection.insert(node_id.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every node whose bounding box lies fully inside the marquee.
    pub fn lasso_select(&mut self, marquee: &Rect, additive: bool) {
        if !additive {
            self.selection.clear();
        }
        for node in self.nodes.values() {
            if let Some(def) = self.definitions.get(&node.type_name) {
                if marquee.contains(&geometry::node_rect(node, def)) {
                    self.selection.insert(node.id.clone());
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Undo/redo
    // -----------------------------------------------------------------------

    /// Serializable copy of the current graph, nodes in id order.
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut nodes: Vec<SavedNode> = self
            .nodes
            .values()
            .map(|n| SavedNode {
                id: n.id.clone(),
                type_name: n.type_name.clone(),
                position: Position { x: n.x, y: n.y },
                parameters: n.params.clone(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let wires = self
            .wires
            .iter()
            .map(|w| SavedWire {
                from_node: w.from_node.clone(),
                from_anchor: w.from_anchor.clone(),
                to_node: w.to_node.clone(),
                to_anchor: w.to_anchor.clone(),
            })
            .collect();
        GraphSnapshot { nodes, wires }
    }

    /// Replace the whole graph with a snapshot. The node id counter only ever
    /// moves forward so restored ids never collide with future ones.
    pub fn restore(&mut self, snap: &GraphSnapshot) {
        self.nodes.clear();
        self.wires.clear();
        self.selection.clear();
        self.selected_anchor = None;
        self.processing_node = None;
        for n in &snap.nodes {
            if let Some(seq) = n.id.strip_prefix("node_").and_then(|s| s.parse::<u64>().ok()) {
                self.node_seq = self.node_seq.max(seq);
            }
            self.nodes.insert(
                n.id.clone(),
                WorkflowNode {
                    id: n.id.clone(),
                    type_name: n.type_name.clone(),
                    x: n.position.x,
                    y: n.position.y,
                    params: n.parameters.clone(),
                },
            );
        }
        for w in &snap.wires {
            let from = AnchorRef {
                node_id: w.from_node.clone(),
                direction: Direction::Output,
                name: w.from_anchor.clone(),
            };
            match self.anchor_position(&from) {
                Some((sx, sy)) => {
                    self.wire_seq += 1;
                    self.wires.push(Wire {
                        id: self.wire_seq,
                        from_node: w.from_node.clone(),
                        from_anchor: w.from_anchor.clone(),
                        to_node: w.to_node.clone(),
                        to_anchor: w.to_anchor.clone(),
                        start_x: sx,
                        start_y: sy,
                    });
                }
                None => {
                    console_warn!(
                        "dropping wire with missing endpoint: {}:{} -> {}:{}",
                        w.from_node,
                        w.from_anchor,
                        w.to_node,
                        w.to_anchor
                    );
                }
            }
        }
    }

    /// Record the current graph for undo and invalidate the redo history.
    pub fn push_undo(&mut self) {
        self.undo_stack.push(self.snapshot());
        self.redo_stack.clear();
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(snap) => {
                self.redo_stack.push(self.snapshot());
                self.restore(&snap);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(snap) => {
                self.undo_stack.push(self.snapshot());
                self.restore(&snap);
                true
            }
            None => false,
        }
    }

    /// Forget both histories (used when a different workflow is loaded).
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Build the execution payload: every node with its parameters, plus an
    /// input-anchor -> source-node map inverted from the wire list. Result
    /// nodes submit no parameters; their fields are outputs.
    pub fn serialize_submission(&self) -> ExecutionPayload {
        let mut connections: HashMap<&str, BTreeMap<String, String>> = HashMap::new();
        for w in &self.wires {
            connections
                .entry(w.to_node.as_str())
                .or_default()
                .insert(w.to_anchor.clone(), w.from_node.clone());
        }
        let mut nodes: Vec<ExecNode> = self
            .nodes
            .values()
            .map(|n| ExecNode {
                id: n.id.clone(),
                type_name: n.type_name.clone(),
                parameters: if n.type_name == RESULT_NODE_TYPE {
                    BTreeMap::new()
                } else {
                    n.params.clone()
                },
                connections: connections.remove(n.id.as_str()).unwrap_or_default(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        ExecutionPayload { nodes }
    }

    /// Write execution results into the matching nodes' result parameter.
    /// Returns the ids of nodes whose fields changed.
    pub fn apply_results(&mut self, results: &HashMap<String, serde_json::Value>) -> Vec<String> {
        let mut updated = Vec::new();
        for (id, value) in results {
            if let Some(node) = self.nodes.get_mut(id) {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                node.params.insert(RESULT_PARAM_NAME.to_string(), text);
                updated.push(id.clone());
            }
        }
        updated.sort();
        updated
    }

    /// Move the processing highlight. Returns false when nothing changed, so
    /// duplicate stream events cause no DOM work.
    pub fn set_processing(&mut self, node_id: Option<String>) -> bool {
        if self.processing_node == node_id {
            return false;
        }
        self.processing_node = node_id;
        true
    }

    // -----------------------------------------------------------------------
    // Persistence bookkeeping
    // -----------------------------------------------------------------------

    pub fn mark_saved(&mut self) {
        self.last_saved = Some(self.snapshot());
    }

    /// True when the graph differs from the last saved (or loaded) snapshot.
    pub fn is_dirty(&self) -> bool {
        match &self.last_saved {
            Some(saved) => *saved != self.snapshot(),
            None => !self.nodes.is_empty() || !self.wires.is_empty(),
        }
    }
}

thread_local! {
    /// The one `EditorState` instance backing the page. Only
    /// [`dispatch_global_message`] takes the mutable borrow; command executors
    /// re-borrow immutably afterwards.
    pub static STATE: std::cell::RefCell<EditorState> =
        std::cell::RefCell::new(EditorState::new());
}

/// Run a message through the reducer, then execute the side effects it
/// queued. The state borrow is released before any command runs, so executors
/// (and the messages they dispatch in turn) can re-enter freely.
pub fn dispatch_global_message(msg: crate::messages::Message) {
    let commands = STATE.with(|state| crate::update::update(&mut state.borrow_mut(), msg));
    crate::command_executors::execute(commands);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParamDef, ParamKind, PortDef};
    use serde_json::json;

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
                parameters: vec![ParamDef {
                    name: "operation".into(),
                    kind: ParamKind::Dropdown,
                    default: json!("add"),
                    options: vec!["add".into(), "multiply".into()],
                }],
                inputs: vec![
                    PortDef { name: "a".into(), value_type: None },
                    PortDef { name: "b".into(), value_type: None },
                ],
                outputs: vec![PortDef { name: "out".into(), value_type: None }],
            },
            NodeTypeDef {
                title: RESULT_NODE_TYPE.into(),
                category: "Output".into(),
                parameters: vec![ParamDef {
                    name: RESULT_PARAM_NAME.into(),
                    kind: ParamKind::Text,
                    default: json!(""),
                    options: vec![],
                }],
                inputs: vec![PortDef { name: "in".into(), value_type: None }],
                outputs: vec![],
            },
        ]
    }

    fn editor() -> EditorState {
        let mut state = EditorState::new();
        state.load_catalog(catalog());
        state
    }

    fn anchor(node: &str, direction: Direction, name: &str) -> AnchorRef {
        AnchorRef { node_id: node.into(), direction, name: name.into() }
    }

    #[test]
    fn create_node_applies_parameter_defaults() {
        let mut state = editor();
        let id = state.create_node("Number Node", 10.0, 20.0).unwrap();
        let node = &state.nodes[&id];
        assert_eq!(node.params["value"], "5");
        assert_eq!((node.x, node.y), (10.0, 20.0));
    }

    #[test]
    fn create_node_rejects_unknown_type() {
        let mut state = editor();
        assert!(matches!(
            state.create_node("Bogus", 0.0, 0.0),
            Err(EditorError::DefinitionMissing(_))
        ));
    }

    #[test]
    fn node_ids_are_unique_even_after_restore() {
        let mut state = editor();
        let a = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let snap = state.snapshot();
        let b = state.create_node("Number Node", 0.0, 0.0).unwrap();
        state.restore(&snap);
        let c = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let mut ids = vec![a, b, c];
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn connect_requires_output_to_input() {
        let mut state = editor();
        let n1 = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let n2 = state.create_node("Math Node", 300.0, 0.0).unwrap();

        let out = anchor(&n1, Direction::Output, "out");
        let inp = anchor(&n2, Direction::Input, "a");
        assert!(state.connect(&out, &inp).is_ok());

        // Same-direction pairings are rejected regardless of order.
        let out2 = anchor(&n2, Direction::Output, "out");
        assert!(state.connect(&out, &out2).is_err());
        let inp2 = anchor(&n2, Direction::Input, "b");
        assert!(state.connect(&inp, &inp2).is_err());
    }

    #[test]
    fn connect_rejects_input_to_output_order() {
        let mut state = editor();
        let n1 = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let n2 = state.create_node("Math Node", 300.0, 0.0).unwrap();
        // A gesture that started on the input side commits nothing.
        let inp = anchor(&n2, Direction::Input, "a");
        let out = anchor(&n1, Direction::Output, "out");
        assert!(state.connect(&inp, &out).is_err());
        assert!(state.wires.is_empty());
    }

    #[test]
    fn connect_rejects_self_loop() {
        let mut state = editor();
        let n = state.create_node("Math Node", 0.0, 0.0).unwrap();
        let out = anchor(&n, Direction::Output, "out");
        let inp = anchor(&n, Direction::Input, "a");
        assert!(state.connect(&out, &inp).is_err());
    }

    #[test]
    fn occupied_input_replaces_existing_wire() {
        let mut state = editor();
        let n1 = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let n2 = state.create_node("Number Node", 0.0, 200.0).unwrap();
        let sink = state.create_node("Math Node", 300.0, 0.0).unwrap();

        let (first, replaced) = state
            .connect(&anchor(&n1, Direction::Output, "out"), &anchor(&sink, Direction::Input, "a"))
            .unwrap();
        assert_eq!(replaced, None);
        let (_, replaced) = state
            .connect(&anchor(&n2, Direction::Output, "out"), &anchor(&sink, Direction::Input, "a"))
            .unwrap();
        assert_eq!(replaced, Some(first));
        assert_eq!(state.wires.len(), 1);
        assert_eq!(state.wires[0].from_node, n2);
    }

    #[test]
    fn deleting_node_removes_attached_wires() {
        let mut state = editor();
        let n1 = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let n2 = state.create_node("Math Node", 300.0, 0.0).unwrap();
        state
            .connect(&anchor(&n1, Direction::Output, "out"), &anchor(&n2, Direction::Input, "a"))
            .unwrap();

        let removed = state.delete_nodes(&HashSet::from([n1.clone()]));
        assert_eq!(removed.len(), 1);
        assert!(state.wires.is_empty());
        assert!(!state.nodes.contains_key(&n1));
        assert!(state.nodes.contains_key(&n2));
    }

    #[test]
    fn moved_source_updates_cached_wire_start() {
        let mut state = editor();
        let n1 = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let n2 = state.create_node("Math Node", 300.0, 0.0).unwrap();
        let (id, _) = state
            .connect(&anchor(&n1, Direction::Output, "out"), &anchor(&n2, Direction::Input, "a"))
            .unwrap();
        let before = state.wire(id).unwrap().start_x;

        state.move_node(&n1, 50.0, 80.0);
        let dirty = state.refresh_wires_for(&n1);
        assert_eq!(dirty, vec![id]);
        assert_eq!(state.wire(id).unwrap().start_x, before + 50.0);

        // Moving the sink leaves the cached start untouched but still marks
        // the wire dirty; the live input end shifts instead.
        state.move_node(&n2, 400.0, 100.0);
        let dirty = state.refresh_wires_for(&n2);
        assert_eq!(dirty, vec![id]);
        assert_eq!(state.wire(id).unwrap().start_x, before + 50.0);
        let (_, _, ex, _) = state.wire_endpoints(state.wire(id).unwrap()).unwrap();
        assert_eq!(ex, 400.0);
    }

    #[test]
    fn group_delta_is_shared_and_clamped() {
        let mut state = editor();
        let a = state.create_node("Number Node", 10.0, 10.0).unwrap();
        let b = state.create_node("Number Node", 200.0, 300.0).unwrap();
        let origins = vec![(a.clone(), 10.0, 10.0), (b.clone(), 200.0, 300.0)];

        // Unconstrained move keeps relative offsets rigid.
        let (dx, dy) = state.clamp_group_delta(&origins, 40.0, 60.0);
        assert_eq!((dx, dy), (40.0, 60.0));
        state.apply_group_delta(&origins, dx, dy);
        let na = &state.nodes[&a];
        let nb = &state.nodes[&b];
        assert_eq!((nb.x - na.x, nb.y - na.y), (190.0, 290.0));

        // A delta that would push node `a` past the left edge is clamped for
        // the whole group.
        let (dx, _) = state.clamp_group_delta(&origins, -50.0, 0.0);
        assert_eq!(dx, -10.0);
    }

    #[test]
    fn shift_press_toggles_plain_press_replaces() {
        let mut state = editor();
        let a = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let b = state.create_node("Number Node", 200.0, 0.0).unwrap();

        state.select_on_press(&a, false);
        assert_eq!(state.selection, HashSet::from([a.clone()]));
        state.select_on_press(&b, true);
        assert_eq!(state.selection.len(), 2);
        state.select_on_press(&b, true);
        assert_eq!(state.selection, HashSet::from([a.clone()]));

        // Plain press on a selected member keeps the group.
        state.select_on_press(&b, true);
        state.select_on_press(&a, false);
        assert_eq!(state.selection.len(), 2);
        // Plain press on an outsider replaces it.
        let c = state.create_node("Number Node", 400.0, 0.0).unwrap();
        state.select_on_press(&c, false);
        assert_eq!(state.selection, HashSet::from([c]));
    }

    #[test]
    fn lasso_selects_only_fully_contained_nodes() {
        let mut state = editor();
        let a = state.create_node("Number Node", 10.0, 10.0).unwrap();
        let _b = state.create_node("Number Node", 500.0, 500.0).unwrap();
        // Node `a` is ~150x100; a marquee covering [0,300]^2 contains it.
        let marquee = Rect::from_corners(0.0, 0.0, 300.0, 300.0);
        state.lasso_select(&marquee, false);
        assert_eq!(state.selection, HashSet::from([a.clone()]));
        // A marquee cutting through `a` selects nothing.
        let marquee = Rect::from_corners(0.0, 0.0, 100.0, 100.0);
        state.lasso_select(&marquee, false);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn undo_redo_round_trips_the_graph() {
        let mut state = editor();
        let n1 = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let n2 = state.create_node("Math Node", 300.0, 0.0).unwrap();
        state
            .connect(&anchor(&n1, Direction::Output, "out"), &anchor(&n2, Direction::Input, "a"))
            .unwrap();
        let full = state.snapshot();

        state.push_undo();
        state.delete_nodes(&HashSet::from([n1.clone()]));
        assert_ne!(state.snapshot(), full);

        assert!(state.undo());
        assert_eq!(state.snapshot(), full);
        assert!(state.redo());
        assert!(!state.nodes.contains_key(&n1));
        assert!(state.undo());
        assert_eq!(state.snapshot(), full);
    }

    #[test]
    fn new_action_clears_redo_history() {
        let mut state = editor();
        state.create_node("Number Node", 0.0, 0.0).unwrap();
        state.push_undo();
        state.create_node("Number Node", 100.0, 0.0).unwrap();
        state.undo();
        assert!(state.can_redo());
        state.push_undo();
        state.create_node("Math Node", 0.0, 200.0).unwrap();
        assert!(!state.can_redo());
    }

    #[test]
    fn snapshot_restore_preserves_wires_and_params() {
        let mut state = editor();
        let n1 = state.create_node("Number Node", 5.0, 6.0).unwrap();
        let n2 = state.create_node("Math Node", 300.0, 0.0).unwrap();
        state.set_param(&n1, "value", "42".into());
        state
            .connect(&anchor(&n1, Direction::Output, "out"), &anchor(&n2, Direction::Input, "b"))
            .unwrap();
        let snap = state.snapshot();

        let mut other = editor();
        other.restore(&snap);
        assert_eq!(other.snapshot(), snap);
        assert_eq!(other.nodes[&n1].params["value"], "42");
        assert_eq!(other.wires.len(), 1);
        assert_eq!(other.wires[0].to_anchor, "b");
        // The restored wire's cached start matches the recomputed anchor.
        let expected = other
            .anchor_position(&anchor(&n1, Direction::Output, "out"))
            .unwrap();
        assert_eq!((other.wires[0].start_x, other.wires[0].start_y), expected);
    }

    #[test]
    fn restore_drops_wires_with_missing_endpoints() {
        let mut state = editor();
        let snap = GraphSnapshot {
            nodes: vec![],
            wires: vec![SavedWire {
                from_node: "node_9".into(),
                from_anchor: "out".into(),
                to_node: "node_10".into(),
                to_anchor: "a".into(),
            }],
        };
        state.restore(&snap);
        assert!(state.wires.is_empty());
    }

    #[test]
    fn submission_inverts_wires_into_connections() {
        let mut state = editor();
        let n1 = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let n2 = state.create_node("Number Node", 0.0, 200.0).unwrap();
        let m = state.create_node("Math Node", 300.0, 0.0).unwrap();
        let r = state.create_node(RESULT_NODE_TYPE, 600.0, 0.0).unwrap();
        state
            .connect(&anchor(&n1, Direction::Output, "out"), &anchor(&m, Direction::Input, "a"))
            .unwrap();
        state
            .connect(&anchor(&n2, Direction::Output, "out"), &anchor(&m, Direction::Input, "b"))
            .unwrap();
        state
            .connect(&anchor(&m, Direction::Output, "out"), &anchor(&r, Direction::Input, "in"))
            .unwrap();

        let payload = state.serialize_submission();
        let math = payload.nodes.iter().find(|n| n.id == m).unwrap();
        assert_eq!(math.connections["a"], n1);
        assert_eq!(math.connections["b"], n2);
        let result = payload.nodes.iter().find(|n| n.id == r).unwrap();
        assert_eq!(result.connections["in"], m);
        // Result nodes carry no parameters on submission.
        assert!(result.parameters.is_empty());
    }

    #[test]
    fn results_land_in_result_parameter() {
        let mut state = editor();
        let r = state.create_node(RESULT_NODE_TYPE, 0.0, 0.0).unwrap();
        let results = HashMap::from([
            (r.clone(), json!(12)),
            ("node_99".to_string(), json!("ignored")),
        ]);
        let updated = state.apply_results(&results);
        assert_eq!(updated, vec![r.clone()]);
        assert_eq!(state.nodes[&r].params[RESULT_PARAM_NAME], "12");
    }

    #[test]
    fn processing_highlight_is_idempotent() {
        let mut state = editor();
        let n = state.create_node("Number Node", 0.0, 0.0).unwrap();
        assert!(state.set_processing(Some(n.clone())));
        assert!(!state.set_processing(Some(n.clone())));
        assert!(state.set_processing(None));
        assert!(!state.set_processing(None));
    }

    #[test]
    fn processing_highlight_moves_between_nodes() {
        let mut state = editor();
        let a = state.create_node("Number Node", 0.0, 0.0).unwrap();
        let b = state.create_node("Number Node", 0.0, 200.0).unwrap();
        state.set_processing(Some(a));
        assert!(state.set_processing(Some(b.clone())));
        assert_eq!(state.processing_node, Some(b));
    }

    #[test]
    fn anchor_hit_test_uses_radius() {
        let mut state = editor();
        let n = state.create_node("Math Node", 100.0, 100.0).unwrap();
        let (ax, ay) = state
            .anchor_position(&anchor(&n, Direction::Input, "a"))
            .unwrap();
        assert_eq!(
            state.anchor_at(ax + ANCHOR_HIT_RADIUS - 0.5, ay),
            Some(anchor(&n, Direction::Input, "a"))
        );
        assert_eq!(state.anchor_at(ax + ANCHOR_HIT_RADIUS + 1.0, ay + ANCHOR_HIT_RADIUS), None);
    }

    #[test]
    fn dirty_tracking_follows_saves() {
        let mut state = editor();
        assert!(!state.is_dirty());
        state.create_node("Number Node", 0.0, 0.0).unwrap();
        assert!(state.is_dirty());
        state.mark_saved();
        assert!(!state.is_dirty());
        state.create_node("Number Node", 100.0, 0.0).unwrap();
        assert!(state.is_dirty());
    }
}
