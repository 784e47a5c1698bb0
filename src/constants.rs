// Layout and view constants - the single source of truth for node geometry.

/// Fixed node width in logical pixels.
pub const NODE_WIDTH: f64 = 150.0;
/// Height of the node title bar.
pub const TITLE_HEIGHT: f64 = 30.0;
/// Y coordinate (within the node) where the first anchor row starts.
pub const ANCHOR_AREA_TOP: f64 = 35.0;
/// Vertical pitch between anchor rows.
pub const ANCHOR_SPACING: f64 = 20.0;
/// Rendered size of an anchor dot (square hit target).
pub const ANCHOR_SIZE: f64 = 16.0;
/// Height of a single parameter field row.
pub const FIELD_ROW_HEIGHT: f64 = 25.0;
/// Padding below the parameter field area.
pub const FIELD_AREA_PADDING: f64 = 10.0;

/// Logical distance within which a pointer-up "hits" an anchor.
pub const ANCHOR_HIT_RADIUS: f64 = 12.0;

/// Workflow bounds: node bounding boxes are kept inside
/// [0, WORKFLOW_WIDTH] x [0, WORKFLOW_HEIGHT] during group drags.
pub const WORKFLOW_WIDTH: f64 = 4000.0;
pub const WORKFLOW_HEIGHT: f64 = 4000.0;

// Zoom limits and per-wheel-event step factors.
pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 4.0;
pub const ZOOM_IN_FACTOR: f64 = 1.1;
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// The node type whose parameter fields are read-only outputs of execution.
pub const RESULT_NODE_TYPE: &str = "Result Node";
/// Name of the parameter on a result node that receives the execution value.
pub const RESULT_PARAM_NAME: &str = "result";
