//! Pure coordinate and layout math.
//!
//! Everything that converts between screen space and logical workflow space
//! lives here, so dragging, wiring and drop placement all route through the
//! same two functions and stay correct under any pan/zoom. No DOM access.

use crate::constants::*;
use crate::models::{Direction, NodeTypeDef, WorkflowNode};

/// Pan offset and zoom factor applied to the workflow container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { zoom: 1.0, pan_x: 0.0, pan_y: 0.0 }
    }
}

/// Convert a canvas-relative screen point to logical workflow coordinates.
pub fn to_logical(view: &ViewTransform, sx: f64, sy: f64) -> (f64, f64) {
    ((sx - view.pan_x) / view.zoom, (sy - view.pan_y) / view.zoom)
}

/// Inverse of [`to_logical`].
pub fn to_screen(view: &ViewTransform, lx: f64, ly: f64) -> (f64, f64) {
    (lx * view.zoom + view.pan_x, ly * view.zoom + view.pan_y)
}

/// Apply one wheel step about a canvas-relative cursor position. The pan is
/// adjusted so the logical point under the cursor is unchanged by the zoom.
pub fn zoom_about(view: &ViewTransform, cursor_x: f64, cursor_y: f64, zoom_in: bool) -> ViewTransform {
    let factor = if zoom_in { ZOOM_IN_FACTOR } else { ZOOM_OUT_FACTOR };
    let new_zoom = (view.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    ViewTransform {
        zoom: new_zoom,
        pan_x: view.pan_x - (new_zoom - view.zoom) * (cursor_x - view.pan_x) / view.zoom,
        pan_y: view.pan_y - (new_zoom - view.zoom) * (cursor_y - view.pan_y) / view.zoom,
    }
}

// ---------------------------------------------------------------------------
// Node layout
// ---------------------------------------------------------------------------

/// Height of the parameter field area for a given field count.
pub fn field_area_height(num_fields: usize) -> f64 {
    num_fields as f64 * FIELD_ROW_HEIGHT + FIELD_AREA_PADDING
}

/// Total node height: title bar + anchor rows + field area.
pub fn node_height(def: &NodeTypeDef) -> f64 {
    let max_anchors = def.inputs.len().max(def.outputs.len());
    TITLE_HEIGHT + max_anchors as f64 * ANCHOR_SPACING + field_area_height(def.parameters.len())
}

/// Y offset (within the node) of the anchor row at `index`.
pub fn anchor_row_top(index: usize) -> f64 {
    ANCHOR_AREA_TOP + index as f64 * ANCHOR_SPACING
}

/// Center of an anchor in logical workflow coordinates. Input anchors sit on
/// the node's left edge, output anchors on its right edge.
pub fn anchor_center(node: &WorkflowNode, direction: Direction, index: usize) -> (f64, f64) {
    let x = match direction {
        Direction::Input => node.x,
        Direction::Output => node.x + NODE_WIDTH,
    };
    (x, node.y + anchor_row_top(index) + ANCHOR_SIZE / 2.0)
}

/// Axis-aligned bounding box in logical coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (x, w) = if x1 <= x2 { (x1, x2 - x1) } else { (x2, x1 - x2) };
        let (y, h) = if y1 <= y2 { (y1, y2 - y1) } else { (y2, y1 - y2) };
        Rect { x, y, width: w, height: h }
    }

    /// True when `other` lies fully inside `self` (lasso containment rule).
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }
}

pub fn node_rect(node: &WorkflowNode, def: &NodeTypeDef) -> Rect {
    Rect { x: node.x, y: node.y, width: NODE_WIDTH, height: node_height(def) }
}

// ---------------------------------------------------------------------------
// Wire path geometry
// ---------------------------------------------------------------------------

/// S-shaped cubic Bezier path between two logical points, as an SVG `d`
/// attribute string.
pub fn wire_path(x1: f64, y1: f64, x2: f64, y2: f64) -> String {
    let dx = (x2 - x1) * 0.5;
    format!(
        "M {} {} C {} {}, {} {}, {} {}",
        x1, y1, x1 + dx, y1, x2 - dx, y2, x2, y2
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PortDef;
    use proptest::prelude::*;

    fn def_with(inputs: usize, outputs: usize, params: usize) -> NodeTypeDef {
        let port = |i: usize| PortDef { name: format!("p{}", i), value_type: None };
        NodeTypeDef {
            title: "T".into(),
            category: "Test".into(),
            parameters: (0..params)
                .map(|i| crate::models::ParamDef {
                    name: format!("f{}", i),
                    kind: crate::models::ParamKind::Int,
                    default: serde_json::json!(0),
                    options: vec![],
                })
                .collect(),
            inputs: (0..inputs).map(port).collect(),
            outputs: (0..outputs).map(port).collect(),
        }
    }

    #[test]
    fn round_trip_identity() {
        let view = ViewTransform { zoom: 1.7, pan_x: -240.0, pan_y: 96.5 };
        let (lx, ly) = to_logical(&view, 123.4, -56.7);
        let (sx, sy) = to_screen(&view, lx, ly);
        assert!((sx - 123.4).abs() < 1e-9);
        assert!((sy + 56.7).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn round_trip_identity_any_transform(
            zoom in MIN_ZOOM..MAX_ZOOM,
            pan_x in -5000.0f64..5000.0,
            pan_y in -5000.0f64..5000.0,
            sx in -2000.0f64..2000.0,
            sy in -2000.0f64..2000.0,
        ) {
            let view = ViewTransform { zoom, pan_x, pan_y };
            let (lx, ly) = to_logical(&view, sx, sy);
            let (rx, ry) = to_screen(&view, lx, ly);
            prop_assert!((rx - sx).abs() < 1e-6);
            prop_assert!((ry - sy).abs() < 1e-6);
        }

        #[test]
        fn zoom_keeps_cursor_point_fixed(
            zoom in 0.3f64..3.0,
            pan_x in -1000.0f64..1000.0,
            pan_y in -1000.0f64..1000.0,
            cx in 0.0f64..1600.0,
            cy in 0.0f64..900.0,
            zoom_in in any::<bool>(),
        ) {
            let view = ViewTransform { zoom, pan_x, pan_y };
            let before = to_logical(&view, cx, cy);
            let after_view = zoom_about(&view, cx, cy, zoom_in);
            let after = to_logical(&after_view, cx, cy);
            prop_assert!((before.0 - after.0).abs() < 1e-6);
            prop_assert!((before.1 - after.1).abs() < 1e-6);
        }
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewTransform { zoom: MAX_ZOOM, ..Default::default() };
        view = zoom_about(&view, 100.0, 100.0, true);
        assert_eq!(view.zoom, MAX_ZOOM);
        view.zoom = MIN_ZOOM;
        view = zoom_about(&view, 100.0, 100.0, false);
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn node_height_follows_ports_and_fields() {
        // 2 inputs vs 1 output -> two anchor rows; 3 fields.
        let def = def_with(2, 1, 3);
        assert_eq!(
            node_height(&def),
            TITLE_HEIGHT + 2.0 * ANCHOR_SPACING + 3.0 * FIELD_ROW_HEIGHT + FIELD_AREA_PADDING
        );
    }

    #[test]
    fn anchor_centers_sit_on_node_edges() {
        let node = WorkflowNode {
            id: "node_1".into(),
            type_name: "T".into(),
            x: 40.0,
            y: 60.0,
            params: Default::default(),
        };
        let (ix, iy) = anchor_center(&node, Direction::Input, 0);
        assert_eq!(ix, 40.0);
        assert_eq!(iy, 60.0 + ANCHOR_AREA_TOP + ANCHOR_SIZE / 2.0);
        let (ox, oy) = anchor_center(&node, Direction::Output, 1);
        assert_eq!(ox, 40.0 + NODE_WIDTH);
        assert_eq!(oy, 60.0 + ANCHOR_AREA_TOP + ANCHOR_SPACING + ANCHOR_SIZE / 2.0);
    }

    #[test]
    fn rect_containment_is_full_not_partial() {
        let marquee = Rect::from_corners(0.0, 0.0, 100.0, 100.0);
        let inside = Rect { x: 10.0, y: 10.0, width: 50.0, height: 50.0 };
        let partial = Rect { x: 80.0, y: 80.0, width: 50.0, height: 50.0 };
        assert!(marquee.contains(&inside));
        assert!(!marquee.contains(&partial));
    }

    #[test]
    fn wire_path_is_symmetric_bezier() {
        let d = wire_path(0.0, 0.0, 100.0, 40.0);
        assert_eq!(d, "M 0 0 C 50 0, 50 40, 100 40");
    }
}
