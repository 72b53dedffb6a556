//! Diagram state model.
//!
//! `FlowState` is the committed snapshot of a diagram: nodes, edges and
//! metadata (viewport + per-middleware configuration). It is treated as a
//! value — every mutation goes through a [`crate::update::FlowStateUpdate`]
//! and produces a *new* state; nothing mutates a received state in place.
//!
//! Fields prefixed `computed_`/derived measurement fields (`computed_z_index`,
//! port `position`/`size`, label `position`) are owned by the update
//! pipeline. Command payloads never write them directly.

use crate::geometry::{Point, Rect, Side, Size};
use crate::id::Id;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

// ─── Ports ───────────────────────────────────────────────────────────────

/// A named attachment point on one face of a node.
///
/// `position`/`size` are measurement-derived (reported by the host after
/// layout) and describe the port's center anchor in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: Id,
    pub side: Side,
    pub node_id: Id,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub size: Option<Size>,
}

impl Port {
    pub fn new(id: Id, side: Side, node_id: Id) -> Self {
        Self { id, side, node_id, position: None, size: None }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A diagram vertex: a box on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: Id,

    /// Top-left corner in canvas coordinates.
    pub position: Point,

    /// Measured or declared size. `None` until the host reports layout.
    #[serde(default)]
    pub size: Option<Size>,

    /// Rotation in degrees, clockwise, about the node center.
    #[serde(default)]
    pub angle: Option<f64>,

    /// Parent group node. Chains must stay acyclic.
    #[serde(default)]
    pub group_id: Option<Id>,

    /// Opaque host payload (template data, domain model, …).
    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(default)]
    pub selected: bool,

    /// Explicit, user-set stacking order. Wins over every derived rule.
    #[serde(default)]
    pub z_order: Option<i32>,

    /// Derived stacking order. Written only by the pipeline.
    #[serde(default)]
    pub computed_z_index: i32,

    /// Measured ports. Written via the port-measurement command.
    #[serde(default)]
    pub ports: SmallVec<[Port; 4]>,
}

impl Node {
    pub fn new(id: Id, position: Point) -> Self {
        Self {
            id,
            position,
            size: None,
            angle: None,
            group_id: None,
            data: serde_json::Value::Null,
            selected: false,
            z_order: None,
            computed_z_index: 0,
            ports: SmallVec::new(),
        }
    }

    /// Bounding rect; zero-sized while unmeasured.
    pub fn rect(&self) -> Rect {
        Rect::from_point_size(self.position, self.size.unwrap_or_default())
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    pub fn port(&self, id: Id) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == id)
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// How an edge's path is computed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Routing {
    #[default]
    Straight,
    Orthogonal,
    /// External router; the engine leaves `points` untouched.
    Custom(String),
}

/// Where a label sits along its edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPlacement {
    /// Fraction of total path length in `[0, 1]`.
    Relative(f64),
    /// Signed pixel distance along the path (negative = from the end).
    Absolute(f64),
}

/// An edge label. `position`/`size` are measurement/pipeline-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeLabel {
    pub id: Id,
    pub placement: LabelPlacement,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub size: Option<Size>,
}

/// A connector between two endpoints.
///
/// An endpoint is either a node (optionally a specific port on it) or,
/// when the id is `None`, a free-floating explicit position — used for
/// provisional edges while linking and for detached connectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: Id,

    #[serde(default)]
    pub source: Option<Id>,
    #[serde(default)]
    pub target: Option<Id>,

    #[serde(default)]
    pub source_port: Option<Id>,
    #[serde(default)]
    pub target_port: Option<Id>,

    /// Required when the matching endpoint id is `None`.
    #[serde(default)]
    pub source_position: Option<Point>,
    #[serde(default)]
    pub target_position: Option<Point>,

    /// Polyline/curve control points. Derived by the routing middleware
    /// except for `Routing::Custom` edges.
    #[serde(default)]
    pub points: SmallVec<[Point; 8]>,

    #[serde(default)]
    pub routing: Routing,

    #[serde(default)]
    pub labels: SmallVec<[EdgeLabel; 2]>,

    #[serde(default)]
    pub selected: bool,

    #[serde(default)]
    pub z_order: Option<i32>,

    /// Derived stacking order. Written only by the pipeline.
    #[serde(default)]
    pub computed_z_index: i32,
}

impl Edge {
    pub fn new(id: Id, source: Option<Id>, target: Option<Id>) -> Self {
        Self {
            id,
            source,
            target,
            source_port: None,
            target_port: None,
            source_position: None,
            target_position: None,
            points: SmallVec::new(),
            routing: Routing::default(),
            labels: SmallVec::new(),
            selected: false,
            z_order: None,
            computed_z_index: 0,
        }
    }

    /// A detached endpoint must carry an explicit position.
    pub fn endpoints_valid(&self) -> bool {
        (self.source.is_some() || self.source_position.is_some())
            && (self.target.is_some() || self.target_position.is_some())
    }
}

// ─── Viewport & metadata ─────────────────────────────────────────────────

/// Pan offset + zoom + measured canvas dimensions.
///
/// A world point `w` appears on screen at `w * zoom + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0, width: None, height: None }
    }
}

impl Viewport {
    /// Visible world-space rect, when the canvas has been measured.
    pub fn visible_rect(&self) -> Option<Rect> {
        let (w, h) = (self.width?, self.height?);
        Some(Rect::new(
            -self.x / self.zoom,
            -self.y / self.zoom,
            w / self.zoom,
            h / self.zoom,
        ))
    }
}

/// Diagram metadata: the viewport plus a per-middleware scratch map.
/// Middlewares read and amend their own entry, keyed by middleware name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub middleware: BTreeMap<String, serde_json::Value>,
}

// ─── FlowState ───────────────────────────────────────────────────────────

/// The complete committed diagram state. Value semantics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowState {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub metadata: Metadata,
}

impl FlowState {
    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: Id) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn selected_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.selected)
    }

    pub fn selected_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.selected)
    }

    /// Edges touching any of `ids` on either endpoint.
    pub fn edges_connected_to<'a>(&'a self, ids: &'a [Id]) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| {
            e.source.is_some_and(|s| ids.contains(&s)) || e.target.is_some_and(|t| ids.contains(&t))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_rect_unmeasured_is_zero_sized() {
        let n = Node::new(Id::intern("a"), Point::new(5.0, 5.0));
        assert_eq!(n.rect(), Rect::new(5.0, 5.0, 0.0, 0.0));
        assert_eq!(n.center(), Point::new(5.0, 5.0));
    }

    #[test]
    fn detached_endpoint_needs_position() {
        let mut e = Edge::new(Id::intern("e1"), None, Some(Id::intern("b")));
        assert!(!e.endpoints_valid());
        e.source_position = Some(Point::new(1.0, 2.0));
        assert!(e.endpoints_valid());
    }

    #[test]
    fn visible_rect_accounts_for_pan_and_zoom() {
        let vp = Viewport { x: -100.0, y: 50.0, zoom: 2.0, width: Some(800.0), height: Some(600.0) };
        let r = vp.visible_rect().unwrap();
        assert_eq!(r, Rect::new(50.0, -25.0, 400.0, 300.0));

        let unmeasured = Viewport::default();
        assert!(unmeasured.visible_rect().is_none());
    }

    #[test]
    fn state_roundtrips_through_json() {
        let mut state = FlowState::default();
        let mut n = Node::new(Id::intern("n1"), Point::new(10.0, 20.0));
        n.size = Some(Size::new(100.0, 40.0));
        state.nodes.push(n);
        state.edges.push(Edge::new(Id::intern("e1"), Some(Id::intern("n1")), None));
        state.edges[0].target_position = Some(Point::new(200.0, 60.0));

        let json = serde_json::to_value(&state).unwrap();
        let back: FlowState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
