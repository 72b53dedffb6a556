//! Partial state updates.
//!
//! A [`FlowStateUpdate`] is the unit of negotiation inside the update
//! pipeline: entities to add, partial-by-id patches, ids to remove, and a
//! metadata patch. The full state is only produced at commit time by
//! [`FlowState::apply`], which clones — states are never mutated in place.
//!
//! Patch fields use `Option<T>` for "set" and `Option<Option<T>>` where a
//! field is clearable (e.g. removing a node's `group_id`).

use crate::geometry::{Point, Size};
use crate::id::Id;
use crate::model::{Edge, EdgeLabel, FlowState, Metadata, Node, Port, Routing, Viewport};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

// ─── Patches ─────────────────────────────────────────────────────────────

/// Partial-by-id update for a node. Unset fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    pub id: Id,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default)]
    pub group_id: Option<Option<Id>>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default)]
    pub z_order: Option<Option<i32>>,
    #[serde(default)]
    pub computed_z_index: Option<i32>,
    #[serde(default)]
    pub ports: Option<SmallVec<[Port; 4]>>,
}

// Interned ids have no natural default; an empty-id patch simply matches
// nothing when applied. It exists so `..Default::default()` struct
// updates stay ergonomic at patch-construction sites.
impl Default for NodePatch {
    fn default() -> Self {
        Self::new(Id::intern(""))
    }
}

impl NodePatch {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            position: None,
            size: None,
            angle: None,
            group_id: None,
            data: None,
            selected: None,
            z_order: None,
            computed_z_index: None,
            ports: None,
        }
    }

    pub fn apply_to(&self, node: &mut Node) {
        if let Some(p) = self.position {
            node.position = p;
        }
        if let Some(s) = self.size {
            node.size = Some(s);
        }
        if let Some(a) = self.angle {
            node.angle = Some(a);
        }
        if let Some(g) = self.group_id {
            node.group_id = g;
        }
        if let Some(d) = &self.data {
            node.data = d.clone();
        }
        if let Some(s) = self.selected {
            node.selected = s;
        }
        if let Some(z) = self.z_order {
            node.z_order = z;
        }
        if let Some(z) = self.computed_z_index {
            node.computed_z_index = z;
        }
        if let Some(ports) = &self.ports {
            node.ports = ports.clone();
        }
    }
}

/// Partial-by-id update for an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePatch {
    pub id: Id,
    #[serde(default)]
    pub source: Option<Option<Id>>,
    #[serde(default)]
    pub target: Option<Option<Id>>,
    #[serde(default)]
    pub source_port: Option<Option<Id>>,
    #[serde(default)]
    pub target_port: Option<Option<Id>>,
    #[serde(default)]
    pub source_position: Option<Option<Point>>,
    #[serde(default)]
    pub target_position: Option<Option<Point>>,
    #[serde(default)]
    pub points: Option<SmallVec<[Point; 8]>>,
    #[serde(default)]
    pub routing: Option<Routing>,
    #[serde(default)]
    pub labels: Option<SmallVec<[EdgeLabel; 2]>>,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default)]
    pub z_order: Option<Option<i32>>,
    #[serde(default)]
    pub computed_z_index: Option<i32>,
}

impl Default for EdgePatch {
    fn default() -> Self {
        Self::new(Id::intern(""))
    }
}

impl EdgePatch {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            source: None,
            target: None,
            source_port: None,
            target_port: None,
            source_position: None,
            target_position: None,
            points: None,
            routing: None,
            labels: None,
            selected: None,
            z_order: None,
            computed_z_index: None,
        }
    }

    pub fn apply_to(&self, edge: &mut Edge) {
        if let Some(s) = self.source {
            edge.source = s;
        }
        if let Some(t) = self.target {
            edge.target = t;
        }
        if let Some(p) = self.source_port {
            edge.source_port = p;
        }
        if let Some(p) = self.target_port {
            edge.target_port = p;
        }
        if let Some(p) = self.source_position {
            edge.source_position = p;
        }
        if let Some(p) = self.target_position {
            edge.target_position = p;
        }
        if let Some(pts) = &self.points {
            edge.points = pts.clone();
        }
        if let Some(r) = &self.routing {
            edge.routing = r.clone();
        }
        if let Some(labels) = &self.labels {
            edge.labels = labels.clone();
        }
        if let Some(s) = self.selected {
            edge.selected = s;
        }
        if let Some(z) = self.z_order {
            edge.z_order = z;
        }
        if let Some(z) = self.computed_z_index {
            edge.computed_z_index = z;
        }
    }
}

/// Partial viewport update.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportPatch {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub zoom: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl ViewportPatch {
    pub fn apply_to(&self, viewport: &mut Viewport) {
        if let Some(x) = self.x {
            viewport.x = x;
        }
        if let Some(y) = self.y {
            viewport.y = y;
        }
        if let Some(z) = self.zoom {
            viewport.zoom = z;
        }
        if let Some(w) = self.width {
            viewport.width = Some(w);
        }
        if let Some(h) = self.height {
            viewport.height = Some(h);
        }
    }
}

/// Partial metadata update. Middleware entries merge key-by-key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(default)]
    pub viewport: Option<ViewportPatch>,
    #[serde(default)]
    pub middleware: BTreeMap<String, serde_json::Value>,
}

impl MetadataPatch {
    pub fn apply_to(&self, metadata: &mut Metadata) {
        if let Some(vp) = &self.viewport {
            vp.apply_to(&mut metadata.viewport);
        }
        for (key, value) in &self.middleware {
            metadata.middleware.insert(key.clone(), value.clone());
        }
    }

    fn merge(&mut self, other: MetadataPatch) {
        match (&mut self.viewport, other.viewport) {
            (Some(mine), Some(theirs)) => {
                if theirs.x.is_some() {
                    mine.x = theirs.x;
                }
                if theirs.y.is_some() {
                    mine.y = theirs.y;
                }
                if theirs.zoom.is_some() {
                    mine.zoom = theirs.zoom;
                }
                if theirs.width.is_some() {
                    mine.width = theirs.width;
                }
                if theirs.height.is_some() {
                    mine.height = theirs.height;
                }
            }
            (None, Some(theirs)) => self.viewport = Some(theirs),
            _ => {}
        }
        self.middleware.extend(other.middleware);
    }
}

// ─── FlowStateUpdate ─────────────────────────────────────────────────────

/// The diff object negotiated through the pipeline.
///
/// Apply order: adds, patches (in list order — the same id may legally be
/// patched twice in one update), removals, metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowStateUpdate {
    #[serde(default)]
    pub nodes_to_add: Vec<Node>,
    #[serde(default)]
    pub edges_to_add: Vec<Edge>,
    #[serde(default)]
    pub node_patches: Vec<NodePatch>,
    #[serde(default)]
    pub edge_patches: Vec<EdgePatch>,
    #[serde(default)]
    pub nodes_to_remove: Vec<Id>,
    #[serde(default)]
    pub edges_to_remove: Vec<Id>,
    #[serde(default)]
    pub metadata: Option<MetadataPatch>,
}

impl FlowStateUpdate {
    pub fn is_empty(&self) -> bool {
        self.nodes_to_add.is_empty()
            && self.edges_to_add.is_empty()
            && self.node_patches.is_empty()
            && self.edge_patches.is_empty()
            && self.nodes_to_remove.is_empty()
            && self.edges_to_remove.is_empty()
            && self.metadata.is_none()
    }

    pub fn from_node_patches(patches: Vec<NodePatch>) -> Self {
        Self { node_patches: patches, ..Default::default() }
    }

    pub fn from_edge_patches(patches: Vec<EdgePatch>) -> Self {
        Self { edge_patches: patches, ..Default::default() }
    }

    pub fn from_metadata(patch: MetadataPatch) -> Self {
        Self { metadata: Some(patch), ..Default::default() }
    }

    /// Append `other` after this update's own entries. Used by the
    /// pipeline to accumulate middleware amendments in order.
    pub fn merge(&mut self, other: FlowStateUpdate) {
        self.nodes_to_add.extend(other.nodes_to_add);
        self.edges_to_add.extend(other.edges_to_add);
        self.node_patches.extend(other.node_patches);
        self.edge_patches.extend(other.edge_patches);
        self.nodes_to_remove.extend(other.nodes_to_remove);
        self.edges_to_remove.extend(other.edges_to_remove);
        match (&mut self.metadata, other.metadata) {
            (Some(mine), Some(theirs)) => mine.merge(theirs),
            (None, Some(theirs)) => self.metadata = Some(theirs),
            _ => {}
        }
    }
}

impl FlowState {
    /// Produce the successor state with `update` applied. Copy-on-write:
    /// `self` is left untouched.
    #[must_use]
    pub fn apply(&self, update: &FlowStateUpdate) -> FlowState {
        let mut next = self.clone();

        next.nodes.extend(update.nodes_to_add.iter().cloned());
        next.edges.extend(update.edges_to_add.iter().cloned());

        for patch in &update.node_patches {
            if let Some(node) = next.nodes.iter_mut().find(|n| n.id == patch.id) {
                patch.apply_to(node);
            }
        }
        for patch in &update.edge_patches {
            if let Some(edge) = next.edges.iter_mut().find(|e| e.id == patch.id) {
                patch.apply_to(edge);
            }
        }

        if !update.nodes_to_remove.is_empty() {
            next.nodes.retain(|n| !update.nodes_to_remove.contains(&n.id));
        }
        if !update.edges_to_remove.is_empty() {
            next.edges.retain(|e| !update.edges_to_remove.contains(&e.id));
        }

        if let Some(patch) = &update.metadata {
            patch.apply_to(&mut next.metadata);
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use pretty_assertions::assert_eq;

    fn base() -> FlowState {
        let mut state = FlowState::default();
        let mut a = Node::new(Id::intern("a"), Point::new(0.0, 0.0));
        a.size = Some(Size::new(10.0, 10.0));
        state.nodes.push(a);
        state.nodes.push(Node::new(Id::intern("b"), Point::new(50.0, 0.0)));
        state
    }

    #[test]
    fn apply_leaves_original_untouched() {
        let state = base();
        let update = FlowStateUpdate::from_node_patches(vec![NodePatch {
            id: Id::intern("a"),
            position: Some(Point::new(99.0, 0.0)),
            ..Default::default()
        }]);

        let next = state.apply(&update);
        assert_eq!(state.node(Id::intern("a")).unwrap().position, Point::ZERO);
        assert_eq!(next.node(Id::intern("a")).unwrap().position, Point::new(99.0, 0.0));
    }

    #[test]
    fn patches_apply_in_list_order() {
        let state = base();
        let id = Id::intern("a");
        let update = FlowStateUpdate::from_node_patches(vec![
            NodePatch { id, computed_z_index: Some(5), ..Default::default() },
            NodePatch { id, computed_z_index: Some(7), ..Default::default() },
        ]);
        assert_eq!(state.apply(&update).node(id).unwrap().computed_z_index, 7);
    }

    #[test]
    fn clearable_fields_distinguish_unset_from_clear() {
        let mut state = base();
        state.nodes[1].group_id = Some(Id::intern("a"));

        // Unset: group survives.
        let keep = FlowStateUpdate::from_node_patches(vec![NodePatch::new(Id::intern("b"))]);
        assert_eq!(state.apply(&keep).node(Id::intern("b")).unwrap().group_id, Some(Id::intern("a")));

        // Explicit clear.
        let clear = FlowStateUpdate::from_node_patches(vec![NodePatch {
            id: Id::intern("b"),
            group_id: Some(None),
            ..Default::default()
        }]);
        assert_eq!(state.apply(&clear).node(Id::intern("b")).unwrap().group_id, None);
    }

    #[test]
    fn removals_drop_entities() {
        let state = base();
        let update = FlowStateUpdate {
            nodes_to_remove: vec![Id::intern("b")],
            ..Default::default()
        };
        let next = state.apply(&update);
        assert_eq!(next.nodes.len(), 1);
        assert!(next.node(Id::intern("b")).is_none());
    }

    #[test]
    fn metadata_patch_merges_viewport_and_keys() {
        let state = base();
        let mut patch = MetadataPatch {
            viewport: Some(ViewportPatch { x: Some(10.0), ..Default::default() }),
            ..Default::default()
        };
        patch.middleware.insert("zIndex".into(), serde_json::json!({"selected": 1000}));

        let next = state.apply(&FlowStateUpdate::from_metadata(patch));
        assert_eq!(next.metadata.viewport.x, 10.0);
        assert_eq!(next.metadata.viewport.zoom, 1.0);
        assert!(next.metadata.middleware.contains_key("zIndex"));
    }

    #[test]
    fn merge_keeps_later_metadata_keys() {
        let mut a = FlowStateUpdate::from_metadata(MetadataPatch {
            viewport: Some(ViewportPatch { x: Some(1.0), y: Some(1.0), ..Default::default() }),
            ..Default::default()
        });
        let b = FlowStateUpdate::from_metadata(MetadataPatch {
            viewport: Some(ViewportPatch { x: Some(2.0), ..Default::default() }),
            ..Default::default()
        });
        a.merge(b);
        let vp = a.metadata.unwrap().viewport.unwrap();
        assert_eq!(vp.x, Some(2.0));
        assert_eq!(vp.y, Some(1.0));
    }
}
