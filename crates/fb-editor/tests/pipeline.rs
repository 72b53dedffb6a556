//! Pipeline + built-in middleware behavior against realistic states.

use fb_core::update::{FlowStateUpdate, NodePatch};
use fb_core::{FlowConfig, FlowState, Id, Node, Point, Routing, Size};
use fb_editor::env::{Environment, Platform};
use fb_editor::middleware::{MeasurementMiddleware, RoutingMiddleware, ZIndexMiddleware};
use fb_editor::pipeline::PipelineContext;
use fb_editor::{Middleware, Verdict};
use pretty_assertions::assert_eq;

fn env() -> Environment {
    Environment::new(Platform::Linux)
}

fn node(id: &str, x: f64, y: f64, size: Option<Size>) -> Node {
    let mut n = Node::new(Id::intern(id), Point::new(x, y));
    n.size = size;
    n
}

/// Run a single middleware over (base → base+update) and return its
/// amendment, if any.
fn amend(
    middleware: &mut dyn Middleware,
    base: &FlowState,
    update: FlowStateUpdate,
    action: &str,
    config: &FlowConfig,
) -> Option<FlowStateUpdate> {
    let candidate = base.apply(&update);
    let environment = env();
    let ctx = PipelineContext::new(base, &candidate, action, config, &environment, &[]);
    match middleware.process(&ctx) {
        Verdict::Advance(amendment) => amendment,
        Verdict::Cancel => panic!("built-in middlewares never cancel"),
    }
}

// ─── Z-index ─────────────────────────────────────────────────────────────

#[test]
fn selection_elevates_and_deselection_falls_back() {
    let config = FlowConfig::default();
    let mut base = FlowState::default();
    base.nodes.push(node("za", 0.0, 0.0, None));

    // Select → configured selected index.
    let select = FlowStateUpdate::from_node_patches(vec![NodePatch {
        id: Id::intern("za"),
        selected: Some(true),
        ..Default::default()
    }]);
    let out = amend(&mut ZIndexMiddleware, &base, select, "select", &config).unwrap();
    assert_eq!(out.node_patches.len(), 1);
    assert_eq!(out.node_patches[0].computed_z_index, Some(config.z_index.selected_z_index));

    // Deselect from an elevated state → back to base index.
    base.nodes[0].selected = true;
    base.nodes[0].computed_z_index = config.z_index.selected_z_index;
    let deselect = FlowStateUpdate::from_node_patches(vec![NodePatch {
        id: Id::intern("za"),
        selected: Some(false),
        ..Default::default()
    }]);
    let out = amend(&mut ZIndexMiddleware, &base, deselect, "deselect", &config).unwrap();
    assert_eq!(out.node_patches[0].computed_z_index, Some(0));
}

#[test]
fn grouped_node_sits_one_above_its_parent() {
    let config = FlowConfig::default();
    let mut base = FlowState::default();
    let mut parent = node("zp", 0.0, 0.0, None);
    parent.computed_z_index = 3;
    base.nodes.push(parent);
    base.nodes.push(node("zc", 10.0, 10.0, None));

    let join = FlowStateUpdate::from_node_patches(vec![NodePatch {
        id: Id::intern("zc"),
        group_id: Some(Some(Id::intern("zp"))),
        ..Default::default()
    }]);
    let out = amend(&mut ZIndexMiddleware, &base, join, "setGroup", &config).unwrap();
    let child = out.node_patches.iter().find(|p| p.id == Id::intern("zc")).unwrap();
    assert_eq!(child.computed_z_index, Some(4));
}

#[test]
fn explicit_z_order_overrides_previous_processing() {
    // A node whose selection AND z_order change in one invocation is
    // assigned twice: once by the automatic pass, once by the explicit
    // pass, which is not gated by the processed set. Both entries carry
    // the same final value — documented behavior.
    let config = FlowConfig::default();
    let mut base = FlowState::default();
    base.nodes.push(node("zd", 0.0, 0.0, None));

    let update = FlowStateUpdate::from_node_patches(vec![NodePatch {
        id: Id::intern("zd"),
        selected: Some(true),
        z_order: Some(Some(7)),
        ..Default::default()
    }]);
    let out = amend(&mut ZIndexMiddleware, &base, update, "updateNode", &config).unwrap();

    let entries: Vec<_> =
        out.node_patches.iter().filter(|p| p.id == Id::intern("zd")).collect();
    assert_eq!(entries.len(), 2, "both passes must emit");
    assert!(entries.iter().all(|p| p.computed_z_index == Some(7)));
}

#[test]
fn init_assigns_parents_before_children_and_edges() {
    let mut config = FlowConfig::default();
    config.z_index.edges_above_connected = true;

    let base = FlowState::default();
    let mut child = node("ic", 0.0, 0.0, None);
    child.group_id = Some(Id::intern("ig"));
    let mut grand = node("igc", 0.0, 0.0, None);
    grand.group_id = Some(Id::intern("ic"));
    // Deliberately listed children-first to prove ordering is topological.
    let nodes = vec![grand, child, node("ig", 0.0, 0.0, None)];
    let mut edge = fb_core::Edge::new(Id::intern("ie"), Some(Id::intern("ig")), Some(Id::intern("igc")));
    edge.routing = Routing::Custom("external".into());

    let update = FlowStateUpdate {
        nodes_to_add: nodes,
        edges_to_add: vec![edge],
        ..Default::default()
    };
    let out = amend(&mut ZIndexMiddleware, &base, update, "init", &config).unwrap();

    let index_of = |id: &str| {
        out.node_patches
            .iter()
            .find(|p| p.id == Id::intern(id))
            .and_then(|p| p.computed_z_index)
    };
    // Chain ig → ic → igc climbs one per level; ig itself stays 0 and is
    // therefore not emitted (only actual changes are).
    assert_eq!(index_of("ig"), None);
    assert_eq!(index_of("ic"), Some(1));
    assert_eq!(index_of("igc"), Some(2));
    // Edge: max(endpoint indices) + 1 with edges-above enabled.
    assert_eq!(out.edge_patches[0].computed_z_index, Some(3));
}

// ─── Measurement gating ──────────────────────────────────────────────────

#[test]
fn measurement_flag_flips_exactly_on_the_last_measurement() {
    let config = FlowConfig::default();
    let mut base = FlowState::default();
    base.nodes.push(node("ma", 0.0, 0.0, Some(Size::new(10.0, 10.0))));
    base.nodes.push(node("mb", 0.0, 0.0, None));

    // Still unmeasured: no amendment.
    let out = amend(&mut MeasurementMiddleware, &base, FlowStateUpdate::default(), "updateNode", &config);
    assert!(out.is_none());

    // The last size lands: the flag flips on.
    let measure = FlowStateUpdate::from_node_patches(vec![NodePatch {
        id: Id::intern("mb"),
        size: Some(Size::new(20.0, 20.0)),
        ..Default::default()
    }]);
    let out = amend(&mut MeasurementMiddleware, &base, measure.clone(), "updateNode", &config).unwrap();
    let flag = out.metadata.unwrap().middleware["measurement"]["complete"].as_bool();
    assert_eq!(flag, Some(true));

    // Once recorded, a repeat invocation stays quiet.
    let mut measured = base.apply(&measure);
    measured
        .metadata
        .middleware
        .insert("measurement".into(), serde_json::json!({"complete": true}));
    let out = amend(&mut MeasurementMiddleware, &measured, FlowStateUpdate::default(), "select", &config);
    assert!(out.is_none());

    // A new unmeasured node turns it back off.
    let grow = FlowStateUpdate {
        nodes_to_add: vec![node("mc", 0.0, 0.0, None)],
        ..Default::default()
    };
    let out = amend(&mut MeasurementMiddleware, &measured, grow, "addNodes", &config).unwrap();
    let flag = out.metadata.unwrap().middleware["measurement"]["complete"].as_bool();
    assert_eq!(flag, Some(false));
}

// ─── Routing assignment ──────────────────────────────────────────────────

#[test]
fn routing_recomputes_points_when_an_endpoint_moves() {
    let config = FlowConfig::default();
    let mut base = FlowState::default();
    base.nodes.push(node("ra", 0.0, 0.0, Some(Size::new(40.0, 40.0))));
    base.nodes.push(node("rb", 200.0, 0.0, Some(Size::new(40.0, 40.0))));
    let mut edge = fb_core::Edge::new(Id::intern("re"), Some(Id::intern("ra")), Some(Id::intern("rb")));
    edge.routing = Routing::Straight;
    edge.points = [Point::new(40.0, 20.0), Point::new(200.0, 20.0)].into_iter().collect();
    base.edges.push(edge);

    // Unrelated change: middleware stays out of the way.
    let select = FlowStateUpdate::from_node_patches(vec![NodePatch {
        id: Id::intern("ra"),
        selected: Some(true),
        ..Default::default()
    }]);
    assert!(amend(&mut RoutingMiddleware, &base, select, "select", &config).is_none());

    // Moving an endpoint reroutes the straight edge between face centers.
    let shift = FlowStateUpdate::from_node_patches(vec![NodePatch {
        id: Id::intern("ra"),
        position: Some(Point::new(0.0, 100.0)),
        ..Default::default()
    }]);
    let out = amend(&mut RoutingMiddleware, &base, shift, "moveNodesBy", &config).unwrap();
    let points = out.edge_patches[0].points.as_ref().unwrap();
    assert_eq!(points.first().copied(), Some(Point::new(40.0, 120.0)));
    assert_eq!(points.last().copied(), Some(Point::new(200.0, 20.0)));
}

#[test]
fn routing_prefers_measured_port_anchors() {
    let config = FlowConfig::default();
    let mut base = FlowState::default();
    let mut a = node("pa", 0.0, 0.0, Some(Size::new(40.0, 40.0)));
    let mut port = fb_core::Port::new(Id::intern("out"), fb_core::Side::Bottom, a.id);
    port.position = Some(Point::new(20.0, 40.0));
    a.ports.push(port);
    base.nodes.push(a);
    base.nodes.push(node("pb", 200.0, 200.0, Some(Size::new(40.0, 40.0))));

    let mut edge = fb_core::Edge::new(Id::intern("pe"), Some(Id::intern("pa")), Some(Id::intern("pb")));
    edge.source_port = Some(Id::intern("out"));
    edge.routing = Routing::Orthogonal;

    let add = FlowStateUpdate { edges_to_add: vec![edge], ..Default::default() };
    let out = amend(&mut RoutingMiddleware, &base, add, "addEdges", &config).unwrap();
    let points = out.edge_patches[0].points.as_ref().unwrap();

    // Path leaves the measured port anchor, standing off downward.
    assert_eq!(points[0], Point::new(20.0, 40.0));
    assert_eq!(points[1], Point::new(20.0, 40.0 + config.routing_offset));
    // Manhattan all the way.
    for w in points.windows(2) {
        assert!(w[0].x == w[1].x || w[0].y == w[1].y);
    }
}

#[test]
fn labels_are_placed_along_the_path() {
    let config = FlowConfig::default();
    let mut base = FlowState::default();
    base.nodes.push(node("la", 0.0, 0.0, Some(Size::new(20.0, 20.0))));
    base.nodes.push(node("lb", 220.0, 0.0, Some(Size::new(20.0, 20.0))));

    let mut edge = fb_core::Edge::new(Id::intern("le"), Some(Id::intern("la")), Some(Id::intern("lb")));
    edge.routing = Routing::Straight;
    edge.labels.push(fb_core::EdgeLabel {
        id: Id::intern("ll"),
        placement: fb_core::LabelPlacement::Relative(0.5),
        position: None,
        size: None,
    });

    let add = FlowStateUpdate { edges_to_add: vec![edge], ..Default::default() };
    let out = amend(&mut RoutingMiddleware, &base, add, "addEdges", &config).unwrap();
    let labels = out.edge_patches[0].labels.as_ref().unwrap();
    // Straight path runs from (20,10) to (220,10); halfway is (120,10).
    assert_eq!(labels[0].position, Some(Point::new(120.0, 10.0)));
}
