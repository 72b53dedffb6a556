//! Routing assignment middleware.
//!
//! Recomputes connector points whenever endpoint geometry moved, and
//! derives each measured label's pixel position from its place along the
//! path. Edges with `Routing::Custom` keep whatever points their external
//! router supplied; only their labels are (re)placed.

use crate::pipeline::{EdgeField, Middleware, NodeField, PipelineContext, Verdict};
use fb_core::update::EdgePatch;
use fb_core::{Edge, FlowStateUpdate, Id, LabelPlacement, Node, Point, Routing, Side};
use fb_routing::{EndpointRef, Path, curved_path, orthogonal_path};
use smallvec::SmallVec;

pub struct RoutingMiddleware;

/// Fields on a node that move its connector anchors.
const ANCHOR_FIELDS: &[NodeField] = &[NodeField::Position, NodeField::Size, NodeField::Ports];

const EDGE_FIELDS: &[EdgeField] =
    &[EdgeField::Endpoints, EdgeField::Routing, EdgeField::Labels, EdgeField::Points];

impl Middleware for RoutingMiddleware {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn process(&mut self, ctx: &PipelineContext<'_>) -> Verdict {
        let init = ctx.action == "init";
        let moved = ctx.changed_node_ids(ANCHOR_FIELDS);
        let dirty_edges = ctx.changed_edge_ids(EDGE_FIELDS);
        if !init && moved.is_empty() && dirty_edges.is_empty() {
            return Verdict::Advance(None);
        }

        let mut patches = Vec::new();
        for edge in &ctx.state.edges {
            let affected = init
                || dirty_edges.contains(&edge.id)
                || edge.source.is_some_and(|s| moved.contains(&s))
                || edge.target.is_some_and(|t| moved.contains(&t));
            if !affected {
                continue;
            }
            if let Some(patch) = route_edge(ctx, edge) {
                patches.push(patch);
            }
        }

        if patches.is_empty() {
            Verdict::Advance(None)
        } else {
            Verdict::Advance(Some(FlowStateUpdate::from_edge_patches(patches)))
        }
    }
}

fn route_edge(ctx: &PipelineContext<'_>, edge: &Edge) -> Option<EdgePatch> {
    let new_points = match &edge.routing {
        Routing::Custom(_) => None,
        routing => {
            let source = resolve_anchor(ctx, edge.source, edge.source_port, edge.source_position, other_hint(ctx, edge, false))?;
            let target = resolve_anchor(ctx, edge.target, edge.target_port, edge.target_position, other_hint(ctx, edge, true))?;
            let points: SmallVec<[Point; 8]> = match routing {
                Routing::Straight => SmallVec::from_slice(&[source.point, target.point]),
                Routing::Orthogonal => {
                    let mid = source.point.midpoint(&target.point);
                    orthogonal_path(source, target, mid, ctx.config.routing_offset)
                        .into_points()
                        .into_iter()
                        .collect()
                }
                Routing::Custom(_) => unreachable!(),
            };
            (points != edge.points).then_some(points)
        }
    };

    let effective_points: &[Point] = new_points.as_deref().unwrap_or(&edge.points);
    let new_labels = place_labels(edge, effective_points);

    if new_points.is_none() && new_labels.is_none() {
        return None;
    }
    let mut patch = EdgePatch::new(edge.id);
    patch.points = new_points;
    patch.labels = new_labels;
    Some(patch)
}

/// The rough location of the *other* endpoint, used to orient side-less
/// anchors.
fn other_hint(ctx: &PipelineContext<'_>, edge: &Edge, for_target: bool) -> Point {
    let (id, position) = if for_target {
        (edge.source, edge.source_position)
    } else {
        (edge.target, edge.target_position)
    };
    id.and_then(|nid| ctx.node(nid))
        .map(Node::center)
        .or(position)
        .unwrap_or(Point::ZERO)
}

/// Resolve one endpoint into a located, side-aware anchor.
///
/// Preference order: measured port anchor, then the node face nearest the
/// other endpoint, then the explicit free position. Returns `None` when
/// the edge references a node that is gone (the dispatcher cascades
/// deletions, so this only happens transiently inside an invocation).
fn resolve_anchor(
    ctx: &PipelineContext<'_>,
    node_id: Option<Id>,
    port_id: Option<Id>,
    position: Option<Point>,
    toward: Point,
) -> Option<EndpointRef> {
    if let Some(nid) = node_id {
        let Some(node) = ctx.node(nid) else {
            log::debug!("routing: edge endpoint references missing node {nid}; skipping");
            return None;
        };
        if let Some(pid) = port_id
            && let Some(port) = node.port(pid)
            && let Some(anchor) = port.position
        {
            return Some(EndpointRef::new(anchor, port.side));
        }
        let side = facing_side(node.center(), toward);
        return Some(EndpointRef::new(face_center(node, side), side));
    }
    // Free endpoint: no node body to stand off from, so face the other
    // endpoint directly.
    let point = position?;
    Some(EndpointRef::new(point, facing_side(point, toward)))
}

/// The node face pointing towards `toward`, by dominant axis.
fn facing_side(from: Point, toward: Point) -> Side {
    let d = toward - from;
    if d.x.abs() >= d.y.abs() {
        if d.x >= 0.0 { Side::Right } else { Side::Left }
    } else if d.y >= 0.0 {
        Side::Bottom
    } else {
        Side::Top
    }
}

fn face_center(node: &Node, side: Side) -> Point {
    let r = node.rect();
    match side {
        Side::Top => Point::new(r.center().x, r.y),
        Side::Right => Point::new(r.right(), r.center().y),
        Side::Bottom => Point::new(r.center().x, r.bottom()),
        Side::Left => Point::new(r.x, r.center().y),
    }
}

/// Derive label pixel positions along the current path. Custom-routed
/// edges with 2–4 points are treated as curve control points; everything
/// else walks the polyline.
fn place_labels(edge: &Edge, points: &[Point]) -> Option<SmallVec<[fb_core::EdgeLabel; 2]>> {
    if edge.labels.is_empty() || points.len() < 2 {
        return None;
    }

    let curved = matches!(edge.routing, Routing::Custom(_)) && points.len() <= 4;
    let polyline = (!curved).then(|| Path::new(points.to_vec()));
    let curve = curved.then(|| curved_path(points));
    let total = polyline
        .as_ref()
        .map(Path::total_length)
        .or_else(|| curve.as_ref().map(|c| c.total_length()))
        .unwrap_or(0.0);

    let mut labels = edge.labels.clone();
    let mut changed = false;
    for label in &mut labels {
        let distance = match label.placement {
            LabelPlacement::Relative(f) => f.clamp(0.0, 1.0) * total,
            LabelPlacement::Absolute(px) => px,
        };
        let position = match (&polyline, &curve) {
            (Some(p), _) => p.point_at_distance(distance),
            (_, Some(c)) => c.point_at_distance(distance),
            _ => unreachable!(),
        };
        if label.position != Some(position) {
            label.position = Some(position);
            changed = true;
        }
    }
    changed.then_some(labels)
}
