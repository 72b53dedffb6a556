//! Z-index assignment middleware.
//!
//! Maintains `computed_z_index` for every node and edge, recomputed
//! incrementally. Per-node precedence, highest first:
//!
//! 1. explicit `z_order` — always wins, and *always re-applies*, even for
//!    a node already processed this invocation (bring-to-front must not
//!    be shadowed by an earlier automatic assignment);
//! 2. selected, with elevation enabled — the configured selected index;
//! 3. grouped — one above the parent group's index;
//! 4. otherwise 0.
//!
//! The per-invocation processed set gates rules 2–4 only. A node whose
//! selection *and* `z_order` both changed is therefore assigned twice,
//! producing two patch entries with the same final value — documented
//! behavior, not a bug (see `explicit_z_order_overrides_previous_processing`
//! in the pipeline integration tests).
//!
//! Edges take their own `z_order` when set, else the max of their
//! endpoint node indices, plus one when `edges_above_connected` is
//! configured. Full re-initialization assigns group parents before their
//! children; only entities whose index actually differs from the previous
//! one are emitted.

use crate::pipeline::{EdgeField, Middleware, NodeField, PipelineContext, Verdict};
use fb_core::hierarchy::{descendants_of, topo_group_order};
use fb_core::update::{EdgePatch, NodePatch};
use fb_core::{FlowStateUpdate, Id, Node};
use std::collections::{HashMap, HashSet};

pub struct ZIndexMiddleware;

impl Middleware for ZIndexMiddleware {
    fn name(&self) -> &'static str {
        "zIndex"
    }

    fn process(&mut self, ctx: &PipelineContext<'_>) -> Verdict {
        let init = ctx.action == "init";

        let auto_triggers: HashSet<Id> = if init {
            ctx.state.nodes.iter().map(|n| n.id).collect()
        } else {
            let mut set: HashSet<Id> =
                ctx.changed_node_ids(&[NodeField::Selected, NodeField::Group]).into_iter().collect();
            set.extend(ctx.added_node_ids());
            // A group's new index cascades to everything inside it.
            for id in set.clone() {
                set.extend(descendants_of(ctx.state, id));
            }
            set
        };

        // Explicit-intent trigger: zOrder changed on a pre-existing node.
        let explicit_triggers: Vec<Id> = if init {
            Vec::new()
        } else {
            ctx.changed_node_ids(&[NodeField::ZOrder])
                .into_iter()
                .filter(|id| ctx.previous_node(*id).is_some())
                .collect()
        };

        let edge_triggers: HashSet<Id> = if init {
            ctx.state.edges.iter().map(|e| e.id).collect()
        } else {
            let mut set: HashSet<Id> = ctx
                .changed_edge_ids(&[EdgeField::ZOrder, EdgeField::Endpoints])
                .into_iter()
                .collect();
            set.extend(ctx.added_edge_ids());
            set
        };

        if auto_triggers.is_empty() && explicit_triggers.is_empty() && edge_triggers.is_empty() {
            return Verdict::Advance(None);
        }

        let mut assigned: HashMap<Id, i32> = HashMap::new();
        let mut processed: HashSet<Id> = HashSet::new();
        let mut node_patches: Vec<NodePatch> = Vec::new();

        // Automatic pass: parents before children so a child can look up
        // its already-assigned parent.
        for id in topo_group_order(&ctx.state.nodes) {
            if !auto_triggers.contains(&id) || processed.contains(&id) {
                continue;
            }
            processed.insert(id);
            let node = ctx.node(id).expect("trigger ids come from the candidate state");
            let index = compute_node_index(ctx, node, &assigned);
            assigned.insert(id, index);
            if index != node.computed_z_index {
                node_patches.push(NodePatch {
                    id,
                    computed_z_index: Some(index),
                    ..Default::default()
                });
            }
        }

        // Explicit pass: not gated by the processed set.
        for id in explicit_triggers {
            let Some(node) = ctx.node(id) else { continue };
            let index = compute_node_index(ctx, node, &assigned);
            assigned.insert(id, index);
            if index != node.computed_z_index {
                node_patches.push(NodePatch {
                    id,
                    computed_z_index: Some(index),
                    ..Default::default()
                });
            }
        }

        // Edges: follow their endpoints.
        let mut edge_patches: Vec<EdgePatch> = Vec::new();
        for edge in &ctx.state.edges {
            let follows_endpoint = edge.source.is_some_and(|s| assigned.contains_key(&s))
                || edge.target.is_some_and(|t| assigned.contains_key(&t));
            if !edge_triggers.contains(&edge.id) && !follows_endpoint {
                continue;
            }
            let index = edge.z_order.unwrap_or_else(|| {
                let lookup = |id: Option<Id>| {
                    id.map(|i| {
                        assigned
                            .get(&i)
                            .copied()
                            .or_else(|| ctx.node(i).map(|n| n.computed_z_index))
                            .unwrap_or(0)
                    })
                    .unwrap_or(0)
                };
                let base = lookup(edge.source).max(lookup(edge.target));
                if ctx.config.z_index.edges_above_connected { base + 1 } else { base }
            });
            if index != edge.computed_z_index {
                edge_patches.push(EdgePatch {
                    id: edge.id,
                    computed_z_index: Some(index),
                    ..Default::default()
                });
            }
        }

        if node_patches.is_empty() && edge_patches.is_empty() {
            return Verdict::Advance(None);
        }
        let mut update = FlowStateUpdate::from_node_patches(node_patches);
        update.edge_patches = edge_patches;
        Verdict::Advance(Some(update))
    }
}

fn compute_node_index(
    ctx: &PipelineContext<'_>,
    node: &Node,
    assigned: &HashMap<Id, i32>,
) -> i32 {
    if let Some(z) = node.z_order {
        return z;
    }
    if node.selected && ctx.config.z_index.elevate_on_select {
        return ctx.config.z_index.selected_z_index;
    }
    if let Some(group) = node.group_id {
        let parent = assigned
            .get(&group)
            .copied()
            .or_else(|| ctx.node(group).map(|n| n.computed_z_index))
            .unwrap_or(0);
        return parent + 1;
    }
    0
}
