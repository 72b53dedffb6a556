//! Group-containment helpers.
//!
//! Groups are ordinary nodes referenced by `group_id`; the chains must
//! stay acyclic. Stacking-order initialization needs group parents
//! processed before their children, which is a topological sort over the
//! containment edges.

use crate::id::Id;
use crate::model::{FlowState, Node};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Walk the parent chain of `id`, checking whether `ancestor` appears.
pub fn is_ancestor_of(state: &FlowState, ancestor: Id, id: Id) -> bool {
    if ancestor == id {
        return false;
    }
    let mut current = state.node(id).and_then(|n| n.group_id);
    // Bounded by node count so a (never committed) malformed chain can't spin.
    let mut remaining = state.nodes.len();
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        if remaining == 0 {
            break;
        }
        remaining -= 1;
        current = state.node(parent).and_then(|n| n.group_id);
    }
    false
}

/// Would assigning `group` as the parent of `id` create a cycle?
pub fn would_create_cycle(state: &FlowState, id: Id, group: Id) -> bool {
    group == id || is_ancestor_of(state, id, group)
}

/// Every node contained (transitively) in `group`, in no particular order.
pub fn descendants_of(state: &FlowState, group: Id) -> Vec<Id> {
    let mut out = Vec::new();
    let mut frontier = vec![group];
    while let Some(parent) = frontier.pop() {
        for node in &state.nodes {
            if node.group_id == Some(parent) {
                out.push(node.id);
                frontier.push(node.id);
            }
        }
    }
    out
}

/// Node ids ordered so every group parent precedes its children.
///
/// Nodes whose `group_id` points at a missing node are treated as roots.
/// If the containment graph somehow contains a cycle (which committed
/// states never do), falls back to input order.
pub fn topo_group_order(nodes: &[Node]) -> Vec<Id> {
    let mut graph: DiGraph<Id, ()> = DiGraph::with_capacity(nodes.len(), nodes.len());
    let mut indices: HashMap<Id, NodeIndex> = HashMap::with_capacity(nodes.len());

    for node in nodes {
        indices.insert(node.id, graph.add_node(node.id));
    }
    for node in nodes {
        if let Some(parent) = node.group_id
            && let (Some(&p), Some(&c)) = (indices.get(&parent), indices.get(&node.id))
        {
            graph.add_edge(p, c, ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => order.into_iter().map(|ix| graph[ix]).collect(),
        Err(_) => {
            log::warn!("group containment contains a cycle; falling back to input order");
            nodes.iter().map(|n| n.id).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn grouped_state() -> FlowState {
        let mut state = FlowState::default();
        for (name, parent) in [("root", None), ("mid", Some("root")), ("leaf", Some("mid")), ("other", None)] {
            let mut n = Node::new(Id::intern(name), Point::ZERO);
            n.group_id = parent.map(Id::intern);
            state.nodes.push(n);
        }
        state
    }

    #[test]
    fn ancestor_walks_full_chain() {
        let state = grouped_state();
        assert!(is_ancestor_of(&state, Id::intern("root"), Id::intern("leaf")));
        assert!(is_ancestor_of(&state, Id::intern("mid"), Id::intern("leaf")));
        assert!(!is_ancestor_of(&state, Id::intern("leaf"), Id::intern("root")));
        assert!(!is_ancestor_of(&state, Id::intern("other"), Id::intern("leaf")));
        assert!(!is_ancestor_of(&state, Id::intern("root"), Id::intern("root")));
    }

    #[test]
    fn cycle_detection_rejects_self_and_descendants() {
        let state = grouped_state();
        assert!(would_create_cycle(&state, Id::intern("root"), Id::intern("root")));
        assert!(would_create_cycle(&state, Id::intern("root"), Id::intern("leaf")));
        assert!(!would_create_cycle(&state, Id::intern("other"), Id::intern("root")));
    }

    #[test]
    fn descendants_are_transitive() {
        let state = grouped_state();
        let mut d = descendants_of(&state, Id::intern("root"));
        d.sort_by_key(|id| id.as_str().to_string());
        assert_eq!(d, vec![Id::intern("leaf"), Id::intern("mid")]);
    }

    #[test]
    fn topo_order_puts_parents_first() {
        let state = grouped_state();
        let order = topo_group_order(&state.nodes);
        let pos = |id: &str| order.iter().position(|x| *x == Id::intern(id)).unwrap();
        assert!(pos("root") < pos("mid"));
        assert!(pos("mid") < pos("leaf"));
    }
}
