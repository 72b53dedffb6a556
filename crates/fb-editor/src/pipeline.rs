//! The middleware pipeline.
//!
//! Every candidate state update passes through an ordered, named chain of
//! transformation steps before it may commit. Each middleware inspects
//! the running candidate and returns a single tagged verdict: advance
//! (optionally merging a further partial update) or cancel the whole
//! invocation. Execution is a plain linear iteration in registration
//! order — a middleware's verdict is its return value, so it can signal
//! exactly once by construction.
//!
//! Cancellation unwinds everything: no partial update from any step is
//! committed, and the invocation resolves to "no change" (distinct from
//! committing the unmodified input state).

use crate::env::Environment;
use fb_core::{EngineError, FlowConfig, FlowState, FlowStateUpdate, Id};
use std::collections::HashMap;

/// A middleware's one-shot answer for an invocation.
pub enum Verdict {
    /// Continue with the next middleware, optionally amending the
    /// candidate with a further partial update.
    Advance(Option<FlowStateUpdate>),
    /// Veto: unwind the invocation, commit nothing.
    Cancel,
}

/// An ordered, named pipeline step.
pub trait Middleware {
    /// Unique within a pipeline; also the unregistration key.
    fn name(&self) -> &'static str;

    fn process(&mut self, ctx: &PipelineContext<'_>) -> Verdict;
}

/// What one middleware did to the candidate state.
pub struct StepRecord {
    pub middleware: &'static str,
    pub before: FlowState,
    pub after: FlowState,
}

/// Node properties the change predicates can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    Position,
    Size,
    Angle,
    Group,
    Selected,
    ZOrder,
    Ports,
}

/// Edge properties the change predicates can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeField {
    Endpoints,
    Points,
    Routing,
    Labels,
    Selected,
    ZOrder,
}

/// Per-invocation context threaded through every middleware.
///
/// `previous` is the committed pre-invocation state; `state` is the
/// running candidate (the cumulative effect of the triggering command and
/// every middleware that advanced so far). The change predicates compare
/// the two so middlewares can skip irrelevant invocations cheaply.
pub struct PipelineContext<'a> {
    pub previous: &'a FlowState,
    pub state: &'a FlowState,
    /// Name of the triggering command.
    pub action: &'a str,
    pub config: &'a FlowConfig,
    pub env: &'a Environment,
    /// `(before, after)` per middleware that already ran this invocation.
    pub history: &'a [StepRecord],

    prev_nodes: HashMap<Id, usize>,
    prev_edges: HashMap<Id, usize>,
    cur_nodes: HashMap<Id, usize>,
    cur_edges: HashMap<Id, usize>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        previous: &'a FlowState,
        state: &'a FlowState,
        action: &'a str,
        config: &'a FlowConfig,
        env: &'a Environment,
        history: &'a [StepRecord],
    ) -> Self {
        let index = |nodes: &[fb_core::Node]| {
            nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect::<HashMap<_, _>>()
        };
        let index_edges = |edges: &[fb_core::Edge]| {
            edges.iter().enumerate().map(|(i, e)| (e.id, i)).collect::<HashMap<_, _>>()
        };
        Self {
            previous,
            state,
            action,
            config,
            env,
            history,
            prev_nodes: index(&previous.nodes),
            prev_edges: index_edges(&previous.edges),
            cur_nodes: index(&state.nodes),
            cur_edges: index_edges(&state.edges),
        }
    }

    /// O(1) lookup in the candidate state.
    pub fn node(&self, id: Id) -> Option<&fb_core::Node> {
        self.cur_nodes.get(&id).map(|&i| &self.state.nodes[i])
    }

    /// O(1) lookup in the candidate state.
    pub fn edge(&self, id: Id) -> Option<&fb_core::Edge> {
        self.cur_edges.get(&id).map(|&i| &self.state.edges[i])
    }

    pub fn previous_node(&self, id: Id) -> Option<&fb_core::Node> {
        self.prev_nodes.get(&id).map(|&i| &self.previous.nodes[i])
    }

    pub fn previous_edge(&self, id: Id) -> Option<&fb_core::Edge> {
        self.prev_edges.get(&id).map(|&i| &self.previous.edges[i])
    }

    pub fn nodes_added(&self) -> bool {
        self.state.nodes.iter().any(|n| !self.prev_nodes.contains_key(&n.id))
    }

    pub fn edges_added(&self) -> bool {
        self.state.edges.iter().any(|e| !self.prev_edges.contains_key(&e.id))
    }

    pub fn added_node_ids(&self) -> Vec<Id> {
        self.state
            .nodes
            .iter()
            .filter(|n| !self.prev_nodes.contains_key(&n.id))
            .map(|n| n.id)
            .collect()
    }

    pub fn added_edge_ids(&self) -> Vec<Id> {
        self.state
            .edges
            .iter()
            .filter(|e| !self.prev_edges.contains_key(&e.id))
            .map(|e| e.id)
            .collect()
    }

    /// Did any of `fields` change on any node across this invocation?
    pub fn nodes_changed(&self, fields: &[NodeField]) -> bool {
        self.state.nodes.iter().any(|n| self.node_fields_differ(n, fields))
    }

    /// Ids of nodes on which any of `fields` changed.
    pub fn changed_node_ids(&self, fields: &[NodeField]) -> Vec<Id> {
        self.state
            .nodes
            .iter()
            .filter(|n| self.node_fields_differ(n, fields))
            .map(|n| n.id)
            .collect()
    }

    pub fn edges_changed(&self, fields: &[EdgeField]) -> bool {
        self.state.edges.iter().any(|e| self.edge_fields_differ(e, fields))
    }

    pub fn changed_edge_ids(&self, fields: &[EdgeField]) -> Vec<Id> {
        self.state
            .edges
            .iter()
            .filter(|e| self.edge_fields_differ(e, fields))
            .map(|e| e.id)
            .collect()
    }

    fn node_fields_differ(&self, current: &fb_core::Node, fields: &[NodeField]) -> bool {
        let Some(prev) = self.previous_node(current.id) else {
            // Newly added nodes count as changed on every field.
            return true;
        };
        fields.iter().any(|f| match f {
            NodeField::Position => prev.position != current.position,
            NodeField::Size => prev.size != current.size,
            NodeField::Angle => prev.angle != current.angle,
            NodeField::Group => prev.group_id != current.group_id,
            NodeField::Selected => prev.selected != current.selected,
            NodeField::ZOrder => prev.z_order != current.z_order,
            NodeField::Ports => prev.ports != current.ports,
        })
    }

    fn edge_fields_differ(&self, current: &fb_core::Edge, fields: &[EdgeField]) -> bool {
        let Some(prev) = self.previous_edge(current.id) else {
            return true;
        };
        fields.iter().any(|f| match f {
            EdgeField::Endpoints => {
                prev.source != current.source
                    || prev.target != current.target
                    || prev.source_port != current.source_port
                    || prev.target_port != current.target_port
                    || prev.source_position != current.source_position
                    || prev.target_position != current.target_position
            }
            EdgeField::Points => prev.points != current.points,
            EdgeField::Routing => prev.routing != current.routing,
            EdgeField::Labels => prev.labels != current.labels,
            EdgeField::Selected => prev.selected != current.selected,
            EdgeField::ZOrder => prev.z_order != current.z_order,
        })
    }
}

/// How an invocation resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The last middleware advanced; this is the new committed state.
    Committed(FlowState),
    /// Some middleware cancelled; nothing changes.
    Cancelled,
}

struct Entry {
    name: &'static str,
    middleware: Box<dyn Middleware>,
}

/// The ordered chain. Built-ins are registered before any user-supplied
/// middlewares at engine construction.
pub struct Pipeline {
    entries: Vec<Entry>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a middleware. Names must be unique — duplicates are a
    /// programmer error, not a warning.
    pub fn register(&mut self, middleware: Box<dyn Middleware>) -> Result<(), EngineError> {
        let name = middleware.name();
        if self.entries.iter().any(|e| e.name == name) {
            return Err(EngineError::DuplicateMiddleware(name.to_string()));
        }
        self.entries.push(Entry { name, middleware });
        Ok(())
    }

    /// Remove exactly the named entry, preserving the relative order of
    /// the remainder. Returns whether anything was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Run one invocation: apply `update` to `base`, then let every
    /// middleware amend or veto the candidate in registration order.
    pub fn run(
        &mut self,
        base: &FlowState,
        update: FlowStateUpdate,
        action: &str,
        config: &FlowConfig,
        env: &Environment,
    ) -> RunOutcome {
        let mut candidate = base.apply(&update);
        let mut history: Vec<StepRecord> = Vec::new();

        for i in 0..self.entries.len() {
            let name = self.entries[i].name;
            let verdict = {
                let ctx = PipelineContext::new(base, &candidate, action, config, env, &history);
                self.entries[i].middleware.process(&ctx)
            };
            match verdict {
                Verdict::Advance(Some(partial)) => {
                    let before = candidate.clone();
                    candidate = candidate.apply(&partial);
                    history.push(StepRecord { middleware: name, before, after: candidate.clone() });
                }
                Verdict::Advance(None) => {
                    history.push(StepRecord {
                        middleware: name,
                        before: candidate.clone(),
                        after: candidate.clone(),
                    });
                }
                Verdict::Cancel => {
                    log::debug!("pipeline: `{name}` cancelled action `{action}`");
                    return RunOutcome::Cancelled;
                }
            }
        }

        RunOutcome::Committed(candidate)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
