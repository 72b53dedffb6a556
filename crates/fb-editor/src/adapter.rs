//! External interfaces: the model adapter and the renderer.
//!
//! The engine never owns persisted state — it reads from and commits
//! through a [`FlowModel`]. Hosts back the trait with whatever store they
//! have (signals, redux-style stores, a database); [`InMemoryModel`]
//! ships as the reference implementation for tests and headless use.
//! Undo/redo storage mechanics stay behind the adapter — only the call
//! contract is used here.

use fb_core::{Edge, EngineError, FlowState, Metadata, Node, Viewport};
use std::collections::HashMap;

pub type ChangeListenerId = u64;

pub trait FlowModel {
    fn nodes(&self) -> Vec<Node>;
    fn edges(&self) -> Vec<Edge>;
    fn metadata(&self) -> Metadata;

    fn update_nodes(&mut self, nodes: Vec<Node>);
    /// Function-of-previous-value form.
    fn update_nodes_with(&mut self, f: &mut dyn FnMut(Vec<Node>) -> Vec<Node>);
    fn update_edges(&mut self, edges: Vec<Edge>);
    fn update_edges_with(&mut self, f: &mut dyn FnMut(Vec<Edge>) -> Vec<Edge>);
    fn update_metadata(&mut self, metadata: Metadata);
    fn update_metadata_with(&mut self, f: &mut dyn FnMut(Metadata) -> Metadata);

    /// Commit a whole snapshot atomically: one undo step, one change
    /// notification. Default unrolls into the three update calls.
    fn commit(&mut self, state: FlowState) {
        self.update_nodes(state.nodes);
        self.update_edges(state.edges);
        self.update_metadata(state.metadata);
    }

    /// Notified with the full `{nodes, edges, metadata}` snapshot after
    /// every change.
    fn on_change(&mut self, listener: Box<dyn Fn(&FlowState)>) -> ChangeListenerId;
    fn unregister_on_change(&mut self, id: ChangeListenerId);

    fn undo(&mut self);
    fn redo(&mut self);

    fn to_json(&self) -> Result<serde_json::Value, EngineError>;

    fn snapshot(&self) -> FlowState {
        FlowState { nodes: self.nodes(), edges: self.edges(), metadata: self.metadata() }
    }
}

/// Something that can put pixels on a screen. The engine calls `draw`
/// after each commit; when a commit touched nothing but the viewport and
/// the renderer opts in, the pan/zoom fast path is used instead.
pub trait Renderer {
    fn draw(&mut self, nodes: &[Node], edges: &[Edge], viewport: &Viewport);

    fn supports_viewport_fast_path(&self) -> bool {
        false
    }

    fn draw_viewport_only(&mut self, _viewport: &Viewport) {}
}

// ─── In-memory reference adapter ─────────────────────────────────────────

/// Snapshot-stack model: plain state plus bounded undo/redo stacks.
pub struct InMemoryModel {
    state: FlowState,
    undo_stack: Vec<FlowState>,
    redo_stack: Vec<FlowState>,
    max_depth: usize,
    listeners: HashMap<ChangeListenerId, Box<dyn Fn(&FlowState)>>,
    next_listener: ChangeListenerId,
}

impl InMemoryModel {
    pub fn new() -> Self {
        Self::with_max_depth(100)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            state: FlowState::default(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
            listeners: HashMap::new(),
            next_listener: 0,
        }
    }

    fn remember(&mut self) {
        self.undo_stack.push(self.state.clone());
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    fn notify(&self) {
        for listener in self.listeners.values() {
            listener(&self.state);
        }
    }
}

impl Default for InMemoryModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowModel for InMemoryModel {
    fn nodes(&self) -> Vec<Node> {
        self.state.nodes.clone()
    }

    fn edges(&self) -> Vec<Edge> {
        self.state.edges.clone()
    }

    fn metadata(&self) -> Metadata {
        self.state.metadata.clone()
    }

    fn update_nodes(&mut self, nodes: Vec<Node>) {
        self.remember();
        self.state.nodes = nodes;
        self.notify();
    }

    fn update_nodes_with(&mut self, f: &mut dyn FnMut(Vec<Node>) -> Vec<Node>) {
        self.remember();
        self.state.nodes = f(std::mem::take(&mut self.state.nodes));
        self.notify();
    }

    fn update_edges(&mut self, edges: Vec<Edge>) {
        self.remember();
        self.state.edges = edges;
        self.notify();
    }

    fn update_edges_with(&mut self, f: &mut dyn FnMut(Vec<Edge>) -> Vec<Edge>) {
        self.remember();
        self.state.edges = f(std::mem::take(&mut self.state.edges));
        self.notify();
    }

    fn update_metadata(&mut self, metadata: Metadata) {
        self.remember();
        self.state.metadata = metadata;
        self.notify();
    }

    fn update_metadata_with(&mut self, f: &mut dyn FnMut(Metadata) -> Metadata) {
        self.remember();
        self.state.metadata = f(std::mem::take(&mut self.state.metadata));
        self.notify();
    }

    fn commit(&mut self, state: FlowState) {
        self.remember();
        self.state = state;
        self.notify();
    }

    fn on_change(&mut self, listener: Box<dyn Fn(&FlowState)>) -> ChangeListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.insert(id, listener);
        id
    }

    fn unregister_on_change(&mut self, id: ChangeListenerId) {
        self.listeners.remove(&id);
    }

    fn undo(&mut self) {
        if let Some(prev) = self.undo_stack.pop() {
            self.redo_stack.push(std::mem::replace(&mut self.state, prev));
            self.notify();
        }
    }

    fn redo(&mut self) {
        if let Some(next) = self.redo_stack.pop() {
            self.undo_stack.push(std::mem::replace(&mut self.state, next));
            self.notify();
        }
    }

    fn to_json(&self) -> Result<serde_json::Value, EngineError> {
        Ok(serde_json::to_value(&self.state)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fb_core::{Id, Point};

    #[test]
    fn commit_is_one_undo_step() {
        let mut model = InMemoryModel::new();
        let mut state = FlowState::default();
        state.nodes.push(Node::new(Id::intern("m1"), Point::ZERO));
        model.commit(state.clone());

        state.nodes[0].position = Point::new(9.0, 9.0);
        model.commit(state);

        model.undo();
        assert_eq!(model.nodes()[0].position, Point::ZERO);
        model.redo();
        assert_eq!(model.nodes()[0].position, Point::new(9.0, 9.0));
    }

    #[test]
    fn redo_clears_on_new_commit() {
        let mut model = InMemoryModel::new();
        let mut state = FlowState::default();
        state.nodes.push(Node::new(Id::intern("m2"), Point::ZERO));
        model.commit(state.clone());
        model.undo();

        state.nodes[0].position = Point::new(1.0, 1.0);
        model.commit(state);
        model.redo(); // nothing to redo
        assert_eq!(model.nodes()[0].position, Point::new(1.0, 1.0));
    }

    #[test]
    fn change_listeners_fire_and_unregister() {
        let mut model = InMemoryModel::new();
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        let seen2 = seen.clone();
        let id = model.on_change(Box::new(move |_| seen2.set(seen2.get() + 1)));

        model.commit(FlowState::default());
        assert_eq!(seen.get(), 1);

        model.unregister_on_change(id);
        model.commit(FlowState::default());
        assert_eq!(seen.get(), 1);
    }
}
