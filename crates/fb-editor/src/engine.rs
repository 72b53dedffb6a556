//! The engine: command dispatch over the middleware pipeline.
//!
//! `FlowEngine` owns the pipeline, the input router, the action-state
//! store and the external interfaces. Every state change follows one
//! road: a command is validated against the current adapter snapshot,
//! its `FlowStateUpdate` is negotiated through the pipeline, and the
//! committed result goes back out through the model adapter (and the
//! renderer, when one is attached). `emit` does not return until the
//! pipeline has resolved — callers must not assume anything happened
//! before that.
//!
//! Execution is single-threaded and cooperative: one command runs to
//! completion before the next begins observable effects.

use crate::action::ActionStateStore;
use crate::adapter::{FlowModel, Renderer};
use crate::command::Command;
use crate::env::Environment;
use crate::input::{InputRouter, InteractionContext, InteractionEvent, KeyInput, Phase};
use crate::interaction::{self, take_pending_pan};
use crate::middleware::{MeasurementMiddleware, RoutingMiddleware, ZIndexMiddleware};
use crate::pipeline::{Middleware, Pipeline, RunOutcome};
use crate::shortcuts::ShortcutMatcher;
use fb_core::hierarchy::would_create_cycle;
use fb_core::update::{EdgePatch, MetadataPatch, NodePatch, ViewportPatch};
use fb_core::{
    Edge, EngineError, FlowConfig, FlowState, FlowStateUpdate, Id, Node, Point, Rect, Routing,
};
use std::collections::HashMap;

/// Paste displacement when no cursor position is supplied.
const PASTE_OFFSET: Point = Point { x: 16.0, y: 16.0 };

/// How an emitted command resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The pipeline committed a new state.
    Committed,
    /// A middleware cancelled the invocation; no change.
    Cancelled,
    /// The command failed validation and was dropped with a warning.
    Ignored,
}

pub type CommandListenerId = u64;

pub struct FlowEngine {
    model: Box<dyn FlowModel>,
    pipeline: Pipeline,
    config: FlowConfig,
    env: Environment,
    router: InputRouter,
    shortcuts: ShortcutMatcher,
    actions: ActionStateStore,
    renderer: Option<Box<dyn Renderer>>,
    listeners: Vec<(CommandListenerId, Box<dyn Fn(&Command)>)>,
    next_listener: CommandListenerId,
}

impl FlowEngine {
    /// Build an engine over a model adapter: built-in middlewares first,
    /// then the stock interaction handlers.
    pub fn new(model: Box<dyn FlowModel>, config: FlowConfig, env: Environment) -> Self {
        let mut pipeline = Pipeline::new();
        let built_ins: [Box<dyn Middleware>; 3] = [
            Box::new(RoutingMiddleware),
            Box::new(ZIndexMiddleware),
            Box::new(MeasurementMiddleware),
        ];
        for middleware in built_ins {
            pipeline.register(middleware).expect("built-in middleware names are unique");
        }

        let mut router = InputRouter::new();
        interaction::register_defaults(&mut router);
        let shortcuts = ShortcutMatcher::with_defaults(&env);

        Self {
            model,
            pipeline,
            config,
            env,
            router,
            shortcuts,
            actions: ActionStateStore::default(),
            renderer: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Current committed snapshot.
    pub fn state(&self) -> FlowState {
        self.model.snapshot()
    }

    /// Transient interaction state, for hosts that render gesture chrome
    /// (rubber bands, provisional edges).
    pub fn action_state(&self) -> &ActionStateStore {
        &self.actions
    }

    // ─── Extension points ────────────────────────────────────────────────

    /// Append a user middleware after the built-ins.
    pub fn register_middleware(&mut self, middleware: Box<dyn Middleware>) -> Result<(), EngineError> {
        self.pipeline.register(middleware)
    }

    pub fn unregister_middleware(&mut self, name: &str) -> bool {
        self.pipeline.unregister(name)
    }

    pub fn register_interaction(&mut self, name: &str, handler: Box<dyn crate::input::InteractionHandler>) {
        self.router.register(name, handler);
    }

    /// Subscribe to "a command of this name was emitted" notifications.
    /// Fire-and-forget, invoked after the pipeline has resolved.
    pub fn on_command(&mut self, listener: Box<dyn Fn(&Command)>) -> CommandListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: CommandListenerId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route a named interaction event and emit whatever commands the
    /// handler produced.
    pub fn dispatch(&mut self, name: &str, event: &InteractionEvent) -> Result<(), EngineError> {
        let state = self.model.snapshot();
        let commands = {
            let ctx = InteractionContext { state: &state, config: &self.config, env: &self.env };
            self.router.dispatch(name, event, &ctx, &mut self.actions)
        };
        for command in commands {
            self.emit(command)?;
        }
        Ok(())
    }

    /// The binding table used by [`FlowEngine::handle_key`]; mutate to
    /// customize shortcuts.
    pub fn shortcuts_mut(&mut self) -> &mut ShortcutMatcher {
        &mut self.shortcuts
    }

    /// Resolve a key press against the shortcut table and dispatch the
    /// bound event. Modifier-only bindings are pointer-modal and never
    /// fire from here.
    pub fn handle_key(&mut self, input: KeyInput) -> Result<(), EngineError> {
        let action = self
            .shortcuts
            .match_input(&input)
            .into_iter()
            .find(|b| b.key.is_some())
            .map(|b| b.action);
        let Some(action) = action else {
            return Ok(());
        };
        let event = InteractionEvent::key(Phase::Start, &input.key, input.modifiers);
        self.dispatch(action, &event)
    }

    /// Animation-frame tick: flushes the throttled pan accumulator (at
    /// most one viewport commit per frame regardless of input rate).
    pub fn on_frame(&mut self) -> Result<(), EngineError> {
        if let Some(command) = take_pending_pan(&mut self.actions) {
            self.emit(command)?;
        }
        Ok(())
    }

    // ─── Command dispatch ────────────────────────────────────────────────

    /// Emit a command. Resolves only after the full pipeline resolved.
    pub fn emit(&mut self, command: Command) -> Result<Outcome, EngineError> {
        // History delegates to the adapter; storage mechanics are its
        // business, not the pipeline's.
        match command {
            Command::Undo => {
                self.model.undo();
                self.after_commit();
                self.notify(&command);
                return Ok(Outcome::Committed);
            }
            Command::Redo => {
                self.model.redo();
                self.after_commit();
                self.notify(&command);
                return Ok(Outcome::Committed);
            }
            _ => {}
        }

        let current = self.model.snapshot();

        // Init births a fresh state; everything else amends the current one.
        let base = match &command {
            Command::Init { viewport, .. } => {
                let mut fresh = FlowState::default();
                // Canvas measurements outlive diagram contents.
                fresh.metadata.viewport = viewport.unwrap_or(current.metadata.viewport);
                fresh
            }
            _ => current.clone(),
        };

        let Some(update) = self.compute_update(&base, &command) else {
            self.notify(&command);
            return Ok(Outcome::Ignored);
        };

        let outcome =
            self.pipeline.run(&base, update, command.name(), &self.config, &self.env);
        let result = match outcome {
            RunOutcome::Committed(next) => {
                let viewport_only =
                    next.nodes == current.nodes && next.edges == current.edges;
                self.model.commit(next);
                self.draw(viewport_only);
                Outcome::Committed
            }
            RunOutcome::Cancelled => Outcome::Cancelled,
        };
        self.notify(&command);
        Ok(result)
    }

    fn notify(&self, command: &Command) {
        for (_, listener) in &self.listeners {
            listener(command);
        }
    }

    fn after_commit(&mut self) {
        self.draw(false);
    }

    fn draw(&mut self, viewport_only: bool) {
        let Some(renderer) = self.renderer.as_mut() else { return };
        let state = self.model.snapshot();
        if viewport_only && renderer.supports_viewport_fast_path() {
            renderer.draw_viewport_only(&state.metadata.viewport);
        } else {
            renderer.draw(&state.nodes, &state.edges, &state.metadata.viewport);
        }
    }

    /// Validate a command against `state` and produce its update.
    /// `None` means the command was rejected (already warned about).
    fn compute_update(&mut self, state: &FlowState, command: &Command) -> Option<FlowStateUpdate> {
        match command {
            Command::Init { nodes, edges, .. } => Some(init_update(nodes, edges)),

            Command::AddNodes { nodes } => {
                let mut update = FlowStateUpdate::default();
                for node in nodes {
                    if state.node(node.id).is_some()
                        || update.nodes_to_add.iter().any(|n| n.id == node.id)
                    {
                        log::warn!("addNodes: id {} already exists; skipping", node.id);
                        continue;
                    }
                    update.nodes_to_add.push(node.clone());
                }
                (!update.nodes_to_add.is_empty()).then_some(update)
            }

            Command::UpdateNode { patch } => {
                if state.node(patch.id).is_none() {
                    log::warn!(
                        "updateNode: node {} not found; it may have been deleted by a concurrent command",
                        patch.id
                    );
                    return None;
                }
                let mut patch = patch.clone();
                patch.computed_z_index = None; // pipeline-owned
                Some(FlowStateUpdate::from_node_patches(vec![patch]))
            }

            Command::MoveNodesBy { ids, delta } => {
                let mut patches = Vec::new();
                for id in ids {
                    match state.node(*id) {
                        Some(node) => patches.push(NodePatch {
                            id: *id,
                            position: Some(node.position + *delta),
                            ..Default::default()
                        }),
                        None => log::warn!("moveNodesBy: node {id} not found; skipping"),
                    }
                }
                (!patches.is_empty()).then(|| FlowStateUpdate::from_node_patches(patches))
            }

            Command::ResizeNode { id, size, position } => {
                if state.node(*id).is_none() {
                    log::warn!(
                        "resizeNode: node {id} not found; resize handles may be stale after a delete"
                    );
                    return None;
                }
                Some(FlowStateUpdate::from_node_patches(vec![NodePatch {
                    id: *id,
                    size: Some(*size),
                    position: *position,
                    ..Default::default()
                }]))
            }

            Command::RotateNode { id, angle } => {
                if state.node(*id).is_none() {
                    log::warn!(
                        "rotateNode: node {id} not found; rotation handles may be stale after a delete"
                    );
                    return None;
                }
                Some(FlowStateUpdate::from_node_patches(vec![NodePatch {
                    id: *id,
                    angle: Some(*angle),
                    ..Default::default()
                }]))
            }

            Command::DeleteNodes { ids } => Some(delete_update(state, ids, &[])),

            Command::AddEdges { edges } => {
                let mut update = FlowStateUpdate::default();
                for edge in edges {
                    if state.edge(edge.id).is_some()
                        || update.edges_to_add.iter().any(|e| e.id == edge.id)
                    {
                        log::warn!("addEdges: id {} already exists; skipping", edge.id);
                        continue;
                    }
                    if !edge.endpoints_valid() {
                        log::warn!(
                            "addEdges: edge {} has a detached endpoint without an explicit position; skipping",
                            edge.id
                        );
                        continue;
                    }
                    let missing = [edge.source, edge.target]
                        .into_iter()
                        .flatten()
                        .find(|nid| state.node(*nid).is_none());
                    if let Some(nid) = missing {
                        log::warn!("addEdges: edge {} references missing node {nid}; skipping", edge.id);
                        continue;
                    }
                    update.edges_to_add.push(edge.clone());
                }
                (!update.edges_to_add.is_empty()).then_some(update)
            }

            Command::UpdateEdge { patch } => {
                if state.edge(patch.id).is_none() {
                    log::warn!("updateEdge: edge {} not found", patch.id);
                    return None;
                }
                let mut patch = patch.clone();
                patch.computed_z_index = None; // pipeline-owned
                if let Some(labels) = &mut patch.labels {
                    for label in labels.iter_mut() {
                        label.position = None; // derived along the path
                    }
                }
                Some(FlowStateUpdate::from_edge_patches(vec![patch]))
            }

            Command::DeleteEdges { ids } => Some(delete_update(state, &[], ids)),

            Command::SetNodePorts { id, ports } => {
                if state.node(*id).is_none() {
                    log::warn!(
                        "setNodePorts: node {id} not found; measurements may refer to an unmounted node"
                    );
                    return None;
                }
                Some(FlowStateUpdate::from_node_patches(vec![NodePatch {
                    id: *id,
                    ports: Some(ports.iter().cloned().collect()),
                    ..Default::default()
                }]))
            }

            Command::SetEdgeLabels { id, labels } => {
                if state.edge(*id).is_none() {
                    log::warn!("setEdgeLabels: edge {id} not found");
                    return None;
                }
                let mut labels: Vec<_> = labels.clone();
                for label in &mut labels {
                    label.position = None; // derived along the path
                }
                Some(FlowStateUpdate::from_edge_patches(vec![EdgePatch {
                    id: *id,
                    labels: Some(labels.into_iter().collect()),
                    ..Default::default()
                }]))
            }

            Command::Select { ids } => Some(selection_update(state, ids, true)),
            Command::Deselect { ids } => Some(selection_update(state, ids, false)),
            Command::SelectAll => {
                let ids: Vec<Id> = state
                    .nodes
                    .iter()
                    .map(|n| n.id)
                    .chain(state.edges.iter().map(|e| e.id))
                    .collect();
                Some(selection_update(state, &ids, true))
            }
            Command::DeselectAll => {
                let ids: Vec<Id> = state
                    .selected_nodes()
                    .map(|n| n.id)
                    .chain(state.selected_edges().map(|e| e.id))
                    .collect();
                Some(selection_update(state, &ids, false))
            }

            Command::MoveViewportBy { delta } => {
                let viewport = state.metadata.viewport;
                Some(FlowStateUpdate::from_metadata(MetadataPatch {
                    viewport: Some(ViewportPatch {
                        x: Some(viewport.x + delta.x),
                        y: Some(viewport.y + delta.y),
                        ..Default::default()
                    }),
                    ..Default::default()
                }))
            }

            Command::SetViewport { patch } => {
                if let Some(zoom) = patch.zoom
                    && !(self.config.zoom_min..=self.config.zoom_max).contains(&zoom)
                {
                    log::warn!(
                        "setViewport: zoom {zoom} outside [{}, {}]; refusing rather than clamping silently",
                        self.config.zoom_min,
                        self.config.zoom_max
                    );
                    return None;
                }
                Some(FlowStateUpdate::from_metadata(MetadataPatch {
                    viewport: Some(*patch),
                    ..Default::default()
                }))
            }

            Command::SetZoom { zoom, anchor } => self.set_zoom_update(state, *zoom, *anchor),

            Command::ZoomToFit { ids } => self.zoom_to_fit_update(state, ids.as_deref()),

            Command::Copy => {
                let Some(content) = crate::interaction::clipboard_snapshot(state)
                else {
                    log::debug!("copy: selection is empty; clipboard unchanged");
                    return None;
                };
                self.actions.clipboard = Some(content);
                Some(FlowStateUpdate::default())
            }

            Command::Cut => {
                let Some(content) = crate::interaction::clipboard_snapshot(state)
                else {
                    log::debug!("cut: selection is empty");
                    return None;
                };
                self.actions.clipboard = Some(content);
                let node_ids: Vec<Id> = state.selected_nodes().map(|n| n.id).collect();
                let edge_ids: Vec<Id> = state.selected_edges().map(|e| e.id).collect();
                Some(delete_update(state, &node_ids, &edge_ids))
            }

            Command::Paste { position } => self.paste_update(state, *position),

            Command::StartLinking { source, port } => {
                let Some(node) = state.node(*source) else {
                    log::warn!("startLinking: source node {source} not found");
                    return None;
                };
                if let Some(port) = port
                    && node.port(*port).is_none()
                {
                    log::warn!("startLinking: port {port} does not exist on node {source}");
                    return None;
                }
                // No state change yet; the provisional edge lives in the
                // linking action slot until the gesture ends.
                Some(FlowStateUpdate::default())
            }

            Command::UpdateLinking { position } => {
                if let Some(linking) = self.actions.linking.as_mut() {
                    linking.target_position = *position;
                }
                Some(FlowStateUpdate::default())
            }

            Command::EndLinking { source, source_port, target } => {
                self.actions.linking = None;
                let Some(target) = target else {
                    log::debug!("endLinking: released without a target; discarding");
                    return Some(FlowStateUpdate::default());
                };
                if state.node(*source).is_none() {
                    log::warn!("endLinking: source node {source} no longer exists");
                    return None;
                }
                if state.node(target.node).is_none() {
                    log::warn!("endLinking: target node {} no longer exists", target.node);
                    return None;
                }
                let mut edge =
                    Edge::new(self.env.fresh_id("edge"), Some(*source), Some(target.node));
                edge.source_port = *source_port;
                edge.target_port = target.port;
                edge.routing = Routing::Orthogonal;
                Some(FlowStateUpdate { edges_to_add: vec![edge], ..Default::default() })
            }

            Command::SetGroup { ids, group } => {
                if let Some(group) = group {
                    if state.node(*group).is_none() {
                        log::warn!("setGroup: group node {group} not found");
                        return None;
                    }
                    for id in ids {
                        if would_create_cycle(state, *id, *group) {
                            log::warn!(
                                "setGroup: putting {id} under {group} would make a node its own ancestor; refusing"
                            );
                            return None;
                        }
                    }
                }
                let mut patches = Vec::new();
                for id in ids {
                    if state.node(*id).is_none() {
                        log::warn!("setGroup: node {id} not found; skipping");
                        continue;
                    }
                    patches.push(NodePatch { id: *id, group_id: Some(*group), ..Default::default() });
                }
                (!patches.is_empty()).then(|| FlowStateUpdate::from_node_patches(patches))
            }

            Command::BringToFront { ids } => Some(reorder_update(state, ids, true)),
            Command::SendToBack { ids } => Some(reorder_update(state, ids, false)),

            Command::DeleteSelection => {
                let node_ids: Vec<Id> = state.selected_nodes().map(|n| n.id).collect();
                let edge_ids: Vec<Id> = state.selected_edges().map(|e| e.id).collect();
                if node_ids.is_empty() && edge_ids.is_empty() {
                    log::debug!("deleteSelection: nothing selected");
                    return None;
                }
                Some(delete_update(state, &node_ids, &edge_ids))
            }

            Command::Undo | Command::Redo => unreachable!("handled before validation"),
        }
    }

    fn set_zoom_update(
        &self,
        state: &FlowState,
        zoom: f64,
        anchor: Option<Point>,
    ) -> Option<FlowStateUpdate> {
        let (min, max) = (self.config.zoom_min, self.config.zoom_max);
        if !(min..=max).contains(&zoom) || !zoom.is_finite() {
            log::warn!("setZoom: {zoom} outside [{min}, {max}]; refusing rather than clamping silently");
            return None;
        }
        let viewport = state.metadata.viewport;
        let anchor = anchor.or_else(|| {
            let (w, h) = (viewport.width?, viewport.height?);
            Some(Point::new(w / 2.0, h / 2.0))
        });
        let (x, y) = match anchor {
            // Keep the anchor's world point stationary on screen.
            Some(a) => {
                let scale = zoom / viewport.zoom;
                (a.x - (a.x - viewport.x) * scale, a.y - (a.y - viewport.y) * scale)
            }
            None => (viewport.x, viewport.y),
        };
        Some(FlowStateUpdate::from_metadata(MetadataPatch {
            viewport: Some(ViewportPatch {
                x: Some(x),
                y: Some(y),
                zoom: Some(zoom),
                ..Default::default()
            }),
            ..Default::default()
        }))
    }

    fn zoom_to_fit_update(&self, state: &FlowState, ids: Option<&[Id]>) -> Option<FlowStateUpdate> {
        let viewport = state.metadata.viewport;
        let (Some(width), Some(height)) = (viewport.width, viewport.height) else {
            log::warn!("zoomToFit: viewport has no measured size yet");
            return None;
        };

        let pad = self.config.zoom_to_fit_padding;
        if width - 2.0 * pad <= 0.0 || height - 2.0 * pad <= 0.0 {
            log::warn!("zoomToFit: padding {pad} leaves no viewable area in {width}x{height}");
            return None;
        }

        let wanted = |id: Id| ids.is_none_or(|ids| ids.contains(&id));
        let mut bounds: Option<Rect> = None;
        let mut any = false;
        for node in &state.nodes {
            if !wanted(node.id) {
                continue;
            }
            any = true;
            let Some(_) = node.size else {
                log::warn!("zoomToFit: node {} has no measured size; aborting", node.id);
                return None;
            };
            let r = node.rect();
            bounds = Some(bounds.map_or(r, |b| b.union(&r)));
        }
        for edge in &state.edges {
            if !wanted(edge.id) {
                continue;
            }
            any = true;
            if edge.points.is_empty() {
                log::warn!("zoomToFit: edge {} has no routed points; aborting", edge.id);
                return None;
            }
            for p in &edge.points {
                let r = Rect::new(p.x, p.y, 0.0, 0.0);
                bounds = Some(bounds.map_or(r, |b| b.union(&r)));
            }
        }
        if !any {
            log::warn!("zoomToFit: target set is empty");
            return None;
        }
        let bounds = bounds?;

        let fit = |available: f64, extent: f64| {
            if extent > 0.0 { available / extent } else { f64::INFINITY }
        };
        let zoom = fit(width - 2.0 * pad, bounds.width)
            .min(fit(height - 2.0 * pad, bounds.height))
            .clamp(self.config.zoom_min, self.config.zoom_max);

        let center = bounds.center();
        Some(FlowStateUpdate::from_metadata(MetadataPatch {
            viewport: Some(ViewportPatch {
                x: Some(width / 2.0 - center.x * zoom),
                y: Some(height / 2.0 - center.y * zoom),
                zoom: Some(zoom),
                ..Default::default()
            }),
            ..Default::default()
        }))
    }

    fn paste_update(&mut self, state: &FlowState, position: Option<Point>) -> Option<FlowStateUpdate> {
        let Some(content) = self.actions.clipboard.clone() else {
            log::warn!("paste: clipboard is empty");
            return None;
        };

        // Fresh identity for every pasted entity, then remap the internal
        // references (group membership, port ownership, edge endpoints).
        let mut id_map: HashMap<Id, Id> = HashMap::new();
        for node in &content.nodes {
            id_map.insert(node.id, self.env.fresh_id("node"));
        }

        let offset = match (position, content.nodes.as_slice()) {
            // A single node centers on the cursor.
            (Some(cursor), [only]) => cursor - only.center(),
            // Multiple nodes keep their relative layout around the cursor.
            (Some(cursor), _) => cursor - content.anchor,
            (None, _) => PASTE_OFFSET,
        };

        let mut update = FlowStateUpdate::default();
        for node in &content.nodes {
            let mut clone = node.clone();
            clone.id = id_map[&node.id];
            clone.position += offset;
            clone.selected = true;
            clone.z_order = None;
            clone.computed_z_index = 0;
            clone.group_id = node.group_id.and_then(|g| {
                id_map.get(&g).copied().or_else(|| state.node(g).map(|n| n.id))
            });
            for port in &mut clone.ports {
                port.node_id = clone.id;
                port.position = port.position.map(|p| p + offset);
            }
            update.nodes_to_add.push(clone);
        }

        for edge in &content.edges {
            let mut clone = edge.clone();
            clone.id = self.env.fresh_id("edge");
            clone.source = edge.source.map(|s| id_map[&s]);
            clone.target = edge.target.map(|t| id_map[&t]);
            clone.source_position = edge.source_position.map(|p| p + offset);
            clone.target_position = edge.target_position.map(|p| p + offset);
            clone.points.clear(); // re-routed on commit
            clone.selected = true;
            clone.z_order = None;
            clone.computed_z_index = 0;
            for label in &mut clone.labels {
                label.position = None;
            }
            update.edges_to_add.push(clone);
        }

        // The pasted set becomes the selection.
        for node in state.selected_nodes() {
            update.node_patches.push(NodePatch {
                id: node.id,
                selected: Some(false),
                ..Default::default()
            });
        }
        for edge in state.selected_edges() {
            update.edge_patches.push(EdgePatch {
                id: edge.id,
                selected: Some(false),
                ..Default::default()
            });
        }

        Some(update)
    }
}

// ─── Free helpers ────────────────────────────────────────────────────────

fn init_update(nodes: &[Node], edges: &[Edge]) -> FlowStateUpdate {
    let mut update = FlowStateUpdate::default();
    for node in nodes {
        if update.nodes_to_add.iter().any(|n| n.id == node.id) {
            log::warn!("init: duplicate node id {}; keeping the first", node.id);
            continue;
        }
        update.nodes_to_add.push(node.clone());
    }
    for edge in edges {
        if update.edges_to_add.iter().any(|e| e.id == edge.id) {
            log::warn!("init: duplicate edge id {}; keeping the first", edge.id);
            continue;
        }
        if !edge.endpoints_valid() {
            log::warn!(
                "init: edge {} has a detached endpoint without an explicit position; dropping",
                edge.id
            );
            continue;
        }
        let missing = [edge.source, edge.target]
            .into_iter()
            .flatten()
            .find(|nid| !update.nodes_to_add.iter().any(|n| n.id == *nid));
        if let Some(nid) = missing {
            log::warn!("init: edge {} references unknown node {nid}; dropping", edge.id);
            continue;
        }
        update.edges_to_add.push(edge.clone());
    }
    update
}

/// Deletion with referential cleanup: edges touching a removed node go
/// too, and children of a removed group are detached rather than deleted.
fn delete_update(state: &FlowState, node_ids: &[Id], edge_ids: &[Id]) -> FlowStateUpdate {
    let mut update = FlowStateUpdate::default();

    for id in node_ids {
        if state.node(*id).is_none() {
            log::warn!("delete: node {id} not found; skipping");
            continue;
        }
        update.nodes_to_remove.push(*id);
    }
    for id in edge_ids {
        if state.edge(*id).is_none() {
            log::warn!("delete: edge {id} not found; skipping");
            continue;
        }
        update.edges_to_remove.push(*id);
    }

    for edge in state.edges_connected_to(&update.nodes_to_remove) {
        if !update.edges_to_remove.contains(&edge.id) {
            update.edges_to_remove.push(edge.id);
        }
    }

    for node in &state.nodes {
        if let Some(group) = node.group_id
            && update.nodes_to_remove.contains(&group)
            && !update.nodes_to_remove.contains(&node.id)
        {
            update.node_patches.push(NodePatch {
                id: node.id,
                group_id: Some(None),
                ..Default::default()
            });
        }
    }

    update
}

fn selection_update(state: &FlowState, ids: &[Id], selected: bool) -> FlowStateUpdate {
    let mut update = FlowStateUpdate::default();
    for id in ids {
        if let Some(node) = state.node(*id) {
            if node.selected != selected {
                update.node_patches.push(NodePatch {
                    id: *id,
                    selected: Some(selected),
                    ..Default::default()
                });
            }
        } else if let Some(edge) = state.edge(*id) {
            if edge.selected != selected {
                update.edge_patches.push(EdgePatch {
                    id: *id,
                    selected: Some(selected),
                    ..Default::default()
                });
            }
        } else {
            log::warn!("select: id {id} not found; skipping");
        }
    }
    update
}

/// Explicit z-order: one past the current extremum, applied per entity.
fn reorder_update(state: &FlowState, ids: &[Id], to_front: bool) -> FlowStateUpdate {
    let extremum = state
        .nodes
        .iter()
        .map(|n| n.computed_z_index)
        .chain(state.edges.iter().map(|e| e.computed_z_index))
        .fold(0, |acc, z| if to_front { acc.max(z) } else { acc.min(z) });
    let z = if to_front { extremum + 1 } else { extremum - 1 };

    let mut update = FlowStateUpdate::default();
    for id in ids {
        if state.node(*id).is_some() {
            update.node_patches.push(NodePatch {
                id: *id,
                z_order: Some(Some(z)),
                ..Default::default()
            });
        } else if state.edge(*id).is_some() {
            update.edge_patches.push(EdgePatch {
                id: *id,
                z_order: Some(Some(z)),
                ..Default::default()
            });
        } else {
            log::warn!("reorder: id {id} not found; skipping");
        }
    }
    update
}
