//! Single-shot event adapters.
//!
//! Clipboard, deletion and history events carry no gesture state of their
//! own — they translate directly into commands. The clipboard *content*
//! lives in the action store and is written by the dispatcher while
//! handling `Copy`/`Cut`, which needs the committed selection snapshot.

use crate::action::ActionStateStore;
use crate::command::Command;
use crate::input::{InteractionContext, InteractionEvent, InteractionHandler};
use fb_core::{Id, Node, Point};

pub struct CopyInteraction;

impl InteractionHandler for CopyInteraction {
    fn handle(
        &mut self,
        _event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        vec![Command::Copy]
    }
}

pub struct CutInteraction;

impl InteractionHandler for CutInteraction {
    fn handle(
        &mut self,
        _event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        vec![Command::Cut]
    }
}

pub struct PasteInteraction;

impl InteractionHandler for PasteInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        vec![Command::Paste { position: event.pointer.map(|p| p.position) }]
    }
}

pub struct DeleteSelectionInteraction;

impl InteractionHandler for DeleteSelectionInteraction {
    fn handle(
        &mut self,
        _event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        vec![Command::DeleteSelection]
    }
}

pub struct UndoInteraction;

impl InteractionHandler for UndoInteraction {
    fn handle(
        &mut self,
        _event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        vec![Command::Undo]
    }
}

pub struct RedoInteraction;

impl InteractionHandler for RedoInteraction {
    fn handle(
        &mut self,
        _event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        vec![Command::Redo]
    }
}

pub struct SelectAllInteraction;

impl InteractionHandler for SelectAllInteraction {
    fn handle(
        &mut self,
        _event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        vec![Command::SelectAll]
    }
}

pub struct DeselectAllInteraction;

impl InteractionHandler for DeselectAllInteraction {
    fn handle(
        &mut self,
        _event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        vec![Command::DeselectAll]
    }
}

/// Stepwise zoom about the pointer (or canvas center). The step clamps
/// to the configured range *here*, so the emitted command is always
/// valid and only out-of-band requests trip the range warning.
pub struct ZoomStepInteraction {
    factor: f64,
}

impl ZoomStepInteraction {
    pub fn zoom_in() -> Self {
        Self { factor: 1.25 }
    }

    pub fn zoom_out() -> Self {
        Self { factor: 0.8 }
    }
}

impl InteractionHandler for ZoomStepInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        let current = ctx.state.metadata.viewport.zoom;
        let target = (current * self.factor).clamp(ctx.config.zoom_min, ctx.config.zoom_max);
        if target == current {
            return Vec::new();
        }
        vec![Command::SetZoom { zoom: target, anchor: event.pointer.map(|p| p.position) }]
    }
}

pub struct ZoomToFitInteraction;

impl InteractionHandler for ZoomToFitInteraction {
    fn handle(
        &mut self,
        _event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        vec![Command::ZoomToFit { ids: None }]
    }
}

/// Palette drop: the host drags a template off its palette and releases
/// it on the canvas. The payload either deserializes into a full [`Node`]
/// or is treated as the new node's opaque `data`.
pub struct PaletteDropInteraction;

impl InteractionHandler for PaletteDropInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        let position = event.pointer.map(|p| p.position).unwrap_or(Point::ZERO);
        let Some(payload) = &event.data else {
            log::warn!("paletteDrop: event carries no payload");
            return Vec::new();
        };

        let node = match serde_json::from_value::<Node>(payload.clone()) {
            Ok(mut node) => {
                node.position = position;
                node
            }
            Err(_) => {
                let mut node = Node::new(ctx.env.fresh_id("node"), position);
                node.data = payload.clone();
                node
            }
        };

        // Fresh ids unless the host already avoided a collision.
        let node = if ctx.state.node(node.id).is_some() {
            let mut clone = node;
            clone.id = ctx.env.fresh_id("node");
            clone
        } else {
            node
        };

        vec![Command::AddNodes { nodes: vec![node] }]
    }
}

/// Snapshot the current selection for the clipboard slot. Lives here so
/// the dispatcher and tests share one definition of "what copy captures":
/// selected nodes plus selected edges that don't dangle outside the set.
pub fn clipboard_snapshot(state: &fb_core::FlowState) -> Option<crate::action::ClipboardContent> {
    let nodes: Vec<Node> = state.selected_nodes().cloned().collect();
    if nodes.is_empty() {
        return None;
    }
    let node_ids: Vec<Id> = nodes.iter().map(|n| n.id).collect();
    let edges: Vec<fb_core::Edge> = state
        .selected_edges()
        .filter(|e| {
            e.source.is_none_or(|s| node_ids.contains(&s))
                && e.target.is_none_or(|t| node_ids.contains(&t))
        })
        .cloned()
        .collect();

    let mut bounds: Option<fb_core::Rect> = None;
    for node in &nodes {
        let r = node.rect();
        bounds = Some(bounds.map_or(r, |b| b.union(&r)));
    }

    Some(crate::action::ClipboardContent {
        nodes,
        edges,
        anchor: bounds.map(|b| b.center()).unwrap_or(Point::ZERO),
    })
}
