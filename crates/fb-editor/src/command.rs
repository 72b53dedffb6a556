//! The command surface.
//!
//! A closed, named catalog of requests. Every state change enters the
//! system as one of these; the dispatcher computes a `FlowStateUpdate`
//! per command and negotiates it through the middleware pipeline. The
//! variant's [`Command::name`] doubles as the pipeline's triggering
//! action tag and the key for after-emit subscriptions.

use fb_core::update::{EdgePatch, NodePatch, ViewportPatch};
use fb_core::{Edge, EdgeLabel, Id, Node, Point, Port, Viewport};
use serde::{Deserialize, Serialize};

/// A resolved linking destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub node: Id,
    pub port: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Replace the whole diagram; the birth of a `FlowState`.
    Init { nodes: Vec<Node>, edges: Vec<Edge>, viewport: Option<Viewport> },

    AddNodes { nodes: Vec<Node> },
    UpdateNode { patch: NodePatch },
    MoveNodesBy { ids: Vec<Id>, delta: Point },
    ResizeNode { id: Id, size: fb_core::Size, position: Option<Point> },
    RotateNode { id: Id, angle: f64 },
    DeleteNodes { ids: Vec<Id> },

    AddEdges { edges: Vec<Edge> },
    UpdateEdge { patch: EdgePatch },
    DeleteEdges { ids: Vec<Id> },

    /// Measured port geometry reported by the host after layout.
    SetNodePorts { id: Id, ports: Vec<Port> },
    /// Measured label set for an edge; pixel positions are derived later.
    SetEdgeLabels { id: Id, labels: Vec<EdgeLabel> },

    Select { ids: Vec<Id> },
    Deselect { ids: Vec<Id> },
    SelectAll,
    DeselectAll,

    MoveViewportBy { delta: Point },
    SetViewport { patch: ViewportPatch },
    /// Zoom about an anchor point in screen coordinates (canvas center
    /// when `None`). Out-of-range requests warn and no-op.
    SetZoom { zoom: f64, anchor: Option<Point> },
    /// Fit the given ids (or everything) into the measured viewport.
    ZoomToFit { ids: Option<Vec<Id>> },

    Copy,
    Cut,
    Paste { position: Option<Point> },

    StartLinking { source: Id, port: Option<Id> },
    UpdateLinking { position: Point },
    EndLinking { source: Id, source_port: Option<Id>, target: Option<LinkTarget> },

    SetGroup { ids: Vec<Id>, group: Option<Id> },

    BringToFront { ids: Vec<Id> },
    SendToBack { ids: Vec<Id> },

    DeleteSelection,

    Undo,
    Redo,
}

impl Command {
    /// Stable action name; tags pipeline invocations and subscriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init { .. } => "init",
            Command::AddNodes { .. } => "addNodes",
            Command::UpdateNode { .. } => "updateNode",
            Command::MoveNodesBy { .. } => "moveNodesBy",
            Command::ResizeNode { .. } => "resizeNode",
            Command::RotateNode { .. } => "rotateNode",
            Command::DeleteNodes { .. } => "deleteNodes",
            Command::AddEdges { .. } => "addEdges",
            Command::UpdateEdge { .. } => "updateEdge",
            Command::DeleteEdges { .. } => "deleteEdges",
            Command::SetNodePorts { .. } => "setNodePorts",
            Command::SetEdgeLabels { .. } => "setEdgeLabels",
            Command::Select { .. } => "select",
            Command::Deselect { .. } => "deselect",
            Command::SelectAll => "selectAll",
            Command::DeselectAll => "deselectAll",
            Command::MoveViewportBy { .. } => "moveViewportBy",
            Command::SetViewport { .. } => "setViewport",
            Command::SetZoom { .. } => "setZoom",
            Command::ZoomToFit { .. } => "zoomToFit",
            Command::Copy => "copy",
            Command::Cut => "cut",
            Command::Paste { .. } => "paste",
            Command::StartLinking { .. } => "startLinking",
            Command::UpdateLinking { .. } => "updateLinking",
            Command::EndLinking { .. } => "endLinking",
            Command::SetGroup { .. } => "setGroup",
            Command::BringToFront { .. } => "bringToFront",
            Command::SendToBack { .. } => "sendToBack",
            Command::DeleteSelection => "deleteSelection",
            Command::Undo => "undo",
            Command::Redo => "redo",
        }
    }
}
