//! Transient interaction state.
//!
//! One slot per interaction type, populated on the gesture's start phase
//! and cleared on end/cancel. These records are deliberately *not* part
//! of `FlowState` — they never reach the model adapter or undo history.
//! Each slot has exactly one writer: the interaction that owns it.

use crate::input::ResizeHandle;
use fb_core::{Edge, Id, Node, Point, Rect};

/// In-progress resize gesture.
#[derive(Debug, Clone)]
pub struct ResizeAction {
    pub node: Id,
    pub handle: ResizeHandle,
    /// Node rect when the gesture started.
    pub start_rect: Rect,
    pub start_pointer: Point,
}

/// In-progress rotation gesture.
#[derive(Debug, Clone)]
pub struct RotationAction {
    pub node: Id,
    pub center: Point,
    /// Node angle at gesture start, degrees.
    pub start_angle: f64,
    /// Pointer angle about the center at gesture start, degrees.
    pub start_pointer_angle: f64,
}

/// In-progress connector creation.
#[derive(Debug, Clone)]
pub struct LinkingAction {
    pub source: Id,
    pub source_port: Option<Id>,
    /// Where the provisional edge currently ends.
    pub target_position: Point,
}

/// In-progress node drag.
#[derive(Debug, Clone)]
pub struct DragAction {
    pub last_pointer: Point,
}

/// In-progress viewport pan.
#[derive(Debug, Clone)]
pub struct PanAction {
    pub last_pointer: Point,
    /// Delta accumulated since the last animation-frame flush
    /// (throttled variant only; the direct variant leaves this at zero).
    pub pending: Point,
}

/// Clipboard contents from the last copy/cut.
#[derive(Debug, Clone)]
pub struct ClipboardContent {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Center of the copied nodes' bounding box, for paste placement.
    pub anchor: Point,
}

/// The store. At most one record per slot at any time.
#[derive(Debug, Clone, Default)]
pub struct ActionStateStore {
    pub resize: Option<ResizeAction>,
    pub rotation: Option<RotationAction>,
    pub linking: Option<LinkingAction>,
    pub drag: Option<DragAction>,
    pub pan: Option<PanAction>,
    /// Unlike the gesture slots, survives until the next copy/cut.
    pub clipboard: Option<ClipboardContent>,
}

impl ActionStateStore {
    /// Drop every in-flight gesture (interaction cancellation). The
    /// clipboard is content, not a gesture, and survives.
    pub fn cancel_gestures(&mut self) {
        self.resize = None;
        self.rotation = None;
        self.linking = None;
        self.drag = None;
        self.pan = None;
    }
}
