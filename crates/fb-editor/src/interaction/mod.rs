//! Interaction state machines.
//!
//! One handler per named input event. Each is a phase machine over
//! start/continue/end: start populates the handler's action-state slot,
//! continue turns pointer/keyboard input into commands, end clears the
//! slot. Handlers never touch `FlowState` directly — they only read the
//! snapshot in their context and return commands.

mod box_select;
mod clipboard;
mod drag;
mod keyboard;
mod linking;
mod pan;
mod resize;
mod rotate;

pub use box_select::BoxSelectInteraction;
pub use clipboard::{
    CopyInteraction, CutInteraction, DeleteSelectionInteraction, DeselectAllInteraction,
    PaletteDropInteraction, PasteInteraction, RedoInteraction, SelectAllInteraction,
    UndoInteraction, ZoomStepInteraction, ZoomToFitInteraction, clipboard_snapshot,
};
pub use drag::DragInteraction;
pub use keyboard::{KeyboardMoveInteraction, KeyboardPanInteraction};
pub use linking::LinkingInteraction;
pub use pan::{PanInteraction, take_pending_pan};
pub use resize::ResizeInteraction;
pub use rotate::RotateInteraction;

use crate::input::InputRouter;
use fb_core::Point;

/// Register the stock handler for every built-in event name.
pub fn register_defaults(router: &mut InputRouter) {
    router.register("panning", Box::new(PanInteraction::throttled()));
    router.register("resize", Box::new(ResizeInteraction));
    router.register("rotate", Box::new(RotateInteraction));
    router.register("linking", Box::new(LinkingInteraction));
    router.register("drag", Box::new(DragInteraction::new()));
    router.register("boxSelect", Box::new(BoxSelectInteraction::new()));
    router.register("keyboardMoveSelection", Box::new(KeyboardMoveInteraction));
    router.register("keyboardPanning", Box::new(KeyboardPanInteraction));
    router.register("paletteDrop", Box::new(PaletteDropInteraction));
    router.register("copy", Box::new(CopyInteraction));
    router.register("cut", Box::new(CutInteraction));
    router.register("paste", Box::new(PasteInteraction));
    router.register("deleteSelection", Box::new(DeleteSelectionInteraction));
    router.register("selectAll", Box::new(SelectAllInteraction));
    router.register("deselectAll", Box::new(DeselectAllInteraction));
    router.register("zoomIn", Box::new(ZoomStepInteraction::zoom_in()));
    router.register("zoomOut", Box::new(ZoomStepInteraction::zoom_out()));
    router.register("zoomToFit", Box::new(ZoomToFitInteraction));
    router.register("undo", Box::new(UndoInteraction));
    router.register("redo", Box::new(RedoInteraction));
}

/// Viewport-edge panning: when `screen` comes within `threshold` of the
/// measured canvas boundary, returns the viewport delta that scrolls
/// further content into view.
pub(crate) fn edge_pan_delta(
    screen: Point,
    width: f64,
    height: f64,
    threshold: f64,
    force: f64,
) -> Option<Point> {
    let mut delta = Point::ZERO;
    if screen.x < threshold {
        delta.x = force;
    } else if screen.x > width - threshold {
        delta.x = -force;
    }
    if screen.y < threshold {
        delta.y = force;
    } else if screen.y > height - threshold {
        delta.y = -force;
    }
    (delta != Point::ZERO).then_some(delta)
}

/// World → screen using the committed viewport transform.
pub(crate) fn to_screen(world: Point, viewport: &fb_core::Viewport) -> Point {
    Point::new(world.x * viewport.zoom + viewport.x, world.y * viewport.zoom + viewport.y)
}
