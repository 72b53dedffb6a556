//! Resize interaction.
//!
//! Start captures the node's rect and the grabbed handle; continue
//! recomputes the rect from the pointer delta. Corner handles move both
//! axes, edge handles one. Sizes clamp to the configured minimum with the
//! *opposite* edge held in place, so shrinking past the minimum never
//! drags the whole node around. With a snap grid configured, the moving
//! edge snaps first and the size is recomputed from the snapped edge —
//! snapping the raw size instead makes left/top handles jitter.

use crate::action::{ActionStateStore, ResizeAction};
use crate::command::Command;
use crate::input::{InteractionContext, InteractionEvent, InteractionHandler, Phase, ResizeHandle};
use fb_core::hierarchy::descendants_of;
use fb_core::{FlowConfig, FlowState, Id, Point, Rect, snap};

pub struct ResizeInteraction;

impl InteractionHandler for ResizeInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        match event.phase {
            Phase::Start => {
                let (Some(pointer), Some(node_id), Some(handle)) =
                    (event.pointer, event.node, event.handle)
                else {
                    log::warn!("resize: start event missing pointer, node or handle");
                    return Vec::new();
                };
                let Some(node) = ctx.state.node(node_id) else {
                    log::warn!(
                        "resize: node {node_id} not found; it may have been deleted while the gesture began"
                    );
                    return Vec::new();
                };
                let Some(size) = node.size else {
                    log::warn!("resize: node {node_id} has no measured size yet");
                    return Vec::new();
                };
                actions.resize = Some(ResizeAction {
                    node: node_id,
                    handle,
                    start_rect: Rect::from_point_size(node.position, size),
                    start_pointer: pointer.position,
                });
                Vec::new()
            }
            Phase::Continue => {
                let (Some(action), Some(pointer)) = (actions.resize.clone(), event.pointer) else {
                    return Vec::new();
                };
                let Some(node) = ctx.state.node(action.node) else {
                    return Vec::new();
                };

                let delta = pointer.position - action.start_pointer;
                let mut rect = resized_rect(action.start_rect, delta, action.handle, ctx.config);

                // A group must keep containing everything inside it.
                rect = expand_to_descendants(rect, ctx.state, action.node);

                let unchanged = node.position == rect.position()
                    && node.size.is_some_and(|s| s == rect.size());
                if unchanged {
                    return Vec::new();
                }
                vec![Command::ResizeNode {
                    id: action.node,
                    size: rect.size(),
                    position: Some(rect.position()),
                }]
            }
            Phase::End => {
                actions.resize = None;
                Vec::new()
            }
        }
    }
}

/// Apply a pointer delta to the start rect for one of the 8 handles.
fn resized_rect(start: Rect, delta: Point, handle: ResizeHandle, config: &FlowConfig) -> Rect {
    let (left, right, top, bottom) = handle.edges();
    let step = config.snap_step;
    let min = config.min_node_size;
    let snapped = |v: f64| step.map_or(v, |s| snap(v, s));

    let mut rect = start;

    if right {
        let new_right = snapped(start.right() + delta.x);
        rect.width = (new_right - rect.x).max(min.width);
    }
    if left {
        let new_x = snapped(start.x + delta.x);
        rect.width = (start.right() - new_x).max(min.width);
        // Opposite (right) edge stays put.
        rect.x = start.right() - rect.width;
    }
    if bottom {
        let new_bottom = snapped(start.bottom() + delta.y);
        rect.height = (new_bottom - rect.y).max(min.height);
    }
    if top {
        let new_y = snapped(start.y + delta.y);
        rect.height = (start.bottom() - new_y).max(min.height);
        rect.y = start.bottom() - rect.height;
    }

    rect
}

/// Grow `rect` until it contains the bounds of every descendant of `group`.
fn expand_to_descendants(rect: Rect, state: &FlowState, group: Id) -> Rect {
    let mut out = rect;
    for id in descendants_of(state, group) {
        if let Some(node) = state.node(id)
            && node.size.is_some()
        {
            out = out.union(&node.rect());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(snap_step: Option<f64>) -> FlowConfig {
        FlowConfig { snap_step, ..Default::default() }
    }

    #[test]
    fn corner_handle_moves_both_axes() {
        let start = Rect::new(0.0, 0.0, 100.0, 50.0);
        let out = resized_rect(start, Point::new(20.0, 10.0), ResizeHandle::BottomRight, &cfg(None));
        assert_eq!(out, Rect::new(0.0, 0.0, 120.0, 60.0));
    }

    #[test]
    fn edge_handle_moves_one_axis() {
        let start = Rect::new(0.0, 0.0, 100.0, 50.0);
        let out = resized_rect(start, Point::new(20.0, 10.0), ResizeHandle::Right, &cfg(None));
        assert_eq!(out, Rect::new(0.0, 0.0, 120.0, 50.0));
    }

    #[test]
    fn left_handle_keeps_right_edge_fixed_under_min_clamp() {
        let start = Rect::new(0.0, 0.0, 100.0, 50.0);
        // Drag the left edge far past the right edge.
        let out = resized_rect(start, Point::new(300.0, 0.0), ResizeHandle::Left, &cfg(None));
        assert_eq!(out.width, 10.0); // min
        assert_eq!(out.right(), 100.0); // opposite edge anchored
        assert_eq!(out.height, 50.0);
    }

    #[test]
    fn top_handle_keeps_bottom_edge_fixed_under_min_clamp() {
        let start = Rect::new(10.0, 10.0, 100.0, 50.0);
        let out = resized_rect(start, Point::new(0.0, 200.0), ResizeHandle::Top, &cfg(None));
        assert_eq!(out.height, 10.0);
        assert_eq!(out.bottom(), 60.0);
        assert_eq!(out.x, 10.0);
    }

    #[test]
    fn snapping_recomputes_size_from_snapped_edge() {
        let start = Rect::new(0.0, 0.0, 100.0, 50.0);
        // Left edge to 13 → snaps to 15; width derives from the snapped
        // position, keeping the right edge exactly at 100.
        let out = resized_rect(start, Point::new(13.0, 0.0), ResizeHandle::Left, &cfg(Some(5.0)));
        assert_eq!(out.x, 15.0);
        assert_eq!(out.width, 85.0);
        assert_eq!(out.right(), 100.0);
    }
}
