//! Arrow-key movement.
//!
//! `keyboardMoveSelection` nudges the selected nodes by one step
//! (the snap-grid step when configured) and pans the viewport along when
//! the moving selection nears the visible edge. `keyboardPanning` scrolls
//! the viewport itself.

use crate::action::ActionStateStore;
use crate::command::Command;
use crate::input::{InteractionContext, InteractionEvent, InteractionHandler};
use crate::interaction::to_screen;
use fb_core::{Id, Point, Rect};

fn arrow_direction(key: &str) -> Option<Point> {
    match key {
        "ArrowLeft" => Some(Point::new(-1.0, 0.0)),
        "ArrowRight" => Some(Point::new(1.0, 0.0)),
        "ArrowUp" => Some(Point::new(0.0, -1.0)),
        "ArrowDown" => Some(Point::new(0.0, 1.0)),
        _ => None,
    }
}

pub struct KeyboardMoveInteraction;

impl InteractionHandler for KeyboardMoveInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        let Some(key) = &event.key else {
            return Vec::new();
        };
        let Some(dir) = arrow_direction(&key.key) else {
            return Vec::new();
        };
        let step = ctx.config.snap_step.unwrap_or(ctx.config.keyboard_move_step);
        let delta = Point::new(dir.x * step, dir.y * step);

        let ids: Vec<Id> = ctx.state.selected_nodes().map(|n| n.id).collect();
        if ids.is_empty() {
            return Vec::new();
        }

        let mut commands = vec![Command::MoveNodesBy { ids: ids.clone(), delta }];

        // Keep the moving selection in view.
        let viewport = &ctx.state.metadata.viewport;
        if let (Some(w), Some(h)) = (viewport.width, viewport.height) {
            let mut bounds: Option<Rect> = None;
            for id in &ids {
                if let Some(node) = ctx.state.node(*id) {
                    let r = node.rect();
                    bounds = Some(bounds.map_or(r, |b| b.union(&r)));
                }
            }
            if let Some(bounds) = bounds {
                let moved = Rect::new(
                    bounds.x + delta.x,
                    bounds.y + delta.y,
                    bounds.width,
                    bounds.height,
                );
                let threshold = ctx.config.edge_pan_threshold;
                let force = ctx.config.edge_pan_force;
                let top_left = to_screen(moved.position(), viewport);
                let bottom_right = to_screen(Point::new(moved.right(), moved.bottom()), viewport);

                let mut pan = Point::ZERO;
                if dir.x < 0.0 && top_left.x < threshold {
                    pan.x = force;
                } else if dir.x > 0.0 && bottom_right.x > w - threshold {
                    pan.x = -force;
                }
                if dir.y < 0.0 && top_left.y < threshold {
                    pan.y = force;
                } else if dir.y > 0.0 && bottom_right.y > h - threshold {
                    pan.y = -force;
                }
                if pan != Point::ZERO {
                    commands.push(Command::MoveViewportBy { delta: pan });
                }
            }
        }

        commands
    }
}

pub struct KeyboardPanInteraction;

impl InteractionHandler for KeyboardPanInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        let Some(key) = &event.key else {
            return Vec::new();
        };
        let Some(dir) = arrow_direction(&key.key) else {
            return Vec::new();
        };
        let step = ctx.config.keyboard_move_step;
        // Arrows scroll the view toward that direction: panning left means
        // shifting content right.
        vec![Command::MoveViewportBy { delta: Point::new(-dir.x * step, -dir.y * step) }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_keys_map_to_unit_directions() {
        assert_eq!(arrow_direction("ArrowLeft"), Some(Point::new(-1.0, 0.0)));
        assert_eq!(arrow_direction("ArrowDown"), Some(Point::new(0.0, 1.0)));
        assert_eq!(arrow_direction("Enter"), None);
    }
}
