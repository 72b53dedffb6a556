//! Rotate interaction.
//!
//! Start records the pointer's angle about the node center together with
//! the node's starting angle; continue re-derives the delta and adds it
//! to the start angle. Pointer samples inside the dead-zone radius are
//! ignored — atan2 swings wildly that close to the pivot. Snapping:
//! the configured step when set, otherwise a micro-snap onto the nearest
//! cardinal (0/90/180/270) within a small tolerance.

use crate::action::{ActionStateStore, RotationAction};
use crate::command::Command;
use crate::input::{InteractionContext, InteractionEvent, InteractionHandler, Phase};
use fb_core::Point;

pub struct RotateInteraction;

impl InteractionHandler for RotateInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        match event.phase {
            Phase::Start => {
                let (Some(pointer), Some(node_id)) = (event.pointer, event.node) else {
                    log::warn!("rotate: start event missing pointer or node");
                    return Vec::new();
                };
                let Some(node) = ctx.state.node(node_id) else {
                    log::warn!(
                        "rotate: node {node_id} not found; it may have been deleted while the gesture began"
                    );
                    return Vec::new();
                };
                let center = node.center();
                actions.rotation = Some(RotationAction {
                    node: node_id,
                    center,
                    start_angle: node.angle.unwrap_or(0.0),
                    start_pointer_angle: pointer_angle(pointer.position, center),
                });
                Vec::new()
            }
            Phase::Continue => {
                let (Some(action), Some(pointer)) = (actions.rotation.clone(), event.pointer)
                else {
                    return Vec::new();
                };
                if pointer.position.distance_to(&action.center) < ctx.config.rotation_dead_zone {
                    return Vec::new();
                }

                let delta =
                    pointer_angle(pointer.position, action.center) - action.start_pointer_angle;
                let mut angle = (action.start_angle + delta).rem_euclid(360.0);

                if let Some(step) = ctx.config.rotation_snap {
                    angle = fb_core::snap(angle, step).rem_euclid(360.0);
                } else {
                    angle = micro_snap(angle, ctx.config.rotation_cardinal_tolerance);
                }

                let current = ctx.state.node(action.node).and_then(|n| n.angle);
                if current == Some(angle) {
                    return Vec::new();
                }
                vec![Command::RotateNode { id: action.node, angle }]
            }
            Phase::End => {
                actions.rotation = None;
                Vec::new()
            }
        }
    }
}

/// Degrees of the pointer about `center`, screen-clockwise.
fn pointer_angle(pointer: Point, center: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees()
}

/// Pull `angle` onto the nearest cardinal when within `tolerance`.
fn micro_snap(angle: f64, tolerance: f64) -> f64 {
    for cardinal in [0.0, 90.0, 180.0, 270.0, 360.0] {
        if (angle - cardinal).abs() <= tolerance {
            return cardinal.rem_euclid(360.0);
        }
    }
    angle
}
