//! Node drag (move selection) interaction.
//!
//! Click semantics follow the usual select-tool conventions: plain click
//! on an unselected node replaces the selection, shift-click toggles,
//! clicking an already-selected node keeps the selection so the whole
//! group drags together.

use crate::action::{ActionStateStore, DragAction};
use crate::command::Command;
use crate::input::{InteractionContext, InteractionEvent, InteractionHandler, Phase};
use fb_core::{Id, Point, snap_point};

pub struct DragInteraction {
    /// Unsnapped pointer travel left over after grid snapping.
    remainder: Point,
}

impl DragInteraction {
    pub fn new() -> Self {
        Self { remainder: Point::ZERO }
    }
}

impl Default for DragInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionHandler for DragInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        match event.phase {
            Phase::Start => {
                let Some(pointer) = event.pointer else {
                    log::warn!("drag: start event carries no pointer");
                    return Vec::new();
                };
                self.remainder = Point::ZERO;
                actions.drag = Some(DragAction { last_pointer: pointer.position });

                let Some(hit) = event.node else {
                    return Vec::new();
                };
                let selected = ctx.state.node(hit).is_some_and(|n| n.selected);
                if pointer.modifiers.shift {
                    return if selected {
                        vec![Command::Deselect { ids: vec![hit] }]
                    } else {
                        vec![Command::Select { ids: vec![hit] }]
                    };
                }
                if !selected {
                    return vec![Command::DeselectAll, Command::Select { ids: vec![hit] }];
                }
                Vec::new()
            }
            Phase::Continue => {
                let (Some(drag), Some(pointer)) = (actions.drag.as_mut(), event.pointer) else {
                    return Vec::new();
                };
                let mut delta = pointer.position - drag.last_pointer;
                drag.last_pointer = pointer.position;

                // Shift constrains to the dominant axis.
                if pointer.modifiers.shift {
                    if delta.x.abs() > delta.y.abs() {
                        delta.y = 0.0;
                    } else {
                        delta.x = 0.0;
                    }
                }

                // Grid snap: accumulate sub-step travel and release it in
                // whole steps so the node tracks the grid, not the pointer.
                if let Some(step) = ctx.config.snap_step {
                    let accumulated = self.remainder + delta;
                    let stepped = snap_point(accumulated, step);
                    self.remainder = accumulated - stepped;
                    delta = stepped;
                }

                if delta == Point::ZERO {
                    return Vec::new();
                }
                let ids: Vec<Id> = ctx.state.selected_nodes().map(|n| n.id).collect();
                if ids.is_empty() {
                    return Vec::new();
                }
                vec![Command::MoveNodesBy { ids, delta }]
            }
            Phase::End => {
                actions.drag = None;
                self.remainder = Point::ZERO;
                Vec::new()
            }
        }
    }
}
