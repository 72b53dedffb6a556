//! Marquee (box) selection.
//!
//! Drag on empty canvas spans a rubber-band rectangle; release selects
//! every node it touches. Shift adds to the existing selection instead of
//! replacing it. The in-flight rectangle is purely visual state, owned by
//! the handler and exposed for the host to render.

use crate::action::ActionStateStore;
use crate::command::Command;
use crate::input::{InteractionContext, InteractionEvent, InteractionHandler, Phase};
use fb_core::{Id, Point, Rect};

pub struct BoxSelectInteraction {
    origin: Option<Point>,
    rect: Option<Rect>,
}

impl BoxSelectInteraction {
    pub fn new() -> Self {
        Self { origin: None, rect: None }
    }

    /// The current marquee rectangle, for rendering.
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }
}

impl Default for BoxSelectInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionHandler for BoxSelectInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        _actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        match event.phase {
            Phase::Start => {
                let Some(pointer) = event.pointer else {
                    log::warn!("boxSelect: start event carries no pointer");
                    return Vec::new();
                };
                self.origin = Some(pointer.position);
                self.rect = Some(Rect::from_corners(pointer.position, pointer.position));
                Vec::new()
            }
            Phase::Continue => {
                let (Some(origin), Some(pointer)) = (self.origin, event.pointer) else {
                    return Vec::new();
                };
                self.rect = Some(Rect::from_corners(origin, pointer.position));
                Vec::new()
            }
            Phase::End => {
                let rect = self.rect.take();
                self.origin = None;
                let Some(rect) = rect else {
                    return Vec::new();
                };

                let ids: Vec<Id> = ctx
                    .state
                    .nodes
                    .iter()
                    .filter(|n| n.size.is_some() && n.rect().intersects(&rect))
                    .map(|n| n.id)
                    .collect();

                let additive = event.pointer.is_some_and(|p| p.modifiers.shift);
                let mut commands = Vec::new();
                if !additive {
                    commands.push(Command::DeselectAll);
                }
                if !ids.is_empty() {
                    commands.push(Command::Select { ids });
                }
                commands
            }
        }
    }
}
