//! Viewport panning.
//!
//! Two variants share one handler. The direct variant emits a
//! `MoveViewportBy` for every pointer move. The throttled variant
//! accumulates deltas in the pan slot and flushes at most one summed
//! command per animation frame — the engine drains it from its frame
//! tick via [`take_pending_pan`]. High-frequency pointer input is thereby
//! coalesced, never dropped and never queued unboundedly.

use crate::action::{ActionStateStore, PanAction};
use crate::command::Command;
use crate::input::{InteractionContext, InteractionEvent, InteractionHandler, Phase};
use fb_core::Point;

pub struct PanInteraction {
    throttled: bool,
}

impl PanInteraction {
    pub fn direct() -> Self {
        Self { throttled: false }
    }

    pub fn throttled() -> Self {
        Self { throttled: true }
    }
}

impl InteractionHandler for PanInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        _ctx: &InteractionContext<'_>,
        actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        match event.phase {
            Phase::Start => {
                let Some(pointer) = event.pointer else {
                    log::warn!("panning: start event carries no pointer");
                    return Vec::new();
                };
                actions.pan =
                    Some(PanAction { last_pointer: pointer.position, pending: Point::ZERO });
                Vec::new()
            }
            Phase::Continue => {
                let Some(pointer) = event.pointer else {
                    return Vec::new();
                };
                let Some(pan) = actions.pan.as_mut() else {
                    return Vec::new();
                };
                let delta = pointer.position - pan.last_pointer;
                pan.last_pointer = pointer.position;
                if delta == Point::ZERO {
                    return Vec::new();
                }
                if self.throttled {
                    pan.pending += delta;
                    Vec::new()
                } else {
                    vec![Command::MoveViewportBy { delta }]
                }
            }
            Phase::End => {
                // Whatever is still pending flushes with the gesture.
                let flush = actions.pan.take().map(|p| p.pending).filter(|d| *d != Point::ZERO);
                match flush {
                    Some(delta) => vec![Command::MoveViewportBy { delta }],
                    None => Vec::new(),
                }
            }
        }
    }
}

/// Drain the accumulated throttled-pan delta, if any. Called once per
/// animation frame by the engine.
pub fn take_pending_pan(actions: &mut ActionStateStore) -> Option<Command> {
    let pan = actions.pan.as_mut()?;
    if pan.pending == Point::ZERO {
        return None;
    }
    let delta = std::mem::take(&mut pan.pending);
    Some(Command::MoveViewportBy { delta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Environment, Platform};
    use crate::input::{Modifiers, Phase};
    use fb_core::{FlowConfig, FlowState};

    fn drive(handler: &mut PanInteraction, actions: &mut ActionStateStore, moves: &[Point]) -> Vec<Command> {
        let state = FlowState::default();
        let config = FlowConfig::default();
        let env = Environment::new(Platform::Linux);
        let ctx = InteractionContext { state: &state, config: &config, env: &env };

        let mut out = Vec::new();
        out.extend(handler.handle(
            &InteractionEvent::pointer(Phase::Start, Point::ZERO, Modifiers::NONE),
            &ctx,
            actions,
        ));
        for &m in moves {
            out.extend(handler.handle(
                &InteractionEvent::pointer(Phase::Continue, m, Modifiers::NONE),
                &ctx,
                actions,
            ));
        }
        out
    }

    #[test]
    fn direct_variant_emits_per_move() {
        let mut handler = PanInteraction::direct();
        let mut actions = ActionStateStore::default();
        let out = drive(
            &mut handler,
            &mut actions,
            &[Point::new(10.0, 10.0), Point::new(20.0, 20.0), Point::new(30.0, 30.0)],
        );
        assert_eq!(out.len(), 3);
        for cmd in out {
            assert_eq!(cmd, Command::MoveViewportBy { delta: Point::new(10.0, 10.0) });
        }
    }

    #[test]
    fn throttled_variant_coalesces_until_frame() {
        let mut handler = PanInteraction::throttled();
        let mut actions = ActionStateStore::default();
        let out = drive(
            &mut handler,
            &mut actions,
            &[Point::new(10.0, 10.0), Point::new(20.0, 20.0), Point::new(30.0, 30.0)],
        );
        // Nothing emitted mid-gesture…
        assert!(out.is_empty());
        // …one summed command at the frame tick…
        let flushed = take_pending_pan(&mut actions);
        assert_eq!(flushed, Some(Command::MoveViewportBy { delta: Point::new(30.0, 30.0) }));
        // …and nothing more until new input arrives.
        assert_eq!(take_pending_pan(&mut actions), None);
    }
}
