//! Input abstraction layer.
//!
//! The host normalizes pointer/keyboard/palette input into named, phase-
//! tagged [`InteractionEvent`]s and feeds them to the [`InputRouter`],
//! which dispatches each name to exactly one registered handler.
//! Handlers mutate their own action-state slot and return the commands
//! the gesture produced; the engine emits those through the pipeline.

use crate::action::ActionStateStore;
use crate::env::Environment;
use fb_core::{FlowConfig, FlowState, Id, Point};
use std::collections::HashMap;

use crate::command::Command;

/// Gesture phase. Single-shot events (copy, undo, …) use `Start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Start,
    Continue,
    End,
}

/// Exact modifier-key state at event time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, shift: false, alt: false, meta: false };
}

/// Pointer sample in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    pub position: Point,
    pub modifiers: Modifiers,
}

/// Keyboard sample, `key` as reported by the host (`"z"`, `"ArrowLeft"`, …).
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInput {
    pub key: String,
    pub modifiers: Modifiers,
}

/// The 8 resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    TopLeft,
}

impl ResizeHandle {
    /// Which axes this handle moves: (left edge, right edge, top edge, bottom edge).
    pub fn edges(&self) -> (bool, bool, bool, bool) {
        match self {
            ResizeHandle::Top => (false, false, true, false),
            ResizeHandle::TopRight => (false, true, true, false),
            ResizeHandle::Right => (false, true, false, false),
            ResizeHandle::BottomRight => (false, true, false, true),
            ResizeHandle::Bottom => (false, false, false, true),
            ResizeHandle::BottomLeft => (true, false, false, true),
            ResizeHandle::Left => (true, false, false, false),
            ResizeHandle::TopLeft => (true, false, true, false),
        }
    }
}

/// A named interaction event. Which fields are populated depends on the
/// event name and phase; handlers validate what they need and warn on
/// missing pieces rather than panic.
#[derive(Debug, Clone, Default)]
pub struct InteractionEvent {
    pub phase: Phase,
    pub pointer: Option<PointerInput>,
    pub key: Option<KeyInput>,
    /// Entity under the pointer, from host hit-testing.
    pub node: Option<Id>,
    pub port: Option<Id>,
    pub handle: Option<ResizeHandle>,
    /// Opaque payload (palette drops).
    pub data: Option<serde_json::Value>,
}

impl InteractionEvent {
    pub fn pointer(phase: Phase, position: Point, modifiers: Modifiers) -> Self {
        Self {
            phase,
            pointer: Some(PointerInput { position, modifiers }),
            ..Default::default()
        }
    }

    pub fn key(phase: Phase, key: &str, modifiers: Modifiers) -> Self {
        Self {
            phase,
            key: Some(KeyInput { key: key.to_string(), modifiers }),
            ..Default::default()
        }
    }

    pub fn with_node(mut self, node: Id) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_port(mut self, port: Id) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_handle(mut self, handle: ResizeHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Read-only context handed to interaction handlers.
pub struct InteractionContext<'a> {
    pub state: &'a FlowState,
    pub config: &'a FlowConfig,
    pub env: &'a Environment,
}

/// A per-name interaction state machine.
///
/// Handlers own any purely-visual gesture state themselves (marquee
/// rectangles and the like); anything another component may need to read
/// lives in the handler's [`ActionStateStore`] slot. A handler must only
/// ever write its own slot.
pub trait InteractionHandler {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        actions: &mut ActionStateStore,
    ) -> Vec<Command>;
}

/// Routes named events to their registered handler.
pub struct InputRouter {
    handlers: HashMap<String, Box<dyn InteractionHandler>>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Register (or replace) the handler for `name`.
    pub fn register(&mut self, name: &str, handler: Box<dyn InteractionHandler>) {
        if self.handlers.insert(name.to_string(), handler).is_some() {
            log::debug!("input: replaced handler for `{name}`");
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Dispatch an event. Unregistered names warn and drop — they usually
    /// come from user-editable keymaps, not programmer error.
    pub fn dispatch(
        &mut self,
        name: &str,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        match self.handlers.get_mut(name) {
            Some(handler) => handler.handle(event, ctx, actions),
            None => {
                log::warn!("input: no handler registered for event `{name}`; dropping");
                Vec::new()
            }
        }
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        calls: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl InteractionHandler for Probe {
        fn handle(
            &mut self,
            _event: &InteractionEvent,
            _ctx: &InteractionContext<'_>,
            _actions: &mut ActionStateStore,
        ) -> Vec<Command> {
            self.calls.set(self.calls.get() + 1);
            Vec::new()
        }
    }

    #[test]
    fn dispatch_reaches_registered_handler_and_drops_unknown() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut router = InputRouter::new();
        router.register("panning", Box::new(Probe { calls: calls.clone() }));

        let state = FlowState::default();
        let config = FlowConfig::default();
        let env = Environment::new(crate::env::Platform::Linux);
        let ctx = InteractionContext { state: &state, config: &config, env: &env };
        let mut actions = ActionStateStore::default();

        let event = InteractionEvent::pointer(Phase::Start, Point::ZERO, Modifiers::NONE);
        router.dispatch("panning", &event, &ctx, &mut actions);
        assert_eq!(calls.get(), 1);

        // Unknown name: warns, returns nothing, does not panic.
        let out = router.dispatch("does-not-exist", &event, &ctx, &mut actions);
        assert!(out.is_empty());

        assert!(router.unregister("panning"));
        assert!(!router.is_registered("panning"));
    }
}
