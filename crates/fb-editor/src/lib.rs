//! Flowboard editor engine.
//!
//! The headless half of an interactive node/edge diagram editor: it owns
//! no pixels, only state transitions. Hosts feed it named interaction
//! events and commands; it answers with committed `FlowState` snapshots
//! through the model adapter and draw calls through the renderer trait.
//!
//! ```no_run
//! use fb_editor::{FlowEngine, Command, adapter::InMemoryModel, env::Environment};
//! use fb_core::{FlowConfig, Node, Id, Point};
//!
//! let mut engine = FlowEngine::new(
//!     Box::new(InMemoryModel::new()),
//!     FlowConfig::default(),
//!     Environment::detect(),
//! );
//! engine.emit(Command::Init {
//!     nodes: vec![Node::new(Id::intern("a"), Point::new(10.0, 10.0))],
//!     edges: vec![],
//!     viewport: None,
//! }).unwrap();
//! ```

pub mod action;
pub mod adapter;
pub mod command;
pub mod engine;
pub mod env;
pub mod input;
pub mod interaction;
pub mod middleware;
pub mod pipeline;
pub mod shortcuts;

pub use action::ActionStateStore;
pub use adapter::{FlowModel, InMemoryModel, Renderer};
pub use command::{Command, LinkTarget};
pub use engine::{FlowEngine, Outcome};
pub use input::{
    InputRouter, InteractionContext, InteractionEvent, InteractionHandler, KeyInput, Modifiers,
    Phase, PointerInput, ResizeHandle,
};
pub use pipeline::{Middleware, Pipeline, PipelineContext, RunOutcome, Verdict};
pub use shortcuts::{ShortcutBinding, ShortcutMatcher};
