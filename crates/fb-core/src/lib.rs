pub mod config;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod id;
pub mod model;
pub mod update;

pub use config::{FlowConfig, ZIndexConfig};
pub use error::EngineError;
pub use geometry::{Point, Rect, Side, Size, snap, snap_point};
pub use id::Id;
pub use model::*;
pub use update::{EdgePatch, FlowStateUpdate, MetadataPatch, NodePatch, ViewportPatch};
