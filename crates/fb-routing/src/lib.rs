//! Pure connector-geometry engines.
//!
//! No state, no side effects: callers hand in located, side-aware
//! endpoints (or raw control points) and get paths plus "point at signed
//! distance along the path" back. The update pipeline's routing
//! middleware and edge-label placement are the main consumers.

pub mod curve;
pub mod orthogonal;
pub mod path;

pub use curve::{CurvePath, curved_path};
pub use orthogonal::{EndpointRef, orthogonal_path};
pub use path::{Path, normalize_distance};
