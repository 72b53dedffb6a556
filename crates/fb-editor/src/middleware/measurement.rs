//! Measurement-completion gating middleware.
//!
//! Hosts report node sizes and port geometry asynchronously after layout;
//! until every node is measured, consumers must not treat the diagram as
//! laid out (zoom-to-fit, minimap framing and export all depend on real
//! bounds). This middleware watches the candidate state and flips
//! `metadata.middleware["measurement"].complete` exactly on the
//! invocation where the last measurement lands — the synchronous
//! rendition of the original's deferred "everything is laid out" signal.
//! Adding unmeasured nodes later flips it back off.

use crate::pipeline::{Middleware, PipelineContext, Verdict};
use fb_core::update::MetadataPatch;
use fb_core::FlowStateUpdate;

pub const MEASUREMENT_KEY: &str = "measurement";

pub struct MeasurementMiddleware;

impl Middleware for MeasurementMiddleware {
    fn name(&self) -> &'static str {
        MEASUREMENT_KEY
    }

    fn process(&mut self, ctx: &PipelineContext<'_>) -> Verdict {
        let complete = ctx.state.nodes.iter().all(|n| {
            n.size.is_some() && n.ports.iter().all(|p| p.position.is_some())
        });

        let stored = ctx
            .state
            .metadata
            .middleware
            .get(MEASUREMENT_KEY)
            .and_then(|v| v.get("complete"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if complete == stored {
            return Verdict::Advance(None);
        }

        let mut patch = MetadataPatch::default();
        patch
            .middleware
            .insert(MEASUREMENT_KEY.to_string(), serde_json::json!({ "complete": complete }));
        Verdict::Advance(Some(FlowStateUpdate::from_metadata(patch)))
    }
}
