//! Linking (connector creation) interaction.
//!
//! Start requires a source node (and port, when the node has ports);
//! continue drags the provisional endpoint and nudges the viewport when
//! the pointer approaches its edge; end either resolves to a target the
//! host hit-tested or discards. The rubber-band line itself is rendered
//! by the host straight from the linking action slot.

use crate::action::{ActionStateStore, LinkingAction};
use crate::command::{Command, LinkTarget};
use crate::input::{InteractionContext, InteractionEvent, InteractionHandler, Phase};
use crate::interaction::{edge_pan_delta, to_screen};

pub struct LinkingInteraction;

impl InteractionHandler for LinkingInteraction {
    fn handle(
        &mut self,
        event: &InteractionEvent,
        ctx: &InteractionContext<'_>,
        actions: &mut ActionStateStore,
    ) -> Vec<Command> {
        match event.phase {
            Phase::Start => {
                let Some(source) = event.node else {
                    log::warn!("linking: start event carries no source node");
                    return Vec::new();
                };
                let Some(node) = ctx.state.node(source) else {
                    log::warn!("linking: source node {source} not found");
                    return Vec::new();
                };
                if let Some(port) = event.port
                    && node.port(port).is_none()
                {
                    log::warn!("linking: source port {port} does not exist on node {source}");
                    return Vec::new();
                }
                let start = event.pointer.map(|p| p.position).unwrap_or_else(|| node.center());
                actions.linking = Some(LinkingAction {
                    source,
                    source_port: event.port,
                    target_position: start,
                });
                vec![Command::StartLinking { source, port: event.port }]
            }
            Phase::Continue => {
                let Some(pointer) = event.pointer else {
                    return Vec::new();
                };
                let Some(linking) = actions.linking.as_mut() else {
                    return Vec::new();
                };
                linking.target_position = pointer.position;

                let mut commands = vec![Command::UpdateLinking { position: pointer.position }];

                let viewport = &ctx.state.metadata.viewport;
                if let (Some(w), Some(h)) = (viewport.width, viewport.height)
                    && let Some(delta) = edge_pan_delta(
                        to_screen(pointer.position, viewport),
                        w,
                        h,
                        ctx.config.edge_pan_threshold,
                        ctx.config.edge_pan_force,
                    )
                {
                    commands.push(Command::MoveViewportBy { delta });
                }
                commands
            }
            Phase::End => {
                let Some(linking) = actions.linking.take() else {
                    log::warn!("linking: end without an active gesture");
                    return Vec::new();
                };

                // Only a hit-tested, still-existing node counts as a target.
                let target = event.node.and_then(|node| {
                    let exists = ctx.state.node(node).is_some();
                    if !exists {
                        log::warn!("linking: drop target {node} no longer exists; discarding");
                    }
                    exists.then_some(LinkTarget { node, port: event.port })
                });

                vec![Command::EndLinking {
                    source: linking.source,
                    source_port: linking.source_port,
                    target,
                }]
            }
        }
    }
}
