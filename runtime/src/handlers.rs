//! Bus subscribers reacting to trip events.

use crate::broadcaster::{StatusBroadcaster, StatusUpdate};
use futures::future::BoxFuture;
use liftsim_core::{EventBus, EventHandler, HandlerError, LiftEvent, LiftStatus, Repository};
use std::sync::Arc;
use tracing::debug;

/// Clears a floor's call buttons when a lift arrives.
pub struct FloorArrivalHandler {
    repo: Arc<dyn Repository>,
    bus: Arc<dyn EventBus>,
}

impl FloorArrivalHandler {
    /// Create the handler. Subscribe it to `LiftArrived`.
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, bus: Arc<dyn EventBus>) -> Self {
        Self { repo, bus }
    }
}

impl EventHandler for FloorArrivalHandler {
    fn name(&self) -> &str {
        "floor-reset"
    }

    fn handle(&self, event: LiftEvent) -> BoxFuture<'static, Result<(), HandlerError>> {
        let repo = Arc::clone(&self.repo);
        let bus = Arc::clone(&self.bus);
        Box::pin(async move {
            let LiftEvent::LiftArrived {
                floor_id,
                floor_number,
                ..
            } = event
            else {
                return Ok(());
            };

            let mut floor = match repo.get_floor(floor_id).await {
                Ok(floor) => floor,
                Err(error) if error.is_not_found() => {
                    // The system was reset (or reconfigured) while the trip
                    // was in flight.
                    debug!(%floor_id, "floor gone before button reset");
                    return Ok(());
                }
                Err(error) => return Err(error.into()),
            };

            floor.reset_buttons();
            repo.update_floor(floor).await?;
            bus.publish(LiftEvent::FloorButtonsReset {
                floor_id,
                floor_number,
            });
            Ok(())
        })
    }
}

/// Translates trip events into per-topic status updates.
///
/// Subscribe it to `LiftAssigned`, `LiftMoved`, and `LiftArrived`.
pub struct StatusRelayHandler {
    broadcaster: Arc<StatusBroadcaster>,
}

impl StatusRelayHandler {
    /// Create the relay.
    #[must_use]
    pub fn new(broadcaster: Arc<StatusBroadcaster>) -> Self {
        Self { broadcaster }
    }
}

impl EventHandler for StatusRelayHandler {
    fn name(&self) -> &str {
        "status-relay"
    }

    fn handle(&self, event: LiftEvent) -> BoxFuture<'static, Result<(), HandlerError>> {
        let broadcaster = Arc::clone(&self.broadcaster);
        Box::pin(async move {
            match event {
                LiftEvent::LiftAssigned {
                    lift_id,
                    floor_number,
                } => {
                    broadcaster
                        .broadcast(StatusUpdate::lift(lift_id, LiftStatus::Occupied.to_string(), None))
                        .await;
                    broadcaster
                        .broadcast(StatusUpdate::floor(
                            floor_number,
                            format!("lift_assigned:{lift_id}"),
                        ))
                        .await;
                }
                LiftEvent::LiftMoved { lift_id, floor } => {
                    broadcaster
                        .broadcast(StatusUpdate::lift(
                            lift_id,
                            LiftStatus::Occupied.to_string(),
                            Some(floor),
                        ))
                        .await;
                }
                LiftEvent::LiftArrived {
                    lift_id,
                    floor_number,
                    ..
                } => {
                    broadcaster
                        .broadcast(StatusUpdate::lift(
                            lift_id,
                            LiftStatus::Available.to_string(),
                            Some(floor_number),
                        ))
                        .await;
                    broadcaster
                        .broadcast(StatusUpdate::floor(
                            floor_number,
                            format!("lift_arrived:{lift_id}"),
                        ))
                        .await;
                }
                _ => {}
            }
            Ok(())
        })
    }
}
