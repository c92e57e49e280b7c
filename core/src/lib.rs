//! # Liftsim Core
//!
//! Domain model and ports for the lift simulation.
//!
//! This crate provides the building blocks the dispatch runtime is assembled
//! from:
//!
//! - **Domain entities**: [`domain::Lift`], [`domain::Floor`], and
//!   [`domain::System`], value objects with their state machines and
//!   invariants, free of I/O and time dependencies. The movement orchestrator
//!   drives the state machine; the entities never sleep or persist
//!   themselves.
//! - **Events**: [`event::LiftEvent`], the typed payloads that flow through
//!   the bus, one variant per observable transition in the system.
//! - **Event bus**: the [`event_bus::EventBus`] port and its in-process
//!   implementation, [`event_bus::InMemoryEventBus`].
//! - **Repository**: the [`repository::Repository`] port owned by the
//!   persistence collaborator. Each call is atomic per row; multi-row
//!   consistency is the dispatch engine's concern.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   LiftRequested    ┌──────────────┐
//! │   Transport  │ ─────────────────► │   EventBus   │
//! └──────────────┘                    └──────┬───────┘
//!                                            │ one task per handler
//!                        ┌───────────────────┼───────────────────┐
//!                        ▼                   ▼                   ▼
//!                 ┌────────────┐      ┌────────────┐      ┌────────────┐
//!                 │  Dispatch  │      │ Floor reset│      │   Status   │
//!                 │   engine   │      │  handler   │      │   relay    │
//!                 └─────┬──────┘      └────────────┘      └────────────┘
//!                       │ Repository / AssignmentLedger
//!                       ▼
//!                 ┌────────────┐
//!                 │ Persistence│
//!                 └────────────┘
//! ```
//!
//! # Dyn Compatibility
//!
//! The ports use explicit `BoxFuture` returns instead of `async fn` so they
//! can be used as trait objects (`Arc<dyn Repository>`, `Arc<dyn EventBus>`)
//! shared across the dispatch, movement, and handler tasks.

#![forbid(unsafe_code)]

pub mod domain;
pub mod event;
pub mod event_bus;
pub mod repository;

pub use domain::{
    Direction, DomainError, Floor, FloorId, Lift, LiftId, LiftStatus, System, SystemId,
    SystemMetrics, SystemStatus, TrafficIntensity,
};
pub use event::{EventKind, LiftEvent};
pub use event_bus::{EventBus, EventHandler, HandlerError, InMemoryEventBus};
pub use repository::{Repository, RepositoryError};
