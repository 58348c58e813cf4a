//! Per-entity simulation kernel for a 3D action-adventure engine.
//!
//! Discrete-state skeletal animation drives physics and collision against a
//! static, sector-based level topology: stand classification, table-driven
//! state transitions, embedded per-frame animation commands, room-aware
//! collision resolution and trigger-activated action chains.
//!
//! Level loading, rendering, sound mixing and input polling live in the host;
//! this crate consumes read-only level tables and a resolved input mask, and
//! exposes one [`World::update`] tick.

pub mod core;
pub mod engine;
pub mod game;

pub use engine::level::{Level, LevelBuilder, LevelError};
pub use game::world::{SimContext, Slot, TickEnv, World};
