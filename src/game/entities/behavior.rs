// Entity-kind capability hooks
//
// Per-kind variation points of the controller pipeline, dispatched through
// an entity-kind lookup rather than inheritance. Kinds override the hooks
// they care about; every default keeps the current state and does nothing.

use std::collections::HashMap;

use crate::engine::level::{Level, StateId};

use super::animation::ANIM_FPS;
use super::controller::Body;
use super::stand::{InputMask, Stand};

/// Downward acceleration, world units per frame² at the 30 Hz sample rate.
pub const GRAVITY: f32 = 6.0;

pub trait Behavior {
    /// Classify the entity's physical context for this tick.
    fn stand(&self, body: &Body, level: &Level) -> Stand {
        let _ = (body, level);
        Stand::Air
    }

    /// Resolved status mask for this tick.
    fn input_mask(&self, body: &Body) -> InputMask {
        body.input
    }

    /// Collision height, feet to head.
    fn height(&self) -> f32 {
        0.0
    }

    // Desired-state hooks per stand classification; identity by default.
    fn state_ground(&self, body: &Body) -> StateId {
        body.state
    }
    fn state_air(&self, body: &Body) -> StateId {
        body.state
    }
    fn state_underwater(&self, body: &Body) -> StateId {
        body.state
    }
    fn state_on_water(&self, body: &Body) -> StateId {
        body.state
    }
    fn state_death(&self, body: &Body) -> StateId {
        body.state
    }
    /// Fallback when the desired state is unreachable from the active clip.
    /// Must always resolve.
    fn state_default(&self, body: &Body) -> StateId {
        body.state
    }

    /// Entity-kind state logic, phase 2 of the tick.
    fn update_state(&mut self, body: &mut Body, level: &Level) {
        let _ = (body, level);
    }

    /// Velocity integration, phase 4 of the tick.
    fn update_velocity(&mut self, body: &mut Body, level: &Level, dt: f32) {
        let _ = (body, level, dt);
    }

    /// Position application, phase 5 of the tick, before collision.
    fn apply_move(&mut self, body: &mut Body, level: &Level, dt: f32) {
        let _ = (body, level, dt);
    }

    /// Whether an action-chain link may be handed to this entity right now.
    fn accept_activation(&self, body: &Body) -> bool {
        let _ = body;
        true
    }
}

/// Plain ballistic mover: gravity while airborne, velocity applied as-is.
/// The default behavior for kinds without a registered override.
#[derive(Debug, Default)]
pub struct FreeBody {
    pub height: f32,
}

impl Behavior for FreeBody {
    fn stand(&self, body: &Body, level: &Level) -> Stand {
        if level.rooms[body.room as usize].water {
            return if body.stand == Stand::OnWater {
                Stand::OnWater
            } else {
                Stand::Underwater
            };
        }
        let info = level.floor_info(body.room, body.pos.x as i32, body.pos.z as i32);
        if body.pos.y <= info.floor {
            Stand::Ground
        } else {
            Stand::Air
        }
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn update_velocity(&mut self, body: &mut Body, _level: &Level, dt: f32) {
        if body.stand == Stand::Air {
            body.velocity.y -= GRAVITY * (dt * ANIM_FPS);
        }
    }

    fn apply_move(&mut self, body: &mut Body, _level: &Level, dt: f32) {
        body.pos += body.velocity * (dt * ANIM_FPS);
    }
}

fn free_body() -> Box<dyn Behavior> {
    Box::new(FreeBody::default())
}

/// Entity-kind id → behavior constructor table.
pub struct BehaviorRegistry {
    builders: HashMap<u16, fn() -> Box<dyn Behavior>>,
    fallback: fn() -> Box<dyn Behavior>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
            fallback: free_body,
        }
    }

    pub fn register(mut self, kind: u16, build: fn() -> Box<dyn Behavior>) -> Self {
        self.builders.insert(kind, build);
        self
    }

    /// Constructor used for kinds without a registered entry.
    pub fn with_fallback(mut self, build: fn() -> Box<dyn Behavior>) -> Self {
        self.fallback = build;
        self
    }

    pub fn build(&self, kind: u16) -> Box<dyn Behavior> {
        self.builders.get(&kind).copied().unwrap_or(self.fallback)()
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
