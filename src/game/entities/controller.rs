// Skeletal entity controller
//
// One controller per live skeletal entity, running the fixed five-phase
// tick: classify & resolve state, kind state hook, animation & commands,
// kind velocity hook, move & collide & write-back. No phase may be skipped
// or reordered; the clip data assumes this exact pipeline.

use std::f32::consts::PI;

use glam::Vec3;
use log::{debug, warn};

use crate::core::math;
use crate::engine::audio::{self, SND_BUBBLE, SND_SECRET};
use crate::engine::level::{
    AnimCommand, Entity, Level, ModelRef, RoomId, StateId, SECTOR_SIZE, SPECIAL_BUBBLE,
    SPECIAL_CTRL, SPECIAL_FLIP,
};
use crate::game::world::TickEnv;

use super::actions::{ActionId, ActionKind};
use super::animation::Sequencer;
use super::behavior::Behavior;
use super::stand::{InputMask, Stand};

/// Mutable simulation state of a skeletal entity, split from the behavior
/// object so kind hooks can borrow both halves at once.
#[derive(Debug)]
pub struct Body {
    /// Index of the entity record this controller drives.
    pub entity: usize,
    pub stand: Stand,
    pub state: StateId,
    /// Status mask resolved at the start of the current tick.
    pub mask: InputMask,
    /// Host-written input bits, consumed by the default mask hook.
    pub input: InputMask,
    pub anim: Sequencer,
    pub pos: Vec3,
    /// World units per frame, the clip data's native speed unit.
    pub velocity: Vec3,
    /// Orientation in radians: x = pitch, y = yaw, z = roll.
    pub angle: Vec3,
    /// Auxiliary yaw consumed by launch-velocity commands.
    pub angle_ext: f32,
    pub room: RoomId,
    pub health: i32,
    pub turn_time: f32,
    /// Cursor into the context-owned action arena.
    pub action: Option<ActionId>,
}

impl Body {
    /// Zeroed body on clip `anim_index`; the controller constructor fills in
    /// the entity record's placement.
    pub fn new(entity: usize, anim_index: usize) -> Self {
        Self {
            entity,
            stand: Stand::Ground,
            state: 0,
            mask: InputMask::empty(),
            input: InputMask::empty(),
            anim: Sequencer::start(anim_index),
            pos: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angle: Vec3::ZERO,
            angle_ext: 0.0,
            room: 0,
            health: 100,
            turn_time: 0.0,
            action: None,
        }
    }
}

pub struct Controller {
    pub body: Body,
    behavior: Box<dyn Behavior>,
}

impl Controller {
    pub fn new(level: &Level, entity: usize, behavior: Box<dyn Behavior>) -> Self {
        let record = &level.entities[entity];
        let anim_index = match record.model {
            ModelRef::Skeletal(m) => level.models[m].animation,
            _ => 0,
        };

        let mut body = Body::new(entity, anim_index);
        body.state = level.anims[anim_index].state;
        body.pos = record.pos.as_vec3();
        body.angle = Vec3::new(0.0, record.rotation, 0.0);
        body.room = record.room;
        body.health = record.health;

        Self { behavior, body }
    }

    pub fn pos(&self) -> Vec3 {
        self.body.pos
    }

    pub fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    /// Orientation in radians: x = pitch, y = yaw, z = roll.
    pub fn angle(&self) -> Vec3 {
        self.body.angle
    }

    pub fn state(&self) -> StateId {
        self.body.state
    }

    pub fn stand(&self) -> Stand {
        self.body.stand
    }

    /// Facing direction from pitch and yaw; consumed by camera and aiming.
    pub fn direction(&self) -> Vec3 {
        math::direction(self.body.angle.x, self.body.angle.y)
    }

    /// One full tick.
    pub fn update(&mut self, dt: f32, env: &mut TickEnv) {
        self.update_begin(env);
        self.behavior.update_state(&mut self.body, env.level);
        self.update_animation(true, dt, env);
        self.behavior.update_velocity(&mut self.body, env.level, dt);
        self.update_end(dt, env);
    }

    fn update_begin(&mut self, env: &mut TickEnv) {
        self.body.mask = self.behavior.input_mask(&self.body);
        let stand = self.behavior.stand(&self.body, env.level);
        self.body.stand = stand;
        self.body.state = self.resolve_state(stand, env.level);
    }

    fn update_end(&mut self, dt: f32, env: &mut TickEnv) {
        self.behavior.apply_move(&mut self.body, env.level, dt);
        self.collide(env.level);
        self.write_entity(env.entities);
    }

    /// Desired-state selection plus transition. A death flag overrides the
    /// stand dispatch; an unreachable desired state falls back to the kind's
    /// default state, which must resolve.
    pub fn resolve_state(&mut self, stand: Stand, level: &Level) -> StateId {
        let body = &self.body;
        let desired = if body.mask.contains(InputMask::DEATH) {
            self.behavior.state_death(body)
        } else {
            match stand {
                Stand::Ground => self.behavior.state_ground(body),
                Stand::Air => self.behavior.state_air(body),
                Stand::Underwater => self.behavior.state_underwater(body),
                Stand::OnWater => self.behavior.state_on_water(body),
            }
        };

        if !self.body.anim.set_state(level, desired) {
            let fallback = self.behavior.state_default(&self.body);
            let resolved = self.body.anim.set_state(level, fallback);
            assert!(
                resolved,
                "default state {fallback} unreachable from clip {}",
                self.body.anim.index
            );
        }

        level.anims[self.body.anim.index].state
    }

    /// Advance the clip clock and interpret the command stream, then handle
    /// end-of-clip chaining. `commands` disables interpretation for hosts
    /// that replay animation without side effects.
    pub fn update_animation(&mut self, commands: bool, dt: f32, env: &mut TickEnv) {
        let level = env.level;

        self.body.anim.time += dt;
        let frame_index = self.body.anim.frame_index();
        let anim = level.anims[self.body.anim.index];
        let end_frame = frame_index > anim.frame_end - anim.frame_start;

        if commands {
            for cmd in level.commands_of(&anim) {
                match cmd {
                    AnimCommand::Move { dx, dy, dz } => {
                        if end_frame {
                            let delta = Vec3::new(dx as f32, dy as f32, dz as f32);
                            self.body.pos += math::rotate_y(delta, self.body.angle.y);
                            self.write_entity(env.entities);
                            debug!("move: {dx} {dy} {dz}");
                        }
                    }
                    AnimCommand::Speed { vy, vz } => {
                        if end_frame {
                            debug!("launch: {vy} {vz}");
                            self.body.velocity.x = self.body.angle_ext.sin() * vz as f32;
                            self.body.velocity.y = vy as f32;
                            self.body.velocity.z = self.body.angle_ext.cos() * vz as f32;
                            self.body.stand = Stand::Air;
                        }
                    }
                    AnimCommand::Empty | AnimCommand::Kill => {}
                    AnimCommand::Sound { frame, id } => {
                        let at = frame as i32 - anim.frame_start;
                        if at > self.body.anim.prev_frame && at <= frame_index {
                            audio::trigger(&level.sounds, env.ctx.audio.as_mut(), id);
                        }
                    }
                    AnimCommand::Special { frame, op } => {
                        if frame_index != self.body.anim.prev_frame
                            && frame_index + anim.frame_start == frame as i32
                        {
                            match op {
                                SPECIAL_FLIP => self.body.angle.y += PI,
                                SPECIAL_BUBBLE => {
                                    audio::trigger(&level.sounds, env.ctx.audio.as_mut(), SND_BUBBLE)
                                }
                                SPECIAL_CTRL => debug!("special control frame"),
                                _ => warn!("unknown special command {op}"),
                            }
                        }
                    }
                    AnimCommand::Unknown(tag) => warn!("unknown animation command {tag}"),
                }
            }
        }

        if end_frame {
            // Clip exhausted: chain into the configured follow-up and let the
            // pending trigger chain advance.
            self.body.state =
                self.body
                    .anim
                    .set_animation(level, anim.next_animation, Some(anim.next_frame));
            self.activate_next(env);
        } else {
            self.body.anim.prev_frame = frame_index;
        }
    }

    /// Resolve room membership and vertical collision after movement.
    /// Branch order matters at water-room boundaries; keep it.
    pub fn collide(&mut self, level: &Level) {
        let height = self.behavior.height();
        let body = &mut self.body;
        let info = level.floor_info(body.room, body.pos.x as i32, body.pos.z as i32);

        if let Some(next) = info.room_next {
            body.room = next;
        }

        if body.pos.y <= info.floor {
            match info.room_below {
                None => {
                    body.pos.y = info.floor;
                    body.velocity.y = 0.0;
                }
                Some(below) => body.room = below,
            }
        }

        if body.pos.y + height > info.ceiling {
            match info.room_above {
                None => {
                    body.pos.y = info.ceiling - height;
                    body.velocity.y = -body.velocity.y.abs();
                }
                Some(above) => {
                    if body.stand == Stand::Underwater && !level.rooms[above as usize].water {
                        // Surfacing: the water column ends here.
                        body.stand = Stand::OnWater;
                        body.velocity.y = 0.0;
                        body.pos.y = info.ceiling;
                    } else if body.stand != Stand::OnWater && body.pos.y > info.ceiling {
                        body.room = above;
                    }
                }
            }
        }
    }

    /// Write simulation state back to the externally-owned entity record.
    pub fn write_entity(&self, entities: &mut [Entity]) {
        let record = &mut entities[self.body.entity];
        record.pos = self.body.pos.as_ivec3();
        record.rotation = self.body.angle.y;
        record.room = self.body.room;
        record.health = self.body.health;
    }

    /// Accept a chain link as this controller's pending chain. Kinds may
    /// refuse, leaving the link with the sender for a retry next tick.
    pub fn activate(&mut self, cmd: ActionId) -> bool {
        if !self.behavior.accept_activation(&self.body) {
            return false;
        }
        self.body.action = Some(cmd);
        true
    }

    /// Advance the pending trigger chain by one link.
    pub fn activate_next(&mut self, env: &mut TickEnv) {
        let Some(cursor) = self.body.action else {
            return;
        };
        let Some(next_id) = env.ctx.arena.get(cursor).next else {
            self.body.action = None;
            return;
        };
        let next = env.ctx.arena.get(next_id);

        let target = match next.kind {
            ActionKind::Activate => Some(next.value as usize),
            ActionKind::CameraSwitch | ActionKind::CameraTarget => env.ctx.camera,
            ActionKind::Secret => {
                let secret = next.value as usize;
                if !env.ctx.secrets[secret] {
                    env.ctx.secrets[secret] = true;
                    audio::trigger(&env.level.sounds, env.ctx.audio.as_mut(), SND_SECRET);
                }
                // Secrets never block the chain.
                self.body.action = Some(next_id);
                self.activate_next(env);
                return;
            }
            ActionKind::Flow
            | ActionKind::FlipMap
            | ActionKind::FlipOn
            | ActionKind::FlipOff
            | ActionKind::Soundtrack
            | ActionKind::Hardcode
            | ActionKind::Clear
            | ActionKind::FlybyCamera
            | ActionKind::Cutscene
            | ActionKind::End => {
                // Consumed by the outer game flow; step past.
                self.body.action = Some(next_id);
                return;
            }
        };

        match target.and_then(|t| env.slots.get_mut(t)).and_then(Option::as_mut) {
            Some(slot) => {
                if slot.activate(next_id) {
                    self.body.action = None;
                }
                // Refused: keep the cursor for a retry.
            }
            None => self.body.action = None,
        }
    }

    /// Snap yaw to the nearest sector-grid wall normal.
    pub fn turn_to_wall(&mut self) {
        let fx = (self.body.pos.x / SECTOR_SIZE as f32).fract();
        let fz = (self.body.pos.z / SECTOR_SIZE as f32).fract();

        let quadrant = if fx > 1.0 - fz {
            if fx < fz {
                0.0
            } else {
                1.0
            }
        } else if fx < fz {
            3.0
        } else {
            2.0
        };
        self.body.angle.y = quadrant * PI * 0.5;
    }
}
