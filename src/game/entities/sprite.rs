// Sprite controllers for ephemeral billboard entities
//
// Splashes, blood, ricochets and other sequence-driven decals. These skip
// the whole skeletal pipeline: no stand classification, no state table, no
// physics, no collision. They only watch the clock and retire themselves.

use crate::engine::level::Level;
use crate::game::world::TickEnv;

use super::actions::ActionId;

/// Sprite sequences advance at a fixed 10 frames per second.
pub const SPRITE_FPS: f32 = 10.0;

/// Lifetime of an "instant" single-frame sprite.
const STATIC_LIFETIME: f32 = 0.1;

/// Frame selection for a freshly spawned sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpriteFrame {
    /// Play the sequence.
    #[default]
    Animated,
    /// Hold one random frame.
    Random,
    /// Hold a specific frame.
    Fixed(usize),
}

/// Controller for a sprite-sequence entity.
#[derive(Debug)]
pub struct SpriteController {
    pub entity: usize,
    sequence: usize,
    frame: usize,
    time: f32,
    /// Instant sprites retire once played out; others persist.
    instant: bool,
    animated: bool,
    /// Chain links handed over by triggers park here; sprites never walk them.
    action: Option<ActionId>,
}

impl SpriteController {
    pub fn new(level: &Level, entity: usize, sequence: usize, instant: bool, frame: SpriteFrame) -> Self {
        let frame_count = level.sprite_sequences[sequence].frame_count;
        let start = match frame {
            SpriteFrame::Fixed(f) => f.min(frame_count - 1),
            SpriteFrame::Random => fastrand::usize(..frame_count),
            SpriteFrame::Animated => 0,
        };
        Self {
            entity,
            sequence,
            frame: start,
            time: 0.0,
            instant,
            animated: frame == SpriteFrame::Animated,
            action: None,
        }
    }

    /// Frame to render this tick.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Chain link parked on this sprite, if any.
    pub fn action(&self) -> Option<ActionId> {
        self.action
    }

    /// One tick; `false` means the sprite expired and its slot must be
    /// released by the owning world.
    pub fn update(&mut self, dt: f32, env: &mut TickEnv) -> bool {
        self.time += dt;

        if self.animated {
            let frame = (self.time * SPRITE_FPS) as usize;
            let count = env.level.sprite_sequences[self.sequence].frame_count;
            if self.instant && frame >= count {
                return self.retire(env);
            }
            self.frame = frame % count;
        } else if self.instant && self.time >= STATIC_LIFETIME {
            return self.retire(env);
        }
        true
    }

    fn retire(&mut self, env: &mut TickEnv) -> bool {
        env.entities[self.entity].active = false;
        false
    }

    pub(crate) fn accept(&mut self, cmd: ActionId) -> bool {
        self.action = Some(cmd);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::level::{Entity, LevelBuilder, Room};
    use crate::game::world::World;
    use glam::IVec3;

    const DT: f32 = 1.0 / 30.0;

    fn splash_level(frames: usize) -> Level {
        LevelBuilder::new()
            .room(Room::flat(0, 0, 1, 1, 0, 4096))
            .sprite_sequence(frames)
            .entity(Entity::sprite(0, IVec3::new(512, 100, 512), 0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_persistent_sprite_wraps() {
        let mut world = World::new(splash_level(4));
        for _ in 0..9 {
            world.update(DT); // 0.3 s -> frame 3
        }
        assert_eq!(world.sprite(0).unwrap().frame(), 3);
        for _ in 0..3 {
            world.update(DT); // 0.4 s -> wrapped to frame 0
        }
        assert_eq!(world.sprite(0).unwrap().frame(), 0);
        assert!(world.entity(0).active);
    }

    #[test]
    fn test_instant_sprite_retires_after_sequence() {
        let mut world = World::new(splash_level(2));
        let effect = world.add_sprite(
            Entity::sprite(0, IVec3::new(512, 100, 512), 0),
            true,
            SpriteFrame::Animated,
        );

        for _ in 0..5 {
            world.update(DT);
            assert!(world.sprite(effect).is_some());
        }
        world.update(DT); // 0.2 s: sequence of 2 exhausted at 10 fps
        assert!(world.sprite(effect).is_none());
        assert!(!world.entity(effect).active);
    }

    #[test]
    fn test_instant_static_sprite_lifetime() {
        let mut world = World::new(splash_level(3));
        let effect = world.add_sprite(
            Entity::sprite(0, IVec3::new(512, 100, 512), 0),
            true,
            SpriteFrame::Fixed(1),
        );

        world.update(DT);
        world.update(DT);
        assert_eq!(world.sprite(effect).unwrap().frame(), 1);
        world.update(DT); // 0.1 s elapsed
        assert!(world.sprite(effect).is_none());
        assert!(!world.entity(effect).active);
    }

    #[test]
    fn test_random_frame_in_bounds() {
        let level = splash_level(3);
        for _ in 0..16 {
            let sprite = SpriteController::new(&level, 0, 0, false, SpriteFrame::Random);
            assert!(sprite.frame() < 3);
        }
    }
}
