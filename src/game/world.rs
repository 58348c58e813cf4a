// World: live entity records, controller slots and the tick loop
//
// One tick is one synchronous pass over every live controller, in slot
// order. The running controller is lifted out of its slot for the duration
// of its update, so chain dispatch can never alias it and a retired
// controller is never touched again within the tick.

use crate::engine::audio::{AudioSink, NullSink};
use crate::engine::level::{Entity, Level, ModelRef};

use super::entities::actions::{ActionArena, ActionId};
use super::entities::behavior::BehaviorRegistry;
use super::entities::controller::Controller;
use super::entities::sprite::{SpriteController, SpriteFrame};
use super::entities::stand::InputMask;

/// Shared cross-controller state threaded through every tick.
pub struct SimContext {
    pub arena: ActionArena,
    /// One found-flag per secret; written only by chain dispatch.
    pub secrets: Vec<bool>,
    /// Slot index of the shared camera controller, if registered.
    pub camera: Option<usize>,
    pub audio: Box<dyn AudioSink>,
}

impl SimContext {
    pub fn new(secret_count: usize) -> Self {
        Self {
            arena: ActionArena::new(),
            secrets: vec![false; secret_count],
            camera: None,
            audio: Box::new(NullSink),
        }
    }
}

/// Everything a controller may touch during its tick. Its own slot is
/// vacant for the duration.
pub struct TickEnv<'a> {
    pub level: &'a Level,
    pub entities: &'a mut [Entity],
    pub slots: &'a mut [Option<Slot>],
    pub ctx: &'a mut SimContext,
}

/// A live controller occupying an entity slot.
pub enum Slot {
    Skeletal(Controller),
    Sprite(SpriteController),
}

impl Slot {
    /// Hand a chain link to this controller.
    pub fn activate(&mut self, cmd: ActionId) -> bool {
        match self {
            Slot::Skeletal(controller) => controller.activate(cmd),
            Slot::Sprite(sprite) => sprite.accept(cmd),
        }
    }

    /// One tick; `false` releases the slot.
    fn update(&mut self, dt: f32, env: &mut TickEnv) -> bool {
        match self {
            Slot::Skeletal(controller) => {
                controller.update(dt, env);
                true
            }
            Slot::Sprite(sprite) => sprite.update(dt, env),
        }
    }
}

/// Owns the live side of a loaded level: mutable entity records, one
/// controller slot per entity, and the shared simulation context.
pub struct World {
    level: Level,
    entities: Vec<Entity>,
    slots: Vec<Option<Slot>>,
    ctx: SimContext,
}

impl World {
    /// Spawn with default behaviors for every entity kind.
    pub fn new(level: Level) -> Self {
        Self::with_registry(level, &BehaviorRegistry::default())
    }

    /// Spawn controllers through an entity-kind registry.
    pub fn with_registry(level: Level, registry: &BehaviorRegistry) -> Self {
        let entities = level.entities.clone();
        let ctx = SimContext::new(level.secret_count);

        let slots = entities
            .iter()
            .enumerate()
            .map(|(index, entity)| match entity.model {
                ModelRef::Skeletal(_) => Some(Slot::Skeletal(Controller::new(
                    &level,
                    index,
                    registry.build(entity.kind),
                ))),
                ModelRef::Sprite(sequence) => Some(Slot::Sprite(SpriteController::new(
                    &level,
                    index,
                    sequence,
                    false,
                    SpriteFrame::Animated,
                ))),
                ModelRef::None => None,
            })
            .collect();

        Self {
            level,
            entities,
            slots,
            ctx,
        }
    }

    /// Run one simulation tick over every live controller.
    pub fn update(&mut self, dt: f32) {
        for i in 0..self.slots.len() {
            let Some(mut slot) = self.slots[i].take() else {
                continue;
            };
            let keep = {
                let mut env = TickEnv {
                    level: &self.level,
                    entities: &mut self.entities,
                    slots: &mut self.slots,
                    ctx: &mut self.ctx,
                };
                slot.update(dt, &mut env)
            };
            if keep {
                self.slots[i] = Some(slot);
            }
        }
    }

    /// Insert a runtime entity with a sprite controller (splashes, debris).
    /// Returns its slot index.
    pub fn add_sprite(&mut self, entity: Entity, instant: bool, frame: SpriteFrame) -> usize {
        let sequence = match entity.model {
            ModelRef::Sprite(sequence) => sequence,
            _ => panic!("add_sprite: entity has no sprite sequence"),
        };
        self.entities.push(entity);
        let index = self.entities.len() - 1;
        self.slots.push(Some(Slot::Sprite(SpriteController::new(
            &self.level,
            index,
            sequence,
            instant,
            frame,
        ))));
        index
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn entity(&self, index: usize) -> &Entity {
        &self.entities[index]
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn controller(&self, index: usize) -> Option<&Controller> {
        match self.slots.get(index)? {
            Some(Slot::Skeletal(controller)) => Some(controller),
            _ => None,
        }
    }

    pub fn controller_mut(&mut self, index: usize) -> Option<&mut Controller> {
        match self.slots.get_mut(index)? {
            Some(Slot::Skeletal(controller)) => Some(controller),
            _ => None,
        }
    }

    pub fn sprite(&self, index: usize) -> Option<&SpriteController> {
        match self.slots.get(index)? {
            Some(Slot::Sprite(sprite)) => Some(sprite),
            _ => None,
        }
    }

    /// Host-resolved input bits for one entity's next tick.
    pub fn set_input(&mut self, index: usize, mask: InputMask) {
        if let Some(controller) = self.controller_mut(index) {
            controller.body.input = mask;
        }
    }

    /// Route camera-kind chain links to this slot.
    pub fn set_camera(&mut self, index: usize) {
        self.ctx.camera = Some(index);
    }

    pub fn set_audio(&mut self, sink: Box<dyn AudioSink>) {
        self.ctx.audio = sink;
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::audio::{MemorySink, SoundInfo, SND_SECRET};
    use crate::engine::level::{ClipSpec, LevelBuilder, Room};
    use crate::game::entities::actions::ActionKind;
    use crate::game::entities::behavior::{Behavior, FreeBody};
    use crate::game::entities::controller::Body;
    use glam::IVec3;

    const DT: f32 = 1.0 / 30.0;

    /// Entity 0 ends its clip every tick (chain driver); entity 1 idles in a
    /// long clip and never propagates on its own.
    fn chain_level() -> Level {
        LevelBuilder::new()
            .room(Room::flat(0, 0, 2, 2, 0, 4096))
            .clip(ClipSpec::new(0, 0, 0))
            .clip(ClipSpec::new(0, 6000, 0))
            .model(0)
            .model(1)
            .sample(91)
            .sound(SND_SECRET, SoundInfo { sample: 0, variants: 1, volume: 255, chance: 0 })
            .secrets(2)
            .entity(Entity::skeletal(0, IVec3::new(512, 0, 512), 0))
            .entity(Entity::skeletal(1, IVec3::new(1536, 0, 512), 0).with_kind(1))
            .build()
            .unwrap()
    }

    fn arm(world: &mut World, driver: usize, links: &[(ActionKind, i32, f32)]) {
        let head = world.context_mut().arena.chain(links).unwrap();
        world.controller_mut(driver).unwrap().body.action = Some(head);
    }

    #[test]
    fn test_activation_hands_chain_to_target() {
        let mut world = World::new(chain_level());
        arm(&mut world, 0, &[(ActionKind::End, 0, 0.0), (ActionKind::Activate, 1, 0.0)]);

        world.update(DT);

        assert_eq!(world.controller(0).unwrap().body.action, None);
        let handed = world.controller(1).unwrap().body.action.unwrap();
        assert_eq!(world.context().arena.get(handed).kind, ActionKind::Activate);
    }

    #[test]
    fn test_refused_activation_is_retried() {
        struct Busy;
        impl Behavior for Busy {
            fn accept_activation(&self, _body: &Body) -> bool {
                false
            }
        }
        let registry = BehaviorRegistry::new()
            .with_fallback(|| Box::new(FreeBody::default()))
            .register(1, || Box::new(Busy));
        let mut world = World::with_registry(chain_level(), &registry);
        arm(&mut world, 0, &[(ActionKind::End, 0, 0.0), (ActionKind::Activate, 1, 0.0)]);
        let head = world.controller(0).unwrap().body.action.unwrap();

        world.update(DT);
        world.update(DT);

        // Still parked with the sender, still pointing at the head.
        assert_eq!(world.controller(0).unwrap().body.action, Some(head));
        assert_eq!(world.controller(1).unwrap().body.action, None);
    }

    #[test]
    fn test_camera_links_redirect_to_camera_slot() {
        let mut world = World::new(chain_level());
        world.set_camera(1);
        arm(&mut world, 0, &[(ActionKind::End, 0, 0.0), (ActionKind::CameraSwitch, 4, 0.0)]);

        world.update(DT);

        let handed = world.controller(1).unwrap().body.action.unwrap();
        assert_eq!(world.context().arena.get(handed).kind, ActionKind::CameraSwitch);
    }

    #[test]
    fn test_missing_target_clears_chain() {
        let mut world = World::new(chain_level());
        arm(&mut world, 0, &[(ActionKind::End, 0, 0.0), (ActionKind::Activate, 42, 0.0)]);

        world.update(DT);

        assert_eq!(world.controller(0).unwrap().body.action, None);
    }

    #[test]
    fn test_self_targeting_link_is_dropped() {
        // The driver's own slot is vacant while it runs; a link pointing back
        // at it resolves to nothing and the chain ends.
        let mut world = World::new(chain_level());
        arm(&mut world, 0, &[(ActionKind::End, 0, 0.0), (ActionKind::Activate, 0, 0.0)]);

        world.update(DT);

        assert_eq!(world.controller(0).unwrap().body.action, None);
    }

    #[test]
    fn test_secret_fires_once_and_never_blocks() {
        let sink = MemorySink::new();
        let mut world = World::new(chain_level());
        world.set_audio(Box::new(sink.handle()));

        arm(&mut world, 0, &[(ActionKind::End, 0, 0.0), (ActionKind::Secret, 0, 0.0)]);
        world.update(DT);
        assert!(world.context().secrets[0]);
        assert_eq!(sink.count(), 1);
        assert_eq!(world.controller(0).unwrap().body.action, None);

        // Re-running the same secret: no sound, chain still advances through
        // it into the activation.
        arm(
            &mut world,
            0,
            &[
                (ActionKind::End, 0, 0.0),
                (ActionKind::Secret, 0, 0.0),
                (ActionKind::Activate, 1, 0.0),
            ],
        );
        world.update(DT);
        assert_eq!(sink.count(), 1);
        assert!(world.controller(1).unwrap().body.action.is_some());
        assert_eq!(world.controller(0).unwrap().body.action, None);
    }

    #[test]
    fn test_distinct_secrets_both_count() {
        let sink = MemorySink::new();
        let mut world = World::new(chain_level());
        world.set_audio(Box::new(sink.handle()));

        arm(
            &mut world,
            0,
            &[
                (ActionKind::End, 0, 0.0),
                (ActionKind::Secret, 0, 0.0),
                (ActionKind::Secret, 1, 0.0),
            ],
        );
        world.update(DT);

        assert!(world.context().secrets[0] && world.context().secrets[1]);
        assert_eq!(sink.count(), 2);
    }

    #[test]
    fn test_inert_links_advance_one_per_activation() {
        let sink = MemorySink::new();
        let mut world = World::new(chain_level());
        world.set_audio(Box::new(sink.handle()));

        arm(
            &mut world,
            0,
            &[
                (ActionKind::End, 0, 0.0),
                (ActionKind::Soundtrack, 3, 0.0),
                (ActionKind::Secret, 0, 0.0),
            ],
        );

        world.update(DT);
        // Stepped onto the soundtrack link, nothing fired yet.
        assert_eq!(sink.count(), 0);
        assert!(world.controller(0).unwrap().body.action.is_some());

        world.update(DT);
        // Next end-of-clip walks on into the secret.
        assert_eq!(sink.count(), 1);
        assert_eq!(world.controller(0).unwrap().body.action, None);
    }

    #[test]
    fn test_none_model_entities_get_no_slot() {
        let level = LevelBuilder::new()
            .room(Room::flat(0, 0, 1, 1, 0, 4096))
            .entity(Entity {
                kind: 0,
                model: ModelRef::None,
                pos: IVec3::new(512, 0, 512),
                rotation: 0.0,
                room: 0,
                health: 100,
                active: true,
            })
            .build()
            .unwrap();
        let mut world = World::new(level);
        world.update(DT);
        assert!(world.controller(0).is_none());
        assert!(world.sprite(0).is_none());
    }
}
