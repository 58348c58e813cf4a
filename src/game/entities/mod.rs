// Entity simulation
//
// Everything that runs per entity per tick:
// - stand classification and the status mask
// - the animation sequencer and its state-change transitions
// - entity-kind behavior hooks
// - the skeletal controller pipeline and collision resolution
// - trigger action chains
// - sprite controllers for ephemeral billboard entities

pub mod actions;
pub mod animation;
pub mod behavior;
pub mod controller;
pub mod sprite;
pub mod stand;

// Re-export commonly used types
pub use actions::{ActionArena, ActionCommand, ActionId, ActionKind};
pub use animation::{Sequencer, ANIM_FPS};
pub use behavior::{Behavior, BehaviorRegistry, FreeBody, GRAVITY};
pub use controller::{Body, Controller};
pub use sprite::{SpriteController, SpriteFrame, SPRITE_FPS};
pub use stand::{InputMask, Stand};
