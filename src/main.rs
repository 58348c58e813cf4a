use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use glam::IVec3;
use log::info;

use rusted_depths::engine::audio::{MemorySink, SoundInfo, SND_SECRET};
use rusted_depths::engine::clock::FixedClock;
use rusted_depths::engine::level::{ClipSpec, Entity, LevelBuilder, Room};
use rusted_depths::game::entities::ActionKind;
use rusted_depths::World;

/// Headless demo: a crate drops into a hall, its clip loop trips a trigger
/// chain (secret, then a door activation), and a fountain sprite animates.
fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting rusted-depths headless demo...");

    let level = LevelBuilder::new()
        .room(Room::flat(0, 0, 4, 4, 0, 4096))
        // Clip 0: one-second loop driving the crate (and its trigger chain).
        .clip(ClipSpec::new(0, 29, 0))
        // Clip 1: long idle for the door.
        .clip(ClipSpec::new(0, 6000, 0))
        .model(0)
        .model(1)
        .sprite_sequence(4)
        .sample(1)
        .sound(SND_SECRET, SoundInfo { sample: 0, variants: 1, volume: 255, chance: 0 })
        .secrets(1)
        .entity(Entity::skeletal(0, IVec3::new(2048, 3000, 2048), 0))
        .entity(Entity::skeletal(1, IVec3::new(512, 0, 512), 0))
        .entity(Entity::sprite(0, IVec3::new(1024, 0, 1024), 0))
        .build()?;

    let sink = MemorySink::new();
    let mut world = World::new(level);
    world.set_audio(Box::new(sink.handle()));

    // Trigger chain carried by the crate: count a secret, then hand the
    // chain to the door.
    let head = world
        .context_mut()
        .arena
        .chain(&[
            (ActionKind::End, 0, 0.0),
            (ActionKind::Secret, 0, 0.0),
            (ActionKind::Activate, 1, 0.0),
        ])
        .expect("demo chain is non-empty");
    world.controller_mut(0).expect("crate controller").body.action = Some(head);

    // Two seconds of real time at a fixed 30 Hz.
    let mut clock = FixedClock::new();
    let start = Instant::now();
    let mut last = start;
    let mut ticks = 0u32;

    while start.elapsed() < Duration::from_secs(2) {
        let now = Instant::now();
        let steps = clock.advance(now - last);
        last = now;

        for _ in 0..steps {
            world.update(clock.timestep());
            ticks += 1;
        }
        thread::sleep(Duration::from_millis(2));
    }

    let body = &world.controller(0).expect("crate controller").body;
    info!("ran {ticks} ticks");
    info!(
        "crate landed at y = {:.1} (stand {:?}, velocity.y {:.1})",
        body.pos.y, body.stand, body.velocity.y
    );
    info!(
        "secret found: {}, secret sounds fired: {}",
        world.context().secrets[0],
        sink.count()
    );
    info!(
        "door holds a chain link: {}",
        world.controller(1).expect("door controller").body.action.is_some()
    );
    info!(
        "fountain sprite on frame {}",
        world.sprite(2).expect("fountain sprite").frame()
    );

    Ok(())
}
