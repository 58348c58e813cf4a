// Fluent construction of level data for tools, demos and tests

use super::data::{Animation, Entity, FrameRange, Model, SpriteSequence, StateChange, StateId};
use super::topology::{Overlap, PathBox, Room};
use super::{Level, LevelError};
use crate::engine::audio::SoundInfo;

/// One clip plus its transitions and command records, wired into the shared
/// tables by [`LevelBuilder::clip`].
pub struct ClipSpec {
    frame_start: i32,
    frame_end: i32,
    state: StateId,
    next: Option<(usize, i32)>,
    changes: Vec<(StateId, Vec<FrameRange>)>,
    commands: Vec<i16>,
    command_count: usize,
}

impl ClipSpec {
    pub fn new(frame_start: i32, frame_end: i32, state: StateId) -> Self {
        Self {
            frame_start,
            frame_end,
            state,
            next: None,
            changes: Vec::new(),
            commands: Vec::new(),
            command_count: 0,
        }
    }

    /// Clip to chain into when this one runs out; defaults to looping itself.
    pub fn next(mut self, animation: usize, frame: i32) -> Self {
        self.next = Some((animation, frame));
        self
    }

    /// Add a state change with its frame-range windows, in table order.
    pub fn change(mut self, state: StateId, ranges: &[FrameRange]) -> Self {
        self.changes.push((state, ranges.to_vec()));
        self
    }

    /// Append one raw command record (opcode plus operands).
    pub fn command(mut self, record: &[i16]) -> Self {
        self.commands.extend_from_slice(record);
        self.command_count += 1;
        self
    }
}

/// Assembles a [`Level`], computing table spans, and validates on build.
#[derive(Default)]
pub struct LevelBuilder {
    level: Level,
}

impl LevelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room(mut self, room: Room) -> Self {
        self.level.rooms.push(room);
        self
    }

    /// Append a clip; its index is the current clip count.
    pub fn clip(mut self, spec: ClipSpec) -> Self {
        let index = self.level.anims.len();
        let (next_animation, next_frame) = spec.next.unwrap_or((index, spec.frame_start));

        let change_offset = self.level.state_changes.len();
        for (state, ranges) in &spec.changes {
            self.level.state_changes.push(StateChange {
                state: *state,
                range_offset: self.level.ranges.len(),
                range_count: ranges.len(),
            });
            self.level.ranges.extend_from_slice(ranges);
        }

        let command_offset = self.level.commands.len();
        self.level.commands.extend_from_slice(&spec.commands);

        self.level.anims.push(Animation {
            frame_start: spec.frame_start,
            frame_end: spec.frame_end,
            state: spec.state,
            next_animation,
            next_frame,
            change_offset,
            change_count: spec.changes.len(),
            command_offset,
            command_count: spec.command_count,
        });
        self
    }

    /// Skeletal model pointing at its first clip.
    pub fn model(mut self, animation: usize) -> Self {
        self.level.models.push(Model { animation });
        self
    }

    pub fn sprite_sequence(mut self, frame_count: usize) -> Self {
        self.level.sprite_sequences.push(SpriteSequence { frame_count });
        self
    }

    pub fn entity(mut self, entity: Entity) -> Self {
        self.level.entities.push(entity);
        self
    }

    pub fn path_box(mut self, path_box: PathBox) -> Self {
        self.level.boxes.push(path_box);
        self
    }

    pub fn overlap(mut self, overlap: Overlap) -> Self {
        self.level.overlaps.push(overlap);
        self
    }

    /// Register a mixer sample handle.
    pub fn sample(mut self, handle: u32) -> Self {
        self.level.sounds.samples.push(handle);
        self
    }

    /// Map a sound id to its playback parameters.
    pub fn sound(mut self, id: u16, info: SoundInfo) -> Self {
        let map = &mut self.level.sounds.map;
        if map.len() <= id as usize {
            map.resize(id as usize + 1, -1);
        }
        map[id as usize] = self.level.sounds.infos.len() as i16;
        self.level.sounds.infos.push(info);
        self
    }

    pub fn secrets(mut self, count: usize) -> Self {
        self.level.secret_count = count;
        self
    }

    pub fn build(self) -> Result<Level, LevelError> {
        self.level.validate()?;
        Ok(self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::level::{AnimCommand, CMD_SOUND};

    #[test]
    fn test_clip_span_wiring() {
        let level = LevelBuilder::new()
            .clip(
                ClipSpec::new(0, 10, 1)
                    .change(
                        2,
                        &[FrameRange { low: 0, high: 10, next_animation: 1, next_frame: 20 }],
                    )
                    .command(&[CMD_SOUND, 3, 9]),
            )
            .clip(ClipSpec::new(20, 25, 2).change(
                1,
                &[FrameRange { low: 20, high: 25, next_animation: 0, next_frame: 0 }],
            ))
            .sample(7)
            .sound(9, SoundInfo { sample: 0, variants: 1, volume: 255, chance: 0 })
            .build()
            .unwrap();

        let first = &level.anims[0];
        let second = &level.anims[1];

        let changes = level.changes_of(second);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].state, 1);
        assert_eq!(level.ranges_of(&changes[0])[0].low, 20);

        let commands: Vec<_> = level.commands_of(first).collect();
        assert_eq!(commands, vec![AnimCommand::Sound { frame: 3, id: 9 }]);
        assert_eq!(level.commands_of(second).count(), 0);
    }

    #[test]
    fn test_clip_defaults_to_self_loop() {
        let level = LevelBuilder::new()
            .clip(ClipSpec::new(5, 8, 0))
            .build()
            .unwrap();
        assert_eq!(level.anims[0].next_animation, 0);
        assert_eq!(level.anims[0].next_frame, 5);
    }

    #[test]
    fn test_sound_map_grows_sparse() {
        let level = LevelBuilder::new()
            .sample(1)
            .sound(4, SoundInfo { sample: 0, variants: 1, volume: 128, chance: 0 })
            .build()
            .unwrap();
        assert_eq!(level.sounds.map.len(), 5);
        assert_eq!(level.sounds.map[0], -1);
        assert_eq!(level.sounds.map[4], 0);
    }
}
