// Level data tables
//
// Read-only, index-keyed tables describing animation clips, state changes
// and the embedded command stream. Parsing these out of a level file is the
// loader's job; the simulation only consumes them.

use glam::IVec3;

/// Discrete animation state id, shared between clips and entity-kind logic.
pub type StateId = u16;

/// Index into the room table.
pub type RoomId = u16;

/// Reference from an entity to its simulation archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRef {
    /// Skeletal model index into the model table.
    Skeletal(usize),
    /// Sprite sequence index into the sprite-sequence table.
    Sprite(usize),
    /// No visual: camera targets and other marker entities.
    None,
}

/// Mutable per-entity record. The world owns the live copies; a controller
/// addresses its record by index and writes simulation state back each tick.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Entity-kind id, used for behavior lookup.
    pub kind: u16,
    pub model: ModelRef,
    pub pos: IVec3,
    /// Yaw in radians.
    pub rotation: f32,
    pub room: RoomId,
    pub health: i32,
    pub active: bool,
}

impl Entity {
    pub fn skeletal(model: usize, pos: IVec3, room: RoomId) -> Self {
        Self {
            kind: 0,
            model: ModelRef::Skeletal(model),
            pos,
            rotation: 0.0,
            room,
            health: 100,
            active: true,
        }
    }

    pub fn sprite(sequence: usize, pos: IVec3, room: RoomId) -> Self {
        Self {
            model: ModelRef::Sprite(sequence),
            ..Self::skeletal(0, pos, room)
        }
    }

    pub fn with_kind(mut self, kind: u16) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }
}

/// A single keyframe animation clip. Frames run `frame_start..=frame_end`;
/// an inverted range is a data-integrity violation.
#[derive(Debug, Clone, Copy)]
pub struct Animation {
    pub frame_start: i32,
    pub frame_end: i32,
    /// Intrinsic discrete state of the clip.
    pub state: StateId,
    /// Clip to chain into when this one runs out.
    pub next_animation: usize,
    pub next_frame: i32,
    /// Span into the state-change table.
    pub change_offset: usize,
    pub change_count: usize,
    /// Span into the shared command stream, counted in records.
    pub command_offset: usize,
    pub command_count: usize,
}

/// Legal transition out of a clip towards `state`, guarded by frame ranges.
#[derive(Debug, Clone, Copy)]
pub struct StateChange {
    pub state: StateId,
    /// Span into the frame-range table.
    pub range_offset: usize,
    pub range_count: usize,
}

/// Frame window in which a state change may fire. Table order is
/// authoritative: the first window containing the cursor wins.
#[derive(Debug, Clone, Copy)]
pub struct FrameRange {
    pub low: i32,
    pub high: i32,
    pub next_animation: usize,
    pub next_frame: i32,
}

/// Skeletal model: entry point into the animation table.
#[derive(Debug, Clone, Copy)]
pub struct Model {
    pub animation: usize,
}

/// Billboard sprite sequence.
#[derive(Debug, Clone, Copy)]
pub struct SpriteSequence {
    pub frame_count: usize,
}

// Command stream opcodes, fixed by the level-data format.
pub const CMD_MOVE: i16 = 1;
pub const CMD_SPEED: i16 = 2;
pub const CMD_EMPTY: i16 = 3;
pub const CMD_KILL: i16 = 4;
pub const CMD_SOUND: i16 = 5;
pub const CMD_SPECIAL: i16 = 6;

// Sub-ops of CMD_SPECIAL.
pub const SPECIAL_FLIP: i16 = 0;
pub const SPECIAL_BUBBLE: i16 = 3;
pub const SPECIAL_CTRL: i16 = 12;

/// Operand words following an opcode. Unknown opcodes carry none.
pub(super) fn operand_count(cmd: i16) -> usize {
    match cmd {
        CMD_MOVE => 3,
        CMD_SPEED | CMD_SOUND | CMD_SPECIAL => 2,
        _ => 0,
    }
}

/// One decoded animation command record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimCommand {
    /// Displace the entity at end-of-clip, in model space.
    Move { dx: i16, dy: i16, dz: i16 },
    /// Launch velocity applied at end-of-clip.
    Speed { vy: i16, vz: i16 },
    Empty,
    Kill,
    /// Fire sound `id` when the cursor crosses `frame`.
    Sound { frame: i16, id: u16 },
    /// Special effect `op` on the exact `frame`.
    Special { frame: i16, op: i16 },
    Unknown(i16),
}

/// Streaming decoder over one clip's slice of the shared command stream.
pub struct CommandReader<'a> {
    stream: &'a [i16],
    cursor: usize,
    remaining: usize,
}

impl<'a> CommandReader<'a> {
    pub fn new(stream: &'a [i16], offset: usize, count: usize) -> Self {
        Self {
            stream,
            cursor: offset,
            remaining: count,
        }
    }

    fn take(&mut self) -> i16 {
        let word = self.stream[self.cursor];
        self.cursor += 1;
        word
    }
}

impl Iterator for CommandReader<'_> {
    type Item = AnimCommand;

    fn next(&mut self) -> Option<AnimCommand> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        Some(match self.take() {
            CMD_MOVE => AnimCommand::Move {
                dx: self.take(),
                dy: self.take(),
                dz: self.take(),
            },
            CMD_SPEED => AnimCommand::Speed {
                vy: self.take(),
                vz: self.take(),
            },
            CMD_EMPTY => AnimCommand::Empty,
            CMD_KILL => AnimCommand::Kill,
            CMD_SOUND => {
                let frame = self.take();
                let id = self.take() as u16 & 0x3FFF;
                AnimCommand::Sound { frame, id }
            }
            CMD_SPECIAL => AnimCommand::Special {
                frame: self.take(),
                op: self.take(),
            },
            other => AnimCommand::Unknown(other),
        })
    }
}
