// Level: read-only data tables plus the topology query surface
//
// A `Level` is immutable after construction and shared by every controller.
// `LevelBuilder` assembles one and `validate` gates data integrity at the
// load boundary; past that point the simulation trusts the tables.

mod builder;
mod data;
mod topology;

pub use builder::{ClipSpec, LevelBuilder};
pub use data::{
    AnimCommand, Animation, CommandReader, Entity, FrameRange, Model, ModelRef, RoomId,
    SpriteSequence, StateChange, StateId, CMD_EMPTY, CMD_KILL, CMD_MOVE, CMD_SOUND, CMD_SPECIAL,
    CMD_SPEED, SPECIAL_BUBBLE, SPECIAL_CTRL, SPECIAL_FLIP,
};
pub use topology::{BoxFloor, FloorInfo, Overlap, PathBox, Room, Sector, SECTOR_SIZE};

use glam::{IVec3, Vec3};

use crate::engine::audio::SoundBank;

/// Errors surfaced by [`Level::validate`] at the load boundary.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("animation {index}: frame range {start}..{end} is inverted")]
    InvertedFrameRange { index: usize, start: i32, end: i32 },

    #[error("animation {index}: state-change or command span out of bounds")]
    AnimationSpan { index: usize },

    #[error("animation {index}: next animation {next} does not exist")]
    BadNextAnimation { index: usize, next: usize },

    #[error("state change {0}: frame-range span out of bounds")]
    ChangeSpan(usize),

    #[error("frame range {index}: next animation {next} does not exist")]
    BadRangeTarget { index: usize, next: usize },

    #[error("room {0}: malformed sector grid or dangling link")]
    BadRoom(RoomId),

    #[error("entity {0}: dangling room or model reference")]
    BadEntity(usize),

    #[error("model {0}: dangling animation reference")]
    BadModel(usize),

    #[error("pathing tables: dangling box or overlap reference")]
    BadPathing,

    #[error("sound bank: dangling info or sample reference")]
    BadSoundBank,
}

/// The full read-only table set of one loaded level.
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub rooms: Vec<Room>,
    pub anims: Vec<Animation>,
    pub state_changes: Vec<StateChange>,
    pub ranges: Vec<FrameRange>,
    /// Shared command stream; clips address it by span.
    pub commands: Vec<i16>,
    pub models: Vec<Model>,
    pub sprite_sequences: Vec<SpriteSequence>,
    pub boxes: Vec<PathBox>,
    pub overlaps: Vec<Overlap>,
    pub sounds: SoundBank,
    /// Initial entity placements; the world clones these into live records.
    pub entities: Vec<Entity>,
    pub secret_count: usize,
}

impl Level {
    /// State changes attached to a clip.
    pub fn changes_of(&self, anim: &Animation) -> &[StateChange] {
        &self.state_changes[anim.change_offset..anim.change_offset + anim.change_count]
    }

    /// Frame ranges attached to a state change.
    pub fn ranges_of(&self, change: &StateChange) -> &[FrameRange] {
        &self.ranges[change.range_offset..change.range_offset + change.range_count]
    }

    /// Decoder over a clip's command records.
    pub fn commands_of(&self, anim: &Animation) -> CommandReader<'_> {
        CommandReader::new(&self.commands, anim.command_offset, anim.command_count)
    }

    /// Floor, ceiling and adjacency at a position within `room`.
    pub fn floor_info(&self, room: RoomId, x: i32, z: i32) -> FloorInfo {
        let sector = self.rooms[room as usize].sector(x, z);
        FloorInfo {
            floor: sector.floor as f32,
            ceiling: sector.ceiling as f32,
            room_below: sector.room_below,
            room_above: sector.room_above,
            room_next: sector.room_next,
        }
    }

    /// Whether a point lies inside a room's bounding block.
    pub fn inside_room(&self, pos: Vec3, room: RoomId) -> bool {
        self.rooms[room as usize].contains(pos)
    }

    /// Pathing query: floor height of the box containing the target, walking
    /// the overlap run of the starting sector's box. Among several reachable
    /// candidates the one nearest to `from.y` wins. `None` when the target
    /// is not reachable from here.
    pub fn nearest_box_floor(&self, room: RoomId, from: IVec3, to_x: i32, to_z: i32) -> Option<BoxFloor> {
        let sector = self.rooms[room as usize].sector(from.x, from.z);
        let start = self.boxes[sector.box_index? as usize];
        if start.contains(to_x, to_z) {
            return Some(BoxFloor { floor: start.floor, delta: 0 });
        }

        let mut nearest = None;
        let mut best = i32::MAX;
        let mut i = start.overlap?;
        loop {
            let entry = self.overlaps[i];
            let neighbour = self.boxes[entry.box_index as usize];
            if neighbour.contains(to_x, to_z) {
                let d = (neighbour.floor - from.y).abs();
                if d < best {
                    nearest = Some(neighbour.floor);
                    best = d;
                }
            }
            if entry.end {
                break;
            }
            i += 1;
        }

        nearest.map(|floor| BoxFloor { floor, delta: floor - start.floor })
    }

    /// Cross-table integrity check. The simulation assumes this has passed.
    pub fn validate(&self) -> Result<(), LevelError> {
        for (index, room) in self.rooms.iter().enumerate() {
            let ok = room.sectors.len() == room.x_sectors * room.z_sectors
                && room.sectors.iter().all(|s| {
                    let link = |r: Option<RoomId>| r.is_none_or(|r| (r as usize) < self.rooms.len());
                    let boxed = s.box_index.is_none_or(|b| (b as usize) < self.boxes.len());
                    link(s.room_below) && link(s.room_above) && link(s.room_next) && boxed
                });
            if !ok {
                return Err(LevelError::BadRoom(index as RoomId));
            }
        }

        for (index, anim) in self.anims.iter().enumerate() {
            if anim.frame_start > anim.frame_end {
                return Err(LevelError::InvertedFrameRange {
                    index,
                    start: anim.frame_start,
                    end: anim.frame_end,
                });
            }
            if anim.next_animation >= self.anims.len() {
                return Err(LevelError::BadNextAnimation {
                    index,
                    next: anim.next_animation,
                });
            }
            if anim.change_offset + anim.change_count > self.state_changes.len() {
                return Err(LevelError::AnimationSpan { index });
            }
            // Command records are variable-length; walk them to bound the span.
            let mut cursor = anim.command_offset;
            for _ in 0..anim.command_count {
                match self.commands.get(cursor) {
                    Some(&cmd) => cursor += 1 + data::operand_count(cmd),
                    None => return Err(LevelError::AnimationSpan { index }),
                }
            }
            if cursor > self.commands.len() {
                return Err(LevelError::AnimationSpan { index });
            }
        }

        for (index, change) in self.state_changes.iter().enumerate() {
            if change.range_offset + change.range_count > self.ranges.len() {
                return Err(LevelError::ChangeSpan(index));
            }
        }
        for (index, range) in self.ranges.iter().enumerate() {
            if range.next_animation >= self.anims.len() {
                return Err(LevelError::BadRangeTarget {
                    index,
                    next: range.next_animation,
                });
            }
        }

        for (index, model) in self.models.iter().enumerate() {
            if model.animation >= self.anims.len() {
                return Err(LevelError::BadModel(index));
            }
        }

        for (index, entity) in self.entities.iter().enumerate() {
            let model_ok = match entity.model {
                ModelRef::Skeletal(m) => m < self.models.len(),
                ModelRef::Sprite(s) => s < self.sprite_sequences.len(),
                ModelRef::None => true,
            };
            if !model_ok || entity.room as usize >= self.rooms.len() {
                return Err(LevelError::BadEntity(index));
            }
        }

        let boxes_ok = self
            .boxes
            .iter()
            .all(|b| b.overlap.is_none_or(|o| o < self.overlaps.len()));
        let overlaps_ok = self
            .overlaps
            .iter()
            .all(|o| (o.box_index as usize) < self.boxes.len());
        if !boxes_ok || !overlaps_ok {
            return Err(LevelError::BadPathing);
        }

        let map_ok = self
            .sounds
            .map
            .iter()
            .all(|&slot| slot < 0 || (slot as usize) < self.sounds.infos.len());
        let infos_ok = self
            .sounds
            .infos
            .iter()
            .all(|i| i.sample + i.variants.max(1) <= self.sounds.samples.len());
        if !map_ok || !infos_ok {
            return Err(LevelError::BadSoundBank);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_room_level() -> Level {
        let portal = Sector {
            floor: 0,
            ceiling: 2048,
            room_next: Some(1),
            ..Sector::default()
        };
        LevelBuilder::new()
            .room(Room::flat(0, 0, 2, 2, 0, 2048).with_sector(1, 1, portal))
            .room(Room::flat(2048, 0, 2, 2, -1024, 2048))
            .build()
            .unwrap()
    }

    #[test]
    fn test_floor_info_reads_sector() {
        let level = two_room_level();
        let info = level.floor_info(0, 512, 512);
        assert_eq!(info.floor, 0.0);
        assert_eq!(info.ceiling, 2048.0);
        assert_eq!(info.room_next, None);

        let info = level.floor_info(0, 1536, 1536);
        assert_eq!(info.room_next, Some(1));
    }

    #[test]
    fn test_inside_room() {
        let level = two_room_level();
        assert!(level.inside_room(Vec3::new(512.0, 100.0, 512.0), 0));
        assert!(!level.inside_room(Vec3::new(3000.0, 100.0, 512.0), 0));
    }

    #[test]
    fn test_nearest_box_floor_same_box() {
        let level = LevelBuilder::new()
            .room(Room::flat(0, 0, 1, 1, 0, 2048).with_sector(
                0,
                0,
                Sector {
                    floor: 0,
                    ceiling: 2048,
                    box_index: Some(0),
                    ..Sector::default()
                },
            ))
            .path_box(PathBox {
                min_x: 0,
                max_x: 1024,
                min_z: 0,
                max_z: 1024,
                floor: 0,
                overlap: None,
            })
            .build()
            .unwrap();

        let hit = level.nearest_box_floor(0, IVec3::new(512, 0, 512), 600, 600);
        assert_eq!(hit, Some(BoxFloor { floor: 0, delta: 0 }));
        // Target outside the box with no overlap run: unreachable.
        assert_eq!(level.nearest_box_floor(0, IVec3::new(512, 0, 512), 5000, 600), None);
    }

    #[test]
    fn test_nearest_box_floor_prefers_smallest_drop() {
        let start = PathBox {
            min_x: 0,
            max_x: 1024,
            min_z: 0,
            max_z: 1024,
            floor: 0,
            overlap: Some(0),
        };
        // Two stacked candidates both containing the target.
        let low = PathBox {
            min_x: 1024,
            max_x: 2048,
            min_z: 0,
            max_z: 1024,
            floor: -1024,
            overlap: None,
        };
        let high = PathBox {
            min_x: 1024,
            max_x: 2048,
            min_z: 0,
            max_z: 1024,
            floor: -128,
            overlap: None,
        };
        let level = LevelBuilder::new()
            .room(Room::flat(0, 0, 2, 1, 0, 2048).with_sector(
                0,
                0,
                Sector {
                    floor: 0,
                    ceiling: 2048,
                    box_index: Some(0),
                    ..Sector::default()
                },
            ))
            .path_box(start)
            .path_box(low)
            .path_box(high)
            .overlap(Overlap { box_index: 1, end: false })
            .overlap(Overlap { box_index: 2, end: true })
            .build()
            .unwrap();

        let hit = level.nearest_box_floor(0, IVec3::new(512, 0, 512), 1500, 512).unwrap();
        assert_eq!(hit.floor, -128);
        assert_eq!(hit.delta, -128);
    }

    #[test]
    fn test_validate_rejects_inverted_frame_range() {
        let err = LevelBuilder::new()
            .room(Room::flat(0, 0, 1, 1, 0, 2048))
            .clip(ClipSpec::new(10, 5, 0))
            .build()
            .unwrap_err();
        assert!(matches!(err, LevelError::InvertedFrameRange { index: 0, .. }));
    }

    #[test]
    fn test_validate_rejects_dangling_entity_room() {
        let err = LevelBuilder::new()
            .room(Room::flat(0, 0, 1, 1, 0, 2048))
            .entity(Entity::skeletal(0, IVec3::ZERO, 7))
            .build()
            .unwrap_err();
        assert!(matches!(err, LevelError::BadEntity(0)));
    }
}
