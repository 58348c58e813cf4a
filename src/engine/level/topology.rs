// Sector topology
//
// Static spatial structure of a level: rooms subdivided into a sector grid,
// each sector carrying floor/ceiling heights and room-adjacency links, plus
// the box/overlap tables behind pathing queries. Y is up; floors sit below
// ceilings numerically.

use glam::Vec3;

use super::data::RoomId;

/// World units per sector cell.
pub const SECTOR_SIZE: i32 = 1024;

/// One cell of a room's grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sector {
    pub floor: i32,
    pub ceiling: i32,
    /// Room continuing below the floor, if any.
    pub room_below: Option<RoomId>,
    /// Room continuing above the ceiling, if any.
    pub room_above: Option<RoomId>,
    /// Horizontal portal: room to switch into when standing here.
    pub room_next: Option<RoomId>,
    /// Pathing box covering this sector.
    pub box_index: Option<u16>,
}

/// A room: an axis-aligned block of sectors with a vertical extent.
#[derive(Debug, Clone)]
pub struct Room {
    /// World position of the grid's (0, 0) corner.
    pub x: i32,
    pub z: i32,
    pub y_floor: i32,
    pub y_ceiling: i32,
    pub x_sectors: usize,
    pub z_sectors: usize,
    pub water: bool,
    /// Row-major by x: `sectors[sx * z_sectors + sz]`.
    pub sectors: Vec<Sector>,
}

impl Room {
    /// Room with a uniform floor and ceiling across all sectors.
    pub fn flat(x: i32, z: i32, x_sectors: usize, z_sectors: usize, floor: i32, ceiling: i32) -> Self {
        let sector = Sector {
            floor,
            ceiling,
            ..Sector::default()
        };
        Self {
            x,
            z,
            y_floor: floor,
            y_ceiling: ceiling,
            x_sectors,
            z_sectors,
            water: false,
            sectors: vec![sector; x_sectors * z_sectors],
        }
    }

    pub fn water(mut self) -> Self {
        self.water = true;
        self
    }

    /// Replace one grid cell.
    pub fn with_sector(mut self, sx: usize, sz: usize, sector: Sector) -> Self {
        self.sectors[sx * self.z_sectors + sz] = sector;
        self
    }

    /// Sector under a world position; coordinates outside the grid clamp to
    /// the border cells.
    pub fn sector(&self, x: i32, z: i32) -> &Sector {
        let sx = ((x - self.x) / SECTOR_SIZE).clamp(0, self.x_sectors as i32 - 1) as usize;
        let sz = ((z - self.z) / SECTOR_SIZE).clamp(0, self.z_sectors as i32 - 1) as usize;
        &self.sectors[sx * self.z_sectors + sz]
    }

    /// Whether a point lies within the room's bounding block.
    pub fn contains(&self, pos: Vec3) -> bool {
        let max_x = self.x + self.x_sectors as i32 * SECTOR_SIZE;
        let max_z = self.z + self.z_sectors as i32 * SECTOR_SIZE;
        pos.x >= self.x as f32
            && pos.x <= max_x as f32
            && pos.y >= self.y_floor as f32
            && pos.y <= self.y_ceiling as f32
            && pos.z >= self.z as f32
            && pos.z <= max_z as f32
    }
}

/// Result of a topology query at a position.
#[derive(Debug, Clone, Copy)]
pub struct FloorInfo {
    pub floor: f32,
    pub ceiling: f32,
    pub room_below: Option<RoomId>,
    pub room_above: Option<RoomId>,
    pub room_next: Option<RoomId>,
}

/// XZ rectangle of walkable ground at a fixed floor height, linked to its
/// reachable neighbours through the overlap table.
#[derive(Debug, Clone, Copy)]
pub struct PathBox {
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
    pub floor: i32,
    /// First entry of this box's run in the overlap table.
    pub overlap: Option<usize>,
}

impl PathBox {
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

/// One entry in a box's overlap run; `end` terminates the run.
#[derive(Debug, Clone, Copy)]
pub struct Overlap {
    pub box_index: u16,
    pub end: bool,
}

/// Answer to a box-reachability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxFloor {
    pub floor: i32,
    /// Height difference against the starting box.
    pub delta: i32,
}
