// Animation sequencing: the clip cursor and table-driven state transitions

use crate::engine::level::{Level, StateId};

/// Animation samples per second, fixed by the clip data format.
pub const ANIM_FPS: f32 = 30.0;

/// Cursor over the animation tables: the active clip, elapsed time within
/// it, and the last frame index the command interpreter has processed
/// (−1 right after a switch).
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    pub index: usize,
    pub time: f32,
    pub prev_frame: i32,
}

impl Sequencer {
    pub fn start(index: usize) -> Self {
        Self {
            index,
            time: 0.0,
            prev_frame: 0,
        }
    }

    /// Frame index relative to the active clip's start.
    pub fn frame_index(&self) -> i32 {
        (self.time * ANIM_FPS) as i32
    }

    /// Switch to clip `index`, positioning the cursor on `frame` (or the
    /// clip start). Returns the clip's intrinsic state.
    pub fn set_animation(&mut self, level: &Level, index: usize, frame: Option<i32>) -> StateId {
        let anim = level.anims[index];
        assert!(
            anim.frame_start <= anim.frame_end,
            "clip {index}: inverted frame range"
        );
        self.index = index;
        self.time = match frame {
            Some(f) => (f - anim.frame_start) as f32 / ANIM_FPS,
            None => 0.0,
        };
        self.prev_frame = -1;
        anim.state
    }

    /// Try to reach `state` through the active clip's state-change table.
    /// Records are scanned in stored order; the first frame window
    /// containing the cursor wins and the clip switches. A state that is
    /// present but whose windows miss the cursor counts as reachable
    /// without switching. Returns false only when the table has no entry
    /// for `state` at all.
    pub fn set_state(&mut self, level: &Level, state: StateId) -> bool {
        let anim = level.anims[self.index];
        if state == anim.state {
            return true;
        }

        let frame = anim.frame_start + self.frame_index();
        let mut known = false;
        for change in level.changes_of(&anim) {
            if change.state != state {
                continue;
            }
            known = true;
            for range in level.ranges_of(change) {
                if frame >= range.low && frame <= range.high {
                    self.set_animation(level, range.next_animation, Some(range.next_frame));
                    return true;
                }
            }
        }
        known
    }
}
