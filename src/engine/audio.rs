// Sound bank and playback interface
//
// The simulation only decides *that* a sound fires; mixing and output belong
// to the host audio engine behind the `AudioSink` trait. Triggering is
// fire-and-forget with no feedback into the tick.

use std::sync::{Arc, Mutex};

use log::debug;

/// Sound id fired the first time a secret is found.
pub const SND_SECRET: u16 = 13;
/// Underwater bubble sound fired by the special animation command.
pub const SND_BUBBLE: u16 = 37;

/// Playback parameters of one sound id.
#[derive(Debug, Clone, Copy)]
pub struct SoundInfo {
    /// First sample variant in the bank's sample table.
    pub sample: usize,
    /// Number of interchangeable variants; one is picked per trigger.
    pub variants: usize,
    /// Playback volume, 0..=255.
    pub volume: u16,
    /// Trigger chance gate against a 15-bit roll; 0 always fires.
    pub chance: u16,
}

/// Sound id lookup plus the sample table handed to the mixer.
#[derive(Debug, Clone, Default)]
pub struct SoundBank {
    /// Sparse map: sound id -> info index, negative for unmapped ids.
    pub map: Vec<i16>,
    pub infos: Vec<SoundInfo>,
    /// Sample handles understood by the host mixer.
    pub samples: Vec<u32>,
}

impl SoundBank {
    /// Resolve a sound id to a concrete (sample, volume) pair, applying the
    /// chance gate and picking a random variant. `None` when the id is
    /// unmapped or the roll fails.
    pub fn resolve(&self, id: u16) -> Option<(u32, f32)> {
        let slot = *self.map.get(id as usize)?;
        if slot < 0 {
            return None;
        }
        let info = self.infos[slot as usize];
        if info.chance != 0 && fastrand::u16(..0x7FFF) > info.chance {
            return None;
        }
        let pick = if info.variants > 1 {
            fastrand::usize(..info.variants)
        } else {
            0
        };
        let sample = *self.samples.get(info.sample + pick)?;
        Some((sample, info.volume as f32 / 255.0))
    }
}

/// Fire-and-forget playback target.
pub trait AudioSink {
    fn play(&mut self, sample: u32, volume: f32);
}

/// Resolve `id` through the bank and hand it to the sink.
pub fn trigger(bank: &SoundBank, sink: &mut dyn AudioSink, id: u16) {
    if let Some((sample, volume)) = bank.resolve(id) {
        sink.play(sample, volume);
    }
}

/// Discards everything; the default for headless simulation.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, sample: u32, volume: f32) {
        debug!("sound {sample} vol {volume:.2}");
    }
}

/// Records triggers for later inspection by headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<(u32, f32)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle sharing this sink's buffer.
    pub fn handle(&self) -> Self {
        self.clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Take every recorded (sample, volume) trigger.
    pub fn drain(&self) -> Vec<(u32, f32)> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl AudioSink for MemorySink {
    fn play(&mut self, sample: u32, volume: f32) {
        if let Ok(mut events) = self.events.lock() {
            events.push((sample, volume));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> SoundBank {
        SoundBank {
            map: vec![-1, 0, 1],
            infos: vec![
                SoundInfo { sample: 0, variants: 1, volume: 255, chance: 0 },
                SoundInfo { sample: 1, variants: 2, volume: 128, chance: 0 },
            ],
            samples: vec![100, 200, 201],
        }
    }

    #[test]
    fn test_unmapped_id_is_silent() {
        assert!(bank().resolve(0).is_none());
        assert!(bank().resolve(99).is_none());
    }

    #[test]
    fn test_resolve_volume_scaling() {
        let (sample, volume) = bank().resolve(1).unwrap();
        assert_eq!(sample, 100);
        assert!((volume - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_picks_a_variant() {
        let (sample, _) = bank().resolve(2).unwrap();
        assert!(sample == 200 || sample == 201);
    }

    #[test]
    fn test_memory_sink_records() {
        let sink = MemorySink::new();
        let mut handle = sink.handle();
        trigger(&bank(), &mut handle, 1);
        trigger(&bank(), &mut handle, 0);
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.drain()[0].0, 100);
        assert_eq!(sink.count(), 0);
    }
}
