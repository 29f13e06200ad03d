/// Sound engine: procedural effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Without the "sound" feature the stub SoundEngine does nothing.

use crate::sim::event::GameEvent;

/// Which effect an event plays, if any.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Shot,
    Pickup,
    Hit,
    Fall,
    Die,
    Clear,
}

impl Sfx {
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::ProjectileFired { .. } => Some(Sfx::Shot),
            GameEvent::EnergyCollected { .. } => Some(Sfx::Pickup),
            GameEvent::PlayerHit { .. } => Some(Sfx::Hit),
            GameEvent::FellOut { .. } => Some(Sfx::Fall),
            GameEvent::PlayerDied { .. } => Some(Sfx::Die),
            GameEvent::LevelCleared { .. } => Some(Sfx::Clear),
            GameEvent::ProjectileExpired { .. } => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        shot: Arc<Vec<u8>>,
        pickup: Arc<Vec<u8>>,
        hit: Arc<Vec<u8>>,
        fall: Arc<Vec<u8>>,
        die: Arc<Vec<u8>>,
        clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(s) => s,
                Err(e) => {
                    log::info!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                shot: Arc::new(make_wav(&gen_shot())),
                pickup: Arc::new(make_wav(&gen_notes(&[(880.0, 0.04), (1175.0, 0.04), (1760.0, 0.06)], 0.25))),
                hit: Arc::new(make_wav(&gen_hit())),
                fall: Arc::new(make_wav(&gen_sweep(700.0, 150.0, 0.3))),
                die: Arc::new(make_wav(&gen_notes(&[(392.0, 0.12), (330.0, 0.12), (262.0, 0.25)], 0.3))),
                clear: Arc::new(make_wav(&gen_notes(
                    &[(523.0, 0.09), (659.0, 0.09), (784.0, 0.09), (1047.0, 0.3)],
                    0.3,
                ))),
            })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match sfx {
                Sfx::Shot => &self.shot,
                Sfx::Pickup => &self.pickup,
                Sfx::Hit => &self.hit,
                Sfx::Fall => &self.fall,
                Sfx::Die => &self.die,
                Sfx::Clear => &self.clear,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators (mono f32 samples)
    // ════════════════════════════════════════════════════════════

    fn len(secs: f32) -> usize {
        (SAMPLE_RATE as f32 * secs) as usize
    }

    /// Note sequence with a soft second harmonic, each note fading out.
    fn gen_notes(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = len(dur);
            samples.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.7);
                let wave = (t * freq * TAU).sin() * 0.75 + (t * freq * 2.0 * TAU).sin() * 0.25;
                wave * env * volume
            }));
        }
        samples
    }

    /// Sine glide from `from` Hz to `to` Hz.
    fn gen_sweep(from: f32, to: f32, dur: f32) -> Vec<f32> {
        let n = len(dur);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                phase += (from + (to - from) * p) * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - p) * 0.25
            })
            .collect()
    }

    /// Cannon: low thump with a noise burst.
    fn gen_shot() -> Vec<f32> {
        let n = len(0.09);
        let mut seed: u32 = 0x9e37_79b9;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let noise = (seed >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                let thump = (t * (120.0 - 60.0 * p) * TAU).sin();
                (thump * 0.6 + noise * 0.4) * (1.0 - p).powi(2) * 0.35
            })
            .collect()
    }

    /// Player hit: two detuned square-ish tones.
    fn gen_hit() -> Vec<f32> {
        let n = len(0.14);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let p = i as f32 / n as f32;
                let a = (t * 180.0 * TAU).sin().signum();
                let b = (t * 191.0 * TAU).sin().signum();
                (a + b) * 0.5 * (1.0 - p) * 0.2
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let byte_rate = SAMPLE_RATE * CHANNELS as u32 * BITS as u32 / 8;
        let block_align = CHANNELS * BITS / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

impl SoundEngine {
    pub fn play_events(&self, events: &[GameEvent]) {
        for sfx in events.iter().filter_map(Sfx::for_event) {
            self.play(sfx);
        }
    }
}
