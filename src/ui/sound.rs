/// Audio output via rodio.
///
///   - `SoundEngine`: procedural UI cues (navigate / select / close), generated
///     as in-memory WAV buffers at init time and played fire-and-forget.
///   - `RodioMusic`: the music controller's backend, one `Sink` per looping
///     track so tracks can be faded independently.
///   - `NullAudio`: a silent backend used when output is disabled or missing.
///
/// Compile without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing and music always goes to `NullAudio`).

use std::collections::HashMap;
use std::path::Path;

use crate::error::AudioError;
use crate::sim::music::{AudioBackend, TrackId};

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::{BufReader, Cursor};
    use std::path::Path;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

    use crate::error::AudioError;
    use crate::sim::event::SoundCue;
    use crate::sim::music::{AudioBackend, TrackId};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each cue.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_navigate: Arc<Vec<u8>>,
        sfx_select: Arc<Vec<u8>>,
        sfx_close: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("no audio output for sound effects: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_navigate: Arc::new(make_wav(&gen_navigate())),
                sfx_select: Arc::new(make_wav(&gen_select())),
                sfx_close: Arc::new(make_wav(&gen_close())),
            })
        }

        pub fn play(&self, cue: SoundCue) {
            let buf = match cue {
                SoundCue::Navigate => &self.sfx_navigate,
                SoundCue::Select => &self.sfx_select,
                SoundCue::Close => &self.sfx_close,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    /// Looping music tracks, each on its own sink.
    pub struct RodioMusic {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        tracks: HashMap<u64, Sink>,
        next_id: u64,
    }

    impl RodioMusic {
        pub fn new() -> Result<Self, AudioError> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| AudioError::Output(e.to_string()))?;
            Ok(RodioMusic { _stream: stream, handle, tracks: HashMap::new(), next_id: 0 })
        }
    }

    impl AudioBackend for RodioMusic {
        fn load(&mut self, path: &Path) -> Result<TrackId, AudioError> {
            let file = File::open(path)
                .map_err(|source| AudioError::Open { path: path.to_path_buf(), source })?;
            let source = Decoder::new_looped(BufReader::new(file)).map_err(|e| AudioError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            let sink = Sink::try_new(&self.handle).map_err(|e| AudioError::Output(e.to_string()))?;
            sink.pause();
            sink.set_volume(0.0);
            sink.append(source);

            self.next_id += 1;
            self.tracks.insert(self.next_id, sink);
            Ok(TrackId(self.next_id))
        }

        // Decoding is synchronous, so a loaded track can always play through.
        fn is_ready(&self, id: TrackId) -> bool {
            self.tracks.contains_key(&id.0)
        }

        fn play(&mut self, id: TrackId) -> Result<(), AudioError> {
            let sink = self.tracks.get(&id.0).ok_or(AudioError::Unavailable)?;
            sink.play();
            Ok(())
        }

        fn stop(&mut self, id: TrackId) {
            if let Some(sink) = self.tracks.remove(&id.0) {
                sink.stop();
            }
        }

        fn set_volume(&mut self, id: TrackId, volume: f32) {
            if let Some(sink) = self.tracks.get(&id.0) {
                sink.set_volume(volume);
            }
        }

        fn volume(&self, id: TrackId) -> f32 {
            self.tracks.get(&id.0).map_or(0.0, |s| s.volume())
        }

        fn is_paused(&self, id: TrackId) -> bool {
            self.tracks.get(&id.0).map_or(true, |s| s.is_paused())
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                (t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume
            })
            .collect()
    }

    /// Navigate: a short two-harmonic tick
    pub(super) fn gen_navigate() -> Vec<f32> {
        let mut samples = gen_blip(880.0, 0.04, 0.2);
        let overtone = gen_blip(1760.0, 0.04, 0.05);
        for (s, o) in samples.iter_mut().zip(overtone) {
            *s += o;
        }
        samples
    }

    /// Select: quick ascending arpeggio C5→E5→G5→C6
    pub(super) fn gen_select() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0];
        let note_dur = 0.06;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                // Square-ish wave (sine + 3rd harmonic) for retro feel
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Close: short descending whistle
    pub(super) fn gen_close() -> Vec<f32> {
        let duration = 0.18;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 700.0 - t * 450.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.6);
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.25
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
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
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::{RodioMusic, SoundEngine};

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: crate::sim::event::SoundCue) {}
}

/// Silent backend: tracks "play" and hold their volume, but nothing is heard.
#[derive(Default)]
pub struct NullAudio {
    tracks: HashMap<u64, (f32, bool)>,
    next_id: u64,
}

impl AudioBackend for NullAudio {
    fn load(&mut self, _path: &Path) -> Result<TrackId, AudioError> {
        self.next_id += 1;
        self.tracks.insert(self.next_id, (0.0, true));
        Ok(TrackId(self.next_id))
    }

    fn is_ready(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id.0)
    }

    fn play(&mut self, id: TrackId) -> Result<(), AudioError> {
        let track = self.tracks.get_mut(&id.0).ok_or(AudioError::Unavailable)?;
        track.1 = false;
        Ok(())
    }

    fn stop(&mut self, id: TrackId) {
        self.tracks.remove(&id.0);
    }

    fn set_volume(&mut self, id: TrackId, volume: f32) {
        if let Some(track) = self.tracks.get_mut(&id.0) {
            track.0 = volume;
        }
    }

    fn volume(&self, id: TrackId) -> f32 {
        self.tracks.get(&id.0).map_or(0.0, |t| t.0)
    }

    fn is_paused(&self, id: TrackId) -> bool {
        self.tracks.get(&id.0).map_or(true, |t| t.1)
    }
}

/// Music backend for this run: rodio when enabled and available, else silence.
pub fn music_backend(enabled: bool) -> Box<dyn AudioBackend> {
    if !enabled {
        log::info!("music disabled");
        return Box::new(NullAudio::default());
    }
    #[cfg(feature = "sound")]
    {
        match RodioMusic::new() {
            Ok(m) => return Box::new(m),
            Err(e) => log::warn!("{e}; music will be silent"),
        }
    }
    Box::new(NullAudio::default())
}
