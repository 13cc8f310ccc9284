use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use rodio::source::{Buffered, Source};
use rodio::{Decoder, OutputStream, OutputStreamHandle};

/// A decoded clip that can be replayed without touching the disk again.
#[derive(Clone)]
pub struct Sound(Buffered<Decoder<Cursor<Vec<u8>>>>);

impl Sound {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let decoder = Decoder::new(Cursor::new(bytes)).context("unsupported audio data")?;
        Ok(Self(decoder.buffered()))
    }
}

impl fmt::Debug for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sound(..)")
    }
}

struct Output {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

/// Named sound effects over an optional output device. Without a device the
/// engine stays muted and `play` only logs.
pub struct AudioEngine {
    output: Option<Output>,
    sounds: HashMap<String, Sound>,
    volume: f32,
}

impl fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioEngine")
            .field("muted", &self.is_muted())
            .field("sounds", &self.sounds.len())
            .field("volume", &self.volume)
            .finish()
    }
}

impl AudioEngine {
    pub fn new(volume: f32) -> Self {
        let output = match OutputStream::try_default() {
            Ok((stream, handle)) => Some(Output {
                _stream: stream,
                handle,
            }),
            Err(err) => {
                tracing::warn!(target: "engine", %err, "no audio device, running muted");
                None
            }
        };
        Self {
            output,
            sounds: HashMap::new(),
            volume,
        }
    }

    /// An engine that never opens a device.
    pub fn muted() -> Self {
        Self {
            output: None,
            sounds: HashMap::new(),
            volume: 0.0,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.output.is_none() || self.volume <= 0.0
    }

    pub fn load_sound(&mut self, name: impl Into<String>, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let sound =
            Sound::from_bytes(bytes).with_context(|| format!("failed to decode {}", path.display()))?;
        self.insert_sound(name, sound);
        Ok(())
    }

    pub fn insert_sound(&mut self, name: impl Into<String>, sound: Sound) {
        self.sounds.insert(name.into(), sound);
    }

    pub fn has_sound(&self, name: &str) -> bool {
        self.sounds.contains_key(name)
    }

    pub fn play(&self, name: &str) {
        let Some(sound) = self.sounds.get(name) else {
            tracing::trace!(target: "engine", name, "sound not loaded");
            return;
        };
        let Some(output) = self.output.as_ref().filter(|_| self.volume > 0.0) else {
            return;
        };
        let source = sound.0.clone().amplify(self.volume).convert_samples::<f32>();
        if let Err(err) = output.handle.play_raw(source) {
            tracing::error!(target: "engine", %err, name, "error playing sound");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muted_engine_ignores_play() {
        let audio = AudioEngine::muted();
        assert!(audio.is_muted());
        audio.play("click");
    }

    #[test]
    fn missing_sound_file_is_an_error() {
        let mut audio = AudioEngine::muted();
        assert!(audio.load_sound("click", "does/not/exist.wav").is_err());
        assert!(!audio.has_sound("click"));
    }
}
