use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub app_name: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_fps: u32,
    pub clear_color: [f64; 3],
    pub asset_dir: PathBuf,
    /// TTF/OTF file under `asset_dir` used for captions and console text.
    pub font: Option<String>,
    pub font_size: f32,
    pub master_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "Arcadia".to_string(),
            window_width: 1280,
            window_height: 720,
            target_fps: 60,
            clear_color: [0.08, 0.08, 0.1],
            asset_dir: PathBuf::from("assets"),
            font: Some("fonts/DejaVuSans.ttf".to_string()),
            font_size: 16.0,
            master_volume: 0.8,
        }
    }
}

impl EngineConfig {
    pub fn from_ron(source: &str) -> Result<Self> {
        ron::from_str(source).context("invalid engine config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_ron(&source).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Reads `path` if it exists; falls back to defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(target: "engine", path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(target: "engine", error = %format!("{err:#}"), "using default config");
                Self::default()
            }
        }
    }

    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.asset_dir.join(relative)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FrameTiming {
    pub delta_seconds: f32,
    pub fps: f32,
    /// Seconds since the clock started.
    pub elapsed: f32,
}

impl FrameTiming {
    pub fn from_delta(delta_seconds: f32) -> Self {
        Self {
            delta_seconds,
            fps: if delta_seconds > 0.0 { 1.0 / delta_seconds } else { 0.0 },
            elapsed: 0.0,
        }
    }
}

/// Wall clock that turns successive frames into [`FrameTiming`].
#[derive(Debug)]
pub struct FrameClock {
    started: Instant,
    last_frame: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_frame: now,
        }
    }

    pub fn tick(&mut self) -> FrameTiming {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.timing(delta, now.duration_since(self.started))
    }

    fn timing(&self, delta: Duration, elapsed: Duration) -> FrameTiming {
        FrameTiming {
            elapsed: elapsed.as_secs_f32(),
            ..FrameTiming::from_delta(delta.as_secs_f32())
        }
    }
}

pub struct FixedTimestep {
    frame_duration: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn from_fps(fps: u32) -> Self {
        let frame_duration = 1.0 / fps.max(1) as f32;
        Self {
            frame_duration,
            accumulator: 0.0,
        }
    }

    pub fn frame_duration(&self) -> f32 {
        self.frame_duration
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta;
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.frame_duration {
            self.accumulator -= self.frame_duration;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = EngineConfig::from_ron("(app_name: \"Demo\", window_width: 800)").unwrap();
        assert_eq!(config.app_name, "Demo");
        assert_eq!(config.window_width, 800);
        assert_eq!(config.window_height, 720);
        assert_eq!(config.target_fps, 60);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(EngineConfig::from_ron("(window_width: \"wide\")").is_err());
    }

    #[test]
    fn missing_config_file_falls_back() {
        let config = EngineConfig::load_or_default("does/not/exist.ron");
        assert_eq!(config.app_name, "Arcadia");
    }

    #[test]
    fn fixed_timestep_consumes_whole_steps() {
        let mut step = FixedTimestep::from_fps(10);
        step.accumulate(0.25);
        assert!(step.should_step());
        assert!(step.should_step());
        assert!(!step.should_step());
    }

    #[test]
    fn timing_from_delta_derives_fps() {
        let timing = FrameTiming::from_delta(0.5);
        assert_eq!(timing.fps, 2.0);
        assert_eq!(FrameTiming::from_delta(0.0).fps, 0.0);
    }
}
