pub mod showcase;
pub mod theme;
pub mod world3d;

use anyhow::Result;

use crate::engine::audio::AudioEngine;
use crate::engine::core::FrameTiming;
use crate::engine::resources::ResourceManager;
use crate::gui::canvas::FontId;
use crate::gui::GuiManager;

#[derive(Debug, Clone)]
pub struct GameWindowDescriptor {
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub resizable: bool,
}

impl Default for GameWindowDescriptor {
    fn default() -> Self {
        Self {
            title: None,
            width: None,
            height: None,
            resizable: true,
        }
    }
}

/// Engine services handed to a game.
pub struct GameContext<'a> {
    pub gui: &'a mut GuiManager,
    pub resources: &'a mut ResourceManager,
    pub audio: &'a mut AudioEngine,
    /// Default UI font.
    pub font: FontId,
    /// Window size in pixels.
    pub window: (i32, i32),
}

pub trait Game {
    fn name(&self) -> &str;

    /// Called once after the renderer is up, before the first frame.
    fn setup(&mut self, cx: &mut GameContext<'_>) -> Result<()>;

    /// Called every frame before the GUI phases run.
    fn update(&mut self, _cx: &mut GameContext<'_>, _timing: &FrameTiming) {}

    fn window_descriptor(&self) -> GameWindowDescriptor {
        GameWindowDescriptor::default()
    }
}

pub use showcase::Showcase;
