pub mod audio;
pub mod core;
pub mod fonts;
pub mod input;
pub mod renderer;
pub mod resources;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use audio::AudioEngine;
use core::{EngineConfig, FixedTimestep, FrameClock, FrameTiming};
use fonts::FontManager;
use input::{ButtonState, InputState, MouseButton};
use renderer::Renderer;
use resources::ResourceManager;
use wgpu::SurfaceError;
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use crate::game::{Game, GameContext};
use crate::gui::canvas::{DrawList, FontId};
use crate::gui::widgets::DebugConsole;
use crate::gui::{GuiManager, NodeId};

const CLICK_SOUND: &str = "click";

pub struct EngineApp {
    config: EngineConfig,
    resources: ResourceManager,
    fonts: FontManager,
    audio: AudioEngine,
    gui: GuiManager,
    input: InputState,
    draw_list: DrawList,
    game: Box<dyn Game>,
    font: FontId,
    console: Option<NodeId>,
    window: (i32, i32),
}

impl EngineApp {
    pub fn new(config: EngineConfig, game: impl Game + 'static) -> Self {
        Self {
            resources: ResourceManager::new(config.asset_dir.clone()),
            fonts: FontManager::new(),
            audio: AudioEngine::new(config.master_volume),
            gui: GuiManager::new(),
            input: InputState::new(),
            draw_list: DrawList::new(),
            game: Box::new(game),
            font: FontId(0),
            console: None,
            window: (0, 0),
            config,
        }
    }

    pub fn gui(&self) -> &GuiManager {
        &self.gui
    }

    /// Loads shared assets, creates the debug console and lets the game build
    /// its GUI. Missing fonts and sounds are logged and skipped.
    pub fn setup(&mut self, window: (i32, i32)) -> Result<()> {
        self.window = window;
        if let Some(font) = self.config.font.clone() {
            match self
                .fonts
                .load_font("ui", self.config.asset_path(&font), self.config.font_size)
            {
                Ok(id) => self.font = id,
                Err(err) => {
                    tracing::warn!(target: "engine", error = %format!("{err:#}"), "text will not be drawn")
                }
            }
        }
        if let Err(err) = self
            .audio
            .load_sound(CLICK_SOUND, self.config.asset_path("sounds/click.wav"))
        {
            tracing::warn!(target: "engine", error = %format!("{err:#}"), "click sound unavailable");
        }

        let console = self.gui.create(
            DebugConsole::node(window.0, window.1),
            DebugConsole::new(self.font).with_builtin_commands(),
        );
        self.gui.add_child(console);
        self.console = Some(console);

        let mut cx = GameContext {
            gui: &mut self.gui,
            resources: &mut self.resources,
            audio: &mut self.audio,
            font: self.font,
            window,
        };
        self.game
            .setup(&mut cx)
            .with_context(|| format!("failed to set up {}", self.game.name()))
    }

    pub fn run(mut self) -> Result<()> {
        tracing::info!(
            target: "engine",
            app = %self.config.app_name,
            game = %self.game.name(),
            "Engine starting"
        );

        let event_loop = EventLoop::new().context("failed to create event loop")?;
        let window_prefs = self.game.window_descriptor();
        let window_width = window_prefs.width.unwrap_or(self.config.window_width) as f64;
        let window_height = window_prefs.height.unwrap_or(self.config.window_height) as f64;
        let window_title = window_prefs
            .title
            .clone()
            .unwrap_or_else(|| self.window_title());

        let window = Arc::new(
            WindowBuilder::new()
                .with_title(window_title)
                .with_resizable(window_prefs.resizable)
                .with_inner_size(LogicalSize::new(window_width, window_height))
                .build(&event_loop)
                .context("failed to create window")?,
        );
        let size = window.inner_size();
        self.setup((size.width as i32, size.height as i32))?;

        let mut engine = self;
        let mut renderer: Option<Renderer> = None;
        let mut clock = FrameClock::new();
        let mut pacer = FixedTimestep::from_fps(engine.config.target_fps);
        let mut last_wake = Instant::now();

        event_loop
            .run(move |event, target| match event {
                Event::Resumed => {
                    if renderer.is_none() {
                        match pollster::block_on(Renderer::new(window.clone(), engine.config.clear_color)) {
                            Ok(new_renderer) => {
                                tracing::info!(target: "engine", "renderer initialized");
                                renderer = Some(new_renderer);
                            }
                            Err(err) => {
                                tracing::error!(target: "engine", %err, "failed to initialize renderer");
                                target.exit();
                            }
                        }
                    }
                }
                Event::AboutToWait => {
                    let now = Instant::now();
                    pacer.accumulate(now.duration_since(last_wake).as_secs_f32());
                    last_wake = now;
                    if renderer.is_some() && pacer.should_step() {
                        window.request_redraw();
                    }
                    target.set_control_flow(ControlFlow::WaitUntil(
                        now + Duration::from_secs_f32(pacer.frame_duration()),
                    ));
                }
                Event::WindowEvent { window_id, event } if window_id == window.id() => {
                    engine.input.handle_window_event(&event);
                    match event {
                        WindowEvent::CloseRequested => {
                            tracing::info!(target: "engine", "window close requested");
                            engine.gui.shutdown();
                            target.exit();
                        }
                        WindowEvent::Resized(size) => {
                            engine.resize(size);
                            if let Some(renderer) = renderer.as_mut() {
                                renderer.resize(size);
                            }
                        }
                        WindowEvent::ScaleFactorChanged {
                            mut inner_size_writer,
                            ..
                        } => {
                            let new_size = window.inner_size();
                            let _ = inner_size_writer.request_inner_size(new_size);
                            engine.resize(new_size);
                            if let Some(renderer) = renderer.as_mut() {
                                renderer.resize(new_size);
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            if let Some(renderer) = renderer.as_mut() {
                                let timing = clock.tick();
                                engine.tick(&timing);
                                match renderer.render(&engine.draw_list, &engine.resources, &engine.fonts) {
                                    Ok(()) => {}
                                    Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                                        renderer.resize(window.inner_size());
                                    }
                                    Err(SurfaceError::OutOfMemory) => {
                                        tracing::error!(target: "engine", "GPU out of memory, shutting down engine");
                                        engine.gui.shutdown();
                                        target.exit();
                                    }
                                    Err(SurfaceError::Timeout) => {
                                        tracing::warn!(target: "engine", "surface timeout, retrying next frame");
                                    }
                                }
                                engine.input.advance_frame();
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            })
            .map_err(|err| anyhow!(err))?;

        tracing::info!(target: "engine", "Engine shutdown complete");
        Ok(())
    }

    fn window_title(&self) -> String {
        format!("{} - {}", self.config.app_name, self.game.name())
    }

    /// One frame of game and GUI work, leaving the frame's draw calls in the
    /// draw list.
    pub fn tick(&mut self, timing: &FrameTiming) {
        if let Some(console) = self.console {
            DebugConsole::handle_toggle(&mut self.gui, console, &self.input);
        }

        let mut cx = GameContext {
            gui: &mut self.gui,
            resources: &mut self.resources,
            audio: &mut self.audio,
            font: self.font,
            window: self.window,
        };
        self.game.update(&mut cx, timing);

        self.draw_list.clear();
        self.gui.frame(&mut self.input, timing, &mut self.draw_list);

        if self.input.button(MouseButton::Left) == ButtonState::PressedTaken {
            self.audio.play(CLICK_SOUND);
        }
        tracing::trace!(
            target: "engine",
            frame_delta_ms = timing.delta_seconds * 1000.0,
            nodes = self.gui.len(),
            draws = self.draw_list.commands().len(),
            "frame tick"
        );
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.window = (size.width as i32, size.height as i32);
        let Some(node) = self.console.and_then(|console| self.gui.node_mut(console)) else {
            return;
        };
        node.width = size.width as i32;
        node.height = size.height as i32 / 2;
    }
}
