use image::{Rgba, RgbaImage};

use crate::engine::resources::ResourceManager;
use crate::gui::animation::{Keyframe, TextureAnimation};
use crate::gui::canvas::{Color, FontId, Rect, TextureId};

const FRAME: u32 = 32;
const COIN_FRAMES: u32 = 4;

/// Textures for the "Standard" widget template. Each one loads from
/// `gui/standard/*.png` under the asset root, or is generated when missing.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub font: FontId,
    pub panel: TextureId,
    pub bar: TextureId,
    pub button: TextureId,
    pub checkbox: TextureId,
    pub check: TextureId,
    pub list: TextureId,
    pub edit: TextureId,
    pub drop_down: TextureId,
    pub text: Color,
}

impl Theme {
    pub fn load(resources: &mut ResourceManager, font: FontId) -> Self {
        let dark = Color::rgba(0.14, 0.15, 0.19, 0.95);
        let edge = Color::rgba(0.45, 0.47, 0.55, 1.0);
        Self {
            font,
            panel: resources.texture_or_panel("gui/standard/panel.png", (64, 64), dark, edge),
            bar: resources.texture_or_panel(
                "gui/standard/bar.png",
                (64, 16),
                Color::rgba(0.24, 0.3, 0.45, 1.0),
                edge,
            ),
            button: resources.texture_or_panel(
                "gui/standard/button.png",
                (64, 32),
                Color::rgba(0.3, 0.34, 0.44, 1.0),
                Color::rgba(0.7, 0.72, 0.8, 1.0),
            ),
            checkbox: resources.texture_or_panel(
                "gui/standard/checkbox.png",
                (20, 20),
                Color::rgba(0.1, 0.1, 0.12, 1.0),
                Color::rgba(0.7, 0.72, 0.8, 1.0),
            ),
            check: match resources.load_texture("gui/standard/check.png") {
                Ok(id) => id,
                Err(_) => resources.insert_rgba("gui/standard/check.png", check_image(20)),
            },
            list: resources.texture_or_panel(
                "gui/standard/list.png",
                (64, 64),
                Color::rgba(0.08, 0.08, 0.1, 0.95),
                edge,
            ),
            edit: resources.texture_or_panel(
                "gui/standard/edit.png",
                (64, 24),
                Color::rgba(0.05, 0.05, 0.06, 1.0),
                edge,
            ),
            drop_down: resources.texture_or_panel(
                "gui/standard/drop_down.png",
                (64, 24),
                Color::rgba(0.18, 0.2, 0.26, 1.0),
                edge,
            ),
            text: Color::rgba(0.92, 0.92, 0.95, 1.0),
        }
    }
}

/// Filled inner square on a transparent background.
fn check_image(size: u32) -> RgbaImage {
    let inset = size / 4;
    RgbaImage::from_fn(size, size, |x, y| {
        let inside = x >= inset && y >= inset && x < size - inset && y < size - inset;
        if inside {
            Rgba([120, 220, 140, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Spinning coin for the animation dialogue. Loads
/// `animations/coin.ron` when present and otherwise builds a four frame
/// strip that fires `"lap"` each time the loop restarts.
pub fn coin_animation(resources: &mut ResourceManager) -> TextureAnimation {
    match resources.load_animation("animations/coin.ron") {
        Ok(animation) => animation,
        Err(err) => {
            tracing::debug!(target: "engine", error = %format!("{err:#}"), "generating coin animation");
            let texture = resources.insert_rgba("animations/coin.png", coin_strip());
            let mut animation = TextureAnimation::new(texture, 0.8);
            for frame in 0..COIN_FRAMES {
                let src = Rect::new((frame * FRAME) as i32, 0, FRAME as i32, FRAME as i32);
                let keyframe = Keyframe::new(frame as f32 * 0.2, src);
                animation.add_keyframe(if frame == 0 {
                    keyframe.with_callback("lap")
                } else {
                    keyframe
                });
            }
            animation
        }
    }
}

/// Ellipse that narrows and widens across the frames.
fn coin_strip() -> RgbaImage {
    RgbaImage::from_fn(FRAME * COIN_FRAMES, FRAME, |x, y| {
        let frame = x / FRAME;
        let half_width = match frame {
            0 => 14.0,
            1 | 3 => 8.0,
            _ => 2.0,
        };
        let dx = (x % FRAME) as f32 - FRAME as f32 / 2.0 + 0.5;
        let dy = y as f32 - FRAME as f32 / 2.0 + 0.5;
        if (dx / half_width).powi(2) + (dy / 14.0).powi(2) <= 1.0 {
            Rgba([240, 200, 60, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}
