use std::path::Path;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use crate::gui::canvas::{Color, FontId};

struct LoadedFont {
    name: String,
    font: FontArc,
    scale: PxScale,
}

/// Fonts addressed by [`FontId`], rasterised on demand into RGBA images.
#[derive(Default)]
pub struct FontManager {
    fonts: Vec<LoadedFont>,
}

impl FontManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_font(&mut self, name: impl Into<String>, path: impl AsRef<Path>, px: f32) -> Result<FontId> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .with_context(|| format!("failed to parse font {}", path.display()))?;
        Ok(self.insert_font(name, font, px))
    }

    pub fn insert_font(&mut self, name: impl Into<String>, font: FontArc, px: f32) -> FontId {
        let name = name.into();
        tracing::debug!(target: "engine", %name, px, "font loaded");
        self.fonts.push(LoadedFont {
            name,
            font,
            scale: PxScale::from(px),
        });
        FontId(self.fonts.len() as u32 - 1)
    }

    pub fn find(&self, name: &str) -> Option<FontId> {
        self.fonts
            .iter()
            .position(|font| font.name == name)
            .map(|index| FontId(index as u32))
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Pixel size of `text` laid out on one line.
    pub fn measure(&self, font: FontId, text: &str) -> Option<(u32, u32)> {
        let loaded = self.fonts.get(font.0 as usize)?;
        let scaled = loaded.font.as_scaled(loaded.scale);
        let width = layout_width(&scaled, text);
        Some((width.ceil() as u32, scaled.height().ceil() as u32))
    }

    /// Renders `text` in white-on-transparent, multiplied by `color`.
    pub fn rasterize(&self, font: FontId, text: &str, color: Color) -> Option<RgbaImage> {
        let loaded = self.fonts.get(font.0 as usize)?;
        let scaled = loaded.font.as_scaled(loaded.scale);
        let (width, height) = self.measure(font, text)?;
        let mut image = RgbaImage::new(width.max(1), height.max(1));
        let [r, g, b, a] = color.to_rgba8();

        let mut caret = 0.0f32;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, id);
            }
            let glyph = id.with_scale_and_position(loaded.scale, point(caret, scaled.ascent()));
            caret += scaled.h_advance(id);
            previous = Some(id);

            let Some(outlined) = loaded.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                if x < 0 || y < 0 || x >= image.width() as i32 || y >= image.height() as i32 {
                    return;
                }
                let alpha = (coverage.clamp(0.0, 1.0) * a as f32) as u8;
                let pixel = image.get_pixel_mut(x as u32, y as u32);
                if alpha > pixel[3] {
                    *pixel = Rgba([r, g, b, alpha]);
                }
            });
        }
        Some(image)
    }
}

fn layout_width<F: Font, SF: ScaleFont<F>>(scaled: &SF, text: &str) -> f32 {
    let mut width = 0.0;
    let mut previous = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(previous) = previous {
            width += scaled.kern(previous, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_font_measures_nothing() {
        let fonts = FontManager::new();
        assert!(fonts.measure(FontId(0), "hi").is_none());
        assert!(fonts.rasterize(FontId(0), "hi", Color::WHITE).is_none());
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let mut fonts = FontManager::new();
        assert!(fonts.load_font("ui", "does/not/exist.ttf", 16.0).is_err());
        assert!(fonts.is_empty());
    }
}
