use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use crate::gui::animation::{AnimationDef, TextureAnimation};
use crate::gui::canvas::{Color, TextureId};

#[derive(Debug)]
struct TextureEntry {
    key: String,
    image: RgbaImage,
}

/// CPU-side texture store. The renderer uploads entries lazily the first time
/// a draw command references them.
#[derive(Debug, Default)]
pub struct ResourceManager {
    root: PathBuf,
    textures: Vec<TextureEntry>,
    by_key: HashMap<String, TextureId>,
}

impl ResourceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads an image relative to the asset root. Loading the same path twice
    /// returns the same id.
    pub fn load_texture(&mut self, relative: impl AsRef<Path>) -> Result<TextureId> {
        let relative = relative.as_ref();
        let key = relative.to_string_lossy().into_owned();
        if let Some(&id) = self.by_key.get(&key) {
            return Ok(id);
        }
        let path = self.root.join(relative);
        let image = image::open(&path)
            .with_context(|| format!("failed to load texture {}", path.display()))?
            .to_rgba8();
        tracing::debug!(
            target: "engine",
            %key,
            width = image.width(),
            height = image.height(),
            "texture loaded"
        );
        Ok(self.insert_rgba(key, image))
    }

    /// Registers an image built in memory under `key`, replacing any earlier
    /// image with that key.
    pub fn insert_rgba(&mut self, key: impl Into<String>, image: RgbaImage) -> TextureId {
        let key = key.into();
        if let Some(&id) = self.by_key.get(&key) {
            self.textures[id.0 as usize].image = image;
            return id;
        }
        let id = TextureId(self.textures.len() as u32);
        self.by_key.insert(key.clone(), id);
        self.textures.push(TextureEntry { key, image });
        id
    }

    pub fn texture(&self, id: TextureId) -> Option<&RgbaImage> {
        self.textures.get(id.0 as usize).map(|entry| &entry.image)
    }

    pub fn find(&self, key: &str) -> Option<TextureId> {
        self.by_key.get(key).copied()
    }

    pub fn key(&self, id: TextureId) -> Option<&str> {
        self.textures.get(id.0 as usize).map(|entry| entry.key.as_str())
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Loads `relative` if present, otherwise generates a bordered panel of
    /// the given size so the UI still has something to draw.
    pub fn texture_or_panel(
        &mut self,
        relative: &str,
        size: (u32, u32),
        fill: Color,
        border: Color,
    ) -> TextureId {
        match self.load_texture(relative) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(target: "engine", error = %format!("{err:#}"), "using generated panel");
                self.insert_rgba(relative, panel_image(size, fill, border))
            }
        }
    }

    /// Reads a RON animation definition and loads the texture it names.
    pub fn load_animation(&mut self, relative: impl AsRef<Path>) -> Result<TextureAnimation> {
        let path = self.root.join(relative.as_ref());
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read animation {}", path.display()))?;
        let def = AnimationDef::from_ron(&source)
            .with_context(|| format!("failed to parse animation {}", path.display()))?;
        let texture = self.load_texture(&def.texture)?;
        Ok(TextureAnimation::from_def(def, texture))
    }
}

/// Solid image with a one pixel border.
pub fn panel_image((width, height): (u32, u32), fill: Color, border: Color) -> RgbaImage {
    let width = width.max(2);
    let height = height.max(2);
    let fill = Rgba(fill.to_rgba8());
    let border = Rgba(border.to_rgba8());
    RgbaImage::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            border
        } else {
            fill
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_by_key() {
        let mut resources = ResourceManager::new("assets");
        let first = resources.insert_rgba("panel", RgbaImage::new(2, 2));
        let second = resources.insert_rgba("panel", RgbaImage::new(4, 4));
        assert_eq!(first, second);
        assert_eq!(resources.texture_count(), 1);
        assert_eq!(resources.texture(first).map(|image| image.width()), Some(4));
    }

    #[test]
    fn missing_texture_falls_back_to_panel() {
        let mut resources = ResourceManager::new("does/not/exist");
        let id = resources.texture_or_panel("button.png", (8, 4), Color::BLACK, Color::WHITE);
        let image = resources.texture(id).unwrap();
        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(3, 2), &Rgba([0, 0, 0, 255]));
        assert_eq!(resources.find("button.png"), Some(id));
    }

    #[test]
    fn missing_animation_is_an_error() {
        let mut resources = ResourceManager::new("does/not/exist");
        assert!(resources.load_animation("coin.ron").is_err());
    }
}
