//! Keyframed sprite-sheet animation used as a node visual.
//!
//! Definitions are written in RON:
//!
//! ```ron
//! (
//!     length: 1.0,
//!     texture: "sprites/coin.png",
//!     keyframes: [
//!         (t: 0.0, x: 0, y: 0, w: 32, h: 32),
//!         (t: 0.5, x: 32, y: 0, w: 32, h: 32, callback: Some("flip")),
//!     ],
//! )
//! ```

use serde::Deserialize;

use super::canvas::{Canvas, Color, Rect, TextureId};

fn full_alpha() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Keyframe {
    /// Start time in seconds from the beginning of the loop.
    pub t: f32,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    #[serde(default = "full_alpha")]
    pub alpha: f32,
    #[serde(default)]
    pub x_off: i32,
    #[serde(default)]
    pub y_off: i32,
    #[serde(default)]
    pub callback: Option<String>,
    #[serde(skip)]
    length: f32,
}

impl Keyframe {
    pub fn new(t: f32, src: Rect) -> Self {
        Self {
            t,
            x: src.x,
            y: src.y,
            w: src.width,
            h: src.height,
            alpha: 1.0,
            x_off: 0,
            y_off: 0,
            callback: None,
            length: 0.0,
        }
    }

    pub fn with_callback(mut self, name: impl Into<String>) -> Self {
        self.callback = Some(name.into());
        self
    }

    pub fn with_offset(mut self, x_off: i32, y_off: i32) -> Self {
        self.x_off = x_off;
        self.y_off = y_off;
        self
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    fn source(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimationDef {
    pub length: f32,
    pub texture: String,
    pub keyframes: Vec<Keyframe>,
}

impl AnimationDef {
    pub fn from_ron(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }
}

#[derive(Debug, Clone)]
pub struct TextureAnimation {
    texture: TextureId,
    length: f32,
    keyframes: Vec<Keyframe>,
    tint: Color,
    elapsed: f32,
    current: Option<usize>,
}

impl TextureAnimation {
    pub fn new(texture: TextureId, length: f32) -> Self {
        Self {
            texture,
            length,
            keyframes: Vec::new(),
            tint: Color::WHITE,
            elapsed: 0.0,
            current: None,
        }
    }

    pub fn from_def(def: AnimationDef, texture: TextureId) -> Self {
        let mut animation = Self::new(texture, def.length);
        for keyframe in def.keyframes {
            animation.add_keyframe(keyframe);
        }
        animation
    }

    /// Appends a keyframe. Each keyframe lasts until the next one starts; the
    /// last one runs to the end of the loop.
    pub fn add_keyframe(&mut self, mut keyframe: Keyframe) {
        if let Some(previous) = self.keyframes.last_mut() {
            previous.length = keyframe.t - previous.t;
        }
        keyframe.length = self.length - keyframe.t;
        self.keyframes.push(keyframe);
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn set_tint(&mut self, tint: Color) {
        self.tint = tint;
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.current = None;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Moves the loop clock forward. Returns the callback name of the keyframe
    /// that just became active, if it has one.
    pub fn advance(&mut self, delta_seconds: f32) -> Option<String> {
        if self.length <= 0.0 {
            return None;
        }
        self.elapsed = (self.elapsed + delta_seconds).rem_euclid(self.length);

        let index = self.active_index()?;
        if self.current == Some(index) {
            return None;
        }
        self.current = Some(index);
        self.keyframes[index].callback.clone()
    }

    pub fn current_frame(&self) -> Option<&Keyframe> {
        self.active_index().map(|index| &self.keyframes[index])
    }

    pub fn render(&self, canvas: &mut dyn Canvas, x: i32, y: i32) {
        let Some(frame) = self.current_frame() else {
            return;
        };
        let dst = Rect::new(x + frame.x_off, y + frame.y_off, frame.w, frame.h);
        let tint = self.tint.with_alpha(self.tint.a * frame.alpha);
        canvas.draw_texture_part(self.texture, frame.source(), dst, tint);
    }

    fn active_index(&self) -> Option<usize> {
        let t = self.elapsed;
        self.keyframes
            .iter()
            .position(|frame| t >= frame.t && t <= frame.t + frame.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::canvas::{DrawCommand, DrawList};

    fn two_frame_animation() -> TextureAnimation {
        let mut animation = TextureAnimation::new(TextureId(3), 1.0);
        animation.add_keyframe(Keyframe::new(0.0, Rect::new(0, 0, 16, 16)));
        animation.add_keyframe(Keyframe::new(0.5, Rect::new(16, 0, 16, 16)).with_callback("flip"));
        animation
    }

    #[test]
    fn keyframe_lengths_fill_the_loop() {
        let animation = two_frame_animation();
        let lengths: Vec<f32> = animation.keyframes().iter().map(Keyframe::length).collect();
        assert_eq!(lengths, vec![0.5, 0.5]);
    }

    #[test]
    fn callback_fires_once_per_frame_change() {
        let mut animation = two_frame_animation();
        assert_eq!(animation.advance(0.1), None);
        assert_eq!(animation.advance(0.5).as_deref(), Some("flip"));
        assert_eq!(animation.advance(0.1), None);
        // Wraps to the first frame, which has no callback.
        assert_eq!(animation.advance(0.4), None);
        assert_eq!(animation.current_frame().map(|f| f.x), Some(0));
    }

    #[test]
    fn render_draws_the_active_source_rect() {
        let mut animation = two_frame_animation();
        animation.advance(0.75);
        let mut list = DrawList::new();
        animation.render(&mut list, 100, 50);
        match &list.commands()[0] {
            DrawCommand::Texture { texture, src, dst, .. } => {
                assert_eq!(*texture, TextureId(3));
                assert_eq!(*src, Some(Rect::new(16, 0, 16, 16)));
                assert_eq!(*dst, Rect::new(100, 50, 16, 16));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_ron_definition() {
        let def = AnimationDef::from_ron(
            r#"(
                length: 2.0,
                texture: "coin.png",
                keyframes: [
                    (t: 0.0, x: 0, y: 0, w: 8, h: 8),
                    (t: 1.0, x: 8, y: 0, w: 8, h: 8, alpha: 0.5, x_off: 2, callback: Some("ding")),
                ],
            )"#,
        )
        .expect("valid animation");
        assert_eq!(def.texture, "coin.png");
        assert_eq!(def.keyframes[1].alpha, 0.5);
        assert_eq!(def.keyframes[1].callback.as_deref(), Some("ding"));

        let animation = TextureAnimation::from_def(def, TextureId(0));
        assert_eq!(animation.keyframes()[1].length(), 1.0);
    }
}
