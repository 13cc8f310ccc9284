//! Draw boundary between the GUI tree and whatever puts pixels on screen.
//!
//! The tree never touches the GPU. Nodes describe what they want drawn through
//! [`Canvas`] (2D) and [`Canvas3d`] (3D), and the engine decides how. [`DrawList`]
//! is the recording implementation the renderer consumes each frame.

/// Integer rectangle in window pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict containment: points on the edge are outside.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px > self.x && px < self.x + self.width && py > self.y && py < self.y + self.height
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Shrinks the rectangle by `dx` on the left and right and `dy` on the top and bottom.
    pub fn inset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width - dx * 2,
            height: self.height - dy * 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b), channel(self.a)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Opaque handle to a texture owned by the engine's resource manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Opaque handle to a loaded font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(pub u32);

/// Where a run of text is placed. Text metrics live with the font, so
/// centering is resolved by whoever rasterizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    TopLeft { x: i32, y: i32 },
    Centered(Rect),
}

pub trait Canvas {
    fn draw_texture(&mut self, texture: TextureId, dst: Rect, tint: Color);

    /// Draws the `src` sub-rectangle (in texture pixels) of `texture` into `dst`.
    fn draw_texture_part(&mut self, texture: TextureId, src: Rect, dst: Rect, tint: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: i32);

    fn draw_text(&mut self, font: FontId, text: &str, anchor: TextAnchor, color: Color);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    pub center: [f32; 3],
    pub size: f32,
    /// Euler angles in radians, applied x then y then z.
    pub rotation: [f32; 3],
    pub color: Color,
}

pub trait Canvas3d {
    fn draw_cube(&mut self, cube: Cube);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Texture {
        texture: TextureId,
        src: Option<Rect>,
        dst: Rect,
        tint: Color,
    },
    Fill {
        rect: Rect,
        color: Color,
    },
    Stroke {
        rect: Rect,
        color: Color,
        width: i32,
    },
    Text {
        font: FontId,
        text: String,
        anchor: TextAnchor,
        color: Color,
    },
}

/// Records one frame of draw calls in submission order.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    cubes: Vec<Cube>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.cubes.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.cubes.is_empty()
    }

    /// Destination rectangles of every texture command, in draw order.
    pub fn texture_targets(&self) -> Vec<(TextureId, Rect)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Texture { texture, dst, .. } => Some((*texture, *dst)),
                _ => None,
            })
            .collect()
    }

    /// Every string drawn this frame, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for DrawList {
    fn draw_texture(&mut self, texture: TextureId, dst: Rect, tint: Color) {
        self.commands.push(DrawCommand::Texture {
            texture,
            src: None,
            dst,
            tint,
        });
    }

    fn draw_texture_part(&mut self, texture: TextureId, src: Rect, dst: Rect, tint: Color) {
        self.commands.push(DrawCommand::Texture {
            texture,
            src: Some(src),
            dst,
            tint,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Fill { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: i32) {
        self.commands.push(DrawCommand::Stroke { rect, color, width });
    }

    fn draw_text(&mut self, font: FontId, text: &str, anchor: TextAnchor, color: Color) {
        if text.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Text {
            font,
            text: text.to_owned(),
            anchor,
            color,
        });
    }
}

impl Canvas3d for DrawList {
    fn draw_cube(&mut self, cube: Cube) {
        self.cubes.push(cube);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_strict_on_edges() {
        let rect = Rect::new(10, 10, 20, 20);
        assert!(rect.contains(11, 11));
        assert!(rect.contains(29, 29));
        assert!(!rect.contains(10, 15));
        assert!(!rect.contains(30, 15));
        assert!(!rect.contains(15, 30));
    }

    #[test]
    fn inset_shrinks_both_sides() {
        let rect = Rect::new(0, 0, 100, 40).inset(5, 2);
        assert_eq!(rect, Rect::new(5, 2, 90, 36));
        assert!(Rect::new(0, 0, 4, 4).inset(2, 2).is_empty());
    }

    #[test]
    fn draw_list_skips_empty_text() {
        let mut list = DrawList::new();
        list.draw_text(FontId(0), "", TextAnchor::TopLeft { x: 0, y: 0 }, Color::WHITE);
        list.draw_text(FontId(0), "hi", TextAnchor::TopLeft { x: 0, y: 0 }, Color::WHITE);
        assert_eq!(list.texts(), vec!["hi"]);
    }

    #[test]
    fn color_quantizes_and_clamps() {
        assert_eq!(Color::rgba(1.5, 0.0, 0.5, 1.0).to_rgba8(), [255, 0, 128, 255]);
    }
}
