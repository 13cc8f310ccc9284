use crate::gui::canvas::{Color, FontId, TextAnchor};
use crate::gui::widget::{RenderCx, Widget};

/// Static line of text drawn at the node's top-left corner.
#[derive(Debug, Clone)]
pub struct Label {
    font: FontId,
    text: String,
    color: Color,
}

impl Label {
    pub fn new(font: FontId, text: impl Into<String>) -> Self {
        Self {
            font,
            text: text.into(),
            color: Color::WHITE,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl Widget for Label {
    fn render(&self, cx: &mut RenderCx<'_>) {
        cx.draw_visual();
        let (x, y) = (cx.x(), cx.y());
        cx.canvas
            .draw_text(self.font, &self.text, TextAnchor::TopLeft { x, y }, self.color);
    }
}
