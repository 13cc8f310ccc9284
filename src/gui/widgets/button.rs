use crate::engine::input::MouseButton;
use crate::gui::canvas::{Color, FontId, TextAnchor};
use crate::gui::widget::{InputCx, RenderCx, Widget};
use crate::gui::{GuiManager, NodeId};

use super::NodeCallback;

#[derive(Debug, Clone)]
pub struct Caption {
    pub font: FontId,
    pub text: String,
    pub color: Color,
}

/// Clickable node with one optional callback per mouse button. Draws its
/// visual slightly shrunk while the left button is held on it.
#[derive(Default)]
pub struct Button {
    on_left: Option<NodeCallback>,
    on_middle: Option<NodeCallback>,
    on_right: Option<NodeCallback>,
    caption: Option<Caption>,
    pressed: bool,
}

impl Button {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_left_click(mut self, callback: impl FnMut(&mut GuiManager, NodeId) + 'static) -> Self {
        self.on_left = Some(Box::new(callback));
        self
    }

    pub fn on_middle_click(mut self, callback: impl FnMut(&mut GuiManager, NodeId) + 'static) -> Self {
        self.on_middle = Some(Box::new(callback));
        self
    }

    pub fn on_right_click(mut self, callback: impl FnMut(&mut GuiManager, NodeId) + 'static) -> Self {
        self.on_right = Some(Box::new(callback));
        self
    }

    pub fn with_caption(mut self, font: FontId, text: impl Into<String>, color: Color) -> Self {
        self.caption = Some(Caption {
            font,
            text: text.into(),
            color,
        });
        self
    }

    pub fn set_caption_text(&mut self, text: impl Into<String>) {
        if let Some(caption) = &mut self.caption {
            caption.text = text.into();
        }
    }

    pub fn caption(&self) -> Option<&Caption> {
        self.caption.as_ref()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn callback_mut(&mut self, button: MouseButton) -> Option<&mut NodeCallback> {
        match button {
            MouseButton::Left => self.on_left.as_mut(),
            MouseButton::Middle => self.on_middle.as_mut(),
            MouseButton::Right => self.on_right.as_mut(),
        }
    }
}

impl Widget for Button {
    fn input(&mut self, cx: &mut InputCx<'_>) {
        if !cx.input.button_down(MouseButton::Left) {
            self.pressed = false;
        }
        if !cx.hovered() {
            self.pressed = false;
            return;
        }

        let id = cx.id();
        for button in MouseButton::ALL {
            if !cx.input.take_button(button) {
                continue;
            }
            if button == MouseButton::Left {
                self.pressed = true;
            }
            if let Some(callback) = self.callback_mut(button) {
                tracing::trace!(target: "gui", node = %id, ?button, "button clicked");
                callback(cx.gui, id);
            }
        }
    }

    fn render(&self, cx: &mut RenderCx<'_>) {
        let rect = cx.rect();
        if self.pressed {
            let dx = (rect.width as f32 * 0.05) as i32;
            let dy = (rect.height as f32 * 0.05) as i32;
            cx.draw_visual_in(rect.inset(dx, dy));
        } else {
            cx.draw_visual_in(rect);
        }

        if let Some(caption) = &self.caption {
            cx.canvas
                .draw_text(caption.font, &caption.text, TextAnchor::Centered(rect), caption.color);
        }
    }
}
