use crate::engine::input::{Key, MouseButton};
use crate::gui::canvas::{Color, FontId, TextAnchor};
use crate::gui::widget::{InputCx, RenderCx, Widget};
use crate::gui::{GuiManager, NodeId};

type SubmitCallback = Box<dyn FnMut(&mut GuiManager, NodeId, &str)>;

const TEXT_PADDING: i32 = 4;

/// Single-line text entry. A press inside focuses it, a press anywhere else
/// drops focus.
pub struct EditBox {
    font: FontId,
    color: Color,
    text: String,
    max_len: usize,
    focused: bool,
    on_submit: Option<SubmitCallback>,
}

impl EditBox {
    pub fn new(font: FontId) -> Self {
        Self {
            font,
            color: Color::WHITE,
            text: String::new(),
            max_len: 256,
            focused: false,
            on_submit: None,
        }
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn on_submit(mut self, callback: impl FnMut(&mut GuiManager, NodeId, &str) + 'static) -> Self {
        self.on_submit = Some(Box::new(callback));
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.truncate();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn truncate(&mut self) {
        if let Some((index, _)) = self.text.char_indices().nth(self.max_len) {
            self.text.truncate(index);
        }
    }
}

impl Widget for EditBox {
    fn input(&mut self, cx: &mut InputCx<'_>) {
        if cx.input.pressed(MouseButton::Left) {
            self.focused = cx.hovered();
            if self.focused {
                cx.input.take_button(MouseButton::Left);
            }
        }
        if !self.focused {
            return;
        }

        if cx.input.key_pressed(Key::Backspace) {
            self.text.pop();
        }
        self.text.push_str(cx.input.text());
        self.truncate();

        if cx.input.key_pressed(Key::Enter) {
            let id = cx.id();
            if let Some(callback) = &mut self.on_submit {
                callback(cx.gui, id, &self.text);
            }
        }
    }

    fn render(&self, cx: &mut RenderCx<'_>) {
        cx.draw_visual();
        let rect = cx.rect();
        let anchor = TextAnchor::TopLeft {
            x: rect.x + TEXT_PADDING,
            y: rect.y + TEXT_PADDING,
        };
        if self.focused {
            let shown = format!("{}_", self.text);
            cx.canvas.draw_text(self.font, &shown, anchor, self.color);
        } else {
            cx.canvas.draw_text(self.font, &self.text, anchor, self.color);
        }
    }
}
