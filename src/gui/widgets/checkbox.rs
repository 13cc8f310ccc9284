use crate::engine::input::MouseButton;
use crate::gui::canvas::TextureId;
use crate::gui::widget::{InputCx, RenderCx, Widget};
use crate::gui::{GuiManager, NodeId};

type CheckCallback = Box<dyn FnMut(&mut GuiManager, NodeId, bool)>;

/// Two-state box. The node's visual is the box; `check` is drawn over it
/// while checked.
pub struct Checkbox {
    check: TextureId,
    checked: bool,
    on_check: Option<CheckCallback>,
}

impl Checkbox {
    pub fn new(check: TextureId) -> Self {
        Self {
            check,
            checked: false,
            on_check: None,
        }
    }

    pub fn on_check(mut self, callback: impl FnMut(&mut GuiManager, NodeId, bool) + 'static) -> Self {
        self.on_check = Some(Box::new(callback));
        self
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Fires the callback only when the state actually changes.
    pub fn set_checked(&mut self, gui: &mut GuiManager, id: NodeId, checked: bool) {
        if self.checked == checked {
            return;
        }
        self.checked = checked;
        if let Some(callback) = &mut self.on_check {
            callback(gui, id, checked);
        }
    }

    pub fn toggle(&mut self, gui: &mut GuiManager, id: NodeId) {
        self.set_checked(gui, id, !self.checked);
    }
}

impl Widget for Checkbox {
    fn input(&mut self, cx: &mut InputCx<'_>) {
        if cx.hovered() && cx.input.take_button(MouseButton::Left) {
            let id = cx.id();
            self.toggle(cx.gui, id);
        }
    }

    fn render(&self, cx: &mut RenderCx<'_>) {
        cx.draw_visual();
        if self.checked && !cx.rect().is_empty() {
            let rect = cx.rect();
            let tint = cx.node.tint;
            cx.canvas.draw_texture(self.check, rect, tint);
        }
    }
}
