use crate::engine::input::MouseButton;
use crate::gui::canvas::Rect;
use crate::gui::widget::{InputCx, Widget};

/// Container that can be dragged around by a bar along its top edge.
#[derive(Debug, Clone)]
pub struct Moveable {
    bar_height: i32,
    moveable: bool,
    /// Cursor position relative to the node's corner when the drag started.
    grab: Option<(i32, i32)>,
}

impl Moveable {
    pub fn new(bar_height: i32) -> Self {
        Self {
            bar_height,
            moveable: true,
            grab: None,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.moveable = false;
        self
    }

    pub fn set_moveable(&mut self, moveable: bool) {
        self.moveable = moveable;
        if !moveable {
            self.grab = None;
        }
    }

    pub fn is_moveable(&self) -> bool {
        self.moveable
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    fn bar(&self, rect: Rect) -> Rect {
        Rect::new(rect.x, rect.y, rect.width, self.bar_height.min(rect.height))
    }
}

impl Widget for Moveable {
    fn input(&mut self, cx: &mut InputCx<'_>) {
        if !self.moveable {
            return;
        }
        let rect = cx.rect();
        let (mx, my) = cx.input.mouse_position();

        if !cx.input.button_down(MouseButton::Left) {
            self.grab = None;
            return;
        }
        if self.grab.is_none() && self.bar(rect).contains(mx, my) && cx.input.take_button(MouseButton::Left) {
            self.grab = Some((mx - rect.x, my - rect.y));
            tracing::trace!(target: "gui", node = %cx.id(), "drag started");
        }

        if let Some((gx, gy)) = self.grab {
            let (ox, oy) = cx.offset();
            if let Some(node) = cx.node_mut() {
                node.x = mx - gx - ox;
                node.y = my - gy - oy;
            }
        }
    }
}
