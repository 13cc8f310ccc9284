use crate::engine::input::MouseButton;
use crate::gui::canvas::{Color, FontId, Rect, TextAnchor};
use crate::gui::widget::{InputCx, RenderCx, Widget};
use crate::gui::{GuiManager, NodeId};

type SelectCallback = Box<dyn FnMut(&mut GuiManager, NodeId, usize, &str)>;

const TEXT_PADDING: i32 = 6;

/// Collapsible list of text options. The node's rectangle is the header;
/// when expanded the options open below it, one header-height row each.
pub struct DropDown {
    font: FontId,
    options: Vec<String>,
    selected: Option<usize>,
    expanded: bool,
    text_color: Color,
    row_color: Color,
    highlight: Color,
    on_select: Option<SelectCallback>,
}

impl DropDown {
    pub fn new(font: FontId) -> Self {
        Self {
            font,
            options: Vec::new(),
            selected: None,
            expanded: false,
            text_color: Color::WHITE,
            row_color: Color::rgba(0.12, 0.12, 0.16, 0.95),
            highlight: Color::rgba(0.25, 0.3, 0.45, 0.95),
            on_select: None,
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        if self.selected.is_none() && !self.options.is_empty() {
            self.selected = Some(0);
        }
        self
    }

    pub fn on_select(
        mut self,
        callback: impl FnMut(&mut GuiManager, NodeId, usize, &str) + 'static,
    ) -> Self {
        self.on_select = Some(Box::new(callback));
        self
    }

    pub fn add_option(&mut self, option: impl Into<String>) {
        self.options.push(option.into());
        if self.selected.is_none() {
            self.selected = Some(0);
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected
            .and_then(|index| self.options.get(index))
            .map(String::as_str)
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Selects without firing the callback. Out-of-range indices are ignored.
    pub fn set_selected(&mut self, index: usize) {
        if index < self.options.len() {
            self.selected = Some(index);
        }
    }

    fn row_rect(header: Rect, index: usize) -> Rect {
        header.offset(0, header.height * (index as i32 + 1))
    }

    fn select(&mut self, gui: &mut GuiManager, id: NodeId, index: usize) {
        self.selected = Some(index);
        self.expanded = false;
        if let (Some(callback), Some(option)) = (&mut self.on_select, self.options.get(index)) {
            tracing::trace!(target: "gui", node = %id, index, option = %option, "drop-down selection");
            callback(gui, id, index, option);
        }
    }
}

impl Widget for DropDown {
    fn input(&mut self, cx: &mut InputCx<'_>) {
        if !cx.input.pressed(MouseButton::Left) {
            return;
        }
        let header = cx.rect();
        let (mx, my) = cx.input.mouse_position();

        if header.contains(mx, my) {
            cx.input.take_button(MouseButton::Left);
            self.expanded = !self.expanded;
            return;
        }
        if !self.expanded {
            return;
        }

        let hit = (0..self.options.len()).find(|&index| Self::row_rect(header, index).contains(mx, my));
        self.expanded = false;
        if let Some(index) = hit {
            cx.input.take_button(MouseButton::Left);
            let id = cx.id();
            self.select(cx.gui, id, index);
        }
    }

    fn render(&self, cx: &mut RenderCx<'_>) {
        cx.draw_visual();
        let header = cx.rect();
        if let Some(selected) = self.selected() {
            let anchor = TextAnchor::TopLeft {
                x: header.x + TEXT_PADDING,
                y: header.y + TEXT_PADDING,
            };
            cx.canvas.draw_text(self.font, selected, anchor, self.text_color);
        }
        if !self.expanded {
            return;
        }

        for (index, option) in self.options.iter().enumerate() {
            let row = Self::row_rect(header, index);
            let fill = if Some(index) == self.selected {
                self.highlight
            } else {
                self.row_color
            };
            cx.canvas.fill_rect(row, fill);
            let anchor = TextAnchor::TopLeft {
                x: row.x + TEXT_PADDING,
                y: row.y + TEXT_PADDING,
            };
            cx.canvas.draw_text(self.font, option, anchor, self.text_color);
        }
    }
}
