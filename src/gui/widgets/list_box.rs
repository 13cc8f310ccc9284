use crate::gui::widget::{InputCx, UpdateCx, Widget};
use crate::gui::{GuiManager, Node, NodeId};

/// Vertical stack of child nodes with wheel scrolling.
///
/// Items are ordinary nodes attached through the pending buffer. Every
/// update the list lays them out top to bottom and hides any item that does
/// not fit entirely inside the list, which also keeps input away from it.
#[derive(Debug)]
pub struct ListBox {
    items: Vec<NodeId>,
    doomed: Vec<NodeId>,
    padding: i32,
    spacing: i32,
    scroll: i32,
    scroll_step: i32,
}

impl Default for ListBox {
    fn default() -> Self {
        Self::new(4, 2)
    }
}

impl ListBox {
    pub fn new(padding: i32, spacing: i32) -> Self {
        Self {
            items: Vec::new(),
            doomed: Vec::new(),
            padding,
            spacing,
            scroll: 0,
            scroll_step: 16,
        }
    }

    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn scroll(&self) -> i32 {
        self.scroll
    }

    /// Appends `item` below the current last item and queues it under `list`.
    pub fn add_item(&mut self, gui: &mut GuiManager, list: NodeId, item: NodeId) {
        let y = self.content_height(gui) - self.scroll;
        if let Some(node) = gui.node_mut(item) {
            node.x = self.padding;
            node.y = y;
        }
        gui.attach(list, item);
        self.items.push(item);
    }

    /// Destroys every item. Items added this frame go once they are merged.
    pub fn clear(&mut self, gui: &mut GuiManager) {
        for item in self.items.drain(..) {
            match gui.node(item).map(Node::is_created) {
                Some(true) => gui.destroy_node(item),
                Some(false) => self.doomed.push(item),
                None => {}
            }
        }
        self.scroll = 0;
    }

    /// Scrolls so the last item is in view.
    pub fn scroll_to_end(&mut self, gui: &GuiManager, list: NodeId) {
        let view = gui.node(list).map_or(0, |node| node.height);
        self.scroll = self.max_scroll(gui, view);
    }

    fn content_height(&self, gui: &GuiManager) -> i32 {
        let items: i32 = self
            .items
            .iter()
            .filter_map(|&item| gui.node(item))
            .map(|node| node.height + self.spacing)
            .sum();
        self.padding + items
    }

    fn max_scroll(&self, gui: &GuiManager, view: i32) -> i32 {
        (self.content_height(gui) + self.padding - view).max(0)
    }

    fn layout(&mut self, gui: &mut GuiManager, list: NodeId) {
        let Some(view) = gui.node(list).map(|node| node.height) else {
            return;
        };
        self.scroll = self.scroll.clamp(0, self.max_scroll(gui, view));

        let mut y = self.padding - self.scroll;
        for &item in &self.items {
            let Some(node) = gui.node_mut(item) else {
                continue;
            };
            node.x = self.padding;
            node.y = y;
            node.visible = y >= 0 && y + node.height <= view;
            y += node.height + self.spacing;
        }
    }
}

impl Widget for ListBox {
    fn input(&mut self, cx: &mut InputCx<'_>) {
        let wheel = cx.input.wheel();
        if wheel != 0.0 && cx.hovered() {
            self.scroll -= (wheel * self.scroll_step as f32) as i32;
        }
    }

    fn update(&mut self, cx: &mut UpdateCx<'_>) {
        let list = cx.id();
        let gui = &mut *cx.gui;
        self.items.retain(|&item| gui.contains(item));
        self.doomed.retain(|&item| match gui.node(item).map(Node::is_created) {
            Some(true) => {
                gui.destroy_node(item);
                false
            }
            Some(false) => true,
            None => false,
        });
        self.layout(gui, list);
    }
}
