use std::any::Any;

use super::canvas::{Canvas, Canvas3d, Rect};
use super::manager::GuiManager;
use super::node::{Node, NodeId, Visual};
use crate::engine::core::FrameTiming;
use crate::engine::input::InputState;

/// Lets the manager hand out concrete widget types from `Box<dyn Widget>`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-node behaviour layered on top of the base tree walk.
///
/// The manager owns traversal: it applies the visibility and destroy gates,
/// merges pending children and recurses. A widget only adds what its own node
/// does in each phase. Every hook has a default that reproduces a plain node.
pub trait Widget: AsAny {
    /// Called for active nodes before their children receive input.
    fn input(&mut self, _cx: &mut InputCx<'_>) {}

    /// Called for active nodes before pending children are merged.
    fn update(&mut self, _cx: &mut UpdateCx<'_>) {}

    /// Called for nodes that are visible and not set to destroy. The default
    /// draws the node's visual.
    fn render(&self, cx: &mut RenderCx<'_>) {
        cx.draw_visual();
    }

    /// Called for every node, regardless of its flags.
    fn render_3d(&self, _node: &Node, _canvas: &mut dyn Canvas3d) {}

    /// A keyframe carrying a callback name became active on this node's animation.
    fn animation_event(&mut self, cx: &mut UpdateCx<'_>, event: &str) {
        tracing::trace!(target: "gui", node = %cx.id(), event, "unhandled animation event");
    }
}

/// Plain node with no behaviour beyond the base walk.
#[derive(Debug, Default, Clone, Copy)]
pub struct Panel;

impl Widget for Panel {}

pub struct InputCx<'a> {
    pub gui: &'a mut GuiManager,
    pub input: &'a mut InputState,
    id: NodeId,
    offset: (i32, i32),
}

impl<'a> InputCx<'a> {
    pub(crate) fn new(
        gui: &'a mut GuiManager,
        input: &'a mut InputState,
        id: NodeId,
        offset: (i32, i32),
    ) -> Self {
        Self {
            gui,
            input,
            id,
            offset,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Cumulative position of the parent.
    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    pub fn node(&self) -> Option<&Node> {
        self.gui.node(self.id)
    }

    pub fn node_mut(&mut self) -> Option<&mut Node> {
        self.gui.node_mut(self.id)
    }

    /// Absolute rectangle of this node.
    pub fn rect(&self) -> Rect {
        self.node()
            .map_or_else(Rect::default, |node| node.rect().offset(self.offset.0, self.offset.1))
    }

    pub fn hovered(&self) -> bool {
        let (x, y) = self.input.mouse_position();
        self.rect().contains(x, y)
    }
}

pub struct UpdateCx<'a> {
    pub gui: &'a mut GuiManager,
    pub timing: FrameTiming,
    id: NodeId,
}

impl<'a> UpdateCx<'a> {
    pub(crate) fn new(gui: &'a mut GuiManager, timing: FrameTiming, id: NodeId) -> Self {
        Self { gui, timing, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_mut(&mut self) -> Option<&mut Node> {
        self.gui.node_mut(self.id)
    }
}

pub struct RenderCx<'a> {
    pub gui: &'a GuiManager,
    pub node: &'a Node,
    pub canvas: &'a mut dyn Canvas,
    x: i32,
    y: i32,
}

impl<'a> RenderCx<'a> {
    pub(crate) fn new(
        gui: &'a GuiManager,
        node: &'a Node,
        canvas: &'a mut dyn Canvas,
        x: i32,
        y: i32,
    ) -> Self {
        Self {
            gui,
            node,
            canvas,
            x,
            y,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    /// Absolute rectangle of this node.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.node.width, self.node.height)
    }

    pub fn draw_visual(&mut self) {
        let rect = self.rect();
        self.draw_visual_in(rect);
    }

    /// Draws the node's visual into `rect`. Nodes without a visual or with an
    /// empty size draw nothing.
    pub fn draw_visual_in(&mut self, rect: Rect) {
        if self.node.width <= 0 || self.node.height <= 0 || rect.is_empty() {
            return;
        }
        match &self.node.visual {
            Visual::None => {}
            Visual::Texture(texture) => self.canvas.draw_texture(*texture, rect, self.node.tint),
            Visual::Animation(animation) => animation.render(self.canvas, rect.x, rect.y),
        }
    }
}
