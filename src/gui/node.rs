use std::fmt;

use super::animation::TextureAnimation;
use super::canvas::{Color, Rect, TextureId};

/// Handle to a node in a [`GuiManager`](super::GuiManager) arena.
///
/// The serial is unique per allocation, so a handle to a freed node never
/// resolves to whatever later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    key: usize,
    serial: u64,
}

impl NodeId {
    pub(crate) const fn new(key: usize, serial: u64) -> Self {
        Self { key, serial }
    }

    pub(crate) const fn key(self) -> usize {
        self.key
    }

    pub(crate) const fn serial(self) -> u64 {
        self.serial
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.key, self.serial)
    }
}

/// What a node draws for itself. At most one kind is meaningful at a time.
#[derive(Debug, Clone, Default)]
pub enum Visual {
    #[default]
    None,
    Texture(TextureId),
    Animation(TextureAnimation),
}

impl Visual {
    pub fn is_none(&self) -> bool {
        matches!(self, Visual::None)
    }
}

/// Base state every element of the GUI tree carries.
///
/// Position is relative to the parent. Structural fields (parent, children,
/// lifecycle flags) are owned by the manager and only readable from outside.
#[derive(Debug, Clone)]
pub struct Node {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub z_order: i32,
    pub visible: bool,
    pub visual: Visual,
    pub tint: Color,
    pub name: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) pending: Vec<NodeId>,
    pub(crate) created: bool,
    pub(crate) set_to_destroy: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            z_order: 0,
            visible: true,
            visual: Visual::None,
            tint: Color::WHITE,
            name: None,
            parent: None,
            children: Vec::new(),
            pending: Vec::new(),
            created: false,
            set_to_destroy: false,
        }
    }
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.visual = Visual::Texture(texture);
        self
    }

    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visual = visual;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Local rectangle, relative to the parent.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn pending_children(&self) -> &[NodeId] {
        &self.pending
    }

    /// True once the node has been merged into a parent's active children.
    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_set_to_destroy(&self) -> bool {
        self.set_to_destroy
    }

    /// Whether input and update reach this node at all.
    pub fn is_active(&self) -> bool {
        !self.set_to_destroy && self.visible
    }
}
