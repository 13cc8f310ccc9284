use std::cmp::Reverse;
use std::mem;

use slab::Slab;

use super::canvas::{Canvas, Canvas3d, Rect};
use super::error::GuiError;
use super::node::{Node, NodeId, Visual};
use super::widget::{InputCx, Panel, RenderCx, UpdateCx, Widget};
use crate::engine::core::FrameTiming;
use crate::engine::input::InputState;

struct Slot {
    serial: u64,
    node: Node,
    /// `None` only while the widget is running one of its own hooks.
    widget: Option<Box<dyn Widget>>,
}

/// Owns the GUI tree and runs the per-frame phases over it.
///
/// Structural changes are staged so no phase ever mutates a list it is
/// walking:
///
/// * [`attach`](Self::attach) puts a child in the parent's pending buffer;
///   [`update`](Self::update) merges it into the active children.
/// * [`destroy_node`](Self::destroy_node) flags a subtree and stacks it;
///   [`end_step`](Self::end_step) detaches and frees it, children first.
///
/// A frame runs `input`, `update`, `render`, `render_3d`, `end_step` in that
/// order; [`frame`](Self::frame) does exactly that.
pub struct GuiManager {
    slots: Slab<Slot>,
    root: NodeId,
    destroy_list: Vec<NodeId>,
    next_serial: u64,
    dispatching: bool,
}

impl Default for GuiManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GuiManager {
    pub fn new() -> Self {
        let mut slots = Slab::new();
        let root_node = Node {
            name: Some("root".to_owned()),
            created: true,
            ..Node::default()
        };
        let key = slots.insert(Slot {
            serial: 0,
            node: root_node,
            widget: Some(Box::new(Panel)),
        });
        Self {
            slots,
            root: NodeId::new(key, 0),
            destroy_list: Vec::new(),
            next_serial: 1,
            dispatching: false,
        }
    }

    /// The tree root. It is created, never destroyed, and has no parent.
    pub fn base_node(&self) -> NodeId {
        self.root
    }

    /// Allocates a detached node. It becomes `created` once a parent's
    /// update merges it.
    pub fn create(&mut self, node: Node, widget: impl Widget) -> NodeId {
        self.create_boxed(node, Box::new(widget))
    }

    pub fn create_boxed(&mut self, mut node: Node, widget: Box<dyn Widget>) -> NodeId {
        node.parent = None;
        node.children.clear();
        node.pending.clear();
        node.created = false;
        node.set_to_destroy = false;

        let serial = self.next_serial;
        self.next_serial += 1;
        let key = self.slots.insert(Slot {
            serial,
            node,
            widget: Some(widget),
        });
        let id = NodeId::new(key, serial);
        tracing::trace!(target: "gui", node = %id, "node created");
        id
    }

    /// Shorthand for a node with no behaviour of its own.
    pub fn create_node(&mut self, node: Node) -> NodeId {
        self.create(node, Panel)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /// Number of nodes in the arena, root included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).map(|slot| &slot.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slot_mut(id).map(|slot| &mut slot.node)
    }

    /// The widget of `id` as `W`. `None` while that widget is running one of
    /// its own hooks.
    pub fn widget<W: Widget>(&self, id: NodeId) -> Option<&W> {
        let widget: &dyn Widget = self.slot(id)?.widget.as_deref()?;
        widget.as_any().downcast_ref()
    }

    pub fn widget_mut<W: Widget>(&mut self, id: NodeId) -> Option<&mut W> {
        let widget: &mut dyn Widget = self.slot_mut(id)?.widget.as_deref_mut()?;
        widget.as_any_mut().downcast_mut()
    }

    /// Runs `f` with the widget of `id` and the rest of the manager borrowed
    /// at the same time.
    pub fn with_widget<W: Widget, R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut W, &mut GuiManager) -> R,
    ) -> Option<R> {
        let mut boxed = self.slot_mut(id)?.widget.take()?;
        let result = {
            let widget: &mut dyn Widget = boxed.as_mut();
            widget.as_any_mut().downcast_mut::<W>().map(|widget| f(widget, self))
        };
        if let Some(slot) = self.slot_mut(id) {
            slot.widget = Some(boxed);
        }
        result
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], Node::children)
    }

    pub fn pending_children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], Node::pending_children)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.node_mut(id) {
            node.visible = visible;
        }
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.visible)
    }

    /// Nodes flagged this frame, in push order.
    pub fn destroy_list(&self) -> &[NodeId] {
        &self.destroy_list
    }

    /// Queues `child` under `parent`. The parent link is set now; the child
    /// joins the active children at the parent's next update.
    pub fn try_attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), GuiError> {
        if parent == child {
            return Err(GuiError::SelfAttach(child));
        }
        let parent_node = self.node(parent).ok_or(GuiError::UnknownNode(parent))?;
        if parent_node.set_to_destroy {
            return Err(GuiError::ParentDestroying(parent));
        }
        let child_node = self.node(child).ok_or(GuiError::UnknownNode(child))?;
        if child_node.parent.is_some() || child_node.created {
            return Err(GuiError::AlreadyAttached(child));
        }
        let mut ancestor = self.parent(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(GuiError::WouldCycle(child, parent));
            }
            ancestor = self.parent(id);
        }

        if let Some(child_node) = self.node_mut(child) {
            child_node.parent = Some(parent);
        }

        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.pending.push(child);
        }
        tracing::trace!(target: "gui", %parent, %child, "child queued");
        Ok(())
    }

    /// Panics when `parent` is set to destroy, or on any other misuse
    /// reported by [`try_attach`](Self::try_attach).
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Err(err) = self.try_attach(parent, child) {
            panic!("attach failed: {err}");
        }
    }

    /// Queues `child` under the root.
    pub fn add_child(&mut self, child: NodeId) {
        self.attach(self.root, child);
    }

    /// Drops `child` from the active children of `parent`. Does nothing if it
    /// is not there. Panics if `child` exists but was never attached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.node(child) {
            assert!(
                node.created,
                "cannot remove node {child}: it was never attached to the tree"
            );
        }
        if let Some(parent_node) = self.node_mut(parent) {
            if let Some(index) = parent_node.children.iter().position(|&c| c == child) {
                parent_node.children.remove(index);
            }
        }
    }

    /// Flags `id` and every active descendant and pushes them on the destroy
    /// list, parent before children. Descendants that are already flagged are
    /// already on the list with their subtree and are skipped. Pending
    /// children are not flagged; they are freed with their parent.
    pub fn try_set_to_destroy(&mut self, id: NodeId) -> Result<(), GuiError> {
        if id == self.root {
            return Err(GuiError::RootNode(id));
        }
        let node = self.node(id).ok_or(GuiError::UnknownNode(id))?;
        if !node.created {
            return Err(GuiError::NotCreated(id));
        }
        let before = self.destroy_list.len();
        self.cascade_destroy(id);
        tracing::debug!(
            target: "gui",
            node = %id,
            flagged = self.destroy_list.len() - before,
            "subtree set to destroy"
        );
        Ok(())
    }

    /// Panics if `id` is the root or was never attached to the tree.
    pub fn set_to_destroy(&mut self, id: NodeId) {
        if let Err(err) = self.try_set_to_destroy(id) {
            panic!("set_to_destroy failed: {err}");
        }
    }

    /// Requests destruction of `id` at the next [`end_step`](Self::end_step).
    /// The root, nodes already flagged and stale handles are ignored.
    pub fn destroy_node(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        match self.node(id) {
            Some(node) if !node.set_to_destroy => self.set_to_destroy(id),
            _ => {}
        }
    }

    fn cascade_destroy(&mut self, id: NodeId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if node.set_to_destroy {
            return;
        }
        node.set_to_destroy = true;
        let children = node.children.clone();
        self.destroy_list.push(id);
        for child in children {
            self.cascade_destroy(child);
        }
    }

    /// Detaches `id` from its parent's active children. Freeing is separate.
    pub(crate) fn destroy(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        assert!(node.created, "cannot destroy node {id}: it was never attached to the tree");
        if let Some(parent) = node.parent {
            self.remove_child(parent, id);
        }
    }

    /// Frees everything on the destroy list, last pushed first, so every node
    /// goes before its ancestors. Call once per frame after all phases.
    pub fn end_step(&mut self) {
        assert!(!self.dispatching, "end_step called while a phase is running");
        if self.destroy_list.is_empty() {
            return;
        }

        let mut freed = 0usize;
        while let Some(id) = self.destroy_list.pop() {
            self.destroy(id);
            freed += self.free(id);
        }
        tracing::debug!(target: "gui", freed, remaining = self.slots.len(), "end step");
    }

    /// Frees every node below the root and leaves an empty, usable tree.
    pub fn shutdown(&mut self) {
        assert!(!self.dispatching, "shutdown called while a phase is running");
        let root = self.root;
        self.cascade_destroy(root);
        self.destroy_list.retain(|&id| id != root);
        let pending = match self.node_mut(root) {
            Some(node) => {
                node.set_to_destroy = false;
                mem::take(&mut node.pending)
            }
            None => Vec::new(),
        };
        for id in pending {
            self.free(id);
        }
        self.end_step();
        tracing::info!(target: "gui", remaining = self.slots.len(), "gui shut down");
    }

    /// Removes `id` and its never-attached pending subtree from the arena.
    fn free(&mut self, id: NodeId) -> usize {
        if self.slot(id).is_none() {
            return 0;
        }
        let slot = self.slots.remove(id.key());
        let mut freed = 1;
        for orphan in slot.node.pending.into_iter().chain(slot.node.children) {
            let orphan_is_flagged = self
                .node(orphan)
                .is_some_and(|node| node.set_to_destroy);
            if !orphan_is_flagged {
                freed += self.free(orphan);
            }
        }
        freed
    }

    /// Runs every phase of one frame in order.
    pub fn frame<C: Canvas + Canvas3d>(
        &mut self,
        input: &mut InputState,
        timing: &FrameTiming,
        canvas: &mut C,
    ) {
        self.input(input);
        self.update(timing);
        self.render(canvas);
        self.render_3d(canvas);
        self.end_step();
    }

    /// Hands input to every active node, parents before their children and
    /// siblings in reverse draw order.
    pub fn input(&mut self, input: &mut InputState) {
        self.begin_dispatch("input");
        self.input_node(self.root, input, (0, 0));
        self.dispatching = false;
    }

    fn input_node(&mut self, id: NodeId, input: &mut InputState, offset: (i32, i32)) {
        let Some(slot) = self.slot_mut(id) else {
            return;
        };
        if !slot.node.is_active() {
            return;
        }

        if let Some(mut widget) = slot.widget.take() {
            widget.input(&mut InputCx::new(self, input, id, offset));
            if let Some(slot) = self.slot_mut(id) {
                slot.widget = Some(widget);
            }
        }

        let Some(node) = self.node(id) else {
            return;
        };
        let next = (offset.0 + node.x, offset.1 + node.y);
        // Topmost first: children drawn last get the first chance to take a press.
        let children = node.children.clone();
        for child in children.into_iter().rev() {
            self.input_node(child, input, next);
        }
    }

    pub fn update(&mut self, timing: &FrameTiming) {
        self.begin_dispatch("update");
        self.update_node(self.root, timing);
        self.dispatching = false;
    }

    fn update_node(&mut self, id: NodeId, timing: &FrameTiming) {
        let Some(slot) = self.slot_mut(id) else {
            return;
        };
        if !slot.node.is_active() {
            return;
        }

        let event = match &mut slot.node.visual {
            Visual::Animation(animation) => animation.advance(timing.delta_seconds),
            _ => None,
        };
        if let Some(mut widget) = slot.widget.take() {
            let mut cx = UpdateCx::new(self, *timing, id);
            if let Some(event) = event {
                widget.animation_event(&mut cx, &event);
            }
            widget.update(&mut cx);
            if let Some(slot) = self.slot_mut(id) {
                slot.widget = Some(widget);
            }
        }

        // The hook may have flagged or hidden this node.
        if !self.node(id).is_some_and(Node::is_active) {
            return;
        }
        self.merge_pending(id);

        let mut index = 0;
        while let Some(child) = self.children(id).get(index).copied() {
            self.update_node(child, timing);
            index += 1;
        }
    }

    fn merge_pending(&mut self, id: NodeId) {
        let pending = match self.node_mut(id) {
            Some(node) if !node.pending.is_empty() => mem::take(&mut node.pending),
            _ => return,
        };
        for &child in &pending {
            if let Some(node) = self.node_mut(child) {
                node.created = true;
            }
        }

        let mut children = match self.node_mut(id) {
            Some(node) => mem::take(&mut node.children),
            None => return,
        };
        let merged = pending.len();
        children.extend(pending.into_iter().filter(|&child| self.contains(child)));
        // Stable, so equal z-orders keep attach order. Lower z draws on top.
        children.sort_by_key(|&child| Reverse(self.node(child).map_or(0, |node| node.z_order)));
        if let Some(node) = self.node_mut(id) {
            node.children = children;
        }
        tracing::trace!(target: "gui", node = %id, merged, "pending children merged");
    }

    /// Draws the tree. A node that is hidden or set to destroy skips its own
    /// drawing, but its children are still visited and apply their own flags.
    pub fn render(&self, canvas: &mut dyn Canvas) {
        self.render_node(self.root, (0, 0), canvas);
    }

    fn render_node(&self, id: NodeId, offset: (i32, i32), canvas: &mut dyn Canvas) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        let node = &slot.node;
        let x = node.x + offset.0;
        let y = node.y + offset.1;

        if node.is_active() {
            if let Some(widget) = slot.widget.as_deref() {
                widget.render(&mut RenderCx::new(self, node, canvas, x, y));
            }
        }

        for &child in &node.children {
            self.render_node(child, (x, y), canvas);
        }
    }

    pub fn render_3d(&self, canvas: &mut dyn Canvas3d) {
        self.render_3d_node(self.root, canvas);
    }

    fn render_3d_node(&self, id: NodeId, canvas: &mut dyn Canvas3d) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        if let Some(widget) = slot.widget.as_deref() {
            widget.render_3d(&slot.node, canvas);
        }
        for &child in &slot.node.children {
            self.render_3d_node(child, canvas);
        }
    }

    /// Absolute rectangle of `id`, summing every ancestor's position.
    pub fn absolute_rect(&self, id: NodeId) -> Option<Rect> {
        let node = self.node(id)?;
        let mut rect = node.rect();
        let mut parent = node.parent;
        while let Some(ancestor) = parent.and_then(|p| self.node(p)) {
            rect = rect.offset(ancestor.x, ancestor.y);
            parent = ancestor.parent;
        }
        Some(rect)
    }

    /// Pre-order search of the active tree for a node with the given name.
    /// Nodes set to destroy are skipped along with their subtrees.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.set_to_destroy {
                continue;
            }
            if node.name.as_deref() == Some(name) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Centre of the named node's absolute rectangle.
    pub fn click_position(&self, name: &str) -> Option<(i32, i32)> {
        let id = self.find_by_name(name)?;
        self.absolute_rect(id).map(|rect| rect.center())
    }

    fn begin_dispatch(&mut self, phase: &str) {
        assert!(
            !self.dispatching,
            "gui {phase} started while another phase is running"
        );
        self.dispatching = true;
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots
            .get(id.key())
            .filter(|slot| slot.serial == id.serial())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.key())
            .filter(|slot| slot.serial == id.serial())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::canvas::{Color, Cube, DrawList, TextureId};

    fn timing() -> FrameTiming {
        FrameTiming::from_delta(1.0 / 60.0)
    }

    fn textured(gui: &mut GuiManager, rect: Rect, texture: u32) -> NodeId {
        gui.create_node(Node::at(rect).with_texture(TextureId(texture)))
    }

    #[test]
    fn pending_children_are_disjoint_from_active_until_update() {
        let mut gui = GuiManager::new();
        let child = gui.create_node(Node::new());
        gui.add_child(child);

        let root = gui.base_node();
        assert_eq!(gui.pending_children(root), &[child]);
        assert!(gui.children(root).is_empty());
        assert_eq!(gui.parent(child), Some(root));
        assert!(!gui.node(child).unwrap().is_created());

        gui.update(&timing());
        assert!(gui.pending_children(root).is_empty());
        assert_eq!(gui.children(root), &[child]);
        assert!(gui.node(child).unwrap().is_created());
    }

    #[test]
    fn cascade_pushes_parent_before_children_once_each() {
        let mut gui = GuiManager::new();
        let parent = gui.create_node(Node::new());
        let a = gui.create_node(Node::new());
        let b = gui.create_node(Node::new());
        let grandchild = gui.create_node(Node::new());
        gui.add_child(parent);
        gui.attach(parent, a);
        gui.attach(parent, b);
        gui.attach(a, grandchild);
        for _ in 0..3 {
            gui.update(&timing());
        }

        gui.destroy_node(a);
        gui.destroy_node(parent);
        gui.destroy_node(parent);

        assert_eq!(gui.destroy_list(), &[a, grandchild, parent, b]);
        gui.end_step();
        for id in [parent, a, b, grandchild] {
            assert!(!gui.contains(id));
        }
        assert!(gui.children(gui.base_node()).is_empty());
    }

    #[test]
    fn end_step_detaches_from_surviving_parent() {
        let mut gui = GuiManager::new();
        let parent = gui.create_node(Node::new());
        let keep = gui.create_node(Node::new());
        let doomed = gui.create_node(Node::new());
        gui.add_child(parent);
        gui.attach(parent, keep);
        gui.attach(parent, doomed);
        gui.update(&timing());
        gui.update(&timing());

        gui.destroy_node(doomed);
        assert_eq!(gui.children(parent), &[keep, doomed]);
        gui.end_step();
        assert_eq!(gui.children(parent), &[keep]);
    }

    #[test]
    fn freeing_a_node_frees_its_unmerged_children() {
        let mut gui = GuiManager::new();
        let parent = gui.create_node(Node::new());
        gui.add_child(parent);
        gui.update(&timing());

        let late = gui.create_node(Node::new());
        let late_child = gui.create_node(Node::new());
        gui.attach(late, late_child);
        gui.attach(parent, late);
        gui.destroy_node(parent);
        assert_eq!(gui.destroy_list(), &[parent]);

        gui.end_step();
        assert!(!gui.contains(late));
        assert!(!gui.contains(late_child));
        assert_eq!(gui.len(), 1);
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut gui = GuiManager::new();
        let first = gui.create_node(Node::new());
        gui.add_child(first);
        gui.update(&timing());
        gui.destroy_node(first);
        gui.end_step();

        let second = gui.create_node(Node::new());
        assert_eq!(first.key(), second.key());
        assert!(!gui.contains(first));
        assert!(gui.contains(second));
        gui.destroy_node(first);
        assert!(gui.destroy_list().is_empty());
    }

    #[test]
    fn merge_orders_children_by_descending_z() {
        let mut gui = GuiManager::new();
        let console = gui.create_node(Node::new().with_z_order(-9999));
        let back = gui.create_node(Node::new().with_z_order(10));
        let a = gui.create_node(Node::new());
        let b = gui.create_node(Node::new());
        for id in [console, a, back, b] {
            gui.add_child(id);
        }
        gui.update(&timing());
        assert_eq!(gui.children(gui.base_node()), &[back, a, b, console]);
    }

    #[test]
    fn hidden_node_skips_own_visual_but_children_still_draw() {
        let mut gui = GuiManager::new();
        let parent = textured(&mut gui, Rect::new(10, 10, 50, 50), 1);
        let child = textured(&mut gui, Rect::new(5, 5, 10, 10), 2);
        gui.add_child(parent);
        gui.attach(parent, child);
        gui.update(&timing());
        gui.update(&timing());

        gui.set_visible(parent, false);
        let mut list = DrawList::new();
        gui.render(&mut list);
        assert_eq!(list.texture_targets(), vec![(TextureId(2), Rect::new(15, 15, 10, 10))]);
    }

    struct Spinner;

    impl Widget for Spinner {
        fn render_3d(&self, _node: &Node, canvas: &mut dyn Canvas3d) {
            canvas.draw_cube(Cube {
                center: [0.0, 0.0, 5.0],
                size: 1.0,
                rotation: [0.0; 3],
                color: Color::WHITE,
            });
        }
    }

    #[test]
    fn render_3d_reaches_hidden_and_destroying_nodes() {
        let mut gui = GuiManager::new();
        let hidden = gui.create(Node::new().hidden(), Spinner);
        let doomed = gui.create(Node::new(), Spinner);
        let nested = gui.create(Node::new(), Spinner);
        gui.add_child(hidden);
        gui.add_child(doomed);
        gui.attach(doomed, nested);
        gui.update(&timing());
        gui.destroy_node(doomed);

        let mut list = DrawList::new();
        gui.render_3d(&mut list);
        assert_eq!(list.cubes().len(), 3);
    }

    #[test]
    fn hidden_node_blocks_update_of_its_subtree() {
        let mut gui = GuiManager::new();
        let parent = gui.create_node(Node::new().hidden());
        gui.add_child(parent);
        gui.update(&timing());

        let child = gui.create_node(Node::new());
        gui.attach(parent, child);
        gui.update(&timing());
        assert_eq!(gui.pending_children(parent), &[child]);

        gui.set_visible(parent, true);
        gui.update(&timing());
        assert_eq!(gui.children(parent), &[child]);
    }

    #[test]
    fn zero_sized_or_empty_visual_draws_nothing() {
        let mut gui = GuiManager::new();
        let empty = gui.create_node(Node::at(Rect::new(0, 0, 10, 10)));
        let flat = textured(&mut gui, Rect::new(0, 0, 10, 0), 4);
        gui.add_child(empty);
        gui.add_child(flat);
        gui.update(&timing());

        let mut list = DrawList::new();
        gui.render(&mut list);
        assert!(list.is_empty());
    }

    #[test]
    fn shutdown_frees_everything_but_the_root() {
        let mut gui = GuiManager::new();
        let a = gui.create_node(Node::new());
        let b = gui.create_node(Node::new());
        gui.add_child(a);
        gui.attach(a, b);
        gui.update(&timing());
        gui.update(&timing());
        let queued = gui.create_node(Node::new());
        gui.add_child(queued);

        gui.shutdown();
        assert_eq!(gui.len(), 1);
        let root = gui.base_node();
        assert!(gui.children(root).is_empty());
        assert!(gui.pending_children(root).is_empty());
        assert!(!gui.node(root).unwrap().is_set_to_destroy());

        let again = gui.create_node(Node::new());
        gui.add_child(again);
        gui.update(&timing());
        assert_eq!(gui.children(root), &[again]);
    }

    #[test]
    fn find_by_name_skips_destroying_nodes() {
        let mut gui = GuiManager::new();
        let panel = gui.create_node(Node::at(Rect::new(100, 50, 200, 100)).with_name("panel"));
        let go = gui.create_node(Node::at(Rect::new(10, 10, 40, 20)).with_name("go"));
        gui.add_child(panel);
        gui.attach(panel, go);
        gui.update(&timing());
        gui.update(&timing());

        assert_eq!(gui.find_by_name("go"), Some(go));
        assert_eq!(gui.click_position("go"), Some((130, 70)));

        gui.destroy_node(panel);
        assert_eq!(gui.find_by_name("go"), None);
    }

    #[test]
    fn attach_rejects_second_parent() {
        let mut gui = GuiManager::new();
        let a = gui.create_node(Node::new());
        let b = gui.create_node(Node::new());
        gui.add_child(a);
        assert_eq!(gui.try_attach(b, a), Err(GuiError::AlreadyAttached(a)));
        assert_eq!(gui.try_attach(a, a), Err(GuiError::SelfAttach(a)));
        assert!(gui.pending_children(b).is_empty());
    }

    #[test]
    fn root_cannot_be_destroyed() {
        let mut gui = GuiManager::new();
        let root = gui.base_node();
        let child = gui.create_node(Node::new());
        gui.add_child(child);
        gui.update(&timing());

        assert_eq!(gui.try_set_to_destroy(root), Err(GuiError::RootNode(root)));
        gui.destroy_node(root);
        assert!(gui.destroy_list().is_empty());
        gui.end_step();

        assert!(gui.contains(root));
        assert_eq!(gui.children(root), &[child]);
        let late = gui.create_node(Node::new());
        gui.add_child(late);
        assert_eq!(gui.pending_children(root), &[late]);
    }

    #[test]
    #[should_panic(expected = "is the root")]
    fn set_to_destroy_on_root_is_fatal() {
        let mut gui = GuiManager::new();
        let root = gui.base_node();
        gui.set_to_destroy(root);
    }

    #[test]
    fn attach_rejects_cycles_between_detached_nodes() {
        let mut gui = GuiManager::new();
        let a = gui.create_node(Node::new());
        let b = gui.create_node(Node::new());
        let c = gui.create_node(Node::new());
        gui.attach(a, b);
        gui.attach(b, c);

        assert_eq!(gui.try_attach(b, a), Err(GuiError::WouldCycle(a, b)));
        assert_eq!(gui.try_attach(c, a), Err(GuiError::WouldCycle(a, c)));
        assert_eq!(gui.parent(a), None);
        assert!(gui.pending_children(c).is_empty());
    }

    struct Recorder {
        name: &'static str,
        log: std::rc::Rc<std::cell::RefCell<Vec<&'static str>>>,
    }

    impl Widget for Recorder {
        fn input(&mut self, _cx: &mut InputCx<'_>) {
            self.log.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn input_visits_parent_then_children_topmost_first() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut gui = GuiManager::new();
        let recorder = |gui: &mut GuiManager, name| {
            gui.create(Node::new(), Recorder { name, log: log.clone() })
        };
        let panel = recorder(&mut gui, "panel");
        let under = recorder(&mut gui, "under");
        let over = recorder(&mut gui, "over");
        let console = recorder(&mut gui, "console");
        gui.add_child(panel);
        gui.attach(panel, under);
        gui.attach(panel, over);
        gui.add_child(console);
        if let Some(node) = gui.node_mut(console) {
            node.z_order = -9999;
        }
        gui.update(&timing());

        gui.input(&mut InputState::new());
        assert_eq!(*log.borrow(), vec!["console", "panel", "over", "under"]);
    }

    struct EndsStepDuringInput;

    impl Widget for EndsStepDuringInput {
        fn input(&mut self, cx: &mut InputCx<'_>) {
            cx.gui.end_step();
        }
    }

    #[test]
    #[should_panic(expected = "end_step called while a phase is running")]
    fn end_step_inside_a_phase_is_fatal() {
        let mut gui = GuiManager::new();
        let node = gui.create(Node::new(), EndsStepDuringInput);
        gui.add_child(node);
        gui.update(&timing());
        gui.input(&mut InputState::new());
    }
}
