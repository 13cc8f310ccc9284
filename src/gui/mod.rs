//! Retained-mode GUI tree.
//!
//! [`GuiManager`] owns every node in an arena and drives the per-frame
//! phases. Structural edits made while a phase is running are staged and
//! applied at well-defined points, so callbacks can attach and destroy nodes
//! freely from inside input and update.

pub mod animation;
pub mod canvas;
pub mod error;
pub mod manager;
pub mod node;
pub mod widget;
pub mod widgets;

pub use canvas::{Canvas, Canvas3d, Color, Cube, DrawCommand, DrawList, FontId, Rect, TextAnchor, TextureId};
pub use error::GuiError;
pub use manager::GuiManager;
pub use node::{Node, NodeId, Visual};
pub use widget::{InputCx, Panel, RenderCx, UpdateCx, Widget};
