//! Leaf widgets built on the base node walk.

pub mod button;
pub mod checkbox;
pub mod debug_console;
pub mod drop_down;
pub mod edit_box;
pub mod label;
pub mod list_box;
pub mod moveable;

use super::{GuiManager, NodeId};

pub use button::Button;
pub use checkbox::Checkbox;
pub use debug_console::{DebugCommandCx, DebugConsole};
pub use drop_down::DropDown;
pub use edit_box::EditBox;
pub use label::Label;
pub use list_box::ListBox;
pub use moveable::Moveable;

/// Callback fired with the manager and the node that raised it.
pub type NodeCallback = Box<dyn FnMut(&mut GuiManager, NodeId)>;
