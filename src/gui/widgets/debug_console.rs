//! Drop-down developer console.
//!
//! Hidden by default and toggled with the grave key. Each submitted line is
//! split into a command word and the rest; the rest is handed to whatever
//! callback is registered for that word.

use std::collections::{HashMap, VecDeque};

use crate::engine::input::{InputState, Key, MouseButton};
use crate::gui::canvas::{Color, FontId, Rect, TextAnchor};
use crate::gui::widget::{InputCx, RenderCx, Widget};
use crate::gui::{GuiManager, Node, NodeId};

pub const CONSOLE_Z_ORDER: i32 = -9999;

const SCROLLBACK: usize = 128;
const LINE_HEIGHT: i32 = 18;
const PROMPT_HEIGHT: i32 = 26;
const TEXT_PADDING: i32 = 10;

/// Everything a console command may touch.
pub struct DebugCommandCx<'a> {
    pub gui: &'a mut GuiManager,
    pub input: &'a mut InputState,
    /// Text after the command word, without the separating space.
    pub args: &'a str,
    output: Vec<String>,
}

impl DebugCommandCx<'_> {
    /// Adds a line to the console scrollback.
    pub fn print(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }
}

type DebugCommand = Box<dyn FnMut(&mut DebugCommandCx<'_>) -> bool>;

pub struct DebugConsole {
    font: FontId,
    line: String,
    scrollback: VecDeque<String>,
    commands: HashMap<String, DebugCommand>,
    background: Color,
    border: Color,
    text_color: Color,
}

impl DebugConsole {
    pub fn new(font: FontId) -> Self {
        Self {
            font,
            line: String::new(),
            scrollback: VecDeque::new(),
            commands: HashMap::new(),
            background: Color::rgba(0.1, 0.1, 0.1, 0.8),
            border: Color::BLACK,
            text_color: Color::WHITE,
        }
    }

    /// Base node for a console covering the top half of a window.
    pub fn node(window_width: i32, window_height: i32) -> Node {
        Node::at(Rect::new(0, 0, window_width, window_height / 2))
            .with_name("debug_console")
            .with_z_order(CONSOLE_Z_ORDER)
            .hidden()
    }

    /// Adds the scripting commands that drive the GUI through simulated input:
    /// `MOVE_MOUSE_OVER <name>`, `CLICK_MOUSE_LEFT`, `CLICK_MOUSE_MIDDLE`,
    /// `CLICK_MOUSE_RIGHT` and `ENTER_TEXT <text>`.
    pub fn with_builtin_commands(mut self) -> Self {
        self.add_debug_command("MOVE_MOUSE_OVER", |cx| {
            match cx.gui.click_position(cx.args.trim()) {
                Some((x, y)) => {
                    cx.input.set_mouse_position(x, y);
                    true
                }
                None => {
                    let message = format!("no node named '{}'", cx.args.trim());
                    cx.print(message);
                    false
                }
            }
        });
        for (command, button) in [
            ("CLICK_MOUSE_LEFT", MouseButton::Left),
            ("CLICK_MOUSE_MIDDLE", MouseButton::Middle),
            ("CLICK_MOUSE_RIGHT", MouseButton::Right),
        ] {
            self.add_debug_command(command, move |cx| {
                cx.input.simulate_click(button);
                true
            });
        }
        self.add_debug_command("ENTER_TEXT", |cx| {
            cx.input.queue_text(cx.args);
            true
        });
        self
    }

    pub fn add_debug_command(
        &mut self,
        command: impl Into<String>,
        callback: impl FnMut(&mut DebugCommandCx<'_>) -> bool + 'static,
    ) {
        self.commands.insert(command.into(), Box::new(callback));
    }

    pub fn has_command(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    pub fn add_line(&mut self, line: impl Into<String>) {
        if self.scrollback.len() == SCROLLBACK {
            self.scrollback.pop_front();
        }
        self.scrollback.push_back(line.into());
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.scrollback.iter().map(String::as_str)
    }

    /// The line being typed.
    pub fn pending_line(&self) -> &str {
        &self.line
    }

    /// Runs one command line. Returns false for unknown commands and for
    /// commands that report failure.
    pub fn run_command(&mut self, gui: &mut GuiManager, input: &mut InputState, line: &str) -> bool {
        let line = line.trim();
        let (command, args) = line.split_once(' ').unwrap_or((line, ""));
        self.add_line(format!("> {line}"));

        let Some(callback) = self.commands.get_mut(command) else {
            tracing::debug!(target: "gui", command, "unknown console command");
            self.add_line(format!("unknown command '{command}'"));
            return false;
        };
        let mut cx = DebugCommandCx {
            gui,
            input,
            args,
            output: Vec::new(),
        };
        let ok = callback(&mut cx);
        tracing::debug!(target: "gui", command, args, ok, "console command");
        for line in cx.output {
            self.add_line(line);
        }
        ok
    }

    /// Flips the console's visibility on a grave press. Call before the
    /// input phase; a hidden console gets no input of its own.
    pub fn handle_toggle(gui: &mut GuiManager, console: NodeId, input: &InputState) -> bool {
        if !input.key_pressed(Key::Grave) {
            return false;
        }
        let visible = !gui.is_visible(console);
        gui.set_visible(console, visible);
        gui.with_widget(console, |console: &mut DebugConsole, _| console.line.clear());
        tracing::debug!(target: "gui", visible, "console toggled");
        true
    }
}

impl Widget for DebugConsole {
    fn input(&mut self, cx: &mut InputCx<'_>) {
        // The open console covers the widgets under it.
        if cx.hovered() {
            for button in MouseButton::ALL {
                cx.input.take_button(button);
            }
        }

        if cx.input.key_pressed(Key::Backspace) {
            self.line.pop();
        } else if cx.input.key_pressed(Key::Enter) {
            if !self.line.trim().is_empty() {
                let line = std::mem::take(&mut self.line);
                self.run_command(cx.gui, cx.input, &line);
            }
        } else {
            self.line
                .extend(cx.input.text().chars().filter(|&c| c != '`'));
        }
    }

    fn render(&self, cx: &mut RenderCx<'_>) {
        let rect = cx.rect();
        cx.canvas.fill_rect(rect, self.background);
        cx.draw_visual();
        cx.canvas.stroke_rect(rect.inset(1, 1), self.border, 3);

        let prompt = Rect::new(rect.x, rect.y + rect.height - PROMPT_HEIGHT, rect.width, PROMPT_HEIGHT);
        cx.canvas.stroke_rect(prompt, self.border, 3);
        if !self.line.is_empty() {
            let anchor = TextAnchor::TopLeft {
                x: prompt.x + TEXT_PADDING,
                y: prompt.y + 5,
            };
            cx.canvas.draw_text(self.font, &self.line, anchor, self.text_color);
        }

        let mut y = prompt.y - LINE_HEIGHT;
        for line in self.scrollback.iter().rev() {
            if y < rect.y {
                break;
            }
            let anchor = TextAnchor::TopLeft {
                x: rect.x + TEXT_PADDING,
                y,
            };
            cx.canvas.draw_text(self.font, line, anchor, self.text_color);
            y -= LINE_HEIGHT;
        }
    }
}
