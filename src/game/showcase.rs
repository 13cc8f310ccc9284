//! GUI showcase: a set of demo dialogues and a switcher that swaps between
//! them through the deferred attach/destroy protocol.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;

use super::theme::{coin_animation, Theme};
use super::world3d::SpinningCube;
use super::{Game, GameContext, GameWindowDescriptor};
use crate::gui::animation::TextureAnimation;
use crate::gui::canvas::Rect;
use crate::gui::widget::{UpdateCx, Widget};
use crate::gui::widgets::{Button, Checkbox, DropDown, EditBox, Label, ListBox, Moveable};
use crate::gui::{GuiManager, Node, NodeId, Visual};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialogue {
    Widgets,
    World3d,
    Animation,
}

impl Dialogue {
    pub const ALL: [Dialogue; 3] = [Dialogue::Widgets, Dialogue::World3d, Dialogue::Animation];

    pub fn title(self) -> &'static str {
        match self {
            Dialogue::Widgets => "GUI Showcase",
            Dialogue::World3d => "3D World",
            Dialogue::Animation => "Animation",
        }
    }
}

/// Everything the dialogue builders need, shared with switcher callbacks.
#[derive(Clone)]
pub struct ShowcaseAssets {
    pub theme: Theme,
    pub coin: TextureAnimation,
}

#[derive(Default)]
pub struct Showcase {
    current: Rc<Cell<Option<NodeId>>>,
    switcher: Option<NodeId>,
}

impl Showcase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root of the dialogue currently on screen.
    pub fn current_dialogue(&self) -> Option<NodeId> {
        self.current.get()
    }

    pub fn switcher(&self) -> Option<NodeId> {
        self.switcher
    }

    /// Builds the switcher and the first dialogue under the root.
    pub fn build(&mut self, gui: &mut GuiManager, assets: ShowcaseAssets, window: (i32, i32)) {
        let assets = Rc::new(assets);
        let first = build_dialogue(gui, &assets, Dialogue::Widgets);
        gui.add_child(first);
        self.current.set(Some(first));

        let switcher = build_switcher(gui, Rc::clone(&assets), Rc::clone(&self.current), window);
        gui.add_child(switcher);
        self.switcher = Some(switcher);
    }
}

impl Game for Showcase {
    fn name(&self) -> &str {
        "GUI Showcase"
    }

    fn window_descriptor(&self) -> GameWindowDescriptor {
        GameWindowDescriptor {
            title: Some("Arcadia GUI Showcase".to_owned()),
            ..GameWindowDescriptor::default()
        }
    }

    fn setup(&mut self, cx: &mut GameContext<'_>) -> Result<()> {
        let theme = Theme::load(cx.resources, cx.font);
        let coin = coin_animation(cx.resources);
        self.build(cx.gui, ShowcaseAssets { theme, coin }, cx.window);
        tracing::info!(target: "engine", textures = cx.resources.texture_count(), "showcase ready");
        Ok(())
    }
}

fn build_switcher(
    gui: &mut GuiManager,
    assets: Rc<ShowcaseAssets>,
    current: Rc<Cell<Option<NodeId>>>,
    (window_width, window_height): (i32, i32),
) -> NodeId {
    let theme = assets.theme;
    let container = gui.create(
        Node::at(Rect::new(window_width - 250, window_height - 70, 240, 60))
            .with_texture(theme.panel)
            .with_name("switcher"),
        Moveable::new(0).pinned(),
    );

    let options = Dialogue::ALL.map(Dialogue::title);
    let drop_down = gui.create(
        Node::at(Rect::new(10, 18, 150, 30))
            .with_texture(theme.drop_down)
            .with_name("switcher_select"),
        DropDown::new(theme.font)
            .with_options(options)
            .on_select(|_, _, index, option| {
                tracing::debug!(target: "engine", index, option, "dialogue selected");
            }),
    );
    gui.attach(container, drop_down);

    let go = gui.create(
        Node::at(Rect::new(170, 18, 60, 30))
            .with_texture(theme.button)
            .with_name("switcher_go"),
        Button::new()
            .with_caption(theme.font, "Go", theme.text)
            .on_left_click(move |gui, _| {
                let index = gui
                    .widget::<DropDown>(drop_down)
                    .and_then(DropDown::selected_index)
                    .unwrap_or(0);
                let dialogue = Dialogue::ALL.get(index).copied().unwrap_or(Dialogue::Widgets);
                switch_dialogue(gui, &assets, &current, dialogue);
            }),
    );
    gui.attach(container, go);
    container
}

/// Queues the current dialogue for destruction and attaches a fresh one.
pub fn switch_dialogue(
    gui: &mut GuiManager,
    assets: &ShowcaseAssets,
    current: &Cell<Option<NodeId>>,
    dialogue: Dialogue,
) {
    if let Some(old) = current.get() {
        if let Err(err) = gui.try_set_to_destroy(old) {
            tracing::warn!(target: "engine", %err, "previous dialogue not destroyed");
        }
    }
    let next = build_dialogue(gui, assets, dialogue);
    gui.add_child(next);
    current.set(Some(next));
    tracing::info!(target: "engine", dialogue = dialogue.title(), node = %next, "dialogue switched");
}

pub fn build_dialogue(gui: &mut GuiManager, assets: &ShowcaseAssets, dialogue: Dialogue) -> NodeId {
    match dialogue {
        Dialogue::Widgets => widgets_dialogue(gui, &assets.theme),
        Dialogue::World3d => world_dialogue(gui, &assets.theme),
        Dialogue::Animation => animation_dialogue(gui, assets),
    }
}

fn label(gui: &mut GuiManager, theme: &Theme, rect: Rect, text: &str) -> NodeId {
    gui.create(Node::at(rect), Label::new(theme.font, text).with_color(theme.text))
}

fn log_to(gui: &mut GuiManager, theme: &Theme, list: NodeId, text: &str) {
    let item = label(gui, theme, Rect::new(0, 0, 300, 22), text);
    gui.with_widget(list, |list_box: &mut ListBox, gui| {
        list_box.add_item(gui, list, item);
        list_box.scroll_to_end(gui, list);
    });
}

fn widgets_dialogue(gui: &mut GuiManager, theme: &Theme) -> NodeId {
    let theme = *theme;
    let dialogue = gui.create_node(Node::new().with_name("widgets_dialogue"));

    let intro = label(
        gui,
        &theme,
        Rect::new(10, 10, 300, 32),
        "This is a basic showcase of the GUI Manager system.",
    );
    gui.attach(dialogue, intro);

    let container = gui.create(
        Node::at(Rect::new(10, 40, 600, 400))
            .with_texture(theme.panel)
            .with_name("container"),
        Moveable::new(16),
    );
    gui.attach(dialogue, container);

    let bar = gui.create_node(Node::at(Rect::new(0, 0, 600, 16)).with_texture(theme.bar));
    gui.attach(container, bar);

    let explanation = label(
        gui,
        &theme,
        Rect::new(10, 24, 600, 22),
        "This is a basic container. Click and drag it with the top bar.",
    );
    gui.attach(container, explanation);

    let callback_label = label(
        gui,
        &theme,
        Rect::new(10, 100, 300, 32),
        "This text appears and disappears with a button callback.",
    );
    gui.attach(container, callback_label);

    let list_label = label(
        gui,
        &theme,
        Rect::new(10, 130, 300, 32),
        "This is a basic listbox that you can throw GUI objects into.",
    );
    gui.attach(container, list_label);

    let list = gui.create(
        Node::at(Rect::new(10, 150, 580, 200))
            .with_texture(theme.list)
            .with_name("actions"),
        ListBox::new(4, 2),
    );
    gui.attach(container, list);

    let checkbox = gui.create(
        Node::at(Rect::new(140, 60, 20, 20))
            .with_texture(theme.checkbox)
            .with_name("toggle_enabled"),
        Checkbox::new(theme.check).on_check(move |gui, _, checked| {
            let text = if checked { "Checkbox CHECKED" } else { "Checkbox UNCHECKED" };
            log_to(gui, &theme, list, text);
        }),
    );
    gui.attach(container, checkbox);

    let button = gui.create(
        Node::at(Rect::new(10, 50, 120, 40))
            .with_texture(theme.button)
            .with_name("toggle_label"),
        Button::new()
            .with_caption(theme.font, "Toggle", theme.text)
            .on_left_click(move |gui, _| {
                let enabled = gui
                    .widget::<Checkbox>(checkbox)
                    .is_some_and(|checkbox| !checkbox.is_checked());
                if enabled {
                    let visible = !gui.is_visible(callback_label);
                    gui.set_visible(callback_label, visible);
                }
                log_to(gui, &theme, list, "Button clicked (left)");
            })
            .on_right_click(move |gui, _| {
                log_to(gui, &theme, list, "Button clicked (right)");
            }),
    );
    gui.attach(container, button);

    let edit = gui.create(
        Node::at(Rect::new(180, 56, 250, 28))
            .with_texture(theme.edit)
            .with_name("note"),
        EditBox::new(theme.font)
            .with_color(theme.text)
            .with_max_len(40)
            .on_submit(move |gui, _, text| {
                let line = format!("Entered: {text}");
                log_to(gui, &theme, list, &line);
            }),
    );
    gui.attach(container, edit);

    let clear = gui.create(
        Node::at(Rect::new(450, 56, 120, 28))
            .with_texture(theme.button)
            .with_name("clear_actions"),
        Button::new()
            .with_caption(theme.font, "Clear", theme.text)
            .on_left_click(move |gui, _| {
                gui.with_widget(list, |list_box: &mut ListBox, gui| list_box.clear(gui));
            }),
    );
    gui.attach(container, clear);

    dialogue
}

fn world_dialogue(gui: &mut GuiManager, theme: &Theme) -> NodeId {
    let dialogue = gui.create_node(Node::new().with_name("world_dialogue"));
    let caption = label(
        gui,
        theme,
        Rect::new(10, 10, 400, 32),
        "A cube drawn by its node's 3D render hook.",
    );
    gui.attach(dialogue, caption);

    let cube = gui.create(Node::new().with_name("cube"), SpinningCube::new(theme.text));
    gui.attach(dialogue, cube);
    dialogue
}

/// Counts loops of the node's animation and shows the total in a label.
struct LapCounter {
    label: NodeId,
    laps: u32,
}

impl Widget for LapCounter {
    fn animation_event(&mut self, cx: &mut UpdateCx<'_>, event: &str) {
        if event != "lap" {
            return;
        }
        self.laps += 1;
        let text = format!("Laps: {}", self.laps);
        if let Some(label) = cx.gui.widget_mut::<Label>(self.label) {
            label.set_text(text);
        }
    }
}

fn animation_dialogue(gui: &mut GuiManager, assets: &ShowcaseAssets) -> NodeId {
    let theme = &assets.theme;
    let dialogue = gui.create_node(Node::new().with_name("animation_dialogue"));
    let caption = label(
        gui,
        theme,
        Rect::new(10, 10, 400, 32),
        "A keyframed texture animation.",
    );
    gui.attach(dialogue, caption);

    let laps = label(gui, theme, Rect::new(10, 90, 200, 22), "Laps: 0");
    gui.attach(dialogue, laps);

    let mut coin = assets.coin.clone();
    coin.reset();
    let spinner = gui.create(
        Node::at(Rect::new(20, 40, 32, 32))
            .with_visual(Visual::Animation(coin))
            .with_name("coin"),
        LapCounter { label: laps, laps: 0 },
    );
    gui.attach(dialogue, spinner);
    dialogue
}
