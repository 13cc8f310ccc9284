use std::cell::RefCell;
use std::rc::Rc;

use arcadia::engine::core::FrameTiming;
use arcadia::engine::input::{ButtonState, InputState, Key, MouseButton};
use arcadia::engine::resources::ResourceManager;
use arcadia::game::showcase::{ShowcaseAssets, Showcase};
use arcadia::game::theme::{coin_animation, Theme};
use arcadia::gui::widgets::{Button, Checkbox, DebugConsole, DropDown, EditBox, ListBox, Moveable};
use arcadia::gui::{DrawList, FontId, GuiManager, Node, NodeId, Rect, TextureId};

fn timing() -> FrameTiming {
    FrameTiming::from_delta(1.0 / 60.0)
}

fn press_at(input: &mut InputState, x: i32, y: i32) {
    input.set_mouse_position(x, y);
    input.set_button(MouseButton::Left, ButtonState::Pressed);
}

/// Adds `id` under the root and merges it.
fn mount(gui: &mut GuiManager, id: NodeId) {
    gui.add_child(id);
    gui.update(&timing());
}

#[test]
fn test_checkbox_toggles_and_reports_changes() {
    // 1. Setup a checkbox that records every change
    let mut gui = GuiManager::new();
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    let checkbox = gui.create(
        Node::at(Rect::new(10, 10, 20, 20)).with_texture(TextureId(1)),
        Checkbox::new(TextureId(2)).on_check(move |_, _, checked| sink.borrow_mut().push(checked)),
    );
    mount(&mut gui, checkbox);

    // 2. Click once: checked, and the check mark is drawn over the box
    let mut input = InputState::new();
    press_at(&mut input, 15, 15);
    gui.input(&mut input);
    assert!(gui.widget::<Checkbox>(checkbox).unwrap().is_checked());
    let mut list = DrawList::new();
    gui.render(&mut list);
    assert_eq!(
        list.texture_targets(),
        vec![
            (TextureId(1), Rect::new(10, 10, 20, 20)),
            (TextureId(2), Rect::new(10, 10, 20, 20)),
        ]
    );

    // 3. A press outside does nothing
    input.advance_frame();
    press_at(&mut input, 100, 100);
    gui.input(&mut input);
    assert!(gui.widget::<Checkbox>(checkbox).unwrap().is_checked());

    // 4. Click again: unchecked
    input.advance_frame();
    press_at(&mut input, 15, 15);
    gui.input(&mut input);
    assert_eq!(*changes.borrow(), vec![true, false]);

    // 5. Setting the current state again does not fire
    gui.with_widget(checkbox, |widget: &mut Checkbox, gui| {
        widget.set_checked(gui, checkbox, false)
    });
    assert_eq!(changes.borrow().len(), 2);
}

#[test]
fn test_list_box_stacks_hides_and_scrolls() {
    // 1. Setup a list that fits two and a half items
    let mut gui = GuiManager::new();
    let list = gui.create(Node::at(Rect::new(0, 0, 100, 60)), ListBox::new(4, 2));
    mount(&mut gui, list);

    let items: Vec<NodeId> = (0..3)
        .map(|_| gui.create_node(Node::at(Rect::new(0, 0, 80, 20))))
        .collect();
    for &item in &items {
        gui.with_widget(list, |list_box: &mut ListBox, gui| list_box.add_item(gui, list, item));
    }
    assert_eq!(gui.pending_children(list), items.as_slice());

    // 2. Items are stacked with padding and spacing; the third does not fit
    gui.update(&timing());
    let ys: Vec<i32> = items.iter().map(|&item| gui.node(item).unwrap().y).collect();
    assert_eq!(ys, vec![4, 26, 48]);
    let visible: Vec<bool> = items.iter().map(|&item| gui.is_visible(item)).collect();
    assert_eq!(visible, vec![true, true, false]);

    // 3. Scrolling down clamps to the end and reveals the last item
    let mut input = InputState::new();
    input.set_mouse_position(50, 30);
    input.add_wheel(-1.0);
    gui.input(&mut input);
    gui.update(&timing());
    assert_eq!(gui.widget::<ListBox>(list).unwrap().scroll(), 14);
    let visible: Vec<bool> = items.iter().map(|&item| gui.is_visible(item)).collect();
    assert_eq!(visible, vec![false, true, true]);

    // 4. Clearing destroys every item at the end of the step
    gui.with_widget(list, |list_box: &mut ListBox, gui| list_box.clear(gui));
    gui.end_step();
    gui.update(&timing());
    assert!(items.iter().all(|&item| !gui.contains(item)));
    assert!(gui.children(list).is_empty());
    assert!(gui.widget::<ListBox>(list).unwrap().items().is_empty());
}

#[test]
fn test_list_box_clear_waits_for_unmerged_items() {
    let mut gui = GuiManager::new();
    let list = gui.create(Node::at(Rect::new(0, 0, 100, 100)), ListBox::default());
    mount(&mut gui, list);

    // 1. Add and clear in the same frame
    let item = gui.create_node(Node::at(Rect::new(0, 0, 80, 20)));
    gui.with_widget(list, |list_box: &mut ListBox, gui| {
        list_box.add_item(gui, list, item);
        list_box.clear(gui);
    });
    assert!(gui.destroy_list().is_empty());

    // 2. The next update merges it; the one after destroys it
    gui.update(&timing());
    gui.update(&timing());
    assert_eq!(gui.destroy_list(), &[item]);
    gui.end_step();
    assert!(!gui.contains(item));
}

#[test]
fn test_drop_down_expands_and_selects() {
    // 1. Setup a drop-down with three options
    let mut gui = GuiManager::new();
    let picked = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&picked);
    let drop_down = gui.create(
        Node::at(Rect::new(10, 10, 100, 20)),
        DropDown::new(FontId(0))
            .with_options(["a", "b", "c"])
            .on_select(move |_, _, index, option| *sink.borrow_mut() = Some((index, option.to_owned()))),
    );
    mount(&mut gui, drop_down);
    assert_eq!(gui.widget::<DropDown>(drop_down).unwrap().selected(), Some("a"));

    // 2. Clicking the header opens it
    let mut input = InputState::new();
    press_at(&mut input, 20, 15);
    gui.input(&mut input);
    assert!(gui.widget::<DropDown>(drop_down).unwrap().is_expanded());

    // 3. Clicking the third row selects it and closes the list
    input.advance_frame();
    press_at(&mut input, 20, 75);
    gui.input(&mut input);
    let widget = gui.widget::<DropDown>(drop_down).unwrap();
    assert!(!widget.is_expanded());
    assert_eq!(widget.selected_index(), Some(2));
    assert_eq!(*picked.borrow(), Some((2, "c".to_owned())));

    // 4. Out-of-range selections are ignored
    gui.widget_mut::<DropDown>(drop_down).unwrap().set_selected(9);
    assert_eq!(gui.widget::<DropDown>(drop_down).unwrap().selected(), Some("c"));
}

#[test]
fn test_edit_box_focus_typing_and_submit() {
    // 1. Setup an edit box that records submissions
    let mut gui = GuiManager::new();
    let submitted = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&submitted);
    let edit = gui.create(
        Node::at(Rect::new(0, 0, 200, 30)),
        EditBox::new(FontId(0))
            .with_max_len(4)
            .on_submit(move |_, _, text| sink.borrow_mut().push(text.to_owned())),
    );
    mount(&mut gui, edit);

    // 2. Typing without focus is ignored
    let mut input = InputState::new();
    input.push_text("x");
    gui.input(&mut input);
    assert_eq!(gui.widget::<EditBox>(edit).unwrap().text(), "");

    // 3. Click to focus, then type past the limit
    input.advance_frame();
    press_at(&mut input, 10, 10);
    input.push_text("hello");
    gui.input(&mut input);
    let widget = gui.widget::<EditBox>(edit).unwrap();
    assert!(widget.is_focused());
    assert_eq!(widget.text(), "hell");

    // 4. Backspace then enter submits
    input.advance_frame();
    input.set_key(Key::Backspace, true);
    gui.input(&mut input);
    input.set_key(Key::Backspace, false);
    input.advance_frame();
    input.set_key(Key::Enter, true);
    gui.input(&mut input);
    assert_eq!(*submitted.borrow(), vec!["hel".to_owned()]);

    // 5. The focused box shows a cursor
    let mut list = DrawList::new();
    gui.render(&mut list);
    assert_eq!(list.texts(), vec!["hel_"]);

    // 6. Clicking elsewhere drops focus
    input.advance_frame();
    press_at(&mut input, 300, 300);
    gui.input(&mut input);
    assert!(!gui.widget::<EditBox>(edit).unwrap().is_focused());
}

#[test]
fn test_moveable_drags_relative_to_parent() {
    // 1. Setup a moveable container inside an offset panel
    let mut gui = GuiManager::new();
    let panel = gui.create_node(Node::at(Rect::new(100, 100, 400, 400)));
    let window = gui.create(Node::at(Rect::new(10, 10, 200, 100)), Moveable::new(16));
    gui.add_child(panel);
    gui.attach(panel, window);
    gui.update(&timing());

    // 2. Grab the bar
    let mut input = InputState::new();
    press_at(&mut input, 120, 115);
    gui.input(&mut input);
    assert!(gui.widget::<Moveable>(window).unwrap().is_dragging());
    assert_eq!(gui.node(window).unwrap().rect(), Rect::new(10, 10, 200, 100));

    // 3. Move while held
    input.advance_frame();
    input.set_mouse_position(220, 215);
    gui.input(&mut input);
    assert_eq!(gui.node(window).unwrap().rect(), Rect::new(110, 110, 200, 100));

    // 4. Release ends the drag
    input.set_button(MouseButton::Left, ButtonState::Unpressed);
    input.set_mouse_position(0, 0);
    gui.input(&mut input);
    assert!(!gui.widget::<Moveable>(window).unwrap().is_dragging());
    assert_eq!(gui.node(window).unwrap().x, 110);

    // 5. A pinned container ignores the bar
    gui.widget_mut::<Moveable>(window).unwrap().set_moveable(false);
    input.advance_frame();
    press_at(&mut input, 215, 215);
    gui.input(&mut input);
    assert!(!gui.widget::<Moveable>(window).unwrap().is_dragging());
}

#[test]
fn test_debug_console_drives_gui_with_simulated_input() {
    // 1. Setup a console and a named button
    let mut gui = GuiManager::new();
    let console = gui.create(
        DebugConsole::node(800, 600),
        DebugConsole::new(FontId(0)).with_builtin_commands(),
    );
    let clicks = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&clicks);
    let button = gui.create(
        Node::at(Rect::new(300, 400, 100, 40)).with_name("target"),
        Button::new().on_left_click(move |_, _| *counter.borrow_mut() += 1),
    );
    gui.add_child(console);
    mount(&mut gui, button);
    assert_eq!(gui.children(gui.base_node()), &[button, console]);

    // 2. Move the cursor over the button by name
    let mut input = InputState::new();
    let moved = gui.with_widget(console, |console: &mut DebugConsole, gui| {
        console.run_command(gui, &mut input, "MOVE_MOUSE_OVER target")
    });
    assert_eq!(moved, Some(true));
    assert_eq!(input.mouse_position(), (350, 420));

    // 3. A simulated click lands on the next frame, then releases
    gui.with_widget(console, |console: &mut DebugConsole, gui| {
        console.run_command(gui, &mut input, "CLICK_MOUSE_LEFT")
    });
    gui.input(&mut input);
    assert_eq!(*clicks.borrow(), 0);
    input.advance_frame();
    gui.input(&mut input);
    assert_eq!(*clicks.borrow(), 1);
    input.advance_frame();
    assert_eq!(input.button(MouseButton::Left), ButtonState::Unpressed);

    // 4. Unknown commands and names are reported
    gui.with_widget(console, |console: &mut DebugConsole, gui| {
        assert!(!console.run_command(gui, &mut input, "FLY away"));
        assert!(!console.run_command(gui, &mut input, "MOVE_MOUSE_OVER nobody"));
        let lines: Vec<&str> = console.lines().collect();
        assert!(lines.contains(&"unknown command 'FLY'"));
        assert!(lines.contains(&"no node named 'nobody'"));
    });

    // 5. Grave opens the console and typed lines run on enter
    input.set_key(Key::Grave, true);
    assert!(DebugConsole::handle_toggle(&mut gui, console, &input));
    assert!(gui.is_visible(console));
    input.push_text("ENTER_TEXT hi`");
    gui.input(&mut input);
    assert_eq!(gui.widget::<DebugConsole>(console).unwrap().pending_line(), "ENTER_TEXT hi");

    input.set_key(Key::Grave, false);
    input.advance_frame();
    input.set_key(Key::Enter, true);
    gui.input(&mut input);
    let widget = gui.widget::<DebugConsole>(console).unwrap();
    assert_eq!(widget.pending_line(), "");
    assert!(widget.lines().any(|line| line == "> ENTER_TEXT hi"));
    input.advance_frame();
    assert_eq!(input.text(), "hi");
}

#[test]
fn test_showcase_switches_dialogue_through_deferred_lifecycle() {
    // 1. Build the showcase with generated theme textures
    let mut gui = GuiManager::new();
    let mut resources = ResourceManager::new("does/not/exist");
    let theme = Theme::load(&mut resources, FontId(0));
    let coin = coin_animation(&mut resources);
    let mut showcase = Showcase::new();
    showcase.build(&mut gui, ShowcaseAssets { theme, coin }, (1280, 720));
    gui.update(&timing());

    let old = showcase.current_dialogue().unwrap();
    assert_eq!(gui.find_by_name("widgets_dialogue"), Some(old));
    assert!(gui.find_by_name("toggle_label").is_some());

    // 2. Pick the 3D dialogue and press Go
    let select = gui.find_by_name("switcher_select").unwrap();
    gui.widget_mut::<DropDown>(select).unwrap().set_selected(1);
    let (x, y) = gui.click_position("switcher_go").unwrap();
    assert_eq!((x, y), (1230, 683));
    let mut input = InputState::new();
    press_at(&mut input, x, y);
    gui.input(&mut input);

    // 3. The old dialogue is flagged, the new one is still pending
    let new = showcase.current_dialogue().unwrap();
    assert_ne!(new, old);
    assert!(gui.node(old).unwrap().is_set_to_destroy());
    assert_eq!(gui.destroy_list().first(), Some(&old));
    assert_eq!(gui.pending_children(gui.base_node()), &[new]);
    assert_eq!(gui.find_by_name("world_dialogue"), None);

    // 4. Update merges the new dialogue; rendering shows its cube
    gui.update(&timing());
    assert_eq!(gui.find_by_name("world_dialogue"), Some(new));
    let mut list = DrawList::new();
    gui.render_3d(&mut list);
    assert_eq!(list.cubes().len(), 1);

    // 5. end_step frees the old dialogue and all of its widgets
    gui.end_step();
    assert!(!gui.contains(old));
    assert_eq!(gui.find_by_name("toggle_label"), None);
    assert!(gui.children(gui.base_node()).contains(&new));
}

#[test]
fn test_overlapping_buttons_topmost_takes_the_click() {
    // 1. Setup two buttons on the same spot; the later one draws on top
    let mut gui = GuiManager::new();
    let fired = Rc::new(RefCell::new(Vec::new()));
    let button = |gui: &mut GuiManager, texture: u32, name: &'static str| {
        let sink = Rc::clone(&fired);
        gui.create(
            Node::at(Rect::new(0, 0, 100, 100)).with_texture(TextureId(texture)),
            Button::new().on_left_click(move |_, _| sink.borrow_mut().push(name)),
        )
    };
    let under = button(&mut gui, 1, "under");
    let over = button(&mut gui, 2, "over");
    gui.add_child(under);
    gui.add_child(over);
    gui.update(&timing());

    let mut list = DrawList::new();
    gui.render(&mut list);
    let textures: Vec<TextureId> = list.texture_targets().into_iter().map(|(id, _)| id).collect();
    assert_eq!(textures, vec![TextureId(1), TextureId(2)]);

    // 2. A press on the overlap fires only the button drawn on top
    let mut input = InputState::new();
    press_at(&mut input, 50, 50);
    gui.input(&mut input);
    assert_eq!(*fired.borrow(), vec!["over"]);
}

#[test]
fn test_open_console_blocks_clicks_to_widgets_beneath() {
    // 1. Setup a button under the console area
    let mut gui = GuiManager::new();
    let console = gui.create(DebugConsole::node(800, 600), DebugConsole::new(FontId(0)));
    let clicks = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&clicks);
    let button = gui.create(
        Node::at(Rect::new(10, 10, 100, 40)),
        Button::new().on_left_click(move |_, _| *counter.borrow_mut() += 1),
    );
    gui.add_child(button);
    mount(&mut gui, console);

    // 2. While hidden, the console lets the click through
    let mut input = InputState::new();
    press_at(&mut input, 50, 30);
    gui.input(&mut input);
    assert_eq!(*clicks.borrow(), 1);

    // 3. Once open, it takes the press itself
    input.set_key(Key::Grave, true);
    assert!(DebugConsole::handle_toggle(&mut gui, console, &input));
    input.advance_frame();
    input.set_button(MouseButton::Left, ButtonState::Unpressed);
    press_at(&mut input, 50, 30);
    gui.input(&mut input);
    assert_eq!(*clicks.borrow(), 1);
    assert_eq!(input.button(MouseButton::Left), ButtonState::PressedTaken);
}
