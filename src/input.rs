use bitflags::bitflags;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{Key, NamedKey};

bitflags! {
    /// Held drive keys, snapshotted once per frame so every fixed slice in
    /// that frame sees the same controls.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DriveKeys: u8 {
        const FORWARD = 1 << 0;
        const REVERSE = 1 << 1;
        const STEER_LEFT = 1 << 2;
        const STEER_RIGHT = 1 << 3;
    }
}

/// Aggregates window events into per-frame state: held drive keys, one-shot
/// camera-cycle and click latches, the last cursor position, and pending
/// resizes. `press`/`release` mirror the same paths for headless scripts.
pub struct Input {
    bindings: InputBindings,
    drive: DriveKeys,
    cursor_pos: Option<(f32, f32)>,
    cursor_moved: bool,
    left_clicked: bool,
    cycle_requested: bool,
    pending_resize: Option<PhysicalSize<u32>>,
}

impl Input {
    pub fn new() -> Self {
        Self::with_bindings(InputBindings::default())
    }

    pub fn from_config(path: impl AsRef<Path>) -> Self {
        Self::with_bindings(InputBindings::load_or_default(path))
    }

    fn with_bindings(bindings: InputBindings) -> Self {
        Self {
            bindings,
            drive: DriveKeys::empty(),
            cursor_pos: None,
            cursor_moved: false,
            left_clicked: false,
            cycle_requested: false,
            pending_resize: None,
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                self.apply_key(&event.logical_key, event.state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_pos = Some((position.x as f32, position.y as f32));
                self.cursor_moved = true;
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                if *state == ElementState::Pressed {
                    self.left_clicked = true;
                }
            }
            WindowEvent::Resized(size) => {
                self.pending_resize = Some(*size);
            }
            _ => {}
        }
    }

    /// Headless equivalent of a key-down event; `name` uses the same spelling
    /// as the bindings file ("w", "arrowup", ...).
    pub fn press(&mut self, name: &str) {
        if let Ok(binding) = KeyBinding::from_config_value(name) {
            self.apply_binding(&binding, true);
        }
    }

    pub fn release(&mut self, name: &str) {
        if let Ok(binding) = KeyBinding::from_config_value(name) {
            self.apply_binding(&binding, false);
        }
    }

    pub fn set_cursor(&mut self, x: f32, y: f32) {
        self.cursor_pos = Some((x, y));
        self.cursor_moved = true;
    }

    pub fn click(&mut self) {
        self.left_clicked = true;
    }

    pub fn snapshot(&self) -> DriveKeys {
        self.drive
    }

    pub fn cursor_position(&self) -> Option<(f32, f32)> {
        self.cursor_pos
    }

    pub fn take_cursor_moved(&mut self) -> bool {
        let moved = self.cursor_moved;
        self.cursor_moved = false;
        moved
    }

    pub fn take_click(&mut self) -> bool {
        let clicked = self.left_clicked;
        self.left_clicked = false;
        clicked
    }

    pub fn take_cycle_request(&mut self) -> bool {
        let requested = self.cycle_requested;
        self.cycle_requested = false;
        requested
    }

    pub fn take_resize(&mut self) -> Option<PhysicalSize<u32>> {
        self.pending_resize.take()
    }

    fn apply_key(&mut self, key: &Key, pressed: bool) {
        if let Some(binding) = KeyBinding::from_event_key(key) {
            self.apply_binding(&binding, pressed);
        }
    }

    fn apply_binding(&mut self, binding: &KeyBinding, pressed: bool) {
        let actions: Vec<_> = self.bindings.actions_for_key(binding).collect();
        for action in actions {
            match action {
                InputAction::Forward => self.drive.set(DriveKeys::FORWARD, pressed),
                InputAction::Reverse => self.drive.set(DriveKeys::REVERSE, pressed),
                InputAction::SteerLeft => self.drive.set(DriveKeys::STEER_LEFT, pressed),
                InputAction::SteerRight => self.drive.set(DriveKeys::STEER_RIGHT, pressed),
                InputAction::CycleCamera => {
                    if pressed {
                        self.cycle_requested = true;
                    }
                }
            }
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct InputBindings {
    key_to_actions: HashMap<KeyBinding, Vec<InputAction>>,
}

impl InputBindings {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<InputConfigFile>(&contents) {
                Ok(config) => {
                    Self::with_overrides(config.into_overrides(&path.display().to_string()))
                }
                Err(err) => {
                    eprintln!(
                        "[input] Failed to parse {}: {err}. Falling back to default bindings.",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(err) => {
                eprintln!(
                    "[input] Failed to read {}: {err}. Falling back to default bindings.",
                    path.display()
                );
                Self::default()
            }
        }
    }

    fn with_overrides(overrides: HashMap<InputAction, Vec<KeyBinding>>) -> Self {
        let mut action_map = Self::default_action_map();
        for (action, keys) in overrides {
            if keys.is_empty() {
                continue;
            }
            action_map.insert(action, keys);
        }
        Self::from_action_map(action_map)
    }

    fn default_action_map() -> HashMap<InputAction, Vec<KeyBinding>> {
        use InputAction::*;
        let mut map = HashMap::new();
        map.insert(
            Forward,
            vec![KeyBinding::character("w"), KeyBinding::named(NamedKeyCode::ArrowUp)],
        );
        map.insert(
            Reverse,
            vec![KeyBinding::character("s"), KeyBinding::named(NamedKeyCode::ArrowDown)],
        );
        map.insert(
            SteerLeft,
            vec![KeyBinding::character("a"), KeyBinding::named(NamedKeyCode::ArrowLeft)],
        );
        map.insert(
            SteerRight,
            vec![KeyBinding::character("d"), KeyBinding::named(NamedKeyCode::ArrowRight)],
        );
        map.insert(CycleCamera, vec![KeyBinding::character("c")]);
        map
    }

    fn from_action_map(action_map: HashMap<InputAction, Vec<KeyBinding>>) -> Self {
        let mut key_to_actions: HashMap<KeyBinding, Vec<InputAction>> = HashMap::new();
        for (action, keys) in action_map {
            for key in keys {
                key_to_actions.entry(key).or_default().push(action);
            }
        }
        Self { key_to_actions }
    }

    fn actions_for_key(&self, key: &KeyBinding) -> impl Iterator<Item = InputAction> + '_ {
        self.key_to_actions.get(key).into_iter().flatten().copied()
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::from_action_map(Self::default_action_map())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyBinding {
    Character(String),
    Named(NamedKeyCode),
}

impl KeyBinding {
    fn character(ch: &str) -> Self {
        Self::Character(ch.to_lowercase())
    }

    fn named(named: NamedKeyCode) -> Self {
        Self::Named(named)
    }

    fn from_event_key(key: &Key) -> Option<Self> {
        match key {
            Key::Character(ch) => {
                let s = ch.to_string();
                if s.is_empty() {
                    None
                } else {
                    Some(Self::Character(s.to_lowercase()))
                }
            }
            Key::Named(named) => NamedKeyCode::from_named_key(named).map(Self::Named),
            _ => None,
        }
    }

    fn from_config_value(raw: &str) -> Result<Self, ()> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(());
        }
        if let Some(named) = NamedKeyCode::from_str(&normalized) {
            return Ok(Self::Named(named));
        }
        if normalized.chars().count() == 1 {
            return Ok(Self::Character(normalized));
        }
        Err(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NamedKeyCode {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl NamedKeyCode {
    fn from_named_key(key: &NamedKey) -> Option<Self> {
        match key {
            NamedKey::ArrowUp => Some(Self::ArrowUp),
            NamedKey::ArrowDown => Some(Self::ArrowDown),
            NamedKey::ArrowLeft => Some(Self::ArrowLeft),
            NamedKey::ArrowRight => Some(Self::ArrowRight),
            _ => None,
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "arrowup" | "up" => Some(Self::ArrowUp),
            "arrowdown" | "down" => Some(Self::ArrowDown),
            "arrowleft" | "left" => Some(Self::ArrowLeft),
            "arrowright" | "right" => Some(Self::ArrowRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InputAction {
    Forward,
    Reverse,
    SteerLeft,
    SteerRight,
    CycleCamera,
}

impl InputAction {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "forward" => Some(Self::Forward),
            "reverse" => Some(Self::Reverse),
            "steer_left" => Some(Self::SteerLeft),
            "steer_right" => Some(Self::SteerRight),
            "cycle_camera" => Some(Self::CycleCamera),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputConfigFile {
    #[serde(default)]
    bindings: HashMap<String, Vec<String>>,
}

impl InputConfigFile {
    fn into_overrides(self, origin: &str) -> HashMap<InputAction, Vec<KeyBinding>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let action_key = action_name.trim().to_lowercase();
            match InputAction::from_str(&action_key) {
                Some(action) => {
                    let mut parsed = Vec::new();
                    for key in keys {
                        match KeyBinding::from_config_value(&key) {
                            Ok(binding) => parsed.push(binding),
                            Err(()) => eprintln!(
                                "[input] {origin}: unknown key '{key}' for action '{action_name}', ignoring."
                            ),
                        }
                    }
                    if parsed.is_empty() {
                        eprintln!(
                            "[input] {origin}: action '{action_name}' has no valid keys, keeping defaults."
                        );
                        continue;
                    }
                    overrides.insert(action, parsed);
                }
                None => eprintln!("[input] {origin}: unknown action '{action_name}', ignoring."),
            }
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_track_held_state() {
        let mut input = Input::new();
        input.press("w");
        input.press("a");
        assert_eq!(input.snapshot(), DriveKeys::FORWARD | DriveKeys::STEER_LEFT);
        input.release("w");
        assert_eq!(input.snapshot(), DriveKeys::STEER_LEFT);
    }

    #[test]
    fn arrow_aliases_map_to_the_same_actions() {
        let mut input = Input::new();
        input.press("arrowup");
        assert!(input.snapshot().contains(DriveKeys::FORWARD));
        input.release("up");
        assert!(input.snapshot().is_empty());
    }

    #[test]
    fn cycle_request_is_one_shot() {
        let mut input = Input::new();
        input.press("c");
        assert!(input.take_cycle_request());
        assert!(!input.take_cycle_request());
        // Holding the key does not re-trigger; a fresh press does.
        input.release("c");
        input.press("c");
        assert!(input.take_cycle_request());
    }

    #[test]
    fn click_and_cursor_latches_clear_on_take() {
        let mut input = Input::new();
        input.set_cursor(640.0, 360.0);
        input.click();
        assert!(input.take_cursor_moved());
        assert!(!input.take_cursor_moved());
        assert!(input.take_click());
        assert!(!input.take_click());
        assert_eq!(input.cursor_position(), Some((640.0, 360.0)));
    }

    #[test]
    fn config_overrides_replace_defaults_per_action() {
        let config: InputConfigFile =
            serde_json::from_str(r#"{ "bindings": { "forward": ["i"], "bogus": ["x"] } }"#)
                .expect("parse");
        let bindings = InputBindings::with_overrides(config.into_overrides("test"));
        let mut input = Input::with_bindings(bindings);
        input.press("i");
        assert!(input.snapshot().contains(DriveKeys::FORWARD));
        input.release("i");
        input.press("w");
        assert!(input.snapshot().is_empty());
        // Untouched actions keep their defaults.
        input.press("s");
        assert!(input.snapshot().contains(DriveKeys::REVERSE));
    }
}
