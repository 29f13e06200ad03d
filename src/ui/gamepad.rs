/// Gamepad input via gilrs, driving one player kind (`[gamepad] player`).
///
///   D-pad / left stick  →  walk left/right, jump on up
///   A / B               →  jump
///   Start               →  confirm (prompt default)
///   Select              →  cancel (answer no, or ask to quit)
///   Y                   →  restart level
///
/// Walking follows the held direction; the pad reports real releases,
/// unlike the terminal. Everything else is edge-triggered.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Face and menu buttons that can be bound in the config.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
    Start,
    Select,
}

impl Btn {
    const COUNT: usize = 6;

    fn from_name(s: &str) -> Option<Btn> {
        match s.to_ascii_lowercase().as_str() {
            "a" => Some(Btn::A),
            "b" => Some(Btn::B),
            "x" => Some(Btn::X),
            "y" => Some(Btn::Y),
            "start" => Some(Btn::Start),
            "select" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        Some(match btn {
            Button::South => Btn::A,
            Button::East => Btn::B,
            Button::West => Btn::X,
            Button::North => Btn::Y,
            Button::Start => Btn::Start,
            Button::Select => Btn::Select,
            _ => return None,
        })
    }
}

/// Button names from the config; unknown names are logged and dropped.
fn parse_buttons(names: &[String]) -> Vec<Btn> {
    names
        .iter()
        .filter_map(|s| {
            let btn = Btn::from_name(s);
            if btn.is_none() {
                log::warn!("gamepad: unknown button name {s:?}");
            }
            btn
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default)]
struct Key {
    held: bool,
    fresh: bool,
}

impl Key {
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set(&mut self, held: bool) {
        self.fresh |= held && !self.held;
        self.held = held;
    }
}

/// Directions the d-pad and stick report.
#[derive(Clone, Copy)]
enum Dir {
    Up,
    Left,
    Right,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    jump: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump: vec![Btn::A, Btn::B],
            confirm: vec![Btn::Start],
            cancel: vec![Btn::Select],
            restart: vec![Btn::Y],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [Key; Btn::COUNT],
    dpad: [Key; 3],
    stick: [Key; 3],
    stick_xy: (f32, f32),

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let any = g.gamepads().next().is_some();
                (Some(g), any)
            }
            Err(e) => {
                log::info!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [Key::default(); Btn::COUNT],
            dpad: [Key::default(); 3],
            stick: [Key::default(); 3],
            stick_xy: (0.0, 0.0),
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Replace default bindings with the configured ones. An action whose
    /// list parses to nothing keeps its default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        let slots = [
            (&mut self.action_map.jump, &cfg.jump),
            (&mut self.action_map.confirm, &cfg.confirm),
            (&mut self.action_map.cancel, &cfg.cancel),
            (&mut self.action_map.restart, &cfg.restart),
        ];
        for (slot, names) in slots {
            let btns = parse_buttons(names);
            if !btns.is_empty() {
                *slot = btns;
            }
        }
    }

    /// Once per frame: forget last frame's edges, then poll.
    pub fn update(&mut self) {
        for k in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            k.fresh = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll();
    }

    #[cfg(feature = "gamepad")]
    fn poll(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else { return };
        let events: Vec<EventType> = std::iter::from_fn(|| gilrs.next_event()).map(|e| e.event).collect();

        for event in events {
            match event {
                EventType::ButtonPressed(b, _) => self.button(b, true),
                EventType::ButtonReleased(b, _) => self.button(b, false),
                EventType::AxisChanged(Axis::LeftStickX, v, _) => self.stick_xy.0 = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => self.stick_xy.1 = v,
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        let (x, y) = self.stick_xy;
        self.stick[Dir::Up as usize].set(y > STICK_DEADZONE);
        self.stick[Dir::Left as usize].set(x < -STICK_DEADZONE);
        self.stick[Dir::Right as usize].set(x > STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn button(&mut self, b: Button, held: bool) {
        self.connected = true;
        let dir = match b {
            Button::DPadUp => Some(Dir::Up),
            Button::DPadLeft => Some(Dir::Left),
            Button::DPadRight => Some(Dir::Right),
            _ => None,
        };
        if let Some(d) = dir {
            self.dpad[d as usize].set(held);
        } else if let Some(btn) = Btn::from_gilrs(b) {
            self.buttons[btn as usize].set(held);
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [Key::default(); Btn::COUNT];
        self.dpad = [Key::default(); 3];
        self.stick = [Key::default(); 3];
        self.stick_xy = (0.0, 0.0);
    }

    // ── Queries ──

    fn fresh(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].fresh)
    }

    fn dir(&self, d: Dir) -> Key {
        let (p, s) = (self.dpad[d as usize], self.stick[d as usize]);
        Key { held: p.held || s.held, fresh: p.fresh || s.fresh }
    }

    /// Jump button, or a fresh up on the d-pad or stick.
    pub fn jump_pressed(&self) -> bool {
        self.fresh(&self.action_map.jump) || self.dir(Dir::Up).fresh
    }

    pub fn confirm_pressed(&self) -> bool {
        self.fresh(&self.action_map.confirm)
    }

    pub fn cancel_pressed(&self) -> bool {
        self.fresh(&self.action_map.cancel)
    }

    pub fn restart_pressed(&self) -> bool {
        self.fresh(&self.action_map.restart)
    }

    /// Held walking direction: -1, 0 or +1. Both sides cancel out.
    pub fn walk_dir(&self) -> i32 {
        self.dir(Dir::Right).held as i32 - self.dir(Dir::Left).held as i32
    }
}
