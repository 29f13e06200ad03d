/// Input state tracker and key bindings.
///
/// Tracks which keys are currently held down, enabling:
///   - Walking one cell per Press/Repeat event, so a tap walks once and
///     the terminal's key repeat keeps a held key walking
///   - Edge-triggered jumps and prompt answers (initial press only)
///
/// Terminals rarely report key releases, so a key counts as released
/// once no Press/Repeat event has arrived for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::ControlConfig;
use crate::domain::catalog::Catalog;
use crate::domain::kind::KindId;

/// After this duration without a Press/Repeat event, consider the key released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// `drain_events()` call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.begin_frame();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    fn record(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        self.raw_events.push(key);
        let was_held = self.is_held(key.code);
        self.last_active.insert(key.code, Instant::now());
        if !was_held {
            self.fresh_presses.push(key.code);
        }
    }

    fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

// ══════════════════════════════════════════════════════════════
// Key bindings
// ══════════════════════════════════════════════════════════════

/// Keyboard bindings resolved against the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerKeys {
    pub kind: KindId,
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
    pub jump: Vec<KeyCode>,
}

impl PlayerKeys {
    /// One walk step per left/right key event of this frame, in arrival
    /// order: -1 for left, +1 for right.
    pub fn walk_steps(&self, input: &InputState) -> Vec<i32> {
        input
            .raw_events
            .iter()
            .filter(|k| !k.modifiers.contains(KeyModifiers::CONTROL))
            .filter_map(|k| {
                if self.left.contains(&k.code) {
                    Some(-1)
                } else if self.right.contains(&k.code) {
                    Some(1)
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Parse a key name from the config. A single character binds that
/// character; longer names bind special keys (case-insensitive).
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    match name.to_lowercase().as_str() {
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "space" => Some(KeyCode::Char(' ')),
        "enter" | "return" => Some(KeyCode::Enter),
        "tab" => Some(KeyCode::Tab),
        "backspace" => Some(KeyCode::Backspace),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        _ => None,
    }
}

fn parse_keys(player: char, names: &[String]) -> Vec<KeyCode> {
    names
        .iter()
        .filter_map(|n| {
            let key = parse_key(n);
            if key.is_none() {
                log::warn!("controls for '{player}': unknown key name {n:?}");
            }
            key
        })
        .collect()
}

/// Resolve `[[controls]]` entries. Entries naming a symbol that is not a
/// player kind are skipped with a warning.
pub fn resolve_bindings(controls: &[ControlConfig], catalog: &Catalog) -> Vec<PlayerKeys> {
    controls
        .iter()
        .filter_map(|c| {
            let kind = catalog.by_symbol(c.player).filter(|&k| catalog.kind(k).is_player());
            if kind.is_none() {
                log::warn!("controls: '{}' is not a player kind, skipped", c.player);
            }
            Some(PlayerKeys {
                kind: kind?,
                left: parse_keys(c.player, &c.left),
                right: parse_keys(c.player, &c.right),
                jump: parse_keys(c.player, &c.jump),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(player: char, left: &[&str], right: &[&str], jump: &[&str]) -> ControlConfig {
        let v = |s: &[&str]| s.iter().map(|x| x.to_string()).collect();
        ControlConfig { player, left: v(left), right: v(right), jump: v(jump) }
    }

    #[test]
    fn single_characters_bind_themselves() {
        assert_eq!(parse_key("h"), Some(KeyCode::Char('h')));
        assert_eq!(parse_key(","), Some(KeyCode::Char(',')));
        assert_eq!(parse_key("H"), Some(KeyCode::Char('H')));
    }

    #[test]
    fn named_keys() {
        assert_eq!(parse_key("Left"), Some(KeyCode::Left));
        assert_eq!(parse_key("SPACE"), Some(KeyCode::Char(' ')));
        assert_eq!(parse_key("enter"), Some(KeyCode::Enter));
        assert_eq!(parse_key("hyperspace"), None);
        assert_eq!(parse_key(""), None);
    }

    #[test]
    fn bindings_resolve_to_player_kinds() {
        let catalog = Catalog::standard();
        let keys = resolve_bindings(&[control('o', &["h", "Left"], &["n"], &["c"])], &catalog);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].kind, catalog.by_symbol('o').unwrap());
        assert_eq!(keys[0].left, vec![KeyCode::Char('h'), KeyCode::Left]);
        assert_eq!(keys[0].jump, vec![KeyCode::Char('c')]);
    }

    #[test]
    fn non_player_symbols_are_skipped() {
        let catalog = Catalog::standard();
        let keys = resolve_bindings(
            &[control('#', &["h"], &["n"], &["c"]), control('Q', &["a"], &["e"], &[","])],
            &catalog,
        );
        assert!(keys.is_empty());
    }

    #[test]
    fn unknown_key_names_are_dropped() {
        let catalog = Catalog::standard();
        let keys = resolve_bindings(&[control('a', &["a", "nope"], &["e"], &[","])], &catalog);
        assert_eq!(keys[0].left, vec![KeyCode::Char('a')]);
    }

    fn o_keys() -> PlayerKeys {
        resolve_bindings(&[control('o', &["h"], &["n"], &["c"])], &Catalog::standard()).remove(0)
    }

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn a_tap_walks_exactly_once() {
        let keys = o_keys();
        let mut input = InputState::new();
        input.begin_frame();
        input.record(press('n'));
        assert_eq!(keys.walk_steps(&input), vec![1]);

        // The key still counts as held, but no new event means no new step.
        for _ in 0..3 {
            input.begin_frame();
            assert!(input.is_held(KeyCode::Char('n')));
            assert!(keys.walk_steps(&input).is_empty());
        }
    }

    #[test]
    fn key_repeat_keeps_walking() {
        let keys = o_keys();
        let mut input = InputState::new();
        input.begin_frame();
        input.record(press('h'));
        input.record(KeyEvent::new_with_kind(KeyCode::Char('h'), KeyModifiers::NONE, KeyEventKind::Repeat));
        input.record(KeyEvent::new_with_kind(KeyCode::Char('h'), KeyModifiers::NONE, KeyEventKind::Release));
        input.record(press('c'));
        assert_eq!(keys.walk_steps(&input), vec![-1, -1]);
        assert!(input.any_pressed(&keys.jump));
    }

    #[test]
    fn control_chords_do_not_walk() {
        let keys = o_keys();
        let mut input = InputState::new();
        input.record(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL));
        assert!(keys.walk_steps(&input).is_empty());
    }

    #[test]
    fn fresh_state_has_nothing_pressed() {
        let input = InputState::new();
        assert!(!input.is_held(KeyCode::Char('h')));
        assert!(!input.any_pressed(&[KeyCode::Enter]));
        assert!(!input.ctrl_c_pressed());
    }
}
