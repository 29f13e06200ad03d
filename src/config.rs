/// External configuration loader.
///
/// Reads `config.toml` from an explicit path, or searches the
/// executable's directory, the CWD and the data directories.
/// Falls back to defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "globox";
const CONFIG_FILE: &str = "config.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub cooldowns: CooldownConfig,
    pub controls: Vec<ControlConfig>,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
}

/// Steps between actions, per cooldown category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooldownConfig {
    pub cannon: u32,
    pub cannonball: u32,
    pub falling: u32,
    pub zombie: u32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        CooldownConfig {
            cannon: default_cannon(),
            cannonball: default_cannonball(),
            falling: default_falling(),
            zombie: default_zombie(),
        }
    }
}

/// Keyboard bindings of one player kind.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ControlConfig {
    pub player: char,
    #[serde(default)]
    pub left: Vec<String>,
    #[serde(default)]
    pub right: Vec<String>,
    #[serde(default)]
    pub jump: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub player: char,
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    cooldowns: TomlCooldowns,
    #[serde(default = "default_controls")]
    controls: Vec<ControlConfig>,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlCooldowns {
    #[serde(default = "default_cannon")]
    cannon: u32,
    #[serde(default = "default_cannonball")]
    cannonball: u32,
    #[serde(default = "default_falling")]
    falling: u32,
    #[serde(default = "default_zombie")]
    zombie: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_player")]
    player: char,
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 64 }
fn default_cannon() -> u32 { 128 }
fn default_cannonball() -> u32 { 2 }
fn default_falling() -> u32 { 4 }
fn default_zombie() -> u32 { 4 }

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn default_controls() -> Vec<ControlConfig> {
    vec![
        ControlConfig { player: 'o', left: keys(&["h"]), right: keys(&["n"]), jump: keys(&["c"]) },
        ControlConfig { player: 'a', left: keys(&["a"]), right: keys(&["e"]), jump: keys(&[","]) },
    ]
}

fn default_pad_player() -> char { 'o' }
fn default_pad_jump() -> Vec<String> { keys(&["A", "B"]) }
fn default_confirm() -> Vec<String> { keys(&["Start"]) }
fn default_cancel() -> Vec<String> { keys(&["Select"]) }
fn default_restart() -> Vec<String> { keys(&["Y"]) }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlConfig {
    fn default() -> Self {
        TomlConfig {
            speed: TomlSpeed::default(),
            cooldowns: TomlCooldowns::default(),
            controls: default_controls(),
            gamepad: TomlGamepad::default(),
            general: TomlGeneral::default(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlCooldowns {
    fn default() -> Self {
        TomlCooldowns {
            cannon: default_cannon(),
            cannonball: default_cannonball(),
            falling: default_falling(),
            zombie: default_zombie(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            player: default_pad_player(),
            jump: default_pad_jump(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `explicit`, or from the first `config.toml` found
    /// in the candidate directories. Missing keys fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let search_dirs = candidate_dirs();

        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_default(),
            None => search_toml(&search_dirs),
        };

        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        Self::from_toml(toml_cfg, levels_dir)
    }

    fn from_toml(toml_cfg: TomlConfig, levels_dir: PathBuf) -> Self {
        GameConfig {
            speed: SpeedConfig { tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1) },
            cooldowns: CooldownConfig {
                cannon: positive("cannon", toml_cfg.cooldowns.cannon, default_cannon()),
                cannonball: positive("cannonball", toml_cfg.cooldowns.cannonball, default_cannonball()),
                falling: positive("falling", toml_cfg.cooldowns.falling, default_falling()),
                zombie: positive("zombie", toml_cfg.cooldowns.zombie, default_zombie()),
            },
            controls: toml_cfg.controls,
            gamepad: GamepadConfig {
                player: toml_cfg.gamepad.player,
                jump: toml_cfg.gamepad.jump,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
            },
            levels_dir,
        }
    }
}

/// Cooldowns are step counts and must be at least 1.
fn positive(name: &str, value: u32, fallback: u32) -> u32 {
    if value == 0 {
        log::warn!("cooldowns.{name} must be at least 1, using {fallback}");
        fallback
    } else {
        value
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Follow symlinks so an installed link still finds data next to the binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share").join(APP_DIR);
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share").join(APP_DIR);
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn search_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            return read_toml(&path).unwrap_or_default();
        }
    }
    TomlConfig::default()
}

fn read_toml(path: &Path) -> Option<TomlConfig> {
    match std::fs::read_to_string(path) {
        Ok(text) => match parse_toml(&text) {
            Ok(cfg) => {
                log::info!("config loaded from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                log::warn!("{} parse error, using defaults: {e}", path.display());
                None
            }
        },
        Err(e) => {
            log::warn!("could not read {}: {e}", path.display());
            None
        }
    }
}

fn parse_toml(text: &str) -> Result<TomlConfig, toml::de::Error> {
    toml::from_str::<TomlConfig>(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> GameConfig {
        GameConfig::from_toml(parse_toml(text).unwrap(), PathBuf::from("levels"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.speed.tick_rate_ms, 64);
        assert_eq!(cfg.cooldowns, CooldownConfig::default());
        assert_eq!(cfg.cooldowns.cannon, 128);
        assert_eq!(cfg.controls.len(), 2);
        assert_eq!(cfg.controls[0].player, 'o');
        assert_eq!(cfg.controls[1].jump, vec![",".to_string()]);
        assert_eq!(cfg.gamepad.player, 'o');
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse("[cooldowns]\nfalling = 2\n\n[speed]\ntick_rate_ms = 100\n");
        assert_eq!(cfg.cooldowns.falling, 2);
        assert_eq!(cfg.cooldowns.zombie, 4);
        assert_eq!(cfg.speed.tick_rate_ms, 100);
    }

    #[test]
    fn zero_cooldown_falls_back() {
        let cfg = parse("[cooldowns]\ncannon = 0\n");
        assert_eq!(cfg.cooldowns.cannon, 128);
    }

    #[test]
    fn controls_table_replaces_defaults() {
        let cfg = parse(
            "[[controls]]\nplayer = \"o\"\nleft = [\"Left\"]\nright = [\"Right\"]\njump = [\"Up\", \"Space\"]\n",
        );
        assert_eq!(cfg.controls.len(), 1);
        assert_eq!(cfg.controls[0].jump, vec!["Up".to_string(), "Space".to_string()]);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_toml("[speed\ntick_rate_ms = ").is_err());
    }
}
