/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::GameConfig;
use domain::catalog::Catalog;
use domain::kind::KindId;
use sim::game::{Game, Phase, Prompt};
use sim::level::level_list;
use sim::step;
use ui::gamepad::GamepadState;
use ui::input::{resolve_bindings, InputState, PlayerKeys};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Tile-based terminal platformer.
#[derive(Parser, Debug)]
#[command(name = "globox", version)]
struct Cli {
    /// Level to start at (0-based)
    #[arg(short = 'n', long = "level", default_value_t = 0)]
    level: usize,

    /// Config file (default: search for config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of `.txt` levels (overrides the config)
    #[arg(long)]
    levels_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = GameConfig::load(cli.config.as_deref());
    let levels_dir = cli.levels_dir.clone().unwrap_or_else(|| config.levels_dir.clone());

    let catalog = Catalog::standard();
    let bindings = resolve_bindings(&config.controls, &catalog);
    let mut game = match Game::new(catalog, level_list(&levels_dir), config.cooldowns, StdRng::from_entropy()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("globox: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = game.start(cli.level) {
        eprintln!("globox: {e}");
        return ExitCode::FAILURE;
    }

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return ExitCode::FAILURE;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut game, &mut renderer, sound.as_ref(), &config, &bindings);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Game error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    bindings: &[PlayerKeys],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        log::info!("gamepad connected, driving '{}'", config.gamepad.player);
    }
    let pad_kind = game
        .catalog
        .by_symbol(config.gamepad.player)
        .filter(|&k| game.catalog.kind(k).is_player());

    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let mut last_tick = Instant::now();
    // Walk and jump presses between ticks are applied on the next tick.
    let mut pending_walks: Vec<(KindId, i32)> = vec![];
    let mut pending_jumps: Vec<KindId> = vec![];
    let mut events = Vec::new();

    while game.running {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        match game.phase {
            Phase::Prompt(prompt) => {
                pending_walks.clear();
                pending_jumps.clear();
                if let Some(yes) = prompt_answer(prompt, &kb, &gp) {
                    game.answer(yes);
                    last_tick = Instant::now();
                }
            }
            Phase::Playing => {
                if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
                    game.ask(Prompt::Quit);
                } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                    game.ask(Prompt::Restart);
                } else {
                    for keys in bindings {
                        pending_walks.extend(keys.walk_steps(&kb).into_iter().map(|dir| (keys.kind, dir)));
                        if kb.any_pressed(&keys.jump) && !pending_jumps.contains(&keys.kind) {
                            pending_jumps.push(keys.kind);
                        }
                    }
                    if let Some(kind) = pad_kind.filter(|_| gp.jump_pressed()) {
                        if !pending_jumps.contains(&kind) {
                            pending_jumps.push(kind);
                        }
                    }
                }
            }
        }

        if game.phase == Phase::Playing && last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();

            if renderer.fits(&game.world) {
                for (kind, dir) in pending_walks.drain(..) {
                    game.apply_walk(kind, dir);
                }
                if let Some(kind) = pad_kind {
                    let dir = gp.walk_dir();
                    if dir != 0 {
                        game.apply_walk(kind, dir);
                    }
                }
                for kind in pending_jumps.drain(..) {
                    game.apply_jump(kind);
                }

                events.clear();
                let outcome = step::step(game, &mut events);
                for event in &events {
                    log::debug!("tick {}: {event:?}", game.tick);
                }
                if let Some(sfx) = sound {
                    sfx.play_events(&events);
                }
                game.handle_outcome(outcome);
            }
        }

        renderer.render(game)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_YES: &[KeyCode] = &[KeyCode::Char('y'), KeyCode::Char('Y')];
const KEYS_NO: &[KeyCode] = &[KeyCode::Char('n'), KeyCode::Char('N')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_DEFAULT: &[KeyCode] = &[KeyCode::Enter];

/// y/n answer directly, Enter (or the pad's confirm) picks the bracketed default.
fn prompt_answer(prompt: Prompt, kb: &InputState, gp: &GamepadState) -> Option<bool> {
    if kb.any_pressed(KEYS_YES) {
        Some(true)
    } else if kb.any_pressed(KEYS_NO) || gp.cancel_pressed() {
        Some(false)
    } else if kb.any_pressed(KEYS_DEFAULT) || gp.confirm_pressed() {
        Some(prompt.default_answer())
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_level_and_paths() {
        let cli = Cli::try_parse_from(["globox", "-n", "3", "--levels-dir", "lv"]).unwrap();
        assert_eq!(cli.level, 3);
        assert_eq!(cli.levels_dir, Some(PathBuf::from("lv")));
        assert!(cli.config.is_none());

        let cli = Cli::try_parse_from(["globox"]).unwrap();
        assert_eq!(cli.level, 0);
    }

    #[test]
    fn cli_rejects_negative_level() {
        assert!(Cli::try_parse_from(["globox", "-n", "-1"]).is_err());
    }
}
