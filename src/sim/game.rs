/// Game session: the level list, the current level and its world, the
/// random source, and the prompt the player has to answer (if any).
///
/// Every level is compiled into a pristine `World` when the session is
/// created. Starting, restarting and advancing clone that copy, so they
/// cannot fail once the session exists.

use rand::rngs::StdRng;

use crate::config::CooldownConfig;
use crate::domain::catalog::Catalog;
use crate::domain::kind::KindId;
use super::level::{load_level, LevelDef, LevelError};
use super::movement::{attempt_jump, attempt_move};
use super::step::StepOutcome;
use super::world::World;

/// A question shown on the bottom row. Steps and actions are suspended
/// until it is answered.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Prompt {
    LevelFailed,
    LevelComplete,
    GameComplete,
    Restart,
    Quit,
}

impl Prompt {
    pub fn message(self) -> &'static str {
        match self {
            Prompt::LevelFailed => "Level failed. Play again ([y]/n)?",
            Prompt::LevelComplete => "Level completed. Play next ([y]/n)?",
            Prompt::GameComplete => "The game has finished. Play again ([y]/n)?",
            Prompt::Restart => "Restart the level (y/[n])?",
            Prompt::Quit => "Are you sure (y/[n])?",
        }
    }

    /// The bracketed answer, picked by Enter.
    pub fn default_answer(self) -> bool {
        matches!(self, Prompt::LevelFailed | Prompt::LevelComplete | Prompt::GameComplete)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Prompt(Prompt),
}

pub struct Level {
    pub name: String,
    pristine: World,
}

pub struct Game {
    pub catalog: Catalog,
    pub levels: Vec<Level>,
    pub level: usize,
    pub world: World,
    pub cooldowns: CooldownConfig,
    pub rng: StdRng,
    pub running: bool,
    pub phase: Phase,
    pub tick: u64,
}

impl Game {
    /// Compile every level and start at level 0.
    pub fn new(
        catalog: Catalog,
        defs: Vec<LevelDef>,
        cooldowns: CooldownConfig,
        rng: StdRng,
    ) -> Result<Self, LevelError> {
        if defs.is_empty() {
            return Err(LevelError::NoLevels);
        }

        let mut levels = Vec::with_capacity(defs.len());
        for def in defs {
            let pristine = load_level(&catalog, &def.map).map_err(|e| LevelError::InLevel {
                name: def.name.clone(),
                source: Box::new(e),
            })?;
            levels.push(Level { name: def.name, pristine });
        }

        let world = levels[0].pristine.clone();
        Ok(Game {
            catalog,
            levels,
            level: 0,
            world,
            cooldowns,
            rng,
            running: true,
            phase: Phase::Playing,
            tick: 0,
        })
    }

    pub fn start(&mut self, level: usize) -> Result<(), LevelError> {
        if level >= self.levels.len() {
            return Err(LevelError::NoSuchLevel(level));
        }
        self.load(level);
        Ok(())
    }

    pub fn restart(&mut self) {
        self.load(self.level);
    }

    /// Move on to the next level, wrapping to the first after the last.
    pub fn advance(&mut self) -> StepOutcome {
        let next = self.level + 1;
        if next >= self.levels.len() {
            self.load(0);
            StepOutcome::GameComplete
        } else {
            self.load(next);
            StepOutcome::LevelComplete { next }
        }
    }

    fn load(&mut self, level: usize) {
        self.level = level;
        self.world = self.levels[level].pristine.clone();
        self.phase = Phase::Playing;
        log::info!("level {level}: {} ({}x{})", self.levels[level].name, self.world.width, self.world.height);
    }

    pub fn level_name(&self) -> &str {
        &self.levels[self.level].name
    }

    // ── Actions ──

    /// Walk every block of `kind` one cell by `dir`.
    pub fn apply_walk(&mut self, kind: KindId, dir: i32) {
        for id in self.world.ids_of_kind(kind) {
            attempt_move(&mut self.world, &self.catalog, id, dir);
        }
    }

    pub fn apply_jump(&mut self, kind: KindId) {
        for id in self.world.ids_of_kind(kind) {
            attempt_jump(&mut self.world, &self.catalog, id);
        }
    }

    // ── Prompts ──

    pub fn ask(&mut self, prompt: Prompt) {
        self.phase = Phase::Prompt(prompt);
    }

    /// Turn a step outcome into the prompt it calls for.
    pub fn handle_outcome(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Continue => {}
            StepOutcome::LevelComplete { .. } => self.ask(Prompt::LevelComplete),
            StepOutcome::GameComplete => self.ask(Prompt::GameComplete),
            StepOutcome::LevelFailed => self.ask(Prompt::LevelFailed),
        }
    }

    /// Resolve the pending prompt.
    pub fn answer(&mut self, yes: bool) {
        let Phase::Prompt(prompt) = self.phase else { return };
        self.phase = Phase::Playing;
        match (prompt, yes) {
            (Prompt::LevelFailed | Prompt::Restart, true) => self.restart(),
            (Prompt::Quit, true) => self.running = false,
            (Prompt::LevelFailed | Prompt::LevelComplete | Prompt::GameComplete, false) => self.running = false,
            _ => {}
        }
    }
}
