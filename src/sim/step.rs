/// The step function: advances the session by one tick.
///
/// Processing order:
///   1. Kind behaviors, in catalog order (each kind at most once)
///   2. Win / lose check
///
/// A finish behavior that clears the level rebuilds the world and ends
/// the tick right there; nothing after it runs on the new world.
/// Walk and jump actions are applied by the caller before the step.

use crate::domain::kind::{Behavior, KindId};
use super::behavior;
use super::event::GameEvent;
use super::game::{Game, Phase};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    Continue,
    LevelComplete { next: usize },
    GameComplete,
    LevelFailed,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(game: &mut Game, events: &mut Vec<GameEvent>) -> StepOutcome {
    if game.phase != Phase::Playing {
        return StepOutcome::Continue;
    }
    game.tick += 1;

    let order: Vec<(KindId, Behavior)> = game
        .catalog
        .iter()
        .filter_map(|(id, kind)| kind.behavior.map(|b| (id, b)))
        .collect();

    for (kind, b) in order {
        if let Some(outcome) = behavior::dispatch(game, kind, b, events) {
            return outcome;
        }
    }

    check_game(game, events)
}

/// Remove dead players. No living player left fails the level.
pub fn check_game(game: &mut Game, events: &mut Vec<GameEvent>) -> StepOutcome {
    let catalog = &game.catalog;
    let dead = game.world.ids_where(|b| catalog.kind(b.kind).is_player() && b.energy <= 0);
    for &id in &dead {
        if let Some(b) = game.world.get(id) {
            events.push(GameEvent::PlayerDied { symbol: catalog.kind(b.kind).symbol });
        }
    }
    game.world.remove_all(&dead);

    if game.world.living_players(catalog).is_empty() {
        StepOutcome::LevelFailed
    } else {
        StepOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::block::Cooldown;
    use crate::sim::game::test_util::game_from;
    use crate::sim::game::Prompt;
    use crate::sim::world::test_util::{only, pos};

    fn run(game: &mut Game, steps: usize) -> (StepOutcome, Vec<GameEvent>) {
        let mut events = vec![];
        let mut outcome = StepOutcome::Continue;
        for _ in 0..steps {
            outcome = step(game, &mut events);
            if outcome != StepOutcome::Continue {
                break;
            }
        }
        (outcome, events)
    }

    #[test]
    fn quiet_level_continues() {
        let mut g = game_from(&[&["o )", "|||"]]);
        let (outcome, events) = run(&mut g, 20);
        assert_eq!(outcome, StepOutcome::Continue);
        assert!(events.is_empty());
        assert_eq!(g.tick, 20);
    }

    #[test]
    fn falling_player_fails_the_level() {
        let mut g = game_from(&[&["o"]]);
        let (outcome, _) = run(&mut g, 3);
        assert_eq!(outcome, StepOutcome::Continue);
        let (outcome, events) = run(&mut g, 1);
        assert_eq!(outcome, StepOutcome::LevelFailed);
        assert_eq!(
            events,
            vec![GameEvent::FellOut { x: 1, y: 1 }, GameEvent::PlayerDied { symbol: 'o' }]
        );
        assert!(g.world.players(&g.catalog).is_empty());
    }

    #[test]
    fn player_falls_after_four_steps() {
        let mut g = game_from(&[&["o", " ", "|"]]);
        run(&mut g, 3);
        let o = only(&g.world, &g.catalog, 'o');
        assert_eq!(pos(&g.world, o), (1, 1));
        run(&mut g, 1);
        assert_eq!(pos(&g.world, o), (1, 2));
        assert_eq!(g.world.get(o).unwrap().cooldowns.get(Cooldown::Falling), 0);
    }

    #[test]
    fn both_players_must_reach_the_exit() {
        let mut g = game_from(&[&["o)", "||", "a)", "||"], &["o", "|"]]);
        let o_kind = g.catalog.by_symbol('o').unwrap();
        let a_kind = g.catalog.by_symbol('a').unwrap();

        g.apply_walk(o_kind, 1);
        assert_eq!(run(&mut g, 1).0, StepOutcome::Continue);

        g.apply_walk(a_kind, 1);
        let (outcome, events) = run(&mut g, 1);
        assert_eq!(outcome, StepOutcome::LevelComplete { next: 1 });
        assert_eq!(events, vec![GameEvent::LevelCleared { level: 0 }]);
        assert_eq!(g.level, 1);
        assert_eq!(g.world.height, 2);
    }

    #[test]
    fn clearing_the_last_level_completes_the_game() {
        let mut g = game_from(&[&["o)", "||"]]);
        let o_kind = g.catalog.by_symbol('o').unwrap();
        g.apply_walk(o_kind, 1);
        assert_eq!(run(&mut g, 1).0, StepOutcome::GameComplete);
        assert_eq!(g.level, 0);
        let o = only(&g.world, &g.catalog, 'o');
        assert_eq!(pos(&g.world, o), (1, 1));
    }

    #[test]
    fn cannonball_travels_into_player() {
        let mut g = game_from(&[&["t o ", "||||"]]);
        g.cooldowns.cannon = 100;
        g.cooldowns.cannonball = 1;
        let o = only(&g.world, &g.catalog, 'o');
        let ball = g.catalog.by_symbol('.').unwrap();
        g.world.spawn(ball, 2, 1);
        let (_, events) = run(&mut g, 1);
        assert_eq!(pos(&g.world, o), (3, 1));
        assert!(events.is_empty());
        let (_, events) = run(&mut g, 1);
        assert_eq!(events, vec![GameEvent::PlayerHit { symbol: 'o', energy: 0 }, GameEvent::PlayerDied { symbol: 'o' }]);
    }

    #[test]
    fn fresh_cannonball_is_counted_in_the_same_step() {
        let mut g = game_from(&[&["t   o", "|||||"]]);
        g.cooldowns.cannon = 1;
        g.cooldowns.cannonball = 2;
        let ball_kind = g.catalog.by_symbol('.').unwrap();

        let (_, events) = run(&mut g, 1);
        assert_eq!(events, vec![GameEvent::ProjectileFired { x: 1, y: 1 }]);
        let balls = g.world.ids_of_kind(ball_kind);
        assert_eq!(balls.len(), 1);
        let ball = balls[0];
        assert_eq!(pos(&g.world, ball), (1, 1));
        assert_eq!(g.world.get(ball).unwrap().cooldowns.get(Cooldown::Cannonball), 1);

        run(&mut g, 1);
        assert_eq!(pos(&g.world, ball), (2, 1));
        assert_eq!(g.world.ids_of_kind(ball_kind).len(), 2);
    }

    #[test]
    fn no_steps_while_a_prompt_is_pending() {
        let mut g = game_from(&[&["o"]]);
        g.ask(Prompt::Quit);
        let (outcome, events) = run(&mut g, 10);
        assert_eq!(outcome, StepOutcome::Continue);
        assert!(events.is_empty());
        assert_eq!(g.tick, 0);
        assert_eq!(g.world.players(&g.catalog)[0].energy, 2);
    }
}
