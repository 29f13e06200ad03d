/// Per-kind tick behaviors.
///
/// `dispatch` runs one kind's behavior once. Each behavior visits the
/// blocks of its own kind, except falling, which visits every
/// fall-subject block, and finish, which inspects every living player.
///
/// Handles are snapshotted before a pass mutates the world. Blocks
/// spawned during a pass are not visited by it, and removals are
/// collected and applied when the pass ends.

use rand::Rng;

use crate::domain::ai;
use crate::domain::block::{BlockId, Cooldown};
use crate::domain::catalog::Catalog;
use crate::domain::kind::{Behavior, Caps, KindId};
use super::event::GameEvent;
use super::game::Game;
use super::movement::attempt_move;
use super::step::StepOutcome;
use super::world::World;

/// Energy a player loses when a cannonball hits it.
pub const CANNONBALL_DAMAGE: i32 = 2;

/// Run `behavior` for `kind`. Returns an outcome when the behavior ended
/// the level; the world has already been rebuilt by then.
pub fn dispatch(
    game: &mut Game,
    kind: KindId,
    behavior: Behavior,
    events: &mut Vec<GameEvent>,
) -> Option<StepOutcome> {
    let cd = game.cooldowns;
    match behavior {
        Behavior::Falling => falling(&mut game.world, &game.catalog, cd.falling, events),
        Behavior::Cannon => cannon(&mut game.world, &game.catalog, kind, cd.cannon, events),
        Behavior::Cannonball => cannonball(&mut game.world, &game.catalog, kind, cd.cannonball, events),
        Behavior::EarnEnergy => earn_energy(&mut game.world, &game.catalog, kind, events),
        Behavior::Zombie => zombie(&mut game.world, &game.catalog, &mut game.rng, kind, cd.zombie),
        Behavior::Finish => {
            if all_players_on_finish(&game.world, &game.catalog) {
                events.push(GameEvent::LevelCleared { level: game.level });
                return Some(game.advance());
            }
        }
    }
    None
}

// ══════════════════════════════════════════════════════════════
// Gravity
// ══════════════════════════════════════════════════════════════

fn falling(world: &mut World, catalog: &Catalog, every: u32, events: &mut Vec<GameEvent>) {
    for id in world.ids_where(|b| catalog.caps(b.kind).contains(Caps::FALL)) {
        let Some(b) = world.get_mut(id) else { continue };
        if !b.cooldowns.ready(Cooldown::Falling, every) {
            continue;
        }
        let (x, y) = (b.x, b.y);

        let mut below = false;
        let mut held = false;
        for (other_id, other) in world.iter() {
            if other_id == id || other.x != x {
                continue;
            }
            let caps = catalog.caps(other.kind);
            if other.y == y {
                held |= caps.contains(Caps::STICK);
            } else if other.y == y + 1 {
                below = true;
                held |= !caps.contains(Caps::OPEN_UP);
            }
        }
        if held {
            continue;
        }

        let Some(b) = world.get_mut(id) else { continue };
        if below {
            b.y += 1;
        } else {
            // Nothing under it: out of the world.
            if b.energy > 0 {
                events.push(GameEvent::FellOut { x, y });
            }
            b.energy = 0;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Cannons and cannonballs
// ══════════════════════════════════════════════════════════════

fn cannon(world: &mut World, catalog: &Catalog, kind: KindId, every: u32, events: &mut Vec<GameEvent>) {
    let Some(projectile) = catalog.kind(kind).arg.kind() else { return };
    for id in world.ids_of_kind(kind) {
        let Some(b) = world.get_mut(id) else { continue };
        if !b.cooldowns.ready(Cooldown::Cannon, every) {
            continue;
        }
        let (x, y) = (b.x, b.y);
        world.spawn(projectile, x, y);
        events.push(GameEvent::ProjectileFired { x, y });
    }
}

fn cannonball(world: &mut World, catalog: &Catalog, kind: KindId, every: u32, events: &mut Vec<GameEvent>) {
    let dir = catalog.kind(kind).arg.int();
    let mut spent: Vec<BlockId> = vec![];

    for id in world.ids_of_kind(kind) {
        let Some(b) = world.get_mut(id) else { continue };
        if !b.cooldowns.ready(Cooldown::Cannonball, every) {
            continue;
        }
        let (x, y) = (b.x, b.y);
        let nx = x + dir;

        if !world.occupied(nx, y) {
            spent.push(id);
            events.push(GameEvent::ProjectileExpired { x, y });
            continue;
        }

        if let Some(victim) = world.player_at(catalog, x, y, None) {
            if let Some(p) = world.get_mut(victim) {
                p.energy -= CANNONBALL_DAMAGE;
                events.push(GameEvent::PlayerHit { symbol: catalog.kind(p.kind).symbol, energy: p.energy });
            }
            spent.push(id);
            continue;
        }

        if world.at(nx, y).any(|(_, other)| !catalog.caps(other.kind).open_for_entry(dir)) {
            spent.push(id);
            events.push(GameEvent::ProjectileExpired { x, y });
            continue;
        }

        if let Some(b) = world.get_mut(id) {
            b.x = nx;
        }
    }

    world.remove_all(&spent);
}

// ══════════════════════════════════════════════════════════════
// Pickups
// ══════════════════════════════════════════════════════════════

/// At most one pickup is collected per invocation.
fn earn_energy(world: &mut World, catalog: &Catalog, kind: KindId, events: &mut Vec<GameEvent>) {
    let amount = catalog.kind(kind).arg.int();
    for id in world.ids_of_kind(kind) {
        let Some((x, y)) = world.get(id).map(|b| (b.x, b.y)) else { continue };
        let Some(player) = world.player_at(catalog, x, y, None) else { continue };

        if let Some(pickup) = world.get_mut(id) {
            pickup.kind = catalog.vacuum();
        }
        if let Some(p) = world.get_mut(player) {
            p.energy += amount;
            events.push(GameEvent::EnergyCollected { symbol: catalog.kind(p.kind).symbol, amount });
        }
        break;
    }
}

// ══════════════════════════════════════════════════════════════
// Zombies
// ══════════════════════════════════════════════════════════════

/// Only kinds carrying `Caps::AI` wander.
fn zombie<R: Rng + ?Sized>(world: &mut World, catalog: &Catalog, rng: &mut R, kind: KindId, every: u32) {
    if !catalog.caps(kind).contains(Caps::AI) {
        return;
    }
    for id in world.ids_of_kind(kind) {
        let Some(b) = world.get_mut(id) else { continue };
        if !b.cooldowns.ready(Cooldown::Zombie, every) {
            continue;
        }
        let dir = ai::wander(rng);
        if dir != 0 {
            attempt_move(world, catalog, id, dir);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Finish
// ══════════════════════════════════════════════════════════════

/// At least one living player, and every living player shares its cell
/// with a finish block.
fn all_players_on_finish(world: &World, catalog: &Catalog) -> bool {
    let living = world.living_players(catalog);
    !living.is_empty()
        && living.iter().all(|&id| {
            world.get(id).map_or(false, |p| {
                world.at(p.x, p.y).any(|(_, b)| catalog.kind(b.kind).behavior == Some(Behavior::Finish))
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::test_util::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn kind(c: &Catalog, symbol: char) -> KindId {
        c.by_symbol(symbol).unwrap()
    }

    // ── Falling ──

    #[test]
    fn falls_one_cell_every_fourth_step() {
        let (mut w, c) = world_from(&["o", " ", "|"]);
        let o = only(&w, &c, 'o');
        let mut ev = vec![];
        for _ in 0..3 {
            falling(&mut w, &c, 4, &mut ev);
            assert_eq!(pos(&w, o), (1, 1));
        }
        falling(&mut w, &c, 4, &mut ev);
        assert_eq!(pos(&w, o), (1, 2));
        assert_eq!(w.get(o).unwrap().cooldowns.get(Cooldown::Falling), 0);
        assert!(ev.is_empty());
    }

    #[test]
    fn closed_block_below_holds() {
        let (mut w, c) = world_from(&["o", "|"]);
        let o = only(&w, &c, 'o');
        let mut ev = vec![];
        for _ in 0..8 {
            falling(&mut w, &c, 4, &mut ev);
        }
        assert_eq!(pos(&w, o), (1, 1));
        assert_eq!(w.get(o).unwrap().energy, 2);
    }

    #[test]
    fn sticky_block_in_same_cell_holds() {
        let (mut w, c) = world_from(&["_", " "]);
        let o = w.spawn(kind(&c, 'o'), 1, 1);
        let mut ev = vec![];
        for _ in 0..8 {
            falling(&mut w, &c, 4, &mut ev);
        }
        assert_eq!(pos(&w, o), (1, 1));
    }

    #[test]
    fn nothing_below_kills() {
        let (mut w, c) = world_from(&["o"]);
        let o = only(&w, &c, 'o');
        let mut ev = vec![];
        for _ in 0..3 {
            falling(&mut w, &c, 4, &mut ev);
        }
        assert_eq!(w.get(o).unwrap().energy, 2);
        falling(&mut w, &c, 4, &mut ev);
        assert_eq!(w.get(o).unwrap().energy, 0);
        assert_eq!(ev, vec![GameEvent::FellOut { x: 1, y: 1 }]);
    }

    #[test]
    fn boxes_fall_too() {
        let (mut w, c) = world_from(&["#", " ", "|"]);
        let bx = only(&w, &c, '#');
        let mut ev = vec![];
        for _ in 0..4 {
            falling(&mut w, &c, 4, &mut ev);
        }
        assert_eq!(pos(&w, bx), (1, 2));
    }

    // ── Cannon ──

    #[test]
    fn cannon_fires_on_its_cooldown() {
        let (mut w, c) = world_from(&["t "]);
        let t = kind(&c, 't');
        let ball = kind(&c, '.');
        let mut ev = vec![];
        for _ in 0..2 {
            cannon(&mut w, &c, t, 3, &mut ev);
        }
        assert!(w.ids_of_kind(ball).is_empty());
        cannon(&mut w, &c, t, 3, &mut ev);
        let balls = w.ids_of_kind(ball);
        assert_eq!(balls.len(), 1);
        assert_eq!(pos(&w, balls[0]), (1, 1));
        assert_eq!(ev, vec![GameEvent::ProjectileFired { x: 1, y: 1 }]);
    }

    #[test]
    fn fresh_projectile_is_drawn_under_the_cannon() {
        let (mut w, c) = world_from(&["t "]);
        let t = kind(&c, 't');
        let mut ev = vec![];
        cannon(&mut w, &c, t, 1, &mut ev);
        let top = w.top_at(&c, 1, 1).unwrap();
        assert_eq!(w.get(top).unwrap().kind, t);
    }

    // ── Cannonball ──

    #[test]
    fn cannonball_moves_through_open_cells() {
        let (mut w, c) = world_from(&[".  "]);
        let dot = kind(&c, '.');
        let b = only(&w, &c, '.');
        let mut ev = vec![];
        cannonball(&mut w, &c, dot, 2, &mut ev);
        assert_eq!(pos(&w, b), (1, 1));
        cannonball(&mut w, &c, dot, 2, &mut ev);
        assert_eq!(pos(&w, b), (2, 1));
    }

    #[test]
    fn cannonball_with_empty_destination_despawns_in_place() {
        let (mut w, c) = world_from(&[" ."]);
        let dot = kind(&c, '.');
        let b = only(&w, &c, '.');
        let mut ev = vec![];
        cannonball(&mut w, &c, dot, 2, &mut ev);
        assert_eq!(pos(&w, b), (2, 1));
        cannonball(&mut w, &c, dot, 2, &mut ev);
        assert!(w.get(b).is_none());
        assert_eq!(ev, vec![GameEvent::ProjectileExpired { x: 2, y: 1 }]);
    }

    #[test]
    fn cannonball_hits_player_in_its_cell() {
        let (mut w, c) = world_from(&["o "]);
        let o = only(&w, &c, 'o');
        let dot = kind(&c, '.');
        let b = w.spawn(dot, 1, 1);
        let mut ev = vec![];
        cannonball(&mut w, &c, dot, 1, &mut ev);
        assert!(w.get(b).is_none());
        assert_eq!(w.get(o).unwrap().energy, 0);
        assert_eq!(ev, vec![GameEvent::PlayerHit { symbol: 'o', energy: 0 }]);
    }

    #[test]
    fn cannonball_stops_at_closed_cell() {
        let (mut w, c) = world_from(&[".|"]);
        let dot = kind(&c, '.');
        let b = only(&w, &c, '.');
        let mut ev = vec![];
        cannonball(&mut w, &c, dot, 1, &mut ev);
        assert!(w.get(b).is_none());
        assert_eq!(ev, vec![GameEvent::ProjectileExpired { x: 1, y: 1 }]);
    }

    #[test]
    fn cannonballs_only_move_their_own_kind() {
        let (mut w, c) = world_from(&["      "]);
        let right = w.spawn(kind(&c, '.'), 3, 1);
        let left = w.spawn(kind(&c, ','), 4, 1);
        let mut ev = vec![];
        cannonball(&mut w, &c, kind(&c, '.'), 1, &mut ev);
        assert_eq!(pos(&w, right), (4, 1));
        assert_eq!(pos(&w, left), (4, 1));
        cannonball(&mut w, &c, kind(&c, ','), 1, &mut ev);
        assert_eq!(pos(&w, left), (3, 1));
        assert_eq!(pos(&w, right), (4, 1));
    }

    // ── Pickups ──

    #[test]
    fn pickup_grants_energy_once_and_becomes_vacuum() {
        let (mut w, c) = world_from(&["* "]);
        let star = kind(&c, '*');
        let pickup = only(&w, &c, '*');
        let o = w.spawn(kind(&c, 'o'), 1, 1);
        w.get_mut(o).unwrap().energy = 2;
        let mut ev = vec![];
        earn_energy(&mut w, &c, star, &mut ev);
        assert_eq!(w.get(o).unwrap().energy, 4);
        assert_eq!(w.get(pickup).unwrap().kind, c.vacuum());
        earn_energy(&mut w, &c, star, &mut ev);
        assert_eq!(w.get(o).unwrap().energy, 4);
        assert_eq!(ev, vec![GameEvent::EnergyCollected { symbol: 'o', amount: 2 }]);
    }

    #[test]
    fn one_pickup_per_invocation() {
        let (mut w, c) = world_from(&["**"]);
        let star = kind(&c, '*');
        let o1 = w.spawn(kind(&c, 'o'), 1, 1);
        let o2 = w.spawn(kind(&c, 'a'), 2, 1);
        let mut ev = vec![];
        earn_energy(&mut w, &c, star, &mut ev);
        assert_eq!(w.ids_of_kind(star).len(), 1);
        earn_energy(&mut w, &c, star, &mut ev);
        assert!(w.ids_of_kind(star).is_empty());
        assert_eq!(w.get(o1).unwrap().energy + w.get(o2).unwrap().energy, 4);
    }

    #[test]
    fn pickup_without_player_stays() {
        let (mut w, c) = world_from(&["*o"]);
        let star = kind(&c, '*');
        let mut ev = vec![];
        earn_energy(&mut w, &c, star, &mut ev);
        assert_eq!(w.ids_of_kind(star).len(), 1);
        assert!(ev.is_empty());
    }

    // ── Zombie ──

    #[test]
    fn zombie_wanders_inside_its_corridor() {
        let (mut w, c) = world_from(&["|   x   |", "|||||||||"]);
        let z = only(&w, &c, 'x');
        let x_kind = kind(&c, 'x');
        let mut rng = StdRng::seed_from_u64(42);
        let mut moved = false;
        for _ in 0..60 {
            zombie(&mut w, &c, &mut rng, x_kind, 1);
            let (x, y) = pos(&w, z);
            assert!((2..=8).contains(&x));
            assert_eq!(y, 1);
            moved |= x != 5;
        }
        assert!(moved);
    }

    #[test]
    fn zombie_waits_for_its_cooldown() {
        let (mut w, c) = world_from(&["|   x   |"]);
        let z = only(&w, &c, 'x');
        let x_kind = kind(&c, 'x');
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..3 {
            zombie(&mut w, &c, &mut rng, x_kind, 4);
        }
        assert_eq!(pos(&w, z), (5, 1));
        assert_eq!(w.get(z).unwrap().cooldowns.get(Cooldown::Zombie), 3);
    }

    #[test]
    fn zombie_kind_without_ai_stands_still() {
        use crate::domain::catalog::{ArgSpec, KindSpec, VACUUM};
        use crate::sim::level::load_level;

        let specs = [
            KindSpec { symbol: VACUUM, caps: Caps::OPEN, behavior: None, arg: ArgSpec::None },
            KindSpec { symbol: '|', caps: Caps::NONE, behavior: None, arg: ArgSpec::None },
            KindSpec {
                symbol: 'z',
                caps: Caps::PLAYER | Caps::OPEN,
                behavior: Some(Behavior::Zombie),
                arg: ArgSpec::Int(8),
            },
        ];
        let c = Catalog::from_specs(&specs).unwrap();
        let mut w = load_level(&c, "|   z   |").unwrap();
        let z_kind = kind(&c, 'z');
        let z = only(&w, &c, 'z');
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..60 {
            zombie(&mut w, &c, &mut rng, z_kind, 1);
        }
        assert_eq!(pos(&w, z), (5, 1));
        assert_eq!(w.get(z).unwrap().cooldowns.get(Cooldown::Zombie), 0);
    }

    // ── Finish ──

    #[test]
    fn finish_needs_every_living_player() {
        let (mut w, c) = world_from(&["o)", "a)"]);
        let o = only(&w, &c, 'o');
        let a = only(&w, &c, 'a');
        assert!(!all_players_on_finish(&w, &c));
        w.get_mut(o).unwrap().x = 2;
        assert!(!all_players_on_finish(&w, &c));
        w.get_mut(a).unwrap().x = 2;
        assert!(all_players_on_finish(&w, &c));
    }

    #[test]
    fn dead_players_do_not_block_finish() {
        let (mut w, c) = world_from(&["o)", "a)"]);
        let o = only(&w, &c, 'o');
        let a = only(&w, &c, 'a');
        w.get_mut(o).unwrap().x = 2;
        w.get_mut(a).unwrap().energy = 0;
        assert!(all_players_on_finish(&w, &c));
    }

    #[test]
    fn no_living_players_is_not_a_win() {
        let (mut w, c) = world_from(&[")"]);
        let o = w.spawn(kind(&c, 'o'), 1, 1);
        assert!(!all_players_on_finish(&w, &c));
        w.get_mut(o).unwrap().energy = 1;
        assert!(all_players_on_finish(&w, &c));
    }
}
