/// Movement resolution: the single path every mover goes through.
///
/// Players (walk input), zombies (AI) and pushed boxes all move with
/// `attempt_move`, so a zombie pushes a box exactly like a player does.
///
/// ## Horizontal move truth table
/// ┌──────────────────────────────────────┬────────────────────────┐
/// │ Destination cell                      │ Result                 │
/// ├──────────────────────────────────────┼────────────────────────┤
/// │ no blocks at all                      │ DENY (nothing to stand in) │
/// │ every occupant open from entry side   │ ALLOW                  │
/// │ closed occupant, pushable, pushed out │ keep checking the rest │
/// │ closed occupant, pushable, stuck      │ DENY                   │
/// │ closed occupant, not pushable         │ DENY                   │
/// └──────────────────────────────────────┴────────────────────────┘
/// "Entry side" is the left side when moving right and vice versa.
///
/// ## Jump truth table
/// ┌──────────────────────────────────────┬────────────────────────┐
/// │ Condition                             │ Effect                 │
/// ├──────────────────────────────────────┼────────────────────────┤
/// │ nothing above                         │ DENY                   │
/// │ any block above not open-down         │ DENY (ceiling)         │
/// │ takeoff block in own cell             │ enables                │
/// │ any block below not open-up           │ enables (standing)     │
/// │ neither                               │ DENY                   │
/// └──────────────────────────────────────┴────────────────────────┘
/// A successful jump moves up one cell and resets every cooldown.

use crate::domain::block::BlockId;
use crate::domain::catalog::Catalog;
use crate::domain::kind::Caps;
use crate::sim::world::World;

/// Move `id` one cell horizontally by `dir` (-1 or +1), pushing
/// pushable obstructions ahead of it. Returns whether the mover moved.
pub fn attempt_move(world: &mut World, catalog: &Catalog, id: BlockId, dir: i32) -> bool {
    if dir == 0 {
        return false;
    }
    let Some(mover) = world.get(id) else { return false };
    let (nx, y) = (mover.x + dir.signum(), mover.y);

    let occupants: Vec<BlockId> = world.at(nx, y).map(|(oid, _)| oid).collect();
    if occupants.is_empty() {
        return false;
    }

    for other in occupants {
        let Some(kind) = world.get(other).map(|b| b.kind) else { continue };
        let caps = catalog.caps(kind);
        if caps.open_for_entry(dir) {
            continue;
        }
        if caps.contains(Caps::PUSHABLE) {
            attempt_move(world, catalog, other, dir);
            if world.get(other).map_or(true, |b| b.x != nx) {
                continue;
            }
        }
        return false;
    }

    match world.get_mut(id) {
        Some(b) => {
            b.x = nx;
            true
        }
        None => false,
    }
}

/// Jump `id` one cell up if it has something to jump from and no ceiling.
pub fn attempt_jump(world: &mut World, catalog: &Catalog, id: BlockId) -> bool {
    let Some(b) = world.get(id) else { return false };
    let (x, y) = (b.x, b.y);
    let (up, down) = (y - 1, y + 1);

    let mut takeoff = false;
    let mut ceiling: Option<bool> = None;
    let mut standing = false;

    for (_, other) in world.iter().filter(|(_, o)| o.x == x) {
        let caps = catalog.caps(other.kind);
        if other.y == y {
            takeoff |= caps.contains(Caps::JUMP_FROM);
        } else if other.y == up {
            let closed = !caps.contains(Caps::OPEN_DOWN);
            ceiling = Some(ceiling.unwrap_or(false) || closed);
        } else if other.y == down {
            standing |= !caps.contains(Caps::OPEN_UP);
        }
    }

    // An empty cell above counts as a ceiling.
    if ceiling.unwrap_or(true) || !(takeoff || standing) {
        return false;
    }

    match world.get_mut(id) {
        Some(b) => {
            b.y = up;
            b.cooldowns.reset();
            true
        }
        None => false,
    }
}
