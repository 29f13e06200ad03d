/// Tile kinds: capability bits, behavior tags and behavior arguments.
/// A kind is immutable once it is in the catalog; blocks refer to it
/// through a `KindId`.

use std::ops::BitOr;

/// Stable index of a kind inside its `Catalog`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct KindId(pub usize);

/// Capability bitset.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Caps(u16);

impl Caps {
    pub const NONE: Caps = Caps(0);
    pub const OPEN_UP: Caps = Caps(1 << 1);
    pub const OPEN_RIGHT: Caps = Caps(1 << 2);
    pub const OPEN_DOWN: Caps = Caps(1 << 3);
    pub const OPEN_LEFT: Caps = Caps(1 << 4);
    pub const JUMP_FROM: Caps = Caps(1 << 5);
    pub const PLAYER: Caps = Caps(1 << 6);
    pub const STICK: Caps = Caps(1 << 7);
    pub const FALL: Caps = Caps(1 << 8);
    pub const PUSHABLE: Caps = Caps(1 << 9);
    pub const AI: Caps = Caps(1 << 10);
    /// All four sides open.
    pub const OPEN: Caps = Caps(1 << 1 | 1 << 2 | 1 << 3 | 1 << 4);

    /// Every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Caps) -> bool {
        self.0 & other.0 == other.0
    }

    /// At least one bit of `other` is set.
    #[inline]
    pub const fn intersects(self, other: Caps) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Caps) -> Caps {
        Caps(self.0 | other.0)
    }

    /// Can a mover enter this block's cell while travelling horizontally
    /// by `dir`? Moving right enters through the left side.
    #[inline]
    pub fn open_for_entry(self, dir: i32) -> bool {
        if dir > 0 {
            self.contains(Caps::OPEN_LEFT)
        } else {
            self.contains(Caps::OPEN_RIGHT)
        }
    }
}

impl BitOr for Caps {
    type Output = Caps;

    fn bitor(self, rhs: Caps) -> Caps {
        self.union(rhs)
    }
}

/// Per-tick behavior of a kind. Dispatched by `sim::behavior::dispatch`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Behavior {
    Falling,
    Cannon,
    Cannonball,
    EarnEnergy,
    Finish,
    Zombie,
}

/// Behavior argument: direction, energy amount, starting energy,
/// or the projectile kind a cannon fires.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Arg {
    #[default]
    None,
    Int(i32),
    Kind(KindId),
}

impl Arg {
    /// Integer payload; non-integer arguments read as 0.
    pub fn int(self) -> i32 {
        match self {
            Arg::Int(i) => i,
            _ => 0,
        }
    }

    pub fn kind(self) -> Option<KindId> {
        match self {
            Arg::Kind(k) => Some(k),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Kind {
    pub symbol: char,
    pub caps: Caps,
    pub behavior: Option<Behavior>,
    pub arg: Arg,
}

impl Kind {
    pub const fn new(symbol: char, caps: Caps, behavior: Option<Behavior>, arg: Arg) -> Self {
        Kind { symbol, caps, behavior, arg }
    }

    pub fn is_player(&self) -> bool {
        self.caps.contains(Caps::PLAYER)
    }

    /// No open side at all. Used by the draw-priority rule.
    pub fn is_closed(&self) -> bool {
        !self.caps.intersects(Caps::OPEN)
    }
}
