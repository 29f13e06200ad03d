/// Blocks: positioned instances of a kind living in the world.

use super::kind::KindId;

/// Handle of a block inside its `World`. Allocated monotonically and
/// never reused, so a handle held across a removal simply stops resolving.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BlockId(pub u64);

/// Cooldown categories, one counter each per block.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cooldown {
    Cannon,
    Cannonball,
    Falling,
    Zombie,
}

impl Cooldown {
    pub const COUNT: usize = 4;

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-block step counters for every cooldown category.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Cooldowns([u32; Cooldown::COUNT]);

impl Cooldowns {
    /// Count one step for `which`. Returns true when the counter reaches
    /// `threshold`, resetting it to zero; the caller acts only then.
    pub fn ready(&mut self, which: Cooldown, threshold: u32) -> bool {
        let counter = &mut self.0[which.index()];
        *counter += 1;
        if *counter >= threshold {
            *counter = 0;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    pub fn get(&self, which: Cooldown) -> u32 {
        self.0[which.index()]
    }

    pub fn reset(&mut self) {
        self.0 = [0; Cooldown::COUNT];
    }
}

#[derive(Clone, Debug)]
pub struct Block {
    pub kind: KindId,
    pub x: i32,
    pub y: i32,
    pub cooldowns: Cooldowns,
    /// Health of player-capable blocks; <= 0 is dead.
    pub energy: i32,
}

impl Block {
    pub fn new(kind: KindId, x: i32, y: i32) -> Self {
        Block { kind, x, y, cooldowns: Cooldowns::default(), energy: 0 }
    }

    #[inline]
    pub fn at(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }
}
