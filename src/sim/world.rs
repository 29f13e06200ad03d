/// World: the live block collection of one level.
///
/// ## Storage
///
/// Blocks live in a map keyed by `BlockId`. Ids are handed out in
/// increasing order and never reused, so:
///   - a behavior can snapshot the ids it wants to visit, mutate the
///     world freely, and skip ids that no longer resolve;
///   - blocks spawned mid-pass are never visited by the pass that
///     spawned them.
///
/// ## Scan order
///
/// Every "first block found" query walks the world newest block first.
/// The draw-priority rule below depends on it: a projectile entering a
/// vacuum cell is shown instead of the older vacuum block.
///
/// ## Draw priority (per cell)
///
///   1. the first player-capable block
///   2. else the first block with no open side
///   3. else the first block
///
/// Coordinates are 1-based, y grows downward.

use std::collections::BTreeMap;

use crate::domain::block::{Block, BlockId};
use crate::domain::catalog::Catalog;
use crate::domain::kind::{Caps, KindId};

/// One living or dead player-capable block, for the status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerStatus {
    pub symbol: char,
    pub energy: i32,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Default)]
pub struct World {
    blocks: BTreeMap<BlockId, Block>,
    next_id: u64,
    pub width: i32,
    pub height: i32,
}

// ── Construction / mutation ──

impl World {
    pub fn new(width: i32, height: i32) -> Self {
        World { blocks: BTreeMap::new(), next_id: 0, width, height }
    }

    /// Add a fresh block (zero energy, zero cooldowns).
    pub fn spawn(&mut self, kind: KindId, x: i32, y: i32) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.blocks.insert(id, Block::new(kind, x, y));
        id
    }

    /// Apply a deferred removal list collected during a pass.
    pub fn remove_all(&mut self, ids: &[BlockId]) {
        for id in ids {
            self.blocks.remove(id);
        }
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(&id)
    }
}

// ── Queries (scan order: newest first) ──

impl World {
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter().rev().map(|(id, b)| (*id, b))
    }

    /// Snapshot of the ids of every block matching `pred`, in scan order.
    pub fn ids_where(&self, mut pred: impl FnMut(&Block) -> bool) -> Vec<BlockId> {
        self.iter().filter(|(_, b)| pred(b)).map(|(id, _)| id).collect()
    }

    /// Snapshot of the ids of every block of `kind`.
    pub fn ids_of_kind(&self, kind: KindId) -> Vec<BlockId> {
        self.ids_where(|b| b.kind == kind)
    }

    /// All blocks occupying (x, y).
    pub fn at(&self, x: i32, y: i32) -> impl Iterator<Item = (BlockId, &Block)> {
        self.iter().filter(move |(_, b)| b.at(x, y))
    }

    /// Does any block occupy (x, y)?
    pub fn occupied(&self, x: i32, y: i32) -> bool {
        self.at(x, y).next().is_some()
    }

    /// First player-capable block at (x, y), excluding `skip`.
    pub fn player_at(&self, catalog: &Catalog, x: i32, y: i32, skip: Option<BlockId>) -> Option<BlockId> {
        self.at(x, y)
            .find(|(id, b)| Some(*id) != skip && catalog.caps(b.kind).contains(Caps::PLAYER))
            .map(|(id, _)| id)
    }

    /// The draw-priority block of (x, y). See module docs.
    pub fn top_at(&self, catalog: &Catalog, x: i32, y: i32) -> Option<BlockId> {
        let mut first = None;
        let mut closed = None;
        for (id, b) in self.at(x, y) {
            let kind = catalog.kind(b.kind);
            if kind.is_player() {
                return Some(id);
            }
            if closed.is_none() && kind.is_closed() {
                closed = Some(id);
            }
            if first.is_none() {
                first = Some(id);
            }
        }
        closed.or(first)
    }

    /// One draw-priority block per occupied cell, for the renderer.
    pub fn visible(&self, catalog: &Catalog) -> Vec<(BlockId, &Block)> {
        let mut cells: Vec<(i32, i32)> = self.blocks.values().map(|b| (b.x, b.y)).collect();
        cells.sort_unstable();
        cells.dedup();
        cells
            .into_iter()
            .filter_map(|(x, y)| self.top_at(catalog, x, y))
            .filter_map(|id| self.get(id).map(|b| (id, b)))
            .collect()
    }

    /// Every player-capable block, oldest first (stable status line order).
    pub fn players(&self, catalog: &Catalog) -> Vec<PlayerStatus> {
        self.blocks
            .values()
            .filter(|b| catalog.kind(b.kind).is_player())
            .map(|b| PlayerStatus {
                symbol: catalog.kind(b.kind).symbol,
                energy: b.energy,
                x: b.x,
                y: b.y,
            })
            .collect()
    }

    /// Player-capable blocks with energy > 0.
    pub fn living_players(&self, catalog: &Catalog) -> Vec<BlockId> {
        self.ids_where(|b| catalog.kind(b.kind).is_player() && b.energy > 0)
    }
}

// ── Test helper: build a world from a diagram ──
