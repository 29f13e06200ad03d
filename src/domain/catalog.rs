/// The catalog: the ordered, immutable table of tile kinds.
///
/// Definition order matters. `sim::step` runs behaviors in this order:
/// gravity (vacuum), the energy pickup, the exits, the cannons, the
/// cannonballs, then the zombie. A ball fired this step is already
/// counted by the cannonball pass of the same step.
///
/// ## Standard legend
///   ' ' = vacuum (background, runs gravity)   'o' 'a' = players
///   '_' = ledge (sticky, jump takeoff)        '|' = wall
///   '*' = energy pickup                       ')' '(' = exits
///   't' 'j' = cannons (fire right / left)     '.' ',' = cannonballs
///   '#' '@' = pushable boxes                  'x' = zombie

use thiserror::Error;

use super::kind::{Arg, Behavior, Caps, Kind, KindId};

/// Symbol of the background kind. Every level cell holds at least one
/// block; spaces in level text become vacuum blocks.
pub const VACUUM: char = ' ';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate kind symbol '{0}'")]
    DuplicateSymbol(char),
    #[error("catalog has no vacuum kind (' ')")]
    MissingVacuum,
    #[error("kind '{kind}' references unknown kind '{target}'")]
    UnknownReference { kind: char, target: char },
}

/// Argument as written in a kind table; kind references are by symbol
/// and get resolved to `KindId`s when the catalog is built.
#[derive(Clone, Copy, Debug)]
pub enum ArgSpec {
    None,
    Int(i32),
    Kind(char),
}

#[derive(Clone, Copy, Debug)]
pub struct KindSpec {
    pub symbol: char,
    pub caps: Caps,
    pub behavior: Option<Behavior>,
    pub arg: ArgSpec,
}

const fn spec(symbol: char, caps: Caps, behavior: Option<Behavior>, arg: ArgSpec) -> KindSpec {
    KindSpec { symbol, caps, behavior, arg }
}

const STANDARD: &[KindSpec] = &[
    spec(VACUUM, Caps::OPEN, Some(Behavior::Falling), ArgSpec::None),
    spec('o', Caps::PLAYER.union(Caps::OPEN).union(Caps::FALL), None, ArgSpec::Int(2)),
    spec('a', Caps::PLAYER.union(Caps::OPEN).union(Caps::FALL), None, ArgSpec::Int(2)),
    spec('_', Caps::OPEN.union(Caps::STICK).union(Caps::JUMP_FROM), None, ArgSpec::None),
    spec('|', Caps::NONE, None, ArgSpec::None),
    spec('*', Caps::OPEN, Some(Behavior::EarnEnergy), ArgSpec::Int(2)),
    spec(')', Caps::OPEN_LEFT.union(Caps::STICK), Some(Behavior::Finish), ArgSpec::None),
    spec('(', Caps::OPEN_RIGHT.union(Caps::STICK), Some(Behavior::Finish), ArgSpec::None),
    spec('t', Caps::NONE, Some(Behavior::Cannon), ArgSpec::Kind('.')),
    spec('j', Caps::NONE, Some(Behavior::Cannon), ArgSpec::Kind(',')),
    spec('.', Caps::OPEN, Some(Behavior::Cannonball), ArgSpec::Int(1)),
    spec(',', Caps::OPEN, Some(Behavior::Cannonball), ArgSpec::Int(-1)),
    spec('#', Caps::FALL.union(Caps::PUSHABLE), None, ArgSpec::None),
    spec('@', Caps::FALL.union(Caps::PUSHABLE), None, ArgSpec::None),
    spec('x', Caps::PLAYER.union(Caps::AI).union(Caps::OPEN).union(Caps::FALL), Some(Behavior::Zombie), ArgSpec::Int(8)),
];

#[derive(Clone, Debug)]
pub struct Catalog {
    kinds: Vec<Kind>,
    vacuum: KindId,
}

impl Catalog {
    /// The built-in kind table.
    pub fn standard() -> Self {
        // The static table is covered by tests; it cannot fail to resolve.
        match Catalog::from_specs(STANDARD) {
            Ok(c) => c,
            Err(e) => unreachable!("standard catalog is invalid: {e}"),
        }
    }

    pub fn from_specs(specs: &[KindSpec]) -> Result<Self, CatalogError> {
        for (i, s) in specs.iter().enumerate() {
            if specs[..i].iter().any(|p| p.symbol == s.symbol) {
                return Err(CatalogError::DuplicateSymbol(s.symbol));
            }
        }

        let lookup = |sym: char| specs.iter().position(|s| s.symbol == sym).map(KindId);

        let mut kinds = Vec::with_capacity(specs.len());
        for s in specs {
            let arg = match s.arg {
                ArgSpec::None => Arg::None,
                ArgSpec::Int(i) => Arg::Int(i),
                ArgSpec::Kind(target) => match lookup(target) {
                    Some(id) => Arg::Kind(id),
                    None => return Err(CatalogError::UnknownReference { kind: s.symbol, target }),
                },
            };
            kinds.push(Kind::new(s.symbol, s.caps, s.behavior, arg));
        }

        let vacuum = lookup(VACUUM).ok_or(CatalogError::MissingVacuum)?;
        Ok(Catalog { kinds, vacuum })
    }

    #[inline]
    pub fn kind(&self, id: KindId) -> &Kind {
        &self.kinds[id.0]
    }

    #[inline]
    pub fn caps(&self, id: KindId) -> Caps {
        self.kinds[id.0].caps
    }

    pub fn by_symbol(&self, symbol: char) -> Option<KindId> {
        self.kinds.iter().position(|k| k.symbol == symbol).map(KindId)
    }

    pub fn vacuum(&self) -> KindId {
        self.vacuum
    }

    /// Kinds in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (KindId, &Kind)> {
        self.kinds.iter().enumerate().map(|(i, k)| (KindId(i), k))
    }
}
