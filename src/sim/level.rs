/// Level loading.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by name)
///   2. Built-in embedded levels
///
/// ## Level file format (`.txt`):
///   Optional line 1: `; Level name`
///   Remaining lines: map rows
///
/// Every character of a map row other than the line separator becomes
/// one block, looked up in the catalog by symbol (a space is vacuum).
/// Players and gravity-subject kinds get a vacuum block underneath.
/// Rows are NOT padded: past the end of a short row there is nothing,
/// and nothing is never enterable.

use std::path::Path;

use thiserror::Error;

use crate::domain::catalog::{Catalog, CatalogError};
use crate::domain::kind::Caps;
use crate::sim::world::World;

const LINESEP: char = '\n';
const NAME_PREFIX: char = ';';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("unknown object '{symbol}' at {x}x{y}")]
    UnknownSymbol { symbol: char, x: i32, y: i32 },
    #[error("level {0} does not exist")]
    NoSuchLevel(usize),
    #[error("no levels to play")]
    NoLevels,
    #[error("level \"{name}\": {source}")]
    InLevel { name: String, source: Box<LevelError> },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Level source text with its display name.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub map: String,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Build a world from level text.
///
/// Width is the longest row, height the number of rows. Player blocks
/// start with their kind's integer argument as energy.
pub fn load_level(catalog: &Catalog, map: &str) -> Result<World, LevelError> {
    let mut world = World::new(0, 0);
    let (mut x, mut y) = (1, 1);
    let mut rows = 0;

    for ch in map.chars() {
        if ch == LINESEP {
            y += 1;
            x = 1;
            continue;
        }
        let kind = catalog
            .by_symbol(ch)
            .ok_or(LevelError::UnknownSymbol { symbol: ch, x, y })?;
        world.spawn(kind, x, y);
        if catalog.caps(kind).intersects(Caps::PLAYER | Caps::FALL) {
            world.spawn(catalog.vacuum(), x, y);
        }
        world.width = world.width.max(x);
        rows = y;
        x += 1;
    }
    world.height = rows;

    // Players enter the level with their starting energy.
    for id in world.ids_where(|b| catalog.kind(b.kind).is_player() && b.energy == 0) {
        if let Some(b) = world.get_mut(id) {
            b.energy = catalog.kind(b.kind).arg.int();
        }
    }

    Ok(world)
}

/// Level list: `levels_dir` if it holds any `.txt` level, else embedded.
pub fn level_list(levels_dir: &Path) -> Vec<LevelDef> {
    if levels_dir.is_dir() {
        let mut levels = load_from_directory(levels_dir);
        if !levels.is_empty() {
            levels.sort_by(|a, b| a.0.cmp(&b.0));
            log::info!("loaded {} levels from {}", levels.len(), levels_dir.display());
            return levels.into_iter().map(|(_, def)| def).collect();
        }
    }
    embedded_levels()
}

/// Parse a single level from file content.
pub fn parse_level_file(content: &str, fallback_name: &str) -> Option<LevelDef> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];

    for (i, line) in content.lines().enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if i == 0 && line.starts_with(NAME_PREFIX) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line);
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return None;
    }
    if name.is_empty() {
        name = fallback_name.to_string();
    }

    Some(LevelDef { name, map: rows.join("\n") })
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<(String, LevelDef)> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("cannot read {}: {e}", dir.display());
            return results;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "txt") {
            let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    if let Some(def) = parse_level_file(&content, &stem) {
                        let filename = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                        results.push((filename, def));
                    } else {
                        log::warn!("{} holds no map rows, skipped", path.display());
                    }
                }
                Err(e) => log::warn!("cannot read {}: {e}", path.display()),
            }
        }
    }

    results
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Reach the exit", &[
            "           ",
            "         # ",
            "o    _   #)",
            "#___| |____",
        ]),
        make_embedded("Reach the exit", &[
            "         # ",
            "       _ # ",
            "o    __  #)",
            "#___|  |___",
        ]),
        make_embedded("Reach the exit", &[
            "         #  ",
            "         #  ",
            "       _ # _",
            "o    __  #)",
            "#___|  |___",
        ]),
        make_embedded("Run", &[
            "(________    j",
            "         #   |",
            "         #   |",
            "o        #_  |",
            "_________| |_|",
        ]),
        make_embedded("Climb up", &[
            "t      )|",
            "|   ___ |",
            "| #     j",
            "| __    |",
            "t   _   |",
            "| # o   |",
            "|_______|",
        ]),
        make_embedded("Steep fall", &[
            "t  o    |",
            "|  _    |",
            "|       j",
            "|    _  |",
            "t       |",
            "|    @  |",
            "|  _    |",
            "|       |",
            "|  #    |____",
            "|    _       |",
            "t            |",
            "|            j",
            "t  _         |",
            "|_____       j   __ ",
            "|______      |__| *|",
            "|                  |",
            "|      ____________|",
            "|       |",
            "|       |",
            "|    _  |",
            "|       |",
            "|       |",
            "|       |",
            "|       |",
            "|   _   |",
            "|       |________",
            "t________________)",
        ]),
        make_embedded("Welcome to the arena", &[
            "                            ______|",
            "o   _                     *|___   |",
            "_ _| |____ ____________________j_ |",
            " _ __| a ___        #             |",
            "__    __ _#_______ _ ____@______  |",
            "   _ |    #                     _ |",
            "    _|    *                 _   *_|",
            "   _ |  _______ _ _____ ____  ____j",
            "    _|                 _          |",
            "   _ |t                 _         |",
            "  * _|*|                  _       |__",
            "t ________ _________________ ________)",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef { name: name.to_string(), map: map.join("\n") }
}
