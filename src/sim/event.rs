/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and the log.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    ProjectileFired { x: i32, y: i32 },
    ProjectileExpired { x: i32, y: i32 },
    PlayerHit { symbol: char, energy: i32 },
    EnergyCollected { symbol: char, amount: i32 },
    FellOut { x: i32, y: i32 },
    PlayerDied { symbol: char },
    LevelCleared { level: usize },
}
