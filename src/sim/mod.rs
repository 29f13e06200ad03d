pub mod behavior;
pub mod event;
pub mod game;
pub mod level;
pub mod movement;
pub mod step;
pub mod world;
