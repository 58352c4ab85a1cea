pub mod game;
pub mod terrain;
pub mod world;
