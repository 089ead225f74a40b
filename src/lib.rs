pub mod ambient;
pub mod camera;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod effects;
pub mod events;
pub mod input;
pub mod layout;
pub mod model;
pub mod physics;
pub mod picking;
pub mod scene;
pub mod sim;
pub mod time;
pub mod vehicle;

pub use sim::Simulation;
