// lib.rs - Sparse Conway's Game of Life
//
// The engine only evaluates cells that are alive or next to a live cell,
// and reports each step as lists of cells that turned on and off. The
// driver decides when steps happen.

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod grid;
pub mod history;
pub mod patterns;
pub mod reference;

pub use config::{DriverConfig, GridConfig, LifeConfig};
pub use driver::{Scheduler, SharedEngine, SpeedControl, TickDriver, TokioScheduler, shared, step_shared};
pub use engine::{CellChange, LifeEngine, MAX_GRID_SIZE, StepDiff};
pub use error::LifeError;
pub use grid::{Coord, EdgePolicy};
pub use history::CycleDetector;
