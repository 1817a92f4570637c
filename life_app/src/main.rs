// main.rs - Desktop front end for the sparse Game of Life engine
//
// The window never reads engine memory directly: it keeps its own copy of
// the board and patches it from the diffs the engine hands back.

use std::path::Path;
use std::sync::Arc;

use eframe::egui;
use egui::Color32;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use life_core::{
    CellChange, Coord, CycleDetector, LifeConfig, LifeEngine, SharedEngine, StepDiff, TickDriver,
    TokioScheduler, patterns, shared,
};

mod error;
mod ui;

use error::AppError;

const CONFIG_PATH: &str = "life-config.yaml";

fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = LifeConfig::load_or_default(Path::new(CONFIG_PATH))?;
    info!(
        size = config.grid.size,
        edge_policy = ?config.grid.edge_policy,
        base_period_ms = config.driver.base_period_ms,
        "configuration loaded"
    );

    let app = GameOfLife::new(&config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 950.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sparse Conway's Game of Life",
        options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| AppError::Ui { message: format!("{e}") })
}

pub struct GameOfLife {
    engine: SharedEngine,
    driver: TickDriver<TokioScheduler>,
    diffs: mpsc::UnboundedReceiver<StepDiff>,
    cycles: CycleDetector,

    pub size: i32,
    pub cells: Vec<bool>,  // Display copy, patched from diffs
    pub generation: u64,
    pub population: usize,
    pub live_color: Color32,
    pub dead_color: Color32,
    pub selected_pattern: usize,
    pub status: Option<String>,
    random_seed: u64,

    // Declared last so the ticker is cancelled before the runtime shuts down
    runtime: tokio::runtime::Runtime,
}

impl GameOfLife {
    pub fn new(config: &LifeConfig) -> Result<Self, AppError> {
        let runtime = tokio::runtime::Runtime::new()?;
        let engine = LifeEngine::with_policy(config.grid.size, config.grid.edge_policy)?;
        let size = engine.size();
        let cells = engine.cells().to_vec();
        let engine = shared(engine);

        let (scheduler, diffs) = TokioScheduler::new(Arc::clone(&engine), runtime.handle().clone());
        let driver = TickDriver::from_config(scheduler, &config.driver)?;

        Ok(Self {
            engine,
            driver,
            diffs,
            cycles: CycleDetector::new(),
            size,
            cells,
            generation: 0,
            population: 0,
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
            selected_pattern: 0,
            status: None,
            random_seed: 0,
            runtime,
        })
    }

    pub const fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn rate(&self) -> f64 {
        self.driver.rate()
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        let row = usize::try_from(coord.row).ok()?;
        let col = usize::try_from(coord.col).ok()?;
        let side = usize::try_from(self.size).ok()?;
        (row < side && col < side).then_some(row * side + col)
    }

    fn paint(&mut self, coord: Coord, alive: bool) {
        if let Some(cell) = self.index(coord).and_then(|i| self.cells.get_mut(i)) {
            *cell = alive;
        }
    }

    fn apply_diff(&mut self, diff: &StepDiff) {
        for &coord in &diff.unhighlighted {
            self.paint(coord, false);
        }
        for &coord in &diff.highlighted {
            self.paint(coord, true);
        }
        self.population = (self.population + diff.highlighted.len())
            .saturating_sub(diff.unhighlighted.len());
        self.generation = diff.generation;
    }

    fn flush_diffs(&mut self) -> bool {
        let mut received = false;
        while let Ok(diff) = self.diffs.try_recv() {
            self.apply_diff(&diff);
            received = true;
        }
        received
    }

    /// Run `f` under the engine lock, first applying every diff the ticker
    /// queued so the display stays in step order.
    fn with_engine<R>(&mut self, f: impl FnOnce(&mut LifeEngine) -> R) -> R {
        let engine = Arc::clone(&self.engine);
        let diffs = &mut self.diffs;
        let (queued, out) = self.runtime.block_on(async move {
            let mut guard = engine.lock().await;
            // The ticker sends under this lock, so nothing else can be in flight
            let mut queued = Vec::new();
            while let Ok(diff) = diffs.try_recv() {
                queued.push(diff);
            }
            (queued, f(&mut guard))
        });
        for diff in &queued {
            self.apply_diff(diff);
        }
        out
    }

    /// Apply whatever the periodic ticker produced since the last frame.
    pub fn drain_diffs(&mut self) {
        if self.flush_diffs() && self.is_running() && self.check_for_cycle() {
            self.driver.set_running(false);
            self.status = Some(format!("Cycle detected at generation {}", self.generation));
            info!(generation = self.generation, "cycle detected, pausing");
        }
    }

    fn check_for_cycle(&mut self) -> bool {
        let fingerprint = self.with_engine(|engine| engine.fingerprint());
        self.cycles.observe(fingerprint)
    }

    pub fn toggle_running(&mut self) {
        if self.driver.toggle_running() {
            self.status = None;
        }
    }

    pub fn speed_up(&mut self) {
        self.driver.speed_up();
    }

    pub fn slow_down(&mut self) {
        self.driver.slow_down();
    }

    pub fn step_once(&mut self) {
        let diff = self.with_engine(LifeEngine::step);
        self.apply_diff(&diff);
    }

    pub fn toggle_cell(&mut self, coord: Coord) {
        match self.with_engine(|engine| engine.toggle_cell(coord)) {
            Ok(CellChange::Highlighted) => {
                self.paint(coord, true);
                self.population += 1;
            }
            Ok(CellChange::Unhighlighted) => {
                self.paint(coord, false);
                self.population = self.population.saturating_sub(1);
            }
            Err(e) => warn!(error = %e, "toggle ignored"),
        }
        self.cycles.clear();
    }

    pub fn restart(&mut self) {
        self.driver.set_running(false);
        // Anything still queued was stepped before the reset
        let cleared = self.with_engine(LifeEngine::reset);
        for coord in cleared {
            self.paint(coord, false);
        }
        self.generation = 0;
        self.population = 0;
        self.cycles.clear();
        self.status = None;
    }

    fn load(&mut self, cells: Vec<Coord>) {
        self.driver.set_running(false);
        let diff = self.with_engine(|engine| engine.load_cells(cells));
        self.apply_diff(&diff);
        self.cycles.clear();
        self.status = None;
    }

    pub fn apply_selected_pattern(&mut self) {
        if let Some(pattern) = patterns::PATTERNS.get(self.selected_pattern) {
            let cells = pattern.centered(self.size).collect();
            self.load(cells);
        }
    }

    pub fn apply_random_pattern(&mut self) {
        self.random_seed = self.random_seed.wrapping_add(1);
        self.load(patterns::random_cells(self.size, self.random_seed));
    }
}
