// driver.rs - Tick driver: decides when the engine steps
// TickDriver holds the running flag and the speed, and tells a Scheduler to
// arm or cancel a periodic step. TokioScheduler steps a SharedEngine from a
// tokio task and streams each StepDiff over a channel. Every step, periodic
// or manual, happens under the one engine mutex, and the ticker queues its
// diff before releasing it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::engine::{LifeEngine, StepDiff};
use crate::error::LifeError;
use crate::grid::Coord;

pub const DEFAULT_SPEED_OPTIONS: [f64; 5] = [0.25, 0.5, 1.0, 1.5, 2.0];
pub const DEFAULT_SPEED_INDEX: usize = 2;
pub const DEFAULT_BASE_PERIOD: Duration = Duration::from_secs(2);

// Floor for a scheduled period; tokio intervals reject zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

pub type SharedEngine = Arc<Mutex<LifeEngine>>;

pub fn shared(engine: LifeEngine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

/// One manual step, serialized with any periodic stepping.
pub async fn step_shared(engine: &SharedEngine) -> StepDiff {
    engine.lock().await.step()
}

/// Ordered list of rate multipliers with exactly one selected.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedControl {
    options: Vec<f64>,
    index: usize,
}

impl SpeedControl {
    pub fn new(options: Vec<f64>, index: usize) -> Result<Self, LifeError> {
        if options.is_empty() {
            return Err(LifeError::invalid("speed options must not be empty"));
        }
        if let Some(bad) = options.iter().find(|r| !r.is_finite() || **r <= 0.0) {
            return Err(LifeError::invalid(format!("speed option {bad} must be finite and positive")));
        }
        if index >= options.len() {
            return Err(LifeError::invalid(format!(
                "speed index {index} out of range for {} options",
                options.len()
            )));
        }
        Ok(Self { options, index })
    }

    pub fn options(&self) -> &[f64] {
        &self.options
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn rate(&self) -> f64 {
        self.options[self.index]
    }

    /// Move the selection by `delta`, clamped to the ends of the list.
    pub fn adjust(&mut self, delta: i32) -> f64 {
        let steps = usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX);
        let target = if delta >= 0 {
            self.index.saturating_add(steps)
        } else {
            self.index.saturating_sub(steps)
        };
        self.index = target.min(self.options.len() - 1);
        self.rate()
    }

    /// Time between steps: `base / rate`.
    pub fn period(&self, base: Duration) -> Duration {
        Duration::try_from_secs_f64(base.as_secs_f64() / self.rate())
            .unwrap_or(Duration::MAX)
            .max(MIN_PERIOD)
    }
}

impl Default for SpeedControl {
    fn default() -> Self {
        Self {
            options: DEFAULT_SPEED_OPTIONS.to_vec(),
            index: DEFAULT_SPEED_INDEX,
        }
    }
}

/// Something that can call the engine's step periodically.
///
/// `arm` replaces any previous schedule. After `cancel` returns no further
/// step may begin.
pub trait Scheduler {
    fn arm(&mut self, period: Duration);
    fn cancel(&mut self);
}

#[derive(Debug)]
pub struct TickDriver<S> {
    scheduler: S,
    speed: SpeedControl,
    base_period: Duration,
    running: bool,
}

impl<S: Scheduler> TickDriver<S> {
    /// A stopped driver.
    pub const fn new(scheduler: S, speed: SpeedControl, base_period: Duration) -> Self {
        Self {
            scheduler,
            speed,
            base_period,
            running: false,
        }
    }

    pub fn from_config(scheduler: S, config: &DriverConfig) -> Result<Self, LifeError> {
        if config.base_period_ms == 0 {
            return Err(LifeError::invalid("base period must be positive"));
        }
        Ok(Self::new(scheduler, config.speed_control()?, config.base_period()))
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    pub fn rate(&self) -> f64 {
        self.speed.rate()
    }

    pub const fn speed(&self) -> &SpeedControl {
        &self.speed
    }

    pub fn period(&self) -> Duration {
        self.speed.period(self.base_period)
    }

    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Start or stop periodic stepping. Starting while running re-arms.
    pub fn set_running(&mut self, running: bool) {
        self.scheduler.cancel();
        self.running = running;
        if running {
            let period = self.period();
            self.scheduler.arm(period);
            info!(rate = self.rate(), period_ms = period.as_millis(), "driver running");
        } else {
            info!("driver paused");
        }
    }

    /// Flip between running and paused; returns the new state.
    pub fn toggle_running(&mut self) -> bool {
        self.set_running(!self.running);
        self.running
    }

    /// Step the speed selection by `delta` (clamped) and re-arm at the new
    /// rate if running. Returns the rate now in effect.
    pub fn adjust_speed(&mut self, delta: i32) -> f64 {
        let rate = self.speed.adjust(delta);
        if self.running {
            self.scheduler.cancel();
            self.scheduler.arm(self.period());
        }
        info!(rate, index = self.speed.index(), "speed changed");
        rate
    }

    pub fn speed_up(&mut self) -> f64 {
        self.adjust_speed(1)
    }

    pub fn slow_down(&mut self) -> f64 {
        self.adjust_speed(-1)
    }

    /// Pause, then clear the board. Returns the cells unhighlighted.
    pub async fn restart(&mut self, engine: &SharedEngine) -> Vec<Coord> {
        self.set_running(false);
        engine.lock().await.reset()
    }
}

/// Steps a [`SharedEngine`] from a tokio task.
#[derive(Debug)]
pub struct TokioScheduler {
    engine: SharedEngine,
    runtime: Handle,
    diffs: mpsc::UnboundedSender<StepDiff>,
    epoch: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl TokioScheduler {
    /// The receiver yields one diff per periodic step.
    pub fn new(engine: SharedEngine, runtime: Handle) -> (Self, mpsc::UnboundedReceiver<StepDiff>) {
        let (diffs, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            engine,
            runtime,
            diffs,
            epoch: Arc::new(AtomicU64::new(0)),
            task: None,
        };
        (scheduler, rx)
    }

    pub const fn is_armed(&self) -> bool {
        self.task.is_some()
    }
}

impl Scheduler for TokioScheduler {
    fn arm(&mut self, period: Duration) {
        self.cancel();
        let armed_at = self.epoch.load(Ordering::Acquire);
        let ticker = run_ticks(
            Arc::clone(&self.engine),
            period.max(MIN_PERIOD),
            Arc::clone(&self.epoch),
            armed_at,
            self.diffs.clone(),
        );
        self.task = Some(self.runtime.spawn(ticker));
    }

    fn cancel(&mut self) {
        // Checked under the engine lock, so a tick that is already waiting
        // on the lock bails out instead of stepping.
        self.epoch.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_ticks(
    engine: SharedEngine,
    period: Duration,
    epoch: Arc<AtomicU64>,
    armed_at: u64,
    diffs: mpsc::UnboundedSender<StepDiff>,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let mut guard = engine.lock().await;
        if epoch.load(Ordering::Acquire) != armed_at {
            break;
        }
        // Queued before the guard drops, so a lock holder sees every step's diff
        if diffs.send(guard.step()).is_err() {
            debug!("diff receiver dropped, ticker exiting");
            break;
        }
    }
}
