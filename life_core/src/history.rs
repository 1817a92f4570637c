// history.rs - Detects when the board falls into a short cycle

const HISTORY_LEN: usize = 10;

/// Remembers the fingerprints of the last few generations.
#[derive(Debug, Clone, Default)]
pub struct CycleDetector {
    history: [u64; HISTORY_LEN],
    count: usize,
}

impl CycleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `fingerprint`; true if it was seen within the window.
    pub fn observe(&mut self, fingerprint: u64) -> bool {
        let seen = self.history.len().min(self.count);
        if self.history[..seen].contains(&fingerprint) { return true; }
        self.history[self.count % HISTORY_LEN] = fingerprint;
        self.count += 1;
        false
    }

    pub fn clear(&mut self) {
        self.history = [0; HISTORY_LEN];
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LifeEngine;
    use crate::grid::Coord;

    #[test]
    fn blinker_is_caught_on_its_period() {
        let mut engine = LifeEngine::new(5).unwrap();
        for col in 1..4 {
            engine.toggle_cell(Coord::new(2, col)).unwrap();
        }
        let mut detector = CycleDetector::new();
        assert!(!detector.observe(engine.fingerprint()));
        engine.step();
        assert!(!detector.observe(engine.fingerprint()));
        engine.step();
        assert!(detector.observe(engine.fingerprint()));
    }

    #[test]
    fn empty_history_does_not_match_zero() {
        let mut detector = CycleDetector::new();
        assert!(!detector.observe(0));
        assert!(detector.observe(0));
        detector.clear();
        assert!(!detector.observe(0));
    }

    #[test]
    fn window_forgets_old_generations() {
        let mut detector = CycleDetector::new();
        for fp in 1..=11 {
            assert!(!detector.observe(fp));
        }
        // 1 was overwritten by 11
        assert!(!detector.observe(1));
        assert!(detector.observe(11));
    }
}
