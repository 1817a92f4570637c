// reference.rs - Full-grid stepper used to cross-check the sparse engine
//
// Every cell is recomputed every tick on a clipped finite board. This is
// the standard rule the `Clipped` edge policy must reproduce exactly.

use crate::engine::next_state;

/// One generation of `cells`, a row-major `size` x `size` board.
pub fn naive_step(cells: &[bool], size: usize) -> Vec<bool> {
    let mut next = vec![false; size * size];
    for row in 0..size {
        for col in 0..size {
            let mut count = 0;
            for nr in row.saturating_sub(1)..=(row + 1).min(size - 1) {
                for nc in col.saturating_sub(1)..=(col + 1).min(size - 1) {
                    if (nr, nc) != (row, col) && cells[nr * size + nc] { count += 1; }
                }
            }
            next[row * size + col] = next_state(cells[row * size + col], count);
        }
    }
    next
}
