// error.rs - Error types for the life engine
// Only malformed input fails: a bad configuration at construction time or an
// off-board coordinate passed to a cell operation. Both are rejected before
// any state is touched.

use crate::grid::Coord;

#[derive(Debug, thiserror::Error)]
pub enum LifeError {
    /// Grid size, speed table or timing values cannot be used.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong with the value.
        reason: String,
    },

    /// A coordinate outside `[0, size)` on either axis.
    #[error("cell {coord} is outside the {size}x{size} grid")]
    OutOfBounds {
        /// The rejected coordinate.
        coord: Coord,
        /// Side length of the grid.
        size: i32,
    },

    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        #[from]
        source: serde_yml::Error,
    },
}

impl LifeError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }
}
