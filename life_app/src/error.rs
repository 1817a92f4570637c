// error.rs - Error types for the desktop front end

use life_core::LifeError;

/// Top-level error for the app binary, propagated from `main` with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration or engine construction failed.
    #[error("engine error: {source}")]
    Life {
        #[from]
        source: LifeError,
    },

    /// The tokio runtime could not be created.
    #[error("failed to start async runtime: {source}")]
    Runtime {
        #[from]
        source: std::io::Error,
    },

    /// The window could not be opened or crashed.
    #[error("ui error: {message}")]
    Ui {
        /// Description of the eframe failure.
        message: String,
    },
}
