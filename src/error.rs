use thiserror::Error;

/// Errors returned by the plotting functions.
#[derive(Debug, Error)]
pub enum PlotError {
    /// Malformed or inconsistent input data or configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Failure while drawing the figure or writing the output file.
    #[error("render failed: {0}")]
    Render(String),
}

impl PlotError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        PlotError::InvalidInput(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        PlotError::Render(msg.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PlotError::InvalidInput(_))
    }

    pub fn is_render(&self) -> bool {
        matches!(self, PlotError::Render(_))
    }
}

pub type Result<T> = std::result::Result<T, PlotError>;
