//! Error boundary for a bounded region of rendered output.
//!
//! A region renders through [`ViewBoundary::render`]; a failure switches the
//! boundary to [`BoundaryState::Failed`] and the region shows its fallback
//! until [`ViewBoundary::retry`] is called.

use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_FALLBACK: &str = "Chart temporarily unavailable";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// A layout pass re-triggered itself and was deferred to the next frame.
    /// Known benign: the region keeps rendering normally.
    #[error("layout loop deferred")]
    LayoutLoop,
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("render failed: {0}")]
    Render(String),
}

impl ViewError {
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::LayoutLoop)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryState {
    Normal,
    Failed(String),
}

/// Output of one render attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Content(T),
    /// A benign error occurred; nothing to draw this pass.
    Deferred,
    Fallback(String),
}

impl<T> Rendered<T> {
    pub fn content(self) -> Option<T> {
        match self {
            Self::Content(value) => Some(value),
            _ => None,
        }
    }
}

impl Rendered<String> {
    /// Text to display: the content, the fallback message, or nothing.
    pub fn into_text(self) -> String {
        match self {
            Self::Content(text) | Self::Fallback(text) => text,
            Self::Deferred => String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewBoundary {
    region: String,
    fallback: String,
    state: BoundaryState,
}

impl ViewBoundary {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            fallback: DEFAULT_FALLBACK.to_string(),
            state: BoundaryState::Normal,
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, BoundaryState::Failed(_))
    }

    /// Runs `view` unless the boundary has already failed.
    pub fn render<T, F>(&mut self, view: F) -> Rendered<T>
    where
        F: FnOnce() -> Result<T, ViewError>,
    {
        if self.is_failed() {
            return Rendered::Fallback(self.fallback.clone());
        }
        match view() {
            Ok(value) => Rendered::Content(value),
            Err(err) if err.is_benign() => {
                debug!(region = %self.region, error = %err, "Benign view error ignored");
                Rendered::Deferred
            }
            Err(err) => {
                warn!(region = %self.region, error = %err, "View region failed");
                self.state = BoundaryState::Failed(err.to_string());
                Rendered::Fallback(self.fallback.clone())
            }
        }
    }

    pub fn retry(&mut self) {
        if self.is_failed() {
            debug!(region = %self.region, "Retrying view region");
        }
        self.state = BoundaryState::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_shows_fallback_until_retry() {
        let mut boundary = ViewBoundary::new("expense-chart");
        let out: Rendered<String> =
            boundary.render(|| Err(ViewError::InvalidData("NaN amount".into())));
        assert_eq!(out, Rendered::Fallback(DEFAULT_FALLBACK.to_string()));
        assert_eq!(
            boundary.state(),
            &BoundaryState::Failed("invalid data: NaN amount".into())
        );

        let mut called = false;
        let out = boundary.render(|| {
            called = true;
            Ok("chart".to_string())
        });
        assert!(!called);
        assert_eq!(out.into_text(), DEFAULT_FALLBACK);

        boundary.retry();
        assert_eq!(boundary.state(), &BoundaryState::Normal);
        let out = boundary.render(|| Ok("chart".to_string()));
        assert_eq!(out.content().as_deref(), Some("chart"));
    }

    #[test]
    fn layout_loop_is_benign() {
        let mut boundary = ViewBoundary::new("portfolio").with_fallback("n/a");
        let out: Rendered<()> = boundary.render(|| Err(ViewError::LayoutLoop));
        assert_eq!(out, Rendered::Deferred);
        assert_eq!(boundary.state(), &BoundaryState::Normal);
    }
}
