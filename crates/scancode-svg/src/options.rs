//! Animation parameters

use crate::error::{Result, SvgError};

/// Default animation duration in seconds
pub const DEFAULT_DURATION: f64 = 2.5;

/// Default stagger step between consecutive bars in seconds
pub const DEFAULT_DELAY_STEP: f64 = 0.06;

/// Widest rect the dimension fallback still treats as a bar
pub const DEFAULT_MAX_BAR_WIDTH: f64 = 50.0;

/// Tallest rect the dimension fallback still treats as a bar
pub const DEFAULT_MAX_BAR_HEIGHT: f64 = 200.0;

/// Parameters of one animation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationOptions {
    /// Length of one wiggle cycle in seconds
    pub duration: f64,

    /// Delay added per bar index, in seconds
    pub delay_step: f64,

    /// Dimension fallback: rects wider than this are background shapes
    pub max_bar_width: f64,

    /// Dimension fallback: rects taller than this are background shapes
    pub max_bar_height: f64,
}

impl Default for AnimationOptions {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationOptions {
    /// Options with the stock values
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            delay_step: DEFAULT_DELAY_STEP,
            max_bar_width: DEFAULT_MAX_BAR_WIDTH,
            max_bar_height: DEFAULT_MAX_BAR_HEIGHT,
        }
    }

    /// Set the cycle duration
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Set the per-bar stagger step
    #[inline]
    #[must_use]
    pub fn with_delay_step(mut self, delay_step: f64) -> Self {
        self.delay_step = delay_step;
        self
    }

    /// Check that every value is usable in a CSS animation
    ///
    /// # Errors
    ///
    /// Returns `SvgError::InvalidOptions` for a non-positive or non-finite
    /// duration, a negative or non-finite delay step, or negative thresholds.
    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(SvgError::InvalidOptions(format!(
                "duration must be a positive number of seconds, got {}",
                self.duration
            )));
        }
        if !self.delay_step.is_finite() || self.delay_step < 0.0 {
            return Err(SvgError::InvalidOptions(format!(
                "delay step must be zero or more seconds, got {}",
                self.delay_step
            )));
        }
        if self.max_bar_width.is_nan() || self.max_bar_width < 0.0 {
            return Err(SvgError::InvalidOptions(format!(
                "max bar width must not be negative, got {}",
                self.max_bar_width
            )));
        }
        if self.max_bar_height.is_nan() || self.max_bar_height < 0.0 {
            return Err(SvgError::InvalidOptions(format!(
                "max bar height must not be negative, got {}",
                self.max_bar_height
            )));
        }
        Ok(())
    }
}
