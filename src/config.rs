//! Default timings for the injectors.

use crate::event::ScrollUnit;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Keyboard injector settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyboardSettings {
    /// Pause after each character in [`type_text`](crate::KeyboardController::type_text).
    pub type_delay: Duration,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            type_delay: Duration::from_millis(50),
        }
    }
}

/// Mouse injector settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MouseSettings {
    /// Pause between interpolated steps and between repeated clicks.
    pub step_delay: Duration,
    /// Steps used by [`drag`](crate::MouseController::drag) when none are given.
    /// Long drags need more steps to follow the path closely.
    pub drag_steps: usize,
    /// Unit of scroll deltas.
    pub scroll_unit: ScrollUnit,
}

impl Default for MouseSettings {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(5),
            drag_steps: 20,
            scroll_unit: ScrollUnit::Pixel,
        }
    }
}
