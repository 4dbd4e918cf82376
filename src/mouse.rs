//! Pointer injection: cursor position, motion, clicks, drags and scrolling.
//!
//! Every operation reads the cursor once on entry and computes its whole path
//! from that snapshot, so the events it posts cannot feed back into it.

use crate::backend::EventBackend;
use crate::config::MouseSettings;
use crate::error::Result;
use crate::event::{Button, EventKind, Position};
use crate::platform;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

/// Wheel axes used for every synthetic scroll (vertical and horizontal).
const SCROLL_AXES: u32 = 2;

/// Intermediate positions of a smooth motion from `start` by `(dx, dy)`.
///
/// Step `i` of `steps` lies at `start + (dx, dy) * i / steps`, each computed
/// from `start` so rounding does not accumulate. The last position is the
/// target. `steps == 0` is treated as a single step.
pub fn motion_plan(start: Position, dx: f64, dy: f64, steps: usize) -> Vec<Position> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|i| {
            let fraction = i as f64 / steps as f64;
            start.offset(dx * fraction, dy * fraction)
        })
        .collect()
}

/// Per-step `(dx, dy)` deltas splitting a scroll over `steps` events.
///
/// Even divisions give identical steps; an uneven remainder is spread so the
/// deltas always sum to the requested totals.
pub fn scroll_plan(dx: i32, dy: i32, steps: usize) -> Vec<(i32, i32)> {
    let steps = steps.max(1) as i64;
    let share = |total: i32, i: i64| (total as i64 * i / steps) as i32;
    (1..=steps)
        .map(|i| {
            (
                share(dx, i) - share(dx, i - 1),
                share(dy, i) - share(dy, i - 1),
            )
        })
        .collect()
}

/// Synthesizes pointer input.
///
/// Coordinates are global screen points with the origin at the top-left of
/// the main display. Positive `dx` moves right and positive `dy` moves down;
/// for scrolling, positive `dy` scrolls up and positive `dx` scrolls left.
///
/// Delays are blocking sleeps on the calling thread. Offload long motions to
/// another thread when the caller must stay responsive.
///
/// # Example
///
/// ```no_run
/// use inputkit::{Button, MouseController};
///
/// let mouse = MouseController::system()?;
/// mouse.move_by(200.0, 0.0)?;
/// mouse.click(Button::Left, 2)?;
/// mouse.drag(0.0, 300.0, Button::Left)?;
/// # Ok::<(), inputkit::Error>(())
/// ```
#[derive(Clone)]
pub struct MouseController {
    backend: Arc<dyn EventBackend>,
    settings: MouseSettings,
}

impl MouseController {
    /// Create a controller posting through `backend`.
    pub fn new(backend: Arc<dyn EventBackend>) -> Self {
        Self {
            backend,
            settings: MouseSettings::default(),
        }
    }

    /// Create a controller posting to the running OS.
    pub fn system() -> Result<Self> {
        Ok(Self::new(platform::system_backend()?))
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: MouseSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Current settings.
    pub fn settings(&self) -> &MouseSettings {
        &self.settings
    }

    /// Current cursor position.
    pub fn position(&self) -> Result<Position> {
        self.backend.cursor_position()
    }

    /// Warp the cursor by posting a plain motion event at `position`.
    ///
    /// Off-screen coordinates are passed through; the OS clamps them.
    pub fn set_position(&self, position: impl Into<Position>) -> Result<()> {
        self.backend
            .post_mouse_event(EventKind::MouseMoved, position.into(), Button::Left, None)
    }

    /// Move the cursor by `(dx, dy)` in one step.
    pub fn move_by(&self, dx: f64, dy: f64) -> Result<()> {
        self.move_by_with(dx, dy, 1, self.settings.step_delay)
    }

    /// Move the cursor by `(dx, dy)` over `steps` motion events, pausing
    /// `delay` between them.
    pub fn move_by_with(&self, dx: f64, dy: f64, steps: usize, delay: Duration) -> Result<()> {
        let start = self.position()?;
        let plan = motion_plan(start, dx, dy, steps);
        let last = plan.len() - 1;
        for (i, position) in plan.into_iter().enumerate() {
            self.backend
                .post_mouse_event(EventKind::MouseMoved, position, Button::Left, None)?;
            if i < last {
                pause(delay);
            }
        }
        Ok(())
    }

    /// Click `button` `count` times at the current position.
    ///
    /// Each down/up pair carries its 1-based index as click state, so a
    /// count of 2 or 3 is seen as a double or triple click.
    pub fn click(&self, button: Button, count: u32) -> Result<()> {
        self.click_with(button, count, self.settings.step_delay)
    }

    /// Like [`click`](Self::click), pausing `delay` between clicks.
    pub fn click_with(&self, button: Button, count: u32, delay: Duration) -> Result<()> {
        let position = self.position()?;
        for click in 1..=count {
            if click > 1 {
                pause(delay);
            }
            let state = Some(i64::from(click));
            self.backend
                .post_mouse_event(button.down_kind(), position, button, state)?;
            self.backend
                .post_mouse_event(button.up_kind(), position, button, state)?;
        }
        Ok(())
    }

    /// Press `button` at the current position.
    pub fn press(&self, button: Button) -> Result<()> {
        let position = self.position()?;
        self.backend
            .post_mouse_event(button.down_kind(), position, button, None)
    }

    /// Release `button` at the current position.
    pub fn release(&self, button: Button) -> Result<()> {
        let position = self.position()?;
        self.backend
            .post_mouse_event(button.up_kind(), position, button, None)
    }

    /// Drag by `(dx, dy)` holding `button`, using the configured step count.
    pub fn drag(&self, dx: f64, dy: f64, button: Button) -> Result<()> {
        self.drag_with(dx, dy, button, self.settings.drag_steps, self.settings.step_delay)
    }

    /// Press `button`, post `steps` dragged events along the path, then
    /// release at the end of the path.
    ///
    /// `delay` follows every step, including the last one before the release.
    /// The path only approximates a straight line as well as `steps` allows.
    /// If a step fails, the button is still released at the last position
    /// reached and the step's error is returned.
    pub fn drag_with(
        &self,
        dx: f64,
        dy: f64,
        button: Button,
        steps: usize,
        delay: Duration,
    ) -> Result<()> {
        let start = self.position()?;
        self.backend
            .post_mouse_event(button.down_kind(), start, button, None)?;

        let mut end = start;
        let mut moved = Ok(());
        for position in motion_plan(start, dx, dy, steps) {
            moved = self
                .backend
                .post_mouse_event(button.dragged_kind(), position, button, None);
            if moved.is_err() {
                break;
            }
            pause(delay);
            end = position;
        }

        // The button must not stay held when the path is cut short
        let released = self
            .backend
            .post_mouse_event(button.up_kind(), end, button, None);
        moved.and(released)
    }

    /// Scroll by `(dx, dy)` in one event.
    pub fn scroll(&self, dx: i32, dy: i32) -> Result<()> {
        self.scroll_with(dx, dy, 1, self.settings.step_delay)
    }

    /// Scroll by `(dx, dy)` split over `steps` events, pausing `delay`
    /// between them.
    pub fn scroll_with(&self, dx: i32, dy: i32, steps: usize, delay: Duration) -> Result<()> {
        let plan = scroll_plan(dx, dy, steps);
        let last = plan.len() - 1;
        for (i, (step_dx, step_dy)) in plan.into_iter().enumerate() {
            self.backend.post_scroll_event(
                self.settings.scroll_unit,
                SCROLL_AXES,
                step_dy,
                step_dx,
            )?;
            if i < last {
                pause(delay);
            }
        }
        Ok(())
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay);
    }
}
