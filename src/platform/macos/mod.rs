//! Quartz (CoreGraphics) event backend.

mod listen;
mod simulate;

use crate::backend::{EventBackend, InterceptionPoint, TapCallback};
use crate::error::Result;
use crate::event::{Button, EventKind, EventMask, ModifierFlags, Position, ScrollUnit};
use crate::keycode::KeyCode;

#[link(name = "Cocoa", kind = "framework")]
unsafe extern "C" {}

/// Posts through the HID event tap and intercepts at the session tap.
///
/// Positions use global display coordinates: origin at the top-left of the
/// main display, `y` growing downward.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuartzBackend;

impl QuartzBackend {
    /// Create the backend. No OS resources are held until an event is posted.
    pub fn new() -> Self {
        Self
    }
}

impl EventBackend for QuartzBackend {
    fn post_key_event(&self, code: KeyCode, down: bool, flags: ModifierFlags) -> Result<()> {
        simulate::post_key(code, down, flags)
    }

    fn post_mouse_event(
        &self,
        kind: EventKind,
        position: Position,
        button: Button,
        click_state: Option<i64>,
    ) -> Result<()> {
        simulate::post_mouse(kind, position, button, click_state)
    }

    fn post_scroll_event(
        &self,
        unit: ScrollUnit,
        axis_count: u32,
        vertical: i32,
        horizontal: i32,
    ) -> Result<()> {
        simulate::post_scroll(unit, axis_count, vertical, horizontal)
    }

    fn cursor_position(&self) -> Result<Position> {
        simulate::cursor_position()
    }

    fn create_interception_point(
        &self,
        mask: EventMask,
        callback: TapCallback,
    ) -> Result<Box<dyn InterceptionPoint>> {
        Ok(Box::new(listen::QuartzTap::create(mask, callback)?))
    }
}
