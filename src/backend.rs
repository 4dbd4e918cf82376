//! The boundary with the OS event layer.
//!
//! Injectors and the listener only talk to the OS through [`EventBackend`].
//! The Quartz implementation lives in `platform::macos`; the in-memory
//! [`MockBackend`](crate::MockBackend) backs the tests.

use crate::error::Result;
use crate::event::{
    Button, EventKind, EventMask, ModifierFlags, Position, Propagation, ScrollUnit, TapEvent,
};
use crate::keycode::KeyCode;
use std::sync::Arc;

/// Callback invoked by an interception point for every matching event.
///
/// Runs on the thread that runs the interception point's run loop.
pub type TapCallback = Box<dyn FnMut(&TapEvent) -> Propagation + Send>;

/// Posts synthetic events and creates interception points.
pub trait EventBackend: Send + Sync {
    /// Post a key-down or key-up event with the given modifier flags.
    fn post_key_event(&self, code: KeyCode, down: bool, flags: ModifierFlags) -> Result<()>;

    /// Post a pointer event of `kind` at `position`.
    ///
    /// `click_state` tags down/up events as the n-th click of a sequence.
    fn post_mouse_event(
        &self,
        kind: EventKind,
        position: Position,
        button: Button,
        click_state: Option<i64>,
    ) -> Result<()>;

    /// Post a scroll wheel event. Positive `vertical` scrolls up, positive
    /// `horizontal` scrolls left.
    fn post_scroll_event(
        &self,
        unit: ScrollUnit,
        axis_count: u32,
        vertical: i32,
        horizontal: i32,
    ) -> Result<()>;

    /// Current cursor location.
    fn cursor_position(&self) -> Result<Position>;

    /// Create an interception point for `mask` on the calling thread.
    ///
    /// Fails with [`Error::TapCreateFailed`](crate::Error::TapCreateFailed)
    /// when the OS refuses the tap.
    fn create_interception_point(
        &self,
        mask: EventMask,
        callback: TapCallback,
    ) -> Result<Box<dyn InterceptionPoint>>;
}

/// An OS interception point bound to the thread that created it.
///
/// Dropping it disables the tap and detaches it from the run loop.
pub trait InterceptionPoint {
    /// Attach the tap to the current thread's run loop.
    fn attach_to_run_loop(&mut self) -> Result<()>;

    /// Enable or disable event delivery.
    fn enable(&mut self, enabled: bool);

    /// Handle that stops the run loop from any thread.
    fn run_loop(&self) -> Arc<dyn RunLoop>;

    /// Run the attached run loop until [`RunLoop::stop`] is called.
    fn run(&mut self);
}

/// Cross-thread stop handle for a running run loop.
pub trait RunLoop: Send + Sync {
    /// Ask the run loop to return. Calling it before the loop starts makes
    /// the next `run` return immediately.
    fn stop(&self);
}
