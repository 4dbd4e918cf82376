//! # inputkit
//!
//! Synthesize keyboard and mouse input and watch the global pointer event
//! stream on macOS, with the ability to consume events before other
//! applications see them.
//!
//! ## Features
//!
//! - Keyboard injection: press, release, tap and type text with shift handled
//!   for you
//! - Mouse injection: interpolated moves, multi-clicks, drags and scrolling
//! - Global pointer listener with per-event veto
//! - Handler panics are contained and reported, never fatal to the listener
//! - Channel and tokio adapters for consuming events off the tap thread
//! - A recording mock backend for testing automation code anywhere
//!
//! ## Quick Start
//!
//! ### Injecting Input
//!
//! ```no_run
//! use inputkit::{Button, KeyboardController, MouseController, NamedKey};
//!
//! let keyboard = KeyboardController::system()?;
//! keyboard.type_text("Hello!")?;
//! keyboard.tap(NamedKey::Return)?;
//!
//! let mouse = MouseController::system()?;
//! mouse.move_by(100.0, 0.0)?;
//! mouse.click(Button::Left, 2)?;
//! mouse.scroll(0, -3)?;
//! # Ok::<(), inputkit::Error>(())
//! ```
//!
//! ### Listening and Blocking
//!
//! ```no_run
//! use inputkit::{ClickButton, Handlers, Listener};
//!
//! let handlers = Handlers::new()
//!     .on_move(|position| println!("Mouse moved to ({:.0}, {:.0})", position.x, position.y))
//!     .on_click(|_, button, pressed| {
//!         println!("{button} {}", if pressed { "pressed" } else { "released" });
//!         // Returning false consumes the event
//!         button != ClickButton::Right
//!     })
//!     .on_error(|failure| eprintln!("{failure}"));
//!
//! let listener = Listener::system(handlers)?;
//! listener.start()?;
//! // ...
//! listener.stop()?;
//! # Ok::<(), inputkit::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Every OS interaction goes through the [`EventBackend`] trait. On macOS
//! [`platform::system_backend`] returns the Quartz implementation; tests and
//! other platforms can use [`MockBackend`], which records posted events and
//! lets callers inject intercepted ones.
//!
//! Synthesizing input and intercepting events both require the process to
//! be trusted for Accessibility.

pub mod backend;
pub mod channel;
pub mod config;
pub mod error;
pub mod event;
pub mod keyboard;
pub mod keycode;
pub mod listener;
pub mod mouse;
pub mod platform;

// Re-exports
pub use backend::{EventBackend, InterceptionPoint, RunLoop};
pub use config::{KeyboardSettings, MouseSettings};
pub use error::{Error, Result};
pub use event::{
    Button, ClickButton, EventKind, EventMask, ModifierFlags, PointerEvent, Position,
    Propagation, ScrollUnit, TapEvent,
};
pub use keyboard::KeyboardController;
pub use keycode::{KeyCode, NamedKey, Symbol};
pub use listener::{HandlerFailure, HandlerKind, Handlers, Listener, ListenerState, listen};
pub use mouse::MouseController;
pub use platform::mock::MockBackend;
pub use platform::system_backend;
