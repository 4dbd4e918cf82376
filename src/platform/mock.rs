//! In-memory event backend.
//!
//! Records every posted event in order instead of touching the OS, models
//! the cursor, and runs interception points on a channel so tests can inject
//! events into a running listener and read back the propagation verdict.

use crate::backend::{EventBackend, InterceptionPoint, RunLoop, TapCallback};
use crate::error::{Error, Result};
use crate::event::{
    Button, EventKind, EventMask, ModifierFlags, Position, Propagation, ScrollUnit, TapEvent,
};
use crate::keycode::KeyCode;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// How long [`MockBackend::inject`] waits for the tap to answer.
const INJECT_TIMEOUT: Duration = Duration::from_secs(2);

/// A synthetic event recorded by [`MockBackend`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Posted {
    Key {
        code: KeyCode,
        down: bool,
        flags: ModifierFlags,
    },
    Mouse {
        kind: EventKind,
        position: Position,
        button: Button,
        click_state: Option<i64>,
    },
    Scroll {
        unit: ScrollUnit,
        axis_count: u32,
        vertical: i32,
        horizontal: i32,
    },
}

enum TapCommand {
    Deliver(TapEvent, Sender<Propagation>),
    Stop,
}

/// State shared between the backend and the taps it created.
#[derive(Default)]
struct TapRegistry {
    inbox: Mutex<Option<Sender<TapCommand>>>,
    enabled: AtomicUsize,
}

/// Backend that records instead of posting.
#[derive(Default)]
pub struct MockBackend {
    posted: Mutex<Vec<Posted>>,
    cursor: Mutex<Position>,
    fail_posts: AtomicBool,
    // Posts left until the one that fails
    fail_countdown: Mutex<Option<usize>>,
    fail_taps: AtomicBool,
    taps_created: AtomicUsize,
    registry: Arc<TapRegistry>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not hide the records from the others.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockBackend {
    /// Create a backend with the cursor at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with the cursor at `position`.
    pub fn with_cursor(position: Position) -> Self {
        let backend = Self::default();
        backend.set_cursor(position);
        backend
    }

    /// Move the modelled cursor without recording an event.
    pub fn set_cursor(&self, position: Position) {
        *lock(&self.cursor) = position;
    }

    /// Every event posted so far, oldest first.
    pub fn posted(&self) -> Vec<Posted> {
        lock(&self.posted).clone()
    }

    /// Forget the recorded events.
    pub fn clear(&self) {
        lock(&self.posted).clear();
    }

    /// Make every post fail with [`Error::SimulateFailed`].
    pub fn set_fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }

    /// Make only the `n`-th post from now (1-based) fail with
    /// [`Error::SimulateFailed`]; the others are recorded as usual.
    pub fn fail_nth_post(&self, n: usize) {
        *lock(&self.fail_countdown) = Some(n.max(1));
    }

    /// Make tap creation fail like a missing Accessibility permission.
    pub fn set_fail_tap_creation(&self, fail: bool) {
        self.fail_taps.store(fail, Ordering::SeqCst);
    }

    /// Number of interception points created over the backend's lifetime.
    pub fn taps_created(&self) -> usize {
        self.taps_created.load(Ordering::SeqCst)
    }

    /// Number of interception points currently enabled.
    pub fn active_taps(&self) -> usize {
        self.registry.enabled.load(Ordering::SeqCst)
    }

    /// Deliver `event` to the current interception point and wait for its verdict.
    ///
    /// Returns `None` when no tap exists or it did not answer in time.
    pub fn inject(&self, event: TapEvent) -> Option<Propagation> {
        let inbox = lock(&self.registry.inbox).clone()?;
        let (reply, verdict) = mpsc::channel();
        inbox.send(TapCommand::Deliver(event, reply)).ok()?;
        verdict.recv_timeout(INJECT_TIMEOUT).ok()
    }

    fn record(&self, posted: Posted) -> Result<()> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(Error::SimulateFailed("mock backend set to fail".into()));
        }
        {
            let mut countdown = lock(&self.fail_countdown);
            if let Some(left) = countdown.as_mut() {
                *left -= 1;
                if *left == 0 {
                    *countdown = None;
                    return Err(Error::SimulateFailed("mock backend failed this post".into()));
                }
            }
        }
        log::trace!("mock post: {posted:?}");
        lock(&self.posted).push(posted);
        Ok(())
    }
}

impl EventBackend for MockBackend {
    fn post_key_event(&self, code: KeyCode, down: bool, flags: ModifierFlags) -> Result<()> {
        self.record(Posted::Key { code, down, flags })
    }

    fn post_mouse_event(
        &self,
        kind: EventKind,
        position: Position,
        button: Button,
        click_state: Option<i64>,
    ) -> Result<()> {
        self.record(Posted::Mouse {
            kind,
            position,
            button,
            click_state,
        })?;
        if matches!(
            kind,
            EventKind::MouseMoved
                | EventKind::LeftMouseDragged
                | EventKind::RightMouseDragged
                | EventKind::OtherMouseDragged
        ) {
            self.set_cursor(position);
        }
        Ok(())
    }

    fn post_scroll_event(
        &self,
        unit: ScrollUnit,
        axis_count: u32,
        vertical: i32,
        horizontal: i32,
    ) -> Result<()> {
        self.record(Posted::Scroll {
            unit,
            axis_count,
            vertical,
            horizontal,
        })
    }

    fn cursor_position(&self) -> Result<Position> {
        Ok(*lock(&self.cursor))
    }

    fn create_interception_point(
        &self,
        mask: EventMask,
        callback: TapCallback,
    ) -> Result<Box<dyn InterceptionPoint>> {
        if self.fail_taps.load(Ordering::SeqCst) {
            return Err(Error::TapCreateFailed(
                "mock backend refused the tap (permission not granted)".into(),
            ));
        }
        self.taps_created.fetch_add(1, Ordering::SeqCst);

        let (sender, inbox) = mpsc::channel();
        *lock(&self.registry.inbox) = Some(sender.clone());

        Ok(Box::new(MockTap {
            mask,
            callback,
            inbox,
            run_loop: Arc::new(MockRunLoop { sender }),
            registry: self.registry.clone(),
            attached: false,
            enabled: false,
        }))
    }
}

struct MockRunLoop {
    sender: Sender<TapCommand>,
}

impl RunLoop for MockRunLoop {
    fn stop(&self) {
        let _ = self.sender.send(TapCommand::Stop);
    }
}

struct MockTap {
    mask: EventMask,
    callback: TapCallback,
    inbox: Receiver<TapCommand>,
    run_loop: Arc<MockRunLoop>,
    registry: Arc<TapRegistry>,
    attached: bool,
    enabled: bool,
}

impl InterceptionPoint for MockTap {
    fn attach_to_run_loop(&mut self) -> Result<()> {
        self.attached = true;
        Ok(())
    }

    fn enable(&mut self, enabled: bool) {
        if enabled != self.enabled {
            if enabled {
                self.registry.enabled.fetch_add(1, Ordering::SeqCst);
            } else {
                self.registry.enabled.fetch_sub(1, Ordering::SeqCst);
            }
            self.enabled = enabled;
        }
    }

    fn run_loop(&self) -> Arc<dyn RunLoop> {
        self.run_loop.clone()
    }

    fn run(&mut self) {
        while let Ok(command) = self.inbox.recv() {
            match command {
                TapCommand::Stop => break,
                TapCommand::Deliver(event, reply) => {
                    let verdict =
                        if self.attached && self.enabled && self.mask.contains(event.kind) {
                            (self.callback)(&event)
                        } else {
                            Propagation::Propagate
                        };
                    let _ = reply.send(verdict);
                }
            }
        }
    }
}

impl Drop for MockTap {
    fn drop(&mut self) {
        self.enable(false);
        *lock(&self.registry.inbox) = None;
    }
}
