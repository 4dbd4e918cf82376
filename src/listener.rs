//! Global pointer listener with per-event veto.

use crate::backend::{EventBackend, InterceptionPoint, RunLoop, TapCallback};
use crate::error::{Error, Result};
use crate::event::{ClickButton, EventKind, EventMask, Position, Propagation, TapEvent};
use crate::platform;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, Once};
use std::thread::{self, JoinHandle};

type MoveHandler = Box<dyn Fn(Position) -> Propagation + Send + Sync>;
type ClickHandler = Box<dyn Fn(Position, ClickButton, bool) -> Propagation + Send + Sync>;
type ScrollHandler = Box<dyn Fn(Position, i64, i64) -> Propagation + Send + Sync>;
type ErrorHandler = Box<dyn Fn(&HandlerFailure) + Send + Sync>;

/// Which user handler failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Move,
    Click,
    Scroll,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Move => f.write_str("on_move"),
            HandlerKind::Click => f.write_str("on_click"),
            HandlerKind::Scroll => f.write_str("on_scroll"),
        }
    }
}

/// Context of a handler that panicked.
#[derive(Debug)]
pub struct HandlerFailure {
    /// The handler that panicked.
    pub handler: HandlerKind,
    /// The arguments it was called with, debug-formatted.
    pub args: String,
    /// The panic message.
    pub message: String,
    /// Where the panic happened. Disabled if another panic hook replaced ours.
    pub backtrace: Backtrace,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} panicked with args {}: {}",
            self.handler, self.args, self.message
        )
    }
}

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static CAPTURED: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Install (once) a panic hook that records a backtrace for panics raised
/// inside handlers and defers to the previous hook for every other panic.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                CAPTURED.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            } else {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as running a handler while alive.
struct CaptureScope;

impl CaptureScope {
    fn enter() -> Self {
        CAPTURED.with(|slot| slot.borrow_mut().take());
        CAPTURING.with(|flag| flag.set(true));
        CaptureScope
    }

    fn take_backtrace(&self) -> Backtrace {
        CAPTURED
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(Backtrace::disabled)
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        CAPTURING.with(|flag| flag.set(false));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Callbacks invoked by a [`Listener`].
///
/// Event handlers may return `()`, `bool`, `Option<bool>` or [`Propagation`].
/// Only `false` (or `Propagation::Block`) consumes the event; anything else
/// lets it through. A handler that panics is reported to the error handler
/// (or logged) and its event is let through.
///
/// Handlers run on the listener's thread, never on the thread that called
/// [`Listener::start`].
#[derive(Default)]
pub struct Handlers {
    on_move: Option<MoveHandler>,
    on_click: Option<ClickHandler>,
    on_scroll: Option<ScrollHandler>,
    on_error: Option<ErrorHandler>,
}

impl Handlers {
    /// No handlers: every event passes through untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the new position when the pointer moves.
    pub fn on_move<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(Position) -> R + Send + Sync + 'static,
        R: Into<Propagation>,
    {
        self.on_move = Some(Box::new(move |position| handler(position).into()));
        self
    }

    /// Called with the position, the button and `true` for a press or
    /// `false` for a release.
    pub fn on_click<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(Position, ClickButton, bool) -> R + Send + Sync + 'static,
        R: Into<Propagation>,
    {
        self.on_click = Some(Box::new(move |position, button, pressed| {
            handler(position, button, pressed).into()
        }));
        self
    }

    /// Called with the position and the horizontal and vertical wheel deltas.
    pub fn on_scroll<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(Position, i64, i64) -> R + Send + Sync + 'static,
        R: Into<Propagation>,
    {
        self.on_scroll = Some(Box::new(move |position, dx, dy| {
            handler(position, dx, dy).into()
        }));
        self
    }

    /// Called when another handler panics.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&HandlerFailure) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Classify `event`, run the matching handler and decide its fate.
    pub fn dispatch(&self, event: &TapEvent) -> Propagation {
        let position = event.location;

        match event.kind {
            EventKind::MouseMoved => match &self.on_move {
                Some(handler) => self.guarded(
                    HandlerKind::Move,
                    || format!("({position:?})"),
                    || handler(position),
                ),
                None => Propagation::Propagate,
            },
            kind if kind.is_button_down() || kind.is_button_up() => match &self.on_click {
                Some(handler) => {
                    let button = ClickButton::from_number(event.button_number);
                    let pressed = kind.is_button_down();
                    self.guarded(
                        HandlerKind::Click,
                        || format!("({position:?}, {button}, {pressed})"),
                        || handler(position, button, pressed),
                    )
                }
                None => Propagation::Propagate,
            },
            EventKind::ScrollWheel => match &self.on_scroll {
                Some(handler) => {
                    let dx = event.scroll_axis2;
                    let dy = event.scroll_axis1;
                    self.guarded(
                        HandlerKind::Scroll,
                        || format!("({position:?}, {dx}, {dy})"),
                        || handler(position, dx, dy),
                    )
                }
                None => Propagation::Propagate,
            },
            _ => Propagation::Propagate,
        }
    }

    fn guarded(
        &self,
        kind: HandlerKind,
        args: impl FnOnce() -> String,
        call: impl FnOnce() -> Propagation,
    ) -> Propagation {
        install_panic_hook();
        let scope = CaptureScope::enter();
        let outcome = panic::catch_unwind(AssertUnwindSafe(call));
        let backtrace = scope.take_backtrace();
        drop(scope);

        match outcome {
            Ok(propagation) => propagation,
            Err(payload) => {
                let failure = HandlerFailure {
                    handler: kind,
                    args: args(),
                    message: panic_message(payload.as_ref()),
                    backtrace,
                };
                self.report(&failure);
                Propagation::Propagate
            }
        }
    }

    fn report(&self, failure: &HandlerFailure) {
        let Some(on_error) = &self.on_error else {
            log::error!(
                "Error in handler {} with args {}: {}\n{}",
                failure.handler,
                failure.args,
                failure.message,
                failure.backtrace
            );
            return;
        };

        let reported = {
            let _scope = CaptureScope::enter();
            panic::catch_unwind(AssertUnwindSafe(|| on_error(failure)))
        };
        if let Err(payload) = reported {
            log::error!(
                "on_error panicked while reporting {failure}: {}",
                panic_message(payload.as_ref())
            );
        }
    }
}

/// Lifecycle state of a [`Listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerState {
    Idle,
    Running,
}

/// An enabled interception point. Dropping it disables the tap, so every
/// exit path releases what `open` acquired.
struct TapSession {
    tap: Box<dyn InterceptionPoint>,
}

impl TapSession {
    fn open(backend: &dyn EventBackend, handlers: Arc<Handlers>) -> Result<Self> {
        let callback: TapCallback = Box::new(move |event| handlers.dispatch(event));
        let mut tap = backend.create_interception_point(EventMask::POINTER, callback)?;
        tap.attach_to_run_loop()?;
        tap.enable(true);
        log::debug!("pointer tap enabled");
        Ok(Self { tap })
    }

    fn run_loop(&self) -> Arc<dyn RunLoop> {
        self.tap.run_loop()
    }

    fn run(mut self) {
        self.tap.run();
    }
}

impl Drop for TapSession {
    fn drop(&mut self) {
        self.tap.enable(false);
        log::debug!("pointer tap disabled");
    }
}

#[derive(Default)]
struct Worker {
    run_loop: Option<Arc<dyn RunLoop>>,
    thread: Option<JoinHandle<()>>,
    // Signalled when a blocking `run` has torn its tap down.
    exited: Option<Receiver<()>>,
    generation: u64,
}

impl Worker {
    fn is_occupied(&self) -> bool {
        self.run_loop.is_some() || self.thread.is_some()
    }

    /// Stop the run loop and join the listener thread. A blocking `run`
    /// is signalled through the returned receiver instead.
    fn shut_down(&mut self) -> Result<Option<Receiver<()>>> {
        if let Some(run_loop) = self.run_loop.take() {
            run_loop.stop();
        }
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| Error::ThreadError("failed to join listener thread".into()))?;
        }
        Ok(self.exited.take())
    }
}

/// Listens to the global pointer event stream.
///
/// Start it on a background thread with [`start`](Self::start) or block the
/// current thread with [`run`](Self::run); [`stop`](Self::stop) ends either.
/// Starting a running listener and stopping an idle one are no-ops.
///
/// # Example
///
/// ```no_run
/// use inputkit::{ClickButton, Handlers, Listener};
///
/// let handlers = Handlers::new()
///     .on_move(|position| println!("moved to {position:?}"))
///     // Swallow every right click
///     .on_click(|_, button, _| button != ClickButton::Right);
///
/// let listener = Listener::system(handlers)?;
/// listener.start()?;
/// std::thread::sleep(std::time::Duration::from_secs(10));
/// listener.stop()?;
/// # Ok::<(), inputkit::Error>(())
/// ```
pub struct Listener {
    backend: Arc<dyn EventBackend>,
    handlers: Arc<Handlers>,
    running: AtomicBool,
    worker: Mutex<Worker>,
}

impl Listener {
    /// Create an idle listener intercepting through `backend`.
    pub fn new(backend: Arc<dyn EventBackend>, handlers: Handlers) -> Self {
        Self {
            backend,
            handlers: Arc::new(handlers),
            running: AtomicBool::new(false),
            worker: Mutex::new(Worker::default()),
        }
    }

    /// Create an idle listener on the running OS.
    pub fn system(handlers: Handlers) -> Result<Self> {
        Ok(Self::new(platform::system_backend()?, handlers))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        if self.is_running() {
            ListenerState::Running
        } else {
            ListenerState::Idle
        }
    }

    /// Check if the listener is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start listening on a dedicated background thread.
    ///
    /// Returns once the tap is enabled. Fails with
    /// [`Error::TapCreateFailed`] when the OS refuses the tap, leaving the
    /// listener idle.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.lock_worker()?;
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::warn!("Listener is already running");
            return Ok(());
        }
        if worker.is_occupied() {
            log::warn!("Reclaiming a listener thread that was never stopped");
            if let Err(e) = worker.shut_down() {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        }

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let backend = self.backend.clone();
        let handlers = self.handlers.clone();

        let spawned = thread::Builder::new()
            .name("inputkit-listener".into())
            .spawn(move || {
                let session = match TapSession::open(backend.as_ref(), handlers) {
                    Ok(session) => session,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(session.run_loop()));
                session.run();
            });

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(Error::ThreadError(format!(
                    "failed to spawn listener thread: {e}"
                )));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(run_loop)) => {
                worker.generation += 1;
                worker.run_loop = Some(run_loop);
                worker.thread = Some(thread);
                log::debug!("listener started");
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                self.running.store(false, Ordering::SeqCst);
                log::error!("Failed to start listener: {e}");
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                self.running.store(false, Ordering::SeqCst);
                Err(Error::ThreadError(
                    "listener thread exited during setup".into(),
                ))
            }
        }
    }

    /// Listen on the calling thread, blocking until [`stop`](Self::stop) is
    /// called from another thread.
    ///
    /// Fails with [`Error::AlreadyRunning`] if the listener is already active.
    pub fn run(&self) -> Result<()> {
        let (session, generation, exited) = {
            let mut worker = self.lock_worker()?;
            if self
                .running
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return Err(Error::AlreadyRunning);
            }

            let session = match TapSession::open(self.backend.as_ref(), self.handlers.clone()) {
                Ok(session) => session,
                Err(e) => {
                    self.running.store(false, Ordering::SeqCst);
                    return Err(e);
                }
            };
            let (exited_tx, exited_rx) = mpsc::channel::<()>();
            worker.generation += 1;
            worker.run_loop = Some(session.run_loop());
            worker.exited = Some(exited_rx);
            (session, worker.generation, exited_tx)
        };

        session.run();

        // The loop only returns on its own if nobody called `stop`.
        if let Ok(mut worker) = self.worker.lock()
            && worker.generation == generation
            && worker.run_loop.take().is_some()
        {
            worker.exited = None;
            self.running.store(false, Ordering::SeqCst);
        }
        drop(exited);
        Ok(())
    }

    /// Stop listening and wait until the tap is torn down.
    ///
    /// No handler runs after this returns.
    pub fn stop(&self) -> Result<()> {
        let exited = {
            let mut worker = self.lock_worker()?;
            if self
                .running
                .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                log::warn!("Listener is not running");
                return Ok(());
            }
            worker.shut_down()?
        };

        // A blocking `run` needs the lock to finish, so wait outside it.
        if let Some(exited) = exited {
            let _ = exited.recv();
        }
        log::debug!("listener stopped");
        Ok(())
    }

    fn lock_worker(&self) -> Result<MutexGuard<'_, Worker>> {
        self.worker
            .lock()
            .map_err(|_| Error::ThreadError("mutex poisoned".into()))
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

/// Listen on the calling thread with the system backend until the process
/// ends or the tap fails.
pub fn listen(handlers: Handlers) -> Result<()> {
    Listener::system(handlers)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockBackend;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn at(x: f64, y: f64) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_dispatch_without_handlers_propagates() {
        let handlers = Handlers::new();
        assert_eq!(
            handlers.dispatch(&TapEvent::moved(at(1.0, 1.0))),
            Propagation::Propagate
        );
        assert_eq!(
            handlers.dispatch(&TapEvent::scroll(at(1.0, 1.0), 0, -3)),
            Propagation::Propagate
        );
    }

    #[test]
    fn test_dispatch_classifies_clicks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handlers = Handlers::new().on_click(move |position, button, pressed| {
            sink.lock().unwrap().push((position, button, pressed));
        });

        handlers.dispatch(&TapEvent::button(EventKind::LeftMouseDown, at(1.0, 2.0), 0));
        handlers.dispatch(&TapEvent::button(EventKind::RightMouseUp, at(3.0, 4.0), 1));
        handlers.dispatch(&TapEvent::button(EventKind::OtherMouseDown, at(5.0, 6.0), 2));
        handlers.dispatch(&TapEvent::button(EventKind::OtherMouseUp, at(7.0, 8.0), 4));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (at(1.0, 2.0), ClickButton::Left, true),
                (at(3.0, 4.0), ClickButton::Right, false),
                (at(5.0, 6.0), ClickButton::Middle, true),
                (at(7.0, 8.0), ClickButton::Other(4), false),
            ]
        );
    }

    #[test]
    fn test_dispatch_scroll_axes() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let handlers = Handlers::new().on_scroll(move |_, dx, dy| {
            *sink.lock().unwrap() = Some((dx, dy));
        });
        handlers.dispatch(&TapEvent::scroll(at(0.0, 0.0), 2, -5));
        assert_eq!(*seen.lock().unwrap(), Some((2, -5)));
    }

    #[test]
    fn test_only_false_blocks() {
        let handlers = Handlers::new()
            .on_move(|_| false)
            .on_click(|_, _, _| Some(true))
            .on_scroll(|_, _, _| None::<bool>);
        assert_eq!(
            handlers.dispatch(&TapEvent::moved(at(0.0, 0.0))),
            Propagation::Block
        );
        assert_eq!(
            handlers.dispatch(&TapEvent::button(EventKind::LeftMouseUp, at(0.0, 0.0), 0)),
            Propagation::Propagate
        );
        assert_eq!(
            handlers.dispatch(&TapEvent::scroll(at(0.0, 0.0), 0, 1)),
            Propagation::Propagate
        );
    }

    #[test]
    fn test_unclassified_events_propagate() {
        let handlers = Handlers::new().on_move(|_| false);
        let drag = TapEvent::button(EventKind::LeftMouseDragged, at(0.0, 0.0), 0);
        assert_eq!(handlers.dispatch(&drag), Propagation::Propagate);
    }

    #[test]
    fn test_panicking_handler_is_reported_and_propagates() {
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = failures.clone();
        let handlers = Handlers::new()
            .on_move(|_| -> bool { panic!("boom") })
            .on_error(move |failure| {
                sink.lock()
                    .unwrap()
                    .push((failure.handler, failure.message.clone(), failure.args.clone()));
            });

        let verdict = handlers.dispatch(&TapEvent::moved(at(3.0, 4.0)));
        assert_eq!(verdict, Propagation::Propagate);

        let failures = failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, HandlerKind::Move);
        assert_eq!(failures[0].1, "boom");
        assert!(failures[0].2.contains("3.0"));
    }

    #[test]
    fn test_panicking_handler_without_error_handler_is_logged() {
        let handlers = Handlers::new().on_click(|_, _, _| -> bool { panic!("no reporter") });
        let verdict =
            handlers.dispatch(&TapEvent::button(EventKind::LeftMouseDown, at(0.0, 0.0), 0));
        assert_eq!(verdict, Propagation::Propagate);
    }

    #[test]
    fn test_panicking_error_handler_is_contained() {
        let handlers = Handlers::new()
            .on_scroll(|_, _, _| -> bool { panic!("first") })
            .on_error(|_| panic!("second"));
        let verdict = handlers.dispatch(&TapEvent::scroll(at(0.0, 0.0), 1, 1));
        assert_eq!(verdict, Propagation::Propagate);
    }

    #[test]
    fn test_failing_handler_does_not_stop_others() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = clicks.clone();
        let handlers = Handlers::new()
            .on_move(|_| -> () { panic!("always") })
            .on_click(move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(|_| {});

        for _ in 0..3 {
            handlers.dispatch(&TapEvent::moved(at(0.0, 0.0)));
            handlers.dispatch(&TapEvent::button(EventKind::LeftMouseDown, at(0.0, 0.0), 0));
        }
        assert_eq!(clicks.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_start_stop_lifecycle() {
        let backend = Arc::new(MockBackend::new());
        let listener = Listener::new(backend.clone(), Handlers::new());
        assert_eq!(listener.state(), ListenerState::Idle);

        listener.start().unwrap();
        assert_eq!(listener.state(), ListenerState::Running);
        assert_eq!(backend.active_taps(), 1);

        listener.stop().unwrap();
        assert_eq!(listener.state(), ListenerState::Idle);
        assert_eq!(backend.active_taps(), 0);
        assert_eq!(backend.inject(TapEvent::moved(at(0.0, 0.0))), None);
    }

    #[test]
    fn test_double_start_creates_one_tap() {
        let backend = Arc::new(MockBackend::new());
        let listener = Listener::new(backend.clone(), Handlers::new());
        listener.start().unwrap();
        listener.start().unwrap();
        assert_eq!(backend.taps_created(), 1);
        assert_eq!(backend.active_taps(), 1);
        listener.stop().unwrap();
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let backend = Arc::new(MockBackend::new());
        let listener = Listener::new(backend, Handlers::new());
        assert!(listener.stop().is_ok());
        assert!(listener.stop().is_ok());
        assert_eq!(listener.state(), ListenerState::Idle);
    }

    #[test]
    fn test_restart_after_stop() {
        let backend = Arc::new(MockBackend::new());
        let listener = Listener::new(backend.clone(), Handlers::new().on_move(|_| false));
        listener.start().unwrap();
        listener.stop().unwrap();
        listener.start().unwrap();
        assert_eq!(
            backend.inject(TapEvent::moved(at(0.0, 0.0))),
            Some(Propagation::Block)
        );
        listener.stop().unwrap();
        assert_eq!(backend.taps_created(), 2);
    }

    #[test]
    fn test_tap_failure_surfaces_from_start() {
        let backend = Arc::new(MockBackend::new());
        backend.set_fail_tap_creation(true);
        let listener = Listener::new(backend.clone(), Handlers::new());

        assert!(matches!(listener.start(), Err(Error::TapCreateFailed(_))));
        assert_eq!(listener.state(), ListenerState::Idle);

        backend.set_fail_tap_creation(false);
        listener.start().unwrap();
        assert!(listener.is_running());
        listener.stop().unwrap();
    }

    #[test]
    fn test_veto_round_trip_through_tap() {
        let backend = Arc::new(MockBackend::new());
        let handlers = Handlers::new()
            .on_click(|_, button, _| button != ClickButton::Right)
            .on_scroll(|_, _, _| {});
        let listener = Listener::new(backend.clone(), handlers);
        listener.start().unwrap();

        let right = TapEvent::button(EventKind::RightMouseDown, at(1.0, 1.0), 1);
        let left = TapEvent::button(EventKind::LeftMouseDown, at(1.0, 1.0), 0);
        assert_eq!(backend.inject(right), Some(Propagation::Block));
        assert_eq!(backend.inject(left), Some(Propagation::Propagate));
        assert_eq!(
            backend.inject(TapEvent::scroll(at(1.0, 1.0), 0, 4)),
            Some(Propagation::Propagate)
        );

        listener.stop().unwrap();
    }

    #[test]
    fn test_handlers_run_on_listener_thread() {
        let backend = Arc::new(MockBackend::new());
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = names.clone();
        let handlers = Handlers::new().on_move(move |_| {
            sink.lock()
                .unwrap()
                .push(thread::current().name().map(str::to_string));
        });
        let listener = Listener::new(backend.clone(), handlers);
        listener.start().unwrap();
        backend.inject(TapEvent::moved(at(0.0, 0.0)));
        listener.stop().unwrap();

        assert_eq!(
            *names.lock().unwrap(),
            vec![Some("inputkit-listener".to_string())]
        );
    }

    #[test]
    fn test_events_delivered_in_order() {
        let backend = Arc::new(MockBackend::new());
        let xs = Arc::new(Mutex::new(Vec::new()));
        let sink = xs.clone();
        let listener = Listener::new(
            backend.clone(),
            Handlers::new().on_move(move |position| sink.lock().unwrap().push(position.x)),
        );
        listener.start().unwrap();
        for x in 0..20 {
            backend.inject(TapEvent::moved(at(x as f64, 0.0)));
        }
        listener.stop().unwrap();

        let expected: Vec<f64> = (0..20).map(|x| x as f64).collect();
        assert_eq!(*xs.lock().unwrap(), expected);
    }

    #[test]
    fn test_blocking_run_until_stopped() {
        let backend = Arc::new(MockBackend::new());
        let listener = Arc::new(Listener::new(
            backend.clone(),
            Handlers::new().on_move(|_| false),
        ));

        let runner = listener.clone();
        let thread = thread::spawn(move || runner.run());

        while !listener.is_running() || backend.active_taps() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(matches!(listener.run(), Err(Error::AlreadyRunning)));
        assert_eq!(
            backend.inject(TapEvent::moved(at(0.0, 0.0))),
            Some(Propagation::Block)
        );

        listener.stop().unwrap();
        assert_eq!(backend.active_taps(), 0);
        thread.join().unwrap().unwrap();
        assert_eq!(listener.state(), ListenerState::Idle);
    }

    #[test]
    fn test_drop_stops_running_listener() {
        let backend = Arc::new(MockBackend::new());
        {
            let listener = Listener::new(backend.clone(), Handlers::new());
            listener.start().unwrap();
            assert_eq!(backend.active_taps(), 1);
        }
        assert_eq!(backend.active_taps(), 0);
    }

    #[test]
    fn test_start_reclaims_tap_of_interrupted_stop() {
        let backend = Arc::new(MockBackend::new());
        let listener = Listener::new(backend.clone(), Handlers::new());
        listener.start().unwrap();

        // Flag already flipped, worker not yet shut down
        listener.running.store(false, Ordering::SeqCst);
        listener.start().unwrap();
        assert_eq!(backend.taps_created(), 2);
        assert_eq!(backend.active_taps(), 1);

        listener.stop().unwrap();
        assert_eq!(listener.state(), ListenerState::Idle);
        assert_eq!(backend.active_taps(), 0);
    }

    #[test]
    fn test_concurrent_start_stop_leaves_no_tap_behind() {
        let backend = Arc::new(MockBackend::new());
        let listener = Arc::new(Listener::new(backend.clone(), Handlers::new()));

        let threads: Vec<_> = (0..4)
            .map(|t| {
                let listener = listener.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        if (i + t) % 2 == 0 {
                            listener.start().unwrap();
                        } else {
                            listener.stop().unwrap();
                        }
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        listener.stop().unwrap();
        assert_eq!(listener.state(), ListenerState::Idle);
        assert_eq!(backend.active_taps(), 0);
        assert_eq!(backend.inject(TapEvent::moved(at(0.0, 0.0))), None);
    }

    #[test]
    fn test_always_panicking_handler_keeps_tap_alive() {
        let backend = Arc::new(MockBackend::new());
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        let handlers = Handlers::new()
            .on_move(|_| -> bool { panic!("always") })
            .on_click(|_, _, _| false)
            .on_error(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let listener = Listener::new(backend.clone(), handlers);
        listener.start().unwrap();

        for _ in 0..3 {
            assert_eq!(
                backend.inject(TapEvent::moved(at(1.0, 1.0))),
                Some(Propagation::Propagate)
            );
        }
        assert_eq!(
            backend.inject(TapEvent::button(EventKind::LeftMouseDown, at(1.0, 1.0), 0)),
            Some(Propagation::Block)
        );
        assert!(listener.is_running());

        listener.stop().unwrap();
        assert_eq!(failures.load(Ordering::SeqCst), 3);
    }
}
