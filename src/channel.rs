//! Channel-based pointer event receiving.
//!
//! These wrap a [`Listener`] whose handlers forward every classified event
//! into a channel, so the application can consume events on its own thread
//! (or task) instead of inside the interception callback.
//!
//! # Example (Sync)
//!
//! ```no_run
//! use inputkit::channel::listen_channel;
//! use inputkit::platform::system_backend;
//! use std::time::Duration;
//!
//! let (handle, rx) = listen_channel(system_backend()?, 100)?;
//!
//! while handle.is_running() {
//!     match rx.recv_timeout(Duration::from_millis(100)) {
//!         Ok(event) => println!("{event:?}"),
//!         Err(_) => {
//!             // Timeout - do other work or check exit condition
//!         }
//!     }
//! }
//! # Ok::<(), inputkit::Error>(())
//! ```
//!
//! # Example (Async with Tokio)
//!
//! ```ignore
//! use inputkit::channel::listen_async_channel;
//! use inputkit::platform::system_backend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = system_backend().expect("unsupported platform");
//!     let (_handle, mut rx) = listen_async_channel(backend, 100).expect("Failed to start listener");
//!
//!     while let Some(event) = rx.recv().await {
//!         println!("{event:?}");
//!     }
//! }
//! ```

use crate::backend::EventBackend;
use crate::error::Result;
use crate::event::{PointerEvent, Propagation};
use crate::listener::{Handlers, Listener};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

/// Handle to a listener feeding a channel.
///
/// The listener also stops when this handle is dropped.
pub struct ChannelListenerHandle {
    listener: Listener,
}

impl ChannelListenerHandle {
    /// Stop the listener and wait until its tap is torn down.
    pub fn stop(self) -> Result<()> {
        self.listener.stop()
    }

    /// Check if the listener is still running.
    pub fn is_running(&self) -> bool {
        self.listener.is_running()
    }
}

/// Build handlers that turn every callback into a [`PointerEvent`] and hand
/// it to `forward`, whose verdict decides propagation.
fn forwarding<F>(forward: F) -> Handlers
where
    F: Fn(PointerEvent) -> Propagation + Send + Sync + 'static,
{
    let forward = Arc::new(forward);
    let on_move = forward.clone();
    let on_click = forward.clone();
    let on_scroll = forward;

    Handlers::new()
        .on_move(move |position| on_move(PointerEvent::Moved { position }))
        .on_click(move |position, button, pressed| {
            on_click(PointerEvent::Click {
                position,
                button,
                pressed,
            })
        })
        .on_scroll(move |position, dx, dy| on_scroll(PointerEvent::Scroll { position, dx, dy }))
}

fn spawn(backend: Arc<dyn EventBackend>, handlers: Handlers) -> Result<ChannelListenerHandle> {
    let listener = Listener::new(backend, handlers);
    listener.start()?;
    Ok(ChannelListenerHandle { listener })
}

/// Start a listener that sends events to a bounded channel.
///
/// # Arguments
///
/// * `capacity` - Maximum number of events to buffer. If the buffer is full,
///   new events are dropped so the interception callback never blocks.
pub fn listen_channel(
    backend: Arc<dyn EventBackend>,
    capacity: usize,
) -> Result<(ChannelListenerHandle, Receiver<PointerEvent>)> {
    let (sender, receiver) = mpsc::sync_channel(capacity);
    let handlers = forwarding(move |event| {
        // Don't block the tap if the consumer is slow
        let _ = sender.try_send(event);
        Propagation::Propagate
    });
    Ok((spawn(backend, handlers)?, receiver))
}

/// Start a listener that sends events to an unbounded channel.
///
/// No event is dropped, so memory grows if the consumer falls behind.
pub fn listen_unbounded_channel(
    backend: Arc<dyn EventBackend>,
) -> Result<(ChannelListenerHandle, Receiver<PointerEvent>)> {
    let (sender, receiver) = mpsc::channel();
    let handlers = forwarding(move |event| {
        let _ = sender.send(event);
        Propagation::Propagate
    });
    Ok((spawn(backend, handlers)?, receiver))
}

/// Start a listener that sends events to a channel and lets `filter` veto them.
///
/// The filter runs synchronously on the listener thread and returns `true`
/// to let the event through or `false` to consume it. Every event is sent to
/// the channel, consumed or not.
///
/// # Example
///
/// ```no_run
/// use inputkit::channel::grab_channel;
/// use inputkit::platform::system_backend;
/// use inputkit::{ClickButton, PointerEvent};
///
/// // Swallow right clicks, pass everything else through
/// let (handle, rx) = grab_channel(system_backend()?, 100, |event| {
///     !matches!(event, PointerEvent::Click { button: ClickButton::Right, .. })
/// })?;
///
/// for event in rx.iter() {
///     println!("{event:?}");
/// }
/// # drop(handle);
/// # Ok::<(), inputkit::Error>(())
/// ```
pub fn grab_channel<F>(
    backend: Arc<dyn EventBackend>,
    capacity: usize,
    filter: F,
) -> Result<(ChannelListenerHandle, Receiver<PointerEvent>)>
where
    F: Fn(&PointerEvent) -> bool + Send + Sync + 'static,
{
    let (sender, receiver) = mpsc::sync_channel(capacity);
    let handlers = forwarding(move |event| {
        let verdict = Propagation::from(filter(&event));
        let _ = sender.try_send(event);
        verdict
    });
    Ok((spawn(backend, handlers)?, receiver))
}

#[cfg(feature = "tokio")]
pub use tokio_channel::*;

#[cfg(feature = "tokio")]
mod tokio_channel {
    use super::*;
    use tokio::sync::mpsc as tokio_mpsc;

    /// Start a listener that sends events to a tokio channel.
    ///
    /// Events are dropped when the buffer is full.
    pub fn listen_async_channel(
        backend: Arc<dyn EventBackend>,
        capacity: usize,
    ) -> Result<(ChannelListenerHandle, tokio_mpsc::Receiver<PointerEvent>)> {
        let (sender, receiver) = tokio_mpsc::channel(capacity);
        let handlers = forwarding(move |event| {
            let _ = sender.try_send(event);
            Propagation::Propagate
        });
        Ok((spawn(backend, handlers)?, receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::event::{ClickButton, EventKind, Position, TapEvent};
    use crate::platform::mock::MockBackend;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(2);

    #[test]
    fn test_listen_channel_forwards_events() {
        let backend = Arc::new(MockBackend::new());
        let (handle, rx) = listen_channel(backend.clone(), 16).unwrap();

        let here = Position::new(4.0, 5.0);
        assert_eq!(
            backend.inject(TapEvent::moved(here)),
            Some(Propagation::Propagate)
        );
        backend.inject(TapEvent::button(EventKind::RightMouseDown, here, 1));
        backend.inject(TapEvent::scroll(here, -1, 3));

        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            PointerEvent::Moved { position: here }
        );
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            PointerEvent::Click {
                position: here,
                button: ClickButton::Right,
                pressed: true
            }
        );
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            PointerEvent::Scroll {
                position: here,
                dx: -1,
                dy: 3
            }
        );

        handle.stop().unwrap();
        assert_eq!(backend.active_taps(), 0);
    }

    #[test]
    fn test_full_bounded_channel_drops_instead_of_blocking() {
        let backend = Arc::new(MockBackend::new());
        let (handle, rx) = listen_channel(backend.clone(), 1).unwrap();

        for x in 0..5 {
            assert_eq!(
                backend.inject(TapEvent::moved(Position::new(x as f64, 0.0))),
                Some(Propagation::Propagate)
            );
        }
        handle.stop().unwrap();

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![PointerEvent::Moved {
                position: Position::new(0.0, 0.0)
            }]
        );
    }

    #[test]
    fn test_unbounded_channel_keeps_everything() {
        let backend = Arc::new(MockBackend::new());
        let (handle, rx) = listen_unbounded_channel(backend.clone()).unwrap();
        for x in 0..50 {
            backend.inject(TapEvent::moved(Position::new(x as f64, 0.0)));
        }
        handle.stop().unwrap();
        assert_eq!(rx.try_iter().count(), 50);
    }

    #[test]
    fn test_grab_channel_filter_vetoes() {
        let backend = Arc::new(MockBackend::new());
        let (handle, rx) = grab_channel(backend.clone(), 16, |event| {
            !matches!(
                event,
                PointerEvent::Click {
                    button: ClickButton::Right,
                    ..
                }
            )
        })
        .unwrap();

        let here = Position::default();
        assert_eq!(
            backend.inject(TapEvent::button(EventKind::RightMouseDown, here, 1)),
            Some(Propagation::Block)
        );
        assert_eq!(
            backend.inject(TapEvent::button(EventKind::LeftMouseDown, here, 0)),
            Some(Propagation::Propagate)
        );
        handle.stop().unwrap();

        // Consumed events still reach the channel
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn test_dropping_handle_stops_listener() {
        let backend = Arc::new(MockBackend::new());
        let (handle, _rx) = listen_channel(backend.clone(), 4).unwrap();
        assert!(handle.is_running());
        drop(handle);
        assert_eq!(backend.active_taps(), 0);
    }

    #[test]
    fn test_tap_failure_is_reported() {
        let backend = Arc::new(MockBackend::new());
        backend.set_fail_tap_creation(true);
        assert!(matches!(
            listen_unbounded_channel(backend),
            Err(Error::TapCreateFailed(_))
        ));
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_async_channel_receives_events() {
        let backend = Arc::new(MockBackend::new());
        let (handle, mut rx) = listen_async_channel(backend.clone(), 8).unwrap();

        let injector = backend.clone();
        tokio::task::spawn_blocking(move || {
            injector.inject(TapEvent::scroll(Position::default(), 0, -2))
        })
        .await
        .unwrap();

        let event = tokio::time::timeout(WAIT, rx.recv()).await.unwrap();
        assert_eq!(
            event,
            Some(PointerEvent::Scroll {
                position: Position::default(),
                dx: 0,
                dy: -2
            })
        );
        handle.stop().unwrap();
    }
}
