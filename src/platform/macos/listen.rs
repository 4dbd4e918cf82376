//! macOS event interception using CGEventTap.

#![allow(unsafe_op_in_unsafe_fn)]

use crate::backend::{InterceptionPoint, RunLoop, TapCallback};
use crate::error::{Error, Result};
use crate::event::{EventKind, EventMask, Position, Propagation, TapEvent};
use core::ptr::NonNull;
use objc2_core_foundation::{
    CFMachPort, CFRetained, CFRunLoop, CFRunLoopSource, kCFRunLoopCommonModes,
    kCFRunLoopDefaultMode,
};
use objc2_core_graphics::{
    CGEvent, CGEventField, CGEventTapCallBack, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventTapProxy, CGEventType,
};
use objc2_foundation::NSAutoreleasePool;
use std::ffi::c_void;
use std::ptr::{null, null_mut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Seconds per run-loop slice; the stop flag is re-checked between slices.
const RUN_SLICE_SECONDS: f64 = 0.25;

/// State reachable from the C callback through `user_info`.
struct TapContext {
    callback: TapCallback,
    tap: *const CFMachPort,
}

/// Run loop of the tap thread.
///
/// Safety: CFRunLoopStop and CFRunLoopWakeUp may be called from any thread.
struct LoopRef(CFRetained<CFRunLoop>);
unsafe impl Send for LoopRef {}
unsafe impl Sync for LoopRef {}

/// Stop handle shared with the listener.
#[derive(Default)]
struct QuartzRunLoop {
    stop_requested: AtomicBool,
    run_loop: Mutex<Option<LoopRef>>,
}

impl RunLoop for QuartzRunLoop {
    fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        if let Ok(guard) = self.run_loop.lock()
            && let Some(ref run_loop) = *guard
        {
            run_loop.0.stop();
            run_loop.0.wake_up();
        }
    }
}

/// A session-level event tap owned by the thread that created it.
pub(super) struct QuartzTap {
    tap: CFRetained<CFMachPort>,
    source: Option<CFRetained<CFRunLoopSource>>,
    stopper: Arc<QuartzRunLoop>,
    // Must outlive `tap`: the OS holds a raw pointer to it.
    _context: Box<TapContext>,
}

/// The CGEventTap callback
unsafe extern "C-unwind" fn tap_callback(
    _proxy: CGEventTapProxy,
    event_type: CGEventType,
    cg_event: NonNull<CGEvent>,
    user_info: *mut c_void,
) -> *mut CGEvent {
    let Some(context) = (user_info as *mut TapContext).as_mut() else {
        return cg_event.as_ptr();
    };

    // macOS disables a tap whose callback is too slow; turn it back on
    if event_type == CGEventType::TapDisabledByTimeout
        || event_type == CGEventType::TapDisabledByUserInput
    {
        log::warn!("Event tap was disabled (timeout or user input), re-enabling...");
        if !context.tap.is_null() {
            CGEvent::tap_enable(&*context.tap, true);
        }
        return cg_event.as_ptr();
    }

    let event = Some(cg_event.as_ref());
    let point = CGEvent::location(event);
    let tap_event = TapEvent {
        kind: EventKind::from_raw(event_type.0),
        location: Position::new(point.x, point.y),
        button_number: CGEvent::integer_value_field(event, CGEventField::MouseEventButtonNumber),
        scroll_axis1: CGEvent::integer_value_field(
            event,
            CGEventField::ScrollWheelEventDeltaAxis1,
        ),
        scroll_axis2: CGEvent::integer_value_field(
            event,
            CGEventField::ScrollWheelEventDeltaAxis2,
        ),
    };

    match (context.callback)(&tap_event) {
        Propagation::Propagate => cg_event.as_ptr(),
        Propagation::Block => null_mut(),
    }
}

impl QuartzTap {
    /// Create an active-filter tap at the session level.
    pub(super) fn create(mask: EventMask, callback: TapCallback) -> Result<Self> {
        let mut context = Box::new(TapContext {
            callback,
            tap: null(),
        });
        let user_info = &mut *context as *mut TapContext as *mut c_void;

        let tap = unsafe {
            let callback: CGEventTapCallBack = Some(tap_callback);
            CGEvent::tap_create(
                CGEventTapLocation::SessionEventTap,
                CGEventTapPlacement::HeadInsertEventTap,
                CGEventTapOptions::Default,
                mask.bits(),
                callback,
                user_info,
            )
        }
        .ok_or_else(|| {
            log::error!("Failed to create event tap");
            Error::TapCreateFailed(
                "Make sure Accessibility permissions are granted to this process.".into(),
            )
        })?;
        context.tap = &*tap as *const CFMachPort;
        log::debug!("event tap created (mask {:#x})", mask.bits());

        Ok(Self {
            tap,
            source: None,
            stopper: Arc::new(QuartzRunLoop::default()),
            _context: context,
        })
    }
}

impl InterceptionPoint for QuartzTap {
    fn attach_to_run_loop(&mut self) -> Result<()> {
        let source = CFMachPort::new_run_loop_source(None, Some(&self.tap), 0)
            .ok_or_else(|| Error::HookStartFailed("Failed to create run loop source".into()))?;
        let current_loop = CFRunLoop::current()
            .ok_or_else(|| Error::HookStartFailed("Failed to get current run loop".into()))?;

        unsafe {
            current_loop.add_source(Some(&source), kCFRunLoopCommonModes);
        }
        self.source = Some(source);

        let mut guard = self
            .stopper
            .run_loop
            .lock()
            .map_err(|_| Error::ThreadError("mutex poisoned".into()))?;
        *guard = Some(LoopRef(current_loop));
        log::debug!("event tap attached to run loop");
        Ok(())
    }

    fn enable(&mut self, enabled: bool) {
        CGEvent::tap_enable(&self.tap, enabled);
    }

    fn run_loop(&self) -> Arc<dyn RunLoop> {
        self.stopper.clone()
    }

    fn run(&mut self) {
        unsafe {
            let _pool = NSAutoreleasePool::new();
            while !self.stopper.stop_requested.load(Ordering::SeqCst) {
                CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, RUN_SLICE_SECONDS, false);
            }
        }
        log::debug!("event tap run loop exited");
    }
}

impl Drop for QuartzTap {
    fn drop(&mut self) {
        CGEvent::tap_enable(&self.tap, false);
        if let Some(source) = self.source.take()
            && let Ok(mut guard) = self.stopper.run_loop.lock()
            && let Some(run_loop) = guard.take()
        {
            unsafe {
                run_loop.0.remove_source(Some(&source), kCFRunLoopCommonModes);
            }
        }
        // Invalidated before `context` is freed by the field drops.
        self.tap.invalidate();
    }
}
