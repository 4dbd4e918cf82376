//! macOS event synthesis using CGEvent.

#![allow(unused_unsafe)]

use crate::error::{Error, Result};
use crate::event::{Button, EventKind, ModifierFlags, Position, ScrollUnit};
use crate::keycode::KeyCode;
use objc2_core_foundation::CGPoint;
use objc2_core_graphics::{
    CGEvent, CGEventField, CGEventFlags, CGEventSource, CGEventSourceStateID, CGEventTapLocation,
    CGEventType, CGMouseButton, CGScrollEventUnit,
};

fn cg_button(button: Button) -> CGMouseButton {
    match button {
        Button::Left => CGMouseButton::Left,
        Button::Right => CGMouseButton::Right,
        Button::Middle => CGMouseButton::Center,
    }
}

/// Current cursor location.
pub(super) fn cursor_position() -> Result<Position> {
    unsafe {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .ok_or_else(|| Error::SimulateFailed("Failed to create event source".into()))?;
        let event = CGEvent::new(Some(&source))
            .ok_or_else(|| Error::SimulateFailed("Failed to create event".into()))?;
        let point = CGEvent::location(Some(&event));
        Ok(Position::new(point.x, point.y))
    }
}

/// Post a key event carrying `flags`.
pub(super) fn post_key(code: KeyCode, down: bool, flags: ModifierFlags) -> Result<()> {
    unsafe {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .ok_or_else(|| Error::SimulateFailed("Failed to create event source".into()))?;
        let event = CGEvent::new_keyboard_event(Some(&source), code.0, down)
            .ok_or_else(|| Error::SimulateFailed("Failed to create keyboard event".into()))?;
        CGEvent::set_flags(Some(&event), CGEventFlags(flags.bits()));
        CGEvent::post(CGEventTapLocation::HIDEventTap, Some(&event));
    }
    log::trace!("posted key {:?} down={down} flags={:#x}", code, flags.bits());
    Ok(())
}

/// Post a pointer event.
pub(super) fn post_mouse(
    kind: EventKind,
    position: Position,
    button: Button,
    click_state: Option<i64>,
) -> Result<()> {
    let point = CGPoint {
        x: position.x,
        y: position.y,
    };

    unsafe {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .ok_or_else(|| Error::SimulateFailed("Failed to create event source".into()))?;
        let event =
            CGEvent::new_mouse_event(Some(&source), CGEventType(kind.raw()), point, cg_button(button))
                .ok_or_else(|| Error::SimulateFailed("Failed to create mouse event".into()))?;

        // Other-button events carry the button number explicitly
        if button == Button::Middle {
            CGEvent::set_integer_value_field(
                Some(&event),
                CGEventField::MouseEventButtonNumber,
                button.number(),
            );
        }

        if let Some(clicks) = click_state {
            CGEvent::set_integer_value_field(
                Some(&event),
                CGEventField::MouseEventClickState,
                clicks,
            );
        }

        CGEvent::post(CGEventTapLocation::HIDEventTap, Some(&event));
    }
    log::trace!("posted {kind:?} at ({}, {}) clicks={click_state:?}", position.x, position.y);
    Ok(())
}

/// Post a scroll wheel event. Axis 1 is vertical, axis 2 horizontal.
pub(super) fn post_scroll(
    unit: ScrollUnit,
    axis_count: u32,
    vertical: i32,
    horizontal: i32,
) -> Result<()> {
    let unit = match unit {
        ScrollUnit::Pixel => CGScrollEventUnit::Pixel,
        ScrollUnit::Line => CGScrollEventUnit::Line,
    };

    unsafe {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .ok_or_else(|| Error::SimulateFailed("Failed to create event source".into()))?;
        let event = CGEvent::new_scroll_wheel_event2(
            Some(&source),
            unit,
            axis_count,
            vertical,
            horizontal,
            0,
        )
        .ok_or_else(|| Error::SimulateFailed("Failed to create scroll event".into()))?;

        CGEvent::post(CGEventTapLocation::HIDEventTap, Some(&event));
    }
    log::trace!("posted scroll vertical={vertical} horizontal={horizontal}");
    Ok(())
}
