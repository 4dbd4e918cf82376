//! Shared event types used by the injectors, the listener and the backends.

use std::fmt;
use std::ops::BitOr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in global screen space.
///
/// The origin is the top-left corner of the main display and `y` grows
/// downward. Coordinates on secondary displays may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Horizontal coordinate in screen points.
    pub x: f64,
    /// Vertical coordinate in screen points.
    pub y: f64,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Return this position shifted by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Pointer buttons that can be synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Button {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button. Some applications ignore it.
    Middle,
}

impl Button {
    /// The OS button number (0-indexed).
    pub fn number(&self) -> i64 {
        match self {
            Button::Left => 0,
            Button::Right => 1,
            Button::Middle => 2,
        }
    }

    /// Event kind posted when this button goes down.
    pub fn down_kind(&self) -> EventKind {
        match self {
            Button::Left => EventKind::LeftMouseDown,
            Button::Right => EventKind::RightMouseDown,
            Button::Middle => EventKind::OtherMouseDown,
        }
    }

    /// Event kind posted when this button goes up.
    pub fn up_kind(&self) -> EventKind {
        match self {
            Button::Left => EventKind::LeftMouseUp,
            Button::Right => EventKind::RightMouseUp,
            Button::Middle => EventKind::OtherMouseUp,
        }
    }

    /// Event kind posted when the pointer moves with this button held.
    pub fn dragged_kind(&self) -> EventKind {
        match self {
            Button::Left => EventKind::LeftMouseDragged,
            Button::Right => EventKind::RightMouseDragged,
            Button::Middle => EventKind::OtherMouseDragged,
        }
    }
}

/// Low-level event kinds.
///
/// Raw values follow the Quartz `CGEventType` numbering so the macOS backend
/// converts without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    LeftMouseDown,
    LeftMouseUp,
    RightMouseDown,
    RightMouseUp,
    MouseMoved,
    LeftMouseDragged,
    RightMouseDragged,
    KeyDown,
    KeyUp,
    ScrollWheel,
    OtherMouseDown,
    OtherMouseUp,
    OtherMouseDragged,
    /// Any kind this crate does not classify.
    Other(u32),
}

impl EventKind {
    /// Numeric event type as used by the OS.
    pub const fn raw(self) -> u32 {
        match self {
            EventKind::LeftMouseDown => 1,
            EventKind::LeftMouseUp => 2,
            EventKind::RightMouseDown => 3,
            EventKind::RightMouseUp => 4,
            EventKind::MouseMoved => 5,
            EventKind::LeftMouseDragged => 6,
            EventKind::RightMouseDragged => 7,
            EventKind::KeyDown => 10,
            EventKind::KeyUp => 11,
            EventKind::ScrollWheel => 22,
            EventKind::OtherMouseDown => 25,
            EventKind::OtherMouseUp => 26,
            EventKind::OtherMouseDragged => 27,
            EventKind::Other(raw) => raw,
        }
    }

    /// Classify a numeric OS event type.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => EventKind::LeftMouseDown,
            2 => EventKind::LeftMouseUp,
            3 => EventKind::RightMouseDown,
            4 => EventKind::RightMouseUp,
            5 => EventKind::MouseMoved,
            6 => EventKind::LeftMouseDragged,
            7 => EventKind::RightMouseDragged,
            10 => EventKind::KeyDown,
            11 => EventKind::KeyUp,
            22 => EventKind::ScrollWheel,
            25 => EventKind::OtherMouseDown,
            26 => EventKind::OtherMouseUp,
            27 => EventKind::OtherMouseDragged,
            other => EventKind::Other(other),
        }
    }

    /// Whether this is a button-down event for any button.
    pub fn is_button_down(&self) -> bool {
        matches!(
            self,
            EventKind::LeftMouseDown | EventKind::RightMouseDown | EventKind::OtherMouseDown
        )
    }

    /// Whether this is a button-up event for any button.
    pub fn is_button_up(&self) -> bool {
        matches!(
            self,
            EventKind::LeftMouseUp | EventKind::RightMouseUp | EventKind::OtherMouseUp
        )
    }
}

/// Set of event kinds an interception point subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventMask(u64);

impl EventMask {
    /// Pointer motion, button down/up for all buttons and the scroll wheel.
    pub const POINTER: EventMask = EventMask::of(&[
        EventKind::MouseMoved,
        EventKind::LeftMouseDown,
        EventKind::LeftMouseUp,
        EventKind::RightMouseDown,
        EventKind::RightMouseUp,
        EventKind::OtherMouseDown,
        EventKind::OtherMouseUp,
        EventKind::ScrollWheel,
    ]);

    /// Build a mask from a list of kinds. Kinds whose raw value does not
    /// fit in the mask are ignored.
    pub const fn of(kinds: &[EventKind]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < kinds.len() {
            let raw = kinds[i].raw();
            if raw < 64 {
                bits |= 1u64 << raw;
            }
            i += 1;
        }
        EventMask(bits)
    }

    /// Raw bit mask (`1 << raw_kind` per kind).
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Whether `kind` is part of the mask.
    pub fn contains(&self, kind: EventKind) -> bool {
        let raw = kind.raw();
        raw < 64 && self.0 & (1u64 << raw) != 0
    }
}

/// Keyboard modifier flags attached to synthetic events.
///
/// Bit values match Quartz `CGEventFlags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModifierFlags(u64);

impl ModifierFlags {
    /// No modifiers.
    pub const NONE: ModifierFlags = ModifierFlags(0);
    /// Shift.
    pub const SHIFT: ModifierFlags = ModifierFlags(0x0002_0000);
    /// Control.
    pub const CONTROL: ModifierFlags = ModifierFlags(0x0004_0000);
    /// Option / Alt.
    pub const ALTERNATE: ModifierFlags = ModifierFlags(0x0008_0000);
    /// Command.
    pub const COMMAND: ModifierFlags = ModifierFlags(0x0010_0000);

    /// Raw flag bits.
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Whether every flag in `other` is set.
    pub fn contains(&self, other: ModifierFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ModifierFlags {
    type Output = ModifierFlags;

    fn bitor(self, rhs: Self) -> Self {
        ModifierFlags(self.0 | rhs.0)
    }
}

/// Unit for synthetic scroll deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScrollUnit {
    /// Deltas are in pixels.
    #[default]
    Pixel,
    /// Deltas are in lines.
    Line,
}

/// An event delivered by an interception point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapEvent {
    /// Kind of the intercepted event.
    pub kind: EventKind,
    /// Screen location at the time of the event.
    pub location: Position,
    /// Button number field (0 left, 1 right, 2 middle, higher for extra buttons).
    pub button_number: i64,
    /// Vertical scroll delta (wheel axis 1). Positive scrolls up.
    pub scroll_axis1: i64,
    /// Horizontal scroll delta (wheel axis 2). Positive scrolls left.
    pub scroll_axis2: i64,
}

impl TapEvent {
    /// A pointer motion event.
    pub fn moved(location: Position) -> Self {
        Self {
            kind: EventKind::MouseMoved,
            location,
            button_number: 0,
            scroll_axis1: 0,
            scroll_axis2: 0,
        }
    }

    /// A button event of the given kind.
    pub fn button(kind: EventKind, location: Position, button_number: i64) -> Self {
        Self {
            kind,
            location,
            button_number,
            scroll_axis1: 0,
            scroll_axis2: 0,
        }
    }

    /// A scroll wheel event.
    pub fn scroll(location: Position, dx: i64, dy: i64) -> Self {
        Self {
            kind: EventKind::ScrollWheel,
            location,
            button_number: 0,
            scroll_axis1: dy,
            scroll_axis2: dx,
        }
    }
}

/// What happens to an intercepted event after the handlers ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Propagation {
    /// Deliver the event to other applications.
    #[default]
    Propagate,
    /// Consume the event.
    Block,
}

impl From<()> for Propagation {
    fn from(_: ()) -> Self {
        Propagation::Propagate
    }
}

impl From<bool> for Propagation {
    fn from(propagate: bool) -> Self {
        if propagate {
            Propagation::Propagate
        } else {
            Propagation::Block
        }
    }
}

impl From<Option<bool>> for Propagation {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(false) => Propagation::Block,
            _ => Propagation::Propagate,
        }
    }
}

/// Button reported by an intercepted click.
///
/// Extra buttons beyond the three synthesizable ones are kept as their raw
/// number and displayed as `buttonN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClickButton {
    Left,
    Right,
    Middle,
    Other(i64),
}

impl ClickButton {
    /// Decode an OS button number.
    pub fn from_number(number: i64) -> Self {
        match number {
            0 => ClickButton::Left,
            1 => ClickButton::Right,
            2 => ClickButton::Middle,
            n => ClickButton::Other(n),
        }
    }

    /// The matching synthesizable button, if any.
    pub fn as_button(&self) -> Option<Button> {
        match self {
            ClickButton::Left => Some(Button::Left),
            ClickButton::Right => Some(Button::Right),
            ClickButton::Middle => Some(Button::Middle),
            ClickButton::Other(_) => None,
        }
    }
}

impl fmt::Display for ClickButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickButton::Left => f.write_str("left"),
            ClickButton::Right => f.write_str("right"),
            ClickButton::Middle => f.write_str("middle"),
            ClickButton::Other(n) => write!(f, "button{n}"),
        }
    }
}

/// A classified pointer event, as forwarded by the channel listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PointerEvent {
    /// The pointer moved.
    Moved { position: Position },
    /// A button was pressed or released.
    Click {
        position: Position,
        button: ClickButton,
        pressed: bool,
    },
    /// The wheel scrolled.
    Scroll { position: Position, dx: i64, dy: i64 },
}

impl PointerEvent {
    /// Where the event happened.
    pub fn position(&self) -> Position {
        match self {
            PointerEvent::Moved { position }
            | PointerEvent::Click { position, .. }
            | PointerEvent::Scroll { position, .. } => *position,
        }
    }
}
