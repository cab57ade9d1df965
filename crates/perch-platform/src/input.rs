//! Pointer input as delivered to event monitors.

use bitflags::bitflags;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Primary,
    Secondary,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
}

/// What the shell delivered the event to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Indicator,
    Overlay,
    /// Another window, another process, or unknown.
    Elsewhere,
}

bitflags! {
    /// Keyboard modifiers held while the event fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        /// Command on macOS, the Windows key elsewhere.
        const META = 1 << 3;
    }
}

bitflags! {
    /// Event types a monitor subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMask: u16 {
        const PRIMARY_DOWN = 1 << 0;
        const PRIMARY_UP = 1 << 1;
        const SECONDARY_DOWN = 1 << 2;
        const SECONDARY_UP = 1 << 3;
        const OTHER_DOWN = 1 << 4;
        const OTHER_UP = 1 << 5;

        const BUTTON_DOWN = Self::PRIMARY_DOWN.bits()
            | Self::SECONDARY_DOWN.bits()
            | Self::OTHER_DOWN.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub kind: EventKind,
    pub target: EventTarget,
    pub modifiers: Modifiers,
    /// Screen position in y-up coordinates, when the backend knows it.
    pub location: Option<Vec2>,
}

impl InputEvent {
    pub fn press(button: MouseButton, target: EventTarget) -> Self {
        Self {
            kind: EventKind::ButtonDown(button),
            target,
            modifiers: Modifiers::empty(),
            location: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn at(mut self, location: Vec2) -> Self {
        self.location = Some(location);
        self
    }

    pub fn is_press(&self) -> bool {
        matches!(self.kind, EventKind::ButtonDown(_))
    }

    /// The single mask bit describing this event.
    pub fn mask(&self) -> EventMask {
        match self.kind {
            EventKind::ButtonDown(MouseButton::Primary) => EventMask::PRIMARY_DOWN,
            EventKind::ButtonDown(MouseButton::Secondary) => EventMask::SECONDARY_DOWN,
            EventKind::ButtonDown(MouseButton::Other) => EventMask::OTHER_DOWN,
            EventKind::ButtonUp(MouseButton::Primary) => EventMask::PRIMARY_UP,
            EventKind::ButtonUp(MouseButton::Secondary) => EventMask::SECONDARY_UP,
            EventKind::ButtonUp(MouseButton::Other) => EventMask::OTHER_UP,
        }
    }
}

impl EventMask {
    pub fn matches(&self, event: &InputEvent) -> bool {
        self.contains(event.mask())
    }
}
