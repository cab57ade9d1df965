//! Platform abstraction traits so `perch-core` stays OS-agnostic.

mod geometry;
mod input;

pub use geometry::{Rect, Screen, Size};
pub use glam::Vec2;
pub use input::{EventKind, EventMask, EventTarget, InputEvent, Modifiers, MouseButton};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Monitor callback. Returning `None` swallows the event; only local monitors honour that.
pub type EventHandler = Box<dyn FnMut(InputEvent) -> Option<InputEvent> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorScope {
    /// Events delivered to this process.
    Local,
    /// Events anywhere on the system. Observe-only.
    Global,
}

/// Source of pointer events. `start` and `stop` are no-ops when already in that state,
/// and implementations unregister on drop.
pub trait EventMonitor {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Builds monitors for the backend the indicator runs on.
pub trait MonitorFactory {
    fn create(
        &mut self,
        scope: MonitorScope,
        mask: EventMask,
        handler: EventHandler,
    ) -> Box<dyn EventMonitor>;
}

/// The floating window hosting the overlay content.
pub trait OverlaySurface {
    fn set_frame(&mut self, frame: Rect);
    fn set_alpha(&mut self, alpha: f32);
    /// Bring the surface on screen and ask the shell for key focus.
    fn order_front(&mut self);
    fn order_out(&mut self);
}

/// The persistent indicator (tray/status icon).
pub trait StatusItem {
    /// Screen rectangle of the icon, `None` while it is not displayed.
    fn anchor_rect(&self) -> Option<Rect>;
    fn set_highlighted(&mut self, highlighted: bool);
    fn set_visible(&mut self, visible: bool);
    fn set_title(&mut self, _title: &str) {}
}

/// Menu shown instead of the overlay on secondary clicks.
pub trait ContextMenu {
    /// Pop the menu up with its top-left corner at `at`.
    fn pop_up(&mut self, at: Vec2);
}

/// Fire-and-forget broadcasts telling the shell a menu-like interaction is running.
pub trait ShellSignals {
    fn begin_tracking(&mut self);
    fn end_tracking(&mut self);
}

pub trait Displays {
    /// Screen holding `anchor`, or the primary screen when there is no anchor.
    fn screen_for(&self, anchor: Option<Rect>) -> Option<Screen>;
}
