//! Perch core engine: platform-agnostic placement and lifecycle of a tray overlay.

pub mod animation;
pub mod config;
pub mod error;
pub mod indicator;
pub mod lifecycle;
pub mod overlay;
pub mod position;
pub mod signal;

#[cfg(test)]
mod testing;

pub use config::PerchConfig;
pub use error::ConfigError;
pub use indicator::{classify_press, Backend, Indicator, LocalAction};
pub use lifecycle::PanelState;
pub use position::{resolve, Alignment, ClippingPolicy, Placement, Resolved, BORDER_INSET};
pub use signal::VisibilitySignal;
