//! Overlay lifecycle: one window per running character, walking ticks and
//! pendulum swings driven from the service loop.

mod entry;
mod manager;
pub mod pendulum;
mod scheduler;
mod screen;

pub use self::manager::{ManagerSettings, OverlayManager};
pub use self::screen::ScreenMetrics;
