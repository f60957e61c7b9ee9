//! WindowSystem adapter: responsibility and boundaries
//!
//! This module only creates, moves and removes always-on-top overlay windows.
//! Every call returns an explicit Result; deciding whether a failure matters is
//! left entirely to the OverlayManager.

mod headless;
mod r#trait;

pub use self::headless::{HeadlessWindowSystem, WindowTable};
pub use self::r#trait::{Gravity, WindowError, WindowHandle, WindowLayout, WindowSystem};
