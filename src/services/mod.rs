pub mod command_source;
pub mod motion_sensor;
pub mod overlay;
pub mod overlay_service;
pub mod window_system;

pub use command_source::create_command_source;
pub use motion_sensor::MotionSensorSource;
pub use overlay_service::OverlayService;
pub use window_system::HeadlessWindowSystem;
