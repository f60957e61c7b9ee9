mod dry_sensor;
mod evdev_sensor;
pub mod filter;
mod source;
mod r#trait;

pub use self::source::MotionSensorSource;

#[cfg(test)]
pub(crate) use self::source::tests::ScriptedBackend;
