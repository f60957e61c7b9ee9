pub mod command;
pub mod motion;

pub use command::ServiceCommand;
pub use motion::{MotionSample, RawSensorEvent, SensorKind};
