use std::fmt;

/// Тип датчика, приславшего событие
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
}

/// Сырое событие датчика: ускорение в м/с² или угловая скорость в рад/с
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSensorEvent {
    pub kind: SensorKind,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RawSensorEvent {
    pub fn accelerometer(x: f32, y: f32, z: f32) -> Self {
        Self {
            kind: SensorKind::Accelerometer,
            x,
            y,
            z,
        }
    }

    pub fn gyroscope(x: f32, y: f32, z: f32) -> Self {
        Self {
            kind: SensorKind::Gyroscope,
            x,
            y,
            z,
        }
    }
}

/// Раскачивание устройства по двум осям, в условных градусах
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionSample {
    pub sway_x: f32,
    pub sway_y: f32,
}

impl MotionSample {
    pub fn new(sway_x: f32, sway_y: f32) -> Self {
        Self { sway_x, sway_y }
    }
}

impl fmt::Display for MotionSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sway({:.2}, {:.2})", self.sway_x, self.sway_y)
    }
}
