use crate::events::{MotionSample, RawSensorEvent, SensorKind};

/// Коэффициент экспоненциального сглаживания
pub const SMOOTHING_ALPHA: f32 = 0.8;

pub const MAX_SWAY_X: f32 = 40.0;
pub const MAX_SWAY_Y: f32 = 15.0;

/// Экспоненциальный фильтр по осям X и Y
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LowPass {
    pub x: f32,
    pub y: f32,
}

impl LowPass {
    pub fn update(&mut self, raw_x: f32, raw_y: f32) {
        self.x = SMOOTHING_ALPHA * self.x + (1.0 - SMOOTHING_ALPHA) * raw_x;
        self.y = SMOOTHING_ALPHA * self.y + (1.0 - SMOOTHING_ALPHA) * raw_y;
    }
}

/// Превращает сглаженные показания акселерометра и гироскопа в сигнал раскачивания
#[derive(Debug, Clone, Default)]
pub struct SwayFilter {
    accel: LowPass,
    gyro: LowPass,
}

impl SwayFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn accel(&self) -> LowPass {
        self.accel
    }

    /// Учесть событие любого датчика и пересчитать раскачивание по самым свежим значениям
    pub fn update(&mut self, event: &RawSensorEvent) -> MotionSample {
        // NaN/inf навсегда испортили бы сглаженное состояние
        if event.x.is_finite() && event.y.is_finite() {
            match event.kind {
                SensorKind::Accelerometer => self.accel.update(event.x, event.y),
                SensorKind::Gyroscope => self.gyro.update(event.x, event.y),
            }
        }
        self.sway()
    }

    pub fn sway(&self) -> MotionSample {
        let tilt_x = -self.accel.x;
        let tilt_y = self.accel.y * 0.5;

        let sway_x = tilt_x * 0.8 + self.gyro.y * 8.0;
        let sway_y = tilt_y * 0.3 + self.gyro.x * 3.0;

        MotionSample::new(clamp_sway(sway_x, MAX_SWAY_X), clamp_sway(sway_y, MAX_SWAY_Y))
    }
}

fn clamp_sway(value: f32, limit: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-limit, limit)
}
