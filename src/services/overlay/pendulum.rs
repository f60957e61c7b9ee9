/// Длина верёвки подвешенного персонажа
pub const ROPE_LENGTH: f32 = 80.0;

const MAX_SWING_ANGLE_DEG: f32 = 30.0;
const SPRING: f32 = 0.12;
const ROTATION_SPRING: f32 = 0.08;
const DAMPING: f32 = 0.94;
const ROTATION_DAMPING: f32 = 0.96;
const ROTATION_FOLLOW: f32 = 0.8;

pub const MAX_SWAY_X: f32 = ROPE_LENGTH * 0.8;
pub const MAX_SWAY_Y: f32 = ROPE_LENGTH * 0.3;
pub const MAX_SWAY_ROTATION: f32 = 25.0;

/// Дискретный пружинно-демпферный маятник вокруг неподвижной точки подвеса
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pendulum {
    pub origin_x: i32,
    pub origin_y: i32,
    pub sway_x: f32,
    pub sway_y: f32,
    pub sway_rotation: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub rotation_velocity: f32,
}

impl Pendulum {
    pub fn anchored_at(origin_x: i32, origin_y: i32) -> Self {
        Self {
            origin_x,
            origin_y,
            ..Self::default()
        }
    }

    pub fn set_origin(&mut self, origin_x: i32, origin_y: i32) {
        self.origin_x = origin_x;
        self.origin_y = origin_y;
    }

    pub fn reset_motion(&mut self) {
        *self = Self::anchored_at(self.origin_x, self.origin_y);
    }

    /// Один шаг симуляции по горизонтальному раскачиванию устройства
    pub fn step(&mut self, device_sway_x: f32) {
        let target_angle_deg = (device_sway_x * 0.5).clamp(-MAX_SWING_ANGLE_DEG, MAX_SWING_ANGLE_DEG);
        let angle = target_angle_deg.to_radians();

        // Точка на дуге окружности вокруг точки подвеса
        let target_x = ROPE_LENGTH * angle.sin();
        let target_y = ROPE_LENGTH * angle.cos() - ROPE_LENGTH;

        let force_x = (target_x - self.sway_x) * SPRING;
        let force_y = (target_y - self.sway_y) * SPRING;
        let target_rotation = target_angle_deg * ROTATION_FOLLOW;
        let rotation_force = (target_rotation - self.sway_rotation) * ROTATION_SPRING;

        self.velocity_x = (self.velocity_x + force_x) * DAMPING;
        self.velocity_y = (self.velocity_y + force_y) * DAMPING;
        self.rotation_velocity = (self.rotation_velocity + rotation_force) * ROTATION_DAMPING;

        self.sway_x = (self.sway_x + self.velocity_x).clamp(-MAX_SWAY_X, MAX_SWAY_X);
        self.sway_y = (self.sway_y + self.velocity_y).clamp(-MAX_SWAY_Y, MAX_SWAY_Y);
        self.sway_rotation =
            (self.sway_rotation + self.rotation_velocity).clamp(-MAX_SWAY_ROTATION, MAX_SWAY_ROTATION);
    }

    /// Позиция окна: точка подвеса плюс текущее смещение
    pub fn position(&self) -> (i32, i32) {
        (
            self.origin_x.saturating_add(self.sway_x.round() as i32),
            self.origin_y.saturating_add(self.sway_y.round() as i32),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within_clamps(p: &Pendulum) -> bool {
        p.sway_x.abs() <= MAX_SWAY_X
            && p.sway_y.abs() <= MAX_SWAY_Y
            && p.sway_rotation.abs() <= MAX_SWAY_ROTATION
    }

    #[test]
    fn test_constant_input_stays_bounded_and_settles() {
        let mut pendulum = Pendulum::anchored_at(150, 20);
        let angle = 20f32.to_radians();
        let expected_x = ROPE_LENGTH * angle.sin();
        let expected_y = ROPE_LENGTH * angle.cos() - ROPE_LENGTH;

        let mut early_error: f32 = 0.0;
        let mut late_error: f32 = 0.0;

        for i in 0..1000 {
            pendulum.step(40.0);
            assert!(within_clamps(&pendulum), "вышли за пределы на шаге {}", i);
            assert!(pendulum.sway_x.is_finite() && pendulum.velocity_x.is_finite());

            let error = (pendulum.sway_x - expected_x).abs();
            if i < 100 {
                early_error = early_error.max(error);
            } else if i >= 900 {
                late_error = late_error.max(error);
            }
        }

        assert!(late_error < early_error);
        assert!((pendulum.sway_x - expected_x).abs() < 0.01);
        assert!((pendulum.sway_y - expected_y).abs() < 0.01);
        assert!((pendulum.sway_rotation - 16.0).abs() < 0.01);
        assert!(pendulum.velocity_x.abs() < 1e-3);
    }

    #[test]
    fn test_extreme_alternating_input_never_diverges() {
        let mut pendulum = Pendulum::anchored_at(0, 0);
        for i in 0..1000 {
            let input = if (i / 7) % 2 == 0 { 40.0 } else { -40.0 };
            pendulum.step(input);
            assert!(within_clamps(&pendulum));
            assert!(pendulum.velocity_x.is_finite());
            assert!(pendulum.velocity_x.abs() < 2.0 * MAX_SWAY_X);
        }
    }

    #[test]
    fn test_reset_keeps_origin() {
        let mut pendulum = Pendulum::anchored_at(10, 30);
        pendulum.step(25.0);
        pendulum.step(25.0);
        assert_ne!(pendulum.sway_x, 0.0);

        pendulum.reset_motion();
        assert_eq!(pendulum, Pendulum::anchored_at(10, 30));
        assert_eq!(pendulum.position(), (10, 30));
    }

    #[test]
    fn test_position_saturates_at_extreme_origin() {
        let mut pendulum = Pendulum::anchored_at(i32::MAX, i32::MIN);
        for _ in 0..50 {
            pendulum.step(40.0);
        }
        assert!(pendulum.sway_x > 0.0 && pendulum.sway_y < 0.0);
        assert_eq!(pendulum.position(), (i32::MAX, i32::MIN));
    }
}
