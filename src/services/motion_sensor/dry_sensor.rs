use crate::error::Result;
use crate::events::RawSensorEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::info;

use super::r#trait::SensorBackend;

/// Период "игровой" частоты датчиков
const GAME_RATE: Duration = Duration::from_millis(20);

/// Эмуляция датчиков: телефон плавно покачивается из стороны в сторону
pub struct DryRunSensorBackend {
    task: Option<JoinHandle<()>>,
}

impl DryRunSensorBackend {
    pub fn new() -> Self {
        info!("Инициализация DryRunSensorBackend");
        Self { task: None }
    }

    /// Синтетические показания на шаге `step`
    pub fn synthetic_events(step: u64) -> [RawSensorEvent; 2] {
        let t = step as f32 * GAME_RATE.as_secs_f32();
        let tilt = (t * 0.8).sin();
        [
            RawSensorEvent::accelerometer(tilt * 4.0, (t * 0.5).cos() * 2.0, 9.3),
            RawSensorEvent::gyroscope((t * 0.5).sin() * 0.3, (t * 0.8).cos() * 0.6, 0.0),
        ]
    }
}

impl Default for DryRunSensorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBackend for DryRunSensorBackend {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn start(&mut self, events: mpsc::Sender<RawSensorEvent>) -> Result<()> {
        if self.task.is_some() {
            return Ok(());
        }

        info!("Dry-run режим - датчики движения работают в режиме эмуляции");

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval(GAME_RATE);
            let mut step: u64 = 0;
            loop {
                ticker.tick().await;
                for event in Self::synthetic_events(step) {
                    if events.send(event).await.is_err() {
                        return;
                    }
                }
                step = step.wrapping_add(1);
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_events_are_bounded() {
        for step in 0..1000 {
            let [accel, gyro] = DryRunSensorBackend::synthetic_events(step);
            assert!(accel.x.abs() <= 4.0 && accel.y.abs() <= 2.0);
            assert!(gyro.x.abs() <= 0.3 && gyro.y.abs() <= 0.6);
        }
    }

    #[tokio::test]
    async fn test_dry_backend_delivers_events() {
        let mut backend = DryRunSensorBackend::new();
        let (tx, mut rx) = mpsc::channel(8);
        backend.start(tx).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, crate::events::SensorKind::Accelerometer);

        backend.stop();
        backend.stop();
    }
}
