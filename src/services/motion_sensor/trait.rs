use crate::config::MotionConfig;
use crate::error::Result;
use crate::events::RawSensorEvent;
use crate::utils::DeviceFinder;
use tokio::sync::mpsc;
use tracing::info;

/// Источник сырых событий акселерометра и гироскопа
pub trait SensorBackend: Send {
    fn name(&self) -> &str;

    /// Начать доставку событий в `events` с частотой, подходящей для игр (~50 Гц)
    fn start(&mut self, events: mpsc::Sender<RawSensorEvent>) -> Result<()>;

    /// Прекратить доставку. Безопасно вызывать повторно.
    fn stop(&mut self);
}

/// Factory function to pick a sensor backend based on the dry_run flag.
///
/// Returns None when no motion device exists: hanging characters then stay still.
pub fn create_sensor_backend(config: &MotionConfig, dry_run: bool) -> Option<Box<dyn SensorBackend>> {
    if dry_run {
        return Some(Box::new(super::dry_sensor::DryRunSensorBackend::new()));
    }

    match DeviceFinder::find_motion_device(&config.device_path) {
        Ok(path) => Some(Box::new(super::evdev_sensor::EvdevSensorBackend::new(path))),
        Err(e) => {
            info!(
                "Датчик движения недоступен ({}), подвешенные персонажи будут неподвижны",
                e
            );
            None
        }
    }
}
