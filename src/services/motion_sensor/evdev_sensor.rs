use crate::error::{OverlayError, Result};
use crate::events::RawSensorEvent;
use evdev::{AbsoluteAxisCode, Device, EventType, SynchronizationCode};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use super::r#trait::SensorBackend;

const STANDARD_GRAVITY: f32 = 9.806_65;

/// Перевод сырых значений осей в физические единицы
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisScale {
    /// единиц на g
    accel_per_g: f32,
    /// единиц на градус в секунду
    gyro_per_dps: f32,
}

impl AxisScale {
    fn from_device(device: &Device) -> Self {
        let mut scale = Self {
            accel_per_g: 1.0,
            gyro_per_dps: 1.0,
        };

        match device.get_absinfo() {
            Ok(axes) => {
                for (axis, info) in axes {
                    let resolution = info.resolution();
                    if resolution <= 0 {
                        continue;
                    }
                    if axis == AbsoluteAxisCode::ABS_X {
                        scale.accel_per_g = resolution as f32;
                    } else if axis == AbsoluteAxisCode::ABS_RX {
                        scale.gyro_per_dps = resolution as f32;
                    }
                }
            }
            Err(e) => warn!("Не удалось прочитать параметры осей датчика: {}", e),
        }

        scale
    }

    fn accel(&self, raw: i32) -> f32 {
        raw as f32 / self.accel_per_g * STANDARD_GRAVITY
    }

    fn gyro(&self, raw: i32) -> f32 {
        (raw as f32 / self.gyro_per_dps).to_radians()
    }
}

/// Накопитель значений между SYN_REPORT
#[derive(Debug, Default)]
struct FrameAccumulator {
    accel: [i32; 3],
    gyro: [i32; 3],
    accel_dirty: bool,
    gyro_dirty: bool,
}

impl FrameAccumulator {
    fn record(&mut self, code: u16, value: i32) {
        let (slot, is_gyro) = match code {
            c if c == AbsoluteAxisCode::ABS_X.0 => (0, false),
            c if c == AbsoluteAxisCode::ABS_Y.0 => (1, false),
            c if c == AbsoluteAxisCode::ABS_Z.0 => (2, false),
            c if c == AbsoluteAxisCode::ABS_RX.0 => (0, true),
            c if c == AbsoluteAxisCode::ABS_RY.0 => (1, true),
            c if c == AbsoluteAxisCode::ABS_RZ.0 => (2, true),
            _ => return,
        };

        if is_gyro {
            self.gyro[slot] = value;
            self.gyro_dirty = true;
        } else {
            self.accel[slot] = value;
            self.accel_dirty = true;
        }
    }

    fn flush(&mut self, scale: &AxisScale) -> Vec<RawSensorEvent> {
        let mut events = Vec::with_capacity(2);
        if self.accel_dirty {
            events.push(RawSensorEvent::accelerometer(
                scale.accel(self.accel[0]),
                scale.accel(self.accel[1]),
                scale.accel(self.accel[2]),
            ));
            self.accel_dirty = false;
        }
        if self.gyro_dirty {
            events.push(RawSensorEvent::gyroscope(
                scale.gyro(self.gyro[0]),
                scale.gyro(self.gyro[1]),
                scale.gyro(self.gyro[2]),
            ));
            self.gyro_dirty = false;
        }
        events
    }
}

/// Датчики движения, доступные как evdev-устройство (INPUT_PROP_ACCELEROMETER)
pub struct EvdevSensorBackend {
    device_path: PathBuf,
    stop_flag: Arc<AtomicBool>,
    reader: Option<thread::JoinHandle<()>>,
}

impl EvdevSensorBackend {
    pub fn new(device_path: PathBuf) -> Self {
        info!("Инициализация EvdevSensorBackend ({:?})", device_path);
        Self {
            device_path,
            stop_flag: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }

    /// Новый флаг остановки на каждый запуск; прежний поток сохраняет свой
    fn arm_stop_flag(&mut self) -> Arc<AtomicBool> {
        self.stop_flag = Arc::new(AtomicBool::new(false));
        Arc::clone(&self.stop_flag)
    }

    fn read_loop(
        mut device: Device,
        scale: AxisScale,
        events: mpsc::Sender<RawSensorEvent>,
        stop_flag: Arc<AtomicBool>,
    ) {
        let mut frame = FrameAccumulator::default();

        while !stop_flag.load(Ordering::Relaxed) {
            let batch = match device.fetch_events() {
                Ok(batch) => batch.collect::<Vec<_>>(),
                Err(e) => {
                    error!("Ошибка чтения событий датчика: {}", e);
                    return;
                }
            };

            for event in batch {
                if event.event_type() == EventType::ABSOLUTE {
                    frame.record(event.code(), event.value());
                } else if event.event_type() == EventType::SYNCHRONIZATION
                    && event.code() == SynchronizationCode::SYN_REPORT.0
                {
                    for raw in frame.flush(&scale) {
                        match events.try_send(raw) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                crate::trace_if_enabled!("Очередь датчика заполнена, событие пропущено");
                            }
                            Err(TrySendError::Closed(_)) => return,
                        }
                    }
                }
            }
        }

        debug!("Поток чтения датчика завершён");
    }
}

impl SensorBackend for EvdevSensorBackend {
    fn name(&self) -> &str {
        "evdev"
    }

    fn start(&mut self, events: mpsc::Sender<RawSensorEvent>) -> Result<()> {
        if self.reader.is_some() {
            return Ok(());
        }

        let device = Device::open(&self.device_path).map_err(|e| {
            OverlayError::SensorUnavailable(format!(
                "Не удалось открыть датчик {:?}: {}",
                self.device_path, e
            ))
        })?;
        let scale = AxisScale::from_device(&device);
        info!(
            "Датчик {} открыт: {:.0} ед/g, {:.0} ед/(°/с)",
            device.name().unwrap_or("Unknown"),
            scale.accel_per_g,
            scale.gyro_per_dps
        );

        let stop_flag = self.arm_stop_flag();

        let reader = thread::Builder::new()
            .name("motion-sensor".to_string())
            .spawn(move || Self::read_loop(device, scale, events, stop_flag))?;
        self.reader = Some(reader);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        // Поток заблокирован в чтении; он выйдет на следующем событии или при закрытии канала
        if self.reader.take().is_some() {
            debug!("Остановка чтения датчика {:?}", self.device_path);
        }
    }
}

impl Drop for EvdevSensorBackend {
    fn drop(&mut self) {
        self.stop();
    }
}
