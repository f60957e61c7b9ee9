use crate::error::{OverlayError, Result};
use crate::overlay_error;
use evdev::{AbsoluteAxisCode, PropType};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти устройство датчика движения (акселерометр, желательно с гироскопом)
    pub fn find_motion_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство датчика: {:?}", path);
                Ok(path)
            } else {
                OverlayError::device_not_found(format!(
                    "Указанное устройство датчика не найдено: {:?}",
                    path
                ))
            };
        }

        Self::auto_find_motion_device()
    }

    fn auto_find_motion_device() -> Result<PathBuf> {
        info!("Начинаем автопоиск датчика движения...");

        let input_dir = Path::new("/dev/input");
        let entries = fs::read_dir(input_dir)
            .map_err(|e| overlay_error!(permission, "Нет доступа к /dev/input: {}", e))?;

        let mut event_devices = Vec::new();
        for entry in entries {
            let entry = entry.map_err(OverlayError::Io)?;
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with("event") {
                event_devices.push(path);
            }
        }
        event_devices.sort();

        let mut candidates = Vec::new();
        for device_path in event_devices {
            debug!("Проверяем устройство: {:?}", device_path);
            if let Some(priority) = Self::motion_device_priority(&device_path) {
                candidates.push((device_path, priority));
            }
        }

        // Устройство с гироскопом предпочтительнее чистого акселерометра
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        match candidates.into_iter().next() {
            Some((path, priority)) => {
                info!("Найден датчик движения: {:?} (приоритет: {})", path, priority);
                Ok(path)
            }
            None => OverlayError::device_not_found(
                "Не найдено устройство с акселерометром среди event устройств",
            ),
        }
    }

    fn motion_device_priority(device_path: &Path) -> Option<u32> {
        let device = match evdev::Device::open(device_path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", device_path, e);
                return None;
            }
        };

        if !device.properties().contains(PropType::ACCELEROMETER) {
            return None;
        }

        let axes = device.supported_absolute_axes()?;
        if !(axes.contains(AbsoluteAxisCode::ABS_X) && axes.contains(AbsoluteAxisCode::ABS_Y)) {
            debug!(
                "Устройство {:?} помечено как акселерометр, но не имеет осей X/Y",
                device_path
            );
            return None;
        }

        let has_gyro =
            axes.contains(AbsoluteAxisCode::ABS_RX) && axes.contains(AbsoluteAxisCode::ABS_RY);
        debug!(
            "Акселерометр {:?} ({}), гироскоп: {}",
            device_path,
            device.name().unwrap_or("Unknown"),
            has_gyro
        );

        Some(if has_gyro { 100 } else { 50 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_motion_device_with_specific_path() {
        let result = DeviceFinder::find_motion_device("/non/existent/accel");
        assert!(matches!(result, Err(OverlayError::DeviceNotFound(_))));
    }
}
