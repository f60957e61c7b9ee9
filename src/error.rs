use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Датчик движения недоступен: {0}")]
    SensorUnavailable(String),

    #[error("Неизвестный персонаж: {0}")]
    UnknownCharacter(String),

    #[error("Некорректная команда: {0}")]
    InvalidCommand(String),
}

impl OverlayError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(OverlayError::DeviceNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! overlay_error {
    (permission, $($arg:tt)*) => {
        $crate::error::OverlayError::Permission(format!($($arg)*))
    };
    (unknown_character, $($arg:tt)*) => {
        $crate::error::OverlayError::UnknownCharacter(format!($($arg)*))
    };
    (invalid_command, $($arg:tt)*) => {
        $crate::error::OverlayError::InvalidCommand(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_builds_matching_variant() {
        assert!(matches!(
            overlay_error!(permission, "нет доступа к {}", "/dev/input"),
            OverlayError::Permission(msg) if msg == "нет доступа к /dev/input"
        ));
        assert!(matches!(
            overlay_error!(invalid_command, "x"),
            OverlayError::InvalidCommand(_)
        ));

        let err = overlay_error!(unknown_character, "{}", "ghost");
        assert_eq!(err.to_string(), "Неизвестный персонаж: ghost");
    }
}
