use crate::error::Result;
use crate::overlay_error;
use std::fs;
use tracing::{info, warn};

/// Проверить доступ к устройствам ввода, через которые читаются датчики.
///
/// Отсутствие доступа не фатально: подвешенные персонажи просто остаются неподвижными.
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    check_input_devices_access()?;
    check_not_root();

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access() -> Result<()> {
    let input_dir = "/dev/input";

    if !std::path::Path::new(input_dir).exists() {
        return Err(overlay_error!(permission, "Директория {} не существует", input_dir));
    }

    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", input_dir);
            Ok(())
        }
        Err(e) => Err(overlay_error!(
            permission,
            "Нет доступа к {}: {}. Добавьте пользователя в группу 'input'",
            input_dir,
            e
        )),
    }
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("Приложение запущено от имени root");
            warn!("   Для чтения датчиков достаточно группы 'input':");
            warn!("   sudo usermod -a -G input $USER");
        }
        Ok(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }
}

/// Получить рекомендуемые команды для настройки прав доступа
pub fn get_setup_commands() -> Vec<String> {
    vec![
        "# Добавить пользователя в группу input:".to_string(),
        "sudo usermod -a -G input $USER".to_string(),
        "".to_string(),
        "# После выполнения команды перезайдите в систему".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_commands() {
        let commands = get_setup_commands();
        assert!(!commands.is_empty());
        assert!(commands.iter().any(|cmd| cmd.contains("usermod")));
    }
}
