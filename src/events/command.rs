use crate::catalog::CharacterDefinition;
use std::fmt;

/// Команда хост-сервису оверлеев
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCommand {
    /// Показать персонажа (повторный запуск обновляет настройки)
    Start(CharacterDefinition),
    /// Убрать персонажа
    Stop(String),
    /// Убрать всех персонажей
    StopAll,
    /// Применить новые настройки к запущенному персонажу
    Update {
        id: String,
        definition: CharacterDefinition,
    },
    SetMotionSensing(bool),
    SetEnableInLandscape(bool),
    Orientation { landscape: bool },
    /// Вывести в лог запущенных персонажей
    ReportActive,
    Shutdown,
}

impl fmt::Display for ServiceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceCommand::Start(def) => write!(f, "start {}", def.id),
            ServiceCommand::Stop(id) => write!(f, "stop {}", id),
            ServiceCommand::StopAll => write!(f, "stop-all"),
            ServiceCommand::Update { id, .. } => write!(f, "update {}", id),
            ServiceCommand::SetMotionSensing(enabled) => write!(f, "motion {}", on_off(*enabled)),
            ServiceCommand::SetEnableInLandscape(enabled) => {
                write!(f, "landscape-mode {}", on_off(*enabled))
            }
            ServiceCommand::Orientation { landscape } => write!(
                f,
                "orientation {}",
                if *landscape { "landscape" } else { "portrait" }
            ),
            ServiceCommand::ReportActive => write!(f, "active"),
            ServiceCommand::Shutdown => write!(f, "quit"),
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CharacterCategory;

    #[test]
    fn test_command_display() {
        let def = CharacterDefinition::new("cat", "Cat", CharacterCategory::Walking);
        assert_eq!(ServiceCommand::Start(def).to_string(), "start cat");
        assert_eq!(ServiceCommand::SetMotionSensing(false).to_string(), "motion off");
        assert_eq!(
            ServiceCommand::Orientation { landscape: true }.to_string(),
            "orientation landscape"
        );
    }
}
