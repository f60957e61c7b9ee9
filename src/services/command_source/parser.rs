use crate::catalog::{CharacterCatalog, CharacterOverride, CharacterRepository};
use crate::error::Result;
use crate::events::ServiceCommand;
use crate::overlay_error;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Разбор текстовых команд в команды сервиса.
///
/// `set` и `reset` сразу пишут в хранилище настроек и отдают уже готовое описание.
pub struct CommandParser {
    catalog: Arc<CharacterCatalog>,
}

impl CommandParser {
    pub fn new(catalog: Arc<CharacterCatalog>) -> Self {
        Self { catalog }
    }

    /// `Ok(None)` для пустых строк и команд, обработанных на месте (`list`)
    pub fn parse(&self, line: &str) -> Result<Option<ServiceCommand>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match verb {
            "start" => {
                let id = single_arg(verb, &args)?;
                let definition = self
                    .catalog
                    .get_character_by_id(id)
                    .ok_or_else(|| overlay_error!(unknown_character, "{}", id))?;
                ServiceCommand::Start(definition)
            }
            "stop" => ServiceCommand::Stop(single_arg(verb, &args)?.to_string()),
            "stop-all" => ServiceCommand::StopAll,
            "set" => self.parse_set(&args)?,
            "reset" => {
                let id = single_arg(verb, &args)?;
                let definition = self.catalog.clear_override(id)?;
                ServiceCommand::Update {
                    id: id.to_string(),
                    definition,
                }
            }
            "motion" => ServiceCommand::SetMotionSensing(parse_switch(single_arg(verb, &args)?)?),
            "landscape-mode" => ServiceCommand::SetEnableInLandscape(parse_switch(single_arg(verb, &args)?)?),
            "orientation" => match single_arg(verb, &args)? {
                "landscape" => ServiceCommand::Orientation { landscape: true },
                "portrait" => ServiceCommand::Orientation { landscape: false },
                other => return Err(overlay_error!(invalid_command, "неизвестная ориентация '{}'", other)),
            },
            "active" => ServiceCommand::ReportActive,
            "quit" | "exit" => ServiceCommand::Shutdown,
            "list" => {
                for character in self.catalog.all_characters() {
                    info!("  {} {}x{} dp", character, character.width, character.height);
                }
                return Ok(None);
            }
            other => return Err(overlay_error!(invalid_command, "неизвестная команда '{}'", other)),
        };

        Ok(Some(command))
    }

    fn parse_set(&self, args: &[&str]) -> Result<ServiceCommand> {
        let Some((id, assignments)) = args.split_first() else {
            return Err(overlay_error!(invalid_command, "set: не указан персонаж"));
        };
        if assignments.is_empty() {
            return Err(overlay_error!(invalid_command, "set {}: нет параметров", id));
        }

        // Сначала разбираем всё, чтобы ошибка не оставила полузаписанные настройки
        let mut changes = CharacterOverride::default();
        for assignment in assignments {
            let (key, value) = assignment
                .split_once('=')
                .ok_or_else(|| overlay_error!(invalid_command, "ожидалось key=value, получено '{}'", assignment))?;
            apply_assignment(&mut changes, key, value)?;
        }

        let definition = self.catalog.update_override(id, |stored| merge(stored, &changes))?;
        Ok(ServiceCommand::Update {
            id: id.to_string(),
            definition,
        })
    }
}

fn single_arg<'a>(verb: &str, args: &[&'a str]) -> Result<&'a str> {
    match args {
        [arg] => Ok(*arg),
        _ => Err(overlay_error!(invalid_command, "{}: ожидался один аргумент", verb)),
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(overlay_error!(invalid_command, "ожидалось on|off, получено '{}'", other)),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| overlay_error!(invalid_command, "{}: некорректное значение '{}'", key, value))
}

fn apply_assignment(changes: &mut CharacterOverride, key: &str, value: &str) -> Result<()> {
    match key {
        "speed" => changes.speed = Some(parse_value(key, value)?),
        "width" => changes.width = Some(parse_value(key, value)?),
        "height" => changes.height = Some(parse_value(key, value)?),
        "size" => {
            let size = parse_value(key, value)?;
            changes.width = Some(size);
            changes.height = Some(size);
        }
        "x" => changes.x_position = Some(parse_value(key, value)?),
        "y" => changes.y_position = Some(parse_value(key, value)?),
        "delay" => changes.animation_delay_ms = Some(parse_value(key, value)?),
        "bottom" => changes.at_bottom = Some(parse_switch(value)?),
        "rotation" => changes.rotation = Some(parse_value(key, value)?),
        "landscape" => changes.visible_in_landscape = Some(parse_switch(value)?),
        "hanging" => changes.hanging = Some(parse_switch(value)?),
        other => return Err(overlay_error!(invalid_command, "неизвестный параметр '{}'", other)),
    }
    Ok(())
}

fn merge(stored: &mut CharacterOverride, changes: &CharacterOverride) {
    macro_rules! take {
        ($($field:ident),*) => {
            $(if changes.$field.is_some() {
                stored.$field = changes.$field;
            })*
        };
    }
    take!(
        speed,
        width,
        height,
        x_position,
        y_position,
        animation_delay_ms,
        at_bottom,
        rotation,
        visible_in_landscape,
        hanging
    );
}
