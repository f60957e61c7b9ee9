use super::builtin::BUILTIN_CHARACTERS;
use super::character::{CharacterCategory, CharacterDefinition};
use crate::error::{OverlayError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Источник описаний персонажей для хост-сервиса.
///
/// Ядро оверлеев получает уже готовые описания и о хранилище ничего не знает.
pub trait CharacterRepository: Send + Sync {
    /// Описание с учётом сохранённых пользовательских настроек
    fn get_character_by_id(&self, id: &str) -> Option<CharacterDefinition>;
    /// Описание без пользовательских настроек (сброс к значениям по умолчанию)
    fn get_default_character(&self, id: &str) -> Option<CharacterDefinition>;
    /// Все известные персонажи: встроенные и созданные пользователем
    fn all_characters(&self) -> Vec<CharacterDefinition>;
}

/// Сохранённые пользователем переопределения для одного персонажа
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterOverride {
    #[serde(default)]
    pub speed: Option<i32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub x_position: Option<i32>,
    #[serde(default)]
    pub y_position: Option<i32>,
    #[serde(default)]
    pub animation_delay_ms: Option<i64>,
    #[serde(default)]
    pub at_bottom: Option<bool>,
    #[serde(default)]
    pub rotation: Option<f32>,
    #[serde(default)]
    pub visible_in_landscape: Option<bool>,
    #[serde(default)]
    pub hanging: Option<bool>,
}

impl CharacterOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Применить переопределения, получив новое описание
    pub fn apply(&self, base: &CharacterDefinition) -> CharacterDefinition {
        let mut def = base.clone();
        if let Some(speed) = self.speed {
            def.speed = speed;
        }
        if let Some(width) = self.width {
            def.width = width;
        }
        if let Some(height) = self.height {
            def.height = height;
        }
        if let Some(x) = self.x_position {
            def.x_position = x;
        }
        if let Some(y) = self.y_position {
            def.y_position = y;
        }
        if let Some(delay) = self.animation_delay_ms {
            def.animation_delay_ms = delay;
        }
        if let Some(at_bottom) = self.at_bottom {
            def.at_bottom = at_bottom;
        }
        if let Some(rotation) = self.rotation {
            def.rotation = rotation;
        }
        if let Some(visible) = self.visible_in_landscape {
            def.visible_in_landscape = visible;
        }
        if let Some(hanging) = self.hanging {
            def.category = if hanging {
                CharacterCategory::Hanging
            } else {
                CharacterCategory::Walking
            };
        }
        def
    }
}

/// Каталог: встроенные персонажи + персонажи из конфигурации + переопределения
pub struct CharacterCatalog {
    base: Vec<CharacterDefinition>,
    overrides: RwLock<HashMap<String, CharacterOverride>>,
}

impl CharacterCatalog {
    pub fn new(
        custom: Vec<CharacterDefinition>,
        overrides: HashMap<String, CharacterOverride>,
    ) -> Self {
        let mut base: Vec<CharacterDefinition> = BUILTIN_CHARACTERS.clone();

        for character in custom {
            if let Some(existing) = base.iter_mut().find(|c| c.id == character.id) {
                warn!(
                    "Пользовательский персонаж {} заменяет встроенного с тем же id",
                    character.id
                );
                *existing = character;
            } else {
                base.push(character);
            }
        }

        info!(
            "Каталог персонажей: {} всего, {} с сохранёнными настройками",
            base.len(),
            overrides.len()
        );

        Self {
            base,
            overrides: RwLock::new(overrides),
        }
    }

    fn base_character(&self, id: &str) -> Option<&CharacterDefinition> {
        self.base.iter().find(|c| c.id == id)
    }

    /// Изменить сохранённые настройки персонажа
    pub fn update_override<F>(&self, id: &str, update: F) -> Result<CharacterDefinition>
    where
        F: FnOnce(&mut CharacterOverride),
    {
        let base = self
            .base_character(id)
            .ok_or_else(|| OverlayError::UnknownCharacter(id.to_string()))?;

        let mut overrides = self.overrides.write();
        let entry = overrides.entry(id.to_string()).or_default();
        update(entry);
        let resolved = entry.apply(base);
        if entry.is_empty() {
            overrides.remove(id);
        }

        debug!("Настройки персонажа {} обновлены", id);
        Ok(resolved)
    }

    /// Сбросить сохранённые настройки персонажа
    pub fn clear_override(&self, id: &str) -> Result<CharacterDefinition> {
        let default = self
            .get_default_character(id)
            .ok_or_else(|| OverlayError::UnknownCharacter(id.to_string()))?;
        self.overrides.write().remove(id);
        Ok(default)
    }
}

impl CharacterRepository for CharacterCatalog {
    fn get_character_by_id(&self, id: &str) -> Option<CharacterDefinition> {
        let base = self.base_character(id)?;
        Some(match self.overrides.read().get(id) {
            Some(overrides) => overrides.apply(base),
            None => base.clone(),
        })
    }

    fn get_default_character(&self, id: &str) -> Option<CharacterDefinition> {
        self.base_character(id).cloned()
    }

    fn all_characters(&self) -> Vec<CharacterDefinition> {
        let overrides = self.overrides.read();
        self.base
            .iter()
            .map(|c| match overrides.get(&c.id) {
                Some(o) => o.apply(c),
                None => c.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CharacterCatalog {
        let custom = vec![CharacterDefinition::new("ghost", "Ghost", CharacterCategory::Hanging)
            .with_custom_image("/data/ghost.png")];
        let mut overrides = HashMap::new();
        overrides.insert(
            "cat".to_string(),
            CharacterOverride {
                speed: Some(10),
                ..Default::default()
            },
        );
        CharacterCatalog::new(custom, overrides)
    }

    #[test]
    fn test_overrides_applied_on_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.get_character_by_id("cat").unwrap().speed, 10);
        assert_eq!(catalog.get_default_character("cat").unwrap().speed, 4);
    }

    #[test]
    fn test_custom_characters_in_catalog() {
        let catalog = catalog();
        let all = catalog.all_characters();
        assert!(all.iter().any(|c| c.id == "ghost"));
        assert!(all.iter().any(|c| c.id == "spider"));
        assert!(catalog.get_character_by_id("unicorn").is_none());
    }

    #[test]
    fn test_update_and_clear_override() {
        let catalog = catalog();
        let updated = catalog
            .update_override("spider", |o| {
                o.hanging = Some(false);
                o.animation_delay_ms = Some(50);
            })
            .unwrap();
        assert!(!updated.is_hanging());
        assert_eq!(updated.animation_delay_ms, 50);
        assert_eq!(catalog.get_character_by_id("spider").unwrap(), updated);

        let reset = catalog.clear_override("spider").unwrap();
        assert!(reset.is_hanging());
        assert_eq!(catalog.get_character_by_id("spider").unwrap(), reset);
    }

    #[test]
    fn test_update_unknown_character_fails() {
        let catalog = catalog();
        let result = catalog.update_override("unicorn", |o| o.speed = Some(1));
        assert!(matches!(result, Err(OverlayError::UnknownCharacter(_))));
    }
}
