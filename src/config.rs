use crate::catalog::{CharacterDefinition, CharacterOverride};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
    pub motion: MotionConfig,
    pub overlay: OverlayConfig,
    /// Персонажи, созданные пользователем
    #[serde(default)]
    pub characters: Vec<CharacterDefinition>,
    /// Сохранённые настройки по id персонажа
    #[serde(default)]
    pub overrides: HashMap<String, CharacterOverride>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// pretty | compact
    pub format: String,
    /// Дополнительные директивы EnvFilter, например "overlay_pets::services::overlay=trace"
    #[serde(default)]
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub width_px: u32,
    pub height_px: u32,
    /// Пикселей на dp
    pub density: f32,
    /// Платформа сообщает реальную высоту системной панели
    pub inset_api: bool,
    #[serde(default)]
    pub status_bar_inset_px: Option<i32>,
    /// Ориентация при запуске
    pub landscape: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotionConfig {
    pub enabled: bool,
    pub device_path: String,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlayConfig {
    pub enable_in_landscape: bool,
    #[serde(default)]
    pub autostart: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
                filter: String::new(),
            },
            display: DisplayConfig {
                width_px: 1080,
                height_px: 2340,
                density: 2.75,
                inset_api: true,
                status_bar_inset_px: Some(66),
                landscape: false,
            },
            motion: MotionConfig {
                enabled: true,
                device_path: "auto".to_string(),
                queue_capacity: 64,
            },
            overlay: OverlayConfig {
                enable_in_landscape: false,
                autostart: Vec::new(),
            },
            characters: Vec::new(),
            overrides: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("PETS_").split("__"));

        Self::from_figment(figment)
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.display.width_px == 0 || self.display.height_px == 0 {
            anyhow::bail!(
                "Размер экрана должен быть больше нуля: {}x{}",
                self.display.width_px,
                self.display.height_px
            );
        }

        if !(self.display.density > 0.0) {
            anyhow::bail!("density должна быть больше 0");
        }

        if self.motion.queue_capacity == 0 {
            anyhow::bail!("motion.queue_capacity должно быть больше 0");
        }

        let mut ids = HashSet::new();
        for (i, character) in self.characters.iter().enumerate() {
            if character.id.is_empty() {
                anyhow::bail!("Пустой id у персонажа #{}", i + 1);
            }
            if !ids.insert(character.id.as_str()) {
                anyhow::bail!("Повторяющийся id персонажа: {}", character.id);
            }
            if !character.is_displayable() {
                anyhow::bail!(
                    "У персонажа {} нет ни кадров, ни custom_image_path",
                    character.id
                );
            }
        }

        Ok(())
    }
}
