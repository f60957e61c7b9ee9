use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Категория персонажа
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterCategory {
    /// Анимированный персонаж, гуляющий по краю экрана
    #[default]
    Walking,
    /// Статичный персонаж на верёвке, качается по данным датчиков
    Hanging,
}

/// Откуда берётся картинка персонажа
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSource {
    Frame(String),
    File(PathBuf),
    None,
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Frame(name) => write!(f, "frame:{}", name),
            ImageSource::File(path) => write!(f, "file:{}", path.display()),
            ImageSource::None => write!(f, "none"),
        }
    }
}

/// Декорация точки подвеса (верёвка, цепочка, крючок)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HangerDecoration {
    pub image: String,
    #[serde(default = "default_hanger_scale")]
    pub scale: f32,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
}

fn default_hanger_scale() -> f32 {
    1.0
}

/// Описание персонажа. Не меняется на месте: обновление = новое значение.
///
/// Размеры и позиции заданы в dp, скорость в пикселях за тик,
/// задержка между кадрами в миллисекундах (0 и меньше отключает смену кадров).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: CharacterCategory,
    #[serde(default)]
    pub frames: Vec<String>,
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    #[serde(default)]
    pub x_position: i32,
    #[serde(default)]
    pub y_position: i32,
    #[serde(default = "default_speed")]
    pub speed: i32,
    #[serde(default = "default_animation_delay")]
    pub animation_delay_ms: i64,
    #[serde(default)]
    pub at_bottom: bool,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub visible_in_landscape: bool,
    #[serde(default)]
    pub custom_image_path: Option<PathBuf>,
    #[serde(default)]
    pub hanger: Option<HangerDecoration>,
}

fn default_size() -> u32 {
    64
}

fn default_speed() -> i32 {
    4
}

fn default_animation_delay() -> i64 {
    120
}

impl CharacterDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: CharacterCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            frames: Vec::new(),
            width: default_size(),
            height: default_size(),
            x_position: 0,
            y_position: 0,
            speed: default_speed(),
            animation_delay_ms: default_animation_delay(),
            at_bottom: false,
            rotation: 0.0,
            visible_in_landscape: false,
            custom_image_path: None,
            hanger: None,
        }
    }

    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames = frames.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x_position = x;
        self.y_position = y;
        self
    }

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_animation_delay(mut self, delay_ms: i64) -> Self {
        self.animation_delay_ms = delay_ms;
        self
    }

    pub fn with_at_bottom(mut self, at_bottom: bool) -> Self {
        self.at_bottom = at_bottom;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    #[cfg(test)]
    pub fn with_category(mut self, category: CharacterCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_visible_in_landscape(mut self, visible: bool) -> Self {
        self.visible_in_landscape = visible;
        self
    }

    #[cfg(test)]
    pub fn with_custom_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_image_path = Some(path.into());
        self
    }

    pub fn with_hanger(mut self, hanger: HangerDecoration) -> Self {
        self.hanger = Some(hanger);
        self
    }

    pub fn is_hanging(&self) -> bool {
        self.category == CharacterCategory::Hanging
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Персонажа можно показать, только если есть кадры или своя картинка
    pub fn is_displayable(&self) -> bool {
        !self.frames.is_empty() || self.custom_image_path.is_some()
    }

    /// Статичная картинка: своя картинка в приоритете, иначе первый кадр
    pub fn static_image(&self) -> ImageSource {
        if let Some(path) = &self.custom_image_path {
            return ImageSource::File(path.clone());
        }
        self.frame_image(0)
    }

    pub fn frame_image(&self, index: usize) -> ImageSource {
        match self.frames.get(index) {
            Some(frame) => ImageSource::Frame(frame.clone()),
            None => match &self.custom_image_path {
                Some(path) => ImageSource::File(path.clone()),
                None => ImageSource::None,
            },
        }
    }
}

impl fmt::Display for CharacterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({}, {:?})", self.name, self.id, self.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_is_copy_on_write() {
        let original = CharacterDefinition::new("cat", "Cat", CharacterCategory::Walking)
            .with_frames(["cat_1", "cat_2"]);
        let updated = original.clone().with_speed(9).with_size(80, 40);

        assert_eq!(original.speed, 4);
        assert_eq!(updated.speed, 9);
        assert_eq!((updated.width, updated.height), (80, 40));
        assert_eq!(updated.frames, original.frames);
    }

    #[test]
    fn test_static_image_prefers_custom_path() {
        let framed = CharacterDefinition::new("bat", "Bat", CharacterCategory::Hanging)
            .with_frames(["bat_1"]);
        assert_eq!(framed.static_image(), ImageSource::Frame("bat_1".to_string()));

        let custom = framed.clone().with_custom_image("/tmp/bat.png");
        assert_eq!(custom.static_image(), ImageSource::File(PathBuf::from("/tmp/bat.png")));

        let empty = CharacterDefinition::new("x", "X", CharacterCategory::Hanging);
        assert_eq!(empty.static_image(), ImageSource::None);
        assert!(!empty.is_displayable());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        use figment::providers::{Format, Toml};

        let def: CharacterDefinition = figment::Figment::from(Toml::string(
            r#"
            id = "ghost"
            name = "Ghost"
            category = "hanging"
            custom_image_path = "/data/pets/ghost.png"
            "#,
        ))
        .extract()
        .unwrap();

        assert_eq!(def.category, CharacterCategory::Hanging);
        assert_eq!(def.width, 64);
        assert_eq!(def.animation_delay_ms, 120);
        assert_eq!(def.custom_image_path, Some(PathBuf::from("/data/pets/ghost.png")));
        assert!(def.is_displayable());
    }
}
