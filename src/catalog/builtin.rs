use super::character::{CharacterCategory, CharacterDefinition, HangerDecoration};
use once_cell::sync::Lazy;

/// Встроенные персонажи, доступные без настройки
pub static BUILTIN_CHARACTERS: Lazy<Vec<CharacterDefinition>> = Lazy::new(|| {
    vec![
        CharacterDefinition::new("cat", "Кот", CharacterCategory::Walking)
            .with_frames(["cat_walk_1", "cat_walk_2", "cat_walk_3", "cat_walk_4"])
            .with_size(72, 48)
            .with_speed(4)
            .with_animation_delay(120)
            .with_at_bottom(true),
        CharacterDefinition::new("dog", "Пёс", CharacterCategory::Walking)
            .with_frames(["dog_run_1", "dog_run_2", "dog_run_3", "dog_run_4", "dog_run_5", "dog_run_6"])
            .with_size(80, 56)
            .with_speed(6)
            .with_animation_delay(90)
            .with_at_bottom(true),
        CharacterDefinition::new("duck", "Утёнок", CharacterCategory::Walking)
            .with_frames(["duck_1", "duck_2"])
            .with_size(48, 48)
            .with_speed(2)
            .with_animation_delay(200)
            .with_at_bottom(true)
            .with_visible_in_landscape(true),
        CharacterDefinition::new("spider", "Паук", CharacterCategory::Hanging)
            .with_frames(["spider"])
            .with_size(56, 56)
            .with_position(150, 20)
            .with_hanger(HangerDecoration {
                image: "web_thread".to_string(),
                scale: 1.0,
                offset_x: 0,
                offset_y: -40,
            }),
        CharacterDefinition::new("bat", "Летучая мышь", CharacterCategory::Hanging)
            .with_frames(["bat_sleep"])
            .with_size(64, 64)
            .with_position(260, 0)
            .with_rotation(180.0)
            .with_hanger(HangerDecoration {
                image: "branch".to_string(),
                scale: 1.5,
                offset_x: -8,
                offset_y: -24,
            }),
        CharacterDefinition::new("sloth", "Ленивец", CharacterCategory::Hanging)
            .with_frames(["sloth"])
            .with_size(96, 96)
            .with_position(40, 0)
            .with_visible_in_landscape(true)
            .with_hanger(HangerDecoration {
                image: "vine".to_string(),
                scale: 1.0,
                offset_x: 12,
                offset_y: -32,
            }),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_ids_are_unique_and_displayable() {
        let ids: HashSet<&str> = BUILTIN_CHARACTERS.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), BUILTIN_CHARACTERS.len());
        assert!(BUILTIN_CHARACTERS.iter().all(|c| c.is_displayable()));
    }

    #[test]
    fn test_both_categories_present() {
        assert!(BUILTIN_CHARACTERS.iter().any(|c| c.id == "spider" && c.is_hanging()));
        assert!(BUILTIN_CHARACTERS.iter().any(|c| c.id == "cat" && !c.is_hanging()));
    }
}
