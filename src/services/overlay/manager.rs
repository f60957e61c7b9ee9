use crate::catalog::CharacterDefinition;
use crate::config::Config;
use crate::debug_if_enabled;
use crate::events::MotionSample;
use crate::services::motion_sensor::MotionSensorSource;
use crate::services::window_system::WindowSystem;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::entry::{OverlayContext, OverlayEntry};
use super::scheduler::TickScheduler;
use super::screen::ScreenMetrics;

/// Глобальные переключатели менеджера
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerSettings {
    pub motion_sensing_enabled: bool,
    pub enable_in_landscape: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            motion_sensing_enabled: true,
            enable_in_landscape: false,
        }
    }
}

impl ManagerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            motion_sensing_enabled: config.motion.enabled,
            enable_in_landscape: config.overlay.enable_in_landscape,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct VisibilityPolicy {
    landscape: bool,
    enable_in_landscape: bool,
}

impl VisibilityPolicy {
    fn allows(&self, definition: &CharacterDefinition) -> bool {
        !self.landscape || self.enable_in_landscape || definition.visible_in_landscape
    }
}

/// Реестр активных оверлеев: не больше одной записи на id персонажа.
///
/// Все методы вызываются из одного цикла сервиса, поэтому внутренних блокировок нет.
pub struct OverlayManager {
    windows: Option<Box<dyn WindowSystem>>,
    sensor: MotionSensorSource,
    screen: ScreenMetrics,
    landscape: bool,
    settings: ManagerSettings,
    entries: HashMap<String, OverlayEntry>,
    scheduler: TickScheduler,
}

impl OverlayManager {
    pub fn new(windows: Box<dyn WindowSystem>, sensor: MotionSensorSource, settings: ManagerSettings) -> Self {
        info!(
            "Инициализация OverlayManager (движение: {}, в альбомной: {})",
            settings.motion_sensing_enabled, settings.enable_in_landscape
        );
        Self {
            windows: Some(windows),
            sensor,
            screen: ScreenMetrics::default(),
            landscape: false,
            settings,
            entries: HashMap::new(),
            scheduler: TickScheduler::new(),
        }
    }

    /// Запомнить экран и подключить датчики к очереди образцов движения.
    ///
    /// Образцы, не влезшие в очередь, отбрасываются: важен только последний.
    pub fn initialize(&mut self, screen: ScreenMetrics, landscape: bool, motion_sink: mpsc::Sender<MotionSample>) {
        self.landscape = landscape;
        self.screen = screen.oriented(landscape);

        self.sensor.set_motion_callback(Box::new(move |sample| {
            if let Err(mpsc::error::TrySendError::Full(_)) = motion_sink.try_send(sample) {
                crate::trace_if_enabled!("Очередь движения переполнена, образец отброшен");
            }
        }));

        info!(
            "Экран {}x{} (плотность {}, панель {} px), альбомная: {}",
            self.screen.width_px,
            self.screen.height_px,
            self.screen.density,
            self.screen.system_bar.height(),
            landscape
        );
    }

    fn policy(&self) -> VisibilityPolicy {
        VisibilityPolicy {
            landscape: self.landscape,
            enable_in_landscape: self.settings.enable_in_landscape,
        }
    }

    fn parts(&mut self, now: Instant) -> Option<(&mut HashMap<String, OverlayEntry>, OverlayContext<'_>)> {
        let windows = self.windows.as_deref_mut()?;
        Some((
            &mut self.entries,
            OverlayContext {
                windows,
                screen: &self.screen,
                scheduler: &mut self.scheduler,
                now,
            },
        ))
    }

    /// Показать персонажа. Для уже запущенного id это обновление настроек.
    pub fn add_character(&mut self, definition: CharacterDefinition) -> bool {
        if self.entries.contains_key(&definition.id) {
            debug!("{} уже запущен, применяем новые настройки", definition.id);
            self.update_character_settings(definition);
            return true;
        }

        let should_show = self.policy().allows(&definition);
        let Some((entries, mut ctx)) = self.parts(Instant::now()) else {
            warn!("Оконная система уже освобождена, {} не запущен", definition.id);
            return false;
        };

        let (layout, walk) = OverlayEntry::initial_layout(&definition, ctx.screen);
        let handle = match ctx.windows.try_add_window(&definition.id, &layout) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Не удалось создать окно для {}: {}", definition, e);
                return false;
            }
        };

        info!("Персонаж {} запущен в {}", definition, handle);
        let id = definition.id.clone();
        let mut entry = OverlayEntry::new(definition, handle, layout, walk);
        entry.refresh_visibility(should_show, &mut ctx);
        entries.insert(id, entry);

        self.update_motion_subscription();
        true
    }

    pub fn remove_character(&mut self, id: &str) {
        let Some(mut entry) = self.entries.remove(id) else {
            debug!("{} не запущен, удалять нечего", id);
            return;
        };

        if let Some((_, mut ctx)) = self.parts(Instant::now()) {
            entry.detach(&mut ctx);
        }
        info!("Персонаж {} остановлен", id);

        self.update_motion_subscription();
    }

    /// Применить новое описание к запущенному персонажу. Незапущенный id игнорируется.
    pub fn update_character_settings(&mut self, definition: CharacterDefinition) {
        let should_show = self.policy().allows(&definition);
        let Some((entries, mut ctx)) = self.parts(Instant::now()) else {
            return;
        };
        let Some(entry) = entries.get_mut(&definition.id) else {
            debug!("{} не запущен, обновление пропущено", definition.id);
            return;
        };

        debug!("Обновление настроек {}", definition);
        entry.apply_definition(definition, should_show, &mut ctx);

        self.update_motion_subscription();
    }

    pub fn remove_all_characters(&mut self) {
        if self.entries.is_empty() {
            self.sensor.stop_listening();
            return;
        }

        let mut removed: Vec<OverlayEntry> = self.entries.drain().map(|(_, entry)| entry).collect();
        if let Some((_, mut ctx)) = self.parts(Instant::now()) {
            for entry in removed.iter_mut() {
                entry.detach(&mut ctx);
            }
        }
        self.scheduler.clear();
        self.sensor.stop_listening();

        info!("Остановлены все персонажи ({})", removed.len());
    }

    pub fn active_character_ids(&self) -> HashSet<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn is_character_active(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn entry(&self, id: &str) -> Option<&OverlayEntry> {
        self.entries.get(id)
    }

    pub fn is_motion_listening(&self) -> bool {
        self.sensor.is_listening()
    }

    pub fn set_motion_sensing_enabled(&mut self, enabled: bool) {
        if self.settings.motion_sensing_enabled != enabled {
            info!("Датчики движения: {}", if enabled { "включены" } else { "выключены" });
        }
        self.settings.motion_sensing_enabled = enabled;
        self.update_motion_subscription();
    }

    pub fn set_enable_in_landscape(&mut self, enabled: bool) {
        self.settings.enable_in_landscape = enabled;
        self.refresh_all_visibility();
    }

    /// Поворот экрана: поменять оси и пересчитать видимость
    pub fn update_orientation(&mut self, landscape: bool) {
        if self.landscape != landscape {
            info!("Ориентация: {}", if landscape { "альбомная" } else { "портретная" });
        }
        self.landscape = landscape;
        self.screen = self.screen.oriented(landscape);

        if let Some((entries, mut ctx)) = self.parts(Instant::now()) {
            for entry in entries.values_mut() {
                entry.fit_to_screen(&mut ctx);
            }
        }
        self.refresh_all_visibility();
    }

    fn refresh_all_visibility(&mut self) {
        let policy = self.policy();
        if let Some((entries, mut ctx)) = self.parts(Instant::now()) {
            for entry in entries.values_mut() {
                let should_show = policy.allows(entry.definition());
                entry.refresh_visibility(should_show, &mut ctx);
            }
        }
        self.update_motion_subscription();
    }

    /// Раздать образец движения всем подвешенным персонажам
    pub fn apply_motion(&mut self, sample: MotionSample) {
        if !self.settings.motion_sensing_enabled {
            return;
        }
        if let Some((entries, mut ctx)) = self.parts(Instant::now()) {
            for entry in entries.values_mut().filter(|entry| entry.is_hanging()) {
                entry.apply_motion(sample, &mut ctx);
            }
        }
    }

    pub fn next_tick_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    #[cfg(test)]
    pub fn scheduled_tick(&self, id: &str) -> Option<Instant> {
        self.scheduler.deadline(id)
    }

    /// Выполнить все тики прогулки со сроком не позже `now` и запланировать следующие
    pub fn run_due_ticks(&mut self, now: Instant) -> usize {
        let Some((entries, mut ctx)) = self.parts(now) else {
            return 0;
        };

        let due = ctx.scheduler.pop_due(now);
        let mut ticked = 0;
        for id in due {
            let Some(entry) = entries.get_mut(&id) else {
                continue;
            };
            if !entry.is_running() || entry.is_hanging() {
                continue;
            }

            entry.walk_tick(&mut ctx);
            ctx.scheduler.schedule(&id, now + entry.tick_interval());
            ticked += 1;
        }

        if ticked > 0 {
            debug_if_enabled!("Выполнено тиков прогулки: {}, в очереди: {}", ticked, ctx.scheduler.len());
        }
        ticked
    }

    /// Подписка на датчики нужна, пока есть хотя бы один качающийся персонаж
    fn update_motion_subscription(&mut self) {
        let needed = self.settings.motion_sensing_enabled
            && self
                .entries
                .values()
                .any(|entry| entry.is_hanging() && entry.is_running());

        if needed {
            self.sensor.start_listening();
        } else if self.sensor.is_listening() {
            self.sensor.stop_listening();
        }
    }

    /// Убрать все окна, освободить датчики и оконную систему. Повторный вызов безопасен.
    pub fn cleanup(&mut self) {
        self.remove_all_characters();
        self.sensor.cleanup();
        if self.windows.take().is_some() {
            info!("OverlayManager освобождён");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CharacterCategory, HangerDecoration};
    use crate::events::RawSensorEvent;
    use crate::services::motion_sensor::ScriptedBackend;
    use crate::services::overlay::entry::MIN_TICK_INTERVAL;
    use crate::services::overlay::screen::SystemBarInset;
    use crate::services::window_system::{Gravity, HeadlessWindowSystem, WindowTable};
    use std::sync::atomic::Ordering;
    use tokio::time::Duration;

    fn screen(system_bar: SystemBarInset) -> ScreenMetrics {
        ScreenMetrics::new(1080, 2340, 1.0, system_bar)
    }

    fn manager_with(sensor: MotionSensorSource, system_bar: SystemBarInset) -> (OverlayManager, WindowTable) {
        let windows = HeadlessWindowSystem::new();
        let table = windows.table();
        let mut manager = OverlayManager::new(Box::new(windows), sensor, ManagerSettings::default());
        let (tx, _rx) = mpsc::channel(8);
        manager.initialize(screen(system_bar), false, tx);
        (manager, table)
    }

    fn manager() -> (OverlayManager, WindowTable) {
        manager_with(MotionSensorSource::new(), SystemBarInset::Measured(66))
    }

    fn walker() -> CharacterDefinition {
        CharacterDefinition::new("walker", "Walker", CharacterCategory::Walking)
            .with_frames(["walker_1", "walker_2", "walker_3"])
            .with_size(100, 100)
            .with_position(0, 50)
            .with_speed(10)
            .with_animation_delay(120)
    }

    fn hanger() -> CharacterDefinition {
        CharacterDefinition::new("hanger", "Hanger", CharacterCategory::Hanging)
            .with_frames(["hanger_1"])
            .with_size(80, 80)
            .with_position(150, 20)
            .with_hanger(HangerDecoration {
                image: "rope".to_string(),
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
            })
    }

    /// Прогнать один тик персонажа по его текущему сроку
    fn tick(manager: &mut OverlayManager, id: &str) -> Instant {
        let deadline = manager.scheduled_tick(id).unwrap();
        assert_eq!(manager.run_due_ticks(deadline), 1);
        deadline
    }

    #[test]
    fn test_frames_cycle_back_to_start() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(walker()));

        for _ in 0..3 {
            tick(&mut manager, "walker");
        }
        assert_eq!(manager.entry("walker").unwrap().frame_cursor(), 0);
        assert_eq!(
            table.layout_by_tag("walker").unwrap().image,
            crate::catalog::ImageSource::Frame("walker_1".to_string())
        );

        tick(&mut manager, "walker");
        assert_eq!(manager.entry("walker").unwrap().frame_cursor(), 1);
    }

    #[test]
    fn test_no_frames_or_disabled_delay_keeps_image() {
        let (mut manager, table) = manager();
        let custom = CharacterDefinition::new("custom", "Custom", CharacterCategory::Walking)
            .with_custom_image("/tmp/custom.png")
            .with_size(50, 50)
            .with_animation_delay(0);
        assert!(manager.add_character(custom));

        let before = table.layout_by_tag("custom").unwrap().image;
        tick(&mut manager, "custom");
        tick(&mut manager, "custom");
        assert_eq!(table.layout_by_tag("custom").unwrap().image, before);
        assert_eq!(manager.entry("custom").unwrap().frame_cursor(), 0);

        let first = tick(&mut manager, "custom");
        let next = manager.scheduled_tick("custom").unwrap();
        assert_eq!(next - first, MIN_TICK_INTERVAL);
    }

    #[test]
    fn test_walker_bounces_at_right_edge() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(walker().with_position(975, 50)));

        tick(&mut manager, "walker");
        let walk = manager.entry("walker").unwrap().walk_state();
        assert_eq!(walk.x, 980);
        assert!(!walk.moving_right);
        assert!(walk.mirrored);
        assert_eq!(table.layout_by_tag("walker").unwrap().x, 980);

        tick(&mut manager, "walker");
        let walk = manager.entry("walker").unwrap().walk_state();
        assert_eq!(walk.x, 970);
        assert!(!walk.moving_right);
        assert!(walk.mirrored);
    }

    #[test]
    fn test_walker_bounces_at_left_edge() {
        let (mut manager, _table) = manager();
        assert!(manager.add_character(walker().with_position(975, 50).with_speed(600)));

        tick(&mut manager, "walker");
        tick(&mut manager, "walker");
        let walk = manager.entry("walker").unwrap().walk_state();
        assert_eq!(walk.x, 380);

        tick(&mut manager, "walker");
        let walk = manager.entry("walker").unwrap().walk_state();
        assert_eq!(walk.x, 0);
        assert!(walk.moving_right);
        assert!(!walk.mirrored);
    }

    #[test]
    fn test_walker_wider_than_screen_stays_put() {
        let (mut manager, _table) = manager();
        assert!(manager.add_character(walker().with_size(2000, 100).with_position(30, 0)));

        tick(&mut manager, "walker");
        let walk = manager.entry("walker").unwrap().walk_state();
        assert_eq!(walk.x, 0);
        assert!(walk.moving_right);
    }

    #[test]
    fn test_walk_from_left_edge_flips_once_at_bound() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(walker()));

        let bound = 1080 - 100;
        let mut flips = 0;
        let mut moving_right = true;
        let mut flip_x = None;

        for _ in 0..bound / 10 {
            tick(&mut manager, "walker");
            let walk = manager.entry("walker").unwrap().walk_state();
            assert!((0..=bound).contains(&walk.x));
            if walk.moving_right != moving_right {
                flips += 1;
                flip_x = Some(walk.x);
                moving_right = walk.moving_right;
            }
        }

        assert_eq!(flips, 1);
        assert_eq!(flip_x, Some(bound));
        assert_eq!(table.layout_by_tag("walker").unwrap().x, bound);

        tick(&mut manager, "walker");
        assert_eq!(manager.entry("walker").unwrap().walk_state().x, bound - 10);
    }

    #[test]
    fn test_huge_speed_clamps_to_edges() {
        let (mut manager, _table) = manager();
        assert!(manager.add_character(walker().with_position(10, 50).with_speed(i32::MAX)));

        tick(&mut manager, "walker");
        let walk = manager.entry("walker").unwrap().walk_state();
        assert_eq!(walk.x, 980);
        assert!(!walk.moving_right);
        assert!(walk.mirrored);

        tick(&mut manager, "walker");
        let walk = manager.entry("walker").unwrap().walk_state();
        assert_eq!(walk.x, 0);
        assert!(walk.moving_right);
        assert!(!walk.mirrored);
    }

    #[test]
    fn test_extreme_hanging_position_does_not_overflow() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(hanger().with_position(i32::MAX, i32::MIN)));
        assert_eq!(table.layout_by_tag("hanger").unwrap().y, i32::MIN);

        for _ in 0..20 {
            manager.apply_motion(MotionSample::new(40.0, 0.0));
        }
        let layout = table.layout_by_tag("hanger").unwrap();
        assert_eq!((layout.x, layout.y), (i32::MAX, i32::MIN));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(walker()));

        manager.remove_character("walker");
        manager.remove_character("walker");

        assert_eq!(table.remove_attempts(), 1);
        assert_eq!(table.window_count(), 0);
        assert!(manager.active_character_ids().is_empty());
        assert_eq!(manager.next_tick_deadline(), None);
    }

    #[test]
    fn test_add_twice_updates_existing_window() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(walker()));
        assert!(manager.add_character(walker().with_size(120, 120)));

        assert_eq!(table.window_count(), 1);
        assert_eq!(table.add_attempts(), 1);
        assert_eq!(table.layout_by_tag("walker").unwrap().width, 120);
        assert_eq!(manager.active_character_ids(), HashSet::from(["walker".to_string()]));
    }

    #[test]
    fn test_failed_add_leaves_no_entry() {
        let (mut manager, table) = manager();
        table.revoke_permission();

        assert!(!manager.add_character(walker()));
        assert!(!manager.is_character_active("walker"));
        assert_eq!(manager.next_tick_deadline(), None);
    }

    #[test]
    fn test_hanging_origin_with_measured_inset() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(hanger()));

        let layout = table.layout_by_tag("hanger").unwrap();
        assert_eq!((layout.x, layout.y), (150, 20 - 66 / 3));
        assert_eq!(layout.gravity, Gravity::TopStart);
        assert!(layout.visible);
        assert!(layout.hanger.is_some());

        let entry = manager.entry("hanger").unwrap();
        assert_eq!((entry.pendulum().origin_x, entry.pendulum().origin_y), (150, -2));
        assert!(entry.is_running());
        assert_eq!(manager.scheduled_tick("hanger"), None);
    }

    #[test]
    fn test_hanging_origin_with_legacy_inset() {
        let (mut manager, table) = manager_with(MotionSensorSource::new(), SystemBarInset::Legacy(24));
        assert!(manager.add_character(hanger()));

        let layout = table.layout_by_tag("hanger").unwrap();
        assert_eq!((layout.x, layout.y), (150, 20));
    }

    #[test]
    fn test_motion_swings_hanging_only() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(hanger()));
        assert!(manager.add_character(walker()));
        let walker_before = table.layout_by_tag("walker").unwrap();

        manager.apply_motion(MotionSample::new(40.0, 0.0));

        let layout = table.layout_by_tag("hanger").unwrap();
        assert!(layout.x > 150);
        assert!(layout.rotation > 0.0);
        assert_eq!(table.layout_by_tag("walker").unwrap(), walker_before);

        manager.set_motion_sensing_enabled(false);
        manager.apply_motion(MotionSample::new(40.0, 0.0));
        assert_eq!(table.layout_by_tag("hanger").unwrap(), layout);
    }

    #[test]
    fn test_delay_change_applies_on_next_tick() {
        let (mut manager, _table) = manager();
        assert!(manager.add_character(walker()));

        let d0 = tick(&mut manager, "walker");
        assert_eq!(manager.scheduled_tick("walker"), Some(d0 + Duration::from_millis(120)));

        manager.update_character_settings(walker().with_animation_delay(50));
        assert_eq!(manager.scheduled_tick("walker"), Some(d0 + Duration::from_millis(120)));

        let d1 = tick(&mut manager, "walker");
        assert_eq!(d1, d0 + Duration::from_millis(120));
        assert_eq!(manager.scheduled_tick("walker"), Some(d1 + Duration::from_millis(50)));
    }

    #[test]
    fn test_landscape_hides_and_portrait_restores() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(hanger()));
        assert!(manager.add_character(walker()));

        manager.update_orientation(true);
        assert!(!table.layout_by_tag("hanger").unwrap().visible);
        assert!(!table.layout_by_tag("walker").unwrap().visible);
        assert!(!manager.entry("hanger").unwrap().is_running());
        assert_eq!(manager.next_tick_deadline(), None);
        assert_eq!(manager.active_character_ids().len(), 2);

        manager.update_orientation(false);
        assert!(table.layout_by_tag("hanger").unwrap().visible);
        assert!(table.layout_by_tag("walker").unwrap().visible);
        assert!(manager.entry("hanger").unwrap().is_running());
        assert!(manager.scheduled_tick("walker").is_some());
    }

    #[test]
    fn test_landscape_allowed_globally_or_per_character() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(walker().with_visible_in_landscape(true)));
        assert!(manager.add_character(hanger()));

        manager.update_orientation(true);
        assert!(table.layout_by_tag("walker").unwrap().visible);
        assert!(!table.layout_by_tag("hanger").unwrap().visible);

        manager.set_enable_in_landscape(true);
        assert!(table.layout_by_tag("hanger").unwrap().visible);
    }

    #[test]
    fn test_orientation_pulls_walker_inside_new_bounds() {
        let (mut manager, table) = manager();
        manager.update_orientation(true);
        manager.set_enable_in_landscape(true);
        assert!(manager.add_character(walker().with_position(2000, 0)));
        assert_eq!(manager.entry("walker").unwrap().walk_state().x, 2000);

        manager.update_orientation(false);
        assert_eq!(manager.entry("walker").unwrap().walk_state().x, 980);
        assert_eq!(table.layout_by_tag("walker").unwrap().x, 980);
    }

    #[test]
    fn test_walking_to_hanging_transition() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(walker().with_rotation(12.0).with_position(300, 40)));
        tick(&mut manager, "walker");

        manager.update_character_settings(
            walker()
                .with_rotation(12.0)
                .with_position(300, 40)
                .with_category(CharacterCategory::Hanging),
        );

        assert_eq!(manager.scheduled_tick("walker"), None);
        let layout = table.layout_by_tag("walker").unwrap();
        assert_eq!(layout.x, 300);
        assert_eq!(layout.rotation, 12.0);
        assert!(!layout.mirrored);
        assert_eq!(
            layout.image,
            crate::catalog::ImageSource::Frame("walker_1".to_string())
        );
        assert!(manager.entry("walker").unwrap().is_running());
    }

    #[test]
    fn test_hanging_to_walking_transition() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(hanger()));
        manager.apply_motion(MotionSample::new(30.0, 0.0));

        manager.update_character_settings(hanger().with_category(CharacterCategory::Walking));

        let entry = manager.entry("hanger").unwrap();
        assert!(entry.is_running());
        assert_eq!(entry.walk_state().x, 150);
        assert_eq!(entry.pendulum().sway_x, 0.0);
        assert!(manager.scheduled_tick("hanger").is_some());

        let layout = table.layout_by_tag("hanger").unwrap();
        assert_eq!(layout.rotation, 0.0);
        assert!(layout.hanger.is_none());
    }

    #[test]
    fn test_hanging_anchor_flip_resets_pendulum() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(hanger()));
        manager.apply_motion(MotionSample::new(40.0, 0.0));
        manager.apply_motion(MotionSample::new(40.0, 0.0));

        manager.update_character_settings(hanger().with_position(200, 20));
        let pendulum = *manager.entry("hanger").unwrap().pendulum();
        assert_eq!(pendulum.origin_x, 200);
        assert_ne!(pendulum.velocity_x, 0.0);

        manager.update_character_settings(hanger().with_position(200, 20).with_at_bottom(true));
        let pendulum = *manager.entry("hanger").unwrap().pendulum();
        assert_eq!((pendulum.origin_x, pendulum.origin_y), (200, 20));
        assert_eq!(pendulum.velocity_x, 0.0);
        assert_eq!(pendulum.sway_x, 0.0);

        let layout = table.layout_by_tag("hanger").unwrap();
        assert_eq!(layout.gravity, Gravity::BottomStart);
        assert_eq!((layout.x, layout.y), (200, 20));
    }

    #[test]
    fn test_update_unknown_character_is_ignored() {
        let (mut manager, table) = manager();
        manager.update_character_settings(walker());
        assert_eq!(table.window_count(), 0);
        assert!(!manager.is_character_active("walker"));
    }

    #[test]
    fn test_cleanup_releases_everything() {
        let (mut manager, table) = manager();
        assert!(manager.add_character(walker()));
        assert!(manager.add_character(hanger()));

        manager.cleanup();
        manager.cleanup();

        assert_eq!(table.window_count(), 0);
        assert!(manager.active_character_ids().is_empty());
        assert_eq!(manager.next_tick_deadline(), None);
        assert!(!manager.add_character(walker()));
    }

    #[tokio::test]
    async fn test_sensor_follows_hanging_characters() {
        let backend = ScriptedBackend::new();
        let starts = std::sync::Arc::clone(&backend.starts);
        let stops = std::sync::Arc::clone(&backend.stops);
        let sender = std::sync::Arc::clone(&backend.sender);

        let windows = HeadlessWindowSystem::new();
        let mut manager = OverlayManager::new(
            Box::new(windows),
            MotionSensorSource::with_backend(Box::new(backend)),
            ManagerSettings::default(),
        );
        let (tx, mut rx) = mpsc::channel(8);
        manager.initialize(screen(SystemBarInset::Measured(66)), false, tx);

        assert!(manager.add_character(walker()));
        assert!(!manager.is_motion_listening());

        assert!(manager.add_character(hanger()));
        assert!(manager.is_motion_listening());
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        let raw_tx = sender.lock().clone().unwrap();
        raw_tx
            .send(RawSensorEvent::accelerometer(-10.0, 0.0, 0.0))
            .await
            .unwrap();
        let sample = rx.recv().await.unwrap();
        assert!(sample.sway_x > 0.0);

        manager.set_motion_sensing_enabled(false);
        assert!(!manager.is_motion_listening());
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        manager.set_motion_sensing_enabled(true);
        assert_eq!(starts.load(Ordering::SeqCst), 2);

        manager.remove_character("hanger");
        assert!(!manager.is_motion_listening());
        assert_eq!(stops.load(Ordering::SeqCst), 2);

        manager.cleanup();
    }
}
