use crate::catalog::{CharacterDefinition, HangerDecoration};
use crate::events::MotionSample;
use crate::services::window_system::{WindowError, WindowHandle, WindowLayout, WindowSystem};
use crate::trace_if_enabled;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use super::pendulum::Pendulum;
use super::scheduler::TickScheduler;
use super::screen::ScreenMetrics;

/// Минимальный интервал тика, если смена кадров отключена
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Всё, что нужно записи для изменения своего окна и расписания
pub(crate) struct OverlayContext<'a> {
    pub windows: &'a mut dyn WindowSystem,
    pub screen: &'a ScreenMetrics,
    pub scheduler: &'a mut TickScheduler,
    pub now: Instant,
}

/// Положение гуляющего персонажа
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkState {
    pub x: i32,
    pub moving_right: bool,
    pub mirrored: bool,
}

impl WalkState {
    fn initial(definition: &CharacterDefinition, bound: i32) -> Self {
        Self {
            x: definition.x_position.clamp(0, bound),
            moving_right: true,
            mirrored: false,
        }
    }
}

/// Одно показанное оверлейное окно и его анимация
#[derive(Debug)]
pub struct OverlayEntry {
    definition: CharacterDefinition,
    handle: WindowHandle,
    layout: WindowLayout,
    frame_cursor: usize,
    walk: WalkState,
    pendulum: Pendulum,
    running: bool,
}

impl OverlayEntry {
    /// Раскладка нового окна до его создания. Окно изначально скрыто.
    pub fn initial_layout(definition: &CharacterDefinition, screen: &ScreenMetrics) -> (WindowLayout, WalkState) {
        let width = screen.scale(definition.width);
        let height = screen.scale(definition.height);
        let walk = WalkState::initial(definition, screen.walk_bound(width));

        let (x, image, rotation) = if definition.is_hanging() {
            (definition.x_position, definition.static_image(), definition.rotation)
        } else {
            (walk.x, definition.frame_image(0), 0.0)
        };

        let layout = WindowLayout {
            x,
            y: screen.vertical_offset(definition.y_position, definition.at_bottom),
            width,
            height,
            gravity: ScreenMetrics::gravity(definition.at_bottom),
            rotation,
            mirrored: false,
            visible: false,
            image,
            hanger: Self::hanger_for(definition),
        };

        (layout, walk)
    }

    pub fn new(definition: CharacterDefinition, handle: WindowHandle, layout: WindowLayout, walk: WalkState) -> Self {
        let pendulum = Pendulum::anchored_at(layout.x, layout.y);
        Self {
            definition,
            handle,
            layout,
            frame_cursor: 0,
            walk,
            pendulum,
            running: false,
        }
    }

    pub fn definition(&self) -> &CharacterDefinition {
        &self.definition
    }

    pub fn layout(&self) -> &WindowLayout {
        &self.layout
    }

    pub fn frame_cursor(&self) -> usize {
        self.frame_cursor
    }

    pub fn walk_state(&self) -> WalkState {
        self.walk
    }

    pub fn pendulum(&self) -> &Pendulum {
        &self.pendulum
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_hanging(&self) -> bool {
        self.definition.is_hanging()
    }

    /// Интервал между тиками прогулки
    pub fn tick_interval(&self) -> Duration {
        if self.definition.animation_delay_ms > 0 {
            Duration::from_millis(self.definition.animation_delay_ms as u64)
        } else {
            MIN_TICK_INTERVAL
        }
    }

    fn hanger_for(definition: &CharacterDefinition) -> Option<HangerDecoration> {
        if definition.is_hanging() {
            definition.hanger.clone()
        } else {
            None
        }
    }

    pub(crate) fn start_animation(&mut self, ctx: &mut OverlayContext<'_>) {
        if self.running {
            return;
        }
        self.running = true;

        if self.is_hanging() {
            // Подвешенный двигается только по событиям движения
            debug!("Подвешенный персонаж {} готов качаться", self.definition.id);
        } else {
            ctx.scheduler.schedule(&self.definition.id, ctx.now);
            debug!("Прогулка {} запущена", self.definition.id);
        }
    }

    pub(crate) fn stop_animation(&mut self, ctx: &mut OverlayContext<'_>) {
        if !self.running {
            return;
        }
        self.running = false;
        ctx.scheduler.cancel(&self.definition.id);
        debug!("Анимация {} остановлена", self.definition.id);
    }

    /// Привести видимость и анимацию к `should_show`. Повторный вызов ничего не меняет.
    pub(crate) fn refresh_visibility(&mut self, should_show: bool, ctx: &mut OverlayContext<'_>) {
        if should_show {
            if !self.layout.visible {
                self.layout.visible = true;
                self.apply_layout(ctx.windows);
            }
            self.start_animation(ctx);
        } else {
            self.stop_animation(ctx);
            if self.layout.visible {
                self.layout.visible = false;
                self.apply_layout(ctx.windows);
            }
        }
    }

    /// Один шаг прогулки: следующий кадр и сдвиг по горизонтали.
    ///
    /// Перепланирование делает вызывающий, используя `tick_interval`.
    pub(crate) fn walk_tick(&mut self, ctx: &mut OverlayContext<'_>) {
        if !self.running || self.is_hanging() {
            return;
        }

        let frames = self.definition.frame_count();
        if self.definition.animation_delay_ms > 0 && frames > 0 {
            self.frame_cursor = (self.frame_cursor + 1) % frames;
            self.layout.image = self.definition.frame_image(self.frame_cursor);
        }

        let bound = ctx.screen.walk_bound(self.layout.width);
        if bound > 0 {
            // Шаг больше границы всё равно упрётся в край
            let step = self.definition.speed.clamp(0, bound);
            let walk = &mut self.walk;
            walk.x = walk.x.min(bound);

            if walk.moving_right {
                walk.x = walk.x.saturating_add(step);
                if walk.x >= bound {
                    walk.x = bound;
                    walk.moving_right = false;
                    walk.mirrored = !walk.mirrored;
                }
            } else {
                walk.x = walk.x.saturating_sub(step);
                if walk.x <= 0 {
                    walk.x = 0;
                    walk.moving_right = true;
                    walk.mirrored = !walk.mirrored;
                }
            }

            self.layout.x = walk.x;
            self.layout.mirrored = walk.mirrored;
        }

        trace_if_enabled!(
            "{}: кадр {}, x={}, вправо={}",
            self.definition.id,
            self.frame_cursor,
            self.walk.x,
            self.walk.moving_right
        );
        self.apply_layout(ctx.windows);
    }

    /// Один шаг маятника по свежему образцу движения
    pub(crate) fn apply_motion(&mut self, sample: MotionSample, ctx: &mut OverlayContext<'_>) {
        if !self.running || !self.is_hanging() {
            return;
        }

        self.pendulum.step(sample.sway_x);
        let (x, y) = self.pendulum.position();
        self.layout.x = x;
        self.layout.y = y;
        self.layout.rotation = self.definition.rotation + self.pendulum.sway_rotation;
        self.apply_layout(ctx.windows);
    }

    /// Применить новое описание к живому окну без пересоздания
    pub(crate) fn apply_definition(
        &mut self,
        definition: CharacterDefinition,
        should_show: bool,
        ctx: &mut OverlayContext<'_>,
    ) {
        let previous = std::mem::replace(&mut self.definition, definition);
        let was_hanging = previous.is_hanging();
        let is_hanging = self.definition.is_hanging();
        let anchor_changed = previous.at_bottom != self.definition.at_bottom;

        self.layout.width = ctx.screen.scale(self.definition.width);
        self.layout.height = ctx.screen.scale(self.definition.height);
        self.layout.gravity = ScreenMetrics::gravity(self.definition.at_bottom);
        self.layout.y = ctx
            .screen
            .vertical_offset(self.definition.y_position, self.definition.at_bottom);
        self.layout.hanger = Self::hanger_for(&self.definition);

        if self.frame_cursor >= self.definition.frame_count() {
            self.frame_cursor = 0;
        }

        match (was_hanging, is_hanging) {
            (false, true) => {
                self.layout.rotation = 0.0;
                self.stop_animation(ctx);

                self.layout.image = self.definition.static_image();
                self.layout.mirrored = false;
                self.layout.x = self.definition.x_position;
                self.layout.rotation = self.definition.rotation;
                self.pendulum = Pendulum::anchored_at(self.layout.x, self.layout.y);
                debug!("{}: прогулка -> подвес", self.definition.id);
            }
            (true, false) => {
                self.stop_animation(ctx);

                self.walk = WalkState::initial(&self.definition, ctx.screen.walk_bound(self.layout.width));
                self.frame_cursor = 0;
                self.layout.image = self.definition.frame_image(0);
                self.layout.rotation = 0.0;
                self.layout.mirrored = false;
                self.layout.x = self.walk.x;
                self.pendulum.reset_motion();
                debug!("{}: подвес -> прогулка", self.definition.id);
            }
            (true, true) => {
                self.layout.image = self.definition.static_image();
                if anchor_changed {
                    self.pendulum = Pendulum::anchored_at(self.definition.x_position, self.layout.y);
                } else {
                    self.pendulum.set_origin(self.definition.x_position, self.layout.y);
                }
                let (x, y) = self.pendulum.position();
                self.layout.x = x;
                self.layout.y = y;
                self.layout.rotation = self.definition.rotation + self.pendulum.sway_rotation;
            }
            (false, false) => {
                self.walk.x = self.walk.x.min(ctx.screen.walk_bound(self.layout.width));
                self.layout.x = self.walk.x;
                self.layout.image = self.definition.frame_image(self.frame_cursor);
            }
        }

        self.apply_layout(ctx.windows);
        self.refresh_visibility(should_show, ctx);
    }

    /// Экран изменил размеры: вернуть гуляющего в допустимые границы
    pub(crate) fn fit_to_screen(&mut self, ctx: &mut OverlayContext<'_>) {
        if self.is_hanging() {
            return;
        }
        let bound = ctx.screen.walk_bound(self.layout.width);
        if self.walk.x > bound {
            self.walk.x = bound;
            self.layout.x = bound;
            self.apply_layout(ctx.windows);
        }
    }

    /// Остановить анимацию и убрать окно. Ошибки оконной системы только логируются.
    pub(crate) fn detach(&mut self, ctx: &mut OverlayContext<'_>) {
        self.stop_animation(ctx);
        match ctx.windows.try_remove_window(self.handle) {
            Ok(()) => {}
            Err(WindowError::NotAttached(handle)) => {
                debug!("Окно {} уже было убрано", handle);
            }
            Err(e) => warn!("Не удалось убрать окно {}: {}", self.definition.id, e),
        }
    }

    fn apply_layout(&self, windows: &mut dyn WindowSystem) {
        if let Err(e) = windows.try_update_window(self.handle, &self.layout) {
            warn!("Не удалось обновить окно {}: {}", self.definition.id, e);
        }
    }
}
