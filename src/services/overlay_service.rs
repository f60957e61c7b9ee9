use crate::catalog::{CharacterCatalog, CharacterRepository};
use crate::config::Config;
use crate::error::Result;
use crate::events::{MotionSample, ServiceCommand};
use crate::services::motion_sensor::MotionSensorSource;
use crate::services::overlay::{ManagerSettings, OverlayManager, ScreenMetrics};
use crate::services::window_system::WindowSystem;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Хост-процесс оверлеев: держит менеджер и переводит внешние команды в его вызовы.
///
/// Команды, образцы движения и тики прогулки обрабатываются в одном цикле,
/// поэтому состояние менеджера никогда не меняется параллельно.
pub struct OverlayService {
    manager: OverlayManager,
    catalog: Arc<CharacterCatalog>,
    commands: mpsc::Receiver<ServiceCommand>,
    motion: mpsc::Receiver<MotionSample>,
}

impl OverlayService {
    pub fn new(
        config: &Config,
        catalog: Arc<CharacterCatalog>,
        windows: Box<dyn WindowSystem>,
        sensor: MotionSensorSource,
        commands: mpsc::Receiver<ServiceCommand>,
    ) -> Self {
        info!("Инициализация OverlayService");

        let (motion_tx, motion) = mpsc::channel(config.motion.queue_capacity);
        let mut manager = OverlayManager::new(windows, sensor, ManagerSettings::from_config(config));
        manager.initialize(
            ScreenMetrics::from_config(&config.display),
            config.display.landscape,
            motion_tx,
        );

        Self {
            manager,
            catalog,
            commands,
            motion,
        }
    }

    #[cfg(test)]
    pub fn manager(&self) -> &OverlayManager {
        &self.manager
    }

    /// Запустить персонажей по списку id; неизвестные пропускаются
    pub fn start_characters(&mut self, ids: &[String]) {
        for id in ids {
            match self.catalog.get_character_by_id(id) {
                Some(definition) => {
                    self.manager.add_character(definition);
                }
                None => warn!("Автозапуск: неизвестный персонаж '{}'", id),
            }
        }
    }

    /// Выполнить одну команду. `false` означает, что сервис должен завершиться.
    pub fn handle_command(&mut self, command: ServiceCommand) -> bool {
        debug!("Обработка команды: {}", command);

        match command {
            ServiceCommand::Start(definition) => {
                let id = definition.id.clone();
                if !self.manager.add_character(definition) {
                    warn!("Персонаж {} не запущен", id);
                }
            }
            ServiceCommand::Stop(id) => self.manager.remove_character(&id),
            ServiceCommand::StopAll => self.manager.remove_all_characters(),
            ServiceCommand::Update { id, definition } => {
                if self.manager.is_character_active(&id) {
                    self.manager.update_character_settings(definition);
                } else {
                    debug!("{} не запущен, настройки сохранены без применения", id);
                }
            }
            ServiceCommand::SetMotionSensing(enabled) => self.manager.set_motion_sensing_enabled(enabled),
            ServiceCommand::SetEnableInLandscape(enabled) => self.manager.set_enable_in_landscape(enabled),
            ServiceCommand::Orientation { landscape } => self.manager.update_orientation(landscape),
            ServiceCommand::ReportActive => self.report_active(),
            ServiceCommand::Shutdown => {
                info!("Получена команда завершения");
                return false;
            }
        }
        true
    }

    fn report_active(&self) {
        let mut ids: Vec<String> = self.manager.active_character_ids().into_iter().collect();
        ids.sort();

        if ids.is_empty() {
            info!("Активных персонажей нет");
            return;
        }

        info!(
            "Активные персонажи ({}), датчики {}:",
            ids.len(),
            if self.manager.is_motion_listening() { "слушаются" } else { "не слушаются" }
        );
        for id in &ids {
            let Some(entry) = self.manager.entry(id) else {
                continue;
            };
            let layout = entry.layout();
            let motion = if entry.is_hanging() {
                format!("качание {:.1}", entry.pendulum().sway_x)
            } else {
                let walk = entry.walk_state();
                format!(
                    "кадр {}, {}",
                    entry.frame_cursor(),
                    if walk.moving_right { "вправо" } else { "влево" }
                )
            };
            info!(
                "  {} в ({}, {}), {}, {}, {}",
                entry.definition(),
                layout.x,
                layout.y,
                if layout.visible { "виден" } else { "скрыт" },
                if entry.is_running() { "анимируется" } else { "стоит" },
                motion
            );
        }
    }

    /// Цикл сервиса: до `shutdown`, команды `quit` или закрытия всех источников.
    /// На выходе окна убираются, датчики освобождаются.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut commands_open = true;

        info!("OverlayService запущен");
        loop {
            let deadline = self.manager.next_tick_deadline();

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Получен сигнал завершения");
                    break;
                }
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    None => {
                        commands_open = false;
                        debug!("Источник команд закрыт");
                    }
                },
                Some(sample) = self.motion.recv() => {
                    crate::trace_if_enabled!("Образец движения: {}", sample);
                    self.manager.apply_motion(sample);
                }
                _ = wait_for(deadline) => {
                    self.manager.run_due_ticks(Instant::now());
                }
            }
        }

        self.manager.cleanup();
        info!("OverlayService завершил работу");
        Ok(())
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
