use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
mod catalog;
mod config;
mod error;
mod events;
mod services;
mod utils;

use catalog::CharacterCatalog;
use config::{Config, LoggingConfig};
use services::{create_command_source, HeadlessWindowSystem, MotionSensorSource, OverlayService};

const COMMAND_QUEUE_CAPACITY: usize = 32;

#[derive(Parser, Debug)]
#[command(name = "overlay-pets")]
#[command(about = "Питомцы поверх всех окон: гуляют по краю экрана или качаются на верёвке")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "overlay-pets.toml")]
    config: String,

    /// Режим сухого запуска (синтетические датчики и демо-сценарий команд)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    /// Запустить персонажа при старте (можно указать несколько раз)
    #[arg(long = "character", value_name = "ID")]
    characters: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Config::load(&args.config)?;

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging)?;

    info!("Запуск Overlay Pets v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - датчики и команды эмулируются");
    }

    // Проверка прав доступа: без датчиков подвешенные персонажи просто не качаются
    if !args.dry_run && config.motion.enabled {
        if let Err(e) = utils::permissions::check_permissions() {
            warn!("{}", e);
            for line in utils::permissions::get_setup_commands() {
                warn!("{}", line);
            }
        }
    }

    // Инициализация компонентов
    let catalog = Arc::new(CharacterCatalog::new(
        config.characters.clone(),
        config.overrides.clone(),
    ));

    let mut sensor = MotionSensorSource::new();
    sensor.initialize(&config.motion, args.dry_run);
    if !sensor.is_available() {
        info!("Подвешенные персонажи будут неподвижны");
    }

    let windows = HeadlessWindowSystem::new();
    let window_table = windows.table();

    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let mut service = OverlayService::new(
        &config,
        Arc::clone(&catalog),
        Box::new(windows),
        sensor,
        command_rx,
    );

    let command_source = create_command_source(Arc::clone(&catalog), args.dry_run);

    info!("Все компоненты инициализированы");

    // Автозапуск: из конфигурации и из командной строки
    let mut autostart = config.overlay.autostart.clone();
    for id in args.characters {
        if !autostart.contains(&id) {
            autostart.push(id);
        }
    }
    service.start_characters(&autostart);

    let command_handle = tokio::spawn(async move {
        if let Err(e) = command_source.run(command_tx).await {
            error!("Ошибка в источнике команд: {}", e);
        }
    });

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения или команды quit
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        }
    };

    if let Err(e) = service.run(shutdown).await {
        error!("Ошибка в OverlayService: {}", e);
    }

    info!("Завершение работы...");

    // Источник команд может ждать ввода бесконечно
    command_handle.abort();

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, command_handle).await {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!(
        "Окна: создано {}, удалений {}, осталось {}",
        window_table.add_attempts(),
        window_table.remove_attempts(),
        window_table.window_count()
    );
    info!("Overlay Pets завершил работу");
    Ok(())
}

fn init_tracing(level: &str, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let directives = if logging.filter.is_empty() {
        level.to_string()
    } else {
        format!("{},{}", level, logging.filter)
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directives))?;

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format.as_str() {
        "pretty" => registry.with(fmt::layer().pretty()).init(),
        _ => registry.with(fmt::layer().compact()).init(),
    }

    Ok(())
}
