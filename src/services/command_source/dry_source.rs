use crate::error::Result;
use crate::events::ServiceCommand;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use super::parser::CommandParser;
use super::r#trait::CommandSource;

const DEMO_SCRIPT: &[(u64, &str)] = &[
    (0, "list"),
    (200, "start cat"),
    (200, "start spider"),
    (2000, "set cat speed=8 delay=80"),
    (2000, "orientation landscape"),
    (1500, "active"),
    (500, "landscape-mode on"),
    (2000, "orientation portrait"),
    (1000, "set spider bottom=on y=120"),
    (2000, "set cat hanging=on x=400"),
    (2000, "reset cat"),
    (2000, "motion off"),
    (1000, "motion on"),
    (2000, "stop cat"),
    (500, "active"),
];

/// Проигрывает заранее заданный сценарий команд (dry-run)
pub struct ScriptedCommandSource {
    parser: CommandParser,
    script: Vec<(Duration, String)>,
}

impl ScriptedCommandSource {
    pub fn new(parser: CommandParser, script: Vec<(Duration, String)>) -> Self {
        Self { parser, script }
    }

    pub fn demo(parser: CommandParser) -> Self {
        info!("Инициализация ScriptedCommandSource (демо-сценарий)");
        let script = DEMO_SCRIPT
            .iter()
            .map(|(delay_ms, line)| (Duration::from_millis(*delay_ms), line.to_string()))
            .collect();
        Self::new(parser, script)
    }

    async fn run_impl(self, commands: mpsc::Sender<ServiceCommand>) -> Result<()> {
        info!("Dry-run режим - команды берутся из сценария ({} шагов)", self.script.len());

        for (delay, line) in &self.script {
            sleep(*delay).await;
            info!("Dry-run: > {}", line);

            match self.parser.parse(line) {
                Ok(Some(command)) => {
                    if commands.send(command).await.is_err() {
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Dry-run: {}", e),
            }
        }

        info!("Dry-run: сценарий завершён, Ctrl+C для выхода");
        loop {
            tokio::select! {
                _ = commands.closed() => return Ok(()),
                _ = sleep(Duration::from_secs(30)) => debug!("Сервис работает в dry-run режиме"),
            }
        }
    }
}

#[async_trait::async_trait]
impl CommandSource for ScriptedCommandSource {
    async fn run(self: Box<Self>, commands: mpsc::Sender<ServiceCommand>) -> Result<()> {
        (*self).run_impl(commands).await
    }
}
