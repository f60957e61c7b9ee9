use crate::error::Result;
use crate::events::ServiceCommand;
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::parser::CommandParser;
use super::r#trait::CommandSource;

const LINE_QUEUE_CAPACITY: usize = 16;

/// Команды построчно со стандартного ввода.
///
/// Блокирующее чтение живёт в отдельном потоке, чтобы не держать runtime при завершении.
pub struct StdinCommandSource {
    parser: CommandParser,
}

impl StdinCommandSource {
    pub fn new(parser: CommandParser) -> Self {
        info!("Инициализация StdinCommandSource");
        Self { parser }
    }

    fn spawn_reader(lines: mpsc::Sender<String>) -> Result<()> {
        thread::Builder::new()
            .name("stdin-commands".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else {
                        break;
                    };
                    if lines.blocking_send(line).is_err() {
                        break;
                    }
                }
            })?;
        Ok(())
    }

    async fn run_impl(self, commands: mpsc::Sender<ServiceCommand>) -> Result<()> {
        info!("Ожидание команд на stdin (start/stop/stop-all/set/reset/motion/landscape-mode/orientation/active/list/quit)");

        let (line_tx, mut line_rx) = mpsc::channel(LINE_QUEUE_CAPACITY);
        Self::spawn_reader(line_tx)?;

        while let Some(line) = line_rx.recv().await {
            let command = match self.parser.parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            debug!("Команда: {}", command);
            if commands.send(command).await.is_err() {
                debug!("Сервис остановлен, чтение stdin прекращено");
                return Ok(());
            }
        }

        info!("stdin закрыт, новых команд не будет");
        Ok(())
    }
}

#[async_trait::async_trait]
impl CommandSource for StdinCommandSource {
    async fn run(self: Box<Self>, commands: mpsc::Sender<ServiceCommand>) -> Result<()> {
        (*self).run_impl(commands).await
    }
}
