use crate::catalog::CharacterCatalog;
use crate::error::Result;
use crate::events::ServiceCommand;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::parser::CommandParser;

/// Trait for sources of external start/stop/update commands
#[async_trait::async_trait]
pub trait CommandSource {
    /// Feed commands into the service until the input ends or the service goes away
    async fn run(self: Box<Self>, commands: mpsc::Sender<ServiceCommand>) -> Result<()>;
}

/// Factory function to create an appropriate command source based on the dry_run flag
pub fn create_command_source(catalog: Arc<CharacterCatalog>, dry_run: bool) -> Box<dyn CommandSource + Send> {
    let parser = CommandParser::new(catalog);
    if dry_run {
        Box::new(super::dry_source::ScriptedCommandSource::demo(parser))
    } else {
        Box::new(super::stdin_source::StdinCommandSource::new(parser))
    }
}
