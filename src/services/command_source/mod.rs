mod dry_source;
mod parser;
mod stdin_source;
mod r#trait;

pub use self::r#trait::create_command_source;
