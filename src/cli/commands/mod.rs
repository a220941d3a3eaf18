mod ask;
mod chat;
mod config;
mod status;

pub use ask::AskArgs;
pub use chat::ChatArgs;
pub use config::ConfigCommand;

pub use ask::handle_ask;
pub use chat::handle_chat;
pub use config::handle_config;
pub use status::handle_status;

use crate::error::SessionError;

/// Flatten a session error into a single user-facing line with its advice.
pub(crate) fn session_err(e: SessionError) -> anyhow::Error {
    anyhow::anyhow!("{} ({})", e, e.advice())
}
