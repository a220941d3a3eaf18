pub mod cli;
pub mod error;
pub mod models;
pub mod providers;
pub mod services;
pub mod sources;
pub mod utils;

pub use cli::{Cli, Commands};
pub use error::SessionError;
pub use models::{Config, OutputFormat};
