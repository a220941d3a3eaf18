use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::SessionController;

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let controller = match SessionController::from_config(&config) {
        Ok(controller) => controller,
        Err(e) => {
            println!("{}", formatter.format_error(&e.to_string(), e.advice()));
            return Ok(());
        }
    };

    if verbose {
        eprintln!(
            "Checking {} (chat) and {} (embedding)...",
            config.chat.provider, config.embedding.provider
        );
    }

    let chat_reachable = controller
        .chat_provider()
        .health_check()
        .await
        .unwrap_or(false);
    let embedding_reachable = controller
        .embedding_provider()
        .health_check()
        .await
        .unwrap_or(false);

    let status = StatusInfo {
        chat_provider: config.chat.provider.to_string(),
        chat_model: config.chat.model.clone(),
        chat_reachable,
        embedding_provider: config.embedding.provider.to_string(),
        embedding_model: config.embedding.model.clone(),
        embedding_reachable,
        config_path: Config::config_path()
            .filter(|p| p.exists())
            .map(|p| p.display().to_string()),
    };

    print!("{}", formatter.format_status(&status));

    Ok(())
}
