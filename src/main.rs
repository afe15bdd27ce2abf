use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use menu_planner::adapters::ai::{AnthropicConfig, AnthropicDescriber};
use menu_planner::adapters::catalog::build_catalog;
use menu_planner::adapters::export::PulldownMenuExporter;
use menu_planner::adapters::storage::build_record_store;
use menu_planner::adapters::ConsoleTransport;
use menu_planner::application::TurnHandler;
use menu_planner::config::{AiConfig, AppConfig, LoggingConfig};

/// Logs go to stderr; stdout belongs to the conversation.
fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let json = config.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn describer(config: &AiConfig) -> Result<Option<AnthropicDescriber>, Box<dyn std::error::Error>> {
    let Some(key) = config.anthropic_api_key.as_ref().filter(|_| config.is_enabled()) else {
        return Ok(None);
    };
    let anthropic = AnthropicConfig::new(key.clone())
        .with_model(&config.model)
        .with_base_url(&config.base_url)
        .with_max_tokens(config.max_tokens)
        .with_timeout(config.timeout());
    Ok(Some(AnthropicDescriber::new(anthropic)?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;

    let store = build_record_store(&config.storage).await?;
    let catalog = build_catalog(&config.catalog).await?;
    let exporter = PulldownMenuExporter::new()
        .with_pandoc_path(&config.export.pandoc_path)
        .with_pdf_timeout(config.export.pdf_timeout());

    let mut handler = TurnHandler::new(store, catalog, Arc::new(exporter));
    if let Some(describer) = describer(&config.ai)? {
        tracing::info!(model = %config.ai.model, "Dish descriptions enabled");
        handler = handler.with_describer(Arc::new(describer));
    }

    let console = ConsoleTransport::new(Arc::new(handler), &config.console);
    console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    tracing::info!("Console session ended");
    Ok(())
}
