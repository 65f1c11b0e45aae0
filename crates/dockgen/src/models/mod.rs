use std::time::Duration;

use dockgen_core::docker::ProviderError;
use dockgen_core::models::{filter_chat_models, ModelsOutput};

use crate::openai::{OpenAiProvider, DEFAULT_BASE_URL};
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct ModelsOptions {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ModelsOptions, global: crate::Global) -> Result<()> {
    let api_key = options
        .api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or(Error::MissingApiKey)?;

    if global.verbose {
        eprintln!("OpenAI base URL: {}", options.openai_base_url);
    }

    let provider = OpenAiProvider::new(&options.openai_base_url, Duration::from_secs(30))?;
    let output = list_models_data(&provider, &api_key)
        .await
        .map_err(|e| eyre!("{} ({})", e.detail(), e.message))?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if output.models.is_empty() {
        println!("No chat models available.");
    } else {
        for model in &output.models {
            println!("{}", model.id);
        }
    }

    Ok(())
}

/// List the chat models available to `api_key` (shared with the HTTP surface).
pub async fn list_models_data(
    provider: &OpenAiProvider,
    api_key: &str,
) -> std::result::Result<ModelsOutput, ProviderError> {
    let models = provider.list_models(api_key).await?;
    log::debug!("Provider returned {} models", models.len());
    Ok(filter_chat_models(models))
}
