mod orchestrator;

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use dockgen_core::context::{ContextOptions, DEFAULT_MAX_CONTEXT_CHARS};
use dockgen_core::docker::{CodeArtifact, GenerationRequest, GenerationResult, DEFAULT_MODEL};
use indicatif::{ProgressBar, ProgressStyle};

use crate::openai::{OpenAiProvider, DEFAULT_BASE_URL};
use crate::prelude::{eprintln, println, *};
use crate::repomix::{RepomixContextBuilder, DEFAULT_REPOMIX_COMMAND};

pub use orchestrator::Generator;

/// Settings shared by every command that talks to the collaborators.
#[derive(Debug, Clone, clap::Args)]
pub struct ServiceOptions {
    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Command used to run repomix (e.g. "npx repomix")
    #[arg(long, env = "REPOMIX_COMMAND", default_value = DEFAULT_REPOMIX_COMMAND)]
    pub repomix_command: String,

    /// Maximum context size in characters sent to the model (0 disables the bound)
    #[arg(long, env = "DOCKGEN_MAX_CONTEXT_CHARS", default_value_t = DEFAULT_MAX_CONTEXT_CHARS)]
    pub max_context_chars: usize,

    /// Instruction file embedded in the repomix output
    #[arg(long, env = "DOCKGEN_INSTRUCTION_FILE")]
    pub instruction_file: Option<String>,

    /// Timeout in seconds for a single model request
    #[arg(long, env = "DOCKGEN_REQUEST_TIMEOUT", default_value = "300")]
    pub request_timeout: u64,
}

/// Explicit configuration of a [`Generator`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub openai_base_url: String,
    pub repomix_command: String,
    pub context_options: ContextOptions,
    pub max_context_chars: usize,
    pub request_timeout: Duration,
}

impl From<ServiceOptions> for GeneratorConfig {
    fn from(options: ServiceOptions) -> Self {
        Self {
            openai_base_url: options.openai_base_url,
            repomix_command: options.repomix_command,
            context_options: ContextOptions {
                instruction_file: options.instruction_file,
                ..ContextOptions::default()
            },
            max_context_chars: options.max_context_chars,
            request_timeout: Duration::from_secs(options.request_timeout),
        }
    }
}

impl GeneratorConfig {
    pub fn provider(&self) -> std::result::Result<OpenAiProvider, Error> {
        OpenAiProvider::new(&self.openai_base_url, self.request_timeout)
    }

    pub fn context_builder(&self) -> std::result::Result<RepomixContextBuilder, Error> {
        RepomixContextBuilder::new(
            &self.repomix_command,
            self.context_options.clone(),
            self.max_context_chars,
        )
    }

    /// Wire the repomix and OpenAI adapters into a [`Generator`].
    pub fn generator(&self) -> std::result::Result<Generator, Error> {
        Ok(Generator::new(
            Arc::new(self.context_builder()?),
            Arc::new(self.provider()?),
        ))
    }
}

#[derive(Debug, clap::Args)]
pub struct GenerateOptions {
    /// Public repository URL (or owner/repo shorthand)
    #[clap(env = "DOCKGEN_REPO_URL")]
    pub repo_url: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for generation
    #[arg(short, long, env = "DOCKGEN_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[clap(flatten)]
    pub service: ServiceOptions,
}

pub async fn run(options: GenerateOptions, global: crate::Global) -> Result<()> {
    let api_key = options
        .api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or(Error::MissingApiKey)?;

    let config = GeneratorConfig::from(options.service);
    if global.verbose {
        eprintln!("OpenAI base URL: {}", config.openai_base_url);
        eprintln!("Repomix command: {}", config.repomix_command);
        eprintln!("Model: {}", options.model);
    }

    let generator = config.generator()?;
    let request = GenerationRequest::new(options.repo_url, api_key).with_model(options.model);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .map_err(|e| eyre!("Invalid spinner template: {}", e))?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(f!("Generating Docker configuration for {}...", request.repo_url));

    let outcome = generator.generate(&request).await;
    spinner.finish_and_clear();

    let result = outcome?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output_formatted(&result);
    }

    Ok(())
}

fn output_formatted(result: &GenerationResult) {
    let stack = &result.tech_stack;
    let list = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };

    println!("\n{}\n", "Tech Stack".bold());
    let mut table = new_table();
    table.add_row(prettytable::row!["Languages", list(&stack.languages)]);
    table.add_row(prettytable::row!["Frameworks", list(&stack.frameworks)]);
    table.add_row(prettytable::row!["Databases", list(&stack.databases)]);
    table.add_row(prettytable::row![
        "Package Manager",
        stack.package_manager.as_deref().unwrap_or("-")
    ]);
    table.add_row(prettytable::row![
        "Runtime",
        stack.runtime.as_deref().unwrap_or("-")
    ]);
    table.printstd();

    print_artifact("Dockerfile", &result.dockerfile);
    print_artifact("docker-compose.yaml", &result.docker_compose);
}

fn print_artifact(title: &str, artifact: &CodeArtifact) {
    println!("\n{} {}\n", title.bold(), f!("({})", artifact.language).dimmed());
    if artifact.content.trim().is_empty() {
        println!("{}", "Not needed for this project.".italic());
    } else {
        println!("{}", artifact.content);
    }
}
