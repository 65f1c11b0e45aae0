use crate::prelude::*;
use clap::Parser;

mod error;
mod generate;
mod models;
mod openai;
mod prelude;
mod repomix;
mod server;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Generate Docker configuration for public repositories"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "DOCKGEN_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Generate a Dockerfile and docker-compose file for a repository
    Generate(crate::generate::GenerateOptions),

    /// List the chat models available to an API key
    Models(crate::models::ModelsOptions),

    /// Serve the generator over HTTP
    Serve(crate::server::ServeOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Generate(options) => crate::generate::run(options, app.global).await,
        SubCommands::Models(options) => crate::models::run(options, app.global).await,
        SubCommands::Serve(options) => crate::server::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
