mod config;
mod plan_cmd;
mod serve_cmd;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use kiln_core::plan::{GeneratorSettings, PlanGenerator};
use kiln_core::provider::OpenRouterClient;

use config::{CliOverrides, KilnConfig};
use plan_cmd::OutputFormat;

#[derive(Parser)]
#[command(name = "kiln", about = "Turn a free-text goal into a structured execution plan")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (GET /health, POST /generate-plan)
    Serve {
        /// Address to bind (overrides KILN_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate a plan for a goal and print it
    Plan {
        /// The goal to plan, 1-2000 characters
        goal: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Write a kiln config file
    Init {
        /// Provider API key to store in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// Model identifier to store in the config file
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Build the generator from resolved configuration.
fn build_generator(config: &KilnConfig) -> PlanGenerator {
    let provider = Arc::new(OpenRouterClient::new(&config.provider));
    PlanGenerator::new(provider, GeneratorSettings::from(&config.provider))
}

/// Execute the `kiln init` command: write config file.
fn cmd_init(api_key: Option<String>, model: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        provider: config::ProviderSection {
            api_key,
            base_url: None,
            model,
        },
        server: config::ServerSection::default(),
    };
    config::save_config_to(&path, &cfg)?;

    println!("Config written to {}", path.display());
    if !has_key {
        println!("No API key stored; set OPENROUTER_API_KEY or OPENAI_API_KEY before serving.");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, port } => {
            let resolved = KilnConfig::resolve(&CliOverrides { bind, port })?;
            let generator = build_generator(&resolved);
            serve_cmd::run_serve(resolved, generator).await?;
        }
        Commands::Plan { goal, format } => {
            let resolved = KilnConfig::resolve(&CliOverrides::default())?;
            let generator = build_generator(&resolved);
            plan_cmd::run_plan(&generator, &goal, format).await?;
        }
        Commands::Init {
            api_key,
            model,
            force,
        } => {
            cmd_init(api_key, model, force)?;
        }
    }

    Ok(())
}
