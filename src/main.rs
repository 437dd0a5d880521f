//! shopdesk CLI: rule-based e-commerce support desk.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use shopdesk::config::DeskConfig;
use shopdesk::conversation::TurnWindow;
use shopdesk::error::DeskResult;
use shopdesk::pipeline::ChatPipeline;
use shopdesk::query::{labels, missing_slots, parse_query};
use shopdesk::store::Catalog;

/// Catalog used when neither `--catalog` nor the config names one.
const SAMPLE_CATALOG: &str = include_str!("../data/sample_catalog.json");

#[derive(Parser)]
#[command(name = "shopdesk", version, about = "Rule-based e-commerce support desk")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON catalog to answer from (overrides the config).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Never contact the LLM; use template responses only.
    #[arg(long, global = true)]
    no_llm: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single message.
    Ask {
        /// The customer's message.
        message: String,

        /// Print the full reply as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how a message is classified, without answering it.
    Classify {
        /// The customer's message.
        message: String,
    },

    /// Interactive chat session (type `quit` to leave).
    Chat,

    /// Write the effective configuration as TOML.
    InitConfig {
        /// Destination file.
        path: PathBuf,
    },
}

/// Resolve configuration and catalog from the command line.
fn load_setup(cli: &Cli) -> DeskResult<(DeskConfig, Catalog)> {
    let mut config = match &cli.config {
        Some(path) => DeskConfig::load(path)?,
        None => DeskConfig::default(),
    };
    if cli.no_llm {
        config.llm.enabled = false;
    }
    if let Some(path) = &cli.catalog {
        config.catalog = Some(path.clone());
    }

    let catalog = match &config.catalog {
        Some(path) => Catalog::load(path)?,
        None => {
            tracing::info!("no catalog configured, using the bundled sample catalog");
            Catalog::from_json(SAMPLE_CATALOG, "sample_catalog.json")?
        }
    };
    Ok((config, catalog))
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Classify { message } => {
            let parsed = parse_query(message);
            let missing = missing_slots(parsed.intent, &parsed.parameters);
            let out = serde_json::json!({
                "intent": parsed.intent,
                "parameters": parsed.parameters,
                "confidence": parsed.confidence,
                "missing_slots": labels(&missing),
            });
            println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
        }

        Commands::InitConfig { path } => {
            let (config, _) = load_setup(&cli)?;
            config.save(path)?;
            println!("Wrote configuration to {}", path.display());
        }

        Commands::Ask { message, json } => {
            let (config, catalog) = load_setup(&cli)?;
            let pipeline = ChatPipeline::from_config(&config, Arc::new(catalog));
            let reply = pipeline.process(message, &[]);
            if *json {
                println!("{}", serde_json::to_string_pretty(&reply).into_diagnostic()?);
            } else {
                println!("{}", reply.response_text);
            }
        }

        Commands::Chat => {
            let (config, catalog) = load_setup(&cli)?;
            let pipeline = ChatPipeline::from_config(&config, Arc::new(catalog));
            let status = pipeline.llm_status();
            println!(
                "shopdesk chat (LLM {}). Type `quit` to exit.",
                if status.available {
                    "enabled"
                } else {
                    "disabled"
                }
            );

            let mut history = TurnWindow::new(pipeline.settings().effective_history_window());
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            loop {
                print!("> ");
                stdout.flush().into_diagnostic()?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
                    break;
                }
                let message = line.trim();
                if message.is_empty() {
                    continue;
                }
                if matches!(message, "quit" | "exit") {
                    break;
                }

                let reply = pipeline.process(message, &history.to_vec());
                println!("\n{}\n", reply.response_text);
                history.record_exchange(message, &reply.response_text);
            }
        }
    }

    Ok(())
}
