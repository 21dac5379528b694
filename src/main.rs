//! # docchat CLI
//!
//! The `docchat` binary serves the chat page and offers one-shot terminal
//! commands against the same hosted services.
//!
//! ## Usage
//!
//! ```bash
//! docchat --config ./config/docchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docchat serve` | Start the chat UI and JSON API |
//! | `docchat ask "<question>"` | Answer one question in the terminal |
//! | `docchat categories` | List the document categories |
//! | `docchat docs` | List the files stored on the document stage |

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docchat::chat::Assistant;
use docchat::client::PlatformClient;
use docchat::models::{AskOptions, CategoryFilter, ModelId};
use docchat::{config, server};

/// Chat assistant over hosted document search and LLM completion services.
#[derive(Parser)]
#[command(
    name = "docchat",
    about = "A chat assistant over hosted document search and LLM completion services",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat UI and JSON API.
    ///
    /// Binds to the address configured in `[server].bind`. A failed platform
    /// connection still starts the server, which then renders the connection
    /// diagnostic instead of answering questions.
    Serve,

    /// Answer one question in the terminal.
    Ask {
        /// The question to answer.
        question: String,

        /// Completion model to use.
        #[arg(long, default_value_t = ModelId::default())]
        model: ModelId,

        /// Category filter value; `ALL` disables filtering.
        #[arg(long, default_value = "ALL")]
        category: String,

        /// Send the bare question without retrieved document context.
        #[arg(long)]
        no_context: bool,
    },

    /// List the document categories known to the corpus.
    Categories,

    /// List the files stored on the document stage.
    Docs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    if let Commands::Serve = cli.command {
        return server::run_server(&cfg).await;
    }

    // One-shot commands need a live session up front.
    let client = PlatformClient::connect(&cfg).await.context(
        "Failed to connect to the platform; check the [credentials] section of your configuration",
    )?;
    let assistant = Assistant::new(client, cfg.retrieval.num_chunks);

    match cli.command {
        Commands::Serve => unreachable!(),
        Commands::Ask {
            question,
            model,
            category,
            no_context,
        } => {
            let opts = AskOptions {
                model,
                category: CategoryFilter::from_selection(&category),
                use_retrieval: !no_context,
            };
            let outcome = assistant.ask(&question, &opts).await;

            for diagnostic in &outcome.diagnostics {
                eprintln!("{}", diagnostic);
            }
            match &outcome.answer {
                Some(answer) => println!("{}", answer),
                None => println!("No answer."),
            }
            if !outcome.links.is_empty() {
                println!();
                println!("Related documents:");
                for link in &outcome.links {
                    println!("  {}: {}", link.label, link.url);
                }
            }
        }
        Commands::Categories => {
            let (categories, diagnostic) = assistant.categories().await;
            if let Some(diagnostic) = diagnostic {
                eprintln!("{}", diagnostic);
            }
            for category in categories {
                println!("{}", category);
            }
        }
        Commands::Docs => {
            let (documents, diagnostic) = assistant.documents().await;
            if let Some(diagnostic) = diagnostic {
                eprintln!("{}", diagnostic);
            }
            if documents.is_empty() {
                println!("No documents available.");
            }
            for name in documents {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
