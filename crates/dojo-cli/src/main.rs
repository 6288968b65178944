//! ckad-dojo CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "dojo", version, about = "CKAD exam practice simulator")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding one sub-directory per exam
    #[arg(long, global = true)]
    exams_dir: Option<PathBuf>,

    /// Directory holding the scoring script
    #[arg(long, global = true)]
    scripts_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available exams
    List,

    /// Show an exam's configuration
    Info {
        /// Exam id (directory name under the exams dir)
        #[arg(short, long)]
        exam: String,
    },

    /// Show the questions of an exam
    Questions {
        #[arg(short, long)]
        exam: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the solutions of an exam
    Solutions {
        #[arg(short, long)]
        exam: String,

        /// Only this question (e.g. "3" or "P1")
        #[arg(short, long)]
        question: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Run the scoring script once and show the result
    Score {
        #[arg(short, long)]
        exam: String,

        #[arg(long)]
        json: bool,
    },

    /// Start a timed practice session
    Exam {
        #[arg(short, long)]
        exam: String,

        /// Question to begin with
        #[arg(long, default_value = "1")]
        start_question: u32,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dojo_cli=info,dojo_core=info,dojo_runner=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match Context::load(cli.config, cli.exams_dir, cli.scripts_dir) {
        Ok(ctx) => match cli.command {
            Commands::List => commands::list::execute(&ctx),
            Commands::Info { exam } => commands::info::execute(&ctx, &exam),
            Commands::Questions { exam, json } => commands::questions::execute(&ctx, &exam, json),
            Commands::Solutions {
                exam,
                question,
                json,
            } => commands::solutions::execute(&ctx, &exam, question.as_deref(), json),
            Commands::Score { exam, json } => commands::score::execute(&ctx, &exam, json).await,
            Commands::Exam {
                exam,
                start_question,
            } => commands::exam::execute(&ctx, &exam, start_question).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
