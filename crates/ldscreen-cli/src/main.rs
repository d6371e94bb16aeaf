//! ldscreen CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use ldscreen_core::model::{AttentionSpan, Gender};

mod commands;

#[derive(Parser)]
#[command(
    name = "ldscreen",
    version,
    about = "Learning-difficulty screening: tests, weakness scores, recommendations and risk prediction"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config, item bank and baseline model
    Init,

    /// Validate item bank TOML files
    Validate {
        /// Path to item bank file or directory
        #[arg(long)]
        item_bank: PathBuf,
    },

    /// Start a test attempt from an item bank set
    Start {
        #[arg(long)]
        user: String,

        /// Path to item bank file or directory
        #[arg(long)]
        item_bank: PathBuf,

        /// Set id within the bank
        #[arg(long)]
        set: String,
    },

    /// Submit answers for an open attempt
    Submit {
        #[arg(long)]
        user: String,

        /// Attempt id printed by `start`
        #[arg(long)]
        attempt: Uuid,

        /// Answers in item order (repeat the flag; use "" to leave one blank)
        #[arg(long = "answer")]
        answers: Vec<String>,

        /// Free-text response (reading transcript or recalled digits)
        #[arg(long)]
        text: Option<String>,
    },

    /// Show weakness per area
    Scores {
        #[arg(long)]
        user: String,
    },

    /// Regenerate and show recommendations
    Recommend {
        #[arg(long)]
        user: String,
    },

    /// Record a demographic intake
    Intake {
        #[arg(long)]
        user: String,

        #[arg(long)]
        age: u32,

        /// male, female or other
        #[arg(long)]
        gender: Option<Gender>,

        /// low, medium or high
        #[arg(long, default_value = "medium")]
        attention: AttentionSpan,

        #[arg(long)]
        reading_difficulties: bool,

        /// Academic history notes
        #[arg(long, default_value = "")]
        history: String,

        /// Other learning issues
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Predict LD risk from an intake
    Predict {
        #[arg(long)]
        user: String,

        /// Intake id (defaults to the most recent one)
        #[arg(long)]
        intake: Option<Uuid>,
    },

    /// Write the user's screening report
    Report {
        #[arg(long)]
        user: String,

        /// Output format: json, html, markdown, all
        #[arg(long, default_value = "html")]
        format: String,

        /// Output directory (defaults to `output_dir` from the config)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ldscreen=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { item_bank } => commands::validate::execute(item_bank),
        Commands::Start {
            user,
            item_bank,
            set,
        } => commands::attempt::start(config, user, item_bank, set),
        Commands::Submit {
            user,
            attempt,
            answers,
            text,
        } => commands::attempt::submit(config, user, attempt, answers, text),
        Commands::Scores { user } => commands::scores::scores(config, user),
        Commands::Recommend { user } => commands::scores::recommend(config, user),
        Commands::Intake {
            user,
            age,
            gender,
            attention,
            reading_difficulties,
            history,
            notes,
        } => commands::intake::intake(
            config,
            user,
            ldscreen_core::model::IntakeForm {
                age,
                gender,
                academic_history: history,
                reading_difficulties,
                attention_span: attention,
                learning_issues_notes: notes,
            },
        ),
        Commands::Predict { user, intake } => commands::intake::predict(config, user, intake),
        Commands::Report {
            user,
            format,
            output,
        } => commands::report::execute(config, user, format, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
