mod shell;

use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use figment::providers::Serialized;
use flashdeck::{
    card::CardPatch,
    config::{Backend, FlashdeckConfig},
    session::traits::{CumulativeScoring, PlainScoring},
    types::CardId,
};

use shell::{OutputFormat, Shell};

#[derive(Parser)]
#[command(name = "flashdeck", about = "Leitner-box flashcards in the terminal", version)]
struct Cli {
    /// Directory holding the card and review files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(long, global = true)]
    backend: Option<BackendArg>,

    /// Output format for listings
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Json,
    Sqlite,
}

impl From<BackendArg> for Backend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Json => Backend::Json,
            BackendArg::Sqlite => Backend::Sqlite,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Interactive menu (default)
    Menu,

    /// Add a card
    Add {
        front: String,
        back: String,
        /// Topic (default "General")
        #[arg(long)]
        topic: Option<String>,
    },

    /// Change a card's text or topic; omitted fields are kept
    Edit {
        id: String,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        #[arg(long)]
        topic: Option<String>,
    },

    /// Delete a card (its review history is kept)
    Delete { id: String },

    /// List cards, optionally for one topic
    List {
        #[arg(long)]
        topic: Option<String>,
    },

    /// List topics in use
    Topics,

    /// Show the cards a session would draw, lowest box first
    Due {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Study due cards
    Study {
        #[arg(long)]
        limit: Option<usize>,
        /// Serve cards lowest box first instead of shuffled
        #[arg(long)]
        no_shuffle: bool,
    },

    /// Study due cards with a running score
    Quiz {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        no_shuffle: bool,
    },

    /// Show the review history of a card
    History { id: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut figment = FlashdeckConfig::figment();
    if let Some(dir) = &cli.data_dir {
        figment = figment.merge(Serialized::default("storage.data_dir", dir));
    }
    if let Some(backend) = cli.backend {
        figment = figment.merge(Serialized::default("storage.backend", Backend::from(backend)));
    }
    let mut config = FlashdeckConfig::from_figment(figment).context("failed to load configuration")?;

    let (mut store, mut log) = config.open_stores().context("failed to open flashcard storage")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let command = cli.command.unwrap_or(Command::Menu);

    if let Command::Study { limit, no_shuffle } | Command::Quiz { limit, no_shuffle } = &command {
        if let Some(limit) = limit {
            config.study.due_limit = (*limit).max(1);
        }
        if *no_shuffle {
            config.study.shuffle = false;
        }
    }

    let mut shell = Shell::new(
        &mut store,
        &mut log,
        config.study.clone(),
        stdin.lock(),
        BufWriter::new(stdout.lock()),
        cli.format,
    );

    match command {
        Command::Menu => shell.menu()?,
        Command::Add { front, back, topic } => shell.add(front, back, topic)?,
        Command::Edit {
            id,
            front,
            back,
            topic,
        } => shell.edit(&parse_id(id)?, CardPatch { front, back, topic })?,
        Command::Delete { id } => shell.delete(&parse_id(id)?)?,
        Command::List { topic } => shell.list(topic.as_deref())?,
        Command::Topics => shell.topics()?,
        Command::Due { limit } => shell.due(limit.unwrap_or(config.study.due_limit))?,
        Command::Study { .. } => shell.run_session(PlainScoring::default())?,
        Command::Quiz { .. } => shell.run_session(CumulativeScoring::default())?,
        Command::History { id } => shell.history(&parse_id(id)?)?,
    }

    shell.into_output().flush()?;
    Ok(())
}

fn parse_id(raw: String) -> anyhow::Result<CardId> {
    CardId::parse(raw).context("invalid card id")
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("FLASHDECK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
