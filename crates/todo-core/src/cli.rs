use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::filter::{PriorityFilter, StatusFilter};
use crate::todo::{Priority, Status, TodoId};

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "todo",
    version,
    about = "Personal todo dashboard for a remote todo API",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "todorc")]
    pub todorc: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    /// Base URL of the todo API; overrides `api.url`.
    #[arg(long = "api")]
    pub api: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the stats cards and the filtered list.
    List(ListArgs),
    /// Show done / pending / missed counters only.
    Stats,
    /// Create a todo.
    Add(AddArgs),
    /// Delete a todo. There is no undo.
    Delete { id: TodoId },
    /// Mark a todo as DONE.
    Done { id: TodoId },
    /// Set the status of a todo.
    Status { id: TodoId, status: Status },
    /// Set the priority of a todo.
    Priority { id: TodoId, priority: Priority },
    /// Edit fields of a todo and save them.
    Edit(EditArgs),
    /// Run the overdue check and report what changed.
    Reconcile,
    /// Store the bearer token for later commands.
    Login {
        #[arg(long)]
        token: String,
    },
    /// Forget the stored bearer token.
    Logout,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    #[arg(long, short = 's', default_value = "ALL")]
    pub status: StatusFilter,

    #[arg(long, short = 'p', default_value = "ALL")]
    pub priority: PriorityFilter,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AddArgs {
    pub title: String,

    #[arg(long, short = 'd')]
    pub description: String,

    /// YYYY-MM-DD
    #[arg(long)]
    pub deadline: String,

    #[arg(long, short = 'p', default_value = "NORMAL")]
    pub priority: Priority,

    /// NOT_STARTED or IN_PROGRESS
    #[arg(long, short = 's', default_value = "NOT_STARTED")]
    pub status: Status,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct EditArgs {
    pub id: TodoId,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long)]
    pub deadline: Option<String>,

    #[arg(long, short = 's')]
    pub status: Option<Status>,

    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,
}

impl Command {
    /// Command used when none is given on the command line.
    pub fn default_from(cfg: &Config) -> anyhow::Result<Self> {
        let name = cfg
            .get("default.command")
            .unwrap_or_else(|| "list".to_string());
        debug!(command = %name, "no explicit command, using default");
        match name.trim() {
            "list" => Ok(Command::List(ListArgs::default())),
            "stats" => Ok(Command::Stats),
            "reconcile" => Ok(Command::Reconcile),
            other => Err(anyhow!(
                "invalid default.command {other:?}; expected list, stats or reconcile"
            )),
        }
    }

    pub fn needs_session(&self) -> bool {
        !matches!(self, Command::Login { .. } | Command::Logout)
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` / `rc.key:value` overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest
                .split_once('=')
                .or_else(|| rest.split_once(':'))
                .map(|(k, v)| (format!("rc.{k}"), v.to_string()));

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}
