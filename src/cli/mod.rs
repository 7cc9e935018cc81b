use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::storage::{self, StoreHandle};

pub mod commands;
mod render;

use self::commands::{
    AddArgs, CalendarArgs, EditArgs, IdArgs, ListArgs, LoginArgs, SignupArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "todomate",
    version,
    about = "Calendar-organised todo list kept on this machine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over TODOMATE_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over TODOMATE_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with any well-formed email and password
    Login(LoginArgs),
    /// Create a local profile with a display name
    Signup(SignupArgs),
    /// Sign out; todos are kept
    Logout,
    /// Show who is signed in
    Whoami,
    /// Show the todos for a day (default)
    List(ListArgs),
    /// Add a todo to a day
    Add(AddArgs),
    /// Flip a todo between active and completed
    Toggle(IdArgs),
    /// Replace a todo's text
    Edit(EditArgs),
    /// Delete a todo
    Delete(IdArgs),
    /// Delete every completed todo on every day
    ClearCompleted,
    /// Print a month calendar marking days that have todos
    Calendar(CalendarArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let config = loader.load_or_init()?;
    let store = storage::init(loader.paths(), &config.storage)?;
    let store = StoreHandle::new(store);

    let command = cli.command.unwrap_or(Commands::List(ListArgs::default()));
    let output = commands::execute(&config, store, command)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err))
    })
    .map(|_| ())
}
