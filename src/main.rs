mod cli;
mod output;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use mpadmin::config::Config;
use mpadmin::context::AdminContext;
use mpadmin::session::SqliteTokenStore;

#[derive(Parser, Debug)]
#[command(name = "mpadmin")]
#[command(about = "Admin console for the services marketplace")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/mpadmin/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: cli::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Hold the guard so buffered log lines are flushed on exit
  let _log_guard = mpadmin::logging::init()?;

  let config = Config::load(args.config.as_deref())?;
  let store = SqliteTokenStore::open()?;
  let ctx = AdminContext::init(&config, Arc::new(store))?;

  cli::run(args.command, &ctx).await
}
