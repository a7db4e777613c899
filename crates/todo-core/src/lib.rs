pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod datetime;
pub mod error;
pub mod filter;
pub mod http;
pub mod reconcile;
pub mod render;
pub mod service;
pub mod session;
pub mod stats;
pub mod todo;

use std::ffi::OsString;
use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::cli::Command;
use crate::dashboard::Dashboard;
use crate::datetime::{
  SystemClock,
  resolve_timezone
};
use crate::error::TodoError;
use crate::http::HttpTodoService;
use crate::session::{
  Session,
  SessionStore
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting todo CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.todorc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );
  if let Some(api) = cli.api {
    cfg.apply_overrides([(
      "api.url".to_string(),
      api
    )]);
  }

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;
  let store =
    SessionStore::open(&data_dir)
      .with_context(|| {
        format!(
          "failed to open session \
           store at {}",
          data_dir.display()
        )
      })?;

  let command = match cli.command {
    | Some(command) => command,
    | None => {
      Command::default_from(&cfg)?
    }
  };

  let mut stdout =
    std::io::stdout().lock();
  match command {
    | Command::Login {
      token
    } => {
      store.save(&Session::new(token)?)?;
      writeln!(stdout, "Logged in.")?;
      return Ok(());
    }
    | Command::Logout => {
      if store.logout()? {
        writeln!(stdout, "Logged out.")?;
      } else {
        writeln!(
          stdout,
          "Not logged in."
        )?;
      }
      return Ok(());
    }
    | _ => {}
  }

  let session = store
    .load()?
    .ok_or(TodoError::NotAuthenticated)?;
  let service = HttpTodoService::new(
    &cfg.api_url(),
    session,
    cfg.api_timeout()?
  )?;
  let clock =
    SystemClock::new(resolve_timezone(
      cfg.get("timezone").as_deref()
    ));
  let renderer =
    render::Renderer::new(&cfg)?;
  debug!(
    api = %service.base_url(),
    tz = %clock.timezone(),
    "dashboard ready"
  );

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;
  let mut dashboard =
    Dashboard::new(service, clock);
  let mut stderr =
    std::io::stderr().lock();
  runtime.block_on(commands::dispatch(
    &mut dashboard,
    &renderer,
    command,
    &mut stdout,
    &mut stderr
  ))?;

  info!("done");
  Ok(())
}
