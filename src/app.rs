use crate::cli::{Cli, Command, ConfigArgs, LookupArgs, ServeArgs};
use crate::client::{HandlerClient, Lookup, LookupState};
use crate::providers::ipapi::Provider;
use crate::user_config::{self, Overrides, UserConfig};
use crate::{results, server};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub struct App {
  cli: Cli,
  config: UserConfig,
}

impl App {
  pub fn new() -> Self {
    Self {
      cli: Cli::parse(),
      config: user_config::load(),
    }
  }

  pub async fn run(self) -> Result<ExitCode> {
    match self.cli.command {
      Command::Serve(args) => {
        run_serve(self.config, args).await?;
        Ok(ExitCode::SUCCESS)
      }
      Command::Lookup(args) => run_lookup(self.config, args).await,
      Command::Config(args) => {
        run_config(self.config, args)?;
        Ok(ExitCode::SUCCESS)
      }
    }
  }
}

fn init_tracing(default_directive: &str) {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(default_directive));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

async fn run_serve(config: UserConfig, args: ServeArgs) -> Result<()> {
  init_tracing("geolens=info");

  let config = config.merged(Overrides {
    bind: args.bind,
    provider_url: args.provider_url,
    user_agent: args.user_agent,
    ..Overrides::default()
  });
  let addr: SocketAddr = config
    .bind
    .parse()
    .with_context(|| format!("Invalid bind address: {}", config.bind))?;
  let provider = Provider::new(
    &config.provider_url,
    &config.user_agent,
    args.timeout.map(Duration::from_secs),
  )?;

  server::serve(addr, provider).await
}

fn spinner(ip: &str) -> ProgressBar {
  let pb = ProgressBar::new_spinner();
  if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
    pb.set_style(style);
  }
  pb.set_message(format!("Looking up {ip}..."));
  pb.enable_steady_tick(Duration::from_millis(100));
  pb
}

/// Exits with failure when the lookup settles with an error message.
async fn run_lookup(config: UserConfig, args: LookupArgs) -> Result<ExitCode> {
  init_tracing("geolens=warn");

  let config = config.merged(Overrides {
    server_url: args.server,
    ..Overrides::default()
  });
  let mut lookup = Lookup::new(HandlerClient::new(&config.server_url)?);

  let pb = (!args.json).then(|| spinner(args.ip.trim()));
  let state = lookup.submit(&args.ip).await;
  if let Some(pb) = pb {
    pb.finish_and_clear();
  }

  match state {
    LookupState::Settled(Ok(record)) => {
      if args.json {
        results::print_json(record)?;
      } else {
        results::print_human_readable(record);
      }
      Ok(ExitCode::SUCCESS)
    }
    LookupState::Settled(Err(message)) => {
      results::print_error(message);
      Ok(ExitCode::FAILURE)
    }
    LookupState::Idle | LookupState::Loading => {
      anyhow::bail!("lookup did not settle")
    }
  }
}

fn run_config(config: UserConfig, args: ConfigArgs) -> Result<()> {
  let config = config.merged(Overrides {
    bind: args.bind,
    server_url: args.server,
    provider_url: args.provider_url,
    user_agent: args.user_agent,
  });
  if args.save {
    user_config::store(&config).context("Failed to save configuration")?;
  }
  serde_json::to_string_pretty(&config)
    .map(|s| println!("{s}"))
    .context("Failed to serialize configuration")
}
