use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
  name = "geolens",
  author = "Luis Cardoso <luis@luiscardoso.dev>",
  version
)]
#[command(
  about = "Look up where an IP address lives.",
  long_about = "Runs a small lookup endpoint in front of the ipapi.co geolocation API, and a terminal client that queries it and renders location, network, connection type and coordinates for an IP address."
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
  /// Serve `GET /api/ip-lookup?ip=...` until interrupted.
  Serve(ServeArgs),

  /// Look up one IP address through a running endpoint.
  Lookup(LookupArgs),

  /// Print the current merged configuration and exit.
  Config(ConfigArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
  /// Address to listen on, e.g. `0.0.0.0:3000`.
  #[arg(long, value_name = "ADDR")]
  pub bind: Option<String>,

  /// Base URL of the geolocation provider.
  #[arg(long, value_name = "URL")]
  pub provider_url: Option<String>,

  /// User-Agent sent to the provider.
  #[arg(long, value_name = "UA")]
  pub user_agent: Option<String>,

  /// Give up on the provider after this many seconds. No limit by default.
  #[arg(long, value_name = "SECS")]
  pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LookupArgs {
  /// The IP address to look up.
  pub ip: String,

  /// Base URL of the lookup endpoint.
  #[arg(long, value_name = "URL")]
  pub server: Option<String>,

  /// Output the result in JSON format instead of human-readable text.
  #[arg(long)]
  pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
  #[arg(long, value_name = "ADDR")]
  pub bind: Option<String>,

  #[arg(long, value_name = "URL")]
  pub server: Option<String>,

  #[arg(long, value_name = "URL")]
  pub provider_url: Option<String>,

  #[arg(long, value_name = "UA")]
  pub user_agent: Option<String>,

  /// Persist the flags above into the user config file.
  #[arg(long)]
  pub save: bool,
}
