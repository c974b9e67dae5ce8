//! Caller side of the lookup endpoint.
//!
//! [`Lookup`] owns the lifecycle of one lookup surface: it checks the input
//! locally, calls the endpoint, and settles on either a [`DisplayRecord`]
//! or an error message.

use crate::display::{self, DisplayRecord};
use crate::error::ErrorBody;
use crate::json;
use crate::server::LOOKUP_PATH;
use crate::validate;
use anyhow::Context;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

/// Shown when a failed endpoint response carries no readable message.
pub const GENERIC_FAILURE: &str = "IP 정보를 가져올 수 없습니다";

#[derive(Debug, Error)]
pub enum Error {
  #[error("IP 주소를 입력해주세요")]
  EmptyInput,

  #[error("올바른 IP 주소 형식이 아닙니다")]
  InvalidFormat,

  /// The endpoint answered with an error; the text is its message.
  #[error("{0}")]
  Rejected(String),

  #[error("IP 조회 중 오류가 발생했습니다")]
  Transport(#[source] reqwest::Error),

  #[error("이미 조회가 진행 중입니다")]
  InProgress,
}

/// Success body of the endpoint, as far as the caller is concerned.
///
/// Besides the endpoint's own keys this also accepts the richer ip-api.com
/// keys (`continentCode`, `offset`, `asname`, ...). All of them are optional.
/// The endpoint does not promise value types: scalars are coerced and
/// anything unreadable counts as absent.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LookupResponse {
  #[serde(deserialize_with = "json::lenient_text")]
  pub query: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub country: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub country_code: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub region: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub region_name: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub city: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub zip: Option<String>,
  #[serde(deserialize_with = "json::lenient_number")]
  pub lat: Option<f64>,
  #[serde(deserialize_with = "json::lenient_number")]
  pub lon: Option<f64>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub timezone: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub isp: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub org: Option<String>,
  #[serde(rename = "as", deserialize_with = "json::lenient_text")]
  pub as_number: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub continent: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub currency: Option<String>,

  #[serde(deserialize_with = "json::lenient_text")]
  pub continent_code: Option<String>,
  #[serde(deserialize_with = "json::lenient_integer")]
  pub offset: Option<i64>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub asname: Option<String>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub reverse: Option<String>,
  #[serde(deserialize_with = "json::lenient_flag")]
  pub mobile: Option<bool>,
  #[serde(deserialize_with = "json::lenient_flag")]
  pub proxy: Option<bool>,
  #[serde(deserialize_with = "json::lenient_flag")]
  pub hosting: Option<bool>,
  #[serde(deserialize_with = "json::lenient_text")]
  pub district: Option<String>,
}

/// Thin HTTP client for `GET /api/ip-lookup`.
#[derive(Debug, Clone)]
pub struct HandlerClient {
  client: Client,
  endpoint: Url,
}

impl HandlerClient {
  /// The lookup path is resolved under `server_url`, so a server mounted
  /// below a path prefix (`http://host/geo`) keeps that prefix.
  ///
  /// # Errors
  ///
  /// Returns an error if `server_url` is not a valid base URL or the HTTP
  /// client cannot be built.
  pub fn new(server_url: &str) -> anyhow::Result<Self> {
    let mut base = Url::parse(server_url)
      .with_context(|| format!("Invalid server URL: {server_url}"))?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    let endpoint = base
      .join(LOOKUP_PATH.trim_start_matches('/'))
      .with_context(|| format!("Cannot build lookup URL from {server_url}"))?;
    let client = Client::builder()
      .user_agent(format!("geolens/{}", env!("CARGO_PKG_VERSION")))
      .build()
      .context("Failed to build HTTP client")?;
    Ok(Self { client, endpoint })
  }

  #[must_use]
  pub const fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  /// Fetches `ip` from the endpoint. `ip` is sent as given.
  ///
  /// # Errors
  ///
  /// - `Transport` if the request fails or a success body is unreadable
  /// - `Rejected` with the endpoint's message for any non-success status
  pub async fn fetch(&self, ip: &str) -> Result<LookupResponse, Error> {
    let response = self
      .client
      .get(self.endpoint.clone())
      .query(&[("ip", ip)])
      .send()
      .await
      .map_err(Error::Transport)?;

    if !response.status().is_success() {
      let status = response.status();
      let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
      tracing::debug!(%status, %message, "endpoint refused lookup");
      return Err(Error::Rejected(message));
    }

    response.json().await.map_err(Error::Transport)
  }
}

/// Lifecycle of a lookup surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupState {
  /// Nothing submitted yet.
  #[default]
  Idle,
  /// A call is outstanding.
  Loading,
  /// The last lookup finished with a record or a message, never both.
  Settled(Result<DisplayRecord, String>),
}

impl LookupState {
  #[must_use]
  pub const fn is_loading(&self) -> bool {
    matches!(self, Self::Loading)
  }

  #[must_use]
  pub const fn record(&self) -> Option<&DisplayRecord> {
    match self {
      Self::Settled(Ok(record)) => Some(record),
      _ => None,
    }
  }

  #[must_use]
  pub fn error(&self) -> Option<&str> {
    match self {
      Self::Settled(Err(message)) => Some(message),
      _ => None,
    }
  }
}

/// Lookup controller. One call at a time: [`Lookup::submit`] borrows the
/// controller mutably for the whole call.
#[derive(Debug)]
pub struct Lookup {
  client: HandlerClient,
  state: LookupState,
}

impl Lookup {
  #[must_use]
  pub const fn new(client: HandlerClient) -> Self {
    Self {
      client,
      state: LookupState::Idle,
    }
  }

  #[must_use]
  pub const fn state(&self) -> &LookupState {
    &self.state
  }

  /// Checks `input` and moves to `Loading`.
  ///
  /// Returns the trimmed address to send. On a local failure the state
  /// settles with the error message and nothing should be sent.
  ///
  /// # Errors
  ///
  /// - `InProgress` while another call is outstanding (state unchanged)
  /// - `EmptyInput` for blank input
  /// - `InvalidFormat` if the input has no IP shape
  pub fn begin<'a>(&mut self, input: &'a str) -> Result<&'a str, Error> {
    if self.state.is_loading() {
      return Err(Error::InProgress);
    }

    let ip = input.trim();
    let checked = if ip.is_empty() {
      Err(Error::EmptyInput)
    } else if validate::is_ip_shape(ip) {
      Ok(ip)
    } else {
      Err(Error::InvalidFormat)
    };

    match checked {
      Ok(ip) => {
        self.state = LookupState::Loading;
        Ok(ip)
      }
      Err(err) => {
        self.state = LookupState::Settled(Err(err.to_string()));
        Err(err)
      }
    }
  }

  /// Settles the outstanding call.
  pub fn finish(&mut self, outcome: Result<LookupResponse, Error>) {
    self.state = LookupState::Settled(
      outcome
        .map(display::normalize)
        .map_err(|err| err.to_string()),
    );
  }

  /// Runs a whole lookup and returns the settled state.
  pub async fn submit(&mut self, input: &str) -> &LookupState {
    if let Ok(ip) = self.begin(input) {
      let outcome = self.client.fetch(ip).await;
      self.finish(outcome);
    }
    &self.state
  }
}
