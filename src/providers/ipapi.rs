//! IP geolocation through ipapi.co.

use crate::error::LookupError;
use crate::json::is_truthy;
use anyhow::{bail, Context, Result};
use reqwest::header::USER_AGENT;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://ipapi.co";

/// ipapi.co answers 403 to the default reqwest agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Raw ipapi.co response.
///
/// Everything is optional: the provider drops fields it has no data for and
/// failure bodies only carry `error` and `reason`. Values are kept as raw
/// JSON; their types are the provider's business.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ProviderPayload {
  pub error: Option<Value>,
  pub reason: Option<Value>,

  pub country_name: Option<Value>,
  pub country_code: Option<Value>,
  pub region_code: Option<Value>,
  pub region: Option<Value>,
  pub city: Option<Value>,
  pub postal: Option<Value>,
  pub latitude: Option<Value>,
  pub longitude: Option<Value>,
  pub timezone: Option<Value>,
  pub org: Option<Value>,
  pub asn: Option<Value>,
  pub continent_code: Option<Value>,
  pub currency: Option<Value>,
}

/// Record returned by the lookup endpoint.
///
/// Key names follow the ip-api.com vocabulary that clients already speak.
/// Values are passed through untouched.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
  /// Echo of the queried address.
  pub query: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country_code: Option<Value>,
  /// Region code, e.g. `CA`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub region: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub region_name: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub zip: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lat: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lon: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timezone: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub isp: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub org: Option<Value>,
  #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
  pub as_number: Option<Value>,
  /// Continent code, e.g. `NA`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub continent: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub currency: Option<Value>,
}

impl NormalizedRecord {
  /// Renames the provider fields into the endpoint vocabulary.
  ///
  /// ipapi.co has no separate ISP field, so `org` feeds both `isp` and `org`.
  #[must_use]
  pub fn from_payload(query: &str, payload: ProviderPayload) -> Self {
    Self {
      query: query.to_string(),
      country: payload.country_name,
      country_code: payload.country_code,
      region: payload.region_code,
      region_name: payload.region,
      city: payload.city,
      zip: payload.postal,
      lat: payload.latitude,
      lon: payload.longitude,
      timezone: payload.timezone,
      isp: payload.org.clone(),
      org: payload.org,
      as_number: payload.asn,
      continent: payload.continent_code,
      currency: payload.currency,
    }
  }
}

/// Handle to the ipapi.co API.
///
/// Holds no per-request state; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Provider {
  client: Client,
  base_url: Url,
  user_agent: String,
}

impl Provider {
  /// Builds a provider rooted at `base_url`.
  ///
  /// # Errors
  ///
  /// Returns an error if `base_url` is not an absolute http(s) URL or the
  /// HTTP client cannot be built.
  pub fn new(
    base_url: &str,
    user_agent: &str,
    timeout: Option<Duration>,
  ) -> Result<Self> {
    let base_url = Url::parse(base_url)
      .with_context(|| format!("Invalid provider URL: {base_url}"))?;
    if base_url.cannot_be_a_base() {
      bail!("Provider URL cannot carry a path: {base_url}");
    }

    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder
      .build()
      .context("Failed to build provider HTTP client")?;

    Ok(Self {
      client,
      base_url,
      user_agent: user_agent.to_string(),
    })
  }

  /// `{base}/{ip}/json/`, with `ip` encoded as one path segment.
  #[must_use]
  pub fn endpoint(&self, ip: &str) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().push(ip).push("json").push("");
    }
    url
  }

  /// Looks up `ip` and returns the normalized record.
  ///
  /// # Errors
  ///
  /// - `MissingParameter` for an empty `ip`
  /// - `UnexpectedFailure` if the request or the body read fails
  /// - `MalformedUpstreamResponse` if the body is not a provider payload
  /// - `UpstreamError` for a non-success status
  /// - `ProviderRejected` if the payload carries the provider's error flag
  pub async fn lookup(
    &self,
    ip: &str,
  ) -> Result<NormalizedRecord, LookupError> {
    if ip.is_empty() {
      return Err(LookupError::MissingParameter);
    }

    let url = self.endpoint(ip);
    tracing::debug!(%url, "querying provider");

    let response = self
      .client
      .get(url)
      .header(USER_AGENT, &self.user_agent)
      .send()
      .await
      .map_err(LookupError::UnexpectedFailure)?;

    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(LookupError::UnexpectedFailure)?;

    let payload = parse_body(&text)?;

    if !status.is_success() {
      return Err(LookupError::UpstreamError { status });
    }

    Ok(NormalizedRecord::from_payload(ip, check_payload(payload)?))
  }
}

/// Parses a provider body.
///
/// Only the JSON syntax is checked. A top-level value other than an object
/// carries no fields and yields an empty payload; `null` is refused.
///
/// # Errors
///
/// Returns `MalformedUpstreamResponse` if `text` is not JSON or is `null`.
pub fn parse_body(text: &str) -> Result<ProviderPayload, LookupError> {
  let value: Value = serde_json::from_str(text)
    .map_err(LookupError::MalformedUpstreamResponse)?;
  match value {
    Value::Object(_) | Value::Null => ProviderPayload::deserialize(value)
      .map_err(LookupError::MalformedUpstreamResponse),
    _ => Ok(ProviderPayload::default()),
  }
}

/// Turns a payload whose `error` is truthy into a rejection.
///
/// # Errors
///
/// Returns `ProviderRejected` with the provider's reason, if it is truthy.
pub fn check_payload(
  payload: ProviderPayload,
) -> Result<ProviderPayload, LookupError> {
  if payload.error.as_ref().is_some_and(is_truthy) {
    let reason = payload.reason.filter(is_truthy).map(|r| match r {
      Value::String(s) => s,
      other => other.to_string(),
    });
    return Err(LookupError::ProviderRejected { reason });
  }
  Ok(payload)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const GOOGLE_DNS: &str = r#"{
    "ip": "8.8.8.8",
    "network": "8.8.8.0/24",
    "version": "IPv4",
    "city": "Mountain View",
    "region": "California",
    "region_code": "CA",
    "country_code": "US",
    "country_name": "United States",
    "continent_code": "NA",
    "in_eu": false,
    "postal": "94043",
    "latitude": 37.42301,
    "longitude": -122.083352,
    "timezone": "America/Los_Angeles",
    "utc_offset": "-0700",
    "currency": "USD",
    "asn": "AS15169",
    "org": "GOOGLE"
  }"#;

  fn provider(base: &str) -> Provider {
    Provider::new(base, DEFAULT_USER_AGENT, None).expect("valid provider")
  }

  #[test]
  fn test_remap_passes_values_through() {
    let payload = parse_body(GOOGLE_DNS).expect("sample parses");
    let record = NormalizedRecord::from_payload("8.8.8.8", payload);

    assert_eq!(record.query, "8.8.8.8");
    assert_eq!(record.country, Some(json!("United States")));
    assert_eq!(record.country_code, Some(json!("US")));
    assert_eq!(record.region, Some(json!("CA")));
    assert_eq!(record.region_name, Some(json!("California")));
    assert_eq!(record.city, Some(json!("Mountain View")));
    assert_eq!(record.zip, Some(json!("94043")));
    assert_eq!(record.lat, Some(json!(37.42301)));
    assert_eq!(record.lon, Some(json!(-122.083352)));
    assert_eq!(record.timezone, Some(json!("America/Los_Angeles")));
    assert_eq!(record.isp, Some(json!("GOOGLE")));
    assert_eq!(record.org, Some(json!("GOOGLE")));
    assert_eq!(record.as_number, Some(json!("AS15169")));
    assert_eq!(record.continent, Some(json!("NA")));
    assert_eq!(record.currency, Some(json!("USD")));
  }

  #[test]
  fn test_field_types_are_not_checked() {
    let payload = parse_body(
      r#"{"asn": 15169, "latitude": "37.4", "postal": null, "city": ["x"]}"#,
    )
    .expect("parses");
    let record = NormalizedRecord::from_payload("8.8.8.8", payload);
    let value = serde_json::to_value(&record).expect("serializes");

    assert_eq!(value["as"], 15169);
    assert_eq!(value["lat"], "37.4");
    assert_eq!(value["city"], json!(["x"]));
    assert!(value.get("zip").is_none());
  }

  #[test]
  fn test_serialized_keys() {
    let payload = parse_body(GOOGLE_DNS).expect("sample parses");
    let record = NormalizedRecord::from_payload("8.8.8.8", payload);
    let value = serde_json::to_value(&record).expect("serializes");
    let object = value.as_object().expect("object");

    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
      keys,
      [
        "as",
        "city",
        "continent",
        "country",
        "countryCode",
        "currency",
        "isp",
        "lat",
        "lon",
        "org",
        "query",
        "region",
        "regionName",
        "timezone",
        "zip"
      ]
    );
  }

  #[test]
  fn test_absent_fields_are_omitted() {
    let payload = parse_body(r#"{"country_name": "Japan"}"#).expect("parses");
    let record = NormalizedRecord::from_payload("1.1.1.1", payload);
    let value = serde_json::to_value(&record).expect("serializes");

    assert_eq!(value["country"], "Japan");
    assert!(value.get("city").is_none());
    assert!(value.get("lat").is_none());
  }

  #[test]
  fn test_out_of_range_values_are_not_checked() {
    let payload =
      parse_body(r#"{"latitude": 512.5, "longitude": -999.0}"#).expect("parses");
    let record = NormalizedRecord::from_payload("1.2.3.4", payload);
    assert_eq!(record.lat, Some(json!(512.5)));
    assert_eq!(record.lon, Some(json!(-999.0)));
  }

  #[test]
  fn test_non_json_body_is_malformed() {
    let err = parse_body("<html>Too many requests</html>").unwrap_err();
    assert!(matches!(err, LookupError::MalformedUpstreamResponse(_)));

    let err = parse_body("null").unwrap_err();
    assert!(matches!(err, LookupError::MalformedUpstreamResponse(_)));
  }

  #[test]
  fn test_non_object_body_has_no_fields() {
    for body in [r#""8.8.8.8""#, "[1, 2]", "42"] {
      let payload = parse_body(body).expect("valid JSON");
      assert_eq!(payload, ProviderPayload::default());
    }
  }

  #[test]
  fn test_error_flag_is_rejection() {
    let payload =
      parse_body(r#"{"ip": "1.2.3", "error": true, "reason": "Invalid IP Address"}"#)
        .expect("parses");
    match check_payload(payload) {
      Err(LookupError::ProviderRejected { reason }) => {
        assert_eq!(reason.as_deref(), Some("Invalid IP Address"));
      }
      other => panic!("expected rejection, got {other:?}"),
    }
  }

  #[test]
  fn test_empty_reason_is_dropped() {
    let payload =
      parse_body(r#"{"error": true, "reason": ""}"#).expect("parses");
    match check_payload(payload) {
      Err(LookupError::ProviderRejected { reason }) => assert!(reason.is_none()),
      other => panic!("expected rejection, got {other:?}"),
    }
  }

  #[test]
  fn test_truthy_error_flag_is_rejection() {
    for body in [
      r#"{"error": "true", "reason": "Reserved IP Address"}"#,
      r#"{"error": 1, "reason": "Reserved IP Address"}"#,
    ] {
      match check_payload(parse_body(body).expect("parses")) {
        Err(LookupError::ProviderRejected { reason }) => {
          assert_eq!(reason.as_deref(), Some("Reserved IP Address"));
        }
        other => panic!("expected rejection for {body}, got {other:?}"),
      }
    }
  }

  #[test]
  fn test_non_string_reason_is_stringified() {
    let payload =
      parse_body(r#"{"error": true, "reason": 429}"#).expect("parses");
    match check_payload(payload) {
      Err(LookupError::ProviderRejected { reason }) => {
        assert_eq!(reason.as_deref(), Some("429"));
      }
      other => panic!("expected rejection, got {other:?}"),
    }
  }

  #[test]
  fn test_falsy_error_flag_passes() {
    for body in [
      r#"{"error": false, "city": "Seoul"}"#,
      r#"{"error": 0, "city": "Seoul"}"#,
      r#"{"error": "", "city": "Seoul"}"#,
      r#"{"error": null, "city": "Seoul"}"#,
    ] {
      let payload = parse_body(body).expect("parses");
      let payload = check_payload(payload).expect("not a rejection");
      assert_eq!(payload.city, Some(json!("Seoul")));
    }
  }

  #[test]
  fn test_endpoint_shape() {
    let p = provider("https://ipapi.co");
    assert_eq!(p.endpoint("8.8.8.8").as_str(), "https://ipapi.co/8.8.8.8/json/");

    let p = provider("http://127.0.0.1:9000/");
    assert_eq!(
      p.endpoint("2001:db8:0:0:0:0:0:1").as_str(),
      "http://127.0.0.1:9000/2001:db8:0:0:0:0:0:1/json/"
    );
  }

  #[test]
  fn test_endpoint_encodes_slashes() {
    let p = provider("https://ipapi.co");
    assert_eq!(
      p.endpoint("../admin").as_str(),
      "https://ipapi.co/..%2Fadmin/json/"
    );
  }

  #[test]
  fn test_rejects_unusable_base_url() {
    assert!(Provider::new("not a url", DEFAULT_USER_AGENT, None).is_err());
    assert!(Provider::new("mailto:me@example.com", DEFAULT_USER_AGENT, None).is_err());
  }

  #[tokio::test]
  async fn test_empty_ip_short_circuits() {
    // Nothing listens on port 9; reaching the network would yield a
    // different error.
    let p = provider("http://127.0.0.1:9");
    let err = p.lookup("").await.unwrap_err();
    assert!(matches!(err, LookupError::MissingParameter));
  }
}
